//! Register definitions for the VPU
//!
//! The register file is a flat byte array; a register name is a byte offset
//! into it. Each general-purpose group (RA-RF) sits on an 8-byte slot and
//! exposes five sub-registers that alias the low bytes of the slot, so `RA1`
//! reads the same storage as `RA` shifted by one byte. `RSP` holds the data
//! stack slot index, `RIP` the instruction index, and `R0` is hard-wired to
//! zero (writes are ignored).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::VpuError;

/// Size of the register space in bytes
pub const REGISTER_SPACE_SIZE: usize = 80;

/// Register (byte offset into the register space)
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Register {
    RA = 0,
    RA1 = 1,
    RA2 = 2,
    RA3 = 3,
    RA4 = 4,
    RB = 8,
    RB1 = 9,
    RB2 = 10,
    RB3 = 11,
    RB4 = 12,
    RC = 16,
    RC1 = 17,
    RC2 = 18,
    RC3 = 19,
    RC4 = 20,
    RD = 24,
    RD1 = 25,
    RD2 = 26,
    RD3 = 27,
    RD4 = 28,
    RE = 32,
    RE1 = 33,
    RE2 = 34,
    RE3 = 35,
    RE4 = 36,
    RF = 40,
    RF1 = 41,
    RF2 = 42,
    RF3 = 43,
    RF4 = 44,
    RSP = 48,
    RIP = 56,
    R0 = 64,
}

impl Register {
    pub const ZERO: Self = Self::R0;

    /// Try to convert from the operand byte of an instruction word
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Register::RA),
            1 => Some(Register::RA1),
            2 => Some(Register::RA2),
            3 => Some(Register::RA3),
            4 => Some(Register::RA4),
            8 => Some(Register::RB),
            9 => Some(Register::RB1),
            10 => Some(Register::RB2),
            11 => Some(Register::RB3),
            12 => Some(Register::RB4),
            16 => Some(Register::RC),
            17 => Some(Register::RC1),
            18 => Some(Register::RC2),
            19 => Some(Register::RC3),
            20 => Some(Register::RC4),
            24 => Some(Register::RD),
            25 => Some(Register::RD1),
            26 => Some(Register::RD2),
            27 => Some(Register::RD3),
            28 => Some(Register::RD4),
            32 => Some(Register::RE),
            33 => Some(Register::RE1),
            34 => Some(Register::RE2),
            35 => Some(Register::RE3),
            36 => Some(Register::RE4),
            40 => Some(Register::RF),
            41 => Some(Register::RF1),
            42 => Some(Register::RF2),
            43 => Some(Register::RF3),
            44 => Some(Register::RF4),
            48 => Some(Register::RSP),
            56 => Some(Register::RIP),
            64 => Some(Register::R0),
            _ => None,
        }
    }

    /// Byte offset into the register space
    #[inline]
    pub const fn offset(self) -> usize {
        self as usize
    }

    /// Operand byte as stored in an instruction word
    #[inline]
    pub const fn to_u8(self) -> u8 {
        self as u8
    }

    #[inline]
    pub fn is_zero(self) -> bool {
        self == Self::ZERO
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::RA => "RA",
            Self::RA1 => "RA1",
            Self::RA2 => "RA2",
            Self::RA3 => "RA3",
            Self::RA4 => "RA4",
            Self::RB => "RB",
            Self::RB1 => "RB1",
            Self::RB2 => "RB2",
            Self::RB3 => "RB3",
            Self::RB4 => "RB4",
            Self::RC => "RC",
            Self::RC1 => "RC1",
            Self::RC2 => "RC2",
            Self::RC3 => "RC3",
            Self::RC4 => "RC4",
            Self::RD => "RD",
            Self::RD1 => "RD1",
            Self::RD2 => "RD2",
            Self::RD3 => "RD3",
            Self::RD4 => "RD4",
            Self::RE => "RE",
            Self::RE1 => "RE1",
            Self::RE2 => "RE2",
            Self::RE3 => "RE3",
            Self::RE4 => "RE4",
            Self::RF => "RF",
            Self::RF1 => "RF1",
            Self::RF2 => "RF2",
            Self::RF3 => "RF3",
            Self::RF4 => "RF4",
            Self::RSP => "RSP",
            Self::RIP => "RIP",
            Self::R0 => "R0",
        }
    }
}

impl FromStr for Register {
    type Err = VpuError;

    /// Parse an assembly register name. Group registers take an optional
    /// sub-register digit in 0..=4 (`RA` and `RA0` name the same byte).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RSP" => return Ok(Register::RSP),
            "RIP" => return Ok(Register::RIP),
            "R0" => return Ok(Register::R0),
            _ => {}
        }

        let bytes = s.as_bytes();
        if bytes.len() < 2 || bytes.len() > 3 || bytes[0] != b'R' {
            return Err(VpuError::InvalidRegisterName(s.to_string()));
        }
        let base = match bytes[1] {
            b'A' => 0u8,
            b'B' => 8,
            b'C' => 16,
            b'D' => 24,
            b'E' => 32,
            b'F' => 40,
            _ => return Err(VpuError::InvalidRegisterName(s.to_string())),
        };
        let sub = match bytes.get(2) {
            None => 0,
            Some(d @ b'0'..=b'4') => d - b'0',
            Some(_) => return Err(VpuError::InvalidRegisterName(s.to_string())),
        };
        // base + sub is always a valid offset
        match Register::from_u8(base + sub) {
            Some(reg) => Ok(reg),
            None => Err(VpuError::InvalidRegisterName(s.to_string())),
        }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
