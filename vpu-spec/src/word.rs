//! Packed 32-bit instruction words
//!
//! ```text
//! bits 0..8    opcode byte
//! bits 8..16   register slot 1            (R, RR, RRR, RL, E with bit 31 clear)
//! bits 16..24  register slot 2            (RR, RRR)
//! bits 24..32  register slot 3            (RRR)
//! bits 8..24   16-bit literal             (E with bit 31 set)
//! bits 16..32  16-bit literal             (RL)
//! bit 31       E-profile hint: 1 = literal operand
//! ```
//!
//! Register operand bytes never exceed 64, so bit 31 is free for the hint.

use crate::opcode::Opcode;
use crate::register::Register;

/// E-profile literal hint bit
pub const E_LITERAL_HINT: u32 = 1 << 31;

/// A packed instruction word
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Word(pub u32);

impl Word {
    /// Opcode byte (bits 0..8)
    #[inline]
    pub const fn opcode_byte(self) -> u8 {
        (self.0 & Opcode::MASK) as u8
    }

    /// Decoded opcode, if the byte names one
    #[inline]
    pub fn opcode(self) -> Option<Opcode> {
        Opcode::from_u8(self.opcode_byte())
    }

    /// Register slot 1 (bits 8..16)
    #[inline]
    pub const fn r1(self) -> u8 {
        (self.0 >> 8) as u8
    }

    /// Register slot 2 (bits 16..24)
    #[inline]
    pub const fn r2(self) -> u8 {
        (self.0 >> 16) as u8
    }

    /// Register slot 3 (bits 24..32)
    #[inline]
    pub const fn r3(self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// E-profile literal (bits 8..24)
    #[inline]
    pub const fn l1(self) -> u16 {
        (self.0 >> 8) as u16
    }

    /// RL-profile literal (bits 16..32)
    #[inline]
    pub const fn l2(self) -> u16 {
        (self.0 >> 16) as u16
    }

    /// E-profile hint: true when the operand is a literal
    #[inline]
    pub const fn e_is_literal(self) -> bool {
        self.0 & E_LITERAL_HINT != 0
    }

    // ======================= packing =======================

    pub const fn pack_none(op: Opcode) -> Word {
        Word(op.to_u8() as u32)
    }

    pub const fn pack_r(op: Opcode, r1: Register) -> Word {
        Word(op.to_u8() as u32 | (r1.to_u8() as u32) << 8)
    }

    pub const fn pack_rr(op: Opcode, r1: Register, r2: Register) -> Word {
        Word(op.to_u8() as u32 | (r1.to_u8() as u32) << 8 | (r2.to_u8() as u32) << 16)
    }

    pub const fn pack_rrr(op: Opcode, r1: Register, r2: Register, r3: Register) -> Word {
        Word(
            op.to_u8() as u32
                | (r1.to_u8() as u32) << 8
                | (r2.to_u8() as u32) << 16
                | (r3.to_u8() as u32) << 24,
        )
    }

    pub const fn pack_rl(op: Opcode, r1: Register, lit: u16) -> Word {
        Word(op.to_u8() as u32 | (r1.to_u8() as u32) << 8 | (lit as u32) << 16)
    }

    pub const fn pack_e_reg(op: Opcode, r1: Register) -> Word {
        Word(op.to_u8() as u32 | (r1.to_u8() as u32) << 8)
    }

    pub const fn pack_e_lit(op: Opcode, lit: u16) -> Word {
        Word(op.to_u8() as u32 | (lit as u32) << 8 | E_LITERAL_HINT)
    }
}

impl From<u32> for Word {
    fn from(raw: u32) -> Self {
        Word(raw)
    }
}

impl From<Word> for u32 {
    fn from(word: Word) -> Self {
        word.0
    }
}
