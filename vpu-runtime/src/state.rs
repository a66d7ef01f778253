//! Register file
//!
//! The register file is one flat byte array. A register name is an offset
//! into it, and the sub-register names (`RA1`..`RA4`) are just offsets into
//! the middle of their parent's eight bytes, so a narrow write through a
//! sub-register lands inside the parent's value. All accessors go through
//! little-endian byte conversion so the in-memory layout is the wire layout.

use vpu_spec::{Register, REGISTER_SPACE_SIZE};

#[derive(Clone)]
pub struct RegisterFile {
    bytes: [u8; REGISTER_SPACE_SIZE],
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterFile {
    pub fn new() -> Self {
        Self {
            bytes: [0; REGISTER_SPACE_SIZE],
        }
    }

    #[inline]
    pub fn read_u8(&self, reg: Register) -> u8 {
        self.bytes[reg.offset()]
    }

    #[inline]
    pub fn read_u16(&self, reg: Register) -> u16 {
        let o = reg.offset();
        u16::from_le_bytes([self.bytes[o], self.bytes[o + 1]])
    }

    #[inline]
    pub fn read_u32(&self, reg: Register) -> u32 {
        let o = reg.offset();
        let mut buf = [0u8; 4];
        buf.copy_from_slice(&self.bytes[o..o + 4]);
        u32::from_le_bytes(buf)
    }

    #[inline]
    pub fn read_u64(&self, reg: Register) -> u64 {
        let o = reg.offset();
        let mut buf = [0u8; 8];
        buf.copy_from_slice(&self.bytes[o..o + 8]);
        u64::from_le_bytes(buf)
    }

    #[inline]
    pub fn read_i8(&self, reg: Register) -> i8 {
        self.read_u8(reg) as i8
    }

    #[inline]
    pub fn read_i64(&self, reg: Register) -> i64 {
        self.read_u64(reg) as i64
    }

    #[inline]
    pub fn read_f32(&self, reg: Register) -> f32 {
        f32::from_bits(self.read_u32(reg))
    }

    #[inline]
    pub fn read_f64(&self, reg: Register) -> f64 {
        f64::from_bits(self.read_u64(reg))
    }

    // Writes through R0 are dropped; it always reads as zero.

    #[inline]
    pub fn write_u8(&mut self, reg: Register, value: u8) {
        if !reg.is_zero() {
            self.bytes[reg.offset()] = value;
        }
    }

    #[inline]
    pub fn write_u16(&mut self, reg: Register, value: u16) {
        if !reg.is_zero() {
            let o = reg.offset();
            self.bytes[o..o + 2].copy_from_slice(&value.to_le_bytes());
        }
    }

    #[inline]
    pub fn write_u32(&mut self, reg: Register, value: u32) {
        if !reg.is_zero() {
            let o = reg.offset();
            self.bytes[o..o + 4].copy_from_slice(&value.to_le_bytes());
        }
    }

    #[inline]
    pub fn write_u64(&mut self, reg: Register, value: u64) {
        if !reg.is_zero() {
            let o = reg.offset();
            self.bytes[o..o + 8].copy_from_slice(&value.to_le_bytes());
        }
    }

    #[inline]
    pub fn write_i64(&mut self, reg: Register, value: i64) {
        self.write_u64(reg, value as u64);
    }

    #[inline]
    pub fn write_f32(&mut self, reg: Register, value: f32) {
        self.write_u32(reg, value.to_bits());
    }

    #[inline]
    pub fn write_f64(&mut self, reg: Register, value: f64) {
        self.write_u64(reg, value.to_bits());
    }

    #[inline]
    pub fn rip(&self) -> u64 {
        self.read_u64(Register::RIP)
    }

    #[inline]
    pub fn set_rip(&mut self, value: u64) {
        self.write_u64(Register::RIP, value);
    }

    #[inline]
    pub fn rsp(&self) -> u64 {
        self.read_u64(Register::RSP)
    }

    #[inline]
    pub fn set_rsp(&mut self, value: u64) {
        self.write_u64(Register::RSP, value);
    }
}

impl std::fmt::Debug for RegisterFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterFile")
            .field("RA", &self.read_u64(Register::RA))
            .field("RB", &self.read_u64(Register::RB))
            .field("RC", &self.read_u64(Register::RC))
            .field("RD", &self.read_u64(Register::RD))
            .field("RE", &self.read_u64(Register::RE))
            .field("RF", &self.read_u64(Register::RF))
            .field("RSP", &self.rsp())
            .field("RIP", &self.rip())
            .finish()
    }
}

/// Why a run stopped
#[derive(Debug, Clone, PartialEq)]
pub enum HaltReason {
    /// HALT instruction with its status operand
    Halt(i64),
    /// Execution ran off the end of the program
    EndOfProgram,
    /// Cycle budget exhausted
    CycleLimit,
    /// Instruction byte matched no opcode
    InvalidOpcode { ip: u64, byte: u8 },
    /// The syscall plane reported failure
    SyscallFailed { ip: u64, id: u64 },
    /// An unrecoverable runtime fault
    Fault(String),
}

impl HaltReason {
    /// Process-style exit status for the run
    pub fn status(&self) -> i64 {
        match self {
            HaltReason::Halt(status) => *status,
            HaltReason::EndOfProgram => 0,
            _ => 1,
        }
    }
}
