//! # Error Types for the VPU Specification

use thiserror::Error;

pub type Result<T> = std::result::Result<T, VpuError>;

#[derive(Debug, Error)]
pub enum VpuError {
    // Container format errors
    #[error("Invalid executable magic: expected \"VPU:\", got {0:02x?}")]
    InvalidMagic([u8; 4]),

    #[error("Truncated executable: need at least {expected} bytes, found {found}")]
    Truncated { expected: usize, found: usize },

    #[error("Invalid metadata size {meta_size} for a {total} byte executable")]
    InvalidMetadataSize { meta_size: u64, total: usize },

    #[error("Static memory size header says {header} bytes but the blob holds {actual}")]
    StaticSizeMismatch { header: u64, actual: usize },

    #[error("Program section is {0} bytes, not a multiple of the 4-byte word size")]
    MisalignedProgram(usize),

    #[error("Entry point {entry} is outside the program ({len} instructions)")]
    EntryOutOfRange { entry: u64, len: usize },

    // Instruction errors
    #[error("Invalid opcode: {0:#04x}")]
    InvalidOpcode(u8),

    #[error("Invalid register operand byte: {0:#04x}")]
    InvalidRegister(u8),

    #[error("Invalid register name: '{0}'")]
    InvalidRegisterName(String),
}
