//! # VPU Specification
//!
//! Shared contract between the assembler, the runtime and the disassembler.
//!
//! ## Key Features
//! - 32-bit packed instruction words (opcode byte + up to three operand bytes)
//! - Closed ISA of ~90 byte-valued opcodes grouped by family
//! - Flat byte-addressed register file with sub-register aliasing
//! - Six operand profiles (NONE, R, RR, RRR, RL, E)
//! - Executable container ("VPU:" magic) carrying static memory, entry point
//!   and the flat instruction array

pub mod register;
pub mod opcode;
pub mod word;
pub mod error;
pub mod program;

pub use register::{Register, REGISTER_SPACE_SIZE};
pub use opcode::{Opcode, OperandProfile, ALL_OPCODES};
pub use word::Word;
pub use error::VpuError;
pub use program::Program;

/// Magic tag for VPU executables: "VPU:"
pub const MAGIC: [u8; 4] = *b"VPU:";

/// Memory layout constants (u64 address space, region-tagged)
pub const STATIC_BASE: u64 = 0x1000_0000;
pub const STACK_BASE: u64 = 0x2000_0000;
pub const HEAP_BASE: u64 = 0x3000_0000;

/// Default sizes
pub const DEFAULT_STACK_SLOTS: usize = 1 << 16; // 64 K u64 slots
pub const DEFAULT_HEAP_LIMIT: u64 = 1 << 24; // 16 MB

/// Address type (VM address, not a host pointer)
pub type Address = u64;
