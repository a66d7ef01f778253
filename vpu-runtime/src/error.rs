//! Runtime error types

use thiserror::Error;
use vpu_spec::VpuError;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Spec error: {0}")]
    Spec(#[from] VpuError),

    #[error("Memory out of bounds: address {address:#x} ({width} bytes)")]
    OutOfBounds { address: u64, width: u64 },

    #[error("Write to read-only memory at {address:#x}")]
    ReadOnly { address: u64 },

    #[error("Data stack overflow at IP {ip}")]
    StackOverflow { ip: u64 },

    #[error("Data stack underflow at IP {ip}")]
    StackUnderflow { ip: u64 },

    #[error("Division by zero at IP {ip}")]
    DivisionByZero { ip: u64 },

    #[error("Allocation of {size} bytes exceeds the heap limit")]
    HeapExhausted { size: u64 },

    #[error("FREE of {address:#x} which is not a live allocation")]
    InvalidFree { address: u64 },

    #[error("EXEC of another EXEC at IP {ip}")]
    NestedExec { ip: u64 },

    #[error("Unknown stream {stream}")]
    UnknownStream { stream: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RuntimeError>;
