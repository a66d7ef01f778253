//! Assembler errors and diagnostics

use std::fmt;
use thiserror::Error;

/// One located assembly error. The assembler keeps scanning after emitting a
/// diagnostic so a single run reports as many problems as possible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub file: String,
    pub line: u32,
    pub column: u32,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}: {}",
            self.file, self.line, self.column, self.message
        )
    }
}

#[derive(Debug, Error)]
pub enum AssemblerError {
    #[error("assembly failed with {} error(s)", .0.len())]
    Failed(Vec<Diagnostic>),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AssemblerError {
    /// Diagnostics carried by a failed assembly (empty for I/O errors)
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            AssemblerError::Failed(diags) => diags,
            AssemblerError::Io(_) => &[],
        }
    }
}

pub type Result<T> = std::result::Result<T, AssemblerError>;
