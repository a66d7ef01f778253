//! VPU Assembler
//!
//! Assemble VPU assembly language into executable programs.
//!
//! ## Example
//!
//! ```rust
//! use vpu_assembler::assemble;
//!
//! let source = r#"
//!     MOVV RA 5
//!     MOVV RB 7
//!     ADD RC RA RB
//!     HALT RC
//! "#;
//!
//! let program = assemble(source).unwrap();
//! assert_eq!(program.code.len(), 4);
//! ```

pub mod error;
pub mod lexer;
pub mod literal;
pub mod labels;
pub mod encoder;
pub mod session;
pub mod assembler;

pub use error::{AssemblerError, Diagnostic, Result};
pub use assembler::{assemble, assemble_file, assemble_with};
pub use labels::{LabelRecord, LabelTable, LabelValue};
pub use session::{FsResolver, IncludeResolver, MemoryResolver};
