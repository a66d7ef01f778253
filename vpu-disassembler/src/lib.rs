//! # VPU Disassembler
//!
//! Decode VPU instruction words back into assembly text.
//!
//! The decoder consumes the same operand-profile table the assembler's
//! encoder uses, so every word the assembler emits decodes losslessly, and
//! the formatter prints the assembler's own surface syntax. Debuggers use
//! [`decode`] for structured access; [`disassemble`] produces a full
//! listing.
//!
//! ## Example
//!
//! ```rust
//! use vpu_disassembler::disassemble;
//!
//! let program = vpu_assembler::assemble("MOVV RA 5\nHALT RA\n").unwrap();
//! let listing = disassemble(&program).unwrap();
//! assert!(listing.contains("MOVV RA 5"));
//! ```

pub mod error;
pub mod decoder;
pub mod formatter;
pub mod disassembler;

pub use decoder::{decode, DecodedInstruction, DecodedOperands};
pub use disassembler::disassemble;
pub use error::{DisassemblerError, Result};
pub use formatter::format;

#[cfg(test)]
mod tests {
    use super::*;
    use vpu_spec::{Opcode, Register, Word};

    #[test]
    fn test_public_exports() {
        let _ = DisassemblerError::UnknownOpcode(0xFF);
        let instr = decode(Word::pack_r(Opcode::Pop, Register::RA)).unwrap();
        assert_eq!(format(&instr), "POP RA");
    }
}
