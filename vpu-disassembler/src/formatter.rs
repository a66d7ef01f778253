//! Instruction formatting to assembly text
//!
//! Output uses the assembler's own surface syntax (uppercase mnemonics,
//! space-separated operands), so a formatted line assembles back to the
//! word it came from. Branch literals are relative deltas and print
//! signed; all other literals print unsigned.

use vpu_spec::Opcode;

use crate::decoder::{DecodedInstruction, DecodedOperands};

/// Format a decoded instruction as assembly text
pub fn format(instr: &DecodedInstruction) -> String {
    let mnemonic = instr.opcode.mnemonic();
    match instr.operands {
        DecodedOperands::None => mnemonic.to_string(),
        DecodedOperands::R(a) => format!("{} {}", mnemonic, a),
        DecodedOperands::Rr(a, b) => format!("{} {} {}", mnemonic, a, b),
        DecodedOperands::Rrr(a, b, c) => format!("{} {} {} {}", mnemonic, a, b, c),
        DecodedOperands::Rl(a, lit) => {
            format!("{} {} {}", mnemonic, a, format_literal(instr.opcode, lit))
        }
        DecodedOperands::EReg(a) => format!("{} {}", mnemonic, a),
        DecodedOperands::ELit(lit) => {
            format!("{} {}", mnemonic, format_literal(instr.opcode, lit))
        }
    }
}

fn format_literal(opcode: Opcode, lit: u16) -> String {
    if opcode.is_branch() {
        (lit as i16).to_string()
    } else {
        lit.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::decode;
    use vpu_spec::{Register, Word};

    #[test]
    fn test_format_none() {
        let instr = decode(Word::pack_none(Opcode::Ret)).unwrap();
        assert_eq!(format(&instr), "RET");
    }

    #[test]
    fn test_format_rrr() {
        let word = Word::pack_rrr(Opcode::Add, Register::RC, Register::RA, Register::RB);
        assert_eq!(format(&decode(word).unwrap()), "ADD RC RA RB");
    }

    #[test]
    fn test_format_sub_register() {
        let word = Word::pack_rr(Opcode::Mov8, Register::RA2, Register::RB);
        assert_eq!(format(&decode(word).unwrap()), "MOV8 RA2 RB");
    }

    #[test]
    fn test_format_literal_unsigned() {
        let word = Word::pack_rl(Opcode::Movv, Register::RA, 0xFFFF);
        assert_eq!(format(&decode(word).unwrap()), "MOVV RA 65535");
    }

    #[test]
    fn test_format_branch_literal_signed() {
        let word = Word::pack_rl(Opcode::Jmpf, Register::RA, (-3i16) as u16);
        assert_eq!(format(&decode(word).unwrap()), "JMPF RA -3");

        let word = Word::pack_e_lit(Opcode::Jmp, (-1i16) as u16);
        assert_eq!(format(&decode(word).unwrap()), "JMP -1");
    }

    #[test]
    fn test_format_e_register_form() {
        let word = Word::pack_e_reg(Opcode::Halt, Register::RA);
        assert_eq!(format(&decode(word).unwrap()), "HALT RA");
    }
}
