//! Instruction decoder
//!
//! Decoding is table-driven: the opcode byte selects an [`OperandProfile`]
//! and a uniform per-profile match extracts the operand fields. No opcode
//! gets bespoke plumbing, so a new opcode only touches the profile table in
//! `vpu-spec`.

use vpu_spec::{Opcode, OperandProfile, Register, Word};

use crate::error::{DisassemblerError, Result};

/// Operands of a decoded instruction, by profile
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DecodedOperands {
    /// NONE profile
    None,
    /// R profile
    R(Register),
    /// RR profile
    Rr(Register, Register),
    /// RRR profile
    Rrr(Register, Register, Register),
    /// RL profile: register + 16-bit literal
    Rl(Register, u16),
    /// E profile, register form
    EReg(Register),
    /// E profile, literal form
    ELit(u16),
}

/// A fully decoded instruction word
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DecodedInstruction {
    pub opcode: Opcode,
    pub operands: DecodedOperands,
}

/// Decode a 32-bit instruction word
pub fn decode(word: Word) -> Result<DecodedInstruction> {
    let opcode = word
        .opcode()
        .ok_or(DisassemblerError::UnknownOpcode(word.opcode_byte()))?;

    let operands = match opcode.profile() {
        OperandProfile::None => DecodedOperands::None,
        OperandProfile::R => DecodedOperands::R(reg(word, word.r1())?),
        OperandProfile::Rr => DecodedOperands::Rr(reg(word, word.r1())?, reg(word, word.r2())?),
        OperandProfile::Rrr => DecodedOperands::Rrr(
            reg(word, word.r1())?,
            reg(word, word.r2())?,
            reg(word, word.r3())?,
        ),
        OperandProfile::Rl => DecodedOperands::Rl(reg(word, word.r1())?, word.l2()),
        OperandProfile::E => {
            if word.e_is_literal() {
                DecodedOperands::ELit(word.l1())
            } else {
                DecodedOperands::EReg(reg(word, word.r1())?)
            }
        }
    };

    Ok(DecodedInstruction { opcode, operands })
}

fn reg(word: Word, byte: u8) -> Result<Register> {
    Register::from_u8(byte).ok_or(DisassemblerError::InvalidRegister {
        word: word.0,
        byte,
    })
}
