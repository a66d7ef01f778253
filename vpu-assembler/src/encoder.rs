//! Instruction encoding
//!
//! Operand resolution happens in the assembler driver; this module turns a
//! resolved operand set into a packed word and enforces the 16-bit literal
//! range rule.

use vpu_spec::{Opcode, Register, Word};

/// Resolved operands, shaped by the opcode's profile
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ResolvedOperands {
    None,
    R(Register),
    Rr(Register, Register),
    Rrr(Register, Register, Register),
    Rl(Register, u16),
    EReg(Register),
    ELit(u16),
}

/// Pack one instruction word
pub fn encode(op: Opcode, operands: ResolvedOperands) -> Word {
    match operands {
        ResolvedOperands::None => Word::pack_none(op),
        ResolvedOperands::R(a) => Word::pack_r(op, a),
        ResolvedOperands::Rr(a, b) => Word::pack_rr(op, a, b),
        ResolvedOperands::Rrr(a, b, c) => Word::pack_rrr(op, a, b, c),
        ResolvedOperands::Rl(a, lit) => Word::pack_rl(op, a, lit),
        ResolvedOperands::EReg(a) => Word::pack_e_reg(op, a),
        ResolvedOperands::ELit(lit) => Word::pack_e_lit(op, lit),
    }
}

/// An unsigned literal survives the slot only below 2^16
pub fn fit_unsigned(value: u64) -> Option<u16> {
    u16::try_from(value).ok()
}

/// A signed literal encodes two's-complement in 16 bits
pub fn fit_signed(value: i64) -> Option<u16> {
    i16::try_from(value).ok().map(|v| v as u16)
}
