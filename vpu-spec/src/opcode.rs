//! # VPU Opcode Definitions
//!
//! This module defines the opcode byte values for all VPU instructions.
//!
//! ## Opcode Encoding
//!
//! Opcodes occupy the low byte of the instruction word and are organized by
//! family:
//! - 0x00-0x01: Control (NOP, HALT)
//! - 0x02-0x09: Moves (MOV8..MOV, MOVV, MOVV16, MOVN, MOVC)
//! - 0x0A-0x0F: Stack / static (PUSH, POP, GET, PUT, GSP, STATIC)
//! - 0x10-0x1D: Memory (READ*, WRITE*, MEMSET, MEMCPY, MEMMOV, MEMCMP, MALLOC, FREE)
//! - 0x20-0x26: Logic (NOT, NEG, AND, NAND, OR, XOR, BSHIFT)
//! - 0x28-0x2C: Branch (JMP, JMPF, JMPFN, CALL, RET)
//! - 0x30-0x3D: Integer arithmetic (ADD8..MUL, DIVI, DIVU)
//! - 0x40-0x49: Float arithmetic + increments (ADDF..DIVF, INC, DEC, INCF, DECF, ABS, ABSF)
//! - 0x50-0x59: Compare (EQ..SMLF)
//! - 0x60-0x68: Casts (CASTIU..CF6432, FLOAT)
//! - 0x70-0x73: Character / file I/O (PUTC, GETC, FOPEN, FCLOSE)
//! - 0xF0-0xFE: System (EXEC, SYS, DISREG)

use serde::{Deserialize, Serialize};

/// Operand profile: how the three operand bytes of a word are interpreted.
///
/// The encoder and the decoder consult this table once per opcode and then
/// run a uniform per-slot loop; no opcode gets bespoke operand plumbing.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperandProfile {
    /// No operands
    None,
    /// One register byte at bits 8..16
    R,
    /// Register bytes at bits 8..16 and 16..24
    Rr,
    /// Register bytes at bits 8..16, 16..24 and 24..32
    Rrr,
    /// Register byte at bits 8..16, 16-bit literal at bits 16..32
    Rl,
    /// Either: bit 31 clear, register byte at bits 8..16;
    /// or: bit 31 set, 16-bit literal at bits 8..24
    E,
}

impl OperandProfile {
    /// Number of register slots the profile carries
    pub const fn register_slots(self) -> usize {
        match self {
            OperandProfile::None | OperandProfile::E => 0,
            OperandProfile::R | OperandProfile::Rl => 1,
            OperandProfile::Rr => 2,
            OperandProfile::Rrr => 3,
        }
    }

    /// Whether the profile carries a 16-bit literal slot
    pub const fn has_literal(self) -> bool {
        matches!(self, OperandProfile::Rl)
    }
}

impl std::fmt::Display for OperandProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            OperandProfile::None => "NONE",
            OperandProfile::R => "R",
            OperandProfile::Rr => "RR",
            OperandProfile::Rrr => "RRR",
            OperandProfile::Rl => "RL",
            OperandProfile::E => "E",
        };
        write!(f, "{}", name)
    }
}

/// Instruction opcode (low byte of the word)
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Opcode {
    // ========== Control (0x00-0x01) ==========
    /// NOP: no operation
    Nop = 0x00,
    /// HALT: stop with status from the operand's low byte (signed)
    Halt = 0x01,

    // ========== Moves (0x02-0x09) ==========
    /// MOV8: r1[0..1] = r2[0..1]
    Mov8 = 0x02,
    /// MOV16: r1[0..2] = r2[0..2]
    Mov16 = 0x03,
    /// MOV32: r1[0..4] = r2[0..4]
    Mov32 = 0x04,
    /// MOV: r1 = r2
    Mov = 0x05,
    /// MOVV: r1 = zero_extend(lit)
    Movv = 0x06,
    /// MOVV16: r1[0..2] = lit
    Movv16 = 0x07,
    /// MOVN: r1 = !zero_extend(lit)
    Movn = 0x08,
    /// MOVC: if r1 != 0 { r2 = r3 }
    Movc = 0x09,

    // ========== Stack / static (0x0A-0x0F) ==========
    /// PUSH: stack[sp++] = operand (register value or literal)
    Push = 0x0A,
    /// POP: r1 = stack[--sp]
    Pop = 0x0B,
    /// GET: r1 = stack[sp - lit]
    Get = 0x0C,
    /// PUT: stack[sp - lit] = r1
    Put = 0x0D,
    /// GSP: r1 = STACK_BASE + r2 * 8 + r3 (byte address into the stack)
    Gsp = 0x0E,
    /// STATIC: stack[sp++] = STATIC_BASE + operand
    Static = 0x0F,

    // ========== Memory (0x10-0x1D) ==========
    /// READ8: r1[0..1] = mem[r2 + r3 as i64]
    Read8 = 0x10,
    /// READ16: r1[0..2] = mem[r2 + r3 as i64]
    Read16 = 0x11,
    /// READ32: r1[0..4] = mem[r2 + r3 as i64]
    Read32 = 0x12,
    /// READ: r1 = mem[r2 + r3 as i64]
    Read = 0x13,
    /// WRITE8: mem[r1 + r3 as i64] = r2[0..1]
    Write8 = 0x14,
    /// WRITE16: mem[r1 + r3 as i64] = r2[0..2]
    Write16 = 0x15,
    /// WRITE32: mem[r1 + r3 as i64] = r2[0..4]
    Write32 = 0x16,
    /// WRITE: mem[r1 + r3 as i64] = r2
    Write = 0x17,
    /// MEMSET: mem[r1..r1 + r3] = r2[0]
    Memset = 0x18,
    /// MEMCPY: mem[r1..r1 + r3] = mem[r2..r2 + r3]
    Memcpy = 0x19,
    /// MEMMOV: overlap-safe MEMCPY
    Memmov = 0x1A,
    /// MEMCMP: r1 = compare bytes at r1/r2 over r3 (0 equal, 1/-1 order)
    Memcmp = 0x1B,
    /// MALLOC: r1 = alloc(r2) or 0
    Malloc = 0x1C,
    /// FREE: free(r1)
    Free = 0x1D,

    // ========== Logic (0x20-0x26) ==========
    /// NOT: r1 = (r2 == 0) ? 1 : 0
    Not = 0x20,
    /// NEG: r1 = !r2 | r3
    Neg = 0x21,
    /// AND: r1 = r2 & r3
    And = 0x22,
    /// NAND: r1 = !(r2 & r3)
    Nand = 0x23,
    /// OR: r1 = r2 | r3
    Or = 0x24,
    /// XOR: r1 = r2 ^ r3
    Xor = 0x25,
    /// BSHIFT: r1 = r3 < 0 ? r2 >> -r3 : r2 << r3
    Bshift = 0x26,

    // ========== Branch (0x28-0x2C) ==========
    /// JMP: RIP += 1 + delta
    Jmp = 0x28,
    /// JMPF: if r1 != 0 { RIP += 1 + delta }
    Jmpf = 0x29,
    /// JMPFN: if r1 == 0 { RIP += 1 + delta }
    Jmpfn = 0x2A,
    /// CALL: stack[sp++] = RIP + 1; RIP += 1 + delta
    Call = 0x2B,
    /// RET: RIP = stack[--sp]
    Ret = 0x2C,

    // ========== Integer arithmetic (0x30-0x3D) ==========
    /// ADD8: r1[0..1] = r2 + r3 (wrapping u8)
    Add8 = 0x30,
    /// SUB8: r1[0..1] = r2 - r3 (wrapping u8)
    Sub8 = 0x31,
    /// MUL8: r1[0..1] = r2 * r3 (wrapping u8)
    Mul8 = 0x32,
    /// ADD16: r1[0..2] = r2 + r3 (wrapping u16)
    Add16 = 0x33,
    /// SUB16: r1[0..2] = r2 - r3 (wrapping u16)
    Sub16 = 0x34,
    /// MUL16: r1[0..2] = r2 * r3 (wrapping u16)
    Mul16 = 0x35,
    /// ADD32: r1[0..4] = r2 + r3 (wrapping u32)
    Add32 = 0x36,
    /// SUB32: r1[0..4] = r2 - r3 (wrapping u32)
    Sub32 = 0x37,
    /// MUL32: r1[0..4] = r2 * r3 (wrapping u32)
    Mul32 = 0x38,
    /// ADD: r1 = r2 + r3 (wrapping u64)
    Add = 0x39,
    /// SUB: r1 = r2 - r3 (wrapping u64)
    Sub = 0x3A,
    /// MUL: r1 = r2 * r3 (wrapping u64)
    Mul = 0x3B,
    /// DIVI: r1 = r2 / r3 (signed, faults on zero)
    Divi = 0x3C,
    /// DIVU: r1 = r2 / r3 (unsigned, faults on zero)
    Divu = 0x3D,

    // ========== Float arithmetic + increments (0x40-0x49) ==========
    /// ADDF: r1 = r2 + r3 (f64)
    Addf = 0x40,
    /// SUBF: r1 = r2 - r3 (f64)
    Subf = 0x41,
    /// MULF: r1 = r2 * r3 (f64)
    Mulf = 0x42,
    /// DIVF: r1 = r2 / r3 (f64)
    Divf = 0x43,
    /// INC: r1 += lit
    Inc = 0x44,
    /// DEC: r1 -= lit
    Dec = 0x45,
    /// INCF: r1 = r1 as f64 + lit as f64
    Incf = 0x46,
    /// DECF: r1 = r1 as f64 - lit as f64
    Decf = 0x47,
    /// ABS: r1 = |r2 - r3| (signed)
    Abs = 0x48,
    /// ABSF: r1 = |r2 - r3| (f64)
    Absf = 0x49,

    // ========== Compare (0x50-0x59) ==========
    /// EQ: r1 = (r2 == r3)
    Eq = 0x50,
    /// NEQ: r1 = (r2 != r3)
    Neq = 0x51,
    /// EQF: r1 = (r2 == r3) (f64)
    Eqf = 0x52,
    /// NEQF: r1 = (r2 != r3) (f64)
    Neqf = 0x53,
    /// BIGI: r1 = (r2 > r3) (signed)
    Bigi = 0x54,
    /// BIGU: r1 = (r2 > r3) (unsigned)
    Bigu = 0x55,
    /// BIGF: r1 = (r2 > r3) (f64)
    Bigf = 0x56,
    /// SMLI: r1 = (r2 < r3) (signed)
    Smli = 0x57,
    /// SMLU: r1 = (r2 < r3) (unsigned)
    Smlu = 0x58,
    /// SMLF: r1 = (r2 < r3) (f64)
    Smlf = 0x59,

    // ========== Casts (0x60-0x68) ==========
    /// CASTIU: r1 = r2 as i64 as u64
    Castiu = 0x60,
    /// CASTIF: r1 = r2 as f64 as i64 (saturating)
    Castif = 0x61,
    /// CASTUI: r1 = r2 as i64 as u64
    Castui = 0x62,
    /// CASTUF: r1 = r2 as f64 as u64 (saturating)
    Castuf = 0x63,
    /// CASTFI: r1 = r2 as i64 as f64
    Castfi = 0x64,
    /// CASTFU: r1 = r2 as u64 as f64
    Castfu = 0x65,
    /// CF3264: r1 = r2 as f64 as f32
    Cf3264 = 0x66,
    /// CF6432: r1 = r2 as f32 as f64
    Cf6432 = 0x67,
    /// FLOAT: r1 = r2 as i64 as f64 / r3 as u64 as f64
    Float = 0x68,

    // ========== Character / file I/O (0x70-0x73) ==========
    /// PUTC: write r1's low byte to stream r2 (0 stdout, 1 stderr, else a
    /// file handle), flush if r3 != 0
    Putc = 0x70,
    /// GETC: r1 = next stdin byte, or -1 at end of input
    Getc = 0x71,
    /// FOPEN: r1 = handle for NUL-terminated path at address r2, 0 on failure
    Fopen = 0x72,
    /// FCLOSE: close handle r1
    Fclose = 0x73,

    // ========== System (0xF0-0xFE) ==========
    /// EXEC: execute r1's low 32 bits as an instruction word
    Exec = 0xF0,
    /// SYS: host call, id from the operand; a non-zero status halts
    Sys = 0xFD,
    /// DISREG: debug-print register r1
    Disreg = 0xFE,
}

impl Opcode {
    /// Opcode mask (low byte of the word)
    pub const MASK: u32 = 0xFF;

    /// Try to convert from u8
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            // Control
            0x00 => Some(Opcode::Nop),
            0x01 => Some(Opcode::Halt),

            // Moves
            0x02 => Some(Opcode::Mov8),
            0x03 => Some(Opcode::Mov16),
            0x04 => Some(Opcode::Mov32),
            0x05 => Some(Opcode::Mov),
            0x06 => Some(Opcode::Movv),
            0x07 => Some(Opcode::Movv16),
            0x08 => Some(Opcode::Movn),
            0x09 => Some(Opcode::Movc),

            // Stack / static
            0x0A => Some(Opcode::Push),
            0x0B => Some(Opcode::Pop),
            0x0C => Some(Opcode::Get),
            0x0D => Some(Opcode::Put),
            0x0E => Some(Opcode::Gsp),
            0x0F => Some(Opcode::Static),

            // Memory
            0x10 => Some(Opcode::Read8),
            0x11 => Some(Opcode::Read16),
            0x12 => Some(Opcode::Read32),
            0x13 => Some(Opcode::Read),
            0x14 => Some(Opcode::Write8),
            0x15 => Some(Opcode::Write16),
            0x16 => Some(Opcode::Write32),
            0x17 => Some(Opcode::Write),
            0x18 => Some(Opcode::Memset),
            0x19 => Some(Opcode::Memcpy),
            0x1A => Some(Opcode::Memmov),
            0x1B => Some(Opcode::Memcmp),
            0x1C => Some(Opcode::Malloc),
            0x1D => Some(Opcode::Free),

            // Logic
            0x20 => Some(Opcode::Not),
            0x21 => Some(Opcode::Neg),
            0x22 => Some(Opcode::And),
            0x23 => Some(Opcode::Nand),
            0x24 => Some(Opcode::Or),
            0x25 => Some(Opcode::Xor),
            0x26 => Some(Opcode::Bshift),

            // Branch
            0x28 => Some(Opcode::Jmp),
            0x29 => Some(Opcode::Jmpf),
            0x2A => Some(Opcode::Jmpfn),
            0x2B => Some(Opcode::Call),
            0x2C => Some(Opcode::Ret),

            // Integer arithmetic
            0x30 => Some(Opcode::Add8),
            0x31 => Some(Opcode::Sub8),
            0x32 => Some(Opcode::Mul8),
            0x33 => Some(Opcode::Add16),
            0x34 => Some(Opcode::Sub16),
            0x35 => Some(Opcode::Mul16),
            0x36 => Some(Opcode::Add32),
            0x37 => Some(Opcode::Sub32),
            0x38 => Some(Opcode::Mul32),
            0x39 => Some(Opcode::Add),
            0x3A => Some(Opcode::Sub),
            0x3B => Some(Opcode::Mul),
            0x3C => Some(Opcode::Divi),
            0x3D => Some(Opcode::Divu),

            // Float arithmetic + increments
            0x40 => Some(Opcode::Addf),
            0x41 => Some(Opcode::Subf),
            0x42 => Some(Opcode::Mulf),
            0x43 => Some(Opcode::Divf),
            0x44 => Some(Opcode::Inc),
            0x45 => Some(Opcode::Dec),
            0x46 => Some(Opcode::Incf),
            0x47 => Some(Opcode::Decf),
            0x48 => Some(Opcode::Abs),
            0x49 => Some(Opcode::Absf),

            // Compare
            0x50 => Some(Opcode::Eq),
            0x51 => Some(Opcode::Neq),
            0x52 => Some(Opcode::Eqf),
            0x53 => Some(Opcode::Neqf),
            0x54 => Some(Opcode::Bigi),
            0x55 => Some(Opcode::Bigu),
            0x56 => Some(Opcode::Bigf),
            0x57 => Some(Opcode::Smli),
            0x58 => Some(Opcode::Smlu),
            0x59 => Some(Opcode::Smlf),

            // Casts
            0x60 => Some(Opcode::Castiu),
            0x61 => Some(Opcode::Castif),
            0x62 => Some(Opcode::Castui),
            0x63 => Some(Opcode::Castuf),
            0x64 => Some(Opcode::Castfi),
            0x65 => Some(Opcode::Castfu),
            0x66 => Some(Opcode::Cf3264),
            0x67 => Some(Opcode::Cf6432),
            0x68 => Some(Opcode::Float),

            // Character / file I/O
            0x70 => Some(Opcode::Putc),
            0x71 => Some(Opcode::Getc),
            0x72 => Some(Opcode::Fopen),
            0x73 => Some(Opcode::Fclose),

            // System
            0xF0 => Some(Opcode::Exec),
            0xFD => Some(Opcode::Sys),
            0xFE => Some(Opcode::Disreg),

            _ => None,
        }
    }

    /// Convert to u8
    #[inline]
    pub const fn to_u8(self) -> u8 {
        self as u8
    }

    /// Look up an opcode by its assembly mnemonic (case-sensitive, uppercase)
    pub fn from_mnemonic(mnemonic: &str) -> Option<Self> {
        ALL_OPCODES
            .iter()
            .copied()
            .find(|op| op.mnemonic() == mnemonic)
    }

    /// Assembly mnemonic
    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Nop => "NOP",
            Opcode::Halt => "HALT",
            Opcode::Mov8 => "MOV8",
            Opcode::Mov16 => "MOV16",
            Opcode::Mov32 => "MOV32",
            Opcode::Mov => "MOV",
            Opcode::Movv => "MOVV",
            Opcode::Movv16 => "MOVV16",
            Opcode::Movn => "MOVN",
            Opcode::Movc => "MOVC",
            Opcode::Push => "PUSH",
            Opcode::Pop => "POP",
            Opcode::Get => "GET",
            Opcode::Put => "PUT",
            Opcode::Gsp => "GSP",
            Opcode::Static => "STATIC",
            Opcode::Read8 => "READ8",
            Opcode::Read16 => "READ16",
            Opcode::Read32 => "READ32",
            Opcode::Read => "READ",
            Opcode::Write8 => "WRITE8",
            Opcode::Write16 => "WRITE16",
            Opcode::Write32 => "WRITE32",
            Opcode::Write => "WRITE",
            Opcode::Memset => "MEMSET",
            Opcode::Memcpy => "MEMCPY",
            Opcode::Memmov => "MEMMOV",
            Opcode::Memcmp => "MEMCMP",
            Opcode::Malloc => "MALLOC",
            Opcode::Free => "FREE",
            Opcode::Not => "NOT",
            Opcode::Neg => "NEG",
            Opcode::And => "AND",
            Opcode::Nand => "NAND",
            Opcode::Or => "OR",
            Opcode::Xor => "XOR",
            Opcode::Bshift => "BSHIFT",
            Opcode::Jmp => "JMP",
            Opcode::Jmpf => "JMPF",
            Opcode::Jmpfn => "JMPFN",
            Opcode::Call => "CALL",
            Opcode::Ret => "RET",
            Opcode::Add8 => "ADD8",
            Opcode::Sub8 => "SUB8",
            Opcode::Mul8 => "MUL8",
            Opcode::Add16 => "ADD16",
            Opcode::Sub16 => "SUB16",
            Opcode::Mul16 => "MUL16",
            Opcode::Add32 => "ADD32",
            Opcode::Sub32 => "SUB32",
            Opcode::Mul32 => "MUL32",
            Opcode::Add => "ADD",
            Opcode::Sub => "SUB",
            Opcode::Mul => "MUL",
            Opcode::Divi => "DIVI",
            Opcode::Divu => "DIVU",
            Opcode::Addf => "ADDF",
            Opcode::Subf => "SUBF",
            Opcode::Mulf => "MULF",
            Opcode::Divf => "DIVF",
            Opcode::Inc => "INC",
            Opcode::Dec => "DEC",
            Opcode::Incf => "INCF",
            Opcode::Decf => "DECF",
            Opcode::Abs => "ABS",
            Opcode::Absf => "ABSF",
            Opcode::Eq => "EQ",
            Opcode::Neq => "NEQ",
            Opcode::Eqf => "EQF",
            Opcode::Neqf => "NEQF",
            Opcode::Bigi => "BIGI",
            Opcode::Bigu => "BIGU",
            Opcode::Bigf => "BIGF",
            Opcode::Smli => "SMLI",
            Opcode::Smlu => "SMLU",
            Opcode::Smlf => "SMLF",
            Opcode::Castiu => "CASTIU",
            Opcode::Castif => "CASTIF",
            Opcode::Castui => "CASTUI",
            Opcode::Castuf => "CASTUF",
            Opcode::Castfi => "CASTFI",
            Opcode::Castfu => "CASTFU",
            Opcode::Cf3264 => "CF3264",
            Opcode::Cf6432 => "CF6432",
            Opcode::Float => "FLOAT",
            Opcode::Putc => "PUTC",
            Opcode::Getc => "GETC",
            Opcode::Fopen => "FOPEN",
            Opcode::Fclose => "FCLOSE",
            Opcode::Exec => "EXEC",
            Opcode::Sys => "SYS",
            Opcode::Disreg => "DISREG",
        }
    }

    /// Operand profile of the opcode
    pub const fn profile(self) -> OperandProfile {
        match self {
            Opcode::Nop | Opcode::Ret => OperandProfile::None,

            Opcode::Pop
            | Opcode::Free
            | Opcode::Getc
            | Opcode::Fclose
            | Opcode::Exec
            | Opcode::Disreg => OperandProfile::R,

            Opcode::Mov8
            | Opcode::Mov16
            | Opcode::Mov32
            | Opcode::Mov
            | Opcode::Malloc
            | Opcode::Not
            | Opcode::Abs
            | Opcode::Absf
            | Opcode::Castiu
            | Opcode::Castif
            | Opcode::Castui
            | Opcode::Castuf
            | Opcode::Castfi
            | Opcode::Castfu
            | Opcode::Cf3264
            | Opcode::Cf6432
            | Opcode::Fopen => OperandProfile::Rr,

            Opcode::Movc
            | Opcode::Gsp
            | Opcode::Read8
            | Opcode::Read16
            | Opcode::Read32
            | Opcode::Read
            | Opcode::Write8
            | Opcode::Write16
            | Opcode::Write32
            | Opcode::Write
            | Opcode::Memset
            | Opcode::Memcpy
            | Opcode::Memmov
            | Opcode::Memcmp
            | Opcode::Neg
            | Opcode::And
            | Opcode::Nand
            | Opcode::Or
            | Opcode::Xor
            | Opcode::Bshift
            | Opcode::Add8
            | Opcode::Sub8
            | Opcode::Mul8
            | Opcode::Add16
            | Opcode::Sub16
            | Opcode::Mul16
            | Opcode::Add32
            | Opcode::Sub32
            | Opcode::Mul32
            | Opcode::Add
            | Opcode::Sub
            | Opcode::Mul
            | Opcode::Divi
            | Opcode::Divu
            | Opcode::Addf
            | Opcode::Subf
            | Opcode::Mulf
            | Opcode::Divf
            | Opcode::Eq
            | Opcode::Neq
            | Opcode::Eqf
            | Opcode::Neqf
            | Opcode::Bigi
            | Opcode::Bigu
            | Opcode::Bigf
            | Opcode::Smli
            | Opcode::Smlu
            | Opcode::Smlf
            | Opcode::Float
            | Opcode::Putc => OperandProfile::Rrr,

            Opcode::Movv
            | Opcode::Movv16
            | Opcode::Movn
            | Opcode::Get
            | Opcode::Put
            | Opcode::Jmpf
            | Opcode::Jmpfn
            | Opcode::Inc
            | Opcode::Dec
            | Opcode::Incf
            | Opcode::Decf => OperandProfile::Rl,

            Opcode::Halt
            | Opcode::Push
            | Opcode::Static
            | Opcode::Jmp
            | Opcode::Call
            | Opcode::Sys => OperandProfile::E,
        }
    }

    /// Check if this opcode alters control flow through its step delta
    #[inline]
    pub const fn is_branch(self) -> bool {
        matches!(
            self,
            Opcode::Jmp | Opcode::Jmpf | Opcode::Jmpfn | Opcode::Call | Opcode::Ret
        )
    }

    /// Check if this is a compare opcode
    #[inline]
    pub const fn is_compare(self) -> bool {
        matches!(
            self,
            Opcode::Eq
                | Opcode::Neq
                | Opcode::Eqf
                | Opcode::Neqf
                | Opcode::Bigi
                | Opcode::Bigu
                | Opcode::Bigf
                | Opcode::Smli
                | Opcode::Smlu
                | Opcode::Smlf
        )
    }

    /// Check if this opcode touches data memory
    #[inline]
    pub const fn is_memory_access(self) -> bool {
        (self.to_u8() >= 0x10 && self.to_u8() <= 0x1D) || matches!(self, Opcode::Static)
    }

    /// Check if this opcode operates on f64 register values
    #[inline]
    pub const fn is_float(self) -> bool {
        matches!(
            self,
            Opcode::Addf
                | Opcode::Subf
                | Opcode::Mulf
                | Opcode::Divf
                | Opcode::Incf
                | Opcode::Decf
                | Opcode::Absf
                | Opcode::Eqf
                | Opcode::Neqf
                | Opcode::Bigf
                | Opcode::Smlf
        )
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.mnemonic())
    }
}

/// Every opcode in the ISA, in value order
pub const ALL_OPCODES: [Opcode; 92] = [
    Opcode::Nop,
    Opcode::Halt,
    Opcode::Mov8,
    Opcode::Mov16,
    Opcode::Mov32,
    Opcode::Mov,
    Opcode::Movv,
    Opcode::Movv16,
    Opcode::Movn,
    Opcode::Movc,
    Opcode::Push,
    Opcode::Pop,
    Opcode::Get,
    Opcode::Put,
    Opcode::Gsp,
    Opcode::Static,
    Opcode::Read8,
    Opcode::Read16,
    Opcode::Read32,
    Opcode::Read,
    Opcode::Write8,
    Opcode::Write16,
    Opcode::Write32,
    Opcode::Write,
    Opcode::Memset,
    Opcode::Memcpy,
    Opcode::Memmov,
    Opcode::Memcmp,
    Opcode::Malloc,
    Opcode::Free,
    Opcode::Not,
    Opcode::Neg,
    Opcode::And,
    Opcode::Nand,
    Opcode::Or,
    Opcode::Xor,
    Opcode::Bshift,
    Opcode::Jmp,
    Opcode::Jmpf,
    Opcode::Jmpfn,
    Opcode::Call,
    Opcode::Ret,
    Opcode::Add8,
    Opcode::Sub8,
    Opcode::Mul8,
    Opcode::Add16,
    Opcode::Sub16,
    Opcode::Mul16,
    Opcode::Add32,
    Opcode::Sub32,
    Opcode::Mul32,
    Opcode::Add,
    Opcode::Sub,
    Opcode::Mul,
    Opcode::Divi,
    Opcode::Divu,
    Opcode::Addf,
    Opcode::Subf,
    Opcode::Mulf,
    Opcode::Divf,
    Opcode::Inc,
    Opcode::Dec,
    Opcode::Incf,
    Opcode::Decf,
    Opcode::Abs,
    Opcode::Absf,
    Opcode::Eq,
    Opcode::Neq,
    Opcode::Eqf,
    Opcode::Neqf,
    Opcode::Bigi,
    Opcode::Bigu,
    Opcode::Bigf,
    Opcode::Smli,
    Opcode::Smlu,
    Opcode::Smlf,
    Opcode::Castiu,
    Opcode::Castif,
    Opcode::Castui,
    Opcode::Castuf,
    Opcode::Castfi,
    Opcode::Castfu,
    Opcode::Cf3264,
    Opcode::Cf6432,
    Opcode::Float,
    Opcode::Putc,
    Opcode::Getc,
    Opcode::Fopen,
    Opcode::Fclose,
    Opcode::Exec,
    Opcode::Sys,
    Opcode::Disreg,
];
