//! Cross-module interaction tests
//!
//! Exercise the seams between the assembler, the disassembler, and the
//! runtime: everything the assembler emits must decode, format back to
//! source that re-assembles to the same words, and run identically.

use proptest::prelude::*;
use vpu_assembler::assemble;
use vpu_disassembler::{decode, disassemble, format};
use vpu_runtime::{Vm, VmConfig};
use vpu_spec::{Opcode, OperandProfile, Register, Word, ALL_OPCODES};

// ============================================================================
// Assembler -> Disassembler
// ============================================================================

#[test]
fn test_every_assembled_word_decodes() {
    let source = "NOP\n\
                  MOVV RA 5\n\
                  MOV8 RB2 RA\n\
                  ADD RC RA RB\n\
                  PUSH RC\n\
                  POP RD\n\
                  .loop:\n\
                  DEC RA 1\n\
                  JMPF RA @loop\n\
                  HALT RC\n";
    let program = assemble(source).unwrap();
    for &raw in &program.code {
        decode(Word(raw)).expect("assembler emitted an undecodable word");
    }
}

#[test]
fn test_disassemble_reassemble_is_identity() {
    let source = "MOVV RA 9\n\
                  MOVV RB 4\n\
                  SUB RC RA RB\n\
                  .spin:\n\
                  DEC RC 1\n\
                  JMPF RC @spin\n\
                  HALT RA\n";
    let program = assemble(source).unwrap();

    // Re-assemble each formatted line on its own; labels have already been
    // flattened into deltas, so the text is position-independent.
    let mut rebuilt = Vec::new();
    for &raw in &program.code {
        let line = format(&decode(Word(raw)).unwrap());
        let fragment = assemble(&line).unwrap();
        rebuilt.extend(fragment.code);
    }
    assert_eq!(rebuilt, program.code);
}

// ============================================================================
// Assembler -> Runtime
// ============================================================================

#[test]
fn test_assembled_program_runs() {
    let program = assemble(
        "MOVV RA 40\n\
         INC RA 2\n\
         HALT RA\n",
    )
    .unwrap();
    let mut vm = Vm::captured(&program, VmConfig::default()).unwrap();
    assert_eq!(vm.run().status, 42);
}

#[test]
fn test_entry_point_skips_prologue() {
    let program = assemble(
        "HALT 1\n\
         %start\n\
         HALT 2\n",
    )
    .unwrap();
    assert_eq!(program.entry_point, 1);
    let mut vm = Vm::captured(&program, VmConfig::default()).unwrap();
    assert_eq!(vm.run().status, 2);
}

// ============================================================================
// Relative Jump Arithmetic
// ============================================================================

#[test]
fn test_backward_jump_delta_arithmetic() {
    let program = assemble(
        "MOVV RA 3\n\
         .loop:\n\
         DEC RA 1\n\
         JMPF RA @loop\n\
         HALT 0\n",
    )
    .unwrap();
    // @loop is instruction 1, the JMPF sits at index 2
    let word = Word(program.code[2]);
    let delta = word.l2() as i16 as i64;
    assert_eq!(delta, -2);
    assert_eq!(2 + 1 + delta, 1); // lands on @loop
}

#[test]
fn test_forward_jump_delta_arithmetic() {
    let program = assemble(
        "JMP @end\n\
         NOP\n\
         NOP\n\
         .end:\n\
         HALT 0\n",
    )
    .unwrap();
    let word = Word(program.code[0]);
    assert!(word.e_is_literal());
    let delta = word.l1() as i16 as i64;
    assert_eq!(0 + 1 + delta, 3);
}

// ============================================================================
// Encode / Decode Properties
// ============================================================================

const REGISTER_BYTES: [u8; 33] = [
    0, 1, 2, 3, 4, 8, 9, 10, 11, 12, 16, 17, 18, 19, 20, 24, 25, 26, 27, 28, 32, 33, 34, 35, 36,
    40, 41, 42, 43, 44, 48, 56, 64,
];

fn arb_register() -> impl Strategy<Value = Register> {
    prop::sample::select(&REGISTER_BYTES[..]).prop_map(|byte| Register::from_u8(byte).unwrap())
}

fn arb_opcode() -> impl Strategy<Value = Opcode> {
    prop::sample::select(&ALL_OPCODES[..])
}

proptest! {
    #[test]
    fn prop_encode_decode_round_trip(
        op in arb_opcode(),
        a in arb_register(),
        b in arb_register(),
        c in arb_register(),
        lit in any::<u16>(),
    ) {
        let word = match op.profile() {
            OperandProfile::None => Word::pack_none(op),
            OperandProfile::R => Word::pack_r(op, a),
            OperandProfile::Rr => Word::pack_rr(op, a, b),
            OperandProfile::Rrr => Word::pack_rrr(op, a, b, c),
            OperandProfile::Rl => Word::pack_rl(op, a, lit),
            OperandProfile::E => Word::pack_e_lit(op, lit),
        };
        let decoded = decode(word).unwrap();
        prop_assert_eq!(decoded.opcode, op);
        match (op.profile(), decoded.operands) {
            (OperandProfile::None, vpu_disassembler::DecodedOperands::None) => {}
            (OperandProfile::R, vpu_disassembler::DecodedOperands::R(x)) => {
                prop_assert_eq!(x, a);
            }
            (OperandProfile::Rr, vpu_disassembler::DecodedOperands::Rr(x, y)) => {
                prop_assert_eq!((x, y), (a, b));
            }
            (OperandProfile::Rrr, vpu_disassembler::DecodedOperands::Rrr(x, y, z)) => {
                prop_assert_eq!((x, y, z), (a, b, c));
            }
            (OperandProfile::Rl, vpu_disassembler::DecodedOperands::Rl(x, l)) => {
                prop_assert_eq!((x, l), (a, lit));
            }
            (OperandProfile::E, vpu_disassembler::DecodedOperands::ELit(l)) => {
                prop_assert_eq!(l, lit);
            }
            (profile, operands) => {
                prop_assert!(false, "profile {:?} decoded as {:?}", profile, operands);
            }
        }
    }

    #[test]
    fn prop_formatted_word_reassembles(
        op in arb_opcode(),
        a in arb_register(),
        b in arb_register(),
        c in arb_register(),
        lit in any::<u16>(),
    ) {
        let word = match op.profile() {
            OperandProfile::None => Word::pack_none(op),
            OperandProfile::R => Word::pack_r(op, a),
            OperandProfile::Rr => Word::pack_rr(op, a, b),
            OperandProfile::Rrr => Word::pack_rrr(op, a, b, c),
            OperandProfile::Rl => Word::pack_rl(op, a, lit),
            OperandProfile::E => Word::pack_e_lit(op, lit),
        };
        let text = format(&decode(word).unwrap());
        let program = assemble(&text).unwrap();
        prop_assert_eq!(program.code, vec![word.0]);
    }
}

// ============================================================================
// Listings
// ============================================================================

#[test]
fn test_listing_of_running_program() {
    let program = assemble(
        "MOVV RA 5\n\
         MOVV RB 7\n\
         ADD RC RA RB\n\
         HALT RC\n",
    )
    .unwrap();

    let listing = disassemble(&program).unwrap();
    assert!(listing.contains("ADD RC RA RB"));

    let mut vm = Vm::captured(&program, VmConfig::default()).unwrap();
    assert_eq!(vm.run().status, 12);
}
