//! Property tests for the packed instruction word layout

use proptest::prelude::*;
use vpu_spec::opcode::ALL_OPCODES;
use vpu_spec::{Opcode, OperandProfile, Register, Word};

fn any_register() -> impl Strategy<Value = Register> {
    (0u8..=64).prop_filter_map("register byte", Register::from_u8)
}

fn any_opcode() -> impl Strategy<Value = Opcode> {
    (0usize..ALL_OPCODES.len()).prop_map(|i| ALL_OPCODES[i])
}

proptest! {
    #[test]
    fn rrr_words_round_trip(op in any_opcode(), a in any_register(), b in any_register(), c in any_register()) {
        let w = Word::pack_rrr(op, a, b, c);
        prop_assert_eq!(w.opcode(), Some(op));
        prop_assert_eq!(w.r1(), a.to_u8());
        prop_assert_eq!(w.r2(), b.to_u8());
        prop_assert_eq!(w.r3(), c.to_u8());
    }

    #[test]
    fn rl_words_round_trip(op in any_opcode(), r in any_register(), lit: u16) {
        let w = Word::pack_rl(op, r, lit);
        prop_assert_eq!(w.opcode(), Some(op));
        prop_assert_eq!(w.r1(), r.to_u8());
        prop_assert_eq!(w.l2(), lit);
    }

    #[test]
    fn e_literal_words_round_trip(op in any_opcode(), lit: u16) {
        let w = Word::pack_e_lit(op, lit);
        prop_assert_eq!(w.opcode(), Some(op));
        prop_assert!(w.e_is_literal());
        prop_assert_eq!(w.l1(), lit);
    }

    #[test]
    fn e_register_words_never_look_like_literals(op in any_opcode(), r in any_register()) {
        let w = Word::pack_e_reg(op, r);
        prop_assert!(!w.e_is_literal());
        prop_assert_eq!(w.r1(), r.to_u8());
    }

    #[test]
    fn signed_deltas_survive_the_literal_slot(delta: i16) {
        let w = Word::pack_rl(Opcode::Jmpf, Register::RA, delta as u16);
        prop_assert_eq!(w.l2() as i16, delta);
        let w = Word::pack_e_lit(Opcode::Jmp, delta as u16);
        prop_assert_eq!(w.l1() as i16, delta);
    }
}

#[test]
fn every_opcode_has_a_profile_consistent_with_its_slots() {
    for op in ALL_OPCODES {
        let w = Word::pack_none(op);
        assert_eq!(w.opcode(), Some(op));
        // NONE-profile words are just the opcode byte
        if op.profile() == OperandProfile::None {
            assert_eq!(w.0, op.to_u8() as u32);
        }
    }
}
