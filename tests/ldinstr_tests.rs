//! A made-up load instruction, the classic opcode-shaped problem.
//!
//! Fields starting at the LSB: imm0 (11 bits), src0 (5 bits), dst0
//! (5 bits), wb (1 bit), enc (10 bits, fixed). Rules: when writeback is
//! set, dst0 must differ from src0; the sum of src0's current contents
//! and imm0 must be word-aligned and must not overflow 32 bits.

use constrainedrandom::bits::set_bitslice;
use constrainedrandom::{RandObj, SolveOptions, Value, VarSpec};

const ENC: u64 = 0xfa80_0000;
const SRC0_VALUE: i64 = 0xfffffbcd;

fn ld_instr(seed: u64) -> RandObj {
    let mut obj = RandObj::new(seed);
    obj.add_rand_var("src0", VarSpec::bits(5)).unwrap();
    obj.add_rand_var("src0_value", VarSpec::func(|_| SRC0_VALUE))
        .unwrap();
    obj.add_rand_var("wb", VarSpec::bits(1)).unwrap();
    obj.add_rand_var("dst0", VarSpec::bits(5).order(1)).unwrap();
    obj.add_rand_var("imm0", VarSpec::bits(11).order(2)).unwrap();
    obj.add_constraint(
        |args: &[Value]| {
            let (wb, dst0, src0) = (
                args[0].as_int().unwrap(),
                args[1].as_int().unwrap(),
                args[2].as_int().unwrap(),
            );
            wb == 0 || dst0 != src0
        },
        &["wb", "dst0", "src0"],
    )
    .unwrap();
    obj.add_constraint(
        |args: &[Value]| {
            let address = args[0].as_int().unwrap() + args[1].as_int().unwrap();
            address & 3 == 0 && address < 0xffffffff
        },
        &["src0_value", "imm0"],
    )
    .unwrap();
    obj.set_post_randomize(|results| {
        let field = |name: &str| results[name].as_int().unwrap() as u64;
        let mut opcode = ENC;
        opcode = set_bitslice(opcode, 10, 0, field("imm0"));
        opcode = set_bitslice(opcode, 15, 11, field("src0"));
        opcode = set_bitslice(opcode, 20, 16, field("dst0"));
        opcode = set_bitslice(opcode, 21, 21, field("wb"));
        results.insert("opcode".to_string(), Value::Int(opcode as i64));
    });
    obj
}

fn check_rules(obj: &RandObj) {
    let wb = obj.get_int("wb").unwrap();
    let dst0 = obj.get_int("dst0").unwrap();
    let src0 = obj.get_int("src0").unwrap();
    let imm0 = obj.get_int("imm0").unwrap();
    assert!((0..32).contains(&src0) && (0..32).contains(&dst0));
    assert!((0..2048).contains(&imm0));
    if wb == 1 {
        assert_ne!(dst0, src0);
    }
    let address = SRC0_VALUE + imm0;
    assert_eq!(address & 3, 0);
    assert!(address < 0xffffffff);
}

#[test]
fn test_five_successive_randomizations() {
    let mut obj = ld_instr(0);
    let mut opcodes = Vec::new();
    for _ in 0..5 {
        obj.randomize().unwrap();
        check_rules(&obj);
        opcodes.push(obj.get_int("opcode").unwrap());
    }
    assert_eq!(opcodes.len(), 5);
    // Assignments are distinct or at least distributed.
    let distinct: std::collections::BTreeSet<_> = opcodes.iter().collect();
    assert!(distinct.len() > 1, "opcodes never varied: {opcodes:?}");
    // The fixed encoding must survive in every opcode.
    for opcode in opcodes {
        assert_eq!((opcode as u64) & 0xffc0_0000, ENC);
    }
}

#[test]
fn test_solves_with_naive_disabled() {
    let mut obj = ld_instr(0);
    obj.set_solver_mode(Some(false), None, None);
    for _ in 0..5 {
        obj.randomize().unwrap();
        check_rules(&obj);
    }
}

#[test]
fn test_forced_writeback_respects_register_rule() {
    let mut obj = ld_instr(0);
    for _ in 0..10 {
        obj.randomize_with(SolveOptions::new().with_value("wb", 1))
            .unwrap();
        assert_eq!(obj.get_int("wb"), Some(1));
        assert_ne!(obj.get_int("dst0"), obj.get_int("src0"));
        check_rules(&obj);
    }
}

#[test]
fn test_seeded_repeatability() {
    let mut first = ld_instr(7);
    let mut second = ld_instr(7);
    for _ in 0..5 {
        first.randomize().unwrap();
        second.randomize().unwrap();
        assert_eq!(first.get_int("opcode"), second.get_int("opcode"));
        assert_eq!(first.get_results(), second.get_results());
    }
}
