use super::*;
use crate::diag::Loc;
use std::collections::HashMap;

mod heap;
mod simulate;
mod value;

fn op(opcode: Opcode, loc: usize) -> Op {
    Op::new(opcode, loc, Loc::default())
}

fn num(value: u64, loc: usize) -> Op {
    Op::with_payload(Opcode::NUM, loc, Loc::default(), Payload::Int(value))
}

fn label(name: &str, loc: usize) -> Op {
    Op::with_payload(Opcode::LABEL, loc, Loc::default(), Payload::Label(name.to_owned()))
}

fn jump(opcode: Opcode, name: &str, loc: usize) -> Op {
    Op::with_payload(opcode, loc, Loc::default(), Payload::Label(name.to_owned()))
}

fn run_ops(ops: Vec<Op>) -> String {
    let mut program = Program::from_ops(ops, HashMap::new(), Mode::STANDARD);
    let mut out = Vec::new();
    let mut input = &b""[..];
    let mut simulator = Simulator::new();
    simulator
        .run(&mut program, &mut out, &mut input)
        .unwrap();
    String::from_utf8(out).unwrap()
}

fn run_ops_err(ops: Vec<Op>) -> Diagnostic {
    let mut program = Program::from_ops(ops, HashMap::new(), Mode::STANDARD);
    let mut out = Vec::new();
    let mut input = &b""[..];
    let mut simulator = Simulator::new();
    simulator
        .run(&mut program, &mut out, &mut input)
        .unwrap_err()
}

#[test]
fn diagnostic_rendering() {
    let diag = Diagnostic::fail(ErrorKind::PARSE, "Found wrong codeBlock closing")
        .with_expected(")", "}");
    assert_eq!(
        diag.to_string(),
        "Error.PARSE Found wrong codeBlock closing >>> Expected `)` found `}`"
    );
}

#[test]
fn diagnostic_empty_message_is_self_error() {
    let diag = Diagnostic::fail(ErrorKind::PARSE, "");
    assert_eq!(diag.kind, ErrorKind::SELF);
    assert!(diag.is_fatal());
}

#[test]
fn loc_displays_one_based() {
    let loc = Loc::new("x.mand", 0, 4);
    assert_eq!(loc.to_string(), "x.mand:1:5");
}

#[test]
fn opcode_count_guard_passes() {
    enums::check_opcode_count("test").unwrap();
    enums::check_datatype_count("test").unwrap();
    enums::check_blockkind_count("test").unwrap();
}
