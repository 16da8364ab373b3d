use super::*;

#[test]
fn print_literal() {
    let output = run_ops(vec![num(42, 0), op(Opcode::PRINT, 1)]);
    assert_eq!(output, "42");
}

#[test]
fn arithmetic_is_postfix() {
    // 3 4 + 5 * ..n
    let output = run_ops(vec![
        num(3, 0),
        num(4, 1),
        op(Opcode::ADD, 2),
        num(5, 3),
        op(Opcode::MUL, 4),
        op(Opcode::PRINT_AND_NL, 5),
    ]);
    assert_eq!(output, "35\n");
}

#[test]
fn subtraction_wraps() {
    let output = run_ops(vec![num(0, 0), num(1, 1), op(Opcode::SUB, 2), op(Opcode::PRINT, 3)]);
    assert_eq!(output, u64::max_value().to_string());
}

#[test]
fn copy_duplicates_top() {
    let output = run_ops(vec![
        num(7, 0),
        op(Opcode::COPY, 1),
        op(Opcode::PRINT, 2),
        op(Opcode::PRINT, 3),
    ]);
    assert_eq!(output, "77");
}

#[test]
fn division_by_zero_fails() {
    let diag = run_ops_err(vec![num(1, 0), num(0, 1), op(Opcode::DIV, 2)]);
    assert_eq!(diag.kind, ErrorKind::SIMULATE);
}

#[test]
fn conjump_skips_when_condition_fails() {
    // 1 == 2 is false, so the print is skipped
    let output = run_ops(vec![
        op(Opcode::EQUAL, 0),
        num(1, 1),
        num(2, 2),
        jump(Opcode::CONJUMP, "label0", 3),
        num(9, 4),
        op(Opcode::PRINT, 5),
        label("label0", 6),
    ]);
    assert_eq!(output, "");
}

#[test]
fn conjump_falls_through_when_condition_holds() {
    let output = run_ops(vec![
        op(Opcode::EQUAL, 0),
        num(2, 1),
        num(2, 2),
        jump(Opcode::CONJUMP, "label0", 3),
        num(9, 4),
        op(Opcode::PRINT, 5),
        label("label0", 6),
    ]);
    assert_eq!(output, "9");
}

#[test]
fn jump_is_unconditional() {
    let output = run_ops(vec![
        jump(Opcode::JUMP, "label0", 0),
        num(1, 1),
        op(Opcode::PRINT, 2),
        label("label0", 3),
        num(2, 4),
        op(Opcode::PRINT, 5),
    ]);
    assert_eq!(output, "2");
}

#[test]
fn print_char_writes_bytes() {
    let output = run_ops(vec![num(65, 0), op(Opcode::PRINT_CHAR, 1)]);
    assert_eq!(output, "A");
}

#[test]
fn stack_underflow_is_reported() {
    let diag = run_ops_err(vec![op(Opcode::PRINT, 0)]);
    assert_eq!(diag.kind, ErrorKind::SIMULATE);
    assert!(diag.message.contains("underflow"));
}

#[test]
fn empty_program_is_a_no_op() {
    assert_eq!(run_ops(Vec::new()), "");
}
