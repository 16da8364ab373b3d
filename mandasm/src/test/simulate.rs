use crate::test::{parse_source, run_source, run_source_with_input};
use mandarine::{ErrorKind, Simulator};

#[test]
fn literal_print() {
    assert_eq!(run_source("u8 x = 42; x ."), "42");
}

#[test]
fn postfix_arithmetic() {
    assert_eq!(run_source("u16 y = 3 4 + 5 *; y ..n"), "35\n");
}

#[test]
fn while_loop() {
    assert_eq!(
        run_source("u8 i = 0; while (i < 5) { i . i = i 1 + ; }"),
        "01234"
    );
}

#[test]
fn if_else_takes_the_then_branch() {
    assert_eq!(run_source("u8 a = 7; if (a > 3) { 1 . } else { 2 . }"), "1");
}

#[test]
fn if_else_takes_the_else_branch() {
    assert_eq!(run_source("u8 a = 2; if (a > 3) { 1 . } else { 2 . }"), "2");
}

#[test]
fn if_without_else_falls_through() {
    assert_eq!(run_source("u8 a = 2; if (a > 3) { 1 . } 9 ."), "9");
}

#[test]
fn pointer_write_then_read() {
    assert_eq!(run_source("u8p b = 10 buf ; b 65 .mem b ,mem .c"), "A");
}

#[test]
fn dos_string_print() {
    assert_eq!(
        run_source("#mode dos\nu8p s = \"HI\\n\" ; s 9 dos"),
        "HI\n"
    );
}

#[test]
fn dos_line_input() {
    // fn 10: length lands at buf+1, the bytes from buf+2
    let source = "#mode dos\nu8p b = 16 buf ; b 10 dos b 1 + ,mem . b 2 + ,mem .c";
    assert_eq!(run_source_with_input(source, "Hello\n"), "5H");
}

#[test]
fn linux_write_to_stdout() {
    assert_eq!(
        run_source("#mode linux\nu8p s = \"hi\" ; 2 s 1 1 linux"),
        "hi"
    );
}

#[test]
fn nested_loops() {
    let source = "u8 i = 0; u8 j = 0; \
                  while (i < 2) { \
                      j = 0 ; \
                      while (j < 2) { i . j . j = j 1 + ; } \
                      i = i 1 + ; \
                  }";
    assert_eq!(run_source(source), "00011011");
}

#[test]
fn while_loop_that_never_runs() {
    assert_eq!(run_source("u8 i = 9; while (i < 5) { i . } 7 ."), "7");
}

#[test]
fn condition_sides_may_hold_expressions() {
    assert_eq!(run_source("u8 a = 4; if (a 1 + > 2 2 *) { 1 . } else { 2 . }"), "1");
}

#[test]
fn memread_in_condition() {
    assert_eq!(
        run_source("u8p b = 4 buf ; b 7 .mem if (b ,mem == 7) { 1 . }"),
        "1"
    );
}

#[test]
fn deref_reads_through_the_pointer() {
    assert_eq!(run_source("u8p b = 4 buf ; b 65 .mem *b .c"), "A");
}

#[test]
fn address_of_cannot_be_simulated() {
    let mut program = parse_source("u8 x = 1; &x .").unwrap();
    let mut out = Vec::new();
    let mut input = &b""[..];
    let err = Simulator::new()
        .run(&mut program, &mut out, &mut input)
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::SIMULATE);
}

#[test]
fn division_by_zero_is_fatal() {
    let mut program = parse_source("u8 x = 1 0 / ;").unwrap();
    let mut out = Vec::new();
    let mut input = &b""[..];
    let err = Simulator::new()
        .run(&mut program, &mut out, &mut input)
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::SIMULATE);
}

#[test]
fn copy_duplicates() {
    assert_eq!(run_source("u8 x = 3; x copy . ."), "33");
}

#[test]
fn empty_source_is_a_no_op() {
    assert_eq!(run_source(""), "");
}

#[test]
fn string_outside_declaration_pushes_its_address() {
    // first allocation starts at heap address zero
    assert_eq!(run_source("u8 x = 1; \"A\" ."), "0");
}
