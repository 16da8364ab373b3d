use crate::{MandParser, Rule};
use ::pest::*;

#[test]
fn comment() {
    parses_to! {
        parser: MandParser,
        input: "\\\\ anything at all ;{}\"",
        rule: Rule::COMMENT,
        tokens: []
    };
}

#[test]
fn word() {
    parses_to! {
        parser: MandParser,
        input: "abc",
        rule: Rule::word,
        tokens: [ word(0, 3) ]
    };
    parses_to! {
        parser: MandParser,
        input: "..n",
        rule: Rule::word,
        tokens: [ word(0, 3) ]
    };
}

#[test]
fn word_stops_at_operators() {
    parses_to! {
        parser: MandParser,
        input: "ab+cd",
        rule: Rule::word,
        tokens: [ word(0, 2) ]
    };
}

#[test]
fn operand_longest_match() {
    parses_to! {
        parser: MandParser,
        input: "==",
        rule: Rule::operand,
        tokens: [ operand(0, 2) ]
    };
    parses_to! {
        parser: MandParser,
        input: "<=",
        rule: Rule::operand,
        tokens: [ operand(0, 2) ]
    };
    parses_to! {
        parser: MandParser,
        input: "<",
        rule: Rule::operand,
        tokens: [ operand(0, 1) ]
    };
}

#[test]
fn string() {
    parses_to! {
        parser: MandParser,
        input: "\"hi\"",
        rule: Rule::string,
        tokens: [ string(0, 4, [ string_text(1, 3) ]) ]
    };
    parses_to! {
        parser: MandParser,
        input: "\"a\\\"b\"",
        rule: Rule::string,
        tokens: [ string(0, 6, [ string_text(1, 5) ]) ]
    };
}

#[test]
fn program_splits_glued_operators() {
    parses_to! {
        parser: MandParser,
        input: "1+2",
        rule: Rule::program,
        tokens: [ program(0, 3, [
            word(0, 1),
            operand(1, 2),
            word(2, 3),
            EOI(3, 3)
        ]) ]
    };
}

#[test]
fn program_skips_whitespace_and_comments() {
    parses_to! {
        parser: MandParser,
        input: "a \\\\ gone\nb",
        rule: Rule::program,
        tokens: [ program(0, 11, [
            word(0, 1),
            word(10, 11),
            EOI(11, 11)
        ]) ]
    };
}
