use mandarine::{Program, Simulator};

mod codegen;
mod lexer;
mod pest;
mod simulate;

pub fn parse_source(source: &str) -> mandarine::Result<Program> {
    crate::parse(source, "test.mand")
}

pub fn run_source(source: &str) -> String {
    run_source_with_input(source, "")
}

pub fn run_source_with_input(source: &str, line: &str) -> String {
    let mut program = parse_source(source).unwrap();
    let mut out = Vec::new();
    let mut input = line.as_bytes();
    Simulator::new()
        .run(&mut program, &mut out, &mut input)
        .unwrap();
    String::from_utf8(out).unwrap()
}

pub fn compile_source(source: &str) -> String {
    let program = parse_source(source).unwrap();
    crate::compile(&program).unwrap()
}
