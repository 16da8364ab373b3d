use pest_derive::Parser;

/// Character-level scanner for Mandarine source. The grammar only splits
/// the input into raw words, operator tokens and string literals;
/// classification happens in the [`lexer`](../lexer/index.html) module.
#[derive(Parser)]
#[grammar = "mandarine.pest"]
pub struct MandParser;
