//! Front end and assembly backend for the [mandarine](../mandarine/index.html) language.
//!
//! The main functions provided by this crate are [`parse`](fn.parse.html), which turns
//! Mandarine source text into the flat [`Program`](../mandarine/ir/struct.Program.html)
//! consumed by both backends, and [`compile`](fn.compile.html), which emits a 16-bit
//! real-mode MASM listing for DOS from such a program. Running a program in software is
//! the job of the [`Simulator`](../mandarine/simulate/struct.Simulator.html) in the core
//! crate.
//!
//! The character-level scan is implemented using [pest]; everything above it (keyword
//! classification, block building, name resolution, control lowering) is ordinary Rust
//! over the scanned tokens.
//!
//! # The Mandarine Language
//!
//! A program is a sequence of whitespace-separated tokens. Expressions are written in
//! postfix form against an evaluation stack. A line comment starts with `\\` and runs to
//! the end of the line.
//!
//! ## Modes
//!
//! The first token of a file may be the directive `#mode dos` or `#mode linux`, which
//! selects the platform escape available to the program (`dos` or `linux`) and the
//! compilation target. Without a directive only the platform-neutral core is available.
//! Only the DOS assembly target is implemented; `linux` programs run in the simulator.
//!
//! ## Variables
//!
//! A variable is declared by a type keyword followed by a fresh name. Re-declaring a
//! name anywhere in the program is an error, and nested blocks share the enclosing
//! scope instead of shadowing it.
//!
//!  Keyword | Storage
//! ---------|------------------------------------------
//! `u8`     | one byte
//! `u16`    | two bytes
//! `u8p`    | pointer to bytes (two-byte heap address)
//! `u16p`   | pointer to words (two-byte heap address)
//!
//! `=` opens an assignment to the last named variable and `;` stores the expression
//! result into it: `u8 x = 41 1 + ;`. A string literal or a `buf` region completes the
//! assignment on its own: `u8p s = "HI\n"` stores the string's address, and
//! `u8p b = 32 buf` reserves 32 heap bytes. Prefixing a name with `*` dereferences it
//! and with `&` takes its address; the markers bind only when glued to the name
//! (`*p` dereferences, `a b *` multiplies).
//!
//! ## Operations
//!
//!  Token | Effect
//! -------|-----------------------------------------------
//! `+` `-` `*` `/` `%` | pop two, push the result
//! `<<` `>>` | pop count and value, push the shifted value
//! `copy`  | duplicate the top of the stack
//! `.`     | pop and print as decimal
//! `..n`   | pop and print as decimal, then a newline
//! `.n`    | print a newline
//! `.c`    | pop and print as a character
//! `.mem`  | pop value, pop address, store into the heap
//! `,mem`  | pop address, push the heap value
//! `buf`   | reserve popped count of heap bytes (declarations only)
//! `dos`   | pop a DOS function code and run `int 21h` (functions 9 and 10)
//! `linux` | pop a syscall id and run it (syscall 1, `write`)
//!
//! ## Control flow
//!
//! `if ( condition ) { … }` with an optional `else { … }`, and
//! `while ( condition ) { … }`. A condition holds exactly one comparison
//! (`==`, `<`, `>`, `<=`, `>=`) with one postfix expression on each side:
//!
//! ```text
//! u8 i = 0 ;
//! while (i < 5) {
//!     i .
//!     i = i 1 + ;
//! }
//! ```
//!
//! [pest]: https://docs.rs/pest/

mod blocks;
mod codegen;
mod lexer;
mod lower;
mod parser;
mod registers;
mod resolve;

#[cfg(test)]
mod test;

use mandarine::{Program, Result};

pub use codegen::compile;
pub use lexer::{scan, Token, TokenKind};
pub use parser::{MandParser, Rule};

/// Parses Mandarine source into the flat program consumed by both
/// backends: scan and classify, build blocks, resolve names, lower
/// control flow.
pub fn parse(input: &str, file: &str) -> Result<Program> {
    let (tokens, mode) = lexer::scan(input, file)?;
    let mut root = blocks::build_blocks(&tokens)?;
    let vars = resolve::resolve_names(&mut root)?;
    lower::lower(root, vars, mode)
}
