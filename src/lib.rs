//! Core crate for the [Mandarine](../mandasm/index.html) language.
//!
//! This crate owns everything both backends share: the intermediate
//! representation produced by the parser passes ([`ir`]), the byte-level
//! encoding of variable storage ([`value`]), the 64 KiB run-time heap
//! ([`heap`]), the diagnostic types ([`diag`]) and the reference
//! interpreter ([`Simulator`](simulate/struct.Simulator.html)).
//!
//! The front end and the assembly backend live in the `mandasm` crate; the
//! command line driver lives in `mandc`.
//!
//! [`ir`]: ir/index.html
//! [`value`]: value/index.html
//! [`heap`]: heap/index.html
//! [`diag`]: diag/index.html

pub mod constants;
pub mod diag;
pub mod enums;
pub mod heap;
pub mod ir;
pub mod simulate;
pub mod value;

#[cfg(test)]
mod test;

pub use diag::{Diagnostic, ErrorKind, Severity};
pub use enums::{BlockKind, ComState, DataType, Mode, Opcode};
pub use heap::Heap;
pub use ir::{Block, Item, Op, Payload, Program, Var, VarRef};
pub use simulate::Simulator;
pub use value::{decode_value, encode_value, VarEncoding};

/// Machine word of the evaluation stack. Literals are kept at full
/// precision in the IR; each backend truncates to its own bit width.
pub type Word = u64;

pub type Result<T> = std::result::Result<T, Diagnostic>;
