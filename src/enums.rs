use crate::constants;
use crate::diag::{Diagnostic, ErrorKind};
use crate::Word;
use bitflags::bitflags;
use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::ToPrimitive;
use util::EnumFromStr;
use util_derive::EnumFromStr;

/// Compilation mode, decided by the `#mode` directive before the first
/// real token and immutable afterwards. `SET` is the one-shot state
/// between `#mode` and its option word.
#[derive(Clone, Copy, PartialEq, Eq, Debug, FromPrimitive, ToPrimitive, EnumFromStr)]
pub enum Mode {
    STANDARD,
    SET,
    DOS,
    LINUX,
}

/// Operations of the intermediate representation.
#[derive(Clone, Copy, PartialEq, Eq, Debug, FromPrimitive, ToPrimitive)]
pub enum Opcode {
    //  Source            | Effect
    //--------------------+----------------------------------------------
    NUM,          // <digits>          | push literal
    STRING,       // "…"               | store into heap, address to var or stack
    SET,          // =                 | open declaration/assignment
    ADD,          // +                 | pop a, pop b, push b + a
    SUB,          // -                 | pop a, pop b, push b - a
    MUL,          // *                 | pop a, pop b, push b * a
    DIV,          // /                 | pop a, pop b, push b / a
    MOD,          // %                 | pop a, pop b, push b % a
    SHL,          // <<                | pop a, pop b, push b << a
    SHR,          // >>                | pop a, pop b, push b >> a
    EQUAL,        // ==                | store comparison for CONJUMP
    GREATER,      // >                 |
    LESS,         // <                 |
    GE,           // >=                |
    LE,           // <=                |
    IF,           // if                | enter condition state
    ELSE,         // else              | consumed by the control lowerer
    WHILE,        // while             | enter condition state
    CONJUMP,      //                   | jump to label when the comparison fails
    JUMP,         //                   | unconditional jump to label
    LABEL,        //                   | jump target marker
    COPY,         // copy              | duplicate top of stack
    PRINT,        // .                 | pop, write decimal
    PRINT_NL,     // .n                | write newline
    PRINT_AND_NL, // ..n               | pop, write decimal and newline
    PRINT_CHAR,   // .c                | pop, write as character
    BUF,          // buf               | reserve popped count of heap bytes
    MEMWRITE,     // .mem              | pop value, pop address, store to heap
    MEMREAD,      // ,mem              | pop address, push heap value
    DOS,          // dos               | DOS int 21h escape
    LINUX,        // linux             | Linux syscall escape
    MODE,         //                   | reserved for the mode directive
    VAR,          // <name>            | variable reference
    TYPE,         // u8 u16 u8p u16p   | consumed by the resolver
    COLON,        // ;                 | store expression result into variable
    COUNT,
}

impl Opcode {
    /// Operators allowed inside condition-block expressions. `DIV` and
    /// `MOD` are not.
    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            Opcode::ADD | Opcode::SUB | Opcode::MUL | Opcode::SHL | Opcode::SHR
        )
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            Opcode::EQUAL | Opcode::GREATER | Opcode::LESS | Opcode::GE | Opcode::LE
        )
    }

    /// Evaluates the comparison `b ? a`, or `None` for non-comparison ops.
    pub fn compare(self, b: Word, a: Word) -> Option<bool> {
        Some(match self {
            Opcode::EQUAL => b == a,
            Opcode::GREATER => b > a,
            Opcode::LESS => b < a,
            Opcode::GE => b >= a,
            Opcode::LE => b <= a,
            _ => return None,
        })
    }
}

/// Data types of named variables: `u8`, `u16`, and their pointer-flavored
/// variants `u8p`, `u16p`. Pointer variables store a 2-byte heap address.
#[derive(Clone, Copy, PartialEq, Eq, Debug, FromPrimitive, ToPrimitive)]
pub enum DataType {
    UINT8,
    UINT16,
    UINT8MEM,
    UINT16MEM,
    COUNT,
}

impl DataType {
    /// Bytes of variable storage this type occupies.
    pub fn size(self) -> usize {
        match self {
            DataType::UINT8 => 1,
            _ => 2,
        }
    }

    /// Element width: what a scalar holds, or what a pointer points at.
    pub fn elem_size(self) -> usize {
        match self {
            DataType::UINT8 | DataType::UINT8MEM => 1,
            _ => 2,
        }
    }

    pub fn is_pointer(self) -> bool {
        matches!(self, DataType::UINT8MEM | DataType::UINT16MEM)
    }
}

/// Block kinds of the nested IR. The root is always `COMPILETIME`;
/// `RESOLVE` is reserved.
#[derive(Clone, Copy, PartialEq, Eq, Debug, FromPrimitive, ToPrimitive)]
pub enum BlockKind {
    COMPILETIME,
    CONDITION,
    RESOLVE,
    CODE,
    COUNT,
}

bitflags! {
    /// Declaration and expression state shared by the simulator and the
    /// assembly emitter. `VARDEF` decides whether an expression result is
    /// stored into the current variable or left on the stack.
    pub struct ComState: u8 {
        const CONDITION  = 0b0000_0001;
        const ARITHMETIC = 0b0000_0010;
        const VARDEF     = 0b0000_0100;
    }
}

#[inline]
pub fn enum_to_u32<T: ToPrimitive + Copy>(val: T) -> u32 {
    val.to_u32().unwrap()
}

fn count_guard(context: &str, table: &str, expected: u32, found: u32) -> crate::Result<()> {
    if found != expected {
        return Err(
            Diagnostic::fail(ErrorKind::ENUM, format!("Exhaustive {} protection in {}", table, context))
                .with_expected(expected, found),
        );
    }
    Ok(())
}

/// Guards a pass or backend against an opcode table that grew without its
/// dispatch being extended.
pub fn check_opcode_count(context: &str) -> crate::Result<()> {
    count_guard(context, "operation", constants::OPCODE_COUNT, enum_to_u32(Opcode::COUNT))
}

pub fn check_datatype_count(context: &str) -> crate::Result<()> {
    count_guard(context, "datatype", constants::DATATYPE_COUNT, enum_to_u32(DataType::COUNT))
}

pub fn check_blockkind_count(context: &str) -> crate::Result<()> {
    count_guard(context, "codeBlock", constants::BLOCKKIND_COUNT, enum_to_u32(BlockKind::COUNT))
}
