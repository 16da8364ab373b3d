/// Size of the byte-addressable heap available to a simulated program.
pub const HEAP_SIZE         : usize = 64 * 1024;

/// Deepest accepted pointer reference chain on a variable reference.
pub const MAX_REF_LEVEL     : i8 = 8;

/// How far DOS function 9 scans for the `$` terminator.
pub const DOS_STRING_LIMIT  : usize = 256;

/// How many input characters DOS function 10 accepts per line.
pub const DOS_LINE_LIMIT    : usize = 256;

/// Expected table sizes, checked by the `Error.ENUM` guards before any
/// dispatch over the corresponding enum.
pub const OPCODE_COUNT      : u32 = 35;
pub const DATATYPE_COUNT    : u32 = 4;
pub const BLOCKKIND_COUNT   : u32 = 4;
