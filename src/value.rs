//! Byte-level encoding of variable storage and heap cells.

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::enums::DataType;

/// Byte order of multi-byte variable storage and heap cells.
///
/// Storage defaults to `BIG` even though the DOS target is little-endian;
/// tested programs agree between the backends because their output goes
/// through strings and character prints rather than raw byte reads. Select
/// `LITTLE` to match the target machine instead.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum VarEncoding {
    BIG,
    LITTLE,
}

impl Default for VarEncoding {
    fn default() -> VarEncoding {
        VarEncoding::BIG
    }
}

/// Encodes `value` into the storage layout of `dtype`: one byte for `u8`,
/// two bytes for `u16` and the pointer types.
pub fn encode_value(dtype: DataType, value: u64, enc: VarEncoding) -> Vec<u8> {
    match dtype {
        DataType::UINT8 => vec![(value % 256) as u8],
        DataType::UINT16 | DataType::UINT8MEM | DataType::UINT16MEM => {
            let mut buf = [0u8; 2];
            match enc {
                VarEncoding::BIG => BigEndian::write_u16(&mut buf, value as u16),
                VarEncoding::LITTLE => LittleEndian::write_u16(&mut buf, value as u16),
            }
            buf.to_vec()
        }
        DataType::COUNT => vec![0],
    }
}

/// Decodes storage bytes back into a stack value. Empty storage (a
/// variable before its first assignment) decodes as zero.
pub fn decode_value(bytes: &[u8], enc: VarEncoding) -> u64 {
    if bytes.is_empty() {
        return 0;
    }
    match enc {
        VarEncoding::BIG => BigEndian::read_uint(bytes, bytes.len()),
        VarEncoding::LITTLE => LittleEndian::read_uint(bytes, bytes.len()),
    }
}
