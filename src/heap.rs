//! Flat byte-addressable storage for one simulated run. String literals,
//! `buf` regions and raw `.mem`/`,mem` traffic all live here.

use crate::constants;
use crate::enums::DataType;
use crate::value::{decode_value, encode_value, VarEncoding};

pub struct Heap {
    data: Vec<u8>,
    end: usize,
    enc: VarEncoding,
}

impl Heap {
    pub fn new(enc: VarEncoding) -> Heap {
        Heap {
            data: vec![0; constants::HEAP_SIZE],
            end: 0,
            enc,
        }
    }

    /// Allocation watermark: everything below it has been handed out.
    pub fn end(&self) -> usize {
        self.end
    }

    pub fn data(&self) -> &[u8] {
        &self.data[..]
    }

    fn check_range(&self, address: usize, length: usize) -> bool {
        address <= self.data.len() && length <= self.data.len() - address.min(self.data.len())
    }

    /// Reads `size` bytes (1 or 2) at `address` as an integer.
    pub fn read(&self, address: usize, size: usize) -> Result<u64, ()> {
        if !self.check_range(address, size) {
            return Err(());
        }
        Ok(decode_value(&self.data[address..address + size], self.enc))
    }

    pub fn read_byte(&self, address: usize) -> Result<u8, ()> {
        if !self.check_range(address, 1) {
            return Err(());
        }
        Ok(self.data[address])
    }

    /// Writes `value` at `address` in the storage layout of `dtype`.
    pub fn write(&mut self, address: usize, dtype: DataType, value: u64) -> Result<(), ()> {
        let bytes = encode_value(dtype, value, self.enc);
        if !self.check_range(address, bytes.len()) {
            return Err(());
        }
        self.data[address..address + bytes.len()].copy_from_slice(&bytes);
        Ok(())
    }

    pub fn write_byte(&mut self, address: usize, value: u8) -> Result<(), ()> {
        if !self.check_range(address, 1) {
            return Err(());
        }
        self.data[address] = value;
        Ok(())
    }

    /// Copies `text` into fresh heap space with a `$` terminator, one or
    /// two bytes per character, and returns the start address.
    pub fn alloc_string(&mut self, text: &str, elem_size: usize) -> Result<usize, ()> {
        let start = self.end;
        let count = text.len();
        let needed = (count + 1) * elem_size;
        if !self.check_range(start, needed) {
            return Err(());
        }
        for (index, byte) in text.bytes().enumerate() {
            self.data[start + index * elem_size] = byte;
        }
        self.data[start + count * elem_size] = b'$';
        self.end += needed;
        Ok(start)
    }

    /// Reserves `count` bytes, writes the capacity byte (`count - 2`) at
    /// the start, and returns the start address. The capacity byte is what
    /// DOS function 10 consults before filling the buffer.
    pub fn alloc_buffer(&mut self, count: usize) -> Result<usize, ()> {
        let start = self.end;
        if count < 2 || !self.check_range(start, count) {
            return Err(());
        }
        self.data[start] = (count - 2) as u8;
        self.end += count;
        Ok(start)
    }
}
