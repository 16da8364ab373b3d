use super::*;

#[test]
fn alloc_string_terminates_with_dollar() {
    let mut heap = Heap::new(VarEncoding::BIG);
    let address = heap.alloc_string("HI", 1).unwrap();

    assert_eq!(address, 0);
    assert_eq!(&heap.data()[0..3], b"HI$");
    assert_eq!(heap.end(), 3);
}

#[test]
fn alloc_string_wide_elements() {
    let mut heap = Heap::new(VarEncoding::BIG);
    heap.alloc_string("AB", 2).unwrap();

    assert_eq!(&heap.data()[0..6], &[b'A', 0, b'B', 0, b'$', 0]);
    assert_eq!(heap.end(), 6);
}

#[test]
fn alloc_buffer_writes_capacity_byte() {
    let mut heap = Heap::new(VarEncoding::BIG);
    let address = heap.alloc_buffer(10).unwrap();

    assert_eq!(address, 0);
    assert_eq!(heap.data()[0], 8);
    assert_eq!(heap.end(), 10);
}

#[test]
fn alloc_buffer_rejects_tiny_sizes() {
    let mut heap = Heap::new(VarEncoding::BIG);
    assert_eq!(heap.alloc_buffer(1), Err(()));
}

#[test]
fn allocations_advance_the_watermark() {
    let mut heap = Heap::new(VarEncoding::BIG);
    let first = heap.alloc_string("A", 1).unwrap();
    let second = heap.alloc_string("B", 1).unwrap();

    assert_eq!(first, 0);
    assert_eq!(second, 2);
}

#[test]
fn read_write_u16() {
    let mut heap = Heap::new(VarEncoding::BIG);
    heap.write(100, DataType::UINT16, 0x0203).unwrap();

    assert_eq!(heap.read(100, 2), Ok(0x0203));
    assert_eq!(heap.read_byte(100), Ok(2));
    assert_eq!(heap.read_byte(101), Ok(3));
}

#[test]
fn out_of_range_access_fails() {
    let mut heap = Heap::new(VarEncoding::BIG);
    assert_eq!(heap.read(crate::constants::HEAP_SIZE - 1, 2), Err(()));
    assert_eq!(heap.write_byte(crate::constants::HEAP_SIZE, 0), Err(()));
}
