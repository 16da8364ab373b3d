use crate::compile;
use crate::test::{compile_source, parse_source};
use mandarine::ErrorKind;

#[test]
fn listing_has_the_dos_frame() {
    let listing = compile_source("#mode dos\nu8 x = 1;");
    assert!(listing.starts_with(".MODEL SMALL\n.STACK 100h\n.DATA\n"));
    assert!(listing.contains(".CODE\nstart:\n\tmov ax, @data\n\tmov ds, ax\n"));
    assert!(listing.contains("\tmov ah, 4Ch\n\tint 21h\n"));
    assert!(listing.ends_with("END start\n"));
}

#[test]
fn scalars_get_data_cells() {
    let listing = compile_source("#mode dos\nu8 x = 1; u16 y = 2;");
    assert!(listing.contains("\tvx db ?\n"));
    assert!(listing.contains("\tvy dw ?\n"));
    assert!(listing.contains("\tmov [vx], 1\n"));
    assert!(listing.contains("\tmov [vy], 2\n"));
}

#[test]
fn string_declaration_matches_the_masm_shape() {
    let listing = compile_source("#mode dos\nu8p s = \"HI\\n\" ; s 9 dos");
    assert!(listing.contains("\tvs db \"HI\", 10,\"$\"\n"));
    assert!(listing.contains("\tmov dx, offset vs\n"));
    assert!(listing.contains("\tmov ah, 9\n\tint 21h\n"));
}

#[test]
fn buffers_declare_capacity_and_zero_fill() {
    let listing = compile_source("#mode dos\nu8p b = 10 buf ;");
    assert!(listing.contains("\tvb db 8,9 dup (0)\n"));
}

#[test]
fn arithmetic_accumulates_in_ax() {
    let listing = compile_source("#mode dos\nu16 y = 3 4 + 5 *; y ..n");
    assert!(listing.contains("\tmov ax, 3\n\tadd ax, 4\n"));
    assert!(listing.contains("\tmov cx, 5\n\tmul cx\n"));
    assert!(listing.contains("\tmov [vy], ax\n"));
    assert!(listing.contains("call print_num"));
    assert!(listing.contains("print_num:"));
}

#[test]
fn print_num_routine_is_emitted_once_and_only_when_used() {
    let listing = compile_source("#mode dos\nu8 x = 1; x . x .");
    assert_eq!(listing.matches("print_num:").count(), 1);

    let listing = compile_source("#mode dos\nu8 x = 1;");
    assert!(!listing.contains("print_num"));
}

#[test]
fn while_loop_compiles_to_labels_and_negated_jumps() {
    let listing = compile_source("#mode dos\nu8 i = 0; while (i < 5) { i = i 1 + ; }");
    // i < 5 fails -> leave the loop
    assert!(listing.contains("\tcmp bx, ax\n\tjge label1\n"));
    assert!(listing.contains("\tjmp label0\n"));
    assert!(listing.contains("label0:\n"));
    assert!(listing.contains("label1:\n"));
}

#[test]
fn comparison_parks_the_left_side_in_bx() {
    let listing = compile_source("#mode dos\nu8 a = 1; if (a == 2) { 3 . }");
    assert!(listing.contains("\tmov bl, [va]\n"));
    assert!(listing.contains("\tmov ax, 2\n\tcmp bx, ax\n\tjne label0\n"));
}

#[test]
fn u8_loads_clear_the_dirty_accumulator() {
    let listing = compile_source("#mode dos\nu8 x = 1; x .");
    // the startup mov ax, @data leaves AX dirty
    assert!(listing.contains("\txor ax, ax\n\tmov al, [vx]\n"));
}

#[test]
fn memory_traffic_goes_through_si() {
    let listing = compile_source("#mode dos\nu8p b = 10 buf ; b 65 .mem b ,mem .c");
    assert!(listing.contains("\tmov si, WORD PTR [vb]\n\tmov BYTE PTR [si], 65\n"));
    assert!(listing.contains("\tmov si, WORD PTR [vb]\n"));
    assert!(listing.contains("\tmov al, BYTE PTR [si]\n"));
    assert!(listing.contains("\tmov dl, al\n\tmov ah, 2\n\tint 21h\n"));
}

#[test]
fn deref_operand_expands_to_a_chain() {
    let listing = compile_source("#mode dos\nu8p b = 10 buf ; u8 x = *b ;");
    assert!(listing.contains("\tmov si, [vb]\n"));
    assert!(listing.contains("BYTE PTR [si]"));
}

#[test]
fn address_of_uses_offset() {
    let listing = compile_source("#mode dos\nu8 x = 1; u16 p = &x ;");
    assert!(listing.contains("offset vx"));
}

#[test]
fn over_wide_immediate_is_truncated() {
    let listing = compile_source("#mode dos\nu8 x = 300 ;");
    assert!(listing.contains("\tmov [vx], 44\n"));
}

#[test]
fn pointer_assignment_declares_a_cell() {
    let listing = compile_source("#mode dos\nu8p b = 10 buf ; u8p q = b ;");
    assert!(listing.contains("\tvq dw ?\n"));
}

#[test]
fn modes_without_a_dos_target_cannot_compile() {
    let program = parse_source("#mode linux\n1 1 1 1 linux").unwrap();
    assert_eq!(compile(&program).unwrap_err().kind, ErrorKind::COMPILE);

    let program = parse_source("u8 x = 1;").unwrap();
    assert_eq!(compile(&program).unwrap_err().kind, ErrorKind::COMPILE);
}

#[test]
fn dos_function_needs_a_symbol_address() {
    let program = parse_source("#mode dos\n5 9 dos").unwrap();
    assert_eq!(compile(&program).unwrap_err().kind, ErrorKind::COMPILE);
}

#[test]
fn registers_are_forgotten_after_jumps() {
    // after the loop's CONJUMP the tracker is clean again, so the u8 load
    // inside the body needs no xor
    let listing = compile_source("#mode dos\nu8 i = 0; while (i < 5) { i = i 1 + ; }");
    assert!(listing.contains("\tjge label1\n\tmov al, [vi]\n"));
}
