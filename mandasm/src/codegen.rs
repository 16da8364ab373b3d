//! The assembly backend: walks the flat program with a symbolic stack that
//! shadows the simulator's value stack, and emits 16-bit real-mode MASM
//! for DOS (`.MODEL SMALL`).

use std::collections::HashSet;

use mandarine::diag::{report, Diagnostic, ErrorKind, Loc};
use mandarine::enums::{check_datatype_count, check_opcode_count};
use mandarine::ir::{Op, Program};
use mandarine::{ComState, DataType, Mode, Opcode, Result};

use crate::registers::{Reg, RegisterFile};

/// How many ops ahead a conditional jump may target before the short-range
/// workaround (`jcc bar_N / jmp labelN / bar_N:`) is emitted.
const SHORT_JUMP_RANGE: i64 = 30;

const PRINT_NUM_PROC: &str = "print_num:\n\
                              \tmov bx, 10\n\
                              \txor cx, cx\n\
                              print_num_next:\n\
                              \txor dx, dx\n\
                              \tdiv bx\n\
                              \tpush dx\n\
                              \tinc cx\n\
                              \ttest ax, ax\n\
                              \tjnz print_num_next\n\
                              print_num_out:\n\
                              \tpop dx\n\
                              \tadd dl, '0'\n\
                              \tmov ah, 2\n\
                              \tint 21h\n\
                              \tloop print_num_out\n\
                              \tret\n";

#[derive(Clone, Debug, PartialEq)]
enum AsmValue {
    /// Integer literal, full precision; truncated at the use site.
    Imm(u64),
    /// A `.DATA` symbol.
    Sym(String),
    /// Value currently lives in a register.
    Reg(Reg),
}

/// One entry of the symbolic stack.
#[derive(Clone, Debug, PartialEq)]
struct AsmData {
    value: AsmValue,
    dtype: Option<DataType>,
    ref_level: i8,
}

impl AsmData {
    fn imm(value: u64) -> AsmData {
        AsmData {
            value: AsmValue::Imm(value),
            dtype: None,
            ref_level: 0,
        }
    }

    fn sym(name: impl Into<String>, dtype: DataType, ref_level: i8) -> AsmData {
        AsmData {
            value: AsmValue::Sym(name.into()),
            dtype: Some(dtype),
            ref_level,
        }
    }

    fn reg(reg: Reg, dtype: Option<DataType>) -> AsmData {
        AsmData {
            value: AsmValue::Reg(reg),
            dtype,
            ref_level: 0,
        }
    }

    fn is_ax(&self) -> bool {
        self.value == AsmValue::Reg(Reg::AX)
    }
}

/// Compiles a flat program to a MASM listing.
pub fn compile(program: &Program) -> Result<String> {
    check_opcode_count("compile")?;
    check_datatype_count("compile")?;

    match program.mode {
        Mode::DOS => {}
        Mode::LINUX => {
            return Err(Diagnostic::fail(
                ErrorKind::COMPILE,
                "only the DOS target is implemented; run linux-mode programs in the simulator",
            ))
        }
        Mode::STANDARD | Mode::SET => {
            return Err(Diagnostic::fail(
                ErrorKind::COMPILE,
                "no compilation target selected; start the file with `#mode dos`",
            ))
        }
    }

    Emitter::new(program).run()
}

struct Emitter<'p> {
    program: &'p Program,
    start: String,
    data: String,
    code: String,
    stack: Vec<AsmData>,
    regs: RegisterFile,
    state: ComState,
    temp1: String,
    last_type: Option<DataType>,
    condition: Option<Opcode>,
    defined: HashSet<String>,
    str_index: usize,
    need_print_num: bool,
}

impl<'p> Emitter<'p> {
    fn new(program: &'p Program) -> Emitter<'p> {
        Emitter {
            program,
            start: String::new(),
            data: String::new(),
            code: String::new(),
            stack: Vec::new(),
            regs: RegisterFile::new(),
            state: ComState::empty(),
            temp1: String::new(),
            last_type: None,
            condition: None,
            defined: HashSet::new(),
            str_index: 0,
            need_print_num: false,
        }
    }

    fn run(mut self) -> Result<String> {
        self.start.push_str(".MODEL SMALL\n.STACK 100h\n");
        self.data.push_str(".DATA\n");
        self.code.push_str(".CODE\nstart:\n\tmov ax, @data\n\tmov ds, ax\n");
        // the startup code leaves AX dirty
        self.regs.mark(Reg::AX, None, 0);

        for ip in 0..self.program.ops.len() {
            self.op(ip)?;
        }

        self.code.push_str("\tmov ah, 4Ch\n\tint 21h\n");
        if self.need_print_num {
            self.code.push_str(PRINT_NUM_PROC);
        }
        self.code.push_str("END start\n");
        Ok(format!("{}{}{}", self.start, self.data, self.code))
    }

    // ---- text helpers -------------------------------------------------

    fn line(&mut self, text: &str) {
        self.code.push('\t');
        self.code.push_str(text);
        self.code.push('\n');
    }

    fn label_line(&mut self, name: &str) {
        self.code.push_str(name);
        self.code.push_str(":\n");
    }

    fn data_line(&mut self, text: &str) {
        self.data.push('\t');
        self.data.push_str(text);
        self.data.push('\n');
    }

    fn comment(&mut self, text: &str) {
        self.code.push_str(";; -- ");
        self.code.push_str(text);
        self.code.push_str(" --\n");
    }

    // ---- stack helpers ------------------------------------------------

    fn pop(&mut self, op: &Op) -> Result<AsmData> {
        self.stack
            .pop()
            .ok_or_else(|| compile_error(op, "expression stack underflow"))
    }

    fn push_ax(&mut self, dtype: Option<DataType>) {
        self.regs.mark(Reg::AX, dtype, 0);
        self.stack.push(AsmData::reg(Reg::AX, dtype));
    }

    // ---- operand emission ---------------------------------------------

    /// Emits `operation reg, <src>` choosing the MASM form from the source
    /// kind. `force_value` reads a pointer symbol's 16-bit cell instead of
    /// taking `offset`. With `reg == None` only the operand is printed
    /// (one-operand forms like `mul`).
    fn gen(&mut self, operation: &str, reg: Option<Reg>, src: &AsmData, force_value: bool, op: &Op) -> Result<()> {
        match &src.value {
            AsmValue::Imm(value) => match reg {
                Some(r) => {
                    self.line(&format!("{} {}, {}", operation, r.word(), value));
                    self.regs.mark(r, src.dtype, 0);
                }
                None => self.line(&format!("{} {}", operation, value)),
            },
            AsmValue::Reg(r2) => match reg {
                Some(r) => {
                    self.line(&format!("{} {}, {}", operation, r.word(), r2.word()));
                    self.regs.mark(r, src.dtype, 0);
                }
                None => self.line(&format!("{} {}", operation, r2.word())),
            },
            AsmValue::Sym(name) => {
                if src.ref_level < 0 {
                    let pointee = src.dtype.map(DataType::elem_size).unwrap_or(1);
                    self.deref_chain(name, (-src.ref_level) as u32);
                    let operand = if pointee == 1 {
                        "BYTE PTR [si]".to_owned()
                    } else {
                        "WORD PTR [si]".to_owned()
                    };
                    if pointee == 1 {
                        self.byte_read(operation, reg, &operand, op)?;
                    } else {
                        self.word_read(operation, reg, &operand);
                    }
                    return Ok(());
                }
                if src.ref_level > 0 {
                    if src.ref_level > 1 {
                        return Err(compile_error(op, "cannot take the address of an address"));
                    }
                    let operand = format!("offset {}", name);
                    match reg {
                        Some(r) => {
                            self.line(&format!("{} {}, {}", operation, r.word(), operand));
                            self.regs.mark(r, src.dtype, 1);
                        }
                        None => self.line(&format!("{} {}", operation, operand)),
                    }
                    return Ok(());
                }
                let operand = format!("[{}]", name);
                match src.dtype {
                    Some(DataType::UINT8) => self.byte_read(operation, reg, &operand, op)?,
                    Some(DataType::UINT16) => self.word_read(operation, reg, &operand),
                    Some(DataType::UINT8MEM) | Some(DataType::UINT16MEM) => {
                        if force_value {
                            // the pointer cell itself, a 16-bit address
                            self.word_read(operation, reg, &operand);
                        } else {
                            let operand = format!("offset {}", name);
                            match reg {
                                Some(r) => {
                                    self.line(&format!("{} {}, {}", operation, r.word(), operand));
                                    self.regs.mark(r, src.dtype, 0);
                                }
                                None => self.line(&format!("{} {}", operation, operand)),
                            }
                        }
                    }
                    _ => {
                        return Err(compile_error(op, "unknown type for data symbol"));
                    }
                }
            }
        }
        Ok(())
    }

    /// 8-bit read through the low half of `reg`, clearing the register
    /// first when a plain load would leave stale high bits.
    fn byte_read(&mut self, operation: &str, reg: Option<Reg>, operand: &str, op: &Op) -> Result<()> {
        match reg {
            Some(r) => {
                if self.regs.is_used(r) && operation == "mov" {
                    self.line(&format!("xor {}, {}", r.word(), r.word()));
                    self.regs.release(r);
                }
                let low = r
                    .byte()
                    .ok_or_else(|| compile_error(op, "register has no 8-bit form"))?;
                self.line(&format!("{} {}, {}", operation, low, operand));
                self.regs.mark(r, Some(DataType::UINT8), 0);
            }
            None => self.line(&format!("{} {}", operation, operand)),
        }
        Ok(())
    }

    fn word_read(&mut self, operation: &str, reg: Option<Reg>, operand: &str) {
        match reg {
            Some(r) => {
                self.line(&format!("{} {}, {}", operation, r.word(), operand));
                self.regs.mark(r, Some(DataType::UINT16), 0);
            }
            None => self.line(&format!("{} {}", operation, operand)),
        }
    }

    /// Expands a pointer operand into the SI dereference chain.
    fn deref_chain(&mut self, name: &str, levels: u32) {
        self.line(&format!("mov si, [{}]", name));
        for _ in 1..levels {
            self.line("mov si, [si]");
        }
        self.regs.mark(Reg::SI, None, 0);
    }

    /// Truncates an over-wide immediate to the destination width with a
    /// warning; the simulator keeps full precision.
    fn check_width(&self, value: u64, dtype: DataType, loc: &Loc) -> u64 {
        let bits = dtype.size() as u32 * 8;
        let max = (1u64 << bits) - 1;
        if value > max {
            report(
                &Diagnostic::warning(
                    ErrorKind::COMPILE,
                    format!("immediate {} exceeds {} bits, truncating", value, bits),
                )
                .at(loc.clone()),
            );
            value & max
        } else {
            value
        }
    }

    fn var_dtype(&self, name: &str, op: &Op) -> Result<DataType> {
        self.program
            .vars
            .get(name)
            .map(|var| var.dtype)
            .ok_or_else(|| compile_error(op, "reference to an unknown variable"))
    }

    fn current_dtype(&self, op: &Op) -> Result<DataType> {
        self.program
            .vars
            .get(&self.temp1)
            .map(|var| var.dtype)
            .ok_or_else(|| compile_error(op, "no variable in scope for the current statement"))
    }

    // ---- op dispatch --------------------------------------------------

    fn op(&mut self, ip: usize) -> Result<()> {
        let op = self.program.ops[ip].clone();
        match op.opcode {
            Opcode::NUM => {
                let value = op
                    .int_value()
                    .ok_or_else(|| compile_error(&op, "number op without an integer payload"))?;
                self.stack.push(AsmData::imm(value));
            }
            Opcode::STRING => self.string(&op)?,
            Opcode::ADD => self.arith2(&op, "add", "ADD")?,
            Opcode::SUB => self.arith2(&op, "sub", "SUB")?,
            Opcode::MUL => self.multiply(&op)?,
            Opcode::DIV => self.divide(&op, false)?,
            Opcode::MOD => self.divide(&op, true)?,
            Opcode::SHL => self.shift(&op, "shl")?,
            Opcode::SHR => self.shift(&op, "shr")?,
            Opcode::IF => {
                self.comment("IF");
                self.state = ComState::CONDITION;
            }
            Opcode::WHILE => {
                self.comment("WHILE");
                self.state = ComState::CONDITION;
            }
            Opcode::EQUAL | Opcode::GREATER | Opcode::LESS | Opcode::GE | Opcode::LE => {
                self.comparison(&op)?
            }
            Opcode::CONJUMP => self.conjump(&op, ip)?,
            Opcode::JUMP => {
                let target = op
                    .label()
                    .ok_or_else(|| compile_error(&op, "jump op without a label payload"))?;
                self.line(&format!("jmp {}", target));
                self.state = ComState::empty();
                self.regs.reset();
            }
            Opcode::LABEL => {
                let name = op
                    .label()
                    .ok_or_else(|| compile_error(&op, "label op without a name payload"))?
                    .to_owned();
                self.label_line(&name);
            }
            Opcode::COPY => {
                let a = self.pop(&op)?;
                self.stack.push(a.clone());
                self.stack.push(a);
            }
            Opcode::PRINT => {
                self.print_number(&op)?;
            }
            Opcode::PRINT_AND_NL => {
                self.print_number(&op)?;
                self.print_newline();
            }
            Opcode::PRINT_NL => self.print_newline(),
            Opcode::PRINT_CHAR => self.print_char(&op)?,
            Opcode::TYPE => {}
            Opcode::BUF => self.buffer(&op)?,
            Opcode::VAR => self.var_ref(&op)?,
            Opcode::SET => {
                self.state = ComState::VARDEF | ComState::ARITHMETIC;
                self.pop(&op)?;
            }
            Opcode::COLON => self.colon(&op)?,
            Opcode::MEMWRITE => self.memwrite(&op)?,
            Opcode::MEMREAD => self.memread(&op)?,
            Opcode::DOS => self.dos_call(&op)?,
            Opcode::LINUX => {
                return Err(compile_error(
                    &op,
                    "linux syscalls cannot be compiled for the DOS target",
                ))
            }
            Opcode::ELSE | Opcode::MODE | Opcode::COUNT => {
                return Err(compile_error(&op, "op has no meaning in flat code"))
            }
        }
        Ok(())
    }

    // ---- arithmetic ---------------------------------------------------

    /// Brings the running value into AX. `a` is the just-popped right
    /// operand, needed to patch the one case where the accumulator holds
    /// it instead of the left operand.
    fn load_accumulator(&mut self, b: &AsmData, op: &Op) -> Result<()> {
        if !b.is_ax() {
            self.gen("mov", Some(Reg::AX), b, false, op)?;
        }
        Ok(())
    }

    fn arith2(&mut self, op: &Op, mnemonic: &str, title: &str) -> Result<()> {
        self.comment(title);
        let a = self.pop(op)?;
        let b = self.pop(op)?;
        if a.is_ax() && !b.is_ax() {
            // the accumulator holds the right operand
            if mnemonic == "add" {
                self.gen("add", Some(Reg::AX), &b, true, op)?;
            } else {
                self.line("mov bx, ax");
                self.regs.mark(Reg::BX, a.dtype, 0);
                self.gen("mov", Some(Reg::AX), &b, false, op)?;
                self.line("sub ax, bx");
            }
        } else {
            self.load_accumulator(&b, op)?;
            self.gen(mnemonic, Some(Reg::AX), &a, true, op)?;
        }
        self.push_ax(b.dtype.or(a.dtype));
        Ok(())
    }

    fn multiply(&mut self, op: &Op) -> Result<()> {
        self.comment("MUL");
        let a = self.pop(op)?;
        let b = self.pop(op)?;
        if a.is_ax() && !b.is_ax() {
            // commutative, so fold the other operand in instead
            self.mul_operand(&b, op)?;
        } else {
            self.load_accumulator(&b, op)?;
            self.mul_operand(&a, op)?;
        }
        self.push_ax(b.dtype.or(a.dtype));
        Ok(())
    }

    fn mul_operand(&mut self, a: &AsmData, op: &Op) -> Result<()> {
        match &a.value {
            AsmValue::Imm(value) => {
                self.line(&format!("mov cx, {}", value));
                self.regs.mark(Reg::CX, None, 0);
                self.line("mul cx");
            }
            AsmValue::Reg(r) => self.line(&format!("mul {}", r.word())),
            AsmValue::Sym(_) => self.gen("mul", None, a, true, op)?,
        }
        Ok(())
    }

    fn divide(&mut self, op: &Op, remainder: bool) -> Result<()> {
        self.comment(if remainder { "MOD" } else { "DIV" });
        let a = self.pop(op)?;
        let b = self.pop(op)?;
        if a.is_ax() {
            // divisor computed last; park it before loading the dividend
            self.line("mov cx, ax");
            self.regs.mark(Reg::CX, a.dtype, 0);
            self.load_accumulator(&b, op)?;
            self.line("div cl");
        } else {
            self.load_accumulator(&b, op)?;
            match &a.value {
                AsmValue::Imm(value) => {
                    self.line(&format!("mov cx, {}", value));
                    self.regs.mark(Reg::CX, None, 0);
                    self.line("div cl");
                }
                AsmValue::Reg(r) => {
                    let low = r.byte().unwrap_or_else(|| r.word());
                    self.line(&format!("div {}", low));
                }
                AsmValue::Sym(_) => self.gen("div BYTE PTR", None, &a, true, op)?,
            }
        }
        if remainder {
            self.line("mov al, ah");
        }
        self.line("xor ah, ah");
        self.push_ax(b.dtype.or(a.dtype));
        Ok(())
    }

    fn shift(&mut self, op: &Op, mnemonic: &str) -> Result<()> {
        let a = self.pop(op)?;
        let b = self.pop(op)?;
        if a.is_ax() {
            self.line("mov cx, ax");
            self.regs.mark(Reg::CX, a.dtype, 0);
            self.load_accumulator(&b, op)?;
            self.line(&format!("{} ax, cl", mnemonic));
        } else {
            self.load_accumulator(&b, op)?;
            match &a.value {
                AsmValue::Imm(value) => self.line(&format!("{} ax, {}", mnemonic, value)),
                _ => {
                    self.gen("mov", Some(Reg::CX), &a, true, op)?;
                    self.line(&format!("{} ax, cl", mnemonic));
                }
            }
        }
        self.push_ax(b.dtype.or(a.dtype));
        Ok(())
    }

    // ---- comparisons and jumps ----------------------------------------

    /// The left side of the condition is complete when the comparison op
    /// fires; it is parked in BX so the right side can use the
    /// accumulator. `CONJUMP` emits `cmp bx, ax` against it.
    fn comparison(&mut self, op: &Op) -> Result<()> {
        let a = self.pop(op)?;
        match a.value {
            AsmValue::Reg(Reg::AX) => {
                self.line("mov bx, ax");
            }
            _ => self.gen("mov", Some(Reg::BX), &a, true, op)?,
        }
        self.regs.mark(Reg::BX, a.dtype, 0);
        self.condition = Some(op.opcode);
        Ok(())
    }

    fn conjump(&mut self, op: &Op, ip: usize) -> Result<()> {
        let a = self.pop(op)?;
        if !a.is_ax() {
            self.gen("mov", Some(Reg::AX), &a, true, op)?;
        }
        self.line("cmp bx, ax");
        self.state = ComState::empty();

        let condition = self
            .condition
            .ok_or_else(|| compile_error(op, "conditional jump without a stored comparison"))?;
        let target = op
            .label()
            .ok_or_else(|| compile_error(op, "jump op without a label payload"))?
            .to_owned();
        let target_index = *self
            .program
            .labels
            .get(&target)
            .ok_or_else(|| compile_error(op, "jump to an unknown label"))?;

        let negated = match condition {
            Opcode::EQUAL => "jne",
            Opcode::GREATER => "jle",
            Opcode::LESS => "jge",
            Opcode::GE => "jl",
            Opcode::LE => "jg",
            _ => return Err(compile_error(op, "stored condition is not a comparison")),
        };

        if target_index as i64 - ip as i64 > SHORT_JUMP_RANGE {
            let positive = match condition {
                Opcode::EQUAL => "je",
                Opcode::GREATER => "jg",
                Opcode::LESS => "jl",
                Opcode::GE => "jge",
                Opcode::LE => "jle",
                _ => return Err(compile_error(op, "stored condition is not a comparison")),
            };
            self.line(&format!("{} bar_{}", positive, ip));
            self.line(&format!("jmp {}", target));
            self.label_line(&format!("bar_{}", ip));
        } else {
            self.line(&format!("{} {}", negated, target));
        }
        self.regs.reset();
        Ok(())
    }

    // ---- variables and storage ----------------------------------------

    fn var_ref(&mut self, op: &Op) -> Result<()> {
        let vref = op
            .var()
            .ok_or_else(|| compile_error(op, "variable op without a reference payload"))?
            .clone();
        let dtype = self.var_dtype(&vref.name, op)?;

        if !self
            .state
            .intersects(ComState::ARITHMETIC | ComState::CONDITION)
        {
            self.temp1 = vref.name.clone();
            // scalars get their cell on first sighting; pointer variables
            // are declared by their defining op
            if !self.defined.contains(&vref.name) && !dtype.is_pointer() {
                let directive = match dtype {
                    DataType::UINT8 => "db",
                    _ => "dw",
                };
                self.data_line(&format!("{} {} ?", vref.name, directive));
                self.defined.insert(vref.name.clone());
            }
        }
        self.last_type = Some(dtype);
        self.stack.push(AsmData::sym(vref.name, dtype, vref.ref_level));
        Ok(())
    }

    fn declare_pointer_cell(&mut self, name: &str) {
        if !self.defined.contains(name) {
            self.data_line(&format!("{} dw ?", name));
            self.defined.insert(name.to_owned());
        }
    }

    fn colon(&mut self, op: &Op) -> Result<()> {
        if self.state.contains(ComState::VARDEF) {
            let name = self.temp1.clone();
            let dtype = self.current_dtype(op)?;
            if dtype.is_pointer() {
                self.declare_pointer_cell(&name);
            }
            let a = self.pop(op)?;
            match a.value {
                AsmValue::Imm(value) => {
                    let value = self.check_width(value, dtype, &op.file_loc);
                    self.line(&format!("mov [{}], {}", name, value));
                }
                AsmValue::Reg(r) => {
                    let source = if dtype.size() == 1 {
                        r.byte().unwrap_or_else(|| r.word())
                    } else {
                        r.word()
                    };
                    self.line(&format!("mov [{}], {}", name, source));
                }
                AsmValue::Sym(_) => {
                    self.gen("mov", Some(Reg::BX), &a, true, op)?;
                    let source = if dtype.size() == 1 { "bl" } else { "bx" };
                    self.line(&format!("mov [{}], {}", name, source));
                }
            }
        }
        self.state = ComState::empty();
        Ok(())
    }

    fn string(&mut self, op: &Op) -> Result<()> {
        let text = op
            .text()
            .ok_or_else(|| compile_error(op, "string op without text payload"))?;
        let rendered = masm_string(text);
        if self.state.contains(ComState::VARDEF) {
            let name = self.temp1.clone();
            let dtype = self.current_dtype(op)?;
            let directive = match dtype {
                DataType::UINT8MEM => "db",
                DataType::UINT16MEM => "dw",
                _ => {
                    return Err(compile_error(op, "string assigned to a non-pointer variable"));
                }
            };
            self.data_line(&format!("{} {} {}", name, directive, rendered));
            self.defined.insert(name);
            self.state = ComState::empty();
        } else {
            let sym = format!("str{}", self.str_index);
            self.str_index += 1;
            self.data_line(&format!("{} db {}", sym, rendered));
            self.stack.push(AsmData::sym(sym, DataType::UINT8MEM, 0));
        }
        Ok(())
    }

    fn buffer(&mut self, op: &Op) -> Result<()> {
        if !self.state.contains(ComState::VARDEF) {
            return Err(compile_error(op, "Buf used in wrong position"));
        }
        let a = self.pop(op)?;
        let count = match a.value {
            AsmValue::Imm(value) => value,
            _ => {
                return Err(compile_error(op, "buffer size must be a number literal"));
            }
        };
        if count < 2 {
            return Err(compile_error(op, "buffer is too small"));
        }
        let name = self.temp1.clone();
        let dtype = self.current_dtype(op)?;
        let directive = match dtype {
            DataType::UINT8MEM => "db",
            DataType::UINT16MEM => "dw",
            _ => return Err(compile_error(op, "buf requires a pointer variable")),
        };
        self.data_line(&format!(
            "{} {} {},{} dup (0)",
            name,
            directive,
            count - 2,
            count - 1
        ));
        self.defined.insert(name);
        self.state = ComState::empty();
        Ok(())
    }

    // ---- memory -------------------------------------------------------

    fn mem_width(&self, addr: &AsmData) -> usize {
        addr.dtype
            .filter(|dtype| dtype.is_pointer())
            .or_else(|| self.program.vars.get(&self.temp1).map(|var| var.dtype))
            .map(DataType::elem_size)
            .unwrap_or(1)
    }

    fn store_to(&mut self, target: &str, width: usize, value: &AsmData, op: &Op) -> Result<()> {
        let size = if width == 1 { "BYTE" } else { "WORD" };
        match &value.value {
            AsmValue::Imm(v) => {
                let truncated = if width == 1 { v & 0xFF } else { v & 0xFFFF };
                self.line(&format!("mov {} PTR [{}], {}", size, target, truncated));
            }
            AsmValue::Reg(r) => {
                let source = if width == 1 {
                    r.byte()
                        .ok_or_else(|| compile_error(op, "register has no 8-bit form"))?
                } else {
                    r.word()
                };
                self.line(&format!("mov {} PTR [{}], {}", size, target, source));
            }
            AsmValue::Sym(_) => {
                self.gen("mov", Some(Reg::BX), value, true, op)?;
                let source = if width == 1 { "bl" } else { "bx" };
                self.line(&format!("mov {} PTR [{}], {}", size, target, source));
            }
        }
        Ok(())
    }

    fn memwrite(&mut self, op: &Op) -> Result<()> {
        self.comment("MEMWRITE");
        let value = self.pop(op)?;
        let addr = self.pop(op)?;
        let width = self.mem_width(&addr);
        match &addr.value {
            AsmValue::Sym(name) => {
                self.line(&format!("mov si, WORD PTR [{}]", name));
                self.regs.mark(Reg::SI, addr.dtype, 0);
                self.store_to("si", width, &value, op)?;
            }
            AsmValue::Reg(r) => {
                self.line(&format!("mov di, {}", r.word()));
                self.regs.mark(Reg::DI, None, 0);
                self.store_to("di", width, &value, op)?;
            }
            AsmValue::Imm(_) => {
                return Err(compile_error(op, "int type in memwrite for address"));
            }
        }
        Ok(())
    }

    fn memread(&mut self, op: &Op) -> Result<()> {
        self.comment("MEMREAD");
        let addr = self.pop(op)?;
        let width = self.mem_width(&addr);
        match &addr.value {
            AsmValue::Sym(name) => {
                if !addr.dtype.map_or(false, DataType::is_pointer) {
                    return Err(compile_error(op, "Wrong Type, should be pointer"));
                }
                self.line(&format!("mov si, WORD PTR [{}]", name));
                self.regs.mark(Reg::SI, addr.dtype, 0);
            }
            AsmValue::Reg(r) => {
                self.line(&format!("mov si, {}", r.word()));
                self.regs.mark(Reg::SI, None, 0);
            }
            AsmValue::Imm(value) => {
                self.line(&format!("mov si, {}", value));
                self.regs.mark(Reg::SI, None, 0);
            }
        }
        if width == 1 {
            self.byte_read("mov", Some(Reg::AX), "BYTE PTR [si]", op)?;
            self.push_ax(Some(DataType::UINT8));
        } else {
            self.word_read("mov", Some(Reg::AX), "WORD PTR [si]");
            self.push_ax(Some(DataType::UINT16));
        }
        Ok(())
    }

    // ---- output -------------------------------------------------------

    fn print_number(&mut self, op: &Op) -> Result<()> {
        let a = self.pop(op)?;
        if !a.is_ax() {
            self.gen("mov", Some(Reg::AX), &a, true, op)?;
        }
        self.need_print_num = true;
        self.line("call print_num");
        // the routine clobbers the working registers
        self.regs.reset();
        self.regs.mark(Reg::AX, None, 0);
        Ok(())
    }

    fn print_newline(&mut self) {
        self.line("mov dl, 13");
        self.line("mov ah, 2");
        self.line("int 21h");
        self.line("mov dl, 10");
        self.line("mov ah, 2");
        self.line("int 21h");
        self.regs.mark(Reg::DX, None, 0);
        self.regs.mark(Reg::AX, None, 0);
    }

    fn print_char(&mut self, op: &Op) -> Result<()> {
        let a = self.pop(op)?;
        match &a.value {
            AsmValue::Imm(value) => self.line(&format!("mov dl, {}", value & 0xFF)),
            AsmValue::Reg(Reg::AX) => self.line("mov dl, al"),
            AsmValue::Reg(r) => {
                let low = r
                    .byte()
                    .ok_or_else(|| compile_error(op, "register has no 8-bit form"))?;
                self.line(&format!("mov dl, {}", low));
            }
            AsmValue::Sym(_) => self.gen("mov", Some(Reg::DX), &a, true, op)?,
        }
        self.line("mov ah, 2");
        self.line("int 21h");
        self.regs.mark(Reg::DX, None, 0);
        self.regs.mark(Reg::AX, None, 0);
        Ok(())
    }

    fn dos_call(&mut self, op: &Op) -> Result<()> {
        let function = self.pop(op)?;
        let function = match function.value {
            AsmValue::Imm(value) => value,
            _ => return Err(compile_error(op, "dos function code must be a number literal")),
        };
        match function {
            9 => {
                let addr = self.pop(op)?;
                match &addr.value {
                    AsmValue::Sym(name) => self.line(&format!("mov dx, offset {}", name)),
                    AsmValue::Reg(r) => self.line(&format!("mov dx, {}", r.word())),
                    AsmValue::Imm(_) => {
                        return Err(compile_error(op, "int type in dos call for address"));
                    }
                }
                if self.regs.is_used(Reg::AX) {
                    self.line("xor ax, ax");
                }
                self.line("mov ah, 9");
                self.line("int 21h");
            }
            10 => {
                if self.regs.is_used(Reg::AX) {
                    self.line("xor ax, ax");
                }
                self.line("mov ah, 10");
                let addr = self.pop(op)?;
                match &addr.value {
                    AsmValue::Sym(name) => self.line(&format!("mov dx, offset {}", name)),
                    _ => return Err(compile_error(op, "int type in dos call for address")),
                }
                self.line("int 21h");
            }
            _ => {
                return Err(compile_error(
                    op,
                    "only 9 and 10 dos calls are implemented yet",
                ))
            }
        }
        self.regs.mark(Reg::AX, None, 0);
        self.regs.mark(Reg::DX, None, 0);
        Ok(())
    }
}

/// Renders a string literal as a MASM `db`/`dw` operand list, splicing
/// newlines out as `, 10,` items: `"HI\n"` becomes `"HI", 10,"$"`.
fn masm_string(text: &str) -> String {
    format!("\"{}$\"", text.replace('\n', "\", 10,\""))
}

fn compile_error(op: &Op, message: &str) -> Diagnostic {
    Diagnostic::fail(ErrorKind::COMPILE, message).at(op.file_loc.clone())
}
