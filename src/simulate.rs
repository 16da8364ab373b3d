//! The interpreter backend: a dispatch loop over the flat op sequence,
//! executing against a value stack, the variable table and the heap.

use std::io::{BufRead, Write};

use crate::constants;
use crate::diag::{report, Diagnostic, ErrorKind};
use crate::enums::{check_opcode_count, ComState, DataType, Opcode};
use crate::heap::Heap;
use crate::ir::{Op, Program, VarRef};
use crate::value::{decode_value, encode_value, VarEncoding};
use crate::{Result, Word};

pub struct Simulator {
    heap: Heap,
    stack: Vec<Word>,
    state: ComState,
    /// Name of the last variable referenced outside an expression; the
    /// target of `;`, `buf`, string definitions and `.mem`.
    temp1: String,
    /// Type of the last referenced variable; decides the `,mem` width.
    last_type: Option<DataType>,
    /// Comparison op stored for the next `CONJUMP`.
    condition: Option<Opcode>,
    enc: VarEncoding,
}

impl Simulator {
    pub fn new() -> Simulator {
        Simulator::with_encoding(VarEncoding::default())
    }

    pub fn with_encoding(enc: VarEncoding) -> Simulator {
        Simulator {
            heap: Heap::new(enc),
            stack: Vec::new(),
            state: ComState::empty(),
            temp1: String::new(),
            last_type: None,
            condition: None,
            enc,
        }
    }

    /// Runs `program` to completion, writing program output to `out` and
    /// reading DOS function 10 lines from `input`. The heap and stack
    /// belong to this one run; construct a fresh `Simulator` for the next
    /// program.
    pub fn run(
        &mut self,
        program: &mut Program,
        out: &mut dyn Write,
        input: &mut dyn BufRead,
    ) -> Result<()> {
        check_opcode_count("Simulator::run")?;

        let mut ip = 0usize;
        while ip < program.ops.len() {
            ip = self.step(program, ip, out, input)?;
        }
        Ok(())
    }

    fn step(
        &mut self,
        program: &mut Program,
        ip: usize,
        out: &mut dyn Write,
        input: &mut dyn BufRead,
    ) -> Result<usize> {
        let op = program.ops[ip].clone();
        match op.opcode {
            Opcode::NUM => {
                let value = int_payload(&op)?;
                self.stack.push(value);
            }
            Opcode::STRING => self.string(program, &op)?,
            Opcode::ADD => self.binary(&op, |b, a| Ok(b.wrapping_add(a)))?,
            Opcode::SUB => self.binary(&op, |b, a| Ok(b.wrapping_sub(a)))?,
            Opcode::MUL => self.binary(&op, |b, a| Ok(b.wrapping_mul(a)))?,
            Opcode::DIV => self.binary(&op, |b, a| {
                b.checked_div(a).ok_or(())
            })?,
            Opcode::MOD => self.binary(&op, |b, a| {
                b.checked_rem(a).ok_or(())
            })?,
            Opcode::SHL => self.binary(&op, |b, a| Ok(b.wrapping_shl(a as u32)))?,
            Opcode::SHR => self.binary(&op, |b, a| Ok(b.wrapping_shr(a as u32)))?,
            Opcode::IF | Opcode::WHILE => self.state = ComState::CONDITION,
            Opcode::EQUAL | Opcode::GREATER | Opcode::LESS | Opcode::GE | Opcode::LE => {
                self.condition = Some(op.opcode);
            }
            Opcode::CONJUMP => {
                let a = self.pop(&op)?;
                let b = self.pop(&op)?;
                self.state = ComState::empty();
                let condition = self.condition.ok_or_else(|| {
                    simulate_error(&op, "conditional jump without a stored comparison")
                })?;
                let holds = condition
                    .compare(b, a)
                    .ok_or_else(|| simulate_error(&op, "stored condition is not a comparison"))?;
                if !holds {
                    return Ok(self.jump_target(program, &op)?);
                }
            }
            Opcode::JUMP => {
                self.state = ComState::empty();
                return Ok(self.jump_target(program, &op)?);
            }
            Opcode::LABEL => {}
            Opcode::COPY => {
                let a = self.pop(&op)?;
                self.stack.push(a);
                self.stack.push(a);
            }
            Opcode::PRINT => {
                let a = self.pop(&op)?;
                write_out(out, &op, &a.to_string())?;
            }
            Opcode::PRINT_NL => write_out(out, &op, "\n")?,
            Opcode::PRINT_AND_NL => {
                let a = self.pop(&op)?;
                write_out(out, &op, &a.to_string())?;
                write_out(out, &op, "\n")?;
            }
            Opcode::PRINT_CHAR => {
                let a = self.pop(&op)?;
                let c = std::char::from_u32(a as u32)
                    .ok_or_else(|| simulate_error(&op, "value is not a printable character"))?;
                write_out(out, &op, &c.to_string())?;
            }
            Opcode::TYPE => {}
            Opcode::BUF => self.buffer(program, &op)?,
            Opcode::VAR => self.var_ref(program, &op)?,
            Opcode::SET => {
                self.state = ComState::VARDEF | ComState::ARITHMETIC;
                self.pop(&op)?;
            }
            Opcode::COLON => {
                if self.state.contains(ComState::VARDEF) {
                    let a = self.pop(&op)?;
                    let var = self.current_var_mut(program, &op)?;
                    var.value = encode_value(var.dtype, a, self.enc);
                    var.defined = true;
                }
                self.state = ComState::empty();
            }
            Opcode::MEMWRITE => {
                let value = self.pop(&op)?;
                let address = self.pop(&op)? as usize;
                let dtype = self.current_var_mut(program, &op)?.dtype;
                let scalar = match dtype {
                    DataType::UINT8 | DataType::UINT8MEM => DataType::UINT8,
                    _ => DataType::UINT16,
                };
                self.heap
                    .write(address, scalar, value)
                    .map_err(|_| heap_error(&op, address))?;
            }
            Opcode::MEMREAD => {
                let address = self.pop(&op)? as usize;
                let width = self
                    .last_type
                    .ok_or_else(|| simulate_error(&op, "no variable type in scope for `,mem`"))?
                    .elem_size();
                let value = self
                    .heap
                    .read(address, width)
                    .map_err(|_| heap_error(&op, address))?;
                self.stack.push(value);
            }
            Opcode::DOS => self.dos_call(&op, out, input)?,
            Opcode::LINUX => self.linux_call(&op, out)?,
            Opcode::ELSE | Opcode::MODE | Opcode::COUNT => {
                return Err(simulate_error(&op, "op has no meaning in flat code"));
            }
        }
        Ok(ip + 1)
    }

    fn pop(&mut self, op: &Op) -> Result<Word> {
        self.stack
            .pop()
            .ok_or_else(|| simulate_error(op, "value stack underflow"))
    }

    fn binary<F>(&mut self, op: &Op, apply: F) -> Result<()>
    where
        F: FnOnce(Word, Word) -> std::result::Result<Word, ()>,
    {
        let a = self.pop(op)?;
        let b = self.pop(op)?;
        let result = apply(b, a).map_err(|_| simulate_error(op, "division by zero"))?;
        self.stack.push(result);
        Ok(())
    }

    fn jump_target(&self, program: &Program, op: &Op) -> Result<usize> {
        let name = op
            .label()
            .ok_or_else(|| simulate_error(op, "jump without a label payload"))?;
        program
            .labels
            .get(name)
            .copied()
            .ok_or_else(|| simulate_error(op, "jump to an unknown label").with_expected(name, "no label"))
    }

    fn current_var_mut<'p>(&self, program: &'p mut Program, op: &Op) -> Result<&'p mut crate::ir::Var> {
        program.vars.get_mut(&self.temp1).ok_or_else(|| {
            simulate_error(op, "no variable in scope for the current statement")
        })
    }

    fn string(&mut self, program: &mut Program, op: &Op) -> Result<()> {
        let text = op
            .text()
            .ok_or_else(|| simulate_error(op, "string op without text payload"))?
            .to_owned();
        if self.state.contains(ComState::VARDEF) {
            let enc = self.enc;
            let elem_size = {
                let var = self.current_var_mut(program, op)?;
                if !var.dtype.is_pointer() {
                    return Err(simulate_error(op, "string assigned to a non-pointer variable"));
                }
                var.dtype.elem_size()
            };
            let address = self
                .heap
                .alloc_string(&text, elem_size)
                .map_err(|_| heap_error(op, self.heap.end()))?;
            let var = self.current_var_mut(program, op)?;
            var.value = encode_value(var.dtype, address as u64, enc);
            var.defined = true;
            self.state = ComState::empty();
        } else {
            let address = self
                .heap
                .alloc_string(&text, 1)
                .map_err(|_| heap_error(op, self.heap.end()))?;
            self.stack.push(address as Word);
        }
        Ok(())
    }

    fn buffer(&mut self, program: &mut Program, op: &Op) -> Result<()> {
        if !self.state.contains(ComState::VARDEF) {
            return Err(simulate_error(op, "Buf used in wrong position"));
        }
        let n = self.pop(op)? as usize;
        let enc = self.enc;
        let count = {
            let var = self.current_var_mut(program, op)?;
            if !var.dtype.is_pointer() {
                return Err(simulate_error(op, "buf requires a pointer variable"));
            }
            n * var.dtype.elem_size()
        };
        let address = self
            .heap
            .alloc_buffer(count)
            .map_err(|_| simulate_error(op, "buffer does not fit the heap"))?;
        let var = self.current_var_mut(program, op)?;
        var.value = encode_value(var.dtype, address as u64, enc);
        var.defined = true;
        self.state = ComState::empty();
        Ok(())
    }

    fn var_ref(&mut self, program: &Program, op: &Op) -> Result<()> {
        let vref: &VarRef = op
            .var()
            .ok_or_else(|| simulate_error(op, "variable op without a reference payload"))?;
        let var = program
            .vars
            .get(&vref.name)
            .ok_or_else(|| simulate_error(op, "reference to an unknown variable"))?;

        if vref.ref_level > 0 {
            // data addresses only exist in the compiled target
            return Err(simulate_error(
                op,
                "address-of is only meaningful in compiled output",
            ));
        }

        let mut value = decode_value(&var.value, self.enc);
        let mut level = vref.ref_level;
        while level < 0 {
            let width = if level == -1 { var.dtype.elem_size() } else { 2 };
            value = self
                .heap
                .read(value as usize, width)
                .map_err(|_| heap_error(op, value as usize))?;
            level += 1;
        }

        if !self
            .state
            .intersects(ComState::ARITHMETIC | ComState::CONDITION)
        {
            self.temp1 = vref.name.clone();
        }
        self.stack.push(value);
        self.last_type = Some(var.dtype);
        Ok(())
    }

    fn dos_call(&mut self, op: &Op, out: &mut dyn Write, input: &mut dyn BufRead) -> Result<()> {
        let function = self.pop(op)?;
        match function {
            9 => {
                let address = self.pop(op)? as usize;
                for offset in 0..constants::DOS_STRING_LIMIT {
                    let byte = self
                        .heap
                        .read_byte(address + offset)
                        .map_err(|_| heap_error(op, address + offset))?;
                    if byte == b'$' {
                        break;
                    }
                    out.write_all(&[byte]).map_err(|err| io_error(op, &err))?;
                }
            }
            10 => {
                let address = self.pop(op)? as usize;
                let mut line = String::new();
                input.read_line(&mut line).map_err(|err| io_error(op, &err))?;
                let line = line.trim_end_matches(|c| c == '\n' || c == '\r');
                let bytes = line.as_bytes();
                let bytes = &bytes[..bytes.len().min(constants::DOS_LINE_LIMIT)];
                let capacity = self
                    .heap
                    .read_byte(address)
                    .map_err(|_| heap_error(op, address))? as usize;
                for (offset, byte) in bytes.iter().take(capacity).enumerate() {
                    self.heap
                        .write_byte(address + 2 + offset, *byte)
                        .map_err(|_| heap_error(op, address + 2 + offset))?;
                }
                self.heap
                    .write_byte(address + 1, bytes.len() as u8)
                    .map_err(|_| heap_error(op, address + 1))?;
            }
            _ => {
                return Err(simulate_error(
                    op,
                    "only 9 and 10 dos calls are implemented yet",
                ));
            }
        }
        Ok(())
    }

    fn linux_call(&mut self, op: &Op, out: &mut dyn Write) -> Result<()> {
        let id = self.pop(op)?;
        if id != 1 {
            report(&Diagnostic::warning(
                ErrorKind::SIMULATE,
                "only the write syscall is implemented yet, skipping...",
            ));
            return Ok(());
        }
        let fd = self.pop(op)?;
        let address = self.pop(op)? as usize;
        let length = self.pop(op)? as usize;
        match fd {
            1 => {
                for offset in 0..length {
                    let byte = self
                        .heap
                        .read_byte(address + offset)
                        .map_err(|_| heap_error(op, address + offset))?;
                    out.write_all(&[byte]).map_err(|err| io_error(op, &err))?;
                }
            }
            2 => {
                let stderr = std::io::stderr();
                let mut stderr = stderr.lock();
                for offset in 0..length {
                    let byte = self
                        .heap
                        .read_byte(address + offset)
                        .map_err(|_| heap_error(op, address + offset))?;
                    stderr.write_all(&[byte]).map_err(|err| io_error(op, &err))?;
                }
            }
            _ => report(&Diagnostic::warning(
                ErrorKind::SIMULATE,
                "other file descriptors than `1` and `2` are not supported yet, skipping...",
            )),
        }
        Ok(())
    }
}

impl Default for Simulator {
    fn default() -> Simulator {
        Simulator::new()
    }
}

fn int_payload(op: &Op) -> Result<Word> {
    op.int_value()
        .ok_or_else(|| simulate_error(op, "number op without an integer payload"))
}

fn simulate_error(op: &Op, message: &str) -> Diagnostic {
    Diagnostic::fail(ErrorKind::SIMULATE, message).at(op.file_loc.clone())
}

fn heap_error(op: &Op, address: usize) -> Diagnostic {
    Diagnostic::fail(
        ErrorKind::SIMULATE,
        format!("heap access out of range at address {}", address),
    )
    .at(op.file_loc.clone())
}

fn io_error(op: &Op, err: &std::io::Error) -> Diagnostic {
    Diagnostic::fail(ErrorKind::SIMULATE, format!("program output failed: {}", err))
        .at(op.file_loc.clone())
}

fn write_out(out: &mut dyn Write, op: &Op, text: &str) -> Result<()> {
    out.write_all(text.as_bytes())
        .map_err(|err| io_error(op, &err))
}
