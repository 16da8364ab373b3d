//! Pass 3: flattens `if`/`else`/`while` constructs into comparisons,
//! conditional jumps and labels, producing the flat program both backends
//! consume.

use std::collections::HashMap;

use matches::debug_assert_matches;
use mandarine::diag::{Diagnostic, ErrorKind, Loc};
use mandarine::enums::{check_blockkind_count, check_opcode_count};
use mandarine::ir::{Block, Item, Op, Payload, Program, Var};
use mandarine::{BlockKind, Mode, Opcode, Result};

/// Allocates label names. The integer is a plain counter: the names only
/// have to stay in sync between a label and the jumps that target it, not
/// mirror any final op position.
struct Labels {
    next: usize,
}

impl Labels {
    fn fresh(&mut self) -> String {
        let name = format!("label{}", self.next);
        self.next += 1;
        name
    }
}

fn label_item(name: &str) -> Item {
    Item::Op(Op::with_payload(
        Opcode::LABEL,
        0,
        Loc::default(),
        Payload::Label(name.to_owned()),
    ))
}

fn jump_item(name: &str) -> Item {
    Item::Op(Op::with_payload(
        Opcode::JUMP,
        0,
        Loc::default(),
        Payload::Label(name.to_owned()),
    ))
}

/// Lowers every control construct in `root` and flattens the result.
pub fn lower(mut root: Block, vars: HashMap<String, Var>, mode: Mode) -> Result<Program> {
    check_opcode_count("lower")?;
    check_blockkind_count("lower")?;
    debug_assert_matches!(root.kind, BlockKind::COMPILETIME);

    let mut labels = Labels { next: 0 };
    let mut index = 0;
    while index < root.items.len() {
        let opcode = match &root.items[index] {
            Item::Op(op) => Some(op.opcode),
            Item::Block(_) => None,
        };
        match opcode {
            Some(Opcode::IF) => lower_if(&mut root, index, &mut labels)?,
            Some(Opcode::WHILE) => {
                lower_while(&mut root, index, &mut labels)?;
                // the loop-head label was inserted in front of the WHILE op
                index += 1;
            }
            _ => {}
        }
        index += 1;
    }
    flatten(root, vars, mode)
}

fn construct_loc(root: &Block, index: usize) -> Loc {
    match &root.items[index] {
        Item::Op(op) => op.file_loc.clone(),
        Item::Block(_) => Loc::default(),
    }
}

fn take_block(root: &mut Block, index: usize) -> Block {
    match root.items.remove(index) {
        Item::Block(block) => block,
        Item::Op(_) => unreachable!(),
    }
}

fn expect_block(root: &Block, index: usize, kind: BlockKind) -> bool {
    matches!(root.items.get(index), Some(Item::Block(block)) if block.kind == kind)
}

fn lower_if(root: &mut Block, index: usize, labels: &mut Labels) -> Result<()> {
    let loc = construct_loc(root, index);
    if index + 2 >= root.items.len() {
        return Err(Diagnostic::fail(ErrorKind::PARSE, "If keyword at the end of file").at(loc));
    }
    if !expect_block(root, index + 1, BlockKind::CONDITION) {
        return Err(Diagnostic::fail(
            ErrorKind::PARSE,
            "codeBlock not a type of condition after If keyword",
        )
        .at(loc));
    }
    if !expect_block(root, index + 2, BlockKind::CODE) {
        return Err(Diagnostic::fail(
            ErrorKind::PARSE,
            "codeBlock not a type of code after If keyword",
        )
        .at(loc));
    }
    let is_else = matches!(
        root.items.get(index + 3),
        Some(Item::Op(op)) if op.opcode == Opcode::ELSE
    );
    if is_else && !expect_block(root, index + 4, BlockKind::CODE) {
        return Err(Diagnostic::fail(
            ErrorKind::PARSE,
            "no codeBlock after else keyword",
        )
        .at(loc));
    }

    let else_block = if is_else {
        let block = take_block(root, index + 4);
        root.items.remove(index + 3); // the ELSE op is consumed here
        Some(block)
    } else {
        None
    };
    let code_block = take_block(root, index + 2);
    let cond_block = take_block(root, index + 1);

    let mut ops = condition_ops(cond_block)?;
    let end_then = labels.fresh();
    patch_conjump(&mut ops, &end_then)?;

    let mut body = code_block.items;
    if let Some(else_block) = else_block {
        let end_else = labels.fresh();
        body.push(jump_item(&end_else));
        body.push(label_item(&end_then));
        body.extend(else_block.items);
        body.push(label_item(&end_else));
    } else {
        body.push(label_item(&end_then));
    }

    let mut spliced: Vec<Item> = ops.into_iter().map(Item::Op).collect();
    spliced.extend(body);
    root.items.splice(index + 1..index + 1, spliced);
    Ok(())
}

fn lower_while(root: &mut Block, index: usize, labels: &mut Labels) -> Result<()> {
    let loc = construct_loc(root, index);
    if index + 2 >= root.items.len() {
        return Err(Diagnostic::fail(ErrorKind::PARSE, "While keyword at the end of file").at(loc));
    }
    if !expect_block(root, index + 1, BlockKind::CONDITION) {
        return Err(Diagnostic::fail(
            ErrorKind::PARSE,
            "Non Condition codeBlock after While keyword",
        )
        .at(loc));
    }
    if !expect_block(root, index + 2, BlockKind::CODE) {
        return Err(Diagnostic::fail(
            ErrorKind::PARSE,
            "codeBlock not a type of code after While keyword",
        )
        .at(loc));
    }

    let code_block = take_block(root, index + 2);
    let cond_block = take_block(root, index + 1);

    let top = labels.fresh();
    let bottom = labels.fresh();

    let mut ops = condition_ops(cond_block)?;
    patch_conjump(&mut ops, &bottom)?;

    let mut body = code_block.items;
    body.push(jump_item(&top));
    body.push(label_item(&bottom));

    let mut spliced: Vec<Item> = ops.into_iter().map(Item::Op).collect();
    spliced.extend(body);
    root.items.splice(index + 1..index + 1, spliced);
    // the back jump must re-enter condition state, so the loop head label
    // goes in front of the WHILE op itself
    root.items.insert(index, label_item(&top));
    Ok(())
}

fn patch_conjump(ops: &mut [Op], target: &str) -> Result<()> {
    match ops.last_mut() {
        Some(op) if op.opcode == Opcode::CONJUMP => {
            op.payload = Payload::Label(target.to_owned());
            Ok(())
        }
        _ => Err(Diagnostic::fail(
            ErrorKind::SELF,
            "condition lowering did not end in a conditional jump",
        )),
    }
}

/// Lowers a condition block into `left ++ [compare] ++ right ++ [CONJUMP]`.
/// Each side must hold one balanced postfix expression and exactly one
/// comparison op splits them.
fn condition_ops(block: Block) -> Result<Vec<Op>> {
    check_opcode_count("condition_ops")?;
    debug_assert_matches!(block.kind, BlockKind::CONDITION);

    let mut left: Vec<Op> = Vec::new();
    let mut right: Vec<Op> = Vec::new();
    let mut comparison: Option<Op> = None;

    for item in block.items {
        let op = match item {
            Item::Op(op) => op,
            Item::Block(_) => {
                return Err(Diagnostic::fail(
                    ErrorKind::PARSE,
                    "codeBlock is disallowed in condition codeBlock",
                ))
            }
        };
        let in_left = comparison.is_none();
        match op.opcode {
            Opcode::VAR | Opcode::NUM | Opcode::MEMREAD => {
                if in_left {
                    left.push(op);
                } else {
                    right.push(op);
                }
            }
            o if o.is_arithmetic() => {
                if in_left {
                    left.push(op);
                } else {
                    right.push(op);
                }
            }
            o if o.is_comparison() => {
                if left.is_empty() {
                    return Err(Diagnostic::fail(
                        ErrorKind::PARSE,
                        "Empty left-side of condition!",
                    )
                    .at(op.file_loc));
                }
                if comparison.is_some() {
                    return Err(Diagnostic::fail(
                        ErrorKind::PARSE,
                        "multiple conditions in condition codeBlock are not supported yet",
                    )
                    .at(op.file_loc));
                }
                comparison = Some(op);
            }
            _ => {
                return Err(Diagnostic::fail(
                    ErrorKind::PARSE,
                    format!("token `{:?}` is disallowed in condition codeBlock", op.opcode),
                )
                .at(op.file_loc))
            }
        }
    }

    let comparison =
        comparison.ok_or_else(|| Diagnostic::fail(ErrorKind::PARSE, "No condition token found"))?;
    check_balance(&left)?;
    check_balance(&right)?;

    let conjump_loc = right
        .last()
        .map(|op| op.file_loc.clone())
        .unwrap_or_default();
    let mut ops = left;
    ops.push(comparison);
    ops.extend(right);
    ops.push(Op::new(Opcode::CONJUMP, 0, conjump_loc));
    Ok(ops)
}

/// One balanced postfix expression: value ops outnumber arithmetic ops by
/// exactly one. `,mem` replaces an address with a value and counts as
/// neither.
fn check_balance(ops: &[Op]) -> Result<()> {
    let values = ops
        .iter()
        .filter(|op| matches!(op.opcode, Opcode::NUM | Opcode::VAR))
        .count();
    let arithmetic = ops.iter().filter(|op| op.opcode.is_arithmetic()).count();
    if values != arithmetic + 1 {
        return Err(Diagnostic::fail(
            ErrorKind::PARSE,
            "Wrong layout of arithmetics in condition block",
        ));
    }
    Ok(())
}

/// Final flattening: after lowering no block may remain, every op gets its
/// position as flat index, and every jump target must exist.
fn flatten(root: Block, vars: HashMap<String, Var>, mode: Mode) -> Result<Program> {
    let mut ops = Vec::with_capacity(root.items.len());
    for item in root.items {
        match item {
            Item::Op(op) if op.opcode == Opcode::ELSE => {
                return Err(
                    Diagnostic::fail(ErrorKind::PARSE, "else without a preceding if")
                        .at(op.file_loc),
                )
            }
            Item::Op(mut op) => {
                op.loc = ops.len();
                ops.push(op);
            }
            Item::Block(block) => {
                return Err(Diagnostic::fail(
                    ErrorKind::PARSE,
                    format!(
                        "codeBlock {} without a preceding `if`, `else` or `while`",
                        block.id
                    ),
                ))
            }
        }
    }

    let program = Program::from_ops(ops, vars, mode);
    for op in &program.ops {
        if matches!(op.opcode, Opcode::CONJUMP | Opcode::JUMP) {
            let target = op.label().ok_or_else(|| {
                Diagnostic::fail(ErrorKind::SELF, "jump op without a label payload")
            })?;
            if !program.labels.contains_key(target) {
                return Err(Diagnostic::fail(ErrorKind::PARSE, "jump without a matching label")
                    .with_expected(target, "no label"));
            }
        }
    }
    Ok(program)
}
