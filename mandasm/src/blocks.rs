//! Pass 1: folds the flat token stream into a tree of condition and code
//! blocks, mapping each remaining token onto an op.

use mandarine::constants::MAX_REF_LEVEL;
use mandarine::diag::{Diagnostic, ErrorKind};
use mandarine::enums::{check_blockkind_count, check_opcode_count};
use mandarine::ir::{Block, Item, Op, Payload, VarRef};
use mandarine::{BlockKind, Opcode, Result};

use crate::lexer::{type_keyword, Token, TokenKind};

fn operand_opcode(text: &str) -> Option<Opcode> {
    match text {
        "while" => Some(Opcode::WHILE),
        "linux" => Some(Opcode::LINUX),
        "copy" => Some(Opcode::COPY),
        "else" => Some(Opcode::ELSE),
        ".mem" => Some(Opcode::MEMWRITE),
        ",mem" => Some(Opcode::MEMREAD),
        "dos" => Some(Opcode::DOS),
        "buf" => Some(Opcode::BUF),
        "..n" => Some(Opcode::PRINT_AND_NL),
        ".n" => Some(Opcode::PRINT_NL),
        ".c" => Some(Opcode::PRINT_CHAR),
        "if" => Some(Opcode::IF),
        "==" => Some(Opcode::EQUAL),
        "<<" => Some(Opcode::SHL),
        ">>" => Some(Opcode::SHR),
        "<=" => Some(Opcode::LE),
        ">=" => Some(Opcode::GE),
        "<" => Some(Opcode::LESS),
        ">" => Some(Opcode::GREATER),
        "." => Some(Opcode::PRINT),
        "=" => Some(Opcode::SET),
        "+" => Some(Opcode::ADD),
        "-" => Some(Opcode::SUB),
        "/" => Some(Opcode::DIV),
        "%" => Some(Opcode::MOD),
        "*" => Some(Opcode::MUL),
        ";" => Some(Opcode::COLON),
        _ => None,
    }
}

/// True when a `*`/`&` at `index` is glued to a following chain ending in
/// a name, which makes it a pointer marker instead of an operator.
fn starts_chain(tokens: &[Token], index: usize) -> bool {
    if !tokens[index].sticky_right {
        return false;
    }
    match tokens.get(index + 1) {
        Some(next) if next.sticky_left => match next.kind {
            TokenKind::NAME => true,
            TokenKind::OPERAND => {
                (next.text == "*" || next.text == "&") && starts_chain(tokens, index + 1)
            }
            _ => false,
        },
        _ => false,
    }
}

/// Folds a glued `*`/`&` run plus its final name into one `VAR` op.
/// Returns the op and the number of tokens consumed.
fn collect_chain(tokens: &[Token], index: usize, flat: usize) -> Result<(Op, usize)> {
    let mut stars = 0i32;
    let mut refs = 0i32;
    let mut i = index;
    while i < tokens.len() {
        let token = &tokens[i];
        match token.kind {
            TokenKind::OPERAND if token.text == "*" => stars += 1,
            TokenKind::OPERAND if token.text == "&" => refs += 1,
            TokenKind::NAME => {
                let level = refs - stars;
                if level.abs() > i32::from(MAX_REF_LEVEL) {
                    return Err(Diagnostic::fail(
                        ErrorKind::PARSE,
                        format!("pointer reference chain on `{}` is too deep", token.text),
                    )
                    .at(tokens[index].loc.clone()));
                }
                let op = Op::with_payload(
                    Opcode::VAR,
                    flat,
                    tokens[index].loc.clone(),
                    Payload::Var(VarRef::new(token.text.clone(), level as i8)),
                );
                return Ok((op, i - index + 1));
            }
            _ => break,
        }
        if !token.sticky_right {
            break;
        }
        i += 1;
    }
    Err(Diagnostic::fail(
        ErrorKind::PARSE,
        "reference operator chain without a variable name",
    )
    .at(tokens[index].loc.clone()))
}

/// Builds the root compile-time block. `(`/`{` open condition/code blocks,
/// the matching closers fold them back into their parent.
pub fn build_blocks(tokens: &[Token]) -> Result<Block> {
    check_opcode_count("build_blocks")?;
    check_blockkind_count("build_blocks")?;

    let mut stack = vec![Block::new(0, BlockKind::COMPILETIME)];
    let mut next_id = 1u32;
    let mut flat = 0usize;
    let mut index = 0usize;

    while index < tokens.len() {
        let token = &tokens[index];
        match token.kind {
            TokenKind::NOTOKEN => {}
            TokenKind::WORD | TokenKind::OPERAND => {
                if (token.text == "*" || token.text == "&") && starts_chain(tokens, index) {
                    let (op, consumed) = collect_chain(tokens, index, flat)?;
                    stack.last_mut().unwrap().items.push(Item::Op(op));
                    flat += 1;
                    index += consumed;
                    continue;
                }
                if token.text == "&" {
                    return Err(Diagnostic::fail(
                        ErrorKind::PARSE,
                        "dangling reference operator `&`",
                    )
                    .at(token.loc.clone()));
                }
                let opcode = operand_opcode(&token.text).ok_or_else(|| {
                    Diagnostic::fail(
                        ErrorKind::SELF,
                        format!("no operation mapped for token `{}`", token.text),
                    )
                })?;
                stack
                    .last_mut()
                    .unwrap()
                    .items
                    .push(Item::Op(Op::new(opcode, flat, token.loc.clone())));
                flat += 1;
            }
            TokenKind::NAME => {
                stack.last_mut().unwrap().items.push(Item::Op(Op::with_payload(
                    Opcode::VAR,
                    flat,
                    token.loc.clone(),
                    Payload::Var(VarRef::new(token.text.clone(), 0)),
                )));
                flat += 1;
            }
            TokenKind::NUM => {
                let value: u64 = token.text.parse().map_err(|_| {
                    Diagnostic::fail(
                        ErrorKind::TOKENIZE,
                        format!("number literal `{}` does not fit 64 bits", token.text),
                    )
                    .at(token.loc.clone())
                })?;
                stack.last_mut().unwrap().items.push(Item::Op(Op::with_payload(
                    Opcode::NUM,
                    flat,
                    token.loc.clone(),
                    Payload::Int(value),
                )));
                flat += 1;
            }
            TokenKind::STRING => {
                stack.last_mut().unwrap().items.push(Item::Op(Op::with_payload(
                    Opcode::STRING,
                    flat,
                    token.loc.clone(),
                    Payload::Text(token.text.clone()),
                )));
                flat += 1;
            }
            TokenKind::TYPE => {
                let dtype = type_keyword(&token.text).ok_or_else(|| {
                    Diagnostic::fail(
                        ErrorKind::SELF,
                        format!("no data type mapped for token `{}`", token.text),
                    )
                })?;
                stack.last_mut().unwrap().items.push(Item::Op(Op::with_payload(
                    Opcode::TYPE,
                    flat,
                    token.loc.clone(),
                    Payload::Type(dtype),
                )));
                flat += 1;
            }
            TokenKind::CODEOPEN => {
                let kind = if token.text == "(" {
                    BlockKind::CONDITION
                } else {
                    BlockKind::CODE
                };
                stack.push(Block::new(next_id, kind));
                next_id += 1;
            }
            TokenKind::CODECLOSE => {
                let expected = if token.text == ")" {
                    BlockKind::CONDITION
                } else {
                    BlockKind::CODE
                };
                if stack.len() == 1 {
                    return Err(Diagnostic::fail(
                        ErrorKind::PARSE,
                        "Found codeBlock closing without an open codeBlock",
                    )
                    .at(token.loc.clone()));
                }
                let top_kind = stack.last().unwrap().kind;
                if top_kind != expected {
                    let wanted = match top_kind {
                        BlockKind::CONDITION => ")",
                        _ => "}",
                    };
                    return Err(Diagnostic::fail(ErrorKind::PARSE, "Found wrong codeBlock closing!")
                        .with_expected(wanted, &token.text)
                        .at(token.loc.clone()));
                }
                let done = stack.pop().unwrap();
                stack.last_mut().unwrap().items.push(Item::Block(done));
            }
            TokenKind::MODE | TokenKind::COUNT => {
                return Err(Diagnostic::fail(
                    ErrorKind::SELF,
                    format!("unexpected token kind {:?} after scanning", token.kind),
                ))
            }
        }
        index += 1;
    }

    if stack.len() != 1 {
        return Err(Diagnostic::fail(
            ErrorKind::PARSE,
            "unclosed codeBlock at the end of the file",
        ));
    }
    Ok(stack.pop().unwrap())
}
