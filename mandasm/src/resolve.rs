//! Pass 2: binds `TYPE NAME` adjacency into variable declarations and
//! checks that every reference names a declared variable. Nested blocks
//! receive a copy of the enclosing table before recursion; they see outer
//! declarations but cannot shadow them.

use std::collections::HashMap;

use mandarine::diag::{Diagnostic, ErrorKind};
use mandarine::enums::{check_blockkind_count, check_opcode_count};
use mandarine::ir::{Block, Item, Var};
use mandarine::{Opcode, Result};

/// Resolves the whole tree and returns the merged variable table for the
/// flat program. Declarations from every block land in one table; a name
/// declared twice anywhere is fatal, which also covers sibling blocks
/// colliding on a name.
pub fn resolve_names(root: &mut Block) -> Result<HashMap<String, Var>> {
    check_opcode_count("resolve_names")?;
    check_blockkind_count("resolve_names")?;

    let mut merged = HashMap::new();
    resolve_block(root, &mut merged)?;
    Ok(merged)
}

fn resolve_block(block: &mut Block, merged: &mut HashMap<String, Var>) -> Result<()> {
    let Block { items, vars, .. } = block;
    let mut index = 0;

    while index < items.len() {
        let type_decl = match &items[index] {
            Item::Op(op) if op.opcode == Opcode::TYPE => {
                Some((op.dtype(), op.file_loc.clone()))
            }
            _ => None,
        };

        if let Some((dtype, loc)) = type_decl {
            let dtype = dtype.ok_or_else(|| {
                Diagnostic::fail(ErrorKind::SELF, "type op without a data type payload")
            })?;
            let name = match items.get(index + 1) {
                Some(Item::Op(next)) if next.opcode == Opcode::VAR => match next.var() {
                    Some(vref) if vref.ref_level == 0 => vref.name.clone(),
                    Some(vref) => {
                        return Err(Diagnostic::fail(
                            ErrorKind::PARSE,
                            format!("declared name `{}` cannot carry reference operators", vref.name),
                        )
                        .at(loc))
                    }
                    None => {
                        return Err(Diagnostic::fail(
                            ErrorKind::SELF,
                            "variable op without a reference payload",
                        ))
                    }
                },
                Some(_) => {
                    return Err(Diagnostic::fail(ErrorKind::PARSE, "no var token after type").at(loc))
                }
                None => {
                    return Err(Diagnostic::fail(ErrorKind::PARSE, "type at the end of file").at(loc))
                }
            };
            if merged.contains_key(&name) {
                return Err(
                    Diagnostic::fail(ErrorKind::PARSE, format!("var `{}` already stated", name))
                        .at(loc),
                );
            }
            vars.insert(name.clone(), Var::new(dtype, name.clone()));
            merged.insert(name.clone(), Var::new(dtype, name));
            items.remove(index);
            // the VAR op now at `index` is the declaration site; let the
            // next iteration see it as an ordinary reference
            continue;
        }

        match &mut items[index] {
            Item::Op(op) => {
                if op.opcode == Opcode::VAR {
                    if let Some(vref) = op.var() {
                        if !vars.contains_key(&vref.name) {
                            return Err(Diagnostic::fail(
                                ErrorKind::PARSE,
                                format!("Variable `{}` stated without assigment!", vref.name),
                            )
                            .at(op.file_loc.clone()));
                        }
                    }
                }
            }
            Item::Block(child) => {
                child.vars = vars.clone();
                resolve_block(child, merged)?;
            }
        }
        index += 1;
    }
    Ok(())
}
