//! Formula rendering.
//!
//! Turns a parsed tree back into text, inserting parentheses only where the
//! tree structure requires them. The `resolve` hook lets the caller override
//! how each free variable is printed; returning `None` falls back to the
//! name the variable was parsed with. The engine uses the hook to substitute
//! the *current* symbol for the variable's resolved cell id, which is how a
//! rename shows up in every dependent formula.

use crate::parser::{ASTNode, ASTNodeType, BinaryOp, VariableRef};

/// Render a tree back to formula text.
pub fn render(node: &ASTNode, resolve: &mut dyn FnMut(&VariableRef) -> Option<String>) -> String {
    let mut out = String::new();
    write_node(node, resolve, &mut out);
    out
}

const ATOM_PRECEDENCE: u8 = u8::MAX;

fn precedence_of(node: &ASTNode) -> u8 {
    match &node.node_type {
        ASTNodeType::Number(_) | ASTNodeType::Variable(_) | ASTNodeType::Function { .. } => {
            ATOM_PRECEDENCE
        }
        ASTNodeType::UnaryOp { .. } => crate::parser::UnaryOp::precedence(),
        ASTNodeType::BinaryOp { op, .. } => op.precedence(),
    }
}

fn write_node(
    node: &ASTNode,
    resolve: &mut dyn FnMut(&VariableRef) -> Option<String>,
    out: &mut String,
) {
    match &node.node_type {
        ASTNodeType::Number(value) => {
            out.push_str(&value.to_string());
        }
        ASTNodeType::Variable(var) => match resolve(var) {
            Some(symbol) => out.push_str(&symbol),
            None => out.push_str(&var.name),
        },
        ASTNodeType::UnaryOp { op, expr } => {
            out.push_str(op.as_str());
            let parens = precedence_of(expr) < crate::parser::UnaryOp::precedence();
            write_child(expr, resolve, out, parens);
        }
        ASTNodeType::BinaryOp { op, left, right } => {
            write_child(left, resolve, out, child_needs_parens(left, *op, false));
            out.push(' ');
            out.push_str(op.as_str());
            out.push(' ');
            write_child(right, resolve, out, child_needs_parens(right, *op, true));
        }
        ASTNodeType::Function { name, args } => {
            out.push_str(name);
            out.push('(');
            for (i, arg) in args.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_node(arg, resolve, out);
            }
            out.push(')');
        }
    }
}

fn child_needs_parens(child: &ASTNode, parent: BinaryOp, is_right: bool) -> bool {
    let child_prec = precedence_of(child);
    let parent_prec = parent.precedence();
    if child_prec != parent_prec {
        return child_prec < parent_prec;
    }
    // Equal precedence: the side the parser would not regroup for free
    // must keep its parentheses (`a - (b - c)`, `(a ^ b) ^ c`).
    is_right != parent.is_right_associative()
}

fn write_child(
    child: &ASTNode,
    resolve: &mut dyn FnMut(&VariableRef) -> Option<String>,
    out: &mut String,
    parens: bool,
) {
    if parens {
        out.push('(');
    }
    write_node(child, resolve, out);
    if parens {
        out.push(')');
    }
}
