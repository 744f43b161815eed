//! Numeric evaluation of parsed trees.
//!
//! Evaluation is pure: the caller supplies a `name → f64` scope covering
//! every free variable it wants bound. A variable missing from the scope is
//! an error, not an implicit zero; the engine relies on this to turn an
//! unresolved reference into a not-a-number cell value.

use std::collections::HashMap;
use std::error::Error;
use std::fmt::{self, Display};

use once_cell::sync::Lazy;

use crate::parser::{ASTNode, ASTNodeType, BinaryOp, UnaryOp};

/// Error produced when a tree cannot be evaluated against a scope.
#[derive(Debug, Clone, PartialEq)]
pub enum EvalError {
    UnknownVariable(String),
    UnknownFunction(String),
    WrongArity { name: String, given: usize },
}

impl Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownVariable(name) => write!(f, "undefined variable '{name}'"),
            Self::UnknownFunction(name) => write!(f, "unknown function '{name}'"),
            Self::WrongArity { name, given } => {
                write!(f, "wrong number of arguments to '{name}' ({given} given)")
            }
        }
    }
}

impl Error for EvalError {}

struct FunctionDef {
    min_args: usize,
    max_args: Option<usize>,
    apply: fn(&[f64]) -> f64,
}

impl FunctionDef {
    const fn unary(apply: fn(&[f64]) -> f64) -> Self {
        Self {
            min_args: 1,
            max_args: Some(1),
            apply,
        }
    }
}

static FUNCTIONS: Lazy<HashMap<&'static str, FunctionDef>> = Lazy::new(|| {
    let mut map: HashMap<&'static str, FunctionDef> = HashMap::new();
    map.insert("sqrt", FunctionDef::unary(|a| a[0].sqrt()));
    map.insert("sin", FunctionDef::unary(|a| a[0].sin()));
    map.insert("cos", FunctionDef::unary(|a| a[0].cos()));
    map.insert("tan", FunctionDef::unary(|a| a[0].tan()));
    map.insert("abs", FunctionDef::unary(|a| a[0].abs()));
    map.insert("ln", FunctionDef::unary(|a| a[0].ln()));
    map.insert("log", FunctionDef::unary(|a| a[0].log10()));
    map.insert("exp", FunctionDef::unary(|a| a[0].exp()));
    map.insert("floor", FunctionDef::unary(|a| a[0].floor()));
    map.insert("ceil", FunctionDef::unary(|a| a[0].ceil()));
    map.insert("round", FunctionDef::unary(|a| a[0].round()));
    map.insert(
        "pow",
        FunctionDef {
            min_args: 2,
            max_args: Some(2),
            apply: |a| a[0].powf(a[1]),
        },
    );
    map.insert(
        "min",
        FunctionDef {
            min_args: 1,
            max_args: None,
            apply: |a| a.iter().copied().fold(f64::INFINITY, f64::min),
        },
    );
    map.insert(
        "max",
        FunctionDef {
            min_args: 1,
            max_args: None,
            apply: |a| a.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        },
    );
    map
});

/// Evaluate a tree against a scope.
pub fn evaluate(node: &ASTNode, scope: &HashMap<String, f64>) -> Result<f64, EvalError> {
    match &node.node_type {
        ASTNodeType::Number(value) => Ok(*value),
        ASTNodeType::Variable(var) => scope
            .get(&var.name)
            .copied()
            .ok_or_else(|| EvalError::UnknownVariable(var.name.clone())),
        ASTNodeType::UnaryOp { op, expr } => {
            let value = evaluate(expr, scope)?;
            Ok(match op {
                UnaryOp::Neg => -value,
                UnaryOp::Pos => value,
            })
        }
        ASTNodeType::BinaryOp { op, left, right } => {
            let l = evaluate(left, scope)?;
            let r = evaluate(right, scope)?;
            Ok(match op {
                BinaryOp::Add => l + r,
                BinaryOp::Sub => l - r,
                BinaryOp::Mul => l * r,
                BinaryOp::Div => l / r,
                BinaryOp::Mod => l % r,
                BinaryOp::Pow => l.powf(r),
            })
        }
        ASTNodeType::Function { name, args } => {
            let def = FUNCTIONS
                .get(name.as_str())
                .ok_or_else(|| EvalError::UnknownFunction(name.clone()))?;
            if args.len() < def.min_args || def.max_args.is_some_and(|max| args.len() > max) {
                return Err(EvalError::WrongArity {
                    name: name.clone(),
                    given: args.len(),
                });
            }
            let values = args
                .iter()
                .map(|arg| evaluate(arg, scope))
                .collect::<Result<Vec<f64>, EvalError>>()?;
            Ok((def.apply)(&values))
        }
    }
}
