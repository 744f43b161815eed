pub mod eval;
pub mod parser;
pub mod pretty;
pub mod tokenizer;

pub use eval::{EvalError, evaluate};
pub use parser::{ASTNode, ASTNodeType, BinaryOp, ParserError, UnaryOp, VariableRef, parse};
pub use pretty::render;
pub use tokenizer::{Token, TokenType, Tokenizer, TokenizerError};

// Re-export common types
pub use cellcalc_common::{CellError, CellErrorKind, CellId};
