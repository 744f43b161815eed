pub mod engine;

pub use engine::{
    Cell, CellProps, CellState, EQUATION_KIND, EquationProps, ErrorSink, Graph, GraphError,
    SymbolBiMap,
};

// Re-export common types
pub use cellcalc_common::{CellError, CellErrorKind, CellId};
