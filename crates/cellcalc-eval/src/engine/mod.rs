//! Reactive cell graph engine.
//!
//! Tracks which cells reference which, refuses cycles at edge-creation
//! time, and recomputes values lazily on read.

pub mod cell;
pub mod errors;
pub mod eval;
pub mod graph;
pub mod symbols;

#[cfg(test)]
mod tests;

pub use cell::{Cell, CellProps, CellState, EQUATION_KIND, EquationProps};
pub use errors::ErrorSink;
pub use graph::Graph;
pub use symbols::SymbolBiMap;

use cellcalc_common::CellId;
use thiserror::Error;

/// Faults returned by graph operations.
///
/// These are the API-level failures: a handle to a cell that does not
/// exist, or construction input a graph cannot accept. Everything a user
/// can cause with formula or symbol *content* is recorded on the cell's
/// error sink instead and never surfaces here.
#[derive(Debug, Error)]
pub enum GraphError {
    /// A cell cannot exist without identity.
    #[error("a cell cannot be created without a symbol")]
    MissingSymbol,
    #[error("unknown cell {0}")]
    UnknownCell(CellId),
    #[error("no id registered for symbol '{0}'")]
    UnknownSymbol(String),
}
