use std::fmt;

/// Stable identity of a cell.
///
/// A `CellId` is allocated once per symbol and never changes afterwards, even
/// when the symbol itself is renamed. Dependency edges and resolved formula
/// references are keyed by `CellId`, which is what lets a rename propagate
/// into dependents' rendered formulas without touching the graph structure.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CellId(u64);

impl CellId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
