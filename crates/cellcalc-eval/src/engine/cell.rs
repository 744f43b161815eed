use cellcalc_common::{CellError, CellId};
use cellcalc_parse::ASTNode;

use super::errors::ErrorSink;

/// The one cell kind this engine defines.
pub const EQUATION_KIND: &str = "Equation";

/// Formula lifecycle of a cell.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CellState {
    /// No formula set.
    Empty,
    /// The last `set_formula` parsed; a tree is held.
    Valid,
    /// The last `set_formula` failed to parse; the raw text is held so the
    /// user sees exactly what they typed while it errors.
    InvalidSyntax,
}

/// A named, lockable node in the graph holding a formula.
///
/// All structural mutation (formula, symbol, edges) goes through
/// [`super::Graph`]; the only mutators exposed here are the lock flag.
#[derive(Debug, Clone)]
pub struct Cell {
    pub(crate) id: CellId,
    /// The current valid symbol; `None` only while an invalid symbol is
    /// pending from construction.
    pub(crate) symbol: Option<String>,
    pub(crate) pending_invalid_symbol: Option<String>,
    pub(crate) locked: bool,
    /// Direct upstream edges, in the order resolution discovered them.
    pub(crate) providers: Vec<CellId>,
    /// Direct downstream edges.
    pub(crate) dependents: Vec<CellId>,
    pub(crate) ast: Option<ASTNode>,
    pub(crate) pending_invalid_formula: Option<String>,
    pub(crate) errors: ErrorSink,
}

impl Cell {
    pub(crate) fn new(id: CellId) -> Self {
        Self {
            id,
            symbol: None,
            pending_invalid_symbol: None,
            locked: false,
            providers: Vec::new(),
            dependents: Vec::new(),
            ast: None,
            pending_invalid_formula: None,
            errors: ErrorSink::default(),
        }
    }

    pub fn id(&self) -> CellId {
        self.id
    }

    /// The symbol as the user sees it: a pending invalid rename attempt
    /// stays visible while its `InvalidSymbolError` is outstanding.
    pub fn symbol(&self) -> Option<&str> {
        self.pending_invalid_symbol
            .as_deref()
            .or(self.symbol.as_deref())
    }

    pub fn state(&self) -> CellState {
        if self.pending_invalid_formula.is_some() {
            CellState::InvalidSyntax
        } else if self.ast.is_none() {
            CellState::Empty
        } else {
            CellState::Valid
        }
    }

    pub fn has_error(&self) -> bool {
        self.errors.has_error()
    }

    pub fn errors(&self) -> &[CellError] {
        self.errors.errors()
    }

    /// Direct providers (one hop). Transitive closure lives on the graph.
    pub fn direct_providers(&self) -> &[CellId] {
        &self.providers
    }

    /// Direct dependents (one hop).
    pub fn direct_dependents(&self) -> &[CellId] {
        &self.dependents
    }

    pub fn locked(&self) -> bool {
        self.locked
    }

    pub fn lock(&mut self) {
        self.locked = true;
    }

    pub fn unlock(&mut self) {
        self.locked = false;
    }

    pub fn toggle_locked(&mut self) {
        self.locked = !self.locked;
    }
}

fn equation_kind() -> String {
    EQUATION_KIND.to_string()
}

/// Serialized shape of one cell in a bulk description.
///
/// `kind` selects the concrete cell type; entries with an unknown kind are
/// skipped by [`super::Graph::create`], not fatal to a whole load.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CellProps {
    #[cfg_attr(
        feature = "serde",
        serde(rename = "type", default = "equation_kind")
    )]
    pub kind: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub symbol: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub formula: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub locked: bool,
}

impl Default for CellProps {
    fn default() -> Self {
        Self {
            kind: equation_kind(),
            symbol: None,
            formula: None,
            locked: false,
        }
    }
}

/// Convenience props for creating an equation cell directly.
#[derive(Debug, Clone)]
pub struct EquationProps {
    pub symbol: String,
    pub formula: Option<String>,
    pub locked: bool,
}

impl EquationProps {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            formula: None,
            locked: false,
        }
    }

    pub fn with_formula(mut self, formula: impl Into<String>) -> Self {
        self.formula = Some(formula.into());
        self
    }
}

impl From<EquationProps> for CellProps {
    fn from(props: EquationProps) -> Self {
        Self {
            kind: equation_kind(),
            symbol: Some(props.symbol),
            formula: props.formula,
            locked: props.locked,
        }
    }
}
