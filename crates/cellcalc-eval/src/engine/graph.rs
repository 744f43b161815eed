use cellcalc_common::{CellError, CellErrorKind, CellId};
use once_cell::sync::Lazy;
use regex::Regex;
use rustc_hash::{FxHashMap, FxHashSet};

use super::GraphError;
use super::cell::{Cell, CellProps, EQUATION_KIND};
use super::symbols::SymbolBiMap;

/// Symbols start with a letter and continue with word characters. Kept in
/// step with what the formula tokenizer accepts as an identifier.
static SYMBOL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z][0-9A-Za-z_]*$").expect("symbol pattern is valid")
});

pub(crate) fn is_valid_symbol(symbol: &str) -> bool {
    SYMBOL_RE.is_match(symbol)
}

/// The registry of all cells, and the owner of every structural mutation.
///
/// Cells are stored in an id-keyed arena; provider/dependent edges are
/// `CellId` lists on each cell, kept symmetric by the edge methods here.
/// The provider relation, taken transitively, is always a DAG: an edge
/// that would close a cycle is refused at creation time and recorded as a
/// `CircularReferenceError` on the refusing cell, so evaluation never has
/// to detect cycles.
#[derive(Debug, Default, Clone)]
pub struct Graph {
    pub(crate) cells: FxHashMap<CellId, Cell>,
    pub(crate) registry: SymbolBiMap,
    /// Creation order; keeps `cells()` iteration deterministic.
    pub(crate) order: Vec<CellId>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from an ordered list of cell descriptions.
    ///
    /// Entries are created in the given order. A description may list a
    /// dependent before its provider; the forward reference errors until
    /// the provider appears and then resolves lazily on the next read.
    pub fn from_description(
        descriptions: impl IntoIterator<Item = CellProps>,
    ) -> Result<Self, GraphError> {
        let mut graph = Self::new();
        for props in descriptions {
            graph.create(props)?;
        }
        Ok(graph)
    }

    /* ───────────────────────── Creation / lookup ───────────────────────── */

    /// Create a cell from props, dispatching on the `kind` field.
    ///
    /// Unknown kinds are skipped (`Ok(None)`). A missing symbol is the one
    /// fatal construction fault: a cell cannot exist without identity.
    /// An *invalid* symbol is not fatal: the cell is created with the
    /// attempted text pending and an `InvalidSymbolError` recorded, and can
    /// be repaired later via [`Graph::update_symbol`].
    pub fn create(&mut self, props: CellProps) -> Result<Option<CellId>, GraphError> {
        if props.kind != EQUATION_KIND {
            #[cfg(feature = "tracing")]
            tracing::debug!(kind = %props.kind, "skipping cell of unknown kind");
            return Ok(None);
        }
        let Some(symbol) = props.symbol else {
            return Err(GraphError::MissingSymbol);
        };
        let symbol = symbol.trim().to_string();

        let id;
        let mut cell;
        if is_valid_symbol(&symbol) && !self.symbol_in_use(&symbol, None) {
            // Adopt the id already registered for this symbol, if any: a
            // formula may have forward-referenced it before it existed.
            id = self.registry.get_id(&symbol);
            cell = Cell::new(id);
            cell.symbol = Some(symbol);
        } else {
            id = self.registry.fresh_id();
            cell = Cell::new(id);
            cell.pending_invalid_symbol = Some(symbol.clone());
            cell.errors.add(invalid_symbol_error(&symbol, self.symbol_in_use(&symbol, None)));
        }
        cell.locked = props.locked;

        self.cells.insert(id, cell);
        self.order.push(id);
        #[cfg(feature = "tracing")]
        tracing::debug!(%id, "cell created");

        self.set_formula(id, props.formula.as_deref().unwrap_or(""))?;
        Ok(Some(id))
    }

    /// Create an equation cell. See [`Graph::create`].
    pub fn new_equation(&mut self, props: impl Into<CellProps>) -> Result<CellId, GraphError> {
        match self.create(props.into())? {
            Some(id) => Ok(id),
            // Unreachable for equation props; surface it rather than panic.
            None => Err(GraphError::MissingSymbol),
        }
    }

    /// Look a cell up by its current symbol. Never allocates an id.
    pub fn find(&self, symbol: &str) -> Option<&Cell> {
        self.find_id(symbol).and_then(|id| self.cells.get(&id))
    }

    /// The id behind a symbol, if a live cell holds it.
    pub fn find_id(&self, symbol: &str) -> Option<CellId> {
        self.registry
            .lookup(symbol)
            .filter(|id| self.cells.contains_key(id))
    }

    pub fn find_by_id(&self, id: CellId) -> Option<&Cell> {
        self.cells.get(&id)
    }

    pub fn cell(&self, id: CellId) -> Option<&Cell> {
        self.cells.get(&id)
    }

    /// Mutable access for per-cell flags (locking). Structural mutation
    /// goes through graph methods only.
    pub fn cell_mut(&mut self, id: CellId) -> Option<&mut Cell> {
        self.cells.get_mut(&id)
    }

    pub fn id_exists(&self, id: CellId) -> bool {
        self.cells.contains_key(&id)
    }

    pub fn symbol_exists(&self, symbol: &str) -> bool {
        self.symbol_in_use(symbol, None)
    }

    pub(crate) fn symbol_in_use(&self, symbol: &str, excluding: Option<CellId>) -> bool {
        self.cells
            .values()
            .any(|cell| cell.symbol.as_deref() == Some(symbol) && Some(cell.id) != excluding)
    }

    /// All live cells, in creation order.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.order.iter().filter_map(|id| self.cells.get(id))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub(crate) fn symbol_for(&self, id: CellId) -> String {
        self.registry
            .get_symbol(id)
            .map(str::to_string)
            .unwrap_or_else(|| id.to_string())
    }

    /* ───────────────────────────── Removal ─────────────────────────────── */

    /// Remove a cell by symbol. Returns the removed cell, or `None` if no
    /// live cell holds the symbol.
    pub fn remove(&mut self, symbol: &str) -> Option<Cell> {
        let id = self.find_id(symbol)?;
        self.remove_by_id(id)
    }

    /// Remove a cell, unlinking it from every remaining neighbour so no
    /// dangling edge survives. Dependents are not re-resolved: their next
    /// read finds the provider missing and records a
    /// `ReferenceNotFoundError` lazily. The registry keeps the symbol ↔ id
    /// entry, so re-creating the symbol later resolves to the same id.
    pub fn remove_by_id(&mut self, id: CellId) -> Option<Cell> {
        let cell = self.cells.remove(&id)?;
        self.order.retain(|&c| c != id);

        for &dependent in &cell.dependents {
            if let Some(dep) = self.cells.get_mut(&dependent) {
                dep.providers.retain(|&p| p != id);
            }
        }
        for &provider in &cell.providers {
            if let Some(prov) = self.cells.get_mut(&provider) {
                prov.dependents.retain(|&d| d != id);
            }
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(%id, "cell removed");
        Some(cell)
    }

    /* ───────────────────────────── Renaming ────────────────────────────── */

    /// Rename a cell.
    ///
    /// A symbol failing the grammar or colliding with another cell's symbol
    /// is recorded as an `InvalidSymbolError`; the attempted text stays
    /// visible through `Cell::symbol` until repaired. On success the cell's
    /// id (and with it every dependency edge) is unchanged, and dependents'
    /// formulas re-render under the new name on their next read.
    ///
    /// Returns the cell's id, which changes only when this call assigns the
    /// first valid symbol to a cell created with an invalid one (the cell
    /// then adopts the id registered for that symbol).
    pub fn update_symbol(&mut self, id: CellId, new_symbol: &str) -> Result<CellId, GraphError> {
        {
            let Some(cell) = self.cells.get_mut(&id) else {
                return Err(GraphError::UnknownCell(id));
            };
            cell.pending_invalid_symbol = None;
            cell.errors.clear(CellErrorKind::InvalidSymbol);
        }

        let symbol = new_symbol.trim().to_string();

        let collision = self.symbol_in_use(&symbol, Some(id));
        if !is_valid_symbol(&symbol) || collision {
            let error = invalid_symbol_error(&symbol, collision);
            if let Some(cell) = self.cells.get_mut(&id) {
                cell.pending_invalid_symbol = Some(symbol);
                cell.errors.add(error);
            }
            return Ok(id);
        }

        let old_symbol = self.cells.get(&id).and_then(|c| c.symbol.clone());
        let final_id = match old_symbol {
            Some(old) => {
                if old != symbol {
                    self.registry.swap(&old, &symbol)?;
                }
                id
            }
            None => {
                // First valid symbol for this cell: adopt the id already
                // registered for it so forward references resolve here.
                let adopted = self.registry.get_id(&symbol);
                if adopted != id {
                    self.rekey_cell(id, adopted);
                }
                adopted
            }
        };

        if let Some(cell) = self.cells.get_mut(&final_id) {
            cell.symbol = Some(symbol);
        }
        #[cfg(feature = "tracing")]
        tracing::debug!(%final_id, "symbol updated");
        Ok(final_id)
    }

    /// Move a cell to a new id, patching the reciprocal edge lists and the
    /// iteration order. Only used when a cell adopts its symbol's id.
    fn rekey_cell(&mut self, old_id: CellId, new_id: CellId) {
        let Some(mut cell) = self.cells.remove(&old_id) else {
            return;
        };
        cell.id = new_id;
        for &provider in &cell.providers {
            if let Some(prov) = self.cells.get_mut(&provider) {
                for dependent in prov.dependents.iter_mut() {
                    if *dependent == old_id {
                        *dependent = new_id;
                    }
                }
            }
        }
        for &dependent in &cell.dependents {
            if let Some(dep) = self.cells.get_mut(&dependent) {
                for provider in dep.providers.iter_mut() {
                    if *provider == old_id {
                        *provider = new_id;
                    }
                }
            }
        }
        for entry in self.order.iter_mut() {
            if *entry == old_id {
                *entry = new_id;
            }
        }
        self.cells.insert(new_id, cell);
    }

    /* ──────────────────── Dependency edges & cycles ────────────────────── */

    /// True iff `other` appears in the transitive closure of `cell`'s
    /// providers.
    pub fn depends_on(&self, cell: CellId, other: CellId) -> bool {
        self.reaches(cell, other, |c| &c.providers)
    }

    /// True iff `other` appears in the transitive closure of `cell`'s
    /// dependents.
    pub fn provides_for(&self, cell: CellId, other: CellId) -> bool {
        self.reaches(cell, other, |c| &c.dependents)
    }

    fn reaches(&self, start: CellId, target: CellId, edges: fn(&Cell) -> &Vec<CellId>) -> bool {
        let mut seen = FxHashSet::default();
        let mut stack: Vec<CellId> = match self.cells.get(&start) {
            Some(cell) => edges(cell).clone(),
            None => return false,
        };
        while let Some(id) = stack.pop() {
            if id == target {
                return true;
            }
            if !seen.insert(id) {
                continue;
            }
            if let Some(cell) = self.cells.get(&id) {
                stack.extend(edges(cell).iter().copied());
            }
        }
        false
    }

    /// All providers, direct edges before their own transitive providers,
    /// duplicates removed.
    pub fn providers(&self, cell: CellId) -> Vec<CellId> {
        let mut out = Vec::new();
        let mut seen = FxHashSet::default();
        self.collect_transitive(cell, |c| &c.providers, &mut out, &mut seen);
        out
    }

    /// All dependents, direct edges before their own transitive dependents,
    /// duplicates removed.
    pub fn dependents(&self, cell: CellId) -> Vec<CellId> {
        let mut out = Vec::new();
        let mut seen = FxHashSet::default();
        self.collect_transitive(cell, |c| &c.dependents, &mut out, &mut seen);
        out
    }

    fn collect_transitive(
        &self,
        cell: CellId,
        edges: fn(&Cell) -> &Vec<CellId>,
        out: &mut Vec<CellId>,
        seen: &mut FxHashSet<CellId>,
    ) {
        let Some(cell) = self.cells.get(&cell) else {
            return;
        };
        for &next in edges(cell) {
            if seen.insert(next) {
                out.push(next);
                self.collect_transitive(next, edges, out, seen);
            }
        }
    }

    /// Link `dependent` to read from `provider`: both edge directions in
    /// one call. Each direction runs its own cycle check, so a cycle is
    /// refused from whichever side sees it; callers must not assume the
    /// edge was added; re-check `depends_on` or inspect the cell's errors.
    pub fn add_dependency(&mut self, dependent: CellId, provider: CellId) {
        self.add_provider(dependent, provider);
        self.add_dependent(provider, dependent);
    }

    /// Insert `provider` into `cell`'s provider set, refusing (and
    /// recording a `CircularReferenceError` on `cell`) if the edge would
    /// make `cell` reachable from itself.
    pub fn add_provider(&mut self, cell: CellId, provider: CellId) {
        if cell == provider || self.provides_for(cell, provider) {
            self.record_cycle_refusal(cell, cell, provider);
            return;
        }
        if let Some(c) = self.cells.get_mut(&cell) {
            if !c.providers.contains(&provider) {
                c.providers.push(provider);
            }
        }
    }

    /// Symmetric to [`Graph::add_provider`]; the error lands on `cell`
    /// (the provider side of the link).
    pub fn add_dependent(&mut self, cell: CellId, dependent: CellId) {
        if cell == dependent || self.depends_on(cell, dependent) {
            self.record_cycle_refusal(cell, dependent, cell);
            return;
        }
        if let Some(c) = self.cells.get_mut(&cell) {
            if !c.dependents.contains(&dependent) {
                c.dependents.push(dependent);
            }
        }
    }

    /// Record a refused edge on `on`: `dependent`'s formula wanted to read
    /// from `provider`, but `provider` already depends on `dependent`.
    fn record_cycle_refusal(&mut self, on: CellId, dependent: CellId, provider: CellId) {
        let message = if dependent == provider {
            format!("{}'s formula references itself", self.symbol_for(dependent))
        } else {
            let dependent = self.symbol_for(dependent);
            let provider = self.symbol_for(provider);
            format!(
                "{dependent}'s formula references {provider}, but {provider} depends on {dependent}"
            )
        };
        #[cfg(feature = "tracing")]
        tracing::debug!(%on, reason = %message, "refused edge: would close a cycle");
        if let Some(cell) = self.cells.get_mut(&on) {
            cell.errors
                .add(CellError::new(CellErrorKind::CircularReference).with_message(message));
        }
    }

    /// Remove the provider link and its reciprocal dependent link.
    pub fn remove_dependency(&mut self, dependent: CellId, provider: CellId) {
        if let Some(cell) = self.cells.get_mut(&dependent) {
            cell.providers.retain(|&p| p != provider);
        }
        if let Some(cell) = self.cells.get_mut(&provider) {
            cell.dependents.retain(|&d| d != dependent);
        }
    }

    /// Drop every provider link of `cell`, one at a time.
    pub fn clear_dependencies(&mut self, cell: CellId) {
        let providers = match self.cells.get(&cell) {
            Some(c) => c.providers.clone(),
            None => return,
        };
        for provider in providers {
            self.remove_dependency(cell, provider);
        }
    }
}

fn invalid_symbol_error(symbol: &str, collision: bool) -> CellError {
    let message = if collision {
        format!("{symbol} already exists. Can not have two variables with the same symbol.")
    } else {
        format!(
            "[{symbol}] is an invalid symbol. Symbols must start with a letter and may only contain word characters"
        )
    };
    CellError::new(CellErrorKind::InvalidSymbol).with_message(message)
}
