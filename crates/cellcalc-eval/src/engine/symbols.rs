use cellcalc_common::CellId;
use rustc_hash::FxHashMap;

use super::GraphError;

/// Bidirectional symbol ↔ id map with id allocation.
///
/// `get_id` is idempotent: the first call for an unseen symbol allocates a
/// fresh id and records it, later calls return the same id. Entries are
/// never evicted: a deleted cell's id stays bound to its symbol so a later
/// formula naming the same symbol resolves to a consistent identity.
/// `swap` re-keys a symbol while keeping the id, which is what makes
/// dependency edges survive renames.
#[derive(Debug, Default, Clone)]
pub struct SymbolBiMap {
    symbol_to_id: FxHashMap<String, CellId>,
    id_to_symbol: FxHashMap<CellId, String>,
    next_id: u64,
}

impl SymbolBiMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an id with no symbol attached.
    pub(crate) fn fresh_id(&mut self) -> CellId {
        let id = CellId::new(self.next_id);
        self.next_id += 1;
        id
    }

    /// The id registered for `symbol`, allocating and recording a fresh one
    /// on first sight.
    pub fn get_id(&mut self, symbol: &str) -> CellId {
        if let Some(&id) = self.symbol_to_id.get(symbol) {
            return id;
        }
        let id = self.fresh_id();
        self.set(symbol, id);
        id
    }

    /// Read-only probe; `None` for symbols never registered.
    pub fn lookup(&self, symbol: &str) -> Option<CellId> {
        self.symbol_to_id.get(symbol).copied()
    }

    pub fn get_symbol(&self, id: CellId) -> Option<&str> {
        self.id_to_symbol.get(&id).map(String::as_str)
    }

    /// Insert or overwrite both directions, dropping any mapping either
    /// side previously had so the map stays a bijection.
    pub fn set(&mut self, symbol: &str, id: CellId) {
        if let Some(old_id) = self.symbol_to_id.get(symbol).copied() {
            if old_id != id {
                self.id_to_symbol.remove(&old_id);
            }
        }
        if let Some(old_symbol) = self.id_to_symbol.get(&id).cloned() {
            if old_symbol != symbol {
                self.symbol_to_id.remove(&old_symbol);
            }
        }
        self.symbol_to_id.insert(symbol.to_string(), id);
        self.id_to_symbol.insert(id, symbol.to_string());
    }

    /// Re-key `old_symbol` to `new_symbol`, keeping the id unchanged.
    pub fn swap(&mut self, old_symbol: &str, new_symbol: &str) -> Result<(), GraphError> {
        let Some(id) = self.symbol_to_id.get(old_symbol).copied() else {
            return Err(GraphError::UnknownSymbol(old_symbol.to_string()));
        };
        self.symbol_to_id.remove(old_symbol);
        self.id_to_symbol.remove(&id);
        self.set(new_symbol, id);
        Ok(())
    }
}
