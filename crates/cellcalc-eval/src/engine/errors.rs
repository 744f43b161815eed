use cellcalc_common::{CellError, CellErrorKind};

/// Per-cell multiset of error conditions, in insertion order.
///
/// Several entries of the same kind may coexist (a formula can name two
/// missing references at once); `clear` removes only one kind so the engine
/// can refresh reference errors before a recomputation without losing a
/// syntax or circular-reference error recorded earlier.
#[derive(Debug, Clone, Default)]
pub struct ErrorSink {
    entries: Vec<CellError>,
}

impl ErrorSink {
    pub fn add(&mut self, error: CellError) {
        self.entries.push(error);
    }

    pub fn clear(&mut self, kind: CellErrorKind) {
        self.entries.retain(|e| e.kind != kind);
    }

    pub fn clear_all(&mut self) {
        self.entries.clear();
    }

    pub fn has_error(&self) -> bool {
        !self.entries.is_empty()
    }

    pub fn errors(&self) -> &[CellError] {
        &self.entries
    }

    pub fn first(&self) -> Option<&CellError> {
        self.entries.first()
    }

    pub fn first_display_token(&self) -> Option<&'static str> {
        self.entries.first().map(|e| e.display_token())
    }
}
