//! Formula state and lazy evaluation.
//!
//! `set_formula` drives the Empty / Valid / InvalidSyntax state machine and
//! re-resolves dependencies; `value` recomputes on every read by walking the
//! formula's free variables, pulling provider values, and handing a scope to
//! the expression evaluator. Nothing is cached across mutations: after any
//! mutating call returns, every read is consistent with the new state.

use std::collections::HashMap;

use cellcalc_common::{CellError, CellErrorKind, CellId};
use rustc_hash::FxHashSet;

use super::GraphError;
use super::graph::Graph;

/// Strip an optional cosmetic leading `=` and surrounding whitespace.
fn normalize_formula(text: &str) -> &str {
    let text = text.trim();
    text.strip_prefix('=').map(str::trim).unwrap_or(text)
}

impl Graph {
    /// Replace a cell's formula.
    ///
    /// Empty text clears the formula. Text that fails to parse is held
    /// verbatim (the `formula` read returns exactly what was typed) with
    /// an `InvalidFormulaError` recorded and a not-a-number value. Valid
    /// text replaces the parsed tree and re-resolves dependencies from its
    /// free variables.
    pub fn set_formula(&mut self, id: CellId, text: &str) -> Result<(), GraphError> {
        {
            let Some(cell) = self.cells.get_mut(&id) else {
                return Err(GraphError::UnknownCell(id));
            };
            cell.pending_invalid_formula = None;
            // Formula errors are re-derived below. A pending invalid symbol
            // keeps its error until repaired through `update_symbol`.
            for kind in [
                CellErrorKind::InvalidFormula,
                CellErrorKind::CircularReference,
                CellErrorKind::ReferenceNotFound,
                CellErrorKind::ReferenceValue,
                CellErrorKind::Generic,
            ] {
                cell.errors.clear(kind);
            }
        }

        let normalized = normalize_formula(text);
        if normalized.is_empty() {
            self.clear_dependencies(id);
            if let Some(cell) = self.cells.get_mut(&id) {
                cell.ast = None;
            }
            return Ok(());
        }

        match cellcalc_parse::parse(normalized) {
            Ok(ast) => {
                if let Some(cell) = self.cells.get_mut(&id) {
                    cell.ast = Some(ast);
                }
                self.resolve_dependencies(id);
                #[cfg(feature = "tracing")]
                tracing::debug!(%id, "formula replaced");
            }
            Err(err) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(%id, error = %err, "formula rejected by parser");
                if let Some(cell) = self.cells.get_mut(&id) {
                    cell.ast = None;
                    cell.pending_invalid_formula = Some(normalized.to_string());
                    cell.errors.add(
                        CellError::new(CellErrorKind::InvalidFormula).with_message(err.to_string()),
                    );
                }
            }
        }
        Ok(())
    }

    /// Re-derive provider edges from the parsed tree's free variables.
    ///
    /// Every variable node gets the id registered for its name, allocating
    /// one if the symbol was never seen, so a cell created under that name
    /// later adopts the same id and the reference heals without re-parsing.
    fn resolve_dependencies(&mut self, id: CellId) {
        self.clear_dependencies(id);

        let self_symbol = self.cells.get(&id).and_then(|c| c.symbol.clone());

        let mut references: Vec<(String, CellId)> = Vec::new();
        {
            let Some(cell) = self.cells.get_mut(&id) else {
                return;
            };
            let Some(ast) = cell.ast.as_mut() else {
                return;
            };
            let registry = &mut self.registry;
            ast.for_each_variable_mut(&mut |var| {
                let var_id = registry.get_id(&var.name);
                var.cell_id = Some(var_id);
                references.push((var.name.clone(), var_id));
            });
        }

        for (name, var_id) in references {
            if self_symbol.as_deref() == Some(name.as_str()) {
                let message = format!("{name}'s formula references itself");
                if let Some(cell) = self.cells.get_mut(&id) {
                    cell.errors.add(
                        CellError::new(CellErrorKind::CircularReference).with_message(message),
                    );
                }
                continue;
            }
            if !self.cells.contains_key(&var_id) {
                // Tentative: the symbol may be created later, at which point
                // the next read resolves it.
                let owner = self_symbol.clone().unwrap_or_else(|| id.to_string());
                let message = format!("{owner}'s formula references {name} which does not exist.");
                if let Some(cell) = self.cells.get_mut(&id) {
                    cell.errors.add(
                        CellError::new(CellErrorKind::ReferenceNotFound).with_message(message),
                    );
                }
                continue;
            }
            self.add_dependency(id, var_id);
        }
    }

    /// The cell's current value, recomputed on demand.
    ///
    /// Not-a-number is the universal upstream-broken signal: a missing
    /// provider, a provider whose own value is not a number, a syntax
    /// error, or an evaluation fault all surface as NaN here, with the
    /// specific condition recorded on the cell's error sink.
    pub fn value(&mut self, id: CellId) -> f64 {
        let mut visiting = FxHashSet::default();
        self.value_inner(id, &mut visiting)
    }

    /// Recursive worker behind [`Graph::value`].
    ///
    /// The dependency *edges* are a DAG, but formulas can still reference
    /// each other in a loop without edges backing them (an edge refused by
    /// cycle detection, or two formulas forward-referencing each other
    /// before either existed). `visiting` cuts that recursion: a cell
    /// re-entered during its own evaluation reads as not-a-number.
    fn value_inner(&mut self, id: CellId, visiting: &mut FxHashSet<CellId>) -> f64 {
        if !visiting.insert(id) {
            return f64::NAN;
        }
        let value = self.compute_value(id, visiting);
        visiting.remove(&id);
        value
    }

    fn compute_value(&mut self, id: CellId, visiting: &mut FxHashSet<CellId>) -> f64 {
        if self
            .cells
            .get(&id)
            .and_then(|cell| cell.ast.as_ref())
            .is_none()
        {
            return f64::NAN;
        }

        // Refresh only the reference errors; syntax and circular errors
        // belong to the formula, not to this read.
        if let Some(cell) = self.cells.get_mut(&id) {
            cell.errors.clear(CellErrorKind::ReferenceNotFound);
            cell.errors.clear(CellErrorKind::ReferenceValue);
        }

        let variables: Vec<(String, Option<CellId>)> = match self
            .cells
            .get(&id)
            .and_then(|cell| cell.ast.as_ref())
        {
            Some(ast) => ast
                .variables()
                .into_iter()
                .map(|var| (var.name.clone(), var.cell_id))
                .collect(),
            None => return f64::NAN,
        };

        let mut scope: HashMap<String, f64> = HashMap::with_capacity(variables.len());
        for (name, var_id) in variables {
            let Some(var_id) = var_id else {
                // Resolution attaches an id to every variable node; reaching
                // this is a bug in dependency resolution, not user input.
                debug_assert!(false, "free variable '{name}' has no resolved id");
                #[cfg(feature = "tracing")]
                tracing::error!(%id, %name, "free variable with no resolved id");
                if let Some(cell) = self.cells.get_mut(&id) {
                    cell.errors.add(
                        CellError::new(CellErrorKind::Generic)
                            .with_message(format!("free variable '{name}' has no resolved id")),
                    );
                }
                continue;
            };
            if var_id == id {
                // Self-reference: refused at resolution time, never bound.
                continue;
            }
            if !self.cells.contains_key(&var_id) {
                let symbol = self.symbol_for(var_id);
                if let Some(cell) = self.cells.get_mut(&id) {
                    cell.errors.add(
                        CellError::new(CellErrorKind::ReferenceNotFound)
                            .with_message(format!("no cell with symbol {symbol}")),
                    );
                }
                continue;
            }
            let provider_value = self.value_inner(var_id, visiting);
            if provider_value.is_nan() {
                let symbol = self.symbol_for(var_id);
                if let Some(cell) = self.cells.get_mut(&id) {
                    cell.errors.add(
                        CellError::new(CellErrorKind::ReferenceValue)
                            .with_message(format!("{symbol}'s value is invalid.")),
                    );
                }
                continue;
            }
            scope.insert(name, provider_value);
        }

        let Some(ast) = self.cells.get(&id).and_then(|cell| cell.ast.as_ref()) else {
            return f64::NAN;
        };
        match ast.evaluate(&scope) {
            Ok(value) => value,
            Err(_) => f64::NAN,
        }
    }

    /// The cell's formula text.
    ///
    /// While a parse failure is pending, returns the rejected text verbatim.
    /// Otherwise the parsed tree is re-rendered, substituting each resolved
    /// variable's *current* symbol, looked up fresh on every call, so a
    /// renamed dependency shows its new name here without re-parsing.
    pub fn formula(&self, id: CellId) -> String {
        let Some(cell) = self.cells.get(&id) else {
            return String::new();
        };
        if let Some(raw) = &cell.pending_invalid_formula {
            return raw.clone();
        }
        let Some(ast) = &cell.ast else {
            return String::new();
        };
        let registry = &self.registry;
        ast.render(&mut |var| {
            var.cell_id
                .and_then(|var_id| registry.get_symbol(var_id))
                .map(str::to_string)
        })
    }

    /// What a display surface should show for the cell: the first error's
    /// fixed token while any error is outstanding, the value otherwise.
    pub fn display_value(&mut self, id: CellId) -> String {
        let value = self.value(id);
        let Some(cell) = self.cells.get(&id) else {
            return String::new();
        };
        match cell.errors.first_display_token() {
            Some(token) => token.to_string(),
            None => value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::normalize_formula;

    #[test]
    fn normalization_strips_cosmetic_equals() {
        assert_eq!(normalize_formula("   = 10"), "10");
        assert_eq!(normalize_formula("= a + 10"), "a + 10");
        assert_eq!(normalize_formula("a + 10"), "a + 10");
        assert_eq!(normalize_formula("  %   "), "%");
        assert_eq!(normalize_formula(""), "");
        assert_eq!(normalize_formula(" = "), "");
    }
}
