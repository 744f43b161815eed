//! Exercises the full collaborator contract the engine builds on: parse,
//! walk free variables, attach resolved ids, render with substitution, and
//! evaluate against a scope.

use std::collections::HashMap;

use cellcalc_parse::{CellId, parse};

#[test]
fn resolved_ids_survive_and_drive_rendering() {
    let mut ast = parse("= a + 10".trim_start_matches('=').trim()).unwrap();

    // Attach ids the way the engine does during dependency resolution.
    let id_a = CellId::new(7);
    ast.for_each_variable_mut(&mut |var| {
        assert_eq!(var.cell_id, None);
        if var.name == "a" {
            var.cell_id = Some(id_a);
        }
    });

    let vars = ast.variables();
    assert_eq!(vars.len(), 1);
    assert_eq!(vars[0].cell_id, Some(id_a));

    // Rendering substitutes by id, not by parsed text.
    let rendered = ast.render(&mut |var| {
        (var.cell_id == Some(id_a)).then(|| "a2".to_string())
    });
    assert_eq!(rendered, "a2 + 10");

    // The parsed name stays usable as the scope key even after the rename.
    let scope: HashMap<String, f64> = [("a".to_string(), 10.0)].into();
    assert_eq!(ast.evaluate(&scope).unwrap(), 20.0);
}

#[test]
fn parse_failure_reports_position() {
    let err = parse("10 + %").unwrap_err();
    assert_eq!(err.pos, 5);
}

#[test]
fn duplicate_references_keep_every_occurrence() {
    let ast = parse("a + a").unwrap();
    assert_eq!(ast.variables().len(), 2);

    let scope: HashMap<String, f64> = [("a".to_string(), 4.0)].into();
    assert_eq!(ast.evaluate(&scope).unwrap(), 8.0);
}
