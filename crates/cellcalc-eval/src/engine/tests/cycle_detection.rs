use cellcalc_common::CellErrorKind;

use crate::engine::cell::EquationProps;
use crate::engine::graph::Graph;

fn kinds(graph: &Graph, id: cellcalc_common::CellId) -> Vec<CellErrorKind> {
    graph
        .cell(id)
        .unwrap()
        .errors()
        .iter()
        .map(|e| e.kind)
        .collect()
}

#[test]
fn catches_a_self_reference() {
    let mut graph = Graph::new();
    let a = graph
        .new_equation(EquationProps::new("a").with_formula("= 10"))
        .unwrap();
    graph.set_formula(a, "= a").unwrap();

    assert_eq!(kinds(&graph, a), vec![CellErrorKind::CircularReference]);
    // No self-edge was added.
    assert!(graph.cell(a).unwrap().direct_providers().is_empty());
    assert!(graph.value(a).is_nan());
}

#[test]
fn catches_a_direct_circular_reference() {
    let mut graph = Graph::new();
    let a = graph
        .new_equation(EquationProps::new("a").with_formula("= 10"))
        .unwrap();
    let b = graph
        .new_equation(EquationProps::new("b").with_formula("= a + 10"))
        .unwrap();
    graph.set_formula(a, "= b").unwrap();

    assert_eq!(kinds(&graph, a), vec![CellErrorKind::CircularReference]);
    // The edge was refused; b's chain is untouched.
    assert!(graph.cell(a).unwrap().direct_providers().is_empty());
    assert_eq!(graph.cell(b).unwrap().direct_providers(), &[a]);
}

#[test]
fn catches_a_long_chain_circular_reference() {
    let mut graph = Graph::new();
    let a = graph
        .new_equation(EquationProps::new("a").with_formula("= 10"))
        .unwrap();
    let b = graph
        .new_equation(EquationProps::new("b").with_formula("= a + 10"))
        .unwrap();
    let c = graph
        .new_equation(EquationProps::new("c").with_formula("= b"))
        .unwrap();
    let d = graph
        .new_equation(EquationProps::new("d").with_formula("= c"))
        .unwrap();

    graph.set_formula(a, "= d").unwrap();

    // Exactly one circular-reference error on the attempting cell, and the
    // dependency graph is unchanged.
    assert_eq!(kinds(&graph, a), vec![CellErrorKind::CircularReference]);
    assert!(graph.cell(a).unwrap().direct_providers().is_empty());
    assert_eq!(graph.cell(d).unwrap().direct_providers(), &[c]);
    assert_eq!(graph.cell(c).unwrap().direct_providers(), &[b]);
    assert_eq!(graph.cell(b).unwrap().direct_providers(), &[a]);
}

#[test]
fn refusal_message_names_both_symbols() {
    let mut graph = Graph::new();
    let a = graph
        .new_equation(EquationProps::new("a").with_formula("= 10"))
        .unwrap();
    graph
        .new_equation(EquationProps::new("b").with_formula("= a + 10"))
        .unwrap();
    graph.set_formula(a, "= b").unwrap();

    let errors = graph.cell(a).unwrap().errors();
    let message = errors[0].message.as_deref().unwrap();
    assert!(message.contains('a') && message.contains('b'), "{message}");
}

#[test]
fn evaluation_after_a_refused_edge_terminates() {
    let mut graph = Graph::new();
    let a = graph
        .new_equation(EquationProps::new("a").with_formula("= 10"))
        .unwrap();
    let b = graph
        .new_equation(EquationProps::new("b").with_formula("= a + 10"))
        .unwrap();
    graph.set_formula(a, "= b").unwrap();

    // The formulas still reference each other in a loop even though the
    // edge was refused; reads must settle on NaN instead of recursing.
    assert!(graph.value(a).is_nan());
    assert!(graph.value(b).is_nan());
    assert_eq!(graph.display_value(a), "#CIR!");
}

#[test]
fn direct_edge_api_refuses_cycles_from_either_side() {
    let mut graph = Graph::new();
    let a = graph.new_equation(EquationProps::new("a")).unwrap();
    let b = graph.new_equation(EquationProps::new("b")).unwrap();

    graph.add_dependency(b, a);
    assert!(graph.depends_on(b, a));
    assert!(graph.provides_for(a, b));

    // Closing the loop is refused and recorded on both detecting sides.
    graph.add_dependency(a, b);
    assert!(!graph.depends_on(a, b));
    assert!(graph.cell(a).unwrap().has_error());
    assert!(graph.cell(b).unwrap().has_error());
}

#[test]
fn self_edge_is_refused() {
    let mut graph = Graph::new();
    let a = graph.new_equation(EquationProps::new("a")).unwrap();
    graph.add_dependency(a, a);
    assert!(graph.cell(a).unwrap().direct_providers().is_empty());
    assert!(graph.cell(a).unwrap().direct_dependents().is_empty());
    assert!(graph.cell(a).unwrap().has_error());
}
