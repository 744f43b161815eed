use crate::engine::cell::{CellProps, CellState, EquationProps};
use crate::engine::graph::Graph;
use crate::engine::GraphError;

#[test]
fn can_instantiate() {
    let graph = Graph::new();
    assert!(graph.is_empty());
    assert_eq!(graph.cells().count(), 0);
}

#[test]
fn can_add_cells() {
    let mut graph = Graph::new();
    graph.new_equation(EquationProps::new("a")).unwrap();
    graph.new_equation(EquationProps::new("b")).unwrap();
    graph.new_equation(EquationProps::new("c")).unwrap();
    assert_eq!(graph.len(), 3);
}

#[test]
fn can_find_cells() {
    let mut graph = Graph::new();
    let a = graph.new_equation(EquationProps::new("a")).unwrap();
    assert_eq!(graph.find("a").map(|c| c.id()), Some(a));
    assert!(graph.find_by_id(a).is_some());
    assert!(graph.id_exists(a));
    assert!(graph.symbol_exists("a"));
    assert!(!graph.symbol_exists("b"));
}

#[test]
fn find_never_allocates() {
    let graph = Graph::new();
    assert!(graph.find("never_seen").is_none());
    assert!(graph.find_id("never_seen").is_none());
}

#[test]
fn cells_iterate_in_creation_order() {
    let mut graph = Graph::new();
    graph.new_equation(EquationProps::new("b")).unwrap();
    graph.new_equation(EquationProps::new("a")).unwrap();
    graph.new_equation(EquationProps::new("c")).unwrap();
    let symbols: Vec<_> = graph.cells().filter_map(|c| c.symbol()).collect();
    assert_eq!(symbols, vec!["b", "a", "c"]);
}

#[test]
fn missing_symbol_is_fatal() {
    let mut graph = Graph::new();
    let props = CellProps {
        symbol: None,
        ..CellProps::default()
    };
    assert!(matches!(graph.create(props), Err(GraphError::MissingSymbol)));
    assert!(graph.is_empty());
}

#[test]
fn unknown_kind_is_skipped() {
    let mut graph = Graph::new();
    let props = CellProps {
        kind: "Widget".to_string(),
        symbol: Some("w".to_string()),
        ..CellProps::default()
    };
    assert!(matches!(graph.create(props), Ok(None)));
    assert!(graph.is_empty());
}

#[test]
fn new_cell_starts_empty() {
    let mut graph = Graph::new();
    let foo = graph.new_equation(EquationProps::new("foo")).unwrap();
    assert_eq!(graph.formula(foo), "");
    assert!(graph.value(foo).is_nan());
    assert_eq!(graph.cell(foo).unwrap().state(), CellState::Empty);
    assert!(!graph.cell(foo).unwrap().has_error());
}

#[test]
fn lock_flag_round_trips() {
    let mut graph = Graph::new();
    let a = graph.new_equation(EquationProps::new("a")).unwrap();
    assert!(!graph.cell(a).unwrap().locked());
    graph.cell_mut(a).unwrap().lock();
    assert!(graph.cell(a).unwrap().locked());
    graph.cell_mut(a).unwrap().toggle_locked();
    assert!(!graph.cell(a).unwrap().locked());
}

#[test]
fn locked_can_be_set_from_props() {
    let mut graph = Graph::new();
    let props = EquationProps {
        locked: true,
        ..EquationProps::new("a")
    };
    let a = graph.new_equation(props).unwrap();
    assert!(graph.cell(a).unwrap().locked());
}
