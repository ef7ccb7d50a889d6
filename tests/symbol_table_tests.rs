use jackc::analyzer::{Kind, SymbolError, SymbolTable, Ty};
use jackc::lexer::MAX_INT_CONST;

fn point() -> Ty {
    Ty::Class("Point".to_string())
}

#[test]
fn indices_are_dense_per_kind() {
    let mut table = SymbolTable::new();
    table.define("a", Ty::Int, Kind::Field).unwrap();
    table.define("s", Ty::Int, Kind::Static).unwrap();
    table.define("b", point(), Kind::Field).unwrap();
    table.define("c", Ty::Boolean, Kind::Field).unwrap();
    table.define("x", Ty::Int, Kind::Argument).unwrap();
    table.define("i", Ty::Char, Kind::Local).unwrap();
    table.define("y", Ty::Int, Kind::Argument).unwrap();

    let indices: Vec<u16> = ["a", "b", "c"]
        .iter()
        .map(|n| table.index_of(n).unwrap())
        .collect();
    assert_eq!(indices, vec![0, 1, 2]);
    assert_eq!(table.index_of("s").unwrap(), 0);
    assert_eq!(table.index_of("x").unwrap(), 0);
    assert_eq!(table.index_of("y").unwrap(), 1);
    assert_eq!(table.index_of("i").unwrap(), 0);

    assert_eq!(table.var_count(Kind::Field), 3);
    assert_eq!(table.var_count(Kind::Static), 1);
    assert_eq!(table.var_count(Kind::Argument), 2);
    assert_eq!(table.var_count(Kind::Local), 1);
}

#[test]
fn subroutine_scope_shadows_class_scope() {
    let mut table = SymbolTable::new();
    table.define("x", Ty::Int, Kind::Field).unwrap();
    table.define("x", point(), Kind::Local).unwrap();

    assert_eq!(table.kind_of("x").unwrap(), Kind::Local);
    assert_eq!(table.type_of("x").unwrap(), &point());
    assert_eq!(table.index_of("x").unwrap(), 0);

    table.start_subroutine();
    assert_eq!(table.kind_of("x").unwrap(), Kind::Field);
    assert_eq!(table.type_of("x").unwrap(), &Ty::Int);
}

#[test]
fn start_subroutine_resets_only_the_subroutine_scope() {
    let mut table = SymbolTable::new();
    table.define("count", Ty::Int, Kind::Static).unwrap();
    table.define("a", Ty::Int, Kind::Argument).unwrap();
    table.define("l", Ty::Int, Kind::Local).unwrap();

    table.start_subroutine();

    assert_eq!(table.var_count(Kind::Argument), 0);
    assert_eq!(table.var_count(Kind::Local), 0);
    assert_eq!(table.var_count(Kind::Static), 1);
    assert!(!table.is_declared("a"));
    assert!(table.is_declared("count"));

    let symbol = table.define("b", Ty::Int, Kind::Argument).unwrap();
    assert_eq!(symbol.index, 0);
}

#[test]
fn duplicate_in_one_scope_fails() {
    let mut table = SymbolTable::new();
    table.define("x", Ty::Int, Kind::Static).unwrap();
    assert_eq!(
        table.define("x", Ty::Int, Kind::Field).unwrap_err(),
        SymbolError::Duplicate {
            name: "x".to_string(),
            kind: Kind::Field
        }
    );

    table.define("v", Ty::Int, Kind::Argument).unwrap();
    assert!(matches!(
        table.define("v", Ty::Int, Kind::Local),
        Err(SymbolError::Duplicate { .. })
    ));
}

#[test]
fn failed_define_does_not_consume_an_index() {
    let mut table = SymbolTable::new();
    table.define("x", Ty::Int, Kind::Local).unwrap();
    assert!(table.define("x", Ty::Int, Kind::Local).is_err());
    let symbol = table.define("y", Ty::Int, Kind::Local).unwrap();
    assert_eq!(symbol.index, 1);
    assert_eq!(table.var_count(Kind::Local), 2);
}

#[test]
fn undeclared_name_is_reported() {
    let table = SymbolTable::new();
    assert_eq!(
        table.kind_of("missing").unwrap_err(),
        SymbolError::Undeclared {
            name: "missing".to_string()
        }
    );
    assert!(table.index_of("missing").is_err());
    assert!(table.type_of("missing").is_err());
}

#[test]
fn indices_stop_at_the_largest_constant() {
    let mut table = SymbolTable::new();
    for i in 0..MAX_INT_CONST {
        table.define(&format!("v{}", i), Ty::Int, Kind::Local).unwrap();
    }
    assert_eq!(table.var_count(Kind::Local), MAX_INT_CONST);
    assert_eq!(table.index_of("v32766").unwrap(), 32766);

    assert_eq!(
        table.define("one_more", Ty::Int, Kind::Local).unwrap_err(),
        SymbolError::TooMany { kind: Kind::Local }
    );
    assert_eq!(table.var_count(Kind::Local), MAX_INT_CONST);
    assert!(!table.is_declared("one_more"));

    table.define("arg", Ty::Int, Kind::Argument).unwrap();
}
