use jackc::analyzer::Ty;
use jackc::lexer::Lexer;
use jackc::parser::{
    BinOpKind, ClassVarKind, Expr, KeywordConstant, Parser, Stmt, SubroutineKind, Term,
    UnaryOpKind, MAX_NESTING,
};
use jackc::{CompileError, Location};

fn parse_expr(input: &str) -> Expr {
    Parser::new(Lexer::new(input)).parse_expr().unwrap()
}

fn syntax_error(input: &str) -> (Location, String, String) {
    match jackc::parse(input).unwrap_err() {
        CompileError::Syntax {
            location,
            expected,
            found,
        } => (location, expected, found),
        e => panic!("expected a syntax error, got {}", e),
    }
}

#[test]
fn parses_class_structure() {
    let class = jackc::parse(
        "
class Point {
    field int x, y;
    static Point origin;

    constructor Point new(int ax, int ay) {
        let x = ax;
        let y = ay;
        return this;
    }

    method int getX() { return x; }

    function void reset() {
        var int i;
        var Array a, b;
        return;
    }
}
",
    )
    .unwrap();

    assert_eq!(class.name.name, "Point");
    assert_eq!(class.vars.len(), 2);
    assert_eq!(class.vars[0].kind, ClassVarKind::Field);
    assert_eq!(class.vars[0].ty, Ty::Int);
    let names: Vec<&str> = class.vars[0].names.iter().map(|n| n.name.as_str()).collect();
    assert_eq!(names, vec!["x", "y"]);
    assert_eq!(class.vars[1].kind, ClassVarKind::Static);
    assert_eq!(class.vars[1].ty, Ty::Class("Point".to_string()));

    let kinds: Vec<SubroutineKind> = class.subroutines.iter().map(|s| s.kind).collect();
    assert_eq!(
        kinds,
        vec![
            SubroutineKind::Constructor,
            SubroutineKind::Method,
            SubroutineKind::Function
        ]
    );

    let new = &class.subroutines[0];
    assert_eq!(new.return_ty, Ty::Class("Point".to_string()));
    assert_eq!(new.params.len(), 2);
    assert_eq!(new.params[1].name.name, "ay");
    assert_eq!(new.body.len(), 3);

    let reset = &class.subroutines[2];
    assert_eq!(reset.return_ty, Ty::Void);
    assert_eq!(reset.locals.len(), 2);
    assert_eq!(reset.locals[1].names.len(), 2);
    assert!(matches!(&reset.body[..], [Stmt::Return(None, _)]));
}

#[test]
fn identifiers_keep_their_location() {
    let class = jackc::parse("class A {\n  field int count;\n}").unwrap();
    assert_eq!(class.name.loc, Location::new(1, 7));
    assert_eq!(class.vars[0].names[0].loc, Location::new(2, 13));
}

#[test]
fn binary_operators_have_no_precedence() {
    let expr = parse_expr("1 + 2 * 3");
    assert_eq!(expr.term, Term::IntConst(1));
    assert_eq!(
        expr.ops,
        vec![
            (BinOpKind::Add, Term::IntConst(2)),
            (BinOpKind::Mul, Term::IntConst(3))
        ]
    );
}

#[test]
fn parses_every_term_form() {
    let expr = parse_expr(r#"a[i] & f(1, 2) | Foo.bar() - -x = ~(y) < "s" > null"#);

    let Term::Index(array, index) = &expr.term else {
        panic!("expected an array access, got {:?}", expr.term);
    };
    assert_eq!(array.name, "a");
    assert!(matches!(index.term, Term::Var(_)));

    let ops: Vec<BinOpKind> = expr.ops.iter().map(|(op, _)| *op).collect();
    assert_eq!(
        ops,
        vec![
            BinOpKind::BitwiseAnd,
            BinOpKind::BitwiseOr,
            BinOpKind::Sub,
            BinOpKind::Equal,
            BinOpKind::LessThan,
            BinOpKind::GreaterThan,
        ]
    );

    let Term::Call(call) = &expr.ops[0].1 else {
        panic!("expected a call");
    };
    assert!(call.receiver.is_none());
    assert_eq!(call.name.name, "f");
    assert_eq!(call.args.len(), 2);

    let Term::Call(call) = &expr.ops[1].1 else {
        panic!("expected a call");
    };
    assert_eq!(call.receiver.as_ref().map(|r| r.name.as_str()), Some("Foo"));
    assert_eq!(call.name.name, "bar");
    assert!(call.args.is_empty());

    assert!(matches!(
        &expr.ops[2].1,
        Term::Unary(UnaryOpKind::Neg, inner) if matches!(**inner, Term::Var(_))
    ));
    assert!(matches!(
        &expr.ops[3].1,
        Term::Unary(UnaryOpKind::BitwiseNot, inner) if matches!(**inner, Term::Expr(_))
    ));
    assert!(matches!(&expr.ops[4].1, Term::StringConst(s, _) if s == "s"));
    assert!(matches!(
        expr.ops[5].1,
        Term::Keyword(KeywordConstant::Null, _)
    ));
}

#[test]
fn parses_statements() {
    let class = jackc::parse(
        "
class Main {
    function void main() {
        var Array a;
        let a[1] = 2;
        if (true) { do Main.f(); } else { return; }
        if (false) { }
        while (a) { let a = a; }
        return 1;
    }
}
",
    )
    .unwrap();
    let body = &class.subroutines[0].body;
    assert_eq!(body.len(), 5);
    assert!(matches!(&body[0], Stmt::Let { index: Some(_), .. }));
    assert!(matches!(
        &body[1],
        Stmt::If { then, otherwise: Some(otherwise), .. } if then.len() == 1 && otherwise.len() == 1
    ));
    assert!(matches!(
        &body[2],
        Stmt::If { then, otherwise: None, .. } if then.is_empty()
    ));
    assert!(matches!(&body[3], Stmt::While { body, .. } if body.len() == 1));
    assert!(matches!(&body[4], Stmt::Return(Some(_), loc) if *loc == Location::new(9, 9)));
}

#[test]
fn missing_semicolon_is_a_syntax_error() {
    let (location, expected, found) =
        syntax_error("class A {\n  function void f() {\n    return\n  }\n}");
    assert_eq!(location, Location::new(4, 3));
    assert_eq!(expected, "term");
    assert_eq!(found, "`}`");
}

#[test]
fn missing_let_semicolon_names_the_expected_symbol() {
    let (location, expected, found) =
        syntax_error("class A { function void f() { var int x; let x = 1 return; } }");
    assert_eq!(location, Location::new(1, 52));
    assert_eq!(expected, "`;`");
    assert_eq!(found, "`return`");
}

#[test]
fn tokens_after_the_class_are_rejected() {
    let (location, expected, found) = syntax_error("class A { } class B { }");
    assert_eq!(location, Location::new(1, 13));
    assert_eq!(expected, "end of input");
    assert_eq!(found, "`class`");
}

#[test]
fn truncated_input_reports_end_of_input() {
    let (_, expected, found) = syntax_error("class A { function void f(");
    assert_eq!(expected, "type");
    assert_eq!(found, "end of input");
}

#[test]
fn void_is_only_a_return_type() {
    let (_, expected, found) = syntax_error("class A { field void x; }");
    assert_eq!(expected, "type");
    assert_eq!(found, "`void`");
}

#[test]
fn declarations_must_precede_statements() {
    let (location, expected, found) =
        syntax_error("class A { function void f() { var int x; let x = 1; var int y; } }");
    assert_eq!(location, Location::new(1, 53));
    assert_eq!(found, "`var`");
    assert_eq!(expected, "statement");
}

#[test]
fn lexical_errors_surface_through_the_parser() {
    let err = jackc::parse("class A { # }").unwrap_err();
    assert!(matches!(err, CompileError::Lexical { .. }));
    assert_eq!(err.location(), Location::new(1, 11));
}

#[test]
fn runaway_expression_nesting_is_an_error() {
    let deep = 10_000;
    for expr in [
        format!("{}1{}", "(".repeat(deep), ")".repeat(deep)),
        format!("{}1", "-".repeat(deep)),
        format!("{}a[1]{}", "a[".repeat(deep), "]".repeat(deep)),
    ] {
        let source = format!("class A {{ function int f(Array a) {{ return {}; }} }}", expr);
        let err = jackc::parse(&source).unwrap_err();
        assert!(
            matches!(err, CompileError::NestingTooDeep { limit, .. } if limit == MAX_NESTING),
            "got {}",
            err
        );
    }
}

#[test]
fn runaway_statement_nesting_is_an_error() {
    let deep = 10_000;
    let source = format!(
        "class A {{ function void f() {{ {}return;{} }} }}",
        "while (1) { ".repeat(deep),
        " }".repeat(deep + 1)
    );
    assert!(matches!(
        jackc::parse(&source),
        Err(CompileError::NestingTooDeep { .. })
    ));
}

#[test]
fn nesting_up_to_the_limit_parses() {
    // `return` takes one level and the innermost `1` another.
    let source = |parens: usize| {
        format!(
            "class A {{ function int f() {{ return {}1{}; }} }}",
            "(".repeat(parens),
            ")".repeat(parens)
        )
    };
    assert!(jackc::parse(&source(MAX_NESTING - 2)).is_ok());
    assert!(jackc::parse(&source(MAX_NESTING - 1)).is_err());
}
