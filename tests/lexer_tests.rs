use jackc::lexer::{Keyword, Lexer, Symbol, TokenKind};
use jackc::{CompileError, Location};

fn kinds(input: &str) -> Vec<TokenKind> {
    Lexer::tokenize(input)
        .unwrap()
        .into_iter()
        .map(|t| t.kind)
        .collect()
}

#[test]
fn classifies_every_token_class() {
    let actual = kinds(r#"let x_1 = arr[12] + "a b";"#);
    let expected = vec![
        TokenKind::Keyword(Keyword::Let),
        TokenKind::Ident("x_1".to_string()),
        TokenKind::Symbol(Symbol::Equal),
        TokenKind::Ident("arr".to_string()),
        TokenKind::Symbol(Symbol::OpenSquareBrace),
        TokenKind::IntConst(12),
        TokenKind::Symbol(Symbol::CloseSquareBrace),
        TokenKind::Symbol(Symbol::Plus),
        TokenKind::StringConst("a b".to_string()),
        TokenKind::Symbol(Symbol::SemiColon),
    ];
    assert_eq!(actual, expected);
}

#[test]
fn keywords_need_an_exact_match() {
    assert_eq!(
        kinds("classy class _class"),
        vec![
            TokenKind::Ident("classy".to_string()),
            TokenKind::Keyword(Keyword::Class),
            TokenKind::Ident("_class".to_string()),
        ]
    );
}

#[test]
fn skips_comments_and_whitespace() {
    let input = "
/** Doc comment
 * spanning lines */
do /* inline */ f(); // trailing
\t// whole line
return;
";
    assert_eq!(
        kinds(input),
        vec![
            TokenKind::Keyword(Keyword::Do),
            TokenKind::Ident("f".to_string()),
            TokenKind::Symbol(Symbol::OpenParen),
            TokenKind::Symbol(Symbol::CloseParen),
            TokenKind::Symbol(Symbol::SemiColon),
            TokenKind::Keyword(Keyword::Return),
            TokenKind::Symbol(Symbol::SemiColon),
        ]
    );
}

#[test]
fn slash_alone_is_a_symbol() {
    assert_eq!(
        kinds("a/b"),
        vec![
            TokenKind::Ident("a".to_string()),
            TokenKind::Symbol(Symbol::Slash),
            TokenKind::Ident("b".to_string()),
        ]
    );
}

#[test]
fn digits_then_letters_split_into_two_tokens() {
    assert_eq!(
        kinds("12ab"),
        vec![TokenKind::IntConst(12), TokenKind::Ident("ab".to_string())]
    );
}

#[test]
fn retokenizing_rendered_tokens_is_stable() {
    let input = r#"
class Main {
    static boolean flag; // comment
    function void main() {
        var String s;
        let s = "Hello, world";
        do Output.printString(s);
        let flag = ~(1 < 2) | (3 > 4) & true;
        return;
    }
}
"#;
    let first = kinds(input);
    let rendered = first
        .iter()
        .map(|k| k.to_string())
        .collect::<Vec<_>>()
        .join(" ");
    assert_eq!(kinds(&rendered), first);
}

#[test]
fn records_line_and_column() {
    let tokens = Lexer::tokenize("class\n  Foo {").unwrap();
    let locs: Vec<Location> = tokens.iter().map(|t| t.loc).collect();
    assert_eq!(
        locs,
        vec![Location::new(1, 1), Location::new(2, 3), Location::new(2, 7)]
    );
}

#[test]
fn largest_int_constant_is_accepted() {
    assert_eq!(kinds("32767"), vec![TokenKind::IntConst(32767)]);
}

#[test]
fn int_constant_out_of_range_fails() {
    for input in ["32768", "99999999999999999999"] {
        let err = Lexer::tokenize(input).unwrap_err();
        let CompileError::Lexical { location, message } = err else {
            panic!("expected a lexical error for {}", input);
        };
        assert_eq!(location, Location::new(1, 1));
        assert!(message.contains("out of range"));
    }
}

#[test]
fn unexpected_character_fails_with_location() {
    let err = Lexer::tokenize("class\n  Foo #").unwrap_err();
    assert!(matches!(err, CompileError::Lexical { .. }));
    assert_eq!(err.location(), Location::new(2, 7));
}

#[test]
fn unterminated_string_fails() {
    for input in [r#"let s = "abc"#, "let s = \"abc\n\";"] {
        let err = Lexer::tokenize(input).unwrap_err();
        let CompileError::Lexical { location, message } = err else {
            panic!("expected a lexical error for {:?}", input);
        };
        assert_eq!(location, Location::new(1, 9));
        assert!(message.contains("unterminated string"));
    }
}

#[test]
fn unterminated_block_comment_fails() {
    let err = Lexer::tokenize("do f(); /* never closed *").unwrap_err();
    let CompileError::Lexical { location, message } = err else {
        panic!("expected a lexical error");
    };
    assert_eq!(location, Location::new(1, 9));
    assert!(message.contains("block comment"));
}

#[test]
fn lexer_is_lazy_and_stops_after_an_error() {
    let mut lexer = Lexer::new("x $ y");
    assert_eq!(
        lexer.next().unwrap().unwrap().kind,
        TokenKind::Ident("x".to_string())
    );
    assert!(lexer.next().unwrap().is_err());
    assert!(lexer.next().is_none());
}

#[test]
fn cloned_lexer_restarts_from_its_position() {
    let mut lexer = Lexer::new("a b c");
    lexer.next();
    let rest: Vec<_> = lexer.clone().map(|t| t.unwrap().kind).collect();
    let again: Vec<_> = lexer.map(|t| t.unwrap().kind).collect();
    assert_eq!(rest, again);
    assert_eq!(rest.len(), 2);
}
