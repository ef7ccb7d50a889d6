use std::fmt;

use phf::phf_map;

use crate::error::Location;

pub(super) static KEYWORDS: phf::Map<&'static str, Keyword> = phf_map! {
    "class" => Keyword::Class,
    "constructor" => Keyword::Constructor,
    "function" => Keyword::Function,
    "method" => Keyword::Method,
    "field" => Keyword::Field,
    "static" => Keyword::Static,
    "var" => Keyword::Var,
    "int" => Keyword::Int,
    "char" => Keyword::Char,
    "boolean" => Keyword::Boolean,
    "void" => Keyword::Void,
    "true" => Keyword::True,
    "false" => Keyword::False,
    "null" => Keyword::Null,
    "this" => Keyword::This,
    "let" => Keyword::Let,
    "do" => Keyword::Do,
    "if" => Keyword::If,
    "else" => Keyword::Else,
    "while" => Keyword::While,
    "return" => Keyword::Return,
};

pub(super) static SYMBOLS: phf::Map<char, Symbol> = phf_map! {
    '{' => Symbol::OpenCurlyBrace,
    '}' => Symbol::CloseCurlyBrace,
    '(' => Symbol::OpenParen,
    ')' => Symbol::CloseParen,
    '[' => Symbol::OpenSquareBrace,
    ']' => Symbol::CloseSquareBrace,
    '.' => Symbol::Dot,
    ',' => Symbol::Comma,
    ';' => Symbol::SemiColon,
    '+' => Symbol::Plus,
    '-' => Symbol::Minus,
    '*' => Symbol::Star,
    '/' => Symbol::Slash,
    '&' => Symbol::Ampersand,
    '|' => Symbol::Pipe,
    '<' => Symbol::LessThan,
    '>' => Symbol::GreaterThan,
    '=' => Symbol::Equal,
    '~' => Symbol::Tilde,
};

/// Largest value an integer constant may take.
pub const MAX_INT_CONST: u16 = 0x7fff;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Keyword {
    Class,
    Constructor,
    Function,
    Method,
    Field,
    Static,
    Var,
    Int,
    Char,
    Boolean,
    Void,
    True,
    False,
    Null,
    This,
    Let,
    Do,
    If,
    Else,
    While,
    Return,
}

impl Keyword {
    pub fn as_str(&self) -> &'static str {
        match self {
            Keyword::Class => "class",
            Keyword::Constructor => "constructor",
            Keyword::Function => "function",
            Keyword::Method => "method",
            Keyword::Field => "field",
            Keyword::Static => "static",
            Keyword::Var => "var",
            Keyword::Int => "int",
            Keyword::Char => "char",
            Keyword::Boolean => "boolean",
            Keyword::Void => "void",
            Keyword::True => "true",
            Keyword::False => "false",
            Keyword::Null => "null",
            Keyword::This => "this",
            Keyword::Let => "let",
            Keyword::Do => "do",
            Keyword::If => "if",
            Keyword::Else => "else",
            Keyword::While => "while",
            Keyword::Return => "return",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Symbol {
    OpenCurlyBrace,
    CloseCurlyBrace,
    OpenParen,
    CloseParen,
    OpenSquareBrace,
    CloseSquareBrace,
    Dot,
    Comma,
    SemiColon,
    Plus,
    Minus,
    Star,
    Slash,
    Ampersand,
    Pipe,
    LessThan,
    GreaterThan,
    Equal,
    Tilde,
}

impl Symbol {
    pub fn as_char(&self) -> char {
        match self {
            Symbol::OpenCurlyBrace => '{',
            Symbol::CloseCurlyBrace => '}',
            Symbol::OpenParen => '(',
            Symbol::CloseParen => ')',
            Symbol::OpenSquareBrace => '[',
            Symbol::CloseSquareBrace => ']',
            Symbol::Dot => '.',
            Symbol::Comma => ',',
            Symbol::SemiColon => ';',
            Symbol::Plus => '+',
            Symbol::Minus => '-',
            Symbol::Star => '*',
            Symbol::Slash => '/',
            Symbol::Ampersand => '&',
            Symbol::Pipe => '|',
            Symbol::LessThan => '<',
            Symbol::GreaterThan => '>',
            Symbol::Equal => '=',
            Symbol::Tilde => '~',
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenKind {
    Keyword(Keyword),
    Symbol(Symbol),
    Ident(String),
    IntConst(u16),
    StringConst(String),
}

/// Writes the token back as it would appear in source.
impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Keyword(k) => f.write_str(k.as_str()),
            TokenKind::Symbol(s) => write!(f, "{}", s.as_char()),
            TokenKind::Ident(name) => f.write_str(name),
            TokenKind::IntConst(value) => write!(f, "{}", value),
            TokenKind::StringConst(s) => write!(f, "\"{}\"", s),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub loc: Location,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}
