use crate::error::Location;

use super::Identifier;

/// `term (op term)*`, evaluated strictly left to right.
#[derive(Clone, Debug, PartialEq)]
pub struct Expr {
    pub term: Term,
    pub ops: Vec<(BinOpKind, Term)>,
}

impl Expr {
    pub fn terms(&self) -> impl Iterator<Item = &Term> {
        std::iter::once(&self.term).chain(self.ops.iter().map(|(_, t)| t))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOpKind {
    Add,
    Sub,
    Mul,
    Div,
    BitwiseAnd,
    BitwiseOr,
    LessThan,
    GreaterThan,
    Equal,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOpKind {
    Neg,
    BitwiseNot,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeywordConstant {
    True,
    False,
    Null,
    This,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Term {
    IntConst(u16),
    StringConst(String, Location),
    Keyword(KeywordConstant, Location),
    Var(Identifier),
    Index(Identifier, Box<Expr>),
    Call(SubroutineCall),
    Expr(Box<Expr>),
    Unary(UnaryOpKind, Box<Term>),
}

/// `name(args)`, `Class.name(args)` or `var.name(args)`.
#[derive(Clone, Debug, PartialEq)]
pub struct SubroutineCall {
    pub receiver: Option<Identifier>,
    pub name: Identifier,
    pub args: Vec<Expr>,
}
