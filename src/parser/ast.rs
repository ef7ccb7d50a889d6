use crate::analyzer::Ty;
use crate::error::Location;

use super::{Expr, SubroutineCall};

#[derive(Clone, Debug, PartialEq)]
pub struct Identifier {
    pub name: String,
    pub loc: Location,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Class {
    pub name: Identifier,
    pub vars: Vec<ClassVarDec>,
    pub subroutines: Vec<SubroutineDec>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClassVarKind {
    Static,
    Field,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ClassVarDec {
    pub kind: ClassVarKind,
    pub ty: Ty,
    pub names: Vec<Identifier>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubroutineKind {
    Constructor,
    Function,
    Method,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SubroutineDec {
    pub kind: SubroutineKind,
    pub return_ty: Ty,
    pub name: Identifier,
    pub params: Vec<Param>,
    pub locals: Vec<VarDec>,
    pub body: Vec<Stmt>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Param {
    pub ty: Ty,
    pub name: Identifier,
}

#[derive(Clone, Debug, PartialEq)]
pub struct VarDec {
    pub ty: Ty,
    pub names: Vec<Identifier>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Stmt {
    Let {
        target: Identifier,
        index: Option<Expr>,
        value: Expr,
    },
    If {
        cond: Expr,
        then: Vec<Stmt>,
        otherwise: Option<Vec<Stmt>>,
    },
    While {
        cond: Expr,
        body: Vec<Stmt>,
    },
    Do(SubroutineCall),
    Return(Option<Expr>, Location),
}
