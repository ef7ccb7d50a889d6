use std::collections::HashMap;
use std::fmt;

use snafu::Snafu;

use crate::lexer::MAX_INT_CONST;

use super::Ty;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    Static,
    Field,
    Argument,
    Local,
}

impl Kind {
    fn is_class_level(&self) -> bool {
        matches!(self, Kind::Static | Kind::Field)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Kind::Static => "static",
            Kind::Field => "field",
            Kind::Argument => "argument",
            Kind::Local => "local",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub ty: Ty,
    pub kind: Kind,
    pub index: u16,
}

#[derive(Debug, Snafu, PartialEq, Eq)]
#[snafu(visibility(pub(crate)))]
pub enum SymbolError {
    #[snafu(display("{kind} `{name}` is already declared in this scope"))]
    Duplicate { name: String, kind: Kind },

    #[snafu(display("subroutine `{name}` is already declared in this class"))]
    DuplicateSubroutine { name: String },

    #[snafu(display("`{name}` is not declared"))]
    Undeclared { name: String },

    #[snafu(display("more than 32767 {kind} variables"))]
    TooMany { kind: Kind },
}

/// One level of scope: declared names plus a running index per kind.
#[derive(Clone, Debug, Default)]
struct Scope {
    symbols: HashMap<String, Symbol>,
    counts: HashMap<Kind, u16>,
}

impl Scope {
    fn define(&mut self, name: &str, ty: Ty, kind: Kind) -> Result<&Symbol, SymbolError> {
        if self.symbols.contains_key(name) {
            return DuplicateSnafu { name, kind }.fail();
        }
        let count = self.counts.entry(kind).or_insert(0);
        if *count == MAX_INT_CONST {
            return TooManySnafu { kind }.fail();
        }
        let symbol = Symbol {
            name: name.to_string(),
            ty,
            kind,
            index: *count,
        };
        *count += 1;
        Ok(&*self.symbols.entry(name.to_string()).or_insert(symbol))
    }

    fn count(&self, kind: Kind) -> u16 {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    fn clear(&mut self) {
        self.symbols.clear();
        self.counts.clear();
    }
}

/// Class scope (statics and fields) plus the scope of the subroutine being
/// compiled (arguments and locals). Lookups try the subroutine scope first.
#[derive(Clone, Debug, Default)]
pub struct SymbolTable {
    class: Scope,
    subroutine: Scope,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every argument and local; class members are kept.
    pub fn start_subroutine(&mut self) {
        self.subroutine.clear();
    }

    pub fn define(&mut self, name: &str, ty: Ty, kind: Kind) -> Result<&Symbol, SymbolError> {
        if kind.is_class_level() {
            self.class.define(name, ty, kind)
        } else {
            self.subroutine.define(name, ty, kind)
        }
    }

    pub fn lookup(&self, name: &str) -> Result<&Symbol, SymbolError> {
        self.subroutine
            .symbols
            .get(name)
            .or_else(|| self.class.symbols.get(name))
            .ok_or_else(|| UndeclaredSnafu { name }.build())
    }

    pub fn is_declared(&self, name: &str) -> bool {
        self.lookup(name).is_ok()
    }

    pub fn kind_of(&self, name: &str) -> Result<Kind, SymbolError> {
        self.lookup(name).map(|s| s.kind)
    }

    pub fn type_of(&self, name: &str) -> Result<&Ty, SymbolError> {
        self.lookup(name).map(|s| &s.ty)
    }

    pub fn index_of(&self, name: &str) -> Result<u16, SymbolError> {
        self.lookup(name).map(|s| s.index)
    }

    pub fn var_count(&self, kind: Kind) -> u16 {
        if kind.is_class_level() {
            self.class.count(kind)
        } else {
            self.subroutine.count(kind)
        }
    }
}
