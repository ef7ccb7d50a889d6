//! Errors shared by every stage of the pipeline.
//!
//! The first error aborts the class being compiled, so each variant carries
//! the location of the construct that failed and nothing more.

use std::fmt;

use snafu::Snafu;

use crate::analyzer::SymbolError;

pub type CompileResult<T> = Result<T, CompileError>;

/// 1-based position in the source text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl Location {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CompileError {
    #[snafu(display("{location}: lexical error: {message}"))]
    Lexical { location: Location, message: String },

    #[snafu(display("{location}: syntax error: expected {expected}, found {found}"))]
    Syntax {
        location: Location,
        expected: String,
        found: String,
    },

    #[snafu(display("{location}: {source}"))]
    Symbol {
        location: Location,
        source: SymbolError,
    },

    #[snafu(display("{location}: semantic error: {message}"))]
    Semantic { location: Location, message: String },

    #[snafu(display("{location}: syntax error: nesting deeper than {limit} levels"))]
    NestingTooDeep { location: Location, limit: usize },
}

impl CompileError {
    pub fn location(&self) -> Location {
        match self {
            CompileError::Lexical { location, .. }
            | CompileError::Syntax { location, .. }
            | CompileError::Symbol { location, .. }
            | CompileError::Semantic { location, .. }
            | CompileError::NestingTooDeep { location, .. } => *location,
        }
    }

    pub(crate) fn lexical(location: Location, message: impl Into<String>) -> Self {
        CompileError::Lexical {
            location,
            message: message.into(),
        }
    }

    pub(crate) fn semantic(location: Location, message: impl Into<String>) -> Self {
        CompileError::Semantic {
            location,
            message: message.into(),
        }
    }
}
