mod lexer;
mod token;

pub use lexer::*;
pub use token::{Keyword, Symbol, Token, TokenKind, MAX_INT_CONST};
