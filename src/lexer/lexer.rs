use crate::error::{CompileError, CompileResult, Location};

use super::{
    token::{KEYWORDS, MAX_INT_CONST, SYMBOLS},
    Token, TokenKind,
};

/// Lazy tokenizer over one source unit.
///
/// Yields tokens on demand and stops after the first error. Cloning a lexer
/// restarts the sequence from the clone's position.
#[derive(Clone, Debug)]
pub struct Lexer<'a> {
    rest: &'a str,
    line: usize,
    column: usize,
    failed: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            rest: source,
            line: 1,
            column: 1,
            failed: false,
        }
    }

    /// Collects the whole token sequence, failing on the first bad token.
    pub fn tokenize(source: &str) -> CompileResult<Vec<Token>> {
        Lexer::new(source).collect()
    }

    pub fn location(&self) -> Location {
        Location::new(self.line, self.column)
    }

    fn peek(&self) -> Option<char> {
        self.rest.chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.rest.chars().nth(1)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.rest = &self.rest[c.len_utf8()..];
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.rest;
        let mut len = 0;
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            len += c.len_utf8();
            self.bump();
        }
        &start[..len]
    }

    fn skip_trivia(&mut self) -> CompileResult<()> {
        loop {
            match (self.peek(), self.peek_second()) {
                (Some(c), _) if c.is_whitespace() => {
                    self.bump();
                }
                (Some('/'), Some('/')) => {
                    self.take_while(|c| c != '\n');
                }
                (Some('/'), Some('*')) => {
                    let start = self.location();
                    self.bump();
                    self.bump();
                    loop {
                        match self.bump() {
                            Some('*') if self.peek() == Some('/') => {
                                self.bump();
                                break;
                            }
                            Some(_) => (),
                            None => {
                                return Err(CompileError::lexical(
                                    start,
                                    "unterminated block comment",
                                ))
                            }
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn lex_number(&mut self, loc: Location) -> CompileResult<Token> {
        let digits = self.take_while(|c| c.is_ascii_digit());
        let value = digits
            .parse::<u32>()
            .ok()
            .filter(|v| *v <= MAX_INT_CONST as u32)
            .ok_or_else(|| {
                CompileError::lexical(
                    loc,
                    format!(
                        "integer constant {} is out of range (0..={})",
                        digits, MAX_INT_CONST
                    ),
                )
            })?;
        Ok(Token {
            kind: TokenKind::IntConst(value as u16),
            loc,
        })
    }

    fn lex_string(&mut self, loc: Location) -> CompileResult<Token> {
        self.bump();
        let s = self.take_while(|c| c != '"' && c != '\n');
        if self.bump() != Some('"') {
            return Err(CompileError::lexical(loc, "unterminated string constant"));
        }
        Ok(Token {
            kind: TokenKind::StringConst(s.to_string()),
            loc,
        })
    }

    fn lex_word(&mut self, loc: Location) -> Token {
        let word = self.take_while(|c| c.is_ascii_alphanumeric() || c == '_');
        let kind = match KEYWORDS.get(word) {
            Some(keyword) => TokenKind::Keyword(*keyword),
            None => TokenKind::Ident(word.to_string()),
        };
        Token { kind, loc }
    }

    fn next_token(&mut self) -> CompileResult<Option<Token>> {
        self.skip_trivia()?;

        let loc = self.location();
        let Some(c) = self.peek() else {
            return Ok(None);
        };

        let token = if c.is_ascii_digit() {
            self.lex_number(loc)?
        } else if c == '"' {
            self.lex_string(loc)?
        } else if c.is_ascii_alphabetic() || c == '_' {
            self.lex_word(loc)
        } else if let Some(symbol) = SYMBOLS.get(&c) {
            self.bump();
            Token {
                kind: TokenKind::Symbol(*symbol),
                loc,
            }
        } else {
            return Err(CompileError::lexical(
                loc,
                format!("unexpected character {:?}", c),
            ));
        };
        Ok(Some(token))
    }
}

impl Iterator for Lexer<'_> {
    type Item = CompileResult<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.next_token() {
            Ok(token) => token.map(Ok),
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}
