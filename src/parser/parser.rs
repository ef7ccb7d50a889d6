use log::trace;

use crate::analyzer::Ty;
use crate::error::{CompileError, CompileResult, Location, NestingTooDeepSnafu};
use crate::lexer::{Keyword, Lexer, Symbol, Token, TokenKind};

use super::{
    BinOpKind, Class, ClassVarDec, ClassVarKind, Expr, Identifier, KeywordConstant, Param, Stmt,
    SubroutineCall, SubroutineDec, SubroutineKind, Term, UnaryOpKind, VarDec,
};

/// Deepest combined nesting of statements and terms the parser accepts.
pub const MAX_NESTING: usize = 128;

/// Recursive-descent parser for one class. Pulls tokens from the lexer on
/// demand and keeps a single token of lookahead.
#[derive(Debug)]
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    peeked: Option<Token>,
    depth: usize,
}

impl<'a> Parser<'a> {
    pub fn new(lexer: Lexer<'a>) -> Self {
        Self {
            lexer,
            peeked: None,
            depth: 0,
        }
    }

    /// Parses exactly one class; anything after its closing brace is an error.
    pub fn parse(&mut self) -> CompileResult<Class> {
        let class = self.parse_class()?;
        self.fill()?;
        if let Some(t) = &self.peeked {
            return Err(self.unexpected("end of input", Some(t)));
        }
        Ok(class)
    }

    fn fill(&mut self) -> CompileResult<()> {
        if self.peeked.is_none() {
            self.peeked = self.lexer.next().transpose()?;
            if let Some(t) = &self.peeked {
                trace!("{}: {}", t.loc, t.kind);
            }
        }
        Ok(())
    }

    fn unexpected(&self, expected: impl Into<String>, found: Option<&Token>) -> CompileError {
        let (location, found) = match found {
            Some(t) => (t.loc, format!("`{}`", t.kind)),
            None => (self.lexer.location(), "end of input".to_string()),
        };
        CompileError::Syntax {
            location,
            expected: expected.into(),
            found,
        }
    }

    /// Runs `f` one nesting level deeper, failing past [`MAX_NESTING`].
    fn nested<T>(
        &mut self,
        loc: Location,
        f: impl FnOnce(&mut Self) -> CompileResult<T>,
    ) -> CompileResult<T> {
        if self.depth == MAX_NESTING {
            return NestingTooDeepSnafu {
                location: loc,
                limit: MAX_NESTING,
            }
            .fail();
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn bump(&mut self, expected: &str) -> CompileResult<Token> {
        self.fill()?;
        match self.peeked.take() {
            Some(t) => Ok(t),
            None => Err(self.unexpected(expected, None)),
        }
    }

    fn check(&mut self, kind: &TokenKind) -> CompileResult<bool> {
        self.fill()?;
        Ok(self.peeked.as_ref().is_some_and(|t| &t.kind == kind))
    }

    fn consume(&mut self, kind: &TokenKind) -> CompileResult<bool> {
        if !self.check(kind)? {
            return Ok(false);
        }
        self.peeked = None;
        Ok(true)
    }

    fn consume_symbol(&mut self, symbol: Symbol) -> CompileResult<bool> {
        self.consume(&TokenKind::Symbol(symbol))
    }

    fn consume_keyword(&mut self, keyword: Keyword) -> CompileResult<bool> {
        self.consume(&TokenKind::Keyword(keyword))
    }

    fn expect(&mut self, kind: TokenKind) -> CompileResult<Token> {
        let expected = format!("`{}`", kind);
        let t = self.bump(&expected)?;
        if t.kind != kind {
            return Err(self.unexpected(expected, Some(&t)));
        }
        Ok(t)
    }

    fn expect_symbol(&mut self, symbol: Symbol) -> CompileResult<Token> {
        self.expect(TokenKind::Symbol(symbol))
    }

    fn expect_keyword(&mut self, keyword: Keyword) -> CompileResult<Token> {
        self.expect(TokenKind::Keyword(keyword))
    }

    fn expect_ident(&mut self, what: &str) -> CompileResult<Identifier> {
        let t = self.bump(what)?;
        match t.kind {
            TokenKind::Ident(name) => Ok(Identifier { name, loc: t.loc }),
            _ => Err(self.unexpected(what, Some(&t))),
        }
    }

    /// type = "int" | "char" | "boolean" | className
    fn parse_type(&mut self, allow_void: bool) -> CompileResult<Ty> {
        let expected = if allow_void { "type or `void`" } else { "type" };
        let t = self.bump(expected)?;
        match t.kind {
            TokenKind::Keyword(Keyword::Int) => Ok(Ty::Int),
            TokenKind::Keyword(Keyword::Char) => Ok(Ty::Char),
            TokenKind::Keyword(Keyword::Boolean) => Ok(Ty::Boolean),
            TokenKind::Keyword(Keyword::Void) if allow_void => Ok(Ty::Void),
            TokenKind::Ident(name) => Ok(Ty::Class(name)),
            _ => Err(self.unexpected(expected, Some(&t))),
        }
    }

    /// varName ("," varName)* ";"
    fn parse_names(&mut self) -> CompileResult<Vec<Identifier>> {
        let mut names = vec![self.expect_ident("variable name")?];
        while self.consume_symbol(Symbol::Comma)? {
            names.push(self.expect_ident("variable name")?);
        }
        self.expect_symbol(Symbol::SemiColon)?;
        Ok(names)
    }

    /// class = "class" className "{" classVarDec* subroutineDec* "}"
    fn parse_class(&mut self) -> CompileResult<Class> {
        self.expect_keyword(Keyword::Class)?;
        let name = self.expect_ident("class name")?;
        self.expect_symbol(Symbol::OpenCurlyBrace)?;

        let mut vars = vec![];
        while let Some(kind) = self.parse_class_var_kind()? {
            let ty = self.parse_type(false)?;
            let names = self.parse_names()?;
            vars.push(ClassVarDec { kind, ty, names });
        }

        let mut subroutines = vec![];
        while let Some(kind) = self.parse_subroutine_kind()? {
            subroutines.push(self.parse_subroutine(kind)?);
        }

        self.expect_symbol(Symbol::CloseCurlyBrace)?;
        Ok(Class {
            name,
            vars,
            subroutines,
        })
    }

    fn parse_class_var_kind(&mut self) -> CompileResult<Option<ClassVarKind>> {
        if self.consume_keyword(Keyword::Static)? {
            Ok(Some(ClassVarKind::Static))
        } else if self.consume_keyword(Keyword::Field)? {
            Ok(Some(ClassVarKind::Field))
        } else {
            Ok(None)
        }
    }

    fn parse_subroutine_kind(&mut self) -> CompileResult<Option<SubroutineKind>> {
        if self.consume_keyword(Keyword::Constructor)? {
            Ok(Some(SubroutineKind::Constructor))
        } else if self.consume_keyword(Keyword::Function)? {
            Ok(Some(SubroutineKind::Function))
        } else if self.consume_keyword(Keyword::Method)? {
            Ok(Some(SubroutineKind::Method))
        } else {
            Ok(None)
        }
    }

    /// subroutineDec = kind ("void" | type) name "(" parameterList ")"
    ///                 "{" varDec* statement* "}"
    fn parse_subroutine(&mut self, kind: SubroutineKind) -> CompileResult<SubroutineDec> {
        let return_ty = self.parse_type(true)?;
        let name = self.expect_ident("subroutine name")?;

        self.expect_symbol(Symbol::OpenParen)?;
        let params = self.parse_params()?;
        self.expect_symbol(Symbol::CloseParen)?;

        self.expect_symbol(Symbol::OpenCurlyBrace)?;
        let mut locals = vec![];
        while self.consume_keyword(Keyword::Var)? {
            let ty = self.parse_type(false)?;
            let names = self.parse_names()?;
            locals.push(VarDec { ty, names });
        }
        let body = self.parse_stmts()?;

        Ok(SubroutineDec {
            kind,
            return_ty,
            name,
            params,
            locals,
            body,
        })
    }

    /// parameterList = (type varName ("," type varName)*)?
    fn parse_params(&mut self) -> CompileResult<Vec<Param>> {
        let mut params = vec![];
        if self.check(&TokenKind::Symbol(Symbol::CloseParen))? {
            return Ok(params);
        }
        loop {
            let ty = self.parse_type(false)?;
            let name = self.expect_ident("parameter name")?;
            params.push(Param { ty, name });
            if !self.consume_symbol(Symbol::Comma)? {
                return Ok(params);
            }
        }
    }

    /// statement* "}"
    fn parse_stmts(&mut self) -> CompileResult<Vec<Stmt>> {
        let mut stmts = vec![];
        while !self.consume_symbol(Symbol::CloseCurlyBrace)? {
            stmts.push(self.parse_stmt()?);
        }
        Ok(stmts)
    }

    fn parse_block(&mut self) -> CompileResult<Vec<Stmt>> {
        self.expect_symbol(Symbol::OpenCurlyBrace)?;
        self.parse_stmts()
    }

    fn parse_paren_expr(&mut self) -> CompileResult<Expr> {
        self.expect_symbol(Symbol::OpenParen)?;
        let expr = self.parse_expr()?;
        self.expect_symbol(Symbol::CloseParen)?;
        Ok(expr)
    }

    /// stmt = "let" varName ("[" expr "]")? "=" expr ";"
    ///      | "if" "(" expr ")" "{" stmt* "}" ("else" "{" stmt* "}")?
    ///      | "while" "(" expr ")" "{" stmt* "}"
    ///      | "do" subroutineCall ";"
    ///      | "return" expr? ";"
    fn parse_stmt(&mut self) -> CompileResult<Stmt> {
        let t = self.bump("statement")?;
        self.nested(t.loc, |p| p.parse_stmt_from(t))
    }

    fn parse_stmt_from(&mut self, t: Token) -> CompileResult<Stmt> {
        let stmt = match t.kind {
            TokenKind::Keyword(Keyword::Let) => {
                let target = self.expect_ident("variable name")?;
                let index = if self.consume_symbol(Symbol::OpenSquareBrace)? {
                    let index = self.parse_expr()?;
                    self.expect_symbol(Symbol::CloseSquareBrace)?;
                    Some(index)
                } else {
                    None
                };
                self.expect_symbol(Symbol::Equal)?;
                let value = self.parse_expr()?;
                self.expect_symbol(Symbol::SemiColon)?;
                Stmt::Let {
                    target,
                    index,
                    value,
                }
            }
            TokenKind::Keyword(Keyword::If) => {
                let cond = self.parse_paren_expr()?;
                let then = self.parse_block()?;
                let otherwise = if self.consume_keyword(Keyword::Else)? {
                    Some(self.parse_block()?)
                } else {
                    None
                };
                Stmt::If {
                    cond,
                    then,
                    otherwise,
                }
            }
            TokenKind::Keyword(Keyword::While) => {
                let cond = self.parse_paren_expr()?;
                let body = self.parse_block()?;
                Stmt::While { cond, body }
            }
            TokenKind::Keyword(Keyword::Do) => {
                let first = self.expect_ident("subroutine call")?;
                let call = self.parse_call(first)?;
                self.expect_symbol(Symbol::SemiColon)?;
                Stmt::Do(call)
            }
            TokenKind::Keyword(Keyword::Return) => {
                let value = if self.consume_symbol(Symbol::SemiColon)? {
                    None
                } else {
                    let value = self.parse_expr()?;
                    self.expect_symbol(Symbol::SemiColon)?;
                    Some(value)
                };
                Stmt::Return(value, t.loc)
            }
            _ => return Err(self.unexpected("statement", Some(&t))),
        };
        Ok(stmt)
    }

    fn parse_bin_op(&mut self) -> CompileResult<Option<BinOpKind>> {
        self.fill()?;
        let kind = match self.peeked.as_ref().map(|t| &t.kind) {
            Some(TokenKind::Symbol(Symbol::Plus)) => BinOpKind::Add,
            Some(TokenKind::Symbol(Symbol::Minus)) => BinOpKind::Sub,
            Some(TokenKind::Symbol(Symbol::Star)) => BinOpKind::Mul,
            Some(TokenKind::Symbol(Symbol::Slash)) => BinOpKind::Div,
            Some(TokenKind::Symbol(Symbol::Ampersand)) => BinOpKind::BitwiseAnd,
            Some(TokenKind::Symbol(Symbol::Pipe)) => BinOpKind::BitwiseOr,
            Some(TokenKind::Symbol(Symbol::LessThan)) => BinOpKind::LessThan,
            Some(TokenKind::Symbol(Symbol::GreaterThan)) => BinOpKind::GreaterThan,
            Some(TokenKind::Symbol(Symbol::Equal)) => BinOpKind::Equal,
            _ => return Ok(None),
        };
        self.peeked = None;
        Ok(Some(kind))
    }

    /// expr = term (op term)*
    ///
    /// There is no precedence: `1 + 2 * 3` is `(1 + 2) * 3`.
    pub fn parse_expr(&mut self) -> CompileResult<Expr> {
        let term = self.parse_term()?;
        let mut ops = vec![];
        while let Some(kind) = self.parse_bin_op()? {
            ops.push((kind, self.parse_term()?));
        }
        Ok(Expr { term, ops })
    }

    /// term = intConst | stringConst | keywordConst
    ///      | varName | varName "[" expr "]" | subroutineCall
    ///      | "(" expr ")" | ("-" | "~") term
    fn parse_term(&mut self) -> CompileResult<Term> {
        let t = self.bump("term")?;
        self.nested(t.loc, |p| p.parse_term_from(t))
    }

    fn parse_term_from(&mut self, t: Token) -> CompileResult<Term> {
        let term = match t.kind {
            TokenKind::IntConst(value) => Term::IntConst(value),
            TokenKind::StringConst(s) => Term::StringConst(s, t.loc),
            TokenKind::Keyword(Keyword::True) => Term::Keyword(KeywordConstant::True, t.loc),
            TokenKind::Keyword(Keyword::False) => Term::Keyword(KeywordConstant::False, t.loc),
            TokenKind::Keyword(Keyword::Null) => Term::Keyword(KeywordConstant::Null, t.loc),
            TokenKind::Keyword(Keyword::This) => Term::Keyword(KeywordConstant::This, t.loc),
            TokenKind::Symbol(Symbol::OpenParen) => {
                let expr = self.parse_expr()?;
                self.expect_symbol(Symbol::CloseParen)?;
                Term::Expr(Box::new(expr))
            }
            TokenKind::Symbol(Symbol::Minus) => {
                Term::Unary(UnaryOpKind::Neg, Box::new(self.parse_term()?))
            }
            TokenKind::Symbol(Symbol::Tilde) => {
                Term::Unary(UnaryOpKind::BitwiseNot, Box::new(self.parse_term()?))
            }
            TokenKind::Ident(name) => self.parse_ident(Identifier { name, loc: t.loc })?,
            _ => return Err(self.unexpected("term", Some(&t))),
        };
        Ok(term)
    }

    fn parse_ident(&mut self, ident: Identifier) -> CompileResult<Term> {
        if self.consume_symbol(Symbol::OpenSquareBrace)? {
            let index = self.parse_expr()?;
            self.expect_symbol(Symbol::CloseSquareBrace)?;
            Ok(Term::Index(ident, Box::new(index)))
        } else if self.check(&TokenKind::Symbol(Symbol::OpenParen))?
            || self.check(&TokenKind::Symbol(Symbol::Dot))?
        {
            Ok(Term::Call(self.parse_call(ident)?))
        } else {
            Ok(Term::Var(ident))
        }
    }

    /// subroutineCall = name "(" exprList ")"
    ///                | (className | varName) "." name "(" exprList ")"
    fn parse_call(&mut self, first: Identifier) -> CompileResult<SubroutineCall> {
        let (receiver, name) = if self.consume_symbol(Symbol::Dot)? {
            (Some(first), self.expect_ident("subroutine name")?)
        } else {
            (None, first)
        };

        self.expect_symbol(Symbol::OpenParen)?;
        let mut args = vec![];
        if !self.consume_symbol(Symbol::CloseParen)? {
            args.push(self.parse_expr()?);
            while self.consume_symbol(Symbol::Comma)? {
                args.push(self.parse_expr()?);
            }
            self.expect_symbol(Symbol::CloseParen)?;
        }

        Ok(SubroutineCall {
            receiver,
            name,
            args,
        })
    }
}
