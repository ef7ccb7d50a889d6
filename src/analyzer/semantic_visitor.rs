use log::debug;
use snafu::ResultExt;

use crate::error::{CompileError, CompileResult, SymbolSnafu};
use crate::lexer::MAX_INT_CONST;
use crate::parser::{
    Class, ClassVarKind, Expr, Identifier, KeywordConstant, Stmt, SubroutineCall, SubroutineDec,
    SubroutineKind, Term,
};

use super::{Kind, Signature, Signatures, Symbol, SymbolError, SymbolTable, Ty};

/// Owns the symbol table of one class and checks each subroutine against it
/// before any code for that subroutine is emitted.
#[derive(Debug)]
pub struct SemanticVisitor {
    class_name: String,
    symbol_table: SymbolTable,
    signatures: Signatures,
    current: SubroutineKind,
}

impl SemanticVisitor {
    /// Declares the class's statics, fields and subroutines.
    pub fn new(class: &Class) -> CompileResult<Self> {
        let mut symbol_table = SymbolTable::new();
        for dec in &class.vars {
            let kind = match dec.kind {
                ClassVarKind::Static => Kind::Static,
                ClassVarKind::Field => Kind::Field,
            };
            for name in &dec.names {
                symbol_table
                    .define(&name.name, dec.ty.clone(), kind)
                    .context(SymbolSnafu { location: name.loc })?;
            }
        }

        Ok(Self {
            class_name: class.name.name.clone(),
            symbol_table,
            signatures: Signatures::from_class(class)?,
            current: SubroutineKind::Function,
        })
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn symbol_table(&self) -> &SymbolTable {
        &self.symbol_table
    }

    pub fn signatures(&self) -> &Signatures {
        &self.signatures
    }

    /// Opens a fresh subroutine scope, declares its arguments and locals,
    /// then validates every name and call in the body.
    pub fn visit_subroutine(&mut self, sub: &SubroutineDec) -> CompileResult<()> {
        self.current = sub.kind;
        self.symbol_table.start_subroutine();

        if sub.kind == SubroutineKind::Method {
            self.symbol_table
                .define("this", Ty::Class(self.class_name.clone()), Kind::Argument)
                .context(SymbolSnafu {
                    location: sub.name.loc,
                })?;
        }
        for param in &sub.params {
            self.symbol_table
                .define(&param.name.name, param.ty.clone(), Kind::Argument)
                .context(SymbolSnafu {
                    location: param.name.loc,
                })?;
        }
        for dec in &sub.locals {
            for name in &dec.names {
                self.symbol_table
                    .define(&name.name, dec.ty.clone(), Kind::Local)
                    .context(SymbolSnafu { location: name.loc })?;
            }
        }
        debug!(
            "{}.{}: {} argument(s), {} local(s)",
            self.class_name,
            sub.name.name,
            self.symbol_table.var_count(Kind::Argument),
            self.symbol_table.var_count(Kind::Local)
        );

        self.visit_stmts(&sub.body)
    }

    /// Resolves a variable reference, rejecting fields where no receiver exists.
    pub fn resolve(&self, ident: &Identifier) -> CompileResult<&Symbol> {
        let symbol = self
            .symbol_table
            .lookup(&ident.name)
            .context(SymbolSnafu {
                location: ident.loc,
            })?;
        if symbol.kind == Kind::Field && self.current == SubroutineKind::Function {
            return Err(CompileError::semantic(
                ident.loc,
                format!("field `{}` used inside a function", ident.name),
            ));
        }
        Ok(symbol)
    }

    fn visit_stmts(&self, stmts: &[Stmt]) -> CompileResult<()> {
        stmts.iter().try_for_each(|s| self.visit_stmt(s))
    }

    fn visit_stmt(&self, stmt: &Stmt) -> CompileResult<()> {
        match stmt {
            Stmt::Let {
                target,
                index,
                value,
            } => {
                self.resolve(target)?;
                if let Some(index) = index {
                    self.visit_expr(index)?;
                }
                self.visit_expr(value)
            }
            Stmt::If {
                cond,
                then,
                otherwise,
            } => {
                self.visit_expr(cond)?;
                self.visit_stmts(then)?;
                match otherwise {
                    Some(stmts) => self.visit_stmts(stmts),
                    None => Ok(()),
                }
            }
            Stmt::While { cond, body } => {
                self.visit_expr(cond)?;
                self.visit_stmts(body)
            }
            Stmt::Do(call) => self.visit_call(call),
            Stmt::Return(Some(expr), _) => self.visit_expr(expr),
            Stmt::Return(None, _) => Ok(()),
        }
    }

    fn visit_expr(&self, expr: &Expr) -> CompileResult<()> {
        expr.terms().try_for_each(|t| self.visit_term(t))
    }

    fn visit_term(&self, term: &Term) -> CompileResult<()> {
        match term {
            Term::IntConst(_) => Ok(()),
            Term::StringConst(s, loc) => match s.chars().find(|c| *c as u32 > MAX_INT_CONST as u32) {
                Some(c) => Err(CompileError::semantic(
                    *loc,
                    format!("character {:?} has no 15-bit character code", c),
                )),
                None => Ok(()),
            },
            Term::Keyword(KeywordConstant::This, loc)
                if self.current == SubroutineKind::Function =>
            {
                Err(CompileError::semantic(*loc, "`this` used inside a function"))
            }
            Term::Keyword(..) => Ok(()),
            Term::Var(ident) => self.resolve(ident).map(|_| ()),
            Term::Index(ident, index) => {
                self.resolve(ident)?;
                self.visit_expr(index)
            }
            Term::Call(call) => self.visit_call(call),
            Term::Expr(expr) => self.visit_expr(expr),
            Term::Unary(_, term) => self.visit_term(term),
        }
    }

    fn visit_call(&self, call: &SubroutineCall) -> CompileResult<()> {
        for arg in &call.args {
            self.visit_expr(arg)?;
        }

        let name = &call.name;
        match &call.receiver {
            None => {
                let signature = self.local_signature(name)?;
                if signature.kind == SubroutineKind::Method
                    && self.current == SubroutineKind::Function
                {
                    return Err(CompileError::semantic(
                        name.loc,
                        format!("method `{}` called from a function without a receiver", name.name),
                    ));
                }
                check_arity(call, signature)
            }
            Some(receiver) if self.symbol_table.is_declared(&receiver.name) => {
                let symbol = self.resolve(receiver)?;
                let Some(class_name) = symbol.ty.class_name() else {
                    return Err(CompileError::semantic(
                        receiver.loc,
                        format!(
                            "cannot call `{}` on `{}` of type {}",
                            name.name, receiver.name, symbol.ty
                        ),
                    ));
                };
                if class_name != self.class_name {
                    return Ok(());
                }
                let signature = self.local_signature(name)?;
                if signature.kind != SubroutineKind::Method {
                    return Err(CompileError::semantic(
                        name.loc,
                        format!("`{}` is not a method", name.name),
                    ));
                }
                check_arity(call, signature)
            }
            Some(receiver) if receiver.name == self.class_name => {
                let signature = self.local_signature(name)?;
                if signature.kind == SubroutineKind::Method {
                    return Err(CompileError::semantic(
                        name.loc,
                        format!("method `{}` called without a receiver", name.name),
                    ));
                }
                check_arity(call, signature)
            }
            // Other classes are compiled separately and cannot be checked here.
            Some(_) => Ok(()),
        }
    }

    fn local_signature(&self, name: &Identifier) -> CompileResult<&Signature> {
        self.signatures.get(&name.name).ok_or_else(|| CompileError::Symbol {
            location: name.loc,
            source: SymbolError::Undeclared {
                name: format!("{}.{}", self.class_name, name.name),
            },
        })
    }
}

fn check_arity(call: &SubroutineCall, signature: &Signature) -> CompileResult<()> {
    if call.args.len() == signature.arity {
        return Ok(());
    }
    Err(CompileError::semantic(
        call.name.loc,
        format!(
            "`{}` takes {} argument(s) but {} were supplied",
            call.name.name,
            signature.arity,
            call.args.len()
        ),
    ))
}
