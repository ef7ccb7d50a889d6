use log::debug;

use crate::{
    analyzer::{Kind, SemanticVisitor},
    error::{CompileError, CompileResult, Location},
    lexer::MAX_INT_CONST,
    parser::{
        BinOpKind, Class, Expr, Identifier, KeywordConstant, Stmt, SubroutineCall, SubroutineDec,
        SubroutineKind, Term, UnaryOpKind,
    },
};

use super::{ArithmeticOp, Instruction, Segment};

/// Translates one parsed class into VM instructions.
pub struct Codegen<'a> {
    class: &'a Class,
    visitor: SemanticVisitor,
    instructions: Vec<Instruction>,
    label_index: usize,
    current: SubroutineKind,
}

fn segment_of(kind: Kind) -> Segment {
    match kind {
        Kind::Static => Segment::Static,
        Kind::Field => Segment::This,
        Kind::Argument => Segment::Argument,
        Kind::Local => Segment::Local,
    }
}

fn constant(value: usize, loc: Location, what: &str) -> CompileResult<u16> {
    u16::try_from(value)
        .ok()
        .filter(|v| *v <= MAX_INT_CONST)
        .ok_or_else(|| {
            CompileError::semantic(
                loc,
                format!("{} {} does not fit in a 15-bit constant", what, value),
            )
        })
}

fn is_this(expr: &Expr) -> bool {
    expr.ops.is_empty() && matches!(expr.term, Term::Keyword(KeywordConstant::This, _))
}

impl<'a> Codegen<'a> {
    pub fn new(class: &'a Class) -> CompileResult<Self> {
        Ok(Self {
            class,
            visitor: SemanticVisitor::new(class)?,
            instructions: vec![],
            label_index: 0,
            current: SubroutineKind::Function,
        })
    }

    pub fn generate(mut self) -> CompileResult<Vec<Instruction>> {
        let class = self.class;
        for sub in &class.subroutines {
            self.gen_subroutine(sub)?;
        }
        Ok(self.instructions)
    }

    fn emit(&mut self, instruction: Instruction) {
        self.instructions.push(instruction);
    }

    fn push(&mut self, segment: Segment, index: u16) {
        self.emit(Instruction::Push(segment, index));
    }

    fn pop(&mut self, segment: Segment, index: u16) {
        self.emit(Instruction::Pop(segment, index));
    }

    fn op(&mut self, op: ArithmeticOp) {
        self.emit(Instruction::Arithmetic(op));
    }

    fn call(&mut self, name: impl Into<String>, n_args: u16) {
        self.emit(Instruction::Call(name.into(), n_args));
    }

    fn new_label(&mut self, prefix: &str) -> String {
        let s = format!("{}{}", prefix, self.label_index);
        self.label_index += 1;
        s
    }

    fn stack_delta_since(&self, start: usize) -> i32 {
        self.instructions[start..]
            .iter()
            .map(Instruction::stack_delta)
            .sum()
    }

    /// Segment and offset of a declared variable.
    fn var_location(&self, ident: &Identifier) -> CompileResult<(Segment, u16)> {
        let symbol = self.visitor.resolve(ident)?;
        Ok((segment_of(symbol.kind), symbol.index))
    }

    fn gen_subroutine(&mut self, sub: &SubroutineDec) -> CompileResult<()> {
        self.visitor.visit_subroutine(sub)?;
        self.current = sub.kind;
        self.label_index = 0;

        let start = self.instructions.len();
        let symbol_table = self.visitor.symbol_table();
        let n_locals = symbol_table.var_count(Kind::Local);
        let n_fields = symbol_table.var_count(Kind::Field);
        let name = format!("{}.{}", self.visitor.class_name(), sub.name.name);
        self.emit(Instruction::Function(name.clone(), n_locals));

        match sub.kind {
            SubroutineKind::Constructor => {
                self.push(Segment::Constant, n_fields);
                self.call("Memory.alloc", 1);
                self.pop(Segment::Pointer, 0);
            }
            SubroutineKind::Method => {
                self.push(Segment::Argument, 0);
                self.pop(Segment::Pointer, 0);
            }
            SubroutineKind::Function => (),
        }

        for stmt in &sub.body {
            self.gen_stmt(stmt)?;
        }

        debug!(
            "{}: {} instruction(s)",
            name,
            self.instructions.len() - start
        );
        Ok(())
    }

    fn gen_stmts(&mut self, stmts: &[Stmt]) -> CompileResult<()> {
        stmts.iter().try_for_each(|s| self.gen_stmt(s))
    }

    fn gen_stmt(&mut self, stmt: &Stmt) -> CompileResult<()> {
        let start = self.instructions.len();
        match stmt {
            Stmt::Let {
                target,
                index: None,
                value,
            } => {
                let (segment, index) = self.var_location(target)?;
                self.gen_expr(value)?;
                self.pop(segment, index);
            }
            Stmt::Let {
                target,
                index: Some(offset),
                value,
            } => {
                let (segment, index) = self.var_location(target)?;
                self.push(segment, index);
                self.gen_expr(offset)?;
                self.op(ArithmeticOp::Add);
                // The value may itself index an array, so `that` is only
                // rebased once it has been computed.
                self.gen_expr(value)?;
                self.pop(Segment::Temp, 0);
                self.pop(Segment::Pointer, 1);
                self.push(Segment::Temp, 0);
                self.pop(Segment::That, 0);
            }
            Stmt::If {
                cond,
                then,
                otherwise,
            } => self.gen_if(cond, then, otherwise.as_deref())?,
            Stmt::While { cond, body } => self.gen_while(cond, body)?,
            Stmt::Do(call) => {
                self.gen_call(call)?;
                self.pop(Segment::Temp, 0);
            }
            Stmt::Return(value, _) => self.gen_return(value.as_ref())?,
        }
        debug_assert_eq!(
            self.stack_delta_since(start),
            0,
            "unbalanced statement: {:?}",
            stmt
        );
        Ok(())
    }

    fn gen_if(&mut self, cond: &Expr, then: &[Stmt], otherwise: Option<&[Stmt]>) -> CompileResult<()> {
        let else_label = self.new_label("IF_ELSE");
        let end_label = self.new_label("IF_END");

        self.gen_expr(cond)?;
        self.op(ArithmeticOp::Not);
        self.emit(Instruction::IfGoto(else_label.clone()));
        self.gen_stmts(then)?;
        self.emit(Instruction::Goto(end_label.clone()));
        self.emit(Instruction::Label(else_label));
        if let Some(stmts) = otherwise {
            self.gen_stmts(stmts)?;
        }
        self.emit(Instruction::Label(end_label));
        Ok(())
    }

    fn gen_while(&mut self, cond: &Expr, body: &[Stmt]) -> CompileResult<()> {
        let begin_label = self.new_label("WHILE_EXP");
        let end_label = self.new_label("WHILE_END");

        self.emit(Instruction::Label(begin_label.clone()));
        self.gen_expr(cond)?;
        self.op(ArithmeticOp::Not);
        self.emit(Instruction::IfGoto(end_label.clone()));
        self.gen_stmts(body)?;
        self.emit(Instruction::Goto(begin_label));
        self.emit(Instruction::Label(end_label));
        Ok(())
    }

    fn gen_return(&mut self, value: Option<&Expr>) -> CompileResult<()> {
        match (self.current, value) {
            // A constructor always hands back the object it allocated.
            (SubroutineKind::Constructor, Some(expr)) if !is_this(expr) => {
                self.gen_expr(expr)?;
                self.pop(Segment::Temp, 0);
                self.push(Segment::Pointer, 0);
            }
            (SubroutineKind::Constructor, _) => self.push(Segment::Pointer, 0),
            (_, Some(expr)) => self.gen_expr(expr)?,
            (_, None) => self.push(Segment::Constant, 0),
        }
        self.emit(Instruction::Return);
        Ok(())
    }

    fn gen_expr(&mut self, expr: &Expr) -> CompileResult<()> {
        self.gen_term(&expr.term)?;
        for (kind, term) in &expr.ops {
            self.gen_term(term)?;
            self.gen_bin_op(*kind);
        }
        Ok(())
    }

    fn gen_bin_op(&mut self, kind: BinOpKind) {
        match kind {
            BinOpKind::Add => self.op(ArithmeticOp::Add),
            BinOpKind::Sub => self.op(ArithmeticOp::Sub),
            BinOpKind::Mul => self.call("Math.multiply", 2),
            BinOpKind::Div => self.call("Math.divide", 2),
            BinOpKind::BitwiseAnd => self.op(ArithmeticOp::And),
            BinOpKind::BitwiseOr => self.op(ArithmeticOp::Or),
            BinOpKind::LessThan => self.op(ArithmeticOp::Lt),
            BinOpKind::GreaterThan => self.op(ArithmeticOp::Gt),
            BinOpKind::Equal => self.op(ArithmeticOp::Eq),
        }
    }

    fn gen_term(&mut self, term: &Term) -> CompileResult<()> {
        match term {
            Term::IntConst(value) => self.push(Segment::Constant, *value),
            Term::StringConst(s, loc) => self.gen_string(s, *loc)?,
            Term::Keyword(KeywordConstant::True, _) => {
                self.push(Segment::Constant, 0);
                self.op(ArithmeticOp::Not);
            }
            Term::Keyword(KeywordConstant::False | KeywordConstant::Null, _) => {
                self.push(Segment::Constant, 0)
            }
            Term::Keyword(KeywordConstant::This, _) => self.push(Segment::Pointer, 0),
            Term::Var(ident) => {
                let (segment, index) = self.var_location(ident)?;
                self.push(segment, index);
            }
            Term::Index(ident, offset) => {
                let (segment, index) = self.var_location(ident)?;
                self.push(segment, index);
                self.gen_expr(offset)?;
                self.op(ArithmeticOp::Add);
                self.pop(Segment::Pointer, 1);
                self.push(Segment::That, 0);
            }
            Term::Call(call) => self.gen_call(call)?,
            Term::Expr(expr) => self.gen_expr(expr)?,
            Term::Unary(kind, term) => {
                self.gen_term(term)?;
                match kind {
                    UnaryOpKind::Neg => self.op(ArithmeticOp::Neg),
                    UnaryOpKind::BitwiseNot => self.op(ArithmeticOp::Not),
                }
            }
        }
        Ok(())
    }

    fn gen_string(&mut self, s: &str, loc: Location) -> CompileResult<()> {
        let len = constant(s.chars().count(), loc, "string length")?;
        self.push(Segment::Constant, len);
        self.call("String.new", 1);
        for c in s.chars() {
            let code = constant(c as usize, loc, "character code")?;
            self.push(Segment::Constant, code);
            self.call("String.appendChar", 2);
        }
        Ok(())
    }

    fn gen_call(&mut self, call: &SubroutineCall) -> CompileResult<()> {
        let name = &call.name.name;
        let (target, receiver) = match &call.receiver {
            None => {
                let is_method = self
                    .visitor
                    .signatures()
                    .get(name)
                    .is_some_and(|s| s.kind == SubroutineKind::Method);
                let target = format!("{}.{}", self.visitor.class_name(), name);
                (target, is_method.then_some((Segment::Pointer, 0)))
            }
            Some(var) if self.visitor.symbol_table().is_declared(&var.name) => {
                let symbol = self.visitor.resolve(var)?;
                let class_name = symbol.ty.class_name().ok_or_else(|| {
                    CompileError::semantic(
                        var.loc,
                        format!("`{}` of type {} has no subroutines", var.name, symbol.ty),
                    )
                })?;
                let target = format!("{}.{}", class_name, name);
                (target, Some((segment_of(symbol.kind), symbol.index)))
            }
            Some(class_name) => (format!("{}.{}", class_name.name, name), None),
        };

        if let Some((segment, index)) = receiver {
            self.push(segment, index);
        }
        for arg in &call.args {
            self.gen_expr(arg)?;
        }
        let n_args = constant(
            call.args.len() + usize::from(receiver.is_some()),
            call.name.loc,
            "argument count",
        )?;
        self.call(target, n_args);
        Ok(())
    }
}
