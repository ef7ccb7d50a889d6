use std::fmt;

use crate::config::SegmentNames;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Segment {
    Constant,
    Argument,
    Local,
    Static,
    This,
    That,
    Pointer,
    Temp,
}

impl Segment {
    pub fn name(self, names: SegmentNames) -> &'static str {
        match (self, names) {
            (Segment::Constant, SegmentNames::Standard) => "constant",
            (Segment::Constant, SegmentNames::Short) => "const",
            (Segment::Argument, SegmentNames::Standard) => "argument",
            (Segment::Argument, SegmentNames::Short) => "arg",
            (Segment::Local, _) => "local",
            (Segment::Static, _) => "static",
            (Segment::This, _) => "this",
            (Segment::That, _) => "that",
            (Segment::Pointer, _) => "pointer",
            (Segment::Temp, _) => "temp",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArithmeticOp {
    Add,
    Sub,
    Neg,
    Eq,
    Gt,
    Lt,
    And,
    Or,
    Not,
}

impl ArithmeticOp {
    pub fn mnemonic(self) -> &'static str {
        match self {
            ArithmeticOp::Add => "add",
            ArithmeticOp::Sub => "sub",
            ArithmeticOp::Neg => "neg",
            ArithmeticOp::Eq => "eq",
            ArithmeticOp::Gt => "gt",
            ArithmeticOp::Lt => "lt",
            ArithmeticOp::And => "and",
            ArithmeticOp::Or => "or",
            ArithmeticOp::Not => "not",
        }
    }

    fn is_unary(self) -> bool {
        matches!(self, ArithmeticOp::Neg | ArithmeticOp::Not)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Instruction {
    Push(Segment, u16),
    Pop(Segment, u16),
    Arithmetic(ArithmeticOp),
    Label(String),
    Goto(String),
    IfGoto(String),
    Call(String, u16),
    Function(String, u16),
    Return,
}

impl Instruction {
    /// Net change in operand-stack depth once the instruction has executed.
    /// A call consumes its arguments and leaves the return value; `return`
    /// takes the value it hands back to the caller.
    pub fn stack_delta(&self) -> i32 {
        match self {
            Instruction::Push(..) => 1,
            Instruction::Pop(..) | Instruction::IfGoto(_) | Instruction::Return => -1,
            Instruction::Arithmetic(op) if op.is_unary() => 0,
            Instruction::Arithmetic(_) => -1,
            Instruction::Call(_, n_args) => 1 - i32::from(*n_args),
            Instruction::Label(_) | Instruction::Goto(_) | Instruction::Function(..) => 0,
        }
    }

    pub fn display(&self, names: SegmentNames) -> impl fmt::Display + '_ {
        Rendered(self, names)
    }
}

struct Rendered<'a>(&'a Instruction, SegmentNames);

impl fmt::Display for Rendered<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = self.1;
        match self.0 {
            Instruction::Push(segment, index) => write!(f, "push {} {}", segment.name(names), index),
            Instruction::Pop(segment, index) => write!(f, "pop {} {}", segment.name(names), index),
            Instruction::Arithmetic(op) => f.write_str(op.mnemonic()),
            Instruction::Label(label) => write!(f, "label {}", label),
            Instruction::Goto(label) => write!(f, "goto {}", label),
            Instruction::IfGoto(label) => write!(f, "if-goto {}", label),
            Instruction::Call(name, n_args) => write!(f, "call {} {}", name, n_args),
            Instruction::Function(name, n_locals) => write!(f, "function {} {}", name, n_locals),
            Instruction::Return => f.write_str("return"),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display(SegmentNames::Standard))
    }
}

/// Renders a compiled unit, one instruction per line.
pub fn render(instructions: &[Instruction], names: SegmentNames) -> String {
    let mut out = String::new();
    for instruction in instructions {
        out.push_str(&instruction.display(names).to_string());
        out.push('\n');
    }
    out
}
