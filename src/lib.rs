//! Compiler from Jack classes to stack-machine VM code.
//!
//! Each class is compiled on its own: the lexer feeds the parser one token at
//! a time, the parser builds a [`parser::Class`], and [`codegen::Codegen`]
//! walks it with a [`analyzer::SemanticVisitor`] that owns the class and
//! subroutine scopes.

pub mod analyzer;
pub mod codegen;
pub mod config;
pub mod driver;
pub mod error;
pub mod lexer;
pub mod parser;

use log::{debug, trace};

use codegen::{Codegen, Instruction};
use config::Options;
use lexer::Lexer;
use parser::{Class, Parser};

pub use error::{CompileError, CompileResult, Location};

/// One compiled translation unit.
#[derive(Clone, Debug, PartialEq)]
pub struct CompiledClass {
    pub name: String,
    pub instructions: Vec<Instruction>,
}

impl CompiledClass {
    pub fn render(&self, options: &Options) -> String {
        codegen::render(&self.instructions, options.segment_names)
    }
}

pub fn parse(source: &str) -> CompileResult<Class> {
    let mut parser = Parser::new(Lexer::new(source));
    let class = parser.parse()?;
    trace!("{:#?}", class);
    Ok(class)
}

pub fn compile_class(source: &str) -> CompileResult<CompiledClass> {
    let class = parse(source)?;
    debug!(
        "compiling class {} ({} subroutine(s))",
        class.name.name,
        class.subroutines.len()
    );
    let instructions = Codegen::new(&class)?.generate()?;
    Ok(CompiledClass {
        name: class.name.name,
        instructions,
    })
}

/// Compiles one class to VM text using the standard segment names.
pub fn compile(source: &str) -> CompileResult<String> {
    compile_with(source, &Options::default())
}

pub fn compile_with(source: &str, options: &Options) -> CompileResult<String> {
    Ok(compile_class(source)?.render(options))
}
