mod semantic_visitor;
mod signatures;
mod symbol_table;
mod ty;

pub use semantic_visitor::*;
pub use signatures::*;
pub use symbol_table::*;
pub use ty::*;
