use std::fmt;

/// Declared type of a variable or the return type of a subroutine.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Ty {
    Int,
    Char,
    Boolean,
    /// Only valid in return position.
    Void,
    Class(String),
}

impl Ty {
    /// Class name used to qualify calls made through a variable of this type.
    pub fn class_name(&self) -> Option<&str> {
        match self {
            Ty::Class(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ty::Int => f.write_str("int"),
            Ty::Char => f.write_str("char"),
            Ty::Boolean => f.write_str("boolean"),
            Ty::Void => f.write_str("void"),
            Ty::Class(name) => f.write_str(name),
        }
    }
}
