use std::collections::HashMap;

use snafu::ResultExt;

use crate::error::{CompileResult, SymbolSnafu};
use crate::parser::{Class, SubroutineKind};

use super::symbol_table::DuplicateSubroutineSnafu;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Signature {
    pub kind: SubroutineKind,
    pub arity: usize,
}

/// Subroutines declared by the class being compiled.
#[derive(Clone, Debug, Default)]
pub struct Signatures(HashMap<String, Signature>);

impl Signatures {
    pub fn from_class(class: &Class) -> CompileResult<Self> {
        let mut table = HashMap::new();
        for sub in &class.subroutines {
            let signature = Signature {
                kind: sub.kind,
                arity: sub.params.len(),
            };
            if table.insert(sub.name.name.clone(), signature).is_some() {
                return DuplicateSubroutineSnafu {
                    name: sub.name.name.as_str(),
                }
                .fail()
                .context(SymbolSnafu {
                    location: sub.name.loc,
                });
            }
        }
        Ok(Self(table))
    }

    pub fn get(&self, name: &str) -> Option<&Signature> {
        self.0.get(name)
    }
}
