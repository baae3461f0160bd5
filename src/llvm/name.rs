// SPDX-License-Identifier: BSD-3-Clause
use std::fmt::Display;

use llvm_ir::{
    function::Parameter,
    module::{GlobalAlias, GlobalVariable},
    BasicBlock,
};

use crate::arc::UArc;

pub(crate) fn local_name(name: &llvm_ir::Name) -> String {
    match name {
        llvm_ir::Name::Name(n) => (**n).clone(),
        llvm_ir::Name::Number(n) => n.to_string(),
    }
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct GlobalName(String);

impl GlobalName {
    pub(crate) fn new(g: &GlobalVariable) -> Self {
        GlobalName(g.name.clone())
    }

    pub(crate) fn alias(g: &GlobalAlias) -> Self {
        GlobalName(g.name.clone())
    }

    pub fn get(&self) -> &str {
        &self.0
    }
}

impl Display for GlobalName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "@{}", self.0)
    }
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct FunctionName(String);

impl From<&str> for FunctionName {
    fn from(s: &str) -> Self {
        FunctionName(s.to_string())
    }
}

impl FunctionName {
    pub fn get(&self) -> &str {
        &self.0
    }
}

impl Display for FunctionName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "@{}", self.0)
    }
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct BlockName {
    parent_function: UArc<FunctionName>,
    name: llvm_ir::Name,
}

impl BlockName {
    pub(crate) fn new(parent_function: UArc<FunctionName>, b: &BasicBlock) -> Self {
        Self {
            parent_function,
            name: b.name.clone(),
        }
    }
}

impl Display for BlockName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.parent_function.0, local_name(&self.name))
    }
}

/// An instruction is named by its position, since most have no result name
/// (stores, returns) and all of them may carry rules.
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct InstructionName {
    parent_block: UArc<BlockName>,
    idx: usize,
}

impl InstructionName {
    pub(crate) fn new(parent_block: UArc<BlockName>, idx: usize) -> Self {
        Self { parent_block, idx }
    }
}

impl Display for InstructionName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.parent_block, self.idx)
    }
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct ParameterName {
    parent_function: UArc<FunctionName>,
    name: llvm_ir::Name,
}

impl ParameterName {
    pub(crate) fn new(parent_function: UArc<FunctionName>, p: &Parameter) -> Self {
        Self {
            parent_function,
            name: p.name.clone(),
        }
    }
}

impl Display for ParameterName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.parent_function.0, local_name(&self.name))
    }
}
