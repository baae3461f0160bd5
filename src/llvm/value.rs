// SPDX-License-Identifier: BSD-3-Clause
use std::collections::HashMap;
use std::fmt::Display;

use llvm_ir::{types::Typed, Name};

use crate::arc::UArc;

use super::constant::Constant;
use super::error::Error;
use super::name::{FunctionName, GlobalName, InstructionName, ParameterName};

/// A memory location, as seen by the rules.
///
/// Named entities compare by identity (see [`UArc`]); constants compare by
/// structure, so e.g. all `null`s of one type are the same location.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub enum Value {
    Instruction(UArc<InstructionName>),
    Parameter(UArc<ParameterName>),
    Global(UArc<GlobalName>),
    Function(UArc<FunctionName>),
    Constant(triomphe::Arc<Constant>),
    Metadata,
}

impl Value {
    pub(crate) fn constant(c: Constant) -> Self {
        Value::Constant(triomphe::Arc::new(c))
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Instruction(i) => write!(f, "{}", i),
            Value::Parameter(p) => write!(f, "{}", p),
            Value::Global(g) => write!(f, "{}", g),
            Value::Function(fun) => write!(f, "{}", fun),
            Value::Constant(c) => write!(f, "{}", c),
            Value::Metadata => write!(f, "<metadata>"),
        }
    }
}

/// Names visible while converting the operands of one function.
pub(crate) struct Scope<'m> {
    pub(crate) globals: &'m HashMap<&'m str, Value>,
    pub(crate) locals: &'m HashMap<&'m Name, Value>,
    pub(crate) types: &'m llvm_ir::types::Types,
}

impl<'m> Scope<'m> {
    pub(crate) fn operand(&self, op: &llvm_ir::Operand) -> Result<Value, Error> {
        match op {
            llvm_ir::Operand::LocalOperand { name, .. } => self
                .locals
                .get(name)
                .cloned()
                .ok_or_else(|| Error(format!("Unknown local {}", name))),
            llvm_ir::Operand::ConstantOperand(c) => self.constant(c),
            llvm_ir::Operand::MetadataOperand => Ok(Value::Metadata),
        }
    }

    pub(crate) fn constant(&self, c: &llvm_ir::Constant) -> Result<Value, Error> {
        Ok(match c {
            llvm_ir::Constant::GlobalReference { name, .. } => self
                .globals
                .get::<str>(name.as_ref())
                .cloned()
                .ok_or_else(|| Error(format!("Unknown global {}", name)))?,
            llvm_ir::Constant::Null(ty) => Value::constant(Constant::Null(ty.clone())),
            llvm_ir::Constant::Undef(ty) | llvm_ir::Constant::Poison(ty) => {
                Value::constant(Constant::Undef(Some(ty.clone())))
            }
            llvm_ir::Constant::Int { bits, value } => Value::constant(Constant::Int {
                bits: *bits,
                value: *value,
            }),
            llvm_ir::Constant::BitCast(b) => Value::constant(Constant::BitCast {
                operand: self.constant(&b.operand)?,
                ty: b.to_type.clone(),
            }),
            llvm_ir::Constant::GetElementPtr(g) => Value::constant(Constant::GetElementPtr {
                address: self.constant(&g.address)?,
                ty: c.get_type(self.types),
            }),
            other => Value::constant(Constant::Other {
                ty: other.get_type(self.types),
                repr: other.to_string().into_boxed_str(),
            }),
        })
    }
}
