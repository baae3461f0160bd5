// SPDX-License-Identifier: BSD-3-Clause
use either::Either;
use llvm_ir::TypeRef;

use crate::arc::UArc;
use crate::program::Callee;

use super::error::Error;
use super::name::FunctionName;
use super::value::{Scope, Value};

#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct BitCast {
    pub(crate) operand: Value,
}

impl BitCast {
    pub(crate) fn from_bitcast(
        scope: &Scope<'_>,
        i: &llvm_ir::instruction::BitCast,
    ) -> Result<Self, Error> {
        Ok(BitCast {
            operand: scope.operand(&i.operand)?,
        })
    }
}

#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct Call {
    pub callee: Callee<UArc<FunctionName>, TypeRef>,
    pub args: Vec<Value>,
}

impl Call {
    pub(crate) fn from_call(
        scope: &Scope<'_>,
        call: &llvm_ir::instruction::Call,
    ) -> Result<Self, Error> {
        let callee = match &call.function {
            Either::Left(_asm) => Callee::Asm,
            Either::Right(op) => match scope.operand(op)? {
                Value::Function(f) => Callee::Direct(f),
                _ => Callee::Indirect(called_type(scope, op)),
            },
        };
        let args = call
            .arguments
            .iter()
            .map(|(op, _)| scope.operand(op))
            .collect::<Result<_, _>>()?;
        Ok(Call { callee, args })
    }
}

/// The function type of a called operand, which is a pointer to it
fn called_type(scope: &Scope<'_>, op: &llvm_ir::Operand) -> TypeRef {
    use llvm_ir::types::Typed;
    let ty = op.get_type(scope.types);
    match &*ty {
        llvm_ir::Type::PointerType { pointee_type, .. } => pointee_type.clone(),
        _ => ty.clone(),
    }
}

#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct ExtractValue {
    pub(crate) aggregate: Value,
}

impl ExtractValue {
    pub(crate) fn from_extractvalue(
        scope: &Scope<'_>,
        i: &llvm_ir::instruction::ExtractValue,
    ) -> Result<Self, Error> {
        Ok(ExtractValue {
            aggregate: scope.operand(&i.aggregate)?,
        })
    }
}

#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct GetElementPtr {
    pub(crate) pointer: Value,
}

impl GetElementPtr {
    pub(crate) fn from_gep(
        scope: &Scope<'_>,
        i: &llvm_ir::instruction::GetElementPtr,
    ) -> Result<Self, Error> {
        Ok(GetElementPtr {
            pointer: scope.operand(&i.address)?,
        })
    }
}

#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct InsertValue {
    pub(crate) aggregate: Value,
    pub(crate) element: Value,
}

impl InsertValue {
    pub(crate) fn from_insertvalue(
        scope: &Scope<'_>,
        i: &llvm_ir::instruction::InsertValue,
    ) -> Result<Self, Error> {
        Ok(InsertValue {
            aggregate: scope.operand(&i.aggregate)?,
            element: scope.operand(&i.element)?,
        })
    }
}

#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct Load {
    pub(crate) pointer: Value,
}

impl Load {
    pub(crate) fn from_load(
        scope: &Scope<'_>,
        i: &llvm_ir::instruction::Load,
    ) -> Result<Self, Error> {
        Ok(Load {
            pointer: scope.operand(&i.address)?,
        })
    }
}

#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct Phi {
    pub(crate) incoming: Vec<Value>,
}

impl Phi {
    pub(crate) fn from_phi(scope: &Scope<'_>, i: &llvm_ir::instruction::Phi) -> Result<Self, Error> {
        Ok(Phi {
            incoming: i
                .incoming_values
                .iter()
                .map(|(op, _)| scope.operand(op))
                .collect::<Result<_, _>>()?,
        })
    }
}

#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct Store {
    pub(crate) value: Value,
    pub(crate) pointer: Value,
}

impl Store {
    pub(crate) fn from_store(
        scope: &Scope<'_>,
        i: &llvm_ir::instruction::Store,
    ) -> Result<Self, Error> {
        Ok(Store {
            value: scope.operand(&i.value)?,
            pointer: scope.operand(&i.address)?,
        })
    }
}

#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub enum Opcode {
    Alloca,
    BitCast(BitCast),
    Call(Call),
    ExtractValue(ExtractValue),
    GetElementPtr(GetElementPtr),
    InsertValue(InsertValue),
    IntToPtr,
    Load(Load),
    Phi(Phi),
    Ret(Option<Value>),
    Store(Store),
    //
    Other,
}

impl Opcode {
    pub(crate) fn from_instruction(
        scope: &Scope<'_>,
        i: &llvm_ir::Instruction,
    ) -> Result<Self, Error> {
        Ok(match i {
            llvm_ir::Instruction::Alloca(_) => Opcode::Alloca,

            llvm_ir::Instruction::BitCast(bitcast) => {
                Opcode::BitCast(BitCast::from_bitcast(scope, bitcast)?)
            }

            llvm_ir::Instruction::Call(call) => Opcode::Call(Call::from_call(scope, call)?),

            llvm_ir::Instruction::ExtractValue(ev) => {
                Opcode::ExtractValue(ExtractValue::from_extractvalue(scope, ev)?)
            }

            llvm_ir::Instruction::GetElementPtr(gep) => {
                Opcode::GetElementPtr(GetElementPtr::from_gep(scope, gep)?)
            }

            llvm_ir::Instruction::InsertValue(iv) => {
                Opcode::InsertValue(InsertValue::from_insertvalue(scope, iv)?)
            }

            llvm_ir::Instruction::IntToPtr(_) => Opcode::IntToPtr,

            llvm_ir::Instruction::Load(load) => Opcode::Load(Load::from_load(scope, load)?),

            llvm_ir::Instruction::Phi(phi) => Opcode::Phi(Phi::from_phi(scope, phi)?),

            llvm_ir::Instruction::Store(store) => Opcode::Store(Store::from_store(scope, store)?),

            _ => Opcode::Other,
        })
    }

    pub(crate) fn from_terminator(
        scope: &Scope<'_>,
        t: &llvm_ir::Terminator,
    ) -> Result<Self, Error> {
        Ok(match t {
            llvm_ir::Terminator::Ret(r) => Opcode::Ret(match &r.return_operand {
                None => None,
                Some(op) => Some(scope.operand(op)?),
            }),
            _ => Opcode::Other,
        })
    }
}
