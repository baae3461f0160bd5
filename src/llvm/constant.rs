// SPDX-License-Identifier: BSD-3-Clause
//! Constants that matter for pointer rules. Everything else is kept as its
//! type and printed form, in [`Constant::Other`].

use std::fmt::Display;

use llvm_ir::TypeRef;

use super::value::Value;

#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub enum Constant {
    Null(TypeRef),
    /// `undef` or `poison`. The untyped form is the single unknown location
    /// that integer-to-pointer casts point to.
    Undef(Option<TypeRef>),
    Int {
        bits: u32,
        value: u64,
    },
    BitCast {
        operand: Value,
        ty: TypeRef,
    },
    GetElementPtr {
        address: Value,
        ty: TypeRef,
    },
    /// Aggregates, strings and the remaining constant expressions. LLVM
    /// uniques constants by content, so the printed form is the identity.
    Other {
        ty: TypeRef,
        repr: Box<str>,
    },
}

impl Constant {
    pub fn ty(&self) -> Option<&TypeRef> {
        match self {
            Constant::Null(ty)
            | Constant::BitCast { ty, .. }
            | Constant::GetElementPtr { ty, .. }
            | Constant::Other { ty, .. } => Some(ty),
            Constant::Undef(ty) => ty.as_ref(),
            Constant::Int { .. } => None,
        }
    }

    /// The value under any number of casts and constant address
    /// computations
    pub fn strip(&self) -> Option<&Value> {
        match self {
            Constant::BitCast { operand, .. } => Some(operand),
            Constant::GetElementPtr { address, .. } => Some(address),
            _ => None,
        }
    }
}

impl Display for Constant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Constant::Null(_) => write!(f, "null"),
            Constant::Undef(None) => write!(f, "undef"),
            Constant::Undef(Some(ty)) => write!(f, "undef<{}>", ty),
            Constant::Int { bits, value } => write!(f, "i{} {}", bits, value),
            Constant::BitCast { operand, .. } => write!(f, "bitcast({})", operand),
            Constant::GetElementPtr { address, .. } => write!(f, "getelementptr({})", address),
            Constant::Other { repr, .. } => write!(f, "{}", repr),
        }
    }
}
