// SPDX-License-Identifier: BSD-3-Clause
//! Interfaces to the analyzed program.
//!
//! Rule extraction never inspects the intermediate representation directly.
//! Everything it needs goes through [`Program`] (structure and syntactic
//! predicates) and [`Oracle`] (which called functions manage memory), so the
//! translation can run against LLVM (see `crate::llvm`, feature `llvm`) or
//! against a hand-built model in tests.

use std::fmt::Debug;
use std::hash::Hash;

#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub enum Callee<F, T> {
    /// The called operand is a function
    Direct(F),
    /// Call through a pointer, with the signature of the called function type
    Indirect(T),
    /// Inline assembly
    Asm,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct Call<V, F, T> {
    pub callee: Callee<F, T>,
    pub args: Vec<V>,
}

impl<V, F, T> Call<V, F, T> {
    #[inline]
    pub fn called_function(&self) -> Option<&F> {
        match &self.callee {
            Callee::Direct(f) => Some(f),
            Callee::Indirect(_) | Callee::Asm => None,
        }
    }
}

/// The pointer-relevant view of one program value.
///
/// Operands are the raw operands of the instruction; the translation strips
/// constant expressions itself where needed.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub enum ValueKind<V, F, T> {
    /// `x = load *pointer`
    Load { pointer: V },
    /// `store value into *pointer`
    Store { value: V, pointer: V },
    BitCast { operand: V },
    GetElementPtr { pointer: V },
    Call(Call<V, F, T>),
    /// `ret operand`, inside `function`
    Ret { function: F, operand: Option<V> },
    /// Incoming values, in declared order
    Phi { incoming: Vec<V> },
    ExtractValue { aggregate: V },
    InsertValue { aggregate: V, value: V },
    IntToPtr,
    /// A global variable, with its initializer if defined in this program
    Global { initializer: Option<V> },
    /// Anything without pointer semantics modeled here
    Other,
}

pub type Kind<P> =
    ValueKind<<P as Program>::Value, <P as Program>::Function, <P as Program>::Type>;

pub type CallOf<P> = Call<<P as Program>::Value, <P as Program>::Function, <P as Program>::Type>;

/// The analyzed program.
///
/// Values are memory locations: two values are the same location exactly
/// when they are equal.
pub trait Program {
    type Value: Clone + Debug + Eq + Hash;
    type Function: Clone + Debug + Eq + Hash;
    type Type: Clone + Debug + Eq + Hash;

    fn kind(&self, value: &Self::Value) -> Kind<Self>;

    /// Strip constant-expression wrappers (casts, constant address
    /// computations) down to the underlying value.
    fn elim_const_expr(&self, value: &Self::Value) -> Self::Value;

    /// Does `value` already denote a storage location one level below its
    /// nominal pointee (a stack slot, a global), rather than a pointer held in
    /// a register?
    fn has_extra_reference(&self, value: &Self::Value) -> bool;

    /// Is `value` the literal null pointer?
    fn is_null(&self, value: &Self::Value) -> bool;

    fn is_pointer_value(&self, value: &Self::Value) -> bool;

    fn is_pointer_type(&self, ty: &Self::Type) -> bool;

    fn pointee_type(&self, ty: &Self::Type) -> Option<Self::Type>;

    /// An opaque placeholder for unknown memory of type `ty`, or for unknown
    /// memory in general when `ty` is `None`.
    fn undef_value(&self, ty: Option<&Self::Type>) -> Self::Value;

    fn function_name(&self, function: &Self::Function) -> String;

    /// Formal parameters, in order
    fn parameters(&self, function: &Self::Function) -> Vec<Self::Value>;

    fn return_type(&self, function: &Self::Function) -> Self::Type;

    /// The function type, used to match indirect calls
    fn signature(&self, function: &Self::Function) -> Self::Type;

    /// Declared but not defined in this program
    fn is_declaration(&self, function: &Self::Function) -> bool;

    /// All functions, definitions and declarations, in a stable order
    fn functions(&self) -> Vec<Self::Function>;

    /// All global variables, in a stable order
    fn globals(&self) -> Vec<Self::Value>;

    /// Instructions (including returns) of a defined function, in order
    fn instructions(&self, function: &Self::Function) -> Vec<Self::Value>;
}

/// Classification of called functions that manage memory.
pub trait Oracle<P: Program + ?Sized> {
    fn is_memory_allocation(&self, program: &P, function: &P::Function) -> bool;

    fn is_memory_deallocation(&self, program: &P, function: &P::Function) -> bool;

    fn is_memory_copy(&self, program: &P, function: &P::Function) -> bool;

    fn is_memory_move(&self, program: &P, function: &P::Function) -> bool;

    fn is_memory_management(&self, program: &P, function: &P::Function) -> bool {
        self.is_memory_allocation(program, function)
            || self.is_memory_deallocation(program, function)
            || self.is_memory_copy(program, function)
            || self.is_memory_move(program, function)
    }
}
