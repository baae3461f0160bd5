// SPDX-License-Identifier: BSD-3-Clause
//! Signature-type index of functions and call sites.
//!
//! Indirect calls are resolved by matching the called function type against
//! the signatures of defined functions, and returns are propagated back to
//! every call site that may reach them the same way. Both directions need
//! a multimap keyed by signature, built once per program.

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::program::{Callee, Oracle, Program, ValueKind};

/// Read-only lookup of possible targets and callers by signature.
///
/// Results come in a stable order, but callers should not rely on any
/// particular one.
pub trait SignatureIndex<P: Program + ?Sized> {
    /// Function definitions that an indirect call of this type may target
    fn functions_with_signature(&self, signature: &P::Type) -> &[P::Function];

    /// Call sites whose called function has this type
    fn calls_with_signature(&self, signature: &P::Type) -> &[P::Value];
}

pub struct CallMaps<P: Program + ?Sized> {
    functions: FxHashMap<P::Type, Vec<P::Function>>,
    calls: FxHashMap<P::Type, Vec<P::Value>>,
}

impl<P: Program + ?Sized> Default for CallMaps<P> {
    fn default() -> Self {
        CallMaps {
            functions: FxHashMap::default(),
            calls: FxHashMap::default(),
        }
    }
}

impl<P: Program + ?Sized> std::fmt::Debug for CallMaps<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallMaps")
            .field("functions", &self.functions)
            .field("calls", &self.calls)
            .finish()
    }
}

impl<P: Program + ?Sized> CallMaps<P> {
    /// Index every defined function that is not a memory-management routine,
    /// and every call site that is not inline assembly.
    pub fn build<O: Oracle<P> + ?Sized>(program: &P, oracle: &O) -> Self {
        let mut maps = Self::default();
        for f in program.functions() {
            if program.is_declaration(&f) {
                continue;
            }
            if !oracle.is_memory_management(program, &f) {
                maps.insert_function(program.signature(&f), f.clone());
            }
            for i in program.instructions(&f) {
                if let ValueKind::Call(call) = program.kind(&i) {
                    match call.callee {
                        Callee::Direct(g) => maps.insert_call(program.signature(&g), i),
                        Callee::Indirect(signature) => maps.insert_call(signature, i),
                        Callee::Asm => (),
                    }
                }
            }
        }
        debug!(
            functions = maps.functions.values().map(Vec::len).sum::<usize>(),
            calls = maps.calls.values().map(Vec::len).sum::<usize>(),
            "built call maps"
        );
        maps
    }

    pub fn insert_function(&mut self, signature: P::Type, function: P::Function) {
        self.functions.entry(signature).or_default().push(function);
    }

    pub fn insert_call(&mut self, signature: P::Type, call: P::Value) {
        self.calls.entry(signature).or_default().push(call);
    }
}

impl<P: Program + ?Sized> SignatureIndex<P> for CallMaps<P> {
    fn functions_with_signature(&self, signature: &P::Type) -> &[P::Function] {
        self.functions
            .get(signature)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn calls_with_signature(&self, signature: &P::Type) -> &[P::Value] {
        self.calls.get(signature).map(Vec::as_slice).unwrap_or(&[])
    }
}
