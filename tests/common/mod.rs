// SPDX-License-Identifier: BSD-3-Clause
//! A hand-built program for exercising rule extraction without LLVM.
//!
//! Values, functions and types are all plain strings. Types ending in `*`
//! are pointers.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};

use ptrules::{
    program::{Call, Callee, Kind, Program, ValueKind},
    Rule, RuleKind,
};

pub type Loc = &'static str;

#[derive(Clone, Debug)]
pub struct Function {
    pub params: Vec<Loc>,
    pub ret: Loc,
    pub signature: Loc,
    /// `None` for declarations
    pub body: Option<Vec<Loc>>,
}

#[derive(Debug, Default)]
pub struct Mock {
    kinds: HashMap<Loc, Kind<Mock>>,
    /// Constant expressions, mapped to what they wrap
    consts: HashMap<Loc, Loc>,
    extra_ref: HashSet<Loc>,
    nulls: HashSet<Loc>,
    non_pointers: HashSet<Loc>,
    functions: Vec<(Loc, Function)>,
    globals: Vec<Loc>,
}

impl Mock {
    pub fn value(&mut self, v: Loc, kind: Kind<Mock>) -> &mut Self {
        self.kinds.insert(v, kind);
        self
    }

    /// A stack slot
    pub fn alloca(&mut self, v: Loc) -> &mut Self {
        self.extra_ref.insert(v);
        self
    }

    pub fn constant_expr(&mut self, c: Loc, underlying: Loc) -> &mut Self {
        self.consts.insert(c, underlying);
        self
    }

    pub fn null(&mut self, v: Loc) -> &mut Self {
        self.nulls.insert(v);
        self
    }

    pub fn not_pointer(&mut self, v: Loc) -> &mut Self {
        self.non_pointers.insert(v);
        self
    }

    pub fn global(&mut self, g: Loc, initializer: Option<Loc>) -> &mut Self {
        self.extra_ref.insert(g);
        self.globals.push(g);
        self.value(g, ValueKind::Global { initializer })
    }

    pub fn define(
        &mut self,
        name: Loc,
        params: &[Loc],
        ret: Loc,
        signature: Loc,
        body: &[Loc],
    ) -> &mut Self {
        self.functions.push((
            name,
            Function {
                params: params.to_vec(),
                ret,
                signature,
                body: Some(body.to_vec()),
            },
        ));
        self
    }

    pub fn declare(&mut self, name: Loc, params: &[Loc], ret: Loc, signature: Loc) -> &mut Self {
        self.functions.push((
            name,
            Function {
                params: params.to_vec(),
                ret,
                signature,
                body: None,
            },
        ));
        self
    }

    fn function(&self, f: &Loc) -> &Function {
        &self
            .functions
            .iter()
            .find(|(name, _)| name == f)
            .unwrap_or_else(|| panic!("no function {}", f))
            .1
    }
}

pub fn call(callee: Callee<Loc, Loc>, args: &[Loc]) -> Kind<Mock> {
    ValueKind::Call(Call {
        callee,
        args: args.to_vec(),
    })
}

pub fn ret(function: Loc, operand: Option<Loc>) -> Kind<Mock> {
    ValueKind::Ret { function, operand }
}

impl Program for Mock {
    type Value = Loc;
    type Function = Loc;
    type Type = Loc;

    fn kind(&self, value: &Loc) -> Kind<Self> {
        self.kinds.get(value).cloned().unwrap_or(ValueKind::Other)
    }

    fn elim_const_expr(&self, value: &Loc) -> Loc {
        let mut v = *value;
        while let Some(u) = self.consts.get(v) {
            v = *u;
        }
        v
    }

    fn has_extra_reference(&self, value: &Loc) -> bool {
        self.extra_ref.contains(value) || self.functions.iter().any(|(f, _)| f == value)
    }

    fn is_null(&self, value: &Loc) -> bool {
        self.nulls.contains(value)
    }

    fn is_pointer_value(&self, value: &Loc) -> bool {
        !self.non_pointers.contains(value)
    }

    fn is_pointer_type(&self, ty: &Loc) -> bool {
        ty.ends_with('*')
    }

    fn pointee_type(&self, ty: &Loc) -> Option<Loc> {
        (*ty).strip_suffix('*')
    }

    fn undef_value(&self, ty: Option<&Loc>) -> Loc {
        match ty {
            None => "undef",
            Some(ty) => Box::leak(format!("undef<{}>", ty).into_boxed_str()),
        }
    }

    fn function_name(&self, function: &Loc) -> String {
        function.to_string()
    }

    fn parameters(&self, function: &Loc) -> Vec<Loc> {
        self.function(function).params.clone()
    }

    fn return_type(&self, function: &Loc) -> Loc {
        self.function(function).ret
    }

    fn signature(&self, function: &Loc) -> Loc {
        self.function(function).signature
    }

    fn is_declaration(&self, function: &Loc) -> bool {
        self.function(function).body.is_none()
    }

    fn functions(&self) -> Vec<Loc> {
        self.functions.iter().map(|(f, _)| *f).collect()
    }

    fn globals(&self) -> Vec<Loc> {
        self.globals.clone()
    }

    fn instructions(&self, function: &Loc) -> Vec<Loc> {
        self.function(function).body.clone().unwrap_or_default()
    }
}

/// `(kind, lvalue, rvalue)` of each rule, for comparing against literals
pub fn flat(rules: &[Rule<Loc>]) -> Vec<(RuleKind, Loc, Option<Loc>)> {
    rules
        .iter()
        .map(|r| (r.kind(), *r.lvalue(), r.rvalue().copied()))
        .collect()
}
