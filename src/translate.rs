// SPDX-License-Identifier: BSD-3-Clause
//! Translation of program values into pointer rules.
//!
//! Sources of unsoundness:
//!
//! - Instructions without a case below (e.g., `select`, `ptrtoint`,
//!   `atomicrmw`) produce no rules at all
//! - `inttoptr` results point to a single shared unknown location
//! - Indirect calls are resolved by signature only

use std::collections::HashSet;
use std::hash::{BuildHasher, Hash};

use tracing::{trace, trace_span};

use crate::{
    index::SignatureIndex,
    program::{Oracle, Program, ValueKind},
    rule::{
        assign, dereference_of, into_rule, null_site, reference_of, variable, Expr, GrammarError,
        Rule,
    },
};

mod call;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("inline assembly is not supported")]
    InlineAssembly,
    #[error("aggregate operand must be a value and not a pointer")]
    AggregateHasExtraReference,
    #[error("built a malformed rule: {0}")]
    Grammar(#[from] GrammarError),
}

/// Where generated rules go, typically the solver's input.
pub trait RuleSink<L> {
    fn insert(&mut self, rule: Rule<L>);
}

impl<L> RuleSink<L> for Vec<Rule<L>> {
    #[inline]
    fn insert(&mut self, rule: Rule<L>) {
        self.push(rule)
    }
}

impl<L: Eq + Hash, S: BuildHasher> RuleSink<L> for HashSet<Rule<L>, S> {
    #[inline]
    fn insert(&mut self, rule: Rule<L>) {
        HashSet::insert(self, rule);
    }
}

/// Derives the rules of single values. Holds only shared references, so one
/// translator may be used from several threads at once.
pub struct Translator<'a, P: ?Sized, O: ?Sized, I: ?Sized> {
    program: &'a P,
    oracle: &'a O,
    index: &'a I,
}

impl<'a, P: ?Sized, O: ?Sized, I: ?Sized> Clone for Translator<'a, P, O, I> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, P: ?Sized, O: ?Sized, I: ?Sized> Copy for Translator<'a, P, O, I> {}

impl<'a, P, O, I> Translator<'a, P, O, I>
where
    P: Program + ?Sized,
    O: Oracle<P> + ?Sized,
    I: SignatureIndex<P> + ?Sized,
{
    pub fn new(program: &'a P, oracle: &'a O, index: &'a I) -> Self {
        Translator {
            program,
            oracle,
            index,
        }
    }

    /// All rules of `value`, in order.
    pub fn rules(&self, value: &P::Value) -> Result<Vec<Rule<P::Value>>, Error> {
        let mut out = Vec::new();
        self.rules_of(value, &mut out)?;
        Ok(out)
    }

    /// Insert the rules of `value` into `out`.
    ///
    /// On error, rules inserted before the failure stay in `out`.
    pub fn rules_of<S>(&self, value: &P::Value, out: &mut S) -> Result<(), Error>
    where
        S: RuleSink<P::Value> + ?Sized,
    {
        let span = trace_span!("rules", value = ?value);
        let _span = span.enter();

        let p = self.program;
        match p.kind(value) {
            ValueKind::Load { pointer } => {
                let op = p.elim_const_expr(&pointer);
                let rhs = if p.has_extra_reference(&op) {
                    variable(op)
                } else {
                    dereference_of(variable(op))?
                };
                out.insert(into_rule(assign(variable(value.clone()), rhs)?));
            }

            ValueKind::Store {
                value: stored,
                pointer,
            } => {
                let l = p.elim_const_expr(&pointer);
                let r = p.elim_const_expr(&stored);
                let lhs = if p.has_extra_reference(&l) {
                    variable(l)
                } else {
                    dereference_of(variable(l))?
                };
                out.insert(into_rule(assign(lhs, self.source(r)?)?));
            }

            ValueKind::BitCast { operand: op } | ValueKind::GetElementPtr { pointer: op } => {
                let op = p.elim_const_expr(&op);
                out.insert(into_rule(assign(
                    variable(value.clone()),
                    self.address(op)?,
                )?));
            }

            ValueKind::Call(call) => self.call_rules(value, &call, out)?,

            ValueKind::Ret { function, operand } => {
                self.return_rules(&function, operand.as_ref(), out)?
            }

            ValueKind::Phi { incoming } => {
                for r in incoming {
                    let rhs = if p.is_null(&r) {
                        null_site(r)
                    } else {
                        variable(r)
                    };
                    out.insert(into_rule(assign(variable(value.clone()), rhs)?));
                }
            }

            ValueKind::ExtractValue { aggregate } => {
                if p.has_extra_reference(&aggregate) {
                    return Err(Error::AggregateHasExtraReference);
                }
                out.insert(into_rule(assign(
                    variable(value.clone()),
                    variable(aggregate),
                )?));
            }

            ValueKind::InsertValue {
                aggregate,
                value: inserted,
            } => {
                if p.has_extra_reference(&aggregate) {
                    return Err(Error::AggregateHasExtraReference);
                }
                out.insert(into_rule(assign(variable(aggregate), self.source(inserted)?)?));
            }

            ValueKind::IntToPtr => {
                let unknown = p.undef_value(None);
                out.insert(into_rule(assign(
                    variable(value.clone()),
                    reference_of(variable(unknown))?,
                )?));
            }

            ValueKind::Global { initializer } => match initializer {
                Some(init) => out.insert(into_rule(assign(
                    variable(value.clone()),
                    reference_of(variable(init))?,
                )?)),
                None => trace!("external global"),
            },

            ValueKind::Other => trace!("no pointer semantics"),
        }
        Ok(())
    }

    /// `&op` for values that are already addresses of storage, `op` otherwise
    fn address(&self, op: P::Value) -> Result<Expr<P::Value>, GrammarError> {
        if self.program.has_extra_reference(&op) {
            reference_of(variable(op))
        } else {
            Ok(variable(op))
        }
    }

    /// Right-hand side for a value flowing into a pointer: its address,
    /// a null site, or the value itself.
    fn source(&self, r: P::Value) -> Result<Expr<P::Value>, GrammarError> {
        if self.program.has_extra_reference(&r) {
            reference_of(variable(r))
        } else if self.program.is_null(&r) {
            Ok(null_site(r))
        } else {
            Ok(variable(r))
        }
    }
}
