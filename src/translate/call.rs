// SPDX-License-Identifier: BSD-3-Clause
//! Rules across procedure boundaries: argument passing at calls, and return
//! values flowing back to call sites.

use tracing::{trace, warn};

use crate::{
    index::SignatureIndex,
    program::{CallOf, Callee, Oracle, Program, ValueKind},
    rule::{
        alloc_site, assign, dealloc_site, dereference_of, into_rule, reference_of, variable, Rule,
        RuleExpr,
    },
};

use super::{Error, RuleSink, Translator};

impl<'a, P, O, I> Translator<'a, P, O, I>
where
    P: Program + ?Sized,
    O: Oracle<P> + ?Sized,
    I: SignatureIndex<P> + ?Sized,
{
    /// Rules of the call instruction `c`.
    ///
    /// A direct call is processed against its callee only; an indirect call
    /// against every indexed function of the matching signature.
    pub fn call_rules<S>(&self, c: &P::Value, call: &CallOf<P>, out: &mut S) -> Result<(), Error>
    where
        S: RuleSink<P::Value> + ?Sized,
    {
        match &call.callee {
            Callee::Asm => Err(Error::InlineAssembly),
            Callee::Direct(f) => self.target_rules(c, &call.args, f, out),
            Callee::Indirect(signature) => {
                let targets = self.index.functions_with_signature(signature);
                trace!(targets = targets.len(), "indirect call");
                for f in targets {
                    self.target_rules(c, &call.args, f, out)?;
                }
                Ok(())
            }
        }
    }

    fn target_rules<S>(
        &self,
        c: &P::Value,
        args: &[P::Value],
        f: &P::Function,
        out: &mut S,
    ) -> Result<(), Error>
    where
        S: RuleSink<P::Value> + ?Sized,
    {
        let p = self.program;
        let o = self.oracle;

        // The call site is both the variable and the allocation site
        if o.is_memory_allocation(p, f) {
            out.insert(into_rule(assign(
                variable(c.clone()),
                alloc_site(c.clone()),
            )?));
            return Ok(());
        }
        if o.is_memory_management(p, f) {
            return self.memory_rules(args, f, out);
        }

        for (formal, actual) in p.parameters(f).into_iter().zip(args) {
            if p.is_pointer_value(&formal) {
                out.insert(self.arg_pass(formal, p.elim_const_expr(actual))?);
            }
        }

        // Unknown memory an external function may return
        if p.is_declaration(f) {
            let ret = p.return_type(f);
            if p.is_pointer_type(&ret) {
                let unknown = p.undef_value(p.pointee_type(&ret).as_ref());
                out.insert(into_rule(assign(
                    variable(c.clone()),
                    reference_of(variable(unknown))?,
                )?));
            }
        }
        Ok(())
    }

    /// Deallocation, copies, and moves.
    fn memory_rules<S>(&self, args: &[P::Value], f: &P::Function, out: &mut S) -> Result<(), Error>
    where
        S: RuleSink<P::Value> + ?Sized,
    {
        let p = self.program;
        let o = self.oracle;
        if o.is_memory_deallocation(p, f) {
            match args.first() {
                Some(freed) => {
                    let freed = p.elim_const_expr(freed);
                    out.insert(into_rule(RuleExpr::dealloc(dealloc_site(freed))?));
                }
                None => warn!(function = %p.function_name(f), "deallocation without argument"),
            }
        }
        if o.is_memory_copy(p, f) || o.is_memory_move(p, f) {
            match args {
                [dst, src, ..] => {
                    let l = p.elim_const_expr(dst);
                    let r = p.elim_const_expr(src);
                    out.insert(into_rule(assign(
                        dereference_of(variable(l))?,
                        dereference_of(variable(r))?,
                    )?));
                }
                _ => warn!(function = %p.function_name(f), "copy with fewer than two arguments"),
            }
        }
        Ok(())
    }

    /// Rules of a `ret` in `f`: the returned pointer flows to every call site
    /// that may call `f`.
    ///
    /// Call sites with a direct callee are only considered when that callee
    /// is `f`; those without one were indexed by signature and are all
    /// considered.
    pub fn return_rules<S>(
        &self,
        f: &P::Function,
        operand: Option<&P::Value>,
        out: &mut S,
    ) -> Result<(), Error>
    where
        S: RuleSink<P::Value> + ?Sized,
    {
        let p = self.program;
        let r = match operand {
            Some(r) if p.is_pointer_value(r) => p.elim_const_expr(r),
            _ => return Ok(()),
        };
        for b in self.index.calls_with_signature(&p.signature(f)) {
            let reaches = match p.kind(b) {
                ValueKind::Call(call) => match call.callee {
                    Callee::Direct(g) => g == *f,
                    Callee::Indirect(_) => true,
                    Callee::Asm => false,
                },
                _ => false,
            };
            if reaches {
                out.insert(self.arg_pass(b.clone(), r.clone())?);
            }
        }
        Ok(())
    }

    /// The implicit assignment `l = r` of an actual argument to a formal
    /// parameter, or of a returned value to a call site.
    pub fn arg_pass(&self, l: P::Value, r: P::Value) -> Result<Rule<P::Value>, Error> {
        Ok(into_rule(assign(variable(l), self.source(r)?)?))
    }
}
