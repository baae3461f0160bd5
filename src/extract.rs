// SPDX-License-Identifier: BSD-3-Clause
//! Rules of a whole program.

use tracing::{debug, debug_span, warn};

use crate::{
    index::SignatureIndex,
    program::{Oracle, Program},
    rule::Rule,
    translate::{Error, Translator},
};

#[derive(Debug)]
pub struct ProgramRules<V> {
    pub rules: Vec<Rule<V>>,
    /// Values whose translation failed, and why. None of their rules are in
    /// `rules`.
    pub failures: Vec<(V, Error)>,
}

impl<V> Default for ProgramRules<V> {
    fn default() -> Self {
        ProgramRules {
            rules: Vec::new(),
            failures: Vec::new(),
        }
    }
}

impl<V: Clone + std::fmt::Debug> ProgramRules<V> {
    fn translate<P, O, I>(&mut self, translator: &Translator<'_, P, O, I>, value: V)
    where
        P: Program<Value = V> + ?Sized,
        O: Oracle<P> + ?Sized,
        I: SignatureIndex<P> + ?Sized,
    {
        let mut unit = Vec::new();
        match translator.rules_of(&value, &mut unit) {
            Ok(()) => self.rules.append(&mut unit),
            Err(e) => {
                warn!(value = ?value, "{}", e);
                self.failures.push((value, e));
            }
        }
    }
}

/// Rules of every global, then of every instruction of every defined
/// function, in the program's order. A value that fails to translate is
/// recorded and skipped.
pub fn program_rules<P, O, I>(program: &P, oracle: &O, index: &I) -> ProgramRules<P::Value>
where
    P: Program + ?Sized,
    O: Oracle<P> + ?Sized,
    I: SignatureIndex<P> + ?Sized,
{
    let translator = Translator::new(program, oracle, index);
    let mut out = ProgramRules::default();

    for g in program.globals() {
        out.translate(&translator, g);
    }
    for f in program.functions() {
        if program.is_declaration(&f) {
            continue;
        }
        let span = debug_span!("function", name = %program.function_name(&f));
        let _span = span.enter();
        for i in program.instructions(&f) {
            out.translate(&translator, i);
        }
    }

    debug!(
        rules = out.rules.len(),
        failures = out.failures.len(),
        "extracted rules"
    );
    out
}
