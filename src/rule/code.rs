// SPDX-License-Identifier: BSD-3-Clause
//! Canonical rule codes.

use std::fmt::Display;

use super::{
    alloc_site, assign, dealloc_site, dereference_of, null_site, reference_of, variable, Form,
    RuleExpr, Site, Statement, Wrapper,
};

/// The closed set of pointer rules understood by the solver.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum RuleKind {
    /// `x = ALLOC@a`
    VarAsgnAlloc,
    /// `x = NULL@n`
    VarAsgnNull,
    /// `x = y`
    VarAsgnVar,
    /// `x = &y`
    VarAsgnRefVar,
    /// `x = *y`
    VarAsgnDrefVar,
    /// `*x = NULL@n`
    DrefVarAsgnNull,
    /// `*x = y`
    DrefVarAsgnVar,
    /// `*x = &y`
    DrefVarAsgnRefVar,
    /// `*x = *y`
    DrefVarAsgnDrefVar,
    /// `DEALLOC@x`
    Dealloc,
}

const VAR: Form = Form {
    wrapper: None,
    site: Site::Variable,
};
const REF_VAR: Form = Form {
    wrapper: Some(Wrapper::Reference),
    site: Site::Variable,
};
const DREF_VAR: Form = Form {
    wrapper: Some(Wrapper::Dereference),
    site: Site::Variable,
};
const ALLOC: Form = Form {
    wrapper: None,
    site: Site::Alloc,
};
const NULL: Form = Form {
    wrapper: None,
    site: Site::Null,
};

impl RuleKind {
    /// The kind of `lhs = rhs`, if that is a legal assignment.
    pub fn of_assignment(lhs: Form, rhs: Form) -> Option<Self> {
        match (lhs, rhs) {
            (VAR, ALLOC) => Some(RuleKind::VarAsgnAlloc),
            (VAR, NULL) => Some(RuleKind::VarAsgnNull),
            (VAR, VAR) => Some(RuleKind::VarAsgnVar),
            (VAR, REF_VAR) => Some(RuleKind::VarAsgnRefVar),
            (VAR, DREF_VAR) => Some(RuleKind::VarAsgnDrefVar),
            (DREF_VAR, NULL) => Some(RuleKind::DrefVarAsgnNull),
            (DREF_VAR, VAR) => Some(RuleKind::DrefVarAsgnVar),
            (DREF_VAR, REF_VAR) => Some(RuleKind::DrefVarAsgnRefVar),
            (DREF_VAR, DREF_VAR) => Some(RuleKind::DrefVarAsgnDrefVar),
            _ => None,
        }
    }
}

/// A rule in canonical form.
///
/// For every kind but [`RuleKind::Dealloc`], `rvalue` is present.
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Rule<L> {
    kind: RuleKind,
    lvalue: L,
    rvalue: Option<L>,
}

fn _assert_rule_send_sync()
where
    Rule<std::sync::Arc<()>>: Send + Sync,
{
}

impl<L> Rule<L> {
    #[inline]
    pub fn kind(&self) -> RuleKind {
        self.kind
    }

    #[inline]
    pub fn lvalue(&self) -> &L {
        &self.lvalue
    }

    #[inline]
    pub fn rvalue(&self) -> Option<&L> {
        self.rvalue.as_ref()
    }

    /// The deallocated location of a [`RuleKind::Dealloc`] rule.
    #[inline]
    pub fn value(&self) -> &L {
        self.lvalue()
    }
}

impl<L: Clone> Rule<L> {
    /// Rebuild the expression this rule was canonicalized from.
    ///
    /// `canonicalize(&rule.to_expr()) == rule` for every rule.
    pub fn to_expr(&self) -> RuleExpr<L> {
        let l = self.lvalue.clone();
        let r = match (&self.rvalue, self.kind) {
            (_, RuleKind::Dealloc) => {
                return RuleExpr(Statement::Dealloc(dealloc_site(l)));
            }
            (Some(r), _) => r.clone(),
            (None, kind) => unreachable!("{:?} rule without an rvalue", kind),
        };
        let built = match self.kind {
            RuleKind::VarAsgnAlloc => assign(variable(l), alloc_site(r)),
            RuleKind::VarAsgnNull => assign(variable(l), null_site(r)),
            RuleKind::VarAsgnVar => assign(variable(l), variable(r)),
            RuleKind::VarAsgnRefVar => {
                reference_of(variable(r)).and_then(|r| assign(variable(l), r))
            }
            RuleKind::VarAsgnDrefVar => {
                dereference_of(variable(r)).and_then(|r| assign(variable(l), r))
            }
            RuleKind::DrefVarAsgnNull => {
                dereference_of(variable(l)).and_then(|l| assign(l, null_site(r)))
            }
            RuleKind::DrefVarAsgnVar => {
                dereference_of(variable(l)).and_then(|l| assign(l, variable(r)))
            }
            RuleKind::DrefVarAsgnRefVar => dereference_of(variable(l))
                .and_then(|l| reference_of(variable(r)).and_then(|r| assign(l, r))),
            RuleKind::DrefVarAsgnDrefVar => dereference_of(variable(l))
                .and_then(|l| dereference_of(variable(r)).and_then(|r| assign(l, r))),
            RuleKind::Dealloc => unreachable!(),
        };
        match built {
            Ok(e) => e,
            Err(e) => unreachable!("rule kinds are legal shapes: {}", e),
        }
    }
}

/// Collapse a well-formed rule expression into its canonical rule.
///
/// Total: every [`RuleExpr`] has exactly one rule, and the result depends on
/// nothing but the expression.
pub fn canonicalize<L: Clone>(expr: &RuleExpr<L>) -> Rule<L> {
    into_rule(expr.clone())
}

/// Like [`canonicalize`], but consumes the expression.
pub fn into_rule<L>(expr: RuleExpr<L>) -> Rule<L> {
    match expr.0 {
        Statement::Assign { lhs, rhs } => {
            let kind = match RuleKind::of_assignment(lhs.form(), rhs.form()) {
                Some(kind) => kind,
                None => unreachable!("`assign` only builds legal shapes"),
            };
            Rule {
                kind,
                lvalue: lhs.into_location(),
                rvalue: Some(rhs.into_location()),
            }
        }
        Statement::Dealloc(e) => Rule {
            kind: RuleKind::Dealloc,
            lvalue: e.into_location(),
            rvalue: None,
        },
    }
}

impl<L> From<RuleExpr<L>> for Rule<L> {
    fn from(expr: RuleExpr<L>) -> Self {
        into_rule(expr)
    }
}

impl<L: Display> Display for Rule<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let l = &self.lvalue;
        let r = match (&self.rvalue, self.kind) {
            (_, RuleKind::Dealloc) => return write!(f, "DEALLOC@{}", l),
            (Some(r), _) => r,
            (None, _) => return write!(f, "<malformed rule>"),
        };
        match self.kind {
            RuleKind::VarAsgnAlloc => write!(f, "{} = ALLOC@{}", l, r),
            RuleKind::VarAsgnNull => write!(f, "{} = NULL@{}", l, r),
            RuleKind::VarAsgnVar => write!(f, "{} = {}", l, r),
            RuleKind::VarAsgnRefVar => write!(f, "{} = &{}", l, r),
            RuleKind::VarAsgnDrefVar => write!(f, "{} = *{}", l, r),
            RuleKind::DrefVarAsgnNull => write!(f, "*{} = NULL@{}", l, r),
            RuleKind::DrefVarAsgnVar => write!(f, "*{} = {}", l, r),
            RuleKind::DrefVarAsgnRefVar => write!(f, "*{} = &{}", l, r),
            RuleKind::DrefVarAsgnDrefVar => write!(f, "*{} = *{}", l, r),
            RuleKind::Dealloc => unreachable!(),
        }
    }
}
