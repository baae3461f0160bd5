// SPDX-License-Identifier: BSD-3-Clause
//! The grammar of pointer operations.
//!
//! Every rule handed to the solver starts life as a small expression tree
//! built with the functions in this module. Only two-level trees are legal:
//! a leaf ([`variable`], [`alloc_site`], [`dealloc_site`], [`null_site`]),
//! optionally wrapped once in [`reference_of`] or [`dereference_of`], on each
//! side of an [`assign`]. The builders refuse anything else, so a
//! [`RuleExpr`] always has exactly one canonical [`Rule`] (see
//! [`canonicalize`]).
//!
//! Assignments are a separate type from their sides, so nesting one
//! assignment inside another does not type-check:
//!
//! ```compile_fail
//! use ptrules::rule::{assign, variable};
//!
//! let inner = assign(variable("x"), variable("y")).unwrap();
//! let _ = assign(inner, variable("z"));
//! ```

use std::fmt::Display;

mod code;
pub use code::*;

/// The four leaf constructors.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum Site {
    Variable,
    Alloc,
    Dealloc,
    Null,
}

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum Wrapper {
    Reference,
    Dereference,
}

impl Display for Wrapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Wrapper::Reference => write!(f, "&"),
            Wrapper::Dereference => write!(f, "*"),
        }
    }
}

/// The shape of an [`Expr`] with the location erased, used in diagnostics.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct Form {
    pub wrapper: Option<Wrapper>,
    pub site: Site,
}

impl Display for Form {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(w) = self.wrapper {
            write!(f, "{}", w)?;
        }
        match self.site {
            Site::Variable => write!(f, "VAR"),
            Site::Alloc => write!(f, "ALLOC"),
            Site::Dealloc => write!(f, "DEALLOC"),
            Site::Null => write!(f, "NULL"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum GrammarError {
    #[error("cannot apply `{wrapper}` to `{form}`: expression is already wrapped")]
    DoubleWrap { wrapper: Wrapper, form: Form },
    #[error("no pointer rule has the shape `{lhs} = {rhs}`")]
    IllegalAssignment { lhs: Form, rhs: Form },
    #[error("`{0}` does not stand alone as a rule, only a deallocation site does")]
    NotStandalone(Form),
}

/// One side of an assignment: a leaf over a memory location, wrapped in at
/// most one reference or dereference.
///
/// The fields are private; use the builder functions.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct Expr<L> {
    wrapper: Option<Wrapper>,
    site: Site,
    location: L,
}

impl<L> Expr<L> {
    fn leaf(site: Site, location: L) -> Self {
        Expr {
            wrapper: None,
            site,
            location,
        }
    }

    fn wrap(self, wrapper: Wrapper) -> Result<Self, GrammarError> {
        if self.wrapper.is_some() {
            return Err(GrammarError::DoubleWrap {
                wrapper,
                form: self.form(),
            });
        }
        Ok(Expr {
            wrapper: Some(wrapper),
            ..self
        })
    }

    #[inline]
    pub fn form(&self) -> Form {
        Form {
            wrapper: self.wrapper,
            site: self.site,
        }
    }

    #[inline]
    pub fn location(&self) -> &L {
        &self.location
    }

    pub(crate) fn into_location(self) -> L {
        self.location
    }
}

impl<L: Display> Display for Expr<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(w) = self.wrapper {
            write!(f, "{}", w)?;
        }
        match self.site {
            Site::Variable => write!(f, "{}", self.location),
            Site::Alloc => write!(f, "ALLOC@{}", self.location),
            Site::Dealloc => write!(f, "DEALLOC@{}", self.location),
            Site::Null => write!(f, "NULL@{}", self.location),
        }
    }
}

#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub(crate) enum Statement<L> {
    Assign { lhs: Expr<L>, rhs: Expr<L> },
    Dealloc(Expr<L>),
}

/// A complete, well-formed rule expression: an assignment of one of the nine
/// legal shapes, or a standalone deallocation site.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct RuleExpr<L>(pub(crate) Statement<L>);

impl<L> RuleExpr<L> {
    /// Lift a bare [`dealloc_site`] into a rule expression.
    pub fn dealloc(expr: Expr<L>) -> Result<Self, GrammarError> {
        match expr.form() {
            Form {
                wrapper: None,
                site: Site::Dealloc,
            } => Ok(RuleExpr(Statement::Dealloc(expr))),
            form => Err(GrammarError::NotStandalone(form)),
        }
    }
}

impl<L: Display> Display for RuleExpr<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            Statement::Assign { lhs, rhs } => write!(f, "{} = {}", lhs, rhs),
            Statement::Dealloc(e) => write!(f, "{}", e),
        }
    }
}

#[inline]
pub fn variable<L>(location: L) -> Expr<L> {
    Expr::leaf(Site::Variable, location)
}

#[inline]
pub fn alloc_site<L>(location: L) -> Expr<L> {
    Expr::leaf(Site::Alloc, location)
}

#[inline]
pub fn dealloc_site<L>(location: L) -> Expr<L> {
    Expr::leaf(Site::Dealloc, location)
}

#[inline]
pub fn null_site<L>(location: L) -> Expr<L> {
    Expr::leaf(Site::Null, location)
}

/// `&expr`
pub fn reference_of<L>(expr: Expr<L>) -> Result<Expr<L>, GrammarError> {
    expr.wrap(Wrapper::Reference)
}

/// `*expr`
pub fn dereference_of<L>(expr: Expr<L>) -> Result<Expr<L>, GrammarError> {
    expr.wrap(Wrapper::Dereference)
}

/// `lhs = rhs`, provided the pair is one of the shapes in [`RuleKind`].
pub fn assign<L>(lhs: Expr<L>, rhs: Expr<L>) -> Result<RuleExpr<L>, GrammarError> {
    match RuleKind::of_assignment(lhs.form(), rhs.form()) {
        Some(_) => Ok(RuleExpr(Statement::Assign { lhs, rhs })),
        None => Err(GrammarError::IllegalAssignment {
            lhs: lhs.form(),
            rhs: rhs.form(),
        }),
    }
}
