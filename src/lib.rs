// SPDX-License-Identifier: BSD-3-Clause
//! Pointer rules for points-to analysis.
//!
//! Every instruction and global of a program that moves pointers around is
//! reduced to a small set of canonical assignments between memory locations
//! (see [`rule::RuleKind`]), which a points-to solver consumes.

#[cfg(feature = "llvm")]
mod arc;
pub mod extract;
pub mod index;
#[cfg(feature = "llvm")]
pub mod llvm;
pub mod models;
pub mod program;
pub mod rule;
pub mod translate;

#[cfg(feature = "llvm")]
pub use arc::UArc;
pub use extract::{program_rules, ProgramRules};
pub use index::{CallMaps, SignatureIndex};
pub use models::{Model, Models};
pub use program::{Call, Callee, Oracle, Program, ValueKind};
pub use rule::{canonicalize, Rule, RuleExpr, RuleKind};
pub use translate::{Error, RuleSink, Translator};
