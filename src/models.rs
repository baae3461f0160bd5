// SPDX-License-Identifier: BSD-3-Clause
//! Memory-management models of called functions.
//!
//! Models are keyed by regular expressions over function names, so a JSON
//! file like
//!
//! ```json
//! {
//!   "^xmalloc$": ["alloc"],
//!   "^my_free$": ["dealloc"]
//! }
//! ```
//!
//! teaches the rule extraction about a program's own allocators.

use std::collections::HashMap;

use regex::RegexSet;

use crate::program::{Oracle, Program};

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Model {
    /// Returns fresh memory
    Alloc,
    /// Frees its first argument
    Dealloc,
    /// Copies from its second argument into its first
    Copy,
    /// Like `Copy`, for possibly-overlapping memory
    Move,
}

const LIBC: &[(&str, Model)] = &[
    ("^malloc$", Model::Alloc),
    ("^calloc$", Model::Alloc),
    ("^realloc$", Model::Alloc),
    ("^reallocarray$", Model::Alloc),
    ("^_Znwm$", Model::Alloc),
    ("^_Znam$", Model::Alloc),
    ("^free$", Model::Dealloc),
    ("^_ZdlPv$", Model::Dealloc),
    ("^_ZdaPv$", Model::Dealloc),
    ("^memcpy$", Model::Copy),
    ("^__memcpy_chk$", Model::Copy),
    (r"^llvm\.memcpy\..*$", Model::Copy),
    ("^memmove$", Model::Move),
    (r"^llvm\.memmove\..*$", Model::Move),
];

#[derive(Debug)]
pub struct Models {
    models: HashMap<String, Vec<Model>>,
    regexes: Vec<String>,
    set: RegexSet,
}

fn _assert_models_send_sync()
where
    Models: Send + Sync,
{
}

impl Default for Models {
    fn default() -> Self {
        Models {
            models: HashMap::new(),
            regexes: Vec::new(),
            set: RegexSet::empty(),
        }
    }
}

impl Models {
    pub fn new(models: HashMap<String, Vec<Model>>) -> Result<Self, regex::Error> {
        let regexes: Vec<String> = models.keys().cloned().collect();
        let set = RegexSet::new(&regexes)?;
        Ok(Models {
            models,
            regexes,
            set,
        })
    }

    /// The C and C++ standard allocators, deallocators, and copies.
    pub fn libc() -> Self {
        let mut models: HashMap<String, Vec<Model>> = HashMap::with_capacity(LIBC.len());
        for (regex, model) in LIBC {
            models.entry((*regex).to_string()).or_default().push(*model);
        }
        Self::new(models).expect("built-in models are valid regular expressions")
    }

    /// Union of two sets of models.
    pub fn extend(self, other: Models) -> Result<Self, regex::Error> {
        let mut models = self.models;
        for (regex, ms) in other.models {
            let entry = models.entry(regex).or_default();
            for m in ms {
                if !entry.contains(&m) {
                    entry.push(m);
                }
            }
        }
        Self::new(models)
    }

    pub fn models_for(&self, func: &str) -> Option<Vec<Model>> {
        let mut matched = false;
        let mut models = Vec::new();
        for m in self.set.matches(func) {
            matched = true;
            models.extend(self.models[&self.regexes[m]].iter().copied());
        }
        if matched {
            Some(models)
        } else {
            None
        }
    }

    pub fn has_model(&self, func: &str, model: Model) -> bool {
        self.set
            .matches(func)
            .into_iter()
            .any(|m| self.models[&self.regexes[m]].contains(&model))
    }
}

impl<P: Program + ?Sized> Oracle<P> for Models {
    fn is_memory_allocation(&self, program: &P, function: &P::Function) -> bool {
        self.has_model(&program.function_name(function), Model::Alloc)
    }

    fn is_memory_deallocation(&self, program: &P, function: &P::Function) -> bool {
        self.has_model(&program.function_name(function), Model::Dealloc)
    }

    fn is_memory_copy(&self, program: &P, function: &P::Function) -> bool {
        self.has_model(&program.function_name(function), Model::Copy)
    }

    fn is_memory_move(&self, program: &P, function: &P::Function) -> bool {
        self.has_model(&program.function_name(function), Model::Move)
    }
}
