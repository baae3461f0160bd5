// SPDX-License-Identifier: BSD-3-Clause
//! Handles with identity semantics for interned IR names.

use std::fmt::Display;
use std::hash::Hash;
use std::ptr;

use triomphe::Arc;

/// A thread-safe, reference-counting pointer to a unique `T`.
///
/// Each IR entity (an instruction, a parameter, a global) is allocated once
/// when the module is loaded, and every operand referring to it shares that
/// allocation. [`Eq`], [`Ord`] and [`Hash`] therefore compare and hash the
/// pointer: two handles are the same memory location exactly when they point
/// to the same allocation, whatever the names say.
#[derive(Debug)]
pub struct UArc<T>(Arc<T>);

fn _assert_uarc_send_sync()
where
    UArc<String>: Send + Sync,
{
}

impl<T> UArc<T> {
    pub(crate) fn new(t: T) -> Self {
        Self(Arc::new(t))
    }
}

impl<T> Clone for UArc<T> {
    #[inline]
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

/// Hashes the pointer
impl<T> Hash for UArc<T> {
    #[inline]
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        ptr::hash(Arc::as_ptr(&self.0), state)
    }
}

/// Compares the pointers
impl<T> PartialEq for UArc<T> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(Arc::as_ptr(&self.0), Arc::as_ptr(&other.0))
    }
}

impl<T> Eq for UArc<T> {}

impl<T> PartialOrd for UArc<T> {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for UArc<T> {
    #[inline]
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (Arc::as_ptr(&self.0) as usize).cmp(&(Arc::as_ptr(&other.0) as usize))
    }
}

/// Only displays the value
impl<T: Display> Display for UArc<T> {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl<T> std::ops::Deref for UArc<T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &Self::Target {
        self.0.deref()
    }
}
