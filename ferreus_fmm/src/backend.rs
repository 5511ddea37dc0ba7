/////////////////////////////////////////////////////////////////////////////////////////////
//
// Dispatches batches of independent per-cell operators to the selected execution backend.
//
// Created on: 16 Oct 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Execution backend for per-cell operator batches.
///
/// Traversal and pass ordering are identical for every backend; only the way a
/// batch of independent operators is run differs.
#[derive(Debug, Default, Copy, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum Backend {
    /// Run every batch on the calling thread.
    Sequential,

    /// Run every batch on the rayon thread pool.
    #[default]
    Parallel,

    /// Offload batches to an accelerator. No accelerator is compiled into this
    /// crate, so it resolves to [`Backend::Sequential`].
    Accelerator,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Backend::Sequential => "sequential",
            Backend::Parallel => "parallel",
            Backend::Accelerator => "accelerator",
        };
        write!(f, "{}", name)
    }
}

impl Backend {
    /// Whether this backend can run in the current build.
    pub fn is_available(&self) -> bool {
        !matches!(self, Backend::Accelerator)
    }

    /// Returns the backend that will actually run, falling back to
    /// [`Backend::Sequential`] with a warning when the requested one is unavailable.
    pub fn resolve(self) -> Backend {
        if self.is_available() {
            self
        } else {
            log::warn!(
                "{} backend is not available in this build, falling back to sequential execution",
                self
            );
            Backend::Sequential
        }
    }

    /// Applies `op` to every item, passing the item's index within `items`.
    ///
    /// Returns once every item has been processed, so consecutive calls act as
    /// a barrier between dependent passes.
    pub(crate) fn for_each_mut<T, F>(&self, items: &mut [T], op: F)
    where
        T: Send,
        F: Fn(usize, &mut T) + Send + Sync,
    {
        match self {
            Backend::Parallel => items
                .par_iter_mut()
                .enumerate()
                .for_each(|(idx, item)| op(idx, item)),
            Backend::Sequential | Backend::Accelerator => items
                .iter_mut()
                .enumerate()
                .for_each(|(idx, item)| op(idx, item)),
        }
    }

    /// As [`Backend::for_each_mut`], with a scratch value from `init` shared by
    /// the items a worker processes.
    pub(crate) fn for_each_mut_with<T, S, I, F>(&self, items: &mut [T], init: I, op: F)
    where
        T: Send,
        I: Fn() -> S + Send + Sync,
        F: Fn(&mut S, usize, &mut T) + Send + Sync,
    {
        match self {
            Backend::Parallel => items
                .par_iter_mut()
                .enumerate()
                .for_each_init(init, |scratch, (idx, item)| op(scratch, idx, item)),
            Backend::Sequential | Backend::Accelerator => {
                let mut scratch = init();
                items
                    .iter_mut()
                    .enumerate()
                    .for_each(|(idx, item)| op(&mut scratch, idx, item))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Backend;

    #[test]
    fn accelerator_resolves_to_sequential() {
        assert!(!Backend::Accelerator.is_available());
        assert_eq!(Backend::Accelerator.resolve(), Backend::Sequential);
        assert_eq!(Backend::Parallel.resolve(), Backend::Parallel);
    }

    #[test]
    fn for_each_mut_visits_every_index_once() {
        for backend in [Backend::Sequential, Backend::Parallel] {
            let mut items = vec![0usize; 1000];
            backend.for_each_mut(&mut items, |idx, item| *item += idx + 1);
            assert!(items.iter().enumerate().all(|(idx, &v)| v == idx + 1));
        }
    }

    #[test]
    fn for_each_mut_with_reuses_scratch() {
        for backend in [Backend::Sequential, Backend::Parallel] {
            let mut items = vec![0usize; 1000];
            backend.for_each_mut_with(
                &mut items,
                || vec![0usize; 2],
                |scratch, idx, item| {
                    scratch[0] = idx;
                    scratch[1] = 2 * idx;
                    *item = scratch[0] + scratch[1];
                },
            );
            assert!(items.iter().enumerate().all(|(idx, &v)| v == 3 * idx));
        }
    }
}
