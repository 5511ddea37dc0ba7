/////////////////////////////////////////////////////////////////////////////////////////////
//
// Implements exact evaluation of kernel matrix products by direct summation.
//
// Created on: 16 Oct 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! Exact evaluation of `results = K * charges` by direct summation.

use crate::{
    backend::Backend,
    config::Strategy,
    context::DataContext,
    evaluator::Evaluator,
    traits::{Expansion, Kernel},
};
use std::slice;

/// Accumulates `K(t_i, s_j) * c_j` over every pair into `results`.
///
/// Targets are independent, so they are distributed over the backend.
pub fn matvec<K: Kernel>(
    kernel: &K,
    sources: &[K::Source],
    charges: &[K::Charge],
    targets: &[K::Target],
    results: &mut [K::Result],
    backend: &Backend,
) {
    backend.for_each_mut(results, |i, result| {
        kernel.p2p_block(
            slice::from_ref(&targets[i]),
            sources,
            charges,
            slice::from_mut(result),
        );
    });
}

/// Direct summation over a point set that is both the sources and the targets.
///
/// Each unordered pair is evaluated once, using [`Kernel::transpose`] to obtain
/// the reverse interaction. Falls back to evaluating the reverse interaction
/// when the kernel does not provide a transpose.
pub fn matvec_symmetric<K: Kernel>(
    kernel: &K,
    sources: &[K::Source],
    charges: &[K::Charge],
    targets: &[K::Target],
    results: &mut [K::Result],
) {
    for i in 0..targets.len() {
        kernel.p2p(&targets[i], &sources[i], &charges[i], &mut results[i]);

        for j in (i + 1)..targets.len() {
            let value = kernel.evaluate(&targets[i], &sources[j]);
            let reverse = match kernel.transpose(&value) {
                Some(reverse) => reverse,
                None => kernel.evaluate(&targets[j], &sources[i]),
            };

            results[i] += value * charges[j].clone();
            results[j] += reverse * charges[i].clone();
        }
    }
}

/// Exact strategy: every interaction evaluated directly.
#[derive(Debug, Clone)]
pub struct DirectEvaluator {
    backend: Backend,
    symmetric: bool,
}

impl DirectEvaluator {
    /// `symmetric` requests the single pass over unordered pairs; it only
    /// applies to a single tree context and a sequential backend.
    pub fn new(backend: Backend, symmetric: bool) -> Self {
        Self {
            backend,
            symmetric: symmetric && backend == Backend::Sequential,
        }
    }
}

impl<E: Expansion> Evaluator<E> for DirectEvaluator {
    fn strategy(&self) -> Strategy {
        Strategy::Exact
    }

    fn execute(
        &self,
        context: &mut DataContext<E>,
        charges: &[E::Charge],
        results: &mut [E::Result],
    ) {
        let expansion = context.expansion();

        if self.symmetric && context.tree_context().is_single_tree() {
            matvec_symmetric(expansion, context.sources(), charges, context.targets(), results);
        } else {
            matvec(
                expansion,
                context.sources(),
                charges,
                context.targets(),
                results,
                &self.backend,
            );
        }
    }
}
