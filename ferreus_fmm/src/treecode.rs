/////////////////////////////////////////////////////////////////////////////////////////////
//
// Implements the one-sided treecode: source multipoles evaluated directly at each target.
//
// Created on: 16 Oct 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use crate::{
    backend::Backend,
    config::Strategy,
    context::DataContext,
    evaluator::Evaluator,
    ndtree::NdTree,
    passes,
    traits::{coordinates, Expansion},
    traversal,
};
use std::slice;

/// Treecode strategy.
///
/// Multipoles are built bottom-up on the source tree, then every target walks
/// the source tree from the root: a well separated cell contributes through
/// `M2P`, a leaf that is not separated contributes through `P2P`, and any other
/// cell is opened.
#[derive(Debug, Clone)]
pub struct TreecodeEvaluator {
    backend: Backend,
    theta: f64,
}

impl TreecodeEvaluator {
    pub fn new(backend: Backend, theta: f64) -> Self {
        Self { backend, theta }
    }

    fn evaluate_target<E: Expansion>(
        &self,
        expansion: &E,
        tree: &NdTree,
        multipoles: &[E::Multipole],
        sources: &[E::Source],
        charges: &[E::Charge],
        target: &E::Target,
        result: &mut E::Result,
    ) {
        let position = coordinates(target);
        let mut stack = vec![tree.root()];

        while let Some(id) = stack.pop() {
            let cell = tree.cell(id);

            if traversal::is_well_separated(self.theta, cell.center(), cell.radius(), &position, 0.0)
            {
                expansion.m2p(&multipoles[id], cell.center(), target, result);
            } else if cell.is_leaf() {
                let range = cell.point_range();
                expansion.p2p_block(
                    slice::from_ref(target),
                    &sources[range.clone()],
                    &charges[range],
                    slice::from_mut(result),
                );
            } else {
                stack.extend(cell.children().rev());
            }
        }
    }
}

impl<E: Expansion> Evaluator<E> for TreecodeEvaluator {
    fn strategy(&self) -> Strategy {
        Strategy::Treecode
    }

    fn execute(
        &self,
        context: &mut DataContext<E>,
        charges: &[E::Charge],
        results: &mut [E::Result],
    ) {
        context.reset_multipoles();

        let parts = context.parts();
        let tree = parts.tree_context.source_tree();
        let sources = parts.tree_context.sources();
        let targets = parts.tree_context.targets();

        passes::upward_pass(
            &self.backend,
            parts.expansion,
            tree,
            sources,
            charges,
            &mut parts.multipoles[..],
        );

        let multipoles: &[E::Multipole] = &parts.multipoles[..];
        let expansion = parts.expansion;

        self.backend.for_each_mut(results, |i, result| {
            self.evaluate_target(
                expansion,
                tree,
                multipoles,
                sources,
                charges,
                &targets[i],
                result,
            );
        });
    }
}
