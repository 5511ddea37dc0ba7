/////////////////////////////////////////////////////////////////////////////////////////////
//
// Implements the two-sided fast multipole evaluation over precomputed interaction lists.
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
    traits::{Expansion, Operators},
    traversal::{self, InteractionLists},
    utils,
};
use std::mem;

/// Fast multipole strategy.
///
/// The interaction lists only depend on the geometry, so they are built once
/// when the evaluator is created and reused by every execution.
#[derive(Debug, Clone)]
pub struct FmmEvaluator {
    backend: Backend,
    lists: InteractionLists,
}

impl FmmEvaluator {
    pub fn new(
        backend: Backend,
        source_tree: &NdTree,
        target_tree: &NdTree,
        theta: f64,
        operators: &Operators,
    ) -> Self {
        let lists = traversal::dual_tree_traversal(source_tree, target_tree, theta, operators);

        let [m2l, p2l, m2p, p2p] = lists.counts();
        log::debug!(
            "interaction lists: {} M2L, {} P2L, {} M2P, {} P2P",
            m2l,
            p2l,
            m2p,
            p2p
        );

        Self { backend, lists }
    }

    pub fn interaction_lists(&self) -> &InteractionLists {
        &self.lists
    }
}

impl<E: Expansion> Evaluator<E> for FmmEvaluator {
    fn strategy(&self) -> Strategy {
        Strategy::Fmm
    }

    fn execute(
        &self,
        context: &mut DataContext<E>,
        charges: &[E::Charge],
        results: &mut [E::Result],
    ) {
        context.reset_multipoles();
        context.reset_locals();

        let parts = context.parts();
        let expansion = parts.expansion;
        let source_tree = parts.tree_context.source_tree();
        let target_tree = parts.tree_context.target_tree();
        let sources = parts.tree_context.sources();
        let targets = parts.tree_context.targets();
        let lists = &self.lists;

        passes::upward_pass(
            &self.backend,
            expansion,
            source_tree,
            sources,
            charges,
            &mut parts.multipoles[..],
        );
        let multipoles: &[E::Multipole] = &parts.multipoles[..];

        // Far field into each target cell's own local (M2L, P2L).
        let scratch = || vec![0.0; target_tree.dimension()];
        self.backend.for_each_mut_with(
            &mut parts.locals[..],
            scratch,
            |translation, target, local| {
                let center = target_tree.center(target);

                for &source in &lists.m2l[target] {
                    let translation = &mut translation[..];
                    utils::difference_into(center, source_tree.center(source), translation);
                    expansion.m2l(&multipoles[source], local, translation);
                }

                for &source in &lists.p2l[target] {
                    let range = source_tree.point_range(source);
                    expansion.p2l_block(&sources[range.clone()], &charges[range], center, local);
                }
            },
        );

        passes::downward_pass(&self.backend, expansion, target_tree, &mut parts.locals[..]);
        let locals: &[E::Local] = &parts.locals[..];

        // Leaves are ordered by their first point, so their point ranges tile
        // the results in order.
        let mut leaf_results: Vec<(usize, &mut [E::Result])> =
            Vec::with_capacity(target_tree.leaves().len());
        let mut rest = results;
        for &leaf in target_tree.leaves() {
            let num_targets = target_tree.point_range(leaf).len();
            let (chunk, tail) = mem::take(&mut rest).split_at_mut(num_targets);
            leaf_results.push((leaf, chunk));
            rest = tail;
        }

        self.backend.for_each_mut(&mut leaf_results, |_, (leaf, chunk)| {
            let leaf = *leaf;
            let center = target_tree.center(leaf);
            let leaf_targets = &targets[target_tree.point_range(leaf)];

            expansion.l2p_block(&locals[leaf], center, leaf_targets, chunk);

            for &source in &lists.m2p[leaf] {
                expansion.m2p_block(
                    &multipoles[source],
                    source_tree.center(source),
                    leaf_targets,
                    chunk,
                );
            }

            for &source in &lists.p2p[leaf] {
                let range = source_tree.point_range(source);
                expansion.p2p_block(
                    leaf_targets,
                    &sources[range.clone()],
                    &charges[range],
                    chunk,
                );
            }
        });
    }
}
