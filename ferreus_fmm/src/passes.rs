/////////////////////////////////////////////////////////////////////////////////////////////
//
// Implements the level-ordered upward (P2M, M2M) and downward (L2L) tree passes.
//
// Created on: 16 Oct 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use crate::{backend::Backend, ndtree::NdTree, traits::Expansion, utils};

/// Performs the upward pass of the source tree:
/// * `P2M`: Accumulates the charges of each leaf's sources into its multipole.
/// * `M2M`: Translates and aggregates child multipoles into their parent,
///   level by level, moving up the tree.
///
/// Cells of one level only read multipoles of the level below, which is
/// complete before the level starts.
pub(crate) fn upward_pass<E: Expansion>(
    backend: &Backend,
    expansion: &E,
    tree: &NdTree,
    sources: &[E::Source],
    charges: &[E::Charge],
    multipoles: &mut [E::Multipole],
) {
    for level in (0..tree.num_levels()).rev() {
        let level_cells = tree.level_cells(level);

        // Children of this level are stored after it.
        let (head, finer) = multipoles.split_at_mut(level_cells.end);
        let level_multipoles = &mut head[level_cells.start..];
        let finer: &[E::Multipole] = finer;

        let scratch = || vec![0.0; tree.dimension()];
        backend.for_each_mut_with(level_multipoles, scratch, |translation, offset, multipole| {
            let cell = tree.cell(level_cells.start + offset);

            if cell.is_leaf() {
                let range = cell.point_range();
                expansion.p2m_block(
                    &sources[range.clone()],
                    &charges[range],
                    cell.center(),
                    multipole,
                );
            } else {
                for child in cell.children() {
                    let translation = &mut translation[..];
                    utils::difference_into(cell.center(), tree.center(child), translation);
                    expansion.m2m(&finer[child - level_cells.end], multipole, translation);
                }
            }
        });
    }
}

/// Performs the downward `L2L` pass of the target tree, propagating each
/// cell's local into its children, level by level, moving down the tree.
///
/// Must run after every far-field contribution has been added to the locals.
pub(crate) fn downward_pass<E: Expansion>(
    backend: &Backend,
    expansion: &E,
    tree: &NdTree,
    locals: &mut [E::Local],
) {
    for level in 1..tree.num_levels() {
        let level_cells = tree.level_cells(level);

        // Parents of this level are stored before it.
        let (coarser, tail) = locals.split_at_mut(level_cells.start);
        let level_locals = &mut tail[..level_cells.len()];
        let coarser: &[E::Local] = coarser;

        let scratch = || vec![0.0; tree.dimension()];
        backend.for_each_mut_with(level_locals, scratch, |translation, offset, local| {
            let id = level_cells.start + offset;

            if let Some(parent) = tree.parent(id) {
                let translation = &mut translation[..];
                utils::difference_into(tree.center(id), tree.center(parent), translation);
                expansion.l2l(&coarser[parent], local, translation);
            }
        });
    }
}
