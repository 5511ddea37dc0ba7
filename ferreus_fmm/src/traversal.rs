/////////////////////////////////////////////////////////////////////////////////////////////
//
// Implements the acceptance criterion and the dual tree traversal that builds interaction lists.
//
// Created on: 16 Oct 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use crate::{ndtree::NdTree, traits::Operators, utils};

/// Acceptance criterion: two regions may interact through their expansions when
/// `source_radius + target_radius < theta * distance(source_center, target_center)`.
#[inline(always)]
pub fn is_well_separated(
    theta: f64,
    source_center: &[f64],
    source_radius: f64,
    target_center: &[f64],
    target_radius: f64,
) -> bool {
    source_radius + target_radius < theta * utils::distance(source_center, target_center)
}

/// Per target cell interaction lists produced by [`dual_tree_traversal`].
///
/// Each list is indexed by target cell id and holds source cell ids.
#[derive(Debug, Clone, Default)]
pub struct InteractionLists {
    /// Well separated source cells translated into the target cell's local (M2L).
    pub m2l: Vec<Vec<usize>>,

    /// Well separated source leaves whose points are added to the target cell's local (P2L).
    pub p2l: Vec<Vec<usize>>,

    /// Well separated source cells evaluated directly at a target leaf's points (M2P).
    pub m2p: Vec<Vec<usize>>,

    /// Source leaves evaluated exactly at a target leaf's points (P2P).
    pub p2p: Vec<Vec<usize>>,
}

impl InteractionLists {
    fn with_capacity(num_target_cells: usize) -> Self {
        Self {
            m2l: vec![Vec::new(); num_target_cells],
            p2l: vec![Vec::new(); num_target_cells],
            m2p: vec![Vec::new(); num_target_cells],
            p2p: vec![Vec::new(); num_target_cells],
        }
    }

    /// Total number of entries in each list, in the order M2L, P2L, M2P, P2P.
    pub fn counts(&self) -> [usize; 4] {
        let count = |lists: &Vec<Vec<usize>>| lists.iter().map(Vec::len).sum::<usize>();
        [
            count(&self.m2l),
            count(&self.p2l),
            count(&self.m2p),
            count(&self.p2p),
        ]
    }
}

/// Descends the source and target trees together from their roots.
///
/// A well separated pair is recorded as M2L when available, otherwise as P2L
/// if the source cell is a leaf, otherwise as M2P if the target cell is a leaf.
/// Pairs that cannot be resolved that way are refined by splitting the larger
/// cell, and pairs of leaves that are still not separated are recorded as P2P.
pub fn dual_tree_traversal(
    source_tree: &NdTree,
    target_tree: &NdTree,
    theta: f64,
    operators: &Operators,
) -> InteractionLists {
    let mut lists = InteractionLists::with_capacity(target_tree.num_cells());
    let mut stack = vec![(source_tree.root(), target_tree.root())];

    while let Some((source, target)) = stack.pop() {
        let source_cell = source_tree.cell(source);
        let target_cell = target_tree.cell(target);

        if is_well_separated(
            theta,
            source_cell.center(),
            source_cell.radius(),
            target_cell.center(),
            target_cell.radius(),
        ) {
            if operators.m2l {
                lists.m2l[target].push(source);
                continue;
            }
            if operators.p2l && source_cell.is_leaf() {
                lists.p2l[target].push(source);
                continue;
            }
            if operators.m2p && target_cell.is_leaf() {
                lists.m2p[target].push(source);
                continue;
            }
        }

        if source_cell.is_leaf() && target_cell.is_leaf() {
            lists.p2p[target].push(source);
            continue;
        }

        let split_source = !source_cell.is_leaf()
            && (target_cell.is_leaf() || source_cell.radius() > target_cell.radius());

        // Children are pushed in reverse so they are visited in id order.
        if split_source {
            stack.extend(source_cell.children().rev().map(|child| (child, target)));
        } else {
            stack.extend(target_cell.children().rev().map(|child| (source, child)));
        }
    }

    lists
}

#[cfg(test)]
mod tests {
    use super::{dual_tree_traversal, is_well_separated};
    use crate::ndtree::{NdTree, TreeParams};
    use crate::traits::Operators;
    use faer::Mat;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_tree(n: usize, seed: u64, shift: f64) -> NdTree {
        let mut rng = StdRng::seed_from_u64(seed);
        let points = Mat::from_fn(n, 2, |_, _| rng.random_range(0.0..1.0) + shift);
        NdTree::new(
            points.as_ref(),
            &TreeParams {
                max_per_box: 8,
                min_box_size: 0.0,
            },
        )
        .unwrap()
    }

    /// Every (source point, target point) pair must be covered by exactly one
    /// list entry between an ancestor-or-self of each.
    fn assert_complete_cover(source: &NdTree, target: &NdTree, operators: Operators) {
        let lists = dual_tree_traversal(source, target, 0.5, &operators);

        let mut coverage = vec![0usize; source.num_points() * target.num_points()];
        for t in 0..target.num_cells() {
            let entries = lists.m2l[t]
                .iter()
                .chain(&lists.p2l[t])
                .chain(&lists.m2p[t])
                .chain(&lists.p2p[t]);
            for &s in entries {
                for i in target.point_range(t) {
                    for j in source.point_range(s) {
                        coverage[i * source.num_points() + j] += 1;
                    }
                }
            }
        }

        assert!(coverage.iter().all(|&c| c == 1));
    }

    #[test]
    fn acceptance_is_strict() {
        assert!(is_well_separated(0.5, &[0.0, 0.0], 0.1, &[1.0, 0.0], 0.1));
        assert!(!is_well_separated(0.5, &[0.0, 0.0], 0.25, &[1.0, 0.0], 0.25));
        assert!(!is_well_separated(0.5, &[0.0, 0.0], 0.0, &[0.0, 0.0], 0.0));
    }

    #[test]
    fn lists_cover_every_pair_once() {
        let source = random_tree(300, 1, 0.0);
        let target = random_tree(250, 2, 0.3);

        assert_complete_cover(&source, &target, Operators::all());
        assert_complete_cover(&source, &source, Operators::all());
    }

    #[test]
    fn fallback_operators_cover_every_pair_once() {
        let source = random_tree(200, 3, 0.0);
        let target = random_tree(200, 4, 1.5);

        let fallback = Operators {
            m2l: false,
            ..Operators::all()
        };
        assert_complete_cover(&source, &target, fallback);

        let lists = dual_tree_traversal(&source, &target, 0.5, &fallback);
        let [m2l, p2l, m2p, _] = lists.counts();
        assert_eq!(m2l, 0);
        assert!(p2l + m2p > 0);
    }

    #[test]
    fn far_apart_trees_interact_through_roots() {
        let source = random_tree(100, 5, 0.0);
        let target = random_tree(100, 6, 100.0);

        let lists = dual_tree_traversal(&source, &target, 0.5, &Operators::all());
        assert_eq!(lists.m2l[target.root()], vec![source.root()]);
        assert_eq!(lists.counts(), [1, 0, 0, 0]);
    }
}
