/////////////////////////////////////////////////////////////////////////////////////////////
//
// Constructs dimension-generic hierarchical trees over point sets, stored level by level.
//
// Created on: 16 Oct 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use crate::{error::FmmError, morton, utils};
use faer::MatRef;
use rayon::prelude::*;
use std::fmt;
use std::ops::Range;

/// Parameters controlling tree refinement.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TreeParams {
    /// Maximum number of points in a leaf cell before it is subdivided.
    pub max_per_box: usize,

    /// Cells are not subdivided when their children would be smaller than this.
    pub min_box_size: f64,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_per_box: 64,
            min_box_size: 0.0,
        }
    }
}

impl TreeParams {
    pub fn validate(&self) -> Result<(), FmmError> {
        if self.max_per_box == 0 {
            return Err(FmmError::InvalidParameter {
                name: "max_per_box",
                reason: "must be at least 1".to_string(),
            });
        }

        if !(self.min_box_size.is_finite() && self.min_box_size >= 0.0) {
            return Err(FmmError::InvalidParameter {
                name: "min_box_size",
                reason: format!("must be non-negative and finite, got {}", self.min_box_size),
            });
        }

        Ok(())
    }
}

/// A single cell of an [`NdTree`].
///
/// A cell owns no points, only a contiguous range into the tree-ordered point array.
#[derive(Debug, Clone)]
pub struct TreeCell {
    level: usize,
    parent: Option<usize>,
    children: Range<usize>,
    points: Range<usize>,
    center: Vec<f64>,
    half_side: f64,
}

impl TreeCell {
    /// Level of the cell, 0 being the root.
    pub fn level(&self) -> usize {
        self.level
    }

    pub fn parent(&self) -> Option<usize> {
        self.parent
    }

    /// Ids of the child cells. Empty for a leaf.
    pub fn children(&self) -> Range<usize> {
        self.children.clone()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Range of tree-ordered point positions contained in the cell.
    pub fn point_range(&self) -> Range<usize> {
        self.points.clone()
    }

    pub fn num_points(&self) -> usize {
        self.points.len()
    }

    pub fn center(&self) -> &[f64] {
        &self.center
    }

    /// Half of the side length of the (cubic) cell.
    pub fn half_side(&self) -> f64 {
        self.half_side
    }

    /// Distance from the centre to a corner of the cell.
    pub fn radius(&self) -> f64 {
        self.half_side * (self.center.len() as f64).sqrt()
    }

    /// Side lengths of the cell along each axis.
    pub fn extents(&self) -> Vec<f64> {
        vec![2.0 * self.half_side; self.center.len()]
    }
}

/// A hierarchical decomposition of a point set into nested cubic cells.
///
/// Cells are stored breadth first, so the cells of each level occupy a
/// contiguous id range and the children of every cell are contiguous. Point
/// ranges of children exactly partition the range of their parent.
#[derive(Debug, Clone)]
pub struct NdTree {
    dimension: usize,
    cells: Vec<TreeCell>,
    levels: Vec<Range<usize>>,
    leaves: Vec<usize>,
    permutation: Vec<usize>,
    inverse_permutation: Vec<usize>,
}

impl NdTree {
    /// Builds a tree over the rows of `points`, an (N, D) matrix.
    ///
    /// Points are Morton sorted at the deepest admissible level, then cells are
    /// refined breadth first until they hold at most `max_per_box` points, the
    /// maximum level is reached, or children would be smaller than `min_box_size`.
    pub fn new(points: MatRef<f64>, params: &TreeParams) -> Result<Self, FmmError> {
        params.validate()?;

        let dimension = points.ncols();
        if dimension == 0 || dimension > 63 {
            return Err(FmmError::InvalidDimension { dimension });
        }

        for (row, point) in points.row_iter().enumerate() {
            if point.iter().any(|c| !c.is_finite()) {
                return Err(FmmError::InvalidParameter {
                    name: "points",
                    reason: format!("point at row {} has a non-finite coordinate", row),
                });
            }
        }

        let extents = utils::get_pointarray_extents(points);
        let (center, radius) = morton::calculate_tree_center_and_radius(&extents);
        let max_level = morton::max_level(dimension);

        let displacement: Vec<f64> = center.iter().map(|&c| c - radius).collect();
        let side_length = morton::get_side_length(radius, max_level);

        let codes: Vec<u64> = (0..points.nrows())
            .into_par_iter()
            .map(|i| {
                let anchor =
                    morton::point_to_anchor(points.row(i), max_level, &displacement, side_length);
                morton::encode_anchor(&anchor, max_level)
            })
            .collect();

        let permutation = utils::argsort(&codes);
        let sorted_codes: Vec<u64> = permutation.iter().map(|&i| codes[i]).collect();

        let mut inverse_permutation = vec![0; permutation.len()];
        for (position, &original) in permutation.iter().enumerate() {
            inverse_permutation[original] = position;
        }

        let mut cells = vec![TreeCell {
            level: 0,
            parent: None,
            children: 0..0,
            points: 0..points.nrows(),
            center,
            half_side: radius,
        }];
        let mut levels = vec![0..1];

        let mut level_start = 0;
        loop {
            let level_end = cells.len();
            let level = cells[level_start].level;
            let child_level = level + 1;

            for cell_id in level_start..level_end {
                let child_half_side = 0.5 * cells[cell_id].half_side;

                let subdivide = cells[cell_id].points.len() > params.max_per_box
                    && child_level <= max_level
                    && 2.0 * child_half_side >= params.min_box_size;

                if !subdivide {
                    continue;
                }

                let first_child = cells.len();
                let range = cells[cell_id].points.clone();
                let mut start = range.start;

                // The range is Morton sorted, so each child digit is a contiguous run.
                while start < range.end {
                    let digit =
                        morton::child_digit(sorted_codes[start], child_level, max_level, dimension);
                    let run = sorted_codes[start..range.end].partition_point(|&code| {
                        morton::child_digit(code, child_level, max_level, dimension) <= digit
                    });

                    let center =
                        morton::child_center(&cells[cell_id].center, child_half_side, digit);

                    cells.push(TreeCell {
                        level: child_level,
                        parent: Some(cell_id),
                        children: 0..0,
                        points: start..start + run,
                        center,
                        half_side: child_half_side,
                    });

                    start += run;
                }

                cells[cell_id].children = first_child..cells.len();
            }

            if cells.len() == level_end {
                break;
            }

            levels.push(level_end..cells.len());
            level_start = level_end;
        }

        let mut leaves: Vec<usize> = (0..cells.len()).filter(|&id| cells[id].is_leaf()).collect();
        leaves.sort_by_key(|&id| cells[id].points.start);

        log::debug!(
            "built tree over {} points: {} cells, {} leaves, {} levels",
            points.nrows(),
            cells.len(),
            leaves.len(),
            levels.len()
        );

        Ok(Self {
            dimension,
            cells,
            levels,
            leaves,
            permutation,
            inverse_permutation,
        })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn num_points(&self) -> usize {
        self.permutation.len()
    }

    pub fn num_cells(&self) -> usize {
        self.cells.len()
    }

    /// Number of levels, including the root level.
    pub fn num_levels(&self) -> usize {
        self.levels.len()
    }

    pub fn root(&self) -> usize {
        0
    }

    pub fn cell(&self, id: usize) -> &TreeCell {
        &self.cells[id]
    }

    pub fn cells(&self) -> &[TreeCell] {
        &self.cells
    }

    pub fn parent(&self, id: usize) -> Option<usize> {
        self.cells[id].parent
    }

    pub fn children(&self, id: usize) -> Range<usize> {
        self.cells[id].children()
    }

    /// Cells sharing a parent with `id`, excluding `id` itself.
    pub fn siblings(&self, id: usize) -> impl Iterator<Item = usize> + '_ {
        let range = match self.cells[id].parent {
            Some(parent) => self.cells[parent].children(),
            None => 0..0,
        };
        range.filter(move |&sibling| sibling != id)
    }

    pub fn is_leaf(&self, id: usize) -> bool {
        self.cells[id].is_leaf()
    }

    pub fn level(&self, id: usize) -> usize {
        self.cells[id].level
    }

    pub fn point_range(&self, id: usize) -> Range<usize> {
        self.cells[id].point_range()
    }

    pub fn center(&self, id: usize) -> &[f64] {
        &self.cells[id].center
    }

    pub fn half_side(&self, id: usize) -> f64 {
        self.cells[id].half_side
    }

    pub fn radius(&self, id: usize) -> f64 {
        self.cells[id].radius()
    }

    pub fn extents(&self, id: usize) -> Vec<f64> {
        self.cells[id].extents()
    }

    /// Ids of the cells at `level`.
    pub fn level_cells(&self, level: usize) -> Range<usize> {
        self.levels[level].clone()
    }

    /// Ids of the leaf cells, ordered by the start of their point range.
    pub fn leaves(&self) -> &[usize] {
        &self.leaves
    }

    /// Maps a tree position to the original index of the point stored there.
    pub fn permutation(&self) -> &[usize] {
        &self.permutation
    }

    /// Maps an original point index to its tree position.
    pub fn inverse_permutation(&self) -> &[usize] {
        &self.inverse_permutation
    }

    /// Reorders `values`, given in original order, into tree order.
    pub fn permute<T: Clone>(&self, values: &[T]) -> Vec<T> {
        self.permutation.iter().map(|&i| values[i].clone()).collect()
    }
}

impl fmt::Display for NdTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "NdTree: {} points, {} dimensions, {} cells, {} leaves",
            self.num_points(),
            self.dimension,
            self.num_cells(),
            self.leaves.len()
        )?;

        for (level, range) in self.levels.iter().enumerate() {
            let num_leaves = range.clone().filter(|&id| self.is_leaf(id)).count();
            let max_points = range
                .clone()
                .map(|id| self.cells[id].num_points())
                .max()
                .unwrap_or(0);
            writeln!(
                f,
                "  level {:>2}: {:>8} cells {:>8} leaves, side {:.3e}, max points {}",
                level,
                range.len(),
                num_leaves,
                2.0 * self.cells[range.start].half_side,
                max_points
            )?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{NdTree, TreeParams};
    use crate::FmmError;
    use faer::Mat;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_points(n: usize, dim: usize, seed: u64) -> Mat<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        Mat::from_fn(n, dim, |_, _| rng.random_range(-1.0..1.0))
    }

    fn params(max_per_box: usize) -> TreeParams {
        TreeParams {
            max_per_box,
            min_box_size: 0.0,
        }
    }

    #[test]
    fn children_partition_parent_ranges() {
        for (n, dim, seed) in [(500, 1, 1u64), (800, 2, 2u64), (1000, 3, 3u64), (300, 5, 4u64)] {
            let points = random_points(n, dim, seed);
            let tree = NdTree::new(points.as_ref(), &params(16)).unwrap();

            for id in 0..tree.num_cells() {
                let cell = tree.cell(id);
                if cell.is_leaf() {
                    assert!(cell.num_points() <= 16);
                    continue;
                }

                let mut next = cell.point_range().start;
                for child in cell.children() {
                    let child_range = tree.point_range(child);
                    assert_eq!(child_range.start, next);
                    assert!(!child_range.is_empty());
                    assert_eq!(tree.parent(child), Some(id));
                    assert_eq!(tree.level(child), cell.level() + 1);
                    next = child_range.end;
                }
                assert_eq!(next, cell.point_range().end);
            }
        }
    }

    #[test]
    fn leaves_cover_every_point_once() {
        let points = random_points(2000, 3, 7);
        let tree = NdTree::new(points.as_ref(), &params(32)).unwrap();

        let mut next = 0;
        for &leaf in tree.leaves() {
            let range = tree.point_range(leaf);
            assert_eq!(range.start, next);
            next = range.end;
        }
        assert_eq!(next, 2000);
    }

    #[test]
    fn points_lie_inside_their_leaf() {
        let points = random_points(1000, 2, 11);
        let tree = NdTree::new(points.as_ref(), &params(8)).unwrap();

        for &leaf in tree.leaves() {
            let center = tree.center(leaf);
            let half_side = tree.half_side(leaf);
            for position in tree.point_range(leaf) {
                let original = tree.permutation()[position];
                for axis in 0..2 {
                    let offset = (points.get(original, axis) - center[axis]).abs();
                    assert!(offset <= half_side * (1.0 + 1e-9));
                }
            }
        }
    }

    #[test]
    fn permutation_is_a_bijection() {
        let points = random_points(777, 3, 5);
        let tree = NdTree::new(points.as_ref(), &params(10)).unwrap();

        let original: Vec<usize> = (0..777).collect();
        let permuted = tree.permute(&original);
        let mut sorted = permuted.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, original);

        for (position, &index) in permuted.iter().enumerate() {
            assert_eq!(tree.inverse_permutation()[index], position);
        }
    }

    #[test]
    fn construction_is_deterministic() {
        let points = random_points(1500, 3, 9);
        let a = NdTree::new(points.as_ref(), &params(20)).unwrap();
        let b = NdTree::new(points.as_ref(), &params(20)).unwrap();

        assert_eq!(a.permutation(), b.permutation());
        assert_eq!(a.num_cells(), b.num_cells());
        for id in 0..a.num_cells() {
            assert_eq!(a.point_range(id), b.point_range(id));
            assert_eq!(a.center(id), b.center(id));
        }
    }

    #[test]
    fn levels_are_contiguous_and_siblings_share_parent() {
        let points = random_points(600, 2, 13);
        let tree = NdTree::new(points.as_ref(), &params(4)).unwrap();

        let mut expected_start = 0;
        for level in 0..tree.num_levels() {
            let range = tree.level_cells(level);
            assert_eq!(range.start, expected_start);
            assert!(range.clone().all(|id| tree.level(id) == level));
            expected_start = range.end;
        }
        assert_eq!(expected_start, tree.num_cells());

        let child = tree.children(tree.root()).start;
        for sibling in tree.siblings(child) {
            assert_ne!(sibling, child);
            assert_eq!(tree.parent(sibling), Some(tree.root()));
        }
        assert_eq!(tree.siblings(tree.root()).count(), 0);
    }

    #[test]
    fn empty_point_set_gives_single_root() {
        let points = Mat::<f64>::zeros(0, 3);
        let tree = NdTree::new(points.as_ref(), &params(4)).unwrap();

        assert_eq!(tree.num_cells(), 1);
        assert_eq!(tree.num_levels(), 1);
        assert!(tree.is_leaf(tree.root()));
        assert!(tree.point_range(tree.root()).is_empty());
        assert_eq!(tree.leaves(), &[0]);
    }

    #[test]
    fn min_box_size_stops_refinement() {
        let points = random_points(1000, 2, 17);
        let tree = NdTree::new(
            points.as_ref(),
            &TreeParams {
                max_per_box: 1,
                min_box_size: 0.5,
            },
        )
        .unwrap();

        for id in 0..tree.num_cells() {
            assert!(2.0 * tree.half_side(id) >= 0.5);
        }
    }

    #[test]
    fn coincident_points_stop_at_maximum_level() {
        let points = Mat::from_fn(50, 2, |_, _| 0.25);
        let tree = NdTree::new(points.as_ref(), &params(4)).unwrap();

        assert_eq!(tree.num_levels(), crate::morton::max_level(2) + 1);
        assert_eq!(tree.leaves().len(), 1);
    }

    #[test]
    fn rejects_invalid_input() {
        let points = Mat::from_fn(3, 2, |i, _| if i == 1 { f64::NAN } else { 0.0 });
        assert!(matches!(
            NdTree::new(points.as_ref(), &params(4)),
            Err(FmmError::InvalidParameter { name: "points", .. })
        ));

        let points = Mat::<f64>::zeros(3, 0);
        assert!(matches!(
            NdTree::new(points.as_ref(), &params(4)),
            Err(FmmError::InvalidDimension { dimension: 0 })
        ));
    }
}
