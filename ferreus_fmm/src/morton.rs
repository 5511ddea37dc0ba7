/////////////////////////////////////////////////////////////////////////////////////////////
//
// Implements dimension-generic Morton (Z-order) encoding used to sort points into tree order.
//
// Created on: 16 Oct 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use faer::RowRef;

/// Upper bound on the tree depth regardless of dimension.
pub const MAXIMUM_LEVEL: usize = 20;

/// Number of bits available for the interleaved anchor coordinates.
const CODE_BITS: usize = 63;

/// Deepest level whose Morton codes fit in a `u64` for the given dimension.
pub fn max_level(dimension: usize) -> usize {
    (CODE_BITS / dimension.max(1)).min(MAXIMUM_LEVEL)
}

/// Gets the side length of a cell for the given level.
pub fn get_side_length(radius: f64, level: usize) -> f64 {
    2.0 * radius / ((1u64 << level) as f64)
}

/// Finds the integer anchor of the cell at `level` containing `point`.
///
/// Points on the upper boundary of the root cell are clamped into the last cell.
pub fn point_to_anchor(
    point: RowRef<f64>,
    level: usize,
    displacement: &[f64],
    side_length: f64,
) -> Vec<u64> {
    let max_anchor = (1u64 << level) - 1;

    point
        .iter()
        .zip(displacement.iter())
        .map(|(coordinate, lower)| {
            let scaled = ((coordinate - lower) / side_length).floor();
            if scaled <= 0.0 {
                0
            } else {
                (scaled as u64).min(max_anchor)
            }
        })
        .collect()
}

/// Interleaves the bits of an anchor, most significant level first.
///
/// Within each level the first axis occupies the most significant bit, so the
/// `dimension` bits belonging to a level form that cell's child index.
pub fn encode_anchor(anchor: &[u64], level: usize) -> u64 {
    let mut code = 0u64;

    for bit in (0..level).rev() {
        for coordinate in anchor {
            code = (code << 1) | ((coordinate >> bit) & 1);
        }
    }

    code
}

/// Extracts the child index selected at `level` (1-based) from a code encoded at `max_level`.
pub fn child_digit(code: u64, level: usize, max_level: usize, dimension: usize) -> usize {
    let shift = (max_level - level) * dimension;
    let mask = (1u64 << dimension) - 1;
    ((code >> shift) & mask) as usize
}

/// Offsets a parent centre to the centre of child `digit`.
pub fn child_center(parent_center: &[f64], child_half_side: f64, digit: usize) -> Vec<f64> {
    let dimension = parent_center.len();

    parent_center
        .iter()
        .enumerate()
        .map(|(axis, c)| {
            if (digit >> (dimension - 1 - axis)) & 1 == 1 {
                c + child_half_side
            } else {
                c - child_half_side
            }
        })
        .collect()
}

/// Calculates the centre and half side length of the cube enclosing the given extents.
///
/// Extents are laid out as `[min_0, ..., min_n, max_0, ..., max_n]`. Degenerate
/// extents (a single point or no points) produce a unit cube.
pub fn calculate_tree_center_and_radius(extents: &[f64]) -> (Vec<f64>, f64) {
    let dimensions = extents.len() / 2;
    let lower_bounds = &extents[0..dimensions];
    let upper_bounds = &extents[dimensions..];

    let center: Vec<f64> = lower_bounds
        .iter()
        .zip(upper_bounds.iter())
        .map(|(&lower, &upper)| 0.5 * (lower + upper))
        .collect();

    let radius = lower_bounds
        .iter()
        .zip(upper_bounds.iter())
        .map(|(&lower, &upper)| 0.5 * (upper - lower))
        .fold(0.0, f64::max);

    let radius = if radius > 0.0 {
        radius * (1.0 + 1e-9)
    } else {
        0.5
    };

    (center, radius)
}
