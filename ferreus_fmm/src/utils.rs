/////////////////////////////////////////////////////////////////////////////////////////////
//
// Provides utility routines for bounding box computation, sorting and small vector arithmetic.
//
// Created on: 16 Oct 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use crate::traits::Embed;
use faer::{Mat, MatRef};

/// Computes the axis aligned bounding box (AABB) extents of a matrix of points.
///
/// Returns a flat vector containing the minimum and maximum values along each column (dimension)
/// of the input matrix. The result is arranged as:
///
/// `[min_0, min_1, ..., min_n, max_0, max_1, ..., max_n]`
///
/// where `n` is the number of columns in the matrix. An empty matrix yields zeros.
#[inline(always)]
pub fn get_pointarray_extents(points: MatRef<f64>) -> Vec<f64> {
    let ncols = points.ncols();

    if points.nrows() == 0 {
        return vec![0.0; 2 * ncols];
    }

    // The first half of the vector stores mins, the second half stores maxs.
    let mut extents = vec![0.0; 2 * ncols];

    for col in 0..ncols {
        extents[col] = *points.get(0, col);
        extents[col + ncols] = *points.get(0, col);
    }

    for row in points.row_iter() {
        for (col, item) in row.iter().enumerate() {
            if *item < extents[col] {
                extents[col] = *item;
            }
            if *item > extents[col + ncols] {
                extents[col + ncols] = *item;
            }
        }
    }

    extents
}

/// Copies the embedding of every point into the rows of an (N, D) matrix.
pub fn embed_points<P: Embed>(points: &[P]) -> Mat<f64> {
    Mat::from_fn(points.len(), P::DIM, |i, j| points[i].coordinate(j))
}

/// Returns the indices that would sort the input slice. Equal keys keep their input order.
#[inline(always)]
pub fn argsort<T: Ord>(data: &[T]) -> Vec<usize> {
    let mut indices = (0..data.len()).collect::<Vec<_>>();
    indices.sort_by_key(|&i| &data[i]);
    indices
}

/// Writes `a - b` component-wise into `out`.
#[inline(always)]
pub fn difference_into(a: &[f64], b: &[f64], out: &mut [f64]) {
    for ((o, x), y) in out.iter_mut().zip(a.iter()).zip(b.iter()) {
        *o = x - y;
    }
}

/// Euclidean distance between two points.
#[inline(always)]
pub fn distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use faer::mat;

    #[test]
    fn extents_cover_every_column() {
        let points = mat![[0.0, 5.0], [-2.0, 1.0], [3.0, 2.0]];
        let extents = get_pointarray_extents(points.as_ref());
        assert_eq!(extents, vec![-2.0, 1.0, 3.0, 5.0]);
    }

    #[test]
    fn extents_of_empty_matrix_are_zero() {
        let points = Mat::<f64>::zeros(0, 3);
        assert_eq!(get_pointarray_extents(points.as_ref()), vec![0.0; 6]);
    }

    #[test]
    fn argsort_is_stable() {
        let keys = [3u64, 1, 3, 0, 1];
        assert_eq!(argsort(&keys), vec![3, 1, 4, 0, 2]);
    }

    #[test]
    fn difference_overwrites_buffer() {
        let mut out = vec![9.0; 3];
        difference_into(&[1.0, 2.0, 3.0], &[0.5, 4.0, 3.0], &mut out);
        assert_eq!(out, vec![0.5, -2.0, 0.0]);

        difference_into(&[0.0, 0.0, 0.0], &[1.0, 1.0, 1.0], &mut out);
        assert_eq!(out, vec![-1.0, -1.0, -1.0]);
    }

    #[test]
    fn embeds_arrays_as_rows() {
        let points = vec![[1.0, 2.0], [3.0, 4.0]];
        let mat = embed_points(&points);
        assert_eq!(mat.nrows(), 2);
        assert_eq!(mat.ncols(), 2);
        assert_eq!(*mat.get(1, 0), 3.0);
    }
}
