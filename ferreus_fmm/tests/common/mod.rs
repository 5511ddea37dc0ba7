/////////////////////////////////////////////////////////////////////////////////////////////
//
// Test kernels and point generators shared by the integration tests.
//
// Created on: 16 Oct 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

#![allow(dead_code)]

use ferreus_fmm::{Expansion, Kernel, Operators};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

// ============================================================================
// Separable exponential kernel
// ============================================================================

/// `K(t, s) = exp(sum(t) - sum(s))`, whose expansions are exact at any order.
#[derive(Debug, Clone, Copy)]
pub struct ExpKernel {
    pub operators: Operators,
}

impl ExpKernel {
    pub fn new() -> Self {
        Self {
            operators: Operators::all(),
        }
    }

    pub fn with_operators(operators: Operators) -> Self {
        Self { operators }
    }
}

fn sum(x: &[f64]) -> f64 {
    x.iter().sum()
}

impl Kernel for ExpKernel {
    type Source = [f64; 3];
    type Target = [f64; 3];
    type Charge = f64;
    type Result = f64;
    type Value = f64;

    fn evaluate(&self, target: &[f64; 3], source: &[f64; 3]) -> f64 {
        (sum(target) - sum(source)).exp()
    }

    fn transpose(&self, value: &f64) -> Option<f64> {
        Some(1.0 / value)
    }
}

impl Expansion for ExpKernel {
    type Multipole = f64;
    type Local = f64;

    fn operators(&self) -> Operators {
        self.operators
    }

    fn p2m(&self, source: &[f64; 3], charge: &f64, center: &[f64], multipole: &mut f64) {
        *multipole += charge * (sum(center) - sum(source)).exp();
    }

    fn m2m(&self, child: &f64, parent: &mut f64, translation: &[f64]) {
        *parent += child * sum(translation).exp();
    }

    fn m2l(&self, multipole: &f64, local: &mut f64, translation: &[f64]) {
        *local += multipole * sum(translation).exp();
    }

    fn l2l(&self, parent: &f64, child: &mut f64, translation: &[f64]) {
        *child += parent * sum(translation).exp();
    }

    fn l2p(&self, local: &f64, center: &[f64], target: &[f64; 3], result: &mut f64) {
        *result += (sum(target) - sum(center)).exp() * local;
    }

    fn m2p(&self, multipole: &f64, center: &[f64], target: &[f64; 3], result: &mut f64) {
        *result += (sum(target) - sum(center)).exp() * multipole;
    }

    fn p2l(&self, source: &[f64; 3], charge: &f64, center: &[f64], local: &mut f64) {
        *local += charge * (sum(center) - sum(source)).exp();
    }
}

// ============================================================================
// 1D Cauchy kernel with truncated Taylor expansions
// ============================================================================

/// `K(t, s) = 1 / (t - s)` on the line, zero when `t == s`.
///
/// Multipoles hold the moments `sum c (s - center)^k` and locals the Taylor
/// coefficients about the cell centre, both truncated to `order` terms.
#[derive(Debug, Clone, Copy)]
pub struct CauchyKernel {
    pub order: usize,
    pub operators: Operators,
}

impl CauchyKernel {
    pub fn new(order: usize) -> Self {
        Self {
            order,
            operators: Operators::all(),
        }
    }

    pub fn with_operators(order: usize, operators: Operators) -> Self {
        Self { order, operators }
    }
}

fn binomial(n: usize, k: usize) -> f64 {
    (0..k).fold(1.0, |acc, i| acc * (n - i) as f64 / (i + 1) as f64)
}

fn alternating(n: usize) -> f64 {
    if n % 2 == 0 {
        1.0
    } else {
        -1.0
    }
}

impl Kernel for CauchyKernel {
    type Source = f64;
    type Target = f64;
    type Charge = f64;
    type Result = f64;
    type Value = f64;

    fn evaluate(&self, target: &f64, source: &f64) -> f64 {
        if target == source {
            0.0
        } else {
            1.0 / (target - source)
        }
    }

    fn transpose(&self, value: &f64) -> Option<f64> {
        Some(-value)
    }
}

impl Expansion for CauchyKernel {
    type Multipole = Vec<f64>;
    type Local = Vec<f64>;

    fn operators(&self) -> Operators {
        self.operators
    }

    fn init_multipole(&self, _extents: &[f64], _level: usize) -> Vec<f64> {
        vec![0.0; self.order]
    }

    fn init_local(&self, _extents: &[f64], _level: usize) -> Vec<f64> {
        vec![0.0; self.order]
    }

    fn p2m(&self, source: &f64, charge: &f64, center: &[f64], multipole: &mut Vec<f64>) {
        let offset = source - center[0];
        let mut power = 1.0;
        for moment in multipole.iter_mut() {
            *moment += charge * power;
            power *= offset;
        }
    }

    fn m2m(&self, child: &Vec<f64>, parent: &mut Vec<f64>, translation: &[f64]) {
        let shift = -translation[0];
        for k in 0..self.order {
            for j in 0..=k {
                parent[k] += binomial(k, j) * child[j] * shift.powi((k - j) as i32);
            }
        }
    }

    fn m2l(&self, multipole: &Vec<f64>, local: &mut Vec<f64>, translation: &[f64]) {
        let distance = translation[0];
        for n in 0..self.order {
            let mut acc = 0.0;
            for k in 0..self.order {
                acc += multipole[k] * binomial(n + k, k) / distance.powi((n + k + 1) as i32);
            }
            local[n] += alternating(n) * acc;
        }
    }

    fn l2l(&self, parent: &Vec<f64>, child: &mut Vec<f64>, translation: &[f64]) {
        let shift = translation[0];
        for m in 0..self.order {
            for n in m..self.order {
                child[m] += parent[n] * binomial(n, m) * shift.powi((n - m) as i32);
            }
        }
    }

    fn l2p(&self, local: &Vec<f64>, center: &[f64], target: &f64, result: &mut f64) {
        let offset = target - center[0];
        *result += local.iter().rev().fold(0.0, |acc, &c| acc * offset + c);
    }

    fn m2p(&self, multipole: &Vec<f64>, center: &[f64], target: &f64, result: &mut f64) {
        let offset = target - center[0];
        let mut inverse = 1.0 / offset;
        for moment in multipole {
            *result += moment * inverse;
            inverse /= offset;
        }
    }

    fn p2l(&self, source: &f64, charge: &f64, center: &[f64], local: &mut Vec<f64>) {
        let distance = center[0] - source;
        let mut inverse = 1.0 / distance;
        for (n, coefficient) in local.iter_mut().enumerate() {
            *coefficient += charge * alternating(n) * inverse;
            inverse /= distance;
        }
    }
}

// ============================================================================
// Point clouds and comparisons
// ============================================================================

pub fn random_points_3d(n: usize, seed: u64, lo: f64, hi: f64) -> Vec<[f64; 3]> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            [
                rng.random_range(lo..hi),
                rng.random_range(lo..hi),
                rng.random_range(lo..hi),
            ]
        })
        .collect()
}

pub fn random_points_1d(n: usize, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n).map(|_| rng.random_range(0.0..1.0)).collect()
}

pub fn random_charges(n: usize, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n).map(|_| rng.random_range(0.1..1.0)).collect()
}

/// `||approx - exact|| / ||exact||` in the Euclidean norm.
pub fn relative_error(approx: &[f64], exact: &[f64]) -> f64 {
    let mut diff = 0.0;
    let mut norm = 0.0;
    for (a, e) in approx.iter().zip(exact.iter()) {
        diff += (a - e) * (a - e);
        norm += e * e;
    }
    (diff / norm).sqrt()
}

/// Reorders tree ordered `values` back to the order the points were given in.
pub fn to_original_order(values: &[f64], permutation: &[usize]) -> Vec<f64> {
    let mut original = vec![0.0; values.len()];
    for (position, &index) in permutation.iter().enumerate() {
        original[index] = values[position];
    }
    original
}

/// Reorders `values`, given in original point order, into tree order.
pub fn to_tree_order(values: &[f64], permutation: &[usize]) -> Vec<f64> {
    permutation.iter().map(|&index| values[index]).collect()
}
