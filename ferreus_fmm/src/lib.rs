/////////////////////////////////////////////////////////////////////////////////////////////
//
// Exposes the public API for the treecode and fast multipole evaluation crate.
//
// Created on: 16 Oct 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # Treecode and Fast Multipole Evaluation
//!
//! This crate evaluates dense kernel matrix products `r = K * c`, where
//! `K[i][j] = kernel(target_i, source_j)`, for user supplied kernels.
//!
//! The kernel is described by implementing [`Kernel`], and optionally
//! [`Expansion`] operators (P2M, M2M, M2L, L2L, L2P, M2P, P2L) that approximate
//! the far field. The crate supplies the spatial trees, the interaction lists
//! and the passes that drive those operators, and picks a strategy from what
//! the expansion provides:
//! - `Exact`: direct summation over every pair.
//! - `Treecode`: source multipoles evaluated directly at each target.
//! - `Fmm`: source multipoles translated into target locals.
//!
//! # Features:
//! - Points of any dimension from 1 to 63, via the [`Embed`] trait
//! - Adaptive Morton ordered trees with a breadth first cell layout
//! - A single shared tree when sources and targets are the same point set
//! - Plans that are built once and executed for many charge vectors
//! - Parallel passes on the rayon thread pool
//!
//! # Example: Exact Matrix-Vector Product
//!
//! ```
//! use ferreus_fmm::{Expansion, Kernel, KernelMatrix, Plan, PlanOptions, Strategy};
//!
//! // A Gaussian kernel between points in the plane
//! pub struct Gaussian;
//!
//! impl Kernel for Gaussian {
//!     type Source = [f64; 2];
//!     type Target = [f64; 2];
//!     type Charge = f64;
//!     type Result = f64;
//!     type Value = f64;
//!
//!     #[inline(always)]
//!     fn evaluate(&self, target: &[f64; 2], source: &[f64; 2]) -> f64 {
//!         let dx = target[0] - source[0];
//!         let dy = target[1] - source[1];
//!         (-(dx * dx + dy * dy)).exp()
//!     }
//! }
//!
//! // No far-field operators, so only exact evaluation is available
//! impl Expansion for Gaussian {
//!     type Multipole = ();
//!     type Local = ();
//! }
//!
//! let points: Vec<[f64; 2]> = (0..400)
//!     .map(|i| [(i % 20) as f64 * 0.1, (i / 20) as f64 * 0.1])
//!     .collect();
//!
//! // Sources are also the targets, so a single tree is shared
//! let matrix = KernelMatrix::symmetric(Gaussian, points).unwrap();
//!
//! let options = PlanOptions::builder().max_per_box(32).build();
//! let mut plan = Plan::new(matrix, &options).unwrap();
//! assert_eq!(plan.strategy(), Strategy::Exact);
//!
//! // Charges and results are in tree order
//! let charges = vec![1.0; plan.sources().len()];
//! let results = plan.execute(&charges).unwrap();
//!
//! // Map the results back to the order the points were given in
//! let mut original_order = vec![0.0; results.len()];
//! for (position, &original) in plan.target_permutation().iter().enumerate() {
//!     original_order[original] = results[position];
//! }
//! ```
//!
//! # References
//!
//! 1. Barnes, J., & Hut, P. (1986).
//!    *A hierarchical O(N log N) force-calculation algorithm.*
//!    *Nature*, **324**, 446–449.
//!
//! 2. Greengard, L., & Rokhlin, V. (1987).
//!    *A fast algorithm for particle simulations.*
//!    *Journal of Computational Physics*, **73**(2), 325–348.
//!
//! 3. Dehnen, W. (2002).
//!    *A hierarchical O(N) force calculation algorithm.*
//!    *Journal of Computational Physics*, **179**(1), 27–42.

mod backend;
mod config;
mod context;
pub mod direct;
mod error;
mod evaluator;
mod fmm;
mod morton;
mod ndtree;
mod passes;
mod plan;
mod traits;
pub mod traversal;
mod treecode;
mod utils;

#[doc(inline)]
pub use {
    backend::Backend,
    config::{ContextKind, PlanOptions, PlanOptionsBuilder, Strategy},
    context::{DataContext, TreeContext},
    direct::DirectEvaluator,
    error::FmmError,
    evaluator::{make_evaluator, Evaluator},
    fmm::FmmEvaluator,
    ndtree::{NdTree, TreeCell, TreeParams},
    plan::{KernelMatrix, Plan},
    traits::{Embed, Expansion, Kernel, Operators},
    traversal::InteractionLists,
    treecode::TreecodeEvaluator,
};
