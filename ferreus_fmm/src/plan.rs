/////////////////////////////////////////////////////////////////////////////////////////////
//
// Provides the kernel matrix description and the reusable evaluation plan built from it.
//
// Created on: 16 Oct 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use crate::{
    config::{PlanOptions, Strategy},
    context::{self, DataContext},
    error::FmmError,
    evaluator::{make_evaluator, Evaluator},
    traits::Expansion,
};
use std::fmt;

/// The implicit matrix `K[i][j] = kernel(targets[i], sources[j])`.
pub struct KernelMatrix<E: Expansion> {
    expansion: E,
    sources: Vec<E::Source>,
    targets: Vec<E::Target>,
    aliased: bool,
}

impl<E: Expansion> KernelMatrix<E> {
    pub fn new(expansion: E, sources: Vec<E::Source>, targets: Vec<E::Target>) -> Self {
        Self {
            expansion,
            sources,
            targets,
            aliased: false,
        }
    }

    /// A kernel matrix whose targets are its sources.
    ///
    /// Requires the expansion's source and target types to be the same type,
    /// otherwise fails with [`FmmError::IncompatibleContext`].
    pub fn symmetric(expansion: E, points: Vec<E::Source>) -> Result<Self, FmmError> {
        let targets = context::cast_points::<E::Target, E::Source>(&points).ok_or_else(|| {
            FmmError::IncompatibleContext {
                reason: "source and target point types differ".to_string(),
            }
        })?;

        Ok(Self {
            expansion,
            sources: points,
            targets,
            aliased: true,
        })
    }

    pub fn expansion(&self) -> &E {
        &self.expansion
    }

    pub fn sources(&self) -> &[E::Source] {
        &self.sources
    }

    pub fn targets(&self) -> &[E::Target] {
        &self.targets
    }

    /// Number of (rows, columns), i.e. (targets, sources).
    pub fn shape(&self) -> (usize, usize) {
        (self.targets.len(), self.sources.len())
    }

    pub(crate) fn into_parts(self) -> (E, Vec<E::Source>, Vec<E::Target>, bool) {
        (self.expansion, self.sources, self.targets, self.aliased)
    }
}

/// A prepared evaluation of a [`KernelMatrix`].
///
/// Building a plan sorts the points into trees and prepares the chosen
/// strategy; [`Plan::execute`] can then be called any number of times with
/// different charges.
///
/// Charges and results are in tree order, see [`Plan::sources`] and
/// [`Plan::targets`]. The permutations map tree order back to the order the
/// points were given in.
pub struct Plan<E: Expansion> {
    context: DataContext<E>,
    evaluator: Box<dyn Evaluator<E>>,
}

impl<E: Expansion> fmt::Debug for Plan<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plan")
            .field("evaluator", &self.evaluator)
            .field("num_sources", &self.context.sources().len())
            .field("num_targets", &self.context.targets().len())
            .field("single_tree", &self.is_single_tree())
            .finish()
    }
}

impl<E: Expansion> Plan<E> {
    /// Validates `options`, builds the trees and selects the evaluator.
    pub fn new(matrix: KernelMatrix<E>, options: &PlanOptions) -> Result<Self, FmmError> {
        options.validate()?;

        let context = DataContext::new(matrix, options)?;
        let evaluator = make_evaluator(&context, options)?;

        if options.print_tree {
            if context.tree_context().is_single_tree() {
                log::info!("tree:\n{}", context.source_tree());
            } else {
                log::info!("source tree:\n{}", context.source_tree());
                log::info!("target tree:\n{}", context.target_tree());
            }
        }

        Ok(Self { context, evaluator })
    }

    /// Computes `K * charges`, one result per target in [`Plan::targets`] order.
    pub fn execute(&mut self, charges: &[E::Charge]) -> Result<Vec<E::Result>, FmmError> {
        let mut results = Vec::new();
        self.execute_into(charges, &mut results)?;
        Ok(results)
    }

    /// As [`Plan::execute`], overwriting `results`.
    ///
    /// On a charge length mismatch the error is returned and `results` is left untouched.
    pub fn execute_into(
        &mut self,
        charges: &[E::Charge],
        results: &mut Vec<E::Result>,
    ) -> Result<(), FmmError> {
        self.context.execute(charges, results, self.evaluator.as_ref())
    }

    /// Sources in the order charges are expected.
    pub fn sources(&self) -> &[E::Source] {
        self.context.sources()
    }

    /// Targets in the order results are produced.
    pub fn targets(&self) -> &[E::Target] {
        self.context.targets()
    }

    /// `source_permutation()[i]` is the original index of `sources()[i]`.
    pub fn source_permutation(&self) -> &[usize] {
        self.context.tree_context().source_permutation()
    }

    /// `target_permutation()[i]` is the original index of `targets()[i]`.
    pub fn target_permutation(&self) -> &[usize] {
        self.context.tree_context().target_permutation()
    }

    /// The strategy that runs, never [`Strategy::Auto`].
    pub fn strategy(&self) -> Strategy {
        self.evaluator.strategy()
    }

    pub fn is_single_tree(&self) -> bool {
        self.context.tree_context().is_single_tree()
    }

    pub fn context(&self) -> &DataContext<E> {
        &self.context
    }
}
