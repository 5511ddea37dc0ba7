/////////////////////////////////////////////////////////////////////////////////////////////
//
// Defines the evaluator interface and selects an evaluation strategy for a data context.
//
// Created on: 16 Oct 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use crate::{
    config::{PlanOptions, Strategy},
    context::DataContext,
    direct::DirectEvaluator,
    error::FmmError,
    fmm::FmmEvaluator,
    traits::{Expansion, Operators},
    treecode::TreecodeEvaluator,
};
use std::fmt;

/// Largest ratio between source and target counts for which `Strategy::Auto`
/// prefers the two-sided FMM over the treecode.
const FMM_SIZE_RATIO: usize = 16;

/// A prepared strategy for computing `results = K * charges` over a [`DataContext`].
pub trait Evaluator<E: Expansion>: Send + Sync + fmt::Debug {
    fn strategy(&self) -> Strategy;

    /// Accumulates into `results`, which holds one zeroed value per target in
    /// tree order. `charges` holds one value per source in tree order.
    fn execute(
        &self,
        context: &mut DataContext<E>,
        charges: &[E::Charge],
        results: &mut [E::Result],
    );
}

fn resolve_strategy(
    requested: Strategy,
    operators: &Operators,
    source_leaf_only: bool,
    num_sources: usize,
    num_targets: usize,
) -> Result<Strategy, FmmError> {
    if requested != Strategy::Auto {
        let missing = operators.missing_for(requested);
        if !missing.is_empty() {
            return Err(FmmError::MissingOperators {
                strategy: requested,
                missing,
            });
        }
        return Ok(requested);
    }

    if source_leaf_only {
        return Ok(Strategy::Exact);
    }

    let (smaller, larger) = if num_sources < num_targets {
        (num_sources, num_targets)
    } else {
        (num_targets, num_sources)
    };
    let balanced = larger <= smaller.saturating_mul(FMM_SIZE_RATIO);

    let strategy = if operators.supports(Strategy::Fmm) && balanced {
        Strategy::Fmm
    } else if operators.supports(Strategy::Treecode) {
        Strategy::Treecode
    } else if operators.supports(Strategy::Fmm) {
        Strategy::Fmm
    } else {
        Strategy::Exact
    };

    Ok(strategy)
}

/// Builds the evaluator for `context` requested by `options`.
///
/// An explicitly requested strategy is never substituted: if the expansion
/// lacks an operator it needs, construction fails with
/// [`FmmError::MissingOperators`].
pub fn make_evaluator<E: Expansion>(
    context: &DataContext<E>,
    options: &PlanOptions,
) -> Result<Box<dyn Evaluator<E>>, FmmError> {
    let backend = options.backend.resolve();
    let operators = context.expansion().operators();
    let source_tree = context.source_tree();

    let strategy = resolve_strategy(
        options.strategy,
        &operators,
        source_tree.is_leaf(source_tree.root()),
        context.sources().len(),
        context.targets().len(),
    )?;

    log::info!(
        "using {} strategy ({} requested) on {} backend",
        strategy,
        options.strategy,
        backend
    );

    let evaluator: Box<dyn Evaluator<E>> = match strategy {
        Strategy::Exact | Strategy::Auto => Box::new(DirectEvaluator::new(
            backend,
            context.tree_context().is_single_tree(),
        )),
        Strategy::Treecode => Box::new(TreecodeEvaluator::new(backend, options.theta)),
        Strategy::Fmm => Box::new(FmmEvaluator::new(
            backend,
            context.source_tree(),
            context.target_tree(),
            options.theta,
            &operators,
        )),
    };

    Ok(evaluator)
}
