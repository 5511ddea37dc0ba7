/////////////////////////////////////////////////////////////////////////////////////////////
//
// Declares configuration types for tree construction, strategy selection and execution.
//
// Created on: 16 Oct 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! Declares configuration types for tree construction, strategy selection and execution.

use crate::{backend::Backend, error::FmmError, ndtree::TreeParams};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Evaluation strategy used by a [`Plan`](crate::Plan).
#[derive(Debug, Default, Copy, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum Strategy {
    /// Choose from the shape of the context and the operators the expansion provides.
    #[default]
    Auto,

    /// Direct summation over every source/target pair.
    Exact,

    /// One-sided approximation using multipoles of the source tree only.
    Treecode,

    /// Two-sided approximation using multipoles and locals (FMM).
    Fmm,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Strategy::Auto => "auto",
            Strategy::Exact => "exact",
            Strategy::Treecode => "treecode",
            Strategy::Fmm => "fmm",
        };
        write!(f, "{}", name)
    }
}

/// Which tree context a [`Plan`](crate::Plan) should build.
#[derive(Debug, Default, Copy, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum ContextKind {
    /// One shared tree when sources and targets are the same point set, two trees otherwise.
    #[default]
    Auto,

    /// Always share one tree. Fails when sources and targets differ.
    SingleTree,

    /// Always build separate source and target trees.
    DualTree,
}

/// Options controlling how a [`Plan`](crate::Plan) is built and executed.
///
/// ### Default Values
/// - `max_per_box`: `64`
/// - `min_box_size`: `0.0`
/// - `theta`: `0.5`
/// - `strategy`: [`Strategy::Auto`]
/// - `context`: [`ContextKind::Auto`]
/// - `print_tree`: `false`
/// - `backend`: [`Backend::Parallel`]
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlanOptions {
    /// Maximum number of points in a leaf cell before it is subdivided.
    pub max_per_box: usize,

    /// Cells are not subdivided below this side length.
    pub min_box_size: f64,

    /// Acceptance threshold. Two cells interact through their expansions when
    /// `r_source + r_target < theta * distance`. Smaller is more accurate.
    pub theta: f64,

    pub strategy: Strategy,

    pub context: ContextKind,

    /// Logs a per-level summary of each tree after construction.
    pub print_tree: bool,

    pub backend: Backend,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            max_per_box: 64,
            min_box_size: 0.0,
            theta: 0.5,
            strategy: Strategy::Auto,
            context: ContextKind::Auto,
            print_tree: false,
            backend: Backend::Parallel,
        }
    }
}

impl PlanOptions {
    /// Returns a new [`PlanOptionsBuilder`] starting from the defaults.
    pub fn builder() -> PlanOptionsBuilder {
        PlanOptionsBuilder::new()
    }

    /// Checks every value is in range.
    pub fn validate(&self) -> Result<(), FmmError> {
        if !(self.theta.is_finite() && self.theta > 0.0) {
            return Err(FmmError::InvalidParameter {
                name: "theta",
                reason: format!("must be positive and finite, got {}", self.theta),
            });
        }

        self.tree_params().validate()
    }

    pub(crate) fn tree_params(&self) -> TreeParams {
        TreeParams {
            max_per_box: self.max_per_box,
            min_box_size: self.min_box_size,
        }
    }
}

/// A convenience builder for constructing a [`PlanOptions`] instance.
///
/// The builder should be created via the [`PlanOptions::builder`] method.
///
/// See [`PlanOptions`] for details on each field.
#[derive(Debug, Clone)]
pub struct PlanOptionsBuilder {
    options: PlanOptions,
}

impl PlanOptionsBuilder {
    fn new() -> Self {
        Self {
            options: PlanOptions::default(),
        }
    }

    pub fn max_per_box(mut self, max_per_box: usize) -> Self {
        self.options.max_per_box = max_per_box;
        self
    }

    pub fn min_box_size(mut self, min_box_size: f64) -> Self {
        self.options.min_box_size = min_box_size;
        self
    }

    pub fn theta(mut self, theta: f64) -> Self {
        self.options.theta = theta;
        self
    }

    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.options.strategy = strategy;
        self
    }

    pub fn context(mut self, context: ContextKind) -> Self {
        self.options.context = context;
        self
    }

    pub fn print_tree(mut self, print_tree: bool) -> Self {
        self.options.print_tree = print_tree;
        self
    }

    pub fn backend(mut self, backend: Backend) -> Self {
        self.options.backend = backend;
        self
    }

    /// Builds and returns a [`PlanOptions`] instance.
    pub fn build(self) -> PlanOptions {
        self.options
    }
}
