/////////////////////////////////////////////////////////////////////////////////////////////
//
// Declares the error type returned by plan construction and execution.
//
// Created on: 16 Oct 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use crate::config::Strategy;
use std::fmt;

/// Errors that can occur while building or executing a plan.
#[derive(Debug, Clone, PartialEq)]
pub enum FmmError {
    /// The expansion does not provide the operators the requested strategy needs.
    MissingOperators {
        strategy: Strategy,
        missing: Vec<&'static str>,
    },

    /// A single tree context was requested for sources and targets that are
    /// not the same point set.
    IncompatibleContext { reason: String },

    /// Sources and targets embed into spaces of different dimension.
    DimensionMismatch { source_dim: usize, target_dim: usize },

    /// The point embedding dimension cannot be represented by the tree.
    InvalidDimension { dimension: usize },

    /// A configuration value or coordinate is out of range.
    InvalidParameter { name: &'static str, reason: String },

    /// The charge vector does not line up with the plan's sources.
    ChargeLengthMismatch { expected: usize, found: usize },
}

impl fmt::Display for FmmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FmmError::MissingOperators { strategy, missing } => write!(
                f,
                "the {} strategy requires operators the expansion does not provide: {}",
                strategy,
                missing.join(", ")
            ),
            FmmError::IncompatibleContext { reason } => {
                write!(f, "cannot build a single tree context: {}", reason)
            }
            FmmError::DimensionMismatch {
                source_dim,
                target_dim,
            } => write!(
                f,
                "sources are {}-dimensional but targets are {}-dimensional",
                source_dim, target_dim
            ),
            FmmError::InvalidDimension { dimension } => write!(
                f,
                "unsupported number of dimensions: {} (expected 1 to 63)",
                dimension
            ),
            FmmError::InvalidParameter { name, reason } => {
                write!(f, "invalid value for `{}`: {}", name, reason)
            }
            FmmError::ChargeLengthMismatch { expected, found } => write!(
                f,
                "expected {} charges (one per source) but received {}",
                expected, found
            ),
        }
    }
}

impl std::error::Error for FmmError {}
