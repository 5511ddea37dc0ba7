/////////////////////////////////////////////////////////////////////////////////////////////
//
// Binds source and target geometry to tree storage and owns per-cell expansion storage.
//
// Created on: 16 Oct 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use crate::{
    config::{ContextKind, PlanOptions},
    error::FmmError,
    evaluator::Evaluator,
    ndtree::{NdTree, TreeCell, TreeParams},
    plan::KernelMatrix,
    traits::{Embed, Expansion},
    utils,
};
use std::any::Any;

/// Returns `other` viewed as a `Vec<A>` when `B` and `A` are the same type.
fn same_type<A: 'static, B: 'static>(other: &Vec<B>) -> Option<&Vec<A>> {
    (other as &dyn Any).downcast_ref::<Vec<A>>()
}

/// Whether `targets` is the same point set as `sources`: same type, same length, equal values.
///
/// The value comparison costs one pass over the points and is only reached
/// when the cheaper checks pass.
pub(crate) fn is_same_point_set<S, T>(sources: &Vec<S>, targets: &Vec<T>) -> bool
where
    S: PartialEq + 'static,
    T: 'static,
{
    match same_type::<S, T>(targets) {
        Some(targets) => targets.len() == sources.len() && targets == sources,
        None => false,
    }
}

/// Converts a vector of points to another point type, if it is actually that type.
pub(crate) fn cast_points<A: Clone + 'static, B: 'static>(points: &Vec<B>) -> Option<Vec<A>> {
    same_type::<A, B>(points).cloned()
}

#[derive(Debug, Clone)]
enum Trees {
    Single(NdTree),
    Dual { source: NdTree, target: NdTree },
}

/// Owns the source and target trees and the tree-ordered points.
///
/// Sources and targets are stored in tree order. Callers must use
/// [`TreeContext::sources`] and [`TreeContext::targets`] to interpret the
/// ordering of charges and results.
#[derive(Debug, Clone)]
pub struct TreeContext<S, T> {
    trees: Trees,
    sources: Vec<S>,
    targets: Vec<T>,
}

impl<S, T> TreeContext<S, T>
where
    S: Embed + Clone + PartialEq + 'static,
    T: Embed + Clone + 'static,
{
    /// Builds one tree when the point sets are shared (or known to be aliased),
    /// and two otherwise, subject to `kind`.
    pub fn new(
        sources: Vec<S>,
        targets: Vec<T>,
        aliased: bool,
        kind: ContextKind,
        params: &TreeParams,
    ) -> Result<Self, FmmError> {
        if S::DIM != T::DIM {
            return Err(FmmError::DimensionMismatch {
                source_dim: S::DIM,
                target_dim: T::DIM,
            });
        }

        let single = match kind {
            ContextKind::DualTree => false,
            ContextKind::Auto => aliased || is_same_point_set(&sources, &targets),
            ContextKind::SingleTree => {
                if aliased || is_same_point_set(&sources, &targets) {
                    true
                } else {
                    return Err(FmmError::IncompatibleContext {
                        reason: "sources and targets are not the same point set".to_string(),
                    });
                }
            }
        };

        if single {
            log::info!("using single tree context for {} points", sources.len());

            let tree = NdTree::new(utils::embed_points(&sources).as_ref(), params)?;
            let sources = tree.permute(&sources);
            let targets = tree.permute(&targets);

            Ok(Self {
                trees: Trees::Single(tree),
                sources,
                targets,
            })
        } else {
            log::info!(
                "using dual tree context for {} sources and {} targets",
                sources.len(),
                targets.len()
            );

            let source = NdTree::new(utils::embed_points(&sources).as_ref(), params)?;
            let target = NdTree::new(utils::embed_points(&targets).as_ref(), params)?;
            let sources = source.permute(&sources);
            let targets = target.permute(&targets);

            Ok(Self {
                trees: Trees::Dual { source, target },
                sources,
                targets,
            })
        }
    }
}

impl<S, T> TreeContext<S, T> {
    pub fn source_tree(&self) -> &NdTree {
        match &self.trees {
            Trees::Single(tree) => tree,
            Trees::Dual { source, .. } => source,
        }
    }

    pub fn target_tree(&self) -> &NdTree {
        match &self.trees {
            Trees::Single(tree) => tree,
            Trees::Dual { target, .. } => target,
        }
    }

    pub fn is_single_tree(&self) -> bool {
        matches!(self.trees, Trees::Single(_))
    }

    /// Sources in tree order.
    pub fn sources(&self) -> &[S] {
        &self.sources
    }

    /// Targets in tree order.
    pub fn targets(&self) -> &[T] {
        &self.targets
    }

    /// `source_permutation()[i]` is the original index of `sources()[i]`.
    pub fn source_permutation(&self) -> &[usize] {
        self.source_tree().permutation()
    }

    /// `target_permutation()[i]` is the original index of `targets()[i]`.
    pub fn target_permutation(&self) -> &[usize] {
        self.target_tree().permutation()
    }
}

/// A [`TreeContext`] bound to an expansion, with per-cell multipole and local storage.
///
/// Multipoles live on the source tree's cells and locals on the target tree's
/// cells. Both are reinitialised by the evaluators at the start of every execution.
pub struct DataContext<E: Expansion> {
    tree_context: TreeContext<E::Source, E::Target>,
    expansion: E,
    multipoles: Vec<E::Multipole>,
    locals: Vec<E::Local>,
}

/// Borrowed view of a [`DataContext`] handed to the passes: shared geometry
/// alongside mutable expansion storage.
pub(crate) struct ContextParts<'a, E: Expansion> {
    pub tree_context: &'a TreeContext<E::Source, E::Target>,
    pub expansion: &'a E,
    pub multipoles: &'a mut Vec<E::Multipole>,
    pub locals: &'a mut Vec<E::Local>,
}

impl<E: Expansion> DataContext<E> {
    /// Builds the tree context for `matrix` according to `options`.
    pub fn new(matrix: KernelMatrix<E>, options: &PlanOptions) -> Result<Self, FmmError> {
        let (expansion, sources, targets, aliased) = matrix.into_parts();

        let tree_context = TreeContext::new(
            sources,
            targets,
            aliased,
            options.context,
            &options.tree_params(),
        )?;

        Ok(Self {
            tree_context,
            expansion,
            multipoles: Vec::new(),
            locals: Vec::new(),
        })
    }

    pub fn tree_context(&self) -> &TreeContext<E::Source, E::Target> {
        &self.tree_context
    }

    pub fn expansion(&self) -> &E {
        &self.expansion
    }

    pub fn source_tree(&self) -> &NdTree {
        self.tree_context.source_tree()
    }

    pub fn target_tree(&self) -> &NdTree {
        self.tree_context.target_tree()
    }

    pub fn sources(&self) -> &[E::Source] {
        self.tree_context.sources()
    }

    pub fn targets(&self) -> &[E::Target] {
        self.tree_context.targets()
    }

    /// Multipoles of the source tree cells, as left by the last execution.
    pub fn multipoles(&self) -> &[E::Multipole] {
        &self.multipoles
    }

    /// Locals of the target tree cells, as left by the last execution.
    pub fn locals(&self) -> &[E::Local] {
        &self.locals
    }

    /// Replaces every multipole with a freshly initialised one.
    ///
    /// The storage is allocated on first use and reinitialised in place afterwards.
    pub(crate) fn reset_multipoles(&mut self) {
        let cells = self.tree_context.source_tree().cells();
        let expansion = &self.expansion;
        let init = |cell: &TreeCell| expansion.init_multipole(&cell.extents(), cell.level());

        if self.multipoles.len() == cells.len() {
            for (multipole, cell) in self.multipoles.iter_mut().zip(cells) {
                *multipole = init(cell);
            }
        } else {
            self.multipoles = cells.iter().map(init).collect();
        }
    }

    /// Replaces every local with a freshly initialised one.
    ///
    /// The storage is allocated on first use and reinitialised in place afterwards.
    pub(crate) fn reset_locals(&mut self) {
        let cells = self.tree_context.target_tree().cells();
        let expansion = &self.expansion;
        let init = |cell: &TreeCell| expansion.init_local(&cell.extents(), cell.level());

        if self.locals.len() == cells.len() {
            for (local, cell) in self.locals.iter_mut().zip(cells) {
                *local = init(cell);
            }
        } else {
            self.locals = cells.iter().map(init).collect();
        }
    }

    pub(crate) fn parts(&mut self) -> ContextParts<'_, E> {
        ContextParts {
            tree_context: &self.tree_context,
            expansion: &self.expansion,
            multipoles: &mut self.multipoles,
            locals: &mut self.locals,
        }
    }

    /// Evaluates `results = K * charges` with `evaluator`.
    ///
    /// `charges` must be in [`DataContext::sources`] order; `results` is
    /// overwritten with one value per target in [`DataContext::targets`] order.
    /// A length mismatch is reported before anything is modified.
    pub fn execute(
        &mut self,
        charges: &[E::Charge],
        results: &mut Vec<E::Result>,
        evaluator: &dyn Evaluator<E>,
    ) -> Result<(), FmmError> {
        let num_sources = self.sources().len();
        if charges.len() != num_sources {
            return Err(FmmError::ChargeLengthMismatch {
                expected: num_sources,
                found: charges.len(),
            });
        }

        let num_targets = self.targets().len();
        results.clear();
        results.resize(num_targets, E::Result::default());

        if num_sources == 0 || num_targets == 0 {
            return Ok(());
        }

        evaluator.execute(self, charges, results);

        Ok(())
    }
}
