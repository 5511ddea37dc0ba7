/////////////////////////////////////////////////////////////////////////////////////////////
//
// Declares the point embedding, kernel and expansion traits consumed by the evaluation plans.
//
// Created on: 16 Oct 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use crate::config::Strategy;
use std::ops::{AddAssign, Mul};

/// Embeds a source or target value into `DIM`-dimensional space.
///
/// The tree only ever sees coordinates, so any application type can be used as
/// a source or target provided it can report where it lives.
pub trait Embed {
    /// Number of coordinates in the embedding.
    const DIM: usize;

    /// Returns the coordinate along `axis`, where `axis < DIM`.
    fn coordinate(&self, axis: usize) -> f64;
}

impl Embed for f64 {
    const DIM: usize = 1;

    #[inline(always)]
    fn coordinate(&self, _axis: usize) -> f64 {
        *self
    }
}

impl<const N: usize> Embed for [f64; N] {
    const DIM: usize = N;

    #[inline(always)]
    fn coordinate(&self, axis: usize) -> f64 {
        self[axis]
    }
}

/// Collects the coordinates of a point into a vector.
#[inline(always)]
pub(crate) fn coordinates<P: Embed>(point: &P) -> Vec<f64> {
    (0..P::DIM).map(|axis| point.coordinate(axis)).collect()
}

/// A pairwise interaction `K(target, source)`.
///
/// The kernel value multiplied by a charge gives a contribution to the result
/// at the target, i.e. `result_i = sum_j K(t_i, s_j) * c_j`.
pub trait Kernel: Send + Sync {
    type Source: Embed + Clone + PartialEq + Send + Sync + 'static;
    type Target: Embed + Clone + PartialEq + Send + Sync + 'static;
    type Charge: Clone + Send + Sync;
    type Result: Clone + Default + AddAssign + Send + Sync;
    type Value: Mul<Self::Charge, Output = Self::Result>;

    /// Evaluates the kernel between a target and a source.
    fn evaluate(&self, target: &Self::Target, source: &Self::Source) -> Self::Value;

    /// Returns `K(s, t)` given `K(t, s)`, when the kernel can derive one from the other.
    ///
    /// Only consulted when sources and targets are the same point set, where it
    /// allows each unordered pair to be evaluated once.
    fn transpose(&self, _value: &Self::Value) -> Option<Self::Value> {
        None
    }

    /// Accumulates the contribution of a single source into a single result.
    #[inline(always)]
    fn p2p(
        &self,
        target: &Self::Target,
        source: &Self::Source,
        charge: &Self::Charge,
        result: &mut Self::Result,
    ) {
        *result += self.evaluate(target, source) * charge.clone();
    }

    /// Accumulates all `sources` into all `results`. Override for a vectorised block.
    fn p2p_block(
        &self,
        targets: &[Self::Target],
        sources: &[Self::Source],
        charges: &[Self::Charge],
        results: &mut [Self::Result],
    ) {
        for (target, result) in targets.iter().zip(results.iter_mut()) {
            for (source, charge) in sources.iter().zip(charges.iter()) {
                self.p2p(target, source, charge, result);
            }
        }
    }
}

/// The set of translation operators an [`Expansion`] actually provides.
///
/// Every operator method on [`Expansion`] has a do-nothing default, so this set is
/// the only source of truth the evaluators use to decide what may be called.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct Operators {
    pub p2m: bool,
    pub m2m: bool,
    pub m2l: bool,
    pub l2l: bool,
    pub l2p: bool,
    pub m2p: bool,
    pub p2l: bool,
}

impl Operators {
    /// No far-field operators; only exact evaluation is possible.
    pub const fn none() -> Self {
        Self {
            p2m: false,
            m2m: false,
            m2l: false,
            l2l: false,
            l2p: false,
            m2p: false,
            p2l: false,
        }
    }

    /// Operators needed by the one-sided treecode: P2M, M2M and M2P.
    pub const fn treecode() -> Self {
        Self {
            p2m: true,
            m2m: true,
            m2p: true,
            ..Self::none()
        }
    }

    /// The full operator set.
    pub const fn all() -> Self {
        Self {
            p2m: true,
            m2m: true,
            m2l: true,
            l2l: true,
            l2p: true,
            m2p: true,
            p2l: true,
        }
    }

    /// Names of the operators missing for `strategy`. Empty when the strategy can run.
    ///
    /// `Strategy::Auto` never reports anything missing since it only picks from
    /// strategies that can run.
    pub fn missing_for(&self, strategy: Strategy) -> Vec<&'static str> {
        let mut missing = Vec::new();

        let mut require = |present: bool, name: &'static str| {
            if !present {
                missing.push(name);
            }
        };

        match strategy {
            Strategy::Auto | Strategy::Exact => {}
            Strategy::Treecode => {
                require(self.p2m, "P2M");
                require(self.m2m, "M2M");
                require(self.m2p, "M2P");
            }
            Strategy::Fmm => {
                require(self.p2m, "P2M");
                require(self.m2m, "M2M");
                require(self.l2l, "L2L");
                require(self.l2p, "L2P");
                if !self.m2l {
                    require(self.p2l, "M2L or P2L");
                    require(self.m2p, "M2L or M2P");
                }
            }
        }

        missing
    }

    pub fn supports(&self, strategy: Strategy) -> bool {
        self.missing_for(strategy).is_empty()
    }
}

/// Far-field representation of a [`Kernel`].
///
/// Translation vectors always point from the origin expansion's centre to the
/// destination's centre, e.g. for M2M it is `parent_center - child_center`.
/// Operators not listed in [`Expansion::operators`] are never called.
pub trait Expansion: Kernel {
    type Multipole: Clone + Default + Send + Sync;
    type Local: Clone + Default + Send + Sync;

    /// Reports which operators are implemented.
    fn operators(&self) -> Operators {
        Operators::none()
    }

    /// Creates an empty multipole for a cell with side lengths `extents` at `level`.
    fn init_multipole(&self, _extents: &[f64], _level: usize) -> Self::Multipole {
        Self::Multipole::default()
    }

    /// Creates an empty local for a cell with side lengths `extents` at `level`.
    fn init_local(&self, _extents: &[f64], _level: usize) -> Self::Local {
        Self::Local::default()
    }

    fn p2m(
        &self,
        _source: &Self::Source,
        _charge: &Self::Charge,
        _center: &[f64],
        _multipole: &mut Self::Multipole,
    ) {
    }

    fn m2m(&self, _child: &Self::Multipole, _parent: &mut Self::Multipole, _translation: &[f64]) {}

    fn m2l(&self, _multipole: &Self::Multipole, _local: &mut Self::Local, _translation: &[f64]) {}

    fn l2l(&self, _parent: &Self::Local, _child: &mut Self::Local, _translation: &[f64]) {}

    fn l2p(
        &self,
        _local: &Self::Local,
        _center: &[f64],
        _target: &Self::Target,
        _result: &mut Self::Result,
    ) {
    }

    fn m2p(
        &self,
        _multipole: &Self::Multipole,
        _center: &[f64],
        _target: &Self::Target,
        _result: &mut Self::Result,
    ) {
    }

    fn p2l(
        &self,
        _source: &Self::Source,
        _charge: &Self::Charge,
        _center: &[f64],
        _local: &mut Self::Local,
    ) {
    }

    fn p2m_block(
        &self,
        sources: &[Self::Source],
        charges: &[Self::Charge],
        center: &[f64],
        multipole: &mut Self::Multipole,
    ) {
        for (source, charge) in sources.iter().zip(charges.iter()) {
            self.p2m(source, charge, center, multipole);
        }
    }

    fn p2l_block(
        &self,
        sources: &[Self::Source],
        charges: &[Self::Charge],
        center: &[f64],
        local: &mut Self::Local,
    ) {
        for (source, charge) in sources.iter().zip(charges.iter()) {
            self.p2l(source, charge, center, local);
        }
    }

    fn m2p_block(
        &self,
        multipole: &Self::Multipole,
        center: &[f64],
        targets: &[Self::Target],
        results: &mut [Self::Result],
    ) {
        for (target, result) in targets.iter().zip(results.iter_mut()) {
            self.m2p(multipole, center, target, result);
        }
    }

    fn l2p_block(
        &self,
        local: &Self::Local,
        center: &[f64],
        targets: &[Self::Target],
        results: &mut [Self::Result],
    ) {
        for (target, result) in targets.iter().zip(results.iter_mut()) {
            self.l2p(local, center, target, result);
        }
    }
}
