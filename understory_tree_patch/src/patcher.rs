// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The drain-clone-commit cycle.

use alloc::sync::Arc;
use core::cell::Cell;
use core::fmt;
use core::ops::ControlFlow;

use crate::node::{
    AncestorLookup, CommitOptions, CommitTarget, DepthFirstSearch, PatchNode, SurfaceRegistry,
};
use crate::patch::{clone_tree, find_affected_nodes};
use crate::traffic::TrafficController;

/// Progress of one patch cycle.
///
/// A cycle moves `Idle → BatchDrained → AffectedNodesComputed → TreeCloned →
/// Committed`. None of the intermediate phases is visible outside the cycle.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PatchPhase {
    /// Nothing was drained.
    Idle,
    /// A non-empty batch was taken from the traffic controller.
    BatchDrained,
    /// Ancestor paths were computed against the current root.
    AffectedNodesComputed,
    /// A new root was built.
    TreeCloned,
    /// The host accepted the new root.
    Committed,
}

/// Outcome of a successful [`TreePatcher::update_tree`] call.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PatchReport {
    /// Last phase reached.
    pub phase: PatchPhase,
    /// Number of nodes in the drained batch.
    pub updated_nodes: usize,
}

impl PatchReport {
    const IDLE: Self = Self {
        phase: PatchPhase::Idle,
        updated_nodes: 0,
    };

    /// Returns `true` if a commit was issued and accepted.
    #[must_use]
    pub fn committed(&self) -> bool {
        self.phase == PatchPhase::Committed
    }
}

/// A rejected commit, with the phase the cycle had reached.
///
/// The host's previous tree version stays mounted and the drained batch is
/// discarded.
pub struct PatchError<E> {
    /// Last phase reached before the host rejected the transaction.
    pub phase: PatchPhase,
    /// Error reported by the host.
    pub source: E,
}

impl<E: fmt::Debug> fmt::Debug for PatchError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatchError")
            .field("phase", &self.phase)
            .field("source", &self.source)
            .finish()
    }
}

impl<E: fmt::Display> fmt::Display for PatchError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "tree patch aborted after {:?}: {}",
            self.phase, self.source
        )
    }
}

impl<E> core::error::Error for PatchError<E>
where
    E: core::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// Drains pending updates and commits them to the first render surface.
///
/// Only one surface is targeted per cycle, and exactly one commit is issued
/// however many nodes the batch touches.
#[derive(Clone, Debug, Default)]
pub struct TreePatcher<L = DepthFirstSearch> {
    lookup: L,
    options: CommitOptions,
}

impl TreePatcher {
    /// Creates a patcher that searches ancestors from the root.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<L> TreePatcher<L> {
    /// Creates a patcher using the host's own ancestor lookup.
    #[must_use]
    pub fn with_lookup(lookup: L) -> Self {
        Self {
            lookup,
            options: CommitOptions::STYLE_UPDATE,
        }
    }

    /// Overrides the options passed with each commit.
    #[must_use]
    pub fn with_options(mut self, options: CommitOptions) -> Self {
        self.options = options;
        self
    }

    /// Returns the options passed with each commit.
    #[must_use]
    pub fn options(&self) -> CommitOptions {
        self.options
    }

    /// Runs one patch cycle.
    ///
    /// The batch is drained only once a surface is visited, so with no active
    /// surface the queue is left as it is. The gate is held only while the
    /// batch is drained, never while the tree is cloned.
    pub fn update_tree<S, N>(
        &self,
        surfaces: &S,
        traffic: &TrafficController<N::Family, N::RawProps>,
    ) -> Result<PatchReport, PatchError<<S::Tree as CommitTarget>::Error>>
    where
        S: SurfaceRegistry + ?Sized,
        S::Tree: CommitTarget<Node = N>,
        N: PatchNode,
        L: AncestorLookup<N>,
    {
        if traffic.is_paused() {
            return Ok(PatchReport::IDLE);
        }

        let mut outcome = None;
        surfaces.enumerate(&mut |tree| {
            outcome = Some(self.patch_surface(tree, traffic));
            // A single primary surface is assumed.
            ControlFlow::Break(())
        });

        outcome.unwrap_or_else(|| {
            tracing::debug!("no active surface, leaving pending updates queued");
            Ok(PatchReport::IDLE)
        })
    }

    fn patch_surface<T, N>(
        &self,
        tree: &T,
        traffic: &TrafficController<N::Family, N::RawProps>,
    ) -> Result<PatchReport, PatchError<T::Error>>
    where
        T: CommitTarget<Node = N> + ?Sized,
        N: PatchNode,
        L: AncestorLookup<N>,
    {
        let updates = traffic.take_updates();
        if updates.is_empty() {
            return Ok(PatchReport::IDLE);
        }
        let updated_nodes = updates.len();

        let span = tracing::debug_span!("patch_cycle", updated_nodes);
        let _enter = span.enter();

        let phase = Cell::new(PatchPhase::BatchDrained);
        let transaction = |root: &N| -> Arc<N> {
            let affected = find_affected_nodes(root, &updates, &self.lookup);
            phase.set(PatchPhase::AffectedNodesComputed);
            tracing::trace!(ancestors = affected.len(), "computed affected nodes");

            let new_root = clone_tree(root, &updates, &affected);
            phase.set(PatchPhase::TreeCloned);
            new_root
        };

        match tree.commit(&transaction, self.options) {
            Ok(()) => {
                tracing::debug!("committed style updates");
                Ok(PatchReport {
                    phase: PatchPhase::Committed,
                    updated_nodes,
                })
            }
            Err(source) => {
                let phase = phase.get();
                tracing::warn!(?phase, "host rejected style update commit");
                Err(PatchError { phase, source })
            }
        }
    }
}
