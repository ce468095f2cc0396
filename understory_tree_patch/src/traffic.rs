// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Staging area for pending per-node prop updates.
//!
//! [`TrafficController`] sits between the producer (style recomputation) and
//! the consumer ([`TreePatcher`](crate::TreePatcher)). Both sides go through a
//! single gate, so a drain never observes a half-written batch and a write
//! never races a drain.

use core::fmt;
use core::hash::Hash;
use core::sync::atomic::{AtomicBool, Ordering};

use hashbrown::HashMap;
use parking_lot::{Mutex, MutexGuard};

/// Pending updates keyed by node family. `None` clears the node's style props.
pub type PendingUpdates<K, P> = HashMap<K, Option<P>>;

/// The batch guarded by a [`TrafficController`].
///
/// Only reachable while the gate is held, through [`TrafficController::lock`]
/// or [`TrafficController::with_lock`].
pub struct Pending<K, P> {
    updates: PendingUpdates<K, P>,
}

impl<K, P> Pending<K, P>
where
    K: Copy + Eq + Hash,
{
    /// Merges `batch` into the pending set.
    ///
    /// Later writes for the same node replace earlier ones entirely.
    pub fn set_updates(&mut self, batch: PendingUpdates<K, P>) {
        self.updates.extend(batch);
    }

    /// Stages a single node update, replacing any earlier one.
    pub fn set_update(&mut self, node: K, props: Option<P>) {
        self.updates.insert(node, props);
    }

    /// Returns and clears the pending batch.
    #[must_use]
    pub fn take_updates(&mut self) -> PendingUpdates<K, P> {
        core::mem::take(&mut self.updates)
    }

    /// Drops any pending update targeting `node`.
    ///
    /// Returns `true` if an update was removed.
    pub fn remove_node(&mut self, node: K) -> bool {
        self.updates.remove(&node).is_some()
    }

    /// Returns `true` if an update is pending for `node`.
    #[must_use]
    pub fn contains(&self, node: K) -> bool {
        self.updates.contains_key(&node)
    }

    /// Returns the pending update for `node`, if any.
    #[must_use]
    pub fn get(&self, node: K) -> Option<&Option<P>> {
        self.updates.get(&node)
    }

    /// Returns the number of nodes with a pending update.
    #[must_use]
    pub fn len(&self) -> usize {
        self.updates.len()
    }

    /// Returns `true` if nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }
}

impl<K, P> fmt::Debug for Pending<K, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pending")
            .field("len", &self.updates.len())
            .finish()
    }
}

/// Mutex-guarded pending update batch plus a pause switch.
///
/// The host pauses traffic while its own render pass is in flight and resumes
/// it afterwards; the producer resumes it after staging work that must reach
/// the tree.
///
/// # Example
///
/// ```
/// use understory_tree_patch::{PendingUpdates, TrafficController};
///
/// let traffic = TrafficController::<u32, &str>::new();
///
/// traffic.set_updates(PendingUpdates::from_iter([(1, Some("red"))]));
/// traffic.set_updates(PendingUpdates::from_iter([(1, Some("blue"))]));
///
/// let drained = traffic.take_updates();
/// assert_eq!(drained.len(), 1);
/// assert_eq!(drained[&1], Some("blue"));
/// assert!(traffic.take_updates().is_empty());
/// ```
pub struct TrafficController<K, P> {
    pending: Mutex<Pending<K, P>>,
    paused: AtomicBool,
}

impl<K, P> Default for TrafficController<K, P>
where
    K: Copy + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, P> TrafficController<K, P>
where
    K: Copy + Eq + Hash,
{
    /// Creates an empty, unpaused controller.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(Pending {
                updates: HashMap::new(),
            }),
            paused: AtomicBool::new(false),
        }
    }

    /// Acquires the gate.
    ///
    /// The gate is released when the guard drops, on every exit path.
    pub fn lock(&self) -> MutexGuard<'_, Pending<K, P>> {
        self.pending.lock()
    }

    /// Runs `f` with exclusive access to the pending batch.
    ///
    /// Use this when several operations must be indivisible with respect to a
    /// concurrent drain, e.g. unlinking a node and purging its update.
    pub fn with_lock<R>(&self, f: impl FnOnce(&mut Pending<K, P>) -> R) -> R {
        let mut pending = self.pending.lock();
        f(&mut pending)
    }

    /// Merges `batch` into the pending set under the gate.
    pub fn set_updates(&self, batch: PendingUpdates<K, P>) {
        if batch.is_empty() {
            return;
        }
        let count = batch.len();
        self.with_lock(|pending| pending.set_updates(batch));
        tracing::debug!(count, "staged pending updates");
    }

    /// Drains the pending batch under the gate.
    #[must_use]
    pub fn take_updates(&self) -> PendingUpdates<K, P> {
        self.with_lock(Pending::take_updates)
    }

    /// Drops any pending update for `node` under the gate.
    pub fn remove_node(&self, node: K) -> bool {
        self.with_lock(|pending| pending.remove_node(node))
    }

    /// Returns `true` if nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }

    /// Stops the patcher from draining until [`resume`](Self::resume).
    pub fn pause(&self) {
        self.paused.store(true, Ordering::Release);
    }

    /// Lets the patcher drain again.
    pub fn resume(&self) {
        self.paused.store(false, Ordering::Release);
    }

    /// Returns `true` while traffic is paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }
}

impl<K, P> fmt::Debug for TrafficController<K, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrafficController")
            .field("paused", &self.paused.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}
