// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Affected-path computation and copy-on-write cloning.
//!
//! Given a root and a batch of pending updates, [`find_affected_nodes`] records,
//! for every ancestor of an updated node, which child indices lead to an update.
//! [`clone_tree`] then rebuilds exactly those paths:
//!
//! ```text
//!        A
//!      /   \
//!     B     C
//!    / \
//!   D   E*
//!      / \
//!     F   G
//! ```
//!
//! An update for `E` yields `{A: [0], B: [1]}`. Only `A`, `B` and `E` are
//! cloned; `C`, `D`, `F` and `G` are carried over by reference.

use alloc::sync::Arc;

use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::node::{AncestorLookup, Fragment, PatchNode};
use crate::traffic::PendingUpdates;

/// Child indices to re-point, per ancestor family.
pub type AffectedNodes<F> = HashMap<F, SmallVec<[usize; 4]>>;

/// Computes which ancestors must be cloned, and at which child indices.
///
/// Updates for nodes that are not part of `root` are skipped.
#[must_use]
pub fn find_affected_nodes<N, L, P>(
    root: &N,
    updates: &PendingUpdates<N::Family, P>,
    lookup: &L,
) -> AffectedNodes<N::Family>
where
    N: PatchNode,
    L: AncestorLookup<N> + ?Sized,
{
    let mut affected = AffectedNodes::new();

    for &family in updates.keys() {
        let Some(ancestors) = lookup.ancestors(root, family) else {
            tracing::trace!(?family, "updated node is not part of this tree");
            continue;
        };
        for (parent, index) in ancestors {
            let indices = affected.entry(parent).or_default();
            if !indices.contains(&index) {
                indices.push(index);
            }
        }
    }

    affected
}

/// Clones `node` and every affected descendant, bottom-up.
///
/// Nodes with a pending update get a full replacement prop set from
/// [`PatchNode::clone_props`]. Children that are not on an affected path keep
/// their referential identity.
#[must_use]
pub fn clone_tree<N>(
    node: &N,
    updates: &PendingUpdates<N::Family, N::RawProps>,
    affected: &AffectedNodes<N::Family>,
) -> Arc<N>
where
    N: PatchNode,
{
    let family = node.family();

    let children = affected.get(&family).map(|indices| {
        let mut children = node.children().to_vec();
        for &index in indices {
            if let Some(child) = children.get(index) {
                let clone = clone_tree(child.as_ref(), updates, affected);
                children[index] = clone;
            }
        }
        children
    });

    let props = updates
        .get(&family)
        .map(|raw| node.clone_props(raw.as_ref()));

    Arc::new(node.clone_with(Fragment { props, children }))
}

/// Applies `updates` to `root`, returning the new root.
///
/// This is a pure function of its inputs and may be invoked repeatedly by a
/// host that retries transactions.
#[must_use]
pub fn patch_root<N, L>(
    root: &N,
    updates: &PendingUpdates<N::Family, N::RawProps>,
    lookup: &L,
) -> Arc<N>
where
    N: PatchNode,
    L: AncestorLookup<N> + ?Sized,
{
    let affected = find_affected_nodes(root, updates, lookup);
    clone_tree(root, updates, &affected)
}
