// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Capabilities the host render tree provides to the patcher.
//!
//! The patcher never owns the tree. It sees nodes through [`PatchNode`], finds
//! parent chains through [`AncestorLookup`], and hands a finished root to the
//! host through [`CommitTarget`].

use alloc::sync::Arc;
use core::fmt;
use core::hash::Hash;
use core::ops::ControlFlow;

use smallvec::SmallVec;

/// An immutable node of a host render tree.
///
/// Nodes are shared through [`Arc`]; cloning a node with [`PatchNode::clone_with`]
/// must leave the original untouched and keep any internal state it carries.
pub trait PatchNode: Sized {
    /// Stable identity of a node across tree versions.
    ///
    /// Every clone of a node reports the same family as the node it was cloned
    /// from.
    type Family: Copy + Eq + Hash + fmt::Debug;

    /// Raw props blob as produced by the style pipeline.
    type RawProps;

    /// Parsed props as stored on the node.
    type Props;

    /// Returns the family token of this node.
    fn family(&self) -> Self::Family;

    /// Returns the children of this node, in order.
    fn children(&self) -> &[Arc<Self>];

    /// Builds a full replacement prop set for this node.
    ///
    /// `None` means the pending update cleared the node's style props; hosts
    /// usually substitute an empty prop set.
    fn clone_props(&self, raw: Option<&Self::RawProps>) -> Self::Props;

    /// Clones this node, replacing whatever the fragment carries.
    fn clone_with(&self, fragment: Fragment<Self>) -> Self;
}

/// Replacement parts for [`PatchNode::clone_with`].
///
/// A `None` field means "keep what the original node has".
pub struct Fragment<N: PatchNode> {
    /// New props, if the node had a pending update.
    pub props: Option<N::Props>,
    /// New children list, if any child was re-pointed to a clone.
    pub children: Option<Vec<Arc<N>>>,
}

impl<N: PatchNode> fmt::Debug for Fragment<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fragment")
            .field("props", &self.props.as_ref().map(|_| ".."))
            .field("children", &self.children.as_ref().map(Vec::len))
            .finish()
    }
}

/// Root-first chain of `(parent family, child index)` pairs leading to a node.
pub type AncestorPath<F> = SmallVec<[(F, usize); 16]>;

/// Look up the ancestor chain of a node inside a given root.
///
/// This is a weak relationship: hosts that keep parent pointers can answer
/// directly, others can use [`DepthFirstSearch`].
pub trait AncestorLookup<N: PatchNode> {
    /// Returns the path from `root` down to the parent of `family`.
    ///
    /// Each entry names an ancestor and the index of the child that leads
    /// towards `family`. Returns an empty path if `family` is the root itself,
    /// and `None` if the node is not part of this tree.
    fn ancestors(&self, root: &N, family: N::Family) -> Option<AncestorPath<N::Family>>;
}

/// Ancestor lookup that searches the tree from the root.
#[derive(Copy, Clone, Debug, Default)]
pub struct DepthFirstSearch;

impl<N: PatchNode> AncestorLookup<N> for DepthFirstSearch {
    fn ancestors(&self, root: &N, family: N::Family) -> Option<AncestorPath<N::Family>> {
        let mut path = AncestorPath::new();
        if root.family() == family || search(root, family, &mut path) {
            Some(path)
        } else {
            None
        }
    }
}

fn search<N: PatchNode>(
    node: &N,
    target: N::Family,
    path: &mut AncestorPath<N::Family>,
) -> bool {
    for (index, child) in node.children().iter().enumerate() {
        path.push((node.family(), index));
        if child.family() == target || search(child.as_ref(), target, path) {
            return true;
        }
        path.pop();
    }
    false
}

/// Flags passed to the host with every commit.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct CommitOptions {
    /// Whether the host should reconcile node state as it would for a
    /// render-originated change.
    pub enable_state_reconciliation: bool,
    /// Whether the new tree must be mounted before `commit` returns.
    pub mount_synchronously: bool,
}

impl CommitOptions {
    /// Options for style updates applied outside the host's render pass.
    pub const STYLE_UPDATE: Self = Self {
        enable_state_reconciliation: false,
        mount_synchronously: true,
    };
}

impl Default for CommitOptions {
    fn default() -> Self {
        Self::STYLE_UPDATE
    }
}

/// A render surface that accepts transactional commits.
pub trait CommitTarget {
    /// Node type of this tree.
    type Node: PatchNode;
    /// Error reported when the host rejects a transaction.
    type Error;

    /// Commits a new tree version produced by `transaction`.
    ///
    /// The host may invoke `transaction` more than once if the base version
    /// changed concurrently. It must be a pure function of the root it is
    /// given. On error the previous tree version stays mounted.
    fn commit(
        &self,
        transaction: &dyn Fn(&Self::Node) -> Arc<Self::Node>,
        options: CommitOptions,
    ) -> Result<(), Self::Error>;
}

/// Enumeration of the host's active render surfaces.
pub trait SurfaceRegistry {
    /// Surface type.
    type Tree: CommitTarget;

    /// Visits active surfaces until `visit` breaks.
    fn enumerate(&self, visit: &mut dyn FnMut(&Self::Tree) -> ControlFlow<()>);
}

impl<T: CommitTarget> SurfaceRegistry for [T] {
    type Tree = T;

    fn enumerate(&self, visit: &mut dyn FnMut(&T) -> ControlFlow<()>) {
        for tree in self {
            if visit(tree).is_break() {
                break;
            }
        }
    }
}

impl<T: CommitTarget> SurfaceRegistry for Vec<T> {
    type Tree = T;

    fn enumerate(&self, visit: &mut dyn FnMut(&T) -> ControlFlow<()>) {
        self.as_slice().enumerate(visit);
    }
}
