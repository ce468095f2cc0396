// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Tree Patch: copy-on-write patching of immutable render trees.
//!
//! Style systems that recompute props outside the host's render pass need to
//! push those props into an immutable, `Arc`-shared render tree. This crate
//! provides the two halves of that hand-off:
//!
//! - [`TrafficController`]: a mutex-guarded staging area holding the latest
//!   props per node. The producer writes into it; the patcher drains it. Writes
//!   for the same node coalesce (last write wins).
//! - [`TreePatcher`]: drains the staging area, computes the minimal set of
//!   ancestors to clone ([`find_affected_nodes`]), rebuilds only those paths
//!   ([`clone_tree`]) and hands the new root to the host in a single commit.
//!
//! The host tree is reached through small capability traits: [`PatchNode`]
//! for node access and cloning, [`AncestorLookup`] for parent chains, and
//! [`CommitTarget`] / [`SurfaceRegistry`] for transactional commits.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use understory_tree_patch::{Fragment, PatchNode, PendingUpdates, patch_root, DepthFirstSearch};
//!
//! #[derive(Debug)]
//! struct Node {
//!     id: u32,
//!     color: &'static str,
//!     children: Vec<Arc<Node>>,
//! }
//!
//! impl PatchNode for Node {
//!     type Family = u32;
//!     type RawProps = &'static str;
//!     type Props = &'static str;
//!
//!     fn family(&self) -> u32 { self.id }
//!     fn children(&self) -> &[Arc<Self>] { &self.children }
//!     fn clone_props(&self, raw: Option<&&'static str>) -> &'static str {
//!         raw.copied().unwrap_or("")
//!     }
//!     fn clone_with(&self, fragment: Fragment<Self>) -> Self {
//!         Node {
//!             id: self.id,
//!             color: fragment.props.unwrap_or(self.color),
//!             children: fragment.children.unwrap_or_else(|| self.children.clone()),
//!         }
//!     }
//! }
//!
//! let leaf = |id| Arc::new(Node { id, color: "black", children: vec![] });
//! let root = Node { id: 0, color: "white", children: vec![leaf(1), leaf(2)] };
//!
//! let updates = PendingUpdates::from_iter([(2, Some("red"))]);
//! let patched = patch_root(&root, &updates, &DepthFirstSearch);
//!
//! assert_eq!(patched.children[1].color, "red");
//! // The untouched sibling is shared, not copied.
//! assert!(Arc::ptr_eq(&root.children[0], &patched.children[0]));
//! ```
//!
//! ## Concurrency
//!
//! The producer and the patcher may run on different threads. The staging
//! area is the only shared mutable state; its gate is held while a batch is
//! merged or drained, never while the tree is cloned. Transactions passed to
//! [`CommitTarget::commit`] are pure functions of the root they receive, so
//! hosts may retry them.
//!
//! ## Logging
//!
//! Events are emitted through [`tracing`]. This crate never installs a
//! subscriber.
//!
//! ## Features
//!
//! This crate has no optional features. It requires `std`: the update queue is
//! guarded by a `parking_lot` mutex. Tree traversal and cloning only use
//! `alloc`.

extern crate alloc;

mod node;
mod patch;
mod patcher;
mod traffic;

pub use node::{
    AncestorLookup, AncestorPath, CommitOptions, CommitTarget, DepthFirstSearch, Fragment,
    PatchNode, SurfaceRegistry,
};
pub use patch::{AffectedNodes, clone_tree, find_affected_nodes, patch_root};
pub use patcher::{PatchError, PatchPhase, PatchReport, TreePatcher};
pub use traffic::{Pending, PendingUpdates, TrafficController};
