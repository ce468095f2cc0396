// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node ↔ style unit attachments.

use alloc::sync::Arc;
use core::hash::Hash;

use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::unit::StyleUnit;

/// Ordered `(variant name, variant value)` selection.
pub type Variants = SmallVec<[(String, String); 2]>;

/// Attachment of one [`StyleUnit`] to one tree node.
#[derive(Debug)]
pub struct NodeLink<K> {
    unit: Arc<StyleUnit>,
    node: K,
    variants: Variants,
}

impl<K: Copy> NodeLink<K> {
    /// Creates an attachment with the variant selection active at link time.
    #[must_use]
    pub fn new(unit: Arc<StyleUnit>, node: K, variants: Variants) -> Self {
        Self {
            unit,
            node,
            variants,
        }
    }

    /// Returns the attached unit.
    #[must_use]
    pub fn unit(&self) -> &Arc<StyleUnit> {
        &self.unit
    }

    /// Returns the node this attachment belongs to.
    #[must_use]
    pub fn node(&self) -> K {
        self.node
    }

    /// Returns the variant selection.
    #[must_use]
    pub fn variants(&self) -> &[(String, String)] {
        &self.variants
    }
}

/// Per-context map from node identity to its attachments.
///
/// A node may carry several units (e.g. composed styles); attachments for the
/// same node accumulate in link order until the node is unlinked.
#[derive(Debug)]
pub struct LinkTable<K> {
    links: HashMap<K, Vec<Arc<NodeLink<K>>>>,
}

impl<K> Default for LinkTable<K> {
    fn default() -> Self {
        Self {
            links: HashMap::new(),
        }
    }
}

impl<K> LinkTable<K>
where
    K: Copy + Eq + Hash,
{
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends attachments for `node`.
    ///
    /// Linking nothing leaves the table unchanged.
    pub fn link(&mut self, node: K, links: impl IntoIterator<Item = Arc<NodeLink<K>>>) {
        let mut links = links.into_iter().peekable();
        if links.peek().is_none() {
            return;
        }
        let entry = self.links.entry(node).or_default();
        for link in links {
            debug_assert!(link.node() == node, "attachment belongs to another node");
            entry.push(link);
        }
    }

    /// Removes every attachment of `node`, returning them.
    pub fn unlink(&mut self, node: K) -> Option<Vec<Arc<NodeLink<K>>>> {
        self.links.remove(&node)
    }

    /// Returns the attachments of `node`, in link order.
    #[must_use]
    pub fn links(&self, node: K) -> &[Arc<NodeLink<K>>] {
        self.links.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns `true` if `node` has at least one attachment.
    #[must_use]
    pub fn contains(&self, node: K) -> bool {
        self.links.contains_key(&node)
    }

    /// Strips from `candidates` every unit already attached to `node`.
    ///
    /// Units are matched by identifier.
    pub fn remove_duplicates(&self, node: K, candidates: &mut Vec<Arc<StyleUnit>>) {
        let existing = self.links(node);
        if existing.is_empty() {
            return;
        }
        candidates.retain(|unit| !existing.iter().any(|link| link.unit().id() == unit.id()));
    }

    /// Iterates over every linked node and its attachments.
    pub fn iter(&self) -> impl Iterator<Item = (K, &[Arc<NodeLink<K>>])> + '_ {
        self.links
            .iter()
            .map(|(node, links)| (*node, links.as_slice()))
    }

    /// Iterates over every attachment of the unit with identifier `unit_id`.
    pub fn links_of_unit<'a>(
        &'a self,
        unit_id: &'a str,
    ) -> impl Iterator<Item = &'a Arc<NodeLink<K>>> + 'a {
        self.links
            .values()
            .flatten()
            .filter(move |link| link.unit().id() == unit_id)
    }

    /// Returns the number of linked nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// Returns `true` if no node is linked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Removes every attachment, returning the nodes that were linked.
    pub fn clear(&mut self) -> Vec<K> {
        self.links.drain().map(|(node, _)| node).collect()
    }
}
