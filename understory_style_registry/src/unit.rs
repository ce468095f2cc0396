// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Style units and style sheets.
//!
//! A [`StyleSheet`] owns an ordered set of named [`StyleUnit`]s. Units are
//! shared through [`Arc`] with the link table, so a unit's last computed
//! value can be refreshed in place while nodes still point at it.

use alloc::sync::Arc;
use core::fmt;

use parking_lot::{Mutex, RwLock};
use serde_json::Value;

use crate::dependency::{Dependency, DependencySet};

/// One named, dependency-tagged style computation.
///
/// Units compare by [`id`](Self::id), never by address.
pub struct StyleUnit {
    id: String,
    style_key: String,
    dependencies: DependencySet,
    value: Mutex<Value>,
}

impl StyleUnit {
    /// Creates a unit.
    ///
    /// `id` must be unique across every style sheet of a context.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        style_key: impl Into<String>,
        dependencies: DependencySet,
        value: Value,
    ) -> Self {
        Self {
            id: id.into(),
            style_key: style_key.into(),
            dependencies,
            value: Mutex::new(value),
        }
    }

    /// Returns the unique identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the name of the style property this unit computes.
    #[must_use]
    pub fn style_key(&self) -> &str {
        &self.style_key
    }

    /// Returns the dependency kinds declared at creation.
    #[must_use]
    pub fn dependencies(&self) -> DependencySet {
        self.dependencies
    }

    /// Returns `true` if this unit reacts to `dependency`.
    #[must_use]
    pub fn depends_on(&self, dependency: Dependency) -> bool {
        self.dependencies.contains(dependency)
    }

    /// Returns `true` if this unit reacts to any kind in `changed`.
    #[must_use]
    pub fn depends_on_any(&self, changed: DependencySet) -> bool {
        self.dependencies.intersects(changed)
    }

    /// Returns a copy of the last computed value.
    #[must_use]
    pub fn value(&self) -> Value {
        self.value.lock().clone()
    }

    /// Replaces the last computed value.
    pub fn set_value(&self, value: Value) {
        *self.value.lock() = value;
    }
}

impl PartialEq for StyleUnit {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for StyleUnit {}

impl fmt::Debug for StyleUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StyleUnit")
            .field("id", &self.id)
            .field("style_key", &self.style_key)
            .field("dependencies", &self.dependencies)
            .finish_non_exhaustive()
    }
}

/// Identifier of a [`StyleSheet`] within a context.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StyleSheetId(pub u32);

/// Refresh policy of a [`StyleSheet`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum StyleSheetKind {
    /// Never recomputed.
    Static,
    /// Recomputed on every theme change.
    Themable,
    /// Recomputed when any unit's dependencies intersect the change.
    ThemableWithMiniRuntime,
}

/// A collection of named style units with a refresh policy.
///
/// Sheets live as long as their definition, not a single render: the
/// registry hands out `Arc<StyleSheet>` and the style producer fills and
/// refreshes units in place.
pub struct StyleSheet {
    id: StyleSheetId,
    kind: StyleSheetKind,
    raw: RwLock<Value>,
    units: RwLock<Vec<(String, Arc<StyleUnit>)>>,
}

impl StyleSheet {
    /// Creates an empty sheet from its raw definition.
    #[must_use]
    pub fn new(id: StyleSheetId, kind: StyleSheetKind, raw: Value) -> Self {
        Self {
            id,
            kind,
            raw: RwLock::new(raw),
            units: RwLock::new(Vec::new()),
        }
    }

    /// Returns the sheet identifier.
    #[must_use]
    pub fn id(&self) -> StyleSheetId {
        self.id
    }

    /// Returns the refresh policy.
    #[must_use]
    pub fn kind(&self) -> StyleSheetKind {
        self.kind
    }

    /// Returns a copy of the raw definition.
    #[must_use]
    pub fn raw(&self) -> Value {
        self.raw.read().clone()
    }

    /// Replaces the raw definition.
    pub fn set_raw(&self, raw: Value) {
        *self.raw.write() = raw;
    }

    /// Inserts or replaces the unit for `style_key`, keeping key order.
    ///
    /// Returns the unit previously stored under that key.
    pub fn insert_unit(
        &self,
        style_key: impl Into<String>,
        unit: Arc<StyleUnit>,
    ) -> Option<Arc<StyleUnit>> {
        let style_key = style_key.into();
        let mut units = self.units.write();
        match units.iter_mut().find(|(key, _)| *key == style_key) {
            Some((_, slot)) => Some(core::mem::replace(slot, unit)),
            None => {
                units.push((style_key, unit));
                None
            }
        }
    }

    /// Returns the unit stored under `style_key`.
    #[must_use]
    pub fn unit(&self, style_key: &str) -> Option<Arc<StyleUnit>> {
        self.units
            .read()
            .iter()
            .find(|(key, _)| key == style_key)
            .map(|(_, unit)| Arc::clone(unit))
    }

    /// Returns a snapshot of all units, in key order.
    #[must_use]
    pub fn units(&self) -> Vec<(String, Arc<StyleUnit>)> {
        self.units.read().clone()
    }

    /// Returns the unit with the given identifier, if this sheet owns it.
    #[must_use]
    pub fn unit_by_id(&self, id: &str) -> Option<Arc<StyleUnit>> {
        self.units
            .read()
            .iter()
            .find(|(_, unit)| unit.id() == id)
            .map(|(_, unit)| Arc::clone(unit))
    }

    /// Returns `true` if any unit reacts to a kind in `changed`.
    #[must_use]
    pub fn depends_on_any(&self, changed: DependencySet) -> bool {
        self.units
            .read()
            .iter()
            .any(|(_, unit)| unit.depends_on_any(changed))
    }

    /// Returns the number of units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.read().len()
    }

    /// Returns `true` if the sheet has no units.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.read().is_empty()
    }
}

impl fmt::Debug for StyleSheet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StyleSheet")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("units", &self.len())
            .finish_non_exhaustive()
    }
}
