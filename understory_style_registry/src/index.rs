// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dependency index: which nodes and sheets a change touches.

use alloc::sync::Arc;
use core::hash::Hash;

use hashbrown::HashMap;

use crate::dependency::{Dependency, DependencySet};
use crate::link::{LinkTable, NodeLink};
use crate::unit::{StyleSheet, StyleSheetKind};

/// Node identity → every attachment of that node, for recomputation.
pub type DependencyMap<K> = HashMap<K, Vec<Arc<NodeLink<K>>>>;

/// Collects the nodes whose styles must be recomputed after `changed`.
///
/// A node is included when any of its units depends on a changed kind. It is
/// then included with **all** of its attachments: composed styles are
/// recomputed together or not at all.
#[must_use]
pub fn build_dependency_map<K>(links: &LinkTable<K>, changed: DependencySet) -> DependencyMap<K>
where
    K: Copy + Eq + Hash,
{
    let mut map = DependencyMap::new();
    if changed.is_empty() {
        return map;
    }
    for (node, node_links) in links.iter() {
        if node_links
            .iter()
            .any(|link| link.unit().depends_on_any(changed))
        {
            map.insert(node, node_links.to_vec());
        }
    }
    map
}

/// Selects the style sheets whose units must be rebuilt after `changed`.
///
/// `Themable` sheets follow theme changes only, `ThemableWithMiniRuntime`
/// sheets follow any change one of their units declares, and `Static` sheets
/// never refresh. Sheets are returned in iteration order, each at most once.
#[must_use]
pub fn style_sheets_to_refresh<'a, I>(sheets: I, changed: DependencySet) -> Vec<Arc<StyleSheet>>
where
    I: IntoIterator<Item = &'a Arc<StyleSheet>>,
{
    if changed.is_empty() {
        return Vec::new();
    }
    let theme_changed = changed.contains(Dependency::Theme);

    sheets
        .into_iter()
        .filter(|sheet| match sheet.kind() {
            StyleSheetKind::Static => false,
            StyleSheetKind::Themable => theme_changed,
            StyleSheetKind::ThemableWithMiniRuntime => sheet.depends_on_any(changed),
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::Variants;
    use crate::unit::{StyleSheetId, StyleUnit};
    use serde_json::Value;

    fn unit(id: &str, deps: &[Dependency]) -> Arc<StyleUnit> {
        Arc::new(StyleUnit::new(
            id,
            id,
            deps.iter().copied().collect(),
            Value::Null,
        ))
    }

    fn attach(table: &mut LinkTable<u32>, node: u32, units: &[&Arc<StyleUnit>]) {
        table.link(
            node,
            units
                .iter()
                .map(|unit| Arc::new(NodeLink::new(Arc::clone(unit), node, Variants::new()))),
        );
    }

    fn sheet(id: u32, kind: StyleSheetKind, units: &[Arc<StyleUnit>]) -> Arc<StyleSheet> {
        let sheet = StyleSheet::new(StyleSheetId(id), kind, Value::Null);
        for unit in units {
            sheet.insert_unit(unit.style_key(), Arc::clone(unit));
        }
        Arc::new(sheet)
    }

    #[test]
    fn dependency_map_is_all_or_nothing_per_node() {
        let themed = unit("themed", &[Dependency::Theme]);
        let plain = unit("plain", &[]);
        let sized = unit("sized", &[Dependency::Dimensions]);

        let mut table = LinkTable::new();
        attach(&mut table, 1, &[&plain, &themed]);
        attach(&mut table, 2, &[&plain]);
        attach(&mut table, 3, &[&sized, &plain]);

        let map = build_dependency_map(&table, Dependency::Theme.into_set());
        assert_eq!(map.len(), 1);
        let ids: Vec<_> = map[&1].iter().map(|link| link.unit().id()).collect();
        assert_eq!(ids, ["plain", "themed"]);

        let map = build_dependency_map(
            &table,
            Dependency::Theme.into_set() | Dependency::Dimensions.into_set(),
        );
        assert_eq!(map.len(), 2);
        assert_eq!(map[&3].len(), 2);
        assert!(!map.contains_key(&2));
    }

    #[test]
    fn no_change_selects_nothing() {
        let themed = unit("themed", &[Dependency::Theme]);
        let mut table = LinkTable::new();
        attach(&mut table, 1, &[&themed]);
        let sheets = [
            sheet(1, StyleSheetKind::Themable, &[]),
            sheet(2, StyleSheetKind::ThemableWithMiniRuntime, &[themed]),
        ];

        assert!(build_dependency_map(&table, DependencySet::EMPTY).is_empty());
        assert!(style_sheets_to_refresh(&sheets, DependencySet::EMPTY).is_empty());
    }

    #[test]
    fn theme_change_selects_themable_and_theme_dependent_sheets() {
        let sheets = [
            sheet(1, StyleSheetKind::Static, &[unit("s", &[Dependency::Theme])]),
            sheet(2, StyleSheetKind::Themable, &[]),
            sheet(
                3,
                StyleSheetKind::ThemableWithMiniRuntime,
                &[unit("a", &[Dependency::Insets]), unit("b", &[Dependency::Theme])],
            ),
            sheet(
                4,
                StyleSheetKind::ThemableWithMiniRuntime,
                &[unit("c", &[Dependency::Insets])],
            ),
        ];

        let ids: Vec<_> = style_sheets_to_refresh(&sheets, Dependency::Theme.into_set())
            .iter()
            .map(|sheet| sheet.id().0)
            .collect();
        assert_eq!(ids, [2, 3]);
    }

    #[test]
    fn runtime_change_skips_themable_sheets() {
        let sheets = [
            sheet(1, StyleSheetKind::Themable, &[]),
            sheet(
                2,
                StyleSheetKind::ThemableWithMiniRuntime,
                &[unit("a", &[Dependency::Insets])],
            ),
            sheet(3, StyleSheetKind::Static, &[unit("s", &[Dependency::Insets])]),
        ];

        let ids: Vec<_> = style_sheets_to_refresh(&sheets, Dependency::Insets.into_set())
            .iter()
            .map(|sheet| sheet.id().0)
            .collect();
        assert_eq!(ids, [2]);
    }
}
