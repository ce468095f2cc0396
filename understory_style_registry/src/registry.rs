// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The per-context style registry.

use alloc::collections::BTreeMap;
use alloc::sync::Arc;
use core::fmt::Debug;
use core::hash::Hash;

use hashbrown::HashMap;
use serde_json::Value;
use understory_tree_patch::{PendingUpdates, TrafficController};

use crate::config::StyleConfig;
use crate::dependency::DependencySet;
use crate::error::RegistryError;
use crate::index::{self, DependencyMap};
use crate::link::{LinkTable, NodeLink};
use crate::state::ContextState;
use crate::unit::{StyleSheet, StyleSheetId, StyleSheetKind, StyleUnit};

/// Computes concrete props from style units.
///
/// The registry never interprets style values; it asks a producer to rebuild
/// sheets and to turn a node's attachments into one props blob. A producer
/// returning [`Value::Null`] clears the node's props.
///
/// Any `FnMut(&ContextState, &[Arc<NodeLink<K>>]) -> Value` is a producer
/// that never rebuilds sheets.
pub trait StyleProducer<K> {
    /// Recomputes the units of `sheet` against the current `state`.
    fn rebuild_style_sheet(&mut self, state: &ContextState, sheet: &StyleSheet) {
        let _ = (state, sheet);
    }

    /// Produces the props for one node from the given attachments.
    fn produce_props(&mut self, state: &ContextState, links: &[Arc<NodeLink<K>>]) -> Value;
}

impl<K, F> StyleProducer<K> for F
where
    F: FnMut(&ContextState, &[Arc<NodeLink<K>>]) -> Value,
{
    fn produce_props(&mut self, state: &ContextState, links: &[Arc<NodeLink<K>>]) -> Value {
        self(state, links)
    }
}

/// Outcome of [`StyleRegistry::refresh`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RefreshSummary {
    /// Style sheets handed to the producer for rebuilding.
    pub sheets_rebuilt: usize,
    /// Nodes whose props were staged.
    pub nodes_staged: usize,
}

#[derive(Debug)]
struct Context<K> {
    state: ContextState,
    sheets: BTreeMap<StyleSheetId, Arc<StyleSheet>>,
    links: LinkTable<K>,
}

impl<K> Context<K>
where
    K: Copy + Eq + Hash,
{
    fn new(state: ContextState) -> Self {
        Self {
            state,
            sheets: BTreeMap::new(),
            links: LinkTable::new(),
        }
    }
}

/// Style state for every scripting context, plus the shared update queue.
///
/// `C` identifies a scripting context and `K` a render tree node. Contexts
/// must be created with [`create_state`](Self::create_state) or
/// [`configure`](Self::configure) before anything else is done with them;
/// other calls fail with [`RegistryError::NotConfigured`].
///
/// The registry is the producer side of the update queue: staged props are
/// drained by an `understory_tree_patch::TreePatcher` sharing the same
/// [`TrafficController`] (see [`traffic`](Self::traffic)).
#[derive(Debug)]
pub struct StyleRegistry<C, K> {
    contexts: HashMap<C, Context<K>>,
    traffic: Arc<TrafficController<K, Value>>,
}

impl<C, K> Default for StyleRegistry<C, K>
where
    C: Copy + Eq + Hash + Debug,
    K: Copy + Eq + Hash + Debug,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<C, K> StyleRegistry<C, K>
where
    C: Copy + Eq + Hash + Debug,
    K: Copy + Eq + Hash + Debug,
{
    /// Creates a registry with its own update queue.
    #[must_use]
    pub fn new() -> Self {
        Self::with_traffic(Arc::new(TrafficController::new()))
    }

    /// Creates a registry staging into an existing update queue.
    #[must_use]
    pub fn with_traffic(traffic: Arc<TrafficController<K, Value>>) -> Self {
        Self {
            contexts: HashMap::new(),
            traffic,
        }
    }

    /// Returns the update queue shared with the patcher.
    #[must_use]
    pub fn traffic(&self) -> &Arc<TrafficController<K, Value>> {
        &self.traffic
    }

    /// Installs a fresh, unconfigured state for `cx`.
    ///
    /// An existing state is discarded; the context's style sheets and links
    /// are kept.
    pub fn create_state(&mut self, cx: C) {
        self.install_state(cx, ContextState::new());
    }

    /// Installs a fresh state for `cx` built from `config`.
    ///
    /// On error the previous state is left untouched.
    pub fn configure(&mut self, cx: C, config: &StyleConfig) -> Result<(), RegistryError> {
        let state = config.build_state()?;
        tracing::debug!(
            ?cx,
            themes = state.registered_theme_names().len(),
            breakpoints = state.breakpoints().len(),
            "configured context"
        );
        self.install_state(cx, state);
        Ok(())
    }

    /// Parses a configuration document and applies it to `cx`.
    pub fn configure_json(&mut self, cx: C, config: Value) -> Result<(), RegistryError> {
        let config = StyleConfig::from_json(config)?;
        self.configure(cx, &config)
    }

    fn install_state(&mut self, cx: C, state: ContextState) {
        match self.contexts.get_mut(&cx) {
            Some(context) => context.state = state,
            None => {
                self.contexts.insert(cx, Context::new(state));
            }
        }
    }

    /// Tears down `cx`: its state, style sheets and links.
    ///
    /// Pending updates for the context's nodes are purged under the gate,
    /// except for nodes another context still links. Returns `false` if the
    /// context did not exist.
    pub fn destroy_context(&mut self, cx: C) -> bool {
        let Some(mut context) = self.contexts.remove(&cx) else {
            return false;
        };
        let remaining = &self.contexts;
        let purged = self.traffic.with_lock(|pending| {
            context
                .links
                .clear()
                .into_iter()
                .filter(|node| !remaining.values().any(|other| other.links.contains(*node)))
                .filter(|node| pending.remove_node(*node))
                .count()
        });
        tracing::debug!(?cx, purged, "destroyed context");
        true
    }

    /// Returns `true` if `cx` has a state.
    #[must_use]
    pub fn has_state(&self, cx: C) -> bool {
        self.contexts.contains_key(&cx)
    }

    /// Returns the state of `cx`.
    pub fn state(&self, cx: C) -> Result<&ContextState, RegistryError> {
        self.context(cx).map(|context| &context.state)
    }

    /// Returns the state of `cx` for mutation.
    pub fn state_mut(&mut self, cx: C) -> Result<&mut ContextState, RegistryError> {
        self.context_mut(cx).map(|context| &mut context.state)
    }

    fn context(&self, cx: C) -> Result<&Context<K>, RegistryError> {
        self.contexts.get(&cx).ok_or(RegistryError::NotConfigured)
    }

    fn context_mut(&mut self, cx: C) -> Result<&mut Context<K>, RegistryError> {
        self.contexts
            .get_mut(&cx)
            .ok_or(RegistryError::NotConfigured)
    }

    /// Registers a theme object under `name`.
    pub fn register_theme(
        &mut self,
        cx: C,
        name: impl Into<String>,
        theme: Value,
    ) -> Result<(), RegistryError> {
        self.state_mut(cx)?.register_theme(name, theme);
        Ok(())
    }

    /// Replaces the breakpoint list of `cx`.
    pub fn register_breakpoints(
        &mut self,
        cx: C,
        breakpoints: Vec<(String, f64)>,
    ) -> Result<(), RegistryError> {
        self.state_mut(cx)?.register_breakpoints(breakpoints);
        Ok(())
    }

    /// Records whether `cx` prefers adaptive themes.
    pub fn set_prefers_adaptive_themes(&mut self, cx: C, prefers: bool) -> Result<(), RegistryError> {
        self.state_mut(cx)?.set_prefers_adaptive_themes(prefers);
        Ok(())
    }

    /// Records the initial theme name of `cx`.
    pub fn set_initial_theme_name(
        &mut self,
        cx: C,
        name: impl Into<String>,
    ) -> Result<(), RegistryError> {
        self.state_mut(cx)?.set_initial_theme(name);
        Ok(())
    }

    /// Selects the active theme of `cx`, reporting whether it changed.
    pub fn set_theme(&mut self, cx: C, name: &str) -> Result<bool, RegistryError> {
        self.state_mut(cx)?.set_theme(name)
    }

    /// Replaces a theme object with the result of `updater`.
    ///
    /// Fails if the theme is unknown or the updater does not return an object.
    pub fn update_theme(
        &mut self,
        cx: C,
        name: &str,
        updater: impl FnOnce(&Value) -> Value,
    ) -> Result<(), RegistryError> {
        self.state_mut(cx)?.update_theme(name, updater)
    }

    /// Returns the scoped theme override of `cx`.
    pub fn scoped_theme(&self, cx: C) -> Result<Option<&str>, RegistryError> {
        Ok(self.state(cx)?.scoped_theme())
    }

    /// Sets or clears the scoped theme override of `cx`.
    pub fn set_scoped_theme(&mut self, cx: C, name: Option<String>) -> Result<(), RegistryError> {
        self.state_mut(cx)?.set_scoped_theme(name);
        Ok(())
    }

    /// Creates and stores an empty style sheet.
    ///
    /// A sheet already stored under `id` is replaced.
    pub fn add_style_sheet(
        &mut self,
        cx: C,
        id: StyleSheetId,
        kind: StyleSheetKind,
        raw: Value,
    ) -> Result<Arc<StyleSheet>, RegistryError> {
        let context = self.context_mut(cx)?;
        let sheet = Arc::new(StyleSheet::new(id, kind, raw));
        context.sheets.insert(id, Arc::clone(&sheet));
        tracing::debug!(?cx, id = id.0, ?kind, "added style sheet");
        Ok(sheet)
    }

    /// Returns the style sheet stored under `id`.
    pub fn style_sheet(&self, cx: C, id: StyleSheetId) -> Result<Arc<StyleSheet>, RegistryError> {
        self.context(cx)?
            .sheets
            .get(&id)
            .cloned()
            .ok_or(RegistryError::UnknownStyleSheet { id })
    }

    /// Returns the style unit with identifier `id` from any sheet of `cx`.
    ///
    /// Sheets are scanned in identifier order; the first match wins.
    pub fn unit_by_id(&self, cx: C, id: &str) -> Result<Option<Arc<StyleUnit>>, RegistryError> {
        Ok(self
            .context(cx)?
            .sheets
            .values()
            .find_map(|sheet| sheet.unit_by_id(id)))
    }

    /// Attaches `links` to `node` and stages the node's props.
    ///
    /// Props are produced from exactly the new attachments, then the update
    /// queue is resumed so the patcher picks them up.
    pub fn link_node<P>(
        &mut self,
        cx: C,
        node: K,
        links: Vec<Arc<NodeLink<K>>>,
        producer: &mut P,
    ) -> Result<(), RegistryError>
    where
        P: StyleProducer<K> + ?Sized,
    {
        let context = self.context_mut(cx)?;
        let props = producer.produce_props(&context.state, &links);
        let count = links.len();
        context.links.link(node, links);

        self.traffic
            .set_updates(PendingUpdates::from_iter([(node, non_null(props))]));
        self.traffic.resume();
        tracing::debug!(?cx, ?node, links = count, "linked node");
        Ok(())
    }

    /// Strips from `candidates` every unit already attached to `node`.
    pub fn remove_duplicated_units(
        &self,
        cx: C,
        node: K,
        candidates: &mut Vec<Arc<StyleUnit>>,
    ) -> Result<(), RegistryError> {
        self.context(cx)?.links.remove_duplicates(node, candidates);
        Ok(())
    }

    /// Detaches every unit from `node` and drops its pending update.
    ///
    /// Both happen under the update queue's gate, so a concurrent drain sees
    /// either the node fully linked with its update or neither. Returns
    /// `false` if the node had no attachments in `cx`.
    pub fn unlink_node(&mut self, cx: C, node: K) -> bool {
        let Some(context) = self.contexts.get_mut(&cx) else {
            return false;
        };
        let unlinked = self.traffic.with_lock(|pending| {
            pending.remove_node(node);
            context.links.unlink(node).is_some()
        });
        if unlinked {
            tracing::debug!(?cx, ?node, "unlinked node");
        }
        unlinked
    }

    /// Returns the attachments of `node` in `cx`.
    pub fn links(&self, cx: C, node: K) -> Result<&[Arc<NodeLink<K>>], RegistryError> {
        Ok(self.context(cx)?.links.links(node))
    }

    /// Collects, per node, every attachment to recompute after `changed`.
    pub fn build_dependency_map(
        &self,
        cx: C,
        changed: DependencySet,
    ) -> Result<DependencyMap<K>, RegistryError> {
        Ok(index::build_dependency_map(&self.context(cx)?.links, changed))
    }

    /// Selects the style sheets of `cx` to rebuild after `changed`.
    pub fn style_sheets_to_refresh(
        &self,
        cx: C,
        changed: DependencySet,
    ) -> Result<Vec<Arc<StyleSheet>>, RegistryError> {
        Ok(index::style_sheets_to_refresh(
            self.context(cx)?.sheets.values(),
            changed,
        ))
    }

    /// Restages every node attached to the unit `unit_id`.
    ///
    /// Each node's props are produced from that single attachment. Used when
    /// one unit changes out of band. Returns the number of nodes staged.
    pub fn stage_unit_update<P>(
        &self,
        cx: C,
        unit_id: &str,
        producer: &mut P,
    ) -> Result<usize, RegistryError>
    where
        P: StyleProducer<K> + ?Sized,
    {
        let context = self.context(cx)?;
        let batch: PendingUpdates<K, Value> = context
            .links
            .links_of_unit(unit_id)
            .map(|link| {
                let props = producer.produce_props(&context.state, core::slice::from_ref(link));
                (link.node(), non_null(props))
            })
            .collect();

        let staged = batch.len();
        if staged > 0 {
            self.traffic.set_updates(batch);
            self.traffic.resume();
        }
        tracing::debug!(?cx, unit_id, staged, "staged unit update");
        Ok(staged)
    }

    /// Recomputes and stages everything affected by `changed`.
    ///
    /// Qualifying sheets are rebuilt first, then every node depending on a
    /// changed kind gets fresh props from all of its attachments. The whole
    /// result is staged as one batch.
    pub fn refresh<P>(
        &self,
        cx: C,
        changed: DependencySet,
        producer: &mut P,
    ) -> Result<RefreshSummary, RegistryError>
    where
        P: StyleProducer<K> + ?Sized,
    {
        let context = self.context(cx)?;

        let sheets = index::style_sheets_to_refresh(context.sheets.values(), changed);
        for sheet in &sheets {
            producer.rebuild_style_sheet(&context.state, sheet);
        }

        let batch: PendingUpdates<K, Value> = index::build_dependency_map(&context.links, changed)
            .into_iter()
            .map(|(node, links)| (node, non_null(producer.produce_props(&context.state, &links))))
            .collect();

        let summary = RefreshSummary {
            sheets_rebuilt: sheets.len(),
            nodes_staged: batch.len(),
        };
        if summary.nodes_staged > 0 {
            self.traffic.set_updates(batch);
            self.traffic.resume();
        }
        tracing::debug!(
            ?cx,
            ?changed,
            sheets = summary.sheets_rebuilt,
            nodes = summary.nodes_staged,
            "refreshed styles"
        );
        Ok(summary)
    }
}

fn non_null(props: Value) -> Option<Value> {
    (!props.is_null()).then_some(props)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dependency::Dependency;
    use crate::link::Variants;
    use serde_json::json;

    type Registry = StyleRegistry<u8, u32>;

    fn configured() -> Registry {
        let mut registry = Registry::new();
        registry
            .configure_json(
                0,
                json!({
                    "themes": { "light": { "fg": "black" }, "dark": { "fg": "white" } },
                    "initialTheme": "light",
                }),
            )
            .unwrap();
        registry
    }

    fn themed_unit(registry: &mut Registry, id: &str) -> Arc<StyleUnit> {
        let sheet = registry
            .add_style_sheet(0, StyleSheetId(1), StyleSheetKind::Themable, json!({}))
            .unwrap();
        let unit = Arc::new(StyleUnit::new(
            id,
            "text",
            Dependency::Theme.into_set(),
            json!({"color": "black"}),
        ));
        sheet.insert_unit("text", Arc::clone(&unit));
        unit
    }

    fn link(unit: &Arc<StyleUnit>, node: u32) -> Arc<NodeLink<u32>> {
        Arc::new(NodeLink::new(Arc::clone(unit), node, Variants::new()))
    }

    fn values(_: &ContextState, links: &[Arc<NodeLink<u32>>]) -> Value {
        Value::Array(links.iter().map(|link| link.unit().value()).collect())
    }

    #[test]
    fn unconfigured_context_is_rejected() {
        let mut registry = Registry::new();

        assert_eq!(
            registry.state(0).err(),
            Some(RegistryError::NotConfigured)
        );
        assert_eq!(
            registry
                .add_style_sheet(0, StyleSheetId(1), StyleSheetKind::Static, Value::Null)
                .err(),
            Some(RegistryError::NotConfigured)
        );
        assert_eq!(
            registry.register_theme(0, "light", json!({})),
            Err(RegistryError::NotConfigured)
        );
        assert!(!registry.unlink_node(0, 1));

        registry.create_state(0);
        assert!(registry.register_theme(0, "light", json!({})).is_ok());
    }

    #[test]
    fn failed_configure_keeps_previous_state() {
        let mut registry = configured();
        let err = registry
            .configure_json(0, json!({ "initialTheme": "blue" }))
            .unwrap_err();

        assert!(matches!(err, RegistryError::UnknownTheme { .. }));
        assert_eq!(registry.state(0).unwrap().current_theme_name(), Some("light"));
    }

    #[test]
    fn reconfiguring_keeps_sheets_and_links() {
        let mut registry = configured();
        let unit = themed_unit(&mut registry, "u1");
        registry
            .link_node(0, 1, vec![link(&unit, 1)], &mut values)
            .unwrap();

        registry.configure_json(0, json!({})).unwrap();

        assert!(registry.state(0).unwrap().registered_theme_names().is_empty());
        assert!(registry.style_sheet(0, StyleSheetId(1)).is_ok());
        assert_eq!(registry.links(0, 1).unwrap().len(), 1);
    }

    #[test]
    fn link_node_stages_props_of_new_links() {
        let mut registry = configured();
        let unit = themed_unit(&mut registry, "u1");
        registry.traffic().pause();

        registry
            .link_node(0, 7, vec![link(&unit, 7)], &mut values)
            .unwrap();

        assert!(!registry.traffic().is_paused());
        let drained = registry.traffic().take_updates();
        assert_eq!(drained[&7], Some(json!([{"color": "black"}])));
    }

    #[test]
    fn null_props_clear_the_node() {
        let mut registry = configured();
        let unit = themed_unit(&mut registry, "u1");

        registry
            .link_node(0, 7, vec![link(&unit, 7)], &mut |_: &ContextState, _: &[Arc<NodeLink<u32>>]| {
                Value::Null
            })
            .unwrap();

        assert_eq!(registry.traffic().take_updates()[&7], None);
    }

    #[test]
    fn unlink_purges_links_and_pending_update() {
        let mut registry = configured();
        let unit = themed_unit(&mut registry, "u1");
        registry
            .link_node(0, 7, vec![link(&unit, 7)], &mut values)
            .unwrap();
        registry
            .link_node(0, 8, vec![link(&unit, 8)], &mut values)
            .unwrap();

        assert!(registry.unlink_node(0, 7));
        assert!(!registry.unlink_node(0, 7));

        assert!(registry.links(0, 7).unwrap().is_empty());
        let drained = registry.traffic().take_updates();
        assert!(!drained.contains_key(&7));
        assert!(drained.contains_key(&8));
    }

    #[test]
    fn duplicates_are_removed_by_id() {
        let mut registry = configured();
        let unit = themed_unit(&mut registry, "u1");
        registry
            .link_node(0, 7, vec![link(&unit, 7)], &mut values)
            .unwrap();

        let other = Arc::new(StyleUnit::new("u2", "box", DependencySet::EMPTY, Value::Null));
        let mut candidates = vec![Arc::clone(&unit), other];
        registry
            .remove_duplicated_units(0, 7, &mut candidates)
            .unwrap();

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].id(), "u2");
    }

    #[test]
    fn unit_lookup_scans_every_sheet() {
        let mut registry = configured();
        themed_unit(&mut registry, "u1");
        let sheet = registry
            .add_style_sheet(0, StyleSheetId(2), StyleSheetKind::Static, Value::Null)
            .unwrap();
        sheet.insert_unit(
            "box",
            Arc::new(StyleUnit::new("u2", "box", DependencySet::EMPTY, Value::Null)),
        );

        assert_eq!(registry.unit_by_id(0, "u2").unwrap().unwrap().style_key(), "box");
        assert!(registry.unit_by_id(0, "nope").unwrap().is_none());
        assert_eq!(
            registry.style_sheet(0, StyleSheetId(9)).err(),
            Some(RegistryError::UnknownStyleSheet { id: StyleSheetId(9) })
        );
    }

    #[test]
    fn stage_unit_update_uses_single_link() {
        let mut registry = configured();
        let unit = themed_unit(&mut registry, "u1");
        let other = Arc::new(StyleUnit::new(
            "u2",
            "box",
            DependencySet::EMPTY,
            json!({"flex": 1}),
        ));
        registry
            .link_node(0, 7, vec![link(&unit, 7), link(&other, 7)], &mut values)
            .unwrap();
        registry
            .link_node(0, 8, vec![link(&unit, 8)], &mut values)
            .unwrap();
        let _ = registry.traffic().take_updates();

        unit.set_value(json!({"color": "red"}));
        let staged = registry
            .stage_unit_update(0, "u1", &mut values)
            .unwrap();

        assert_eq!(staged, 2);
        let drained = registry.traffic().take_updates();
        assert_eq!(drained[&7], Some(json!([{"color": "red"}])));
        assert_eq!(drained[&8], Some(json!([{"color": "red"}])));
    }

    struct ThemeProducer {
        rebuilt: Vec<StyleSheetId>,
    }

    impl StyleProducer<u32> for ThemeProducer {
        fn rebuild_style_sheet(&mut self, state: &ContextState, sheet: &StyleSheet) {
            self.rebuilt.push(sheet.id());
            let Ok(theme) = state.current_theme() else {
                return;
            };
            for (_, unit) in sheet.units() {
                unit.set_value(json!({ "color": theme["fg"] }));
            }
        }

        fn produce_props(&mut self, _: &ContextState, links: &[Arc<NodeLink<u32>>]) -> Value {
            Value::Array(links.iter().map(|link| link.unit().value()).collect())
        }
    }

    #[test]
    fn refresh_rebuilds_and_stages_one_batch() {
        let mut registry = configured();
        let unit = themed_unit(&mut registry, "u1");
        let plain = Arc::new(StyleUnit::new("u2", "box", DependencySet::EMPTY, Value::Null));
        registry
            .add_style_sheet(0, StyleSheetId(2), StyleSheetKind::Static, Value::Null)
            .unwrap()
            .insert_unit("box", Arc::clone(&plain));
        registry
            .link_node(0, 7, vec![link(&unit, 7)], &mut values)
            .unwrap();
        registry
            .link_node(0, 8, vec![link(&plain, 8)], &mut values)
            .unwrap();
        let _ = registry.traffic().take_updates();

        registry.set_theme(0, "dark").unwrap();
        let mut producer = ThemeProducer {
            rebuilt: Vec::new(),
        };
        let summary = registry
            .refresh(0, Dependency::Theme.into_set(), &mut producer)
            .unwrap();

        assert_eq!(
            summary,
            RefreshSummary {
                sheets_rebuilt: 1,
                nodes_staged: 1
            }
        );
        assert_eq!(producer.rebuilt, [StyleSheetId(1)]);
        let drained = registry.traffic().take_updates();
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[&7], Some(json!([{"color": "white"}])));
    }

    #[test]
    fn destroy_context_purges_everything() {
        let mut registry = configured();
        registry.create_state(1);
        let unit = themed_unit(&mut registry, "u1");
        registry
            .link_node(0, 7, vec![link(&unit, 7)], &mut values)
            .unwrap();
        registry.traffic().set_updates(PendingUpdates::from_iter([(9, None)]));

        assert!(registry.destroy_context(0));
        assert!(!registry.destroy_context(0));

        assert!(!registry.has_state(0));
        assert!(registry.has_state(1));
        let drained = registry.traffic().take_updates();
        assert_eq!(drained.len(), 1);
        assert!(drained.contains_key(&9));
    }

    #[test]
    fn destroy_context_keeps_nodes_linked_elsewhere() {
        let mut registry = configured();
        registry.create_state(1);
        let unit = themed_unit(&mut registry, "u1");
        registry
            .link_node(1, 4, vec![link(&unit, 4)], &mut values)
            .unwrap();
        registry
            .link_node(1, 5, vec![link(&unit, 5)], &mut values)
            .unwrap();
        registry
            .link_node(0, 4, vec![link(&unit, 4)], &mut values)
            .unwrap();

        assert!(registry.destroy_context(1));

        assert_eq!(registry.links(0, 4).unwrap().len(), 1);
        let drained = registry.traffic().take_updates();
        assert!(drained.contains_key(&4), "update of a live link was purged");
        assert!(!drained.contains_key(&5));
    }

    #[test]
    fn failed_calls_leave_pending_batch_alone() {
        let mut registry = configured();
        let unit = themed_unit(&mut registry, "u1");
        registry
            .link_node(0, 7, vec![link(&unit, 7)], &mut values)
            .unwrap();
        let staged = registry.traffic().lock().get(7).cloned();

        assert!(matches!(
            registry.set_theme(0, "blue"),
            Err(RegistryError::UnknownTheme { .. })
        ));
        assert!(matches!(
            registry.update_theme(0, "light", |_| json!(1)),
            Err(RegistryError::InvalidUpdaterResult { .. })
        ));
        assert_eq!(
            registry.link_node(9, 8, vec![link(&unit, 8)], &mut values),
            Err(RegistryError::NotConfigured)
        );
        assert_eq!(
            registry.stage_unit_update(9, "u1", &mut values),
            Err(RegistryError::NotConfigured)
        );
        assert!(matches!(
            registry.configure_json(0, json!({ "initialTheme": "blue" })),
            Err(RegistryError::UnknownTheme { .. })
        ));

        let drained = registry.traffic().take_updates();
        assert_eq!(drained.len(), 1);
        assert_eq!(drained.get(&7).cloned(), staged);
        assert_eq!(
            registry.state(0).unwrap().theme_by_name("light").unwrap(),
            json!({ "fg": "black" })
        );
        assert!(registry.links(0, 8).unwrap().is_empty());
    }

    #[test]
    fn scoped_theme_round_trip() {
        let mut registry = configured();
        assert_eq!(registry.scoped_theme(0).unwrap(), None);

        registry
            .set_scoped_theme(0, Some(String::from("dark")))
            .unwrap();
        assert_eq!(registry.scoped_theme(0).unwrap(), Some("dark"));
        assert_eq!(
            registry.state(0).unwrap().current_theme_name(),
            Some("light")
        );
    }
}
