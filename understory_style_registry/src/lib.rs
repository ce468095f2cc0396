// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Style Registry: per-context themes, breakpoints and style units.
//!
//! A scripting context describes styles as [`StyleSheet`]s of named
//! [`StyleUnit`]s, each declaring the [`Dependency`] kinds it reacts to.
//! When a unit is applied to a render tree node, the attachment is recorded as
//! a [`NodeLink`]. On a change (a new theme, a resized viewport, ...) the
//! registry answers two questions:
//!
//! - which sheets must be rebuilt ([`StyleRegistry::style_sheets_to_refresh`]),
//! - which nodes must receive new props ([`StyleRegistry::build_dependency_map`]).
//!
//! Fresh props are staged into an `understory_tree_patch::TrafficController`,
//! from which a `TreePatcher` pushes them into the render tree in one commit.
//! [`StyleRegistry::refresh`] runs the whole pipeline against a
//! [`StyleProducer`].
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use serde_json::{Value, json};
//! use understory_style_registry::{
//!     ContextState, Dependency, NodeLink, StyleRegistry, StyleSheetId, StyleSheetKind,
//!     StyleUnit, Variants,
//! };
//!
//! let mut registry = StyleRegistry::<u32, u64>::new();
//! registry
//!     .configure_json(0, json!({
//!         "themes": { "light": { "fg": "black" }, "dark": { "fg": "white" } },
//!         "initialTheme": "light",
//!     }))
//!     .unwrap();
//!
//! let sheet = registry
//!     .add_style_sheet(0, StyleSheetId(1), StyleSheetKind::Themable, json!({}))
//!     .unwrap();
//! let text = Arc::new(StyleUnit::new("text-1", "text", Dependency::Theme.into(), Value::Null));
//! sheet.insert_unit("text", Arc::clone(&text));
//!
//! // Props are the theme's foreground color.
//! let mut producer = |state: &ContextState, _: &[Arc<NodeLink<u64>>]| {
//!     json!({ "color": state.current_theme().unwrap()["fg"] })
//! };
//!
//! let link = Arc::new(NodeLink::new(text, 42, Variants::new()));
//! registry.link_node(0, 42, vec![link], &mut producer).unwrap();
//! assert_eq!(registry.traffic().take_updates()[&42], Some(json!({ "color": "black" })));
//!
//! registry.set_theme(0, "dark").unwrap();
//! let summary = registry.refresh(0, Dependency::Theme.into(), &mut producer).unwrap();
//! assert_eq!(summary.nodes_staged, 1);
//! assert_eq!(registry.traffic().take_updates()[&42], Some(json!({ "color": "white" })));
//! ```
//!
//! ## Contexts
//!
//! Every scripting context owns its state, sheets and links. A context must be
//! created or configured before use; reconfiguring replaces its state
//! atomically (hot reload) and [`StyleRegistry::destroy_context`] tears it
//! down. The update queue is shared by all contexts.
//!
//! ## Logging
//!
//! Events are emitted through [`tracing`]. This crate never installs a
//! subscriber.
//!
//! ## Features
//!
//! This crate has no optional features. It requires `std`: style units and
//! sheets are refreshed in place behind `parking_lot` locks, and the update
//! queue comes from `understory_tree_patch`.

extern crate alloc;

mod config;
mod dependency;
mod error;
mod index;
mod link;
mod registry;
mod state;
mod unit;

pub use config::StyleConfig;
pub use dependency::{Dependency, DependencySet};
pub use error::RegistryError;
pub use index::{DependencyMap, build_dependency_map, style_sheets_to_refresh};
pub use link::{LinkTable, NodeLink, Variants};
pub use registry::{RefreshSummary, StyleProducer, StyleRegistry};
pub use state::ContextState;
pub use unit::{StyleSheet, StyleSheetId, StyleSheetKind, StyleUnit};
