// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-context theme and breakpoint state.

use hashbrown::HashMap;
use serde_json::{Map, Value};

use crate::error::RegistryError;

const LIGHT: &str = "light";
const DARK: &str = "dark";

/// Theme, breakpoint and preference state of one scripting context.
///
/// A context's state is replaced wholesale when the context is reconfigured,
/// e.g. on hot reload.
#[derive(Debug, Default)]
pub struct ContextState {
    themes: HashMap<String, Value>,
    theme_names: Vec<String>,
    breakpoints: Vec<(String, f64)>,
    current_theme: Option<String>,
    current_breakpoint: Option<String>,
    prefers_adaptive_themes: Option<bool>,
    initial_theme: Option<String>,
    scoped_theme: Option<String>,
    has_user_config: bool,
    color_cache: HashMap<String, u32>,
}

impl ContextState {
    /// Creates an empty, unconfigured state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a theme object under `name`.
    ///
    /// Registering an existing name replaces its object but keeps its
    /// original position in [`registered_theme_names`](Self::registered_theme_names).
    pub fn register_theme(&mut self, name: impl Into<String>, theme: Value) {
        let name = name.into();
        if self.themes.insert(name.clone(), theme).is_none() {
            self.theme_names.push(name);
        }
    }

    /// Replaces the breakpoint list.
    ///
    /// Pairs are kept sorted ascending by threshold.
    pub fn register_breakpoints(&mut self, mut breakpoints: Vec<(String, f64)>) {
        breakpoints.sort_by(|a, b| a.1.total_cmp(&b.1));
        self.breakpoints = breakpoints;
    }

    /// Records whether adaptive themes are preferred.
    pub fn set_prefers_adaptive_themes(&mut self, prefers: bool) {
        self.prefers_adaptive_themes = Some(prefers);
    }

    /// Records the initial theme name.
    pub fn set_initial_theme(&mut self, name: impl Into<String>) {
        self.initial_theme = Some(name.into());
    }

    /// Marks the context as explicitly configured.
    pub fn set_has_user_config(&mut self, configured: bool) {
        self.has_user_config = configured;
    }

    /// Returns `true` once the context was explicitly configured.
    #[must_use]
    pub fn has_user_config(&self) -> bool {
        self.has_user_config
    }

    /// Returns `true` if adaptive themes are preferred and both `light` and
    /// `dark` are registered.
    #[must_use]
    pub fn has_adaptive_themes(&self) -> bool {
        self.prefers_adaptive_themes() && self.has_theme(LIGHT) && self.has_theme(DARK)
    }

    /// Returns whether adaptive themes are preferred.
    #[must_use]
    pub fn prefers_adaptive_themes(&self) -> bool {
        self.prefers_adaptive_themes == Some(true)
    }

    /// Returns `true` if `name` is a registered theme.
    #[must_use]
    pub fn has_theme(&self, name: &str) -> bool {
        self.theme_names.iter().any(|registered| registered == name)
    }

    /// Returns the registered theme names, in registration order.
    #[must_use]
    pub fn registered_theme_names(&self) -> &[String] {
        &self.theme_names
    }

    /// Selects the active theme.
    ///
    /// Returns `true` if the selection changed.
    pub fn set_theme(&mut self, name: &str) -> Result<bool, RegistryError> {
        if !self.has_theme(name) {
            return Err(RegistryError::UnknownTheme {
                name: name.to_owned(),
            });
        }
        if self.current_theme.as_deref() == Some(name) {
            return Ok(false);
        }
        self.current_theme = Some(name.to_owned());
        Ok(true)
    }

    /// Returns the selected theme name.
    #[must_use]
    pub fn current_theme_name(&self) -> Option<&str> {
        self.current_theme.as_deref()
    }

    /// Returns the active theme object.
    ///
    /// A context configured without themes gets an empty object.
    pub fn current_theme(&self) -> Result<Value, RegistryError> {
        if self.theme_names.is_empty() {
            if !self.has_user_config {
                return Err(RegistryError::NotConfigured);
            }
            return Ok(Value::Object(Map::new()));
        }

        let name = self
            .current_theme
            .as_deref()
            .ok_or(RegistryError::ThemeNotSelected)?;
        self.theme_by_name(name)
    }

    /// Returns the theme object registered under `name`.
    pub fn theme_by_name(&self, name: &str) -> Result<Value, RegistryError> {
        self.themes
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::UnknownTheme {
                name: name.to_owned(),
            })
    }

    /// Replaces the theme object of `name` with the updater's result.
    ///
    /// The stored theme is left unchanged if the updater does not return an
    /// object.
    pub fn update_theme(
        &mut self,
        name: &str,
        updater: impl FnOnce(&Value) -> Value,
    ) -> Result<(), RegistryError> {
        let theme = self
            .themes
            .get_mut(name)
            .ok_or_else(|| RegistryError::UnknownTheme {
                name: name.to_owned(),
            })?;
        let updated = updater(theme);
        if !updated.is_object() {
            return Err(RegistryError::InvalidUpdaterResult {
                name: name.to_owned(),
            });
        }
        *theme = updated;
        Ok(())
    }

    /// Returns the breakpoints, ascending by threshold.
    #[must_use]
    pub fn breakpoints(&self) -> &[(String, f64)] {
        &self.breakpoints
    }

    /// Recomputes the current breakpoint from a viewport width.
    ///
    /// The current breakpoint is the one with the largest threshold not above
    /// `width`, or the first one if `width` is below every threshold. Does
    /// nothing when no breakpoints are registered. Returns `true` if the
    /// current breakpoint changed.
    pub fn compute_current_breakpoint(&mut self, width: f64) -> bool {
        let Some((first, _)) = self.breakpoints.first() else {
            return false;
        };
        let name = self
            .breakpoints
            .iter()
            .rev()
            .find(|(_, threshold)| width >= *threshold)
            .map_or(first, |(name, _)| name);

        if self.current_breakpoint.as_deref() == Some(name.as_str()) {
            return false;
        }
        self.current_breakpoint = Some(name.clone());
        true
    }

    /// Returns the current breakpoint name.
    #[must_use]
    pub fn current_breakpoint_name(&self) -> Option<&str> {
        self.current_breakpoint.as_deref()
    }

    /// Returns `true` if an initial theme was configured.
    #[must_use]
    pub fn has_initial_theme(&self) -> bool {
        self.initial_theme.is_some()
    }

    /// Returns the configured initial theme name.
    #[must_use]
    pub fn initial_theme(&self) -> Option<&str> {
        self.initial_theme.as_deref()
    }

    /// Returns the scoped theme override.
    #[must_use]
    pub fn scoped_theme(&self) -> Option<&str> {
        self.scoped_theme.as_deref()
    }

    /// Sets or clears the scoped theme override.
    ///
    /// The override is independent of [`set_theme`](Self::set_theme).
    pub fn set_scoped_theme(&mut self, name: Option<String>) {
        self.scoped_theme = name;
    }

    /// Parses a color string through `process`, memoizing the result.
    ///
    /// Colors the processor cannot parse are cached as `0`.
    pub fn parse_color(&mut self, color: &str, process: impl FnOnce(&str) -> Option<u32>) -> u32 {
        if let Some(cached) = self.color_cache.get(color) {
            return *cached;
        }
        let parsed = process(color).unwrap_or(0);
        self.color_cache.insert(color.to_owned(), parsed);
        parsed
    }
}
