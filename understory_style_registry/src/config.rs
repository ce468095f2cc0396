// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Context configuration.

use alloc::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::RegistryError;
use crate::state::ContextState;

/// Theme, breakpoint and preference settings for one context.
///
/// Usually parsed from the document a scripting context passes on startup:
///
/// ```
/// use serde_json::json;
/// use understory_style_registry::StyleConfig;
///
/// let config = StyleConfig::from_json(json!({
///     "themes": { "light": { "bg": "white" }, "dark": { "bg": "black" } },
///     "breakpoints": { "sm": 0, "md": 768 },
///     "adaptiveThemes": true,
/// }))
/// .unwrap();
///
/// assert_eq!(config.themes.len(), 2);
/// assert_eq!(config.adaptive_themes, Some(true));
/// ```
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StyleConfig {
    /// Theme objects, in declaration order.
    pub themes: Map<String, Value>,
    /// Breakpoint thresholds by name.
    pub breakpoints: BTreeMap<String, f64>,
    /// Whether light/dark themes follow the system color scheme.
    pub adaptive_themes: Option<bool>,
    /// Theme selected right after configuration.
    pub initial_theme: Option<String>,
}

impl StyleConfig {
    /// Deserializes a configuration document.
    pub fn from_json(value: Value) -> Result<Self, RegistryError> {
        serde_json::from_value(value).map_err(|err| RegistryError::InvalidConfig {
            reason: err.to_string(),
        })
    }

    /// Builds a fresh context state from this configuration.
    ///
    /// Every theme must be an object. When an initial theme is given it is
    /// selected, and it must be one of the configured themes.
    pub fn build_state(&self) -> Result<ContextState, RegistryError> {
        let mut state = ContextState::new();

        for (name, theme) in &self.themes {
            if !theme.is_object() {
                return Err(RegistryError::InvalidConfig {
                    reason: format!("theme '{name}' is not an object"),
                });
            }
            state.register_theme(name.clone(), theme.clone());
        }

        if !self.breakpoints.is_empty() {
            state.register_breakpoints(
                self.breakpoints
                    .iter()
                    .map(|(name, threshold)| (name.clone(), *threshold))
                    .collect(),
            );
        }
        if let Some(adaptive) = self.adaptive_themes {
            state.set_prefers_adaptive_themes(adaptive);
        }
        if let Some(initial) = &self.initial_theme {
            state.set_initial_theme(initial.clone());
            state.set_theme(initial)?;
        }

        state.set_has_user_config(true);
        Ok(state)
    }
}
