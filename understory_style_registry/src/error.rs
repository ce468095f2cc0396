// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Registry error type.

use core::fmt;

use crate::unit::StyleSheetId;

/// A precondition violated by a registry call.
///
/// A failed call leaves the registry exactly as it was and never touches the
/// pending update batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RegistryError {
    /// The context has no state; it must be configured first.
    NotConfigured,
    /// A theme name was used that was never registered.
    UnknownTheme {
        /// The offending theme name.
        name: String,
    },
    /// The active theme was requested before any theme was selected.
    ThemeNotSelected,
    /// A theme updater returned something other than an object.
    InvalidUpdaterResult {
        /// The theme being updated.
        name: String,
    },
    /// No style sheet with this identifier exists in the context.
    UnknownStyleSheet {
        /// The offending identifier.
        id: StyleSheetId,
    },
    /// A configuration document could not be read.
    InvalidConfig {
        /// Why the document was rejected.
        reason: String,
    },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConfigured => f.write_str(
                "style registry used before configuration; configure the context first, \
                 even with an empty configuration",
            ),
            Self::UnknownTheme { name } => write!(f, "theme '{name}' was not registered"),
            Self::ThemeNotSelected => {
                f.write_str("a theme was requested, but no theme has been selected yet")
            }
            Self::InvalidUpdaterResult { name } => {
                write!(f, "updater for theme '{name}' did not return an object")
            }
            Self::UnknownStyleSheet { id } => write!(f, "style sheet {} does not exist", id.0),
            Self::InvalidConfig { reason } => write!(f, "invalid style configuration: {reason}"),
        }
    }
}

impl core::error::Error for RegistryError {}
