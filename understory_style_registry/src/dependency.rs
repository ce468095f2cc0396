// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dependency kinds and compact sets of them.

use core::fmt;
use core::ops::{BitAnd, BitOr, BitOrAssign};

/// A category of external input a style unit may react to.
///
/// The discriminants are stable and match the indices used by scripting
/// bridges; see [`Dependency::from_index`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Dependency {
    /// The selected theme object.
    Theme = 0,
    /// The selected theme name.
    ThemeName = 1,
    /// Whether adaptive (light/dark) themes are active.
    AdaptiveThemes = 2,
    /// The current breakpoint.
    Breakpoints = 3,
    /// Variant selections.
    Variants = 4,
    /// The system color scheme.
    ColorScheme = 5,
    /// Viewport dimensions.
    Dimensions = 6,
    /// Viewport orientation.
    Orientation = 7,
    /// Preferred content size category.
    ContentSizeCategory = 8,
    /// Safe-area insets.
    Insets = 9,
    /// Device pixel ratio.
    PixelRatio = 10,
    /// Font scale.
    FontScale = 11,
    /// Status bar geometry.
    StatusBar = 12,
    /// Navigation bar geometry.
    NavigationBar = 13,
    /// On-screen keyboard geometry.
    Ime = 14,
    /// Layout direction.
    Rtl = 15,
}

impl Dependency {
    /// Every dependency kind, in index order.
    pub const ALL: [Self; 16] = [
        Self::Theme,
        Self::ThemeName,
        Self::AdaptiveThemes,
        Self::Breakpoints,
        Self::Variants,
        Self::ColorScheme,
        Self::Dimensions,
        Self::Orientation,
        Self::ContentSizeCategory,
        Self::Insets,
        Self::PixelRatio,
        Self::FontScale,
        Self::StatusBar,
        Self::NavigationBar,
        Self::Ime,
        Self::Rtl,
    ];

    /// Returns the stable index of this kind.
    #[must_use]
    pub const fn index(self) -> u8 {
        self as u8
    }

    /// Looks up a kind by its stable index.
    #[must_use]
    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(usize::from(index)).copied()
    }

    /// Converts this kind into a single-element [`DependencySet`].
    #[must_use]
    pub const fn into_set(self) -> DependencySet {
        DependencySet(1_u32 << self as u8)
    }
}

/// A compact set of [`Dependency`] kinds.
///
/// # Example
///
/// ```
/// use understory_style_registry::{Dependency, DependencySet};
///
/// let declared = DependencySet::from_iter([Dependency::Theme, Dependency::Insets]);
/// let changed = Dependency::Insets.into_set() | Dependency::Dimensions.into_set();
///
/// assert!(declared.intersects(changed));
/// assert!(!declared.intersects(Dependency::Rtl.into_set()));
/// ```
#[derive(Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct DependencySet(u32);

impl DependencySet {
    /// An empty set.
    pub const EMPTY: Self = Self(0);

    /// Creates an empty set.
    #[must_use]
    pub const fn empty() -> Self {
        Self::EMPTY
    }

    /// Returns `true` if the set contains no kinds.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if the set contains `dependency`.
    #[must_use]
    pub const fn contains(self, dependency: Dependency) -> bool {
        self.0 & (1_u32 << dependency as u8) != 0
    }

    /// Returns `true` if the two sets share at least one kind.
    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Inserts a kind.
    pub fn insert(&mut self, dependency: Dependency) {
        self.0 |= 1_u32 << dependency as u8;
    }

    /// Removes a kind.
    pub fn remove(&mut self, dependency: Dependency) {
        self.0 &= !(1_u32 << dependency as u8);
    }

    /// Returns the number of kinds in the set.
    #[must_use]
    pub const fn len(self) -> u32 {
        self.0.count_ones()
    }

    /// Returns an iterator over the kinds in index order.
    pub fn iter(self) -> impl Iterator<Item = Dependency> {
        Dependency::ALL
            .into_iter()
            .filter(move |dependency| self.contains(*dependency))
    }
}

impl fmt::Debug for DependencySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl BitOr for DependencySet {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for DependencySet {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for DependencySet {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        Self(self.0 & rhs.0)
    }
}

impl From<Dependency> for DependencySet {
    fn from(dependency: Dependency) -> Self {
        dependency.into_set()
    }
}

impl FromIterator<Dependency> for DependencySet {
    fn from_iter<I: IntoIterator<Item = Dependency>>(iter: I) -> Self {
        let mut set = Self::EMPTY;
        set.extend(iter);
        set
    }
}

impl Extend<Dependency> for DependencySet {
    fn extend<I: IntoIterator<Item = Dependency>>(&mut self, iter: I) {
        for dependency in iter {
            self.insert(dependency);
        }
    }
}
