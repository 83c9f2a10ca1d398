// SPDX-License-Identifier: Apache-2.0
//! Preferred side of the reference element for floating content.

#![forbid(unsafe_code)]

use std::fmt;

use serde::{Deserialize, Serialize};

/// Where to place floating content relative to its reference rectangle.
///
/// Content is centered on the cross axis: `Top`/`Bottom` center
/// horizontally, `Left`/`Right` center vertically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    /// Above the reference.
    Top,
    /// Below the reference.
    Bottom,
    /// Left of the reference. Block handles sit in the left gutter by default.
    #[default]
    Left,
    /// Right of the reference.
    Right,
}

impl Placement {
    /// Return the opposite placement for flip logic.
    pub fn flip(self) -> Self {
        match self {
            Self::Top => Self::Bottom,
            Self::Bottom => Self::Top,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    /// Whether this is a vertical (top/bottom) placement.
    pub fn is_vertical(self) -> bool {
        matches!(self, Self::Top | Self::Bottom)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Bottom => "bottom",
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
