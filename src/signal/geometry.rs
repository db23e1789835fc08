//! Geometry primitives
//!
//! Rectangles are axis-aligned, in the same coordinate space as the
//! viewport (y grows downwards).

use crate::error::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Regex for one margin component: `200px`, `-10px`, `5%`, `0`
static LENGTH_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(-?\d+(?:\.\d+)?)(px|%)?$").unwrap());

/// Axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// Create a rectangle from its origin and size
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn left(&self) -> f64 {
        self.x
    }

    pub fn top(&self) -> f64 {
        self.y
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Area, zero for degenerate rectangles
    pub fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// Overlapping region, edges inclusive
    ///
    /// Touching rectangles intersect with a zero-area result, so a
    /// zero-height sentinel sitting exactly on the root edge counts.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let left = self.left().max(other.left());
        let top = self.top().max(other.top());
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if right < left || bottom < top {
            return None;
        }
        Some(Rect::new(left, top, right - left, bottom - top))
    }

    /// Grow (or shrink, for negative lengths) by a margin
    pub fn expand(&self, margin: &RootMargin) -> Rect {
        let top = margin.top.resolve(self.height);
        let right = margin.right.resolve(self.width);
        let bottom = margin.bottom.resolve(self.height);
        let left = margin.left.resolve(self.width);

        Rect::new(
            self.x - left,
            self.y - top,
            self.width + left + right,
            self.height + top + bottom,
        )
    }
}

/// A margin component
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Length {
    /// Absolute distance
    Px(f64),
    /// Percentage of the root's extent along the same axis
    Percent(f64),
}

impl Length {
    /// Resolve against the root's extent
    pub fn resolve(&self, extent: f64) -> f64 {
        match self {
            Self::Px(v) => *v,
            Self::Percent(p) => extent * p / 100.0,
        }
    }

    fn parse(token: &str) -> Option<Self> {
        let caps = LENGTH_REGEX.captures(token)?;
        let value: f64 = caps[1].parse().ok()?;
        match caps.get(2).map(|m| m.as_str()) {
            Some("px") => Some(Self::Px(value)),
            Some("%") => Some(Self::Percent(value)),
            // Bare numbers are only meaningful as zero
            _ if value == 0.0 => Some(Self::Px(0.0)),
            _ => None,
        }
    }
}

/// Margin around the scroll root, CSS shorthand order
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RootMargin {
    pub top: Length,
    pub right: Length,
    pub bottom: Length,
    pub left: Length,
}

impl Default for RootMargin {
    fn default() -> Self {
        Self::uniform(Length::Px(200.0))
    }
}

impl RootMargin {
    /// Same length on every side
    pub fn uniform(length: Length) -> Self {
        Self {
            top: length,
            right: length,
            bottom: length,
            left: length,
        }
    }

    /// No margin
    pub fn zero() -> Self {
        Self::uniform(Length::Px(0.0))
    }

    /// Parse 1-4 space-separated lengths (`px`, `%`, or bare `0`)
    pub fn parse(input: &str) -> Result<Self> {
        let invalid = |message: String| Error::invalid_value("root_margin", message);

        let lengths = input
            .split_whitespace()
            .map(|token| {
                Length::parse(token).ok_or_else(|| invalid(format!("'{token}' is not a px or % length")))
            })
            .collect::<Result<Vec<_>>>()?;

        match lengths.as_slice() {
            [all] => Ok(Self::uniform(*all)),
            [vertical, horizontal] => Ok(Self {
                top: *vertical,
                right: *horizontal,
                bottom: *vertical,
                left: *horizontal,
            }),
            [top, horizontal, bottom] => Ok(Self {
                top: *top,
                right: *horizontal,
                bottom: *bottom,
                left: *horizontal,
            }),
            [top, right, bottom, left] => Ok(Self {
                top: *top,
                right: *right,
                bottom: *bottom,
                left: *left,
            }),
            _ => Err(invalid(format!(
                "expected 1 to 4 lengths, got {}",
                lengths.len()
            ))),
        }
    }
}
