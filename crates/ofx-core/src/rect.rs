//! Integer rectangles and render scale.
//!
//! This module provides the geometric primitives of the render pipeline:
//! render windows, regions of definition (RoD), regions of interest (RoI)
//! and buffer bounds are all [`Rect`]s in canonical pixel coordinates.
//!
//! # Overview
//!
//! - [`Rect`] - Half-open rectangle `[x1, x2) x [y1, y2)`
//! - [`RenderScale`] - Per-axis proxy scale of a render call
//!
//! # Coordinate System
//!
//! Coordinates follow the OFX pixel convention: origin at the **bottom-left**,
//! Y increases upward. Rectangles may start at negative coordinates (a RoD
//! grown by a blur extends past the source frame).
//!
//! ```text
//!   Y
//!   ▲      (x2,y2)
//!   │   ┌────┐
//!   │   │    │
//!   │   └────┘
//!   │ (x1,y1)
//!   └───────────► X
//! ```
//!
//! # Usage
//!
//! ```rust
//! use ofx_core::Rect;
//!
//! let window = Rect::new(0, 0, 64, 32);
//! let roi = window.dilate(3);
//! assert_eq!(roi, Rect::new(-3, -3, 67, 35));
//!
//! let rod = Rect::new(0, 0, 64, 64);
//! assert_eq!(roi.intersect(&rod), Rect::new(0, 0, 64, 35));
//! ```
//!
//! # Used By
//!
//! - [`crate::image::PixelBuffer`] - Buffer bounds
//! - `ofx-ops` - Region pipeline, compositor render windows

use std::fmt;

/// Half-open integer rectangle `{x1, y1, x2, y2}`.
///
/// # Invariants
///
/// A well-formed rectangle has `x1 <= x2` and `y1 <= y2`. A rectangle with
/// `x1 >= x2` or `y1 >= y2` is empty; empty rectangles are valid values
/// and make every render step a no-op.
///
/// # Example
///
/// ```rust
/// use ofx_core::Rect;
///
/// let r = Rect::new(10, 20, 110, 70);
/// assert_eq!(r.width(), 100);
/// assert_eq!(r.height(), 50);
/// assert!(r.contains(10, 20));
/// assert!(!r.contains(110, 20));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rect {
    /// Left edge (inclusive).
    pub x1: i32,
    /// Bottom edge (inclusive).
    pub y1: i32,
    /// Right edge (exclusive).
    pub x2: i32,
    /// Top edge (exclusive).
    pub y2: i32,
}

impl Rect {
    /// The empty rectangle at the origin.
    pub const EMPTY: Self = Self {
        x1: 0,
        y1: 0,
        x2: 0,
        y2: 0,
    };

    /// Creates a rectangle from its corners.
    #[inline]
    pub const fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Creates a rectangle of the given size at the origin.
    #[inline]
    pub const fn from_size(width: usize, height: usize) -> Self {
        Self::new(0, 0, width as i32, height as i32)
    }

    /// Width in pixels; 0 for empty or inverted rectangles.
    #[inline]
    pub fn width(&self) -> usize {
        (self.x2 - self.x1).max(0) as usize
    }

    /// Height in pixels; 0 for empty or inverted rectangles.
    #[inline]
    pub fn height(&self) -> usize {
        (self.y2 - self.y1).max(0) as usize
    }

    /// Number of pixels covered.
    #[inline]
    pub fn area(&self) -> usize {
        self.width() * self.height()
    }

    /// Returns `true` when the rectangle covers no pixel.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.x1 >= self.x2 || self.y1 >= self.y2
    }

    /// Returns `true` if the pixel `(x, y)` lies inside.
    #[inline]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x1 && x < self.x2 && y >= self.y1 && y < self.y2
    }

    /// Returns `true` if `other` lies entirely inside this rectangle.
    ///
    /// An empty `other` is contained by anything.
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.is_empty()
            || (other.x1 >= self.x1
                && other.y1 >= self.y1
                && other.x2 <= self.x2
                && other.y2 <= self.y2)
    }

    /// Intersection of two rectangles.
    ///
    /// Disjoint rectangles give an empty result (possibly inverted, so
    /// check with [`is_empty`](Self::is_empty)).
    #[inline]
    pub fn intersect(&self, other: &Rect) -> Rect {
        Rect {
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
            x2: self.x2.min(other.x2),
            y2: self.y2.min(other.y2),
        }
    }

    /// Returns `true` when the two rectangles share at least one pixel.
    #[inline]
    pub fn intersects(&self, other: &Rect) -> bool {
        !self.intersect(other).is_empty()
    }

    /// Bounding box of two rectangles. Empty operands are ignored.
    pub fn union(&self, other: &Rect) -> Rect {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        Rect {
            x1: self.x1.min(other.x1),
            y1: self.y1.min(other.y1),
            x2: self.x2.max(other.x2),
            y2: self.y2.max(other.y2),
        }
    }

    /// Grows the rectangle by `amount` pixels on every side.
    #[inline]
    pub fn dilate(&self, amount: i32) -> Rect {
        self.dilate_xy(amount, amount)
    }

    /// Grows the rectangle by `dx` horizontally and `dy` vertically.
    #[inline]
    pub fn dilate_xy(&self, dx: i32, dy: i32) -> Rect {
        Rect {
            x1: self.x1.saturating_sub(dx),
            y1: self.y1.saturating_sub(dy),
            x2: self.x2.saturating_add(dx),
            y2: self.y2.saturating_add(dy),
        }
    }

    /// Iterates over the row indices `y1..y2`.
    #[inline]
    pub fn rows(&self) -> std::ops::Range<i32> {
        self.y1..self.y2.max(self.y1)
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{},{} - {},{}]", self.x1, self.y1, self.x2, self.y2)
    }
}

/// Render scale of a call: `(1, 1)` at full resolution, smaller for proxies.
///
/// Every spatial parameter expressed at full resolution (a blur radius, a
/// wavelet level) is multiplied by the matching component before use.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RenderScale {
    /// Horizontal scale.
    pub x: f64,
    /// Vertical scale.
    pub y: f64,
}

impl RenderScale {
    /// Full resolution.
    pub const FULL: Self = Self { x: 1.0, y: 1.0 };

    /// Creates a render scale.
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Returns `true` at full resolution on both axes.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.x == 1.0 && self.y == 1.0
    }
}

impl Default for RenderScale {
    fn default() -> Self {
        Self::FULL
    }
}

impl fmt::Display for RenderScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}
