//! Selection rectangles and placement offsets.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use crate::error::HostError;

/// Axis-aligned pixel rectangle. `right` and `bottom` are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    /// Left edge.
    pub left: u32,
    /// Top edge.
    pub top: u32,
    /// Right edge (exclusive).
    pub right: u32,
    /// Bottom edge (exclusive).
    pub bottom: u32,
}

impl Rect {
    /// Rectangle from its four edges.
    #[must_use]
    pub const fn new(left: u32, top: u32, right: u32, bottom: u32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Horizontal extent in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.right.saturating_sub(self.left)
    }

    /// Vertical extent in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.bottom.saturating_sub(self.top)
    }

    /// Whether the rectangle covers no pixels.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Whether the pixel at `(x, y)` lies inside the rectangle.
    #[must_use]
    pub const fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.left && x < self.right && y >= self.top && y < self.bottom
    }

    /// Expand by `padding` on every side, clamped to a `width` x `height` canvas.
    #[must_use]
    pub fn padded(self, padding: u32, width: u32, height: u32) -> Self {
        Self {
            left: self.left.saturating_sub(padding),
            top: self.top.saturating_sub(padding),
            right: self.right.saturating_add(padding).min(width),
            bottom: self.bottom.saturating_add(padding).min(height),
        }
    }

    /// Intersection with a `width` x `height` canvas.
    #[must_use]
    pub fn clamped(self, width: u32, height: u32) -> Self {
        Self {
            left: self.left.min(width),
            top: self.top.min(height),
            right: self.right.min(width),
            bottom: self.bottom.min(height),
        }
    }

    /// Top-left corner as a document offset.
    #[must_use]
    pub fn origin(&self) -> Offset {
        Offset::new(saturating_i32(self.left), saturating_i32(self.top))
    }
}

impl FromStr for Rect {
    type Err = HostError;

    /// Parses `left,top,right,bottom`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || HostError::InvalidRect {
            value: s.to_string(),
        };
        let parts = s
            .split(',')
            .map(|part| part.trim().parse::<u32>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| invalid())?;
        let &[left, top, right, bottom] = parts.as_slice() else {
            return Err(invalid());
        };
        let rect = Self::new(left, top, right, bottom);
        if rect.is_empty() {
            return Err(invalid());
        }
        Ok(rect)
    }
}

/// Position in document space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Offset {
    /// Horizontal position.
    pub x: i32,
    /// Vertical position.
    pub y: i32,
}

impl Offset {
    /// Offset from its coordinates.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Parse the comma-joined pair written to the offset record.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let (x, y) = text.trim().split_once(',')?;
        Some(Self::new(x.trim().parse().ok()?, y.trim().parse().ok()?))
    }
}

impl Display for Offset {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(formatter, "{},{}", self.x, self.y)
    }
}

fn saturating_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}
