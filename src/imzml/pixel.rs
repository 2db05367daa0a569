//! Pixel coordinates

use std::fmt;

use serde::{Deserialize, Serialize};

/// The (x, y, z) coordinate of one acquired spectrum
///
/// Coordinates are 1-based. `z` is 1 for two-dimensional acquisitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PixelLocation {
    /// Column, 1-based
    pub x: u32,
    /// Row, 1-based
    pub y: u32,
    /// Slice, 1-based
    pub z: u32,
}

impl PixelLocation {
    /// Create a location from already validated coordinates
    pub fn new(x: u32, y: u32, z: u32) -> Self {
        Self { x, y, z }
    }

    /// Build a location from declared (possibly invalid) positions
    ///
    /// Returns `None` when any coordinate is below 1.
    pub fn from_declared(x: i64, y: i64, z: i64) -> Option<Self> {
        let coordinate = |v: i64| u32::try_from(v).ok().filter(|v| *v >= 1);
        Some(Self {
            x: coordinate(x)?,
            y: coordinate(y)?,
            z: coordinate(z)?,
        })
    }

    /// Whether the location lies inside a `width` x `height` x `depth` volume
    ///
    /// Bounds are inclusive: `x == width` is inside, `x == width + 1` is not.
    pub fn within(&self, width: u32, height: u32, depth: u32) -> bool {
        (1..=width).contains(&self.x)
            && (1..=height).contains(&self.y)
            && (1..=depth).contains(&self.z)
    }
}

impl fmt::Display for PixelLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}
