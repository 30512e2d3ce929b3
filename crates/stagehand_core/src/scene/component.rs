//! # Position
//!
//! World-space position of a scene node. Plain old data so it can be
//! copied in and out of records without touching the allocator.

use bytemuck::{Pod, Zeroable};

/// World-space position.
///
/// Padded to 16 bytes so arrays of positions stay SIMD aligned.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Position {
    /// World-space X.
    pub x: f32,
    /// World-space Y.
    pub y: f32,
    /// World-space Z.
    pub z: f32,
    /// Keeps the struct at 16 bytes.
    pub _padding: f32,
}

impl Position {
    /// The origin.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    /// Builds a position from its coordinates.
    #[inline]
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self {
            x,
            y,
            z,
            _padding: 0.0,
        }
    }

    /// Creates a position from `[x, y, z]`.
    #[inline]
    #[must_use]
    pub const fn from_array(xyz: [f32; 3]) -> Self {
        Self::new(xyz[0], xyz[1], xyz[2])
    }

    /// Returns `[x, y, z]`.
    #[inline]
    #[must_use]
    pub const fn to_array(self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }
}

impl From<[f32; 3]> for Position {
    fn from(xyz: [f32; 3]) -> Self {
        Self::from_array(xyz)
    }
}
