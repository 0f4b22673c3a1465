//! Grid cell coordinates and the packed 64-bit key

use crate::foundation::math::{Vec2, Vec3};
use crate::spatial::GridError;

/// Integer coordinate of one grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Cell {
    /// X index
    pub x: i32,
    /// Y index
    pub y: i32,
    /// Z index
    pub z: i32,
}

impl Cell {
    /// Origin cell
    pub const ORIGIN: Self = Self::new(0, 0, 0);

    /// Create a cell from three indices
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Cell on the X axis only
    pub const fn axis(x: i32) -> Self {
        Self::new(x, 0, 0)
    }
}

#[allow(clippy::cast_possible_truncation)]
fn round_to_index(value: f32) -> i32 {
    // `as` saturates at the i32 bounds and maps NaN to zero
    value.round() as i32
}

impl From<Vec3> for Cell {
    /// Cell containing a world position, rounding to the nearest index
    fn from(position: Vec3) -> Self {
        Self::new(
            round_to_index(position.x),
            round_to_index(position.y),
            round_to_index(position.z),
        )
    }
}

impl From<Vec2> for Cell {
    fn from(position: Vec2) -> Self {
        Self::new(round_to_index(position.x), round_to_index(position.y), 0)
    }
}

impl From<(i32, i32)> for Cell {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y, 0)
    }
}

impl From<(i32, i32, i32)> for Cell {
    fn from((x, y, z): (i32, i32, i32)) -> Self {
        Self::new(x, y, z)
    }
}

impl From<i32> for Cell {
    fn from(x: i32) -> Self {
        Self::axis(x)
    }
}

/// Cell plus metadata packed into 16-bit lanes: `x | y << 16 | z << 32 | meta << 48`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PackedKey(u64);

impl PackedKey {
    const LANE_MASK: u64 = 0xFFFF;
    const CELL_MASK: u64 = 0xFFFF_FFFF_FFFF;

    /// Pack a cell and its metadata tag
    ///
    /// Every axis must fit in an `i16`; anything else is a caller bug and is
    /// reported as [`GridError::CoordinateOutOfRange`].
    pub fn encode(cell: Cell, metadata: i16) -> Result<Self, GridError> {
        let x = Self::lane('x', cell.x)?;
        let y = Self::lane('y', cell.y)?;
        let z = Self::lane('z', cell.z)?;
        let meta = u64::from(u16::from_ne_bytes(metadata.to_ne_bytes()));

        Ok(Self(x | y << 16 | z << 32 | meta << 48))
    }

    /// Unpack into the cell and metadata tag
    pub fn decode(self) -> (Cell, i16) {
        let cell = Cell::new(
            i32::from(Self::unlane(self.0)),
            i32::from(Self::unlane(self.0 >> 16)),
            i32::from(Self::unlane(self.0 >> 32)),
        );
        (cell, Self::unlane(self.0 >> 48))
    }

    /// Key with the metadata lane cleared; this is the lookup identity
    pub const fn cell_bits(self) -> u64 {
        self.0 & Self::CELL_MASK
    }

    /// Raw packed value
    pub const fn raw(self) -> u64 {
        self.0
    }

    fn lane(axis: char, value: i32) -> Result<u64, GridError> {
        let narrow =
            i16::try_from(value).map_err(|_| GridError::CoordinateOutOfRange { axis, value })?;
        Ok(u64::from(u16::from_ne_bytes(narrow.to_ne_bytes())))
    }

    #[allow(clippy::cast_possible_truncation)]
    const fn unlane(bits: u64) -> i16 {
        // Masked to 16 bits, the cast only reinterprets the sign
        (bits & Self::LANE_MASK) as u16 as i16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rounding_to_nearest() {
        assert_eq!(Cell::from(Vec3::new(0.4, -0.6, 1.5)), Cell::new(0, -1, 2));
        assert_eq!(Cell::from(Vec2::new(2.2, 3.7)), Cell::new(2, 4, 0));
    }

    #[test]
    fn test_missing_axes_default_to_zero() {
        assert_eq!(Cell::from((3, 4)), Cell::new(3, 4, 0));
        assert_eq!(Cell::from(7), Cell::new(7, 0, 0));
    }

    #[test]
    fn test_packed_key_decodes_negative_lanes() {
        let cell = Cell::new(-1, 300, -32768);
        let key = PackedKey::encode(cell, -2).unwrap();
        assert_eq!(key.decode(), (cell, -2));
    }

    #[test]
    fn test_metadata_not_part_of_identity() {
        let cell = Cell::new(5, -5, 9);
        let a = PackedKey::encode(cell, 0).unwrap();
        let b = PackedKey::encode(cell, 1).unwrap();
        assert_ne!(a, b);
        assert_eq!(a.cell_bits(), b.cell_bits());
    }

    #[test]
    fn test_out_of_range_axis_is_error() {
        let err = PackedKey::encode(Cell::new(0, 40_000, 0), 0).unwrap_err();
        assert_eq!(err, GridError::CoordinateOutOfRange { axis: 'y', value: 40_000 });

        let corner = Cell::new(i32::from(i16::MAX), i32::from(i16::MIN), 0);
        assert!(PackedKey::encode(corner, 0).is_ok());
        assert!(PackedKey::encode(Cell::new(i32::from(i16::MAX) + 1, 0, 0), 0).is_err());
    }
}
