//! Spatial indexing
//!
//! Game objects are indexed by the integer cell their position rounds to.
//! The [`RenderMatrix`] wraps a [`GridMatrix`] and produces the per-frame draw
//! list from it.

pub mod cell;
pub mod grid_matrix;
pub mod render_matrix;

pub use cell::{Cell, PackedKey};
pub use grid_matrix::{GridEntry, GridMatrix, NestedGrid, PackedGrid};
pub use render_matrix::RenderMatrix;

use thiserror::Error;

/// Spatial grid errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    /// A coordinate does not fit the packed key's 16-bit lane
    #[error("Cell coordinate {axis}={value} is outside the packed grid range")]
    CoordinateOutOfRange {
        /// Offending axis
        axis: char,
        /// Offending value
        value: i32,
    },
}
