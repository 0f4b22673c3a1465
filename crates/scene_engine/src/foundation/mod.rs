//! Foundation module
//!
//! Math types and the transform every placed entity carries, tick timing for
//! the game loop, and logging setup.

pub mod math;
pub mod time;
pub mod logging;
