//! Umbrella crate for moving-edge contour tracking.
//!
//! Re-exports the image primitives of `me-core` and the tracker of
//! `me-track` so applications depend on a single crate.

pub use me_core::*;
pub use me_track::*;
