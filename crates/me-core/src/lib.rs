//! Foundational primitives for moving-edge tracking.
//!
//! ## Image Views and Stride
//! Images use element stride (not byte stride). `stride` is the distance, in
//! elements, between adjacent row starts and may be greater than `width`, so a
//! tracker can run directly on a padded frame buffer handed over by a grabber.
//!
//! ## Coordinates
//! Pixel-center convention: integer `(x, y)` is the center of pixel `(x, y)`,
//! with `x` the column and `y` the row. Tracking code speaks in `(row, col)`;
//! [`Point2f::from_row_col`] and the `row()`/`col()` accessors bridge the two.
//!
//! ## Sampling
//! Off-image lookups are clamped to the nearest border pixel.

mod error;
mod geom;
mod image;
mod sample;

pub use error::Error;
pub use geom::{Point2f, Vec2f};
pub use image::{Image, ImageView};
pub use sample::sample_clamped;
