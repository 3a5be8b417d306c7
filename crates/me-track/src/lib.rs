//! Moving-edge site tracking.
//!
//! Each [`EdgeSite`] is a sample on a tracked contour. Per frame,
//! [`SiteTracker::track`] searches along the site normal for the strongest
//! edge with the site's polarity and either moves the site there or flags it
//! as untrusted through its suppress code.
//!
//! Conventions:
//! - Coordinates follow pixel-center convention, `Point2f { x: col, y: row }`.
//! - A site with tangent angle `alpha` searches along `alpha + pi/2`; in
//!   `(row, col)` the unit normal is `(cos, sin)` of that angle.
//! - [`Polarity::Positive`] means the `+normal` side is brighter under the
//!   default [`SignConvention`].
//!
//! Per site the pipeline is:
//! - [`build_candidates`] lays `2 * range + 1` positions along the normal,
//!   dropping those whose mask footprint would leave the image.
//! - [`evaluate`] correlates the [`MaskBank`] kernel closest to the normal
//!   angle with each candidate neighborhood.
//! - The tracker picks the winner, applies the contrast and gradient rules and
//!   optionally refines the position with a 3-point parabola.
//!
//! Enable the `parallel` feature for [`SiteTracker::track_all_parallel`].

mod config;
mod convolve;
mod error;
mod masks;
mod observer;
mod report;
mod sampler;
mod sign;
mod site;
mod tracker;

pub use config::{MeConfig, SignConvention, SubpixRefine};
pub use convolve::{Response, evaluate};
pub use error::ConfigError;
pub use masks::{BinChoice, MaskBank};
pub use observer::{EventRecorder, LogObserver, NullObserver, TrackEvent, TrackObserver};
pub use report::SiteReport;
pub use sampler::{Candidate, CandidateSampler, SearchBounds, build_candidates};
pub use sign::get_sign;
pub use site::{DisplayHint, EdgeSite, LocalSuppress, Polarity, RobustVerdict, Suppress};
pub use tracker::{FrameSummary, SiteTracker, TrackOutcome};
