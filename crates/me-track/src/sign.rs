use me_core::{ImageView, sample_clamped};

use crate::config::SignConvention;
use crate::site::{EdgeSite, Polarity};

/// Taps across the tangent on each side of the window.
const HALF_WIDTH: i32 = 1;

/// Estimates the polarity of the edge under `site`.
///
/// Two windows straddle the site along its normal, covering distances
/// `1..=range` on each side and `2 * HALF_WIDTH + 1` taps across the tangent.
/// Samples are nearest-pixel with clamp-to-border, so sites near the border
/// still get a decision. A tie counts as the `+normal` side being brighter.
pub fn get_sign(
    img: &ImageView<'_, u8>,
    site: &EdgeSite,
    range: u32,
    convention: SignConvention,
) -> Polarity {
    let n = site.normal();
    let t = n.perp();

    let mut plus = 0u64;
    let mut minus = 0u64;
    for d in 1..=range.max(1) {
        for s in -HALF_WIDTH..=HALF_WIDTH {
            let off = d as f32 * n + s as f32 * t;
            plus += u64::from(sample_clamped(img, site.position + off).unwrap_or(0));
            minus += u64::from(sample_clamped(img, site.position - off).unwrap_or(0));
        }
    }

    convention.polarity_for(plus >= minus)
}
