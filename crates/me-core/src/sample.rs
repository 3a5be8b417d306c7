use crate::geom::Point2f;
use crate::image::ImageView;

/// Nearest-pixel sample at a sub-pixel position, clamped to the border.
///
/// Returns `None` only for an empty image.
pub fn sample_clamped<T: Copy>(img: &ImageView<'_, T>, p: Point2f) -> Option<T> {
    if img.is_empty() {
        return None;
    }
    let (xi, yi) = p.round();
    let x = xi.clamp(0, img.width() as isize - 1) as usize;
    let y = yi.clamp(0, img.height() as isize - 1) as usize;
    img.get(x, y).copied()
}
