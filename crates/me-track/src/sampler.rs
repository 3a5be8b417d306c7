use me_core::Point2f;

use crate::masks::MaskBank;
use crate::site::EdgeSite;

const PREALLOC_LIMIT: usize = 4096;

/// One query position along a site's normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    /// Signed offset in pixels along the normal, in `-range..=range`.
    pub step: i32,
    /// Copy of the source site moved to the query position.
    pub site: EdgeSite,
}

/// Region in which a candidate may be placed.
///
/// Pixel limits are inclusive. The sub-pixel position must additionally lie
/// inside the image, `[0, width - 1] x [0, height - 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchBounds {
    pub x_min: isize,
    pub x_max: isize,
    pub y_min: isize,
    pub y_max: isize,
    width: usize,
    height: usize,
}

impl SearchBounds {
    /// Every pixel of a `width x height` image.
    pub fn full(width: usize, height: usize) -> Self {
        Self::with_margins(width, height, 0, 0)
    }

    /// Pixels whose `before`/`after` neighborhoods stay inside the image.
    pub fn with_margins(width: usize, height: usize, before: usize, after: usize) -> Self {
        Self {
            x_min: before as isize,
            x_max: width as isize - 1 - after as isize,
            y_min: before as isize,
            y_max: height as isize - 1 - after as isize,
            width,
            height,
        }
    }

    /// Anchors at which `bank` can be evaluated, kept `strip` pixels clear of
    /// the border.
    pub fn for_mask(width: usize, height: usize, bank: &MaskBank, strip: usize) -> Self {
        let (before, after) = bank.reach();
        Self::with_margins(width, height, before + strip, after + strip)
    }

    pub fn is_empty(&self) -> bool {
        self.x_min > self.x_max || self.y_min > self.y_max
    }

    pub fn contains_pixel(&self, (x, y): (isize, isize)) -> bool {
        (self.x_min..=self.x_max).contains(&x) && (self.y_min..=self.y_max).contains(&y)
    }

    pub fn contains(&self, p: Point2f) -> bool {
        if self.is_empty() || !p.x.is_finite() || !p.y.is_finite() {
            return false;
        }
        let in_image = p.x >= 0.0
            && p.y >= 0.0
            && p.x <= (self.width - 1) as f32
            && p.y <= (self.height - 1) as f32;
        in_image && self.contains_pixel(p.round())
    }

    /// Pulls `p` back inside the image rectangle.
    pub fn clamp_to_image(&self, p: Point2f) -> Point2f {
        Point2f {
            x: p.x.clamp(0.0, self.width.saturating_sub(1) as f32),
            y: p.y.clamp(0.0, self.height.saturating_sub(1) as f32),
        }
    }
}

/// Candidates along the normal of `site`, ordered by increasing step.
///
/// Yields `2 * range + 1` entries when nothing is clipped; positions whose
/// pixel falls outside `bounds` are dropped silently.
pub fn build_candidates(site: &EdgeSite, range: u32, bounds: &SearchBounds) -> Vec<Candidate> {
    let mut out = Vec::with_capacity((2 * range as usize + 1).min(PREALLOC_LIMIT));
    fill_candidates(site, range, bounds, &mut out);
    out
}

/// Reusable candidate buffer for per-frame tracking loops.
#[derive(Debug, Clone, Default)]
pub struct CandidateSampler {
    buf: Vec<Candidate>,
}

impl CandidateSampler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sample(&mut self, site: &EdgeSite, range: u32, bounds: &SearchBounds) -> &[Candidate] {
        fill_candidates(site, range, bounds, &mut self.buf);
        &self.buf
    }
}

fn fill_candidates(site: &EdgeSite, range: u32, bounds: &SearchBounds, out: &mut Vec<Candidate>) {
    out.clear();
    if bounds.is_empty() {
        return;
    }

    let r = range.min(i32::MAX as u32 / 2) as i32;
    let n = site.normal();
    for step in -r..=r {
        let p = site.position + step as f32 * n;
        if !bounds.contains(p) {
            continue;
        }
        let mut cand = *site;
        cand.move_to(p, p.round());
        out.push(Candidate { step, site: cand });
    }
}

#[cfg(test)]
mod tests {
    use core::f32::consts::FRAC_PI_4;

    use super::{CandidateSampler, SearchBounds, build_candidates};
    use crate::masks::MaskBank;
    use crate::site::EdgeSite;

    #[test]
    fn interior_site_yields_full_ordered_sequence() {
        let bounds = SearchBounds::full(64, 64);
        let site = EdgeSite::with_angle(30.0, 30.0, 0.4);

        for r in [1u32, 3, 7] {
            let cands = build_candidates(&site, r, &bounds);
            assert_eq!(cands.len(), 2 * r as usize + 1);

            let n = site.normal();
            let proj: Vec<f32> = cands
                .iter()
                .map(|c| (c.site.position - site.position).dot(n))
                .collect();
            assert!(proj.windows(2).all(|w| w[0] < w[1]));
            assert!(cands.windows(2).all(|w| w[1].step == w[0].step + 1));
            assert_eq!(cands[0].step, -(r as i32));

            for c in &cands {
                assert_eq!(c.site.alpha, site.alpha);
                assert_eq!(c.site.polarity(), site.polarity());
                assert_eq!(c.site.pixel(), c.site.position.round());
            }
        }
    }

    #[test]
    fn border_site_is_clipped_but_stays_ordered() {
        let bounds = SearchBounds::full(20, 20);
        // Horizontal normal, two columns from the left edge.
        let site = EdgeSite::with_angle(10.0, 2.0, 0.0);
        let cands = build_candidates(&site, 5, &bounds);

        assert_eq!(cands.len(), 8);
        assert_eq!(cands.first().map(|c| c.step), Some(-2));
        assert_eq!(cands.last().map(|c| c.step), Some(5));
        assert!(cands.windows(2).all(|w| w[0].site.col() < w[1].site.col()));
        assert!(cands.iter().all(|c| bounds.contains(c.site.position)));
    }

    #[test]
    fn mask_margins_and_strip_shrink_the_region() {
        let bank = MaskBank::new(8, 6).expect("valid bank");
        let bounds = SearchBounds::for_mask(11, 11, &bank, 0);
        assert_eq!((bounds.x_min, bounds.x_max), (3, 8));

        let stripped = SearchBounds::for_mask(11, 11, &bank, 2);
        assert_eq!((stripped.y_min, stripped.y_max), (5, 6));

        let site = EdgeSite::with_angle(5.0, 3.0, 0.0);
        let cols: Vec<isize> = build_candidates(&site, 2, &bounds)
            .iter()
            .map(|c| c.site.pixel().0)
            .collect();
        assert_eq!(cols, vec![3, 4, 5]);
    }

    #[test]
    fn site_outside_the_image_gets_no_candidates() {
        let bounds = SearchBounds::full(10, 10);
        let site = EdgeSite::with_angle(-40.0, -40.0, FRAC_PI_4);
        assert!(build_candidates(&site, 4, &bounds).is_empty());

        let tiny = SearchBounds::with_margins(3, 3, 2, 2);
        assert!(tiny.is_empty());
        assert!(build_candidates(&EdgeSite::new(1.0, 1.0), 2, &tiny).is_empty());
    }

    #[test]
    fn sampler_buffer_is_recomputed_each_call() {
        let bounds = SearchBounds::full(32, 32);
        let mut sampler = CandidateSampler::new();

        let a = sampler
            .sample(&EdgeSite::with_angle(16.0, 16.0, 0.0), 3, &bounds)
            .to_vec();
        let b = sampler
            .sample(&EdgeSite::with_angle(16.0, 16.0, 0.0), 1, &bounds)
            .to_vec();
        assert_eq!(a.len(), 7);
        assert_eq!(b.len(), 3);
        assert_eq!(a[2..5], b[..]);
    }
}
