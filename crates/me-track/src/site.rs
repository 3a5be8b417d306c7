use core::f32::consts::FRAC_PI_2;

use me_core::{Point2f, Vec2f};
use serde::{Deserialize, Serialize};

/// Which side of the edge is brighter, relative to the site normal.
///
/// The mapping from polarity to a concrete side is fixed by
/// [`crate::SignConvention`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Polarity {
    #[default]
    Positive,
    Negative,
}

impl Polarity {
    pub fn factor(self) -> f32 {
        match self {
            Self::Positive => 1.0,
            Self::Negative => -1.0,
        }
    }

    pub fn flipped(self) -> Self {
        match self {
            Self::Positive => Self::Negative,
            Self::Negative => Self::Positive,
        }
    }
}

/// Per-frame classification written by the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LocalSuppress {
    #[default]
    None,
    /// The best match is much weaker than the reference response.
    Contrast,
    /// A match was accepted but its normalized gradient is too weak.
    Threshold,
}

/// Verdict of the cross-site robust weighting stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RobustVerdict {
    #[default]
    Inlier,
    Outlier,
}

/// Combined suppress code seen by downstream consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Suppress {
    None,
    Contrast,
    Threshold,
    MEstimator,
}

impl From<LocalSuppress> for Suppress {
    fn from(value: LocalSuppress) -> Self {
        match value {
            LocalSuppress::None => Self::None,
            LocalSuppress::Contrast => Self::Contrast,
            LocalSuppress::Threshold => Self::Threshold,
        }
    }
}

/// Rendering selection for observers; tracking never reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DisplayHint {
    #[default]
    None,
    Range,
    Result,
    RangeResult,
}

impl DisplayHint {
    pub fn shows_range(self) -> bool {
        matches!(self, Self::Range | Self::RangeResult)
    }

    pub fn shows_result(self) -> bool {
        matches!(self, Self::Result | Self::RangeResult)
    }
}

/// One tracked contour sample.
///
/// `position` and `alpha` belong to whoever maintains the contour. Response
/// values and the local classification are written by
/// [`crate::SiteTracker`]; the robust verdict and weight only change through
/// [`EdgeSite::reject_outlier`] / [`EdgeSite::clear_robust_verdict`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeSite {
    /// Sub-pixel position (`x` = column, `y` = row).
    pub position: Point2f,
    /// Tangent angle in radians; the search runs along `alpha + pi/2`.
    pub alpha: f32,
    pub display: DisplayHint,
    pixel: (isize, isize),
    polarity: Polarity,
    response: f32,
    reference: f32,
    normalized: f32,
    weight: f32,
    local: LocalSuppress,
    verdict: RobustVerdict,
}

impl EdgeSite {
    pub fn new(row: f32, col: f32) -> Self {
        Self::with_angle(row, col, 0.0)
    }

    pub fn with_angle(row: f32, col: f32, alpha: f32) -> Self {
        let position = Point2f::from_row_col(row, col);
        Self {
            position,
            alpha,
            display: DisplayHint::None,
            pixel: position.round(),
            polarity: Polarity::Positive,
            response: 0.0,
            reference: 0.0,
            normalized: 0.0,
            weight: 1.0,
            local: LocalSuppress::None,
            verdict: RobustVerdict::Inlier,
        }
    }

    /// Full re-initialization: new geometry, reference response and polarity.
    ///
    /// Resets the weight to 1 and clears both the local and robust
    /// classifications.
    pub fn init(&mut self, row: f32, col: f32, alpha: f32, reference: f32, polarity: Polarity) {
        let display = self.display;
        *self = Self::with_angle(row, col, alpha);
        self.display = display;
        self.polarity = polarity;
        self.reference = reference;
        self.response = reference;
    }

    pub fn row(&self) -> f32 {
        self.position.row()
    }

    pub fn col(&self) -> f32 {
        self.position.col()
    }

    /// Pixel nearest to the last accepted position, as `(x, y)`.
    pub fn pixel(&self) -> (isize, isize) {
        self.pixel
    }

    pub fn polarity(&self) -> Polarity {
        self.polarity
    }

    pub fn response(&self) -> f32 {
        self.response
    }

    pub fn reference(&self) -> f32 {
        self.reference
    }

    pub fn normalized_gradient(&self) -> f32 {
        self.normalized
    }

    pub fn weight(&self) -> f32 {
        self.weight
    }

    pub fn local_suppress(&self) -> LocalSuppress {
        self.local
    }

    pub fn robust_verdict(&self) -> RobustVerdict {
        self.verdict
    }

    /// Robust rejection takes precedence over the per-frame classification.
    pub fn suppress(&self) -> Suppress {
        match self.verdict {
            RobustVerdict::Outlier => Suppress::MEstimator,
            RobustVerdict::Inlier => self.local.into(),
        }
    }

    pub fn is_trusted(&self) -> bool {
        self.suppress() == Suppress::None
    }

    /// Search direction angle (radians).
    pub fn normal_angle(&self) -> f32 {
        self.alpha + FRAC_PI_2
    }

    /// Unit normal; in `(row, col)` it is `(cos(alpha + pi/2), sin(alpha + pi/2))`.
    pub fn normal(&self) -> Vec2f {
        let theta = self.normal_angle();
        Vec2f::from_row_col(theta.cos(), theta.sin())
    }

    /// True when both sites sit on the same integer pixel.
    pub fn same_pixel(&self, other: &Self) -> bool {
        self.pixel == other.pixel
    }

    pub fn distance(a: &Self, b: &Self) -> f32 {
        a.position.distance(b.position)
    }

    /// Squared distance; callers that need the true distance take the root.
    pub fn sqr_distance(a: &Self, b: &Self) -> f32 {
        a.position.sqr_distance(b.position)
    }

    /// Entry point for the robust weighting stage. The weight never rises.
    pub fn reject_outlier(&mut self, weight: f32) {
        let w = if weight.is_finite() {
            weight.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.weight = self.weight.min(w);
        self.verdict = RobustVerdict::Outlier;
    }

    pub fn clear_robust_verdict(&mut self) {
        self.verdict = RobustVerdict::Inlier;
    }

    pub(crate) fn set_polarity(&mut self, polarity: Polarity) {
        self.polarity = polarity;
    }

    pub(crate) fn move_to(&mut self, position: Point2f, pixel: (isize, isize)) {
        self.position = position;
        self.pixel = pixel;
    }

    pub(crate) fn record_response(&mut self, response: f32, normalized: f32) {
        self.response = response;
        self.normalized = normalized;
    }

    pub(crate) fn classify(&mut self, local: LocalSuppress) {
        self.local = local;
    }
}

impl Default for EdgeSite {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::{DisplayHint, EdgeSite, LocalSuppress, Polarity, RobustVerdict, Suppress};

    #[test]
    fn distance_algebra() {
        let a = EdgeSite::new(1.5, -2.0);
        let b = EdgeSite::new(4.5, 2.0);

        let d = EdgeSite::distance(&a, &b);
        assert!((d - 5.0).abs() < 1e-6);
        assert!((EdgeSite::sqr_distance(&a, &b) - d * d).abs() < 1e-4);
        assert_eq!(EdgeSite::distance(&a, &a), 0.0);
        assert_eq!(EdgeSite::distance(&a, &b), EdgeSite::distance(&b, &a));
        assert_eq!(EdgeSite::sqr_distance(&a, &b), EdgeSite::sqr_distance(&b, &a));
    }

    #[test]
    fn normal_is_horizontal_for_zero_tangent() {
        let s = EdgeSite::with_angle(5.0, 5.0, 0.0);
        let n = s.normal();
        assert!(n.y.abs() < 1e-6, "row component {}", n.y);
        assert!((n.x - 1.0).abs() < 1e-6, "col component {}", n.x);

        let v = EdgeSite::with_angle(5.0, 5.0, -core::f32::consts::FRAC_PI_2);
        let nv = v.normal();
        assert!((nv.y - 1.0).abs() < 1e-6);
        assert!(nv.x.abs() < 1e-6);
    }

    #[test]
    fn robust_verdict_overrides_local_and_only_lowers_weight() {
        let mut s = EdgeSite::new(3.0, 3.0);
        s.classify(LocalSuppress::Threshold);
        assert_eq!(s.suppress(), Suppress::Threshold);

        s.reject_outlier(0.4);
        assert_eq!(s.suppress(), Suppress::MEstimator);
        assert_eq!(s.robust_verdict(), RobustVerdict::Outlier);
        assert_eq!(s.weight(), 0.4);

        s.reject_outlier(0.9);
        assert_eq!(s.weight(), 0.4);
        s.reject_outlier(f32::NAN);
        assert_eq!(s.weight(), 0.0);

        s.clear_robust_verdict();
        assert_eq!(s.suppress(), Suppress::Threshold);
        assert_eq!(s.weight(), 0.0);
    }

    #[test]
    fn init_resets_state_but_keeps_display() {
        let mut s = EdgeSite::new(1.0, 1.0);
        s.display = DisplayHint::RangeResult;
        s.reject_outlier(0.1);
        s.classify(LocalSuppress::Contrast);

        s.init(7.2, 3.6, 0.3, 120.0, Polarity::Negative);
        assert_eq!(s.display, DisplayHint::RangeResult);
        assert_eq!(s.pixel(), (4, 7));
        assert_eq!(s.polarity(), Polarity::Negative);
        assert_eq!(s.reference(), 120.0);
        assert_eq!(s.response(), 120.0);
        assert_eq!(s.weight(), 1.0);
        assert_eq!(s.suppress(), Suppress::None);
        assert!(s.same_pixel(&EdgeSite::new(7.4, 3.9)));
        assert!(!s.same_pixel(&EdgeSite::new(7.6, 3.9)));
    }

    #[test]
    fn display_hint_selection() {
        assert!(!DisplayHint::None.shows_range());
        assert!(DisplayHint::Range.shows_range());
        assert!(!DisplayHint::Range.shows_result());
        assert!(DisplayHint::RangeResult.shows_range());
        assert!(DisplayHint::RangeResult.shows_result());
        assert_eq!(Polarity::Negative.flipped(), Polarity::Positive);
    }
}
