use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, MAX_MASK_BINS, MAX_MASK_SIZE, MAX_RANGE};
use crate::site::Polarity;

/// Sub-pixel refinement of the accepted candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubpixRefine {
    /// Keep the integer step of the winning candidate.
    None,
    /// Parabola through the winner and its two neighbors along the normal.
    Parabolic3,
}

/// Maps a site [`Polarity`] to the side of the edge that is brighter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SignConvention {
    /// `Positive` means the `+normal` side is brighter.
    #[default]
    BrightOnPositiveSide,
    /// `Positive` means the `-normal` side is brighter.
    BrightOnNegativeSide,
}

impl SignConvention {
    /// `+1.0` when `polarity` puts the bright side along `+normal`.
    pub fn bright_side(self, polarity: Polarity) -> f32 {
        match self {
            Self::BrightOnPositiveSide => polarity.factor(),
            Self::BrightOnNegativeSide => -polarity.factor(),
        }
    }

    /// Polarity describing an edge whose `+normal` side is (or is not) brighter.
    pub fn polarity_for(self, positive_side_brighter: bool) -> Polarity {
        let p = if positive_side_brighter {
            Polarity::Positive
        } else {
            Polarity::Negative
        };
        match self {
            Self::BrightOnPositiveSide => p,
            Self::BrightOnNegativeSide => p.flipped(),
        }
    }
}

/// Moving-edge tracking parameters.
///
/// Defaults follow the classic moving-edge setup: a 4 px search on each side,
/// 180 one-degree mask bins, a two pixel strip kept clear of the border and a
/// 50% contrast tolerance against the reference response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeConfig {
    /// Search half-length along the normal, in pixels.
    pub range: u32,
    /// Side of the square kernel footprint.
    pub mask_size: usize,
    /// Number of orientation bins covering 180 degrees.
    pub mask_bins: usize,
    /// Extra margin, in pixels, inside which candidates are never evaluated.
    pub strip: usize,
    /// A match weaker than `min_contrast_ratio * |reference|` is rejected.
    pub min_contrast_ratio: f32,
    /// Candidates stronger than `max_contrast_ratio * |reference|` are skipped.
    pub max_contrast_ratio: Option<f32>,
    /// Minimum `|normalized gradient|` for a trusted site.
    pub min_gradient: f32,
    pub subpixel: SubpixRefine,
    pub sign_convention: SignConvention,
}

impl Default for MeConfig {
    fn default() -> Self {
        Self {
            range: 4,
            mask_size: 6,
            mask_bins: 180,
            strip: 2,
            min_contrast_ratio: 0.5,
            max_contrast_ratio: None,
            min_gradient: 0.04,
            subpixel: SubpixRefine::Parabolic3,
            sign_convention: SignConvention::BrightOnPositiveSide,
        }
    }
}

impl MeConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.range == 0 {
            return Err(ConfigError::NonPositiveRange);
        }
        if self.range > MAX_RANGE {
            return Err(ConfigError::RangeTooLarge { range: self.range });
        }
        if !(2..=MAX_MASK_SIZE).contains(&self.mask_size) {
            return Err(ConfigError::InvalidMaskSize {
                size: self.mask_size,
            });
        }
        if !(1..=MAX_MASK_BINS).contains(&self.mask_bins) {
            return Err(ConfigError::InvalidBinCount {
                bins: self.mask_bins,
            });
        }
        if !self.min_contrast_ratio.is_finite() || !(0.0..=1.0).contains(&self.min_contrast_ratio)
        {
            return Err(ConfigError::InvalidRatio {
                name: "min_contrast_ratio",
                value: self.min_contrast_ratio,
            });
        }
        if let Some(max) = self.max_contrast_ratio
            && (!max.is_finite() || max <= 1.0)
        {
            return Err(ConfigError::InvalidRatio {
                name: "max_contrast_ratio",
                value: max,
            });
        }
        if !self.min_gradient.is_finite() || !(0.0..=1.0).contains(&self.min_gradient) {
            return Err(ConfigError::InvalidGradient {
                value: self.min_gradient,
            });
        }
        Ok(())
    }
}
