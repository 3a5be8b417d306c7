use core::fmt;

/// Setup-time configuration problems. Tracking itself never fails.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    NonPositiveRange,
    RangeTooLarge { range: u32 },
    InvalidMaskSize { size: usize },
    InvalidBinCount { bins: usize },
    KernelShape { bin: usize, expected: usize, actual: usize },
    NonFiniteKernel { bin: usize },
    ZeroEnergyKernel { bin: usize },
    InvalidRatio { name: &'static str, value: f32 },
    InvalidGradient { value: f32 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonPositiveRange => write!(f, "search range must be at least 1 pixel"),
            Self::RangeTooLarge { range } => {
                write!(f, "search range {range} exceeds {MAX_RANGE} pixels")
            }
            Self::InvalidMaskSize { size } => {
                write!(f, "mask size {size} is invalid: expected 2..={MAX_MASK_SIZE}")
            }
            Self::InvalidBinCount { bins } => {
                write!(f, "mask bin count {bins} is invalid: expected 1..={MAX_MASK_BINS}")
            }
            Self::KernelShape {
                bin,
                expected,
                actual,
            } => write!(
                f,
                "kernel for bin {bin} has {actual} coefficients, expected {expected}"
            ),
            Self::NonFiniteKernel { bin } => {
                write!(f, "kernel for bin {bin} contains non-finite coefficients")
            }
            Self::ZeroEnergyKernel { bin } => write!(f, "kernel for bin {bin} has zero energy"),
            Self::InvalidRatio { name, value } => write!(f, "{name} = {value} is out of range"),
            Self::InvalidGradient { value } => {
                write!(f, "minimum gradient {value} must lie in [0, 1]")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

pub(crate) const MAX_RANGE: u32 = 1024;
pub(crate) const MAX_MASK_SIZE: usize = 31;
pub(crate) const MAX_MASK_BINS: usize = 360;
