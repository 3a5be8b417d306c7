use core::fmt;

/// Errors raised while wrapping pixel buffers into images or views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    SizeMismatch { expected: usize, actual: usize },
    InvalidStride { width: usize, stride: usize },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SizeMismatch { expected, actual } => {
                write!(f, "pixel buffer size mismatch: expected {expected}, got {actual}")
            }
            Self::InvalidStride { width, stride } => {
                write!(f, "stride {stride} is smaller than width {width}")
            }
        }
    }
}

impl std::error::Error for Error {}
