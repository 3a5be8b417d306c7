use core::f32::consts::PI;

use crate::config::SignConvention;
use crate::error::{ConfigError, MAX_MASK_BINS, MAX_MASK_SIZE};

/// Largest pixel value of the 8-bit frames the bank is applied to.
const PIXEL_MAX: f32 = 255.0;

/// Bank of oriented step-edge kernels.
///
/// Conventions:
/// - Bin `k` holds the kernel for normal angle `k * 180 / bins` degrees, with
///   the normal measured in `(row, col)` as `(cos theta, sin theta)`.
/// - A kernel of side `n` is stored row-major. Its top-left coefficient lands
///   on pixel `(x - n/2, y - n/2)` when anchored at pixel `(x, y)`, so odd
///   sizes are centered on the anchor and even sizes on the corner half a
///   pixel before it. An even kernel therefore peaks on the first pixel past
///   the intensity transition.
/// - Coefficients follow the signed distance `d` of each cell center to the
///   line through the kernel center: `clamp(2 d, -1, 1)` inside the inscribed
///   disc, zero outside, so every generated kernel sums to zero.
#[derive(Debug, Clone, PartialEq)]
pub struct MaskBank {
    size: usize,
    convention: SignConvention,
    kernels: Vec<Vec<f32>>,
    energy: Vec<f32>,
}

/// Result of folding a normal angle onto the bank's half turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinChoice {
    pub bin: usize,
    /// The bin kernel faces the opposite way from the requested normal.
    pub reversed: bool,
}

impl MaskBank {
    pub fn new(bins: usize, size: usize) -> Result<Self, ConfigError> {
        validate_dims(bins, size)?;

        let step = PI / bins as f32;
        let kernels = (0..bins)
            .map(|k| step_kernel(k as f32 * step, size))
            .collect();
        Self::from_kernels(size, kernels)
    }

    /// Wraps caller-supplied kernels; bin `k` covers normal angle `k * 180 / len`.
    pub fn from_kernels(size: usize, kernels: Vec<Vec<f32>>) -> Result<Self, ConfigError> {
        validate_dims(kernels.len(), size)?;

        let expected = size * size;
        let mut energy = Vec::with_capacity(kernels.len());
        for (bin, k) in kernels.iter().enumerate() {
            if k.len() != expected {
                return Err(ConfigError::KernelShape {
                    bin,
                    expected,
                    actual: k.len(),
                });
            }
            if k.iter().any(|c| !c.is_finite()) {
                return Err(ConfigError::NonFiniteKernel { bin });
            }
            let pos: f32 = k.iter().filter(|&&c| c > 0.0).sum();
            let neg: f32 = -k.iter().filter(|&&c| c < 0.0).sum::<f32>();
            let e = PIXEL_MAX * pos.max(neg);
            if e <= f32::EPSILON {
                return Err(ConfigError::ZeroEnergyKernel { bin });
            }
            energy.push(e);
        }

        Ok(Self {
            size,
            convention: SignConvention::default(),
            kernels,
            energy,
        })
    }

    pub fn with_convention(mut self, convention: SignConvention) -> Self {
        self.convention = convention;
        self
    }

    pub fn convention(&self) -> SignConvention {
        self.convention
    }

    pub fn bins(&self) -> usize {
        self.kernels.len()
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn angle_step(&self) -> f32 {
        PI / self.bins() as f32
    }

    pub fn kernel(&self, bin: usize) -> &[f32] {
        &self.kernels[bin]
    }

    /// Largest `|response|` the kernel can reach on an 8-bit image.
    pub fn max_energy(&self, bin: usize) -> f32 {
        self.energy[bin]
    }

    /// Pixels the footprint extends before and after its anchor on each axis.
    pub fn reach(&self) -> (usize, usize) {
        (self.size / 2, (self.size - 1) / 2)
    }

    /// Folds `theta` (radians) into `[0, pi)` and picks the nearest bin.
    ///
    /// Edge orientation is undirected, so angles half a turn apart share a
    /// kernel; `reversed` records when the shared kernel points the other way.
    pub fn quantize(&self, theta: f32) -> BinChoice {
        let bins = self.bins();
        let mut t = theta.rem_euclid(2.0 * PI);
        let mut reversed = false;
        if t >= PI {
            t -= PI;
            reversed = true;
        }

        let mut bin = (t / self.angle_step()).round() as usize;
        if bin >= bins {
            bin = 0;
            reversed = !reversed;
        }
        BinChoice { bin, reversed }
    }
}

fn validate_dims(bins: usize, size: usize) -> Result<(), ConfigError> {
    if !(2..=MAX_MASK_SIZE).contains(&size) {
        return Err(ConfigError::InvalidMaskSize { size });
    }
    if !(1..=MAX_MASK_BINS).contains(&bins) {
        return Err(ConfigError::InvalidBinCount { bins });
    }
    Ok(())
}

fn step_kernel(theta: f32, size: usize) -> Vec<f32> {
    let (s, c) = theta.sin_cos();
    let center = (size as f32 - 1.0) * 0.5;
    let radius = size as f32 * 0.5;
    let r2 = radius * radius;

    let mut k = vec![0.0f32; size * size];
    for (idx, kv) in k.iter_mut().enumerate() {
        let u_row = (idx / size) as f32 - center;
        let u_col = (idx % size) as f32 - center;
        if u_row * u_row + u_col * u_col > r2 {
            continue;
        }
        let d = u_row * c + u_col * s;
        *kv = if d.abs() < 1e-6 {
            0.0
        } else {
            (2.0 * d).clamp(-1.0, 1.0)
        };
    }
    k
}
