//! Iterated bilateral filter.
//!
//! Each iteration replaces every sample by the average of its neighbours
//! weighted by spatial distance and by value difference:
//!
//! ```text
//! w(p, q) = exp(-|p - q|² / 2σs²) * exp(-(G(q) - G(p))² / 2σr²)
//! ```
//!
//! `G` is the guide: the image being filtered itself, or input B for the
//! guided variant (B steers the range weights, A is blurred). Iterations
//! feed each other and the abort signal is polled between them.
//!
//! The window extends `3.6 σs` pixels around each sample; reads past the
//! fetched region clamp to the nearest edge.
//!
//! # Example
//!
//! ```rust
//! use ofx_core::RenderScale;
//! use ofx_ops::bilateral::{BilateralKernel, BilateralParams};
//! use ofx_ops::processor::{IdentityResult, PixelKernel};
//!
//! let k = BilateralKernel::new(BilateralParams { sigma_s: 0.0, ..Default::default() });
//! assert_eq!(k.is_identity(RenderScale::FULL), IdentityResult::IdentityA);
//! ```

use crate::boundary::TileBoundaryPolicy;
use crate::parallel::for_each_row;
use crate::planar::PlanarImage;
use crate::processor::{IdentityResult, KernelContext, PixelKernel};
use crate::region::{bilateral_support, BILATERAL_WINDOW_SIGMAS};
use crate::OpsResult;
use ofx_core::{ImageMemory, RenderScale};
#[allow(unused_imports)]
use tracing::{debug, trace};

/// Bilateral parameters, at full resolution.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BilateralParams {
    /// Spatial standard deviation in pixels.
    pub sigma_s: f64,
    /// Range standard deviation in normalised intensity.
    pub sigma_r: f64,
    /// Number of passes.
    pub iterations: i32,
}

impl Default for BilateralParams {
    fn default() -> Self {
        Self {
            sigma_s: 10.0,
            sigma_r: 0.1,
            iterations: 1,
        }
    }
}

/// Bilateral filter kernel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BilateralKernel {
    params: BilateralParams,
    guided: bool,
}

impl BilateralKernel {
    /// Self-guided bilateral.
    pub fn new(params: BilateralParams) -> Self {
        Self { params, guided: false }
    }

    /// Bilateral of A steered by the values of B.
    pub fn guided(params: BilateralParams) -> Self {
        Self { params, guided: true }
    }

    /// Parameters.
    pub fn params(&self) -> &BilateralParams {
        &self.params
    }
}

impl PixelKernel for BilateralKernel {
    fn name(&self) -> &'static str {
        if self.guided { "bilateral-guided" } else { "bilateral" }
    }

    fn boundary(&self) -> TileBoundaryPolicy {
        TileBoundaryPolicy::Nearest
    }

    fn support(&self, scale: RenderScale) -> i32 {
        bilateral_support(self.params.sigma_s, self.params.iterations, scale)
    }

    fn is_identity(&self, _scale: RenderScale) -> IdentityResult {
        let p = &self.params;
        if p.sigma_s <= 0.0 || p.sigma_r <= 0.0 || p.iterations <= 0 {
            IdentityResult::IdentityA
        } else {
            IdentityResult::NotIdentity
        }
    }

    fn uses_b(&self) -> bool {
        self.guided
    }

    fn process(&self, ctx: &KernelContext<'_>, a: &mut PlanarImage, b: Option<&PlanarImage>) -> OpsResult<()> {
        if self.is_identity(ctx.scale) != IdentityResult::NotIdentity {
            return Ok(());
        }
        let (w, h) = (a.width(), a.height());
        let spatial = SpatialWeights::new(self.params.sigma_s * ctx.scale.x, w.max(h), ctx.memory)?;
        let inv_2sr2 = (0.5 / (self.params.sigma_r * self.params.sigma_r)) as f32;
        trace!(w, h, radius = spatial.radius, iterations = self.params.iterations, "bilateral");

        for c in 0..a.components() {
            if !ctx.channels.contains(c) {
                continue;
            }
            for iter in 0..self.params.iterations {
                if ctx.cancel.is_cancelled() {
                    debug!(iter, "bilateral cancelled between iterations");
                    return Ok(());
                }
                let mut out = ctx.memory.allocate::<f32>(w * h)?.into_vec();
                {
                    let src = a.plane(c);
                    let guide = match b {
                        Some(b) => b.plane(c),
                        None => src,
                    };
                    let pass = Pass {
                        src,
                        guide,
                        width: w,
                        height: h,
                        spatial: &spatial,
                        inv_2sr2,
                    };
                    for_each_row(&mut out, w, ctx.cancel, |y, row| pass.row(y, row));
                }
                a.planes_mut()[c] = out;
            }
        }
        Ok(())
    }
}

/// Precomputed spatial Gaussian over the square window.
struct SpatialWeights {
    radius: usize,
    weights: Vec<f32>,
}

impl SpatialWeights {
    /// Window for `sigma_px`, its radius capped at `extent`: with Nearest
    /// edges a wider window only revisits the same edge pixels.
    fn new(sigma_px: f64, extent: usize, memory: &ImageMemory) -> OpsResult<Self> {
        if sigma_px <= 0.0 {
            return Ok(Self {
                radius: 0,
                weights: vec![1.0],
            });
        }
        let radius = ((sigma_px * BILATERAL_WINDOW_SIGMAS).ceil() as usize).min(extent);
        let size = 2 * radius + 1;
        let inv_2ss2 = 0.5 / (sigma_px * sigma_px);
        let mut weights = memory.allocate::<f32>(size * size)?.into_vec();
        for (i, w) in weights.iter_mut().enumerate() {
            let dy = (i / size) as f64 - radius as f64;
            let dx = (i % size) as f64 - radius as f64;
            *w = (-(dx * dx + dy * dy) * inv_2ss2).exp() as f32;
        }
        Ok(Self { radius, weights })
    }
}

struct Pass<'a> {
    src: &'a [f32],
    guide: &'a [f32],
    width: usize,
    height: usize,
    spatial: &'a SpatialWeights,
    inv_2sr2: f32,
}

impl Pass<'_> {
    fn row(&self, y: usize, row: &mut [f32]) {
        let r = self.spatial.radius as isize;
        let size = 2 * self.spatial.radius + 1;
        let nearest = TileBoundaryPolicy::Nearest;
        for (x, out) in row.iter_mut().enumerate() {
            let center = self.guide[y * self.width + x];
            let mut sum = 0.0f32;
            let mut norm = 0.0f32;
            for dy in -r..=r {
                let Some(sy) = nearest.resolve_index(y as isize + dy, self.height) else {
                    continue;
                };
                let wrow = &self.spatial.weights[(dy + r) as usize * size..][..size];
                for dx in -r..=r {
                    let Some(sx) = nearest.resolve_index(x as isize + dx, self.width) else {
                        continue;
                    };
                    let i = sy * self.width + sx;
                    let d = self.guide[i] - center;
                    let wgt = wrow[(dx + r) as usize] * (-d * d * self.inv_2sr2).exp();
                    sum += wgt * self.src[i];
                    norm += wgt;
                }
            }
            *out = if norm > 0.0 { sum / norm } else { self.src[y * self.width + x] };
        }
    }
}
