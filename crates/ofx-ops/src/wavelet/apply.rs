//! À-trous decomposition, noise estimation and thresholding.

use super::types::{ADAPTIVE_BUCKETS, ChannelSettings, ColorModel, LevelRange, NOISE_LEVELS};
use crate::boundary::TileBoundaryPolicy;
use crate::parallel::{for_each_row, reduce_rows, transpose};
use crate::processor::KernelContext;
use crate::OpsResult;
use ofx_color::lab::{lab_to_rgb709, rgb709_to_lab};
use ofx_color::transfer::{srgb_decode, srgb_encode};
use ofx_color::ycbcr::{rgb709_to_ycbcr709, ycbcr709_to_rgb709};
#[allow(unused_imports)]
use tracing::{debug, trace};

/// One hat pass along a line: `(2 c + left + right) / 4` with taps `sc`
/// samples away, mirrored at both ends.
pub fn hat_row(src: &[f32], sc: usize, out: &mut [f32]) {
    let n = src.len();
    let mirror = TileBoundaryPolicy::Mirror;
    let sc = sc as isize;
    for (i, o) in out.iter_mut().enumerate() {
        let at = |j: isize| mirror.resolve_index(j, n).map_or(0.0, |k| src[k]);
        let ii = i as isize;
        *o = 0.25 * (2.0 * src[i] + at(ii - sc) + at(ii + sc));
    }
}

/// Separable hat smoothing of a `width x height` plane: rows, then
/// columns through a transpose.
pub(crate) fn smooth(ctx: &KernelContext<'_>, src: &[f32], width: usize, height: usize, sc: usize) -> OpsResult<Vec<f32>> {
    let mut rows = ctx.memory.allocate::<f32>(width * height)?.into_vec();
    for_each_row(&mut rows, width, ctx.cancel, |y, out| {
        hat_row(&src[y * width..(y + 1) * width], sc, out);
    });
    let t = transpose(&rows, width, height);
    let mut cols = ctx.memory.allocate::<f32>(width * height)?.into_vec();
    for_each_row(&mut cols, height, ctx.cancel, |x, out| {
        hat_row(&t[x * height..(x + 1) * height], sc, out);
    });
    Ok(transpose(&cols, height, width))
}

/// Bucket of a low-pass value: `(-inf, .2]`, `(.2, .4]`, ... `(.8, inf)`.
#[inline]
pub fn bucket(low: f32) -> usize {
    if low > 0.8 {
        4
    } else if low > 0.6 {
        3
    } else if low > 0.4 {
        2
    } else if low > 0.2 {
        1
    } else {
        0
    }
}

/// Magnitude below which a detail coefficient counts as noise at
/// full-resolution `level`.
pub fn adaptive_limit(level: u32) -> f32 {
    5.0 / 64.0 * (-2.6 * ((level + 1) as f32).sqrt()).exp() * 0.8002 / (-2.6f32).exp()
}

/// Per-bucket noise deviation, `sqrt(sum d² / (count + 1))` over the
/// details smaller than `limit`.
///
/// Rows are folded in parallel and the partial sums combined afterwards.
pub fn bucket_sigmas(low: &[f32], detail: &[f32], width: usize, height: usize, limit: f32) -> [f32; ADAPTIVE_BUCKETS] {
    type Partial = ([f64; ADAPTIVE_BUCKETS], [u64; ADAPTIVE_BUCKETS]);
    let (sums, counts): Partial = reduce_rows(
        height,
        || ([0.0; ADAPTIVE_BUCKETS], [0; ADAPTIVE_BUCKETS]),
        |(mut s, mut n), y| {
            let r = y * width..(y + 1) * width;
            for (&l, &d) in low[r.clone()].iter().zip(&detail[r]) {
                if d < limit && d > -limit {
                    let b = bucket(l);
                    s[b] += (d * d) as f64;
                    n[b] += 1;
                }
            }
            (s, n)
        },
        |(mut s, mut n), (s2, n2)| {
            for b in 0..ADAPTIVE_BUCKETS {
                s[b] += s2[b];
                n[b] += n2[b];
            }
            (s, n)
        },
    );
    let mut sigma = [0.0f32; ADAPTIVE_BUCKETS];
    for b in 0..ADAPTIVE_BUCKETS {
        sigma[b] = (sums[b] / (counts[b] + 1) as f64).sqrt() as f32;
    }
    sigma
}

/// Soft threshold: shrinks `d` towards zero by `t`, keeping `softness` of
/// what is removed.
#[inline]
pub fn soft_threshold(d: f32, t: f32, softness: f32) -> f32 {
    if d < -t {
        d + t - t * softness
    } else if d > t {
        d - t + t * softness
    } else {
        d * softness
    }
}

/// Sharpening gain of full-resolution `level`.
#[inline]
pub fn sharpen_gain(amount: f32, level: u32, radius: f32) -> f32 {
    let x = level as f32 - radius;
    1.0 + amount * (-x * x / 1.5).exp()
}

/// Denoises one plane in place.
///
/// Returns early, leaving `plane` untouched, when the render is cancelled
/// between levels.
#[allow(clippy::too_many_arguments)]
pub(crate) fn denoise_plane(
    ctx: &KernelContext<'_>,
    plane: &mut [f32],
    width: usize,
    height: usize,
    settings: ChannelSettings,
    levels: LevelRange,
    adaptive: bool,
    radius: f32,
) -> OpsResult<()> {
    let len = width * height;
    let mut high = ctx.memory.allocate::<f32>(len)?.into_vec();
    high.copy_from_slice(plane);
    let mut accum = ctx.memory.allocate::<f32>(len)?.into_vec();

    for lev in 0..levels.count {
        if ctx.cancel.is_cancelled() {
            debug!(lev, "wavelet cancelled between levels");
            return Ok(());
        }
        let level = lev + levels.start;
        let low = smooth(ctx, &high, width, height, 1 << lev)?;
        for (h, l) in high.iter_mut().zip(&low) {
            *h -= l;
        }

        let sigma = if adaptive {
            bucket_sigmas(&low, &high, width, height, adaptive_limit(level))
        } else {
            [NOISE_LEVELS[(level as usize).min(NOISE_LEVELS.len() - 1)]; ADAPTIVE_BUCKETS]
        };
        let beta = sharpen_gain(settings.amount, level, radius);
        trace!(level, ?sigma, beta, "wavelet level");

        let low_ref = &low;
        let detail = &high;
        for_each_row(&mut accum, width, ctx.cancel, |y, row| {
            let base = y * width;
            for (x, acc) in row.iter_mut().enumerate() {
                let i = base + x;
                let t = settings.threshold * sigma[bucket(low_ref[i])];
                *acc += beta * soft_threshold(detail[i], t, settings.softness);
            }
        });
        high = low;
    }
    if ctx.cancel.is_cancelled() {
        return Ok(());
    }
    for ((p, a), h) in plane.iter_mut().zip(&accum).zip(&high) {
        *p = a + h;
    }
    Ok(())
}

/// Linear RGB to the denoising model.
#[inline]
pub fn to_model(model: ColorModel, rgb: [f32; 3]) -> [f32; 3] {
    match model {
        ColorModel::YCbCr => rgb709_to_ycbcr709(rgb.map(srgb_encode)),
        ColorModel::Lab => rgb709_to_lab(rgb).map(|v| v / 100.0),
        ColorModel::Rgb => rgb.map(srgb_encode),
        ColorModel::LinearRgb => rgb,
    }
}

/// Denoising model back to linear RGB.
#[inline]
pub fn from_model(model: ColorModel, v: [f32; 3]) -> [f32; 3] {
    match model {
        ColorModel::YCbCr => ycbcr709_to_rgb709(v).map(srgb_decode),
        ColorModel::Lab => lab_to_rgb709(v.map(|c| c * 100.0)),
        ColorModel::Rgb => v.map(srgb_decode),
        ColorModel::LinearRgb => v,
    }
}
