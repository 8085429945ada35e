//! Row-parallel helpers built on Rayon.
//!
//! Every kernel parallelises over rows: inputs are read-only, each worker
//! owns disjoint output rows, and the abort signal is polled once per row.
//! Once cancellation is observed, remaining rows are skipped and left as
//! they were.
//!
//! # Example
//!
//! ```rust
//! use ofx_core::CancellationToken;
//! use ofx_ops::parallel::for_each_row;
//!
//! let mut plane = vec![0.0f32; 4 * 3];
//! for_each_row(&mut plane, 4, &CancellationToken::new(), |y, row| row.fill(y as f32));
//! assert_eq!(plane[8..], [2.0; 4]);
//! ```

use ofx_core::CancellationToken;
use rayon::prelude::*;

/// Calls `f(y, row)` for every `row_len`-long row of `buf`, in parallel.
pub fn for_each_row<F>(buf: &mut [f32], row_len: usize, cancel: &CancellationToken, f: F)
where
    F: Fn(usize, &mut [f32]) + Sync + Send,
{
    if row_len == 0 {
        return;
    }
    buf.par_chunks_mut(row_len).enumerate().for_each(|(y, row)| {
        if cancel.is_cancelled() {
            return;
        }
        f(y, row);
    });
}

/// Parallel fold over row indices `0..height`, combining per-worker
/// partial results.
pub fn reduce_rows<A, I, F, C>(height: usize, identity: I, fold: F, combine: C) -> A
where
    A: Send,
    I: Fn() -> A + Sync + Send,
    F: Fn(A, usize) -> A + Sync + Send,
    C: Fn(A, A) -> A + Sync + Send,
{
    (0..height)
        .into_par_iter()
        .fold(&identity, fold)
        .reduce(&identity, combine)
}

/// Transposes a single-channel `width x height` plane.
///
/// Column passes run as row passes on the transposed plane, which keeps
/// writes row-disjoint.
pub fn transpose(src: &[f32], width: usize, height: usize) -> Vec<f32> {
    let mut dst = vec![0.0f32; width * height];
    if height == 0 {
        return dst;
    }
    dst.par_chunks_mut(height).enumerate().for_each(|(x, col)| {
        for (y, v) in col.iter_mut().enumerate() {
            *v = src[y * width + x];
        }
    });
    dst
}
