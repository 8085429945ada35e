//! Out-of-bounds neighbourhood reads.
//!
//! A kernel whose support crosses the edge of the fetched image declares
//! how missing samples are synthesised:
//!
//! | Policy     | Sample at `i` outside `[lo, hi)`       |
//! |------------|----------------------------------------|
//! | `Black`    | zero, alpha-transparent                |
//! | `Nearest`  | clamped to the edge                    |
//! | `Periodic` | wrapped modulo the extent              |
//! | `Mirror`   | reflected about the edge, edge not repeated |
//!
//! ```rust
//! use ofx_ops::boundary::TileBoundaryPolicy;
//!
//! assert_eq!(TileBoundaryPolicy::Nearest.resolve(-3, 0, 10), Some(0));
//! assert_eq!(TileBoundaryPolicy::Periodic.resolve(-1, 0, 10), Some(9));
//! assert_eq!(TileBoundaryPolicy::Mirror.resolve(-2, 0, 10), Some(2));
//! assert_eq!(TileBoundaryPolicy::Black.resolve(10, 0, 10), None);
//! ```

use ofx_core::{PixelBuffer, Sample};

/// How a kernel reads outside the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum TileBoundaryPolicy {
    /// Zero.
    #[default]
    Black = 0,
    /// Clamp to edge.
    Nearest = 1,
    /// Wrap around.
    Periodic = 2,
    /// Reflect without repeating the edge sample.
    Mirror = 3,
}

impl TileBoundaryPolicy {
    /// Maps index `i` into `[lo, hi)`, or `None` for a black sample.
    #[inline]
    pub fn resolve(self, i: i32, lo: i32, hi: i32) -> Option<i32> {
        if hi <= lo {
            return None;
        }
        if i >= lo && i < hi {
            return Some(i);
        }
        match self {
            Self::Black => None,
            Self::Nearest => Some(i.clamp(lo, hi - 1)),
            Self::Periodic => Some(lo + (i - lo).rem_euclid(hi - lo)),
            Self::Mirror => {
                let n = hi - lo;
                if n == 1 {
                    return Some(lo);
                }
                let period = 2 * (n - 1);
                let k = (i - lo).rem_euclid(period);
                Some(lo + if k < n { k } else { period - k })
            }
        }
    }

    /// Index into a zero-based slice of length `len`.
    #[inline]
    pub fn resolve_index(self, i: isize, len: usize) -> Option<usize> {
        self.resolve(i as i32, 0, len as i32).map(|v| v as usize)
    }

    /// Pixel of `img` at `(x, y)` under this policy.
    #[inline]
    pub fn fetch<'a, T: Sample>(self, img: &'a PixelBuffer<T>, x: i32, y: i32) -> Option<&'a [T]> {
        let b = img.bounds();
        let x = self.resolve(x, b.x1, b.x2)?;
        let y = self.resolve(y, b.y1, b.y2)?;
        img.pixel(x, y)
    }
}
