//! Interleaved ⇄ planar conversion.
//!
//! Kernels work on one float plane per component; the processor
//! de-interleaves the unpremultiplied source into a [`PlanarImage`] before
//! the kernel runs and re-interleaves afterwards.
//!
//! ```rust
//! use ofx_ops::planar::PlanarImage;
//!
//! let src = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
//! let planes = PlanarImage::from_interleaved(&src, 3, 1, 2).unwrap();
//! assert_eq!(planes.plane(1), &[2.0, 4.0, 6.0]);
//!
//! let mut back = [0.0; 6];
//! planes.to_interleaved(&mut back).unwrap();
//! assert_eq!(back, src);
//! ```

use crate::{OpsError, OpsResult};
use ofx_core::ImageMemory;

/// One `width * height` float plane per component.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanarImage {
    width: usize,
    height: usize,
    planes: Vec<Vec<f32>>,
}

impl PlanarImage {
    /// Zero-filled planes.
    pub fn new(width: usize, height: usize, components: usize) -> Self {
        Self {
            width,
            height,
            planes: vec![vec![0.0; width * height]; components],
        }
    }

    /// Zero-filled planes allocated through the host allocator.
    pub fn allocate(memory: &ImageMemory, width: usize, height: usize, components: usize) -> OpsResult<Self> {
        let mut planes = Vec::with_capacity(components);
        for _ in 0..components {
            planes.push(memory.allocate::<f32>(width * height)?.into_vec());
        }
        Ok(Self {
            width,
            height,
            planes,
        })
    }

    /// Splits interleaved `src` (`components` per pixel).
    ///
    /// # Errors
    ///
    /// [`OpsError::SizeMismatch`] if `src` is not `width * height * components` long.
    pub fn from_interleaved(src: &[f32], width: usize, height: usize, components: usize) -> OpsResult<Self> {
        let mut img = Self::new(width, height, components);
        img.fill_from_interleaved(src)?;
        Ok(img)
    }

    /// Overwrites the planes from interleaved `src`.
    pub fn fill_from_interleaved(&mut self, src: &[f32]) -> OpsResult<()> {
        let n = self.components();
        self.check_len(src.len())?;
        if n == 0 {
            return Ok(());
        }
        for (i, px) in src.chunks_exact(n).enumerate() {
            for (c, plane) in self.planes.iter_mut().enumerate() {
                plane[i] = px[c];
            }
        }
        Ok(())
    }

    /// Writes the planes back interleaved into `dst`.
    pub fn to_interleaved(&self, dst: &mut [f32]) -> OpsResult<()> {
        let n = self.components();
        self.check_len(dst.len())?;
        if n == 0 {
            return Ok(());
        }
        for (i, px) in dst.chunks_exact_mut(n).enumerate() {
            for (c, plane) in self.planes.iter().enumerate() {
                px[c] = plane[i];
            }
        }
        Ok(())
    }

    fn check_len(&self, len: usize) -> OpsResult<()> {
        let expected = self.width * self.height * self.components();
        if len != expected {
            return Err(OpsError::SizeMismatch(format!(
                "interleaved buffer has {len} samples, planes need {expected}"
            )));
        }
        Ok(())
    }

    /// Plane width.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Plane height.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of planes.
    #[inline]
    pub fn components(&self) -> usize {
        self.planes.len()
    }

    /// Whether this is a `width` x `height` image of `components` full
    /// planes; images of the same shape can be swapped into each other.
    pub fn has_shape(&self, width: usize, height: usize, components: usize) -> bool {
        self.width == width
            && self.height == height
            && self.planes.len() == components
            && self.planes.iter().all(|p| p.len() == width * height)
    }

    /// Plane `c`.
    #[inline]
    pub fn plane(&self, c: usize) -> &[f32] {
        &self.planes[c]
    }

    /// Mutable plane `c`.
    #[inline]
    pub fn plane_mut(&mut self, c: usize) -> &mut [f32] {
        &mut self.planes[c]
    }

    /// All planes.
    #[inline]
    pub fn planes(&self) -> &[Vec<f32>] {
        &self.planes
    }

    /// All planes, mutable. Plane vectors may be replaced but must keep
    /// their length.
    #[inline]
    pub fn planes_mut(&mut self) -> &mut [Vec<f32>] {
        &mut self.planes
    }

    /// Sample `c` at `(x, y)`, zero-based.
    #[inline]
    pub fn sample(&self, c: usize, x: usize, y: usize) -> f32 {
        self.planes[c][y * self.width + x]
    }
}
