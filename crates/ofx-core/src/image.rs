//! Host image buffers.
//!
//! This module provides the image containers handed over by the host for
//! one render call:
//! - [`PixelBuffer`] - Owned interleaved buffer with integer bounds
//! - [`AnyImage`] - Depth-erased buffer, dispatched once per render call
//!
//! # Memory Layout
//!
//! Samples are interleaved and rows are stored **bottom-to-top** (row 0 is
//! `bounds.y1`). A row may be padded: `row_stride` counts elements between
//! the starts of two consecutive rows and may exceed
//! `bounds.width() * components`.
//!
//! ```text
//! Memory: [R G B A R G B A ... pad]  ← y1
//!         [R G B A R G B A ... pad]  ← y1 + 1
//!         ...
//! ```
//!
//! # Usage
//!
//! ```rust
//! use ofx_core::{ChannelLayout, PixelBuffer, Rect};
//!
//! let mut img: PixelBuffer<f32> = PixelBuffer::new(Rect::new(-2, -2, 6, 6), ChannelLayout::Rgba);
//! img.set_pixel(0, 0, &[1.0, 0.5, 0.25, 1.0]);
//!
//! assert_eq!(img.pixel(0, 0).unwrap(), &[1.0, 0.5, 0.25, 1.0]);
//! assert!(img.pixel(6, 0).is_none());
//! ```

use crate::error::{Error, Result};
use crate::format::{BitDepth, ChannelLayout, FieldOrder, PremultState};
use crate::pixel::Sample;
use crate::rect::{Rect, RenderScale};
use rayon::prelude::*;
use std::any::Any;

/// Interleaved image buffer covering `bounds`.
///
/// Besides the samples, the buffer carries the properties the host attaches
/// to a fetched image: render scale, field and premultiplication state. The
/// pipeline checks them against the render request before reading.
#[derive(Debug, Clone)]
pub struct PixelBuffer<T: Sample> {
    data: Vec<T>,
    bounds: Rect,
    layout: ChannelLayout,
    row_stride: usize,
    render_scale: RenderScale,
    field: FieldOrder,
    premult: PremultState,
}

impl<T: Sample> PixelBuffer<T> {
    /// Creates a zero-filled buffer with tight rows.
    pub fn new(bounds: Rect, layout: ChannelLayout) -> Self {
        let row_stride = bounds.width() * layout.components();
        Self {
            data: vec![T::zero(); row_stride * bounds.height()],
            bounds,
            layout,
            row_stride,
            render_scale: RenderScale::FULL,
            field: FieldOrder::None,
            premult: default_premult(layout),
        }
    }

    /// Creates a buffer filled with one pixel value.
    ///
    /// Only the first `layout.components()` entries of `pixel` are used.
    pub fn filled(bounds: Rect, layout: ChannelLayout, pixel: &[T]) -> Self {
        let mut img = Self::new(bounds, layout);
        let n = layout.components();
        for px in img.data.chunks_exact_mut(n) {
            px.copy_from_slice(&pixel[..n]);
        }
        img
    }

    /// Wraps existing tightly packed data.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimensions`] if `data.len()` does not match
    /// `bounds` and `layout`.
    pub fn from_vec(bounds: Rect, layout: ChannelLayout, data: Vec<T>) -> Result<Self> {
        let row_stride = bounds.width() * layout.components();
        Self::with_row_stride(bounds, layout, row_stride, data)
    }

    /// Wraps existing data with padded rows.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimensions`] if the stride is shorter than a
    /// row or `data.len() != row_stride * height`.
    pub fn with_row_stride(
        bounds: Rect,
        layout: ChannelLayout,
        row_stride: usize,
        data: Vec<T>,
    ) -> Result<Self> {
        let (w, h) = (bounds.width(), bounds.height());
        let row_len = w * layout.components();
        if row_stride < row_len {
            return Err(Error::invalid_dimensions(
                w,
                h,
                format!("row stride {row_stride} is shorter than row length {row_len}"),
            ));
        }
        if data.len() != row_stride * h {
            return Err(Error::invalid_dimensions(
                w,
                h,
                format!("expected {} samples, got {}", row_stride * h, data.len()),
            ));
        }
        Ok(Self {
            data,
            bounds,
            layout,
            row_stride,
            render_scale: RenderScale::FULL,
            field: FieldOrder::None,
            premult: default_premult(layout),
        })
    }

    /// Sets the render scale the host attached to this image.
    pub fn with_render_scale(mut self, scale: RenderScale) -> Self {
        self.render_scale = scale;
        self
    }

    /// Sets the field the host attached to this image.
    pub fn with_field(mut self, field: FieldOrder) -> Self {
        self.field = field;
        self
    }

    /// Sets the premultiplication state.
    pub fn with_premult(mut self, premult: PremultState) -> Self {
        self.premult = premult;
        self
    }

    /// Buffer bounds.
    #[inline]
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Channel layout.
    #[inline]
    pub fn layout(&self) -> ChannelLayout {
        self.layout
    }

    /// Components per pixel.
    #[inline]
    pub fn components(&self) -> usize {
        self.layout.components()
    }

    /// Sample depth.
    #[inline]
    pub fn depth(&self) -> BitDepth {
        T::DEPTH
    }

    /// Elements between the starts of two consecutive rows.
    #[inline]
    pub fn row_stride(&self) -> usize {
        self.row_stride
    }

    /// Render scale attached by the host.
    #[inline]
    pub fn render_scale(&self) -> RenderScale {
        self.render_scale
    }

    /// Field attached by the host.
    #[inline]
    pub fn field(&self) -> FieldOrder {
        self.field
    }

    /// Premultiplication state.
    #[inline]
    pub fn premult(&self) -> PremultState {
        self.premult
    }

    /// Returns `true` if the buffer holds no pixel.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }

    /// Raw samples, including row padding.
    #[inline]
    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// Mutable raw samples, including row padding.
    #[inline]
    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Consumes the buffer and returns its samples.
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    #[inline]
    fn offset(&self, x: i32, y: i32) -> Option<usize> {
        if !self.bounds.contains(x, y) {
            return None;
        }
        let col = (x - self.bounds.x1) as usize;
        let row = (y - self.bounds.y1) as usize;
        Some(row * self.row_stride + col * self.components())
    }

    /// Pixel at `(x, y)` or `None` outside bounds.
    #[inline]
    pub fn pixel(&self, x: i32, y: i32) -> Option<&[T]> {
        let n = self.components();
        self.offset(x, y).map(|o| &self.data[o..o + n])
    }

    /// Mutable pixel at `(x, y)` or `None` outside bounds.
    #[inline]
    pub fn pixel_mut(&mut self, x: i32, y: i32) -> Option<&mut [T]> {
        let n = self.components();
        self.offset(x, y).map(move |o| &mut self.data[o..o + n])
    }

    /// Writes a pixel. Out-of-bounds writes are ignored.
    pub fn set_pixel(&mut self, x: i32, y: i32, pixel: &[T]) {
        if let Some(px) = self.pixel_mut(x, y) {
            let n = px.len();
            px.copy_from_slice(&pixel[..n]);
        }
    }

    /// Samples of row `y` without padding, or `None` outside bounds.
    pub fn row(&self, y: i32) -> Option<&[T]> {
        if y < self.bounds.y1 || y >= self.bounds.y2 || self.is_empty() {
            return None;
        }
        let start = (y - self.bounds.y1) as usize * self.row_stride;
        Some(&self.data[start..start + self.bounds.width() * self.components()])
    }

    /// Parallel iterator over `(y, row)` pairs, rows without padding.
    pub fn par_rows_mut(&mut self) -> impl IndexedParallelIterator<Item = (i32, &mut [T])> + '_ {
        let y1 = self.bounds.y1;
        let row_len = self.bounds.width() * self.components();
        // A zero stride only occurs with empty data.
        let stride = self.row_stride.max(1);
        self.data
            .par_chunks_mut(stride)
            .enumerate()
            .map(move |(i, row)| (y1 + i as i32, &mut row[..row_len]))
    }

    /// Fills every pixel with zeros.
    pub fn clear(&mut self) {
        self.data.fill(T::zero());
    }
}

fn default_premult(layout: ChannelLayout) -> PremultState {
    if layout.has_alpha() {
        PremultState::Premultiplied
    } else {
        PremultState::Opaque
    }
}

/// Buffer of any supported depth.
///
/// The depth is resolved once per render call by matching on this enum;
/// everything downstream is monomorphised over [`Sample`].
#[derive(Debug, Clone)]
pub enum AnyImage {
    /// 8-bit buffer.
    U8(PixelBuffer<u8>),
    /// 16-bit buffer.
    U16(PixelBuffer<u16>),
    /// Float buffer.
    F32(PixelBuffer<f32>),
}

macro_rules! any_image_forward {
    ($self:ident, $img:ident => $e:expr) => {
        match $self {
            AnyImage::U8($img) => $e,
            AnyImage::U16($img) => $e,
            AnyImage::F32($img) => $e,
        }
    };
}

impl AnyImage {
    /// Zero-filled buffer of the given depth.
    pub fn new(depth: BitDepth, bounds: Rect, layout: ChannelLayout) -> Self {
        match depth {
            BitDepth::U8 => Self::U8(PixelBuffer::new(bounds, layout)),
            BitDepth::U16 => Self::U16(PixelBuffer::new(bounds, layout)),
            BitDepth::F32 => Self::F32(PixelBuffer::new(bounds, layout)),
        }
    }

    /// Sample depth.
    pub fn depth(&self) -> BitDepth {
        any_image_forward!(self, img => img.depth())
    }

    /// Buffer bounds.
    pub fn bounds(&self) -> Rect {
        any_image_forward!(self, img => img.bounds())
    }

    /// Channel layout.
    pub fn layout(&self) -> ChannelLayout {
        any_image_forward!(self, img => img.layout())
    }

    /// Render scale attached by the host.
    pub fn render_scale(&self) -> RenderScale {
        any_image_forward!(self, img => img.render_scale())
    }

    /// Field attached by the host.
    pub fn field(&self) -> FieldOrder {
        any_image_forward!(self, img => img.field())
    }

    /// Premultiplication state.
    pub fn premult(&self) -> PremultState {
        any_image_forward!(self, img => img.premult())
    }

    /// Float view of the buffer, if it is one.
    pub fn as_f32(&self) -> Option<&PixelBuffer<f32>> {
        self.downcast_ref()
    }

    /// Typed view of the buffer if its depth is `T`.
    pub fn downcast_ref<T: Sample>(&self) -> Option<&PixelBuffer<T>> {
        let any: &dyn Any = any_image_forward!(self, img => img);
        any.downcast_ref()
    }

    /// Mutable typed view of the buffer if its depth is `T`.
    pub fn downcast_mut<T: Sample>(&mut self) -> Option<&mut PixelBuffer<T>> {
        let any: &mut dyn Any = any_image_forward!(self, img => img);
        any.downcast_mut()
    }

    /// Converts every sample to float in kernel space `[0, 1]`.
    ///
    /// Bounds, layout and host properties are preserved.
    pub fn to_unit_f32(&self) -> PixelBuffer<f32> {
        any_image_forward!(self, img => to_unit(img))
    }
}

fn to_unit<T: Sample>(img: &PixelBuffer<T>) -> PixelBuffer<f32> {
    PixelBuffer {
        data: img.data.iter().map(|v| v.to_unit()).collect(),
        bounds: img.bounds,
        layout: img.layout,
        row_stride: img.row_stride,
        render_scale: img.render_scale,
        field: img.field,
        premult: img.premult,
    }
}

impl From<PixelBuffer<u8>> for AnyImage {
    fn from(img: PixelBuffer<u8>) -> Self {
        Self::U8(img)
    }
}

impl From<PixelBuffer<u16>> for AnyImage {
    fn from(img: PixelBuffer<u16>) -> Self {
        Self::U16(img)
    }
}

impl From<PixelBuffer<f32>> for AnyImage {
    fn from(img: PixelBuffer<f32>) -> Self {
        Self::F32(img)
    }
}
