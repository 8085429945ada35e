//! Dual-input render pipeline.
//!
//! [`RenderPipeline`] owns one [`PixelKernel`] and everything around it:
//! validation of the host images, region of interest, boundary reads,
//! unpremultiplication, planar conversion, recombination and mask/mix
//! compositing into the destination.
//!
//! # Render steps
//!
//! All steps work on the same fetch region, `RoI ∩ destination RoD`:
//!
//! 1. copy and unpremultiply A into a temporary (absent ⇒ zeros)
//! 2. same for B, when the kernel reads it
//! 3. de-interleave into planes
//! 4. run the kernel; the planar shape must not change
//! 5. re-interleave; channels outside the [`ChannelMask`] keep the source
//! 6. premultiply and mask/mix into the destination, inside the render
//!    window only, one row per task, polling the abort signal
//!
//! # Example
//!
//! ```rust
//! use ofx_core::{CancellationToken, ChannelLayout, PixelBuffer, Rect};
//! use ofx_ops::processor::{Passthrough, RenderArgs, RenderClips, RenderPipeline};
//!
//! let bounds = Rect::new(0, 0, 4, 4);
//! let src = PixelBuffer::filled(bounds, ChannelLayout::Rgba, &[0.25f32, 0.5, 0.75, 0.5]);
//! let mut dst = PixelBuffer::new(bounds, ChannelLayout::Rgba);
//!
//! let pipeline = RenderPipeline::new(Passthrough);
//! pipeline
//!     .render(&RenderArgs::new(bounds), &RenderClips::new(bounds, Some(&src)), &mut dst, &CancellationToken::new())
//!     .unwrap();
//! assert!((dst.pixel(2, 2).unwrap()[0] - 0.25).abs() < 1e-6);
//! ```

use crate::boundary::TileBoundaryPolicy;
use crate::maskmix::{MaskMixCompositor, MaskMixParams};
use crate::parallel::for_each_row;
use crate::planar::PlanarImage;
use crate::premult::PremultAdapter;
use crate::region::{fetch_region, region_of_interest};
use crate::{OpsError, OpsResult};
use ofx_core::{
    AnyImage, CancellationToken, ChannelLayout, ChannelMask, Clip, Error, FieldOrder, HostCapabilities,
    ImageMemory, PixelBuffer, PremultState, Rect, RenderScale, Sample, ScopedBuffer,
};
use rayon::prelude::*;
#[allow(unused_imports)]
use tracing::{debug, trace};

/// Outcome of an identity check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentityResult {
    /// The effect must render.
    NotIdentity,
    /// The output equals input A.
    IdentityA,
    /// The output equals input B.
    IdentityB,
}

/// Source regions a render of some output rectangle reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionsOfInterest {
    /// Region read from A.
    pub source_a: Rect,
    /// Region read from B.
    pub source_b: Rect,
}

/// What a kernel can see of the render call.
#[derive(Debug, Clone, Copy)]
pub struct KernelContext<'a> {
    /// Render scale.
    pub scale: RenderScale,
    /// Frame time.
    pub time: f64,
    /// Layout of the planes.
    pub layout: ChannelLayout,
    /// Channels to process, restricted to the layout.
    pub channels: ChannelMask,
    /// Abort signal.
    pub cancel: &'a CancellationToken,
    /// Allocator for scratch planes.
    pub memory: &'a ImageMemory,
}

/// A planar float kernel.
///
/// Kernels see unpremultiplied, normalised planes covering the fetch
/// region and know nothing about the host. They process A in place and may
/// replace plane vectors, as long as every plane keeps its length.
pub trait PixelKernel: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// How neighbourhood reads past the source edge are synthesised.
    fn boundary(&self) -> TileBoundaryPolicy {
        TileBoundaryPolicy::Black
    }

    /// Pixels of context needed around the window at `scale`.
    fn support(&self, _scale: RenderScale) -> i32 {
        0
    }

    /// Identity decision from the parameters alone.
    fn is_identity(&self, _scale: RenderScale) -> IdentityResult {
        IdentityResult::NotIdentity
    }

    /// Whether this kernel can process `layout`.
    fn supports_layout(&self, _layout: ChannelLayout) -> bool {
        true
    }

    /// Whether the kernel reads input B.
    fn uses_b(&self) -> bool {
        false
    }

    /// Runs the kernel. `b` is `Some` exactly when [`uses_b`](Self::uses_b).
    fn process(&self, ctx: &KernelContext<'_>, a: &mut PlanarImage, b: Option<&PlanarImage>) -> OpsResult<()>;
}

/// Kernel that leaves its input untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl PixelKernel for Passthrough {
    fn name(&self) -> &'static str {
        "passthrough"
    }

    fn is_identity(&self, _scale: RenderScale) -> IdentityResult {
        IdentityResult::IdentityA
    }

    fn process(&self, _ctx: &KernelContext<'_>, _a: &mut PlanarImage, _b: Option<&PlanarImage>) -> OpsResult<()> {
        Ok(())
    }
}

/// Per-call render request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderArgs {
    /// Pixels to write.
    pub window: Rect,
    /// Proxy scale.
    pub scale: RenderScale,
    /// Field to render.
    pub field: FieldOrder,
    /// Frame time.
    pub time: f64,
}

impl RenderArgs {
    /// Full-resolution progressive render of `window` at time 0.
    pub fn new(window: Rect) -> Self {
        Self {
            window,
            scale: RenderScale::FULL,
            field: FieldOrder::None,
            time: 0.0,
        }
    }

    /// Sets the render scale.
    pub fn with_scale(mut self, scale: RenderScale) -> Self {
        self.scale = scale;
        self
    }

    /// Sets the field.
    pub fn with_field(mut self, field: FieldOrder) -> Self {
        self.field = field;
        self
    }

    /// Sets the time.
    pub fn with_time(mut self, time: f64) -> Self {
        self.time = time;
        self
    }
}

/// Input clips of a render call.
#[derive(Debug, Clone, Copy)]
pub struct RenderClips<'a, T: Sample> {
    /// Region of definition of the output.
    pub dst_rod: Rect,
    /// Main input, also the background of the mask/mix.
    pub a: Clip<'a, T>,
    /// Secondary input.
    pub b: Clip<'a, T>,
    /// Mask input.
    pub mask: Clip<'a, T>,
}

impl<'a, T: Sample> RenderClips<'a, T> {
    /// Clips with only A (possibly absent) connected.
    pub fn new(dst_rod: Rect, a: Option<&'a PixelBuffer<T>>) -> Self {
        Self {
            dst_rod,
            a: Clip::from_option("A", a),
            b: Clip::disconnected("B"),
            mask: Clip::disconnected("Mask"),
        }
    }

    /// Connects B.
    pub fn with_b(mut self, b: &'a PixelBuffer<T>) -> Self {
        self.b = Clip::connected("B", b);
        self
    }

    /// Connects the mask.
    pub fn with_mask(mut self, mask: &'a PixelBuffer<T>) -> Self {
        self.mask = Clip::connected("Mask", mask);
        self
    }
}

/// Kernel plus the per-render settings around it.
#[derive(Debug, Clone)]
pub struct RenderPipeline<K> {
    kernel: K,
    caps: HostCapabilities,
    memory: ImageMemory,
    premult_channel: usize,
    channels: ChannelMask,
    mask_mix: MaskMixParams,
}

impl<K: PixelKernel> RenderPipeline<K> {
    /// Pipeline with a fully capable host, all channels, full mix.
    pub fn new(kernel: K) -> Self {
        Self {
            kernel,
            caps: HostCapabilities::full(),
            memory: ImageMemory::unbounded(),
            premult_channel: 3,
            channels: ChannelMask::ALL,
            mask_mix: MaskMixParams::default(),
        }
    }

    /// Sets the host capabilities.
    pub fn with_caps(mut self, caps: HostCapabilities) -> Self {
        self.caps = caps;
        self
    }

    /// Sets the temporary allocator.
    pub fn with_memory(mut self, memory: ImageMemory) -> Self {
        self.memory = memory;
        self
    }

    /// Sets the channel colour is divided by.
    pub fn with_premult_channel(mut self, channel: usize) -> Self {
        self.premult_channel = channel;
        self
    }

    /// Sets which channels the kernel processes.
    pub fn with_channels(mut self, channels: ChannelMask) -> Self {
        self.channels = channels;
        self
    }

    /// Sets mask and mix.
    pub fn with_mask_mix(mut self, params: MaskMixParams) -> Self {
        self.mask_mix = params;
        self
    }

    /// The kernel.
    pub fn kernel(&self) -> &K {
        &self.kernel
    }

    /// Regions of A and B needed to render `output` at `scale`.
    pub fn regions_of_interest(&self, output: Rect, scale: RenderScale) -> RegionsOfInterest {
        let roi = region_of_interest(output, self.kernel.support(scale));
        trace!(kernel = self.kernel.name(), %output, %roi, "regions of interest");
        RegionsOfInterest {
            source_a: roi,
            source_b: roi,
        }
    }

    /// Identity decision for a render of `window`.
    ///
    /// Kernel parameters first, then mix, channel selection and the
    /// mask's region of definition.
    pub fn is_identity(&self, window: Rect, scale: RenderScale, mask_rod: Option<Rect>) -> IdentityResult {
        let from_kernel = self.kernel.is_identity(scale);
        if from_kernel != IdentityResult::NotIdentity {
            debug!(kernel = self.kernel.name(), ?from_kernel, "identity from parameters");
            return from_kernel;
        }
        if !self.channels.any(4) {
            debug!("identity: no channel selected");
            return IdentityResult::IdentityA;
        }
        if self.mask_mix.is_identity(window, mask_rod) {
            debug!(mix = self.mask_mix.mix, "identity from mask/mix");
            return IdentityResult::IdentityA;
        }
        IdentityResult::NotIdentity
    }

    fn adapter(&self, premult: PremultState, layout: ChannelLayout) -> PremultAdapter {
        PremultAdapter::new(
            premult == PremultState::Premultiplied && layout.has_alpha(),
            self.premult_channel,
        )
    }

    fn check_input<'a, T: Sample>(
        &self,
        clip: &Clip<'a, T>,
        args: &RenderArgs,
        components: Option<usize>,
    ) -> OpsResult<Option<&'a PixelBuffer<T>>> {
        let Some(img) = clip.fetch() else {
            return Ok(None);
        };
        if let Some(n) = components {
            if img.components() != n {
                return Err(Error::component_mismatch(n, img.components()).into());
            }
        }
        check_scale_and_field(img, args)?;
        self.caps
            .check_fetched(clip.name(), img.bounds(), clip.region_of_definition(), args.scale)?;
        Ok(Some(img))
    }

    fn fetch_unpremultiplied<T: Sample>(
        &self,
        img: Option<&PixelBuffer<T>>,
        adapter: PremultAdapter,
        region: Rect,
        n: usize,
        cancel: &CancellationToken,
    ) -> OpsResult<ScopedBuffer<f32>> {
        let mut buf = self.memory.allocate::<f32>(region.area() * n)?;
        let Some(img) = img else {
            return Ok(buf);
        };
        let boundary = self.kernel.boundary();
        for_each_row(&mut buf[..], region.width() * n, cancel, |j, row| {
            let y = region.y1 + j as i32;
            for (i, px) in row.chunks_exact_mut(n).enumerate() {
                let x = region.x1 + i as i32;
                let unp = adapter.unpremultiply(boundary.fetch(img, x, y), n);
                px.copy_from_slice(&unp[..n]);
            }
        });
        Ok(buf)
    }

    /// Renders `args.window` of `dst`.
    ///
    /// # Errors
    ///
    /// - Format errors when depths or component counts disagree
    /// - [`Error::MissingInput`] when the kernel requires an absent input
    /// - [`Error::ScaleMismatch`] / [`Error::FieldMismatch`] for host images
    ///   carrying the wrong properties
    /// - [`Error::HostContract`] when the host breaks its declared
    ///   capabilities
    /// - [`Error::AllocationFailed`] when temporaries cannot be allocated
    ///
    /// Cancellation is not an error: rows written so far stay written.
    pub fn render<T: Sample>(
        &self,
        args: &RenderArgs,
        clips: &RenderClips<'_, T>,
        dst: &mut PixelBuffer<T>,
        cancel: &CancellationToken,
    ) -> OpsResult<()> {
        let window = args.window;
        trace!(kernel = self.kernel.name(), %window, depth = ?T::DEPTH, "render");
        if window.is_empty() {
            debug!("empty render window");
            return Ok(());
        }

        let layout = dst.layout();
        let n = layout.components();
        self.caps.check_depth(T::DEPTH)?;
        if !self.kernel.supports_layout(layout) {
            return Err(Error::UnsupportedLayout(layout).into());
        }
        check_scale_and_field(dst, args)?;
        self.caps.check_window(window, clips.dst_rod)?;
        if !dst.bounds().contains_rect(&window) {
            return Err(Error::InvalidRegion {
                region: window,
                bounds: dst.bounds(),
            }
            .into());
        }

        let a = self.check_input(&clips.a, args, Some(n))?;
        let b = if self.kernel.uses_b() {
            self.check_input(&clips.b, args, Some(n))?
        } else {
            None
        };
        let mask = if self.mask_mix.do_mask {
            self.check_input(&clips.mask, args, None)?
        } else {
            None
        };

        let roi = region_of_interest(window, self.kernel.support(args.scale));
        let region = fetch_region(roi, clips.dst_rod);
        let (w, h) = (region.width(), region.height());
        let channels = self.channels.for_layout(layout);

        let adapter_a = self.adapter(a.map_or(dst.premult(), |img| img.premult()), layout);
        let src_a = self.fetch_unpremultiplied(a, adapter_a, region, n, cancel)?;

        let mut result = self.memory.allocate::<f32>(w * h * n)?;
        if !region.is_empty() {
            let mut planes_a = PlanarImage::allocate(&self.memory, w, h, n)?;
            planes_a.fill_from_interleaved(&src_a)?;
            let planes_b = if self.kernel.uses_b() {
                let adapter_b = self.adapter(b.map_or(PremultState::Opaque, |img| img.premult()), layout);
                let src_b = self.fetch_unpremultiplied(b, adapter_b, region, n, cancel)?;
                let mut planes = PlanarImage::allocate(&self.memory, w, h, n)?;
                planes.fill_from_interleaved(&src_b)?;
                Some(planes)
            } else {
                None
            };

            let ctx = KernelContext {
                scale: args.scale,
                time: args.time,
                layout,
                channels,
                cancel,
                memory: &self.memory,
            };
            self.kernel.process(&ctx, &mut planes_a, planes_b.as_ref())?;
            if cancel.is_cancelled() {
                debug!(kernel = self.kernel.name(), "render cancelled");
                return Ok(());
            }
            if !planes_a.has_shape(w, h, n) {
                return Err(OpsError::KernelContract(format!(
                    "{} changed the planar shape",
                    self.kernel.name()
                )));
            }
            planes_a.to_interleaved(&mut result)?;

            if (0..n).any(|c| !channels.contains(c)) {
                for (r, s) in result.chunks_exact_mut(n).zip(src_a.chunks_exact(n)) {
                    for c in (0..n).filter(|&c| !channels.contains(c)) {
                        r[c] = s[c];
                    }
                }
            }
        }

        let comp = MaskMixCompositor::new(self.mask_mix, mask);
        let dst_x1 = dst.bounds().x1;
        let result = &result[..];
        dst.par_rows_mut().for_each(|(y, row)| {
            if y < window.y1 || y >= window.y2 || cancel.is_cancelled() {
                return;
            }
            for x in window.x1..window.x2 {
                let mut unp = [0.0f32; 4];
                if region.contains(x, y) {
                    let off = ((y - region.y1) as usize * w + (x - region.x1) as usize) * n;
                    unp[..n].copy_from_slice(&result[off..off + n]);
                }
                let tmp = adapter_a.premultiply(&unp, n, T::MAX_VALUE);
                let bg = a.and_then(|img| img.pixel(x, y));
                let o = (x - dst_x1) as usize * n;
                comp.composite(&tmp, bg, x, y, &mut row[o..o + n]);
            }
        });
        Ok(())
    }

    /// Renders with the depth resolved at run time.
    ///
    /// Every image must share the destination's depth.
    #[allow(clippy::too_many_arguments)]
    pub fn render_any(
        &self,
        args: &RenderArgs,
        dst_rod: Rect,
        dst: &mut AnyImage,
        a: Option<&AnyImage>,
        b: Option<&AnyImage>,
        mask: Option<&AnyImage>,
        cancel: &CancellationToken,
    ) -> OpsResult<()> {
        match dst {
            AnyImage::U8(d) => self.render_typed(args, dst_rod, d, a, b, mask, cancel),
            AnyImage::U16(d) => self.render_typed(args, dst_rod, d, a, b, mask, cancel),
            AnyImage::F32(d) => self.render_typed(args, dst_rod, d, a, b, mask, cancel),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn render_typed<T: Sample>(
        &self,
        args: &RenderArgs,
        dst_rod: Rect,
        dst: &mut PixelBuffer<T>,
        a: Option<&AnyImage>,
        b: Option<&AnyImage>,
        mask: Option<&AnyImage>,
        cancel: &CancellationToken,
    ) -> OpsResult<()> {
        let mut clips = RenderClips::new(dst_rod, downcast::<T>(a)?);
        if let Some(b) = downcast::<T>(b)? {
            clips = clips.with_b(b);
        }
        if let Some(m) = downcast::<T>(mask)? {
            clips = clips.with_mask(m);
        }
        self.render(args, &clips, dst, cancel)
    }
}

fn downcast<T: Sample>(img: Option<&AnyImage>) -> OpsResult<Option<&PixelBuffer<T>>> {
    match img {
        None => Ok(None),
        Some(img) => img
            .downcast_ref::<T>()
            .map(Some)
            .ok_or_else(|| Error::depth_mismatch(T::DEPTH, img.depth()).into()),
    }
}

/// Rejects host images whose scale or field differs from the request.
pub(crate) fn check_scale_and_field<T: Sample>(img: &PixelBuffer<T>, args: &RenderArgs) -> OpsResult<()> {
    if img.render_scale() != args.scale {
        return Err(Error::ScaleMismatch {
            expected: args.scale,
            got: img.render_scale(),
        }
        .into());
    }
    if img.field() != FieldOrder::None && img.field() != args.field {
        return Err(Error::FieldMismatch {
            expected: args.field,
            got: img.field(),
        }
        .into());
    }
    Ok(())
}
