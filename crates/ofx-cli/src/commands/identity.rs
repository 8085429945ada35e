//! Identity command
//!
//! Prints whether a render of the window can be skipped and which input
//! the host should pass through instead.

use super::{Effect, parse_rect, pipeline};
use crate::{EffectArgs, IdentityArgs};
use anyhow::Result;
use ofx_core::{Rect, RenderScale};
use ofx_ops::IdentityResult;
#[allow(unused_imports)]
use tracing::{debug, trace};

/// Identity decision of `effect` for `window`.
pub fn decide(
    effect: &Effect,
    fx: &EffectArgs,
    window: Rect,
    scale: RenderScale,
    mask_rod: Option<Rect>,
) -> Result<IdentityResult> {
    let masked = mask_rod.is_some();
    Ok(match effect {
        Effect::Bilateral(k) => pipeline(*k, fx, masked)?.is_identity(window, scale, mask_rod),
        Effect::Wavelet(k) => pipeline(*k, fx, masked)?.is_identity(window, scale, mask_rod),
        Effect::HueRemap(k) => pipeline(k.clone(), fx, masked)?.is_identity(window, scale, mask_rod),
        Effect::Pik(keyer) => keyer.is_identity(),
    })
}

fn label(result: IdentityResult) -> &'static str {
    match result {
        IdentityResult::NotIdentity => "render",
        IdentityResult::IdentityA => "identity A",
        IdentityResult::IdentityB => "identity B",
    }
}

pub fn run(args: IdentityArgs) -> Result<()> {
    trace!(effect = ?args.effect.effect, window = %args.window, "identity::run");
    let effect = Effect::load(&args.effect)?;
    let window = parse_rect(&args.window)?;
    let mask_rod = args.mask_rod.as_deref().map(parse_rect).transpose()?;
    let scale = RenderScale::new(args.effect.scale, args.effect.scale);
    let result = decide(&effect, &args.effect, window, scale, mask_rod)?;
    debug!(?result, "identity decision");

    if args.json {
        let value = serde_json::json!({
            "identity": result != IdentityResult::NotIdentity,
            "result": label(result),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("{}", label(result));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EffectKind;
    use ofx_ops::bilateral::{BilateralKernel, BilateralParams};
    use ofx_ops::wavelet::{WaveletKernel, WaveletParams};

    fn fx(mix: f32) -> EffectArgs {
        EffectArgs {
            effect: EffectKind::Bilateral,
            params: None,
            guided: false,
            scale: 1.0,
            mix,
            mask_invert: false,
            channels: "rgba".into(),
        }
    }

    #[test]
    fn test_zero_sigma_is_identity() {
        let e = Effect::Bilateral(BilateralKernel::new(BilateralParams { sigma_s: 0.0, ..Default::default() }));
        let w = Rect::new(0, 0, 10, 10);
        assert_eq!(decide(&e, &fx(1.0), w, RenderScale::FULL, None).unwrap(), IdentityResult::IdentityA);
    }

    #[test]
    fn test_zero_mix_and_disjoint_mask() {
        let e = Effect::Bilateral(BilateralKernel::new(BilateralParams::default()));
        let w = Rect::new(0, 0, 10, 10);
        assert_eq!(decide(&e, &fx(1.0), w, RenderScale::FULL, None).unwrap(), IdentityResult::NotIdentity);
        assert_eq!(decide(&e, &fx(0.0), w, RenderScale::FULL, None).unwrap(), IdentityResult::IdentityA);
        let far = Some(Rect::new(50, 50, 60, 60));
        assert_eq!(decide(&e, &fx(1.0), w, RenderScale::FULL, far).unwrap(), IdentityResult::IdentityA);
    }

    #[test]
    fn test_wavelet_identity_at_tiny_scale() {
        let e = Effect::Wavelet(WaveletKernel::new(WaveletParams::uniform(0.1, 0.5)));
        let w = Rect::new(0, 0, 4, 4);
        let tiny = RenderScale::new(1.0 / 1024.0, 1.0 / 1024.0);
        assert_eq!(decide(&e, &fx(1.0), w, tiny, None).unwrap(), IdentityResult::IdentityA);
        assert_eq!(decide(&e, &fx(1.0), w, RenderScale::FULL, None).unwrap(), IdentityResult::NotIdentity);
        assert_eq!(label(IdentityResult::IdentityB), "identity B");
    }
}
