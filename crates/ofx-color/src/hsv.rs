//! RGB ⇄ HSV.
//!
//! Hue is expressed in turns, `[0, 1)`, with red at 0. Saturation is
//! `(max - min) / max`, value is `max`.
//!
//! ```rust
//! use ofx_color::{hsv_to_rgb, rgb_to_hsv};
//!
//! let [h, s, v] = rgb_to_hsv([0.0, 1.0, 0.0]);
//! assert!((h - 1.0 / 3.0).abs() < 1e-6);
//! assert_eq!((s, v), (1.0, 1.0));
//!
//! let rgb = hsv_to_rgb([h, s, v]);
//! assert!((rgb[1] - 1.0).abs() < 1e-6);
//! ```

/// RGB to `[h, s, v]`.
///
/// Black gives `[0, 0, 0]`; greys give hue 0.
pub fn rgb_to_hsv(rgb: [f32; 3]) -> [f32; 3] {
    let [r, g, b] = rgb;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    if max == 0.0 {
        return [0.0, 0.0, max];
    }
    let s = delta / max;
    if delta == 0.0 {
        return [0.0, s, max];
    }

    let sector = if r == max {
        (g - b) / delta
    } else if g == max {
        2.0 + (b - r) / delta
    } else {
        4.0 + (r - g) / delta
    };
    let mut h = sector / 6.0;
    if h < 0.0 {
        h += 1.0;
    }
    [h, s, max]
}

/// `[h, s, v]` to RGB. Hue wraps.
pub fn hsv_to_rgb(hsv: [f32; 3]) -> [f32; 3] {
    let [h, s, v] = hsv;
    if s == 0.0 {
        return [v, v, v];
    }
    let h6 = ofx_math::wrap01(h) * 6.0;
    let sector = h6.floor();
    let f = h6 - sector;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));
    match sector as i32 {
        0 => [v, t, p],
        1 => [q, v, p],
        2 => [p, v, t],
        3 => [p, q, v],
        4 => [t, p, v],
        _ => [v, p, q],
    }
}
