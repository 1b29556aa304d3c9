//! Pixel type, named colors, and color blending shared by the renderer.
//!
//! Palette *tables* (terrain ramps, biome palettes) live with the caller
//! behind the `ColorMapper` trait; this module only carries the handful of
//! fixed colors the scanline compositor needs.

use image::Rgba;

/// RGBA pixel, the unit of the output buffer.
pub type Pixel = Rgba<u8>;

/// Fully transparent, used for "no data" pixels.
pub const CLEAR: Pixel = Rgba([0, 0, 0, 0]);

pub const BLACK: Pixel = Rgba([0, 0, 0, 255]);
pub const WHITE: Pixel = Rgba([255, 255, 255, 255]);
pub const GREY: Pixel = Rgba([127, 127, 127, 255]);

/// In-progress marker row painted below the current scanline.
pub const MARKER_RED: Pixel = Rgba([255, 0, 0, 255]);

/// Which color mapping the altimetry stage should use.
///
/// `Grayscale` doubles as the degraded-precision signal: elevation lookups
/// that fall back to low-resolution sampling force it so the color stage can
/// react to the reduced fidelity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ColorScheme {
    #[default]
    Palette,
    Grayscale,
}

/// Linear interpolation between two colors, channel-wise including alpha.
/// `t` is clamped to [0, 1].
pub fn lerp(a: Pixel, b: Pixel, t: f32) -> Pixel {
    let t = t.clamp(0.0, 1.0);
    let mut out = [0u8; 4];
    for c in 0..4 {
        let av = a.0[c] as f32;
        let bv = b.0[c] as f32;
        out[c] = (av + (bv - av) * t).round() as u8;
    }
    Rgba(out)
}
