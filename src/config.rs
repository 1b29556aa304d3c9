//! Renderer configuration.
//!
//! One explicit object constructed by the surrounding system and handed to
//! the map at creation; the core never reads ambient global state.

use image::Rgba;

use crate::palette::{ColorScheme, Pixel};

/// Caller-set altimetry range override.
#[derive(Clone, Copy, Debug)]
pub struct CustomRange {
    pub min: f32,
    pub max: f32,
}

impl CustomRange {
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn range(&self) -> f32 {
        self.max - self.min
    }
}

/// Everything the renderer reads from the surrounding system.
#[derive(Clone, Debug)]
pub struct MapConfig {
    /// Seed for edge jitter and placeholder noise.
    pub seed: u64,
    /// Whether the resource-abundance overlay starts enabled.
    pub overlay_active: bool,
    /// Row count of the coarse resource grid for world maps (width is 2x).
    pub overlay_grid_height: usize,
    /// Starting window size for resource-grid interpolation.
    pub overlay_interpolation: usize,
    /// Palette or grayscale color mapping.
    pub color_scheme: ColorScheme,
    /// Slope value splitting the two slope color ramps, in (0, 2).
    pub slope_cutoff: f32,
    /// Weight of the elevation shading layer in biome colors, in percent.
    pub biome_transparency: u8,
    /// Use the body's native biome colors instead of the low/high ramp.
    pub use_native_biome_palette: bool,
    /// Highlight biome transition pixels.
    pub biome_border_highlight: bool,
    /// Optional min/max override for altimetry color mapping.
    pub custom_altimetry: Option<CustomRange>,
    /// Two-segment slope ramp, below the cutoff.
    pub low_slope_color_one: Pixel,
    pub high_slope_color_one: Pixel,
    /// Two-segment slope ramp, above the cutoff.
    pub low_slope_color_two: Pixel,
    pub high_slope_color_two: Pixel,
    /// Biome index ramp used when the native palette is off.
    pub low_biome_color: Pixel,
    pub high_biome_color: Pixel,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            overlay_active: false,
            overlay_grid_height: 256,
            overlay_interpolation: 8,
            color_scheme: ColorScheme::Palette,
            slope_cutoff: 1.0,
            biome_transparency: 40,
            use_native_biome_palette: true,
            biome_border_highlight: true,
            custom_altimetry: None,
            low_slope_color_one: Rgba([10, 72, 10, 255]),
            high_slope_color_one: Rgba([180, 190, 90, 255]),
            low_slope_color_two: Rgba([190, 120, 60, 255]),
            high_slope_color_two: Rgba([145, 25, 25, 255]),
            low_biome_color: Rgba([75, 98, 51, 255]),
            high_biome_color: Rgba([252, 192, 6, 255]),
        }
    }
}
