//! External collaborators the renderer consumes.
//!
//! All lookups are synchronous and infallible from the core's perspective;
//! "no coverage" is an ordinary boolean, never an error.

use crate::config::CustomRange;
use crate::palette::{ColorScheme, Pixel};

/// Data categories a scan can cover.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanCategory {
    Altimetry,
    AltimetryHiRes,
    Biome,
    Resource,
}

/// Min/max of a body's terrain, used to normalize elevation for coloring.
#[derive(Clone, Copy, Debug)]
pub struct TerrainRange {
    pub min: f32,
    pub max: f32,
}

impl TerrainRange {
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn range(&self) -> f32 {
        self.max - self.min
    }
}

/// An elevation lookup result: the value plus the precision scheme it was
/// sampled under. Degraded (low-resolution) sampling forces
/// `ColorScheme::Grayscale` so the color stage can react.
#[derive(Clone, Copy, Debug)]
pub struct ElevationSample {
    pub elevation: f32,
    pub scheme: ColorScheme,
}

/// A world body's terrain, biome, and scan-coverage data.
pub trait BodyData {
    /// Whether any scan data exists for this body at all. Without it the
    /// renderer short-circuits to a 1x1 placeholder image.
    fn has_data(&self) -> bool {
        true
    }

    /// Whether the body has a terrain model to sample elevations from.
    fn has_terrain(&self) -> bool;

    /// Whether the body has a biome map.
    fn has_biomes(&self) -> bool;

    /// Whether scan data covers the coordinate in the given category.
    fn is_covered(&self, lon: f64, lat: f64, category: ScanCategory) -> bool;

    /// Terrain elevation at the coordinate, in meters.
    fn elevation(&self, lon: f64, lat: f64) -> f64;

    /// The body's native color for the biome at the coordinate.
    fn biome_color(&self, lon: f64, lat: f64) -> Pixel;

    /// Normalized position of the coordinate's biome within the body's
    /// biome palette, in [0, 1].
    fn biome_index_fraction(&self, lon: f64, lat: f64) -> f64;

    /// Elevation bounds for color normalization.
    fn terrain_range(&self) -> TerrainRange;
}

/// Maps data values to colors. Palette tables live behind this seam.
pub trait ColorMapper {
    /// Map an elevation to a terrain color under the given scheme,
    /// optionally against a caller-supplied range override.
    fn height_to_color(
        &self,
        elevation: f32,
        scheme: ColorScheme,
        terrain: &TerrainRange,
        custom: Option<&CustomRange>,
    ) -> Pixel;

    /// Blend a resource-abundance reading over an already-computed base
    /// color.
    fn resource_to_color(&self, base: Pixel, abundance: f32, lon: f64, lat: f64) -> Pixel;
}

/// Samples resource abundance for seeding the coarse overlay grid.
pub trait ResourceProvider {
    /// Abundance at the coordinate, in [0, 100].
    fn abundance(&self, lon: f64, lat: f64) -> f32;
}

/// The collaborator bundle passed to every `advance` call.
pub struct Services<'a> {
    pub body: &'a dyn BodyData,
    pub colors: &'a dyn ColorMapper,
    pub resources: &'a dyn ResourceProvider,
}
