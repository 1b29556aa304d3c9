//! Scanline renderer: builds the surface map one row per `advance` call.
//!
//! Progress is caller-driven. The step counter walks through four regimes:
//! -2 seeds the resource grid, -1 smooths it and primes the per-column
//! lookahead, 0..height render one row each, and anything past that is the
//! terminal state where the finished image is returned unchanged.

use image::RgbaImage;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::config::MapConfig;
use crate::elevation::ElevationCache;
use crate::grid::Grid;
use crate::palette::{self, ColorScheme, Pixel};
use crate::projection::MapProjection;
use crate::resource::ResourceCache;
use crate::services::{ScanCategory, Services};
use crate::viewport::Viewport;

/// How often pending rows are flushed into the backing image.
const COMMIT_INTERVAL: i32 = 10;

/// Divisor turning an elevation delta in meters into a slope value.
const SLOPE_DIVISOR: f64 = 1000.0;

/// Upper clamp for slope values.
const SLOPE_MAX: f32 = 2.0;

/// Data-driven coloring modes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MapMode {
    Altimetry,
    Slope,
    Biome,
}

/// Whether this map shows the whole body or a zoomed window. Zoom maps size
/// the resource grid to the map itself and render without edge
/// randomization.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MapSource {
    World,
    Zoom,
}

/// The output surface: a committed image plus rows buffered since the last
/// commit.
pub struct ScanImage {
    image: RgbaImage,
    pending: Vec<(u32, Vec<Pixel>)>,
}

impl ScanImage {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            image: RgbaImage::new(width as u32, height as u32),
            pending: Vec::new(),
        }
    }

    pub fn width(&self) -> usize {
        self.image.width() as usize
    }

    pub fn height(&self) -> usize {
        self.image.height() as usize
    }

    /// Buffer one row of pixels for the next commit.
    pub fn set_row(&mut self, row: u32, pixels: &[Pixel]) {
        self.pending.push((row, pixels.to_vec()));
    }

    /// Flush all buffered rows into the backing image.
    pub fn commit(&mut self) {
        for (row, pixels) in self.pending.drain(..) {
            for (col, px) in pixels.iter().enumerate() {
                self.image.put_pixel(col as u32, row, *px);
            }
        }
    }

    /// Paint the cosmetic in-progress marker row. Overwritten by the next
    /// commit that reaches this row; never read back.
    pub fn mark_row(&mut self, row: u32) {
        for col in 0..self.image.width() {
            self.image.put_pixel(col, row, palette::MARKER_RED);
        }
    }

    /// The committed image.
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }
}

/// An incrementally rendered surface map bound to one body and mode.
///
/// All mutable state (both caches and the output buffer) lives here;
/// external data arrives through the `Services` bundle passed to `advance`.
pub struct Map {
    projection: MapProjection,
    mode: MapMode,
    source: MapSource,
    config: MapConfig,
    viewport: Viewport,
    elevation: ElevationCache,
    resource: ResourceCache,
    overlay_active: bool,
    /// Step counter: -2 seed, -1 smooth/prime, 0..height render, >= height
    /// complete. Monotonic.
    step: i32,
    /// Row scratch: pixels for the row being rendered.
    pix: Vec<Pixel>,
    /// Previous row's biome index (Biome mode) or elevation (Slope mode),
    /// updated in place as the current row renders.
    mapline: Vec<f64>,
    /// Current row's biome index fraction per column.
    biome_index: Vec<f64>,
    /// Current row's native biome color per column.
    native_biome: Vec<Pixel>,
    image: ScanImage,
    placeholder: RgbaImage,
    rng: ChaCha8Rng,
}

impl Map {
    pub fn new(
        config: MapConfig,
        projection: MapProjection,
        mode: MapMode,
        source: MapSource,
        cache: bool,
    ) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        let overlay_active = config.overlay_active;
        let mut map = Self {
            projection,
            mode,
            source,
            viewport: Viewport::default(),
            elevation: ElevationCache::new(1, 1, cache),
            resource: ResourceCache::new(2, 1, 1, false),
            overlay_active,
            step: -2,
            pix: Vec::new(),
            mapline: Vec::new(),
            biome_index: Vec::new(),
            native_biome: Vec::new(),
            image: ScanImage::new(1, 1),
            placeholder: RgbaImage::new(1, 1),
            rng,
            config,
        };
        map.set_extent(crate::viewport::MIN_WIDTH, None, 2, 0, None);
        map
    }

    /// Resize the map. Width is clamped as in `Viewport::set_extent`; the
    /// row scratch and elevation grid follow the new dimensions, and the
    /// resource grid is sized independently (from config for world maps,
    /// from the map itself for zoom maps, which also disables edge
    /// randomization). An existing output buffer is invalidated when the
    /// dimensions change. Rewinds the scan.
    pub fn set_extent(
        &mut self,
        width: usize,
        height: Option<usize>,
        interpolation: usize,
        start_row: usize,
        stop_row: Option<usize>,
    ) {
        self.viewport.set_extent(width, height, start_row, stop_row);
        let w = self.viewport.width();
        let h = self.viewport.height();
        self.pix = vec![palette::CLEAR; w];
        self.mapline = vec![0.0; w];
        self.biome_index = vec![0.0; w];
        self.native_biome = vec![palette::CLEAR; w];
        self.elevation.resize(w, h);
        self.resource = match self.source {
            MapSource::Zoom => ResourceCache::new(w, h, interpolation.max(1), false),
            MapSource::World => {
                let rows = self.config.overlay_grid_height.max(2);
                ResourceCache::new(
                    rows * 2,
                    rows,
                    self.config.overlay_interpolation.max(1),
                    true,
                )
            }
        };
        if self.image.width() != w || self.image.height() != h {
            self.image = ScanImage::new(w, h);
        }
        self.reset();
    }

    /// Center the view on a world coordinate.
    pub fn center_around(&mut self, lon: f64, lat: f64) {
        self.viewport.center_around(self.projection, lon, lat);
    }

    /// Rewind the scan: step back to the seeding state, resource grid
    /// zeroed, jitter/noise stream reseeded. The elevation cache survives;
    /// it only clears on a body change.
    pub fn reset(&mut self) {
        self.step = -2;
        self.rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        self.resource.reset();
        self.mapline.fill(0.0);
        self.biome_index.fill(0.0);
        self.native_biome.fill(palette::CLEAR);
    }

    /// Switch render mode; a change rewinds the scan.
    pub fn set_mode(&mut self, mode: MapMode) {
        if self.mode != mode {
            self.mode = mode;
            self.reset();
        }
    }

    /// Switch projection; a change rewinds the scan.
    pub fn set_projection(&mut self, projection: MapProjection) {
        if self.projection != projection {
            self.projection = projection;
            self.reset();
        }
    }

    /// Toggle the resource overlay; a change rewinds the scan.
    pub fn set_overlay(&mut self, active: bool) {
        if self.overlay_active != active {
            self.overlay_active = active;
            self.reset();
        }
    }

    /// The bound body changed: clear the elevation cache in place (when
    /// caching is on) and rewind the scan.
    pub fn body_changed(&mut self) {
        if self.elevation.enabled() {
            self.elevation.clear();
        }
        self.reset();
    }

    /// Override the altimetry color range.
    pub fn set_custom_range(&mut self, min: f32, max: f32) {
        self.config.custom_altimetry = Some(crate::config::CustomRange::new(min, max));
    }

    pub fn clear_custom_range(&mut self) {
        self.config.custom_altimetry = None;
    }

    pub fn width(&self) -> usize {
        self.viewport.width()
    }

    pub fn height(&self) -> usize {
        self.viewport.height()
    }

    pub fn scale(&self) -> f64 {
        self.viewport.scale()
    }

    pub fn lon_offset(&self) -> f64 {
        self.viewport.lon_offset()
    }

    pub fn lat_offset(&self) -> f64 {
        self.viewport.lat_offset()
    }

    pub fn centered_lon(&self) -> f64 {
        self.viewport.centered_lon()
    }

    pub fn centered_lat(&self) -> f64 {
        self.viewport.centered_lat()
    }

    pub fn projection(&self) -> MapProjection {
        self.projection
    }

    pub fn mode(&self) -> MapMode {
        self.mode
    }

    pub fn source(&self) -> MapSource {
        self.source
    }

    pub fn overlay_active(&self) -> bool {
        self.overlay_active
    }

    pub fn step(&self) -> i32 {
        self.step
    }

    pub fn is_complete(&self) -> bool {
        self.step >= self.viewport.height() as i32
    }

    /// The committed output image.
    pub fn image(&self) -> &RgbaImage {
        self.image.image()
    }

    /// The raw elevation grid, for exporters.
    pub fn elevation_grid(&self) -> &Grid<f32> {
        self.elevation.grid()
    }

    /// Advance the scan by one step and return the current image.
    ///
    /// Bounded work per call: at most one row's worth of column processing.
    /// Once complete, returns the finished image unchanged on every call.
    pub fn advance(&mut self, services: &Services) -> &RgbaImage {
        if !services.body.has_data() {
            return &self.placeholder;
        }
        let height = self.viewport.height() as i32;
        if self.step >= height {
            return self.image.image();
        }

        if self.step <= -2 {
            if self.overlay_active {
                self.resource.seed(services.resources, &self.viewport);
            }
            self.step += 1;
            return self.image.image();
        }

        if self.step == -1 {
            if self.overlay_active {
                self.resource.smooth(&mut self.rng);
            }
            self.prepare_columns(services);
            self.step += 1;
            return self.image.image();
        }

        self.prepare_columns(services);
        self.render_row(services);
        self.image.set_row(self.step as u32, &self.pix);
        self.step += 1;

        if self.step % COMMIT_INTERVAL == 0 || self.step >= height {
            self.image.commit();
            if self.step < height - 1 {
                self.image.mark_row(self.step as u32);
            }
        }

        self.image.image()
    }

    /// Per-column lookahead run before each row (and once while priming):
    /// lazily cache elevation for the next row, and refresh the biome
    /// scratch for the row about to render so border detection always has
    /// a previous value to compare against.
    fn prepare_columns(&mut self, services: &Services) {
        let body = services.body;
        let width = self.viewport.width();
        let height = self.viewport.height();
        let next_row = self.step + 1;
        let biome_row = self.step.max(0) as usize;
        let prep_biome = self.mode == MapMode::Biome && body.has_biomes();

        for col in 0..width {
            let lon = self.viewport.lon_for_col(col);

            // Elevation is cached in rectangular layout, so the lookahead
            // uses map-local coordinates directly, no unprojection.
            if body.has_terrain() && next_row >= 0 && (next_row as usize) < height {
                let cache_lat = self.viewport.lat_for_row(next_row as f64);
                self.elevation.record(body, lon, cache_lat, col, next_row as usize);
            }

            if !prep_biome || self.viewport.row_hidden(biome_row) {
                continue;
            }

            let la = self.viewport.lat_for_row(biome_row as f64);
            let world_lat = self.projection.unproject_lat(lon, la);
            let world_lon = self.projection.unproject_lon(lon, la);
            if world_lat.is_nan()
                || world_lon.is_nan()
                || !(-90.0..=90.0).contains(&world_lat)
                || !(-180.0..=180.0).contains(&world_lon)
            {
                self.native_biome[col] = palette::CLEAR;
                self.biome_index[col] = 0.0;
                continue;
            }

            if self.config.use_native_biome_palette
                && self.config.color_scheme == ColorScheme::Palette
            {
                self.native_biome[col] = body.biome_color(world_lon, world_lat);
                if self.config.biome_border_highlight {
                    self.biome_index[col] = body.biome_index_fraction(world_lon, world_lat);
                }
            } else {
                self.biome_index[col] = body.biome_index_fraction(world_lon, world_lat);
            }
        }
    }

    /// Render the current row into the pixel scratch.
    fn render_row(&mut self, services: &Services) {
        let width = self.viewport.width();
        let row = self.step as usize;
        let hidden = self.viewport.row_hidden(row);
        let la = self.viewport.lat_for_row(self.step as f64);

        for col in 0..width {
            if hidden {
                self.pix[col] = palette::CLEAR;
                continue;
            }

            let lo = self.viewport.lon_for_col(col);
            let lat = self.projection.unproject_lat(lo, la);
            let lon = self.projection.unproject_lon(lo, la);

            if lat.is_nan()
                || lon.is_nan()
                || !(-90.0..=90.0).contains(&lat)
                || !(-180.0..=180.0).contains(&lon)
            {
                self.pix[col] = palette::CLEAR;
                continue;
            }

            let base = match self.mode {
                MapMode::Altimetry => self.altimetry_color(services, lon, lat),
                MapMode::Slope => self.slope_color(services, lon, lat, col),
                MapMode::Biome => self.biome_color(services, lon, lat, col),
            };

            self.pix[col] = if self.overlay_active {
                let abundance = self.overlay_abundance(lo, la, lon, lat, col);
                services.colors.resource_to_color(base, abundance, lon, lat)
            } else {
                base
            };
        }
    }

    /// Resource abundance for a pixel. Rectangular maps query the
    /// pre-projection coordinates (they are already world coordinates);
    /// other projections query the unprojected ones. Zoomed polar maps
    /// index the grid directly since their resource grid mirrors the map.
    fn overlay_abundance(&self, lo: f64, la: f64, lon: f64, lat: f64, col: usize) -> f32 {
        match self.projection {
            MapProjection::Rectangular => self.resource.query(&self.viewport, lo, la),
            MapProjection::KavrayskiyVII => self.resource.query(&self.viewport, lon, lat),
            MapProjection::Polar => match self.source {
                MapSource::Zoom => {
                    let ratio = self.resource.width() as f64 / self.viewport.width() as f64;
                    let rcol = (col as f64 * ratio).round() as usize;
                    let rrow = (self.step as f64 * ratio).round() as usize;
                    self.resource.cell(rcol, rrow)
                }
                MapSource::World => self.resource.query(&self.viewport, lon, lat),
            },
        }
    }

    fn altimetry_color(&mut self, services: &Services, lon: f64, lat: f64) -> Pixel {
        let body = services.body;
        if !body.has_terrain() {
            // No terrain model at all: placeholder noise.
            return palette::lerp(palette::BLACK, palette::WHITE, self.rng.gen::<f32>());
        }
        if !body.is_covered(lon, lat, ScanCategory::Altimetry) {
            return palette::CLEAR;
        }
        let sample = self
            .elevation
            .lookup(body, lon, lat, &self.viewport, self.config.color_scheme);
        services.colors.height_to_color(
            sample.elevation,
            sample.scheme,
            &body.terrain_range(),
            self.config.custom_altimetry.as_ref(),
        )
    }

    fn slope_color(&mut self, services: &Services, lon: f64, lat: f64, col: usize) -> Pixel {
        let body = services.body;
        if !body.has_terrain() {
            return palette::lerp(palette::BLACK, palette::WHITE, self.rng.gen::<f32>());
        }
        if !body.is_covered(lon, lat, ScanCategory::Altimetry) {
            return palette::CLEAR;
        }
        let sample = self
            .elevation
            .lookup(body, lon, lat, &self.viewport, self.config.color_scheme);

        // Not a true 2D gradient: compare against the previous row's
        // neighborhood maximum. Cheaper than more elevation lookups, and
        // mapline[col - 1] already holds the current row by the time we
        // read it.
        let mut prev = self.mapline[col];
        if col > 0 {
            prev = prev.max(self.mapline[col - 1]);
        }
        if col + 1 < self.mapline.len() {
            prev = prev.max(self.mapline[col + 1]);
        }
        let v = ((sample.elevation as f64 - prev).abs() / SLOPE_DIVISOR)
            .clamp(0.0, SLOPE_MAX as f64) as f32;

        let color = if self.config.color_scheme == ColorScheme::Grayscale {
            palette::lerp(palette::BLACK, palette::WHITE, v / SLOPE_MAX)
        } else {
            let cutoff = self.config.slope_cutoff;
            if v < cutoff {
                palette::lerp(
                    self.config.low_slope_color_one,
                    self.config.high_slope_color_one,
                    v / cutoff,
                )
            } else {
                palette::lerp(
                    self.config.low_slope_color_two,
                    self.config.high_slope_color_two,
                    (v - cutoff) / (SLOPE_MAX - cutoff),
                )
            }
        };
        self.mapline[col] = sample.elevation as f64;
        color
    }

    fn biome_color(&mut self, services: &Services, lon: f64, lat: f64, col: usize) -> Pixel {
        let body = services.body;
        if !body.has_biomes() {
            return palette::lerp(palette::BLACK, palette::WHITE, self.rng.gen::<f32>());
        }
        if !body.is_covered(lon, lat, ScanCategory::Biome) {
            return palette::CLEAR;
        }

        let idx = self.biome_index[col];
        // mapline[col] is the previous row here, mapline[col - 1] already
        // the current one; a mismatch on either side flags a border pixel.
        let border = (col > 0 && self.mapline[col - 1] != idx)
            || (self.step > 0 && self.mapline[col] != idx);

        let color = if self.config.color_scheme == ColorScheme::Grayscale {
            if border {
                palette::WHITE
            } else {
                palette::lerp(palette::BLACK, palette::WHITE, idx as f32)
            }
        } else {
            let mut shade = palette::GREY;
            if self.config.biome_transparency > 0
                && body.has_terrain()
                && body.is_covered(lon, lat, ScanCategory::Altimetry)
            {
                let sample = self
                    .elevation
                    .lookup(body, lon, lat, &self.viewport, self.config.color_scheme);
                shade = match self.config.custom_altimetry {
                    Some(custom) => palette::lerp(
                        palette::BLACK,
                        palette::WHITE,
                        (sample.elevation - custom.min).clamp(0.0, custom.range())
                            / custom.range(),
                    ),
                    None => {
                        let terrain = body.terrain_range();
                        palette::lerp(
                            palette::BLACK,
                            palette::WHITE,
                            (sample.elevation - terrain.min).clamp(0.0, terrain.range())
                                / terrain.range(),
                        )
                    }
                };
            }

            if self.config.biome_border_highlight && border {
                palette::WHITE
            } else if self.config.use_native_biome_palette {
                palette::lerp(
                    self.native_biome[col],
                    shade,
                    self.config.biome_transparency as f32 / 100.0,
                )
            } else {
                palette::lerp(
                    palette::lerp(
                        self.config.low_biome_color,
                        self.config.high_biome_color,
                        idx as f32,
                    ),
                    shade,
                    self.config.biome_transparency as f32 / 100.0,
                )
            }
        };

        self.mapline[col] = idx;
        color
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{BodyData, ColorMapper, ResourceProvider, TerrainRange};
    use image::Rgba;

    struct TestBody {
        data: bool,
        terrain: bool,
        biomes: bool,
        covered: bool,
        elevation: f64,
        range: TerrainRange,
        split_biomes: bool,
    }

    impl Default for TestBody {
        fn default() -> Self {
            Self {
                data: true,
                terrain: true,
                biomes: true,
                covered: true,
                elevation: 500.0,
                range: TerrainRange::new(-1000.0, 1000.0),
                split_biomes: false,
            }
        }
    }

    impl BodyData for TestBody {
        fn has_data(&self) -> bool {
            self.data
        }

        fn has_terrain(&self) -> bool {
            self.terrain
        }

        fn has_biomes(&self) -> bool {
            self.biomes
        }

        fn is_covered(&self, _lon: f64, _lat: f64, _category: ScanCategory) -> bool {
            self.covered
        }

        fn elevation(&self, _lon: f64, _lat: f64) -> f64 {
            self.elevation
        }

        fn biome_color(&self, _lon: f64, _lat: f64) -> Pixel {
            Rgba([0, 200, 0, 255])
        }

        fn biome_index_fraction(&self, lon: f64, _lat: f64) -> f64 {
            if self.split_biomes {
                if lon < 0.0 {
                    0.25
                } else {
                    0.75
                }
            } else {
                0.5
            }
        }

        fn terrain_range(&self) -> TerrainRange {
            self.range
        }
    }

    struct TestColors;

    impl ColorMapper for TestColors {
        fn height_to_color(
            &self,
            elevation: f32,
            scheme: ColorScheme,
            terrain: &TerrainRange,
            custom: Option<&crate::config::CustomRange>,
        ) -> Pixel {
            let (min, range) = match custom {
                Some(c) => (c.min, c.range()),
                None => (terrain.min, terrain.range()),
            };
            let t = ((elevation - min) / range).clamp(0.0, 1.0);
            let g = (t * 255.0).round() as u8;
            match scheme {
                ColorScheme::Grayscale => Rgba([g, g, g, 255]),
                ColorScheme::Palette => Rgba([10, g, 200, 255]),
            }
        }

        fn resource_to_color(&self, base: Pixel, abundance: f32, _lon: f64, _lat: f64) -> Pixel {
            palette::lerp(base, Rgba([255, 0, 255, 255]), (abundance / 100.0) * 0.5)
        }
    }

    struct TestResources(f32);

    impl ResourceProvider for TestResources {
        fn abundance(&self, _lon: f64, _lat: f64) -> f32 {
            self.0
        }
    }

    fn services<'a>(
        body: &'a TestBody,
        colors: &'a TestColors,
        resources: &'a TestResources,
    ) -> Services<'a> {
        Services {
            body,
            colors,
            resources,
        }
    }

    fn world_map(mode: MapMode, config: MapConfig) -> Map {
        let mut map = Map::new(config, MapProjection::Rectangular, mode, MapSource::World, false);
        map.set_extent(360, None, 2, 0, None);
        map.center_around(0.0, 0.0);
        map
    }

    fn run_to_completion(map: &mut Map, services: &Services) {
        let mut calls = 0;
        while !map.is_complete() {
            map.advance(services);
            calls += 1;
            assert!(calls < 10_000, "scan did not terminate");
        }
    }

    #[test]
    fn test_step_increments_once_per_call() {
        let body = TestBody::default();
        let colors = TestColors;
        let resources = TestResources(0.0);
        let svc = services(&body, &colors, &resources);
        let mut map = world_map(MapMode::Altimetry, MapConfig::default());

        assert_eq!(map.step(), -2);
        let mut calls = 0;
        while !map.is_complete() {
            let before = map.step();
            map.advance(&svc);
            assert_eq!(map.step(), before + 1);
            calls += 1;
        }
        // -2, -1, then one call per row.
        assert_eq!(calls, 182);
        assert_eq!(map.height(), 180);
    }

    #[test]
    fn test_complete_map_is_idempotent() {
        let body = TestBody::default();
        let colors = TestColors;
        let resources = TestResources(0.0);
        let svc = services(&body, &colors, &resources);
        let mut map = world_map(MapMode::Altimetry, MapConfig::default());
        run_to_completion(&mut map, &svc);

        let frozen = map.image().clone();
        let step = map.step();
        for _ in 0..3 {
            map.advance(&svc);
            assert_eq!(map.step(), step);
            assert_eq!(map.image().as_raw(), frozen.as_raw());
        }
    }

    #[test]
    fn test_constant_elevation_renders_uniform_image() {
        let body = TestBody::default();
        let colors = TestColors;
        let resources = TestResources(0.0);
        let svc = services(&body, &colors, &resources);
        let mut map = world_map(MapMode::Altimetry, MapConfig::default());
        run_to_completion(&mut map, &svc);

        let expected = colors.height_to_color(500.0, ColorScheme::Palette, &body.range, None);
        for px in map.image().pixels() {
            assert_eq!(*px, expected);
        }
    }

    #[test]
    fn test_no_coverage_renders_fully_transparent() {
        let body = TestBody {
            covered: false,
            ..TestBody::default()
        };
        let colors = TestColors;
        let resources = TestResources(0.0);
        let svc = services(&body, &colors, &resources);
        let mut map = world_map(MapMode::Altimetry, MapConfig::default());
        run_to_completion(&mut map, &svc);

        for px in map.image().pixels() {
            assert_eq!(px.0[3], 0);
        }
    }

    #[test]
    fn test_missing_body_data_short_circuits() {
        let body = TestBody {
            data: false,
            ..TestBody::default()
        };
        let colors = TestColors;
        let resources = TestResources(0.0);
        let svc = services(&body, &colors, &resources);
        let mut map = world_map(MapMode::Altimetry, MapConfig::default());

        let image = map.advance(&svc);
        assert_eq!(image.width(), 1);
        assert_eq!(image.height(), 1);
        assert_eq!(map.step(), -2);
    }

    #[test]
    fn test_biome_border_highlight() {
        let body = TestBody {
            split_biomes: true,
            ..TestBody::default()
        };
        let colors = TestColors;
        let resources = TestResources(0.0);
        let svc = services(&body, &colors, &resources);
        let config = MapConfig {
            use_native_biome_palette: false,
            biome_transparency: 0,
            biome_border_highlight: true,
            ..MapConfig::default()
        };
        let low = config.low_biome_color;
        let high = config.high_biome_color;
        let mut map = world_map(MapMode::Biome, config);
        run_to_completion(&mut map, &svc);

        let image = map.image();
        // Column 180 sits at longitude 0, the biome boundary.
        for row in [0u32, 50, 120, 179] {
            assert_eq!(*image.get_pixel(180, row), palette::WHITE);
            assert_eq!(*image.get_pixel(90, row), palette::lerp(low, high, 0.25));
            assert_eq!(*image.get_pixel(270, row), palette::lerp(low, high, 0.75));
        }
    }

    #[test]
    fn test_biome_native_palette_blends_elevation_shade() {
        let body = TestBody::default();
        let colors = TestColors;
        let resources = TestResources(0.0);
        let svc = services(&body, &colors, &resources);
        let config = MapConfig {
            biome_transparency: 50,
            ..MapConfig::default()
        };
        let mut map = world_map(MapMode::Biome, config);
        run_to_completion(&mut map, &svc);

        // Constant elevation 500 in [-1000, 1000] shades at 0.75.
        let shade = palette::lerp(palette::BLACK, palette::WHITE, 0.75);
        let expected = palette::lerp(Rgba([0, 200, 0, 255]), shade, 0.5);
        assert_eq!(*map.image().get_pixel(100, 100), expected);
    }

    #[test]
    fn test_slope_settles_on_flat_terrain() {
        let body = TestBody::default();
        let colors = TestColors;
        let resources = TestResources(0.0);
        let svc = services(&body, &colors, &resources);
        let config = MapConfig::default();
        let low_one = config.low_slope_color_one;
        let high_one = config.high_slope_color_one;
        let mut map = world_map(MapMode::Slope, config);
        run_to_completion(&mut map, &svc);

        // Only the first pixel compares against an empty previous line
        // (|500 - 0| / 1000); the in-place line update means every later
        // column already sees the current row's elevation.
        let first = palette::lerp(low_one, high_one, 0.5);
        let settled = palette::lerp(low_one, high_one, 0.0);
        assert_eq!(*map.image().get_pixel(0, 0), first);
        assert_eq!(*map.image().get_pixel(50, 0), settled);
        assert_eq!(*map.image().get_pixel(50, 90), settled);
    }

    #[test]
    fn test_resource_overlay_blends_over_base() {
        let body = TestBody::default();
        let colors = TestColors;
        let resources = TestResources(60.0);
        let svc = services(&body, &colors, &resources);
        let config = MapConfig {
            overlay_active: true,
            overlay_grid_height: 32,
            overlay_interpolation: 8,
            ..MapConfig::default()
        };
        let mut map = world_map(MapMode::Altimetry, config);
        run_to_completion(&mut map, &svc);

        let base = colors.height_to_color(500.0, ColorScheme::Palette, &body.range, None);
        let expected = colors.resource_to_color(base, 60.0, 0.0, 0.0);
        // Map center queries the interior of the smoothed grid, away from
        // edge jitter.
        assert_eq!(*map.image().get_pixel(180, 90), expected);
    }

    #[test]
    fn test_marker_row_painted_then_overwritten() {
        let body = TestBody::default();
        let colors = TestColors;
        let resources = TestResources(0.0);
        let svc = services(&body, &colors, &resources);
        let mut map = world_map(MapMode::Altimetry, MapConfig::default());

        // Two priming steps plus rows 0..9; the commit at step 10 paints
        // the marker under the finished block.
        for _ in 0..12 {
            map.advance(&svc);
        }
        assert_eq!(map.step(), 10);
        let expected = colors.height_to_color(500.0, ColorScheme::Palette, &body.range, None);
        let image = map.image();
        assert_eq!(*image.get_pixel(0, 5), expected);
        assert_eq!(*image.get_pixel(0, 10), palette::MARKER_RED);
        assert_eq!(image.get_pixel(0, 11).0[3], 0);

        run_to_completion(&mut map, &svc);
        for px in map.image().pixels() {
            assert_ne!(*px, palette::MARKER_RED);
        }
    }

    #[test]
    fn test_custom_altimetry_range() {
        let body = TestBody::default();
        let colors = TestColors;
        let resources = TestResources(0.0);
        let svc = services(&body, &colors, &resources);
        let mut map = world_map(MapMode::Altimetry, MapConfig::default());
        map.set_custom_range(0.0, 500.0);
        run_to_completion(&mut map, &svc);

        // Elevation 500 saturates the custom range.
        assert_eq!(*map.image().get_pixel(10, 10), Rgba([10, 255, 200, 255]));
    }

    #[test]
    fn test_polar_gap_between_discs_is_transparent() {
        let body = TestBody::default();
        let colors = TestColors;
        let resources = TestResources(0.0);
        let svc = services(&body, &colors, &resources);
        let mut map = Map::new(
            MapConfig::default(),
            MapProjection::Polar,
            MapMode::Altimetry,
            MapSource::World,
            false,
        );
        map.set_extent(360, None, 2, 0, None);
        map.center_around(0.0, 0.0);
        run_to_completion(&mut map, &svc);

        // The midpoint between the two hemisphere discs unprojects with
        // p > 1, so it has no world coordinate and stays transparent.
        assert_eq!(map.image().get_pixel(90, 90).0[3], 0);
        // The map corners reflect across the pole into the opposite disc
        // and land on valid world coordinates.
        assert_eq!(map.image().get_pixel(0, 0).0[3], 255);
        assert_eq!(map.image().get_pixel(359, 0).0[3], 255);
    }

    #[test]
    fn test_zoom_map_sizes_resource_grid_to_map() {
        let map = {
            let mut m = Map::new(
                MapConfig::default(),
                MapProjection::Rectangular,
                MapMode::Altimetry,
                MapSource::Zoom,
                false,
            );
            m.set_extent(360, Some(64), 4, 10, Some(50));
            m
        };
        assert_eq!(map.resource.width(), 360);
        assert_eq!(map.resource.height(), 64);
        assert_eq!(map.resource.interpolation(), 4);
    }

    #[test]
    fn test_rows_outside_window_stay_blank() {
        let body = TestBody::default();
        let colors = TestColors;
        let resources = TestResources(0.0);
        let svc = services(&body, &colors, &resources);
        let mut map = Map::new(
            MapConfig::default(),
            MapProjection::Rectangular,
            MapMode::Altimetry,
            MapSource::Zoom,
            false,
        );
        map.set_extent(360, Some(64), 2, 10, Some(50));
        map.center_around(0.0, 0.0);
        run_to_completion(&mut map, &svc);

        let image = map.image();
        assert_eq!(image.get_pixel(100, 5).0[3], 0);
        assert_eq!(image.get_pixel(100, 55).0[3], 0);
        assert_ne!(image.get_pixel(100, 30).0[3], 0);
    }

    #[test]
    fn test_mode_change_rewinds_scan() {
        let body = TestBody::default();
        let colors = TestColors;
        let resources = TestResources(0.0);
        let svc = services(&body, &colors, &resources);
        let mut map = world_map(MapMode::Altimetry, MapConfig::default());
        run_to_completion(&mut map, &svc);
        assert!(map.is_complete());

        map.set_mode(MapMode::Slope);
        assert_eq!(map.step(), -2);
        assert!(!map.is_complete());
    }
}
