use clap::Parser;
use image::Rgba;
use noise::{NoiseFn, Perlin};

use scanmap::config::MapConfig;
use scanmap::palette::{self, ColorScheme, Pixel};
use scanmap::projection::MapProjection;
use scanmap::render::{Map, MapMode, MapSource};
use scanmap::services::{
    BodyData, ColorMapper, ResourceProvider, ScanCategory, Services, TerrainRange,
};

#[derive(Parser, Debug)]
#[command(name = "scanmap")]
#[command(about = "Render a scanline surface map of a synthetic planet")]
struct Args {
    /// Width of the map in pixels (clamped to 360-1440)
    #[arg(short = 'W', long, default_value = "720")]
    width: usize,

    /// Random seed for the synthetic terrain
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// Projection: rectangular, kavrayskiy, polar
    #[arg(short, long, default_value = "rectangular")]
    projection: String,

    /// Render mode: altimetry, slope, biome
    #[arg(short, long, default_value = "altimetry")]
    mode: String,

    /// Enable the resource abundance overlay
    #[arg(long)]
    overlay: bool,

    /// Output PNG path
    #[arg(short, long, default_value = "scanmap.png")]
    output: String,
}

/// Latitude-banded biome palette for the synthetic body.
const BIOME_COLORS: [Pixel; 5] = [
    Rgba([225, 236, 244, 255]),
    Rgba([64, 110, 58, 255]),
    Rgba([214, 183, 110, 255]),
    Rgba([88, 128, 52, 255]),
    Rgba([235, 240, 248, 255]),
];

/// Perlin-based stand-in for a scanned planetary body. Fully covered in
/// every scan category so the demo always renders a complete map.
struct SyntheticBody {
    terrain: Perlin,
    range: TerrainRange,
}

impl SyntheticBody {
    fn new(seed: u32) -> Self {
        Self {
            terrain: Perlin::new(seed),
            range: TerrainRange::new(-2500.0, 2500.0),
        }
    }

    fn biome_band(&self, lat: f64) -> usize {
        (((lat + 90.0) / 36.0) as usize).min(BIOME_COLORS.len() - 1)
    }
}

impl BodyData for SyntheticBody {
    fn has_terrain(&self) -> bool {
        true
    }

    fn has_biomes(&self) -> bool {
        true
    }

    fn is_covered(&self, _lon: f64, _lat: f64, _category: ScanCategory) -> bool {
        true
    }

    fn elevation(&self, lon: f64, lat: f64) -> f64 {
        let base = self.terrain.get([lon / 60.0, lat / 60.0]);
        let detail = self.terrain.get([lon / 12.0, lat / 12.0]) * 0.25;
        (base + detail) * 2000.0
    }

    fn biome_color(&self, _lon: f64, lat: f64) -> Pixel {
        BIOME_COLORS[self.biome_band(lat)]
    }

    fn biome_index_fraction(&self, _lon: f64, lat: f64) -> f64 {
        self.biome_band(lat) as f64 / (BIOME_COLORS.len() - 1) as f64
    }

    fn terrain_range(&self) -> TerrainRange {
        self.range
    }
}

/// Elevation ramp with sea level at the middle of the range.
fn terrain_ramp(t: f32) -> Pixel {
    if t < 0.5 {
        palette::lerp(Rgba([8, 24, 88, 255]), Rgba([36, 120, 190, 255]), t * 2.0)
    } else if t < 0.75 {
        palette::lerp(
            Rgba([52, 140, 49, 255]),
            Rgba([150, 126, 68, 255]),
            (t - 0.5) * 4.0,
        )
    } else {
        palette::lerp(
            Rgba([150, 126, 68, 255]),
            Rgba([245, 245, 245, 255]),
            (t - 0.75) * 4.0,
        )
    }
}

struct TerrainPalette;

impl ColorMapper for TerrainPalette {
    fn height_to_color(
        &self,
        elevation: f32,
        scheme: ColorScheme,
        terrain: &TerrainRange,
        custom: Option<&scanmap::config::CustomRange>,
    ) -> Pixel {
        let (min, range) = match custom {
            Some(c) => (c.min, c.range()),
            None => (terrain.min, terrain.range()),
        };
        let t = ((elevation - min) / range).clamp(0.0, 1.0);
        match scheme {
            ColorScheme::Grayscale => palette::lerp(palette::BLACK, palette::WHITE, t),
            ColorScheme::Palette => terrain_ramp(t),
        }
    }

    fn resource_to_color(&self, base: Pixel, abundance: f32, _lon: f64, _lat: f64) -> Pixel {
        let strength = (abundance / 100.0).clamp(0.0, 1.0) * 0.6;
        palette::lerp(base, Rgba([255, 64, 0, 255]), strength)
    }
}

struct PerlinResources {
    field: Perlin,
}

impl PerlinResources {
    fn new(seed: u32) -> Self {
        Self {
            field: Perlin::new(seed),
        }
    }
}

impl ResourceProvider for PerlinResources {
    fn abundance(&self, lon: f64, lat: f64) -> f32 {
        let n = self.field.get([lon / 40.0, lat / 40.0]);
        ((n + 1.0) * 50.0) as f32
    }
}

fn main() {
    let args = Args::parse();

    let projection = match args.projection.as_str() {
        "rectangular" => MapProjection::Rectangular,
        "kavrayskiy" => MapProjection::KavrayskiyVII,
        "polar" => MapProjection::Polar,
        other => {
            eprintln!("Unknown projection: {}", other);
            std::process::exit(1);
        }
    };
    let mode = match args.mode.as_str() {
        "altimetry" => MapMode::Altimetry,
        "slope" => MapMode::Slope,
        "biome" => MapMode::Biome,
        other => {
            eprintln!("Unknown mode: {}", other);
            std::process::exit(1);
        }
    };

    let config = MapConfig {
        seed: args.seed,
        overlay_active: args.overlay,
        ..MapConfig::default()
    };
    let mut map = Map::new(config, projection, mode, MapSource::World, true);
    map.set_extent(args.width, None, 2, 0, None);
    map.center_around(0.0, 0.0);

    let body = SyntheticBody::new(args.seed as u32);
    let colors = TerrainPalette;
    let resources = PerlinResources::new(args.seed.wrapping_add(1) as u32);
    let services = Services {
        body: &body,
        colors: &colors,
        resources: &resources,
    };

    println!(
        "Rendering {}x{} {} map with seed {}",
        map.width(),
        map.height(),
        args.mode,
        args.seed
    );
    while !map.is_complete() {
        map.advance(&services);
    }

    match map.image().save(&args.output) {
        Ok(()) => println!("Saved map to {}", args.output),
        Err(e) => eprintln!("Failed to save {}: {}", args.output, e),
    }
}
