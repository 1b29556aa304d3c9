//! Coarse resource-abundance grid with recursive box-interpolation
//! upsampling.
//!
//! The grid is seeded once per reset by sampling every Nth cell through the
//! external provider, then smoothed by repeatedly halving the window size
//! and blending neighbors. Queries afterwards are plain nearest-index
//! lookups; all smoothing happened up front.

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::grid::Grid;
use crate::projection::normalize_lon;
use crate::services::ResourceProvider;
use crate::viewport::{fix_unscale, Viewport};

/// Relative magnitude of the jitter injected where a smoothing window
/// clamps at the top or bottom grid edge.
const EDGE_JITTER: f32 = 0.2;

/// Coarse grid of resource-abundance samples, independently sized from the
/// map it overlays.
pub struct ResourceCache {
    grid: Grid<f32>,
    scale: f64,
    interpolation: usize,
    randomize_edges: bool,
}

impl ResourceCache {
    /// `width`/`height` size the coarse grid; `interpolation` is the
    /// starting window size for smoothing. Edge randomization is disabled
    /// for zoomed maps to avoid visible seams at tile boundaries.
    pub fn new(width: usize, height: usize, interpolation: usize, randomize_edges: bool) -> Self {
        Self {
            grid: Grid::new_with(width, height, 0.0),
            scale: width as f64 / 360.0,
            interpolation,
            randomize_edges,
        }
    }

    pub fn width(&self) -> usize {
        self.grid.width
    }

    pub fn height(&self) -> usize {
        self.grid.height
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn interpolation(&self) -> usize {
        self.interpolation
    }

    /// Direct cell read with clamped indices, for zoomed polar maps that
    /// bypass coordinate queries.
    pub fn cell(&self, col: usize, row: usize) -> f32 {
        *self
            .grid
            .get(col.min(self.grid.width - 1), row.min(self.grid.height - 1))
    }

    /// Zero the grid ahead of a new seed+smooth cycle.
    pub fn reset(&mut self) {
        self.grid.fill(0.0);
    }

    /// One-shot population of the coarse grid: sample every
    /// `interpolation`-th cell through the provider. Cells in between stay
    /// at zero until `smooth` fills them.
    pub fn seed(&mut self, provider: &dyn ResourceProvider, viewport: &Viewport) {
        let step = self.interpolation.max(1);
        let mut row = 0;
        while row < self.grid.height {
            let lat = (row as f64 / self.scale) - 90.0 + viewport.lat_offset();
            let mut col = 0;
            while col < self.grid.width {
                let lon = (col as f64 / self.scale) - 180.0 + viewport.lon_offset();
                let abundance = provider.abundance(normalize_lon(lon), lat);
                self.grid.set(col, row, abundance);
                col += step;
            }
            row += step;
        }
    }

    /// Recursive box interpolation: halve the window from the configured
    /// interpolation factor down to 1, running a diagonal pass and the two
    /// axis-offset passes at each size.
    pub fn smooth(&mut self, rng: &mut ChaCha8Rng) {
        let mut window = self.interpolation / 2;
        while window >= 1 {
            self.pass(window, window, window, rng);
            self.pass(0, window, window, rng);
            self.pass(window, 0, window, rng);
            window /= 2;
        }
    }

    /// One blend pass over cells at (x_off, y_off) strides. Matching
    /// offsets average the four diagonal corners of the window; a zero
    /// offset on either axis averages the four cross neighbors instead.
    /// Columns wrap, rows clamp; clamped rows get jitter when enabled.
    fn pass(&mut self, x_off: usize, y_off: usize, step: usize, rng: &mut ChaCha8Rng) {
        let width = self.grid.width;
        let height = self.grid.height;
        let mut row = y_off;
        while row < height {
            let up = row.saturating_sub(step);
            let down = (row + step).min(height - 1);
            let at_edge = row < step || row + step > height - 1;
            let mut col = x_off;
            while col < width {
                let left = (col + width - step) % width;
                let right = (col + step) % width;
                let avg = if x_off == y_off {
                    (*self.grid.get(left, up)
                        + *self.grid.get(right, up)
                        + *self.grid.get(left, down)
                        + *self.grid.get(right, down))
                        / 4.0
                } else {
                    (*self.grid.get(left, row)
                        + *self.grid.get(right, row)
                        + *self.grid.get(col, up)
                        + *self.grid.get(col, down))
                        / 4.0
                };
                let value = if at_edge && self.randomize_edges {
                    avg + avg * rng.gen_range(-EDGE_JITTER..EDGE_JITTER)
                } else {
                    avg
                };
                self.grid.set(col, row, value);
                col += 2 * step;
            }
            row += 2 * step;
        }
    }

    /// Abundance at a world coordinate: inverse-scale into this grid's own
    /// index space and take the nearest cell.
    pub fn query(&self, viewport: &Viewport, lon: f64, lat: f64) -> f32 {
        let col = fix_unscale(viewport.unscale_lon_with(lon, self.scale), self.grid.width);
        let row = fix_unscale(viewport.unscale_lat_with(lat, self.scale), self.grid.height);
        *self.grid.get(col.round() as usize, row.round() as usize)
    }
}
