//! Lazily populated cache of sampled terrain heights.
//!
//! Cells hold 0.0 until sampled; a legitimate 0.0 sample is stored as a
//! small negative epsilon so it stays distinguishable from the sentinel.
//! The direct (uncached) sampling path does not apply that substitution;
//! the asymmetry is deliberate and matches the cached path's consumers.

use crate::grid::Grid;
use crate::palette::ColorScheme;
use crate::services::{BodyData, ElevationSample, ScanCategory};
use crate::viewport::{fix_unscale, Viewport};

/// Stand-in for a sampled elevation of exactly zero.
const FLAT_EPSILON: f32 = -0.001;

/// Dense grid of previously sampled terrain heights, sized to the map's
/// pixel dimensions.
pub struct ElevationCache {
    grid: Grid<f32>,
    enabled: bool,
}

impl ElevationCache {
    pub fn new(width: usize, height: usize, enabled: bool) -> Self {
        Self {
            grid: Grid::new_with(width, height, 0.0),
            enabled,
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Read access to the raw grid, for exporters.
    pub fn grid(&self) -> &Grid<f32> {
        &self.grid
    }

    /// Zero every cell in place. Called when the body changes while the
    /// cache stays alive.
    pub fn clear(&mut self) {
        self.grid.fill(0.0);
    }

    /// Resize (and clear) the grid to new map dimensions.
    pub fn resize(&mut self, width: usize, height: usize) {
        self.grid = Grid::new_with(width, height, 0.0);
    }

    /// Lazily sample the cell at (col, row) for the given world coordinate.
    /// A no-op when caching is off, the cell is already sampled, or the
    /// coordinate has no altimetry coverage.
    pub fn record(&mut self, body: &dyn BodyData, lon: f64, lat: f64, col: usize, row: usize) {
        if !self.enabled || col >= self.grid.width || row >= self.grid.height {
            return;
        }
        if *self.grid.get(col, row) != 0.0 {
            return;
        }
        if !body.is_covered(lon, lat, ScanCategory::Altimetry) {
            return;
        }
        let mut alt = body.elevation(lon, lat) as f32;
        if alt == 0.0 {
            alt = FLAT_EPSILON;
        }
        self.grid.set(col, row, alt);
    }

    /// Elevation at a world coordinate, with the precision scheme it was
    /// obtained under.
    ///
    /// High-resolution coverage reads the cached grid value at the rounded
    /// pixel index (falling back to a direct sample while the cell still
    /// holds the sentinel). Without hi-res coverage, coordinates are
    /// quantized to whole degrees and the scheme is forced to `Grayscale`
    /// to flag the degraded fidelity.
    pub fn lookup(
        &self,
        body: &dyn BodyData,
        lon: f64,
        lat: f64,
        viewport: &Viewport,
        scheme: ColorScheme,
    ) -> ElevationSample {
        if body.is_covered(lon, lat, ScanCategory::AltimetryHiRes) {
            let elevation = if self.enabled {
                let col = fix_unscale(viewport.unscale_lon(lon), self.grid.width);
                let row = fix_unscale(viewport.unscale_lat(lat), self.grid.height);
                let cached = *self.grid.get(col.round() as usize, row.round() as usize);
                if cached == 0.0 {
                    body.elevation(lon, lat) as f32
                } else {
                    cached
                }
            } else {
                body.elevation(lon, lat) as f32
            };
            ElevationSample { elevation, scheme }
        } else {
            let qlon = ((lon * 5.0) as i32 / 5) as f64;
            let qlat = ((lat * 5.0) as i32 / 5) as f64;
            let elevation = if self.enabled {
                let col = fix_unscale(viewport.unscale_lon(lon), self.grid.width);
                let row = fix_unscale(viewport.unscale_lat(lat), self.grid.height);
                let qcol = ((col * 5.0) as i32 / 5) as usize;
                let qrow = ((row * 5.0) as i32 / 5) as usize;
                let cached = *self
                    .grid
                    .get(qcol.min(self.grid.width - 1), qrow.min(self.grid.height - 1));
                if cached == 0.0 {
                    body.elevation(qlon, qlat) as f32
                } else {
                    cached
                }
            } else {
                body.elevation(qlon, qlat) as f32
            };
            ElevationSample {
                elevation,
                scheme: ColorScheme::Grayscale,
            }
        }
    }
}
