//! Viewport geometry: map dimensions, scale, offsets, and the conversions
//! between world coordinates and pixel/grid indices.

use crate::projection::{normalize_lon, MapProjection};

/// Hard cap on map width: four times full resolution (360 pixels/degree
/// would be 1 pixel per quarter degree here).
pub const MAX_WIDTH: usize = 360 * 4;

/// Minimum useful map width, one pixel per degree.
pub const MIN_WIDTH: usize = 360;

/// Map extent, scale, and centering state.
///
/// `scale` is pixels per degree of longitude; height is derived from it at
/// set-extent time so the two never drift apart.
#[derive(Clone, Debug)]
pub struct Viewport {
    width: usize,
    height: usize,
    scale: f64,
    lon_offset: f64,
    lat_offset: f64,
    centered_lon: f64,
    centered_lat: f64,
    start_row: usize,
    stop_row: usize,
}

impl Default for Viewport {
    fn default() -> Self {
        let mut vp = Self {
            width: 0,
            height: 0,
            scale: 1.0,
            lon_offset: 0.0,
            lat_offset: 0.0,
            centered_lon: 0.0,
            centered_lat: 0.0,
            start_row: 0,
            stop_row: 0,
        };
        vp.set_extent(MIN_WIDTH, None, 0, None);
        vp
    }
}

impl Viewport {
    /// Resize the viewport. Width is clamped into `[MIN_WIDTH, MAX_WIDTH]`
    /// (zero selects the maximum); scale is derived as width / 360 and
    /// height as 180 * scale unless given explicitly. `start_row` and
    /// `stop_row` bound the rendered window; rows outside it stay blank.
    pub fn set_extent(
        &mut self,
        width: usize,
        height: Option<usize>,
        start_row: usize,
        stop_row: Option<usize>,
    ) {
        let width = if width == 0 { MAX_WIDTH } else { width };
        let width = width.clamp(MIN_WIDTH, MAX_WIDTH);
        self.width = width;
        self.scale = width as f64 / 360.0;
        self.height = match height {
            Some(h) if h > 0 => h,
            _ => (180.0 * self.scale) as usize,
        };
        self.start_row = start_row;
        self.stop_row = match stop_row {
            Some(s) if s > 0 => s,
            _ => self.height - 1,
        };
    }

    /// Compute offsets so the given world coordinate lands at the image
    /// center. Polar maps center on the projected coordinate.
    pub fn center_around(&mut self, projection: MapProjection, lon: f64, lat: f64) {
        if projection == MapProjection::Polar {
            let lo = projection.project_lon(lon, lat);
            let la = projection.project_lat(lon, lat);
            self.lon_offset = 180.0 + lo - (self.width as f64 / self.scale) / 2.0;
            self.lat_offset = 90.0 + la - (self.height as f64 / self.scale) / 2.0;
        } else {
            self.lon_offset = 180.0 + lon - (self.width as f64 / self.scale) / 2.0;
            self.lat_offset = 90.0 + lat - (self.height as f64 / self.scale) / 2.0;
        }
        self.centered_lon = lon;
        self.centered_lat = lat;
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn lon_offset(&self) -> f64 {
        self.lon_offset
    }

    pub fn lat_offset(&self) -> f64 {
        self.lat_offset
    }

    pub fn centered_lon(&self) -> f64 {
        self.centered_lon
    }

    pub fn centered_lat(&self) -> f64 {
        self.centered_lat
    }

    pub fn start_row(&self) -> usize {
        self.start_row
    }

    pub fn stop_row(&self) -> usize {
        self.stop_row
    }

    /// Whether a row falls outside the rendered window.
    pub fn row_hidden(&self, row: usize) -> bool {
        row < self.start_row || row > self.stop_row
    }

    /// Map-local longitude of a pixel column.
    pub fn lon_for_col(&self, col: usize) -> f64 {
        (col as f64 / self.scale) - 180.0 + self.lon_offset
    }

    /// Map-local latitude of a pixel row.
    pub fn lat_for_row(&self, row: f64) -> f64 {
        (row / self.scale) - 90.0 + self.lat_offset
    }

    /// World longitude to map-relative degrees, wrapping a full turn
    /// relative to the offset's sign so the result stays near the viewport.
    pub fn scale_lon(&self, lon: f64) -> f64 {
        let mut lon = lon;
        if self.lon_offset < 0.0 && self.lon_offset.abs() < lon {
            lon -= 360.0;
        } else if self.lon_offset > 0.0 && self.lon_offset.abs() > lon {
            lon += 360.0;
        }
        lon -= self.lon_offset;
        lon * (360.0 / (self.width as f64 / self.scale))
    }

    /// World latitude to map-relative degrees.
    pub fn scale_lat(&self, lat: f64) -> f64 {
        (lat - self.lat_offset) * (180.0 / (self.height as f64 / self.scale))
    }

    /// World longitude to fractional pixel column at the map's own scale.
    pub fn unscale_lon(&self, lon: f64) -> f64 {
        (lon - self.lon_offset + 180.0) * self.scale
    }

    /// World longitude to fractional grid column at an explicit scale, used
    /// against the differently-scaled resource grid. Re-wraps the shifted
    /// longitude so grid indices stay in range.
    pub fn unscale_lon_with(&self, lon: f64, scale: f64) -> f64 {
        (normalize_lon(lon - self.lon_offset) + 180.0) * scale
    }

    /// World latitude to fractional pixel row at the map's own scale.
    pub fn unscale_lat(&self, lat: f64) -> f64 {
        (lat - self.lat_offset + 90.0) * self.scale
    }

    /// World latitude to fractional grid row at an explicit scale.
    pub fn unscale_lat_with(&self, lat: f64, scale: f64) -> f64 {
        (lat - self.lat_offset + 90.0) * scale
    }
}

/// Clamp an unscaled value into valid array index range: negatives floor to
/// 0, values at or past `size - 0.5` cap to `size - 1` so rounding never
/// lands out of bounds.
pub fn fix_unscale(value: f64, size: usize) -> f64 {
    if value < 0.0 {
        0.0
    } else if value >= size as f64 - 0.5 {
        size as f64 - 1.0
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world_viewport() -> Viewport {
        let mut vp = Viewport::default();
        vp.set_extent(720, None, 0, None);
        vp.center_around(MapProjection::Rectangular, 0.0, 0.0);
        vp
    }

    #[test]
    fn test_extent_derives_height_from_scale() {
        let vp = world_viewport();
        assert_eq!(vp.width(), 720);
        assert_eq!(vp.height(), 360);
        assert_eq!(vp.scale(), 2.0);
        assert_eq!(vp.stop_row(), 359);
    }

    #[test]
    fn test_extent_clamps_width() {
        let mut vp = Viewport::default();
        vp.set_extent(100_000, None, 0, None);
        assert_eq!(vp.width(), MAX_WIDTH);
        vp.set_extent(0, None, 0, None);
        assert_eq!(vp.width(), MAX_WIDTH);
        vp.set_extent(10, None, 0, None);
        assert_eq!(vp.width(), MIN_WIDTH);
    }

    #[test]
    fn test_center_around_zero_gives_zero_offsets() {
        let vp = world_viewport();
        assert!(vp.lon_offset().abs() < 1e-9);
        assert!(vp.lat_offset().abs() < 1e-9);
    }

    #[test]
    fn test_unscale_inverts_pixel_coordinates() {
        let vp = world_viewport();
        for row in [0.0, 17.0, 180.0, 359.0] {
            let lat = vp.lat_for_row(row);
            assert!((vp.unscale_lat(lat) - row).abs() < 1e-9);
        }
        for col in [0usize, 33, 360, 719] {
            let lon = vp.lon_for_col(col);
            assert!((vp.unscale_lon(lon) - col as f64).abs() < 1e-9);
        }
    }

    #[test]
    fn test_unscale_with_resource_scale() {
        let vp = world_viewport();
        // A 64x32 resource grid over the full world: 0.177... cells/degree.
        let rscale = 64.0 / 360.0;
        assert!((vp.unscale_lon_with(-180.0, rscale) - 0.0).abs() < 1e-9);
        assert!((vp.unscale_lon_with(0.0, rscale) - 32.0).abs() < 1e-9);
        assert!((vp.unscale_lat_with(0.0, rscale) - 90.0 * rscale).abs() < 1e-9);
    }

    #[test]
    fn test_scale_lat_is_offset_relative() {
        let mut vp = world_viewport();
        vp.center_around(MapProjection::Rectangular, 0.0, 10.0);
        assert!((vp.scale_lat(10.0) - (10.0 - vp.lat_offset())).abs() < 1e-9);
    }

    #[test]
    fn test_fix_unscale_clamps() {
        assert_eq!(fix_unscale(-3.0, 10), 0.0);
        assert_eq!(fix_unscale(9.6, 10), 9.0);
        assert_eq!(fix_unscale(4.2, 10), 4.2);
    }

    #[test]
    fn test_row_window() {
        let mut vp = Viewport::default();
        vp.set_extent(360, Some(64), 10, Some(50));
        assert!(vp.row_hidden(9));
        assert!(!vp.row_hidden(10));
        assert!(!vp.row_hidden(50));
        assert!(vp.row_hidden(51));
    }
}
