//! Coordinate transforms between world (longitude/latitude) and map-local
//! space for the supported projection variants.
//!
//! All operations are pure. Forward transforms normalize their inputs first;
//! inverse transforms additionally reflect out-of-range latitudes across the
//! pole, since the Polar variant's map-local range exceeds normal latitude
//! bounds. The Polar inverse can legitimately produce `NaN` near the
//! hemisphere boundary; that `NaN` propagates so the renderer can treat it
//! as "no data".

use std::f64::consts::PI;

const DEG2RAD: f64 = PI / 180.0;
const RAD2DEG: f64 = 180.0 / PI;

/// Radial stretch factor of the Polar variant's hemispheres.
const POLAR_SCALE: f64 = 1.3;

/// Map projection variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum MapProjection {
    /// Equirectangular; world coordinates map straight through.
    #[default]
    Rectangular,
    /// Kavrayskiy VII, an area-preserving pseudocylindrical projection.
    KavrayskiyVII,
    /// Two azimuthal hemispheres side by side, selected by latitude sign.
    Polar,
}

/// Wrap a longitude into [-180, 180).
pub fn normalize_lon(lon: f64) -> f64 {
    (lon + 3600.0 + 180.0) % 360.0 - 180.0
}

/// Wrap a latitude into [-90, 90).
pub fn normalize_lat(lat: f64) -> f64 {
    (lat + 1800.0 + 90.0) % 180.0 - 90.0
}

/// Reflect a coordinate across the nearest pole when its latitude falls
/// outside [-90, 90], shifting longitude by a half turn.
fn reflect_over_pole(lon: f64, lat: f64) -> (f64, f64) {
    if lat > 90.0 {
        (lon + 180.0, 180.0 - lat)
    } else if lat < -90.0 {
        (lon + 180.0, -180.0 - lat)
    } else {
        (lon, lat)
    }
}

impl MapProjection {
    /// Forward transform: world longitude to map-local longitude.
    pub fn project_lon(&self, lon: f64, lat: f64) -> f64 {
        let lon = normalize_lon(lon);
        let lat = normalize_lat(lat);
        match self {
            MapProjection::Rectangular => lon,
            MapProjection::KavrayskiyVII => {
                let lon = lon * DEG2RAD;
                let lat = lat * DEG2RAD;
                let x = (3.0 * lon / 2.0 / PI) * (PI * PI / 3.0 - lat * lat).sqrt();
                x * RAD2DEG
            }
            MapProjection::Polar => {
                let lon = lon * DEG2RAD;
                let lat = lat * DEG2RAD;
                let x = if lat < 0.0 {
                    POLAR_SCALE * lat.cos() * lon.sin() - PI / 2.0
                } else {
                    POLAR_SCALE * lat.cos() * lon.sin() + PI / 2.0
                };
                x * RAD2DEG
            }
        }
    }

    /// Forward transform: world latitude to map-local latitude.
    pub fn project_lat(&self, lon: f64, lat: f64) -> f64 {
        let lon = normalize_lon(lon);
        let lat = normalize_lat(lat);
        match self {
            MapProjection::Polar => {
                let lon = lon * DEG2RAD;
                let lat = lat * DEG2RAD;
                let y = if lat < 0.0 {
                    POLAR_SCALE * lat.cos() * lon.cos()
                } else {
                    -POLAR_SCALE * lat.cos() * lon.cos()
                };
                y * RAD2DEG
            }
            _ => lat,
        }
    }

    /// Inverse transform: map-local longitude back to world longitude.
    pub fn unproject_lon(&self, lon: f64, lat: f64) -> f64 {
        let (lon, lat) = reflect_over_pole(lon, lat);
        let lon = normalize_lon(lon);
        let lat = normalize_lat(lat);
        match self {
            MapProjection::Rectangular => lon,
            MapProjection::KavrayskiyVII => {
                let lon = lon * DEG2RAD;
                let lat = lat * DEG2RAD;
                let x = lon / (PI * PI / 3.0 - lat * lat).sqrt() * 2.0 * PI / 3.0;
                x * RAD2DEG
            }
            MapProjection::Polar => {
                let mut lon = lon * DEG2RAD;
                let lat = lat * DEG2RAD;
                let mut lat0 = PI / 2.0;
                if lon < 0.0 {
                    lon += PI / 2.0;
                    lat0 = -PI / 2.0;
                } else {
                    lon -= PI / 2.0;
                }
                lon /= POLAR_SCALE;
                let lat = lat / POLAR_SCALE;
                let p = (lon * lon + lat * lat).sqrt();
                let c = p.asin();
                let out = (lon * c.sin())
                    .atan2(p * lat0.cos() * c.cos() - lat * lat0.sin() * c.sin());
                let mut out = (out * RAD2DEG + 180.0) % 360.0 - 180.0;
                if out <= -180.0 {
                    out = -180.0;
                }
                out
            }
        }
    }

    /// Inverse transform: map-local latitude back to world latitude.
    pub fn unproject_lat(&self, lon: f64, lat: f64) -> f64 {
        let (lon, lat) = reflect_over_pole(lon, lat);
        let lon = normalize_lon(lon);
        let lat = normalize_lat(lat);
        match self {
            MapProjection::Polar => {
                let mut lon = lon * DEG2RAD;
                let lat = lat * DEG2RAD;
                let mut lat0 = PI / 2.0;
                if lon < 0.0 {
                    lon += PI / 2.0;
                    lat0 = -PI / 2.0;
                } else {
                    lon -= PI / 2.0;
                }
                lon /= POLAR_SCALE;
                let lat = lat / POLAR_SCALE;
                let p = (lon * lon + lat * lat).sqrt();
                let c = p.asin();
                let out = (c.cos() * lat0.sin() + lat * c.sin() * lat0.cos() / p).asin();
                out * RAD2DEG
            }
            _ => lat,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_normalize_idempotent() {
        for lon in [-179.5, -90.0, 0.0, 45.25, 179.9] {
            assert!((normalize_lon(normalize_lon(lon)) - normalize_lon(lon)).abs() < EPS);
        }
        for lat in [-89.5, -45.0, 0.0, 30.125, 89.9] {
            assert!((normalize_lat(normalize_lat(lat)) - normalize_lat(lat)).abs() < EPS);
        }
    }

    #[test]
    fn test_normalize_wraps() {
        assert!((normalize_lon(190.0) - (-170.0)).abs() < EPS);
        assert!((normalize_lon(-190.0) - 170.0).abs() < EPS);
        assert!((normalize_lat(100.0) - (-80.0)).abs() < EPS);
    }

    #[test]
    fn test_rectangular_round_trip() {
        let p = MapProjection::Rectangular;
        for lon in (-179..=179).step_by(7) {
            for lat in (-89..=89).step_by(7) {
                let (lon, lat) = (lon as f64, lat as f64);
                let x = p.project_lon(lon, lat);
                let y = p.project_lat(lon, lat);
                assert!((p.unproject_lon(x, y) - lon).abs() < EPS);
                assert!((p.unproject_lat(x, y) - lat).abs() < EPS);
            }
        }
    }

    #[test]
    fn test_kavrayskiy_round_trip() {
        let p = MapProjection::KavrayskiyVII;
        for lon in (-179..=179).step_by(7) {
            for lat in (-89..=89).step_by(7) {
                let (lon, lat) = (lon as f64, lat as f64);
                let x = p.project_lon(lon, lat);
                let y = p.project_lat(lon, lat);
                assert!((p.unproject_lon(x, y) - lon).abs() < 1e-6);
                assert!((p.unproject_lat(x, y) - lat).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn test_kavrayskiy_compresses_polar_longitudes() {
        let p = MapProjection::KavrayskiyVII;
        let equator = p.project_lon(120.0, 0.0);
        let high = p.project_lon(120.0, 80.0);
        assert!(high.abs() < equator.abs());
    }

    #[test]
    fn test_polar_round_trip_interior() {
        // Points well inside a hemisphere disc survive the round trip.
        let p = MapProjection::Polar;
        for lon in (-150..=150).step_by(30) {
            for lat in [25.0, 45.0, 65.0, 85.0, -25.0, -45.0, -65.0] {
                let lon = lon as f64;
                let x = p.project_lon(lon, lat);
                let y = p.project_lat(lon, lat);
                let rlat = p.unproject_lat(x, y);
                assert!(
                    (rlat - lat).abs() < 1e-6,
                    "lat {} -> {} via ({}, {})",
                    lat,
                    rlat,
                    x,
                    y
                );
            }
        }
    }

    #[test]
    fn test_polar_nan_outside_disc() {
        // Map-local points beyond the hemisphere disc have no world
        // coordinate; the inverse must report NaN, not clamp.
        let p = MapProjection::Polar;
        let lat = p.unproject_lat(179.0, 85.0);
        assert!(lat.is_nan());
    }

    #[test]
    fn test_unproject_reflects_over_pole() {
        let p = MapProjection::Rectangular;
        assert!((p.unproject_lat(0.0, 100.0) - 80.0).abs() < EPS);
        assert!((p.unproject_lon(0.0, 100.0) - 180.0).abs() < 1e-6 || p.unproject_lon(0.0, 100.0) <= -180.0 + 1e-6);
        assert!((p.unproject_lat(0.0, -100.0) - (-80.0)).abs() < EPS);
    }
}
