//! Geo-tile key type.
//!
//! A [`TileKey`] identifies the 1°×1° cell that contains a geographic
//! position, keyed by the floor of latitude and longitude. On disk, tile
//! files live inside a 10°×10° supertile directory; both levels use the
//! same signed fixed-width name format (e.g. `+40-074` inside `+40-080`).

use std::fmt;

/// A 1°×1° tile coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileKey {
    /// Floor of the latitude (south edge of the tile).
    pub lat: i32,
    /// Floor of the longitude (west edge of the tile).
    pub lon: i32,
}

impl TileKey {
    /// Create a tile key from integer coordinates.
    pub fn new(lat: i32, lon: i32) -> Self {
        Self { lat, lon }
    }

    /// Create a tile key from floating-point lat/lon.
    ///
    /// NaN coordinates are a contract violation.
    pub fn from_pos(lat: f64, lon: f64) -> Self {
        assert!(
            lat.is_finite() && lon.is_finite(),
            "tile key from non-finite position"
        );
        Self {
            lat: lat.floor() as i32,
            lon: lon.floor() as i32,
        }
    }

    /// The 10°×10° supertile this tile belongs to (disk directory level).
    pub fn supertile(&self) -> TileKey {
        Self {
            lat: (self.lat as f64 / 10.0).floor() as i32 * 10,
            lon: (self.lon as f64 / 10.0).floor() as i32 * 10,
        }
    }

    /// Component-wise distance to another tile in whole degrees, with the
    /// longitude wrapped around the antimeridian.
    pub fn delta(&self, other: &TileKey) -> (i32, i32) {
        let dlat = (self.lat - other.lat).abs();
        let mut dlon = (self.lon - other.lon).abs();
        if dlon > 180 {
            dlon = 360 - dlon;
        }
        (dlat, dlon)
    }

    /// The tile `dlat`/`dlon` degrees away, longitude wrapped into
    /// [-180, 180).
    pub fn offset(&self, dlat: i32, dlon: i32) -> TileKey {
        let mut lon = self.lon + dlon;
        if lon < -180 {
            lon += 360;
        } else if lon >= 180 {
            lon -= 360;
        }
        Self {
            lat: self.lat + dlat,
            lon,
        }
    }
}

impl fmt::Display for TileKey {
    /// Format as a signed fixed-width tile name (e.g. `+40-074`, `-34+018`).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:+03}{:+04}", self.lat, self.lon)
    }
}
