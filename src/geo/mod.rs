//! Geodesy kernel: geographic positions, ECEF conversion, great-circle math.
//!
//! All distances are in meters unless a name says otherwise. Elevations in
//! the airport model are carried in feet with a parallel meters copy; the
//! conversion constants live here so every subsystem agrees on them.

pub mod fpp;

/// Mean Earth radius in meters, used by the spherical approximations
/// (flat-plane projection, haversine distance).
pub const EARTH_RADIUS: f64 = 6_371_000.0;

/// WGS-84 semi-major axis in meters.
const WGS84_A: f64 = 6_378_137.0;
/// WGS-84 first eccentricity squared.
const WGS84_E2: f64 = 6.694_379_990_141_316e-3;

/// Feet per meter.
pub const FEET_PER_METER: f64 = 3.280_839_895_013_123;

/// Convert meters to feet.
#[inline]
pub fn m2ft(m: f64) -> f64 {
    m * FEET_PER_METER
}

/// Convert feet to meters.
#[inline]
pub fn ft2m(ft: f64) -> f64 {
    ft / FEET_PER_METER
}

/// A 2-D geographic position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPos2 {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPos2 {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// True when both coordinates are finite and within range.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && self.lat.abs() <= 90.0
            && self.lon.abs() <= 180.0
    }
}

/// A 3-D geographic position in decimal degrees plus an elevation.
///
/// The elevation unit is the caller's contract: the airport model keeps a
/// feet-valued and a meters-valued copy of every position side by side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPos3 {
    pub lat: f64,
    pub lon: f64,
    pub elev: f64,
}

impl GeoPos3 {
    pub fn new(lat: f64, lon: f64, elev: f64) -> Self {
        Self { lat, lon, elev }
    }

    /// Drop the elevation component.
    pub fn pos2(&self) -> GeoPos2 {
        GeoPos2 {
            lat: self.lat,
            lon: self.lon,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.pos2().is_valid() && self.elev.is_finite()
    }
}

/// A vector in 3-space (ECEF frame, meters).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vect3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vect3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance to another point.
    pub fn dist(&self, other: &Vect3) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// Convert a geographic position (elevation in meters) to WGS-84 ECEF
/// coordinates.
pub fn geo2ecef(pos: GeoPos3) -> Vect3 {
    let lat = pos.lat.to_radians();
    let lon = pos.lon.to_radians();
    let sin_lat = lat.sin();
    let cos_lat = lat.cos();
    // Prime vertical radius of curvature.
    let n = WGS84_A / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();
    Vect3 {
        x: (n + pos.elev) * cos_lat * lon.cos(),
        y: (n + pos.elev) * cos_lat * lon.sin(),
        z: (n * (1.0 - WGS84_E2) + pos.elev) * sin_lat,
    }
}

/// Straight-line (chord) distance in meters between two geographic
/// positions, elevations in meters.
pub fn ecef_dist(a: GeoPos3, b: GeoPos3) -> f64 {
    geo2ecef(a).dist(&geo2ecef(b))
}

/// Great-circle distance in meters between two positions (haversine on the
/// mean sphere).
pub fn gc_distance(a: GeoPos2, b: GeoPos2) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();
    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS * h.sqrt().min(1.0).asin()
}
