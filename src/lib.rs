//! airportdb - Disk-backed, in-memory spatial index of world airports.
//!
//! Parses X-Plane-format `apt.dat` scenery in priority order, enriches
//! runway ends from ARINC 424 procedure data, precomputes per-airport
//! runway geometry, and maintains a compact on-disk cache keyed by 1°×1°
//! geo-tiles so subsequent startups skip the scenery scan entirely.
//!
//! # Quick start
//!
//! ```ignore
//! use airportdb::{AirportDb, DbConfig};
//! use airportdb::geo::GeoPos3;
//!
//! let db = AirportDb::new(DbConfig::new("/path/to/X-Plane 12"));
//! db.recache(APP_VERSION)?;
//!
//! if let Some(arpt) = db.find_by_ident("KJFK") {
//!     println!("{} is at {:?}", arpt.name, arpt.refpt);
//! }
//! for arpt in db.find_nearest(GeoPos3::new(40.64, -73.78, 4.0)) {
//!     println!("nearby: {}", arpt.ident);
//! }
//! ```

pub mod airport;
pub mod cache;
pub mod db;
pub mod geo;
pub mod logging;
pub mod scenery;
pub mod tile;

pub use airport::index::ArptIndexEntry;
pub use airport::Airport;
pub use db::{AirportDb, DbConfig, DbError, DEFAULT_LOAD_RADIUS};
pub use tile::TileKey;

/// Version of the airportdb library.
///
/// Defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_public_surface_reachable() {
        let key = TileKey::from_pos(40.6398, -73.7789);
        assert_eq!(key.to_string(), "+40-074");
        let db = AirportDb::new(DbConfig::new("/nonexistent"));
        assert_eq!(db.index_len(), 0);
    }
}
