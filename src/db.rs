//! The airport database.
//!
//! Owns the flat index (always memory-resident) and the geo-tile cache
//! (demand-loaded, radius-driven). All mutable state sits behind one
//! mutex; every public operation acquires it exactly once and the
//! internal helpers compose on `&mut DbState`, so `find_nearest` can load
//! tiles without re-entering the lock.
//!
//! Lifecycle: [`AirportDb::new`] wires empty structures without touching
//! the filesystem; [`AirportDb::recache`] either adopts a fresh disk
//! cache or rebuilds it from the scenery set; dropping the database
//! releases everything.

use std::collections::{btree_map, BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::airport::index::{ArptIndexEntry, FlatIndex};
use crate::airport::parser::{parse_apt_dat_file, ParserOpts};
use crate::airport::{cifp, geometry, Airport};
use crate::cache::{writer, CacheError, CacheSettings, DiskCache};
use crate::geo::{ecef_dist, GeoPos3};
use crate::scenery::{self, SceneryError};
use crate::tile::TileKey;

/// Default load radius: 8 nm in meters.
pub const DEFAULT_LOAD_RADIUS: f64 = 14_816.0;

/// Database errors. Bad scenery data never surfaces here; these are
/// environment failures (unreadable cache directory, missing install).
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("scenery discovery failed: {0}")]
    Scenery(#[from] SceneryError),
    #[error("cache error: {0}")]
    Cache(#[from] CacheError),
}

/// Database construction parameters.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// X-Plane installation root.
    pub install_dir: PathBuf,
    /// Cache directory, owned exclusively by this database.
    pub cache_dir: PathBuf,
    /// Discard airports without published instrument approaches.
    pub ifr_only: bool,
    /// Reduce ramp start names to their first plain alphanumeric token.
    pub normalize_gate_names: bool,
}

impl DbConfig {
    pub fn new(install_dir: impl Into<PathBuf>) -> Self {
        let cache_dir = dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("airportdb");
        Self {
            install_dir: install_dir.into(),
            cache_dir,
            ifr_only: false,
            normalize_gate_names: false,
        }
    }

    pub fn with_cache_dir(mut self, cache_dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = cache_dir.into();
        self
    }

    pub fn with_ifr_only(mut self, ifr_only: bool) -> Self {
        self.ifr_only = ifr_only;
        self
    }

    pub fn with_normalize_gate_names(mut self, normalize: bool) -> Self {
        self.normalize_gate_names = normalize;
        self
    }
}

/// One loaded 1°×1° tile and the airports whose reference point falls
/// inside it.
struct Tile {
    arpts: BTreeMap<String, Arc<Airport>>,
}

struct DbState {
    index: FlatIndex,
    tiles: HashMap<TileKey, Tile>,
    /// Master ident tree of every currently loaded airport.
    arpts: BTreeMap<String, Arc<Airport>>,
    load_radius: f64,
    airac_cycle: u32,
}

/// Disk-backed, in-memory spatial index of world airports.
pub struct AirportDb {
    cfg: DbConfig,
    cache: DiskCache,
    state: Mutex<DbState>,
}

impl AirportDb {
    /// Wire the empty structures. No I/O happens here.
    pub fn new(cfg: DbConfig) -> Self {
        let cache = DiskCache::new(cfg.cache_dir.clone());
        Self {
            cfg,
            cache,
            state: Mutex::new(DbState {
                index: FlatIndex::new(),
                tiles: HashMap::new(),
                arpts: BTreeMap::new(),
                load_radius: DEFAULT_LOAD_RADIUS,
                airac_cycle: 0,
            }),
        }
    }

    fn settings(&self) -> CacheSettings {
        CacheSettings {
            ifr_only: self.cfg.ifr_only,
            normalize_gate_names: self.cfg.normalize_gate_names,
        }
    }

    fn parser_opts(&self) -> ParserOpts {
        ParserOpts {
            normalize_gate_names: self.cfg.normalize_gate_names,
        }
    }

    /// The AIRAC cycle the database was opened against.
    pub fn airac_cycle(&self) -> u32 {
        self.state.lock().airac_cycle
    }

    /// Perform the freshness check and either load the sidecar index or
    /// run the full rebuild pipeline. Call once per database.
    pub fn recache(&self, app_version: u32) -> Result<(), DbError> {
        let apt_dats = scenery::discover_apt_dats(&self.cfg.install_dir)?;
        let airac_cycle = scenery::airac_cycle(&self.cfg.install_dir).unwrap_or(0);
        let mut state = self.state.lock();
        state.airac_cycle = airac_cycle;

        if self
            .cache
            .is_fresh(app_version, airac_cycle, &apt_dats, self.settings())
        {
            tracing::info!(cache = %self.cfg.cache_dir.display(), "airport cache fresh, loading index");
            state.index.clear();
            for entry in self.cache.read_index()? {
                state.index.insert(entry);
            }
            return Ok(());
        }

        tracing::info!(cache = %self.cfg.cache_dir.display(), "airport cache stale, rebuilding");
        self.rebuild(&mut state, app_version, airac_cycle, &apt_dats)
    }

    /// Full rebuild: wipe the cache, parse the scenery set in priority
    /// order, merge procedures, resolve geometry, serialise.
    fn rebuild(
        &self,
        state: &mut DbState,
        app_version: u32,
        airac_cycle: u32,
        apt_dats: &[PathBuf],
    ) -> Result<(), DbError> {
        Self::unload_all(state);
        state.index.clear();
        self.cache.wipe()?;

        let mut arpts: BTreeMap<String, Airport> = BTreeMap::new();
        let last = apt_dats.len().saturating_sub(1);
        for (file_i, path) in apt_dats.iter().enumerate() {
            let parsed = match parse_apt_dat_file(path, self.parser_opts()) {
                Ok(parsed) => parsed,
                Err(err) => {
                    tracing::warn!(path = %path.display(), %err, "unreadable apt.dat, skipped");
                    continue;
                }
            };
            tracing::debug!(path = %path.display(), airports = parsed.len(), "scenery parsed");
            for arpt in parsed {
                match arpts.entry(arpt.ident.clone()) {
                    btree_map::Entry::Vacant(slot) => {
                        slot.insert(arpt);
                    }
                    btree_map::Entry::Occupied(mut slot) => {
                        // The first file to define an airport wins the
                        // whole record. Only the stock global scenery
                        // (last in priority order) may back-fill meta
                        // fields the winner left empty.
                        if file_i == last {
                            fill_meta(slot.get_mut(), &arpt);
                        }
                    }
                }
            }
        }

        for arpt in arpts.values_mut() {
            cifp::enrich_airport(arpt, &self.cfg.install_dir);
        }
        if self.cfg.ifr_only {
            arpts.retain(|_, arpt| arpt.have_iaps);
        }
        for arpt in arpts.values_mut() {
            geometry::resolve_airport(arpt);
        }

        let mut by_tile: BTreeMap<TileKey, Vec<&Airport>> = BTreeMap::new();
        for arpt in arpts.values() {
            state.index.insert(ArptIndexEntry::from_airport(arpt));
            by_tile
                .entry(TileKey::from_pos(arpt.refpt.lat, arpt.refpt.lon))
                .or_default()
                .push(arpt);
        }
        for (key, tile_arpts) in &by_tile {
            writer::write_tile(&self.cache, *key, tile_arpts)?;
        }
        writer::write_index(&self.cache, &state.index)?;
        self.cache
            .write_tokens(app_version, airac_cycle, apt_dats, self.settings())?;

        tracing::info!(
            airports = arpts.len(),
            tiles = by_tile.len(),
            "airport cache rebuilt"
        );
        Ok(())
    }

    /// Look up an airport by its internal ident, demand-loading its tile.
    pub fn find_by_ident(&self, ident: &str) -> Option<Arc<Airport>> {
        let mut state = self.state.lock();
        let entry = Arc::clone(state.index.get(ident)?);
        let key = TileKey::from_pos(entry.lat as f64, entry.lon as f64);
        self.load_tile(&mut state, key);
        state.arpts.get(ident).cloned()
    }

    /// Invoke the callback for every index entry sharing the ICAO code;
    /// returns the match count. The callback runs under the database lock
    /// and must not call back into the database.
    pub fn find_by_icao(&self, icao: &str, mut f: impl FnMut(&ArptIndexEntry)) -> usize {
        let state = self.state.lock();
        let matches = state.index.icao_matches(icao);
        for entry in matches {
            f(entry);
        }
        matches.len()
    }

    /// Invoke the callback for every index entry sharing the IATA code;
    /// returns the match count.
    pub fn find_by_iata(&self, iata: &str, mut f: impl FnMut(&ArptIndexEntry)) -> usize {
        let state = self.state.lock();
        let matches = state.index.iata_matches(iata);
        for entry in matches {
            f(entry);
        }
        matches.len()
    }

    /// Enumerate every compact index record in ident order. The callback
    /// runs under the database lock and must not call back into the
    /// database.
    pub fn index_walk(&self, f: impl FnMut(&ArptIndexEntry)) {
        let state = self.state.lock();
        state.index.walk(f);
    }

    /// Number of airports in the flat index.
    pub fn index_len(&self) -> usize {
        self.state.lock().index.len()
    }

    /// Alter the load radius (default 14 816 m, about 8 nm).
    pub fn set_load_radius(&self, meters: f64) {
        assert!(meters.is_finite() && meters > 0.0, "invalid load radius");
        self.state.lock().load_radius = meters;
    }

    pub fn load_radius(&self) -> f64 {
        self.state.lock().load_radius
    }

    /// All loaded airports within the configured radius of `pos`
    /// (elevation in meters), demand-loading the 3×3 tile neighbourhood.
    ///
    /// Distances are straight-line ECEF against the airport reference
    /// point.
    pub fn find_nearest(&self, pos: GeoPos3) -> Vec<Arc<Airport>> {
        assert!(pos.pos2().is_valid(), "find_nearest at invalid position");
        let mut state = self.state.lock();
        let center = TileKey::from_pos(pos.lat, pos.lon);
        for dlat in -1..=1 {
            for dlon in -1..=1 {
                self.load_tile(&mut state, center.offset(dlat, dlon));
            }
        }
        let radius = state.load_radius;
        let mut out = Vec::new();
        for dlat in -1..=1 {
            for dlon in -1..=1 {
                let Some(tile) = state.tiles.get(&center.offset(dlat, dlon)) else {
                    continue;
                };
                for arpt in tile.arpts.values() {
                    if ecef_dist(arpt.refpt_m, pos) <= radius {
                        out.push(Arc::clone(arpt));
                    }
                }
            }
        }
        out
    }

    /// Load the 3×3 tile neighbourhood around a position.
    pub fn load_nearest(&self, pos: GeoPos3) {
        assert!(pos.pos2().is_valid(), "load_nearest at invalid position");
        let mut state = self.state.lock();
        let center = TileKey::from_pos(pos.lat, pos.lon);
        for dlat in -1..=1 {
            for dlon in -1..=1 {
                self.load_tile(&mut state, center.offset(dlat, dlon));
            }
        }
    }

    /// Evict every tile more than 1° from the position on either axis
    /// (longitude wrap aware). `None` evicts everything.
    pub fn unload_distant(&self, pos: Option<GeoPos3>) {
        let mut state = self.state.lock();
        match pos {
            Some(pos) => {
                assert!(pos.pos2().is_valid(), "unload_distant at invalid position");
                let center = TileKey::from_pos(pos.lat, pos.lon);
                let stale: Vec<TileKey> = state
                    .tiles
                    .keys()
                    .filter(|key| {
                        let (dlat, dlon) = key.delta(&center);
                        dlat > 1 || dlon > 1
                    })
                    .copied()
                    .collect();
                for key in stale {
                    Self::unload_tile(&mut state, key);
                }
            }
            None => Self::unload_all(&mut state),
        }
    }

    /// Number of tiles currently resident.
    pub fn loaded_tile_count(&self) -> usize {
        self.state.lock().tiles.len()
    }

    /// Read one tile from the disk cache and link its airports. Missing
    /// tile files are cached as empty tiles so repeated queries do not
    /// hit the filesystem again.
    fn load_tile(&self, state: &mut DbState, key: TileKey) {
        if state.tiles.contains_key(&key) {
            return;
        }
        let mut tile = Tile {
            arpts: BTreeMap::new(),
        };
        if let Some(arpts) = self.cache.read_tile(key, self.parser_opts()) {
            for mut arpt in arpts {
                if state.arpts.contains_key(&arpt.ident) {
                    continue;
                }
                geometry::resolve_airport(&mut arpt);
                arpt.geo_linked = true;
                let arpt = Arc::new(arpt);
                tile.arpts.insert(arpt.ident.clone(), Arc::clone(&arpt));
                state.arpts.insert(arpt.ident.clone(), arpt);
            }
            tracing::debug!(tile = %key, airports = tile.arpts.len(), "tile loaded");
        }
        state.tiles.insert(key, tile);
    }

    fn unload_tile(state: &mut DbState, key: TileKey) {
        if let Some(tile) = state.tiles.remove(&key) {
            for ident in tile.arpts.keys() {
                state.arpts.remove(ident);
            }
            tracing::debug!(tile = %key, "tile unloaded");
        }
    }

    fn unload_all(state: &mut DbState) {
        state.tiles.clear();
        state.arpts.clear();
    }
}

/// Back-fill empty meta fields from a lower-priority duplicate record.
fn fill_meta(dst: &mut Airport, src: &Airport) {
    if dst.iata.is_none() {
        dst.iata = src.iata.clone();
    }
    if dst.ta_ft == 0.0 && src.ta_ft > 0.0 {
        dst.set_ta_ft(src.ta_ft);
    }
    if dst.tl_ft == 0.0 && src.tl_ft > 0.0 {
        dst.set_tl_ft(src.tl_ft);
    }
    if dst.cc.is_none() {
        dst.cc = src.cc.clone();
    }
    if dst.country.is_none() {
        dst.country = src.country.clone();
    }
    if dst.city.is_none() {
        dst.city = src.city.clone();
    }
}
