//! Flat airport index.
//!
//! Compact per-airport records small enough to stay fully memory-resident
//! for the lifetime of the database, so ident/ICAO/IATA lookups never
//! touch the tile cache. The ident tree is unique; ICAO and IATA are
//! multimaps (shared codes are real: closed/reopened fields, seaplane
//! bases next to land airports).

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::geo::GeoPos3;

use super::Airport;

/// Placeholder for an absent string field in `index.dat`.
const ABSENT: &str = "-";

/// One compact index record.
#[derive(Debug, Clone, PartialEq)]
pub struct ArptIndexEntry {
    pub ident: String,
    pub icao: Option<String>,
    pub iata: Option<String>,
    pub cc: Option<String>,
    /// Reference point, 32-bit floats (lat, lon in degrees, elev feet).
    pub lat: f32,
    pub lon: f32,
    pub elev: f32,
    /// Longest hard-surface runway length in feet.
    pub max_rwy_len_ft: u16,
    /// Transition altitude in feet, 0 when unpublished.
    pub ta_ft: u16,
    /// Transition level in feet, 0 when unpublished.
    pub tl_ft: u16,
}

fn clamp_u16(v: f64) -> u16 {
    v.round().clamp(0.0, u16::MAX as f64) as u16
}

impl ArptIndexEntry {
    /// Build the compact record for an airport.
    pub fn from_airport(arpt: &Airport) -> Self {
        Self {
            ident: arpt.ident.clone(),
            icao: arpt.icao.clone(),
            iata: arpt.iata.clone(),
            cc: arpt.cc.clone(),
            lat: arpt.refpt.lat as f32,
            lon: arpt.refpt.lon as f32,
            elev: arpt.refpt.elev as f32,
            max_rwy_len_ft: clamp_u16(arpt.longest_hard_rwy_len_ft()),
            ta_ft: clamp_u16(arpt.ta_ft),
            tl_ft: clamp_u16(arpt.tl_ft),
        }
    }

    /// Reference point as a 3-D position (elevation feet).
    pub fn refpt(&self) -> GeoPos3 {
        GeoPos3::new(self.lat as f64, self.lon as f64, self.elev as f64)
    }

    /// Serialise to one `index.dat` line (ten tab-separated columns).
    pub fn to_line(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}\t{:.6}\t{:.6}\t{:.0}\t{}\t{}\t{}",
            self.ident,
            self.icao.as_deref().unwrap_or(ABSENT),
            self.iata.as_deref().unwrap_or(ABSENT),
            self.cc.as_deref().unwrap_or(ABSENT),
            self.lat,
            self.lon,
            self.elev,
            self.max_rwy_len_ft,
            self.ta_ft,
            self.tl_ft
        )
    }

    /// Parse one `index.dat` line; `None` for malformed input.
    pub fn parse_line(line: &str) -> Option<Self> {
        let f: Vec<&str> = line.split('\t').collect();
        if f.len() != 10 {
            return None;
        }
        let opt = |s: &str| {
            if s == ABSENT {
                None
            } else {
                Some(s.to_string())
            }
        };
        Some(Self {
            ident: f[0].to_string(),
            icao: opt(f[1]),
            iata: opt(f[2]),
            cc: opt(f[3]),
            lat: f[4].parse().ok()?,
            lon: f[5].parse().ok()?,
            elev: f[6].parse().ok()?,
            max_rwy_len_ft: f[7].parse().ok()?,
            ta_ft: f[8].parse().ok()?,
            tl_ft: f[9].parse().ok()?,
        })
    }
}

/// The three lookup structures over the same shared records.
#[derive(Debug, Default)]
pub struct FlatIndex {
    by_ident: BTreeMap<String, Arc<ArptIndexEntry>>,
    by_icao: HashMap<String, Vec<Arc<ArptIndexEntry>>>,
    by_iata: HashMap<String, Vec<Arc<ArptIndexEntry>>>,
}

impl FlatIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.by_ident.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_ident.is_empty()
    }

    pub fn clear(&mut self) {
        self.by_ident.clear();
        self.by_icao.clear();
        self.by_iata.clear();
    }

    /// Insert a record. The first record for an ident wins; a duplicate
    /// ident is dropped (the database deduplicates upstream, this is the
    /// backstop that keeps the ident tree and the multimaps agreeing).
    pub fn insert(&mut self, entry: ArptIndexEntry) {
        if self.by_ident.contains_key(&entry.ident) {
            return;
        }
        let entry = Arc::new(entry);
        if let Some(icao) = &entry.icao {
            self.by_icao
                .entry(icao.clone())
                .or_default()
                .push(Arc::clone(&entry));
        }
        if let Some(iata) = &entry.iata {
            self.by_iata
                .entry(iata.clone())
                .or_default()
                .push(Arc::clone(&entry));
        }
        self.by_ident.insert(entry.ident.clone(), entry);
    }

    /// Unique lookup by ident.
    pub fn get(&self, ident: &str) -> Option<&Arc<ArptIndexEntry>> {
        self.by_ident.get(ident)
    }

    /// All records sharing an ICAO code (unordered).
    pub fn icao_matches(&self, icao: &str) -> &[Arc<ArptIndexEntry>] {
        self.by_icao.get(icao).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All records sharing an IATA code (unordered).
    pub fn iata_matches(&self, iata: &str) -> &[Arc<ArptIndexEntry>] {
        self.by_iata.get(iata).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Enumerate every record in ident order.
    pub fn walk(&self, mut f: impl FnMut(&ArptIndexEntry)) {
        for entry in self.by_ident.values() {
            f(entry);
        }
    }
}
