//! Airport data model.
//!
//! An [`Airport`] is identified by its internal `ident` (up to 7 upper-case
//! ASCII characters, unique within the database) and owns its runways, ramp
//! starts and frequencies. Derived geometry (threshold vectors, bounding
//! boxes, approach funnels) is attached on load by the geometry resolver;
//! until then the `geom` fields are `None` and `load_complete` is false.

pub mod cifp;
pub mod geometry;
pub mod index;
pub mod normalize;
pub mod parser;

use std::collections::BTreeMap;

use crate::geo::fpp::{Fpp, Vect2};
use crate::geo::{gc_distance, m2ft, GeoPos2, GeoPos3};

/// Maximum ident length (primary key of the database).
pub const MAX_IDENT_LEN: usize = 7;
/// Maximum ICAO code length.
pub const MAX_ICAO_LEN: usize = 7;
/// Maximum IATA code length.
pub const MAX_IATA_LEN: usize = 3;
/// Default threshold crossing height in feet when neither the scenery nor
/// a VGSI inference provided one.
pub const DEFAULT_TCH: f64 = 50.0;

/// One end of a runway ("09", "27L", ...).
#[derive(Debug, Clone, PartialEq)]
pub struct RunwayEnd {
    /// Three- or four-character runway identifier.
    pub id: String,
    /// Threshold position, elevation in feet.
    pub thr: GeoPos3,
    /// Threshold position, elevation in meters.
    pub thr_m: GeoPos3,
    /// Displaced threshold distance in meters.
    pub displ: f64,
    /// Blastpad/stopway length in meters.
    pub blast: f64,
    /// Glide path angle in degrees.
    pub gpa: f64,
    /// Threshold crossing height in feet.
    pub tch: f64,
    /// Threshold elevation in feet.
    pub telev: f64,
    /// Derived on load.
    pub geom: Option<RunwayEndGeom>,
}

/// Geometry derived for a runway end in the airport's local frame.
#[derive(Debug, Clone, PartialEq)]
pub struct RunwayEndGeom {
    /// Threshold vector.
    pub thr_v: Vect2,
    /// Displaced threshold vector.
    pub dthr_v: Vect2,
    /// True heading from this end toward the opposite end, degrees.
    pub hdg: f64,
    /// Landing length in meters (this threshold to the far displaced
    /// threshold).
    pub land_len: f64,
    /// Approach proximity polygon, 4 to 6 vertices, counter-clockwise.
    pub apch_bbox: Vec<Vect2>,
}

impl RunwayEnd {
    pub fn new(id: impl Into<String>, thr: GeoPos3, displ: f64, blast: f64) -> Self {
        let thr = GeoPos3::new(thr.lat, thr.lon, thr.elev);
        Self {
            id: id.into(),
            thr_m: GeoPos3::new(thr.lat, thr.lon, crate::geo::ft2m(thr.elev)),
            telev: thr.elev,
            thr,
            displ,
            blast,
            gpa: 0.0,
            tch: DEFAULT_TCH,
            geom: None,
        }
    }

    /// Numeric part of the runway designator ("27L" -> 27).
    pub fn number(&self) -> Option<u32> {
        let digits: String = self.id.chars().take_while(|c| c.is_ascii_digit()).collect();
        digits.parse().ok()
    }

    /// Suffix of the designator ("27L" -> Some('L')).
    pub fn suffix(&self) -> Option<char> {
        self.id.chars().find(|c| c.is_ascii_alphabetic())
    }
}

/// A runway: two ends, a width and a surface code.
#[derive(Debug, Clone, PartialEq)]
pub struct Runway {
    /// Width in meters.
    pub width: f64,
    /// apt.dat surface type code.
    pub surface: u32,
    /// The two runway ends, index 0 and 1.
    pub ends: [RunwayEnd; 2],
    /// Derived on load.
    pub geom: Option<RunwayGeom>,
}

/// Geometry derived for a runway in the airport's local frame.
#[derive(Debug, Clone, PartialEq)]
pub struct RunwayGeom {
    /// Length between the two thresholds in meters.
    pub length: f64,
    /// Rectangle between the two displaced thresholds, runway width.
    pub rwy_bbox: [Vect2; 4],
    /// Rectangle between the two unshifted thresholds, runway width.
    pub tora_bbox: [Vect2; 4],
    /// The tora box extended by the blastpad at each end.
    pub asda_bbox: [Vect2; 4],
    /// Triple-width box extended past each displaced threshold.
    pub prox_bbox: [Vect2; 4],
}

impl Runway {
    pub fn new(width: f64, surface: u32, ends: [RunwayEnd; 2]) -> Self {
        Self {
            width,
            surface,
            ends,
            geom: None,
        }
    }

    /// The joint identifier `"<id0><id1>"`.
    pub fn joint_id(&self) -> String {
        format!("{}{}", self.ends[0].id, self.ends[1].id)
    }

    /// Joint-id equality treats either end ordering as equal.
    pub fn matches_joint_id(&self, joint: &str) -> bool {
        joint == self.joint_id() || joint == format!("{}{}", self.ends[1].id, self.ends[0].id)
    }

    /// Great-circle length between the two thresholds in meters. Used
    /// before geometry resolution; afterwards `geom.length` is exact in
    /// the local frame.
    pub fn approx_length(&self) -> f64 {
        gc_distance(self.ends[0].thr.pos2(), self.ends[1].thr.pos2())
    }

    /// Whether the surface is hard (asphalt/concrete, classic codes 1 and
    /// 2 plus the XP12 material variants 20..=38).
    pub fn is_hard_surface(&self) -> bool {
        matches!(self.surface, 1 | 2 | 20..=38)
    }
}

/// Ramp start location type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RampType {
    Gate,
    Hangar,
    TieDown,
    Misc,
}

impl RampType {
    /// Parse the apt.dat location type token.
    pub fn from_token(tok: &str) -> Option<Self> {
        match tok {
            "gate" => Some(Self::Gate),
            "hangar" => Some(Self::Hangar),
            "tie_down" | "tie-down" => Some(Self::TieDown),
            "misc" => Some(Self::Misc),
            _ => None,
        }
    }

    pub fn token(&self) -> &'static str {
        match self {
            Self::Gate => "gate",
            Self::Hangar => "hangar",
            Self::TieDown => "tie_down",
            Self::Misc => "misc",
        }
    }
}

/// A parking or starting location.
#[derive(Debug, Clone, PartialEq)]
pub struct RampStart {
    pub name: String,
    pub pos: GeoPos2,
    /// True heading in degrees.
    pub hdg: f64,
    pub ramp_type: RampType,
}

/// ATC frequency type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FreqType {
    Awos,
    Ctaf,
    Clnc,
    Gnd,
    Twr,
    App,
    Dep,
}

impl FreqType {
    /// Offset from the base row code (50 or 1050).
    pub fn from_row_offset(off: u32) -> Option<Self> {
        match off {
            0 => Some(Self::Awos),
            1 => Some(Self::Ctaf),
            2 => Some(Self::Clnc),
            3 => Some(Self::Gnd),
            4 => Some(Self::Twr),
            5 => Some(Self::App),
            6 => Some(Self::Dep),
            _ => None,
        }
    }

    pub fn row_offset(&self) -> u32 {
        match self {
            Self::Awos => 0,
            Self::Ctaf => 1,
            Self::Clnc => 2,
            Self::Gnd => 3,
            Self::Twr => 4,
            Self::App => 5,
            Self::Dep => 6,
        }
    }
}

/// An ATC frequency attached to an airport.
#[derive(Debug, Clone, PartialEq)]
pub struct Frequency {
    pub freq_type: FreqType,
    /// Frequency in Hz.
    pub freq_hz: u64,
    /// Human-readable name, with the airport's own ICAO and the word
    /// "FREQUENCY" stripped.
    pub name: String,
}

/// Visual glide slope indicator type (apt.dat row 21).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VgsiType {
    Vasi,
    Papi4L,
    Papi4R,
}

impl VgsiType {
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            1 => Some(Self::Vasi),
            2 => Some(Self::Papi4L),
            3 => Some(Self::Papi4R),
            _ => None,
        }
    }
}

/// A VGSI fixture collected during parsing, consumed by the geometry
/// resolver's GPA/TCH inference.
#[derive(Debug, Clone, PartialEq)]
pub struct VgsiFixture {
    pub pos: GeoPos2,
    pub vgsi_type: VgsiType,
    /// Stated true heading in degrees.
    pub hdg: f64,
    /// Stated glide path angle in degrees.
    pub gpa: f64,
    /// Explicit runway end tag when the record carries one.
    pub rwy_id: Option<String>,
}

/// A world airport.
#[derive(Debug, Clone)]
pub struct Airport {
    /// Internal identifier, the sole primary key.
    pub ident: String,
    pub icao: Option<String>,
    pub iata: Option<String>,
    /// Country code (ISO-3166 alpha-3 in v1200+ scenery).
    pub cc: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    /// Normalised ASCII-transliterated display name.
    pub name: String,
    /// Original-form display name.
    pub name_orig: String,
    pub region_code: Option<String>,
    /// Reference point, elevation in feet.
    pub refpt: GeoPos3,
    /// Reference point, elevation in meters.
    pub refpt_m: GeoPos3,
    /// Transition altitude in feet (0 when unpublished).
    pub ta_ft: f64,
    /// Transition altitude in meters.
    pub ta_m: f64,
    /// Transition level in feet (0 when unpublished).
    pub tl_ft: f64,
    /// Transition level in meters.
    pub tl_m: f64,
    /// Whether the airport has published instrument approaches.
    pub have_iaps: bool,
    pub runways: Vec<Runway>,
    /// Ramp starts keyed by name.
    pub ramp_starts: BTreeMap<String, RampStart>,
    /// Frequencies in file order.
    pub freqs: Vec<Frequency>,
    /// Local flat-plane projection, set by the geometry resolver.
    pub fpp: Option<Fpp>,
    /// Present in the geo-tile cache.
    pub geo_linked: bool,
    /// Derived geometry built for every runway.
    pub load_complete: bool,
    /// VGSI fixtures awaiting geometry resolution (scenery parse only;
    /// the cache dialect bakes the inference into the runway rows).
    pub(crate) vgsis: Vec<VgsiFixture>,
}

impl Airport {
    /// Create a bare airport at a known reference point (elevation feet).
    pub fn new(ident: impl Into<String>, name_orig: impl Into<String>, refpt: GeoPos3) -> Self {
        let name_orig = name_orig.into();
        Self {
            ident: ident.into(),
            icao: None,
            iata: None,
            cc: None,
            country: None,
            city: None,
            name: normalize::normalize_name(&name_orig),
            name_orig,
            region_code: None,
            refpt_m: GeoPos3::new(refpt.lat, refpt.lon, crate::geo::ft2m(refpt.elev)),
            refpt,
            ta_ft: 0.0,
            ta_m: 0.0,
            tl_ft: 0.0,
            tl_m: 0.0,
            have_iaps: false,
            runways: Vec::new(),
            ramp_starts: BTreeMap::new(),
            freqs: Vec::new(),
            fpp: None,
            geo_linked: false,
            load_complete: false,
            vgsis: Vec::new(),
        }
    }

    /// Update both the feet and meters copies of the reference point.
    pub fn set_refpt(&mut self, refpt: GeoPos3) {
        self.refpt = refpt;
        self.refpt_m = GeoPos3::new(refpt.lat, refpt.lon, crate::geo::ft2m(refpt.elev));
    }

    /// Set TA from a feet value, maintaining the meters copy.
    pub fn set_ta_ft(&mut self, ft: f64) {
        self.ta_ft = ft;
        self.ta_m = crate::geo::ft2m(ft);
    }

    /// Set TL from a feet value, maintaining the meters copy.
    pub fn set_tl_ft(&mut self, ft: f64) {
        self.tl_ft = ft;
        self.tl_m = crate::geo::ft2m(ft);
    }

    /// Find a runway by joint id, accepting either end ordering.
    pub fn find_runway(&self, joint_id: &str) -> Option<&Runway> {
        self.runways.iter().find(|r| r.matches_joint_id(joint_id))
    }

    /// Find a runway end by its designator.
    pub fn find_runway_end(&self, id: &str) -> Option<&RunwayEnd> {
        self.runways
            .iter()
            .flat_map(|r| r.ends.iter())
            .find(|e| e.id == id)
    }

    /// Mutable variant of [`Airport::find_runway_end`].
    pub fn find_runway_end_mut(&mut self, id: &str) -> Option<&mut RunwayEnd> {
        self.runways
            .iter_mut()
            .flat_map(|r| r.ends.iter_mut())
            .find(|e| e.id == id)
    }

    /// Length of the longest hard-surface runway in feet, 0 when none.
    pub fn longest_hard_rwy_len_ft(&self) -> f64 {
        self.runways
            .iter()
            .filter(|r| r.is_hard_surface())
            .map(|r| m2ft(r.approx_length()))
            .fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_end(id: &str, lat: f64, lon: f64) -> RunwayEnd {
        RunwayEnd::new(id, GeoPos3::new(lat, lon, 13.0), 0.0, 0.0)
    }

    #[test]
    fn test_runway_end_defaults() {
        let end = test_end("09", 40.0, -73.0);
        assert_eq!(end.tch, DEFAULT_TCH);
        assert_eq!(end.gpa, 0.0);
        assert_eq!(end.telev, 13.0);
        assert!(end.geom.is_none());
    }

    #[test]
    fn test_runway_end_designator_parts() {
        let end = test_end("27L", 40.0, -73.0);
        assert_eq!(end.number(), Some(27));
        assert_eq!(end.suffix(), Some('L'));
        let plain = test_end("04", 40.0, -73.0);
        assert_eq!(plain.number(), Some(4));
        assert_eq!(plain.suffix(), None);
    }

    #[test]
    fn test_joint_id_either_order() {
        let rwy = Runway::new(
            45.0,
            1,
            [test_end("09", 40.0, -73.0), test_end("27", 40.0, -72.99)],
        );
        assert_eq!(rwy.joint_id(), "0927");
        assert!(rwy.matches_joint_id("0927"));
        assert!(rwy.matches_joint_id("2709"));
        assert!(!rwy.matches_joint_id("0926"));
    }

    #[test]
    fn test_hard_surface_codes() {
        let mk = |surf| {
            Runway::new(
                45.0,
                surf,
                [test_end("09", 40.0, -73.0), test_end("27", 40.0, -72.99)],
            )
        };
        assert!(mk(1).is_hard_surface());
        assert!(mk(2).is_hard_surface());
        assert!(mk(20).is_hard_surface());
        assert!(mk(38).is_hard_surface());
        assert!(!mk(3).is_hard_surface());
        assert!(!mk(13).is_hard_surface());
    }

    #[test]
    fn test_airport_parallel_unit_copies() {
        let mut arpt = Airport::new("KJFK", "John F Kennedy Intl", GeoPos3::new(40.64, -73.78, 13.0));
        assert!((arpt.refpt_m.elev - crate::geo::ft2m(13.0)).abs() < 1e-9);
        arpt.set_ta_ft(18_000.0);
        assert!((arpt.ta_m - 5_486.4).abs() < 0.1);
    }

    #[test]
    fn test_find_runway_end() {
        let mut arpt = Airport::new("KTST", "Test", GeoPos3::new(40.0, -73.0, 0.0));
        arpt.runways.push(Runway::new(
            45.0,
            1,
            [test_end("09", 40.0, -73.0), test_end("27", 40.0, -72.99)],
        ));
        assert!(arpt.find_runway_end("27").is_some());
        assert!(arpt.find_runway_end("18").is_none());
        arpt.find_runway_end_mut("09").unwrap().gpa = 3.0;
        assert_eq!(arpt.runways[0].ends[0].gpa, 3.0);
    }

    #[test]
    fn test_longest_hard_rwy() {
        let mut arpt = Airport::new("KTST", "Test", GeoPos3::new(40.0, -73.0, 0.0));
        // ~850 m hard runway.
        arpt.runways.push(Runway::new(
            45.0,
            1,
            [test_end("09", 40.0, -73.0), test_end("27", 40.0, -72.99)],
        ));
        // Longer, but grass.
        arpt.runways.push(Runway::new(
            30.0,
            3,
            [test_end("18", 40.0, -73.0), test_end("36", 40.02, -73.0)],
        ));
        let len = arpt.longest_hard_rwy_len_ft();
        assert!((len - 2_790.0).abs() < 30.0, "length {}", len);
    }

    #[test]
    fn test_ramp_type_tokens() {
        assert_eq!(RampType::from_token("gate"), Some(RampType::Gate));
        assert_eq!(RampType::from_token("tie_down"), Some(RampType::TieDown));
        assert_eq!(RampType::from_token("tie-down"), Some(RampType::TieDown));
        assert_eq!(RampType::from_token("lawn"), None);
        assert_eq!(RampType::TieDown.token(), "tie_down");
    }

    #[test]
    fn test_freq_type_offsets() {
        for off in 0..7 {
            let ft = FreqType::from_row_offset(off).unwrap();
            assert_eq!(ft.row_offset(), off);
        }
        assert_eq!(FreqType::from_row_offset(7), None);
    }
}
