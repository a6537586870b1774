//! Parser for X-Plane's apt.dat airport database format.
//!
//! The format is line-based text: line 1 is a byte-order marker, line 2 the
//! format version header, and every subsequent non-blank line begins with a
//! decimal row code. Row codes handled here:
//!
//! - `1` / `16` / `17` - airport / seaport / heliport header
//! - `100` - land runway, including the cache dialect's extended
//!   `GPA1:`/`TCH1:`/`TELEV1:`-style tokens
//! - `21` - VGSI fixture (PAPI/VASI), collected for glide path inference
//! - `1300` - ramp start
//! - `1302` - metadata key/value
//! - `50..56` / `1050..1056` - ATC frequencies (10 kHz / 1 kHz units)
//! - `99` - end of file
//!
//! Malformed lines are skipped with a warning; the parser never aborts on
//! bad scenery data. A missing reference point is back-filled from the
//! arithmetic midpoint of the first runway.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use crate::geo::{gc_distance, GeoPos2, GeoPos3};

use super::normalize::{normalize_gate_name, parse_transition_alt};
use super::{
    Airport, FreqType, Frequency, RampStart, RampType, Runway, RunwayEnd, VgsiFixture, VgsiType,
    MAX_IATA_LEN, MAX_ICAO_LEN, MAX_IDENT_LEN,
};

/// Minimum distance between the two thresholds for a runway to be usable.
const MIN_RWY_LEN: f64 = 10.0;
/// Ramp start names are capped at this many characters.
const MAX_RAMP_NAME_LEN: usize = 32;
/// Token count of a standard row-100 runway line.
const RWY_ROW_FIELDS: usize = 26;

/// Error type for apt.dat parsing. Malformed content is never an error,
/// only I/O failures are.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Parser policy knobs, mirrored from the database configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParserOpts {
    /// Reduce ramp start names to their first plain alphanumeric token.
    pub normalize_gate_names: bool,
}

/// Parse a whole apt.dat file from disk.
pub fn parse_apt_dat_file(path: &Path, opts: ParserOpts) -> Result<Vec<Airport>, ParseError> {
    let file = File::open(path)?;
    parse_apt_dat(file, opts)
}

/// Parse airports from an apt.dat reader (scenery or cache dialect).
pub fn parse_apt_dat<R: Read>(reader: R, opts: ParserOpts) -> Result<Vec<Airport>, ParseError> {
    let mut reader = BufReader::new(reader);
    let mut state = ParserState {
        version: 0,
        opts,
        current: None,
        out: Vec::new(),
    };
    let mut line_buf = String::new();
    let mut line_no = 0usize;

    loop {
        line_buf.clear();
        if reader.read_line(&mut line_buf)? == 0 {
            break;
        }
        line_no += 1;
        let line = line_buf.trim();

        // Line 1 is the byte-order marker, line 2 the version header.
        if line_no <= 2 {
            if line_no == 2 {
                state.version = line
                    .split_whitespace()
                    .next()
                    .and_then(|t| t.parse().ok())
                    .unwrap_or(0);
            }
            continue;
        }

        if line.is_empty() {
            state.finalize_current();
            continue;
        }

        let code: u32 = match line.split_whitespace().next().unwrap_or("").parse() {
            Ok(c) => c,
            Err(_) => continue,
        };

        match code {
            1 | 16 | 17 => {
                state.finalize_current();
                state.parse_header(line);
            }
            100 => state.parse_runway(line),
            21 => state.parse_vgsi(line),
            1300 => state.parse_ramp_start(line),
            1302 => state.parse_meta(line),
            50..=56 => state.parse_freq(line, code - 50, 10_000),
            1050..=1056 => state.parse_freq(line, code - 1050, 1_000),
            99 => {
                state.finalize_current();
                break;
            }
            _ => {}
        }
    }
    state.finalize_current();
    Ok(state.out)
}

struct ParserState {
    version: u32,
    opts: ParserOpts,
    current: Option<Airport>,
    out: Vec<Airport>,
}

impl ParserState {
    /// Begin a new airport from a row 1/16/17 header:
    /// `1 <elevation_ft> <deprecated> <deprecated> <ident> <name...>`.
    fn parse_header(&mut self, line: &str) {
        let t: Vec<&str> = line.split_whitespace().collect();
        if t.len() < 5 {
            tracing::warn!(line, "short airport header, skipping");
            return;
        }
        let elev: f64 = match t[1].parse() {
            Ok(v) => v,
            Err(_) => {
                tracing::warn!(line, "unparseable airport elevation, skipping");
                return;
            }
        };
        let ident = t[4];
        if ident.is_empty()
            || ident.len() > MAX_IDENT_LEN
            || !ident.chars().all(|c| c.is_ascii_alphanumeric())
        {
            tracing::warn!(ident, "bad airport ident, skipping");
            return;
        }
        let name = t.get(5..).map(|s| s.join(" ")).unwrap_or_default();
        // Reference point lat/lon stay unset until a datum meta row or the
        // first-runway fallback at finalization.
        self.current = Some(Airport::new(
            ident.to_uppercase(),
            name,
            GeoPos3::new(f64::NAN, f64::NAN, elev),
        ));
    }

    /// Parse a row-100 land runway. The cache dialect appends
    /// `GPA1:`/`GPA2:`/`TCH1:`/`TCH2:`/`TELEV1:`/`TELEV2:` tokens after
    /// the standard fields.
    fn parse_runway(&mut self, line: &str) {
        let Some(arpt) = self.current.as_mut() else {
            return;
        };
        let t: Vec<&str> = line.split_whitespace().collect();
        if t.len() < RWY_ROW_FIELDS {
            tracing::warn!(ident = %arpt.ident, line, "short runway row, dropped");
            return;
        }
        let (Ok(width), Ok(surface)) = (t[1].parse::<f64>(), t[2].parse::<u32>()) else {
            tracing::warn!(ident = %arpt.ident, line, "bad runway width/surface, dropped");
            return;
        };
        let elev = arpt.refpt.elev;
        let parse_end = |base: usize| -> Option<RunwayEnd> {
            let id = t[base];
            if id.is_empty() || id.len() > 4 {
                return None;
            }
            let lat: f64 = t[base + 1].parse().ok()?;
            let lon: f64 = t[base + 2].parse().ok()?;
            let displ: f64 = t[base + 3].parse().ok()?;
            let blast: f64 = t[base + 4].parse().ok()?;
            if !GeoPos2::new(lat, lon).is_valid() || displ < 0.0 || blast < 0.0 {
                return None;
            }
            Some(RunwayEnd::new(
                id.to_uppercase(),
                GeoPos3::new(lat, lon, elev),
                displ,
                blast,
            ))
        };
        let (Some(e0), Some(e1)) = (parse_end(8), parse_end(17)) else {
            tracing::warn!(ident = %arpt.ident, line, "bad runway end, dropped");
            return;
        };
        // Coincident or near-coincident thresholds give a NaN heading.
        if gc_distance(e0.thr.pos2(), e1.thr.pos2()) < MIN_RWY_LEN {
            tracing::warn!(ident = %arpt.ident, rwy = %format!("{}{}", e0.id, e1.id),
                "degenerate runway, dropped");
            return;
        }
        let mut rwy = Runway::new(width, surface, [e0, e1]);
        for tok in &t[RWY_ROW_FIELDS..] {
            let Some((key, val)) = tok.split_once(':') else {
                continue;
            };
            let Ok(val) = val.parse::<f64>() else {
                continue;
            };
            match key {
                "GPA1" if (0.0..10.0).contains(&val) => rwy.ends[0].gpa = val,
                "GPA2" if (0.0..10.0).contains(&val) => rwy.ends[1].gpa = val,
                "TCH1" if val > 0.0 && val < 200.0 => rwy.ends[0].tch = val,
                "TCH2" if val > 0.0 && val < 200.0 => rwy.ends[1].tch = val,
                "TELEV1" if val.is_finite() => rwy.ends[0].telev = val,
                "TELEV2" if val.is_finite() => rwy.ends[1].telev = val,
                _ => {}
            }
        }
        arpt.runways.push(rwy);
    }

    /// Collect a row-21 VGSI fixture:
    /// `21 <lat> <lon> <type> <heading> <angle> [<rwy>] [<description>]`.
    fn parse_vgsi(&mut self, line: &str) {
        let Some(arpt) = self.current.as_mut() else {
            return;
        };
        let t: Vec<&str> = line.split_whitespace().collect();
        if t.len() < 6 {
            return;
        }
        let (Ok(lat), Ok(lon), Ok(code), Ok(hdg), Ok(gpa)) = (
            t[1].parse::<f64>(),
            t[2].parse::<f64>(),
            t[3].parse::<u32>(),
            t[4].parse::<f64>(),
            t[5].parse::<f64>(),
        ) else {
            return;
        };
        // Wigwags and other non-glide-path fixtures are not usable here.
        let Some(vgsi_type) = VgsiType::from_code(code) else {
            return;
        };
        let pos = GeoPos2::new(lat, lon);
        if !pos.is_valid() || !hdg.is_finite() || !(0.0..10.0).contains(&gpa) || gpa == 0.0 {
            return;
        }
        arpt.vgsis.push(VgsiFixture {
            pos,
            vgsi_type,
            hdg: hdg.rem_euclid(360.0),
            gpa,
            rwy_id: t.get(6).map(|s| s.to_uppercase()),
        });
    }

    /// Parse a row-1300 ramp start:
    /// `1300 <lat> <lon> <heading> <type> <traffic> <name...>`.
    fn parse_ramp_start(&mut self, line: &str) {
        let Some(arpt) = self.current.as_mut() else {
            return;
        };
        let t: Vec<&str> = line.split_whitespace().collect();
        if t.len() < 7 {
            tracing::warn!(ident = %arpt.ident, line, "short ramp start row, dropped");
            return;
        }
        let (Ok(lat), Ok(lon), Ok(hdg)) = (
            t[1].parse::<f64>(),
            t[2].parse::<f64>(),
            t[3].parse::<f64>(),
        ) else {
            tracing::warn!(ident = %arpt.ident, line, "bad ramp start position, dropped");
            return;
        };
        let pos = GeoPos2::new(lat, lon);
        let Some(ramp_type) = RampType::from_token(t[4]) else {
            tracing::warn!(ident = %arpt.ident, kind = t[4], "unknown ramp start type, dropped");
            return;
        };
        if !pos.is_valid() || !hdg.is_finite() {
            return;
        }
        let raw_name = t[6..].join(" ");
        let mut name = if self.opts.normalize_gate_names {
            normalize_gate_name(&raw_name)
        } else {
            raw_name
        };
        if name.is_empty() {
            return;
        }
        if name.chars().count() > MAX_RAMP_NAME_LEN {
            name = name.chars().take(MAX_RAMP_NAME_LEN).collect();
        }
        arpt.ramp_starts.entry(name.clone()).or_insert(RampStart {
            name,
            pos,
            hdg: hdg.rem_euclid(360.0),
            ramp_type,
        });
    }

    /// Parse a row-1302 metadata key/value pair.
    fn parse_meta(&mut self, line: &str) {
        let Some(arpt) = self.current.as_mut() else {
            return;
        };
        let t: Vec<&str> = line.split_whitespace().collect();
        if t.len() < 2 {
            return;
        }
        let key = t[1];
        // Joining collapses runs of whitespace, which keeps the cache
        // emission byte-reproducible.
        let value = t.get(2..).map(|s| s.join(" ")).unwrap_or_default();
        if value.is_empty() {
            return;
        }
        match key {
            "icao_code" => {
                if value.len() <= MAX_ICAO_LEN && value.chars().all(|c| c.is_ascii_alphanumeric())
                {
                    arpt.icao = Some(value.to_uppercase());
                }
            }
            "iata_code" => {
                if value.len() <= MAX_IATA_LEN && value.chars().all(|c| c.is_ascii_alphabetic()) {
                    arpt.iata = Some(value.to_uppercase());
                }
            }
            "country" => {
                // v1200+ files lead with an ISO-3166 alpha-3 code.
                let first = value.split_whitespace().next().unwrap_or("");
                if self.version >= 1200
                    && first.len() == 3
                    && first.chars().all(|c| c.is_ascii_alphabetic())
                {
                    arpt.cc = Some(first.to_uppercase());
                    let rest = value[first.len()..].trim();
                    if !rest.is_empty() {
                        arpt.country = Some(rest.to_string());
                    }
                } else {
                    arpt.country = Some(value);
                }
            }
            "city" => arpt.city = Some(value),
            "name_orig" => arpt.name_orig = value,
            "region_code" => arpt.region_code = Some(value),
            "transition_alt" => {
                if let Some(ft) = parse_transition_alt(&value) {
                    arpt.set_ta_ft(ft);
                }
            }
            "transition_level" => {
                if let Some(ft) = parse_transition_alt(&value) {
                    arpt.set_tl_ft(ft);
                }
            }
            "datum_lat" => {
                if let Ok(lat) = value.parse::<f64>() {
                    if (-90.0..=90.0).contains(&lat) {
                        arpt.refpt.lat = lat;
                        arpt.refpt_m.lat = lat;
                    }
                }
            }
            "datum_lon" => {
                if let Ok(lon) = value.parse::<f64>() {
                    if (-180.0..=180.0).contains(&lon) {
                        arpt.refpt.lon = lon;
                        arpt.refpt_m.lon = lon;
                    }
                }
            }
            // Cache dialect only: round-trips the instrument approach flag
            // without re-running the procedure merger.
            "has_iaps" => arpt.have_iaps = value != "0",
            _ => {}
        }
    }

    /// Parse an ATC frequency row. `unit_hz` is 10 000 for the legacy
    /// 50..56 codes and 1 000 for the 8.33-capable 1050..1056 codes.
    fn parse_freq(&mut self, line: &str, offset: u32, unit_hz: u64) {
        let Some(arpt) = self.current.as_mut() else {
            return;
        };
        let Some(freq_type) = FreqType::from_row_offset(offset) else {
            return;
        };
        let t: Vec<&str> = line.split_whitespace().collect();
        if t.len() < 2 {
            return;
        }
        let Ok(raw) = t[1].parse::<u64>() else {
            tracing::warn!(ident = %arpt.ident, line, "bad frequency row, dropped");
            return;
        };
        // Name cleanup (own-ICAO strip) happens at finalization, once the
        // ICAO meta has definitely been seen.
        arpt.freqs.push(Frequency {
            freq_type,
            freq_hz: raw * unit_hz,
            name: t.get(2..).map(|s| s.join(" ")).unwrap_or_default(),
        });
    }

    /// Close out the airport under construction, back-filling the
    /// reference point and cleaning frequency names.
    fn finalize_current(&mut self) {
        let Some(mut arpt) = self.current.take() else {
            return;
        };
        if !arpt.refpt.pos2().is_valid() {
            if let Some(rwy) = arpt.runways.first() {
                let a = rwy.ends[0].thr;
                let b = rwy.ends[1].thr;
                // The midpoint is only meaningful for non-antipodal
                // thresholds; the parser already rejects degenerate
                // runways, antipodal ones cannot come from real scenery.
                debug_assert!(gc_distance(a.pos2(), b.pos2()) < 1.9e7);
                let elev = arpt.refpt.elev;
                arpt.set_refpt(GeoPos3::new(
                    (a.lat + b.lat) / 2.0,
                    (a.lon + b.lon) / 2.0,
                    elev,
                ));
            }
        }
        if !arpt.refpt.pos2().is_valid() {
            tracing::warn!(ident = %arpt.ident, "airport without reference point, skipped");
            return;
        }
        let icao = arpt.icao.clone();
        for freq in &mut arpt.freqs {
            freq.name = freq
                .name
                .split_whitespace()
                .filter(|tok| !tok.eq_ignore_ascii_case("FREQUENCY"))
                .filter(|tok| icao.as_deref().map_or(true, |ic| !tok.eq_ignore_ascii_case(ic)))
                .collect::<Vec<_>>()
                .join(" ");
        }
        self.out.push(arpt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Vec<Airport> {
        parse_apt_dat(text.as_bytes(), ParserOpts::default()).unwrap()
    }

    const KJFK: &str = "I\n1200 Generated by WorldEditor\n\n\
1 13 0 0 KJFK John F Kennedy Intl\n\
1302 icao_code KJFK\n\
1302 datum_lat 40.6398\n\
1302 datum_lon -73.7789\n\
100 45.72 1 0 0.25 0 2 1 04L 40.62201700 -73.78563000 0.0 0.0 2 0 0 1 22R 40.65087500 -73.76218200 0.0 0.0 2 0 0 1\n\
100 60.96 1 0 0.25 0 2 1 13R 40.64846600 -73.81674200 90.0 0.0 2 0 0 1 31L 40.62238800 -73.77040200 0.0 145.0 2 0 0 1\n\
1050 128950 ATIS\n\
1054 119100 KJFK TOWER FREQUENCY\n\
1300 40.64432 -73.78743 180.5 gate jets|turboprops Gate A21 - heavy\n\
99\n";

    #[test]
    fn test_parse_single_airport() {
        let arpts = parse(KJFK);
        assert_eq!(arpts.len(), 1);
        let a = &arpts[0];
        assert_eq!(a.ident, "KJFK");
        assert_eq!(a.icao.as_deref(), Some("KJFK"));
        assert_eq!(a.iata, None);
        assert_eq!(a.name, "JOHN F KENNEDY INTL");
        assert!((a.refpt.lat - 40.6398).abs() < 1e-9);
        assert!((a.refpt.lon - (-73.7789)).abs() < 1e-9);
        assert!((a.refpt.elev - 13.0).abs() < 1e-9);
        assert_eq!(a.runways.len(), 2);
        assert_eq!(a.freqs.len(), 2);
        assert_eq!(a.ramp_starts.len(), 1);
    }

    #[test]
    fn test_runway_fields() {
        let arpts = parse(KJFK);
        let rwy = &arpts[0].runways[1];
        assert_eq!(rwy.ends[0].id, "13R");
        assert_eq!(rwy.ends[1].id, "31L");
        assert!((rwy.width - 60.96).abs() < 1e-9);
        assert!((rwy.ends[0].displ - 90.0).abs() < 1e-9);
        assert!((rwy.ends[1].blast - 145.0).abs() < 1e-9);
        assert!(rwy.is_hard_surface());
    }

    #[test]
    fn test_frequency_units_and_name_cleanup() {
        let arpts = parse(KJFK);
        let freqs = &arpts[0].freqs;
        assert_eq!(freqs[0].freq_type, FreqType::Awos);
        assert_eq!(freqs[0].freq_hz, 128_950_000);
        assert_eq!(freqs[0].name, "ATIS");
        // Own ICAO and the word FREQUENCY are stripped.
        assert_eq!(freqs[1].freq_type, FreqType::Twr);
        assert_eq!(freqs[1].name, "TOWER");
        assert_eq!(freqs[1].freq_hz, 119_100_000);
    }

    #[test]
    fn test_legacy_frequency_units() {
        let text = "I\n1100 Version\n\n\
1 13 0 0 KTST Test\n\
1302 datum_lat 40.0\n1302 datum_lon -73.0\n\
54 11890 TWR\n99\n";
        let arpts = parse(text);
        assert_eq!(arpts[0].freqs[0].freq_hz, 118_900_000);
    }

    #[test]
    fn test_refpt_fallback_from_runway() {
        let text = "I\n1200 Version\n\n\
1 100 0 0 KTST No Datum\n\
100 45 1 0 0.25 0 0 0 09 40.00 -73.00 0 0 0 0 0 0 27 40.00 -72.99 0 0 0 0 0 0\n\
99\n";
        let arpts = parse(text);
        assert_eq!(arpts.len(), 1);
        assert!((arpts[0].refpt.lat - 40.0).abs() < 1e-9);
        assert!((arpts[0].refpt.lon - (-72.995)).abs() < 1e-9);
    }

    #[test]
    fn test_airport_without_position_skipped() {
        let text = "I\n1200 Version\n\n\
1 100 0 0 KTST No Position At All\n\
1302 city Nowhere\n\
99\n";
        assert!(parse(text).is_empty());
    }

    #[test]
    fn test_degenerate_runway_dropped() {
        let text = "I\n1200 Version\n\n\
1 100 0 0 KTST Test\n\
1302 datum_lat 40.0\n1302 datum_lon -73.0\n\
100 45 1 0 0.25 0 0 0 09 40.00 -73.00 0 0 0 0 0 0 27 40.00 -73.00 0 0 0 0 0 0\n\
99\n";
        let arpts = parse(text);
        assert_eq!(arpts.len(), 1);
        assert!(arpts[0].runways.is_empty());
    }

    #[test]
    fn test_extended_runway_tokens() {
        let text = "I\n1200 libacfutils airportdb version 21\n\n\
1 13 0 0 KTST Test\n\
1302 datum_lat 40.0\n1302 datum_lon -73.0\n\
100 45.00 1 0 0.25 0 0 0 09 40.00 -73.00 0 0 0 0 0 0 27 40.00 -72.99 0 0 0 0 0 0 GPA1:3.00 GPA2:2.80 TCH1:52.1 TCH2:48.0 TELEV1:11.0 TELEV2:14.0\n\
99\n";
        let arpts = parse(text);
        let rwy = &arpts[0].runways[0];
        assert_eq!(rwy.ends[0].gpa, 3.0);
        assert_eq!(rwy.ends[1].gpa, 2.8);
        assert_eq!(rwy.ends[0].tch, 52.1);
        assert_eq!(rwy.ends[1].tch, 48.0);
        assert_eq!(rwy.ends[0].telev, 11.0);
        assert_eq!(rwy.ends[1].telev, 14.0);
    }

    #[test]
    fn test_meta_country_v1200_alpha3() {
        let text = "I\n1200 Version\n\n\
1 13 0 0 KTST Test\n\
1302 datum_lat 40.0\n1302 datum_lon -73.0\n\
1302 country USA United States\n\
1302 city New York\n\
1302 region_code K6\n\
99\n";
        let a = &parse(text)[0];
        assert_eq!(a.cc.as_deref(), Some("USA"));
        assert_eq!(a.country.as_deref(), Some("United States"));
        assert_eq!(a.city.as_deref(), Some("New York"));
        assert_eq!(a.region_code.as_deref(), Some("K6"));
    }

    #[test]
    fn test_meta_country_legacy_free_text() {
        let text = "I\n1100 Version\n\n\
1 13 0 0 KTST Test\n\
1302 datum_lat 40.0\n1302 datum_lon -73.0\n\
1302 country USA United States\n\
99\n";
        let a = &parse(text)[0];
        assert_eq!(a.cc, None);
        assert_eq!(a.country.as_deref(), Some("USA United States"));
    }

    #[test]
    fn test_transition_alt_meta() {
        let text = "I\n1200 Version\n\n\
1 13 0 0 KTST Test\n\
1302 datum_lat 40.0\n1302 datum_lon -73.0\n\
1302 transition_alt 18000\n\
1302 transition_level FL 180\n\
99\n";
        let a = &parse(text)[0];
        assert_eq!(a.ta_ft, 18_000.0);
        assert_eq!(a.tl_ft, 18_000.0);
        assert!(a.ta_m > 0.0);
    }

    #[test]
    fn test_vgsi_collected() {
        let text = "I\n1200 Version\n\n\
1 13 0 0 KTST Test\n\
1302 datum_lat 40.0\n1302 datum_lon -73.0\n\
21 40.001 -72.997 2 90.00 3.00 09 PAPI-4L\n\
21 40.002 -72.996 6 90.00 0.00\n\
99\n";
        let a = &parse(text)[0];
        assert_eq!(a.vgsis.len(), 1);
        let v = &a.vgsis[0];
        assert_eq!(v.vgsi_type, VgsiType::Papi4L);
        assert_eq!(v.rwy_id.as_deref(), Some("09"));
        assert_eq!(v.gpa, 3.0);
    }

    #[test]
    fn test_gate_name_normalisation() {
        let text = "I\n1200 Version\n\n\
1 13 0 0 KTST Test\n\
1302 datum_lat 40.0\n1302 datum_lon -73.0\n\
1300 40.0 -73.0 90.0 gate jets Gate A21 - heavy\n\
99\n";
        let plain = parse_apt_dat(text.as_bytes(), ParserOpts::default()).unwrap();
        assert!(plain[0].ramp_starts.contains_key("Gate A21 - heavy"));
        let norm = parse_apt_dat(
            text.as_bytes(),
            ParserOpts {
                normalize_gate_names: true,
            },
        )
        .unwrap();
        assert!(norm[0].ramp_starts.contains_key("Gate"));
    }

    #[test]
    fn test_blank_line_finalises_airport() {
        let text = "I\n1200 Version\n\n\
1 13 0 0 KAAA First\n\
1302 datum_lat 40.0\n1302 datum_lon -73.0\n\
\n\
1 20 0 0 KBBB Second\n\
1302 datum_lat 41.0\n1302 datum_lon -74.0\n\
99\n";
        let arpts = parse(text);
        assert_eq!(arpts.len(), 2);
        assert_eq!(arpts[0].ident, "KAAA");
        assert_eq!(arpts[1].ident, "KBBB");
    }

    #[test]
    fn test_heliport_header() {
        let text = "I\n1200 Version\n\n\
17 120 0 0 KHEL Downtown Heliport\n\
1302 datum_lat 40.7\n1302 datum_lon -74.0\n\
99\n";
        let arpts = parse(text);
        assert_eq!(arpts.len(), 1);
        assert_eq!(arpts[0].ident, "KHEL");
        assert!(arpts[0].runways.is_empty());
    }

    #[test]
    fn test_malformed_lines_skipped() {
        let text = "I\n1200 Version\n\n\
1 13 0 0 KTST Test\n\
1302 datum_lat 40.0\n1302 datum_lon -73.0\n\
100 garbage\n\
1300 not a ramp\n\
1050 NaN ATIS\n\
bogus line with no code\n\
99\n";
        let arpts = parse(text);
        assert_eq!(arpts.len(), 1);
        assert!(arpts[0].runways.is_empty());
        assert!(arpts[0].ramp_starts.is_empty());
        assert!(arpts[0].freqs.is_empty());
    }
}
