//! Cache serialisation: per-tile emitter and sidecar index writer.
//!
//! Tile files are a strict subset of the apt.dat input grammar, emitted
//! with fixed numeric formatting and deterministic ordering so that a
//! rebuild over unchanged inputs is byte-identical, and so that parsing a
//! tile and re-emitting it reproduces the file exactly. Runway rows always
//! carry the six extended GPA/TCH/TELEV tokens and frequencies always use
//! the 1 kHz row codes, which lets a reload skip the procedure merger and
//! the VGSI inference entirely.

use std::fmt::Write as _;
use std::fs;
use std::io;

use crate::airport::index::FlatIndex;
use crate::airport::Airport;
use crate::tile::TileKey;

use super::DiskCache;

/// Every tile file opens with this exact header.
pub const TILE_HEADER: &str = "I\n1200 libacfutils airportdb version 21\n\n";

/// Transition altitudes below this are garbage data and are not
/// serialised (the parse ladder would reinterpret them as flight levels).
const MIN_SERIALIZED_TA: f64 = 600.0;

/// Write one tile file. Airports must be pre-sorted (the database hands
/// them over in ident order).
pub fn write_tile(cache: &DiskCache, key: TileKey, arpts: &[&Airport]) -> io::Result<()> {
    let path = cache.tile_path(key);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut out = String::with_capacity(4096);
    out.push_str(TILE_HEADER);
    for arpt in arpts {
        write_airport(&mut out, arpt);
    }
    fs::write(path, out)
}

/// Write the sidecar index, one record per airport in ident order.
pub fn write_index(cache: &DiskCache, index: &FlatIndex) -> io::Result<()> {
    let mut out = String::new();
    index.walk(|entry| {
        out.push_str(&entry.to_line());
        out.push('\n');
    });
    fs::write(cache.index_path(), out)
}

fn write_airport(out: &mut String, arpt: &Airport) {
    if arpt.name.is_empty() {
        let _ = writeln!(out, "1 {:.0} 0 0 {}", arpt.refpt.elev, arpt.ident);
    } else {
        let _ = writeln!(
            out,
            "1 {:.0} 0 0 {} {}",
            arpt.refpt.elev, arpt.ident, arpt.name
        );
    }

    if let Some(icao) = &arpt.icao {
        let _ = writeln!(out, "1302 icao_code {}", icao);
    }
    if let Some(iata) = &arpt.iata {
        let _ = writeln!(out, "1302 iata_code {}", iata);
    }
    match (&arpt.cc, &arpt.country) {
        (Some(cc), Some(country)) => {
            let _ = writeln!(out, "1302 country {} {}", cc, country);
        }
        (Some(cc), None) => {
            let _ = writeln!(out, "1302 country {}", cc);
        }
        (None, Some(country)) => {
            let _ = writeln!(out, "1302 country {}", country);
        }
        (None, None) => {}
    }
    if let Some(city) = &arpt.city {
        let _ = writeln!(out, "1302 city {}", city);
    }
    if !arpt.name_orig.is_empty() {
        let _ = writeln!(out, "1302 name_orig {}", arpt.name_orig);
    }
    if let Some(region) = &arpt.region_code {
        let _ = writeln!(out, "1302 region_code {}", region);
    }
    if arpt.ta_ft >= MIN_SERIALIZED_TA {
        let _ = writeln!(out, "1302 transition_alt {:.0}", arpt.ta_ft);
    }
    if arpt.tl_ft >= MIN_SERIALIZED_TA {
        let _ = writeln!(out, "1302 transition_level {:.0}", arpt.tl_ft);
    }
    let _ = writeln!(out, "1302 datum_lat {:.8}", arpt.refpt.lat);
    let _ = writeln!(out, "1302 datum_lon {:.8}", arpt.refpt.lon);
    if arpt.have_iaps {
        let _ = writeln!(out, "1302 has_iaps 1");
    }

    for rwy in &arpt.runways {
        let e = &rwy.ends;
        let _ = writeln!(
            out,
            "100 {:.2} {} 0 0.25 0 0 0 \
{} {:.8} {:.8} {:.1} {:.1} 0 0 0 0 \
{} {:.8} {:.8} {:.1} {:.1} 0 0 0 0 \
GPA1:{:.2} GPA2:{:.2} TCH1:{:.1} TCH2:{:.1} TELEV1:{:.1} TELEV2:{:.1}",
            rwy.width,
            rwy.surface,
            e[0].id,
            e[0].thr.lat,
            e[0].thr.lon,
            e[0].displ,
            e[0].blast,
            e[1].id,
            e[1].thr.lat,
            e[1].thr.lon,
            e[1].displ,
            e[1].blast,
            e[0].gpa,
            e[1].gpa,
            e[0].tch,
            e[1].tch,
            e[0].telev,
            e[1].telev
        );
    }

    for ramp in arpt.ramp_starts.values() {
        let _ = writeln!(
            out,
            "1300 {:.8} {:.8} {:.2} {} all {}",
            ramp.pos.lat,
            ramp.pos.lon,
            ramp.hdg,
            ramp.ramp_type.token(),
            ramp.name
        );
    }

    for freq in &arpt.freqs {
        let code = 1050 + freq.freq_type.row_offset();
        let khz = freq.freq_hz / 1000;
        if freq.name.is_empty() {
            let _ = writeln!(out, "{} {}", code, khz);
        } else {
            let _ = writeln!(out, "{} {} {}", code, khz, freq.name);
        }
    }

    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::airport::parser::{parse_apt_dat, ParserOpts};
    use crate::geo::GeoPos2;
    use tempfile::TempDir;

    const SCENERY: &str = "I\n1200 Generated by WorldEditor\n\n\
1 13 0 0 KJFK John F Kennedy Intl\n\
1302 icao_code KJFK\n\
1302 iata_code JFK\n\
1302 country USA United States\n\
1302 city New York\n\
1302 name_orig John F Kennedy Intl\n\
1302 transition_alt 18000\n\
1302 datum_lat 40.6398\n\
1302 datum_lon -73.7789\n\
100 60.96 1 0 0.25 0 2 1 13R 40.64846600 -73.81674200 90.0 0.0 2 0 0 1 31L 40.62238800 -73.77040200 0.0 145.0 2 0 0 1\n\
54 11910 KJFK TWR\n\
1300 40.64432000 -73.78743000 180.50 gate jets Alpha 21\n\
99\n";

    fn parsed_airport() -> Airport {
        let mut arpts = parse_apt_dat(SCENERY.as_bytes(), ParserOpts::default()).unwrap();
        arpts.remove(0)
    }

    fn emit(arpt: &Airport) -> String {
        let mut out = String::new();
        out.push_str(TILE_HEADER);
        write_airport(&mut out, arpt);
        out
    }

    #[test]
    fn test_tile_header_exact() {
        let text = emit(&parsed_airport());
        assert!(text.starts_with("I\n1200 libacfutils airportdb version 21\n\n"));
    }

    #[test]
    fn test_legacy_frequency_emitted_as_1050_form() {
        let text = emit(&parsed_airport());
        // 118.90 legacy 10 kHz row becomes a 1 kHz row.
        assert!(text.contains("1054 119100 TWR"), "{}", text);
        assert!(!text.contains("\n54 "));
    }

    #[test]
    fn test_runway_row_carries_extended_tokens() {
        let text = emit(&parsed_airport());
        let rwy_line = text
            .lines()
            .find(|l| l.starts_with("100 "))
            .expect("runway row");
        for tok in ["GPA1:", "GPA2:", "TCH1:", "TCH2:", "TELEV1:", "TELEV2:"] {
            assert!(rwy_line.contains(tok), "missing {} in {}", tok, rwy_line);
        }
    }

    #[test]
    fn test_round_trip_is_byte_identical() {
        let first = emit(&parsed_airport());
        let mut reparsed = parse_apt_dat(first.as_bytes(), ParserOpts::default()).unwrap();
        assert_eq!(reparsed.len(), 1);
        let second = emit(&reparsed.remove(0));
        assert_eq!(first, second);
    }

    #[test]
    fn test_reload_preserves_fields() {
        let text = emit(&parsed_airport());
        let arpts = parse_apt_dat(text.as_bytes(), ParserOpts::default()).unwrap();
        let a = &arpts[0];
        assert_eq!(a.ident, "KJFK");
        assert_eq!(a.icao.as_deref(), Some("KJFK"));
        assert_eq!(a.iata.as_deref(), Some("JFK"));
        assert_eq!(a.cc.as_deref(), Some("USA"));
        assert_eq!(a.country.as_deref(), Some("United States"));
        assert_eq!(a.city.as_deref(), Some("New York"));
        assert_eq!(a.ta_ft, 18_000.0);
        assert!((a.refpt.lat - 40.6398).abs() < 1e-7);
        assert_eq!(a.runways.len(), 1);
        assert_eq!(a.ramp_starts.len(), 1);
        assert_eq!(a.freqs.len(), 1);
        assert_eq!(a.freqs[0].freq_hz, 119_100_000);
    }

    #[test]
    fn test_has_iaps_round_trips() {
        let mut arpt = parsed_airport();
        arpt.have_iaps = true;
        let text = emit(&arpt);
        assert!(text.contains("1302 has_iaps 1"));
        let arpts = parse_apt_dat(text.as_bytes(), ParserOpts::default()).unwrap();
        assert!(arpts[0].have_iaps);
    }

    #[test]
    fn test_write_tile_to_disk() {
        let temp = TempDir::new().unwrap();
        let cache = DiskCache::new(temp.path().to_path_buf());
        let arpt = parsed_airport();
        let key = TileKey::from_pos(arpt.refpt.lat, arpt.refpt.lon);
        assert_eq!(key, TileKey::new(40, -74));
        write_tile(&cache, key, &[&arpt]).unwrap();
        let loaded = cache.read_tile(key, ParserOpts::default()).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].ident, "KJFK");
        assert_eq!(
            loaded[0].ramp_starts.values().next().unwrap().pos,
            GeoPos2::new(40.64432, -73.78743)
        );
    }
}
