//! ARINC 424 procedure-data merger.
//!
//! X-Plane ships per-airport Coded Instrument Flight Procedure files under
//! `Custom Data/CIFP/<IDENT>.dat` (navdata updates) with a stock fallback
//! in `Resources/default data/CIFP`. Only two record types are consulted:
//!
//! - `APPCH:` - approach procedures; carry the runway tag and the coded
//!   glide path angle (negative hundredths of a degree),
//! - `RWY:` - runway records; carry the threshold elevation and the
//!   threshold crossing height, both in feet.
//!
//! The mere existence of a CIFP file flags the airport as having published
//! instrument approaches.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use super::Airport;

/// Locate the CIFP file for an ident, custom navdata first.
fn cifp_path(install_dir: &Path, ident: &str) -> Option<PathBuf> {
    let fname = format!("{}.dat", ident);
    [
        install_dir.join("Custom Data").join("CIFP").join(&fname),
        install_dir
            .join("Resources")
            .join("default data")
            .join("CIFP")
            .join(&fname),
    ]
    .into_iter()
    .find(|p| p.is_file())
}

/// Enrich an airport's runway ends from its CIFP procedure file.
///
/// Airports already flagged as having procedures are left alone. Returns
/// true when a file was found and read.
pub fn enrich_airport(arpt: &mut Airport, install_dir: &Path) -> bool {
    if arpt.have_iaps {
        return false;
    }
    let Some(path) = cifp_path(install_dir, &arpt.ident) else {
        return false;
    };
    let file = match File::open(&path) {
        Ok(f) => f,
        Err(err) => {
            tracing::warn!(path = %path.display(), %err, "unreadable CIFP file, skipped");
            return false;
        }
    };
    arpt.have_iaps = true;
    for line in BufReader::new(file).lines() {
        let line = match line {
            Ok(l) => l,
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "CIFP read error, rest skipped");
                break;
            }
        };
        if line.starts_with("APPCH:") {
            merge_appch(arpt, &line);
        } else if line.starts_with("RWY:") {
            merge_rwy(arpt, &line);
        }
    }
    true
}

/// Extract the runway end id out of an ARINC `RW<id>` tag.
fn runway_tag(tok: &str) -> Option<String> {
    let id: String = tok
        .trim()
        .strip_prefix("RW")?
        .chars()
        .take_while(|c| c.is_ascii_digit() || matches!(c, 'L' | 'C' | 'R'))
        .collect();
    if id.is_empty() {
        None
    } else {
        Some(id)
    }
}

/// `APPCH:` record: column 4 is the runway transition tag, column 28 the
/// glide path angle in negative hundredths of a degree.
fn merge_appch(arpt: &mut Airport, line: &str) {
    let fields: Vec<&str> = line.split(',').collect();
    let Some(id) = fields.get(4).and_then(|t| runway_tag(t)) else {
        return;
    };
    let Some(raw) = fields.get(28).and_then(|t| t.trim().parse::<f64>().ok()) else {
        return;
    };
    let gpa = -raw / 100.0;
    if !(gpa > 0.0 && gpa < 10.0) {
        return;
    }
    if let Some(end) = arpt.find_runway_end_mut(&id) {
        end.gpa = gpa;
    }
}

/// `RWY:` record: column 0 embeds the runway tag, column 3 is the
/// threshold elevation (feet), column 7 the TCH (feet).
fn merge_rwy(arpt: &mut Airport, line: &str) {
    let fields: Vec<&str> = line.split(',').collect();
    let Some(id) = fields
        .first()
        .and_then(|t| t.strip_prefix("RWY:"))
        .and_then(runway_tag)
    else {
        return;
    };
    let telev = fields.get(3).and_then(|t| t.trim().parse::<f64>().ok());
    let tch = fields.get(7).and_then(|t| t.trim().parse::<f64>().ok());
    let Some(end) = arpt.find_runway_end_mut(&id) else {
        return;
    };
    if let Some(telev) = telev {
        if telev.is_finite() && (-2_000.0..30_000.0).contains(&telev) {
            end.telev = telev;
        }
    }
    if let Some(tch) = tch {
        if tch > 0.0 && tch < 200.0 {
            end.tch = tch;
        }
    }
}
