//! Disk cache for the airport database.
//!
//! Layout under the cache directory:
//!
//! ```text
//! version        (app_version << 16) | CACHE_FORMAT_VERSION
//! airac_cycle    navdata cycle the cache was built against
//! apt_dats       newline list of every input apt.dat, priority order
//! settings.conf  policy overrides (only present when non-default)
//! index.dat      one compact index record per airport
//! +40-080/       10 degree supertile directory
//!   +40-074      1 degree tile file in the derived apt.dat dialect
//! ```
//!
//! Freshness: the cache is reused only when the version token, the AIRAC
//! cycle, the apt.dat list and the policy settings all match the current
//! environment exactly. Any mismatch triggers a full wipe and rebuild.

pub mod writer;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use ini::Ini;

use crate::airport::index::ArptIndexEntry;
use crate::airport::parser::{parse_apt_dat_file, ParserOpts};
use crate::airport::Airport;
use crate::tile::TileKey;

/// On-disk cache format version. Bumped whenever the tile dialect or the
/// sidecar index layout changes.
pub const CACHE_FORMAT_VERSION: u32 = 21;

const VERSION_FILE: &str = "version";
const AIRAC_FILE: &str = "airac_cycle";
const APT_DATS_FILE: &str = "apt_dats";
const SETTINGS_FILE: &str = "settings.conf";
const INDEX_FILE: &str = "index.dat";
const SETTINGS_SECTION: &str = "database";

/// Cache-related errors.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Policy settings that participate in the freshness protocol: a flipped
/// policy must invalidate the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheSettings {
    pub ifr_only: bool,
    pub normalize_gate_names: bool,
}

/// Handle to the on-disk cache directory.
#[derive(Debug)]
pub struct DiskCache {
    cache_dir: PathBuf,
}

impl DiskCache {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// The combined application/format version token stored in the
    /// `version` file.
    pub fn version_token(app_version: u32) -> u64 {
        ((app_version as u64) << 16) | CACHE_FORMAT_VERSION as u64
    }

    /// Check every freshness token against the current environment.
    pub fn is_fresh(
        &self,
        app_version: u32,
        airac_cycle: u32,
        apt_dats: &[PathBuf],
        settings: CacheSettings,
    ) -> bool {
        let version_ok = read_trimmed(&self.cache_dir.join(VERSION_FILE))
            .and_then(|s| s.parse::<u64>().ok())
            .map_or(false, |v| v == Self::version_token(app_version));
        if !version_ok {
            tracing::debug!("cache version token mismatch");
            return false;
        }
        let airac_ok = read_trimmed(&self.cache_dir.join(AIRAC_FILE))
            .and_then(|s| s.parse::<u32>().ok())
            .map_or(false, |c| c == airac_cycle);
        if !airac_ok {
            tracing::debug!("cache AIRAC cycle mismatch");
            return false;
        }
        let apt_dats_ok = fs::read_to_string(self.cache_dir.join(APT_DATS_FILE))
            .map_or(false, |content| content == apt_dats_content(apt_dats));
        if !apt_dats_ok {
            tracing::debug!("cache apt.dat list mismatch");
            return false;
        }
        if self.read_settings() != settings {
            tracing::debug!("cache policy settings mismatch");
            return false;
        }
        true
    }

    /// Delete the whole cache tree and recreate the empty directory.
    pub fn wipe(&self) -> io::Result<()> {
        if self.cache_dir.exists() {
            fs::remove_dir_all(&self.cache_dir)?;
        }
        fs::create_dir_all(&self.cache_dir)
    }

    /// Write all freshness tokens. `settings.conf` is only materialised
    /// when the caller overrode the defaults.
    pub fn write_tokens(
        &self,
        app_version: u32,
        airac_cycle: u32,
        apt_dats: &[PathBuf],
        settings: CacheSettings,
    ) -> io::Result<()> {
        fs::create_dir_all(&self.cache_dir)?;
        fs::write(
            self.cache_dir.join(VERSION_FILE),
            format!("{}\n", Self::version_token(app_version)),
        )?;
        fs::write(
            self.cache_dir.join(AIRAC_FILE),
            format!("{}\n", airac_cycle),
        )?;
        fs::write(self.cache_dir.join(APT_DATS_FILE), apt_dats_content(apt_dats))?;
        if settings != CacheSettings::default() {
            let mut ini = Ini::new();
            ini.with_section(Some(SETTINGS_SECTION))
                .set("ifr_only", bool_str(settings.ifr_only))
                .set(
                    "normalize_gate_names",
                    bool_str(settings.normalize_gate_names),
                );
            ini.write_to_file(self.cache_dir.join(SETTINGS_FILE))?;
        }
        Ok(())
    }

    /// Read the stored policy settings; a missing file means defaults.
    pub fn read_settings(&self) -> CacheSettings {
        let Ok(ini) = Ini::load_from_file(self.cache_dir.join(SETTINGS_FILE)) else {
            return CacheSettings::default();
        };
        let mut settings = CacheSettings::default();
        if let Some(section) = ini.section(Some(SETTINGS_SECTION)) {
            if let Some(v) = section.get("ifr_only") {
                settings.ifr_only = v == "true";
            }
            if let Some(v) = section.get("normalize_gate_names") {
                settings.normalize_gate_names = v == "true";
            }
        }
        settings
    }

    /// Load the sidecar index. Corrupt lines are skipped.
    pub fn read_index(&self) -> Result<Vec<ArptIndexEntry>, CacheError> {
        let content = fs::read_to_string(self.cache_dir.join(INDEX_FILE))?;
        let mut out = Vec::new();
        for line in content.lines() {
            if line.is_empty() {
                continue;
            }
            match ArptIndexEntry::parse_line(line) {
                Some(entry) => out.push(entry),
                None => tracing::warn!(line, "corrupt index.dat line, skipped"),
            }
        }
        Ok(out)
    }

    /// Path of the sidecar index file.
    pub(crate) fn index_path(&self) -> PathBuf {
        self.cache_dir.join(INDEX_FILE)
    }

    /// Path of a tile file: supertile directory / tile name.
    pub fn tile_path(&self, key: TileKey) -> PathBuf {
        self.cache_dir
            .join(key.supertile().to_string())
            .join(key.to_string())
    }

    /// Read and parse one tile file. A missing file is a normal empty
    /// tile; a corrupt file is logged and treated as empty.
    pub fn read_tile(&self, key: TileKey, opts: ParserOpts) -> Option<Vec<Airport>> {
        let path = self.tile_path(key);
        if !path.is_file() {
            return None;
        }
        match parse_apt_dat_file(&path, opts) {
            Ok(arpts) => Some(arpts),
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "unreadable tile file, skipped");
                None
            }
        }
    }
}

fn bool_str(v: bool) -> &'static str {
    if v {
        "true"
    } else {
        "false"
    }
}

/// The exact `apt_dats` file content for an input list.
fn apt_dats_content(apt_dats: &[PathBuf]) -> String {
    let mut out = String::new();
    for path in apt_dats {
        out.push_str(&path.to_string_lossy());
        out.push('\n');
    }
    out
}

fn read_trimmed(path: &Path) -> Option<String> {
    fs::read_to_string(path).ok().map(|s| s.trim().to_string())
}
