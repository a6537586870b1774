//! Scenery set discovery.
//!
//! X-Plane's enabled scenery layers are listed in
//! `Custom Scenery/scenery_packs.ini`, highest priority first. Each layer
//! may carry its own `Earth nav data/apt.dat`; the stock global airports
//! file is always appended last so lower-priority data can back-fill
//! missing meta-info. The navdata AIRAC cycle is read from
//! `cycle_info.txt` next to the CIFP tree.

use std::fs;
use std::path::{Path, PathBuf};

/// Well-known X-Plane subdirectories and files.
pub mod subdirs {
    /// Custom Scenery directory name.
    pub const CUSTOM_SCENERY: &str = "Custom Scenery";
    /// Scenery priority list inside Custom Scenery.
    pub const SCENERY_PACKS_INI: &str = "scenery_packs.ini";
    /// Earth nav data directory name.
    pub const EARTH_NAV_DATA: &str = "Earth nav data";
    /// Airport database filename.
    pub const APT_DAT: &str = "apt.dat";
    /// XP12 global scenery directory.
    pub const GLOBAL_SCENERY: &str = "Global Scenery";
    /// XP12 global airports layer.
    pub const GLOBAL_AIRPORTS: &str = "Global Airports";
    /// Resources directory name.
    pub const RESOURCES: &str = "Resources";
    /// XP11 default scenery directory (inside Resources).
    pub const DEFAULT_SCENERY: &str = "default scenery";
    /// XP11 default apt dat directory (inside default scenery).
    pub const DEFAULT_APT_DAT: &str = "default apt dat";
    /// Custom (updatable) navdata directory.
    pub const CUSTOM_DATA: &str = "Custom Data";
    /// Stock navdata directory (inside Resources).
    pub const DEFAULT_DATA: &str = "default data";
    /// Navdata cycle descriptor filename.
    pub const CYCLE_INFO: &str = "cycle_info.txt";
}

/// Scenery discovery errors.
#[derive(Debug, thiserror::Error)]
pub enum SceneryError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("X-Plane install directory not found: {0}")]
    MissingInstallDir(PathBuf),
}

/// The tag opening an enabled layer line in scenery_packs.ini.
const SCENERY_PACK_TAG: &str = "SCENERY_PACK ";

/// Convert the forward slashes scenery_packs.ini uses (and any stray
/// backslashes from hand-edited files) to the host separator.
fn host_separators(rel: &str) -> String {
    rel.replace(['\\', '/'], std::path::MAIN_SEPARATOR_STR)
}

/// Discover the ordered apt.dat list for an install, highest priority
/// first, ending with the stock global airports file.
pub fn discover_apt_dats(install_dir: &Path) -> Result<Vec<PathBuf>, SceneryError> {
    if !install_dir.is_dir() {
        return Err(SceneryError::MissingInstallDir(install_dir.to_path_buf()));
    }

    let mut out = Vec::new();
    let ini_path = install_dir
        .join(subdirs::CUSTOM_SCENERY)
        .join(subdirs::SCENERY_PACKS_INI);
    match fs::read_to_string(&ini_path) {
        Ok(text) => {
            for line in text.lines() {
                let Some(rest) = line.strip_prefix(SCENERY_PACK_TAG) else {
                    continue;
                };
                let rel = rest.trim();
                if rel.is_empty() {
                    continue;
                }
                out.push(
                    install_dir
                        .join(host_separators(rel))
                        .join(subdirs::EARTH_NAV_DATA)
                        .join(subdirs::APT_DAT),
                );
            }
        }
        Err(err) => {
            tracing::debug!(path = %ini_path.display(), %err,
                "no scenery_packs.ini, using default scenery only");
        }
    }

    // The stock global airports, newest install layout first.
    let defaults = [
        install_dir
            .join(subdirs::GLOBAL_SCENERY)
            .join(subdirs::GLOBAL_AIRPORTS)
            .join(subdirs::EARTH_NAV_DATA)
            .join(subdirs::APT_DAT),
        install_dir
            .join(subdirs::RESOURCES)
            .join(subdirs::DEFAULT_SCENERY)
            .join(subdirs::DEFAULT_APT_DAT)
            .join(subdirs::EARTH_NAV_DATA)
            .join(subdirs::APT_DAT),
    ];
    match defaults.iter().find(|p| p.is_file()) {
        Some(default) => out.push(default.clone()),
        None => {
            tracing::warn!(install = %install_dir.display(),
                "no default global apt.dat found");
            out.push(defaults[0].clone());
        }
    }
    Ok(out)
}

/// First run of exactly four digits in a string.
fn first_cycle_token(s: &str) -> Option<u32> {
    s.split(|c: char| !c.is_ascii_digit())
        .find(|tok| tok.len() == 4)
        .and_then(|tok| tok.parse().ok())
}

fn extract_cycle(text: &str) -> Option<u32> {
    for line in text.lines() {
        if !line.to_ascii_lowercase().contains("airac") {
            continue;
        }
        if let Some(cycle) = first_cycle_token(line) {
            return Some(cycle);
        }
    }
    first_cycle_token(text)
}

/// The AIRAC cycle the host navdata reports, custom navdata preferred.
pub fn airac_cycle(install_dir: &Path) -> Option<u32> {
    let candidates = [
        install_dir
            .join(subdirs::CUSTOM_DATA)
            .join(subdirs::CYCLE_INFO),
        install_dir
            .join(subdirs::RESOURCES)
            .join(subdirs::DEFAULT_DATA)
            .join(subdirs::CYCLE_INFO),
    ];
    for path in &candidates {
        if let Ok(text) = fs::read_to_string(path) {
            if let Some(cycle) = extract_cycle(&text) {
                return Some(cycle);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_ini(install: &Path, content: &str) {
        let dir = install.join(subdirs::CUSTOM_SCENERY);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(subdirs::SCENERY_PACKS_INI), content).unwrap();
    }

    fn make_global_airports(install: &Path) -> PathBuf {
        let dir = install
            .join(subdirs::GLOBAL_SCENERY)
            .join(subdirs::GLOBAL_AIRPORTS)
            .join(subdirs::EARTH_NAV_DATA);
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(subdirs::APT_DAT);
        fs::write(&path, "I\n1200 test\n99\n").unwrap();
        path
    }

    #[test]
    fn test_priority_order_with_default_last() {
        let temp = TempDir::new().unwrap();
        let global = make_global_airports(temp.path());
        write_ini(
            temp.path(),
            "I\n1000 Version\nSCENERY_PACKS\n\
SCENERY_PACK Custom Scenery/Payware LOWI/\n\
SCENERY_PACK_DISABLED Custom Scenery/Broken/\n\
SCENERY_PACK Custom Scenery/Freeware KSEA/\n",
        );
        let list = discover_apt_dats(temp.path()).unwrap();
        assert_eq!(list.len(), 3);
        assert!(list[0].ends_with("Payware LOWI/Earth nav data/apt.dat"));
        assert!(list[1].ends_with("Freeware KSEA/Earth nav data/apt.dat"));
        assert_eq!(list[2], global);
    }

    #[test]
    fn test_no_ini_yields_default_only() {
        let temp = TempDir::new().unwrap();
        let global = make_global_airports(temp.path());
        let list = discover_apt_dats(temp.path()).unwrap();
        assert_eq!(list, vec![global]);
    }

    #[test]
    fn test_xp11_default_location_fallback() {
        let temp = TempDir::new().unwrap();
        let dir = temp
            .path()
            .join(subdirs::RESOURCES)
            .join(subdirs::DEFAULT_SCENERY)
            .join(subdirs::DEFAULT_APT_DAT)
            .join(subdirs::EARTH_NAV_DATA);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(subdirs::APT_DAT), "I\n1100 test\n99\n").unwrap();
        let list = discover_apt_dats(temp.path()).unwrap();
        assert_eq!(list.len(), 1);
        assert!(list[0].ends_with("default apt dat/Earth nav data/apt.dat"));
    }

    #[test]
    fn test_missing_install_dir_fails() {
        let temp = TempDir::new().unwrap();
        let bogus = temp.path().join("not-there");
        assert!(matches!(
            discover_apt_dats(&bogus),
            Err(SceneryError::MissingInstallDir(_))
        ));
    }

    #[test]
    fn test_backslash_paths_converted() {
        let temp = TempDir::new().unwrap();
        make_global_airports(temp.path());
        write_ini(
            temp.path(),
            "SCENERY_PACK Custom Scenery\\Windows Pack\\\n",
        );
        let list = discover_apt_dats(temp.path()).unwrap();
        assert!(list[0]
            .to_string_lossy()
            .contains(&format!("Windows Pack{}", std::path::MAIN_SEPARATOR)));
    }

    #[test]
    fn test_airac_cycle_custom_data() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join(subdirs::CUSTOM_DATA);
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join(subdirs::CYCLE_INFO),
            "AIRAC cycle    : 2301\nRevision       : 1\n",
        )
        .unwrap();
        assert_eq!(airac_cycle(temp.path()), Some(2301));
    }

    #[test]
    fn test_airac_cycle_default_data_fallback() {
        let temp = TempDir::new().unwrap();
        let dir = temp
            .path()
            .join(subdirs::RESOURCES)
            .join(subdirs::DEFAULT_DATA);
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join(subdirs::CYCLE_INFO),
            "Data cycle 2206, built by Laminar\n",
        )
        .unwrap();
        assert_eq!(airac_cycle(temp.path()), Some(2206));
    }

    #[test]
    fn test_airac_cycle_missing() {
        let temp = TempDir::new().unwrap();
        assert_eq!(airac_cycle(temp.path()), None);
    }

    #[test]
    fn test_first_cycle_token() {
        assert_eq!(first_cycle_token("AIRAC cycle : 2301"), Some(2301));
        assert_eq!(first_cycle_token("no digits here"), None);
        assert_eq!(first_cycle_token("v12 build 34567"), None);
    }
}
