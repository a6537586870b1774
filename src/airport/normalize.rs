//! Token normalisation helpers for scenery metadata.
//!
//! Airport names arrive as arbitrary UTF-8 and are folded to upper-case
//! ASCII for display and matching. Transition altitude/level tokens arrive
//! in half a dozen real-world spellings ("18000", "FL 180", "5100 m",
//! "10000 ft") and are folded to feet.

use deunicode::deunicode;

use crate::geo::m2ft;

/// Characters dropped from transliterated names.
const DROPPED: [char; 5] = ['\'', '`', '^', '\\', '"'];

/// Normalise a raw UTF-8 airport name: transliterate to ASCII, drop
/// quoting/accent leftovers, upper-case.
pub fn normalize_name(raw: &str) -> String {
    deunicode(raw)
        .chars()
        .filter(|c| !DROPPED.contains(c))
        .collect::<String>()
        .to_uppercase()
}

/// Normalise a ramp start name to its first plain alphanumeric token.
///
/// Scenery authors embed airline hints and decorations in gate names
/// ("Gate A21 - heavy"); when gate-name normalisation is enabled the first
/// all-alphanumeric token wins. Falls back to the full name when no token
/// qualifies.
pub fn normalize_gate_name(raw: &str) -> String {
    raw.split_whitespace()
        .find(|tok| !tok.is_empty() && tok.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or(raw)
        .to_string()
}

/// Parse a transition altitude/level token into feet.
///
/// The ladder, in order:
/// 1. split off an optional leading `FL` sentinel;
/// 2. strip any trailing alphabetic unit marker;
/// 3. parse a float;
/// 4. an `FL` sentinel, or a bare value below 600, is a flight level:
///    multiply by 100;
/// 5. a metric marker whose feet-equivalent would exceed 60 000 ft is
///    taken as mis-tagged (the value was already feet); otherwise convert
///    meters to feet.
///
/// Returns `None` for unparseable input.
pub fn parse_transition_alt(raw: &str) -> Option<f64> {
    let mut s = raw.trim();
    let mut flight_level = false;
    if let Some(rest) = s.strip_prefix("FL") {
        flight_level = true;
        s = rest.trim_start();
    }
    // Peel the trailing unit marker ("m", "ft", "M", ...).
    let num_end = s
        .rfind(|c: char| c.is_ascii_digit() || c == '.')
        .map(|i| i + 1)?;
    let marker = s[num_end..].trim().to_ascii_lowercase();
    let metric = marker == "m";
    let val: f64 = s[..num_end].trim().parse().ok()?;
    if !val.is_finite() || val < 0.0 {
        return None;
    }

    if flight_level || (val < 600.0 && !metric) {
        return Some(val * 100.0);
    }
    if metric {
        let ft = m2ft(val);
        if ft >= 60_000.0 {
            // A TA above FL600 does not exist; the metric marker was
            // misapplied to a feet value.
            return Some(val);
        }
        return Some(ft);
    }
    Some(val)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_name_plain_ascii() {
        assert_eq!(normalize_name("John F Kennedy Intl"), "JOHN F KENNEDY INTL");
    }

    #[test]
    fn test_normalize_name_diacritics() {
        assert_eq!(normalize_name("Zürich"), "ZURICH");
        assert_eq!(normalize_name("São Paulo"), "SAO PAULO");
        assert_eq!(normalize_name("Châteauroux"), "CHATEAUROUX");
    }

    #[test]
    fn test_normalize_name_drops_quotes() {
        assert_eq!(normalize_name("King's Field"), "KINGS FIELD");
        assert_eq!(normalize_name("A\"B`C^D\\E"), "ABCDE");
    }

    #[test]
    fn test_normalize_gate_name() {
        assert_eq!(normalize_gate_name("A21"), "A21");
        assert_eq!(normalize_gate_name("Gate A21 - heavy"), "Gate");
        assert_eq!(normalize_gate_name("- A21"), "A21");
        // Nothing qualifies: full name survives.
        assert_eq!(normalize_gate_name("-- --"), "-- --");
    }

    #[test]
    fn test_transition_alt_plain_feet() {
        assert_eq!(parse_transition_alt("18000"), Some(18_000.0));
        assert_eq!(parse_transition_alt("10000 ft"), Some(10_000.0));
    }

    #[test]
    fn test_transition_alt_flight_level() {
        assert_eq!(parse_transition_alt("FL180"), Some(18_000.0));
        assert_eq!(parse_transition_alt("FL 123"), Some(12_300.0));
        // A bare small value is a flight level too.
        assert_eq!(parse_transition_alt("130"), Some(13_000.0));
    }

    #[test]
    fn test_transition_alt_metric() {
        // A plausible metric TA converts to feet.
        let ft = parse_transition_alt("5100 m").unwrap();
        assert!((ft - 16_732.3).abs() < 0.5, "ft {}", ft);
        // A mis-tagged feet value stays in feet.
        assert_eq!(parse_transition_alt("21700 m"), Some(21_700.0));
    }

    #[test]
    fn test_transition_alt_garbage() {
        assert_eq!(parse_transition_alt(""), None);
        assert_eq!(parse_transition_alt("none"), None);
        assert_eq!(parse_transition_alt("FL"), None);
        assert_eq!(parse_transition_alt("-300"), None);
    }
}
