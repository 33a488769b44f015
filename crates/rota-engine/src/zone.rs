//! Timezone resolution: user-supplied names and abbreviations to IANA zones.
//!
//! Accepts any valid IANA identifier directly, plus a fixed table of common
//! abbreviations. Abbreviations are ambiguous by nature (EST/EDT, CET/CEST,
//! ...), so both the summer and winter form of a region map to one canonical
//! zone which observes the transition itself — exact offset fidelity is
//! deliberately traded for usability.

use chrono_tz::Tz;

use crate::error::{Result, RotaError};

/// Common timezone abbreviation aliases to canonical IANA zones.
const TZ_ALIASES: &[(&str, &str)] = &[
    ("UTC", "UTC"),
    ("GMT", "Etc/GMT"),
    ("BST", "Europe/London"),
    ("CET", "Europe/Berlin"),
    ("CEST", "Europe/Berlin"),
    ("EET", "Europe/Bucharest"),
    ("EEST", "Europe/Bucharest"),
    ("WET", "Europe/Lisbon"),
    ("WEST", "Europe/Lisbon"),
    ("IST", "Asia/Kolkata"),
    ("PKT", "Asia/Karachi"),
    ("JST", "Asia/Tokyo"),
    ("KST", "Asia/Seoul"),
    ("AEST", "Australia/Sydney"),
    ("AEDT", "Australia/Sydney"),
    ("NZST", "Pacific/Auckland"),
    ("NZDT", "Pacific/Auckland"),
    // North America
    ("EST", "America/New_York"),
    ("EDT", "America/New_York"),
    ("CST", "America/Chicago"),
    ("CDT", "America/Chicago"),
    ("MST", "America/Denver"),
    ("MDT", "America/Denver"),
    ("PST", "America/Los_Angeles"),
    ("PDT", "America/Los_Angeles"),
];

/// Resolve a user-supplied timezone name to a loadable IANA zone.
///
/// Consults the case-insensitive alias table first, then falls back to a
/// direct IANA parse. The alias table must win: the zone database also
/// carries legacy fixed-offset zones under the bare names `EST`, `MST`,
/// `CET`, `EET` and `WET`, which never observe DST and would split a
/// region's summer and winter abbreviations across different zones.
///
/// # Errors
///
/// Returns [`RotaError::UnknownZone`] if the name is empty, is not a known
/// abbreviation, and is not a valid IANA identifier.
pub fn canonicalize(name: &str) -> Result<Tz> {
    let name = name.trim();
    if name.is_empty() {
        return Err(RotaError::UnknownZone("timezone required".to_string()));
    }

    let alias = name.to_uppercase();
    if let Some((_, canonical)) = TZ_ALIASES.iter().find(|(abbr, _)| *abbr == alias) {
        return canonical
            .parse::<Tz>()
            .map_err(|_| RotaError::UnknownZone(format!("'{name}' maps to unloadable '{canonical}'")));
    }

    name.parse::<Tz>().map_err(|_| {
        RotaError::UnknownZone(format!(
            "'{name}' is not an IANA zone (e.g. 'Europe/Berlin') or a supported abbreviation"
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iana_name_passes_through() {
        assert_eq!(canonicalize("Europe/Berlin").unwrap(), chrono_tz::Europe::Berlin);
        assert_eq!(canonicalize("America/New_York").unwrap(), chrono_tz::America::New_York);
    }

    #[test]
    fn test_alias_maps_to_canonical_zone() {
        assert_eq!(canonicalize("PST").unwrap(), chrono_tz::America::Los_Angeles);
        assert_eq!(canonicalize("JST").unwrap(), chrono_tz::Asia::Tokyo);
    }

    #[test]
    fn test_alias_is_case_insensitive() {
        assert_eq!(canonicalize("pst").unwrap(), chrono_tz::America::Los_Angeles);
        assert_eq!(canonicalize("  Cet ").unwrap(), chrono_tz::Europe::Berlin);
    }

    #[test]
    fn test_alias_wins_over_legacy_fixed_offset_zone() {
        // The zone database accepts bare "EST"/"CET"/"MST" as fixed-offset
        // zones with no DST; the alias table must take precedence.
        assert_eq!(canonicalize("EST").unwrap(), chrono_tz::America::New_York);
        assert_eq!(canonicalize("CET").unwrap(), chrono_tz::Europe::Berlin);
        assert_eq!(canonicalize("MST").unwrap(), chrono_tz::America::Denver);
        assert_eq!(canonicalize("EET").unwrap(), chrono_tz::Europe::Bucharest);
        assert_eq!(canonicalize("WET").unwrap(), chrono_tz::Europe::Lisbon);
    }

    #[test]
    fn test_summer_and_winter_abbreviations_share_a_zone() {
        assert_eq!(canonicalize("EST").unwrap(), canonicalize("EDT").unwrap());
        assert_eq!(canonicalize("CET").unwrap(), canonicalize("CEST").unwrap());
        assert_eq!(canonicalize("NZST").unwrap(), canonicalize("NZDT").unwrap());
    }

    #[test]
    fn test_empty_name_is_rejected() {
        assert!(matches!(canonicalize(""), Err(RotaError::UnknownZone(_))));
        assert!(matches!(canonicalize("   "), Err(RotaError::UnknownZone(_))));
    }

    #[test]
    fn test_unknown_name_is_rejected() {
        let err = canonicalize("Invalid/Zone").unwrap_err();
        assert!(err.to_string().contains("Unknown timezone"));
    }

    #[test]
    fn test_every_alias_target_is_loadable() {
        for (abbr, _) in TZ_ALIASES {
            canonicalize(abbr).unwrap();
        }
    }
}
