//! Hand-curated controlled terminology and plausibility limits.
//!
//! These are deliberately a fixed subset, not parsed from external codelist
//! metadata: the rules that consume them must stay auditable as written.
//! Matching is exact and case-sensitive, as submitted values are expected in
//! their controlled form.

/// Strict ISO 8601 calendar date, the only date shape the date rules accept.
pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

/// Permitted `SEX` values in DM.
pub const SEX_TERMS: &[&str] = &["M", "F", "U"];

/// Permitted `AGEU` values in DM when `AGE` is populated.
pub const AGE_UNIT_TERMS: &[&str] = &["YEARS", "MONTHS", "DAYS"];

/// Closed plausibility range for `AGE`, in years.
pub const AGE_RANGE: (f64, f64) = (0.0, 120.0);

/// Permitted `AESER` values in AE.
pub const AE_SERIOUS_TERMS: &[&str] = &["Y", "N"];

/// Permitted `AESEV` values in AE.
pub const AE_SEVERITY_TERMS: &[&str] = &["MILD", "MODERATE", "SEVERE"];

/// Vital-sign test codes the VS rules know. Results for these codes are
/// expected to be numeric.
pub const VS_TEST_CODES: &[&str] = &["SYSBP", "DIABP", "HR", "TEMP", "WEIGHT", "HEIGHT", "RESP"];

/// Allowed result units per vital-sign test code. RESP tolerates `bpm`
/// because some exports misuse it for breaths/min.
pub const VS_UNIT_MAP: &[(&str, &[&str])] = &[
    ("SYSBP", &["mmHg"]),
    ("DIABP", &["mmHg"]),
    ("HR", &["bpm"]),
    ("RESP", &["breaths/min", "bpm"]),
    ("TEMP", &["C", "F"]),
    ("WEIGHT", &["kg", "g", "lb"]),
    ("HEIGHT", &["cm", "m", "in"]),
];

/// Allowed units for a vital-sign test code, if the code is known.
pub fn allowed_units(test_code: &str) -> Option<&'static [&'static str]> {
    VS_UNIT_MAP
        .iter()
        .find(|(code, _)| *code == test_code)
        .map(|(_, units)| *units)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_map_covers_every_known_test_code() {
        for code in VS_TEST_CODES {
            assert!(allowed_units(code).is_some(), "no units for {code}");
        }
    }

    #[test]
    fn unknown_test_code_has_no_units() {
        assert!(allowed_units("GLUCOSE").is_none());
    }
}
