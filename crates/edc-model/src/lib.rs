pub mod error;
pub mod finding;
pub mod terminology;

pub use error::{ModelError, Result};
pub use finding::{DATASET_ROW, DomainCode, FINDING_COLUMNS, Finding, FindingType, Severity};

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn severity_ordering_matches_triage_order() {
        assert!(Severity::Low < Severity::Med);
        assert!(Severity::Med < Severity::High);
        assert!(Severity::High < Severity::Crit);
    }

    #[test]
    fn severity_round_trips_through_str() {
        for severity in [
            Severity::Low,
            Severity::Med,
            Severity::High,
            Severity::Crit,
        ] {
            assert_eq!(Severity::from_str(severity.as_str()).unwrap(), severity);
        }
        assert!(Severity::from_str("FATAL").is_err());
    }

    #[test]
    fn finding_serializes_with_wire_labels() {
        let finding = Finding::dataset_level(
            FindingType::SdtmRule,
            "SDTM_VS_000",
            Severity::Crit,
            DomainCode::Vs,
            "VSDTC",
            "Missing required columns for VS: VSDTC",
        );
        let json = serde_json::to_string(&finding).expect("serialize finding");
        assert!(json.contains("\"SDTM_RULE\""));
        assert!(json.contains("\"CRIT\""));
        assert!(json.contains("\"row_index\":-1"));
        let round: Finding = serde_json::from_str(&json).expect("deserialize finding");
        assert_eq!(round, finding);
        assert!(round.is_blocking());
    }

    #[test]
    fn domain_codes_round_trip() {
        for domain in [
            DomainCode::Dm,
            DomainCode::Vs,
            DomainCode::Ae,
            DomainCode::Cm,
            DomainCode::Cross,
        ] {
            assert_eq!(DomainCode::from_str(domain.as_str()).unwrap(), domain);
        }
    }
}
