//! Adverse events (AE).

use polars::prelude::{DataFrame, LazyFrame, col};

use edc_model::{DomainCode, Severity};
use edc_model::terminology::{AE_SERIOUS_TERMS, AE_SEVERITY_TERMS};

use crate::engine::{ColumnSet, DomainSpec, run_domain};
use crate::error::Result;
use crate::rules::{
    MissingPolicy, Rule, compare_evidence, date_of, derive_date, derive_text, is_one_of,
    missing_or_blank, text_of,
};

const MANDATORY: &[&str] = &["USUBJID", "AETERM", "AESTDTC"];

pub fn validate(frame: &DataFrame) -> Result<DataFrame> {
    run_domain(
        frame,
        &DomainSpec {
            domain: DomainCode::Ae,
            mandatory: MANDATORY,
            prepare,
            rules,
        },
    )
}

fn prepare(lazy: LazyFrame, columns: &ColumnSet) -> LazyFrame {
    let mut derived = vec![
        derive_text("USUBJID"),
        derive_text("AETERM"),
        derive_date("AESTDTC"),
    ];
    if columns.contains("AEENDTC") {
        derived.push(derive_date("AEENDTC"));
    }
    if columns.contains("AESER") {
        derived.push(derive_text("AESER"));
    }
    if columns.contains("AESEV") {
        derived.push(derive_text("AESEV"));
    }
    lazy.with_columns(derived)
}

fn rules() -> Vec<Rule> {
    vec![
        Rule {
            id: "SDTM_AE_001",
            severity: Severity::High,
            field: "AETERM",
            message: "AETERM is required and must be non-empty.",
            requires: &["AETERM"],
            on_missing: MissingPolicy::Skip,
            mask: || missing_or_blank("AETERM"),
            evidence: None,
        },
        Rule {
            id: "SDTM_AE_002",
            severity: Severity::Med,
            field: "AESTDTC",
            message: "AESTDTC must be an ISO date in YYYY-MM-DD form.",
            requires: &["AESTDTC"],
            on_missing: MissingPolicy::Skip,
            mask: || col("AESTDTC").is_not_null().and(date_of("AESTDTC").is_null()),
            evidence: None,
        },
        Rule {
            id: "SDTM_AE_003",
            severity: Severity::Low,
            field: "AEENDTC",
            message: "AEENDTC must be an ISO date in YYYY-MM-DD form.",
            requires: &["AEENDTC"],
            on_missing: MissingPolicy::Advise,
            mask: || col("AEENDTC").is_not_null().and(date_of("AEENDTC").is_null()),
            evidence: None,
        },
        Rule {
            id: "SDTM_AE_004",
            severity: Severity::High,
            field: "AESTDTC/AEENDTC",
            message: "AESTDTC must be on or before AEENDTC.",
            requires: &["AEENDTC"],
            on_missing: MissingPolicy::Advise,
            mask: || {
                date_of("AESTDTC")
                    .is_not_null()
                    .and(date_of("AEENDTC").is_not_null())
                    .and(date_of("AESTDTC").gt(date_of("AEENDTC")))
            },
            evidence: Some(|| compare_evidence("AESTDTC", "AEENDTC")),
        },
        Rule {
            id: "SDTM_AE_005",
            severity: Severity::Med,
            field: "AESER",
            message: "AESER must be one of: Y, N.",
            requires: &["AESER"],
            on_missing: MissingPolicy::Advise,
            mask: || {
                text_of("AESER")
                    .is_not_null()
                    .and(is_one_of(text_of("AESER"), AE_SERIOUS_TERMS).not())
            },
            evidence: None,
        },
        Rule {
            id: "SDTM_AE_006",
            severity: Severity::Low,
            field: "AESEV",
            message: "AESEV must be one of: MILD, MODERATE, SEVERE.",
            requires: &["AESEV"],
            on_missing: MissingPolicy::Advise,
            mask: || {
                text_of("AESEV")
                    .is_not_null()
                    .and(is_one_of(text_of("AESEV"), AE_SEVERITY_TERMS).not())
            },
            evidence: None,
        },
    ]
}
