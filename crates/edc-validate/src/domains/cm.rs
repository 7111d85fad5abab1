//! Concomitant medications (CM).

use polars::prelude::{DataFrame, LazyFrame, col};

use edc_model::{DomainCode, Severity};

use crate::engine::{ColumnSet, DomainSpec, run_domain};
use crate::error::Result;
use crate::rules::{
    MissingPolicy, Rule, compare_evidence, date_of, derive_date, derive_text, missing_or_blank,
};

const MANDATORY: &[&str] = &["USUBJID", "CMTRT", "CMSTDTC"];

pub fn validate(frame: &DataFrame) -> Result<DataFrame> {
    run_domain(
        frame,
        &DomainSpec {
            domain: DomainCode::Cm,
            mandatory: MANDATORY,
            prepare,
            rules,
        },
    )
}

fn prepare(lazy: LazyFrame, columns: &ColumnSet) -> LazyFrame {
    let mut derived = vec![
        derive_text("USUBJID"),
        derive_text("CMTRT"),
        derive_date("CMSTDTC"),
    ];
    if columns.contains("CMENDTC") {
        derived.push(derive_date("CMENDTC"));
    }
    lazy.with_columns(derived)
}

fn rules() -> Vec<Rule> {
    vec![
        Rule {
            id: "SDTM_CM_001",
            severity: Severity::High,
            field: "CMTRT",
            message: "CMTRT is required and must be non-empty.",
            requires: &["CMTRT"],
            on_missing: MissingPolicy::Skip,
            mask: || missing_or_blank("CMTRT"),
            evidence: None,
        },
        Rule {
            id: "SDTM_CM_002",
            severity: Severity::Med,
            field: "CMSTDTC",
            message: "CMSTDTC must be an ISO date in YYYY-MM-DD form.",
            requires: &["CMSTDTC"],
            on_missing: MissingPolicy::Skip,
            mask: || col("CMSTDTC").is_not_null().and(date_of("CMSTDTC").is_null()),
            evidence: None,
        },
        Rule {
            id: "SDTM_CM_003",
            severity: Severity::Low,
            field: "CMENDTC",
            message: "CMENDTC must be an ISO date in YYYY-MM-DD form.",
            requires: &["CMENDTC"],
            on_missing: MissingPolicy::Advise,
            mask: || col("CMENDTC").is_not_null().and(date_of("CMENDTC").is_null()),
            evidence: None,
        },
        Rule {
            id: "SDTM_CM_004",
            severity: Severity::High,
            field: "CMSTDTC/CMENDTC",
            message: "CMSTDTC must be on or before CMENDTC.",
            requires: &["CMENDTC"],
            on_missing: MissingPolicy::Advise,
            mask: || {
                date_of("CMSTDTC")
                    .is_not_null()
                    .and(date_of("CMENDTC").is_not_null())
                    .and(date_of("CMSTDTC").gt(date_of("CMENDTC")))
            },
            evidence: Some(|| compare_evidence("CMSTDTC", "CMENDTC")),
        },
    ]
}
