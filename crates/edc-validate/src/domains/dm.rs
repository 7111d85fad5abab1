//! Demographics (DM), the anchor domain.
//!
//! DM is the ground truth for subject identifiers, so its uniqueness rule is
//! the strictest here: every member of a duplicate group is flagged, not
//! just later occurrences.

use polars::prelude::{DataFrame, LazyFrame, col, lit};

use edc_model::{DomainCode, Severity};
use edc_model::terminology::{AGE_RANGE, AGE_UNIT_TERMS, SEX_TERMS};

use crate::engine::{ColumnSet, DomainSpec, run_domain};
use crate::error::Result;
use crate::rules::{
    MissingPolicy, Rule, compare_evidence, date_of, derive_date, derive_decimal, derive_text,
    is_one_of, missing_or_blank, num_of, text_of,
};

const MANDATORY: &[&str] = &["USUBJID", "STUDYID"];

pub fn validate(frame: &DataFrame) -> Result<DataFrame> {
    run_domain(
        frame,
        &DomainSpec {
            domain: DomainCode::Dm,
            mandatory: MANDATORY,
            prepare,
            rules,
        },
    )
}

fn prepare(lazy: LazyFrame, columns: &ColumnSet) -> LazyFrame {
    let mut derived = vec![derive_text("USUBJID"), derive_text("STUDYID")];
    if columns.contains("SEX") {
        derived.push(derive_text("SEX"));
    }
    if columns.contains("AGE") {
        derived.push(derive_decimal("AGE"));
    }
    if columns.contains("AGEU") {
        derived.push(derive_text("AGEU"));
    }
    if columns.contains("RFSTDTC") {
        derived.push(derive_date("RFSTDTC"));
    }
    if columns.contains("RFENDTC") {
        derived.push(derive_date("RFENDTC"));
    }
    lazy.with_columns(derived)
}

fn rules() -> Vec<Rule> {
    vec![
        Rule {
            id: "SDTM_DM_001",
            severity: Severity::High,
            field: "USUBJID",
            message: "USUBJID is required and must be non-empty.",
            requires: &["USUBJID"],
            on_missing: MissingPolicy::Skip,
            mask: || missing_or_blank("USUBJID"),
            evidence: None,
        },
        Rule {
            id: "SDTM_DM_002",
            severity: Severity::High,
            field: "USUBJID",
            message: "USUBJID must be unique in DM.",
            requires: &["USUBJID"],
            on_missing: MissingPolicy::Skip,
            mask: || {
                text_of("USUBJID")
                    .is_not_null()
                    .and(missing_or_blank("USUBJID").not())
                    .and(text_of("USUBJID").is_duplicated())
            },
            evidence: None,
        },
        Rule {
            id: "SDTM_DM_003",
            severity: Severity::Med,
            field: "SEX",
            message: "SEX must be one of: M, F, U.",
            requires: &["SEX"],
            on_missing: MissingPolicy::Advise,
            mask: || {
                text_of("SEX")
                    .is_not_null()
                    .and(is_one_of(text_of("SEX"), SEX_TERMS).not())
            },
            evidence: None,
        },
        Rule {
            id: "SDTM_DM_004",
            severity: Severity::Med,
            field: "AGE",
            message: "AGE must be between 0 and 120.",
            requires: &["AGE"],
            on_missing: MissingPolicy::Advise,
            mask: || {
                num_of("AGE").is_not_null().and(
                    num_of("AGE")
                        .lt(lit(AGE_RANGE.0))
                        .or(num_of("AGE").gt(lit(AGE_RANGE.1))),
                )
            },
            evidence: None,
        },
        Rule {
            id: "SDTM_DM_005",
            severity: Severity::Low,
            field: "AGEU",
            message: "AGEU must be one of: YEARS, MONTHS, DAYS when AGE is present.",
            requires: &["AGE", "AGEU"],
            on_missing: MissingPolicy::Advise,
            mask: || {
                num_of("AGE").is_not_null().and(
                    text_of("AGEU")
                        .is_null()
                        .or(is_one_of(text_of("AGEU"), AGE_UNIT_TERMS).not()),
                )
            },
            evidence: None,
        },
        Rule {
            id: "SDTM_DM_006",
            severity: Severity::Low,
            field: "RFSTDTC",
            message: "RFSTDTC must be an ISO date in YYYY-MM-DD form.",
            requires: &["RFSTDTC"],
            on_missing: MissingPolicy::Advise,
            mask: || col("RFSTDTC").is_not_null().and(date_of("RFSTDTC").is_null()),
            evidence: None,
        },
        Rule {
            id: "SDTM_DM_007",
            severity: Severity::Low,
            field: "RFENDTC",
            message: "RFENDTC must be an ISO date in YYYY-MM-DD form.",
            requires: &["RFENDTC"],
            on_missing: MissingPolicy::Advise,
            mask: || col("RFENDTC").is_not_null().and(date_of("RFENDTC").is_null()),
            evidence: None,
        },
        Rule {
            id: "SDTM_DM_008",
            severity: Severity::High,
            field: "RFSTDTC/RFENDTC",
            message: "RFSTDTC must be on or before RFENDTC.",
            requires: &["RFSTDTC", "RFENDTC"],
            on_missing: MissingPolicy::Advise,
            mask: || {
                date_of("RFSTDTC")
                    .is_not_null()
                    .and(date_of("RFENDTC").is_not_null())
                    .and(date_of("RFSTDTC").gt(date_of("RFENDTC")))
            },
            evidence: Some(|| compare_evidence("RFSTDTC", "RFENDTC")),
        },
    ]
}
