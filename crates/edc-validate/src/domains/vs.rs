//! Vital signs (VS).

use polars::prelude::{DataFrame, Expr, LazyFrame, col, concat_str, lit};

use edc_model::{DomainCode, Severity};
use edc_model::terminology::{VS_TEST_CODES, VS_UNIT_MAP};

use crate::engine::{ColumnSet, DomainSpec, run_domain};
use crate::error::Result;
use crate::rules::{
    MissingPolicy, Rule, date_of, derive_date, derive_decimal, derive_text, is_one_of,
    missing_or_blank, num_of, text_of,
};

const MANDATORY: &[&str] = &["USUBJID", "VSTESTCD", "VSORRES", "VSDTC"];

pub fn validate(frame: &DataFrame) -> Result<DataFrame> {
    run_domain(
        frame,
        &DomainSpec {
            domain: DomainCode::Vs,
            mandatory: MANDATORY,
            prepare,
            rules,
        },
    )
}

fn prepare(lazy: LazyFrame, columns: &ColumnSet) -> LazyFrame {
    let mut derived = vec![
        derive_text("USUBJID"),
        derive_text("VSTESTCD"),
        derive_text("VSORRES"),
        derive_decimal("VSORRES"),
        derive_date("VSDTC"),
    ];
    if columns.contains("VSORRESU") {
        derived.push(derive_text("VSORRESU"));
    }
    lazy.with_columns(derived)
}

/// Mask for units inconsistent with their test code: for each known code,
/// a present unit that is not in that code's allowed list.
fn bad_unit_mask() -> Expr {
    VS_UNIT_MAP.iter().fold(lit(false), |acc, (code, units)| {
        acc.or(text_of("VSTESTCD")
            .eq(lit(*code))
            .and(text_of("VSORRESU").is_not_null())
            .and(is_one_of(text_of("VSORRESU"), units).not()))
    })
}

fn rules() -> Vec<Rule> {
    vec![
        Rule {
            id: "SDTM_VS_001",
            severity: Severity::High,
            field: "USUBJID",
            message: "USUBJID is required and must be non-empty.",
            requires: &["USUBJID"],
            on_missing: MissingPolicy::Skip,
            mask: || missing_or_blank("USUBJID"),
            evidence: None,
        },
        Rule {
            id: "SDTM_VS_002",
            severity: Severity::Med,
            field: "VSTESTCD",
            message: "VSTESTCD must be one of: SYSBP, DIABP, HR, TEMP, WEIGHT, HEIGHT, RESP.",
            requires: &["VSTESTCD"],
            on_missing: MissingPolicy::Skip,
            mask: || {
                text_of("VSTESTCD")
                    .is_not_null()
                    .and(is_one_of(text_of("VSTESTCD"), VS_TEST_CODES).not())
            },
            evidence: None,
        },
        Rule {
            id: "SDTM_VS_003",
            severity: Severity::Low,
            field: "VSDTC",
            message: "VSDTC must be an ISO date in YYYY-MM-DD form.",
            requires: &["VSDTC"],
            on_missing: MissingPolicy::Skip,
            mask: || col("VSDTC").is_not_null().and(date_of("VSDTC").is_null()),
            evidence: None,
        },
        Rule {
            id: "SDTM_VS_004",
            severity: Severity::High,
            field: "VSORRES",
            message: "VSORRES must be numeric for this VSTESTCD.",
            requires: &["VSTESTCD", "VSORRES"],
            on_missing: MissingPolicy::Skip,
            mask: || {
                is_one_of(text_of("VSTESTCD"), VS_TEST_CODES)
                    .and(col("VSORRES").is_not_null())
                    .and(num_of("VSORRES").is_null())
            },
            evidence: None,
        },
        Rule {
            id: "SDTM_VS_005",
            severity: Severity::Med,
            field: "VSORRESU",
            message: "VSORRESU is not an allowed unit for its VSTESTCD.",
            requires: &["VSORRESU"],
            on_missing: MissingPolicy::Advise,
            mask: bad_unit_mask,
            evidence: Some(|| {
                concat_str([text_of("VSTESTCD"), text_of("VSORRESU")], " / ", false)
            }),
        },
    ]
}
