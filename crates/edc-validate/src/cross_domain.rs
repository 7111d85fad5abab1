//! Cross-domain consistency checks.
//!
//! Three families: referential anchoring of every dependent domain against
//! DM, and temporal consistency of AE and CM against each subject's vital
//! sign date range. Joins key on the subject identifier cast to its string
//! form, exact match only; identifier-formatting drift is a per-domain rule's
//! problem, never absorbed by the join.

use polars::prelude::{
    DataFrame, DataType, IntoLazy, JoinArgs, JoinType, LazyFrame, PlSmallStr, col,
};
use tracing::debug;

use edc_model::{DomainCode, Finding, FindingType, Severity};

use crate::aggregate::concat_findings;
use crate::error::Result;
use crate::findings::{
    FindingMeta, ROW_INDEX_COL, SUBJECT_KEY, emit_rows, empty_findings, finding_row, has_column,
};
use crate::rules::{date_of, derive_date, range_evidence};

/// Row-index the frame and add the string-cast subject key.
fn keyed(frame: &DataFrame) -> LazyFrame {
    frame
        .clone()
        .lazy()
        .with_row_index(PlSmallStr::from_static(ROW_INDEX_COL), None)
        .with_columns([col("USUBJID").cast(DataType::String).alias(SUBJECT_KEY)])
}

/// Dependent rows whose subject key has no match in `subjects`.
fn orphan_rows(dependent: LazyFrame, subjects: LazyFrame) -> Result<DataFrame> {
    Ok(dependent
        .join(
            subjects,
            [col(SUBJECT_KEY)],
            [col(SUBJECT_KEY)],
            JoinArgs::new(JoinType::Anti),
        )
        .collect()?)
}

/// Referential integrity of a dependent domain against the DM anchor.
///
/// Every dependent subject identifier must exist in DM. Unmatched rows each
/// become one HIGH finding pointing into the dependent table; a table missing
/// its identifier column degrades the whole check to one CRIT finding.
pub fn anchor_link(
    dm: &DataFrame,
    dependent: &DataFrame,
    dependent_domain: DomainCode,
) -> Result<DataFrame> {
    if !has_column(dm, "USUBJID") || !has_column(dependent, "USUBJID") {
        debug!(domain = %dependent_domain, "USUBJID absent, anchor check gated");
        let gate = Finding::dataset_level(
            FindingType::CrossDomain,
            format!("X_DMLINK_{dependent_domain}_000"),
            Severity::Crit,
            DomainCode::Cross,
            "USUBJID",
            format!("Missing USUBJID for DM/{dependent_domain} link check."),
        );
        return finding_row(&gate);
    }

    let anchors = dm
        .clone()
        .lazy()
        .select([col("USUBJID").cast(DataType::String).alias(SUBJECT_KEY)]);
    let orphans = orphan_rows(keyed(dependent), anchors)?;
    if orphans.height() == 0 {
        return Ok(empty_findings());
    }

    let rule_id = format!("X_DMLINK_{dependent_domain}_001");
    let message = format!("{dependent_domain} subject not found in DM (orphan USUBJID).");
    let meta = FindingMeta {
        finding_type: FindingType::CrossDomain,
        rule_id: &rule_id,
        severity: Severity::High,
        domain: DomainCode::Cross,
        field: "USUBJID",
        message: &message,
    };
    emit_rows(orphans, &meta, col(SUBJECT_KEY), col(SUBJECT_KEY))
}

/// Per-subject [min, max] over the parsed dates of `keyed_frame`.
///
/// Subjects with zero parseable dates drop out entirely, so downstream inner
/// joins exclude them from containment checks.
fn subject_ranges(keyed_frame: LazyFrame, min_col: &str, max_col: &str) -> LazyFrame {
    keyed_frame
        .filter(date_of(min_col).is_not_null())
        .group_by([col(SUBJECT_KEY)])
        .agg([
            date_of(min_col).min().alias("__range_min"),
            date_of(max_col).max().alias("__range_max"),
        ])
}

/// Consistency of AE against each subject's vital-sign date range.
pub fn vs_ae_consistency(vs: &DataFrame, ae: &DataFrame) -> Result<DataFrame> {
    let complete = has_column(vs, "USUBJID")
        && has_column(vs, "VSDTC")
        && has_column(ae, "USUBJID")
        && has_column(ae, "AESTDTC");
    if !complete {
        debug!("VS/AE cross-check columns absent, check gated");
        let gate = Finding::dataset_level(
            FindingType::CrossDomain,
            "X_VSAE_000",
            Severity::Crit,
            DomainCode::Cross,
            "USUBJID/--DTC",
            "Missing required columns for VS/AE cross checks \
             (need VS.USUBJID,VSDTC and AE.USUBJID,AESTDTC).",
        );
        return finding_row(&gate);
    }

    let vs_keyed = keyed(vs).with_columns([derive_date("VSDTC")]);
    let ae_keyed = keyed(ae).with_columns([derive_date("AESTDTC")]);
    let mut parts = Vec::new();

    let orphans = orphan_rows(ae_keyed.clone(), vs_keyed.clone().select([col(SUBJECT_KEY)]))?;
    if orphans.height() > 0 {
        let meta = FindingMeta {
            finding_type: FindingType::CrossDomain,
            rule_id: "X_VSAE_001",
            severity: Severity::High,
            domain: DomainCode::Cross,
            field: "USUBJID",
            message: "AE subject not found in VS (orphan USUBJID).",
        };
        parts.push(emit_rows(orphans, &meta, col(SUBJECT_KEY), col(SUBJECT_KEY))?);
    }

    let out_of_range = ae_keyed
        .join(
            subject_ranges(vs_keyed, "VSDTC", "VSDTC"),
            [col(SUBJECT_KEY)],
            [col(SUBJECT_KEY)],
            JoinArgs::new(JoinType::Inner),
        )
        .filter(date_of("AESTDTC").is_not_null().and(
            date_of("AESTDTC")
                .lt(col("__range_min"))
                .or(date_of("AESTDTC").gt(col("__range_max"))),
        ))
        .collect()?;
    if out_of_range.height() > 0 {
        let meta = FindingMeta {
            finding_type: FindingType::CrossDomain,
            rule_id: "X_VSAE_002",
            severity: Severity::Med,
            domain: DomainCode::Cross,
            field: "AESTDTC",
            message: "AE start date is outside the subject's VS date range.",
        };
        parts.push(emit_rows(
            out_of_range,
            &meta,
            col(SUBJECT_KEY),
            range_evidence("AESTDTC", "__range_min", "__range_max"),
        )?);
    }

    concat_findings(parts)
}

/// Consistency of VS against each subject's medication window.
pub fn vs_cm_consistency(vs: &DataFrame, cm: &DataFrame) -> Result<DataFrame> {
    let complete = has_column(vs, "USUBJID")
        && has_column(vs, "VSDTC")
        && has_column(cm, "USUBJID")
        && has_column(cm, "CMSTDTC");
    if !complete {
        debug!("VS/CM cross-check columns absent, check gated");
        let gate = Finding::dataset_level(
            FindingType::CrossDomain,
            "X_VSCM_000",
            Severity::Crit,
            DomainCode::Cross,
            "USUBJID/--DTC",
            "Missing required columns for VS/CM cross checks \
             (need VS.USUBJID,VSDTC and CM.USUBJID,CMSTDTC).",
        );
        return finding_row(&gate);
    }

    let vs_keyed = keyed(vs).with_columns([derive_date("VSDTC")]);
    let cm_keyed = keyed(cm).with_columns([derive_date("CMSTDTC")]);
    let mut parts = Vec::new();

    let orphans = orphan_rows(cm_keyed.clone(), vs_keyed.clone().select([col(SUBJECT_KEY)]))?;
    if orphans.height() > 0 {
        let meta = FindingMeta {
            finding_type: FindingType::CrossDomain,
            rule_id: "X_VSCM_001",
            severity: Severity::High,
            domain: DomainCode::Cross,
            field: "USUBJID",
            message: "CM subject not found in VS (orphan USUBJID).",
        };
        parts.push(emit_rows(orphans, &meta, col(SUBJECT_KEY), col(SUBJECT_KEY))?);
    }

    // The window needs an end date. Without CMENDTC the check is skipped
    // loudly, mirroring the per-domain advisory policy.
    if !has_column(cm, "CMENDTC") {
        debug!("CMENDTC absent, medication window check skipped");
        let advisory = Finding::dataset_level(
            FindingType::CrossDomain,
            "X_VSCM_002",
            Severity::Low,
            DomainCode::Cross,
            "CMENDTC",
            "Column CMENDTC not present; medication window check skipped.",
        );
        parts.push(finding_row(&advisory)?);
        return concat_findings(parts);
    }

    let windows = subject_ranges(
        cm_keyed.with_columns([derive_date("CMENDTC")]),
        "CMSTDTC",
        "CMENDTC",
    );
    let out_of_window = vs_keyed
        .join(
            windows,
            [col(SUBJECT_KEY)],
            [col(SUBJECT_KEY)],
            JoinArgs::new(JoinType::Inner),
        )
        .filter(
            date_of("VSDTC")
                .is_not_null()
                .and(col("__range_max").is_not_null())
                .and(
                    date_of("VSDTC")
                        .lt(col("__range_min"))
                        .or(date_of("VSDTC").gt(col("__range_max"))),
                ),
        )
        .collect()?;
    if out_of_window.height() > 0 {
        let meta = FindingMeta {
            finding_type: FindingType::CrossDomain,
            rule_id: "X_VSCM_002",
            severity: Severity::Low,
            domain: DomainCode::Cross,
            field: "VSDTC",
            message: "VS date is outside the subject's CM medication window.",
        };
        parts.push(emit_rows(
            out_of_window,
            &meta,
            col(SUBJECT_KEY),
            range_evidence("VSDTC", "__range_min", "__range_max"),
        )?);
    }

    concat_findings(parts)
}
