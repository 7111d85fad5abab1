//! Findings-frame construction.
//!
//! All findings produced by the engine flow through this module so the
//! nine-column schema stays identical no matter which validator emitted the
//! rows. [`conform`] is the single place that casts, fills, and orders
//! columns; every builder ends by calling it.

use polars::prelude::{
    DataFrame, DataType, Expr, Field, IntoLazy, NULL, Schema, col, df, lit,
};

use edc_model::{DomainCode, Finding, FindingType, Severity};

use crate::error::Result;

/// Internal row-pointer column added to a source table before rule
/// evaluation. Double-underscored so it cannot collide with a domain column.
pub const ROW_INDEX_COL: &str = "__row";

/// Internal join key: the subject identifier cast to its string form.
/// Exact match only; no trimming or case folding happens on this column.
pub const SUBJECT_KEY: &str = "__subject";

/// The fixed schema every findings frame carries.
pub fn findings_schema() -> Schema {
    Schema::from_iter([
        Field::new("finding_type".into(), DataType::String),
        Field::new("rule_id".into(), DataType::String),
        Field::new("severity".into(), DataType::String),
        Field::new("domain".into(), DataType::String),
        Field::new("field".into(), DataType::String),
        Field::new("message".into(), DataType::String),
        Field::new("row_index".into(), DataType::Int64),
        Field::new("usubjid".into(), DataType::String),
        Field::new("evidence".into(), DataType::String),
    ])
}

/// A findings frame with zero rows and the full schema.
pub fn empty_findings() -> DataFrame {
    DataFrame::empty_with_schema(&findings_schema())
}

/// Cast, backfill, and reorder a frame to the findings schema.
///
/// Columns absent from the input become all-null; extra columns are dropped.
pub fn conform(frame: DataFrame) -> Result<DataFrame> {
    let schema = findings_schema();
    let present: Vec<String> = frame
        .get_column_names()
        .iter()
        .map(|name| name.as_str().to_string())
        .collect();

    let mut lazy = frame.lazy();
    let backfill: Vec<Expr> = schema
        .iter()
        .filter(|(name, _)| !present.iter().any(|c| c == name.as_str()))
        .map(|(name, dtype)| lit(NULL).cast(dtype.clone()).alias(name.clone()))
        .collect();
    if !backfill.is_empty() {
        lazy = lazy.with_columns(backfill);
    }

    let ordered: Vec<Expr> = schema
        .iter()
        .map(|(name, dtype)| col(name.clone()).cast(dtype.clone()).alias(name.clone()))
        .collect();
    Ok(lazy.select(ordered).collect()?)
}

/// True when the table has a column with exactly this name.
///
/// Lookup is case-sensitive by contract: loaders must not rename columns,
/// and the engine never guesses.
pub fn has_column(frame: &DataFrame, name: &str) -> bool {
    frame
        .get_column_names()
        .iter()
        .any(|column| column.as_str() == name)
}

/// Identity of the finding rows a single rule emission produces.
#[derive(Debug, Clone, Copy)]
pub struct FindingMeta<'a> {
    pub finding_type: FindingType,
    pub rule_id: &'a str,
    pub severity: Severity,
    pub domain: DomainCode,
    pub field: &'a str,
    pub message: &'a str,
}

/// One typed finding as a single-row findings frame.
pub fn finding_row(finding: &Finding) -> Result<DataFrame> {
    let frame = df!(
        "finding_type" => [finding.finding_type.as_str()],
        "rule_id" => [finding.rule_id.as_str()],
        "severity" => [finding.severity.as_str()],
        "domain" => [finding.domain.as_str()],
        "field" => [finding.field.as_str()],
        "message" => [finding.message.as_str()],
        "row_index" => [finding.row_index],
        "usubjid" => [finding.usubjid.as_str()],
        "evidence" => [finding.evidence.as_str()],
    )?;
    conform(frame)
}

/// Turn already-selected violation rows into findings.
///
/// `hits` must carry [`ROW_INDEX_COL`]; `usubjid` and `evidence` are
/// evaluated against it and stringified best-effort.
pub fn emit_rows(
    hits: DataFrame,
    meta: &FindingMeta<'_>,
    usubjid: Expr,
    evidence: Expr,
) -> Result<DataFrame> {
    let selected = hits
        .lazy()
        .select([
            lit(meta.finding_type.as_str()).alias("finding_type"),
            lit(meta.rule_id).alias("rule_id"),
            lit(meta.severity.as_str()).alias("severity"),
            lit(meta.domain.as_str()).alias("domain"),
            lit(meta.field).alias("field"),
            lit(meta.message).alias("message"),
            col(ROW_INDEX_COL).cast(DataType::Int64).alias("row_index"),
            usubjid
                .cast(DataType::String)
                .fill_null(lit(""))
                .alias("usubjid"),
            evidence
                .cast(DataType::String)
                .fill_null(lit(""))
                .alias("evidence"),
        ])
        .collect()?;
    conform(selected)
}

/// Evaluate a violation mask over a prepared frame and emit one finding per
/// masked row. Null mask cells count as "no violation".
pub fn mask_findings(
    prepared: &DataFrame,
    mask: Expr,
    meta: &FindingMeta<'_>,
    usubjid: Expr,
    evidence: Expr,
) -> Result<DataFrame> {
    let hits = prepared.clone().lazy().filter(mask).collect()?;
    if hits.height() == 0 {
        return Ok(empty_findings());
    }
    emit_rows(hits, meta, usubjid, evidence)
}

#[cfg(test)]
mod tests {
    use super::*;
    use edc_model::FINDING_COLUMNS;

    #[test]
    fn empty_findings_has_full_schema() {
        let frame = empty_findings();
        assert_eq!(frame.height(), 0);
        let names: Vec<&str> = frame
            .get_column_names()
            .iter()
            .map(|name| name.as_str())
            .collect();
        assert_eq!(names, FINDING_COLUMNS);
    }

    #[test]
    fn finding_row_round_trips_dataset_level() {
        let finding = Finding::dataset_level(
            FindingType::CrossDomain,
            "X_VSAE_000",
            Severity::Crit,
            DomainCode::Cross,
            "USUBJID/--DTC",
            "Missing required columns for VS/AE cross checks.",
        );
        let frame = finding_row(&finding).unwrap();
        assert_eq!(frame.height(), 1);
        let row_index = frame.column("row_index").unwrap().i64().unwrap().get(0);
        assert_eq!(row_index, Some(-1));
        let usubjid = frame.column("usubjid").unwrap().str().unwrap().get(0);
        assert_eq!(usubjid, Some(""));
    }
}
