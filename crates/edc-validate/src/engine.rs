//! Uniform per-domain rule execution.
//!
//! Every domain validator is the same machine: gate on mandatory columns,
//! derive helper columns once, then evaluate each registered rule as a
//! vectorized mask over the whole table. Rules are independent; a row may
//! trigger several.

use std::collections::BTreeSet;

use polars::prelude::{DataFrame, DataType, IntoLazy, LazyFrame, PlSmallStr, col};
use tracing::debug;

use edc_model::{DomainCode, Finding, FindingType, Severity};

use crate::aggregate::concat_findings;
use crate::error::Result;
use crate::findings::{FindingMeta, ROW_INDEX_COL, finding_row, mask_findings};
use crate::rules::{MissingPolicy, Rule, text_of};

/// Exact, case-sensitive view of a table's column names.
pub struct ColumnSet(BTreeSet<String>);

impl ColumnSet {
    pub fn of(frame: &DataFrame) -> Self {
        Self(
            frame
                .get_column_names()
                .iter()
                .map(|name| name.as_str().to_string())
                .collect(),
        )
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }
}

/// Everything the engine needs to validate one domain.
pub struct DomainSpec {
    pub domain: DomainCode,
    /// Columns without which no rule for the domain runs.
    pub mandatory: &'static [&'static str],
    /// Adds the derived helper columns for mandatory and present optional
    /// columns. Receives the row-indexed source frame.
    pub prepare: fn(LazyFrame, &ColumnSet) -> LazyFrame,
    pub rules: fn() -> Vec<Rule>,
}

/// Run a domain's registry against one table, producing a findings frame.
///
/// The input is never mutated; derived columns live only in an internal
/// working copy.
pub fn run_domain(frame: &DataFrame, spec: &DomainSpec) -> Result<DataFrame> {
    let columns = ColumnSet::of(frame);

    let missing: Vec<&str> = spec
        .mandatory
        .iter()
        .copied()
        .filter(|name| !columns.contains(name))
        .collect();
    if !missing.is_empty() {
        debug!(domain = %spec.domain, ?missing, "mandatory columns absent, domain gated");
        let gate = Finding::dataset_level(
            FindingType::SdtmRule,
            format!("SDTM_{}_000", spec.domain),
            Severity::Crit,
            spec.domain,
            missing.join(","),
            format!(
                "Missing required columns for {}: {}",
                spec.domain,
                missing.join(", ")
            ),
        );
        return finding_row(&gate);
    }

    let prepared = (spec.prepare)(
        frame
            .clone()
            .lazy()
            .with_row_index(PlSmallStr::from_static(ROW_INDEX_COL), None),
        &columns,
    )
    .collect()?;

    let mut parts = Vec::new();
    for rule in (spec.rules)() {
        let absent: Vec<&str> = rule
            .requires
            .iter()
            .copied()
            .filter(|name| !columns.contains(name))
            .collect();
        if !absent.is_empty() {
            match rule.on_missing {
                MissingPolicy::Skip => {
                    debug!(rule = rule.id, ?absent, "optional columns absent, rule skipped");
                }
                MissingPolicy::Advise => {
                    debug!(rule = rule.id, ?absent, "optional columns absent, advisory emitted");
                    let advisory = Finding::dataset_level(
                        FindingType::SdtmRule,
                        rule.id,
                        Severity::Low,
                        spec.domain,
                        absent.join(","),
                        format!(
                            "Column {} not present; rule {} skipped.",
                            absent.join(", "),
                            rule.id
                        ),
                    );
                    parts.push(finding_row(&advisory)?);
                }
            }
            continue;
        }

        let meta = FindingMeta {
            finding_type: FindingType::SdtmRule,
            rule_id: rule.id,
            severity: rule.severity,
            domain: spec.domain,
            field: rule.field,
            message: rule.message,
        };
        let evidence = match rule.evidence {
            Some(expr) => expr(),
            None => col(rule.field).cast(DataType::String),
        };
        let emitted = mask_findings(&prepared, (rule.mask)(), &meta, text_of("USUBJID"), evidence)?;
        if emitted.height() > 0 {
            parts.push(emitted);
        }
    }

    let findings = concat_findings(parts)?;
    debug!(domain = %spec.domain, rows = findings.height(), "domain rules evaluated");
    Ok(findings)
}
