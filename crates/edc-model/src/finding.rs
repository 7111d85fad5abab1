//! The findings record: one row per detected issue.
//!
//! Every findings table produced anywhere in the engine carries exactly the
//! nine columns of [`FINDING_COLUMNS`], in order, regardless of which
//! validator produced it. Consumers rely on that schema never drifting
//! across concatenation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Column names of a findings table, in output order.
pub const FINDING_COLUMNS: [&str; 9] = [
    "finding_type",
    "rule_id",
    "severity",
    "domain",
    "field",
    "message",
    "row_index",
    "usubjid",
    "evidence",
];

/// Sentinel `row_index` for dataset-level and join-level findings.
pub const DATASET_ROW: i64 = -1;

/// Category of a finding: a single-domain content/structure rule or a
/// cross-domain consistency check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FindingType {
    #[serde(rename = "SDTM_RULE")]
    SdtmRule,
    #[serde(rename = "CROSS_DOMAIN")]
    CrossDomain,
}

impl FindingType {
    pub fn as_str(self) -> &'static str {
        match self {
            FindingType::SdtmRule => "SDTM_RULE",
            FindingType::CrossDomain => "CROSS_DOMAIN",
        }
    }
}

impl fmt::Display for FindingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Finding severity. The derived ordering is the triage ordering:
/// `Low < Med < High < Crit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    #[serde(rename = "LOW")]
    Low,
    #[serde(rename = "MED")]
    Med,
    #[serde(rename = "HIGH")]
    High,
    #[serde(rename = "CRIT")]
    Crit,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Low => "LOW",
            Severity::Med => "MED",
            Severity::High => "HIGH",
            Severity::Crit => "CRIT",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = ModelError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "LOW" => Ok(Severity::Low),
            "MED" => Ok(Severity::Med),
            "HIGH" => Ok(Severity::High),
            "CRIT" => Ok(Severity::Crit),
            other => Err(ModelError::UnknownSeverity(other.to_string())),
        }
    }
}

/// Domain a finding is attributed to. `Cross` marks findings produced by
/// joins across domains rather than any single table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DomainCode {
    Dm,
    Vs,
    Ae,
    Cm,
    Cross,
}

impl DomainCode {
    pub fn as_str(self) -> &'static str {
        match self {
            DomainCode::Dm => "DM",
            DomainCode::Vs => "VS",
            DomainCode::Ae => "AE",
            DomainCode::Cm => "CM",
            DomainCode::Cross => "CROSS",
        }
    }
}

impl fmt::Display for DomainCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DomainCode {
    type Err = ModelError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "DM" => Ok(DomainCode::Dm),
            "VS" => Ok(DomainCode::Vs),
            "AE" => Ok(DomainCode::Ae),
            "CM" => Ok(DomainCode::Cm),
            "CROSS" => Ok(DomainCode::Cross),
            other => Err(ModelError::UnknownDomain(other.to_string())),
        }
    }
}

/// One detected issue, produced fresh per validation run and never
/// deduplicated: the same source row may legitimately carry findings from
/// several rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub finding_type: FindingType,
    pub rule_id: String,
    pub severity: Severity,
    pub domain: DomainCode,
    /// Implicated column name(s); joined when a rule spans several.
    pub field: String,
    pub message: String,
    /// Zero-based row in the source table, or [`DATASET_ROW`].
    pub row_index: i64,
    /// Best-effort subject identifier, empty when unavailable.
    pub usubjid: String,
    /// Stringified offending value(s).
    pub evidence: String,
}

impl Finding {
    /// A dataset-level finding (`row_index` = -1, no subject, no evidence).
    pub fn dataset_level(
        finding_type: FindingType,
        rule_id: impl Into<String>,
        severity: Severity,
        domain: DomainCode,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            finding_type,
            rule_id: rule_id.into(),
            severity,
            domain,
            field: field.into(),
            message: message.into(),
            row_index: DATASET_ROW,
            usubjid: String::new(),
            evidence: String::new(),
        }
    }

    /// True for findings that mean "this scope could not be evaluated".
    pub fn is_blocking(&self) -> bool {
        self.severity == Severity::Crit
    }
}
