//! Consistency checking for tabular clinical-trial exports.
//!
//! Input is one polars `DataFrame` per SDTM-like domain (DM, VS, AE, CM);
//! output is a single findings frame with a fixed nine-column schema. All
//! validators are pure: data-quality problems become findings, never errors.
//! Only a structurally corrupt table aborts a run.

pub mod aggregate;
pub mod cross_domain;
pub mod domains;
pub mod engine;
pub mod error;
pub mod findings;
pub mod rules;

pub use aggregate::concat_findings;
pub use cross_domain::{anchor_link, vs_ae_consistency, vs_cm_consistency};
pub use error::{Result, ValidateError};
pub use findings::{empty_findings, findings_schema};

use polars::prelude::DataFrame;
use tracing::info;

use edc_model::DomainCode;

/// The domain tables of one study export. Absent tables are simply not
/// validated; no finding is produced for a table that was never loaded.
#[derive(Debug, Default)]
pub struct StudyTables {
    pub dm: Option<DataFrame>,
    pub vs: Option<DataFrame>,
    pub ae: Option<DataFrame>,
    pub cm: Option<DataFrame>,
}

/// Run every applicable check over a study and aggregate the findings.
///
/// Order of parts: per-domain DM, VS, AE, CM; DM anchoring of VS, AE, CM;
/// VS/AE consistency; VS/CM consistency. Cross checks run only when both
/// sides are present.
pub fn validate_study(tables: &StudyTables) -> Result<DataFrame> {
    let mut parts = Vec::new();

    if let Some(dm) = &tables.dm {
        parts.push(domains::dm::validate(dm)?);
    }
    if let Some(vs) = &tables.vs {
        parts.push(domains::vs::validate(vs)?);
    }
    if let Some(ae) = &tables.ae {
        parts.push(domains::ae::validate(ae)?);
    }
    if let Some(cm) = &tables.cm {
        parts.push(domains::cm::validate(cm)?);
    }

    if let Some(dm) = &tables.dm {
        if let Some(vs) = &tables.vs {
            parts.push(anchor_link(dm, vs, DomainCode::Vs)?);
        }
        if let Some(ae) = &tables.ae {
            parts.push(anchor_link(dm, ae, DomainCode::Ae)?);
        }
        if let Some(cm) = &tables.cm {
            parts.push(anchor_link(dm, cm, DomainCode::Cm)?);
        }
    }

    if let (Some(vs), Some(ae)) = (&tables.vs, &tables.ae) {
        parts.push(vs_ae_consistency(vs, ae)?);
    }
    if let (Some(vs), Some(cm)) = (&tables.vs, &tables.cm) {
        parts.push(vs_cm_consistency(vs, cm)?);
    }

    let findings = concat_findings(parts)?;
    info!(rows = findings.height(), "study validation complete");
    Ok(findings)
}
