//! Findings aggregation.

use polars::functions::concat_df_diagonal;
use polars::prelude::DataFrame;

use crate::error::Result;
use crate::findings::{conform, empty_findings};

/// Merge partial findings frames into one schema-stable result.
///
/// Accepts zero tables (empty, fully-typed result), zero-row tables, and
/// tables whose optional columns differ: the concat is a structural union
/// and missing cells become null. Output row order is the append order of
/// the inputs; callers sort at presentation time if they need more.
pub fn concat_findings(parts: Vec<DataFrame>) -> Result<DataFrame> {
    if parts.is_empty() {
        return Ok(empty_findings());
    }
    let stacked = concat_df_diagonal(&parts)?;
    conform(stacked)
}
