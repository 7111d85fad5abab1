//! Rule registry primitives and shared column expressions.
//!
//! A [`Rule`] is a pure predicate with identity: a stable id, a fixed
//! severity, a declared required-column set, and a whole-column boolean mask
//! over the prepared frame (true = violation). Availability is checked
//! uniformly by the engine before a rule runs; rule bodies never probe for
//! columns themselves.

use polars::prelude::{DataType, Expr, NULL, StrptimeOptions, col, concat_str, lit};

use edc_model::Severity;
use edc_model::terminology::ISO_DATE_FORMAT;

/// What to do when a rule's required columns are absent from the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingPolicy {
    /// Do not run; the gap is already covered by the domain gate.
    Skip,
    /// Do not run, but emit one LOW dataset-level skip notice so the absent
    /// check is never mistaken for a pass.
    Advise,
}

/// A single content or structural rule for one domain.
pub struct Rule {
    /// Stable rule code carried into every finding row.
    pub id: &'static str,
    pub severity: Severity,
    /// Implicated column name(s), `/`-joined for comparison rules.
    pub field: &'static str,
    pub message: &'static str,
    /// Source columns that must exist for this rule to run.
    pub requires: &'static [&'static str],
    pub on_missing: MissingPolicy,
    /// Violation mask over the prepared frame.
    pub mask: fn() -> Expr,
    /// Evidence for flagged rows; `None` means the target field as text.
    pub evidence: Option<fn() -> Expr>,
}

// Derived helper columns live next to the source columns in the prepared
// frame under suffixed names, so masks stay plain column references.

/// String-cast helper column for `name`.
pub fn text_of(name: &str) -> Expr {
    col(format!("{name}__txt"))
}

/// Parsed-date helper column for `name`; null where the parse failed.
pub fn date_of(name: &str) -> Expr {
    col(format!("{name}__dt"))
}

/// Decimal helper column for `name`; null where the value is not numeric.
pub fn num_of(name: &str) -> Expr {
    col(format!("{name}__num"))
}

/// Derive the string form of a column, non-strict.
pub fn derive_text(name: &str) -> Expr {
    col(name)
        .cast(DataType::String)
        .alias(format!("{name}__txt"))
}

/// Derive a strict `YYYY-MM-DD` parse of a column. Values that fail the
/// parse become null while the source stays non-null, which is exactly what
/// the format rules test for.
pub fn derive_date(name: &str) -> Expr {
    col(name)
        .cast(DataType::String)
        .str()
        .to_date(StrptimeOptions {
            format: Some(ISO_DATE_FORMAT.into()),
            strict: false,
            exact: true,
            cache: true,
        })
        .alias(format!("{name}__dt"))
}

/// Derive a decimal parse of a column, normalizing comma decimal separators
/// first. Unparseable values become null.
pub fn derive_decimal(name: &str) -> Expr {
    col(name)
        .cast(DataType::String)
        .str()
        .replace_all(lit(","), lit("."), true)
        .cast(DataType::Float64)
        .alias(format!("{name}__num"))
}

/// Membership in a fixed controlled-terminology set, exact match.
pub fn is_one_of(value: Expr, allowed: &[&str]) -> Expr {
    allowed.iter().fold(lit(false), |acc, term| {
        acc.or(value.clone().eq(lit(*term)))
    })
}

/// Null or whitespace-only, over a text helper column.
pub fn missing_or_blank(name: &str) -> Expr {
    let value = text_of(name);
    value
        .clone()
        .is_null()
        .or(value.str().strip_chars(lit(NULL)).eq(lit("")))
}

/// Evidence for interval-ordering rules: `"<left> > <right>"`.
pub fn compare_evidence(left: &'static str, right: &'static str) -> Expr {
    concat_str(
        [
            col(left).cast(DataType::String),
            col(right).cast(DataType::String),
        ],
        " > ",
        false,
    )
}

/// Evidence for range-containment checks: `"<value> vs [<min>, <max>]"`.
pub fn range_evidence(value: &str, min: &str, max: &str) -> Expr {
    concat_str(
        [
            col(value).cast(DataType::String),
            lit(" vs ["),
            col(min).cast(DataType::String),
            lit(", "),
            col(max).cast(DataType::String),
            lit("]"),
        ],
        "",
        false,
    )
}
