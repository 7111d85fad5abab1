use polars::prelude::PolarsError;
use thiserror::Error;

/// Hard failures only: a table the engine cannot evaluate at all.
///
/// Data-quality problems never surface here; they become findings rows.
#[derive(Debug, Error)]
pub enum ValidateError {
    #[error("table error: {0}")]
    Table(#[from] PolarsError),
    #[error("{0}")]
    Model(#[from] edc_model::ModelError),
}

pub type Result<T> = std::result::Result<T, ValidateError>;
