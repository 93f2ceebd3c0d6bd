use thiserror::Error;

use crate::loader::DataLoadError;
use crate::report::RenderError;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("failed to load station data: {0}")]
    DataLoad(#[from] DataLoadError),

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars operation failed: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("report rendering failed: {0}")]
    Render(#[from] RenderError),

    #[error("day window must be between {min} and {max} days, got {got}")]
    InvalidDayWindow { min: u32, max: u32, got: u32 },
}

pub type Result<T> = std::result::Result<T, PipelineError>;
