//! Census Visualizations
//!
//! Batch rendering of the analysis page charts as PNG files.

pub mod canvas;
pub mod charts;
mod report;

pub use canvas::{load_font, Canvas};
pub use report::{generate_all, CHART_NAMES, DEFAULT_OUTPUT_DIR};

use thiserror::Error;

/// Errors while rendering charts
#[derive(Debug, Error)]
pub enum ChartError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image encoding failed: {0}")]
    Image(#[from] image::ImageError),
    #[error("Font could not be loaded: {0}")]
    Font(String),
    #[error("Dataset has no records to chart")]
    EmptyDataset,
}
