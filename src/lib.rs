//! Quality scoring for unstructured AI training data.
//!
//! Images are scored on resolution, optical validity (sharpness and noise) and
//! set-level duplication; texts on accuracy, sentence duplication and
//! completeness. [`analyze_batch`] aggregates a collection into a
//! [`DatasetReport`] with an overall [`Grade`].

pub mod cli;
pub mod dataset;
pub mod error;
pub mod image_quality;
pub mod scoring;
pub mod settings;
pub mod text_quality;
pub mod utils;

pub use dataset::{analyze_batch, BatchAnalyzer, BatchConfig, DatasetReport, Sample};
pub use error::{QualityError, Result};
pub use image_quality::{analyze_image, ImageAnalyzer, RasterImage};
pub use scoring::{calc_total_score, get_grade, Grade, Measured, Metric, MetricSet, MetricValue};
pub use text_quality::{analyze_text, EmbeddingService, TextAnalyzer, TextConfig};

use clap::Parser;

const ENABLE_LOGS: bool = true;

/// Entry point of the `dataqa` binary.
pub fn run() -> anyhow::Result<()> {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let cli = cli::Cli::parse();
    cli::execute(cli).map_err(|err| {
        log_error!("dataqa failed: {err:#}");
        err
    })
}
