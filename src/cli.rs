use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

use crate::dataset::{BatchAnalyzer, Sample};
use crate::image_quality::{ImageAnalyzer, RasterImage};
use crate::scoring::{calc_total_score, format_score, Grade};
use crate::settings::{AnalyzerSettings, SettingsStore};
use crate::text_quality::{EmbeddingService, SpellCheckHooks, TextAnalyzer};

const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

#[derive(Parser, Debug)]
#[command(name = "dataqa")]
#[command(version, about = "Quality scoring for AI training data (text and images)", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Score text files
    Text {
        /// Input text files
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Treat every non-empty line as its own sample
        #[arg(long)]
        per_line: bool,

        #[command(flatten)]
        batch: BatchArgs,
    },

    /// Score image files
    Image {
        /// Input image files (any format the `image` crate decodes)
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        #[command(flatten)]
        batch: BatchArgs,
    },
}

#[derive(Args, Debug)]
struct BatchArgs {
    /// Subsample collections larger than this
    #[arg(long)]
    max_samples: Option<usize>,

    /// Seed for subsampling, for reproducible reports
    #[arg(long)]
    seed: Option<u64>,

    /// Analyze items in parallel
    #[arg(long)]
    parallel: bool,

    /// Settings file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl BatchArgs {
    fn settings(&self) -> Result<AnalyzerSettings> {
        let mut settings = match &self.config {
            Some(path) => SettingsStore::new(path.clone())?.settings(),
            None => AnalyzerSettings::default(),
        };

        if let Some(max_samples) = self.max_samples {
            settings.max_samples = max_samples;
        }
        if let Some(seed) = self.seed {
            settings.seed = Some(seed);
        }
        settings.parallel |= self.parallel;
        Ok(settings)
    }
}

/// A single scored item as printed by the CLI.
#[derive(Serialize)]
struct ItemOutput<T: Serialize> {
    source: String,
    total: f64,
    grade: Grade,
    verdict: &'static str,
    #[serde(flatten)]
    details: T,
}

impl<T: Serialize> ItemOutput<T> {
    fn new(source: &Path, total: f64, details: T) -> Self {
        let grade = Grade::from_score(total);
        log_info!(
            "{}: total {} (grade {grade})",
            source.display(),
            format_score(total, 3)
        );
        Self {
            source: source.display().to_string(),
            total,
            grade,
            verdict: grade.description(),
            details,
        }
    }
}

pub fn execute(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Text {
            inputs,
            per_line,
            batch,
        } => score_texts(&inputs, per_line, &batch),
        Commands::Image { inputs, batch } => score_images(&inputs, &batch),
    }
}

fn text_analyzer(settings: &AnalyzerSettings) -> TextAnalyzer {
    let embeddings = Arc::new(EmbeddingService::local(&settings.embedding));
    // load the model up front instead of on the first sentence batch
    if let Err(err) = embeddings.initialize() {
        log_warn!("{err}; duplication will use the lexical estimate");
    }
    TextAnalyzer::new(settings.text_config(), embeddings, SpellCheckHooks::new())
}

fn score_texts(inputs: &[PathBuf], per_line: bool, args: &BatchArgs) -> Result<()> {
    let settings = args.settings()?;
    let analyzer = text_analyzer(&settings);

    let mut samples = Vec::new();
    for path in inputs {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read text from {}", path.display()))?;
        if per_line {
            samples.extend(
                contents
                    .lines()
                    .filter(|line| !line.trim().is_empty())
                    .map(Sample::from),
            );
        } else {
            samples.push(Sample::Text(contents));
        }
    }

    if let ([path], [Sample::Text(text)]) = (inputs, samples.as_slice()) {
        let mut rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let quality = analyzer.inspect_with_rng(text, &mut rng);
        let total = calc_total_score(&quality.metrics);
        return print_json(&ItemOutput::new(path, total, quality));
    }

    let report = BatchAnalyzer::new(settings.batch_config(), analyzer).analyze(&samples)?;
    print_json(&report)
}

fn load_image(path: &Path) -> Result<RasterImage> {
    let decoded =
        image::open(path).with_context(|| format!("Failed to decode image {}", path.display()))?;
    RasterImage::from_dynamic(&decoded)
        .with_context(|| format!("Unusable raster in {}", path.display()))
}

fn score_images(inputs: &[PathBuf], args: &BatchArgs) -> Result<()> {
    let settings = args.settings()?;

    if let [path] = inputs {
        let img = load_image(path)?;
        let quality = ImageAnalyzer::new().inspect(&img, true)?;
        let total = calc_total_score(&quality.metrics);
        return print_json(&ItemOutput::new(path, total, quality));
    }

    let samples = inputs
        .iter()
        .map(|path| load_image(path).map(Sample::Image))
        .collect::<Result<Vec<_>>>()?;

    let batch = BatchAnalyzer::new(settings.batch_config(), TextAnalyzer::default());
    let report = batch.analyze(&samples)?;
    print_json(&report)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("Failed to render report")?;
    println!("{rendered}");
    Ok(())
}
