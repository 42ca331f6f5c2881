//! Sentence embedding service.
//!
//! The service owns a primary and an optional fallback [`EncoderLoader`]. The
//! first successful load is kept for the life of the service; loading happens
//! on [`EmbeddingService::initialize`] or lazily on the first encode.
//!
//! The bundled [`HashedNgramEncoder`] projects character or word n-grams into a
//! fixed-size vector with signed feature hashing. It needs no model files, so
//! the analyzer always has a working semantic-ish backend. Transformer models
//! plug in by implementing [`SentenceEncoder`] and [`EncoderLoader`].

use std::fmt;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use thiserror::Error;

const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

pub const HASHED_CHAR_NGRAM_MODEL: &str = "hashed-char-ngram";
pub const HASHED_WORD_MODEL: &str = "hashed-word";
pub const DEFAULT_DIMENSIONS: usize = 384;

// Fixed seeds keep embeddings stable across runs and processes.
const HASH_SEEDS: [u64; 4] = [
    0x243f_6a88_85a3_08d3,
    0x1319_8a2e_0370_7344,
    0xa409_3822_299f_31d0,
    0x082e_fa98_ec4e_6c89,
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmbeddingError {
    #[error("no embedding model could be loaded: {0}")]
    Unavailable(String),

    #[error("embedding failed: {0}")]
    Encode(String),
}

/// Turns sentences into fixed-size vectors.
pub trait SentenceEncoder: Send + Sync {
    fn model_name(&self) -> &str;

    /// One vector per input sentence, in order.
    fn encode(&self, sentences: &[&str]) -> anyhow::Result<Vec<Vec<f32>>>;
}

/// Loads a [`SentenceEncoder`]; may be slow (model files, weights).
pub trait EncoderLoader: Send + Sync {
    fn model_name(&self) -> &str;

    fn load(&self) -> anyhow::Result<Arc<dyn SentenceEncoder>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NgramMode {
    /// Character n-grams with `min..=max` characters.
    Chars { min: usize, max: usize },
    /// Unigrams and bigrams of whitespace tokens.
    Words,
}

pub struct HashedNgramEncoder {
    name: String,
    dimensions: usize,
    mode: NgramMode,
    hasher: ahash::RandomState,
}

impl fmt::Debug for HashedNgramEncoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashedNgramEncoder")
            .field("name", &self.name)
            .field("dimensions", &self.dimensions)
            .field("mode", &self.mode)
            .finish()
    }
}

impl HashedNgramEncoder {
    pub fn new(name: impl Into<String>, dimensions: usize, mode: NgramMode) -> Self {
        let [k0, k1, k2, k3] = HASH_SEEDS;
        let mode = match mode {
            NgramMode::Chars { min, max } => {
                let min = min.max(1);
                NgramMode::Chars { min, max: max.max(min) }
            }
            NgramMode::Words => NgramMode::Words,
        };
        Self {
            name: name.into(),
            dimensions: dimensions.max(1),
            mode,
            hasher: ahash::RandomState::with_seeds(k0, k1, k2, k3),
        }
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn features(&self, sentence: &str) -> Vec<String> {
        let normalized = sentence
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();

        match self.mode {
            NgramMode::Chars { min, max } => {
                let chars: Vec<char> = normalized.chars().collect();
                if chars.len() < min {
                    return if chars.is_empty() { Vec::new() } else { vec![normalized] };
                }
                (min..=max)
                    .flat_map(|n| chars.windows(n).map(|w| w.iter().collect::<String>()))
                    .collect()
            }
            NgramMode::Words => {
                let words: Vec<&str> = normalized.split(' ').filter(|w| !w.is_empty()).collect();
                let bigrams = words.windows(2).map(|pair| format!("{} {}", pair[0], pair[1]));
                words.iter().map(|w| w.to_string()).chain(bigrams).collect()
            }
        }
    }

    fn embed(&self, sentence: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];

        for feature in self.features(sentence) {
            let hash = self.hasher.hash_one(&feature);
            let index = (hash % self.dimensions as u64) as usize;
            let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
            vector[index] += sign;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|v| *v /= norm);
        }
        vector
    }
}

impl SentenceEncoder for HashedNgramEncoder {
    fn model_name(&self) -> &str {
        &self.name
    }

    fn encode(&self, sentences: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
        Ok(sentences.iter().map(|s| self.embed(s)).collect())
    }
}

/// Loader for the bundled hashed encoders, selected by model name.
#[derive(Debug, Clone)]
pub struct LocalModelLoader {
    name: String,
    dimensions: usize,
}

impl LocalModelLoader {
    pub fn new(name: impl Into<String>, dimensions: usize) -> Self {
        Self {
            name: name.into(),
            dimensions,
        }
    }
}

impl EncoderLoader for LocalModelLoader {
    fn model_name(&self) -> &str {
        &self.name
    }

    fn load(&self) -> anyhow::Result<Arc<dyn SentenceEncoder>> {
        if self.dimensions == 0 {
            anyhow::bail!("model '{}' configured with zero dimensions", self.name);
        }

        let mode = match self.name.as_str() {
            HASHED_CHAR_NGRAM_MODEL => NgramMode::Chars { min: 2, max: 3 },
            HASHED_WORD_MODEL => NgramMode::Words,
            other => anyhow::bail!("unknown local embedding model '{other}'"),
        };

        Ok(Arc::new(HashedNgramEncoder::new(
            self.name.clone(),
            self.dimensions,
            mode,
        )))
    }
}

/// Which models the service tries, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub primary_model: String,
    pub fallback_model: Option<String>,
    pub dimensions: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            primary_model: HASHED_CHAR_NGRAM_MODEL.to_string(),
            fallback_model: Some(HASHED_WORD_MODEL.to_string()),
            dimensions: DEFAULT_DIMENSIONS,
        }
    }
}

enum ServiceState {
    Uninitialized,
    Ready(Arc<dyn SentenceEncoder>),
    Unavailable(String),
}

/// Shared, lazily initialized embedding backend.
pub struct EmbeddingService {
    primary: Box<dyn EncoderLoader>,
    fallback: Option<Box<dyn EncoderLoader>>,
    state: RwLock<ServiceState>,
}

impl fmt::Debug for EmbeddingService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbeddingService")
            .field("primary", &self.primary.model_name())
            .field("fallback", &self.fallback.as_ref().map(|l| l.model_name()))
            .field("active_model", &self.active_model())
            .finish()
    }
}

impl Default for EmbeddingService {
    fn default() -> Self {
        Self::local(&EmbeddingSettings::default())
    }
}

impl EmbeddingService {
    pub fn new(primary: Box<dyn EncoderLoader>, fallback: Option<Box<dyn EncoderLoader>>) -> Self {
        Self {
            primary,
            fallback,
            state: RwLock::new(ServiceState::Uninitialized),
        }
    }

    /// Service backed by the bundled hashed encoders.
    pub fn local(settings: &EmbeddingSettings) -> Self {
        let primary = LocalModelLoader::new(settings.primary_model.clone(), settings.dimensions);
        let fallback = settings
            .fallback_model
            .as_ref()
            .map(|name| {
                Box::new(LocalModelLoader::new(name.clone(), settings.dimensions))
                    as Box<dyn EncoderLoader>
            });
        Self::new(Box::new(primary), fallback)
    }

    /// Process-wide service with the default local models, loaded at most once.
    pub fn shared() -> Arc<EmbeddingService> {
        static SHARED: OnceLock<Arc<EmbeddingService>> = OnceLock::new();
        Arc::clone(SHARED.get_or_init(|| Arc::new(EmbeddingService::default())))
    }

    /// Load the primary model, or the fallback if the primary fails. A
    /// second call after success is a no-op; after failure it retries.
    pub fn initialize(&self) -> Result<(), EmbeddingError> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if matches!(*state, ServiceState::Ready(_)) {
            return Ok(());
        }

        match self.load() {
            Ok(encoder) => {
                *state = ServiceState::Ready(encoder);
                Ok(())
            }
            Err(reason) => {
                *state = ServiceState::Unavailable(reason.clone());
                Err(EmbeddingError::Unavailable(reason))
            }
        }
    }

    fn load(&self) -> Result<Arc<dyn SentenceEncoder>, String> {
        let primary_err = match self.primary.load() {
            Ok(encoder) => {
                log_info!("embedding model loaded: {}", encoder.model_name());
                return Ok(encoder);
            }
            Err(err) => {
                log_warn!(
                    "primary embedding model '{}' failed to load: {err:#}",
                    self.primary.model_name()
                );
                format!("{}: {err:#}", self.primary.model_name())
            }
        };

        let Some(fallback) = &self.fallback else {
            return Err(primary_err);
        };

        fallback
            .load()
            .map(|encoder| {
                log_info!("using fallback embedding model: {}", encoder.model_name());
                encoder
            })
            .map_err(|err| {
                log_warn!(
                    "fallback embedding model '{}' failed to load: {err:#}",
                    fallback.model_name()
                );
                format!("{primary_err}; {}: {err:#}", fallback.model_name())
            })
    }

    pub fn is_ready(&self) -> bool {
        matches!(
            *self.state.read().unwrap_or_else(PoisonError::into_inner),
            ServiceState::Ready(_)
        )
    }

    /// Name of the loaded model, if any.
    pub fn active_model(&self) -> Option<String> {
        match &*self.state.read().unwrap_or_else(PoisonError::into_inner) {
            ServiceState::Ready(encoder) => Some(encoder.model_name().to_string()),
            _ => None,
        }
    }

    fn encoder(&self) -> Result<Arc<dyn SentenceEncoder>, EmbeddingError> {
        {
            let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
            match &*state {
                ServiceState::Ready(encoder) => return Ok(Arc::clone(encoder)),
                ServiceState::Unavailable(reason) => {
                    return Err(EmbeddingError::Unavailable(reason.clone()))
                }
                ServiceState::Uninitialized => {}
            }
        }

        self.initialize()?;
        match &*self.state.read().unwrap_or_else(PoisonError::into_inner) {
            ServiceState::Ready(encoder) => Ok(Arc::clone(encoder)),
            _ => Err(EmbeddingError::Unavailable("model not loaded".into())),
        }
    }

    /// Embed a batch of sentences, loading the model on first use. Once
    /// loading has failed, encode keeps failing until `initialize` succeeds.
    pub fn encode(&self, sentences: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let encoder = self.encoder()?;
        let vectors = encoder
            .encode(sentences)
            .map_err(|err| EmbeddingError::Encode(format!("{err:#}")))?;

        if vectors.len() != sentences.len() {
            return Err(EmbeddingError::Encode(format!(
                "{} returned {} vectors for {} sentences",
                encoder.model_name(),
                vectors.len(),
                sentences.len()
            )));
        }
        Ok(vectors)
    }
}
