use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::{PoisonError, RwLock},
};

use crate::dataset::{config::DEFAULT_MAX_SAMPLES, BatchConfig};
use crate::text_quality::completeness::DEFAULT_MIN_SENTENCE_LENGTH;
use crate::text_quality::duplication::DEFAULT_MAX_SENTENCES;
use crate::text_quality::{EmbeddingSettings, TextConfig};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerSettings {
    pub max_samples: usize,
    pub max_sentences: usize,
    pub min_sentence_length: usize,
    pub parallel: bool,
    pub seed: Option<u64>,
    pub embedding: EmbeddingSettings,
}

impl Default for AnalyzerSettings {
    fn default() -> Self {
        Self {
            max_samples: DEFAULT_MAX_SAMPLES,
            max_sentences: DEFAULT_MAX_SENTENCES,
            min_sentence_length: DEFAULT_MIN_SENTENCE_LENGTH,
            parallel: false,
            seed: None,
            embedding: EmbeddingSettings::default(),
        }
    }
}

impl AnalyzerSettings {
    pub fn text_config(&self) -> TextConfig {
        TextConfig {
            max_sentences: self.max_sentences,
            min_sentence_length: self.min_sentence_length,
        }
    }

    pub fn batch_config(&self) -> BatchConfig {
        BatchConfig {
            max_samples: self.max_samples,
            parallel: self.parallel,
            seed: self.seed,
        }
    }
}

/// Analyzer settings backed by a JSON file. A missing file means defaults.
pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<AnalyzerSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            read_settings(&path)?
        } else {
            AnalyzerSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn settings(&self) -> AnalyzerSettings {
        self.data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn update(&self, settings: AnalyzerSettings) -> Result<()> {
        let mut guard = self.data.write().unwrap_or_else(PoisonError::into_inner);
        *guard = settings;
        self.persist(&guard)
    }

    pub fn reload(&self) -> Result<()> {
        let data = read_settings(&self.path)?;
        *self.data.write().unwrap_or_else(PoisonError::into_inner) = data;
        Ok(())
    }

    fn persist(&self, data: &AnalyzerSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}

fn read_settings(path: &Path) -> Result<AnalyzerSettings> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings from {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse settings in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("absent.json")).unwrap();
        assert_eq!(store.settings(), AnalyzerSettings::default());
    }

    #[test]
    fn test_update_persists_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dataqa.json");
        let store = SettingsStore::new(path.clone()).unwrap();

        let mut settings = store.settings();
        settings.max_samples = 25;
        settings.seed = Some(99);
        store.update(settings.clone()).unwrap();

        let reopened = SettingsStore::new(path).unwrap();
        assert_eq!(reopened.settings(), settings);

        reopened.reload().unwrap();
        assert_eq!(reopened.settings().batch_config().max_samples, 25);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.json");
        fs::write(&path, r#"{ "max_sentences": 20, "embedding": { "dimensions": 128 } }"#).unwrap();

        let settings = SettingsStore::new(path).unwrap().settings();
        assert_eq!(settings.text_config().max_sentences, 20);
        assert_eq!(settings.max_samples, DEFAULT_MAX_SAMPLES);
        assert_eq!(settings.embedding.dimensions, 128);
        assert_eq!(settings.embedding.primary_model, EmbeddingSettings::default().primary_model);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(SettingsStore::new(path).is_err());
    }
}
