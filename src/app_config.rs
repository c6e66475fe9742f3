use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::language_utils::{LanguageCodeScheme, LanguageTag};
use crate::providers::ProviderConfig;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Log level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Convert to the log crate's level filter
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    /// Language codes to download subtitles for (ISO 639-1 or 639-2)
    pub languages: Vec<String>,

    /// Provider names to search, in order; empty means every registered provider
    pub providers: Vec<String>,

    /// Per-provider configuration
    pub provider_configs: HashMap<String, ProviderConfig>,

    /// Minimum score for a subtitle to be downloaded
    pub min_score: u32,

    /// Hearing impaired preference (yes/no/indifferent)
    pub hearing_impaired: Option<bool>,

    /// Foreign only preference (yes/no/indifferent)
    pub foreign_only: Option<bool>,

    /// Skip subtitles with a frame rate that does not match the video
    pub skip_wrong_fps: bool,

    /// Download a single subtitle overall instead of one per language
    pub single: bool,

    /// Maximum number of concurrent listing workers, default one per provider
    pub max_workers: Option<usize>,

    /// Add the `.[hi]`/`.[fo]` token to saved file names
    pub language_type_suffix: bool,

    /// Rendering scheme for the language suffix of saved files
    pub language_format: LanguageCodeScheme,

    /// Convert downloaded subtitles to this format, e.g. "srt"
    pub output_format: Option<String>,

    /// Re-encode downloaded subtitles, e.g. "utf-8"
    pub output_encoding: Option<String>,

    /// Log level
    pub log_level: LogLevel,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            languages: vec!["en".to_string()],
            providers: Vec::new(),
            provider_configs: HashMap::new(),
            min_score: 0,
            hearing_impaired: None,
            foreign_only: None,
            skip_wrong_fps: false,
            single: false,
            max_workers: None,
            language_type_suffix: false,
            language_format: LanguageCodeScheme::default(),
            output_format: None,
            output_encoding: None,
            log_level: LogLevel::default(),
        }
    }
}

impl Config {
    /// Load the configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Load the configuration from a file, falling back to defaults when absent
    pub fn from_file_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            Ok(Config::default())
        }
    }

    /// Write the configuration to a JSON file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Check that the configuration values are usable
    pub fn validate(&self) -> Result<()> {
        if self.languages.is_empty() {
            return Err(anyhow!("At least one language is required"));
        }
        for code in &self.languages {
            LanguageTag::from_ietf(code)
                .map_err(|_| anyhow!("Invalid language code: {}", code))?;
        }
        Ok(())
    }

    /// The configured languages as language tags
    pub fn language_tags(&self) -> Result<Vec<LanguageTag>> {
        self.languages
            .iter()
            .map(|code| {
                LanguageTag::from_ietf(code).map_err(|_| anyhow!("Invalid language code: {}", code))
            })
            .collect()
    }
}
