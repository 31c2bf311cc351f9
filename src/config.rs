use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, SubgenError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub engine: EngineConfig,
    pub translate: TranslateConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Path to the speech recognition binary (e.g. whisper)
    pub binary_path: String,
    /// Command used to probe for accelerated compute availability
    pub gpu_probe_command: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslateConfig {
    /// Translation service endpoint URL
    pub endpoint: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            engine: EngineConfig {
                binary_path: "whisper".to_string(),
                gpu_probe_command: "nvidia-smi".to_string(),
            },
            translate: TranslateConfig {
                endpoint: "http://localhost:5000".to_string(),
                timeout_secs: 30,
            },
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SubgenError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| SubgenError::Config(format!("Failed to parse config file: {}", e)))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| SubgenError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| SubgenError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }
}

/// Model precision tier, ordered from fastest to most accurate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelTier {
    /// Quick draft: low accuracy, near instant
    Draft,
    /// Basic: good for clean audio
    Base,
    /// Balanced (default): best accuracy/speed trade-off
    Balanced,
    /// Cinema/series: high accuracy, wants a capable GPU
    Cinema,
    /// Maximum accuracy: the heaviest model (~3 GB)
    Max,
}

impl ModelTier {
    pub fn all() -> [ModelTier; 5] {
        [
            ModelTier::Draft,
            ModelTier::Base,
            ModelTier::Balanced,
            ModelTier::Cinema,
            ModelTier::Max,
        ]
    }

    /// CLI-facing name
    pub fn name(&self) -> &'static str {
        match self {
            ModelTier::Draft => "draft",
            ModelTier::Base => "base",
            ModelTier::Balanced => "balanced",
            ModelTier::Cinema => "cinema",
            ModelTier::Max => "max",
        }
    }

    /// Model name understood by the speech engine
    pub fn model_name(&self) -> &'static str {
        match self {
            ModelTier::Draft => "tiny",
            ModelTier::Base => "base",
            ModelTier::Balanced => "small",
            ModelTier::Cinema => "medium",
            ModelTier::Max => "large",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ModelTier::Draft => "Quick draft: low accuracy, near instant",
            ModelTier::Base => "Basic: good for clean audio",
            ModelTier::Balanced => "Balanced (default): best accuracy/speed trade-off",
            ModelTier::Cinema => "Cinema/series: high accuracy (wants a capable GPU)",
            ModelTier::Max => "Maximum accuracy (~3 GB): heaviest and smartest",
        }
    }
}

/// Compute target requested for the run. A GPU request falls back to CPU
/// when no accelerated device is available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComputeTarget {
    Gpu,
    Cpu,
}

impl ComputeTarget {
    pub fn device_name(&self) -> &'static str {
        match self {
            ComputeTarget::Gpu => "cuda",
            ComputeTarget::Cpu => "cpu",
        }
    }
}

/// How the source path is interpreted when enumerating media files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceMode {
    SingleFile,
    DirectoryBatch,
}

/// Options for one batch run. Built by the caller, read-only for the
/// run's duration.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Source file or directory
    pub source: PathBuf,
    /// Output directory override; each file's own directory when absent
    pub destination: Option<PathBuf>,
    pub mode: SourceMode,
    /// Spoken language of the source media (ISO code)
    pub source_lang: String,
    /// Language to translate subtitles into (ISO code)
    pub target_lang: String,
    pub tier: ModelTier,
    pub compute: ComputeTarget,
}

impl RunOptions {
    /// Translation runs only when the run crosses languages.
    pub fn needs_translation(&self) -> bool {
        self.source_lang != self.target_lang
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_model_names() {
        assert_eq!(ModelTier::Draft.model_name(), "tiny");
        assert_eq!(ModelTier::Balanced.model_name(), "small");
        assert_eq!(ModelTier::Max.model_name(), "large");
    }

    #[test]
    fn test_needs_translation() {
        let mut opts = RunOptions {
            source: PathBuf::from("a.mp4"),
            destination: None,
            mode: SourceMode::SingleFile,
            source_lang: "en".to_string(),
            target_lang: "en".to_string(),
            tier: ModelTier::Balanced,
            compute: ComputeTarget::Cpu,
        };
        assert!(!opts.needs_translation());

        opts.target_lang = "pt".to_string();
        assert!(opts.needs_translation());
    }

    #[test]
    fn test_config_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("subgen.toml");

        let config = Config::default();
        config.save_to_file(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.engine.binary_path, "whisper");
        assert_eq!(loaded.translate.timeout_secs, 30);
    }
}
