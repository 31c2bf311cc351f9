// Speech engine abstraction
//
// The recognition engine is an external black box behind two traits:
// `SpeechEngine` loads a model once per batch run, `SpeechModel` is the
// resulting handle invoked once per media file. New engines plug in by
// implementing both and extending the factory.

pub mod whisper_cli;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

use crate::config::{ComputeTarget, EngineConfig, ModelTier};
use crate::error::Result;
use crate::progress::ProgressSink;

/// One timed text segment as produced by the speech engine. Sequences are
/// kept in engine order; only the text is ever rewritten (by translation).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Start offset in seconds
    pub start: f64,
    /// End offset in seconds
    pub end: f64,
    pub text: String,
}

impl Segment {
    pub fn has_valid_timing(&self) -> bool {
        self.start >= 0.0 && self.end > self.start
    }
}

/// Entry point into the external recognition engine. Model loading is
/// expensive and happens exactly once per batch run.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SpeechEngine: Send + Sync {
    async fn load_model(
        &self,
        tier: ModelTier,
        compute: ComputeTarget,
    ) -> Result<Box<dyn SpeechModel>>;
}

/// A loaded model handle. Exclusively owned by the batch worker for the
/// run's duration; not reentrant.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SpeechModel: Send + Sync {
    /// Transcribe one media file to an ordered segment sequence, pushing
    /// coarse progress into the sink along the way.
    async fn transcribe(
        &self,
        media_path: &Path,
        language: &str,
        progress: Arc<dyn ProgressSink>,
    ) -> Result<Vec<Segment>>;
}

/// Engine implementation type
#[derive(Debug, Clone)]
pub enum EngineImplementation {
    WhisperCli,
    // Future implementations can be added here:
    // WhisperCpp,
    // Native,
}

/// Factory for creating engine instances
pub struct EngineFactory;

impl EngineFactory {
    pub fn create_engine(
        implementation: EngineImplementation,
        config: EngineConfig,
    ) -> Box<dyn SpeechEngine> {
        match implementation {
            EngineImplementation::WhisperCli => {
                Box::new(whisper_cli::WhisperCliEngine::new(config))
            }
        }
    }

    pub fn create_default(config: EngineConfig) -> Box<dyn SpeechEngine> {
        Self::create_engine(EngineImplementation::WhisperCli, config)
    }
}
