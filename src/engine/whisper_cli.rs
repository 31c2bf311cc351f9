use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::process::Stdio;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::{debug, info, warn};

use super::{Segment, SpeechEngine, SpeechModel};
use crate::config::{ComputeTarget, EngineConfig, ModelTier};
use crate::error::{Result, SubgenError};
use crate::progress::{scrape_progress_line, ProgressSink};

/// JSON output written by the whisper CLI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhisperJsonOutput {
    pub text: String,
    pub segments: Vec<WhisperJsonSegment>,
    pub language: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhisperJsonSegment {
    pub id: Option<u64>,
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl WhisperJsonOutput {
    fn into_segments(self) -> Vec<Segment> {
        self.segments
            .into_iter()
            .map(|seg| Segment {
                start: seg.start,
                end: seg.end,
                text: seg.text.trim().to_string(),
            })
            .collect()
    }
}

/// Adapter around the system `whisper` command.
pub struct WhisperCliEngine {
    config: EngineConfig,
}

impl WhisperCliEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Resolve the requested compute target to a device the engine accepts.
    /// A GPU request degrades to CPU when the probe finds no device.
    async fn resolve_device(&self, compute: ComputeTarget) -> &'static str {
        match compute {
            ComputeTarget::Cpu => ComputeTarget::Cpu.device_name(),
            ComputeTarget::Gpu => {
                let available = Command::new(&self.config.gpu_probe_command)
                    .stdout(Stdio::null())
                    .stderr(Stdio::null())
                    .status()
                    .await
                    .map(|status| status.success())
                    .unwrap_or(false);

                if available {
                    ComputeTarget::Gpu.device_name()
                } else {
                    warn!("Accelerated compute unavailable, falling back to CPU");
                    ComputeTarget::Cpu.device_name()
                }
            }
        }
    }
}

#[async_trait]
impl SpeechEngine for WhisperCliEngine {
    async fn load_model(
        &self,
        tier: ModelTier,
        compute: ComputeTarget,
    ) -> Result<Box<dyn SpeechModel>> {
        // The CLI has no persistent in-process model; loading means
        // verifying the binary is runnable and pinning model and device
        // into the handle so every file uses the same pair.
        let status = Command::new(&self.config.binary_path)
            .arg("--help")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|e| {
                SubgenError::Engine(format!(
                    "Speech engine '{}' is not available: {}",
                    self.config.binary_path, e
                ))
            })?;

        if !status.success() {
            return Err(SubgenError::Engine(format!(
                "Speech engine '{}' failed its availability check",
                self.config.binary_path
            )));
        }

        let device = self.resolve_device(compute).await;
        info!("Loaded model '{}' on {}", tier.model_name(), device);

        Ok(Box::new(WhisperCliModel {
            binary_path: self.config.binary_path.clone(),
            model_name: tier.model_name(),
            device,
        }))
    }
}

/// Handle for one resolved model/device pair.
pub struct WhisperCliModel {
    binary_path: String,
    model_name: &'static str,
    device: &'static str,
}

#[async_trait]
impl SpeechModel for WhisperCliModel {
    async fn transcribe(
        &self,
        media_path: &Path,
        language: &str,
        progress: Arc<dyn ProgressSink>,
    ) -> Result<Vec<Segment>> {
        info!("Transcribing: {}", media_path.display());

        let temp_dir = tempfile::tempdir()
            .map_err(|e| SubgenError::Engine(format!("Failed to create temp directory: {}", e)))?;

        let mut child = Command::new(&self.binary_path)
            .arg(media_path)
            .arg("--model")
            .arg(self.model_name)
            .arg("--language")
            .arg(language)
            .arg("--device")
            .arg(self.device)
            .arg("--fp16")
            .arg("False")
            .arg("--output_dir")
            .arg(temp_dir.path())
            .arg("--output_format")
            .arg("json")
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| SubgenError::Engine(format!("Failed to execute whisper: {}", e)))?;

        // The CLI writes its progress bar and download diagnostics to
        // stderr as free text; bridge each fragment through the scraper.
        if let Some(stderr) = child.stderr.take() {
            drain_engine_output(stderr, progress.as_ref()).await;
        }

        let status = child
            .wait()
            .await
            .map_err(|e| SubgenError::Engine(format!("Whisper did not exit cleanly: {}", e)))?;

        if !status.success() {
            return Err(SubgenError::Engine(format!(
                "Whisper failed with status {} for {}",
                status,
                media_path.display()
            )));
        }

        let stem = media_path
            .file_stem()
            .ok_or_else(|| SubgenError::Engine("Invalid media filename".to_string()))?;
        let json_path = temp_dir.path().join(format!("{}.json", stem.to_string_lossy()));

        let content = tokio::fs::read_to_string(&json_path)
            .await
            .map_err(|e| SubgenError::Engine(format!("Failed to read whisper output: {}", e)))?;

        let output: WhisperJsonOutput = serde_json::from_str(&content)
            .map_err(|e| SubgenError::Engine(format!("Failed to parse whisper JSON: {}", e)))?;

        Ok(output.into_segments())
    }
}

/// Drain free-text engine output into the progress sink. The progress bar
/// rewrites a single line with `\r` and emits no newline until it is done,
/// so both CR and LF delimit fragments. Bytes are decoded lossily; a
/// malformed fragment never stops the drain.
async fn drain_engine_output<R>(mut reader: R, progress: &dyn ProgressSink)
where
    R: AsyncRead + Unpin,
{
    let mut pending: Vec<u8> = Vec::new();
    let mut chunk = [0u8; 1024];

    loop {
        match reader.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => {
                pending.extend_from_slice(&chunk[..n]);
                while let Some(pos) = pending.iter().position(|&b| b == b'\r' || b == b'\n') {
                    let fragment: Vec<u8> = pending.drain(..=pos).collect();
                    feed_fragment(&fragment, progress);
                }
            }
            Err(_) => break,
        }
    }

    // Trailing fragment with no final delimiter
    feed_fragment(&pending, progress);
}

fn feed_fragment(bytes: &[u8], progress: &dyn ProgressSink) {
    let text = String::from_utf8_lossy(bytes);
    let text = text.trim_end_matches(['\r', '\n']);
    if text.trim().is_empty() {
        return;
    }
    debug!("engine: {}", text);
    if let Some(update) = scrape_progress_line(text) {
        progress.update(update);
    }
}
