//! Progress reporting bridge between the speech engine and the caller.
//!
//! The engine pushes structured updates into a [`ProgressSink`] where it can.
//! Engines that only emit free-text diagnostics (the whisper CLI writes its
//! progress bar to stderr) are bridged through [`scrape_progress_line`],
//! which extracts a percentage or a coarse phase label and ignores anything
//! it does not recognize.

use serde::Serialize;

/// One coarse progress update for the current transcription.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ProgressUpdate {
    /// Percentage of the current file, 0-100
    Percent(u8),
    /// Non-percentage activity, e.g. a model download in progress
    Phase(String),
}

/// Receiver for progress updates pushed from the engine. Must never block
/// for long and must never fail; progress is advisory only.
pub trait ProgressSink: Send + Sync {
    fn update(&self, update: ProgressUpdate);
}

/// Sink that discards every update.
pub struct NullSink;

impl ProgressSink for NullSink {
    fn update(&self, _update: ProgressUpdate) {}
}

/// Maximum characters kept in a phase label.
const PHASE_LABEL_LEN: usize = 30;

/// Fallback adapter: map one line of free-text engine output to a progress
/// update. Returns `None` for anything unrecognized; never errors.
pub fn scrape_progress_line(line: &str) -> Option<ProgressUpdate> {
    let cleaned = line.replace(['\r', '\n'], "");
    let cleaned = cleaned.trim();

    // Whitespace-only fragments and stray control output
    if cleaned.chars().count() < 3 {
        return None;
    }

    if let Some(percent) = extract_percent(cleaned) {
        return Some(ProgressUpdate::Percent(percent));
    }

    if cleaned.contains("Downloading") || cleaned.contains("it/s") {
        let label: String = cleaned.chars().take(PHASE_LABEL_LEN).collect();
        return Some(ProgressUpdate::Phase(label));
    }

    None
}

/// Find the first run of 1-3 digits immediately followed by '%'.
fn extract_percent(text: &str) -> Option<u8> {
    let bytes = text.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        if b != b'%' {
            continue;
        }
        let mut start = i;
        while start > 0 && i - start < 3 && bytes[start - 1].is_ascii_digit() {
            start -= 1;
        }
        if start < i {
            if let Ok(value) = text[start..i].parse::<u16>() {
                return Some(value.min(100) as u8);
            }
        }
    }
    None
}
