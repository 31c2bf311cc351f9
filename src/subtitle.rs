use std::path::Path;
use tokio::fs;
use tracing::info;

use crate::cancel::CancelToken;
use crate::engine::Segment;
use crate::error::Result;

/// How a subtitle write finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Completed,
    /// Cancellation landed mid-write; the file holds a valid prefix of the
    /// segment sequence.
    Interrupted,
}

/// Serialize timed segments to an SRT file.
///
/// Indices are 1-based and contiguous per file. The destination is
/// overwritten. The cancel token is checked before each segment; on
/// cancellation the blocks emitted so far are still written out, trading a
/// partial result over rollback.
pub async fn write_srt<P: AsRef<Path>>(
    output_path: P,
    segments: &[Segment],
    cancel: &CancelToken,
) -> Result<WriteOutcome> {
    let output_path = output_path.as_ref();
    info!("Writing SRT file: {}", output_path.display());

    let (srt_content, outcome) = render_blocks(segments, || cancel.is_cancelled());

    fs::write(output_path, srt_content).await?;

    Ok(outcome)
}

/// Render segments to SRT blocks, stopping early when `should_stop` fires.
/// The stop check runs before each block, so an early stop yields a valid
/// prefix of the sequence with contiguous indices.
fn render_blocks(
    segments: &[Segment],
    mut should_stop: impl FnMut() -> bool,
) -> (String, WriteOutcome) {
    let mut srt_content = String::new();

    for (index, segment) in segments.iter().enumerate() {
        if should_stop() {
            return (srt_content, WriteOutcome::Interrupted);
        }

        srt_content.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            index + 1,
            format_timestamp(segment.start),
            format_timestamp(segment.end),
            segment.text.trim()
        ));
    }

    (srt_content, WriteOutcome::Completed)
}

/// Format a seconds offset as the SRT timecode `HH:MM:SS,mmm`. The
/// fractional part is rounded to the nearest millisecond, carrying into
/// the seconds when it rounds up to a full second.
pub fn format_timestamp(seconds: f64) -> String {
    let total_milliseconds = (seconds.max(0.0) * 1000.0).round() as u64;
    let hours = total_milliseconds / 3_600_000;
    let minutes = (total_milliseconds % 3_600_000) / 60_000;
    let secs = (total_milliseconds % 60_000) / 1_000;
    let millis = total_milliseconds % 1_000;

    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, secs, millis)
}
