//! Batch orchestration: drives the per-file pipeline (transcribe →
//! translate → write) across an enumerated file list, converting per-file
//! errors into report entries and honoring cooperative cancellation.

use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::cancel::CancelToken;
use crate::config::RunOptions;
use crate::engine::{SpeechEngine, SpeechModel};
use crate::error::Result;
use crate::media::MediaJob;
use crate::progress::{ProgressSink, ProgressUpdate};
use crate::subtitle::{write_srt, WriteOutcome};
use crate::translate::{translate_best_effort, TranslationService};

/// How a run ended. Cancellation is a user decision, not a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Completed,
    Stopped,
}

impl RunStatus {
    pub fn describe(&self) -> &'static str {
        match self {
            RunStatus::Completed => "finished",
            RunStatus::Stopped => "interrupted",
        }
    }
}

#[derive(Debug, Clone)]
pub struct FileFailure {
    pub file_name: String,
    pub reason: String,
}

/// Final report for one batch run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub succeeded: usize,
    pub failures: Vec<FileFailure>,
    pub status: RunStatus,
}

/// Events delivered from the batch worker to the caller. Receiving them on
/// the caller's side of the channel is the thread-boundary crossing; the
/// worker never touches caller state directly.
#[derive(Debug, Clone)]
pub enum RunEvent {
    /// Free-text log line
    Log(String),
    /// Replaces the caller's single current-status string
    Status(String),
    Progress(ProgressUpdate),
}

/// Sending half of the run event channel. Send failures mean the caller
/// hung up and are ignored.
#[derive(Clone)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<RunEvent>,
}

impl EventSender {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<RunEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn log<S: Into<String>>(&self, message: S) {
        let _ = self.tx.send(RunEvent::Log(message.into()));
    }

    pub fn status<S: Into<String>>(&self, message: S) {
        let _ = self.tx.send(RunEvent::Status(message.into()));
    }
}

impl ProgressSink for EventSender {
    fn update(&self, update: ProgressUpdate) {
        let _ = self.tx.send(RunEvent::Progress(update));
    }
}

/// Outcome of one media job inside the loop.
enum FileOutcome {
    Written(PathBuf),
    /// Cancellation landed mid-file; the job counts as neither success nor
    /// failure.
    Cancelled,
}

pub struct BatchRunner {
    engine: Box<dyn SpeechEngine>,
    translator: Box<dyn TranslationService>,
    options: RunOptions,
    events: EventSender,
}

impl BatchRunner {
    pub fn new(
        engine: Box<dyn SpeechEngine>,
        translator: Box<dyn TranslationService>,
        options: RunOptions,
        events: EventSender,
    ) -> Self {
        Self {
            engine,
            translator,
            options,
            events,
        }
    }

    /// Run the batch over an enumerated file list. Model-load failure is
    /// the single fatal class and propagates as `Err` with no report;
    /// everything after that is file-scoped.
    pub async fn run(&self, files: &[PathBuf], cancel: &CancelToken) -> Result<RunReport> {
        self.events.status("Loading speech model...");
        let model = self
            .engine
            .load_model(self.options.tier, self.options.compute)
            .await?;
        self.events.log("Model loaded, starting queue");

        let total = files.len();
        let mut succeeded = 0usize;
        let mut failures = Vec::new();
        let mut stopped = false;

        for (index, input) in files.iter().enumerate() {
            if cancel.is_cancelled() {
                stopped = true;
                break;
            }

            let job = match MediaJob::resolve(input, self.options.destination.as_deref()) {
                Ok(job) => job,
                Err(e) => {
                    let file_name = input.display().to_string();
                    self.events.log(format!("ERROR in '{}': {}", file_name, e));
                    failures.push(FileFailure {
                        file_name,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            let name = job.file_name();
            self.events
                .status(format!("Processing {}/{}: {}", index + 1, total, name));
            self.events
                .log(format!("--- Start ({}/{}): {} ---", index + 1, total, name));

            match self.process_job(model.as_ref(), &job, cancel).await {
                Ok(FileOutcome::Written(path)) => {
                    info!("Successfully processed: {}", name);
                    self.events.log(format!("Saved: {}", path.display()));
                    succeeded += 1;
                }
                Ok(FileOutcome::Cancelled) => {
                    stopped = true;
                    break;
                }
                Err(e) => {
                    warn!("Failed to process {}: {}", name, e);
                    self.events.log(format!("ERROR in '{}': {}", name, e));
                    failures.push(FileFailure {
                        file_name: name,
                        reason: e.to_string(),
                    });
                }
            }
        }

        let status = if stopped {
            self.events.status("Process interrupted.");
            RunStatus::Stopped
        } else {
            self.events.status("Queue finished!");
            RunStatus::Completed
        };

        self.events.log("--- FINAL SUMMARY ---");
        self.events
            .log(format!("Succeeded: {} | Failed: {}", succeeded, failures.len()));

        Ok(RunReport {
            succeeded,
            failures,
            status,
        })
    }

    async fn process_job(
        &self,
        model: &dyn SpeechModel,
        job: &MediaJob,
        cancel: &CancelToken,
    ) -> Result<FileOutcome> {
        let progress: Arc<dyn ProgressSink> = Arc::new(self.events.clone());
        let mut segments = model
            .transcribe(&job.input, &self.options.source_lang, progress)
            .await?;

        // Timings are trusted verbatim from the engine; an inverted pair is
        // surfaced but not dropped.
        for segment in &segments {
            if !segment.has_valid_timing() {
                warn!(
                    "Defective segment timing in {}: start {} >= end {}",
                    job.file_name(),
                    segment.start,
                    segment.end
                );
                self.events.log(format!(
                    "Defective segment timing ({} >= {}), keeping segment",
                    segment.start, segment.end
                ));
            }
        }

        if self.options.needs_translation() {
            self.events
                .log(format!("Translating to {}...", self.options.target_lang));
            for segment in segments.iter_mut() {
                if cancel.is_cancelled() {
                    return Ok(FileOutcome::Cancelled);
                }
                let outcome = translate_best_effort(
                    self.translator.as_ref(),
                    &segment.text,
                    &self.options.source_lang,
                    &self.options.target_lang,
                )
                .await;
                segment.text = outcome.into_text();
            }
        }

        match write_srt(&job.output, &segments, cancel).await? {
            WriteOutcome::Completed => Ok(FileOutcome::Written(job.output.clone())),
            WriteOutcome::Interrupted => Ok(FileOutcome::Cancelled),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ComputeTarget, ModelTier, SourceMode};
    use crate::engine::{MockSpeechEngine, MockSpeechModel, Segment};
    use crate::error::SubgenError;
    use crate::translate::MockTranslationService;
    use std::path::Path;

    fn options(dest: &Path, source_lang: &str, target_lang: &str) -> RunOptions {
        RunOptions {
            source: dest.to_path_buf(),
            destination: Some(dest.to_path_buf()),
            mode: SourceMode::DirectoryBatch,
            source_lang: source_lang.to_string(),
            target_lang: target_lang.to_string(),
            tier: ModelTier::Draft,
            compute: ComputeTarget::Cpu,
        }
    }

    fn segments() -> Vec<Segment> {
        vec![
            Segment {
                start: 0.0,
                end: 1.5,
                text: "hello".to_string(),
            },
            Segment {
                start: 1.5,
                end: 3.0,
                text: "world".to_string(),
            },
        ]
    }

    fn engine_with_model(model: MockSpeechModel) -> Box<dyn SpeechEngine> {
        let mut engine = MockSpeechEngine::new();
        engine
            .expect_load_model()
            .times(1)
            .return_once(move |_, _| Ok(Box::new(model) as Box<dyn SpeechModel>));
        Box::new(engine)
    }

    #[tokio::test]
    async fn test_fatal_model_load_failure_aborts_with_no_report() {
        let dir = tempfile::tempdir().unwrap();

        let mut engine = MockSpeechEngine::new();
        engine
            .expect_load_model()
            .times(1)
            .return_once(|_, _| Err(SubgenError::Engine("binary missing".to_string())));

        let (events, _rx) = EventSender::channel();
        let runner = BatchRunner::new(
            Box::new(engine),
            Box::new(MockTranslationService::new()),
            options(dir.path(), "en", "en"),
            events,
        );

        let files = vec![PathBuf::from("/media/a.mp4"), PathBuf::from("/media/b.mp4")];
        let result = runner.run(&files, &CancelToken::new()).await;

        assert!(matches!(result, Err(SubgenError::Engine(_))));
        // No subtitle file was written
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_file_failure_is_recorded_and_batch_continues() {
        let dir = tempfile::tempdir().unwrap();

        let mut model = MockSpeechModel::new();
        model.expect_transcribe().times(2).returning(|path, _, _| {
            if path.ends_with("bad.mp4") {
                Err(SubgenError::Engine("unsupported codec".to_string()))
            } else {
                Ok(segments())
            }
        });

        let (events, _rx) = EventSender::channel();
        let runner = BatchRunner::new(
            engine_with_model(model),
            Box::new(MockTranslationService::new()),
            options(dir.path(), "en", "en"),
            events,
        );

        let files = vec![PathBuf::from("/media/bad.mp4"), PathBuf::from("/media/good.mp4")];
        let report = runner.run(&files, &CancelToken::new()).await.unwrap();

        assert_eq!(report.succeeded, 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].file_name, "bad.mp4");
        assert_eq!(report.status, RunStatus::Completed);

        let written = std::fs::read_to_string(dir.path().join("good.srt")).unwrap();
        assert!(written.starts_with("1\n00:00:00,000 --> 00:00:01,500\nhello\n"));
    }

    #[tokio::test]
    async fn test_cancel_before_second_file_yields_single_entry() {
        let dir = tempfile::tempdir().unwrap();
        let cancel = CancelToken::new();
        let observer = cancel.clone();

        // File 1 transcribes normally; cancellation lands while file 2 is
        // in flight, so file 2 must yield neither success nor failure.
        let mut model = MockSpeechModel::new();
        model.expect_transcribe().returning(move |path, _, _| {
            if path.ends_with("second.mp4") {
                observer.cancel();
            }
            Ok(segments())
        });

        let (events, _rx) = EventSender::channel();
        let runner = BatchRunner::new(
            engine_with_model(model),
            Box::new(MockTranslationService::new()),
            options(dir.path(), "en", "en"),
            events,
        );

        let files = vec![
            PathBuf::from("/media/first.mp4"),
            PathBuf::from("/media/second.mp4"),
            PathBuf::from("/media/third.mp4"),
        ];
        let report = runner.run(&files, &cancel).await.unwrap();

        assert_eq!(report.succeeded, 1);
        assert!(report.failures.is_empty());
        assert_eq!(report.status, RunStatus::Stopped);
        assert_eq!(report.status.describe(), "interrupted");

        // Only the first file's subtitle exists
        assert!(dir.path().join("first.srt").exists());
        assert!(!dir.path().join("third.srt").exists());
    }

    #[tokio::test]
    async fn test_cancel_before_run_processes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let cancel = CancelToken::new();
        cancel.cancel();

        let model = MockSpeechModel::new();

        let (events, _rx) = EventSender::channel();
        let runner = BatchRunner::new(
            engine_with_model(model),
            Box::new(MockTranslationService::new()),
            options(dir.path(), "en", "en"),
            events,
        );

        let files = vec![PathBuf::from("/media/a.mp4")];
        let report = runner.run(&files, &cancel).await.unwrap();

        assert_eq!(report.succeeded, 0);
        assert!(report.failures.is_empty());
        assert_eq!(report.status, RunStatus::Stopped);
    }

    #[tokio::test]
    async fn test_translation_failure_degrades_to_original_text() {
        let dir = tempfile::tempdir().unwrap();

        let mut model = MockSpeechModel::new();
        model.expect_transcribe().returning(|_, _, _| Ok(segments()));

        let mut translator = MockTranslationService::new();
        translator
            .expect_translate()
            .returning(|_, _, _| Err(SubgenError::Translation("network down".to_string())));

        let (events, _rx) = EventSender::channel();
        let runner = BatchRunner::new(
            engine_with_model(model),
            Box::new(translator),
            options(dir.path(), "en", "pt"),
            events,
        );

        let files = vec![PathBuf::from("/media/clip.mp4")];
        let report = runner.run(&files, &CancelToken::new()).await.unwrap();

        // Degraded output, not a failure entry
        assert_eq!(report.succeeded, 1);
        assert!(report.failures.is_empty());

        let written = std::fs::read_to_string(dir.path().join("clip.srt")).unwrap();
        assert!(written.contains("hello"));
        assert!(written.contains("world"));
    }

    #[tokio::test]
    async fn test_translation_replaces_segment_text() {
        let dir = tempfile::tempdir().unwrap();

        let mut model = MockSpeechModel::new();
        model.expect_transcribe().returning(|_, _, _| Ok(segments()));

        let mut translator = MockTranslationService::new();
        translator
            .expect_translate()
            .times(2)
            .returning(|text, _, _| Ok(format!("pt:{}", text)));

        let (events, _rx) = EventSender::channel();
        let runner = BatchRunner::new(
            engine_with_model(model),
            Box::new(translator),
            options(dir.path(), "en", "pt"),
            events,
        );

        let files = vec![PathBuf::from("/media/clip.mp4")];
        let report = runner.run(&files, &CancelToken::new()).await.unwrap();
        assert_eq!(report.succeeded, 1);

        let written = std::fs::read_to_string(dir.path().join("clip.srt")).unwrap();
        assert!(written.contains("pt:hello"));
        assert!(written.contains("pt:world"));
    }

    #[tokio::test]
    async fn test_inverted_timing_is_surfaced_but_kept() {
        let dir = tempfile::tempdir().unwrap();

        let mut model = MockSpeechModel::new();
        model.expect_transcribe().returning(|_, _, _| {
            Ok(vec![Segment {
                start: 5.0,
                end: 4.0,
                text: "backwards".to_string(),
            }])
        });

        let (events, mut rx) = EventSender::channel();
        let runner = BatchRunner::new(
            engine_with_model(model),
            Box::new(MockTranslationService::new()),
            options(dir.path(), "en", "en"),
            events,
        );

        let files = vec![PathBuf::from("/media/clip.mp4")];
        let report = runner.run(&files, &CancelToken::new()).await.unwrap();
        assert_eq!(report.succeeded, 1);

        let mut surfaced = false;
        while let Ok(event) = rx.try_recv() {
            if let RunEvent::Log(line) = event {
                if line.contains("Defective segment timing") {
                    surfaced = true;
                }
            }
        }
        assert!(surfaced);

        // Passed through to the output, not dropped
        let written = std::fs::read_to_string(dir.path().join("clip.srt")).unwrap();
        assert!(written.contains("backwards"));
    }
}
