//! Local ffmpeg backend integration tests.
//!
//! A shell script stands in for ffmpeg: it answers `-version`, copies the
//! `-i` input to the last argument and fails when the input name contains
//! "broken".

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use once_cell::sync::Lazy;
use tempfile::TempDir;

use konverter_core::backend::LocalBackendConfig;
use konverter_core::{
    testing::{fixtures, MockDelivery, MockFeedback},
    BatchState, Codec, ConversionJob, ConversionOrchestrator, FfmpegBackend, FileRef,
    OrchestratorConfig, OrchestratorError, Payload, Settings, TranscodeBackend, TranscodeError,
};

const FAKE_FFMPEG: &str = r#"#!/bin/sh
if [ "$1" = "-version" ]; then
    echo "ffmpeg version 6.1-fake"
    exit 0
fi
input=""
prev=""
for arg in "$@"; do
    if [ "$prev" = "-i" ]; then
        input="$arg"
    fi
    prev="$arg"
    last="$arg"
done
case "$input" in
    *broken*)
        echo "Invalid data found when processing input" >&2
        exit 1
        ;;
esac
cp "$input" "$last"
"#;

/// Written once, before any test can spawn it.
static FAKE_FFMPEG_DIR: Lazy<TempDir> = Lazy::new(|| {
    let dir = TempDir::new().unwrap();
    let script = dir.path().join("ffmpeg");
    std::fs::write(&script, FAKE_FFMPEG).unwrap();
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
    dir
});

fn fake_ffmpeg() -> PathBuf {
    FAKE_FFMPEG_DIR.path().join("ffmpeg")
}

struct TestHarness {
    temp_dir: TempDir,
    work_dir: PathBuf,
    backend: FfmpegBackend,
}

impl TestHarness {
    fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let work_dir = temp_dir.path().join("work");
        let backend = FfmpegBackend::new(
            LocalBackendConfig::with_ffmpeg_path(fake_ffmpeg())
                .with_work_dir(work_dir.clone())
                .with_timeout(30),
        );

        Self {
            temp_dir,
            work_dir,
            backend,
        }
    }

    fn job(&self, file: FileRef, output_name: &str) -> ConversionJob {
        ConversionJob {
            job_id: job_id_for(output_name),
            file,
            settings: Settings::new(Codec::Mp3, "192k"),
            output_name: output_name.to_string(),
        }
    }

    /// Entries left in the work dir.
    fn work_dir_entries(&self) -> Vec<PathBuf> {
        list(&self.work_dir)
    }
}

fn job_id_for(seed: &str) -> String {
    format!("job-{}", seed.replace('.', "-"))
}

fn list(dir: &Path) -> Vec<PathBuf> {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries.filter_map(|e| e.ok()).map(|e| e.path()).collect(),
        Err(_) => Vec::new(),
    }
}

// =============================================================================
// Backend
// =============================================================================

#[tokio::test]
async fn test_validate_finds_binary_and_creates_work_dir() {
    let harness = TestHarness::new();
    harness.backend.validate().await.unwrap();
    assert!(harness.work_dir.is_dir());
}

#[tokio::test]
async fn test_validate_missing_binary_is_unavailable() {
    let temp_dir = TempDir::new().unwrap();
    let backend = FfmpegBackend::new(LocalBackendConfig::with_ffmpeg_path(
        temp_dir.path().join("no-such-ffmpeg"),
    ));

    let err = backend.validate().await.unwrap_err();
    assert!(matches!(err, TranscodeError::FfmpegNotFound { .. }));
    assert!(err.is_unavailable());
}

#[tokio::test]
async fn test_convert_returns_output_bytes_and_cleans_up() {
    let harness = TestHarness::new();
    harness.backend.validate().await.unwrap();

    let input = FileRef::from_bytes("take one.wav", None, b"pcm-data".to_vec());
    let result = harness
        .backend
        .convert(harness.job(input, "take_one.mp3"))
        .await
        .unwrap();

    assert_eq!(result.output_name, "take_one.mp3");
    assert_eq!(result.payload, Payload::Bytes(b"pcm-data".to_vec()));
    assert!(harness.work_dir_entries().is_empty());
}

#[tokio::test]
async fn test_convert_reads_inputs_from_disk() {
    let harness = TestHarness::new();
    harness.backend.validate().await.unwrap();

    let source = harness.temp_dir.path().join("from-disk.flac");
    std::fs::write(&source, b"flac-bytes").unwrap();

    let result = harness
        .backend
        .convert(harness.job(FileRef::from_path(&source), "from-disk.mp3"))
        .await
        .unwrap();

    assert_eq!(result.payload, Payload::Bytes(b"flac-bytes".to_vec()));
    // The original input is never touched.
    assert!(source.exists());
    assert!(harness.work_dir_entries().is_empty());
}

#[tokio::test]
async fn test_failed_conversion_reports_stderr_and_cleans_up() {
    let harness = TestHarness::new();
    harness.backend.validate().await.unwrap();

    let input = FileRef::from_bytes("broken.wav", None, b"junk".to_vec());
    let err = harness
        .backend
        .convert(harness.job(input, "broken.mp3"))
        .await
        .unwrap_err();

    match &err {
        TranscodeError::ConversionFailed { stderr, .. } => {
            assert!(stderr
                .as_deref()
                .unwrap_or_default()
                .contains("Invalid data found"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(!err.is_unavailable());
    assert!(harness.work_dir_entries().is_empty());
}

// =============================================================================
// Orchestrated batch
// =============================================================================

#[tokio::test]
async fn test_local_batch_stops_at_broken_file() {
    let harness = TestHarness::new();
    let delivery = Arc::new(MockDelivery::new());
    let orchestrator = ConversionOrchestrator::new(
        OrchestratorConfig::with_reset_delay_ms(10_000),
        Arc::new(FfmpegBackend::new(
            LocalBackendConfig::with_ffmpeg_path(fake_ffmpeg())
                .with_work_dir(harness.work_dir.clone()),
        )),
        delivery.clone(),
        Arc::new(MockFeedback::new()),
    );
    orchestrator.initialize().await.unwrap();
    orchestrator
        .add(vec![
            fixtures::audio_file("good.wav"),
            fixtures::audio_file("broken.wav"),
            fixtures::audio_file("never.wav"),
        ])
        .await
        .unwrap();

    let err = orchestrator.start().await.unwrap_err();
    assert!(matches!(err, OrchestratorError::TranscodeFailure { .. }));
    assert!(err.to_string().contains("broken.wav"));

    let delivered: Vec<String> = delivery
        .delivered()
        .await
        .into_iter()
        .map(|d| d.name)
        .collect();
    assert_eq!(delivered, vec!["good.mp3"]);
    assert_eq!(
        delivery.payloads().await[0],
        Payload::Bytes(fixtures::WAV_HEADER.to_vec())
    );

    let snapshot = orchestrator.snapshot().await;
    assert_eq!(snapshot.state, BatchState::FailedAwaitingRetry);
    assert_eq!(snapshot.files_completed, 1);
    assert!(harness.work_dir_entries().is_empty());
}
