//! FFmpeg-based local backend.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::{debug, warn};

use crate::metrics::CLEANUP_WARNINGS;
use crate::settings::{Settings, FIXED_CHANNELS, FIXED_SAMPLE_RATE};

use super::config::LocalBackendConfig;
use super::error::TranscodeError;
use super::traits::TranscodeBackend;
use super::types::{ConversionJob, ConversionResult, Payload};

/// Lines of ffmpeg stderr kept for error reports.
const STDERR_TAIL_LINES: usize = 20;

/// Backend that runs the ffmpeg binary against files staged in a private work dir.
pub struct FfmpegBackend {
    config: LocalBackendConfig,
}

/// Paths of one job inside the work dir.
struct StagedJob {
    dir: PathBuf,
    input: PathBuf,
    output: PathBuf,
}

impl StagedJob {
    fn new(work_dir: &Path, job: &ConversionJob) -> Self {
        let dir = work_dir.join(&job.job_id);
        Self {
            input: dir.join("input").join(staging_name(&job.file.name)),
            output: dir.join(staging_name(&job.output_name)),
            dir,
        }
    }

    /// Removes staged input, output and the job directory.
    ///
    /// Failures are logged and counted, never returned.
    async fn cleanup(&self) {
        for path in [&self.input, &self.output] {
            match tokio::fs::remove_file(path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to remove staged file");
                    CLEANUP_WARNINGS.inc();
                }
            }
        }

        match tokio::fs::remove_dir_all(&self.dir).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!(path = %self.dir.display(), error = %e, "Failed to remove job work dir");
                CLEANUP_WARNINGS.inc();
            }
        }
    }
}

/// Keeps only the last path component of a user supplied name.
fn staging_name(name: &str) -> String {
    Path::new(name)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "input".to_string())
}

impl FfmpegBackend {
    /// Creates a new FFmpeg backend with the given configuration.
    pub fn new(config: LocalBackendConfig) -> Self {
        Self { config }
    }

    /// Creates a backend with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(LocalBackendConfig::default())
    }

    /// Builds the ffmpeg argument list for one conversion.
    fn build_args(&self, input_path: &Path, output_path: &Path, settings: &Settings) -> Vec<String> {
        let format = settings.output_format();
        vec![
            "-loglevel".to_string(),
            self.config.ffmpeg_log_level.clone(),
            "-i".to_string(),
            input_path.to_string_lossy().to_string(),
            "-y".to_string(), // Overwrite output
            "-acodec".to_string(),
            settings.codec.id().to_string(),
            "-b:a".to_string(),
            settings.bitrate.clone(),
            "-ar".to_string(),
            FIXED_SAMPLE_RATE.to_string(),
            "-ac".to_string(),
            FIXED_CHANNELS.to_string(),
            "-f".to_string(),
            format.muxer.to_string(),
            output_path.to_string_lossy().to_string(),
        ]
    }

    /// Stages the input, runs ffmpeg and reads the output back.
    async fn run_staged(
        &self,
        job: &ConversionJob,
        staged: &StagedJob,
    ) -> Result<Vec<u8>, TranscodeError> {
        let staging_err = |source: std::io::Error| TranscodeError::StagingFailed {
            name: job.file.name.clone(),
            source,
        };

        if let Some(input_dir) = staged.input.parent() {
            tokio::fs::create_dir_all(input_dir)
                .await
                .map_err(staging_err)?;
        }
        let bytes = job.file.source.read().await.map_err(staging_err)?;
        tokio::fs::write(&staged.input, &bytes)
            .await
            .map_err(staging_err)?;

        let args = self.build_args(&staged.input, &staged.output, &job.settings);
        debug!(job_id = %job.job_id, command = %args.join(" "), "Running ffmpeg");

        let mut child = Command::new(&self.config.ffmpeg_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    TranscodeError::FfmpegNotFound {
                        path: self.config.ffmpeg_path.clone(),
                    }
                } else {
                    TranscodeError::Io(e)
                }
            })?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| TranscodeError::conversion_failed("ffmpeg stderr not captured", None))?;
        let mut reader = BufReader::new(stderr).lines();

        let timeout_duration = Duration::from_secs(self.config.timeout_secs);
        let result = timeout(timeout_duration, async {
            let mut tail: Vec<String> = Vec::new();
            while let Ok(Some(line)) = reader.next_line().await {
                if tail.len() == STDERR_TAIL_LINES {
                    tail.remove(0);
                }
                tail.push(line);
            }

            let status = child.wait().await?;
            Ok::<(std::process::ExitStatus, Vec<String>), std::io::Error>((status, tail))
        })
        .await;

        match result {
            Ok(Ok((status, tail))) => {
                if !status.success() {
                    return Err(TranscodeError::conversion_failed(
                        format!("FFmpeg exited with code: {:?}", status.code()),
                        if tail.is_empty() {
                            None
                        } else {
                            Some(tail.join("\n"))
                        },
                    ));
                }
            }
            Ok(Err(e)) => return Err(TranscodeError::Io(e)),
            Err(_) => {
                let _ = child.kill().await;
                return Err(TranscodeError::Timeout {
                    timeout_secs: self.config.timeout_secs,
                });
            }
        }

        tokio::fs::read(&staged.output)
            .await
            .map_err(|e| TranscodeError::conversion_failed(format!("Output file not readable: {}", e), None))
    }
}

#[async_trait]
impl TranscodeBackend for FfmpegBackend {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn validate(&self) -> Result<(), TranscodeError> {
        let output = Command::new(&self.config.ffmpeg_path)
            .arg("-version")
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    TranscodeError::FfmpegNotFound {
                        path: self.config.ffmpeg_path.clone(),
                    }
                } else {
                    TranscodeError::Io(e)
                }
            })?;

        if !output.status.success() {
            return Err(TranscodeError::not_ready(format!(
                "ffmpeg -version exited with code: {:?}",
                output.status.code()
            )));
        }

        tokio::fs::create_dir_all(&self.config.work_dir)
            .await
            .map_err(|e| {
                TranscodeError::not_ready(format!(
                    "cannot create work dir {}: {}",
                    self.config.work_dir.display(),
                    e
                ))
            })?;

        Ok(())
    }

    async fn convert(&self, job: ConversionJob) -> Result<ConversionResult, TranscodeError> {
        let start = Instant::now();
        let staged = StagedJob::new(&self.config.work_dir, &job);

        let result = self.run_staged(&job, &staged).await;
        staged.cleanup().await;
        let bytes = result?;

        Ok(ConversionResult {
            job_id: job.job_id,
            payload: Payload::Bytes(bytes),
            output_name: job.output_name,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::FileRef;
    use crate::settings::Codec;

    #[test]
    fn test_build_args_mp3() {
        let backend = FfmpegBackend::with_defaults();
        let settings = Settings::new(Codec::Mp3, "192k");

        let args = backend.build_args(Path::new("in/a.wav"), Path::new("a.mp3"), &settings);
        let tail: Vec<&str> = args.iter().skip(2).map(String::as_str).collect();

        assert_eq!(
            tail,
            vec![
                "-i", "in/a.wav", "-y", "-acodec", "libmp3lame", "-b:a", "192k", "-ar", "44100",
                "-ac", "2", "-f", "mp3", "a.mp3",
            ]
        );
    }

    #[test]
    fn test_build_args_ignore_requested_layout() {
        let backend = FfmpegBackend::with_defaults();
        let mut settings = Settings::new(Codec::Mp3, "192k");
        settings.sample_rate = 8000;
        settings.channels = 0;

        let args = backend.build_args(Path::new("in/a.wav"), Path::new("a.mp3"), &settings);

        let rate_pos = args.iter().position(|a| a == "-ar").unwrap();
        assert_eq!(args[rate_pos + 1], "44100");
        let channels_pos = args.iter().position(|a| a == "-ac").unwrap();
        assert_eq!(args[channels_pos + 1], "2");
    }

    #[test]
    fn test_build_args_aac_uses_adts_container() {
        let backend = FfmpegBackend::with_defaults();
        let settings = Settings::new(Codec::Aac, "128k");

        let args = backend.build_args(Path::new("in/a.flac"), Path::new("a.aac"), &settings);

        let codec_pos = args.iter().position(|a| a == "-acodec").unwrap();
        assert_eq!(args[codec_pos + 1], "aac");
        let format_pos = args.iter().position(|a| a == "-f").unwrap();
        assert_eq!(args[format_pos + 1], "adts");
        assert_eq!(args.last().unwrap(), "a.aac");
    }

    #[test]
    fn test_staging_name_strips_directories() {
        assert_eq!(staging_name("../../x.wav"), "x.wav");
        assert_eq!(staging_name("song.mp3"), "song.mp3");
        assert_eq!(staging_name(""), "input");
        assert_eq!(staging_name(".."), "input");
    }

    #[test]
    fn test_staged_paths_separate_input_and_output() {
        let job = ConversionJob {
            job_id: "job-1".to_string(),
            file: FileRef::from_bytes("a.mp3", None, vec![]),
            settings: Settings::default(),
            output_name: "a.mp3".to_string(),
        };
        let staged = StagedJob::new(Path::new("/work"), &job);
        assert_eq!(staged.dir, PathBuf::from("/work/job-1"));
        assert_eq!(staged.input, PathBuf::from("/work/job-1/input/a.mp3"));
        assert_eq!(staged.output, PathBuf::from("/work/job-1/a.mp3"));
    }

    #[tokio::test]
    async fn test_missing_ffmpeg_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FfmpegBackend::new(
            LocalBackendConfig::with_ffmpeg_path(PathBuf::from("/nonexistent/ffmpeg"))
                .with_work_dir(dir.path().to_path_buf()),
        );

        let err = backend.validate().await.unwrap_err();
        assert!(err.is_unavailable());

        let job = ConversionJob {
            job_id: "job-missing".to_string(),
            file: FileRef::from_bytes("a.wav", None, vec![1, 2, 3]),
            settings: Settings::default(),
            output_name: "a.mp3".to_string(),
        };
        let err = backend.convert(job).await.unwrap_err();
        assert!(matches!(err, TranscodeError::FfmpegNotFound { .. }));
        assert!(!dir.path().join("job-missing").exists());
    }
}
