//! Desktop feedback through external player and notifier commands.

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::{debug, warn};

use crate::metrics::FEEDBACK_FAILURES;

use super::config::FeedbackConfig;
use super::cue::{render_wav, synthesize_cue, CUE_SAMPLE_RATE};
use super::traits::{notification_body, FeedbackService, NOTIFICATION_TITLE};

/// Why a feedback command did not succeed.
#[derive(Debug)]
enum CommandFailure {
    /// The program could not be started at all.
    Missing(std::io::Error),
    /// The program ran and exited unsuccessfully.
    Exit(Option<i32>),
    /// The program did not finish in time.
    TimedOut,
    Other(String),
}

impl std::fmt::Display for CommandFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing(e) => write!(f, "command not available: {}", e),
            Self::Exit(code) => write!(f, "command exited with code: {:?}", code),
            Self::TimedOut => write!(f, "command timed out"),
            Self::Other(reason) => f.write_str(reason),
        }
    }
}

/// Plays the completion cue and shows a desktop notification.
///
/// Once the notifier fails to start or refuses a notification, later
/// notifications are skipped for the lifetime of the service.
pub struct DesktopFeedback {
    config: FeedbackConfig,
    denied: AtomicBool,
}

impl DesktopFeedback {
    pub fn new(config: FeedbackConfig) -> Self {
        Self {
            config,
            denied: AtomicBool::new(false),
        }
    }

    /// Whether notifications have been found unavailable.
    pub fn notifications_denied(&self) -> bool {
        self.denied.load(Ordering::SeqCst)
    }

    async fn run(&self, command: &[String], extra: &[&str]) -> Result<(), CommandFailure> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| CommandFailure::Other("empty command".to_string()))?;

        let mut child = Command::new(program)
            .args(args)
            .args(extra)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(CommandFailure::Missing)?;

        match timeout(Duration::from_secs(self.config.timeout_secs), child.wait()).await {
            Ok(Ok(status)) if status.success() => Ok(()),
            Ok(Ok(status)) => Err(CommandFailure::Exit(status.code())),
            Ok(Err(e)) => Err(CommandFailure::Other(e.to_string())),
            Err(_) => {
                let _ = child.kill().await;
                Err(CommandFailure::TimedOut)
            }
        }
    }

    async fn play_cue(&self) -> Result<(), CommandFailure> {
        let wav = render_wav(&synthesize_cue(CUE_SAMPLE_RATE), CUE_SAMPLE_RATE)
            .map_err(|e| CommandFailure::Other(format!("failed to render cue: {}", e)))?;

        let path = std::env::temp_dir().join(format!("konverter-cue-{}.wav", uuid::Uuid::new_v4()));
        tokio::fs::write(&path, &wav)
            .await
            .map_err(|e| CommandFailure::Other(format!("failed to write cue: {}", e)))?;

        let arg = path_arg(&path);
        let result = self.run(&self.config.player_command, &[arg.as_str()]).await;
        if let Err(e) = tokio::fs::remove_file(&path).await {
            debug!(path = %path.display(), error = %e, "Failed to remove cue file");
        }
        result
    }

    async fn notify(&self, converted: usize) -> Result<(), CommandFailure> {
        let body = notification_body(converted);
        let result = self
            .run(&self.config.notify_command, &[NOTIFICATION_TITLE, body.as_str()])
            .await;
        if matches!(result, Err(CommandFailure::Missing(_)) | Err(CommandFailure::Exit(_))) {
            self.denied.store(true, Ordering::SeqCst);
        }
        result
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

#[async_trait]
impl FeedbackService for DesktopFeedback {
    fn name(&self) -> &str {
        "desktop"
    }

    async fn on_batch_success(&self, converted: usize) {
        if self.config.cue {
            if let Err(e) = self.play_cue().await {
                warn!(error = %e, "Failed to play completion cue");
                FEEDBACK_FAILURES.with_label_values(&["cue"]).inc();
            }
        }

        if !self.config.notifications {
            return;
        }
        if self.notifications_denied() {
            debug!("Notifications unavailable, skipping");
            return;
        }
        if let Err(e) = self.notify(converted).await {
            warn!(error = %e, "Failed to show notification");
            FEEDBACK_FAILURES.with_label_values(&["notification"]).inc();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(notify_command: Vec<&str>) -> FeedbackConfig {
        FeedbackConfig {
            enabled: true,
            cue: false,
            notifications: true,
            notify_command: notify_command.into_iter().map(String::from).collect(),
            timeout_secs: 2,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_missing_notifier_marks_denied() {
        let feedback = DesktopFeedback::new(config(vec!["/nonexistent/notify-send"]));
        assert!(!feedback.notifications_denied());

        feedback.on_batch_success(2).await;
        assert!(feedback.notifications_denied());

        // Later batches skip the notifier without failing.
        feedback.on_batch_success(1).await;
        assert!(feedback.notifications_denied());
    }

    #[tokio::test]
    async fn test_empty_command_is_not_denial() {
        let feedback = DesktopFeedback::new(config(vec![]));
        feedback.on_batch_success(1).await;
        assert!(!feedback.notifications_denied());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_successful_notifier() {
        let feedback = DesktopFeedback::new(config(vec!["true"]));
        feedback.on_batch_success(1).await;
        assert!(!feedback.notifications_denied());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_missing_player_is_swallowed() {
        let feedback = DesktopFeedback::new(FeedbackConfig {
            enabled: true,
            cue: true,
            notifications: false,
            player_command: vec!["/nonexistent/aplay".to_string()],
            timeout_secs: 2,
            ..Default::default()
        });
        feedback.on_batch_success(1).await;
    }
}
