//! Configuration for completion feedback.

use serde::{Deserialize, Serialize};

/// Settings for the desktop cue and notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackConfig {
    /// Master switch. When false the no-op feedback is used.
    #[serde(default)]
    pub enabled: bool,

    /// Play the completion cue.
    #[serde(default = "default_true")]
    pub cue: bool,

    /// Show a desktop notification.
    #[serde(default = "default_true")]
    pub notifications: bool,

    /// Program and arguments used to play a WAV file; the file path is appended.
    #[serde(default = "default_player_command")]
    pub player_command: Vec<String>,

    /// Program and arguments used to notify; title and body are appended.
    #[serde(default = "default_notify_command")]
    pub notify_command: Vec<String>,

    /// Upper bound for each command, in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_player_command() -> Vec<String> {
    vec!["aplay".to_string(), "-q".to_string()]
}

fn default_notify_command() -> Vec<String> {
    vec!["notify-send".to_string()]
}

fn default_timeout() -> u64 {
    5
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            cue: true,
            notifications: true,
            player_command: default_player_command(),
            notify_command: default_notify_command(),
            timeout_secs: default_timeout(),
        }
    }
}
