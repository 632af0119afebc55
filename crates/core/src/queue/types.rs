//! Types for the file queue.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// Extensions accepted even when no audio media type is declared.
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "ogg", "m4a", "flac", "aac", "wma"];

/// Where the bytes of a candidate file live.
#[derive(Debug, Clone)]
pub enum FileSource {
    /// A file on the local filesystem.
    Path(PathBuf),
    /// Bytes already held in memory (e.g. an HTTP upload).
    Memory(Arc<Vec<u8>>),
}

impl FileSource {
    /// Reads the full contents of the source.
    pub async fn read(&self) -> std::io::Result<Vec<u8>> {
        match self {
            Self::Path(path) => tokio::fs::read(path).await,
            Self::Memory(bytes) => Ok(bytes.as_ref().clone()),
        }
    }

    /// Size in bytes, when cheaply known.
    pub fn len_hint(&self) -> Option<u64> {
        match self {
            Self::Path(_) => None,
            Self::Memory(bytes) => Some(bytes.len() as u64),
        }
    }
}

/// A candidate file offered for conversion.
#[derive(Debug, Clone)]
pub struct FileRef {
    /// Original file name as selected by the user.
    pub name: String,
    /// Declared media type, if any (e.g. `audio/wav`).
    pub media_type: Option<String>,
    /// Where to read the content from.
    pub source: FileSource,
}

impl FileRef {
    /// Creates a reference to a file on disk, named after its last path component.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string_lossy().to_string());
        Self {
            name,
            media_type: None,
            source: FileSource::Path(path),
        }
    }

    /// Creates a reference to in-memory content.
    pub fn from_bytes(
        name: impl Into<String>,
        media_type: Option<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            name: name.into(),
            media_type,
            source: FileSource::Memory(Arc::new(bytes)),
        }
    }

    /// Whether this candidate looks like audio: an `audio/` media type or a
    /// known audio extension (case-insensitive).
    pub fn is_audio(&self) -> bool {
        let declared_audio = self
            .media_type
            .as_deref()
            .map(|t| t.starts_with("audio/"))
            .unwrap_or(false);
        if declared_audio {
            return true;
        }

        match self.name.rsplit_once('.') {
            Some((_, ext)) => {
                let ext = ext.to_ascii_lowercase();
                AUDIO_EXTENSIONS.contains(&ext.as_str())
            }
            None => false,
        }
    }
}

/// Conversion status of a queued file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Pending,
    Converting,
    Done,
    Failed,
}

/// A file waiting in (or processed from) the queue.
#[derive(Debug, Clone)]
pub struct QueuedFile {
    /// Queue-unique id, stable across removals of other entries.
    pub id: u64,
    /// The candidate as it was added.
    pub file: FileRef,
    /// Current status; only the orchestrator changes it.
    pub status: FileStatus,
}

impl QueuedFile {
    /// Original file name.
    pub fn name(&self) -> &str {
        &self.file.name
    }

    /// Serializable view of this entry.
    pub fn summary(&self) -> QueuedFileSummary {
        QueuedFileSummary {
            id: self.id,
            name: self.file.name.clone(),
            media_type: self.file.media_type.clone(),
            size_bytes: self.file.source.len_hint(),
            status: self.status,
        }
    }
}

/// Serializable view of a [`QueuedFile`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedFileSummary {
    pub id: u64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    pub status: FileStatus,
}

/// Result of [`FileQueue::add`](super::FileQueue::add).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddOutcome {
    /// Number of candidates that passed the audio filter and were appended.
    pub accepted: usize,
    /// Number of candidates rejected by the filter.
    pub rejected: usize,
    /// Queue length after the operation.
    pub total: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str, media_type: Option<&str>) -> FileRef {
        FileRef::from_bytes(name, media_type.map(str::to_string), vec![])
    }

    #[test]
    fn test_is_audio_by_media_type() {
        assert!(named("blob", Some("audio/x-wav")).is_audio());
        assert!(!named("blob", Some("video/mp4")).is_audio());
    }

    #[test]
    fn test_is_audio_by_extension() {
        for name in ["a.mp3", "b.WAV", "c.Ogg", "d.m4a", "e.flac", "f.aac", "g.wma"] {
            assert!(named(name, None).is_audio(), "{} should be audio", name);
        }
        assert!(!named("notes.txt", None).is_audio());
        assert!(!named("mp3", None).is_audio());
        assert!(!named("cover.jpg", Some("image/jpeg")).is_audio());
    }

    #[test]
    fn test_from_path_uses_file_name() {
        let file = FileRef::from_path("/music/album/01 Intro.flac");
        assert_eq!(file.name, "01 Intro.flac");
        assert!(file.media_type.is_none());
        assert!(file.is_audio());
    }

    #[tokio::test]
    async fn test_memory_source_read() {
        let file = FileRef::from_bytes("a.wav", None, vec![1, 2, 3]);
        assert_eq!(file.source.read().await.unwrap(), vec![1, 2, 3]);
        assert_eq!(file.source.len_hint(), Some(3));
    }

    #[test]
    fn test_summary_serialization() {
        let queued = QueuedFile {
            id: 7,
            file: named("a.wav", Some("audio/wav")),
            status: FileStatus::Converting,
        };
        let json = serde_json::to_value(queued.summary()).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["name"], "a.wav");
        assert_eq!(json["status"], "converting");
        assert_eq!(json["size_bytes"], 0);
    }
}
