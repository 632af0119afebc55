//! The queue of files selected for conversion.
//!
//! The queue only filters and stores candidates. Statuses are changed by the
//! orchestrator, which owns the queue and serializes access to it.

mod types;

pub use types::{
    AddOutcome, FileRef, FileSource, FileStatus, QueuedFile, QueuedFileSummary, AUDIO_EXTENSIONS,
};

use thiserror::Error;

/// Errors from queue operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueueError {
    /// None of the candidates passed the audio filter.
    #[error("no valid audio files selected")]
    NoAudioFiles,

    /// Index does not address an entry.
    #[error("index {index} out of range for queue of {len} file(s)")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Ordered list of files awaiting conversion.
#[derive(Debug, Default)]
pub struct FileQueue {
    entries: Vec<QueuedFile>,
    next_id: u64,
}

impl FileQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends every audio candidate, keeping insertion order and duplicates.
    ///
    /// When no candidate passes the filter the queue is left untouched.
    pub fn add(&mut self, candidates: Vec<FileRef>) -> Result<AddOutcome, QueueError> {
        let offered = candidates.len();
        let audio: Vec<FileRef> = candidates.into_iter().filter(FileRef::is_audio).collect();

        if audio.is_empty() {
            return Err(QueueError::NoAudioFiles);
        }

        let accepted = audio.len();
        for file in audio {
            self.next_id += 1;
            self.entries.push(QueuedFile {
                id: self.next_id,
                file,
                status: FileStatus::Pending,
            });
        }

        Ok(AddOutcome {
            accepted,
            rejected: offered - accepted,
            total: self.entries.len(),
        })
    }

    /// Removes the entry at `index`, preserving the order of the rest.
    pub fn remove(&mut self, index: usize) -> Result<QueuedFile, QueueError> {
        if index >= self.entries.len() {
            return Err(QueueError::IndexOutOfRange {
                index,
                len: self.entries.len(),
            });
        }
        Ok(self.entries.remove(index))
    }

    /// Drops all entries.
    pub fn reset(&mut self) {
        self.entries.clear();
    }

    /// Keeps only the entries matching `keep`, in order.
    pub fn retain(&mut self, keep: impl FnMut(&QueuedFile) -> bool) {
        self.entries.retain(keep);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order.
    pub fn entries(&self) -> &[QueuedFile] {
        &self.entries
    }

    /// Looks up an entry by id.
    pub fn get(&self, id: u64) -> Option<&QueuedFile> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Sets the status of the entry with `id`. Returns false if it is gone.
    pub fn set_status(&mut self, id: u64, status: FileStatus) -> bool {
        match self.entries.iter_mut().find(|e| e.id == id) {
            Some(entry) => {
                entry.status = status;
                true
            }
            None => false,
        }
    }

    /// Puts every entry back to [`FileStatus::Pending`].
    pub fn mark_all_pending(&mut self) {
        for entry in &mut self.entries {
            entry.status = FileStatus::Pending;
        }
    }

    /// Serializable view of all entries.
    pub fn summaries(&self) -> Vec<QueuedFileSummary> {
        self.entries.iter().map(QueuedFile::summary).collect()
    }
}
