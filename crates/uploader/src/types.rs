//! Events and results for the submission flow.

use std::path::PathBuf;

/// Event emitted while an upload session runs.
#[derive(Debug, Clone)]
pub enum UploadEvent {
    /// One more chunk delivered.
    Progress { percent: u8, status: String },
    /// Every chunk delivered; the session is done.
    Completed { upload_id: Option<String> },
    /// The session ended in failure.
    Failed { error: String },
}

/// Outcome of one submission, fallback included.
///
/// `submit` never returns an error: a failed or endpoint-less upload shows
/// up here as `uploaded: false` plus the local path the file was saved to.
#[derive(Debug, Clone)]
pub struct SubmissionResult {
    pub uploaded: bool,
    pub error: Option<String>,
    pub fallback_path: Option<PathBuf>,
}
