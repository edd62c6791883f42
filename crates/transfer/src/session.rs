use std::sync::RwLock;

/// Characters that are illegal in filenames on at least one target
/// filesystem.
const ILLEGAL_FILENAME_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Replaces filesystem-illegal characters in a destination filename with `_`.
///
/// A name that sanitizes to nothing becomes `"submission"`.
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_control() || ILLEGAL_FILENAME_CHARS.contains(&c) {
                '_'
            } else {
                c
            }
        })
        .collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        "submission".to_string()
    } else {
        cleaned.to_string()
    }
}

/// State of an upload session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
    Cancelled,
}

/// Bookkeeping for one end-to-end upload attempt (thread-safe).
///
/// Created when an upload is initiated, advanced chunk by chunk, and
/// discarded once it reaches a terminal state. The remote `upload_id` is
/// scoped to this session; a new session never inherits one.
pub struct UploadSession {
    inner: RwLock<SessionInner>,
}

struct SessionInner {
    id: String,
    filename: String,
    mime_type: String,
    total_chunks: u32,
    delivered: u32,
    upload_id: Option<String>,
    status: SessionStatus,
    error: String,
}

impl UploadSession {
    /// Creates a pending session for `filename` (sanitized here).
    pub fn new(filename: &str, mime_type: &str, total_chunks: u32) -> Self {
        Self {
            inner: RwLock::new(SessionInner {
                id: uuid::Uuid::new_v4().to_string(),
                filename: sanitize_filename(filename),
                mime_type: mime_type.to_string(),
                total_chunks,
                delivered: 0,
                upload_id: None,
                status: SessionStatus::Pending,
                error: String::new(),
            }),
        }
    }

    /// Marks the session as in-progress.
    pub fn start(&self) {
        let mut s = self.inner.write().unwrap();
        s.status = SessionStatus::InProgress;
    }

    /// Records one delivered chunk and returns the new progress percent.
    pub fn record_chunk(&self) -> u8 {
        let mut s = self.inner.write().unwrap();
        s.delivered = (s.delivered + 1).min(s.total_chunks);
        percent_of(s.delivered, s.total_chunks)
    }

    /// Progress as a rounded percentage, exactly 100 only when every chunk
    /// has been delivered.
    pub fn percent(&self) -> u8 {
        let s = self.inner.read().unwrap();
        percent_of(s.delivered, s.total_chunks)
    }

    /// Captures the identifier issued by the endpoint.
    pub fn set_upload_id(&self, upload_id: &str) {
        let mut s = self.inner.write().unwrap();
        s.upload_id = Some(upload_id.to_string());
    }

    pub fn upload_id(&self) -> Option<String> {
        let s = self.inner.read().unwrap();
        s.upload_id.clone()
    }

    /// Marks the session as completed.
    pub fn complete(&self) {
        let mut s = self.inner.write().unwrap();
        s.status = SessionStatus::Completed;
    }

    /// Marks the session as failed with a diagnostic message.
    pub fn fail(&self, err: &str) {
        let mut s = self.inner.write().unwrap();
        s.status = SessionStatus::Failed;
        s.error = err.to_string();
    }

    /// Marks the session as cancelled.
    pub fn cancel(&self) {
        let mut s = self.inner.write().unwrap();
        s.status = SessionStatus::Cancelled;
    }

    /// Returns `true` while the session is pending or in-progress.
    pub fn is_active(&self) -> bool {
        let s = self.inner.read().unwrap();
        matches!(s.status, SessionStatus::Pending | SessionStatus::InProgress)
    }

    pub fn id(&self) -> String {
        self.inner.read().unwrap().id.clone()
    }

    /// Sanitized destination filename.
    pub fn filename(&self) -> String {
        self.inner.read().unwrap().filename.clone()
    }

    pub fn mime_type(&self) -> String {
        self.inner.read().unwrap().mime_type.clone()
    }

    pub fn total_chunks(&self) -> u32 {
        self.inner.read().unwrap().total_chunks
    }

    pub fn delivered(&self) -> u32 {
        self.inner.read().unwrap().delivered
    }

    pub fn status(&self) -> SessionStatus {
        self.inner.read().unwrap().status
    }

    /// Last recorded error message (empty unless failed).
    pub fn error(&self) -> String {
        self.inner.read().unwrap().error.clone()
    }
}

fn percent_of(delivered: u32, total: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    (f64::from(delivered) * 100.0 / f64::from(total)).round() as u8
}
