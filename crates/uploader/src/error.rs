//! Upload error taxonomy.

use handin_transfer::TransferError;

/// Errors produced while driving an upload session.
///
/// Transient errors ([`is_transient`](UploadError::is_transient)) are retried
/// up to the per-chunk ceiling; everything else ends the session on first
/// sight.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// Network-level failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status.
    #[error("endpoint returned HTTP {0}")]
    Status(u16),

    /// Body that fails to parse as JSON during a chunk attempt.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTML or otherwise non-JSON reply at session init. The retry loop
    /// cannot fix a configuration problem.
    #[error("endpoint misconfigured: {0}")]
    Misconfigured(String),

    /// Explicit `status:"error"` reply: the endpoint rejected the request
    /// semantically, so redelivery is pointless.
    #[error("endpoint rejected request: {0}")]
    Rejected(String),

    /// Source bytes could not be read or encoded.
    #[error("encoding failed: {0}")]
    Encoding(#[from] TransferError),

    #[error("cancelled")]
    Cancelled,

    /// Terminal aggregate: a chunk exhausted its retry budget.
    #[error("chunk {chunk_index} failed after {attempts} attempts: {last}")]
    SessionFailed {
        chunk_index: u32,
        attempts: u32,
        #[source]
        last: Box<UploadError>,
    },
}

impl UploadError {
    /// Returns `true` for failures worth resubmitting the identical payload
    /// after a backoff pause.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Status(_) | Self::Json(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(UploadError::Status(503).is_transient());
        let json_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        assert!(UploadError::Json(json_err).is_transient());

        assert!(!UploadError::Misconfigured("html".into()).is_transient());
        assert!(!UploadError::Rejected("quota".into()).is_transient());
        assert!(!UploadError::Cancelled.is_transient());
        assert!(
            !UploadError::Encoding(TransferError::SourceTruncated {
                offset: 0,
                wanted: 4
            })
            .is_transient()
        );
    }

    #[test]
    fn session_failed_preserves_last_error() {
        let err = UploadError::SessionFailed {
            chunk_index: 2,
            attempts: 3,
            last: Box::new(UploadError::Status(502)),
        };
        let msg = err.to_string();
        assert!(msg.contains("chunk 2"));
        assert!(msg.contains("3 attempts"));
        assert!(msg.contains("502"));
        assert!(!err.is_transient());
    }
}
