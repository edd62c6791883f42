use std::time::Duration;

/// Raw chunk size (20 MiB).
///
/// Base64 inflates the payload by ~4/3, so the encoded body of a 20 MiB
/// chunk is ~27 MiB — safely under the intermediary's request-size ceiling.
pub const DEFAULT_CHUNK_SIZE: usize = 20 * 1024 * 1024;

/// Total delivery attempts per chunk (first try + retries).
pub const MAX_CHUNK_ATTEMPTS: u32 = 3;

/// Fixed pause between retries of the same chunk.
pub const RETRY_BACKOFF: Duration = Duration::from_secs(2);

/// Content type for every request body.
///
/// The body is JSON, but a JSON content type would trigger a CORS preflight
/// the intermediary cannot answer. It parses the body itself.
pub const TEXT_CONTENT_TYPE: &str = "text/plain;charset=utf-8";

/// `action` marker opening a resumable upload session.
pub const ACTION_INIT: &str = "init";

/// `action` marker carrying one encoded chunk.
pub const ACTION_UPLOAD: &str = "upload";

/// `action` marker for the side-effect-free connectivity probe.
pub const ACTION_TEST: &str = "test";
