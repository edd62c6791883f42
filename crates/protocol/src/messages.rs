use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::constants::{ACTION_INIT, ACTION_TEST, ACTION_UPLOAD};

// ---------------------------------------------------------------------------
// Request payloads
// ---------------------------------------------------------------------------

/// Opens a resumable upload session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitUploadRequest {
    pub action: String,
    pub filename: String,
    pub mime_type: String,
    pub total_size: u64,
    pub total_chunks: u32,
}

impl InitUploadRequest {
    /// Creates an init request for the given destination file.
    pub fn new(filename: &str, mime_type: &str, total_size: u64, total_chunks: u32) -> Self {
        Self {
            action: ACTION_INIT.to_string(),
            filename: filename.to_string(),
            mime_type: mime_type.to_string(),
            total_size,
            total_chunks,
        }
    }
}

/// Carries one base64-encoded chunk.
///
/// `filename` is only present on the first chunk; later chunks are matched
/// by `upload_id`. `byte_range` addresses range-aware storage backends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkUploadRequest {
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    pub mime_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_id: Option<String>,
    pub chunk_index: u32,
    pub total_chunks: u32,
    pub encoded_data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub byte_range: Option<ByteRange>,
}

impl ChunkUploadRequest {
    /// Creates a chunk request with the `upload` action marker.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        filename: Option<String>,
        mime_type: &str,
        upload_id: Option<String>,
        chunk_index: u32,
        total_chunks: u32,
        encoded_data: String,
        byte_range: Option<ByteRange>,
    ) -> Self {
        Self {
            action: ACTION_UPLOAD.to_string(),
            filename,
            mime_type: mime_type.to_string(),
            upload_id,
            chunk_index,
            total_chunks,
            encoded_data,
            byte_range,
        }
    }
}

/// Side-effect-free probe checking that the endpoint answers at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectivityTestRequest {
    pub action: String,
}

impl Default for ConnectivityTestRequest {
    fn default() -> Self {
        Self {
            action: ACTION_TEST.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Response envelope
// ---------------------------------------------------------------------------

/// Application-level outcome reported by the endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseStatus {
    #[serde(rename = "success")]
    Success,
    #[serde(rename = "error")]
    Error,
}

/// Reply to every request.
///
/// `upload_id` appears on the init reply (or on the first chunk's reply for
/// endpoints without a handshake) and must be echoed on later chunks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub status: ResponseStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_id: Option<String>,
}

impl UploadResponse {
    /// Returns `true` for an explicit `status:"success"` reply.
    pub fn is_success(&self) -> bool {
        self.status == ResponseStatus::Success
    }
}

// ---------------------------------------------------------------------------
// ByteRange
// ---------------------------------------------------------------------------

/// Byte-range descriptor in the `start-end/total` form used by range-aware
/// storage backends. `end` is inclusive.
///
/// Serialized as the literal string (e.g. `"0-1048575/3145728"`), not as an
/// object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
    pub total: u64,
}

impl ByteRange {
    /// Builds a range from a half-open `[start, end)` span.
    ///
    /// The span must be non-empty: an inclusive end cannot express it
    /// otherwise.
    pub fn from_span(start: u64, end_exclusive: u64, total: u64) -> Self {
        debug_assert!(end_exclusive > start);
        Self {
            start,
            end: end_exclusive - 1,
            total,
        }
    }

    /// Number of bytes the range covers.
    pub fn byte_count(&self) -> u64 {
        self.end - self.start + 1
    }
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}/{}", self.start, self.end, self.total)
    }
}

/// Error parsing a `start-end/total` string.
#[derive(Debug, thiserror::Error)]
#[error("invalid byte range: {0}")]
pub struct ParseByteRangeError(String);

impl FromStr for ByteRange {
    type Err = ParseByteRangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || ParseByteRangeError(s.to_string());
        let (span, total) = s.split_once('/').ok_or_else(bad)?;
        let (start, end) = span.split_once('-').ok_or_else(bad)?;
        let range = Self {
            start: start.parse().map_err(|_| bad())?,
            end: end.parse().map_err(|_| bad())?,
            total: total.parse().map_err(|_| bad())?,
        };
        if range.end < range.start || range.total <= range.end {
            return Err(bad());
        }
        Ok(range)
    }
}

impl Serialize for ByteRange {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ByteRange {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
