//! Chunking, encoding, and session bookkeeping for handin uploads.

mod chunked;
mod encode;
mod session;

pub use chunked::{Chunk, ChunkLayout, ChunkReader, ChunkSpan, SourceFile, chunk_count};
pub use encode::{encode_chunk, strip_data_url_prefix};
pub use session::{SessionStatus, UploadSession, sanitize_filename};

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("source truncated at byte {offset}: wanted {wanted} more bytes")]
    SourceTruncated { offset: u64, wanted: usize },
}
