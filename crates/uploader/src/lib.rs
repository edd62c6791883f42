//! Upload transport for handin submissions.
//!
//! Drives one file through the chunked upload protocol: init handshake,
//! strict-order chunk delivery with bounded retry, progress events, and a
//! local fallback save when no endpoint is configured or the session fails.

mod endpoint;
mod error;
mod fallback;
mod submit;
mod transport;
mod types;

pub use endpoint::{EndpointReply, HttpEndpoint, SubmissionEndpoint};
pub use error::UploadError;
pub use fallback::save_fallback;
pub use submit::Submitter;
pub use transport::ChunkUpload;
pub use types::{SubmissionResult, UploadEvent};
