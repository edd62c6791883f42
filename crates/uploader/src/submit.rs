//! Session boundary: runs the transport and combines it with the fallback
//! saver. Nothing here returns an error to the caller.

use std::path::PathBuf;

use handin_protocol::messages::{ConnectivityTestRequest, UploadResponse};
use handin_transfer::{SourceFile, sanitize_filename};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::endpoint::SubmissionEndpoint;
use crate::error::UploadError;
use crate::fallback::save_fallback;
use crate::transport::ChunkUpload;
use crate::types::{SubmissionResult, UploadEvent};

/// Runs submissions end to end.
///
/// Owns the event channel and the cancellation token for its sessions. One
/// submission runs at a time; the fallback save only happens once the
/// transport session has ended.
pub struct Submitter {
    events_tx: mpsc::Sender<UploadEvent>,
    events_rx: Option<mpsc::Receiver<UploadEvent>>,
    cancel: CancellationToken,
    fallback_dir: PathBuf,
    chunk_size: usize,
}

impl Submitter {
    /// Creates a submitter saving fallback copies under `fallback_dir`.
    pub fn new(fallback_dir: impl Into<PathBuf>) -> Self {
        let (events_tx, events_rx) = mpsc::channel(256);
        Self {
            events_tx,
            events_rx: Some(events_rx),
            cancel: CancellationToken::new(),
            fallback_dir: fallback_dir.into(),
            chunk_size: 0,
        }
    }

    /// Overrides the chunk size (0 keeps the protocol default).
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Takes the event receiver. Can only be called once.
    pub fn take_events(&mut self) -> Option<mpsc::Receiver<UploadEvent>> {
        self.events_rx.take()
    }

    /// Returns a cancellation token for the current submission.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Submits `source` under `dest_name` (sanitized here).
    ///
    /// With no endpoint configured the file is saved locally right away.
    /// A failed session emits [`UploadEvent::Failed`] and then saves the
    /// renamed file locally for manual handling.
    pub async fn submit(
        &self,
        endpoint: Option<&dyn SubmissionEndpoint>,
        source: &SourceFile,
        dest_name: &str,
    ) -> SubmissionResult {
        let filename = sanitize_filename(dest_name);

        let Some(endpoint) = endpoint else {
            info!(filename = %filename, "no endpoint configured, saving locally");
            let fallback_path = save_fallback(source.path(), &filename, &self.fallback_dir);
            return SubmissionResult {
                uploaded: false,
                error: None,
                fallback_path,
            };
        };

        let upload =
            ChunkUpload::new(endpoint, self.cancel.clone()).with_chunk_size(self.chunk_size);
        match upload.run(source, &filename, &self.events_tx).await {
            Ok(upload_id) => {
                info!(filename = %filename, upload_id = ?upload_id, "submission uploaded");
                SubmissionResult {
                    uploaded: true,
                    error: None,
                    fallback_path: None,
                }
            }
            Err(e) => {
                let err_msg = e.to_string();
                error!(filename = %filename, error = %err_msg, "submission failed");
                let _ = self
                    .events_tx
                    .send(UploadEvent::Failed {
                        error: err_msg.clone(),
                    })
                    .await;

                let fallback_path = save_fallback(source.path(), &filename, &self.fallback_dir);
                SubmissionResult {
                    uploaded: false,
                    error: Some(err_msg),
                    fallback_path,
                }
            }
        }
    }

    /// Sends the side-effect-free `action:"test"` probe.
    pub async fn test_connection(
        endpoint: &dyn SubmissionEndpoint,
    ) -> Result<(), UploadError> {
        let body = serde_json::to_string(&ConnectivityTestRequest::default())?;
        let reply = endpoint.post(body).await?;
        if !reply.is_success() {
            return Err(UploadError::Status(reply.status));
        }
        let resp: UploadResponse = serde_json::from_str(&reply.body)?;
        if resp.is_success() {
            Ok(())
        } else {
            Err(UploadError::Rejected(
                resp.message
                    .unwrap_or_else(|| "connectivity test failed".to_string()),
            ))
        }
    }
}
