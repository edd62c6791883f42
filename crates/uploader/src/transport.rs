//! Core transport loop: init handshake, strict-order chunk delivery with
//! bounded retry, and progress reporting.

use handin_protocol::constants::{DEFAULT_CHUNK_SIZE, MAX_CHUNK_ATTEMPTS, RETRY_BACKOFF};
use handin_protocol::messages::{ByteRange, ChunkUploadRequest, InitUploadRequest, UploadResponse};
use handin_transfer::{ChunkReader, SourceFile, UploadSession, chunk_count};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::endpoint::SubmissionEndpoint;
use crate::error::UploadError;
use crate::types::UploadEvent;

/// Drives one upload session against a [`SubmissionEndpoint`].
///
/// Chunks go out one at a time in ascending index order — resumable backends
/// rely on the append-order stream, and a single in-flight chunk bounds peak
/// memory to one raw+encoded buffer.
pub struct ChunkUpload<'a> {
    endpoint: &'a dyn SubmissionEndpoint,
    cancel: CancellationToken,
    chunk_size: usize,
    handshake: bool,
}

impl<'a> ChunkUpload<'a> {
    /// Creates an upload with the default chunk size and init handshake.
    pub fn new(endpoint: &'a dyn SubmissionEndpoint, cancel: CancellationToken) -> Self {
        Self {
            endpoint,
            cancel,
            chunk_size: DEFAULT_CHUNK_SIZE,
            handshake: true,
        }
    }

    /// Overrides the chunk size (0 keeps the default).
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        if chunk_size > 0 {
            self.chunk_size = chunk_size;
        }
        self
    }

    /// Skips the init request, for endpoints that issue their identifier on
    /// the first chunk's reply instead.
    pub fn without_handshake(mut self) -> Self {
        self.handshake = false;
        self
    }

    /// Runs the session to completion.
    ///
    /// Emits [`UploadEvent::Progress`] after every delivered chunk and
    /// [`UploadEvent::Completed`] at the end. Returns the endpoint-issued
    /// upload identifier, if any.
    pub async fn run(
        &self,
        source: &SourceFile,
        filename: &str,
        events_tx: &mpsc::Sender<UploadEvent>,
    ) -> Result<Option<String>, UploadError> {
        let total = chunk_count(source.size(), self.chunk_size);
        let session = UploadSession::new(filename, source.mime_type(), total);
        session.start();

        let result = self.run_session(&session, source, events_tx).await;
        match &result {
            Ok(_) => session.complete(),
            Err(UploadError::Cancelled) => session.cancel(),
            Err(e) => session.fail(&e.to_string()),
        }
        result
    }

    async fn run_session(
        &self,
        session: &UploadSession,
        source: &SourceFile,
        events_tx: &mpsc::Sender<UploadEvent>,
    ) -> Result<Option<String>, UploadError> {
        self.check_cancelled()?;

        if self.handshake {
            self.init_session(session, source).await?;
        }

        let mut reader = tokio::task::spawn_blocking({
            let source = source.clone();
            let chunk_size = self.chunk_size;
            move || ChunkReader::open(&source, chunk_size)
        })
        .await
        .map_err(join_error)??;

        loop {
            self.check_cancelled()?;

            // Read and base64-encode off the async thread: both touch a
            // whole chunk and the buffers live only for this iteration.
            let (returned, next) = tokio::task::spawn_blocking(move || {
                let next = reader.next_chunk().map(|chunk| {
                    chunk.map(|c| (c.index, c.start, c.end, handin_transfer::encode_chunk(&c.data)))
                });
                (reader, next)
            })
            .await
            .map_err(join_error)?;
            reader = returned;

            let Some((index, start, end, encoded)) = next? else {
                break;
            };

            let total = session.total_chunks();
            let payload = ChunkUploadRequest::new(
                (index == 0).then(|| session.filename()),
                &session.mime_type(),
                session.upload_id(),
                index,
                total,
                encoded,
                (end > start).then(|| ByteRange::from_span(start, end, source.size())),
            );

            let resp = self.deliver_chunk(index, &payload).await?;
            if session.upload_id().is_none()
                && let Some(id) = resp.upload_id.as_deref()
            {
                debug!(upload_id = %id, "captured upload id from chunk reply");
                session.set_upload_id(id);
            }

            let percent = session.record_chunk();
            debug!(chunk = index, total, percent, "chunk delivered");
            let status = format!("Uploaded chunk {} of {total}", index + 1);
            let _ = events_tx
                .send(UploadEvent::Progress { percent, status })
                .await;
        }

        info!(
            filename = %session.filename(),
            chunks = session.total_chunks(),
            "upload complete"
        );
        let _ = events_tx
            .send(UploadEvent::Completed {
                upload_id: session.upload_id(),
            })
            .await;
        Ok(session.upload_id())
    }

    /// Sends the init request and captures the session identifier.
    ///
    /// An HTML or unparseable reply here is a configuration problem, not a
    /// transient fault: fail before any chunk goes out.
    async fn init_session(
        &self,
        session: &UploadSession,
        source: &SourceFile,
    ) -> Result<(), UploadError> {
        let req = InitUploadRequest::new(
            &session.filename(),
            source.mime_type(),
            source.size(),
            session.total_chunks(),
        );
        let reply = self.endpoint.post(serde_json::to_string(&req)?).await?;

        if reply.looks_like_html() {
            return Err(UploadError::Misconfigured(format!(
                "init returned a {} document instead of JSON",
                reply.content_type
            )));
        }
        if !reply.is_success() {
            return Err(UploadError::Status(reply.status));
        }
        let resp: UploadResponse = serde_json::from_str(&reply.body).map_err(|e| {
            UploadError::Misconfigured(format!("init reply is not valid JSON: {e}"))
        })?;
        if !resp.is_success() {
            return Err(UploadError::Rejected(
                resp.message.unwrap_or_else(|| "init rejected".to_string()),
            ));
        }

        if let Some(id) = resp.upload_id.as_deref() {
            debug!(upload_id = %id, "session initialized");
            session.set_upload_id(id);
        }
        Ok(())
    }

    /// Delivers one chunk with bounded retry and fixed backoff.
    ///
    /// Transient failures resubmit the identical payload (backends must
    /// tolerate redelivery of the same byte range); fatal errors and
    /// cancellation end the session immediately.
    async fn deliver_chunk(
        &self,
        index: u32,
        payload: &ChunkUploadRequest,
    ) -> Result<UploadResponse, UploadError> {
        let body = serde_json::to_string(payload)?;
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            self.check_cancelled()?;

            match self.try_send(&body).await {
                Ok(resp) => return Ok(resp),
                Err(e) if !e.is_transient() => return Err(e),
                Err(e) if attempt >= MAX_CHUNK_ATTEMPTS => {
                    return Err(UploadError::SessionFailed {
                        chunk_index: index,
                        attempts: attempt,
                        last: Box::new(e),
                    });
                }
                Err(e) => {
                    warn!(chunk = index, attempt, error = %e, "chunk delivery failed, retrying");
                    tokio::select! {
                        _ = tokio::time::sleep(RETRY_BACKOFF) => {}
                        _ = self.cancel.cancelled() => return Err(UploadError::Cancelled),
                    }
                }
            }
        }
    }

    async fn try_send(&self, body: &str) -> Result<UploadResponse, UploadError> {
        let reply = self.endpoint.post(body.to_string()).await?;
        if !reply.is_success() {
            return Err(UploadError::Status(reply.status));
        }
        let resp: UploadResponse = serde_json::from_str(&reply.body)?;
        if !resp.is_success() {
            return Err(UploadError::Rejected(
                resp.message.unwrap_or_else(|| "request rejected".to_string()),
            ));
        }
        Ok(resp)
    }

    fn check_cancelled(&self) -> Result<(), UploadError> {
        if self.cancel.is_cancelled() {
            Err(UploadError::Cancelled)
        } else {
            Ok(())
        }
    }
}

fn join_error(e: tokio::task::JoinError) -> UploadError {
    UploadError::Encoding(handin_transfer::TransferError::Io(std::io::Error::other(
        format!("task join error: {e}"),
    )))
}
