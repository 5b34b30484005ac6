//! Streaming agent client.
//!
//! [`StreamClient::send`] posts a question, decodes the streamed answer and
//! reports progress through a callback:
//!
//! - [`StreamUpdate::Partial`] at most once per frame, always the newest state
//! - [`StreamUpdate::ConversationStarted`] immediately, the first time the
//!   server assigns an id to a new conversation
//!
//! The final snapshot is always delivered as a last `Partial` and returned.

use std::sync::Arc;
use std::time::Instant;

use futures::StreamExt;
use tokio::sync::watch;

use crate::adapters::ReqwestHttpClient;
use crate::config::ClientConfig;
use crate::error::{StreamError, StreamResult};
use crate::models::{AgentRequest, FeedbackAck, FeedbackRequest, Snapshot};
use crate::stream::{FrameCoalescer, SnapshotSink, StreamDecoder, Utf8ChunkDecoder};
use crate::traits::{Headers, HttpClient, HttpError};

/// Progress notification passed to the `send` callback.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamUpdate {
    /// Latest decoded state, coalesced to the frame rate
    Partial(Snapshot),
    /// The server assigned an id to a new conversation
    ConversationStarted(String),
}

/// Lifecycle of one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamPhase {
    Idle,
    /// Response headers received, body being read
    Open,
    Complete,
    Failed,
}

/// Cancels an in-flight [`StreamClient::send_with_cancel`].
///
/// Clones share the same signal. Cancelling is permanent.
#[derive(Debug, Clone)]
pub struct CancelToken {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once the token is cancelled.
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives as long as `self`, so this only returns on cancel
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

fn enter_phase(phase: &mut StreamPhase, next: StreamPhase) {
    tracing::debug!(from = ?*phase, to = ?next, "Stream phase change");
    *phase = next;
}

/// Client for the agent endpoint.
///
/// Cheap to clone; each request owns its decoder and coalescer.
///
/// # Example
///
/// ```ignore
/// use agentline::{ClientConfig, StreamClient, StreamUpdate};
///
/// let client = StreamClient::new(ClientConfig::from_env())?;
/// let answer = client
///     .send("What is in the report?", None, |update| {
///         if let StreamUpdate::Partial(snapshot) = update {
///             println!("{}", snapshot.text);
///         }
///     })
///     .await?;
/// ```
pub struct StreamClient<C: HttpClient = ReqwestHttpClient> {
    http: Arc<C>,
    config: ClientConfig,
}

impl StreamClient<ReqwestHttpClient> {
    /// Create a client backed by reqwest.
    pub fn new(config: ClientConfig) -> StreamResult<Self> {
        let http = ReqwestHttpClient::with_connect_timeout(config.connect_timeout)
            .map_err(StreamError::transport)?;
        Ok(Self::with_http_client(config, Arc::new(http)))
    }
}

impl<C: HttpClient> StreamClient<C> {
    /// Create a client over any transport.
    pub fn with_http_client(config: ClientConfig, http: Arc<C>) -> Self {
        Self { http, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Ask a question and stream the answer.
    ///
    /// Pass the id of an existing conversation to continue it. Resolves with
    /// the final snapshot, which is also the last `Partial` delivered.
    pub async fn send<F>(
        &self,
        question: &str,
        conversation_id: Option<&str>,
        on_update: F,
    ) -> StreamResult<Snapshot>
    where
        F: Fn(StreamUpdate) + Send + Sync + 'static,
    {
        self.send_with_cancel(question, conversation_id, on_update, CancelToken::new())
            .await
    }

    /// [`send`](Self::send) that can be abandoned through `cancel`.
    ///
    /// On cancellation reading stops, pending updates are dropped and the
    /// result is `StreamError::Cancelled` with what had been decoded.
    pub async fn send_with_cancel<F>(
        &self,
        question: &str,
        conversation_id: Option<&str>,
        on_update: F,
        cancel: CancelToken,
    ) -> StreamResult<Snapshot>
    where
        F: Fn(StreamUpdate) + Send + Sync + 'static,
    {
        let request = match conversation_id {
            Some(id) => AgentRequest::with_conversation(question, id),
            None => AgentRequest::new(question),
        };
        let body = serde_json::to_string(&request)?;
        let url = self.config.agent_url();
        let headers = self.request_headers();
        let started = Instant::now();
        let mut phase = StreamPhase::Idle;

        tracing::debug!(
            url = %url,
            conversation_id = ?conversation_id,
            "Sending agent request"
        );

        let opened = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            result = self.http.post_stream(&url, &body, &headers) => Some(result),
        };

        let mut chunks = match opened {
            None => {
                enter_phase(&mut phase, StreamPhase::Failed);
                return Err(StreamError::Cancelled {
                    partial: Snapshot::default(),
                });
            }
            Some(Ok(chunks)) => chunks,
            Some(Err(HttpError::ServerError { status, message })) => {
                enter_phase(&mut phase, StreamPhase::Failed);
                tracing::warn!(status, "Agent request rejected");
                return Err(StreamError::Request { status, message });
            }
            Some(Err(source)) => {
                enter_phase(&mut phase, StreamPhase::Failed);
                tracing::warn!(error = %source, "Agent request failed to connect");
                return Err(StreamError::transport(source));
            }
        };
        enter_phase(&mut phase, StreamPhase::Open);

        let on_update = Arc::new(on_update);
        let sink: SnapshotSink = {
            let on_update = Arc::clone(&on_update);
            Arc::new(move |snapshot| on_update(StreamUpdate::Partial(snapshot)))
        };
        let mut coalescer = FrameCoalescer::new(self.config.frame_interval, sink);
        let mut utf8 = Utf8ChunkDecoder::new();
        let mut decoder = StreamDecoder::new();
        let mut announce = conversation_id.is_none();
        let mut chunk_count = 0usize;

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                item = chunks.next() => Some(item),
            };

            match next {
                None => {
                    coalescer.cancel();
                    enter_phase(&mut phase, StreamPhase::Failed);
                    let partial = decoder.finish();
                    tracing::info!(
                        chunks = chunk_count,
                        chars = partial.text.len(),
                        "Stream cancelled"
                    );
                    return Err(StreamError::Cancelled { partial });
                }
                Some(Some(Ok(bytes))) => {
                    chunk_count += 1;
                    let snapshot = decoder.feed(&utf8.decode(&bytes));
                    if announce {
                        if let Some(id) = &snapshot.conversation_id {
                            announce = false;
                            on_update(StreamUpdate::ConversationStarted(id.clone()));
                        }
                    }
                    coalescer.schedule(snapshot);
                }
                Some(Some(Err(source))) => {
                    coalescer.cancel();
                    enter_phase(&mut phase, StreamPhase::Failed);
                    let partial = decoder.finish();
                    tracing::warn!(
                        error = %source,
                        chunks = chunk_count,
                        chars = partial.text.len(),
                        "Stream interrupted"
                    );
                    return Err(StreamError::Transport { source, partial });
                }
                Some(None) => break,
            }
        }

        decoder.feed(&utf8.finish());
        let snapshot = decoder.finish();

        if announce {
            if let Some(id) = &snapshot.conversation_id {
                on_update(StreamUpdate::ConversationStarted(id.clone()));
            }
        }
        coalescer.flush_with(snapshot.clone());
        enter_phase(&mut phase, StreamPhase::Complete);

        tracing::info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            chunks = chunk_count,
            chars = snapshot.text.len(),
            citations = snapshot.citations.len(),
            "Stream complete"
        );

        Ok(snapshot)
    }

    /// Rate an answer.
    pub async fn submit_feedback(&self, feedback: &FeedbackRequest) -> StreamResult<FeedbackAck> {
        let body = serde_json::to_string(feedback)?;
        let url = self.config.feedback_url();

        let response = self
            .http
            .post(&url, &body, &self.request_headers())
            .await
            .map_err(|err| match err {
                HttpError::ServerError { status, message } => {
                    StreamError::Request { status, message }
                }
                other => StreamError::transport(other),
            })?;

        if !response.is_success() {
            tracing::warn!(status = response.status, "Feedback rejected");
            return Err(StreamError::Request {
                status: response.status,
                message: response.text_lossy(),
            });
        }

        response
            .json()
            .map_err(|source| StreamError::Decode { source })
    }

    fn request_headers(&self) -> Headers {
        let mut headers = Headers::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        if let Some(token) = &self.config.auth_token {
            headers.insert("Authorization".to_string(), format!("Bearer {}", token));
        }
        headers
    }
}

impl<C: HttpClient> Clone for StreamClient<C> {
    fn clone(&self) -> Self {
        Self {
            http: Arc::clone(&self.http),
            config: self.config.clone(),
        }
    }
}

impl<C: HttpClient> std::fmt::Debug for StreamClient<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamClient")
            .field("base_url", &self.config.base_url)
            .field("frame_interval", &self.config.frame_interval)
            .finish()
    }
}
