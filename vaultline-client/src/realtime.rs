//! Consent event stream manager with reconnect backoff.
//!
//! Maintains a long-lived `text/event-stream` connection, decodes each
//! frame into a [`ConsentEvent`], and forwards it into the engine channel.
//! The connection is re-established after drops with multiplicative
//! backoff and deterministic jitter. Undecodable frames are logged and
//! skipped; they must never kill the stream.

use crate::api_client::ApiClientError;
use crate::config::{ClientConfig, ReconnectConfig};
use crate::events::ClientEvent;
use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use vaultline_core::ConsentEvent;

#[derive(Clone)]
pub struct StreamClient {
    client: reqwest::Client,
    endpoint: String,
    auth_header: HeaderMap,
    reconnect: ReconnectConfig,
}

impl StreamClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiClientError> {
        // No request timeout: the stream is meant to stay open.
        let client = reqwest::Client::builder().build()?;
        let mut auth_header = HeaderMap::new();
        if let Some(api_key) = config.api_key.as_deref() {
            auth_header.insert(
                HeaderName::from_static("x-api-key"),
                HeaderValue::from_str(api_key)
                    .map_err(|e| ApiClientError::Config(e.to_string()))?,
            );
        }
        Ok(Self {
            client,
            endpoint: config.stream_endpoint.clone(),
            auth_header,
            reconnect: config.reconnect.clone(),
        })
    }

    pub fn reconnect_config(&self) -> &ReconnectConfig {
        &self.reconnect
    }

    async fn connect(&self) -> Result<reqwest::Response, ApiClientError> {
        let response = self
            .client
            .get(&self.endpoint)
            .headers(self.auth_header.clone())
            .header(ACCEPT, "text/event-stream")
            .send()
            .await?
            .error_for_status()?;
        Ok(response)
    }
}

pub fn spawn_stream_manager(
    stream: StreamClient,
    sender: mpsc::Sender<ClientEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut backoff = stream.reconnect.initial_ms;
        loop {
            match stream.connect().await {
                Ok(response) => {
                    if sender.send(ClientEvent::StreamUp).await.is_err() {
                        return;
                    }
                    backoff = stream.reconnect.initial_ms;

                    let mut decoder = SseFrameDecoder::new();
                    let mut body = response.bytes_stream();
                    let reason = loop {
                        match body.next().await {
                            Some(Ok(chunk)) => {
                                for payload in decoder.feed(&chunk) {
                                    match serde_json::from_str::<ConsentEvent>(&payload) {
                                        Ok(event) => {
                                            if sender
                                                .send(ClientEvent::Stream(event))
                                                .await
                                                .is_err()
                                            {
                                                return;
                                            }
                                        }
                                        Err(err) => {
                                            warn!(error = %err, "undecodable stream frame");
                                        }
                                    }
                                }
                            }
                            Some(Err(err)) => break err.to_string(),
                            None => break "connection closed".to_string(),
                        }
                    };

                    if sender
                        .send(ClientEvent::StreamDown { reason })
                        .await
                        .is_err()
                    {
                        return;
                    }
                }
                Err(err) => {
                    debug!(error = %err, "stream connect failed; backing off");
                }
            }

            let delay = jittered_backoff(backoff, stream.reconnect.jitter_ms);
            tokio::time::sleep(Duration::from_millis(delay)).await;

            let next = (backoff as f64 * stream.reconnect.multiplier) as u64;
            backoff = next.min(stream.reconnect.max_ms);
        }
    })
}

/// Incremental decoder for `text/event-stream` framing.
///
/// Collects `data:` lines and yields the joined payload at each blank
/// line. Comment lines and fields other than `data` are ignored; CR-LF
/// endings and payloads split across chunks are handled.
#[derive(Debug, Default)]
pub struct SseFrameDecoder {
    buffer: String,
    data: Vec<String>,
}

impl SseFrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.push_str(&String::from_utf8_lossy(chunk));

        let mut payloads = Vec::new();
        while let Some(pos) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..=pos).collect();
            let line = line.trim_end_matches(['\n', '\r']);
            if line.is_empty() {
                if !self.data.is_empty() {
                    payloads.push(self.data.join("\n"));
                    self.data.clear();
                }
            } else if let Some(rest) = line.strip_prefix("data:") {
                self.data.push(rest.strip_prefix(' ').unwrap_or(rest).to_string());
            }
            // `event:`, `id:`, `retry:` and `:` keep-alives carry nothing
            // this consumer needs.
        }
        payloads
    }
}

fn jittered_backoff(base_ms: u64, jitter_ms: u64) -> u64 {
    if jitter_ms == 0 {
        return base_ms;
    }
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_else(|_| Duration::from_nanos(0))
        .subsec_nanos() as u64;
    let jitter = nanos % jitter_ms;
    base_ms.saturating_add(jitter)
}
