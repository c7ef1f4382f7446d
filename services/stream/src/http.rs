//! HTTP client transport
//!
//! Talks to the gateway's `/v1/stream/entries` endpoints. Blocking reads are
//! long-polls: the server holds the request for up to `block_ms`, so the
//! client timeout is the read timeout plus a grace margin.

use async_trait::async_trait;
use fix_types::ids::StreamEntryId;
use reqwest::{Client, Response};
use std::time::Duration;
use tracing::debug;

use crate::transport::{StreamEntry, Transport, TransportError};
use crate::wire::{PublishResponse, ReadResponse, MAX_BLOCK_MS};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const REQUEST_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(host: &str, port: u16) -> Result<Self, TransportError> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| TransportError::Unavailable(format!("http client: {}", e)))?;
        Ok(Self {
            client,
            base_url: format!("http://{}:{}", host, port),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn entries_url(&self) -> String {
        format!("{}/v1/stream/entries", self.base_url)
    }
}

fn request_error(e: reqwest::Error) -> TransportError {
    if e.is_decode() {
        TransportError::Protocol(e.to_string())
    } else {
        TransportError::Unavailable(e.to_string())
    }
}

async fn check_status(resp: Response) -> Result<Response, TransportError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(TransportError::Protocol(format!("{}: {}", status, body)))
}

#[async_trait]
impl Transport for HttpTransport {
    async fn publish(&self, payload: &[u8]) -> Result<StreamEntryId, TransportError> {
        let text = std::str::from_utf8(payload)
            .map_err(|e| TransportError::InvalidPayload(e.to_string()))?;

        let resp = self
            .client
            .post(self.entries_url())
            .header(reqwest::header::CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(text.to_string())
            .send()
            .await
            .map_err(request_error)?;

        let body: PublishResponse = check_status(resp)
            .await?
            .json()
            .await
            .map_err(|e| TransportError::Protocol(e.to_string()))?;
        Ok(body.id)
    }

    async fn read(
        &self,
        after: StreamEntryId,
        max_count: usize,
        timeout: Duration,
    ) -> Result<Vec<StreamEntry>, TransportError> {
        let block_ms = (timeout.as_millis() as u64).min(MAX_BLOCK_MS);
        let url = format!(
            "{}?after={}&count={}&block_ms={}",
            self.entries_url(),
            after,
            max_count.max(1),
            block_ms
        );

        let resp = self
            .client
            .get(url)
            .timeout(Duration::from_millis(block_ms) + REQUEST_GRACE)
            .send()
            .await
            .map_err(request_error)?;

        let body: ReadResponse = check_status(resp)
            .await?
            .json()
            .await
            .map_err(|e| TransportError::Protocol(e.to_string()))?;

        let entries: Vec<StreamEntry> = body.entries.into_iter().map(|e| e.into_entry()).collect();
        if entries.windows(2).any(|w| w[0].id >= w[1].id)
            || entries.first().is_some_and(|e| e.id <= after)
        {
            return Err(TransportError::Protocol(format!(
                "entries after {} are not strictly increasing",
                after
            )));
        }

        debug!(after = %after, received = entries.len(), "Stream read");
        Ok(entries)
    }
}
