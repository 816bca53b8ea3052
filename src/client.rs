use crate::protocol::{DebateEvent, DebateRequest, HealthResponse};
use futures::StreamExt;
use reqwest::Client as HttpClient;
use std::error::Error;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

pub struct ClientConfig {
    pub base_url: String,
    /// Deadline for the first chunk of a stream. Once anything arrives the
    /// stream may run as long as the debate does.
    pub connect_timeout: Duration,
}

#[derive(Clone)]
pub struct DebateClient {
    base_url: String,
    connect_timeout: Duration,
    http: HttpClient,
}

type ClientResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

impl DebateClient {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            base_url: normalize_base_url(&config.base_url),
            connect_timeout: config.connect_timeout,
            http: HttpClient::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn check_health(&self) -> ClientResult<HealthResponse> {
        let response = self
            .http
            .get(format!("{}/health", self.base_url))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(format!("Health check failed: {} - {}", status, body).into());
        }

        Ok(response.json().await?)
    }

    /// Starts a debate and feeds each decoded event to `on_event` as it
    /// arrives. Returns once the server closes the stream.
    pub async fn stream_debate<F, Fut>(
        &self,
        request: &DebateRequest,
        mut on_event: F,
    ) -> ClientResult<()>
    where
        F: FnMut(DebateEvent) -> Fut,
        Fut: Future<Output = ()>,
    {
        let send = self
            .http
            .post(format!("{}/debate", self.base_url))
            .json(request)
            .send();
        let deadline = Instant::now() + self.connect_timeout;
        let response = tokio::time::timeout_at(deadline, send)
            .await
            .map_err(|_| self.timeout_error())??;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(format!("Failed to start debate: {} - {}", status, body).into());
        }

        let mut stream = response.bytes_stream();
        let mut decoder = FrameDecoder::default();

        let first = tokio::time::timeout_at(deadline, stream.next())
            .await
            .map_err(|_| self.timeout_error())?;
        let Some(first) = first else {
            return Ok(());
        };
        for event in decoder.push(&first?) {
            on_event(event).await;
        }

        while let Some(chunk) = stream.next().await {
            for event in decoder.push(&chunk?) {
                on_event(event).await;
            }
        }

        Ok(())
    }

    fn timeout_error(&self) -> Box<dyn Error + Send + Sync> {
        format!(
            "No response from {} within {}s; the server may be cold-starting, try again",
            self.base_url,
            self.connect_timeout.as_secs()
        )
        .into()
    }
}

/// Incremental SSE decoder. Chunks may split frames (or UTF-8 sequences)
/// anywhere.
#[derive(Default)]
struct FrameDecoder {
    bytes: Vec<u8>,
}

impl FrameDecoder {
    fn push(&mut self, chunk: &[u8]) -> Vec<DebateEvent> {
        self.bytes.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some((idx, len)) = find_frame_end(&self.bytes) {
            let raw: Vec<u8> = self.bytes.drain(..idx + len).take(idx).collect();
            let raw = String::from_utf8_lossy(&raw);

            if let Some(data) = extract_sse_data(&raw) {
                match serde_json::from_str::<DebateEvent>(&data) {
                    Ok(event) => events.push(event),
                    Err(err) => tracing::warn!("skipping undecodable frame {data:?}: {err}"),
                }
            }
        }
        events
    }
}

fn find_frame_end(bytes: &[u8]) -> Option<(usize, usize)> {
    let lf = bytes.windows(2).position(|w| w == b"\n\n").map(|idx| (idx, 2));
    let crlf = bytes
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .map(|idx| (idx, 4));
    match (lf, crlf) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
        (a, b) => a.or(b),
    }
}

fn normalize_base_url(value: &str) -> String {
    value.trim_end_matches('/').to_string()
}

fn extract_sse_data(raw: &str) -> Option<String> {
    let mut data_lines = Vec::new();
    for line in raw.lines() {
        let line = line.trim_end_matches('\r');
        if let Some(data) = line.strip_prefix("data:") {
            data_lines.push(data.strip_prefix(' ').unwrap_or(data).to_string());
        }
    }

    if data_lines.is_empty() {
        None
    } else {
        Some(data_lines.join("\n"))
    }
}
