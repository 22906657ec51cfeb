use futures_util::StreamExt;
use reqwest::StatusCode;
use tokio::sync::mpsc;
use tracing::debug;

use crate::api::{GenerateRequest, Part};
use crate::core::decoder::Utf8StreamDecoder;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamMessage {
    Chunk(String),
    Error(String),
    End,
}

fn extract_error_summary(value: &serde_json::Value) -> Option<String> {
    let summary = value
        .pointer("/error/message")
        .and_then(|v| v.as_str())
        .map(str::to_owned)
        .or_else(|| {
            value.get("error").and_then(|v| match v {
                serde_json::Value::String(s) => Some(s.to_string()),
                serde_json::Value::Object(map) => map
                    .get("message")
                    .and_then(|message| message.as_str().map(str::to_owned)),
                _ => None,
            })
        })
        .or_else(|| {
            value
                .get("message")
                .and_then(|v| v.as_str().map(str::to_owned))
        });

    summary.map(|text| {
        let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
        collapsed.trim().to_string()
    })
}

/// Renders a non-success response as `API error (HTTP <status>): <detail>`.
pub fn format_api_error(status: StatusCode, body: &str) -> String {
    let trimmed = body.trim();
    let detail = if trimmed.is_empty() {
        "<empty response>".to_string()
    } else {
        serde_json::from_str::<serde_json::Value>(trimmed)
            .ok()
            .and_then(|json| extract_error_summary(&json))
            .filter(|summary| !summary.is_empty())
            .unwrap_or_else(|| trimmed.to_string())
    };
    format!("API error (HTTP {}): {}", status, detail)
}

pub fn format_network_error(err: &reqwest::Error) -> String {
    format!("Network error: {err}")
}

pub fn format_stream_error(err: &reqwest::Error) -> String {
    format!("Stream error: {err}")
}

pub struct StreamParams {
    pub client: reqwest::Client,
    pub endpoint: String,
    pub api_key: Option<String>,
    pub contents: Vec<Part>,
    pub cancel_token: tokio_util::sync::CancellationToken,
    pub stream_id: u64,
}

#[derive(Clone)]
pub struct ChatStreamService {
    tx: mpsc::UnboundedSender<(StreamMessage, u64)>,
}

impl ChatStreamService {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(StreamMessage, u64)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Posts the request on a background task and reports decoded text,
    /// at most one error, and a final `End` for `params.stream_id`.
    pub fn spawn_stream(&self, params: StreamParams) {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let cancel_token = params.cancel_token.clone();
            let stream_id = params.stream_id;
            tokio::select! {
                _ = run_stream(params, &tx) => {}
                _ = cancel_token.cancelled() => {
                    debug!(stream_id, "Stream cancelled");
                    let _ = tx.send((StreamMessage::End, stream_id));
                }
            }
        });
    }

    #[cfg(test)]
    pub fn send_for_test(&self, message: StreamMessage, stream_id: u64) {
        let _ = self.tx.send((message, stream_id));
    }
}

async fn run_stream(params: StreamParams, tx: &mpsc::UnboundedSender<(StreamMessage, u64)>) {
    let StreamParams {
        client,
        endpoint,
        api_key,
        contents,
        stream_id,
        ..
    } = params;

    let request = GenerateRequest { contents };
    let mut http_request = client
        .post(endpoint.as_str())
        .header("Content-Type", "application/json")
        .header("Accept", "text/plain");
    if let Some(key) = api_key.as_deref().filter(|k| !k.is_empty()) {
        http_request = http_request.bearer_auth(key);
    }

    debug!(stream_id, endpoint = %endpoint, parts = request.contents.len(), "Sending generation request");

    let response = match http_request.json(&request).send().await {
        Ok(response) => response,
        Err(e) => {
            let _ = tx.send((StreamMessage::Error(format_network_error(&e)), stream_id));
            let _ = tx.send((StreamMessage::End, stream_id));
            return;
        }
    };

    let status = response.status();
    if !status.is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "<no body>".to_string());
        debug!(stream_id, %status, "Generation request failed");
        let _ = tx.send((
            StreamMessage::Error(format_api_error(status, &error_text)),
            stream_id,
        ));
        let _ = tx.send((StreamMessage::End, stream_id));
        return;
    }

    let mut stream = response.bytes_stream();
    let mut decoder = Utf8StreamDecoder::new();
    while let Some(chunk) = stream.next().await {
        match chunk {
            Ok(bytes) => {
                let text = decoder.decode(&bytes);
                if !text.is_empty() {
                    let _ = tx.send((StreamMessage::Chunk(text), stream_id));
                }
            }
            Err(e) => {
                let _ = tx.send((StreamMessage::Error(format_stream_error(&e)), stream_id));
                let _ = tx.send((StreamMessage::End, stream_id));
                return;
            }
        }
    }

    let tail = decoder.finish();
    if !tail.is_empty() {
        let _ = tx.send((StreamMessage::Chunk(tail), stream_id));
    }
    let _ = tx.send((StreamMessage::End, stream_id));
}
