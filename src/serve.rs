//! Newline-delimited JSON request loop.
//!
//! Stands in for the chat command dispatcher: each input line is one
//! request, each output line one response. Reads run concurrently and
//! their responses may arrive out of order, matched by `id`. A
//! `set_phase` completes before the next line is read, so later requests
//! for that server see the new phase.
//!
//! ```text
//! → {"id":1,"op":"set_phase","server":"guild1","phase":"pre mech"}
//! ← {"id":1,"ok":true,"result":{"server":"guild1","phase":"Pre-Mech"}}
//! → {"id":2,"op":"lookup","server":"guild1","roles":["Mage"]}
//! ← {"id":2,"ok":true,"result":{"phase":"Pre-Mech","class":"Mage","items":[...]}}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::QueryError;
use crate::query::PresetService;

/// Longest accepted request line in bytes.
pub const DEFAULT_MAX_REQUEST_SIZE: usize = 64 * 1024;

/// Responses buffered before request handlers wait on the writer.
const RESPONSE_QUEUE: usize = 64;

/// One operation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    /// Preset for a member; `class` overrides role detection.
    Lookup {
        /// Server identifier.
        server: String,
        /// Explicit class name.
        #[serde(default)]
        class: Option<String>,
        /// Member role names.
        #[serde(default)]
        roles: Vec<String>,
    },
    /// Current phase of a server.
    GetPhase {
        /// Server identifier.
        server: String,
    },
    /// Select a phase for a server.
    SetPhase {
        /// Server identifier.
        server: String,
        /// Free-form phase text.
        phase: String,
    },
    /// Catalog cache diagnostics.
    Status,
    /// Force a catalog refresh.
    Refresh,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    id: Value,
    #[serde(flatten)]
    request: Request,
}

/// Error payload of a failed response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    /// Stable machine-readable code.
    pub code: &'static str,
    /// Human-readable message.
    pub message: String,
}

/// One output line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    /// Echo of the request id (`null` if it could not be read).
    pub id: Value,
    /// Whether the request succeeded.
    pub ok: bool,
    /// Result on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl Response {
    fn success(id: Value, result: Value) -> Self {
        Self {
            id,
            ok: true,
            result: Some(result),
            error: None,
        }
    }

    fn failure(id: Value, code: &'static str, message: String) -> Self {
        Self {
            id,
            ok: false,
            result: None,
            error: Some(ErrorBody { code, message }),
        }
    }
}

/// Stable code for a query failure.
#[must_use]
pub const fn error_code(err: &QueryError) -> &'static str {
    match err {
        QueryError::PhaseNotConfigured { .. } => "phase_not_configured",
        QueryError::UnknownPhase { .. } => "unknown_phase",
        QueryError::UnknownClass { .. } => "unknown_class",
        QueryError::ClassNotDetected => "class_not_detected",
        QueryError::Catalog(_) => "catalog_unavailable",
        QueryError::Store(_) => "store_error",
    }
}

/// Executes one request.
///
/// # Errors
///
/// Returns the query failure; the caller turns it into a response.
pub async fn handle(service: &PresetService, request: Request) -> Result<Value, QueryError> {
    match request {
        Request::Lookup {
            server,
            class,
            roles,
        } => {
            let preset = service
                .lookup_for_member(&server, class.as_deref(), &roles)
                .await?;
            Ok(json!(preset))
        }
        Request::GetPhase { server } => {
            let phase = service.current_phase(&server)?;
            Ok(json!({ "server": server, "phase": phase }))
        }
        Request::SetPhase { server, phase } => {
            let phase = service.set_phase(&server, &phase)?;
            Ok(json!({ "server": server, "phase": phase }))
        }
        Request::Status => Ok(json!(service.catalog().status().await)),
        Request::Refresh => {
            let catalog = service.catalog().refresh().await?;
            Ok(json!({
                "items": catalog.presets.total_items(),
                "fetched_at": catalog.fetched_at,
            }))
        }
    }
}

/// Parses and executes one request line.
pub async fn respond(service: &PresetService, line: &str) -> Response {
    match parse(line) {
        Ok(envelope) => execute(service, envelope).await,
        Err(response) => response,
    }
}

fn parse(line: &str) -> Result<Envelope, Response> {
    serde_json::from_str(line).map_err(|e| {
        // recover the id when only the operation is malformed
        let id = serde_json::from_str::<Value>(line)
            .ok()
            .and_then(|v| v.get("id").cloned())
            .unwrap_or(Value::Null);
        Response::failure(id, "bad_request", e.to_string())
    })
}

async fn execute(service: &PresetService, envelope: Envelope) -> Response {
    match handle(service, envelope.request).await {
        Ok(result) => Response::success(envelope.id, result),
        Err(e) => Response::failure(envelope.id, error_code(&e), e.to_string()),
    }
}

enum Line {
    Complete,
    Oversized,
}

/// Reads one line into `buf` without buffering more than `limit + 1`
/// bytes of it. `None` at end of input.
async fn read_line<R>(reader: &mut R, limit: usize, buf: &mut Vec<u8>) -> std::io::Result<Option<Line>>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    let cap = u64::try_from(limit).unwrap_or(u64::MAX).saturating_add(1);
    let n = (&mut *reader).take(cap).read_until(b'\n', buf).await?;
    if n == 0 {
        return Ok(None);
    }
    if buf.last() == Some(&b'\n') || buf.len() <= limit {
        return Ok(Some(Line::Complete));
    }

    // discard the rest of the oversized line
    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            break;
        }
        if let Some(pos) = available.iter().position(|&b| b == b'\n') {
            reader.consume(pos + 1);
            break;
        }
        let len = available.len();
        reader.consume(len);
    }
    Ok(Some(Line::Oversized))
}

/// Serves requests from `reader` until end of input, writing responses to
/// `writer`, and returns the writer once every response is flushed.
///
/// Blank lines are skipped. Lines longer than `max_request` bytes are
/// answered with a `request_too_large` error.
///
/// # Errors
///
/// Returns an I/O error if reading input or writing output fails.
pub async fn run<R, W>(
    service: PresetService,
    mut reader: R,
    mut writer: W,
    max_request: usize,
) -> std::io::Result<W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, mut rx) = mpsc::channel::<Response>(RESPONSE_QUEUE);

    let writer_task = tokio::spawn(async move {
        while let Some(response) = rx.recv().await {
            let mut line = serde_json::to_vec(&response).map_err(std::io::Error::other)?;
            line.push(b'\n');
            writer.write_all(&line).await?;
            writer.flush().await?;
        }
        Ok::<_, std::io::Error>(writer)
    });

    let mut buf = Vec::new();
    let mut requests = 0u64;
    while let Some(line) = read_line(&mut reader, max_request, &mut buf).await? {
        if matches!(line, Line::Oversized) {
            warn!(limit = max_request, "request line too large, skipped");
            let response = Response::failure(
                Value::Null,
                "request_too_large",
                format!("request exceeds {max_request} bytes"),
            );
            if tx.send(response).await.is_err() {
                break;
            }
            continue;
        }

        let text = String::from_utf8_lossy(&buf).trim().to_string();
        if text.is_empty() {
            continue;
        }
        requests += 1;

        let envelope = match parse(&text) {
            Ok(envelope) => envelope,
            Err(response) => {
                if tx.send(response).await.is_err() {
                    break;
                }
                continue;
            }
        };

        // phase changes apply before any later line is read
        if matches!(envelope.request, Request::SetPhase { .. }) {
            let response = execute(&service, envelope).await;
            if tx.send(response).await.is_err() {
                break;
            }
            continue;
        }

        let service = service.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            let response = execute(&service, envelope).await;
            // the writer only stops early on an output error, reported below
            let _ = tx.send(response).await;
        });
    }
    drop(tx);
    debug!(requests, "input closed, draining responses");

    writer_task.await.map_err(std::io::Error::other)?
}
