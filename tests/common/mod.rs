//! Shared integration-test harness: fixture access, a local wiki server,
//! and helpers for running the `classguide` binary.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::Duration;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};

/// Default timeout for reading a single response from the binary.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Base URL the fixture's relative links resolve against.
pub const WIKI_BASE: &str = "https://terraria.wiki.gg";

/// Path to a file under `tests/fixtures/`.
#[must_use]
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// The sample guide page.
#[allow(clippy::missing_panics_doc)]
#[must_use]
pub fn fixture_markup() -> String {
    std::fs::read_to_string(fixture_path("class_setups.html")).expect("fixture readable")
}

/// Serves `body` at `/wiki/Guide_Class_setups` on an ephemeral port and
/// returns the full page URL.
#[allow(clippy::missing_panics_doc)]
pub async fn serve_page(body: String) -> String {
    let app = Router::new().route(
        "/wiki/Guide_Class_setups",
        get(move || {
            let body = body.clone();
            async move { body }
        }),
    );
    spawn_router(app).await
}

/// Serves a page that always answers `status`.
#[allow(clippy::missing_panics_doc)]
pub async fn serve_status(status: StatusCode) -> String {
    let app = Router::new().route(
        "/wiki/Guide_Class_setups",
        get(move || async move { (status, "unavailable") }),
    );
    spawn_router(app).await
}

async fn spawn_router(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test server");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("test server");
    });
    format!("http://{addr}/wiki/Guide_Class_setups")
}

/// Builds a `classguide` invocation with a private state file and
/// inherited `CLASSGUIDE_*` variables cleared.
#[must_use]
pub fn command(state_file: &Path, args: &[&str]) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_classguide"));
    for (key, _) in std::env::vars_os() {
        if key.to_string_lossy().starts_with("CLASSGUIDE_") {
            cmd.env_remove(&key);
        }
    }
    cmd.env("CLASSGUIDE_STATE_FILE", state_file)
        .env("CLASSGUIDE_WIKI_BASE", WIKI_BASE)
        .args(args)
        .kill_on_drop(true);
    cmd
}

/// Runs `classguide` to completion.
#[allow(clippy::missing_panics_doc)]
pub async fn run(state_file: &Path, args: &[&str]) -> Output {
    command(state_file, args)
        .output()
        .await
        .expect("failed to run classguide")
}

/// Stdout as text.
#[must_use]
pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// Stderr as text.
#[must_use]
pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

/// A running `classguide serve` process.
///
/// The child process is killed on drop via `kill_on_drop(true)`.
pub struct ServeProcess {
    child: Child,
    stdin: tokio::process::ChildStdin,
    reader: BufReader<tokio::process::ChildStdout>,
}

impl ServeProcess {
    /// Starts `classguide serve` against `wiki_url`.
    #[allow(clippy::missing_panics_doc)]
    #[must_use]
    pub fn spawn(state_file: &Path, wiki_url: &str) -> Self {
        let mut child = command(state_file, &["--quiet", "serve"])
            .env("CLASSGUIDE_WIKI_URL", wiki_url)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::null())
            .spawn()
            .expect("failed to spawn classguide serve");

        let stdin = child.stdin.take().expect("stdin not captured");
        let stdout = child.stdout.take().expect("stdout not captured");
        Self {
            child,
            stdin,
            reader: BufReader::new(stdout),
        }
    }

    /// Writes one raw request line.
    #[allow(clippy::missing_panics_doc)]
    pub async fn send_line(&mut self, line: &str) {
        self.stdin
            .write_all(format!("{line}\n").as_bytes())
            .await
            .expect("failed to write to stdin");
        self.stdin.flush().await.expect("failed to flush stdin");
    }

    /// Reads one response line.
    #[allow(clippy::missing_panics_doc)]
    pub async fn read_response(&mut self) -> Value {
        let mut line = String::new();
        tokio::time::timeout(DEFAULT_TIMEOUT, async {
            loop {
                line.clear();
                let n = self
                    .reader
                    .read_line(&mut line)
                    .await
                    .expect("read_line I/O error");
                assert!(n > 0, "unexpected EOF from classguide serve");
                let trimmed = line.trim();
                if !trimmed.is_empty() {
                    return serde_json::from_str::<Value>(trimmed)
                        .unwrap_or_else(|e| panic!("invalid JSON: {e}\nline: {line}"));
                }
            }
        })
        .await
        .expect("timed out waiting for response")
    }

    /// Sends a request and waits for its response.
    pub async fn request(&mut self, request: &Value) -> Value {
        self.send_line(&request.to_string()).await;
        self.read_response().await
    }

    /// Closes stdin and waits for the process to exit.
    #[allow(clippy::missing_panics_doc)]
    pub async fn shutdown(self) -> std::process::ExitStatus {
        let Self {
            mut child, stdin, ..
        } = self;
        drop(stdin);
        tokio::time::timeout(Duration::from_secs(5), child.wait())
            .await
            .expect("serve did not exit after stdin closed")
            .expect("wait failed")
    }
}
