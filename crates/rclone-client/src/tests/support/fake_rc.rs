//! In-process stand-in for rclone's remote-control HTTP server.
//!
//! Serves one request per connection and answers with `Connection: close`,
//! which is all the blocking client needs. State lives behind a mutex so tests
//! can inspect recorded calls and configured backends.

use std::collections::{BTreeSet, HashSet};
use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use rclone_config::ServiceEndpoint;
use serde_json::{Value, json};

/// Version reported by `core/version`.
pub(in crate::tests) const FAKE_VERSION: &str = "v1.72.1";

#[derive(Debug, Default)]
struct FakeState {
    remotes: BTreeSet<String>,
    calls: Vec<(String, Value)>,
    failing: HashSet<String>,
}

/// Fake remote-control server bound to an ephemeral loopback port.
pub(in crate::tests) struct FakeRc {
    port: u16,
    state: Arc<Mutex<FakeState>>,
    shutdown: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl FakeRc {
    /// Starts serving on `127.0.0.1:0`.
    pub fn spawn() -> Result<Self> {
        let listener = TcpListener::bind(("127.0.0.1", 0)).context("bind fake rc")?;
        listener
            .set_nonblocking(true)
            .context("fake rc nonblocking")?;
        let port = listener.local_addr().context("local addr")?.port();
        let state = Arc::new(Mutex::new(FakeState::default()));
        let shutdown = Arc::new(AtomicBool::new(false));
        let state_clone = Arc::clone(&state);
        let shutdown_clone = Arc::clone(&shutdown);
        let handle = thread::spawn(move || serve(&listener, &state_clone, &shutdown_clone));
        Ok(Self {
            port,
            state,
            shutdown,
            handle: Some(handle),
        })
    }

    /// Endpoint the fake listens on.
    pub fn endpoint(&self) -> ServiceEndpoint {
        ServiceEndpoint::new("127.0.0.1", self.port)
    }

    /// Makes every call to `path` answer HTTP 500.
    pub fn fail(&self, path: &str) {
        lock(&self.state).failing.insert(path.to_owned());
    }

    /// Pre-configures a backend.
    pub fn add_remote(&self, name: &str) {
        lock(&self.state).remotes.insert(name.to_owned());
    }

    /// Currently configured backends.
    pub fn remotes(&self) -> BTreeSet<String> {
        lock(&self.state).remotes.clone()
    }

    /// Paths called so far, in order.
    pub fn paths(&self) -> Vec<String> {
        lock(&self.state)
            .calls
            .iter()
            .map(|(path, _)| path.clone())
            .collect()
    }

    /// Body of the most recent call to `path`.
    pub fn last_body(&self, path: &str) -> Result<Value> {
        lock(&self.state)
            .calls
            .iter()
            .rev()
            .find(|(called, _)| called == path)
            .map(|(_, body)| body.clone())
            .ok_or_else(|| anyhow!("no call to {path}"))
    }
}

impl Drop for FakeRc {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn lock(state: &Mutex<FakeState>) -> MutexGuard<'_, FakeState> {
    state.lock().unwrap_or_else(|poison| poison.into_inner())
}

fn serve(listener: &TcpListener, state: &Mutex<FakeState>, shutdown: &AtomicBool) {
    while !shutdown.load(Ordering::SeqCst) {
        match listener.accept() {
            Ok((stream, _)) => {
                // A failed exchange only affects the client that caused it.
                let _ = handle_connection(stream, state);
            }
            Err(ref error) if error.kind() == io::ErrorKind::WouldBlock => {
                thread::sleep(Duration::from_millis(5));
            }
            Err(_) => return,
        }
    }
}

fn handle_connection(mut stream: TcpStream, state: &Mutex<FakeState>) -> Result<()> {
    stream.set_nonblocking(false).context("blocking stream")?;
    stream
        .set_read_timeout(Some(Duration::from_secs(2)))
        .context("read timeout")?;
    let (path, body) = read_request(&stream)?;
    let (status, reply) = route(&path, &body, &mut lock(state));
    write_response(&mut stream, status, &reply).context("write response")
}

fn read_request(stream: &TcpStream) -> Result<(String, Value)> {
    let mut reader = BufReader::new(stream.try_clone().context("clone stream")?);
    let mut request_line = String::new();
    reader
        .read_line(&mut request_line)
        .context("read request line")?;
    let target = request_line
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| anyhow!("malformed request line: {request_line:?}"))?;
    let path = target.trim_start_matches('/').to_owned();

    let mut content_length = 0_usize;
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).context("read header")?;
        let header = line.trim_end();
        if header.is_empty() {
            break;
        }
        if let Some((name, value)) = header.split_once(':')
            && name.eq_ignore_ascii_case("content-length")
        {
            content_length = value.trim().parse().context("content length")?;
        }
    }

    let mut raw = vec![0_u8; content_length];
    reader.read_exact(&mut raw).context("read body")?;
    let body = if raw.is_empty() {
        json!({})
    } else {
        serde_json::from_slice(&raw).context("decode body")?
    };
    Ok((path, body))
}

fn route(path: &str, body: &Value, state: &mut FakeState) -> (u16, Value) {
    state.calls.push((path.to_owned(), body.clone()));
    if state.failing.contains(path) {
        return error_reply(500, path, body, "injected failure");
    }
    match path {
        "rc/noop" => (200, body.clone()),
        "core/version" => (
            200,
            json!({
                "version": FAKE_VERSION,
                "decomposed": [1, 72, 1],
                "isBeta": false,
                "isGit": false,
                "os": "linux",
                "arch": "amd64",
                "goVersion": "go1.25.4"
            }),
        ),
        "config/listremotes" => {
            let remotes = if state.remotes.is_empty() {
                Value::Null
            } else {
                json!(state.remotes)
            };
            (200, json!({ "remotes": remotes }))
        }
        "config/create" => match body.get("name").and_then(Value::as_str) {
            Some(name) if body.get("type").is_some() => {
                state.remotes.insert(name.to_owned());
                (200, json!({}))
            }
            _ => error_reply(400, path, body, "name and type are required"),
        },
        "config/delete" => {
            if let Some(name) = body.get("name").and_then(Value::as_str) {
                state.remotes.remove(name);
            }
            (200, json!({}))
        }
        _ => error_reply(404, path, body, &format!("couldn't find method {path:?}")),
    }
}

fn error_reply(status: u16, path: &str, body: &Value, message: &str) -> (u16, Value) {
    (
        status,
        json!({ "error": message, "input": body, "path": path, "status": status }),
    )
}

fn write_response(stream: &mut TcpStream, status: u16, body: &Value) -> io::Result<()> {
    let payload = body.to_string();
    let reason = match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        _ => "Internal Server Error",
    };
    write!(
        stream,
        "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{payload}",
        payload.len()
    )?;
    stream.flush()
}
