//! Shared helpers for the integration suites: a scripted event-stream
//! server with a deterministic stream lifetime, plus request recording.

// Each integration binary uses its own subset of these helpers.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Notify;

/// A request captured by the scripted server
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub target: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Minimal HTTP server scripted for the transport's two endpoints.
///
/// `GET /message-events` answers with an event stream carrying the
/// configured frames and then stays open until [`SseServer::end_stream`];
/// every other request gets an empty 200. All requests are recorded.
pub struct SseServer {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    release: Arc<Notify>,
}

impl SseServer {
    /// Start the server; `frames` is written to each event-stream response
    /// before the stream is held open.
    pub async fn start(frames: &str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests: Arc<Mutex<Vec<RecordedRequest>>> = Arc::default();
        let release = Arc::new(Notify::new());

        let recorded = Arc::clone(&requests);
        let gate = Arc::clone(&release);
        let frames = frames.to_string();
        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                let recorded = Arc::clone(&recorded);
                let gate = Arc::clone(&gate);
                let frames = frames.clone();
                tokio::spawn(async move {
                    serve_connection(stream, recorded, gate, frames).await;
                });
            }
        });

        Self {
            addr,
            requests,
            release,
        }
    }

    /// Base URL for connection parameters
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Let every held-open event stream run to its natural end
    pub fn end_stream(&self) {
        self.release.notify_waiters();
    }

    /// Requests captured so far
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    /// Captured requests against the outbound message endpoint
    pub fn message_posts(&self) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|request| request.method == "POST" && request.target == "/message")
            .collect()
    }
}

async fn serve_connection(
    mut stream: TcpStream,
    recorded: Arc<Mutex<Vec<RecordedRequest>>>,
    gate: Arc<Notify>,
    frames: String,
) {
    let Some(request) = read_request(&mut stream).await else {
        return;
    };
    let is_events = request.method == "GET" && request.target.starts_with("/message-events");
    recorded.lock().push(request);

    if is_events {
        let head = "HTTP/1.1 200 OK\r\ncontent-type: text/event-stream\r\ncache-control: no-cache\r\nconnection: close\r\n\r\n";
        if stream.write_all(head.as_bytes()).await.is_err() {
            return;
        }
        if stream.write_all(frames.as_bytes()).await.is_err() {
            return;
        }
        let _ = stream.flush().await;
        // Held open until the test releases it; dropping the socket then
        // ends the stream from the client's point of view.
        gate.notified().await;
    } else {
        let head = "HTTP/1.1 200 OK\r\ncontent-length: 0\r\nconnection: close\r\n\r\n";
        let _ = stream.write_all(head.as_bytes()).await;
    }
}

async fn read_request(stream: &mut TcpStream) -> Option<RecordedRequest> {
    let mut raw = Vec::new();
    let mut chunk = [0u8; 1024];
    let header_end = loop {
        if let Some(pos) = find_header_end(&raw) {
            break pos;
        }
        match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => return None,
            Ok(n) => raw.extend_from_slice(&chunk[..n]),
        }
    };

    let head = String::from_utf8_lossy(&raw[..header_end]).into_owned();
    let mut lines = head.split("\r\n");
    let request_line = lines.next()?;
    let mut parts = request_line.split_whitespace();
    let method = parts.next()?.to_string();
    let target = parts.next()?.to_string();

    let mut headers = Vec::new();
    let mut content_length = 0usize;
    for line in lines {
        if let Some((name, value)) = line.split_once(':') {
            let name = name.trim().to_string();
            let value = value.trim().to_string();
            if name.eq_ignore_ascii_case("content-length") {
                content_length = value.parse().unwrap_or(0);
            }
            headers.push((name, value));
        }
    }

    let mut body = raw[header_end + 4..].to_vec();
    while body.len() < content_length {
        match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => body.extend_from_slice(&chunk[..n]),
        }
    }
    body.truncate(content_length);

    Some(RecordedRequest {
        method,
        target,
        headers,
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

fn find_header_end(raw: &[u8]) -> Option<usize> {
    raw.windows(4).position(|window| window == b"\r\n\r\n")
}

/// Poll `condition` until it holds or the timeout lapses
pub async fn wait_until(condition: impl Fn() -> bool, timeout: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
