//! Minimal HTTP/1.1 job server for integration tests.
//!
//! Routes `METHOD /path` to a canned `Reply`, records every request it sees,
//! and can cut a body short or hold it mid-stream until the test releases it.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{Shutdown, TcpListener, TcpStream};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Reply {
    /// Status line tail, e.g. "200 OK".
    pub status: &'static str,
    pub content_type: &'static str,
    pub body: Vec<u8>,
    /// Close the connection after this many body bytes. `Content-Length` still
    /// advertises the whole body, so the client sees a short read.
    pub cut_after: Option<usize>,
    /// Send this many body bytes, then wait for the gate before sending the rest.
    pub pause_after: Option<usize>,
    /// Body write size.
    pub piece: usize,
    /// Send the body with `Transfer-Encoding: chunked` in frames of uneven
    /// size. A cut body then ends without the `0\r\n\r\n` terminator.
    pub chunked: bool,
}

/// Frame sizes cycled through by chunked replies.
const CHUNK_FRAMES: [usize; 6] = [1, 4093, 17, 65_536, 333, 8192];

impl Reply {
    pub fn ok(content_type: &'static str, body: Vec<u8>) -> Self {
        Self {
            status: "200 OK",
            content_type,
            body,
            cut_after: None,
            pause_after: None,
            piece: 4096,
            chunked: false,
        }
    }

    pub fn status(status: &'static str, content_type: &'static str, body: &[u8]) -> Self {
        Self {
            status,
            ..Self::ok(content_type, body.to_vec())
        }
    }

    pub fn mp4(body: Vec<u8>) -> Self {
        Self::ok("video/mp4", body)
    }

    pub fn cut_after(mut self, n: usize) -> Self {
        self.cut_after = Some(n);
        self
    }

    pub fn pause_after(mut self, n: usize) -> Self {
        self.pause_after = Some(n);
        self
    }

    pub fn chunked(mut self) -> Self {
        self.chunked = true;
        self
    }
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("request body is JSON")
    }
}

pub struct JobServer {
    pub base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    gate: Mutex<Option<Sender<()>>>,
}

impl JobServer {
    /// All requests received so far.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Let a paused body continue.
    pub fn release(&self) {
        if let Some(tx) = self.gate.lock().unwrap().take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for JobServer {
    fn drop(&mut self) {
        self.release();
    }
}

/// Starts a server in a background thread. Routes are keyed like `"POST /download"`.
/// Unknown routes get 404. The server runs until the process exits.
pub fn start(routes: Vec<(&str, Reply)>) -> JobServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let routes: Arc<HashMap<String, Reply>> = Arc::new(
        routes
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect(),
    );
    let requests = Arc::new(Mutex::new(Vec::new()));
    let (tx, rx) = mpsc::channel::<()>();
    let gate_rx: Arc<Mutex<Receiver<()>>> = Arc::new(Mutex::new(rx));

    let recorded = Arc::clone(&requests);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let routes = Arc::clone(&routes);
            let recorded = Arc::clone(&recorded);
            let gate_rx = Arc::clone(&gate_rx);
            thread::spawn(move || handle(stream, &routes, &recorded, &gate_rx));
        }
    });

    JobServer {
        base_url: format!("http://127.0.0.1:{}", port),
        requests,
        gate: Mutex::new(Some(tx)),
    }
}

/// A base URL where nothing is listening (port bound then released).
pub fn refused_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}

fn handle(
    mut stream: TcpStream,
    routes: &HashMap<String, Reply>,
    recorded: &Mutex<Vec<RecordedRequest>>,
    gate_rx: &Mutex<Receiver<()>>,
) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(5)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(10)));
    let request = match read_request(&mut stream) {
        Some(r) => r,
        None => return,
    };
    let key = format!("{} {}", request.method, request.path);
    recorded.lock().unwrap().push(request);

    let reply = match routes.get(&key) {
        Some(r) => r,
        None => {
            let _ = stream.write_all(
                b"HTTP/1.1 404 Not Found\r\nContent-Length: 9\r\nConnection: close\r\n\r\nnot found",
            );
            return;
        }
    };

    let length_header = if reply.chunked {
        "Transfer-Encoding: chunked".to_string()
    } else {
        format!("Content-Length: {}", reply.body.len())
    };
    let head = format!(
        "HTTP/1.1 {}\r\nContent-Type: {}\r\n{}\r\nConnection: close\r\n\r\n",
        reply.status, reply.content_type, length_header
    );
    if stream.write_all(head.as_bytes()).is_err() {
        return;
    }

    let limit = reply.cut_after.unwrap_or(reply.body.len()).min(reply.body.len());
    let mut sent = 0usize;
    let mut frames = CHUNK_FRAMES.iter().cycle();
    let mut paused = false;
    while sent < limit {
        if let Some(p) = reply.pause_after {
            if !paused && sent >= p {
                paused = true;
                // Err means the test dropped the server; carry on either way.
                let _ = gate_rx.lock().unwrap().recv();
            }
        }
        let step = if reply.chunked {
            frames.next().copied().unwrap_or(reply.piece)
        } else {
            reply.piece
        };
        let mut end = (sent + step.max(1)).min(limit);
        if let Some(p) = reply.pause_after {
            if !paused && sent < p {
                end = end.min(p);
            }
        }
        let piece = &reply.body[sent..end];
        let written = if reply.chunked {
            write_frame(&mut stream, piece)
        } else {
            stream.write_all(piece)
        };
        if written.is_err() {
            return;
        }
        let _ = stream.flush();
        sent = end;
    }
    if reply.chunked && reply.cut_after.is_none() {
        let _ = stream.write_all(b"0\r\n\r\n");
        let _ = stream.flush();
    }
    let _ = stream.shutdown(Shutdown::Both);
}

fn write_frame(stream: &mut TcpStream, data: &[u8]) -> std::io::Result<()> {
    stream.write_all(format!("{:x}\r\n", data.len()).as_bytes())?;
    stream.write_all(data)?;
    stream.write_all(b"\r\n")
}

fn read_request(stream: &mut TcpStream) -> Option<RecordedRequest> {
    let mut buf = Vec::new();
    let mut tmp = [0u8; 8192];
    let header_end = loop {
        let n = stream.read(&mut tmp).ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&tmp[..n]);
        if let Some(pos) = find(&buf, b"\r\n\r\n") {
            break pos;
        }
    };

    let head = std::str::from_utf8(&buf[..header_end]).ok()?;
    let mut lines = head.split("\r\n");
    let request_line = lines.next()?;
    let mut parts = request_line.split_whitespace();
    let method = parts.next()?.to_string();
    let path = parts.next()?.to_string();
    let headers: Vec<(String, String)> = lines
        .filter_map(|l| l.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect();
    let content_length = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);

    let mut body = buf[header_end + 4..].to_vec();
    while body.len() < content_length {
        let n = stream.read(&mut tmp).ok()?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&tmp[..n]);
    }

    Some(RecordedRequest {
        method,
        path,
        headers,
        body,
    })
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}
