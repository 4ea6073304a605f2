//! Minimal HTTP/1.1 server for client tests.
//!
//! Answers each accepted connection with the next canned response and
//! records what the client sent, so tests can assert on method, path,
//! headers and the exact body bytes.

use std::collections::HashMap;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

pub(crate) struct MockResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl MockResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: String::new(),
        }
    }

    pub fn json(status: u16, body: &str) -> Self {
        Self {
            status,
            headers: vec![("Content-Type".into(), "application/json".into())],
            body: body.to_string(),
        }
    }

    pub fn with_reason(mut self, reason: &str) -> Self {
        self.headers.push(("X-Reason".into(), reason.into()));
        self
    }
}

#[derive(Debug)]
pub(crate) struct CapturedRequest {
    pub method: String,
    pub path: String,
    /// Header names are lowercased.
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl CapturedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }
}

/// Serves `responses` in order, one per connection, then stops accepting.
///
/// The handle resolves to the captured requests.
pub(crate) async fn serve_sequence(
    responses: Vec<MockResponse>,
) -> (String, JoinHandle<Vec<CapturedRequest>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let url = format!("http://127.0.0.1:{port}");

    let handle = tokio::spawn(async move {
        let mut captured = Vec::new();
        for response in responses {
            let Ok((mut stream, _)) = listener.accept().await else {
                break;
            };
            let Some(request) = read_request(&mut stream, true).await else {
                break;
            };
            write_response(&mut stream, &request, &response).await;
            captured.push(request);
        }
        captured
    });

    (url, handle)
}

/// Serves a single response.
pub(crate) async fn serve_once(
    response: MockResponse,
) -> (String, JoinHandle<Vec<CapturedRequest>>) {
    serve_sequence(vec![response]).await
}

/// Answers as soon as the request headers arrive, without reading the body.
///
/// The connection stays open afterwards, so the client is still mid-body
/// when the response lands. The handle resolves to the request head.
pub(crate) async fn serve_before_body(
    response: MockResponse,
) -> (String, JoinHandle<CapturedRequest>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let url = format!("http://127.0.0.1:{port}");

    let handle = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let request = read_request(&mut stream, false).await.unwrap();

        let head = response_head(&response);
        stream.write_all(head.as_bytes()).await.unwrap();
        stream.flush().await.unwrap();

        tokio::spawn(async move {
            let _held = stream;
            tokio::time::sleep(std::time::Duration::from_secs(10)).await;
        });
        request
    });

    (url, handle)
}

/// Accepts one connection and drains it without ever answering.
pub(crate) async fn serve_stalled() -> (String, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let url = format!("http://127.0.0.1:{port}");

    let handle = tokio::spawn(async move {
        if let Ok((mut stream, _)) = listener.accept().await {
            let mut buf = vec![0u8; 8192];
            while matches!(stream.read(&mut buf).await, Ok(n) if n > 0) {}
        }
    });

    (url, handle)
}

async fn read_request(stream: &mut TcpStream, read_body: bool) -> Option<CapturedRequest> {
    let mut data = Vec::new();
    let mut buf = vec![0u8; 8192];

    let header_end = loop {
        if let Some(pos) = find_header_end(&data) {
            break pos;
        }
        let n = stream.read(&mut buf).await.ok()?;
        if n == 0 {
            return None;
        }
        data.extend_from_slice(&buf[..n]);
    };

    let head = String::from_utf8_lossy(&data[..header_end]).to_string();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let path = request_line.next()?.to_string();

    let headers: HashMap<String, String> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
        .collect();

    let content_length: usize = headers
        .get("content-length")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);

    let mut body = data[header_end + 4..].to_vec();
    while read_body && body.len() < content_length {
        let n = stream.read(&mut buf).await.ok()?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&buf[..n]);
    }

    Some(CapturedRequest {
        method,
        path,
        headers,
        body,
    })
}

fn find_header_end(data: &[u8]) -> Option<usize> {
    data.windows(4).position(|w| w == b"\r\n\r\n")
}

fn response_head(response: &MockResponse) -> String {
    let mut out = format!("HTTP/1.1 {} Mock\r\n", response.status);
    for (name, value) in &response.headers {
        out.push_str(&format!("{name}: {value}\r\n"));
    }
    out.push_str(&format!(
        "Content-Length: {}\r\nConnection: close\r\n\r\n",
        response.body.len()
    ));
    out
}

async fn write_response(stream: &mut TcpStream, request: &CapturedRequest, response: &MockResponse) {
    let mut out = response_head(response);
    if request.method != "HEAD" {
        out.push_str(&response.body);
    }
    let _ = stream.write_all(out.as_bytes()).await;
    let _ = stream.shutdown().await;
}
