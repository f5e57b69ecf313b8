//! Minimal in-process stand-in for the Ollama HTTP API
//!
//! Serves canned JSON per `METHOD /path` and records every request.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

#[derive(Debug, Clone)]
pub struct StubResponse {
    pub status: u16,
    pub body: String,
}

impl StubResponse {
    pub fn ok(body: &str) -> Self {
        Self {
            status: 200,
            body: body.to_string(),
        }
    }

    pub fn status(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
        }
    }
}

/// A recorded request: method, path, body
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub body: String,
}

type Routes = Arc<Mutex<HashMap<String, StubResponse>>>;
type Requests = Arc<Mutex<Vec<RecordedRequest>>>;

pub struct MockOllama {
    pub url: String,
    routes: Routes,
    requests: Requests,
    handle: JoinHandle<()>,
}

impl MockOllama {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock server");
        let addr = listener.local_addr().expect("Failed to read local addr");

        let routes: Routes = Arc::new(Mutex::new(HashMap::new()));
        let requests: Requests = Arc::new(Mutex::new(Vec::new()));

        let routes_task = Arc::clone(&routes);
        let requests_task = Arc::clone(&requests);
        let handle = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let routes = Arc::clone(&routes_task);
                let requests = Arc::clone(&requests_task);
                tokio::spawn(async move {
                    let _ = serve(stream, routes, requests).await;
                });
            }
        });

        Self {
            url: format!("http://{addr}"),
            routes,
            requests,
            handle,
        }
    }

    pub fn route(&self, method: &str, path: &str, response: StubResponse) {
        self.routes
            .lock()
            .unwrap()
            .insert(format!("{method} {path}"), response);
    }

    /// Serve a tags listing with the given model names
    pub fn with_models(&self, names: &[&str]) {
        let models: Vec<serde_json::Value> = names
            .iter()
            .map(|n| serde_json::json!({ "name": n, "model": n }))
            .collect();
        self.route(
            "GET",
            "/api/tags",
            StubResponse::ok(&serde_json::json!({ "models": models }).to_string()),
        );
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn paths(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.path).collect()
    }

    pub fn bodies_for(&self, path: &str) -> Vec<serde_json::Value> {
        self.requests()
            .into_iter()
            .filter(|r| r.path == path)
            .map(|r| serde_json::from_str(&r.body).unwrap_or(serde_json::Value::Null))
            .collect()
    }
}

impl Drop for MockOllama {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn serve(mut stream: TcpStream, routes: Routes, requests: Requests) -> std::io::Result<()> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.lines();
    let request_line = lines.next().unwrap_or_default();
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let path = parts.next().unwrap_or_default().to_string();

    let content_length = lines
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let body_end = buf.len().min(header_end + content_length);
    let body = String::from_utf8_lossy(&buf[header_end..body_end]).to_string();

    let response = routes
        .lock()
        .unwrap()
        .get(&format!("{method} {path}"))
        .cloned()
        .unwrap_or_else(|| StubResponse::status(404, r#"{"error":"not found"}"#));

    requests.lock().unwrap().push(RecordedRequest { method, path, body });

    let reply = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        response.status,
        if response.status < 400 { "OK" } else { "Error" },
        response.body.len(),
        response.body
    );
    stream.write_all(reply.as_bytes()).await?;
    stream.shutdown().await?;
    Ok(())
}
