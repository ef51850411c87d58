//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use radio_proxy::config::ProxyConfig;
use radio_proxy::http::HttpServer;
use radio_proxy::lifecycle::Shutdown;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{oneshot, Notify};

/// A running mock upstream.
#[derive(Clone)]
pub struct MockUpstream {
    pub addr: SocketAddr,
    hits: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl MockUpstream {
    async fn bind() -> (TcpListener, Self) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let upstream = Self {
            addr: listener.local_addr().unwrap(),
            hits: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
        };
        (listener, upstream)
    }

    /// Number of connections accepted so far.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    /// Request heads received so far, lowercased.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    async fn accept(&self, listener: &TcpListener) -> Option<TcpStream> {
        let (mut socket, _) = listener.accept().await.ok()?;
        self.hits.fetch_add(1, Ordering::SeqCst);
        let head = read_request_head(&mut socket).await;
        self.requests.lock().unwrap().push(head.to_lowercase());
        Some(socket)
    }
}

async fn read_request_head(socket: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// Serialize a complete HTTP/1.1 response with a fixed-length body.
pub fn http_response(status_line: &str, headers: &[(&str, &str)], body: &[u8]) -> Vec<u8> {
    let mut out = format!("HTTP/1.1 {}\r\n", status_line);
    for (name, value) in headers {
        out.push_str(&format!("{}: {}\r\n", name, value));
    }
    out.push_str(&format!("Content-Length: {}\r\nConnection: close\r\n\r\n", body.len()));
    let mut out = out.into_bytes();
    out.extend_from_slice(body);
    out
}

/// Start a mock upstream that answers every request with `response`.
pub async fn start_fixed_upstream(response: Vec<u8>) -> MockUpstream {
    let (listener, upstream) = MockUpstream::bind().await;
    let handle = upstream.clone();
    let response = Arc::new(response);

    tokio::spawn(async move {
        while let Some(mut socket) = handle.accept(&listener).await {
            let response = response.clone();
            tokio::spawn(async move {
                let _ = socket.write_all(&response).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    upstream
}

/// Start a mock upstream that writes `prefix` (possibly nothing) and then
/// holds every connection open without sending anything more.
pub async fn start_stalling_upstream(prefix: Vec<u8>) -> MockUpstream {
    let (listener, upstream) = MockUpstream::bind().await;
    let handle = upstream.clone();
    let prefix = Arc::new(prefix);

    tokio::spawn(async move {
        while let Some(mut socket) = handle.accept(&listener).await {
            let prefix = prefix.clone();
            tokio::spawn(async move {
                let _ = socket.write_all(&prefix).await;
                let _ = socket.flush().await;
                std::future::pending::<()>().await;
                drop(socket);
            });
        }
    });

    upstream
}

/// Start a mock upstream that sends `first` as a chunk, then holds the
/// response open until the returned gate is notified before sending `rest`.
pub async fn start_gated_stream(first: Vec<u8>, rest: Vec<u8>) -> (MockUpstream, Arc<Notify>) {
    let (listener, upstream) = MockUpstream::bind().await;
    let handle = upstream.clone();
    let gate = Arc::new(Notify::new());
    let release = gate.clone();

    tokio::spawn(async move {
        if let Some(mut socket) = handle.accept(&listener).await {
            let head = "HTTP/1.1 200 OK\r\nContent-Type: audio/mpeg\r\nTransfer-Encoding: chunked\r\nConnection: close\r\n\r\n";
            let _ = socket.write_all(head.as_bytes()).await;
            let _ = socket.write_all(&encode_chunk(&first)).await;
            let _ = socket.flush().await;

            release.notified().await;

            let _ = socket.write_all(&encode_chunk(&rest)).await;
            let _ = socket.write_all(b"0\r\n\r\n").await;
            let _ = socket.shutdown().await;
        }
    });

    (upstream, gate)
}

/// Start a mock live stream that never ends on its own. The receiver fires
/// once a write fails, i.e. once the proxy has dropped the connection.
pub async fn start_endless_stream() -> (MockUpstream, oneshot::Receiver<()>) {
    let (listener, upstream) = MockUpstream::bind().await;
    let handle = upstream.clone();
    let (closed_tx, closed_rx) = oneshot::channel();

    tokio::spawn(async move {
        if let Some(mut socket) = handle.accept(&listener).await {
            let head = "HTTP/1.1 200 OK\r\nContent-Type: audio/aac\r\nTransfer-Encoding: chunked\r\n\r\n";
            if socket.write_all(head.as_bytes()).await.is_err() {
                let _ = closed_tx.send(());
                return;
            }
            let frame = encode_chunk(&[0x55; 4096]);
            loop {
                if socket.write_all(&frame).await.is_err() {
                    let _ = closed_tx.send(());
                    return;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        }
    });

    (upstream, closed_rx)
}

fn encode_chunk(data: &[u8]) -> Vec<u8> {
    let mut out = format!("{:x}\r\n", data.len()).into_bytes();
    out.extend_from_slice(data);
    out.extend_from_slice(b"\r\n");
    out
}

/// An address nothing is listening on.
pub async fn unused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Start the proxy on an ephemeral port.
pub async fn start_proxy(mut config: ProxyConfig) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    config.listener.bind_address = addr.to_string();

    let server = HttpServer::new(config).unwrap();
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, shutdown)
}

/// Proxy config whose content upstream is `upstream`.
pub fn config_for(upstream: &MockUpstream) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.content.upstream_base = format!("{}/radio", upstream.base_url());
    config
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// Deterministic pseudo-random payload.
pub fn payload(len: usize) -> Vec<u8> {
    let mut state: u32 = 0x9e37_79b9;
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state >> 24) as u8
        })
        .collect()
}
