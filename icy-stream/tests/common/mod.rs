//! Test helpers for building ICY byte streams and serving them over TCP.

#![allow(dead_code)]

use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::{oneshot, Mutex};

/// Header block announcing `metaint` audio bytes per chunk.
pub fn header_block(metaint: usize) -> Vec<u8> {
    format!("ICY 200 OK\r\nicy-name:Test Radio\r\nicy-br:128\r\nicy-metaint:{metaint}\r\n\r\n")
        .into_bytes()
}

/// A metadata block with the given length byte, NUL-padded to `length * 16`.
pub fn metadata_block(text: &str, length_byte: u8) -> Vec<u8> {
    let mut block = vec![length_byte];
    block.extend_from_slice(text.as_bytes());
    block.resize(usize::from(length_byte) * 16 + 1, 0);
    block
}

/// Smallest metadata block that fits `text`.
pub fn fitted_metadata_block(text: &str) -> Vec<u8> {
    let length_byte = u8::try_from(text.len().div_ceil(16)).expect("metadata text too long");
    metadata_block(text, length_byte)
}

/// Audio chunk of `len` bytes filled with `fill`.
pub fn chunk(len: usize, fill: u8) -> Vec<u8> {
    vec![fill; len]
}

/// Builds a complete stream byte by byte.
pub struct StreamBuilder {
    bytes: Vec<u8>,
    metaint: usize,
}

impl StreamBuilder {
    pub fn new(metaint: usize) -> Self {
        Self {
            bytes: header_block(metaint),
            metaint,
        }
    }

    pub fn chunk(mut self, fill: u8) -> Self {
        self.bytes.extend(chunk(self.metaint, fill));
        self
    }

    pub fn heartbeat(mut self) -> Self {
        self.bytes.push(0);
        self
    }

    pub fn metadata(mut self, text: &str) -> Self {
        self.bytes.extend(fitted_metadata_block(text));
        self
    }

    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.bytes.extend_from_slice(bytes);
        self
    }

    pub fn build(self) -> Vec<u8> {
        self.bytes
    }
}

/// Minimal ICY server: accepts one connection, records the request, writes
/// the canned response and keeps the socket open until released.
pub struct MockIcyServer {
    listener: TcpListener,
    port: u16,
    request: Arc<Mutex<Vec<u8>>>,
}

impl MockIcyServer {
    pub async fn new() -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let port = listener.local_addr()?.port();

        Ok(Self {
            listener,
            port,
            request: Arc::new(Mutex::new(Vec::new())),
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://127.0.0.1:{}{}", self.port, path)
    }

    pub fn request(&self) -> Arc<Mutex<Vec<u8>>> {
        self.request.clone()
    }

    /// Serve `response`; the connection stays open until `release` fires or
    /// is dropped.
    pub fn serve(self, response: Vec<u8>) -> (oneshot::Sender<()>, tokio::task::JoinHandle<()>) {
        let (release_tx, release_rx) = oneshot::channel::<()>();
        let request = self.request.clone();

        let handle = tokio::spawn(async move {
            let Ok((mut socket, _)) = self.listener.accept().await else {
                return;
            };

            let mut received = Vec::new();
            let mut buffer = [0u8; 1024];
            while !received.ends_with(b"\r\n\r\n") {
                match socket.read(&mut buffer).await {
                    Ok(0) | Err(_) => return,
                    Ok(n) => received.extend_from_slice(&buffer[..n]),
                }
            }
            *request.lock().await = received;

            if socket.write_all(&response).await.is_err() {
                return;
            }
            let _ = release_rx.await;
        });

        (release_tx, handle)
    }
}
