//! Stream URL handling and the ICY request
//!
//! The request is deliberately minimal HTTP/1.0 so that SHOUTcast v1 servers
//! answer with `ICY 200 OK` and interleave metadata (`Icy-MetaData:1`).

use url::Url;

use crate::error::{Result, StreamError};

const DEFAULT_PORT: u16 = 80;

/// A parsed stream location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamUrl {
    host: String,
    port: u16,
    target: String,
}

impl StreamUrl {
    /// Parse a stream URL such as `http://radio.example:8000/;stream.mp3`.
    ///
    /// `http` and `icy` schemes are accepted. The port defaults to 80 and an
    /// empty path is requested as `/`.
    pub fn parse(input: &str) -> Result<Self> {
        if input.trim().is_empty() {
            return Err(StreamError::InvalidUrl("empty URL".to_string()));
        }

        let url = Url::parse(input).map_err(|e| StreamError::InvalidUrl(format!("{input}: {e}")))?;

        match url.scheme() {
            "http" | "icy" => {}
            "https" => {
                return Err(StreamError::InvalidUrl(
                    "https streams are not supported".to_string(),
                ))
            }
            other => {
                return Err(StreamError::InvalidUrl(format!(
                    "unsupported scheme {other:?}"
                )))
            }
        }

        let host = url
            .host_str()
            .filter(|host| !host.is_empty())
            .ok_or_else(|| StreamError::InvalidUrl(format!("{input}: missing host")))?
            .to_string();
        let port = url.port().unwrap_or(DEFAULT_PORT);

        let mut target = match url.path() {
            "" => "/".to_string(),
            path => path.to_string(),
        };
        if let Some(query) = url.query() {
            target.push('?');
            target.push_str(query);
        }

        Ok(Self { host, port, target })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Path and query sent in the request line
    pub fn target(&self) -> &str {
        &self.target
    }

    /// `host:port`, as dialed
    pub fn authority(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The bytes sent once the connection is established.
    pub fn request_bytes(&self) -> Vec<u8> {
        format!("GET {} HTTP/1.0\r\nIcy-MetaData:1\r\n\r\n", self.target).into_bytes()
    }
}
