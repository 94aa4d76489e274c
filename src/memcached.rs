//! Memcached text-protocol backend.
//!
//! Speaks the ASCII protocol over a fresh TCP connection per operation;
//! pooling and keep-alive tuning are out of scope. With multiple
//! configured nodes, keys are spread by hash. The cache cluster has no
//! failover policy; connection errors surface directly.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

use crate::cache::CacheBackend;
use crate::error::{ClientError, Result};
use crate::settings::CacheSettings;

/// Default [`CacheBackend`] implementation over memcached.
#[derive(Debug, Clone)]
pub struct MemcachedBackend {
    nodes: Vec<String>,
}

impl MemcachedBackend {
    pub fn new(settings: &CacheSettings) -> Self {
        MemcachedBackend {
            nodes: settings.authorities(),
        }
    }

    fn node_for(&self, key: &str) -> &str {
        if self.nodes.len() == 1 {
            return &self.nodes[0];
        }
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        &self.nodes[(hasher.finish() % self.nodes.len() as u64) as usize]
    }

    async fn connect(&self, key: &str) -> Result<BufReader<TcpStream>> {
        let stream = TcpStream::connect(self.node_for(key))
            .await
            .map_err(conn_err)?;
        Ok(BufReader::new(stream))
    }
}

fn conn_err(err: std::io::Error) -> ClientError {
    ClientError::Connection(err.to_string())
}

/// Parse the first line of a `get` reply. `Ok(None)` is a miss (bare
/// `END`), `Ok(Some(len))` the value length announced by a VALUE header.
fn parse_value_header(line: &str) -> Result<Option<usize>> {
    let line = line.trim_end();
    if line == "END" {
        return Ok(None);
    }
    let mut parts = line.split_whitespace();
    if parts.next() != Some("VALUE") {
        return Err(ClientError::MalformedResponse(format!(
            "unexpected cache reply: {line}"
        )));
    }
    // VALUE <key> <flags> <bytes> [cas]
    parts
        .nth(2)
        .and_then(|bytes| bytes.parse().ok())
        .map(Some)
        .ok_or_else(|| ClientError::MalformedResponse(format!("bad VALUE header: {line}")))
}

fn parse_store_reply(line: &str) -> Result<()> {
    match line.trim_end() {
        "STORED" => Ok(()),
        other => Err(ClientError::MalformedResponse(format!(
            "unexpected store reply: {other}"
        ))),
    }
}

fn parse_delete_reply(line: &str) -> Result<bool> {
    match line.trim_end() {
        "DELETED" => Ok(true),
        "NOT_FOUND" => Ok(false),
        other => Err(ClientError::MalformedResponse(format!(
            "unexpected delete reply: {other}"
        ))),
    }
}

#[async_trait]
impl CacheBackend for MemcachedBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut stream = self.connect(key).await?;
        stream
            .get_mut()
            .write_all(format!("get {key}\r\n").as_bytes())
            .await
            .map_err(conn_err)?;

        let mut header = String::new();
        stream.read_line(&mut header).await.map_err(conn_err)?;
        let len = match parse_value_header(&header)? {
            Some(len) => len,
            None => return Ok(None),
        };

        // Value plus its trailing \r\n.
        let mut payload = vec![0u8; len + 2];
        stream.read_exact(&mut payload).await.map_err(conn_err)?;
        payload.truncate(len);

        let mut tail = String::new();
        stream.read_line(&mut tail).await.map_err(conn_err)?;
        if tail.trim_end() != "END" {
            return Err(ClientError::MalformedResponse(format!(
                "missing END terminator, got: {}",
                tail.trim_end()
            )));
        }
        Ok(Some(payload))
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl_secs: u32) -> Result<()> {
        let mut stream = self.connect(key).await?;
        let mut frame = format!("set {key} 0 {ttl_secs} {}\r\n", value.len()).into_bytes();
        frame.extend_from_slice(&value);
        frame.extend_from_slice(b"\r\n");
        stream.get_mut().write_all(&frame).await.map_err(conn_err)?;

        let mut reply = String::new();
        stream.read_line(&mut reply).await.map_err(conn_err)?;
        parse_store_reply(&reply)
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut stream = self.connect(key).await?;
        stream
            .get_mut()
            .write_all(format!("delete {key}\r\n").as_bytes())
            .await
            .map_err(conn_err)?;

        let mut reply = String::new();
        stream.read_line(&mut reply).await.map_err(conn_err)?;
        parse_delete_reply(&reply)
    }
}
