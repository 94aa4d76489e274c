//! Client access layer for the Quarry document search/storage service.
//!
//! Two interchangeable transports sit behind one dispatch surface: a direct
//! HTTP(S) REST transport and an optional memcached fast path for the
//! operations that map cleanly onto get/set/delete. Callers always receive
//! the same normalized [`Response`] shape and the same typed errors,
//! whichever transport served the exchange.
//!
//! # Example
//!
//! ```no_run
//! use quarry_client::{CallOptions, Client, Settings};
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let settings: Settings = serde_json::from_str(
//!     r#"{ "rest": { "hosts": ["es-1:9200", "es-2:9200"] } }"#,
//! )?;
//! let client = Client::new(settings)?;
//!
//! // Index a document, then search for it.
//! client
//!     .put(
//!         "/books/book/1",
//!         CallOptions::with_body(json!({"title": "The Quarry"})),
//!     )
//!     .await?;
//! let hits = client
//!     .post(
//!         "/books/book/_search",
//!         CallOptions::with_body(json!({"query": {"match": {"title": "quarry"}}})),
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Failover
//!
//! When `hosts` or `hostnames` lists more than one entry, a connection-level
//! error (resolution failure, refused or reset connection) rotates to the
//! next host and re-sends, bounded to one full rotation per call. Timeouts
//! and HTTP error statuses never trigger rotation, and a call that pins a
//! host with [`CallOptions::pin_host`] is never rotated.
//!
//! # Error Handling
//!
//! Every operation returns `Result<Response, ClientError>`:
//!
//! ```no_run
//! # use quarry_client::{CallOptions, Client, ClientError, Settings};
//! # async fn example() -> Result<(), ClientError> {
//! # let client = Client::new(Settings::default())?;
//! match client.get("/idx/person/brian", CallOptions::new()).await {
//!     Ok(doc) => println!("found: {}", doc.body["_source"]),
//!     Err(err) if err.status_code() == Some(404) => println!("no such document"),
//!     Err(err) => println!("error: {err}"),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! The cache transport bridges the backend's `{"exists": false}` marker to
//! the same 404 shape, so the match above works identically on both
//! transports.

mod cache;
mod client;
mod error;
mod failover;
mod memcached;
mod request;
mod rest;
mod settings;
mod types;

pub use cache::CacheBackend;
pub use client::Client;
pub use error::{ClientError, Result};
pub use memcached::MemcachedBackend;
pub use request::{format_query, join_path, CallOptions, Verb, DEFAULT_TIMEOUT_MS};
pub use settings::{CacheSettings, RestSettings, Settings};
pub use types::Response;
