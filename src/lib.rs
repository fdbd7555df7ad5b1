//! Sage - an Elasticsearch REST client
//!
//! Maps method calls on a [`Client`], an [`Index`] or a [`DocType`] onto HTTP
//! requests and coerces the JSON replies so documents expose both `_id`/`id`
//! and `_version`/`version`.
//!
//! ```no_run
//! use sage::{Args, Connection, Documents};
//! use serde_json::json;
//!
//! # async fn run() -> sage::Result<()> {
//! let Connection::Index(index) = sage::connect("http://127.0.0.1:9200/sage-test")? else {
//!     unreachable!()
//! };
//! let tweets = index.doc_type("tweet");
//! tweets.put(json!({"_id": "1", "text": "hello"}), Args::new()).await?;
//! let reply = tweets.get(Args::new().path("1")).await?;
//! println!("{:?}", reply.doc());
//! # Ok(())
//! # }
//! ```

pub mod args;
pub mod bulk;
pub mod config;
pub mod error;
pub mod http;
pub mod resources;
pub mod response;
pub mod uri;

pub use args::{Args, PathArg};
pub use bulk::BulkIndexer;
pub use config::{SageConfig, TransportKind};
pub use error::{Error, Result};
pub use http::{Credentials, EsTransport, HttpTransport, Method, Transport};
pub use resources::{connect, connect_with, Client, Connection, DocType, Documents, Index, Outcome};
pub use response::{Data, DocList, Reply};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
