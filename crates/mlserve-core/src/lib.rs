//! mlserve-core - Marshalling layer for prediction-function HTTP services
//!
//! This crate turns arbitrary prediction functions into POST endpoints
//! through a type-tagged encode/decode framework:
//!
//! - a closed set of input/output tags with per-tag codecs
//! - an explicit [`Server`] registrar holding the route table
//! - a discovery endpoint enumerating the registered routes
//!
//! # Example
//!
//! ```ignore
//! use mlserve_core::{InputTag, OutputTag, RouteSpec, Server, ServerConfig};
//! use mlserve_core::codec::{TypedInput, TypedOutput};
//!
//! let mut server = Server::new(ServerConfig::default());
//! server.register(
//!     RouteSpec::new("/echo", "echo", InputTag::Text, OutputTag::Text),
//!     |input| match input {
//!         TypedInput::Text(text) => Ok(TypedOutput::Text(text)),
//!         other => anyhow::bail!("unexpected input {other:?}"),
//!     },
//! )?;
//! let router = server.into_router();
//! ```

pub mod codec;
pub mod config;
pub mod envelope;
pub mod error;
pub mod http;
pub mod registry;
pub mod server;
pub mod tag;

pub use codec::{
    format_offset, render_segment_table, FileHandle, RawInput, TextResult, TimedSegment,
    TypedInput, TypedOutput,
};
pub use config::ServerConfig;
pub use envelope::{RequestEnvelope, ResponsePayload, UploadedFile};
pub use error::{Error, Result};
pub use registry::TypeRegistry;
pub use server::{
    PredictFn, RouteDescriptor, RouteSpec, Server, DISCOVERY_PATH, RESERVED_PATHS, STATIC_PATH,
};
pub use tag::{InputTag, OutputTag};
