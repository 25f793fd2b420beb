//! Error types for the marshalling core

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Core error taxonomy.
///
/// `Config` is fatal at startup: the server must not begin serving with a
/// misconfigured route table. `InputMissing`, `Decode` and `Prediction` are
/// per-request and leave server state untouched.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid registration: unknown type tag, reserved path, duplicate
    /// path or endpoint name.
    #[error("configuration error: {0}")]
    Config(String),

    /// The request is missing the field or file the input tag expects.
    #[error("missing input: {0}")]
    InputMissing(String),

    /// The request carried the expected payload but it could not be decoded
    /// into the shape the prediction function expects.
    #[error("invalid input: {0}")]
    Decode(String),

    /// The prediction function failed. Surfaced to the client as a generic
    /// 5xx; the message stays in the server log.
    #[error("prediction failed: {0}")]
    Prediction(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
