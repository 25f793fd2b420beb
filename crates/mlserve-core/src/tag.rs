//! Input and output type tags
//!
//! The marshalling kinds form a closed set: extending it means adding a
//! variant here and a codec entry in [`crate::registry::TypeRegistry`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Shape of the inbound payload a route accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InputTag {
    /// A single text form field.
    Text,
    /// A single uploaded file.
    File,
    /// One or more uploaded files, order-preserving.
    BatchFile,
}

impl InputTag {
    pub const ALL: [InputTag; 3] = [InputTag::Text, InputTag::File, InputTag::BatchFile];

    pub fn as_str(&self) -> &'static str {
        match self {
            InputTag::Text => "TEXT",
            InputTag::File => "FILE",
            InputTag::BatchFile => "BATCHFILE",
        }
    }
}

impl fmt::Display for InputTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InputTag {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "TEXT" | "STRING" => Ok(InputTag::Text),
            "FILE" => Ok(InputTag::File),
            "BATCHFILE" => Ok(InputTag::BatchFile),
            other => Err(Error::Config(format!("unknown input tag `{other}`"))),
        }
    }
}

/// Shape of the value a route's prediction function returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OutputTag {
    /// A single text value, wrapped under `"result"`.
    Text,
    /// A list of titled text values, wrapped under `"texts"`.
    BatchText,
    /// A path to a file produced by the prediction, wrapped under `"file"`.
    File,
}

impl OutputTag {
    pub const ALL: [OutputTag; 3] = [OutputTag::Text, OutputTag::BatchText, OutputTag::File];

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputTag::Text => "TEXT",
            OutputTag::BatchText => "BATCHTEXT",
            OutputTag::File => "FILE",
        }
    }
}

impl fmt::Display for OutputTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputTag {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "TEXT" | "STRING" => Ok(OutputTag::Text),
            "BATCHTEXT" => Ok(OutputTag::BatchText),
            "FILE" => Ok(OutputTag::File),
            other => Err(Error::Config(format!("unknown output tag `{other}`"))),
        }
    }
}
