//! Type registry
//!
//! Pure lookup table from type tags to their codec functions, populated once
//! at server construction. A tag with no entry is a configuration error
//! surfaced at registration time, never deferred to request time.

use std::collections::HashMap;

use crate::codec;
use crate::envelope::RequestEnvelope;
use crate::error::{Error, Result};
use crate::tag::{InputTag, OutputTag};

pub type ExtractFn = fn(&RequestEnvelope) -> Result<codec::RawInput>;
pub type DecodeFn = fn(codec::RawInput) -> Result<codec::TypedInput>;
pub type EncodeFn = fn(codec::TypedOutput) -> Result<serde_json::Value>;

/// Extractor and decoder for one input tag.
#[derive(Debug, Clone, Copy)]
pub struct InputCodec {
    pub extract: ExtractFn,
    pub decode: DecodeFn,
}

/// Encoder and canonical wrap key for one output tag.
#[derive(Debug, Clone, Copy)]
pub struct OutputCodec {
    pub encode: EncodeFn,
    /// Key the encoded value is wrapped under in the response payload.
    pub key: &'static str,
}

#[derive(Debug, Default)]
pub struct TypeRegistry {
    inputs: HashMap<InputTag, InputCodec>,
    outputs: HashMap<OutputTag, OutputCodec>,
}

impl TypeRegistry {
    /// Registry covering every tag in the closed set.
    pub fn with_defaults() -> Self {
        let mut registry = Self::default();
        registry.inputs.insert(
            InputTag::Text,
            InputCodec {
                extract: codec::extract_text,
                decode: codec::decode_text,
            },
        );
        registry.inputs.insert(
            InputTag::File,
            InputCodec {
                extract: codec::extract_file,
                decode: codec::decode_file,
            },
        );
        registry.inputs.insert(
            InputTag::BatchFile,
            InputCodec {
                extract: codec::extract_batch_file,
                decode: codec::decode_batch_file,
            },
        );
        registry.outputs.insert(
            OutputTag::Text,
            OutputCodec {
                encode: codec::encode_text,
                key: "result",
            },
        );
        registry.outputs.insert(
            OutputTag::BatchText,
            OutputCodec {
                encode: codec::encode_batch_text,
                key: "texts",
            },
        );
        registry.outputs.insert(
            OutputTag::File,
            OutputCodec {
                encode: codec::encode_file,
                key: "file",
            },
        );
        registry
    }

    pub fn input(&self, tag: InputTag) -> Result<&InputCodec> {
        self.inputs
            .get(&tag)
            .ok_or_else(|| Error::Config(format!("no input codec registered for tag {tag}")))
    }

    pub fn output(&self, tag: OutputTag) -> Result<&OutputCodec> {
        self.outputs
            .get(&tag)
            .ok_or_else(|| Error::Config(format!("no output codec registered for tag {tag}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_every_tag() {
        let registry = TypeRegistry::with_defaults();
        for tag in InputTag::ALL {
            registry.input(tag).unwrap();
        }
        for tag in OutputTag::ALL {
            registry.output(tag).unwrap();
        }
    }

    #[test]
    fn missing_entry_is_a_config_error() {
        let registry = TypeRegistry::default();
        assert!(matches!(
            registry.input(InputTag::Text),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            registry.output(OutputTag::BatchText),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn output_keys_are_canonical() {
        let registry = TypeRegistry::with_defaults();
        assert_eq!(registry.output(OutputTag::Text).unwrap().key, "result");
        assert_eq!(registry.output(OutputTag::BatchText).unwrap().key, "texts");
        assert_eq!(registry.output(OutputTag::File).unwrap().key, "file");
    }
}
