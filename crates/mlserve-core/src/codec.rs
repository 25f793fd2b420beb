//! Per-tag codec functions
//!
//! Each input tag has an extractor (request → raw payload) and a decoder
//! (raw payload → typed input); each output tag has an encoder (typed
//! output → transport-neutral JSON value) and a canonical wrap key. The
//! [`crate::registry::TypeRegistry`] maps tags onto these functions.

use serde_json::{json, Value};
use std::path::PathBuf;

use crate::envelope::RequestEnvelope;
use crate::error::{Error, Result};

/// Form field the TEXT extractor reads.
pub const TEXT_FIELD: &str = "text";

/// Raw payload pulled out of a request by an extractor.
#[derive(Debug, Clone, PartialEq)]
pub enum RawInput {
    Text(String),
    File(PathBuf),
    BatchFile(Vec<PathBuf>),
}

/// Handle to a spooled upload, verified readable by the decoder.
#[derive(Debug, Clone, PartialEq)]
pub struct FileHandle {
    pub path: PathBuf,
}

/// Typed value handed to a prediction function.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedInput {
    Text(String),
    File(FileHandle),
    BatchFile(Vec<FileHandle>),
}

/// One titled text entry in a BATCHTEXT output.
#[derive(Debug, Clone, PartialEq)]
pub struct TextResult {
    pub title: Option<String>,
    pub value: String,
}

/// Typed value returned by a prediction function.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedOutput {
    Text(String),
    BatchText(Vec<TextResult>),
    File(PathBuf),
}

/// A segment of text anchored to a time range, in seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct TimedSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

// ---- extractors ----

pub fn extract_text(req: &RequestEnvelope) -> Result<RawInput> {
    req.field(TEXT_FIELD)
        .map(|text| RawInput::Text(text.to_string()))
        .ok_or_else(|| Error::InputMissing(format!("expected a `{TEXT_FIELD}` field")))
}

pub fn extract_file(req: &RequestEnvelope) -> Result<RawInput> {
    req.files()
        .first()
        .map(|file| RawInput::File(file.path.clone()))
        .ok_or_else(|| Error::InputMissing("expected one uploaded file".to_string()))
}

pub fn extract_batch_file(req: &RequestEnvelope) -> Result<RawInput> {
    if req.files().is_empty() {
        return Err(Error::InputMissing(
            "expected at least one uploaded file".to_string(),
        ));
    }
    Ok(RawInput::BatchFile(
        req.files().iter().map(|file| file.path.clone()).collect(),
    ))
}

// ---- decoders ----

pub fn decode_text(raw: RawInput) -> Result<TypedInput> {
    match raw {
        RawInput::Text(text) => Ok(TypedInput::Text(text)),
        other => Err(mismatched_raw("TEXT", &other)),
    }
}

pub fn decode_file(raw: RawInput) -> Result<TypedInput> {
    match raw {
        RawInput::File(path) => Ok(TypedInput::File(file_handle(path)?)),
        other => Err(mismatched_raw("FILE", &other)),
    }
}

pub fn decode_batch_file(raw: RawInput) -> Result<TypedInput> {
    match raw {
        RawInput::BatchFile(paths) => {
            let handles = paths
                .into_iter()
                .map(file_handle)
                .collect::<Result<Vec<_>>>()?;
            Ok(TypedInput::BatchFile(handles))
        }
        other => Err(mismatched_raw("BATCHFILE", &other)),
    }
}

fn file_handle(path: PathBuf) -> Result<FileHandle> {
    let meta = std::fs::metadata(&path)
        .map_err(|e| Error::Decode(format!("unreadable file `{}`: {e}", path.display())))?;
    if !meta.is_file() {
        return Err(Error::Decode(format!(
            "`{}` is not a regular file",
            path.display()
        )));
    }
    Ok(FileHandle { path })
}

fn mismatched_raw(expected: &str, got: &RawInput) -> Error {
    Error::Decode(format!("{expected} decoder got mismatched raw input {got:?}"))
}

// ---- encoders ----

pub fn encode_text(output: TypedOutput) -> Result<Value> {
    match output {
        TypedOutput::Text(text) => Ok(Value::String(text)),
        other => Err(mismatched_output("TEXT", &other)),
    }
}

pub fn encode_batch_text(output: TypedOutput) -> Result<Value> {
    match output {
        TypedOutput::BatchText(results) => Ok(Value::Array(
            results
                .into_iter()
                .map(|r| json!({ "title": r.title, "value": r.value }))
                .collect(),
        )),
        other => Err(mismatched_output("BATCHTEXT", &other)),
    }
}

pub fn encode_file(output: TypedOutput) -> Result<Value> {
    match output {
        TypedOutput::File(path) => Ok(Value::String(path.display().to_string())),
        other => Err(mismatched_output("FILE", &other)),
    }
}

fn mismatched_output(expected: &str, got: &TypedOutput) -> Error {
    // The prediction function returned a shape its route did not declare.
    Error::Prediction(format!(
        "{expected} encoder got mismatched typed output {got:?}"
    ))
}

// ---- wire formatting ----

/// Render a time offset in seconds as fixed-width text: two decimal places,
/// minimum width five (`3.5` → `"03.50"`). Downstream consumers rely on the
/// column alignment of this format.
pub fn format_offset(seconds: f64) -> String {
    format!("{seconds:05.2}")
}

/// Render timed segments as the aligned report table used in batch text
/// output: a heading line, a column header, one `start end text` row per
/// segment, and a trailing blank line.
pub fn render_segment_table(heading: &str, segments: &[TimedSegment]) -> String {
    let mut out = String::new();
    out.push_str(heading);
    out.push('\n');
    out.push_str("start end   information\n");
    for segment in segments {
        out.push_str(&format_offset(segment.start));
        out.push(' ');
        out.push_str(&format_offset(segment.end));
        out.push(' ');
        out.push_str(&segment.text);
        out.push('\n');
    }
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::UploadedFile;

    fn envelope_with_files(names: &[&str], dir: &tempfile::TempDir) -> RequestEnvelope {
        let mut envelope = RequestEnvelope::new();
        for (i, name) in names.iter().enumerate() {
            let path = dir.path().join(name);
            std::fs::write(&path, format!("contents {i}")).unwrap();
            envelope.push_file(UploadedFile {
                field: "files".to_string(),
                file_name: name.to_string(),
                path,
            });
        }
        envelope
    }

    #[test]
    fn extract_text_reads_the_text_field() {
        let mut envelope = RequestEnvelope::new();
        envelope.insert_field("text", "hello");
        assert_eq!(
            extract_text(&envelope).unwrap(),
            RawInput::Text("hello".to_string())
        );
    }

    #[test]
    fn extract_text_fails_without_field() {
        let envelope = RequestEnvelope::new();
        assert!(matches!(
            extract_text(&envelope),
            Err(Error::InputMissing(_))
        ));
    }

    #[test]
    fn batch_file_pipeline_preserves_count_and_order() {
        let dir = tempfile::tempdir().unwrap();
        let envelope = envelope_with_files(&["a.txt", "b.txt", "c.txt"], &dir);

        let raw = extract_batch_file(&envelope).unwrap();
        let TypedInput::BatchFile(handles) = decode_batch_file(raw).unwrap() else {
            panic!("expected batch file input");
        };
        assert_eq!(handles.len(), 3);
        let names: Vec<_> = handles
            .iter()
            .map(|h| h.path.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, ["a.txt", "b.txt", "c.txt"]);
    }

    #[test]
    fn decode_rejects_unreadable_file() {
        let raw = RawInput::File(PathBuf::from("/no/such/file.wav"));
        assert!(matches!(decode_file(raw), Err(Error::Decode(_))));
    }

    #[test]
    fn encode_rejects_mismatched_shape() {
        let err = encode_text(TypedOutput::File(PathBuf::from("out.bin"))).unwrap_err();
        assert!(matches!(err, Error::Prediction(_)));
    }

    #[test]
    fn offsets_are_fixed_width_two_decimals() {
        assert_eq!(format_offset(3.5), "03.50");
        assert_eq!(format_offset(0.0), "00.00");
        assert_eq!(format_offset(7.25), "07.25");
        assert_eq!(format_offset(123.4), "123.40");
    }

    #[test]
    fn segment_table_renders_aligned_rows() {
        let segments = vec![
            TimedSegment {
                start: 3.5,
                end: 7.25,
                text: "first".to_string(),
            },
            TimedSegment {
                start: 10.0,
                end: 12.5,
                text: "second".to_string(),
            },
        ];
        let table = render_segment_table("flagged", &segments);
        assert_eq!(
            table,
            "flagged\nstart end   information\n03.50 07.25 first\n10.00 12.50 second\n\n"
        );
    }

    #[test]
    fn encode_then_wrap_round_trips() {
        let original = TypedOutput::BatchText(vec![TextResult {
            title: Some("clip.wav".to_string()),
            value: "ok".to_string(),
        }]);
        let encoded = encode_batch_text(original.clone()).unwrap();

        let mut payload = crate::envelope::ResponsePayload::default();
        payload.insert("texts", encoded).unwrap();
        let body = payload.into_value();

        let decoded: Vec<TextResult> = body["texts"]
            .as_array()
            .unwrap()
            .iter()
            .map(|entry| TextResult {
                title: entry["title"].as_str().map(str::to_string),
                value: entry["value"].as_str().unwrap().to_string(),
            })
            .collect();
        assert_eq!(TypedOutput::BatchText(decoded), original);
    }
}
