//! Structured record model and frame codec for the WebSocket transport.
//!
//! A record is a JSON object. Each record travels as exactly one transport
//! frame: a text frame carrying JSON, or a binary frame carrying a protobuf
//! `google.protobuf.Struct`. There is no length prefix and no multi-frame
//! assembly; every frame decodes on its own.

use std::fmt;
use std::str::FromStr;

use prost::Message;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Decoded message payload: string keys to arbitrary JSON values.
pub type Record = Map<String, Value>;

/// Largest magnitude at which every integer is exactly representable as `f64`.
const MAX_SAFE_INTEGER: u64 = 1 << 53;

/// Error returned when a frame cannot be turned into a [`Record`].
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// A text frame did not contain valid JSON.
    #[error("invalid json frame: {0}")]
    Json(#[from] serde_json::Error),
    /// A binary frame did not contain a valid protobuf `Struct`.
    #[error("invalid protobuf frame: {0}")]
    Protobuf(#[from] prost::DecodeError),
    /// The frame decoded, but its top-level value is not an object.
    #[error("frame is not a record: top-level value is {0}")]
    NotARecord(&'static str),
    /// An encoding name did not match any known [`Encoding`].
    #[error("unknown encoding: {0}")]
    UnknownEncoding(String),
    /// An integer outside ±2^53 cannot be carried exactly as a protobuf
    /// double.
    #[error("number {0} cannot be encoded exactly as a protobuf double")]
    InexactNumber(String),
}

/// Wire encoding used when sending a record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// JSON object in a text frame.
    #[default]
    Json,
    /// Protobuf `Struct` in a binary frame.
    Protobuf,
}

impl Encoding {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Protobuf => "protobuf",
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Encoding {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "protobuf" | "proto" => Ok(Self::Protobuf),
            other => Err(CodecError::UnknownEncoding(other.to_owned())),
        }
    }
}

/// One transport-level unit carrying one encoded record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Binary(Vec<u8>),
}

impl Frame {
    /// The encoding a frame of this kind is decoded with.
    #[must_use]
    pub fn encoding(&self) -> Encoding {
        match self {
            Self::Text(_) => Encoding::Json,
            Self::Binary(_) => Encoding::Protobuf,
        }
    }
}

/// Encode a record into a single frame.
///
/// Protobuf carries numbers by value only: `1.0` and `-0.0` decode back as the
/// integers `1` and `0`.
///
/// # Errors
///
/// Returns [`CodecError::InexactNumber`] when a protobuf record holds an
/// integer beyond ±2^53. JSON encoding never fails.
pub fn encode_record(record: &Record, encoding: Encoding) -> Result<Frame, CodecError> {
    match encoding {
        Encoding::Json => Ok(Frame::Text(Value::Object(record.clone()).to_string())),
        Encoding::Protobuf => {
            let wire = record_to_struct(record)?;
            Ok(Frame::Binary(wire.encode_to_vec()))
        }
    }
}

/// Decode a frame into a record, choosing the codec from the frame kind.
///
/// # Errors
///
/// Returns [`CodecError`] when the payload is malformed or is not an object.
pub fn decode_frame(frame: &Frame) -> Result<Record, CodecError> {
    match frame {
        Frame::Text(text) => decode_text(text),
        Frame::Binary(bytes) => decode_binary(bytes),
    }
}

/// Decode a JSON text payload into a record.
///
/// # Errors
///
/// Returns [`CodecError::Json`] for malformed JSON and
/// [`CodecError::NotARecord`] when the top-level value is not an object.
pub fn decode_text(text: &str) -> Result<Record, CodecError> {
    match serde_json::from_str::<Value>(text)? {
        Value::Object(record) => Ok(record),
        other => Err(CodecError::NotARecord(kind_name(&other))),
    }
}

/// Decode a protobuf `Struct` payload into a record.
///
/// # Errors
///
/// Returns [`CodecError::Protobuf`] for malformed bytes.
pub fn decode_binary(bytes: &[u8]) -> Result<Record, CodecError> {
    let wire = prost_types::Struct::decode(bytes)?;
    Ok(struct_to_record(&wire))
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn record_to_struct(record: &Record) -> Result<prost_types::Struct, CodecError> {
    let fields = record
        .iter()
        .map(|(k, v)| Ok((k.clone(), json_to_proto_value(v)?)))
        .collect::<Result<_, CodecError>>()?;
    Ok(prost_types::Struct { fields })
}

fn struct_to_record(wire: &prost_types::Struct) -> Record {
    wire.fields
        .iter()
        .map(|(k, v)| (k.clone(), proto_to_json_value(v)))
        .collect()
}

fn json_to_proto_value(value: &Value) -> Result<prost_types::Value, CodecError> {
    let kind = match value {
        Value::Null => {
            prost_types::value::Kind::NullValue(prost_types::NullValue::NullValue as i32)
        }
        Value::Bool(v) => prost_types::value::Kind::BoolValue(*v),
        Value::Number(v) => prost_types::value::Kind::NumberValue(proto_number(v)?),
        Value::String(v) => prost_types::value::Kind::StringValue(v.clone()),
        Value::Array(v) => prost_types::value::Kind::ListValue(prost_types::ListValue {
            values: v.iter().map(json_to_proto_value).collect::<Result<_, _>>()?,
        }),
        Value::Object(v) => prost_types::value::Kind::StructValue(record_to_struct(v)?),
    };

    Ok(prost_types::Value { kind: Some(kind) })
}

#[allow(clippy::cast_precision_loss)]
fn proto_number(n: &serde_json::Number) -> Result<f64, CodecError> {
    let exact = if let Some(v) = n.as_i64() {
        (v.unsigned_abs() <= MAX_SAFE_INTEGER).then_some(v as f64)
    } else if let Some(v) = n.as_u64() {
        (v <= MAX_SAFE_INTEGER).then_some(v as f64)
    } else {
        n.as_f64()
    };
    exact.ok_or_else(|| CodecError::InexactNumber(n.to_string()))
}

fn proto_to_json_value(value: &prost_types::Value) -> Value {
    let Some(kind) = &value.kind else {
        return Value::Null;
    };

    match kind {
        prost_types::value::Kind::NullValue(_) => Value::Null,
        prost_types::value::Kind::NumberValue(v) => number_value(*v),
        prost_types::value::Kind::StringValue(v) => Value::String(v.clone()),
        prost_types::value::Kind::BoolValue(v) => Value::Bool(*v),
        prost_types::value::Kind::StructValue(v) => Value::Object(struct_to_record(v)),
        prost_types::value::Kind::ListValue(v) => {
            Value::Array(v.values.iter().map(proto_to_json_value).collect())
        }
    }
}

/// Protobuf carries every number as `f64`; integral values come back as
/// JSON integers so `{"n": 1}` survives a binary round trip unchanged.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss, clippy::float_cmp)]
fn number_value(v: f64) -> Value {
    if v.is_finite() && v.trunc() == v && v.abs() <= MAX_SAFE_INTEGER as f64 {
        return Value::from(v as i64);
    }
    serde_json::Number::from_f64(v).map_or(Value::Null, Value::Number)
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
