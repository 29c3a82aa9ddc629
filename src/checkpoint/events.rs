//! TensorFlow event-file messages.
//!
//! Only the fields needed to read scalar summaries are declared; prost skips
//! the rest of the wire data.

use super::bundle::{DT_DOUBLE, DT_FLOAT};
use super::tfrecord::RecordReader;
use crate::{Error, Result};
use prost::Message;
use std::path::Path;
use tracing::debug;

/// One record of an `events.out.tfevents.*` file
#[derive(Clone, PartialEq, Message)]
pub struct Event {
    #[prost(double, tag = "1")]
    pub wall_time: f64,
    #[prost(int64, tag = "2")]
    pub step: i64,
    /// Set on the first record of a file only
    #[prost(string, optional, tag = "3")]
    pub file_version: Option<String>,
    #[prost(message, optional, tag = "5")]
    pub summary: Option<Summary>,
}

#[derive(Clone, PartialEq, Message)]
pub struct Summary {
    #[prost(message, repeated, tag = "1")]
    pub value: Vec<Value>,
}

/// A tagged summary value
#[derive(Clone, PartialEq, Message)]
pub struct Value {
    #[prost(string, tag = "1")]
    pub tag: String,
    #[prost(float, optional, tag = "2")]
    pub simple_value: Option<f32>,
    #[prost(message, optional, tag = "8")]
    pub tensor: Option<TensorProto>,
}

#[derive(Clone, PartialEq, Message)]
pub struct TensorProto {
    #[prost(int32, tag = "1")]
    pub dtype: i32,
    #[prost(bytes = "vec", tag = "4")]
    pub tensor_content: Vec<u8>,
    #[prost(float, repeated, tag = "5")]
    pub float_val: Vec<f32>,
    #[prost(double, repeated, tag = "6")]
    pub double_val: Vec<f64>,
}

impl TensorProto {
    /// First element of a float or double tensor.
    pub fn first_value(&self) -> Option<f64> {
        if let Some(v) = self.float_val.first() {
            return Some(f64::from(*v));
        }
        if let Some(v) = self.double_val.first() {
            return Some(*v);
        }
        match self.dtype {
            DT_FLOAT => {
                let bytes: [u8; 4] = self.tensor_content.get(..4)?.try_into().ok()?;
                Some(f64::from(f32::from_le_bytes(bytes)))
            }
            DT_DOUBLE => {
                let bytes: [u8; 8] = self.tensor_content.get(..8)?.try_into().ok()?;
                Some(f64::from_le_bytes(bytes))
            }
            _ => None,
        }
    }
}

impl Value {
    /// Scalar carried by this value, from either `simple_value` or a scalar tensor.
    pub fn scalar(&self) -> Option<f64> {
        self.simple_value
            .map(f64::from)
            .or_else(|| self.tensor.as_ref().and_then(TensorProto::first_value))
    }

    /// Scalar summary value.
    pub fn simple(tag: impl Into<String>, value: f32) -> Self {
        Self { tag: tag.into(), simple_value: Some(value), tensor: None }
    }
}

impl Event {
    /// Event holding scalar summaries at `step`.
    pub fn scalars(step: i64, values: Vec<Value>) -> Self {
        Self { wall_time: 0.0, step, file_version: None, summary: Some(Summary { value: values }) }
    }

    /// Summary values of this event; empty for non-summary events.
    pub fn values(&self) -> &[Value] {
        self.summary.as_ref().map_or(&[], |s| s.value.as_slice())
    }
}

/// Decode every event of an event file.
pub fn read_events(path: impl AsRef<Path>) -> Result<Vec<Event>> {
    let path = path.as_ref();
    let mut events = Vec::new();
    for record in RecordReader::open(path)? {
        let record = record?;
        let event = Event::decode(record.as_slice()).map_err(|source| Error::Protobuf {
            context: format!("event record in {}", path.display()),
            source,
        })?;
        events.push(event);
    }
    debug!(path = %path.display(), events = events.len(), "read event file");
    Ok(events)
}
