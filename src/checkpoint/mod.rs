//! Metadata from TensorFlow fine-tuning runs.
//!
//! Reads just enough of TensorFlow's on-disk formats to recover training
//! progress without a TensorFlow runtime:
//!
//! - [`tfrecord`]: length-prefixed, crc32c-checked record framing
//! - [`events`]: `Event` summaries written by the training loop
//! - [`bundle`]: V2 tensor-bundle checkpoints (SSTable index + data shards)
//! - [`metadata`]: per-step loss, gradient-norm and eval metrics

pub mod bundle;
pub mod events;
mod metadata;
pub mod tfrecord;


pub use bundle::{CheckpointReader, TensorInfo};
pub use events::{read_events, Event};
pub use metadata::{load_finetune_metadata, FinetuneMetadata, StepMetrics};
pub use tfrecord::{RecordReader, RecordWriter};

/// Masking applied to stored crc32c values in TFRecord and LevelDB blocks.
pub(crate) fn mask_crc(crc: u32) -> u32 {
    crc.rotate_right(15).wrapping_add(0xa282_ead8)
}
