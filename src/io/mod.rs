//! Input loaders for decoding experiments
//!
//! - `sentences`: plain-text stimuli, one sentence per line
//! - `encodings`: `.npy` sentence encodings, concatenated across models
//! - `brain`: MATLAB `.mat` brain-image matrices

mod brain;
mod encodings;
mod sentences;

pub use brain::{load_brain_data, load_brain_field, BRAIN_FIELD};
pub use encodings::{load_encodings, load_npy_matrix};
pub use sentences::{load_sentences, DEFAULT_SENTENCES_PATH};
