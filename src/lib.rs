//! Descifrar: analysis helpers for brain-to-sentence decoding experiments.
//!
//! Loaders for sentence stimuli, sentence encodings, brain images and decoder
//! outputs, plus the evaluation and significance machinery used to compare
//! decoders trained against different encoding models.
//!
//! ## Modules
//!
//! - `io`: sentences, `.npy` encodings and `.mat` brain images
//! - `pca`: dimensionality reduction shared by the loaders
//! - `results`: decoder performance CSVs and prediction matrices keyed by
//!   (model, run, step, subject)
//! - `eval`: cosine-similarity rank evaluation of predictions
//! - `stats`: Wilcoxon signed-rank comparison across models
//! - `checkpoint`: metadata from TensorFlow fine-tuning checkpoints and event logs
//! - `config`: YAML analysis configuration
//!
//! ## Example
//!
//! ```no_run
//! use descifrar::eval::eval_ranks;
//! use descifrar::io::load_encodings;
//!
//! let encodings = load_encodings(&["encodings/GLOVE.npy"], Some(256))?;
//! let idxs: Vec<usize> = (0..encodings.nrows()).collect();
//! let ranks = eval_ranks(encodings.view(), &idxs, encodings.view(), true)?;
//! println!("mean rank: {:.2}", ranks.summary().mean_rank);
//! # Ok::<(), descifrar::Error>(())
//! ```

pub mod checkpoint;
pub mod cli;
pub mod config;
pub mod error;
pub mod eval;
pub mod io;
pub mod pca;
pub mod results;
pub mod stats;

pub use error::{Error, Result};
