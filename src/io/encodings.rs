//! Sentence encoding loading

use crate::pca;
use crate::{Error, Result};
use ndarray::{concatenate, Array2, ArrayView2, Axis};
use std::path::Path;
use tracing::info;

/// Load a 2-D `.npy` matrix as `f64`.
///
/// `float64` arrays are read directly; `float32` arrays are widened.
pub fn load_npy_matrix(path: impl AsRef<Path>) -> Result<Array2<f64>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(Error::io(
            path,
            std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        ));
    }

    match ndarray_npy::read_npy::<_, Array2<f64>>(path) {
        Ok(matrix) => Ok(matrix),
        Err(f64_err) => match ndarray_npy::read_npy::<_, Array2<f32>>(path) {
            Ok(matrix) => Ok(matrix.mapv(f64::from)),
            Err(_) => Err(Error::Npy { path: path.to_path_buf(), message: f64_err.to_string() }),
        },
    }
}

/// Load and horizontally concatenate encodings from several `.npy` files.
///
/// Each file holds an `N x D_i` matrix for the same `N` sentences. When
/// `project` is given, every matrix is reduced to that many principal
/// components before concatenation; matrices already narrower than the target
/// are kept as-is. The result has width `sum(D_i)` (or `sum(min(D_i, k))`).
pub fn load_encodings<P: AsRef<Path>>(paths: &[P], project: Option<usize>) -> Result<Array2<f64>> {
    if paths.is_empty() {
        return Err(Error::NoInputs("load_encodings needs at least one encoding path".into()));
    }

    let mut encodings = Vec::with_capacity(paths.len());
    for path in paths {
        let path = path.as_ref();
        let mut matrix = load_npy_matrix(path)?;
        info!(
            path = %path.display(),
            rows = matrix.nrows(),
            cols = matrix.ncols(),
            "loaded encodings"
        );

        if let Some(k) = project {
            matrix = pca::project(matrix, k, "encodings")?;
        }
        encodings.push(matrix);
    }

    let rows = encodings[0].nrows();
    if let Some(bad) = encodings.iter().find(|m| m.nrows() != rows) {
        return Err(Error::shape("encoding concatenation", vec![rows], vec![bad.nrows()]));
    }

    let views: Vec<ArrayView2<'_, f64>> = encodings.iter().map(|m| m.view()).collect();
    concatenate(Axis(1), &views)
        .map_err(|e| Error::shape(format!("encoding concatenation ({e})"), vec![rows], vec![]))
}
