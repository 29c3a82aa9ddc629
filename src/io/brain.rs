//! Brain-image loading from MATLAB Level-5 files

use crate::pca;
use crate::{Error, Result};
use matfile::{MatFile, NumericData};
use ndarray::{Array2, ShapeBuilder};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::info;

/// Variable holding the `samples x voxels` matrix in subject data files.
pub const BRAIN_FIELD: &str = "examples";

/// Load a subject's brain images from the `examples` variable of a `.mat` file.
///
/// With `project`, images are reduced to that many principal components
/// (see [`pca::project`]).
pub fn load_brain_data(path: impl AsRef<Path>, project: Option<usize>) -> Result<Array2<f64>> {
    load_brain_field(path, BRAIN_FIELD, project)
}

/// Load a 2-D numeric variable from a `.mat` file as a row-major `f64` matrix.
pub fn load_brain_field(
    path: impl AsRef<Path>,
    field: &str,
    project: Option<usize>,
) -> Result<Array2<f64>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    let mat = MatFile::parse(BufReader::new(file)).map_err(|e| Error::MatFormat {
        path: path.to_path_buf(),
        message: format!("{e:?}"),
    })?;

    let array = mat
        .find_by_name(field)
        .ok_or_else(|| Error::MissingField { path: path.to_path_buf(), field: field.to_string() })?;

    let size = array.size();
    if size.len() != 2 {
        return Err(Error::shape(format!("variable '{field}' (expected 2-D)"), vec![2], size.clone()));
    }
    let (rows, cols) = (size[0], size[1]);

    let real = real_f64(array.data()).map_err(|message| Error::MatFormat {
        path: path.to_path_buf(),
        message: format!("variable '{field}': {message}"),
    })?;

    // MATLAB stores matrices column-major
    let images = Array2::from_shape_vec((rows, cols).f(), real)
        .map_err(|e| Error::shape(format!("variable '{field}' ({e})"), vec![rows, cols], vec![]))?
        .as_standard_layout()
        .into_owned();
    info!(path = %path.display(), rows, cols, "loaded brain images");

    match project {
        Some(k) => pca::project(images, k, "brain images"),
        None => Ok(images),
    }
}

fn real_f64(data: &NumericData) -> std::result::Result<Vec<f64>, String> {
    fn widen<T: Copy + Into<f64>, I>(real: &[T], imag: &Option<I>) -> std::result::Result<Vec<f64>, String> {
        if imag.is_some() {
            return Err("complex data is not supported".to_string());
        }
        Ok(real.iter().map(|&v| v.into()).collect())
    }

    match data {
        NumericData::Double { real, imag } => widen(real, imag),
        NumericData::Single { real, imag } => widen(real, imag),
        NumericData::Int32 { real, imag } => widen(real, imag),
        NumericData::UInt32 { real, imag } => widen(real, imag),
        NumericData::Int16 { real, imag } => widen(real, imag),
        NumericData::UInt16 { real, imag } => widen(real, imag),
        NumericData::Int8 { real, imag } => widen(real, imag),
        NumericData::UInt8 { real, imag } => widen(real, imag),
        _ => Err("64-bit integer data is not supported".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    const MI_INT8: u32 = 1;
    const MI_INT32: u32 = 5;
    const MI_UINT32: u32 = 6;
    const MI_DOUBLE: u32 = 9;
    const MI_MATRIX: u32 = 14;
    const MX_DOUBLE_CLASS: u32 = 6;

    fn element(data_type: u32, payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&data_type.to_le_bytes());
        out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        out.extend_from_slice(payload);
        while out.len() % 8 != 0 {
            out.push(0);
        }
        out
    }

    /// Write an uncompressed Level-5 MAT file with one double matrix.
    fn write_mat(path: &Path, name: &str, matrix: &Array2<f64>) {
        let (rows, cols) = matrix.dim();

        let mut flags = Vec::new();
        flags.extend_from_slice(&MX_DOUBLE_CLASS.to_le_bytes());
        flags.extend_from_slice(&0u32.to_le_bytes());

        let mut dims = Vec::new();
        dims.extend_from_slice(&(rows as i32).to_le_bytes());
        dims.extend_from_slice(&(cols as i32).to_le_bytes());

        let mut real = Vec::new();
        for j in 0..cols {
            for i in 0..rows {
                real.extend_from_slice(&matrix[[i, j]].to_le_bytes());
            }
        }

        let mut body = Vec::new();
        body.extend(element(MI_UINT32, &flags));
        body.extend(element(MI_INT32, &dims));
        body.extend(element(MI_INT8, name.as_bytes()));
        body.extend(element(MI_DOUBLE, &real));

        let mut header = b"MATLAB 5.0 MAT-file, written by descifrar tests".to_vec();
        header.resize(116, b' ');
        header.extend_from_slice(&[0u8; 8]);
        header.extend_from_slice(&0x0100u16.to_le_bytes());
        header.extend_from_slice(b"IM");

        let mut file = File::create(path).expect("file creation should succeed");
        file.write_all(&header).expect("file write should succeed");
        file.write_all(&element(MI_MATRIX, &body)).expect("file write should succeed");
    }

    fn sample_images() -> Array2<f64> {
        Array2::from_shape_fn((8, 5), |(i, j)| (i as f64) * 10.0 + j as f64 + ((i * j) % 3) as f64)
    }

    #[test]
    fn test_load_brain_data_row_major() {
        let dir = TempDir::new().expect("temp dir creation should succeed");
        let path = dir.path().join("M01.mat");
        let images = sample_images();
        write_mat(&path, BRAIN_FIELD, &images);

        let loaded = load_brain_data(&path, None).expect("load should succeed");
        assert_eq!(loaded, images);
    }

    #[test]
    fn test_load_brain_data_projection() {
        let dir = TempDir::new().expect("temp dir creation should succeed");
        let path = dir.path().join("M02.mat");
        write_mat(&path, BRAIN_FIELD, &sample_images());

        let loaded = load_brain_data(&path, Some(2)).expect("load should succeed");
        assert_eq!(loaded.dim(), (8, 2));
    }

    #[test]
    fn test_projection_above_width_keeps_images() {
        let dir = TempDir::new().expect("temp dir creation should succeed");
        let path = dir.path().join("M03.mat");
        write_mat(&path, BRAIN_FIELD, &sample_images());

        let loaded = load_brain_data(&path, Some(50)).expect("load should succeed");
        assert_eq!(loaded, sample_images());
    }

    #[test]
    fn test_missing_field() {
        let dir = TempDir::new().expect("temp dir creation should succeed");
        let path = dir.path().join("M04.mat");
        write_mat(&path, "other", &sample_images());

        let err = load_brain_data(&path, None).unwrap_err();
        assert!(matches!(err, Error::MissingField { ref field, .. } if field == "examples"));
    }

    #[test]
    fn test_load_named_field() {
        let dir = TempDir::new().expect("temp dir creation should succeed");
        let path = dir.path().join("M05.mat");
        write_mat(&path, "voxels", &sample_images());

        let loaded = load_brain_field(&path, "voxels", None).expect("load should succeed");
        assert_eq!(loaded.dim(), (8, 5));
    }

    #[test]
    fn test_not_a_mat_file() {
        let dir = TempDir::new().expect("temp dir creation should succeed");
        let path = dir.path().join("bogus.mat");
        std::fs::write(&path, b"not a matlab file").expect("file write should succeed");

        assert!(matches!(load_brain_data(&path, None), Err(Error::MatFormat { .. })));
    }
}
