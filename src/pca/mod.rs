//! Principal component analysis for encodings and brain images
//!
//! Both loaders reduce their matrices the same way: fit on the full data,
//! project onto the top-k components, and log how much variance survived.


use crate::{Error, Result};
use nalgebra::DMatrix;
use ndarray::{Array1, Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Fitted PCA model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pca {
    /// Column means of the training data, shape `(d,)`
    mean: Array1<f64>,
    /// Principal axes as rows, shape `(k, d)`
    components: Array2<f64>,
    /// Variance captured by each component
    explained_variance: Array1<f64>,
    /// Fraction of total variance captured by each component
    explained_variance_ratio: Array1<f64>,
}

impl Pca {
    /// Fit `k` components to an `n x d` matrix.
    ///
    /// Components are ordered by decreasing variance. Each component's sign is
    /// chosen so its largest-magnitude loading is positive, which makes fits
    /// reproducible across runs.
    pub fn fit(data: ArrayView2<'_, f64>, k: usize) -> Result<Self> {
        let (n, d) = data.dim();
        if k == 0 || n < 2 || k > n.min(d) {
            return Err(Error::InvalidProjection { requested: k, rows: n, cols: d });
        }

        let mean = data
            .mean_axis(Axis(0))
            .ok_or(Error::InvalidProjection { requested: k, rows: n, cols: d })?;
        let centered = &data - &mean;

        let matrix = DMatrix::from_fn(n, d, |i, j| centered[[i, j]]);
        let svd = matrix.svd(false, true);
        let v_t = svd.v_t.ok_or_else(|| Error::InvalidProjection { requested: k, rows: n, cols: d })?;
        let singular = svd.singular_values;

        let mut order: Vec<usize> = (0..singular.len()).collect();
        order.sort_by(|&a, &b| singular[b].total_cmp(&singular[a]));

        let dof = (n - 1) as f64;
        let total_variance: f64 = singular.iter().map(|s| s * s).sum::<f64>() / dof;

        let mut components = Array2::zeros((k, d));
        let mut explained_variance = Array1::zeros(k);
        for (row, &idx) in order.iter().take(k).enumerate() {
            let axis = v_t.row(idx);
            let pivot = (0..d)
                .max_by(|&a, &b| axis[a].abs().total_cmp(&axis[b].abs()))
                .unwrap_or(0);
            let sign = if axis[pivot] < 0.0 { -1.0 } else { 1.0 };
            for j in 0..d {
                components[[row, j]] = sign * axis[j];
            }
            explained_variance[row] = singular[idx] * singular[idx] / dof;
        }

        let explained_variance_ratio = if total_variance > 0.0 {
            &explained_variance / total_variance
        } else {
            Array1::zeros(k)
        };

        Ok(Self { mean, components, explained_variance, explained_variance_ratio })
    }

    /// Project an `m x d` matrix onto the fitted components, giving `m x k`.
    pub fn transform(&self, data: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        if data.ncols() != self.mean.len() {
            return Err(Error::shape("PCA transform", vec![self.mean.len()], vec![data.ncols()]));
        }
        let centered = &data - &self.mean;
        Ok(centered.dot(&self.components.t()))
    }

    /// Number of fitted components.
    pub fn n_components(&self) -> usize {
        self.components.nrows()
    }

    /// Principal axes as rows.
    pub fn components(&self) -> &Array2<f64> {
        &self.components
    }

    /// Variance captured by each component.
    pub fn explained_variance(&self) -> &Array1<f64> {
        &self.explained_variance
    }

    /// Fraction of total variance captured by each component.
    pub fn explained_variance_ratio(&self) -> &Array1<f64> {
        &self.explained_variance_ratio
    }
}

/// Reduce `data` to `k` principal components, as both loaders do.
///
/// Data already narrower than `k` is returned unchanged with a warning.
/// `what` names the data in log output.
pub fn project(data: Array2<f64>, k: usize, what: &str) -> Result<Array2<f64>> {
    info!("Projecting {what} to dimension {k} with PCA");

    if data.ncols() < k {
        warn!(
            "{what} are already below requested dimensionality: {} < {k}",
            data.ncols()
        );
        return Ok(data);
    }

    let pca = Pca::fit(data.view(), k)?;
    info!(
        "PCA explained variance: {:.6}",
        pca.explained_variance_ratio().sum() * 100.0
    );
    pca.transform(data.view())
}
