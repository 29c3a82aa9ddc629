//! Wilcoxon signed-rank test

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};
use std::fmt;

/// Largest sample size for which the exact null distribution is used.
const EXACT_MAX_N: usize = 50;

/// How the p-value was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WilcoxonMethod {
    /// Exact null distribution of the signed-rank statistic
    Exact,
    /// Normal approximation with tie-corrected variance
    Normal,
}

/// Result of a two-sided Wilcoxon signed-rank test
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WilcoxonResult {
    /// `min(R+, R-)`
    pub statistic: f64,
    /// Two-sided p-value
    pub p_value: f64,
    /// Pairs left after dropping zero differences
    pub n_used: usize,
    /// Distribution used for the p-value
    pub method: WilcoxonMethod,
}

impl fmt::Display for WilcoxonResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "W={:.1}, p={:.4e}, n={} ({:?})",
            self.statistic, self.p_value, self.n_used, self.method
        )
    }
}

/// Paired two-sided Wilcoxon signed-rank test of `x` against `y`.
///
/// Zero differences are discarded before ranking. Tied absolute differences
/// receive their average rank. For at most 50 pairs with no ties and no zeros
/// the exact distribution is used; otherwise the normal approximation without
/// continuity correction.
pub fn wilcoxon(x: &[f64], y: &[f64]) -> Result<WilcoxonResult> {
    if x.len() != y.len() {
        return Err(Error::shape("wilcoxon paired samples", vec![x.len()], vec![y.len()]));
    }

    let diffs: Vec<f64> = x.iter().zip(y).map(|(a, b)| a - b).filter(|d| *d != 0.0).collect();
    let n_zero = x.len() - diffs.len();
    let n = diffs.len();
    if n == 0 {
        return Err(Error::InsufficientData(
            "wilcoxon needs at least one non-zero paired difference".into(),
        ));
    }

    let (ranks, tie_sizes) = average_ranks(&diffs);
    let r_plus: f64 = diffs.iter().zip(&ranks).filter(|(d, _)| **d > 0.0).map(|(_, r)| r).sum();
    let r_minus: f64 = diffs.iter().zip(&ranks).filter(|(d, _)| **d < 0.0).map(|(_, r)| r).sum();
    let statistic = r_plus.min(r_minus);

    let has_ties = tie_sizes.iter().any(|&t| t > 1);
    if n <= EXACT_MAX_N && !has_ties && n_zero == 0 {
        let p_value = exact_p_value(n, r_plus);
        return Ok(WilcoxonResult { statistic, p_value, n_used: n, method: WilcoxonMethod::Exact });
    }

    let nf = n as f64;
    let mean = nf * (nf + 1.0) / 4.0;
    let tie_term: f64 = tie_sizes.iter().map(|&t| (t * t * t - t) as f64).sum::<f64>() / 48.0;
    let sd = (nf * (nf + 1.0) * (2.0 * nf + 1.0) / 24.0 - tie_term).sqrt();

    let z = (statistic - mean) / sd;
    let normal = Normal::new(0.0, 1.0).map_err(|e| Error::InsufficientData(e.to_string()))?;
    let p_value = (2.0 * normal.cdf(-z.abs())).min(1.0);

    Ok(WilcoxonResult { statistic, p_value, n_used: n, method: WilcoxonMethod::Normal })
}

/// Average ranks (1-based) of `|values|`, plus the size of every tie group.
fn average_ranks(values: &[f64]) -> (Vec<f64>, Vec<usize>) {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].abs().total_cmp(&values[b].abs()));

    let mut ranks = vec![0.0; values.len()];
    let mut tie_sizes = Vec::new();
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && values[order[end]].abs() == values[order[start]].abs() {
            end += 1;
        }
        // positions start..end share ranks start+1..=end
        let rank = (start + 1 + end) as f64 / 2.0;
        for &idx in &order[start..end] {
            ranks[idx] = rank;
        }
        tie_sizes.push(end - start);
        start = end;
    }
    (ranks, tie_sizes)
}

/// Two-sided exact p-value for an observed positive-rank sum with `n` untied pairs.
fn exact_p_value(n: usize, r_plus: f64) -> f64 {
    let max_sum = n * (n + 1) / 2;

    // counts[s] = number of subsets of {1..n} whose ranks sum to s
    let mut counts = vec![0.0_f64; max_sum + 1];
    counts[0] = 1.0;
    for k in 1..=n {
        for s in (k..=max_sum).rev() {
            counts[s] += counts[s - k];
        }
    }
    let total = 2f64.powi(n as i32);

    let observed = r_plus.round() as usize;
    let lower: f64 = counts[..=observed.min(max_sum)].iter().sum::<f64>() / total;
    let upper: f64 = counts[observed.min(max_sum)..].iter().sum::<f64>() / total;
    (2.0 * lower.min(upper)).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_exact_all_positive() {
        // All 8 differences positive: p = 2 / 2^8
        let x: Vec<f64> = (1..=8).map(f64::from).collect();
        let y = vec![0.0; 8];

        let result = wilcoxon(&x, &y).expect("test should succeed");
        assert_eq!(result.method, WilcoxonMethod::Exact);
        assert_eq!(result.statistic, 0.0);
        assert_abs_diff_eq!(result.p_value, 2.0 / 256.0, epsilon = 1e-12);
    }

    #[test]
    fn test_exact_reference_value() {
        // scipy.stats.wilcoxon(d) for d = [-2, 1, 3, 4, 5]: statistic 2.0, p 0.1875
        let x = vec![-2.0, 1.0, 3.0, 4.0, 5.0];
        let y = vec![0.0; 5];

        let result = wilcoxon(&x, &y).expect("test should succeed");
        assert_eq!(result.statistic, 2.0);
        assert_abs_diff_eq!(result.p_value, 0.1875, epsilon = 1e-12);
    }

    #[test]
    fn test_symmetric_differences_not_significant() {
        let x = vec![1.0, -1.5, 2.0, -2.5, 3.0, -3.5];
        let y = vec![0.0; 6];
        let result = wilcoxon(&x, &y).expect("test should succeed");
        assert!(result.p_value > 0.5);
    }

    #[test]
    fn test_zero_differences_are_dropped() {
        let x = vec![1.0, 2.0, 3.0, 5.0];
        let y = vec![1.0, 1.0, 1.0, 1.0];
        let result = wilcoxon(&x, &y).expect("test should succeed");
        assert_eq!(result.n_used, 3);
        assert_eq!(result.method, WilcoxonMethod::Normal);
    }

    #[test]
    fn test_normal_approximation_with_ties() {
        // |d| = 1, 1, 2, 2, 3 -> ranks 1.5, 1.5, 3.5, 3.5, 5
        let x = vec![1.0, -1.0, 2.0, 2.0, 3.0];
        let y = vec![0.0; 5];
        let result = wilcoxon(&x, &y).expect("test should succeed");

        assert_eq!(result.method, WilcoxonMethod::Normal);
        assert_abs_diff_eq!(result.statistic, 1.5, epsilon = 1e-12);

        let mean = 7.5;
        let sd: f64 = (5.0 * 6.0 * 11.0 / 24.0 - (6.0 + 6.0) / 48.0_f64).sqrt();
        let z = (1.5 - mean) / sd;
        let expected = 2.0 * Normal::new(0.0, 1.0).expect("valid normal").cdf(z);
        assert_abs_diff_eq!(result.p_value, expected, epsilon = 1e-12);
    }

    #[test]
    fn test_large_sample_uses_normal() {
        let x: Vec<f64> = (0..80).map(|i| f64::from(i) + 0.5).collect();
        let y: Vec<f64> = (0..80).map(|i| f64::from(i % 7)).collect();
        let result = wilcoxon(&x, &y).expect("test should succeed");
        assert_eq!(result.method, WilcoxonMethod::Normal);
        assert!(result.p_value < 1e-6);
    }

    #[test]
    fn test_length_mismatch() {
        assert!(matches!(wilcoxon(&[1.0], &[1.0, 2.0]), Err(Error::ShapeMismatch { .. })));
    }

    #[test]
    fn test_all_zero_differences() {
        assert!(matches!(wilcoxon(&[1.0, 2.0], &[1.0, 2.0]), Err(Error::InsufficientData(_))));
    }

    #[test]
    fn test_average_ranks() {
        let (ranks, ties) = average_ranks(&[3.0, -1.0, 1.0, 2.0]);
        assert_eq!(ranks, vec![4.0, 1.5, 1.5, 3.0]);
        assert_eq!(ties, vec![2, 1, 1]);
    }

    #[test]
    fn test_exact_p_value_bounds() {
        for n in 1..12 {
            let max = n * (n + 1) / 2;
            for r in 0..=max {
                let p = exact_p_value(n, r as f64);
                assert!(p > 0.0 && p <= 1.0);
            }
        }
    }

    #[test]
    fn test_display() {
        let result = WilcoxonResult { statistic: 3.0, p_value: 0.01, n_used: 10, method: WilcoxonMethod::Exact };
        let s = result.to_string();
        assert!(s.contains("W=3.0"));
        assert!(s.contains("n=10"));
    }
}
