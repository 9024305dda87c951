//! 2-D lookup surface: per-bin central value and uncertainty.

use serde::{Deserialize, Serialize};

/// A 2-D binned lookup surface.
///
/// Coordinates outside the binned range are clamped into the outermost
/// bins, matching the histogram-based weight calculators these tables are
/// exported from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Surface2d {
    /// Bin edges along the first axis (ascending, length = nx + 1).
    pub x_edges: Vec<f64>,
    /// Bin edges along the second axis (ascending, length = ny + 1).
    pub y_edges: Vec<f64>,
    /// Per-bin central values, x-major (index = ix * ny + iy).
    pub values: Vec<f64>,
    /// Per-bin uncertainties, same layout as `values`.
    pub errors: Vec<f64>,
}

impl Surface2d {
    /// Number of bins along the first axis.
    pub fn nx(&self) -> usize {
        self.x_edges.len().saturating_sub(1)
    }

    /// Number of bins along the second axis.
    pub fn ny(&self) -> usize {
        self.y_edges.len().saturating_sub(1)
    }

    /// Central value of the bin containing `(x, y)`.
    pub fn value_at(&self, x: f64, y: f64) -> f64 {
        self.values[self.index(x, y)]
    }

    /// Uncertainty of the bin containing `(x, y)`.
    pub fn error_at(&self, x: f64, y: f64) -> f64 {
        self.errors[self.index(x, y)]
    }

    fn index(&self, x: f64, y: f64) -> usize {
        bin_of(&self.x_edges, x) * self.ny() + bin_of(&self.y_edges, y)
    }

    /// Structural validation; returns the failure reason.
    pub fn validate(&self) -> std::result::Result<(), String> {
        for (label, edges) in [("x_edges", &self.x_edges), ("y_edges", &self.y_edges)] {
            if edges.len() < 2 {
                return Err(format!("{label} needs at least two edges, got {}", edges.len()));
            }
            if edges.windows(2).any(|w| w[0] >= w[1]) {
                return Err(format!("{label} must be strictly ascending"));
            }
        }
        let n = self.nx() * self.ny();
        if self.values.len() != n {
            return Err(format!("expected {n} values, got {}", self.values.len()));
        }
        if self.errors.len() != n {
            return Err(format!("expected {n} errors, got {}", self.errors.len()));
        }
        Ok(())
    }
}

/// Bin index of `v` in `edges`, clamped into `[0, n_bins - 1]`.
fn bin_of(edges: &[f64], v: f64) -> usize {
    let i = edges.partition_point(|e| *e <= v);
    i.saturating_sub(1).min(edges.len() - 2)
}
