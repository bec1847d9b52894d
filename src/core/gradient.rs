//! Gradient magnitude of the distance-to-bank field.
//!
//! Three differencing schemes are supported; the weighted 3x3 kernel is
//! the default. Borders are handled by edge replication so the ridge of
//! the distance field survives to the raster edge.

use crate::types::Band;
use serde::{Deserialize, Serialize};

/// Differencing scheme for the gradient magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradientMethod {
    /// Central differences over two-cell spans, per-cell magnitude in
    /// map units (no resolution scaling).
    CentralDifference,
    /// 3x3 Sobel-like kernels with 1/8 weights, magnitude / resolution.
    WeightedKernel,
    /// Half-weight one-cell taps, squared magnitude / resolution^2.
    ThreeTap,
}

impl Default for GradientMethod {
    fn default() -> Self {
        GradientMethod::WeightedKernel
    }
}

const K_DX: [[f32; 3]; 3] = [
    [1.0 / 8.0, 0.0, -1.0 / 8.0],
    [2.0 / 8.0, 0.0, -2.0 / 8.0],
    [1.0 / 8.0, 0.0, -1.0 / 8.0],
];
const K_DY: [[f32; 3]; 3] = [
    [-1.0 / 8.0, -2.0 / 8.0, -1.0 / 8.0],
    [0.0, 0.0, 0.0],
    [1.0 / 8.0, 2.0 / 8.0, 1.0 / 8.0],
];

/// Edge-replicated sample.
fn at(band: &Band, r: isize, c: isize) -> f32 {
    let (rows, cols) = band.dim();
    let rr = r.clamp(0, rows as isize - 1) as usize;
    let cc = c.clamp(0, cols as isize - 1) as usize;
    band[[rr, cc]]
}

fn cell_gradient(band: &Band, r: isize, c: isize, method: GradientMethod, resolution: f32) -> f32 {
    match method {
        GradientMethod::CentralDifference => {
            let dx = 0.5 * (at(band, r, c + 1) - at(band, r, c - 1));
            let dy = 0.5 * (at(band, r + 1, c) - at(band, r - 1, c));
            (dx * dx + dy * dy).sqrt()
        }
        GradientMethod::WeightedKernel => {
            let mut dx = 0.0f32;
            let mut dy = 0.0f32;
            for i in 0..3isize {
                for j in 0..3isize {
                    let v = at(band, r + i - 1, c + j - 1);
                    dx += K_DX[i as usize][j as usize] * v;
                    dy += K_DY[i as usize][j as usize] * v;
                }
            }
            (dx * dx + dy * dy).sqrt() / resolution
        }
        GradientMethod::ThreeTap => {
            let dx = 0.5 * (at(band, r, c + 1) - at(band, r, c - 1));
            let dy = 0.5 * (at(band, r + 1, c) - at(band, r - 1, c));
            (dx * dx + dy * dy) / (resolution * resolution)
        }
    }
}

/// NaN at the center or in any stencil neighbor makes the output NaN.
fn stencil_defined(band: &Band, r: isize, c: isize, method: GradientMethod) -> bool {
    match method {
        GradientMethod::CentralDifference | GradientMethod::ThreeTap => {
            !at(band, r, c).is_nan()
                && !at(band, r, c + 1).is_nan()
                && !at(band, r, c - 1).is_nan()
                && !at(band, r + 1, c).is_nan()
                && !at(band, r - 1, c).is_nan()
        }
        GradientMethod::WeightedKernel => {
            for i in -1..=1isize {
                for j in -1..=1isize {
                    if at(band, r + i, c + j).is_nan() {
                        return false;
                    }
                }
            }
            true
        }
    }
}

/// Gradient magnitude band. Undefined wherever the stencil touches an
/// undefined distance cell, and everywhere when `resolution` is not
/// positive.
pub fn gradient_magnitude(band: &Band, method: GradientMethod, resolution: f64) -> Band {
    let (rows, cols) = band.dim();
    let mut out = Band::from_elem((rows, cols), f32::NAN);
    if resolution <= 0.0 {
        return out;
    }
    let res = resolution as f32;

    let compute_row = |r: usize| -> Vec<f32> {
        (0..cols)
            .map(|c| {
                let (ri, ci) = (r as isize, c as isize);
                if stencil_defined(band, ri, ci, method) {
                    cell_gradient(band, ri, ci, method, res)
                } else {
                    f32::NAN
                }
            })
            .collect()
    };

    #[cfg(feature = "parallel")]
    let row_chunks: Vec<Vec<f32>> = {
        use rayon::prelude::*;
        (0..rows).into_par_iter().map(compute_row).collect()
    };
    #[cfg(not(feature = "parallel"))]
    let row_chunks: Vec<Vec<f32>> = (0..rows).map(compute_row).collect();

    for (r, row) in row_chunks.into_iter().enumerate() {
        for (c, v) in row.into_iter().enumerate() {
            out[[r, c]] = v;
        }
    }
    out
}
