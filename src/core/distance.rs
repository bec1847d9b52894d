//! Distance-to-bank field.
//!
//! The river outline is the one-pixel ring between two successive
//! dilations of the river mask. An exact Euclidean distance transform
//! (Felzenszwalb & Huttenlocher, squared-distance lower envelope per
//! axis) measures each pixel's distance to that outline; the result is
//! kept only inside the dilated river and under a pixel cutoff, and is
//! scaled to map units.

use crate::core::mask::dilate8;
use crate::types::Band;
use ndarray::Array2;

/// One-dimensional squared distance transform of a sampled function.
/// Samples must be finite: off-feature cells carry a large sentinel,
/// never INFINITY, so envelope intersections stay well-defined.
fn edt_1d(f: &[f32], d: &mut [f32]) {
    let n = f.len();
    if n == 0 {
        return;
    }
    let mut v = vec![0usize; n]; // parabola apex indices
    let mut z = vec![0.0f32; n + 1]; // envelope boundaries
    let mut k = 0usize;
    z[0] = f32::NEG_INFINITY;
    z[1] = f32::INFINITY;

    for q in 1..n {
        let fq = f[q] + (q * q) as f32;
        loop {
            let p = v[k];
            let s = (fq - (f[p] + (p * p) as f32)) / (2.0 * (q as f32 - p as f32));
            if s <= z[k] {
                if k == 0 {
                    v[0] = q;
                    z[1] = f32::INFINITY;
                    break;
                }
                k -= 1;
            } else {
                k += 1;
                v[k] = q;
                z[k] = s;
                z[k + 1] = f32::INFINITY;
                break;
            }
        }
    }

    k = 0;
    for q in 0..n {
        while z[k + 1] < q as f32 {
            k += 1;
        }
        let dq = q as f32 - v[k] as f32;
        d[q] = dq * dq + f[v[k]];
    }
}

/// Exact Euclidean distance (in pixels) from every cell to the nearest
/// `feature` cell. Cells inside the feature set get 0. A grid with no
/// feature cells comes back all-INFINITY.
pub fn euclidean_distance(feature: &Array2<bool>) -> Array2<f32> {
    let (rows, cols) = feature.dim();
    // Background sentinel above every reachable squared distance; the
    // envelope construction needs finite parabolas.
    let background = (rows * rows + cols * cols) as f32;
    let mut sq = Array2::from_elem((rows, cols), background);
    for ((r, c), &on) in feature.indexed_iter() {
        if on {
            sq[[r, c]] = 0.0;
        }
    }

    // columns first, then rows
    let mut buf = vec![0.0f32; rows.max(cols)];
    for c in 0..cols {
        let col: Vec<f32> = (0..rows).map(|r| sq[[r, c]]).collect();
        edt_1d(&col, &mut buf[..rows]);
        for r in 0..rows {
            sq[[r, c]] = buf[r];
        }
    }
    for r in 0..rows {
        let row: Vec<f32> = (0..cols).map(|c| sq[[r, c]]).collect();
        edt_1d(&row, &mut buf[..cols]);
        for c in 0..cols {
            sq[[r, c]] = buf[c];
        }
    }
    sq.mapv_inplace(|v| if v >= background { f32::INFINITY } else { v.sqrt() });
    sq
}

/// Outline ring of the river mask: dilation by two minus dilation by one.
pub fn river_outline(river_mask: &Band) -> Band {
    let d2 = dilate8(river_mask, 2);
    let d1 = dilate8(river_mask, 1);
    &d2 - &d1
}

/// Distance-to-bank band in map units. Defined only inside the
/// twice-dilated river and where the pixel distance does not exceed
/// `cutoff`; NaN elsewhere.
pub fn distance_field(river_mask: &Band, cutoff: f32, resolution: f64) -> Band {
    let d2 = dilate8(river_mask, 2);
    let d1 = dilate8(river_mask, 1);
    let (rows, cols) = river_mask.dim();

    let mut outline = Array2::from_elem((rows, cols), false);
    for r in 0..rows {
        for c in 0..cols {
            outline[[r, c]] = d2[[r, c]] - d1[[r, c]] == 1.0;
        }
    }
    let pixel_dist = euclidean_distance(&outline);

    let mut out = Band::from_elem((rows, cols), f32::NAN);
    for r in 0..rows {
        for c in 0..cols {
            let pd = pixel_dist[[r, c]];
            if d2[[r, c]] == 1.0 && pd <= cutoff {
                out[[r, c]] = pd * resolution as f32;
            }
        }
    }
    out
}
