//! Orthogonal direction of the cleaned centerline.
//!
//! A 9x9 kernel carries, on its perimeter, the angle (degrees) from the
//! center cell to each perimeter cell measured so that averaging the
//! angles of centerline neighbors yields the direction orthogonal to the
//! local channel. Interior kernel cells carry no weight.

use crate::types::Band;

const KERNEL_SIZE: usize = 9;
const HALF: isize = 4;

/// Angles to the 9x9 perimeter. A tiny positive sentinel stands in for
/// 0 degrees so that "no weight" stays distinguishable from "east".
#[rustfmt::skip]
const ANGLES: [[f32; 9]; 9] = [
    [135.0, 126.9, 116.6, 104.0, 90.0, 76.0, 63.4, 53.1, 45.0],
    [143.1,   0.0,   0.0,   0.0,  0.0,  0.0,  0.0,  0.0, 36.9],
    [153.4,   0.0,   0.0,   0.0,  0.0,  0.0,  0.0,  0.0, 26.6],
    [166.0,   0.0,   0.0,   0.0,  0.0,  0.0,  0.0,  0.0, 14.0],
    [180.0,   0.0,   0.0,   0.0,  0.0,  0.0,  0.0,  0.0, 1e-5],
    [194.0,   0.0,   0.0,   0.0,  0.0,  0.0,  0.0,  0.0, 346.0],
    [206.6,   0.0,   0.0,   0.0,  0.0,  0.0,  0.0,  0.0, 333.4],
    [216.9,   0.0,   0.0,   0.0,  0.0,  0.0,  0.0,  0.0, 323.1],
    [225.0, 233.1, 243.4, 256.0, 270.0, 284.0, 296.6, 306.9, 315.0],
];

/// Mean perimeter angle (degrees) per centerline cell.
///
/// Cells with more than two weighted neighbors are junctions and get no
/// angle; a cell with exactly one neighbor is a line end and the channel
/// direction is rotated a quarter turn; isolated cells get no angle.
pub fn orthogonal_angles(centerline: &Band) -> Band {
    let (rows, cols) = centerline.dim();
    let mut out = Band::from_elem((rows, cols), f32::NAN);

    let compute_row = |r: usize| -> Vec<f32> {
        (0..cols)
            .map(|c| {
                if centerline[[r, c]] != 1.0 {
                    return f32::NAN;
                }
                cell_angle(centerline, r as isize, c as isize)
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

fn cell_angle(centerline: &Band, r: isize, c: isize) -> f32 {
    let (rows, cols) = centerline.dim();
    let mut sum = 0.0f32;
    let mut count = 0u32;
    for i in 0..KERNEL_SIZE as isize {
        for j in 0..KERNEL_SIZE as isize {
            let w = ANGLES[i as usize][j as usize];
            if w == 0.0 {
                continue;
            }
            let (rr, cc) = (r + i - HALF, c + j - HALF);
            if rr < 0 || cc < 0 || rr >= rows as isize || cc >= cols as isize {
                continue;
            }
            if centerline[[rr as usize, cc as usize]] == 1.0 {
                sum += w;
                count += 1;
            }
        }
    }
    match count {
        0 => f32::NAN,
        1 => sum / count as f32 + 90.0,
        2 => sum / count as f32,
        _ => f32::NAN,
    }
}
