//! Binary-mask raster helpers shared across the pipeline.
//!
//! Masks are `Band`s whose defined values are exactly {0, 1}; NaN marks
//! an invalid cell. Neighborhoods are 8-connected (the circle-of-radius-1.5
//! kernel) throughout.

use crate::types::Band;
use ndarray::Array2;

/// 8-connected neighbor offsets.
pub const NEIGHBORS_8: [(isize, isize); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// True when the cell holds the foreground value 1.
#[inline]
pub fn is_on(v: f32) -> bool {
    v == 1.0
}

/// Morphological dilation with the 8-neighborhood structuring element,
/// applied `iterations` times. NaN cells count as background; the output
/// is fully defined {0, 1}.
pub fn dilate8(mask: &Band, iterations: usize) -> Band {
    let (rows, cols) = mask.dim();
    let mut current = Array2::<f32>::zeros((rows, cols));
    for ((r, c), &v) in mask.indexed_iter() {
        if is_on(v) {
            current[[r, c]] = 1.0;
        }
    }

    for _ in 0..iterations {
        let mut next = current.clone();
        for r in 0..rows {
            for c in 0..cols {
                if is_on(current[[r, c]]) {
                    continue;
                }
                for &(dr, dc) in &NEIGHBORS_8 {
                    let nr = r as isize + dr;
                    let nc = c as isize + dc;
                    if nr >= 0
                        && nc >= 0
                        && (nr as usize) < rows
                        && (nc as usize) < cols
                        && is_on(current[[nr as usize, nc as usize]])
                    {
                        next[[r, c]] = 1.0;
                        break;
                    }
                }
            }
        }
        current = next;
    }
    current
}

/// Count of foreground cells in the 3x3 neighborhood including the
/// center cell itself (the reference reducer's circle-1.5 count).
/// Cells that are not foreground get count 0.
pub fn neighbor_count(mask: &Band) -> Array2<u8> {
    let (rows, cols) = mask.dim();
    let mut counts = Array2::<u8>::zeros((rows, cols));
    for r in 0..rows {
        for c in 0..cols {
            if !is_on(mask[[r, c]]) {
                continue;
            }
            let mut n = 1u8; // self
            for &(dr, dc) in &NEIGHBORS_8 {
                let nr = r as isize + dr;
                let nc = c as isize + dc;
                if nr >= 0
                    && nc >= 0
                    && (nr as usize) < rows
                    && (nc as usize) < cols
                    && is_on(mask[[nr as usize, nc as usize]])
                {
                    n += 1;
                }
            }
            counts[[r, c]] = n;
        }
    }
    counts
}

/// Label 8-connected components of cells equal to `target` (NaN never
/// matches). Returns per-cell labels (-1 where unlabeled) and the pixel
/// count of each component.
pub fn label_components(mask: &Band, target: f32) -> (Array2<i32>, Vec<usize>) {
    let (rows, cols) = mask.dim();
    let mut labels = Array2::<i32>::from_elem((rows, cols), -1);
    let mut sizes = Vec::new();
    let mut stack = Vec::new();

    for r in 0..rows {
        for c in 0..cols {
            if labels[[r, c]] >= 0 || mask[[r, c]] != target {
                continue;
            }
            let label = sizes.len() as i32;
            let mut size = 0usize;
            stack.push((r, c));
            labels[[r, c]] = label;
            while let Some((cr, cc)) = stack.pop() {
                size += 1;
                for &(dr, dc) in &NEIGHBORS_8 {
                    let nr = cr as isize + dr;
                    let nc = cc as isize + dc;
                    if nr < 0 || nc < 0 || nr as usize >= rows || nc as usize >= cols {
                        continue;
                    }
                    let (nr, nc) = (nr as usize, nc as usize);
                    if labels[[nr, nc]] < 0 && mask[[nr, nc]] == target {
                        labels[[nr, nc]] = label;
                        stack.push((nr, nc));
                    }
                }
            }
            sizes.push(size);
        }
    }
    (labels, sizes)
}

/// Grid cells crossed by the segment (r0,c0)-(r1,c1), endpoints included.
/// Cells may fall outside the raster; callers bound-check.
pub fn bresenham(r0: i64, c0: i64, r1: i64, c1: i64) -> Vec<(i64, i64)> {
    let mut cells = Vec::new();
    let dr = (r1 - r0).abs();
    let dc = (c1 - c0).abs();
    let sr = if r0 < r1 { 1 } else { -1 };
    let sc = if c0 < c1 { 1 } else { -1 };
    let mut err = dc - dr;
    let (mut r, mut c) = (r0, c0);
    loop {
        cells.push((r, c));
        if r == r1 && c == c1 {
            break;
        }
        let e2 = 2 * err;
        if e2 > -dr {
            err -= dr;
            c += sc;
        }
        if e2 < dc {
            err += dc;
            r += sr;
        }
    }
    cells
}

/// Every defined cell of a mask is exactly 0 or 1.
pub fn is_binary(mask: &Band) -> bool {
    mask.iter().all(|&v| v.is_nan() || v == 0.0 || v == 1.0)
}
