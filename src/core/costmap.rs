//! Bounded multi-source cost-distance propagation.
//!
//! Both the channel-connectivity flood fill and the centerline branch
//! pruning are wavefront expansions over the grid's 8-neighborhood graph
//! with uniform edge weight of one grid cell. Implemented as multi-source
//! Dijkstra with a distance cutoff; ties on equal distance cannot affect
//! which cells are marked reachable, so results are deterministic
//! regardless of heap pop order.

use ndarray::Array2;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

use super::mask::NEIGHBORS_8;

/// State in the priority queue (min-heap via reversed ordering).
#[derive(Debug, Clone, PartialEq)]
struct State {
    dist: f32,
    row: usize,
    col: usize,
}

impl Eq for State {}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap; row/col keep pops fully ordered
        other
            .dist
            .partial_cmp(&self.dist)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.row.cmp(&self.row))
            .then_with(|| other.col.cmp(&self.col))
    }
}

/// Accumulated grid distance (in cells, uniform step weight 1) from the
/// nearest seed, expanding only across `passable` cells. Cells beyond
/// `max_distance`, impassable cells, and unreachable cells are NaN.
/// Seeds on impassable cells are ignored.
pub fn cost_distance(
    passable: &Array2<bool>,
    seeds: &[(usize, usize)],
    max_distance: f32,
) -> Array2<f32> {
    let (rows, cols) = passable.dim();
    let mut dist = Array2::<f32>::from_elem((rows, cols), f32::INFINITY);
    let mut heap = BinaryHeap::new();

    for &(r, c) in seeds {
        if r < rows && c < cols && passable[[r, c]] {
            dist[[r, c]] = 0.0;
            heap.push(State { dist: 0.0, row: r, col: c });
        }
    }

    while let Some(State { dist: d, row, col }) = heap.pop() {
        if d > dist[[row, col]] {
            continue; // stale entry
        }
        for &(dr, dc) in &NEIGHBORS_8 {
            let nr = row as isize + dr;
            let nc = col as isize + dc;
            if nr < 0 || nc < 0 || nr as usize >= rows || nc as usize >= cols {
                continue;
            }
            let (nr, nc) = (nr as usize, nc as usize);
            if !passable[[nr, nc]] {
                continue;
            }
            let nd = d + 1.0;
            if nd <= max_distance && nd < dist[[nr, nc]] {
                dist[[nr, nc]] = nd;
                heap.push(State { dist: nd, row: nr, col: nc });
            }
        }
    }

    dist.mapv_inplace(|v| if v.is_infinite() { f32::NAN } else { v });
    dist
}
