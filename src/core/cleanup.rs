//! Centerline cleanup: spur pruning, corner smoothing and endpoint
//! trimming of the thinned skeleton.

use crate::core::costmap::cost_distance;
use crate::core::mask::{label_components, neighbor_count, NEIGHBORS_8};
use crate::types::Band;
use ndarray::Array2;

type Template = [[u8; 3]; 3];

/// After thinning, line ends have at most one neighbor and junctions
/// have three or more (counts include the cell itself).
const END_COUNT: u8 = 2;
const JOINT_COUNT: u8 = 4;

const ENDPOINT: Template = [[0, 0, 0], [2, 1, 2], [2, 2, 2]];
const CORNER: Template = [[2, 2, 0], [2, 1, 1], [0, 1, 0]];

/// Skeleton cleanup parameters, in pixels.
#[derive(Debug, Clone, Copy)]
pub struct CleanupParams {
    /// Branches whose walk from a free end stays strictly under this
    /// many steps before hitting a junction are removed.
    pub max_branch_length: f32,
    pub remove_corners: bool,
    pub strip_endpoints: bool,
}

fn rotate_cw(t: &Template) -> Template {
    let mut out = [[0u8; 3]; 3];
    for r in 0..3 {
        for c in 0..3 {
            out[r][c] = t[2 - c][r];
        }
    }
    out
}

fn matches(mask: &Band, template: &Template, r: isize, c: isize) -> bool {
    let (rows, cols) = mask.dim();
    for i in 0..3isize {
        for j in 0..3isize {
            let want = template[i as usize][j as usize];
            if want == 0 {
                continue;
            }
            let (rr, cc) = (r + i - 1, c + j - 1);
            let v = if rr < 0 || cc < 0 || rr >= rows as isize || cc >= cols as isize {
                0.0
            } else {
                mask[[rr as usize, cc as usize]]
            };
            let ok = if want == 1 { v == 1.0 } else { v == 0.0 };
            if !ok {
                return false;
            }
        }
    }
    true
}

/// Remove side branches shorter than `max_branch_length`.
///
/// Walks outward from every free end through non-junction skeleton cells.
/// A walked component is dropped only when it actually ends at a junction
/// and its farthest cell is strictly under the budget; free-standing lines
/// with no junction are never touched.
pub fn prune_branches(skeleton: &Band, max_branch_length: f32) -> Band {
    let (rows, cols) = skeleton.dim();
    let counts = neighbor_count(skeleton);

    let mut joint = Array2::from_elem((rows, cols), false);
    let mut passable = Array2::from_elem((rows, cols), false);
    let mut ends = Vec::new();
    for r in 0..rows {
        for c in 0..cols {
            if skeleton[[r, c]] != 1.0 {
                continue;
            }
            let n = counts[[r, c]];
            if n >= JOINT_COUNT {
                joint[[r, c]] = true;
            } else {
                passable[[r, c]] = true;
                if n <= END_COUNT {
                    ends.push((r, c));
                }
            }
        }
    }
    if ends.is_empty() {
        return skeleton.clone();
    }

    let dist = cost_distance(&passable, &ends, max_branch_length);
    let mut reached = Band::zeros((rows, cols));
    for ((r, c), d) in dist.indexed_iter() {
        if !d.is_nan() {
            reached[[r, c]] = 1.0;
        }
    }

    let (labels, n_components) = {
        let (labels, sizes) = label_components(&reached, 1.0);
        (labels, sizes.len())
    };
    let mut touches_joint = vec![false; n_components];
    let mut max_dist = vec![0.0f32; n_components];
    for r in 0..rows {
        for c in 0..cols {
            let label = labels[[r, c]];
            if label < 0 {
                continue;
            }
            let label = label as usize;
            max_dist[label] = max_dist[label].max(dist[[r, c]]);
            for &(dr, dc) in &NEIGHBORS_8 {
                let (rr, cc) = (r as isize + dr, c as isize + dc);
                if rr >= 0
                    && cc >= 0
                    && (rr as usize) < rows
                    && (cc as usize) < cols
                    && joint[[rr as usize, cc as usize]]
                {
                    touches_joint[label] = true;
                }
            }
        }
    }

    let mut out = skeleton.clone();
    for ((r, c), label) in labels.indexed_iter() {
        if *label >= 0 {
            let label = *label as usize;
            if touches_joint[label] && max_dist[label] < max_branch_length {
                out[[r, c]] = 0.0;
            }
        }
    }
    out
}

/// Shave one cell off every free line end. All four rotations are
/// matched against the same snapshot so each end loses exactly one cell.
pub fn strip_endpoints(skeleton: &Band) -> Band {
    let (rows, cols) = skeleton.dim();
    let mut templates = [ENDPOINT; 4];
    for i in 1..4 {
        templates[i] = rotate_cw(&templates[i - 1]);
    }

    let mut out = skeleton.clone();
    for r in 0..rows as isize {
        for c in 0..cols as isize {
            if skeleton[[r as usize, c as usize]] == 1.0
                && templates.iter().any(|t| matches(skeleton, t, r, c))
            {
                out[[r as usize, c as usize]] = 0.0;
            }
        }
    }
    out
}

/// Knock off stair-step corners. Rotations are applied in sequence, each
/// against the mask as left by the previous one.
pub fn remove_corners(skeleton: &Band) -> Band {
    let mut out = skeleton.clone();
    let mut template = CORNER;
    for _ in 0..4 {
        let snapshot = out.clone();
        let (rows, cols) = out.dim();
        for r in 0..rows as isize {
            for c in 0..cols as isize {
                if snapshot[[r as usize, c as usize]] == 1.0
                    && matches(&snapshot, &template, r, c)
                {
                    out[[r as usize, c as usize]] = 0.0;
                }
            }
        }
        template = rotate_cw(&template);
    }
    out
}

/// One cleanup pass: pruning, then optional corner smoothing, then
/// optional endpoint trimming.
pub fn cleanup_pass(skeleton: &Band, params: &CleanupParams) -> Band {
    let mut out = prune_branches(skeleton, params.max_branch_length);
    if params.remove_corners {
        out = remove_corners(&out);
    }
    if params.strip_endpoints {
        out = strip_endpoints(&out);
    }
    out
}

/// Full cleanup: two pruning passes, with corner smoothing between them
/// and endpoint trimming at the very end.
pub fn clean_centerline(skeleton: &Band, max_branch_length: f32) -> Band {
    let first = cleanup_pass(
        skeleton,
        &CleanupParams {
            max_branch_length,
            remove_corners: true,
            strip_endpoints: false,
        },
    );
    cleanup_pass(
        &first,
        &CleanupParams {
            max_branch_length,
            remove_corners: false,
            strip_endpoints: true,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_with_spur(spur_len: usize) -> Band {
        // horizontal trunk on row 5 with a vertical spur rising from col 5
        let mut mask = Band::zeros((12, 12));
        for c in 0..12 {
            mask[[5, c]] = 1.0;
        }
        for i in 1..=spur_len {
            mask[[5 - i, 5]] = 1.0;
        }
        mask
    }

    fn count_on(mask: &Band) -> usize {
        mask.iter().filter(|&&v| v == 1.0).count()
    }

    #[test]
    fn short_spur_is_pruned() {
        let mask = line_with_spur(3);
        let pruned = prune_branches(&mask, 2.0);
        // the free part of the spur goes; the base cell sits inside the
        // junction neighborhood and is shaved off by the endpoint pass
        assert_eq!(pruned[[3, 5]], 0.0);
        assert_eq!(pruned[[2, 5]], 0.0);
        assert_eq!(pruned[[4, 5]], 1.0);
        for c in 0..12 {
            assert_eq!(pruned[[5, c]], 1.0, "trunk col {}", c);
        }
    }

    #[test]
    fn spur_at_budget_is_kept() {
        // spur of 4: walk distances 0..2 outside the junction, max 2.0
        let mask = line_with_spur(4);
        let pruned = prune_branches(&mask, 2.0);
        assert_eq!(count_on(&pruned), count_on(&mask));
    }

    #[test]
    fn spur_just_under_budget_is_pruned() {
        let mask = line_with_spur(4);
        let pruned = prune_branches(&mask, 3.0);
        assert_eq!(count_on(&pruned), count_on(&line_with_spur(1)));
    }

    #[test]
    fn junction_free_line_is_never_pruned() {
        let mut mask = Band::zeros((5, 8));
        for c in 1..7 {
            mask[[2, c]] = 1.0;
        }
        let pruned = prune_branches(&mask, 100.0);
        assert_eq!(pruned, mask);
    }

    #[test]
    fn endpoint_strip_takes_one_cell_per_end() {
        let mut mask = Band::zeros((5, 11));
        for c in 0..11 {
            mask[[2, c]] = 1.0;
        }
        let stripped = strip_endpoints(&mask);
        assert_eq!(stripped[[2, 0]], 0.0);
        assert_eq!(stripped[[2, 10]], 0.0);
        for c in 1..10 {
            assert_eq!(stripped[[2, c]], 1.0);
        }
    }

    #[test]
    fn corner_removal_cuts_stair_step() {
        // an L bend: horizontal run meeting a vertical run
        let mut mask = Band::zeros((7, 7));
        for c in 0..4 {
            mask[[3, c]] = 1.0;
        }
        for r in 4..7 {
            mask[[r, 3]] = 1.0;
        }
        let smoothed = remove_corners(&mask);
        assert_eq!(smoothed[[3, 3]], 0.0, "corner cell removed");
        assert_eq!(smoothed[[3, 2]], 1.0);
        assert_eq!(smoothed[[4, 3]], 1.0);
    }

    #[test]
    fn clean_trims_both_ends_once() {
        let mut mask = Band::zeros((5, 11));
        for c in 0..11 {
            mask[[2, c]] = 1.0;
        }
        let cleaned = clean_centerline(&mask, 5.0);
        assert_eq!(count_on(&cleaned), 9);
        for c in 1..10 {
            assert_eq!(cleaned[[2, c]], 1.0);
        }
    }
}
