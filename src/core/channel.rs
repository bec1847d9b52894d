//! River channel extraction from the water mask.
//!
//! Water pixels are kept only when connected to the reference centerline
//! through water within a distance budget; small enclosed non-water
//! islands (sandbars, bridges) are then filled back in.

use crate::core::costmap::cost_distance;
use crate::core::mask::{bresenham, label_components};
use crate::core::water::WaterScene;
use crate::types::{Band, BoundingBox, CenterlineSet, GeoTransform};
use ndarray::Array2;

/// River bundle: the classified scene plus channel connectivity masks.
/// `river_mask` (post island fill) is the band used downstream.
#[derive(Debug, Clone)]
pub struct RiverScene {
    pub water: WaterScene,
    pub channel_mask: Band,
    pub river_mask: Band,
}

/// Clip a segment to a bounding box (Liang-Barsky).
fn clip_segment(
    p0: (f64, f64),
    p1: (f64, f64),
    bbox: &BoundingBox,
) -> Option<((f64, f64), (f64, f64))> {
    let (x0, y0) = p0;
    let dx = p1.0 - x0;
    let dy = p1.1 - y0;
    let mut t0 = 0.0f64;
    let mut t1 = 1.0f64;

    let checks = [
        (-dx, x0 - bbox.min_x),
        (dx, bbox.max_x - x0),
        (-dy, y0 - bbox.min_y),
        (dy, bbox.max_y - y0),
    ];
    for &(p, q) in &checks {
        if p == 0.0 {
            if q < 0.0 {
                return None; // parallel and outside
            }
        } else {
            let t = q / p;
            if p < 0.0 {
                if t > t1 {
                    return None;
                }
                t0 = t0.max(t);
            } else {
                if t < t0 {
                    return None;
                }
                t1 = t1.min(t);
            }
        }
    }
    Some((
        (x0 + t0 * dx, y0 + t0 * dy),
        (x0 + t1 * dx, y0 + t1 * dy),
    ))
}

/// Rasterize the reference centerline onto the scene grid, clipping each
/// segment to the extent first.
pub fn rasterize_centerline(
    centerlines: &CenterlineSet,
    transform: &GeoTransform,
    rows: usize,
    cols: usize,
) -> Array2<bool> {
    let bbox = transform.extent(rows, cols);
    let mut raster = Array2::from_elem((rows, cols), false);

    for line in &centerlines.lines {
        for pair in line.vertices.windows(2) {
            let Some((a, b)) = clip_segment(pair[0], pair[1], &bbox) else {
                continue;
            };
            let (r0, c0) = transform.map_to_pixel(a.0, a.1);
            let (r1, c1) = transform.map_to_pixel(b.0, b.1);
            for (r, c) in bresenham(r0, c0, r1, c1) {
                if r >= 0 && c >= 0 && (r as usize) < rows && (c as usize) < cols {
                    raster[[r as usize, c as usize]] = true;
                }
            }
        }
    }
    raster
}

/// Keep water pixels reachable from centerline seeds through water within
/// `max_distance` meters (grid steps of one cell). A scene with no seed
/// overlap yields an all-zero channel mask, not an error.
pub fn extract_channel(
    water_mask: &Band,
    centerline_raster: &Array2<bool>,
    max_distance: f64,
    resolution: f64,
) -> Band {
    let (rows, cols) = water_mask.dim();
    let mut passable = Array2::from_elem((rows, cols), false);
    let mut seeds = Vec::new();
    for r in 0..rows {
        for c in 0..cols {
            let wet = water_mask[[r, c]] == 1.0;
            passable[[r, c]] = wet;
            if wet && centerline_raster[[r, c]] {
                seeds.push((r, c));
            }
        }
    }
    log::debug!("Channel extraction: {} seed cells", seeds.len());

    let max_cells = (max_distance / resolution) as f32;
    let dist = cost_distance(&passable, &seeds, max_cells);

    let mut channel = Band::zeros((rows, cols));
    for r in 0..rows {
        for c in 0..cols {
            let w = water_mask[[r, c]];
            channel[[r, c]] = if w.is_nan() {
                f32::NAN
            } else if w == 1.0 && !dist[[r, c]].is_nan() {
                1.0
            } else {
                0.0
            };
        }
    }
    channel
}

/// Fill non-channel components strictly smaller than `fill_size` pixels.
/// Components of exactly `fill_size` pixels are left as land.
pub fn remove_islands(channel: &Band, fill_size: usize) -> Band {
    let (labels, sizes) = label_components(channel, 0.0);
    let mut river = channel.clone();
    let mut filled = 0usize;
    for ((r, c), label) in labels.indexed_iter() {
        if *label >= 0 && sizes[*label as usize] < fill_size {
            river[[r, c]] = 1.0;
            filled += 1;
        }
    }
    log::debug!("Island fill: reclassified {} cells", filled);
    river
}

/// Run channel extraction and island fill for a classified scene.
pub fn extract_river(
    water: WaterScene,
    centerlines: &CenterlineSet,
    max_distance: f64,
    fill_size: usize,
) -> RiverScene {
    log::info!("Extracting river mask for scene {}", water.metadata.scene_id);
    let (rows, cols) = water.water_mask.dim();
    let cl_raster =
        rasterize_centerline(centerlines, &water.metadata.geo_transform, rows, cols);
    let channel_mask = extract_channel(
        &water.water_mask,
        &cl_raster,
        max_distance,
        water.metadata.nominal_resolution,
    );
    let river_mask = remove_islands(&channel_mask, fill_size);
    RiverScene { water, channel_mask, river_mask }
}
