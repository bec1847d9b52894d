//! End-to-end river width extraction.
//!
//! Wires the stages together: water classification, channel
//! connectivity, distance and gradient fields, thinning, centerline
//! cleanup, orthogonal angles and transect measurement. Each stage is
//! also reachable on its own through the stage modules.

use crate::core::angle::orthogonal_angles;
use crate::core::channel::extract_river;
use crate::core::cleanup::clean_centerline;
use crate::core::distance::distance_field;
use crate::core::gradient::{gradient_magnitude, GradientMethod};
use crate::core::skeleton::{ridge_candidates, thin, ThinningMethod};
use crate::core::water::{classify_scene, WaterMethod};
use crate::core::width::measure_widths;
use crate::types::{
    Band, BoundingBox, CenterlineSet, CrossSection, RwError, RwResult, Scene,
};
use ndarray::s;
use serde::{Deserialize, Serialize};

/// Tunables for the extraction pipeline. Distances are meters unless
/// noted; pixel-valued fields follow the raster grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiverWidthConfig {
    pub water_method: WaterMethod,
    /// How far from the reference centerline connected water is still
    /// considered channel, in meters.
    pub max_channel_search_distance: f64,
    /// Non-water islands strictly smaller than this many pixels are
    /// absorbed into the river.
    pub island_fill_threshold: usize,
    /// Branch pruning budget in pixels, applied in both cleanup passes.
    pub max_branch_prune_distance: f32,
    pub gradient_method: GradientMethod,
    /// Ridge acceptance ceiling on the gradient magnitude.
    pub gradient_threshold: f32,
    /// Distance field evaluation limit in pixels.
    pub distance_cutoff: f32,
    pub thinning_method: ThinningMethod,
    pub thinning_iterations: usize,
    /// Optional processing window in map units.
    pub aoi: Option<BoundingBox>,
}

impl Default for RiverWidthConfig {
    fn default() -> Self {
        RiverWidthConfig {
            water_method: WaterMethod::default(),
            max_channel_search_distance: 4000.0,
            island_fill_threshold: 333,
            max_branch_prune_distance: 500.0,
            gradient_method: GradientMethod::default(),
            gradient_threshold: 0.9,
            distance_cutoff: 256.0,
            thinning_method: ThinningMethod::default(),
            thinning_iterations: 2,
            aoi: None,
        }
    }
}

impl RiverWidthConfig {
    pub fn validate(&self) -> RwResult<()> {
        fn positive(name: &str, v: f64) -> RwResult<()> {
            if v > 0.0 {
                Ok(())
            } else {
                Err(RwError::InvalidConfiguration(format!(
                    "{} must be positive, got {}",
                    name, v
                )))
            }
        }
        positive(
            "max_channel_search_distance",
            self.max_channel_search_distance,
        )?;
        positive("island_fill_threshold", self.island_fill_threshold as f64)?;
        positive(
            "max_branch_prune_distance",
            self.max_branch_prune_distance as f64,
        )?;
        positive("gradient_threshold", self.gradient_threshold as f64)?;
        positive("distance_cutoff", self.distance_cutoff as f64)?;
        positive("thinning_iterations", self.thinning_iterations as f64)?;
        Ok(())
    }
}

fn crop_band(band: &Band, r0: usize, r1: usize, c0: usize, c1: usize) -> Band {
    band.slice(s![r0..r1, c0..c1]).to_owned()
}

/// Restrict a scene and its terrain model to the configured window.
/// Returns None when the window misses the scene entirely.
fn crop_to_aoi(scene: &Scene, terrain: &Band, aoi: &BoundingBox) -> Option<(Scene, Band)> {
    let (rows, cols) = scene.shape();
    let gt = &scene.metadata.geo_transform;
    let window = gt.extent(rows, cols).intersection(aoi)?;

    // corner pixels of the window, clamped to the grid
    let (ra, ca) = gt.map_to_pixel(window.min_x, window.min_y);
    let (rb, cb) = gt.map_to_pixel(window.max_x, window.max_y);
    let r0 = ra.min(rb).clamp(0, rows as i64 - 1) as usize;
    let r1 = (ra.max(rb).clamp(0, rows as i64 - 1) as usize) + 1;
    let c0 = ca.min(cb).clamp(0, cols as i64 - 1) as usize;
    let c1 = (ca.max(cb).clamp(0, cols as i64 - 1) as usize) + 1;
    if r1 <= r0 || c1 <= c0 {
        return None;
    }

    let b = &scene.bands;
    let mut metadata = scene.metadata.clone();
    metadata.geo_transform.origin_x += c0 as f64 * gt.pixel_width;
    metadata.geo_transform.origin_y += r0 as f64 * gt.pixel_height;

    let bands = crate::types::SceneBands {
        blue: crop_band(&b.blue, r0, r1, c0, c1),
        green: crop_band(&b.green, r0, r1, c0, c1),
        red: crop_band(&b.red, r0, r1, c0, c1),
        nir: crop_band(&b.nir, r0, r1, c0, c1),
        swir1: crop_band(&b.swir1, r0, r1, c0, c1),
        swir2: crop_band(&b.swir2, r0, r1, c0, c1),
        qa: b.qa.slice(s![r0..r1, c0..c1]).to_owned(),
        qa_nodata: b.qa_nodata,
        lon: b.lon.as_ref().map(|l| crop_band(l, r0, r1, c0, c1)),
        lat: b.lat.as_ref().map(|l| crop_band(l, r0, r1, c0, c1)),
    };
    let cropped_terrain = crop_band(terrain, r0, r1, c0, c1);
    Some((Scene { metadata, bands }, cropped_terrain))
}

/// Run the full pipeline on one scene.
///
/// Degenerate inputs that simply contain no measurable river (empty
/// centerline overlap, window outside the scene) produce an empty
/// result rather than an error.
pub fn extract_widths(
    scene: &Scene,
    terrain: &Band,
    centerlines: &CenterlineSet,
    config: &RiverWidthConfig,
) -> RwResult<Vec<CrossSection>> {
    config.validate()?;
    if terrain.dim() != scene.shape() {
        return Err(RwError::InvalidFormat(format!(
            "terrain raster is {}x{} but the scene is {}x{}",
            terrain.dim().0,
            terrain.dim().1,
            scene.shape().0,
            scene.shape().1
        )));
    }

    let cropped;
    let (scene, terrain) = match &config.aoi {
        Some(aoi) => match crop_to_aoi(scene, terrain, aoi) {
            Some(pair) => {
                cropped = pair;
                (&cropped.0, &cropped.1)
            }
            None => {
                log::warn!(
                    "Window misses scene {}, nothing to measure",
                    scene.metadata.scene_id
                );
                return Ok(Vec::new());
            }
        },
        None => (scene, terrain),
    };

    let resolution = scene.metadata.nominal_resolution;

    let water = classify_scene(scene, terrain, config.water_method)?;
    let river = extract_river(
        water,
        centerlines,
        config.max_channel_search_distance,
        config.island_fill_threshold,
    );

    log::info!("Building distance and gradient fields");
    let distance = distance_field(&river.river_mask, config.distance_cutoff, resolution);
    let gradient = gradient_magnitude(&distance, config.gradient_method, resolution);

    log::info!("Thinning and cleaning the centerline");
    let ridge = ridge_candidates(&river.river_mask, &gradient, config.gradient_threshold);
    let skeleton = thin(&ridge, config.thinning_iterations, config.thinning_method);
    let cleaned = clean_centerline(&skeleton, config.max_branch_prune_distance);

    let angles = orthogonal_angles(&cleaned);
    Ok(measure_widths(&river, &cleaned, &angles, &distance))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(RiverWidthConfig::default().validate().is_ok());
    }

    #[test]
    fn non_positive_values_are_rejected() {
        let mut config = RiverWidthConfig::default();
        config.gradient_threshold = 0.0;
        assert!(matches!(
            config.validate(),
            Err(RwError::InvalidConfiguration(_))
        ));

        let mut config = RiverWidthConfig::default();
        config.max_channel_search_distance = -1.0;
        assert!(config.validate().is_err());

        let mut config = RiverWidthConfig::default();
        config.thinning_iterations = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_survives_serde_round_trip() {
        let config = RiverWidthConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: RiverWidthConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.island_fill_threshold, config.island_fill_threshold);
        assert_eq!(back.gradient_method, config.gradient_method);
    }
}
