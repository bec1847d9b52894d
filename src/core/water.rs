//! Spectral water classification.
//!
//! Two interchangeable procedures produce the binary water mask: the
//! five-test decision-code classifier (default) and the simpler
//! index-comparison classifier. Classified water is then suppressed under
//! cloud, cloud shadow, and snow/ice so that obscured cells count as
//! non-water rather than unknown.

use crate::core::quality::{self, FLAG_CLOUD, FLAG_CLOUD_SHADOW, FLAG_SNOW_ICE, FLAG_WATER};
use crate::types::{Band, RwError, RwResult, Scene, SceneMetadata};
use ndarray::Zip;
use serde::{Deserialize, Serialize};

/// Selectable water classification procedure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WaterMethod {
    /// Five-test decision-code classifier (default).
    Jones2019,
    /// Vegetation/water index comparison.
    Zou2018,
}

impl Default for WaterMethod {
    fn default() -> Self {
        WaterMethod::Jones2019
    }
}

/// Water-confidence categories of the decision-code classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DsweClass {
    NoWater,
    High,
    Moderate,
    PartialWetland,
    Low,
}

/// Normalized difference of two bands; NaN when the denominator is zero.
fn normalized_difference(a: &Band, b: &Band) -> Band {
    let mut out = Band::zeros(a.dim());
    Zip::from(&mut out).and(a).and(b).for_each(|o, &x, &y| {
        let denom = x + y;
        *o = if denom == 0.0 { f32::NAN } else { (x - y) / denom };
    });
    out
}

/// Modified normalized difference water index (green vs swir1).
pub fn mndwi(green: &Band, swir1: &Band) -> Band {
    normalized_difference(green, swir1)
}

/// Normalized difference vegetation index (nir vs red).
pub fn ndvi(nir: &Band, red: &Band) -> Band {
    normalized_difference(nir, red)
}

/// Multi-band spectral relationship, visible: green + red.
pub fn mbsrv(green: &Band, red: &Band) -> Band {
    green + red
}

/// Multi-band spectral relationship, near-infrared: nir + swir1.
pub fn mbsrn(nir: &Band, swir1: &Band) -> Band {
    nir + swir1
}

/// Automated water extent shadow index.
pub fn awesh(blue: &Band, green: &Band, mbsrn: &Band, swir2: &Band) -> Band {
    let mut out = Band::zeros(blue.dim());
    Zip::from(&mut out)
        .and(blue)
        .and(green)
        .and(mbsrn)
        .and(swir2)
        .for_each(|o, &b, &g, &m, &s2| {
            *o = b + 2.5 * g - 1.5 * m - 0.25 * s2;
        });
    out
}

/// Enhanced vegetation index.
pub fn evi(nir: &Band, red: &Band, blue: &Band) -> Band {
    let mut out = Band::zeros(nir.dim());
    Zip::from(&mut out)
        .and(nir)
        .and(red)
        .and(blue)
        .for_each(|o, &n, &r, &b| {
            let denom = 1.0 + n + 6.0 * r - 7.5 * b;
            *o = if denom == 0.0 { f32::NAN } else { 2.5 * (n - r) / denom };
        });
    out
}

/// Decision code from the five boolean tests, weighting test i by
/// 10^(i-1).
#[inline]
pub(crate) fn dswe_code(t1: bool, t2: bool, t3: bool, t4: bool, t5: bool) -> u32 {
    t1 as u32 + 10 * t2 as u32 + 100 * t3 as u32 + 1000 * t4 as u32 + 10000 * t5 as u32
}

/// Category of a decision code. The enumerated sets are pairwise disjoint
/// and cover all 32 codes; anything else is None.
pub(crate) fn dswe_class(code: u32) -> Option<DsweClass> {
    match code {
        0 | 1 | 10 | 100 | 1000 => Some(DsweClass::NoWater),
        1111 | 10111 | 11011 | 11101 | 11110 | 11111 => Some(DsweClass::High),
        111 | 1011 | 1101 | 1110 | 10011 | 10101 | 10110 | 11001 | 11010 | 11100 => {
            Some(DsweClass::Moderate)
        }
        11000 => Some(DsweClass::PartialWetland),
        11 | 101 | 110 | 1001 | 1010 | 1100 | 10000 | 10001 | 10010 | 10100 => {
            Some(DsweClass::Low)
        }
        _ => None,
    }
}

/// Five-test decision-code water mask. High and moderate confidence map
/// to water; partial wetland and low confidence do not.
fn classify_jones2019(scene: &Scene) -> Band {
    let b = &scene.bands;
    let mndwi = mndwi(&b.green, &b.swir1);
    let ndvi = ndvi(&b.nir, &b.red);
    let mbsrv = mbsrv(&b.green, &b.red);
    let mbsrn = mbsrn(&b.nir, &b.swir1);
    let awesh = awesh(&b.blue, &b.green, &mbsrn, &b.swir2);

    let mut water = Band::zeros(b.green.dim());
    let (rows, cols) = b.green.dim();
    for r in 0..rows {
        for c in 0..cols {
            let (blue, nir) = (b.blue[[r, c]], b.nir[[r, c]]);
            let (swir1, swir2) = (b.swir1[[r, c]], b.swir2[[r, c]]);
            let (mndwi_v, ndvi_v) = (mndwi[[r, c]], ndvi[[r, c]]);
            let (mbsrv_v, mbsrn_v, awesh_v) = (mbsrv[[r, c]], mbsrn[[r, c]], awesh[[r, c]]);
            let inputs = [blue, nir, swir1, swir2, mndwi_v, ndvi_v, mbsrv_v, mbsrn_v, awesh_v];
            if inputs.iter().any(|v| v.is_nan()) {
                water[[r, c]] = f32::NAN;
                continue;
            }
            let t1 = mndwi_v > 0.124;
            let t2 = mbsrv_v > mbsrn_v;
            let t3 = awesh_v > 0.0;
            let t4 = mndwi_v > -0.44 && swir1 < 900.0 && nir < 1500.0 && ndvi_v < 0.7;
            let t5 = mndwi_v > -0.5
                && blue < 1000.0
                && swir1 < 3000.0
                && swir2 < 1000.0
                && nir < 2500.0;
            let code = dswe_code(t1, t2, t3, t4, t5);
            let is_water = matches!(
                dswe_class(code),
                Some(DsweClass::High) | Some(DsweClass::Moderate)
            );
            water[[r, c]] = if is_water { 1.0 } else { 0.0 };
        }
    }
    water
}

/// Index-comparison water mask: water where the water index exceeds
/// either vegetation index and the enhanced index stays below 0.1.
fn classify_zou2018(scene: &Scene) -> Band {
    let b = &scene.bands;
    let mndwi = mndwi(&b.green, &b.swir1);
    let ndvi = ndvi(&b.nir, &b.red);
    let evi = evi(&b.nir, &b.red, &b.blue);

    let mut water = Band::zeros(b.green.dim());
    Zip::from(&mut water)
        .and(&mndwi)
        .and(&ndvi)
        .and(&evi)
        .for_each(|w, &m, &n, &e| {
            *w = if m.is_nan() || n.is_nan() || e.is_nan() {
                f32::NAN
            } else if (m > n || m > e) && e < 0.1 {
                1.0
            } else {
                0.0
            };
        });
    water
}

/// Classify water with the selected procedure, before flag suppression.
pub fn classify_water(scene: &Scene, method: WaterMethod) -> Band {
    log::debug!("Classifying water with {:?}", method);
    match method {
        WaterMethod::Jones2019 => classify_jones2019(scene),
        WaterMethod::Zou2018 => classify_zou2018(scene),
    }
}

/// Classified scene bundle: the water mask, the categorical quality
/// flag band, its unpacked 0/1 flag bands, the hill-shadow band, and the
/// terrain pass-through, with scene metadata carried forward.
#[derive(Debug, Clone)]
pub struct WaterScene {
    pub metadata: SceneMetadata,
    pub water_mask: Band,
    pub flag: Band,
    pub flag_cloud: Band,
    pub flag_cloud_shadow: Band,
    pub flag_snow_ice: Band,
    pub flag_water: Band,
    pub flag_hill_shadow: Band,
    pub elevation: Band,
    pub lon: Option<Band>,
    pub lat: Option<Band>,
}

fn flag_equals(flag: &Band, value: f32) -> Band {
    flag.mapv(|v| if v.is_nan() { f32::NAN } else { (v == value) as u8 as f32 })
}

/// Run quality decoding and water classification for a scene.
///
/// The water mask is forced to 0 wherever the categorical flag marks
/// cloud shadow, snow/ice, or cloud (flag >= 2) -- a conservative bias
/// rather than a mask-out.
pub fn classify_scene(scene: &Scene, terrain: &Band, method: WaterMethod) -> RwResult<WaterScene> {
    log::info!(
        "Classifying scene {} ({:?})",
        scene.metadata.scene_id,
        method
    );
    scene.validate()?;
    if terrain.dim() != scene.shape() {
        return Err(RwError::InvalidFormat(format!(
            "terrain raster is {}x{} but the scene is {}x{}",
            terrain.dim().0,
            terrain.dim().1,
            scene.shape().0,
            scene.shape().1
        )));
    }

    let flag = quality::flag_band(&scene.bands.qa, scene.bands.qa_nodata);
    let flag_hill_shadow = quality::hill_shadow_for_scene(&scene.metadata, terrain)?;

    let mut water = classify_water(scene, method);
    Zip::from(&mut water).and(&flag).for_each(|w, &f| {
        if !f.is_nan() && f >= FLAG_CLOUD_SHADOW {
            *w = 0.0;
        }
    });

    Ok(WaterScene {
        metadata: scene.metadata.clone(),
        flag_cloud: flag_equals(&flag, FLAG_CLOUD),
        flag_cloud_shadow: flag_equals(&flag, FLAG_CLOUD_SHADOW),
        flag_snow_ice: flag_equals(&flag, FLAG_SNOW_ICE),
        flag_water: flag_equals(&flag, FLAG_WATER),
        flag,
        flag_hill_shadow,
        elevation: terrain.clone(),
        lon: scene.bands.lon.clone(),
        lat: scene.bands.lat.clone(),
        water_mask: water,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::mask::is_binary;
    use crate::types::{CoordinateSystem, GeoTransform, QaBand, SceneBands};
    use ndarray::Array2;

    fn scene_with(fill: impl Fn(&mut SceneBands)) -> Scene {
        let dim = (2, 2);
        let mut bands = SceneBands {
            blue: Array2::zeros(dim),
            green: Array2::zeros(dim),
            red: Array2::zeros(dim),
            nir: Array2::zeros(dim),
            swir1: Array2::zeros(dim),
            swir2: Array2::zeros(dim),
            qa: QaBand::zeros(dim),
            qa_nodata: None,
            lon: None,
            lat: None,
        };
        fill(&mut bands);
        Scene {
            metadata: SceneMetadata {
                scene_id: "unit".to_string(),
                timestamp: chrono::Utc::now(),
                coordinate_system: CoordinateSystem::Projected { epsg: 32617 },
                geo_transform: GeoTransform {
                    origin_x: 0.0,
                    origin_y: 0.0,
                    pixel_width: 30.0,
                    pixel_height: -30.0,
                },
                nominal_resolution: 30.0,
                solar_azimuth: Some(140.0),
                solar_zenith: Some(40.0),
            },
            bands,
        }
    }

    /// Clear deep water: strong green, dark swir/nir.
    fn water_bands(b: &mut SceneBands) {
        b.blue.fill(300.0);
        b.green.fill(500.0);
        b.red.fill(200.0);
        b.nir.fill(100.0);
        b.swir1.fill(50.0);
        b.swir2.fill(30.0);
    }

    #[test]
    fn code_categories_cover_all_32_codes_disjointly() {
        let mut seen = 0;
        for bits in 0u32..32 {
            let code = dswe_code(
                bits & 1 != 0,
                bits & 2 != 0,
                bits & 4 != 0,
                bits & 8 != 0,
                bits & 16 != 0,
            );
            assert!(
                dswe_class(code).is_some(),
                "code {} has no category",
                code
            );
            seen += 1;
        }
        assert_eq!(seen, 32);
    }

    #[test]
    fn jones_flags_deep_water() {
        let scene = scene_with(water_bands);
        let water = classify_water(&scene, WaterMethod::Jones2019);
        assert!(water.iter().all(|&v| v == 1.0));
        assert!(is_binary(&water));
    }

    #[test]
    fn zou_flags_deep_water_and_rejects_vegetation() {
        // dark blue keeps the enhanced-index denominator positive, so
        // the index goes negative over water
        let scene = scene_with(|b| {
            water_bands(b);
            b.blue.fill(50.0);
        });
        let water = classify_water(&scene, WaterMethod::Zou2018);
        assert!(water.iter().all(|&v| v == 1.0));

        let veg = scene_with(|b| {
            b.blue.fill(300.0);
            b.green.fill(500.0);
            b.red.fill(400.0);
            b.nir.fill(3000.0);
            b.swir1.fill(1500.0);
            b.swir2.fill(800.0);
        });
        let water = classify_water(&veg, WaterMethod::Zou2018);
        assert!(water.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn zero_denominator_is_invalid_not_zero() {
        let scene = scene_with(|b| {
            water_bands(b);
            b.green[[0, 0]] = 100.0;
            b.swir1[[0, 0]] = -100.0; // mndwi denominator 0
        });
        let water = classify_water(&scene, WaterMethod::Jones2019);
        assert!(water[[0, 0]].is_nan());
        assert_eq!(water[[1, 1]], 1.0);
    }

    #[test]
    fn cloud_suppresses_water_to_zero() {
        let scene = scene_with(|b| {
            water_bands(b);
            b.qa[[0, 0]] = 1 << 5; // cloud
            b.qa[[0, 1]] = 1 << 4; // snow/ice
            b.qa[[1, 0]] = 1 << 3; // cloud shadow
        });
        let terrain = Array2::<f32>::zeros((2, 2));
        let ws = classify_scene(&scene, &terrain, WaterMethod::Jones2019).unwrap();
        assert_eq!(ws.water_mask[[0, 0]], 0.0);
        assert_eq!(ws.water_mask[[0, 1]], 0.0);
        assert_eq!(ws.water_mask[[1, 0]], 0.0);
        assert_eq!(ws.water_mask[[1, 1]], 1.0);
        assert_eq!(ws.flag_cloud[[0, 0]], 1.0);
        assert_eq!(ws.flag_snow_ice[[0, 1]], 1.0);
    }

    #[test]
    fn terrain_shape_mismatch_is_rejected() {
        let scene = scene_with(water_bands);
        let terrain = Array2::<f32>::zeros((1, 1));
        match classify_scene(&scene, &terrain, WaterMethod::Jones2019) {
            Err(crate::types::RwError::InvalidFormat(msg)) => {
                assert!(msg.contains("terrain"), "unexpected message: {}", msg);
            }
            other => panic!("expected a format error, got {:?}", other.map(|_| ())),
        }
    }
}
