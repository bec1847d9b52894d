//! Quality-band decoding and terrain hill shadow.
//!
//! The packed quality band carries 1-bit fields: water (bit 2),
//! cloud shadow (bit 3), snow/ice (bit 4), and cloud (bit 5). Decoding is
//! a pure function of the raw integer; the combined categorical band
//! resolves multiple set bits by priority.

use crate::types::{Band, QaBand, RwError, RwResult, SceneMetadata};
use ndarray::Array2;

const BIT_WATER: u16 = 2;
const BIT_CLOUD_SHADOW: u16 = 3;
const BIT_SNOW_ICE: u16 = 4;
const BIT_CLOUD: u16 = 5;

/// Search radius of the hill-shadow ray march, in cells.
pub const HILL_SHADOW_RADIUS: usize = 100;

/// Categorical quality classes, highest priority first.
pub const FLAG_CLOUD: f32 = 4.0;
pub const FLAG_SNOW_ICE: f32 = 3.0;
pub const FLAG_CLOUD_SHADOW: f32 = 2.0;
pub const FLAG_WATER: f32 = 1.0;
pub const FLAG_CLEAR: f32 = 0.0;

/// Named per-pixel quality flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QaFlags {
    pub cloud: bool,
    pub cloud_shadow: bool,
    pub snow_ice: bool,
    pub water: bool,
}

/// Unpack the 1-bit quality fields from a raw packed value.
#[inline]
pub fn decode_qa(raw: u16) -> QaFlags {
    QaFlags {
        cloud: (raw >> BIT_CLOUD) & 1 == 1,
        cloud_shadow: (raw >> BIT_CLOUD_SHADOW) & 1 == 1,
        snow_ice: (raw >> BIT_SNOW_ICE) & 1 == 1,
        water: (raw >> BIT_WATER) & 1 == 1,
    }
}

/// Categorical value for one pixel: cloud > snow/ice > cloud shadow >
/// water > clear.
#[inline]
pub fn flag_value(flags: QaFlags) -> f32 {
    if flags.cloud {
        FLAG_CLOUD
    } else if flags.snow_ice {
        FLAG_SNOW_ICE
    } else if flags.cloud_shadow {
        FLAG_CLOUD_SHADOW
    } else if flags.water {
        FLAG_WATER
    } else {
        FLAG_CLEAR
    }
}

/// Combined categorical flag band; NaN where the quality band itself is
/// nodata.
pub fn flag_band(qa: &QaBand, qa_nodata: Option<u16>) -> Band {
    qa.mapv(|raw| match qa_nodata {
        Some(nd) if raw == nd => f32::NAN,
        _ => flag_value(decode_qa(raw)),
    })
}

/// Terrain hill shadow from sun geometry: 1 = in shadow, 0 = lit, NaN
/// where the terrain cell is undefined.
///
/// A cell is shadowed when any terrain sample along the ray toward the
/// sun, within the search radius, rises above the line of sight at the
/// sun's altitude (90 deg minus zenith).
pub fn hill_shadow(
    terrain: &Band,
    azimuth_deg: f64,
    zenith_deg: f64,
    radius: usize,
    resolution: f64,
) -> Band {
    let (rows, cols) = terrain.dim();
    let az = azimuth_deg.to_radians();
    let tan_alt = (90.0 - zenith_deg).to_radians().tan();
    // Unit step toward the sun in (row, col); row axis points south.
    let step_col = az.sin();
    let step_row = -az.cos();

    let compute_row = |r: usize| -> Vec<f32> {
        let mut out = vec![0.0f32; cols];
        for c in 0..cols {
            let elev = terrain[[r, c]];
            if elev.is_nan() {
                out[c] = f32::NAN;
                continue;
            }
            for d in 1..=radius {
                let rr = (r as f64 + d as f64 * step_row).round();
                let cc = (c as f64 + d as f64 * step_col).round();
                if rr < 0.0 || cc < 0.0 || rr >= rows as f64 || cc >= cols as f64 {
                    break;
                }
                let sample = terrain[[rr as usize, cc as usize]];
                if sample.is_nan() {
                    continue;
                }
                let sight_line = elev as f64 + d as f64 * resolution * tan_alt;
                if sample as f64 > sight_line {
                    out[c] = 1.0;
                    break;
                }
            }
        }
        out
    };

    #[cfg(feature = "parallel")]
    let shadow_rows: Vec<Vec<f32>> = {
        use rayon::prelude::*;
        (0..rows).into_par_iter().map(compute_row).collect()
    };
    #[cfg(not(feature = "parallel"))]
    let shadow_rows: Vec<Vec<f32>> = (0..rows).map(compute_row).collect();

    let mut band = Array2::<f32>::zeros((rows, cols));
    for (r, row_vals) in shadow_rows.into_iter().enumerate() {
        for (c, v) in row_vals.into_iter().enumerate() {
            band[[r, c]] = v;
        }
    }
    band
}

/// Hill shadow for a scene, pulling sun geometry from its metadata.
/// Fails with `MissingMetadata` when the solar angles are absent.
pub fn hill_shadow_for_scene(metadata: &SceneMetadata, terrain: &Band) -> RwResult<Band> {
    let azimuth = metadata.solar_azimuth.ok_or_else(|| {
        RwError::MissingMetadata(format!("scene {} has no solar azimuth", metadata.scene_id))
    })?;
    let zenith = metadata.solar_zenith.ok_or_else(|| {
        RwError::MissingMetadata(format!("scene {} has no solar zenith", metadata.scene_id))
    })?;

    log::debug!(
        "Hill shadow: azimuth {:.2} deg, zenith {:.2} deg, radius {} cells",
        azimuth,
        zenith,
        HILL_SHADOW_RADIUS
    );

    Ok(hill_shadow(
        terrain,
        azimuth,
        zenith,
        HILL_SHADOW_RADIUS,
        metadata.nominal_resolution,
    ))
}
