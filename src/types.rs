use chrono::{DateTime, Utc};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Real-valued raster band (row x col). NaN marks an invalid cell.
pub type Band = Array2<f32>;

/// Packed integer quality band.
pub type QaBand = Array2<u16>;

/// Coordinate system enumeration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CoordinateSystem {
    /// Geographic coordinates (longitude, latitude)
    Geographic,
    /// Projected coordinates (e.g., UTM)
    Projected { epsg: u32 },
}

/// Geospatial transformation parameters (pixel -> map units).
///
/// Map x = origin_x + (col + 0.5) * pixel_width for a pixel center;
/// map y = origin_y + (row + 0.5) * pixel_height (pixel_height is
/// negative for north-up rasters).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    pub origin_x: f64,
    pub origin_y: f64,
    pub pixel_width: f64,
    pub pixel_height: f64,
}

impl GeoTransform {
    /// Map coordinates of a pixel center.
    pub fn pixel_center(&self, row: usize, col: usize) -> (f64, f64) {
        (
            self.origin_x + (col as f64 + 0.5) * self.pixel_width,
            self.origin_y + (row as f64 + 0.5) * self.pixel_height,
        )
    }

    /// Pixel indices containing a map coordinate. May fall outside the
    /// raster; callers bound-check against the grid shape.
    pub fn map_to_pixel(&self, x: f64, y: f64) -> (i64, i64) {
        (
            ((y - self.origin_y) / self.pixel_height).floor() as i64,
            ((x - self.origin_x) / self.pixel_width).floor() as i64,
        )
    }

    /// Bounding box of a rows x cols grid in map units.
    pub fn extent(&self, rows: usize, cols: usize) -> BoundingBox {
        let x0 = self.origin_x;
        let x1 = self.origin_x + cols as f64 * self.pixel_width;
        let y0 = self.origin_y;
        let y1 = self.origin_y + rows as f64 * self.pixel_height;
        BoundingBox {
            min_x: x0.min(x1),
            max_x: x0.max(x1),
            min_y: y0.min(y1),
            max_y: y0.max(y1),
        }
    }
}

/// Axis-aligned bounding box in map units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl BoundingBox {
    pub fn intersection(&self, other: &BoundingBox) -> Option<BoundingBox> {
        let min_x = self.min_x.max(other.min_x);
        let max_x = self.max_x.min(other.max_x);
        let min_y = self.min_y.max(other.min_y);
        let max_y = self.max_y.min(other.max_y);
        if min_x < max_x && min_y < max_y {
            Some(BoundingBox { min_x, max_x, min_y, max_y })
        } else {
            None
        }
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }
}

/// Scalar metadata attached to a scene.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneMetadata {
    pub scene_id: String,
    pub timestamp: DateTime<Utc>,
    pub coordinate_system: CoordinateSystem,
    pub geo_transform: GeoTransform,
    /// Ground sampling distance in meters.
    pub nominal_resolution: f64,
    /// Sun azimuth in degrees clockwise from north, if known.
    pub solar_azimuth: Option<f64>,
    /// Sun zenith angle in degrees, if known.
    pub solar_zenith: Option<f64>,
}

/// Reflectance bands of a multispectral scene plus the packed quality band.
///
/// The optional lon/lat bands carry pre-materialized geographic
/// coordinates for scenes in a projected system; the core performs no
/// reprojection.
#[derive(Debug, Clone)]
pub struct SceneBands {
    pub blue: Band,
    pub green: Band,
    pub red: Band,
    pub nir: Band,
    pub swir1: Band,
    pub swir2: Band,
    pub qa: QaBand,
    pub qa_nodata: Option<u16>,
    pub lon: Option<Band>,
    pub lat: Option<Band>,
}

/// A single georeferenced multi-band scene. Immutable once classified;
/// downstream steps only add bands to their own bundles.
#[derive(Debug, Clone)]
pub struct Scene {
    pub metadata: SceneMetadata,
    pub bands: SceneBands,
}

impl Scene {
    /// Shape of the raster grid as (rows, cols).
    pub fn shape(&self) -> (usize, usize) {
        self.bands.green.dim()
    }

    /// Check all bands share one shape.
    pub fn validate(&self) -> RwResult<()> {
        let dim = self.bands.green.dim();
        let all = [
            self.bands.blue.dim(),
            self.bands.red.dim(),
            self.bands.nir.dim(),
            self.bands.swir1.dim(),
            self.bands.swir2.dim(),
            self.bands.qa.dim(),
        ];
        if all.iter().any(|&d| d != dim) {
            return Err(RwError::InvalidFormat(format!(
                "scene bands disagree on shape (green is {}x{})",
                dim.0, dim.1
            )));
        }
        for opt in [&self.bands.lon, &self.bands.lat] {
            if let Some(b) = opt {
                if b.dim() != dim {
                    return Err(RwError::InvalidFormat(
                        "lon/lat bands do not match the scene shape".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }
}

/// A polyline in scene map units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Polyline {
    pub vertices: Vec<(f64, f64)>,
}

/// Reference centerline vector dataset, read-only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CenterlineSet {
    pub lines: Vec<Polyline>,
}

/// Quality flags sampled along a cross-section (fractional means).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SectionFlags {
    pub cloud: f32,
    pub cloud_shadow: f32,
    pub snow_ice: f32,
    pub water: f32,
    pub hill_shadow: f32,
    pub elevation: f32,
}

/// One width measurement at a centerline pixel. Immutable once emitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossSection {
    pub longitude: f64,
    pub latitude: f64,
    /// Orthogonal-to-flow direction in radians.
    pub orthogonal_angle: f64,
    /// Channel width in meters (coverage-corrected cross-section length).
    pub width: f64,
    pub ends_in_water: bool,
    pub ends_over_edge: bool,
    pub scene_id: String,
    pub flags: SectionFlags,
}

/// Error types for river width processing
#[derive(Debug, thiserror::Error)]
pub enum RwError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    #[error("Missing metadata: {0}")]
    MissingMetadata(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type for river width operations
pub type RwResult<T> = Result<T, RwError>;
