//! rivwidth: A Fast, Modular River Channel Width Extractor
//!
//! This library turns a multispectral satellite scene and a coarse
//! reference centerline into per-pixel river width measurements:
//! surface water classification, channel connectivity, a
//! distance-to-bank field, morphological centerline extraction and
//! orthogonal transect measurement.

pub mod types;
pub mod io;
pub mod core;

// Re-export main types and functions for easier access
pub use types::{
    Band, BoundingBox, CenterlineSet, CoordinateSystem, CrossSection, GeoTransform,
    Polyline, RwError, RwResult, Scene, SceneBands, SceneMetadata, SectionFlags,
};

pub use crate::core::pipeline::{extract_widths, RiverWidthConfig};
pub use crate::core::water::WaterMethod;
pub use crate::core::gradient::GradientMethod;
pub use crate::core::skeleton::ThinningMethod;
pub use crate::io::{CenterlineReader, CsvExporter};
