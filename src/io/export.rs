//! CSV export of measured cross sections.

use crate::types::{CrossSection, RwResult};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// Flat output row. Column names follow the established product layout
/// so downstream tooling keeps working.
#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    longitude: f64,
    latitude: f64,
    width: f64,
    #[serde(rename = "orthogonalDirection")]
    orthogonal_direction: f64,
    #[serde(rename = "endsInWater")]
    ends_in_water: u8,
    #[serde(rename = "endsOverEdge")]
    ends_over_edge: u8,
    image_id: &'a str,
    flag_cloud: f32,
    #[serde(rename = "flag_cldShadow")]
    flag_cloud_shadow: f32,
    #[serde(rename = "flag_snowIce")]
    flag_snow_ice: f32,
    flag_water: f32,
    #[serde(rename = "flag_hillshadow")]
    flag_hill_shadow: f32,
    flag_elevation: f32,
}

impl<'a> CsvRow<'a> {
    fn from_section(s: &'a CrossSection) -> Self {
        CsvRow {
            longitude: s.longitude,
            latitude: s.latitude,
            width: s.width,
            orthogonal_direction: s.orthogonal_angle,
            ends_in_water: s.ends_in_water as u8,
            ends_over_edge: s.ends_over_edge as u8,
            image_id: &s.scene_id,
            flag_cloud: s.flags.cloud,
            flag_cloud_shadow: s.flags.cloud_shadow,
            flag_snow_ice: s.flags.snow_ice,
            flag_water: s.flags.water,
            flag_hill_shadow: s.flags.hill_shadow,
            flag_elevation: s.flags.elevation,
        }
    }
}

const HEADER: [&str; 13] = [
    "longitude",
    "latitude",
    "width",
    "orthogonalDirection",
    "endsInWater",
    "endsOverEdge",
    "image_id",
    "flag_cloud",
    "flag_cldShadow",
    "flag_snowIce",
    "flag_water",
    "flag_hillshadow",
    "flag_elevation",
];

/// Writer for cross-section result tables.
pub struct CsvExporter;

impl CsvExporter {
    /// Write sections to any sink, header included. An empty list
    /// still produces the header row.
    pub fn write<W: Write>(sink: W, sections: &[CrossSection]) -> RwResult<()> {
        let mut writer = csv::Writer::from_writer(sink);
        if sections.is_empty() {
            writer.write_record(HEADER)?;
        }
        for section in sections {
            writer.serialize(CsvRow::from_section(section))?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Write sections to a file path.
    pub fn write_file<P: AsRef<Path>>(path: P, sections: &[CrossSection]) -> RwResult<()> {
        log::info!(
            "Writing {} cross sections to {}",
            sections.len(),
            path.as_ref().display()
        );
        let file = std::fs::File::create(path)?;
        Self::write(file, sections)
    }
}
