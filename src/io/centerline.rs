//! Reference centerline geometry from vertex tables.
//!
//! The expected table has one vertex per row with `x`, `y` and a
//! `line_id` grouping column; vertices keep their file order within a
//! line.

use crate::types::{CenterlineSet, Polyline, RwError, RwResult};
use serde::Deserialize;
use std::io::Read;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct VertexRow {
    x: f64,
    y: f64,
    line_id: u64,
}

/// Reader for centerline vertex tables.
pub struct CenterlineReader;

impl CenterlineReader {
    /// Parse a vertex table from any source.
    pub fn read<R: Read>(source: R) -> RwResult<CenterlineSet> {
        let mut reader = csv::Reader::from_reader(source);
        let mut lines: Vec<(u64, Polyline)> = Vec::new();

        for record in reader.deserialize() {
            let row: VertexRow = record?;
            match lines.iter_mut().find(|(id, _)| *id == row.line_id) {
                Some((_, line)) => line.vertices.push((row.x, row.y)),
                None => lines.push((
                    row.line_id,
                    Polyline { vertices: vec![(row.x, row.y)] },
                )),
            }
        }

        for (id, line) in &lines {
            if line.vertices.len() < 2 {
                return Err(RwError::InvalidFormat(format!(
                    "centerline {} has fewer than two vertices",
                    id
                )));
            }
        }
        Ok(CenterlineSet {
            lines: lines.into_iter().map(|(_, line)| line).collect(),
        })
    }

    /// Parse a vertex table from a file path.
    pub fn read_file<P: AsRef<Path>>(path: P) -> RwResult<CenterlineSet> {
        log::info!("Reading centerlines from {}", path.as_ref().display());
        let file = std::fs::File::open(path)?;
        Self::read(file)
    }
}
