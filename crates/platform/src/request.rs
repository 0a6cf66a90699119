//! Server-side export computation descriptions.
//!
//! An [`ExportRequest`] is the full description of what the platform
//! should compute and export for one grid cell: which features to
//! select (bounds + confidence filter), which derived metrics to
//! compute per year, and which columns land in the output file. The
//! platform executes all of it; locally these are just serializable
//! values.

use bgfa_core::BoundingBox;
use serde::{Deserialize, Serialize};

/// Description of one server-side export job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportRequest {
    /// Job name, unique per cell; also used for the output file name.
    pub name: String,
    /// Source feature collection id.
    pub dataset: String,
    /// Bounds filter: only features intersecting this box are read.
    pub region: BoundingBox,
    /// Minimum detection confidence; features below it are dropped.
    pub min_confidence: f64,
    /// Which yearly height layers to read.
    pub years: Vec<u16>,
    /// Storey height used to derive built-up ground floor area:
    /// `bgfa_{y} = area_m2 * floor(height_{y} / storey_height_m)`.
    pub storey_height_m: f64,
    /// Drop features with no height measurement in any requested year.
    pub require_height: bool,
    /// Output columns, in order.
    pub selectors: Vec<String>,
    pub destination: ExportDestination,
}

/// Where the platform delivers the export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportDestination {
    /// Cloud storage folder within the project.
    pub folder: String,
    pub format: ExportFormat,
}

/// Output file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ExportFormat {
    Csv,
    GeoJson,
}

/// Build the output column list for a set of years.
///
/// The fixed columns come first, then one `height_{y}` per year, then
/// one `bgfa_{y}` per year, matching the layout downstream analysis
/// expects.
pub fn selectors_for_years(years: &[u16]) -> Vec<String> {
    let mut selectors: Vec<String> = ["longitude", "latitude", "confidence", "area_m2"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    selectors.extend(years.iter().map(|year| format!("height_{year}")));
    selectors.extend(years.iter().map(|year| format!("bgfa_{year}")));
    selectors
}
