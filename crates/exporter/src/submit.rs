//! Submission fan-out.
//!
//! One export job per grid cell, pushed through a bounded pool so at
//! most `submit_workers` submissions are in flight at once (the
//! platform rate-limits aggressive clients). A failed submission skips
//! its cell and the run continues; there is no automatic retry.

use futures::StreamExt;

use bgfa_core::{naming, Cell};
use bgfa_platform::{
    selectors_for_years, ExportDestination, ExportFormat, ExportPlatform, ExportRequest, JobHandle,
};

use crate::config::ExporterConfig;

/// A live export job together with the cell it covers.
#[derive(Debug, Clone)]
pub struct SubmittedJob {
    pub cell_index: usize,
    pub handle: JobHandle,
}

/// Build the server-side computation description for one cell.
pub fn build_request(cell: &Cell, config: &ExporterConfig) -> ExportRequest {
    ExportRequest {
        name: naming::job_name(&config.job_name_prefix, cell.index),
        dataset: config.dataset.clone(),
        region: cell.bounds,
        min_confidence: config.confidence_threshold,
        years: config.years.clone(),
        storey_height_m: config.storey_height_m,
        require_height: true,
        selectors: selectors_for_years(&config.years),
        destination: ExportDestination {
            folder: config.output_folder.clone(),
            format: ExportFormat::Csv,
        },
    }
}

/// Submit one export job per cell across the bounded worker pool.
///
/// Returns the jobs that were accepted, sorted by cell index. Cells
/// whose submission failed are logged and skipped; they produce no
/// job and do not abort the run.
pub async fn submit_cells<P: ExportPlatform>(
    platform: &P,
    cells: &[Cell],
    config: &ExporterConfig,
) -> Vec<SubmittedJob> {
    let results: Vec<Option<SubmittedJob>> = futures::stream::iter(cells.iter().map(|cell| {
        let request = build_request(cell, config);
        let cell_index = cell.index;
        async move {
            match platform.submit_export(&request).await {
                Ok(handle) => {
                    tracing::info!(
                        cell = cell_index,
                        job_id = %handle.id,
                        name = %handle.name,
                        "Export job submitted",
                    );
                    Some(SubmittedJob { cell_index, handle })
                }
                Err(e) => {
                    tracing::warn!(
                        cell = cell_index,
                        error = %e,
                        "Submission failed, skipping cell",
                    );
                    None
                }
            }
        }
    }))
    .buffer_unordered(config.submit_workers)
    .collect()
    .await;

    let mut jobs: Vec<SubmittedJob> = results.into_iter().flatten().collect();
    // Arrival order depends on completion order; sort for stable logs.
    jobs.sort_by_key(|job| job.cell_index);
    jobs
}
