//! Exporter configuration loaded from environment variables.
//!
//! Every knob the run depends on lives here with a documented default,
//! instead of being scattered through the code as literals. The API key
//! is deliberately not part of this struct; `main` reads it separately
//! so the secret never travels through config logging.

use std::time::Duration;

use bgfa_core::{naming, BoundingBox, CoreError};

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

const DEFAULT_PLATFORM_URL: &str = "http://localhost:8080";
const DEFAULT_PROJECT: &str = "building-analysis";
const DEFAULT_DATASET: &str = "building-footprints-temporal";

const DEFAULT_REGION_WEST: f64 = 73.85;
const DEFAULT_REGION_SOUTH: f64 = 18.52;
const DEFAULT_REGION_EAST: f64 = 73.86;
const DEFAULT_REGION_NORTH: f64 = 18.53;

const DEFAULT_GRID_SPLITS: usize = 4;
const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.7;
const DEFAULT_EXPORT_YEARS: [u16; 8] = [2016, 2017, 2018, 2019, 2020, 2021, 2022, 2023];
const DEFAULT_STOREY_HEIGHT_M: f64 = 3.0;

const DEFAULT_OUTPUT_FOLDER: &str = "building-analysis";
const DEFAULT_JOB_NAME_PREFIX: &str = "buildings";

const DEFAULT_SUBMIT_WORKERS: usize = 16;
const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Run configuration for the exporter.
#[derive(Debug, Clone)]
pub struct ExporterConfig {
    /// Analytics platform base URL.
    pub platform_url: String,
    /// Platform project the session is scoped to.
    pub project: String,
    /// Source feature collection id.
    pub dataset: String,

    /// Western bound of the run region, degrees.
    pub region_west: f64,
    pub region_south: f64,
    pub region_east: f64,
    pub region_north: f64,

    /// Grid dimensions: the region is split into `splits_x * splits_y`
    /// cells, one export job each.
    pub splits_x: usize,
    pub splits_y: usize,

    /// Minimum detection confidence for input features.
    pub confidence_threshold: f64,
    /// Yearly height layers to export.
    pub years: Vec<u16>,
    /// Storey height used to derive built-up ground floor area.
    pub storey_height_m: f64,

    /// Destination folder for exported files.
    pub output_folder: String,
    /// Prefix for per-cell job names.
    pub job_name_prefix: String,

    /// Size of the submission worker pool (max in-flight submissions).
    pub submit_workers: usize,
    /// Interval between status poll rounds.
    pub poll_interval: Duration,
    /// Optional upper bound on monitoring time. `None` polls until
    /// every job is terminal.
    pub max_wait: Option<Duration>,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            platform_url: DEFAULT_PLATFORM_URL.to_string(),
            project: DEFAULT_PROJECT.to_string(),
            dataset: DEFAULT_DATASET.to_string(),
            region_west: DEFAULT_REGION_WEST,
            region_south: DEFAULT_REGION_SOUTH,
            region_east: DEFAULT_REGION_EAST,
            region_north: DEFAULT_REGION_NORTH,
            splits_x: DEFAULT_GRID_SPLITS,
            splits_y: DEFAULT_GRID_SPLITS,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            years: DEFAULT_EXPORT_YEARS.to_vec(),
            storey_height_m: DEFAULT_STOREY_HEIGHT_M,
            output_folder: DEFAULT_OUTPUT_FOLDER.to_string(),
            job_name_prefix: DEFAULT_JOB_NAME_PREFIX.to_string(),
            submit_workers: DEFAULT_SUBMIT_WORKERS,
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            max_wait: None,
        }
    }
}

impl ExporterConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env var | Default |
    /// |---------|---------|
    /// | `PLATFORM_URL` | `http://localhost:8080` |
    /// | `PLATFORM_PROJECT` | `building-analysis` |
    /// | `DATASET` | `building-footprints-temporal` |
    /// | `REGION_WEST` / `REGION_SOUTH` / `REGION_EAST` / `REGION_NORTH` | `73.85` / `18.52` / `73.86` / `18.53` |
    /// | `GRID_SPLITS_X` / `GRID_SPLITS_Y` | `4` / `4` |
    /// | `CONFIDENCE_THRESHOLD` | `0.7` |
    /// | `EXPORT_YEARS` (comma-separated) | `2016,...,2023` |
    /// | `STOREY_HEIGHT_M` | `3.0` |
    /// | `OUTPUT_FOLDER` | `building-analysis` |
    /// | `JOB_NAME_PREFIX` | `buildings` |
    /// | `SUBMIT_WORKERS` | `16` |
    /// | `POLL_INTERVAL_SECS` | `30` |
    /// | `MAX_WAIT_SECS` | unset (no deadline) |
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let years = match std::env::var("EXPORT_YEARS") {
            Ok(list) => list
                .split(',')
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(|s| s.parse().expect("EXPORT_YEARS entries must be valid years"))
                .collect(),
            Err(_) => defaults.years,
        };

        let max_wait = std::env::var("MAX_WAIT_SECS").ok().map(|s| {
            Duration::from_secs(s.parse().expect("MAX_WAIT_SECS must be a valid u64"))
        });

        Self {
            platform_url: env_or("PLATFORM_URL", defaults.platform_url),
            project: env_or("PLATFORM_PROJECT", defaults.project),
            dataset: env_or("DATASET", defaults.dataset),
            region_west: parse_env_or("REGION_WEST", defaults.region_west),
            region_south: parse_env_or("REGION_SOUTH", defaults.region_south),
            region_east: parse_env_or("REGION_EAST", defaults.region_east),
            region_north: parse_env_or("REGION_NORTH", defaults.region_north),
            splits_x: parse_env_or("GRID_SPLITS_X", defaults.splits_x),
            splits_y: parse_env_or("GRID_SPLITS_Y", defaults.splits_y),
            confidence_threshold: parse_env_or(
                "CONFIDENCE_THRESHOLD",
                defaults.confidence_threshold,
            ),
            years,
            storey_height_m: parse_env_or("STOREY_HEIGHT_M", defaults.storey_height_m),
            output_folder: env_or("OUTPUT_FOLDER", defaults.output_folder),
            job_name_prefix: env_or("JOB_NAME_PREFIX", defaults.job_name_prefix),
            submit_workers: parse_env_or("SUBMIT_WORKERS", defaults.submit_workers),
            poll_interval: Duration::from_secs(parse_env_or(
                "POLL_INTERVAL_SECS",
                DEFAULT_POLL_INTERVAL_SECS,
            )),
            max_wait,
        }
    }

    /// The run region as a validated bounding box.
    pub fn region(&self) -> Result<BoundingBox, CoreError> {
        BoundingBox::new(
            self.region_west,
            self.region_south,
            self.region_east,
            self.region_north,
        )
    }

    /// Validate the whole configuration.
    pub fn validate(&self) -> Result<(), CoreError> {
        self.region()?;

        if self.splits_x == 0 || self.splits_y == 0 {
            return Err(CoreError::Validation(format!(
                "Grid splits must be at least 1, got {}x{}",
                self.splits_x, self.splits_y
            )));
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(CoreError::Validation(format!(
                "Confidence threshold must be within [0, 1], got {}",
                self.confidence_threshold
            )));
        }
        if self.years.is_empty() {
            return Err(CoreError::Validation(
                "At least one export year is required".to_string(),
            ));
        }
        if self.storey_height_m <= 0.0 || !self.storey_height_m.is_finite() {
            return Err(CoreError::Validation(format!(
                "Storey height must be positive, got {}",
                self.storey_height_m
            )));
        }
        if self.output_folder.trim().is_empty() {
            return Err(CoreError::Validation(
                "Output folder must not be empty".to_string(),
            ));
        }
        naming::validate_name_prefix(&self.job_name_prefix)?;
        if self.submit_workers == 0 {
            return Err(CoreError::Validation(
                "Submission worker pool size must be at least 1".to_string(),
            ));
        }
        if self.poll_interval.is_zero() {
            return Err(CoreError::Validation(
                "Poll interval must be non-zero".to_string(),
            ));
        }

        Ok(())
    }
}

/// Read an env var, falling back to a default.
fn env_or(key: &str, default: String) -> String {
    std::env::var(key).unwrap_or(default)
}

/// Read and parse an env var, falling back to a default. Panics with
/// the variable name if the value does not parse (startup-time only).
fn parse_env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(value) => value
            .parse()
            .unwrap_or_else(|_| panic!("{key} must be a valid {}", std::any::type_name::<T>())),
        Err(_) => default,
    }
}
