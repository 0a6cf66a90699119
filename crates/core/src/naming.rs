//! Export job naming.
//!
//! Job names double as output file names in the destination folder, so
//! concurrent jobs must never collide: every cell gets a name derived
//! from its grid index. The prefix is restricted to characters the
//! platform accepts in file names.

use crate::error::CoreError;

/// Maximum length of a job name prefix.
pub const MAX_PREFIX_LEN: usize = 64;

/// Build the export job name for one grid cell.
///
/// Names are unique per run as long as cell indices are unique, which
/// the grid partitioner guarantees.
pub fn job_name(prefix: &str, cell_index: usize) -> String {
    format!("{prefix}-part-{cell_index}")
}

/// Validate a job name prefix.
///
/// Rules:
/// - Must not be empty.
/// - Must not exceed [`MAX_PREFIX_LEN`] characters.
/// - Must contain only alphanumeric, hyphen, or underscore characters.
pub fn validate_name_prefix(prefix: &str) -> Result<(), CoreError> {
    if prefix.is_empty() {
        return Err(CoreError::Validation(
            "Job name prefix must not be empty".to_string(),
        ));
    }
    if prefix.len() > MAX_PREFIX_LEN {
        return Err(CoreError::Validation(format!(
            "Job name prefix must not exceed {MAX_PREFIX_LEN} characters"
        )));
    }
    if !prefix
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(CoreError::Validation(
            "Job name prefix may only contain alphanumeric, hyphen, or underscore characters"
                .to_string(),
        ));
    }
    Ok(())
}
