use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, TimeZone};

/// Timestamp layout of the innermost log directory.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

/// `dir_name/experiment_name/<timestamp>` for the given instant.
pub fn experiment_log_path<Tz: TimeZone>(
    dir_name: impl AsRef<Path>,
    experiment_name: &str,
    at: &DateTime<Tz>,
) -> PathBuf
where
    Tz::Offset: std::fmt::Display,
{
    dir_name
        .as_ref()
        .join(experiment_name)
        .join(at.format(TIMESTAMP_FORMAT).to_string())
}

/// Creates a fresh `dir_name/experiment_name/<local timestamp>` directory for
/// training event files and returns its path.
pub fn create_experiment_log_dir(
    dir_name: impl AsRef<Path>,
    experiment_name: &str,
) -> crate::Result<PathBuf> {
    let log_dir = experiment_log_path(dir_name, experiment_name, &Local::now());
    std::fs::create_dir_all(&log_dir)?;
    tracing::info!("Saving TensorBoard log files to: {}", log_dir.display());
    Ok(log_dir)
}
