//! Error types for loading and rendering.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised by the data loader and the view handlers.
#[derive(Debug, Error)]
pub enum DashboardError {
    /// The observation database could not be read. Fatal for the session.
    #[error("observation data unavailable from {}: {reason}", path.display())]
    DataUnavailable { path: PathBuf, reason: String },

    /// A view had nothing to aggregate where a chart is mandatory.
    #[error("no data to display: {0}")]
    EmptyResult(String),

    /// A filter value that is not among the offered options.
    #[error("invalid {filter} selection '{value}'")]
    InvalidFilter { filter: String, value: String },

    /// A view selector that names none of the seven views.
    #[error("unknown view '{0}' (expected a view label, slug, or number 1-7)")]
    UnknownView(String),
}

impl DashboardError {
    /// Build a `DataUnavailable` error for `path`.
    pub fn unavailable(path: &Path, reason: impl ToString) -> Self {
        DashboardError::DataUnavailable {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }
}
