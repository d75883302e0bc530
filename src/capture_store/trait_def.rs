//! CaptureStore trait definition.

use super::models::{Artist, Capture, CaptureForm, CaptureQuery};
use super::validation::FormErrors;
use anyhow::Result;
use thiserror::Error;

/// Failures callers are expected to tell apart from plain storage errors.
/// They travel inside `anyhow::Error` and are recovered with `downcast_ref`.
#[derive(Debug, Error)]
pub enum CaptureStoreError {
    #[error("Cannot sort captures by unknown field '{0}'")]
    UnknownSortField(String),

    #[error("Invalid capture: {0}")]
    InvalidForm(FormErrors),
}

pub trait CaptureStore: Send + Sync {
    // =========================================================================
    // Captures
    // =========================================================================

    fn get_capture(&self, id: i64) -> Result<Option<Capture>>;

    /// Captures matching every filter of `query`, in its ordering.
    fn query_captures(&self, query: &CaptureQuery) -> Result<Vec<Capture>>;

    /// Validates and inserts a capture, returning it as stored.
    fn create_capture(&self, form: &CaptureForm) -> Result<Capture>;

    /// Returns Ok(None) if no capture has this id.
    fn update_capture(&self, id: i64, form: &CaptureForm) -> Result<Option<Capture>>;

    /// Returns whether a capture was deleted.
    fn delete_capture(&self, id: i64) -> Result<bool>;

    // =========================================================================
    // Artists
    // =========================================================================

    fn get_artist(&self, id: i64) -> Result<Option<Artist>>;

    /// Existing artists whose name is one of `names`, ordered by name.
    fn get_artists_by_names(&self, names: &[String]) -> Result<Vec<Artist>>;

    fn list_artists(&self) -> Result<Vec<Artist>>;

    // =========================================================================
    // Counts (for metrics)
    // =========================================================================

    fn get_captures_count(&self) -> usize;

    fn get_artists_count(&self) -> usize;
}
