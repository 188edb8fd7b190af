//! Published view state

use serde::Serialize;
use std::fmt;
use std::sync::Arc;

use crate::catalogue::Catalogue;
use crate::errors::LoadFailure;
use crate::models::{GroupedView, VideoEntry};

/// Outcome of the most recent load, as seen by observers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "failure", rename_all = "snake_case")]
pub enum LoadStatus {
    /// Nothing has been loaded yet
    #[default]
    NotLoaded,
    Loaded,
    /// The latest load failed; views hold whatever was published before
    Failed(LoadFailure),
}

impl fmt::Display for LoadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadStatus::NotLoaded => write!(f, "not loaded"),
            LoadStatus::Loaded => write!(f, "loaded"),
            LoadStatus::Failed(failure) => write!(f, "failed ({failure})"),
        }
    }
}

/// One immutable snapshot of the catalogue views
///
/// `grouped` feeds row-per-category presentations and `flat` feeds grid
/// presentations. Both always derive from the same catalogue fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ViewState {
    pub status: LoadStatus,
    pub grouped: GroupedView,
    pub flat: Vec<Arc<VideoEntry>>,
}

impl ViewState {
    /// Snapshot derived from a freshly loaded catalogue
    pub fn loaded(catalogue: &Catalogue) -> Self {
        Self {
            status: LoadStatus::Loaded,
            grouped: catalogue.grouped(),
            flat: catalogue.all(),
        }
    }

    /// Snapshot reporting a failure while keeping the previous views
    pub fn failed(previous: &ViewState, failure: LoadFailure) -> Self {
        Self {
            status: LoadStatus::Failed(failure),
            grouped: previous.grouped.clone(),
            flat: previous.flat.clone(),
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.status, LoadStatus::Loaded)
    }

    pub fn failure(&self) -> Option<&LoadFailure> {
        match &self.status {
            LoadStatus::Failed(failure) => Some(failure),
            _ => None,
        }
    }

    /// Find an entry of the flat view by id
    pub fn entry(&self, id: &str) -> Option<&Arc<VideoEntry>> {
        self.flat.iter().find(|entry| entry.id == id)
    }
}

/// Result of a load or refresh request
#[derive(Debug, Clone)]
pub enum LoadOutcome {
    /// A snapshot was published; it may carry a failed status
    Published(Arc<ViewState>),
    /// The projector was shut down and nothing was published
    Discarded,
}

impl LoadOutcome {
    pub fn snapshot(&self) -> Option<&Arc<ViewState>> {
        match self {
            LoadOutcome::Published(snapshot) => Some(snapshot),
            LoadOutcome::Discarded => None,
        }
    }

    pub fn is_discarded(&self) -> bool {
        matches!(self, LoadOutcome::Discarded)
    }
}
