// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pull progress accounting.
//!
//! A streamed pull yields JSON-like status records with a `status` line and
//! an optional layer `id`. [`PullProgress`] folds those records into layer
//! counts for display: first sight of an id grows the total, a completion
//! status marks the layer complete exactly once. The whole structure lives
//! for one pull call and is discarded after.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One status record from a streamed pull.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullEvent {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub id: Option<String>,
}

impl PullEvent {
    pub fn new(status: impl Into<String>, id: Option<&str>) -> Self {
        Self {
            status: status.into(),
            id: id.map(str::to_string),
        }
    }

    /// Final status line of a pull; the stream carries nothing useful after it.
    pub fn is_terminal(&self) -> bool {
        self.status.contains("Downloaded newer image")
            || self.status.contains("Image is up to date")
    }
}

/// Status of a single layer within one pull.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerStatus {
    Started,
    Complete,
}

/// Layer counts for one pull invocation.
#[derive(Debug, Default)]
pub struct PullProgress {
    layers: IndexMap<String, LayerStatus>,
}

impl PullProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one event into the counts.
    ///
    /// Returns true when the counts changed (new layer seen, or a layer
    /// newly completed). Repeated completion events for the same layer do
    /// not double count.
    pub fn observe(&mut self, event: &PullEvent) -> bool {
        let Some(id) = event.id.as_deref() else {
            return false;
        };
        let complete = matches!(event.status.as_str(), "Pull complete" | "Already exists");
        match self.layers.get_mut(id) {
            None => {
                let status = if complete { LayerStatus::Complete } else { LayerStatus::Started };
                self.layers.insert(id.to_string(), status);
                true
            }
            Some(status @ LayerStatus::Started) if complete => {
                *status = LayerStatus::Complete;
                true
            }
            Some(_) => false,
        }
    }

    /// Distinct layers seen so far.
    pub fn total(&self) -> usize {
        self.layers.len()
    }

    /// Layers that reached a completion status.
    pub fn completed(&self) -> usize {
        self.layers
            .values()
            .filter(|status| matches!(status, LayerStatus::Complete))
            .count()
    }
}

#[cfg(test)]
#[path = "progress_tests.rs"]
mod tests;
