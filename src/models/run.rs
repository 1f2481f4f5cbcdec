//! Workflow and workflow-run types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier of a workflow definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkflowId(pub u64);

impl fmt::Display for WorkflowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier of a workflow run.
///
/// Opaque integer, globally unique within the hosting platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub u64);

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A workflow definition currently configured in the repository.
///
/// Read-only snapshot fetched once per invocation. Presence in the snapshot
/// is what makes runs of this workflow "active".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkflowDefinition {
    /// Workflow identifier.
    pub id: WorkflowId,
    /// Current workflow name.
    pub name: String,
    /// Path of the workflow file within the repository.
    pub path: String,
    /// Lifecycle state as reported by the API (e.g. `active`).
    pub state: String,
}

/// A single workflow run.
///
/// Immutable once fetched; the engine classifies runs and marks them for
/// deletion but never mutates a run record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkflowRun {
    /// Run identifier.
    pub id: RunId,
    /// Identifier of the owning workflow.
    pub workflow_id: WorkflowId,
    /// Workflow name as recorded on the run.
    ///
    /// Used for orphan reporting; active runs are grouped under the live
    /// definition's current name instead.
    pub name: String,
    /// Creation timestamp (UTC).
    pub created_at: DateTime<Utc>,
    /// Web URL of the run.
    pub html_url: String,
}
