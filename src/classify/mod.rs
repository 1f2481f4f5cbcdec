//! Run classification.
//!
//! Pure partition of the inventory snapshot: a run whose owning workflow
//! identifier has no matching definition is orphan; every other run is
//! active, bucketed by the *current name* of its workflow. Classification is
//! computed once from the snapshot and never re-evaluated, even if the
//! repository's workflows change on the server mid-invocation.

use crate::models::{WorkflowDefinition, WorkflowId, WorkflowRun};
use std::collections::HashMap;

/// Active runs of one workflow, keyed by its current name.
#[derive(Debug, Clone)]
pub struct ActiveGroup {
    /// The workflow's current name.
    pub workflow: String,
    /// Runs of this workflow, in input (newest-first) order.
    pub runs: Vec<WorkflowRun>,
}

/// The partition of an inventory into orphan and active runs.
///
/// Group order is first-seen order from the input run sequence; downstream
/// reporting reproduces encounter order, so no alphabetical container is
/// involved.
#[derive(Debug, Clone, Default)]
pub struct ClassifiedRuns {
    /// Runs whose defining workflow no longer exists.
    pub orphans: Vec<WorkflowRun>,
    /// Active runs grouped by workflow name, in encounter order.
    pub groups: Vec<ActiveGroup>,
}

impl ClassifiedRuns {
    /// Number of orphan runs.
    #[must_use]
    pub const fn orphan_count(&self) -> usize {
        self.orphans.len()
    }

    /// Number of active runs across all groups.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.groups.iter().map(|g| g.runs.len()).sum()
    }
}

/// Partitions runs into orphan and active groups.
///
/// Renamed workflows collapse correctly: several historical workflow ids may
/// map onto one still-present name, and all their runs land in that single
/// bucket. This is a pure function of the snapshot.
#[must_use]
pub fn classify(definitions: &[WorkflowDefinition], runs: Vec<WorkflowRun>) -> ClassifiedRuns {
    let names_by_id: HashMap<WorkflowId, &str> = definitions
        .iter()
        .map(|def| (def.id, def.name.as_str()))
        .collect();

    let mut classified = ClassifiedRuns::default();
    let mut group_index: HashMap<String, usize> = HashMap::new();

    for run in runs {
        let Some(&name) = names_by_id.get(&run.workflow_id) else {
            classified.orphans.push(run);
            continue;
        };

        if let Some(&idx) = group_index.get(name) {
            classified.groups[idx].runs.push(run);
        } else {
            group_index.insert(name.to_string(), classified.groups.len());
            classified.groups.push(ActiveGroup {
                workflow: name.to_string(),
                runs: vec![run],
            });
        }
    }

    classified
}
