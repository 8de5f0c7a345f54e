//! Topological level scheduling.
//!
//! Kahn-style iterative peeling: each round collects every unscheduled model
//! whose dependencies (within the selected subset) are already scheduled.
//! Each collected set is one parallel-safe level.

use crate::error::{CoreError, CoreResult};
use crate::model_name::ModelName;
use std::collections::{BTreeMap, BTreeSet};

/// Order `subset` into parallel-safe levels. Dependencies outside the subset
/// count as satisfied (they are either external or deliberately not run).
///
/// Names within a level come out sorted, so identical inputs always produce
/// identical plans. No ordering contract exists between co-level models.
pub fn level_schedule(
    dependencies: &BTreeMap<ModelName, Vec<ModelName>>,
    subset: &BTreeSet<ModelName>,
) -> CoreResult<Vec<Vec<ModelName>>> {
    let mut scheduled: BTreeSet<ModelName> = BTreeSet::new();
    let mut remaining: Vec<ModelName> = subset.iter().cloned().collect();
    let mut levels: Vec<Vec<ModelName>> = Vec::new();

    while !remaining.is_empty() {
        let ready: Vec<ModelName> = remaining
            .iter()
            .filter(|name| {
                dependencies
                    .get(name.as_str())
                    .map(|deps| {
                        deps.iter().all(|dep| {
                            scheduled.contains(dep) || !subset.contains(dep)
                        })
                    })
                    .unwrap_or(true)
            })
            .cloned()
            .collect();

        if ready.is_empty() {
            // Validation already rejects cycles; this guards against them
            // reaching the scheduler anyway.
            let stuck: Vec<&str> = remaining.iter().map(|n| n.as_str()).collect();
            return Err(CoreError::SchedulerStuck {
                stuck: stuck.join(", "),
            });
        }

        scheduled.extend(ready.iter().cloned());
        remaining.retain(|name| !scheduled.contains(name));
        levels.push(ready);
    }

    Ok(levels)
}

#[cfg(test)]
#[path = "schedule_test.rs"]
mod tests;
