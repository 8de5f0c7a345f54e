//! Run results.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Per-model execution statistics.
#[derive(Debug, Clone, Serialize)]
pub struct ModelStats {
    pub duration_ms: u64,
}

/// The outcome of one `run()` invocation.
///
/// Execution failures land here (`success == false`, `models_failed`
/// populated); configuration and target errors are returned as errors by
/// `run()` itself and never produce a report.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub success: bool,
    /// Successfully executed models, completion order. Ephemeral models are
    /// inlined rather than run and never appear here.
    pub models_run: Vec<String>,
    pub models_failed: Vec<String>,
    pub stats: BTreeMap<String, ModelStats>,
    pub total_duration_ms: u64,
}

impl RunReport {
    pub(crate) fn started() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            success: true,
            models_run: Vec::new(),
            models_failed: Vec::new(),
            stats: BTreeMap::new(),
            total_duration_ms: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_serializes() {
        let mut report = RunReport::started();
        report.models_run.push("a".to_string());
        report.stats.insert("a".to_string(), ModelStats { duration_ms: 12 });

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["models_run"][0], "a");
        assert_eq!(json["stats"]["a"]["duration_ms"], 12);
    }
}
