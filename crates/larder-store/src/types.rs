//! Run-log record types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One cart-analysis run, appended to runs.jsonl
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
    pub items: usize,
    pub pruned: usize,
    pub kept: usize,
    pub average_confidence: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_record_roundtrip() {
        let record = RunRecord {
            session_id: "sess-1".to_string(),
            timestamp: Utc::now(),
            items: 12,
            pruned: 4,
            kept: 8,
            average_confidence: 0.68,
        };
        let json = serde_json::to_string(&record).unwrap();
        let parsed: RunRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.session_id, record.session_id);
        assert_eq!(parsed.pruned, 4);
    }
}
