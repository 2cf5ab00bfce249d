//! Alerts derived from aggregate behavior.
//!
//! An alert is an observation ("error rate is high"), not a response to one
//! failed call. Alerts never abort a request; they are created by the
//! monitor's analysis step, mutated only by resolution, and retained in a
//! bounded ring that drops the oldest.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Info,
    Warning,
    Critical,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: Uuid,
    pub level: AlertLevel,
    pub title: String,
    pub message: String,
    pub timestamp_ms: u64,
    pub resolved: bool,
    pub metadata: Value,
}

impl Alert {
    pub fn new(
        level: AlertLevel,
        title: impl Into<String>,
        message: impl Into<String>,
        timestamp_ms: u64,
        metadata: Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            level,
            title: title.into(),
            message: message.into(),
            timestamp_ms,
            resolved: false,
            metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_level_ordering() {
        assert!(AlertLevel::Info < AlertLevel::Warning);
        assert!(AlertLevel::Warning < AlertLevel::Critical);
    }

    #[test]
    fn test_new_alert_is_unresolved_with_unique_id() {
        let a = Alert::new(AlertLevel::Warning, "t", "m", 0, json!({}));
        let b = Alert::new(AlertLevel::Warning, "t", "m", 0, json!({}));
        assert!(!a.resolved);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_level_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&AlertLevel::Critical).unwrap(),
            "\"critical\""
        );
    }
}
