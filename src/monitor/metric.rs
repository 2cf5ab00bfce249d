//! Per-request metric records ingested by the monitor.

use serde::{Deserialize, Serialize};

/// Heap usage at the moment a metric was recorded.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemorySnapshot {
    pub heap_used_bytes: u64,
    pub heap_total_bytes: u64,
}

impl MemorySnapshot {
    /// Used/total as a percentage; zero total reads as zero usage.
    pub fn usage_percent(&self) -> f64 {
        if self.heap_total_bytes == 0 {
            0.0
        } else {
            self.heap_used_bytes as f64 / self.heap_total_bytes as f64 * 100.0
        }
    }
}

/// One completed request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetric {
    pub timestamp_ms: u64,
    pub route: String,
    pub method: String,
    pub duration_ms: u64,
    pub status_code: u16,
    pub memory: MemorySnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_size_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol_version: Option<String>,
}

/// One failed request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorMetric {
    pub timestamp_ms: u64,
    pub route: String,
    pub method: String,
    pub error_code: String,
    pub message: String,
    pub status_code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol_version: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_percent() {
        let snapshot = MemorySnapshot {
            heap_used_bytes: 80,
            heap_total_bytes: 100,
        };
        assert!((snapshot.usage_percent() - 80.0).abs() < 1e-9);

        assert_eq!(MemorySnapshot::default().usage_percent(), 0.0);
    }
}
