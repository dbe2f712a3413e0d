use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use crate::utils::error::{BurstError, Result};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_PAYLOAD: &str = "a 00:00:00:00:00:00";
pub const DEFAULT_TASKS: usize = 6000;
pub const DEFAULT_WORKERS: usize = 100;
pub const MAX_TASKS: usize = 100_000_000;
/// Upper bound for a single reply read from the daemon.
pub const REPLY_BUFFER_SIZE: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub host: String,
    pub port: u16,
}

impl Target {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // IPv6 literals need brackets to stay parseable as host:port
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

/// The exact bytes written on every connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload(Bytes);

impl Payload {
    pub fn from_text(text: &str) -> Self {
        Self(Bytes::copy_from_slice(text.as_bytes()))
    }

    pub fn from_hex(field_name: &str, encoded: &str) -> Result<Self> {
        let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
        hex::decode(&compact)
            .map(|raw| Self(Bytes::from(raw)))
            .map_err(|e| BurstError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: encoded.to_string(),
                reason: format!("Invalid hex payload: {}", e),
            })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Lossy text preview for logs.
    pub fn preview(&self) -> String {
        String::from_utf8_lossy(&self.0).into_owned()
    }
}

impl Default for Payload {
    fn default() -> Self {
        Self::from_text(DEFAULT_PAYLOAD)
    }
}

/// Everything a burst needs, resolved from a config source.
#[derive(Debug, Clone)]
pub struct BurstPlan {
    pub target: Target,
    pub payload: Payload,
    pub tasks: usize,
    pub workers: usize,
    pub connect_timeout: Option<Duration>,
    pub await_reply: bool,
    pub fail_fast: bool,
}

impl Default for BurstPlan {
    fn default() -> Self {
        Self {
            target: Target::new(DEFAULT_HOST, DEFAULT_PORT),
            payload: Payload::default(),
            tasks: DEFAULT_TASKS,
            workers: DEFAULT_WORKERS,
            connect_timeout: None,
            await_reply: false,
            fail_fast: false,
        }
    }
}

/// Result of a single successful connect-and-send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub peer: SocketAddr,
    pub bytes_sent: usize,
    pub reply: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Delivered,
    Failed,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Delivered => f.write_str("delivered"),
            TaskStatus::Failed => f.write_str("failed"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    pub task: usize,
    pub status: TaskStatus,
    pub peer: Option<SocketAddr>,
    pub bytes_sent: usize,
    pub reply: Option<String>,
    pub error: Option<String>,
    pub elapsed_ms: u64,
}

impl TaskRecord {
    pub fn delivered(task: usize, delivery: Delivery, elapsed: Duration) -> Self {
        Self {
            task,
            status: TaskStatus::Delivered,
            peer: Some(delivery.peer),
            bytes_sent: delivery.bytes_sent,
            reply: delivery.reply,
            error: None,
            elapsed_ms: elapsed.as_millis() as u64,
        }
    }

    pub fn failed(task: usize, error: &BurstError, elapsed: Duration) -> Self {
        Self {
            task,
            status: TaskStatus::Failed,
            peer: None,
            bytes_sent: 0,
            reply: None,
            error: Some(error.to_string()),
            elapsed_ms: elapsed.as_millis() as u64,
        }
    }

    pub fn is_delivered(&self) -> bool {
        self.status == TaskStatus::Delivered
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BurstReport {
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    pub target: Target,
    pub tasks: usize,
    pub workers: usize,
    pub delivered: usize,
    pub failed: usize,
    pub bytes_sent: u64,
    pub records: Vec<TaskRecord>,
}

impl BurstReport {
    /// Builds the aggregate view; records are sorted by task id.
    pub fn from_records(
        started_at: DateTime<Utc>,
        elapsed: Duration,
        plan: &BurstPlan,
        mut records: Vec<TaskRecord>,
    ) -> Self {
        records.sort_by_key(|r| r.task);
        let delivered = records.iter().filter(|r| r.is_delivered()).count();
        let bytes_sent = records.iter().map(|r| r.bytes_sent as u64).sum();

        Self {
            started_at,
            elapsed_ms: elapsed.as_millis() as u64,
            target: plan.target.clone(),
            tasks: plan.tasks,
            workers: plan.workers,
            delivered,
            failed: records.len() - delivered,
            bytes_sent,
            records,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.failed == 0 && self.delivered == self.tasks
    }

    pub fn success_rate(&self) -> f64 {
        if self.tasks == 0 {
            return 0.0;
        }
        self.delivered as f64 / self.tasks as f64 * 100.0
    }

    /// Connections per second over the whole run.
    pub fn throughput(&self) -> f64 {
        if self.elapsed_ms == 0 {
            return self.delivered as f64;
        }
        self.delivered as f64 / (self.elapsed_ms as f64 / 1000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_plan_matches_reference_burst() {
        let plan = BurstPlan::default();
        assert_eq!(plan.target.to_string(), "127.0.0.1:8000");
        assert_eq!(plan.payload.as_bytes(), b"a 00:00:00:00:00:00");
        assert_eq!(plan.tasks, 6000);
        assert_eq!(plan.workers, 100);
        assert!(plan.connect_timeout.is_none());
    }

    #[test]
    fn test_ipv6_target_display() {
        assert_eq!(Target::new("::1", 8000).to_string(), "[::1]:8000");
    }

    #[test]
    fn test_payload_from_hex() {
        let payload = Payload::from_hex("payload.hex", "61 20 30\n30").unwrap();
        assert_eq!(payload.as_bytes(), b"a 00");
        assert!(Payload::from_hex("payload.hex", "zz").is_err());
        assert!(Payload::from_hex("payload.hex", "abc").is_err());
    }

    #[test]
    fn test_report_aggregates_sorted_records() {
        let plan = BurstPlan {
            tasks: 3,
            ..BurstPlan::default()
        };
        let peer: SocketAddr = "127.0.0.1:8000".parse().unwrap();
        let delivery = |bytes| Delivery {
            peer,
            bytes_sent: bytes,
            reply: None,
        };
        let err = BurstError::NoAddressError {
            target: "nowhere:1".to_string(),
        };
        let records = vec![
            TaskRecord::delivered(2, delivery(19), Duration::from_millis(3)),
            TaskRecord::failed(1, &err, Duration::from_millis(1)),
            TaskRecord::delivered(0, delivery(19), Duration::from_millis(2)),
        ];

        let report =
            BurstReport::from_records(Utc::now(), Duration::from_millis(500), &plan, records);

        let order: Vec<usize> = report.records.iter().map(|r| r.task).collect();
        assert_eq!(order, vec![0, 1, 2]);
        assert_eq!(report.delivered, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.bytes_sent, 38);
        assert!(!report.is_clean());
        assert!((report.throughput() - 4.0).abs() < f64::EPSILON);
    }
}
