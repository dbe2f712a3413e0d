use crate::core::{ConfigProvider, Payload};
use crate::domain::model::{
    DEFAULT_HOST, DEFAULT_PAYLOAD, DEFAULT_PORT, DEFAULT_TASKS, DEFAULT_WORKERS, MAX_TASKS,
};
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "burst-requests")]
#[command(about = "Open many concurrent TCP connections and send a fixed payload on each")]
pub struct CliConfig {
    #[arg(long, default_value = DEFAULT_HOST)]
    pub host: String,

    #[arg(long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Payload sent verbatim on every connection
    #[arg(long, default_value = DEFAULT_PAYLOAD, conflicts_with = "payload_hex")]
    pub payload: String,

    /// Payload given as hex bytes, e.g. "610a"
    #[arg(long)]
    pub payload_hex: Option<String>,

    /// Total number of connections to make
    #[arg(long, default_value_t = DEFAULT_TASKS)]
    pub tasks: usize,

    /// Maximum number of connections in flight
    #[arg(long, default_value_t = DEFAULT_WORKERS)]
    pub workers: usize,

    #[arg(long)]
    pub connect_timeout_ms: Option<u64>,

    /// Read one reply line after sending
    #[arg(long)]
    pub await_reply: bool,

    /// Abort the whole burst on the first failed connection
    #[arg(long)]
    pub fail_fast: bool,

    /// Write a per-task report (.json or .csv)
    #[arg(long)]
    pub report: Option<String>,

    #[arg(long, help = "Log CPU and memory usage")]
    pub monitor: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub log_json: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            payload: DEFAULT_PAYLOAD.to_string(),
            payload_hex: None,
            tasks: DEFAULT_TASKS,
            workers: DEFAULT_WORKERS,
            connect_timeout_ms: None,
            await_reply: false,
            fail_fast: false,
            report: None,
            monitor: false,
            log_json: false,
            verbose: false,
        }
    }
}

impl ConfigProvider for CliConfig {
    fn host(&self) -> &str {
        &self.host
    }

    fn port(&self) -> u16 {
        self.port
    }

    fn payload(&self) -> Result<Payload> {
        match &self.payload_hex {
            Some(encoded) => Payload::from_hex("payload_hex", encoded),
            None => Ok(Payload::from_text(&self.payload)),
        }
    }

    fn tasks(&self) -> usize {
        self.tasks
    }

    fn workers(&self) -> usize {
        self.workers
    }

    fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_ms.map(Duration::from_millis)
    }

    fn await_reply(&self) -> bool {
        self.await_reply
    }

    fn fail_fast(&self) -> bool {
        self.fail_fast
    }

    fn report_path(&self) -> Option<&str> {
        self.report.as_deref()
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_host("host", &self.host)?;
        validation::validate_port("port", self.port)?;
        validation::validate_range("tasks", self.tasks, 1, MAX_TASKS)?;
        validation::validate_range("workers", self.workers, 1, 10_000)?;

        validation::validate_payload("payload", &self.payload()?)?;

        if let Some(timeout) = self.connect_timeout_ms {
            validation::validate_positive_number("connect_timeout_ms", timeout as usize, 1)?;
        }
        if let Some(path) = &self.report {
            validation::validate_path("report", path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_parse_to_reference_burst() {
        let config = CliConfig::parse_from(["burst-requests"]);
        let plan = config.plan().unwrap();

        assert_eq!(plan.target.to_string(), "127.0.0.1:8000");
        assert_eq!(plan.payload.as_bytes(), b"a 00:00:00:00:00:00");
        assert_eq!(plan.tasks, 6000);
        assert_eq!(plan.workers, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_flags_override_plan() {
        let config = CliConfig::parse_from([
            "burst-requests",
            "--host",
            "10.0.0.5",
            "--port",
            "9000",
            "--payload-hex",
            "64 20 30",
            "--tasks",
            "10",
            "--workers",
            "2",
            "--connect-timeout-ms",
            "250",
            "--fail-fast",
        ]);
        let plan = config.plan().unwrap();

        assert_eq!(plan.target.to_string(), "10.0.0.5:9000");
        assert_eq!(plan.payload.as_bytes(), b"d 0");
        assert_eq!(plan.connect_timeout, Some(Duration::from_millis(250)));
        assert!(plan.fail_fast);
        assert!(!plan.await_reply);
    }

    #[test]
    fn test_payload_and_hex_conflict() {
        let parsed = CliConfig::try_parse_from([
            "burst-requests",
            "--payload",
            "x",
            "--payload-hex",
            "78",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let zero_workers = CliConfig {
            workers: 0,
            ..CliConfig::default()
        };
        assert!(zero_workers.validate().is_err());

        let empty_payload = CliConfig {
            payload: String::new(),
            ..CliConfig::default()
        };
        assert!(empty_payload.validate().is_err());

        let bad_hex = CliConfig {
            payload_hex: Some("xyz".to_string()),
            ..CliConfig::default()
        };
        assert!(bad_hex.validate().is_err());

        let zero_timeout = CliConfig {
            connect_timeout_ms: Some(0),
            ..CliConfig::default()
        };
        assert!(zero_timeout.validate().is_err());

        let too_many_tasks = CliConfig {
            tasks: usize::MAX / 8,
            ..CliConfig::default()
        };
        assert!(too_many_tasks.validate().is_err());
    }
}
