use crate::core::{ConfigProvider, Payload};
use crate::domain::model::{
    DEFAULT_HOST, DEFAULT_PAYLOAD, DEFAULT_PORT, DEFAULT_TASKS, DEFAULT_WORKERS, MAX_TASKS,
};
use crate::utils::error::{BurstError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;

static ENV_VAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([^}]+)\}").expect("env placeholder pattern is valid")
});

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub target: TargetConfig,
    #[serde(default)]
    pub payload: PayloadConfig,
    #[serde(default)]
    pub load: LoadConfig,
    pub report: Option<ReportConfig>,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PayloadConfig {
    pub text: Option<String>,
    pub hex: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoadConfig {
    pub tasks: Option<usize>,
    pub workers: Option<usize>,
    pub connect_timeout_ms: Option<u64>,
    pub await_reply: Option<bool>,
    pub fail_fast: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    pub json_logs: Option<bool>,
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => BurstError::MissingConfigError {
                field: path.display().to_string(),
            },
            _ => BurstError::ConfigError {
                message: format!("Cannot read {}: {}", path.display(), e),
            },
        })?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| BurstError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${DAEMON_HOST})，未定義的保留原樣
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_host("target.host", &self.target.host)?;
        validation::validate_port("target.port", self.target.port)?;
        validation::validate_range("load.tasks", self.tasks(), 1, MAX_TASKS)?;
        validation::validate_range("load.workers", self.workers(), 1, 10_000)?;

        if self.payload.text.is_some() && self.payload.hex.is_some() {
            return Err(BurstError::ConfigValidationError {
                field: "payload".to_string(),
                message: "Set either payload.text or payload.hex, not both".to_string(),
            });
        }
        validation::validate_payload("payload", &self.payload()?)?;

        if let Some(timeout) = self.load.connect_timeout_ms {
            validation::validate_positive_number("load.connect_timeout_ms", timeout as usize, 1)?;
        }
        if let Some(report) = &self.report {
            validation::validate_path("report.path", &report.path)?;
        }

        Ok(())
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn json_logs(&self) -> bool {
        self.monitoring
            .as_ref()
            .and_then(|m| m.json_logs)
            .unwrap_or(false)
    }
}

impl ConfigProvider for TomlConfig {
    fn host(&self) -> &str {
        &self.target.host
    }

    fn port(&self) -> u16 {
        self.target.port
    }

    fn payload(&self) -> Result<Payload> {
        match (&self.payload.hex, &self.payload.text) {
            (Some(encoded), _) => Payload::from_hex("payload.hex", encoded),
            (None, Some(text)) => Ok(Payload::from_text(text)),
            (None, None) => Ok(Payload::from_text(DEFAULT_PAYLOAD)),
        }
    }

    fn tasks(&self) -> usize {
        self.load.tasks.unwrap_or(DEFAULT_TASKS)
    }

    fn workers(&self) -> usize {
        self.load.workers.unwrap_or(DEFAULT_WORKERS)
    }

    fn connect_timeout(&self) -> Option<Duration> {
        self.load.connect_timeout_ms.map(Duration::from_millis)
    }

    fn await_reply(&self) -> bool {
        self.load.await_reply.unwrap_or(false)
    }

    fn fail_fast(&self) -> bool {
        self.load.fail_fast.unwrap_or(false)
    }

    fn report_path(&self) -> Option<&str> {
        self.report.as_ref().map(|r| r.path.as_str())
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
