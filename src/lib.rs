pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::CliConfig;
pub use crate::config::TomlConfig;

pub use crate::adapters::{LocalStorage, TcpConnector};
pub use crate::app::runner::{completion_exit_code, run_burst};
pub use crate::core::burst::BurstEngine;
pub use crate::core::report::{summary_line, write_report, ReportFormat};
pub use crate::domain::model::{BurstPlan, BurstReport, Payload, Target};
pub use crate::utils::error::{BurstError, Result};
