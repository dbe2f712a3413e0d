use crate::adapters::{LocalStorage, TcpConnector};
use crate::core::burst::BurstEngine;
use crate::core::report::{summary_line, write_report};
use crate::core::{BurstReport, ConfigProvider};
use crate::utils::error::Result;

/// Runs one burst against real sockets and persists the report if asked to.
pub async fn run_burst<C: ConfigProvider>(config: &C, monitor_enabled: bool) -> Result<BurstReport> {
    let plan = config.plan()?;
    let connector = TcpConnector::from_plan(&plan);
    let engine = BurstEngine::new_with_monitoring(connector, plan, monitor_enabled);

    let report = engine.run().await?;
    tracing::info!("📈 {}", summary_line(&report));

    if let Some(path) = config.report_path() {
        write_report(&LocalStorage::default(), path, &report).await?;
        tracing::info!("📁 Report saved to: {}", path);
    }

    Ok(report)
}

/// Exit code for a burst that ran to completion.
pub fn completion_exit_code(report: &BurstReport) -> i32 {
    if report.is_clean() {
        0
    } else {
        2
    }
}
