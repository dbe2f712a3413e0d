use crate::core::{BurstReport, Storage};
use crate::utils::error::Result;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Json,
    Csv,
}

impl ReportFormat {
    /// `.csv` selects CSV, anything else is written as JSON.
    pub fn from_path(path: &str) -> Self {
        match Path::new(path)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("csv") => ReportFormat::Csv,
            _ => ReportFormat::Json,
        }
    }
}

pub fn render_json(report: &BurstReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

pub fn render_csv(report: &BurstReport) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "task",
        "status",
        "peer",
        "bytes_sent",
        "reply",
        "error",
        "elapsed_ms",
    ])?;

    for record in &report.records {
        writer.write_record([
            record.task.to_string(),
            record.status.to_string(),
            record.peer.map(|p| p.to_string()).unwrap_or_default(),
            record.bytes_sent.to_string(),
            record.reply.clone().unwrap_or_default(),
            record.error.clone().unwrap_or_default(),
            record.elapsed_ms.to_string(),
        ])?;
    }

    let data = writer
        .into_inner()
        .map_err(|e| std::io::Error::other(e.to_string()))?;
    Ok(String::from_utf8_lossy(&data).into_owned())
}

pub async fn write_report<S: Storage>(storage: &S, path: &str, report: &BurstReport) -> Result<()> {
    let rendered = match ReportFormat::from_path(path) {
        ReportFormat::Json => render_json(report)?,
        ReportFormat::Csv => render_csv(report)?,
    };

    tracing::debug!("Writing report ({} bytes) to {}", rendered.len(), path);
    storage.write_file(path, rendered.as_bytes()).await
}

pub fn summary_line(report: &BurstReport) -> String {
    format!(
        "{}: {}/{} delivered ({:.1}%), {} failed, {} bytes sent in {}ms",
        report.target,
        report.delivered,
        report.tasks,
        report.success_rate(),
        report.failed,
        report.bytes_sent,
        report.elapsed_ms
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{BurstPlan, Delivery, TaskRecord};
    use crate::utils::error::BurstError;
    use chrono::Utc;
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::Mutex;

    #[derive(Clone, Default)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl Storage for MockStorage {
        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    fn sample_report() -> BurstReport {
        let plan = BurstPlan {
            tasks: 2,
            ..BurstPlan::default()
        };
        let delivery = Delivery {
            peer: "127.0.0.1:8000".parse().unwrap(),
            bytes_sent: 19,
            reply: Some("0".to_string()),
        };
        let err = BurstError::NoAddressError {
            target: "127.0.0.1:8000".to_string(),
        };
        let records = vec![
            TaskRecord::delivered(0, delivery, Duration::from_millis(4)),
            TaskRecord::failed(1, &err, Duration::from_millis(1)),
        ];
        BurstReport::from_records(Utc::now(), Duration::from_millis(10), &plan, records)
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(ReportFormat::from_path("out/report.csv"), ReportFormat::Csv);
        assert_eq!(ReportFormat::from_path("out/REPORT.CSV"), ReportFormat::Csv);
        assert_eq!(ReportFormat::from_path("report.json"), ReportFormat::Json);
        assert_eq!(ReportFormat::from_path("report"), ReportFormat::Json);
    }

    #[test]
    fn test_render_csv_rows() {
        let csv_output = render_csv(&sample_report()).unwrap();
        let lines: Vec<&str> = csv_output.lines().collect();

        assert_eq!(lines[0], "task,status,peer,bytes_sent,reply,error,elapsed_ms");
        assert_eq!(lines[1], "0,delivered,127.0.0.1:8000,19,0,,4");
        assert!(lines[2].starts_with("1,failed,,0,,"));
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_summary_line() {
        let line = summary_line(&sample_report());
        assert!(line.contains("1/2 delivered (50.0%)"));
        assert!(line.contains("1 failed"));
    }

    #[tokio::test]
    async fn test_write_report_as_json() {
        let storage = MockStorage::default();
        tokio_test::assert_ok!(write_report(&storage, "burst.json", &sample_report()).await);

        let files = storage.files.lock().await;
        let written: serde_json::Value = serde_json::from_slice(&files["burst.json"]).unwrap();
        assert_eq!(written["delivered"], 1);
        assert_eq!(written["records"][1]["status"], "failed");
        assert_eq!(written["target"]["port"], 8000);
    }
}
