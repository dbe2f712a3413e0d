use crate::core::{BurstPlan, BurstReport, Connector, TaskRecord};
use crate::utils::error::{BurstError, Result};
use crate::utils::monitor::ResourceMonitor;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::{Id, JoinError, JoinSet};

type TaskOutput = (usize, Result<crate::core::Delivery>, Duration);

/// Records are reserved up front only up to this many tasks.
const RECORD_PREALLOCATION: usize = 64 * 1024;

/// Fans a burst out over a bounded number of concurrent deliveries.
pub struct BurstEngine<N: Connector> {
    connector: Arc<N>,
    plan: BurstPlan,
    monitor: ResourceMonitor,
}

/// Bookkeeping for one `run()`.
struct Collector {
    records: Vec<TaskRecord>,
    task_ids: HashMap<Id, usize>,
    failed: usize,
    progress_step: usize,
    tasks: usize,
    fail_fast: bool,
}

impl Collector {
    fn new(plan: &BurstPlan) -> Self {
        Self {
            records: Vec::with_capacity(plan.tasks.min(RECORD_PREALLOCATION)),
            task_ids: HashMap::new(),
            failed: 0,
            progress_step: (plan.tasks / 10).max(1),
            tasks: plan.tasks,
            fail_fast: plan.fail_fast,
        }
    }

    fn collect(&mut self, joined: std::result::Result<(Id, TaskOutput), JoinError>) -> Result<()> {
        let (task, outcome, elapsed) = match joined {
            Ok((id, output)) => {
                self.task_ids.remove(&id);
                output
            }
            Err(e) => {
                let task = self.task_ids.remove(&e.id());
                return Err(BurstError::TaskPanicked {
                    task,
                    message: panic_message(e),
                });
            }
        };

        match outcome {
            Ok(delivery) => {
                tracing::trace!(
                    "Task {} delivered {} bytes to {}",
                    task,
                    delivery.bytes_sent,
                    delivery.peer
                );
                self.records.push(TaskRecord::delivered(task, delivery, elapsed));
            }
            Err(e) if self.fail_fast => {
                tracing::error!("❌ Task {} failed, aborting burst: {}", task, e);
                return Err(BurstError::AbortedAfterFailure {
                    task,
                    source: Box::new(e),
                });
            }
            Err(e) => {
                self.failed += 1;
                if self.failed == 1 {
                    tracing::warn!("⚠️ Task {} failed: {}", task, e);
                } else {
                    tracing::debug!("Task {} failed: {}", task, e);
                }
                self.records.push(TaskRecord::failed(task, &e, elapsed));
            }
        }

        let done = self.records.len();
        if done % self.progress_step == 0 || done == self.tasks {
            tracing::info!(
                "⏳ {}/{} tasks done ({} failed)",
                done,
                self.tasks,
                self.failed
            );
        }
        Ok(())
    }
}

fn panic_message(error: JoinError) -> String {
    if error.is_cancelled() {
        return "cancelled".to_string();
    }
    let payload = error.into_panic();
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

impl<N: Connector> BurstEngine<N> {
    pub fn new(connector: N, plan: BurstPlan) -> Self {
        Self::new_with_monitoring(connector, plan, false)
    }

    pub fn new_with_monitoring(connector: N, plan: BurstPlan, monitor_enabled: bool) -> Self {
        Self {
            connector: Arc::new(connector),
            plan,
            monitor: ResourceMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&self) -> Result<BurstReport> {
        let started_at = Utc::now();
        let clock = Instant::now();

        tracing::info!(
            "🚀 Starting burst: {} tasks over {} workers -> {} ({} byte payload)",
            self.plan.tasks,
            self.plan.workers,
            self.plan.target,
            self.plan.payload.len()
        );
        tracing::debug!("Payload: {:?}", self.plan.payload.preview());
        self.monitor.log_stats("Before burst");

        let semaphore = Arc::new(Semaphore::new(self.plan.workers));
        let target = Arc::new(self.plan.target.clone());
        let payload = Arc::new(self.plan.payload.clone());
        let mut in_flight: JoinSet<TaskOutput> = JoinSet::new();
        let mut collector = Collector::new(&self.plan);

        for task in 0..self.plan.tasks {
            // 同時最多 workers 個連線
            let permit = Arc::clone(&semaphore)
                .acquire_owned()
                .await
                .map_err(|e| BurstError::TaskPanicked {
                    task: Some(task),
                    message: e.to_string(),
                })?;

            let connector = Arc::clone(&self.connector);
            let target = Arc::clone(&target);
            let payload = Arc::clone(&payload);
            let handle = in_flight.spawn(async move {
                let _permit = permit;
                let clock = Instant::now();
                let outcome = connector.deliver(&target, &payload).await;
                (task, outcome, clock.elapsed())
            });
            collector.task_ids.insert(handle.id(), task);

            while let Some(joined) = in_flight.try_join_next_with_id() {
                collector.collect(joined)?;
            }
        }

        while let Some(joined) = in_flight.join_next_with_id().await {
            collector.collect(joined)?;
        }

        let report =
            BurstReport::from_records(started_at, clock.elapsed(), &self.plan, collector.records);

        self.monitor.log_stats("After burst");
        self.monitor.log_final_stats();
        tracing::info!(
            "✅ Burst finished: {} delivered, {} failed in {}ms ({:.1} conn/s)",
            report.delivered,
            report.failed,
            report.elapsed_ms,
            report.throughput()
        );

        Ok(report)
    }
}
