use anyhow::Result;
use burst_requests::core::{ConfigProvider, TaskStatus};
use burst_requests::{BurstEngine, BurstError, BurstPlan, CliConfig, Payload, TcpConnector, Target};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::Mutex;

/// Loopback daemon that records what every connection sent.
struct SinkDaemon {
    port: u16,
    received: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl SinkDaemon {
    async fn start(reply: Option<&'static [u8]>) -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let port = listener.local_addr()?.port();
        let received = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&received);
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let sink = Arc::clone(&sink);
                tokio::spawn(async move {
                    let mut data = Vec::new();
                    match reply {
                        Some(answer) => {
                            let mut buf = [0u8; 64];
                            while data.len() < Payload::default().len() {
                                match socket.read(&mut buf).await {
                                    Ok(0) | Err(_) => break,
                                    Ok(n) => data.extend_from_slice(&buf[..n]),
                                }
                            }
                            let _ = socket.write_all(answer).await;
                        }
                        None => {
                            let _ = socket.read_to_end(&mut data).await;
                        }
                    }
                    sink.lock().await.push(data);
                });
            }
        });

        Ok(Self { port, received })
    }

    async fn wait_for(&self, connections: usize) -> Vec<Vec<u8>> {
        for _ in 0..200 {
            {
                let received = self.received.lock().await;
                if received.len() >= connections {
                    return received.clone();
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.received.lock().await.clone()
    }
}

async fn closed_port() -> Result<u16> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    Ok(listener.local_addr()?.port())
}

#[tokio::test]
async fn test_every_task_delivers_exact_payload() -> Result<()> {
    let daemon = SinkDaemon::start(None).await?;
    let plan = BurstPlan {
        target: Target::new("127.0.0.1", daemon.port),
        tasks: 120,
        workers: 20,
        ..BurstPlan::default()
    };

    let engine = BurstEngine::new(TcpConnector::from_plan(&plan), plan);
    let report = engine.run().await?;

    assert_eq!(report.delivered, 120);
    assert_eq!(report.failed, 0);
    assert_eq!(report.bytes_sent, 120 * 19);
    assert!(report.is_clean());

    let received = daemon.wait_for(120).await;
    assert_eq!(received.len(), 120);
    assert!(received.iter().all(|data| data == b"a 00:00:00:00:00:00"));
    Ok(())
}

#[tokio::test]
async fn test_replies_are_recorded() -> Result<()> {
    let daemon = SinkDaemon::start(Some(b"0\r\n")).await?;
    let plan = BurstPlan {
        target: Target::new("127.0.0.1", daemon.port),
        tasks: 10,
        workers: 3,
        await_reply: true,
        ..BurstPlan::default()
    };

    let engine = BurstEngine::new(TcpConnector::from_plan(&plan), plan);
    let report = engine.run().await?;

    assert!(report.is_clean());
    assert!(report
        .records
        .iter()
        .all(|r| r.reply.as_deref() == Some("0")));
    Ok(())
}

#[tokio::test]
async fn test_closed_port_marks_every_task_failed() -> Result<()> {
    let port = closed_port().await?;
    let plan = BurstPlan {
        target: Target::new("127.0.0.1", port),
        tasks: 15,
        workers: 5,
        ..BurstPlan::default()
    };

    let engine = BurstEngine::new(TcpConnector::from_plan(&plan), plan);
    let report = engine.run().await?;

    assert_eq!(report.failed, 15);
    assert_eq!(report.delivered, 0);
    assert_eq!(report.bytes_sent, 0);
    assert!(report
        .records
        .iter()
        .all(|r| r.status == TaskStatus::Failed && r.error.is_some()));
    Ok(())
}

#[tokio::test]
async fn test_fail_fast_against_closed_port() -> Result<()> {
    let port = closed_port().await?;
    let config = CliConfig {
        port,
        tasks: 50,
        workers: 5,
        fail_fast: true,
        ..CliConfig::default()
    };

    let plan = config.plan()?;
    let engine = BurstEngine::new(TcpConnector::from_plan(&plan), plan);
    let err = engine.run().await.unwrap_err();

    match err {
        BurstError::AbortedAfterFailure { source, .. } => {
            assert!(matches!(*source, BurstError::ConnectError { .. }));
        }
        other => panic!("unexpected error: {}", other),
    }
    Ok(())
}

#[tokio::test]
async fn test_unresolvable_host_fails_every_task() -> Result<()> {
    let plan = BurstPlan {
        target: Target::new("burst-requests.invalid", 8000),
        tasks: 3,
        workers: 3,
        ..BurstPlan::default()
    };

    let engine = BurstEngine::new(TcpConnector::from_plan(&plan), plan);
    let report = engine.run().await?;

    assert_eq!(report.failed, 3);
    Ok(())
}
