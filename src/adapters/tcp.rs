use crate::domain::model::{BurstPlan, Delivery, Payload, Target, REPLY_BUFFER_SIZE};
use crate::domain::ports::Connector;
use crate::utils::error::{BurstError, Result};
use async_trait::async_trait;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// Real sockets: resolve, connect to the first reachable address, send.
#[derive(Debug, Clone, Default)]
pub struct TcpConnector {
    connect_timeout: Option<Duration>,
    await_reply: bool,
}

async fn within_timeout<F>(addr: SocketAddr, limit: Duration, connecting: F) -> Result<TcpStream>
where
    F: std::future::Future<Output = std::io::Result<TcpStream>>,
{
    match tokio::time::timeout(limit, connecting).await {
        Ok(stream) => Ok(stream?),
        Err(_) => Err(BurstError::TimeoutError {
            peer: addr,
            after_ms: limit.as_millis() as u64,
        }),
    }
}

fn connect_exhausted(target: &Target, attempts: usize, last_error: Option<BurstError>) -> BurstError {
    let source = match last_error {
        Some(BurstError::IoError(io)) => io,
        Some(BurstError::TimeoutError { .. }) => {
            std::io::Error::new(std::io::ErrorKind::TimedOut, "connect timed out")
        }
        Some(other) => std::io::Error::other(other.to_string()),
        None => std::io::Error::from(std::io::ErrorKind::AddrNotAvailable),
    };
    BurstError::ConnectError {
        target: target.to_string(),
        attempts,
        source,
    }
}

impl TcpConnector {
    pub fn new(connect_timeout: Option<Duration>, await_reply: bool) -> Self {
        Self {
            connect_timeout,
            await_reply,
        }
    }

    pub fn from_plan(plan: &BurstPlan) -> Self {
        Self::new(plan.connect_timeout, plan.await_reply)
    }

    pub async fn resolve(target: &Target) -> Result<Vec<SocketAddr>> {
        let addrs: Vec<SocketAddr> = tokio::net::lookup_host((target.host.as_str(), target.port))
            .await
            .map_err(|source| BurstError::ResolveError {
                target: target.to_string(),
                source,
            })?
            .collect();

        if addrs.is_empty() {
            return Err(BurstError::NoAddressError {
                target: target.to_string(),
            });
        }
        Ok(addrs)
    }

    async fn connect_one(&self, addr: SocketAddr) -> Result<TcpStream> {
        match self.connect_timeout {
            Some(limit) => within_timeout(addr, limit, TcpStream::connect(addr)).await,
            None => Ok(TcpStream::connect(addr).await?),
        }
    }

    async fn connect(&self, target: &Target) -> Result<TcpStream> {
        let addrs = Self::resolve(target).await?;
        self.connect_any(target, addrs).await
    }

    /// Tries `addrs` in order; the first successful connect wins.
    pub(crate) async fn connect_any(
        &self,
        target: &Target,
        addrs: Vec<SocketAddr>,
    ) -> Result<TcpStream> {
        let attempts = addrs.len();
        let mut last_error = None;

        for addr in addrs {
            match self.connect_one(addr).await {
                Ok(stream) => return Ok(stream),
                Err(e) => {
                    tracing::debug!("Connect to {} failed: {}", addr, e);
                    last_error = Some(e);
                }
            }
        }

        Err(connect_exhausted(target, attempts, last_error))
    }

    async fn read_reply(stream: &mut TcpStream) -> std::io::Result<String> {
        let mut buffer = vec![0u8; REPLY_BUFFER_SIZE];
        let mut filled = 0;

        while filled < buffer.len() {
            let n = stream.read(&mut buffer[filled..]).await?;
            if n == 0 {
                break;
            }
            filled += n;
            if buffer[..filled].contains(&b'\n') {
                break;
            }
        }

        Ok(String::from_utf8_lossy(&buffer[..filled]).trim().to_string())
    }
}

#[async_trait]
impl Connector for TcpConnector {
    async fn deliver(&self, target: &Target, payload: &Payload) -> Result<Delivery> {
        let mut stream = self.connect(target).await?;
        let peer = stream.peer_addr()?;
        tracing::trace!("Connected to {}", peer);

        stream
            .write_all(payload.as_bytes())
            .await
            .map_err(|source| BurstError::SendError { peer, source })?;

        let reply = if self.await_reply {
            Some(
                Self::read_reply(&mut stream)
                    .await
                    .map_err(|source| BurstError::ReceiveError { peer, source })?,
            )
        } else {
            None
        };

        // 連線關閉失敗不影響已送出的資料
        if let Err(e) = stream.shutdown().await {
            tracing::trace!("Shutdown of {} failed: {}", peer, e);
        }

        Ok(Delivery {
            peer,
            bytes_sent: payload.len(),
            reply,
        })
    }
}
