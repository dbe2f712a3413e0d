use crate::domain::model::{BurstPlan, Delivery, Payload, Target};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

pub trait Storage: Send + Sync {
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn host(&self) -> &str;
    fn port(&self) -> u16;
    fn payload(&self) -> Result<Payload>;
    fn tasks(&self) -> usize;
    fn workers(&self) -> usize;
    fn connect_timeout(&self) -> Option<Duration>;
    fn await_reply(&self) -> bool;
    fn fail_fast(&self) -> bool;
    fn report_path(&self) -> Option<&str>;

    fn plan(&self) -> Result<BurstPlan> {
        Ok(BurstPlan {
            target: Target::new(self.host(), self.port()),
            payload: self.payload()?,
            tasks: self.tasks(),
            workers: self.workers(),
            connect_timeout: self.connect_timeout(),
            await_reply: self.await_reply(),
            fail_fast: self.fail_fast(),
        })
    }
}

/// One connect-and-send against the target.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    async fn deliver(&self, target: &Target, payload: &Payload) -> Result<Delivery>;
}
