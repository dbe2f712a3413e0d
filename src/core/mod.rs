pub mod burst;
pub mod report;

pub use crate::domain::model::{
    BurstPlan, BurstReport, Delivery, Payload, Target, TaskRecord, TaskStatus,
};
pub use crate::domain::ports::{ConfigProvider, Connector, Storage};
pub use crate::utils::error::Result;
