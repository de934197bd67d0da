pub mod batch;
pub mod queue;
pub mod worker;

pub use batch::{BatchError, BatchReport, BatchRunner};
pub use queue::{ChannelJobQueue, Job, JobQueue};
pub use worker::{JobResult, Worker};
