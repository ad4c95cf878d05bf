mod pool;

pub use pool::{QueueDepthHandle, WorkerPool};
