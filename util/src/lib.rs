pub mod config;
pub mod id;
pub mod queue;

pub use config::Config;
pub use id::new_id;
pub use queue::QueueMonitor;
