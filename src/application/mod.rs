pub mod commit_grouper;
pub mod poller;
pub mod ports;
pub mod usecases;

pub use commit_grouper::{CommitGrouper, PendingBatch, DEFAULT_GROUP_WINDOW};
pub use poller::Poller;
pub use ports::*;
