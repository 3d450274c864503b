mod board;
pub mod handlers;
mod jobs;
mod service;

pub use board::{StatsBoard, StatsSnapshot};
pub use jobs::PollScheduler;
pub use service::StatsPoller;
