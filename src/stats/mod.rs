mod counter;
pub mod handlers;
pub mod models;
mod service;

pub use models::{StatsReport, StatsResult};
pub use service::{StatsError, StatsService};
