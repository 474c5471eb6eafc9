mod auth;
mod dashboard;
mod stats;

pub use dashboard::dashboard;
pub use stats::quick_stats;
