pub mod health;
pub mod upload;

pub use health::{health_check, metrics_endpoint, readiness_check};
pub use upload::upload_video;
