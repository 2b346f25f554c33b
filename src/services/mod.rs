pub mod metrics;
pub mod providers;
pub mod workflow;

pub use metrics::{get_metrics, init_metrics};
pub use workflow::{CaptionWorkflow, UploadedFile};
