//! Data types for the screening pipeline.

pub mod config;
pub mod context;
pub mod payload;
pub mod summary;

pub use config::{BatchConfig, ScreenInputs};
pub use context::ScreenContext;
pub use payload::{
    ErrorMessage, FitScore, InspectionResult, JobDescription, StagePayload, UrlResult,
};
pub use summary::SummaryRecord;
