pub mod embedder;
pub mod pipeline;
pub mod stages;
pub mod store;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod traits;
pub mod transcript_source;

pub use pipeline::{Pipeline, PipelineStats, Stage};
