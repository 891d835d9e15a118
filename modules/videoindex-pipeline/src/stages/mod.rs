pub mod embeddings;
pub mod lister;
pub mod transcripts;
pub mod transform;

pub use embeddings::EmbeddingStats;
pub use lister::ListingStats;
pub use transcripts::{TranscriptOutcome, TranscriptStats};
pub use transform::{Replacement, SpecialStrings, TransformStats};
