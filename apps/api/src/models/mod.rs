pub mod candidate;
pub mod document;

pub use candidate::{CandidateRecord, Engine, ProjectEntry};
pub use document::{DocumentFormat, RawDocument};
