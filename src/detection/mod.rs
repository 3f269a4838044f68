pub mod dedup;
pub mod engine;
pub mod rules;
pub mod types;

pub use engine::Detector;
pub use types::{Details, Finding, FindingType};
