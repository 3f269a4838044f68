pub mod score;
pub mod summary;

pub use score::calculate_risk_score;
pub use summary::generate_overall_summary_and_risk;
