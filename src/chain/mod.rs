pub mod types;

pub use types::{Chain, Transaction};
