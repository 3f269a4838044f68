pub mod alert;
pub mod api;
pub mod chain;
pub mod config;
pub mod detection;
pub mod entity;
pub mod explorer;
pub mod pipeline;
pub mod risk;
