pub mod scam_db;
