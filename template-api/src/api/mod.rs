pub mod cache;
pub mod database;
pub mod errors;
pub mod status;
pub mod types;
