pub mod api;
pub mod config;
pub mod connector;
pub mod metrics_utils;
pub mod records;
pub mod registry;
pub mod router;
pub mod server;
pub mod state;

#[cfg(test)]
pub mod test_utils;
