//! Environment-sourced configuration for the forecast service.

mod config;

pub use config::{Config, DbConfig, get_base_path};
