//! Application configuration.

pub mod app_config;
pub mod args;
pub mod store;

pub use app_config::{AppConfig, CacheConfig, EndpointsConfig, LogLevel, NetworkConfig};
pub use args::{CliArgs, Command};
pub use store::{ConfigError, ConfigStorage};
