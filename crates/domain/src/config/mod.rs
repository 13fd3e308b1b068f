//! Configuration module for the HTTPDNS client
//!
//! - `root`: Main configuration, file loading and CLI overrides
//! - `client`: Account, boot servers and resolution defaults
//! - `logging`: Logging settings
//! - `errors`: Configuration errors

pub mod client;
pub mod errors;
pub mod logging;
pub mod root;

pub use client::ClientConfig;
pub use errors::ConfigError;
pub use logging::LoggingConfig;
pub use root::{CliOverrides, Config};
