//! Configuration module for the Sift runtime.
//!
//! Loads logging, dispatch and route settings from TOML/YAML files and
//! `SIFT_*` environment variables, and validates them (including every route
//! query) before the runtime sees any update.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    DispatchConfig, LogFormat, LogLevel, LogOutput, LogRotation, LoggingConfig, RouteConfig,
    SiftConfig, SpanEventConfig,
};
pub use validation::{compile_route, validate_config};
