//! Sift Runtime - configuration, logging and update processing.
//!
//! This crate provides:
//! - figment-based configuration (`sift.toml` / `sift.yaml` / `SIFT_*`)
//!   with routes declared by name and validated at load time
//! - Logging configuration on top of `tracing-subscriber`
//! - [`SiftRuntime`], which binds handlers to routes and drives a stream of
//!   updates through the dispatcher
//!
//! ```ignore
//! use sift_runtime::SiftRuntime;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = SiftRuntime::new()?;
//!     runtime.bind_route("links", scan_links).await?;
//!     runtime.run(updates()).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod runtime;

pub use config::{ConfigError, ConfigLoader, ConfigResult, RouteConfig, SiftConfig};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingError, init_from_config};
pub use runtime::{RuntimeBuilder, RuntimeStats, SiftRuntime};

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Prelude module with the common logging macros.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
