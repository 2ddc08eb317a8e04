//! Update processing runtime.
//!
//! [`SiftRuntime`] ties configuration, logging and a [`Dispatcher`] together.
//! Routes are declared in configuration (name plus queries) and validated at
//! load time; handlers are bound to them by name in code.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use sift_runtime::SiftRuntime;
//!
//! let runtime = SiftRuntime::builder()
//!     .config_file("sift.toml")
//!     .profile("production")
//!     .build()?;
//!
//! runtime.bind_route("links", scan_links).await?;
//! runtime.register_matcher(on_callback_query().handler(answer)).await;
//!
//! runtime.run(updates).await?;
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::{Stream, StreamExt};
use sift_core::{Filter, Update};
use sift_framework::{Dispatcher, Handler, Matcher};
use tokio::signal;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{ConfigLoader, ConfigResult, SiftConfig, compile_route, validate_config};
use crate::error::{RuntimeError, RuntimeResult};
use crate::logging;

/// A configured route, compiled once at startup.
#[derive(Debug, Clone)]
struct Route {
    filter: Filter,
    block: bool,
    enabled: bool,
}

/// One item of a run loop's input.
enum Incoming {
    Parsed(Update),
    Raw(String),
}

#[derive(Debug, Default)]
struct Counters {
    received: AtomicU64,
    matched: AtomicU64,
    unmatched: AtomicU64,
    rejected: AtomicU64,
}

/// A snapshot of the runtime's update counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuntimeStats {
    /// Updates handed to the dispatcher.
    pub received: u64,
    /// Updates accepted by at least one matcher.
    pub matched: u64,
    /// Updates no matcher accepted.
    pub unmatched: u64,
    /// Inputs rejected before dispatch.
    pub rejected: u64,
}

/// The Sift runtime.
pub struct SiftRuntime {
    config: SiftConfig,
    routes: HashMap<String, Route>,
    dispatcher: RwLock<Dispatcher>,
    counters: Arc<Counters>,
    shutdown: CancellationToken,
}

impl SiftRuntime {
    /// Creates a runtime from the configuration found in the current
    /// directory, or built-in defaults if there is none.
    pub fn new() -> ConfigResult<Self> {
        Self::builder().build()
    }

    /// Creates a runtime builder for custom configuration.
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Creates a runtime from an already loaded configuration.
    ///
    /// The configuration is validated again and every route compiled, so
    /// this fails on the same errors as [`ConfigLoader::load`].
    pub fn from_config(config: &SiftConfig) -> ConfigResult<Self> {
        validate_config(config)?;
        logging::init_from_config(&config.logging)?;

        let routes = config
            .routes
            .iter()
            .map(|route| -> ConfigResult<(String, Route)> {
                let compiled = Route {
                    filter: compile_route(route)?,
                    block: route.block,
                    enabled: route.enabled,
                };
                Ok((route.name.clone(), compiled))
            })
            .collect::<ConfigResult<HashMap<_, _>>>()?;

        info!(
            log_level = %config.logging.level,
            log_format = ?config.logging.format,
            routes = routes.len(),
            strict = config.dispatch.strict,
            "Runtime initialized from configuration"
        );

        Ok(Self {
            config: config.clone(),
            routes,
            dispatcher: RwLock::new(Dispatcher::new()),
            counters: Arc::new(Counters::default()),
            shutdown: CancellationToken::new(),
        })
    }

    /// Returns a reference to the configuration.
    pub fn config(&self) -> &SiftConfig {
        &self.config
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Binds a handler to a configured route.
    ///
    /// Disabled routes accept the call but register nothing. Binding the
    /// same route twice registers two matchers.
    pub async fn bind_route<H, T>(&self, name: &str, handler: H) -> RuntimeResult<()>
    where
        H: Handler<T> + Send + Sync + 'static,
        T: 'static,
    {
        let route = self
            .routes
            .get(name)
            .ok_or_else(|| RuntimeError::UnknownRoute(name.to_string()))?;

        if !route.enabled {
            info!(route = name, "Route is disabled, handler not registered");
            return Ok(());
        }

        let matcher = Matcher::new()
            .name(name)
            .filter(route.filter.clone())
            .block(route.block)
            .handler(handler);

        self.register_matcher(matcher).await;
        debug!(route = name, filter = %route.filter, "Bound handler to route");
        Ok(())
    }

    /// Registers a matcher.
    ///
    /// Matchers are checked in registration order.
    pub async fn register_matcher(&self, matcher: Matcher) {
        self.dispatcher.write().await.add(matcher);
    }

    /// Registers multiple matchers at once.
    pub async fn register_matchers(&self, matchers: Vec<Matcher>) {
        let mut dispatcher = self.dispatcher.write().await;
        for matcher in matchers {
            dispatcher.add(matcher);
        }
    }

    /// Returns the number of registered matchers.
    pub async fn matcher_count(&self) -> usize {
        self.dispatcher.read().await.matcher_count()
    }

    // =========================================================================
    // Processing
    // =========================================================================

    /// Dispatches one update.
    ///
    /// In strict mode an update without exactly one variant is rejected.
    /// Returns whether any matcher accepted the update.
    pub async fn process(&self, update: Update) -> RuntimeResult<bool> {
        if self.config.dispatch.strict
            && let Err(e) = update.check_exclusive()
        {
            self.counters.rejected.fetch_add(1, Ordering::Relaxed);
            return Err(e.into());
        }

        self.counters.received.fetch_add(1, Ordering::Relaxed);
        let update_id = update.update_id;

        // Dispatch on a snapshot so handlers may register matchers.
        let dispatcher = self.dispatcher.read().await.clone();
        let matched = dispatcher.dispatch(update).await;

        if matched {
            self.counters.matched.fetch_add(1, Ordering::Relaxed);
        } else {
            self.counters.unmatched.fetch_add(1, Ordering::Relaxed);
            if self.config.dispatch.log_unmatched {
                debug!(update_id, "No matcher accepted update");
            }
        }

        Ok(matched)
    }

    /// Parses and dispatches one JSON-encoded update.
    pub async fn process_json(&self, raw: &str) -> RuntimeResult<bool> {
        match Update::from_json(raw) {
            Ok(update) => self.process(update).await,
            Err(e) => {
                self.counters.rejected.fetch_add(1, Ordering::Relaxed);
                Err(e.into())
            }
        }
    }

    /// Processes updates from `updates` one at a time.
    ///
    /// Returns when the stream ends, on Ctrl+C, or when the
    /// [`shutdown_token`](Self::shutdown_token) is cancelled. Rejected
    /// updates are logged and skipped.
    pub async fn run<S>(&self, updates: S) -> RuntimeResult<()>
    where
        S: Stream<Item = Update>,
    {
        self.run_loop(updates.map(Incoming::Parsed)).await
    }

    /// Like [`run`](Self::run), but over raw JSON documents.
    ///
    /// Each item goes through [`process_json`](Self::process_json), so
    /// malformed input is counted as rejected rather than dropped unseen.
    pub async fn run_json<S>(&self, documents: S) -> RuntimeResult<()>
    where
        S: Stream<Item = String>,
    {
        self.run_loop(documents.map(Incoming::Raw)).await
    }

    async fn run_loop<S>(&self, incoming: S) -> RuntimeResult<()>
    where
        S: Stream<Item = Incoming>,
    {
        let incoming = incoming.fuse();
        tokio::pin!(incoming);
        let ctrl_c = signal::ctrl_c();
        tokio::pin!(ctrl_c);

        info!("Sift runtime is now running. Press Ctrl+C to stop.");

        loop {
            tokio::select! {
                biased;

                () = self.shutdown.cancelled() => {
                    info!("Shutdown requested");
                    break;
                }
                result = &mut ctrl_c => {
                    result?;
                    info!("Received Ctrl+C, shutting down");
                    break;
                }
                next = incoming.next() => match next {
                    Some(item) => {
                        let result = match item {
                            Incoming::Parsed(update) => self.process(update).await,
                            Incoming::Raw(raw) => self.process_json(&raw).await,
                        };
                        if let Err(e) = result {
                            warn!(error = %e, "Skipping update");
                        }
                    }
                    None => {
                        info!("Update stream ended");
                        break;
                    }
                },
            }
        }

        let stats = self.stats();
        info!(
            received = stats.received,
            matched = stats.matched,
            unmatched = stats.unmatched,
            rejected = stats.rejected,
            "Runtime stopped"
        );
        Ok(())
    }

    /// Returns a token that stops [`run`](Self::run) when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Requests shutdown.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Returns a snapshot of the update counters.
    pub fn stats(&self) -> RuntimeStats {
        RuntimeStats {
            received: self.counters.received.load(Ordering::Relaxed),
            matched: self.counters.matched.load(Ordering::Relaxed),
            unmatched: self.counters.unmatched.load(Ordering::Relaxed),
            rejected: self.counters.rejected.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Debug for SiftRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SiftRuntime")
            .field("routes", &self.routes.keys().collect::<Vec<_>>())
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for creating a [`SiftRuntime`] with custom configuration.
pub struct RuntimeBuilder {
    config_loader: ConfigLoader,
}

impl RuntimeBuilder {
    /// Creates a new runtime builder searching the current directory.
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new().with_current_dir(),
        }
    }

    /// Sets a specific configuration file to load.
    pub fn config_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    /// Sets the configuration profile (e.g., "development", "production").
    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    /// Disables loading environment variables.
    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Merges additional configuration programmatically.
    pub fn merge(mut self, config: SiftConfig) -> Self {
        self.config_loader = self.config_loader.merge(config);
        self
    }

    /// Builds the runtime.
    pub fn build(self) -> ConfigResult<SiftRuntime> {
        let config = self.config_loader.load()?;
        SiftRuntime::from_config(&config)
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigError, RouteConfig};
    use sift_core::UpdateError;
    use sift_framework::{Msg, on_callback_query};
    use std::sync::atomic::AtomicUsize;

    fn runtime(routes: Vec<RouteConfig>) -> SiftRuntime {
        SiftRuntime::from_config(&SiftConfig {
            routes,
            ..Default::default()
        })
        .unwrap()
    }

    fn counter_handler(
        counter: &Arc<AtomicUsize>,
    ) -> impl Fn(Msg) -> std::future::Ready<()> + Clone + Send + Sync + 'static {
        let counter = Arc::clone(counter);
        move |_msg: Msg| {
            counter.fetch_add(1, Ordering::SeqCst);
            std::future::ready(())
        }
    }

    #[test]
    fn test_invalid_route_fails_at_startup() {
        let result = SiftRuntime::from_config(&SiftConfig {
            routes: vec![RouteConfig::new("bad", ["message:text:url:extra"])],
            ..Default::default()
        });
        assert!(matches!(result, Err(ConfigError::InvalidQuery { .. })));
    }

    #[tokio::test]
    async fn test_bind_route_and_process() {
        let counter = Arc::new(AtomicUsize::new(0));
        let runtime = runtime(vec![RouteConfig::new(
            "links",
            ["message:entities:url", "channel_post:entities:url"],
        )]);

        runtime
            .bind_route("links", counter_handler(&counter))
            .await
            .unwrap();
        assert_eq!(runtime.matcher_count().await, 1);

        let link = r#"{"update_id": 1, "channel_post": {"entities": [{"type": "url"}]}}"#;
        let plain = r#"{"update_id": 2, "message": {"text": "no links"}}"#;

        assert!(runtime.process_json(link).await.unwrap());
        assert!(!runtime.process_json(plain).await.unwrap());
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        let stats = runtime.stats();
        assert_eq!((stats.received, stats.matched, stats.unmatched), (2, 1, 1));
    }

    #[tokio::test]
    async fn test_unknown_and_disabled_routes() {
        let mut disabled = RouteConfig::new("off", ["poll"]);
        disabled.enabled = false;
        let runtime = runtime(vec![disabled]);

        assert!(matches!(
            runtime.bind_route("missing", || async {}).await,
            Err(RuntimeError::UnknownRoute(name)) if name == "missing"
        ));
        runtime.bind_route("off", || async {}).await.unwrap();
        assert_eq!(runtime.matcher_count().await, 0);
    }

    #[tokio::test]
    async fn test_blocking_route() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut route = RouteConfig::new("first", ["message"]);
        route.block = true;
        let runtime = runtime(vec![route, RouteConfig::new("second", ["message:text"])]);

        runtime.bind_route("first", counter_handler(&counter)).await.unwrap();
        runtime.bind_route("second", counter_handler(&counter)).await.unwrap();

        runtime
            .process_json(r#"{"update_id": 1, "message": {"text": "x"}}"#)
            .await
            .unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_rejected_input() {
        let mut config = SiftConfig::default();
        config.dispatch.strict = true;
        let runtime = SiftRuntime::from_config(&config).unwrap();

        assert!(matches!(
            runtime.process_json("not json").await,
            Err(RuntimeError::Update(UpdateError::Parse { .. }))
        ));
        assert!(matches!(
            runtime.process(Update::new(5)).await,
            Err(RuntimeError::Update(UpdateError::NoVariant { update_id: 5 }))
        ));
        assert_eq!(runtime.stats().rejected, 2);
        assert_eq!(runtime.stats().received, 0);
    }

    #[tokio::test]
    async fn test_run_until_stream_ends() {
        let counter = Arc::new(AtomicUsize::new(0));
        let runtime = runtime(Vec::new());
        let c = Arc::clone(&counter);
        runtime
            .register_matcher(on_callback_query().handler(move || {
                let c = Arc::clone(&c);
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                }
            }))
            .await;

        let updates = (1..=3).map(|id| {
            Update::from_value(serde_json::json!({"update_id": id, "callback_query": {"id": "q"}}))
                .unwrap()
        });
        runtime.run(futures::stream::iter(updates)).await.unwrap();

        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert_eq!(runtime.stats().matched, 3);
    }

    #[tokio::test]
    async fn test_run_json_counts_malformed_documents() {
        let runtime = runtime(Vec::new());
        runtime
            .register_matcher(on_callback_query().handler(|| async {}))
            .await;

        let documents = [
            r#"{"update_id": 1, "callback_query": {"id": "q"}}"#,
            "not json",
            r#"{"update_id": 2, "poll": {"id": "p"}}"#,
        ]
        .map(String::from);
        runtime.run_json(futures::stream::iter(documents)).await.unwrap();

        assert_eq!(
            runtime.stats(),
            RuntimeStats {
                received: 2,
                matched: 1,
                unmatched: 1,
                rejected: 1,
            }
        );
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown_token() {
        let runtime = runtime(Vec::new());
        runtime.shutdown_token().cancel();

        runtime.run(futures::stream::pending::<Update>()).await.unwrap();
        assert_eq!(runtime.stats(), RuntimeStats::default());
    }
}
