//! Update dispatcher for the Sift framework.
//!
//! The [`Dispatcher`] holds an ordered list of [`Matcher`]s. When an update
//! is dispatched:
//!
//! 1. matchers are checked in registration order;
//! 2. every matcher that accepts the update runs its handlers;
//! 3. dispatch stops after a blocking matcher accepts the update, or as soon
//!    as a handler stops propagation.
//!
//! ```rust,ignore
//! use sift_framework::{Dispatcher, Matcher};
//!
//! let mut dispatcher = Dispatcher::new();
//!
//! dispatcher.on("message:entities:url", scan_links)?;
//! dispatcher.add(Matcher::new().on("callback_query")?.block(true).handler(answer));
//! dispatcher.use_handler(log_everything);
//!
//! dispatcher.dispatch(update).await;
//! ```

use std::sync::Arc;

use sift_core::{Event, IntoFilter, QueryResult};
use tracing::{Instrument, Level, debug, span};

use crate::context::UpdateContext;
use crate::handler::Handler;
use crate::matcher::Matcher;

/// Routes updates to registered matchers.
///
/// `Dispatcher` is `Send + Sync`; clones share their matchers' handlers.
#[derive(Default, Clone)]
pub struct Dispatcher {
    matchers: Vec<Matcher>,
}

impl Dispatcher {
    /// Creates a new, empty dispatcher.
    pub fn new() -> Self {
        Self {
            matchers: Vec::new(),
        }
    }

    /// Adds a matcher to this dispatcher.
    ///
    /// Matchers are checked in the order they are added.
    pub fn add(&mut self, matcher: Matcher) {
        self.matchers.push(matcher);
    }

    /// Adds a matcher to this dispatcher (builder pattern).
    pub fn with(mut self, matcher: Matcher) -> Self {
        self.matchers.push(matcher);
        self
    }

    /// Registers `handler` for updates matching `filter`.
    ///
    /// Fails without registering anything if a query is malformed.
    pub fn on<F, H, T>(&mut self, filter: F, handler: H) -> QueryResult<&mut Self>
    where
        F: IntoFilter,
        H: Handler<T> + Send + Sync + 'static,
        T: 'static,
    {
        let matcher = Matcher::new().on(filter)?.handler(handler);
        self.add(matcher);
        Ok(self)
    }

    /// Registers `handler` for every update.
    pub fn use_handler<H, T>(&mut self, handler: H) -> &mut Self
    where
        H: Handler<T> + Send + Sync + 'static,
        T: 'static,
    {
        self.add(Matcher::new().name("*").handler(handler));
        self
    }

    /// Returns the number of registered matchers.
    pub fn matcher_count(&self) -> usize {
        self.matchers.len()
    }

    /// Returns the registered matchers in order.
    pub fn matchers(&self) -> &[Matcher] {
        &self.matchers
    }

    /// Clears all registered matchers.
    pub fn clear(&mut self) {
        self.matchers.clear();
    }

    /// Dispatches an update to the registered matchers.
    ///
    /// Returns `true` if any matcher accepted the update.
    pub async fn dispatch(&self, event: impl Into<Event>) -> bool {
        self.dispatch_context(Arc::new(UpdateContext::new(event)))
            .await
    }

    /// Dispatches with a caller-provided context.
    ///
    /// Lets the caller inspect the context's state after dispatch.
    pub async fn dispatch_context(&self, ctx: Arc<UpdateContext>) -> bool {
        let event = ctx.event();
        let span = span!(
            Level::DEBUG,
            "dispatch",
            update_id = event.update_id(),
            kind = event.kind().map(|k| k.as_str()).unwrap_or("none"),
        );

        async move {
            let mut any_matched = false;

            for matcher in &self.matchers {
                if !ctx.is_propagating() {
                    debug!("Propagation stopped, ending dispatch");
                    break;
                }

                if matcher.execute(Arc::clone(&ctx)).await {
                    any_matched = true;

                    if matcher.is_blocking() {
                        debug!(
                            matcher = matcher.get_name().unwrap_or("unnamed"),
                            "Blocking matcher matched, stopping dispatch"
                        );
                        break;
                    }
                }
            }

            any_matched
        }
        .instrument(span)
        .await
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("matcher_count", &self.matchers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{MatchedQuery, Propagation};
    use parking_lot::Mutex;
    use serde_json::json;
    use sift_core::Update;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn update(value: serde_json::Value) -> Update {
        Update::from_value(value).unwrap()
    }

    fn counting(
        counter: &Arc<AtomicUsize>,
        step: usize,
    ) -> impl Fn() -> std::future::Ready<()> + Clone + Send + Sync + 'static {
        let counter = Arc::clone(counter);
        move || {
            counter.fetch_add(step, Ordering::SeqCst);
            std::future::ready(())
        }
    }

    #[tokio::test]
    async fn test_dispatch_no_matchers() {
        let dispatcher = Dispatcher::new();
        assert!(!dispatcher.dispatch(Update::new(1)).await);
    }

    #[tokio::test]
    async fn test_broadcast_in_registration_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut dispatcher = Dispatcher::new();

        for (name, query) in [("text", "message:text"), ("any", "message"), ("post", "channel_post")] {
            let order = Arc::clone(&order);
            dispatcher
                .on(query, move || {
                    let order = Arc::clone(&order);
                    async move {
                        order.lock().push(name);
                    }
                })
                .unwrap();
        }

        let matched = dispatcher
            .dispatch(update(json!({"update_id": 1, "message": {"text": "hi"}})))
            .await;

        assert!(matched);
        assert_eq!(*order.lock(), vec!["text", "any"]);
    }

    #[tokio::test]
    async fn test_blocking_matcher_stops_dispatch() {
        let counter = Arc::new(AtomicUsize::new(0));

        let dispatcher = Dispatcher::new()
            .with(
                Matcher::new()
                    .on("callback_query")
                    .unwrap()
                    .block(true)
                    .handler(counting(&counter, 1)),
            )
            .with(Matcher::new().handler(counting(&counter, 10)));

        dispatcher
            .dispatch(update(json!({"update_id": 1, "callback_query": {"id": "c"}})))
            .await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        // A blocking matcher that rejects the update does not block.
        dispatcher
            .dispatch(update(json!({"update_id": 2, "message": {}})))
            .await;
        assert_eq!(counter.load(Ordering::SeqCst), 11);
    }

    #[tokio::test]
    async fn test_stop_propagation_ends_dispatch() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut dispatcher = Dispatcher::new();

        dispatcher.use_handler(|propagation: Propagation| async move {
            propagation.stop();
        });
        dispatcher.use_handler(counting(&counter, 1));

        assert!(dispatcher.dispatch(Update::new(1)).await);
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_invalid_query_registers_nothing() {
        let mut dispatcher = Dispatcher::new();
        assert!(dispatcher.on("message:", || async {}).is_err());
        assert!(dispatcher.on(Vec::<String>::new(), || async {}).is_err());
        assert_eq!(dispatcher.matcher_count(), 0);
    }

    #[tokio::test]
    async fn test_dispatch_context_exposes_state() {
        let dispatcher = Dispatcher::new()
            .with(Matcher::new().on(["poll", "poll_answer"]).unwrap());
        let ctx = Arc::new(UpdateContext::new(update(json!({
            "update_id": 1,
            "poll_answer": {"poll_id": "p"}
        }))));

        assert!(dispatcher.dispatch_context(Arc::clone(&ctx)).await);
        assert_eq!(
            ctx.get_state::<MatchedQuery>().unwrap().0.as_str(),
            "poll_answer"
        );
    }

    #[test]
    fn test_dispatch_leaves_update_untouched() {
        let dispatcher = Dispatcher::new().with(Matcher::new().on("message:text").unwrap());
        let original = update(json!({"update_id": 5, "message": {"text": "x"}}));
        let event = Event::new(original.clone());

        assert!(tokio_test::block_on(dispatcher.dispatch(event.clone())));
        assert_eq!(event.update(), &original);
    }
}
