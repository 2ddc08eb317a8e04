//! Handler system for the Sift framework.
//!
//! Handlers are plain async functions. Every parameter is an extractor
//! ([`FromContext`]); if any of them cannot be extracted, the handler is
//! skipped for that update.
//!
//! # Example
//!
//! ```rust,ignore
//! use sift_framework::{Chat, Msg, Propagation};
//!
//! async fn log_any() {
//!     tracing::info!("update received");
//! }
//!
//! async fn echo(msg: Msg, chat: Chat) {
//!     println!("{} in {}", msg["text"], chat["id"]);
//! }
//!
//! async fn swallow(propagation: Propagation) {
//!     propagation.stop();
//! }
//! ```

use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::Arc;

use tracing::trace;

use crate::context::UpdateContext;
use crate::extractor::FromContext;

/// A type alias for a boxed, pinned future that is `Send`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

// ============================================================================
// Handler Trait
// ============================================================================

/// The core trait for update handlers.
///
/// Implemented for async functions taking 0-8 extractor parameters and
/// returning `()`.
pub trait Handler<T>: Clone + Send + Sync + 'static {
    /// The type of future calling this handler returns.
    type Future: Future<Output = ()> + Send + 'static;

    /// Call the handler with the given context.
    fn call(self, ctx: Arc<UpdateContext>) -> Self::Future;
}

// ============================================================================
// Type erasure
// ============================================================================

/// A wrapper that turns a function into an [`ErasedHandler`].
pub struct HandlerFn<F, T> {
    f: F,
    _marker: PhantomData<fn() -> T>,
}

impl<F, T> HandlerFn<F, T> {
    /// Creates a new handler function wrapper.
    pub fn new(f: F) -> Self {
        Self {
            f,
            _marker: PhantomData,
        }
    }
}

impl<F: Clone, T> Clone for HandlerFn<F, T> {
    fn clone(&self) -> Self {
        Self {
            f: self.f.clone(),
            _marker: PhantomData,
        }
    }
}

/// A type-erased handler that can be stored in collections.
pub type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync>;

/// Type-erased handler trait for dynamic dispatch.
pub trait ErasedHandler: Send + Sync {
    /// Execute the handler with the given context.
    fn call(&self, ctx: Arc<UpdateContext>) -> BoxFuture<'static, ()>;
}

impl<F, T> ErasedHandler for HandlerFn<F, T>
where
    F: Handler<T> + Send + Sync,
    T: 'static,
{
    fn call(&self, ctx: Arc<UpdateContext>) -> BoxFuture<'static, ()> {
        let f = self.f.clone();
        Box::pin(async move {
            f.call(ctx).await;
        })
    }
}

/// Convert a handler function into a boxed handler.
pub fn into_handler<F, T>(f: F) -> BoxedHandler
where
    F: Handler<T> + Send + Sync + 'static,
    T: 'static,
{
    Arc::new(HandlerFn::new(f))
}

// ============================================================================
// Handler implementations for functions
// ============================================================================

impl<F, Fut> Handler<()> for F
where
    F: FnOnce() -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    type Future = Fut;

    fn call(self, _ctx: Arc<UpdateContext>) -> Self::Future {
        (self)()
    }
}

macro_rules! impl_handler {
    (
        $($ty:ident),*
    ) => {
        #[allow(non_snake_case, unused_mut, unused_variables)]
        impl<F, Fut, $($ty,)*> Handler<($($ty,)*)> for F
        where
            F: FnOnce($($ty,)*) -> Fut + Clone + Send + Sync + 'static,
            Fut: Future<Output = ()> + Send + 'static,
            $( $ty: FromContext + Send + 'static, )*
        {
            type Future = BoxFuture<'static, ()>;

            fn call(self, ctx: Arc<UpdateContext>) -> Self::Future {
                Box::pin(async move {
                    $(
                        let $ty = match $ty::from_context(&ctx) {
                            Ok(value) => value,
                            Err(error) => {
                                trace!(%error, "Skipping handler");
                                return;
                            }
                        };
                    )*

                    (self)($($ty,)*).await;
                })
            }
        }
    };
}

impl_handler!(T1);
impl_handler!(T1, T2);
impl_handler!(T1, T2, T3);
impl_handler!(T1, T2, T3, T4);
impl_handler!(T1, T2, T3, T4, T5);
impl_handler!(T1, T2, T3, T4, T5, T6);
impl_handler!(T1, T2, T3, T4, T5, T6, T7);
impl_handler!(T1, T2, T3, T4, T5, T6, T7, T8);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::{Chat, Msg};
    use parking_lot::Mutex;
    use sift_core::Update;

    fn context(value: serde_json::Value) -> Arc<UpdateContext> {
        Arc::new(UpdateContext::new(Update::from_value(value).unwrap()))
    }

    #[test]
    fn test_handler_skipped_when_extraction_fails() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let handler = into_handler(move |msg: Msg, chat: Chat| {
            let sink = Arc::clone(&sink);
            async move {
                sink.lock().push((msg["message_id"].clone(), chat["id"].clone()));
            }
        });

        tokio_test::block_on(handler.call(context(serde_json::json!({
            "update_id": 1,
            "message": {"message_id": 5, "chat": {"id": 9}}
        }))));
        tokio_test::block_on(handler.call(context(serde_json::json!({
            "update_id": 2,
            "inline_query": {"id": "q"}
        }))));

        let seen = seen.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0], (serde_json::json!(5), serde_json::json!(9)));
    }

    #[test]
    fn test_zero_arg_handler_always_runs() {
        let hits = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&hits);
        let handler = into_handler(move || {
            let counter = Arc::clone(&counter);
            async move {
                *counter.lock() += 1;
            }
        });

        tokio_test::block_on(handler.call(Arc::new(UpdateContext::new(Update::new(1)))));
        assert_eq!(*hits.lock(), 1);
    }
}
