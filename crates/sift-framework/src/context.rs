//! Per-update context.
//!
//! One [`UpdateContext`] is created for each dispatched update and shared,
//! behind an `Arc`, by every matcher that sees it. It carries:
//!
//! - the read-only [`Event`];
//! - a propagation flag that any handler can clear through
//!   [`Propagation::stop`], ending dispatch after the current handler;
//! - a typed state map. Matchers use it to record the query that matched
//!   ([`MatchedQuery`]); handlers may store their own values.
//!
//! The update itself is never mutated.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use sift_core::{Event, FilterQuery, Update};

/// Handle to the propagation flag of one dispatch cycle.
#[derive(Debug, Clone)]
pub struct Propagation(Arc<AtomicBool>);

impl Propagation {
    fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    /// Stops the update from reaching any further handler or matcher.
    pub fn stop(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    /// Returns `true` while the update is still propagating.
    pub fn is_propagating(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// The query that let the current matcher through.
///
/// With chained filters this is the match of the innermost filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedQuery(pub FilterQuery);

/// The context object shared by all matchers during one dispatch.
pub struct UpdateContext {
    event: Event,
    propagation: Propagation,
    state: Mutex<HashMap<TypeId, Box<dyn Any + Send + Sync>>>,
}

impl UpdateContext {
    /// Creates a context for an update.
    pub fn new(event: impl Into<Event>) -> Self {
        Self {
            event: event.into(),
            propagation: Propagation::new(),
            state: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the event being dispatched.
    pub fn event(&self) -> &Event {
        &self.event
    }

    /// Returns the wrapped update.
    pub fn update(&self) -> &Update {
        self.event.update()
    }

    /// Returns a handle to the propagation flag.
    pub fn propagation(&self) -> Propagation {
        self.propagation.clone()
    }

    /// Stops propagation of this update.
    pub fn stop_propagation(&self) {
        self.propagation.stop();
    }

    /// Returns `true` if the update is still propagating.
    pub fn is_propagating(&self) -> bool {
        self.propagation.is_propagating()
    }

    /// Stores a value in the state map, replacing any value of the same type.
    pub fn set_state<T: Send + Sync + 'static>(&self, value: T) {
        self.state.lock().insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Returns a clone of the stored value of type `T`.
    pub fn get_state<T: Clone + 'static>(&self) -> Option<T> {
        self.state
            .lock()
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref::<T>())
            .cloned()
    }

    /// Returns `true` if a value of type `T` is stored.
    pub fn has_state<T: 'static>(&self) -> bool {
        self.state.lock().contains_key(&TypeId::of::<T>())
    }

    /// Removes and returns the stored value of type `T`.
    pub fn take_state<T: 'static>(&self) -> Option<T> {
        self.state
            .lock()
            .remove(&TypeId::of::<T>())
            .and_then(|v| v.downcast::<T>().ok())
            .map(|v| *v)
    }
}

impl std::fmt::Debug for UpdateContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateContext")
            .field("update_id", &self.event.update_id())
            .field("kind", &self.event.kind())
            .field("is_propagating", &self.is_propagating())
            .finish_non_exhaustive()
    }
}
