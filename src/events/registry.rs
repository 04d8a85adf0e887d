//! Typed subscription registry.
//!
//! One ordered subscription list per event category, keyed by the category's
//! static type tag. Handlers and filters are stored type-erased and recover
//! their concrete event type by downcasting the envelope payload, so a single
//! registry can hold subscriptions for arbitrarily many event types.

use std::any::Any;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::warn;

use crate::events::filter::EventFilter;
use crate::events::types::{Event, EventHandler, EventPriority, EventResult, EventType, SubscriptionId};

/// Type-erased handler invoked with the envelope payload.
#[async_trait]
pub(crate) trait ErasedHandler: Send + Sync {
    async fn handle(&self, payload: &(dyn Any + Send + Sync)) -> EventResult<()>;
}

struct TypedHandler<E, H> {
    handler: H,
    _marker: PhantomData<fn() -> E>,
}

#[async_trait]
impl<E, H> ErasedHandler for TypedHandler<E, H>
where
    E: Event,
    H: EventHandler<E> + 'static,
{
    async fn handle(&self, payload: &(dyn Any + Send + Sync)) -> EventResult<()> {
        match payload.downcast_ref::<E>() {
            Some(event) => self.handler.handle(event).await,
            None => {
                // Two event types sharing one type tag; nothing sane to do.
                warn!("payload type mismatch for event type {}", E::event_type());
                Ok(())
            }
        }
    }
}

/// Type-erased filter evaluated against the envelope payload.
pub(crate) trait ErasedFilter: Send + Sync {
    fn should_process(&self, payload: &(dyn Any + Send + Sync)) -> bool;
}

struct TypedFilter<E, F> {
    filter: F,
    _marker: PhantomData<fn() -> E>,
}

impl<E, F> ErasedFilter for TypedFilter<E, F>
where
    E: Event,
    F: EventFilter<E> + 'static,
{
    fn should_process(&self, payload: &(dyn Any + Send + Sync)) -> bool {
        match payload.downcast_ref::<E>() {
            Some(event) => self.filter.should_process(event),
            None => false,
        }
    }
}

/// An active registration of a handler for one category.
#[derive(Clone)]
pub(crate) struct Subscription {
    pub id: SubscriptionId,
    pub min_priority: EventPriority,
    pub handler: Arc<dyn ErasedHandler>,
    pub filters: Vec<Arc<dyn ErasedFilter>>,
}

/// Per-category ordered subscription lists.
pub(crate) struct SubscriptionRegistry {
    subscriptions: DashMap<EventType, Vec<Subscription>>,
}

impl SubscriptionRegistry {
    pub(crate) fn new() -> Self {
        Self {
            subscriptions: DashMap::new(),
        }
    }

    pub(crate) fn insert<E, H>(&self, id: SubscriptionId, min_priority: EventPriority, handler: H)
    where
        E: Event,
        H: EventHandler<E> + 'static,
    {
        let subscription = Subscription {
            id,
            min_priority,
            handler: Arc::new(TypedHandler::<E, H> {
                handler,
                _marker: PhantomData,
            }),
            filters: Vec::new(),
        };
        self.subscriptions
            .entry(E::event_type())
            .or_default()
            .push(subscription);
    }

    /// Remove a subscription. Returns `false` if the id is unknown under the
    /// given category.
    pub(crate) fn remove(&self, event_type: EventType, id: SubscriptionId) -> bool {
        let Some(mut entry) = self.subscriptions.get_mut(event_type) else {
            return false;
        };
        let before = entry.len();
        entry.retain(|subscription| subscription.id != id);
        entry.len() != before
    }

    /// Append a filter to a subscription's chain. Returns `false` if the id
    /// is unknown under `E`.
    pub(crate) fn add_filter<E, F>(&self, id: SubscriptionId, filter: F) -> bool
    where
        E: Event,
        F: EventFilter<E> + 'static,
    {
        let Some(mut entry) = self.subscriptions.get_mut(E::event_type()) else {
            return false;
        };
        match entry.iter_mut().find(|subscription| subscription.id == id) {
            Some(subscription) => {
                subscription.filters.push(Arc::new(TypedFilter::<E, F> {
                    filter,
                    _marker: PhantomData,
                }));
                true
            }
            None => false,
        }
    }

    /// Consistent copy of a category's subscription list, in registration
    /// order. The clone is cheap (ids plus `Arc`s) and lets the dispatcher
    /// iterate without holding any registry lock across handler calls.
    pub(crate) fn snapshot(&self, event_type: EventType) -> Option<Vec<Subscription>> {
        self.subscriptions
            .get(event_type)
            .map(|entry| entry.value().clone())
    }

    pub(crate) fn count(&self, event_type: EventType) -> usize {
        self.subscriptions
            .get(event_type)
            .map_or(0, |entry| entry.value().len())
    }
}
