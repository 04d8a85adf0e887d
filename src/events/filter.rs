//! Per-subscription event filters.
//!
//! A filter gates handler invocation for one subscription: every filter in a
//! subscription's chain must return `true` for the handler to run. Filters
//! are evaluated in insertion order and short-circuit on the first `false`.

use crate::events::types::Event;

/// Predicate gating handler invocation for a single subscription.
pub trait EventFilter<E: Event>: Send + Sync {
    /// Return `true` if the subscription's handler should see this event.
    fn should_process(&self, event: &E) -> bool;
}

/// Implementation of EventFilter for plain closures
impl<E, F> EventFilter<E> for F
where
    E: Event,
    F: Fn(&E) -> bool + Send + Sync,
{
    fn should_process(&self, event: &E) -> bool {
        (self)(event)
    }
}

/// Utility functions for creating filters
pub mod filters {
    use super::*;

    /// Creates a filter that accepts events with a specific field value
    pub fn field_equals<E, T, F>(field_extractor: F, value: T) -> impl EventFilter<E>
    where
        E: Event,
        T: PartialEq + Send + Sync + 'static,
        F: Fn(&E) -> &T + Send + Sync + 'static,
    {
        move |event: &E| *field_extractor(event) == value
    }

    /// Creates a filter that accepts events where a field satisfies a predicate
    pub fn field_matches<E, T, F, P>(field_extractor: F, predicate: P) -> impl EventFilter<E>
    where
        E: Event,
        F: Fn(&E) -> &T + Send + Sync + 'static,
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        move |event: &E| predicate(field_extractor(event))
    }

    /// Creates a filter that combines two filters with logical AND
    pub fn and<E: Event>(
        filter1: impl EventFilter<E> + 'static,
        filter2: impl EventFilter<E> + 'static,
    ) -> impl EventFilter<E> {
        move |event: &E| filter1.should_process(event) && filter2.should_process(event)
    }

    /// Creates a filter that combines two filters with logical OR
    pub fn or<E: Event>(
        filter1: impl EventFilter<E> + 'static,
        filter2: impl EventFilter<E> + 'static,
    ) -> impl EventFilter<E> {
        move |event: &E| filter1.should_process(event) || filter2.should_process(event)
    }

    /// Creates a filter that negates another filter
    pub fn not<E: Event>(filter: impl EventFilter<E> + 'static) -> impl EventFilter<E> {
        move |event: &E| !filter.should_process(event)
    }
}
