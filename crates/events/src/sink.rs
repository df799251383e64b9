//! Fire-and-forget emission side of the notification contract.

use std::sync::Arc;

use issuetrack_core::{Clock, SystemClock};

use crate::bus::EventBus;
use crate::envelope::EventEnvelope;
use crate::event::Event;

/// Where lifecycle events go.
///
/// The mutation is already committed when its event is emitted, so `emit`
/// cannot fail. Implementations log failures and move on.
pub trait EventSink<E>: Send + Sync {
    fn emit(&self, event: E);
}

impl<E, S> EventSink<E> for Arc<S>
where
    S: EventSink<E> + ?Sized,
{
    fn emit(&self, event: E) {
        (**self).emit(event)
    }
}

/// Discards everything.
#[derive(Debug, Default, Copy, Clone)]
pub struct NullEventSink;

impl<E> EventSink<E> for NullEventSink {
    fn emit(&self, _event: E) {}
}

/// Publishes enveloped events onto an [`EventBus`].
#[derive(Debug, Clone)]
pub struct BusEventSink<B, C = SystemClock> {
    bus: B,
    clock: C,
}

impl<B> BusEventSink<B, SystemClock> {
    pub fn new(bus: B) -> Self {
        Self {
            bus,
            clock: SystemClock,
        }
    }
}

impl<B, C> BusEventSink<B, C> {
    pub fn with_clock(bus: B, clock: C) -> Self {
        Self { bus, clock }
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }
}

impl<E, B, C> EventSink<E> for BusEventSink<B, C>
where
    E: Event,
    B: EventBus<EventEnvelope<E>>,
    C: Clock,
{
    fn emit(&self, event: E) {
        let envelope = EventEnvelope::wrap(event, self.clock.now());
        let event_type = envelope.event_type().to_string();
        if let Err(e) = self.bus.publish(envelope) {
            tracing::warn!(event_type = %event_type, "dropping notification, publish failed: {e:?}");
        }
    }
}
