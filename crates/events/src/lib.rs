//! `issuetrack-events`: notification contract and in-process fan-out.
//!
//! The lifecycle engine emits [`IssueNotification`]s through an [`EventSink`];
//! how they reach listeners is the bus implementation's business.

pub mod bus;
pub mod envelope;
pub mod event;
pub mod in_memory_bus;
pub mod notification;
pub mod sink;

pub use bus::{EventBus, Subscription};
pub use envelope::EventEnvelope;
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
pub use notification::IssueNotification;
pub use sink::{BusEventSink, EventSink, NullEventSink};
