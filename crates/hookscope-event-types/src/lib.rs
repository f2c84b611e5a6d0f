//! Lifecycle event types for hookscope.
//!
//! One [`Event`] is one line in a day-partitioned log. [`QueuedEvent`] is the
//! same record relabelled for the remote ingestion vocabulary.

mod event;
mod kind;
mod sequence;
pub mod timestamp;

pub use event::{payload_from, Event, Payload, QueuedEvent};
pub use kind::EventType;
pub use sequence::SequenceCounter;
