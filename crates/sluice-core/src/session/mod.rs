//! Session runtime: delta tracking, message mapping, ordered delivery,
//! and the driver tying them to one conversation.

pub mod delta;
pub mod driver;
pub mod mapper;
pub mod sink;

pub use delta::TextTracker;
pub use driver::{SessionEnd, run_session};
pub use mapper::map_message;
pub use sink::{EventRx, EventSink, event_channel};
