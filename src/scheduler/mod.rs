//! Retry/poll scheduling for dashboard sections.

pub mod policy;
pub mod poller;

pub use policy::{parse_duration, BackoffCurve, PollPolicy};
pub use poller::{PollHandle, PollOperation, PollScheduler};
