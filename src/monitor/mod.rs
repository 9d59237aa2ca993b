//! Open-handle monitor.
//!
//! Three levels, ownership strictly top-down:
//! - HandleMonitor (registry.rs): path -> Arc<HandleGroup>; the only strong owner of groups.
//! - HandleGroup (group.rs): stream_id -> creation context for one path.
//! - TrackedStream (stream.rs): the stream handed to the caller; Weak link back to its group.
//!
//! Invariant: a path is present in the registry iff its group has at least one member.
//! Lock order is always registry -> group.

pub mod group;
pub mod registry;
pub mod report;
pub mod stream;

pub use group::HandleGroup;
pub use registry::HandleMonitor;
pub use report::{FileReport, MonitorReport, OpenerReport};
pub use stream::{StreamState, TrackedStream};
