//! Request coalescing for JSON-RPC reads.
//!
//! Many unrelated call sites issue near-simultaneous reads during route
//! resolution and transfer building. The scheduler merges every call that
//! lands in the same debounce window for the same endpoint into one
//! network round trip, and the HTTP transport rides on top of it with
//! JSON-RPC array bodies.

pub mod scheduler;
pub mod transport;

pub use scheduler::{BatchFn, BatchScheduler, SchedulerError};
pub use transport::{HttpTransport, HttpTransportConfig, TransportError};
