//! Transfer orchestration.
//!
//! Ties the registry, route resolution, quote resolution, and the
//! chain-family builders together behind one two-operation surface. The
//! family is resolved exactly once, at the boundary, from the intent's
//! source chain; everything past that point is family-agnostic until the
//! assembled request reaches the chosen builder.

pub mod service;

pub use service::{BuildError, TransferService, TransferServiceBuilder};
