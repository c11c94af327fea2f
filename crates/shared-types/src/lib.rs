//! # Shared Types Crate
//!
//! This crate contains the telemetry entities stored and exchanged by the
//! core data service.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: The document shapes of `Event`, `Reading`
//!   and `ValueDescriptor` are defined here and nowhere else.
//! - **Named References**: A `Reading` points at its `ValueDescriptor` by
//!   name, never by id.
//! - **Zero Means Unset**: Timestamps are milliseconds since the Unix epoch;
//!   `0` marks a timestamp that has not been assigned yet.

pub mod descriptor;
pub mod entities;

pub use descriptor::*;
pub use entities::*;
