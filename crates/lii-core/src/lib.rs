//! lii-core: stable foundation for the LII processing workspace.
//!
//! Contains:
//! - units (uom SI types + constructors, physical constants)
//! - numeric (Real + tolerances + float helpers)
//! - ids (reference-counted temperature channel IDs)
//! - error (shared error types)

pub mod error;
pub mod ids;
pub mod numeric;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use error::{LiiError, LiiResult};
pub use ids::{ChannelIdLease, TemperatureChannelRegistry};
pub use numeric::*;
pub use units::*;
