//! lii-signal: signal containers for laser-induced incandescence data.
//!
//! Provides:
//! - `Signal`: one channel time series with fit-iteration history
//! - `MPoint`: one measurement point (raw/absolute pairs + temperature channels)
//! - `RunData`: pre- and post-processing measurement points of a run
//! - `LiiSettings`: instrument description (wavelengths, bandwidths, filters)
//!
//! Signals are plain values. Copies never share data; processing stages pass
//! clones along and only the last stage of a chain writes into `RunData::post`.

pub mod error;
pub mod mpoint;
pub mod run_data;
pub mod settings;
pub mod signal;

pub use error::{SignalError, SignalResult};
pub use mpoint::MPoint;
pub use run_data::{RunData, RunDataSource};
pub use settings::{ChannelSettings, FilterSettings, LiiSettings};
pub use signal::{FitIteration, Signal, SignalType};
