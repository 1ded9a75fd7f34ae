//! Signal processing chains for LII measurement runs.
//!
//! Each run owns one chain per signal type. A chain is an ordered list of
//! plugins; processing a run feeds the pre-processing data of every
//! measurement point through the RAW chain, derives absolute signals, then
//! runs the ABS and TEMPERATURE chains and stores the results as the run's
//! post-processing data.
//!
//! Plugins can be linked across runs (see [`session::ProcessingSession`]) so
//! that edits to one are applied to its clones.

pub mod chain;
pub mod connector;
pub mod error;
pub mod factory;
pub mod input;
pub mod persistence;
pub mod plugin;
pub mod plugins;
pub mod run;
pub mod session;
pub mod step_buffer;
pub mod task;

pub use chain::{BusyFlag, BusyGuard, ProcessingChain};
pub use connector::Connector;
pub use error::{ProcessingError, ProcessingResult, Severity};
pub use factory::PluginFactory;
pub use input::{ChannelSelection, InputList, InputType, InputValue, PluginInput};
pub use persistence::{load_chain, save_chain};
pub use plugin::{LinkState, PluginUid, ProcessContext, ProcessingPlugin, SignalProcessor, Upstream};
pub use run::{CalculationStatus, MRun};
pub use session::ProcessingSession;
pub use step_buffer::StepBuffer;
pub use task::{ProcessingProgress, SchedulerOptions, process_all, process_run};
