//! Processing of whole runs: RAW, then ABS, then TEMPERATURE.
//!
//! Runs are independent unless a chain holds a plugin that must execute
//! synchronized, in which case all runs are processed one after another.

use std::sync::atomic::{AtomicBool, Ordering};

use lii_signal::{RunDataSource, SignalType};
use rayon::prelude::*;
use tracing::{debug, error, info, warn};

use crate::error::{ProcessingError, ProcessingResult};
use crate::run::{CalculationStatus, MRun};

/// Progress event emitted after each finished chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingProgress {
    pub run: String,
    pub signal_type: SignalType,
    pub completed_chains: usize,
    pub total_chains: usize,
}

#[derive(Debug, Clone, Default)]
pub struct SchedulerOptions {
    /// Worker threads; `None` uses the global rayon pool.
    pub threads: Option<usize>,
    pub force_sequential: bool,
}

fn cancelled(run: &mut MRun) -> ProcessingResult<()> {
    info!(run = run.name(), "processing cancelled");
    run.set_status(CalculationStatus::Cancelled);
    Err(ProcessingError::Cancelled)
}

/// Process all three chains of one run.
///
/// Fails with `Busy` if the run is already being processed. `stop` is checked
/// between chains and between chain stages.
pub fn process_run(
    run: &mut MRun,
    stop: &AtomicBool,
    mut progress: Option<&mut dyn FnMut(ProcessingProgress)>,
) -> ProcessingResult<()> {
    let busy = run.busy_flag().clone();
    let _guard = busy.try_acquire().ok_or_else(|| {
        warn!(run = run.name(), "run is already being processed");
        ProcessingError::Busy { what: "process run" }
    })?;

    run.set_status(CalculationStatus::Running);
    run.messages_mut().clear();
    debug!(run = run.name(), mpoints = run.data().size_all_mpoints(), "processing run");

    let total = SignalType::ALL.len();
    for (index, signal_type) in SignalType::ALL.into_iter().enumerate() {
        if stop.load(Ordering::Relaxed) {
            return cancelled(run);
        }
        if signal_type == SignalType::Abs {
            run.data_mut().derive_abs_from_raw();
        }
        let inherited_msa = run.inherited_msa(signal_type);
        let (chain, data) = run.chain_and_data_mut(signal_type);
        match chain.process(data, inherited_msa, stop) {
            Ok(messages) => run.messages_mut().extend(messages),
            Err(ProcessingError::Cancelled) => return cancelled(run),
            Err(e) => {
                error!(run = run.name(), chain = %signal_type, error = %e, "processing failed");
                run.set_status(CalculationStatus::Failed(e.to_string()));
                return Err(e);
            }
        }
        if let Some(report) = progress.as_deref_mut() {
            report(ProcessingProgress {
                run: run.name().to_string(),
                signal_type,
                completed_chains: index + 1,
                total_chains: total,
            });
        }
    }

    run.set_status(CalculationStatus::Finished);
    info!(run = run.name(), warnings = run.messages().len(), "processing finished");
    Ok(())
}

fn sequential(runs: &mut [MRun], stop: &AtomicBool) -> Vec<ProcessingResult<()>> {
    runs.iter_mut().map(|run| process_run(run, stop, None)).collect()
}

fn parallel(runs: &mut [MRun], stop: &AtomicBool) -> Vec<ProcessingResult<()>> {
    runs.par_iter_mut().map(|run| process_run(run, stop, None)).collect()
}

/// Process every run, one result per run in input order.
pub fn process_all(runs: &mut [MRun], options: &SchedulerOptions, stop: &AtomicBool) -> Vec<ProcessingResult<()>> {
    let synchronized = runs.iter().any(MRun::requires_synchronized);
    if options.force_sequential || synchronized || runs.len() < 2 {
        debug!(runs = runs.len(), synchronized, "processing runs sequentially");
        return sequential(runs, stop);
    }
    match options.threads {
        Some(threads) => match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
            Ok(pool) => pool.install(|| parallel(runs, stop)),
            Err(e) => {
                warn!(error = %e, "thread pool unavailable, processing sequentially");
                sequential(runs, stop)
            }
        },
        None => parallel(runs, stop),
    }
}
