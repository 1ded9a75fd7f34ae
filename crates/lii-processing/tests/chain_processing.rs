use std::any::Any;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use lii_materials::catalog;
use lii_processing::plugins::{Arithmetic, Baseline, MultiSignalAverage, SimplePeakValidator, TemperatureCalculator};
use lii_processing::{
    CalculationStatus, InputList, InputValue, MRun, PluginFactory, ProcessContext, ProcessingError, ProcessingPlugin,
    ProcessingResult, SchedulerOptions, SignalProcessor, process_all, process_run,
};
use lii_signal::{LiiSettings, RunData, RunDataSource, Signal, SignalType};
use lii_temperature::spectrum_samples;
use proptest::prelude::*;

const DT: f64 = 1e-9;

/// Run with one measurement point per entry; channel 2 carries half of channel 1.
fn run_with(points: &[Vec<f64>]) -> MRun {
    let mut data = RunData::new(LiiSettings::from_wavelengths("rig", &[650.0, 780.0]), 2);
    for samples in points {
        let half = samples.iter().map(|v| v * 0.5).collect();
        data.push_mpoint(vec![
            Signal::with_data(SignalType::Raw, 1, 0.0, DT, samples.clone()),
            Signal::with_data(SignalType::Raw, 2, 0.0, DT, half),
        ])
        .unwrap();
    }
    MRun::new("run", 0, data)
}

fn post(run: &MRun, mp: usize, signal_type: SignalType, channel: u32) -> Signal {
    run.data().post(mp).unwrap().signal(signal_type, channel).unwrap().clone()
}

fn arithmetic(factory: &PluginFactory, factor: f64) -> ProcessingPlugin {
    let mut plugin = factory.create(Arithmetic::NAME, SignalType::Raw).unwrap();
    let mut inputs = plugin.inputs().clone();
    inputs.set_value("value", InputValue::Double(factor)).unwrap();
    plugin.set_parameters(&inputs).unwrap();
    plugin
}

fn no_stop() -> AtomicBool {
    AtomicBool::new(false)
}

proptest! {
    #[test]
    fn deactivated_plugin_passes_data_through(
        data in prop::collection::vec(-1e3f64..1e3, 1..32),
        factor in 0.5f64..10.0,
    ) {
        let factory = PluginFactory::default();
        let mut run = run_with(&[data.clone()]);
        let plugin = arithmetic(&factory, factor);
        let uid = plugin.uid();
        run.add_plugin(SignalType::Raw, plugin).unwrap();
        run.set_activated(uid, false).unwrap();
        process_run(&mut run, &no_stop(), None).unwrap();
        prop_assert_eq!(post(&run, 0, SignalType::Raw, 1).data, data);
    }

    #[test]
    fn parameter_change_marks_downstream_dirty(changed in 0usize..4) {
        let factory = PluginFactory::default();
        let mut run = run_with(&[vec![1.0; 32]]);
        let uids: Vec<u64> = (0..4)
            .map(|_| {
                let plugin = factory.create(Baseline::NAME, SignalType::Raw).unwrap();
                let uid = plugin.uid();
                run.add_plugin(SignalType::Raw, plugin).unwrap();
                uid
            })
            .collect();
        process_run(&mut run, &no_stop(), None).unwrap();
        prop_assert!(run.chain(SignalType::Raw).plugins().iter().all(|p| !p.dirty()));

        let mut inputs = run.plugin(uids[changed]).unwrap().inputs().clone();
        inputs.set_value("end", InputValue::Double(2e-8)).unwrap();
        run.set_parameters(uids[changed], &inputs).unwrap();
        for (position, plugin) in run.chain(SignalType::Raw).plugins().iter().enumerate() {
            prop_assert_eq!(plugin.dirty(), position >= changed);
        }
    }
}

#[test]
fn active_arithmetic_scales_every_channel() {
    let factory = PluginFactory::default();
    let mut run = run_with(&[vec![1.0, 2.0, 4.0]]);
    run.add_plugin(SignalType::Raw, arithmetic(&factory, 3.0)).unwrap();
    process_run(&mut run, &no_stop(), None).unwrap();
    assert_eq!(post(&run, 0, SignalType::Raw, 1).data, vec![3.0, 6.0, 12.0]);
    assert_eq!(post(&run, 0, SignalType::Raw, 2).data, vec![1.5, 3.0, 6.0]);
    assert_eq!(post(&run, 0, SignalType::Abs, 1).data, vec![3.0, 6.0, 12.0]);
    assert_eq!(*run.status(), CalculationStatus::Finished);
}

#[test]
fn rejected_points_are_emptied_in_post() {
    let factory = PluginFactory::default();
    let mut run = run_with(&[vec![0.0, 10.0, 5.0], vec![0.0, 1000.0, 5.0]]);
    run.add_plugin(SignalType::Raw, peak_validator(&factory, 100.0)).unwrap();
    run.add_plugin(SignalType::Raw, arithmetic(&factory, 2.0)).unwrap();

    process_run(&mut run, &no_stop(), None).unwrap();

    let chain = run.chain(SignalType::Raw);
    assert!(chain.is_valid(0));
    assert!(!chain.is_valid(1));
    assert_eq!(post(&run, 0, SignalType::Raw, 1).data, vec![0.0, 20.0, 10.0]);
    assert!(post(&run, 1, SignalType::Raw, 1).is_empty());
    assert!(post(&run, 1, SignalType::Raw, 2).is_empty());
    assert!(post(&run, 1, SignalType::Abs, 1).is_empty());
}

#[test]
fn multi_signal_average_computed_once_and_replicated() {
    let factory = PluginFactory::default();
    let mut run = run_with(&[vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 9.0]]);
    let msa = factory.create(MultiSignalAverage::NAME, SignalType::Raw).unwrap();
    let uid = msa.uid();
    run.add_plugin(SignalType::Raw, msa).unwrap();

    process_run(&mut run, &no_stop(), None).unwrap();

    let kernel = run.plugin(uid).unwrap().kernel();
    let average = kernel.as_any().downcast_ref::<MultiSignalAverage>().unwrap();
    assert_eq!(average.computations(), 1);

    let first = post(&run, 0, SignalType::Raw, 1);
    assert_eq!(first.data, vec![3.0, 5.0]);
    assert_eq!(first.stdev.len(), 2);
    assert!((first.stdev[0] - 2.0).abs() < 1e-12);
    for mp in 1..3 {
        assert_eq!(post(&run, mp, SignalType::Raw, 1), first);
        assert_eq!(post(&run, mp, SignalType::Raw, 2), post(&run, 0, SignalType::Raw, 2));
    }
    assert!(run.contains_active_msa(SignalType::Abs));
    assert_eq!(post(&run, 2, SignalType::Abs, 1).data, vec![3.0, 5.0]);
}

fn peak_validator(factory: &PluginFactory, max: f64) -> ProcessingPlugin {
    let mut validator = factory.create(SimplePeakValidator::NAME, SignalType::Raw).unwrap();
    let mut inputs = validator.inputs().clone();
    inputs.set_value("max", InputValue::Double(max)).unwrap();
    validator.set_parameters(&inputs).unwrap();
    validator
}

/// Validator, then average; every post point must hold the same average.
fn average_behind_validator(points: &[Vec<f64>]) -> MRun {
    let factory = PluginFactory::default();
    let mut run = run_with(points);
    run.add_plugin(SignalType::Raw, peak_validator(&factory, 100.0)).unwrap();
    run.add_plugin(SignalType::Raw, factory.create(MultiSignalAverage::NAME, SignalType::Raw).unwrap())
        .unwrap();
    process_run(&mut run, &no_stop(), None).unwrap();
    run
}

#[test]
fn average_replicated_past_rejected_points() {
    let run = average_behind_validator(&[vec![0.0, 10.0], vec![0.0, 1000.0], vec![0.0, 20.0]]);

    let first = post(&run, 0, SignalType::Raw, 1);
    assert_eq!(first.data, vec![0.0, 15.0]);
    assert_eq!(post(&run, 0, SignalType::Raw, 2).data, vec![0.0, 7.5]);
    for mp in 1..3 {
        assert_eq!(post(&run, mp, SignalType::Raw, 1), first);
        assert_eq!(post(&run, mp, SignalType::Raw, 2), post(&run, 0, SignalType::Raw, 2));
        assert_eq!(post(&run, mp, SignalType::Abs, 1).data, vec![0.0, 15.0]);
    }
}

#[test]
fn average_survives_rejected_first_point() {
    let run = average_behind_validator(&[vec![0.0, 1000.0], vec![0.0, 10.0], vec![0.0, 20.0]]);
    for mp in 0..3 {
        assert_eq!(post(&run, mp, SignalType::Raw, 1).data, vec![0.0, 15.0]);
    }
}

#[test]
fn average_of_no_valid_points_is_empty_everywhere() {
    let run = average_behind_validator(&[vec![0.0, 1000.0], vec![0.0, 2000.0]]);
    for mp in 0..2 {
        assert!(post(&run, mp, SignalType::Raw, 1).is_empty());
    }
}

#[test]
fn stop_request_cancels_processing() {
    let factory = PluginFactory::default();
    let mut run = run_with(&[vec![1.0; 4]]);
    run.add_plugin(SignalType::Raw, arithmetic(&factory, 2.0)).unwrap();
    let stop = AtomicBool::new(true);
    assert!(matches!(process_run(&mut run, &stop, None), Err(ProcessingError::Cancelled)));
    assert_eq!(*run.status(), CalculationStatus::Cancelled);
    assert!(post(&run, 0, SignalType::Raw, 1).is_empty());
}

#[test]
fn busy_run_rejects_processing_and_edits() {
    let factory = PluginFactory::default();
    let mut run = run_with(&[vec![1.0; 4]]);
    let busy = run.busy_flag().clone();
    let guard = busy.try_acquire().unwrap();
    assert!(matches!(process_run(&mut run, &no_stop(), None), Err(ProcessingError::Busy { .. })));
    assert!(matches!(
        run.add_plugin(SignalType::Raw, arithmetic(&factory, 2.0)),
        Err(ProcessingError::Busy { .. })
    ));
    drop(guard);
    assert!(run.add_plugin(SignalType::Raw, arithmetic(&factory, 2.0)).is_ok());
}

#[test]
fn progress_reports_each_chain() {
    let mut run = run_with(&[vec![1.0; 4]]);
    let mut seen = Vec::new();
    let mut record = |p: lii_processing::ProcessingProgress| seen.push((p.signal_type, p.completed_chains));
    process_run(&mut run, &no_stop(), Some(&mut record)).unwrap();
    assert_eq!(
        seen,
        vec![(SignalType::Raw, 1), (SignalType::Abs, 2), (SignalType::Temperature, 3)]
    );
}

#[test]
fn two_color_temperature_from_raw_signals() {
    let soot = catalog::soot();
    let samples = spectrum_samples(&[650.0, 780.0], 2500.0, 1.0, &soot).unwrap();
    let mut data = RunData::new(LiiSettings::from_wavelengths("rig", &[650.0, 780.0]), 2);
    for _ in 0..2 {
        data.push_mpoint(vec![
            Signal::with_data(SignalType::Raw, 1, 0.0, DT, vec![samples[0]; 6]),
            Signal::with_data(SignalType::Raw, 2, 0.0, DT, vec![samples[1]; 6]),
        ])
        .unwrap();
    }
    let mut run = MRun::new("two-color", 0, data);
    let factory = PluginFactory::default();
    let tc = factory.create(TemperatureCalculator::NAME, SignalType::Temperature).unwrap();
    let channel = tc.temperature_channel().unwrap();
    run.add_plugin(SignalType::Temperature, tc).unwrap();

    process_run(&mut run, &no_stop(), None).unwrap();

    for mp in 0..2 {
        let temperature = post(&run, mp, SignalType::Temperature, channel);
        assert_eq!(temperature.len(), 6);
        for t in &temperature.data {
            assert!((t - 2500.0).abs() / 2500.0 < 1e-6, "{t}");
        }
    }
    assert!(run.messages().is_empty());
}

static ACTIVE: AtomicUsize = AtomicUsize::new(0);
static PEAK: AtomicUsize = AtomicUsize::new(0);

/// Counts concurrently running instances.
#[derive(Debug, Clone, Default)]
struct Exclusive;

impl SignalProcessor for Exclusive {
    fn name(&self) -> &'static str {
        "Exclusive"
    }

    fn default_inputs(&self) -> InputList {
        InputList::new()
    }

    fn set_from_inputs(&mut self, _inputs: &mut InputList) -> ProcessingResult<()> {
        Ok(())
    }

    fn process(&self, _ctx: &ProcessContext<'_>, _input: &Signal, _output: &mut Signal) -> ProcessingResult<bool> {
        let now = ACTIVE.fetch_add(1, Ordering::SeqCst) + 1;
        PEAK.fetch_max(now, Ordering::SeqCst);
        std::thread::sleep(std::time::Duration::from_millis(1));
        ACTIVE.fetch_sub(1, Ordering::SeqCst);
        Ok(true)
    }

    fn execute_synchronized(&self) -> bool {
        true
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn clone_box(&self) -> Box<dyn SignalProcessor> {
        Box::new(self.clone())
    }
}

#[test]
fn synchronized_plugin_serializes_runs() {
    let mut runs: Vec<MRun> = (0..4)
        .map(|i| {
            let mut run = run_with(&[vec![1.0; 4], vec![2.0; 4]]);
            run.add_plugin(SignalType::Raw, ProcessingPlugin::new(Box::new(Exclusive), 1000 + i).unwrap())
                .unwrap();
            run
        })
        .collect();
    assert!(runs.iter().all(MRun::requires_synchronized));
    let options = SchedulerOptions {
        threads: Some(4),
        force_sequential: false,
    };
    let results = process_all(&mut runs, &options, &no_stop());
    assert!(results.iter().all(Result::is_ok));
    assert_eq!(PEAK.load(Ordering::SeqCst), 1);
}

#[test]
fn independent_runs_processed_in_parallel_pool() {
    let factory = PluginFactory::default();
    let mut runs: Vec<MRun> = (1..=4)
        .map(|i| {
            let mut run = run_with(&[vec![i as f64; 8]]);
            run.add_plugin(SignalType::Raw, arithmetic(&factory, 2.0)).unwrap();
            run
        })
        .collect();
    let options = SchedulerOptions {
        threads: Some(2),
        force_sequential: false,
    };
    let results = process_all(&mut runs, &options, &no_stop());
    assert_eq!(results.len(), 4);
    for (i, run) in runs.iter().enumerate() {
        assert_eq!(*run.status(), CalculationStatus::Finished);
        assert_eq!(post(run, 0, SignalType::Raw, 1).data, vec![2.0 * (i + 1) as f64; 8]);
    }
}
