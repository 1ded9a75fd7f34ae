use std::sync::atomic::AtomicBool;

use lii_processing::plugins::{Baseline, MovingAverage, Normalize, TemperatureCalculator};
use lii_processing::{InputValue, LinkState, MRun, ProcessingSession, SchedulerOptions};
use lii_signal::{LiiSettings, RunData, RunDataSource, Signal, SignalType};

/// Three runs: two in group 0, one in group 1.
fn session() -> ProcessingSession {
    let mut session = ProcessingSession::default();
    for (i, group) in [0, 0, 1].into_iter().enumerate() {
        let mut data = RunData::new(LiiSettings::from_wavelengths("rig", &[650.0, 780.0]), 2);
        data.push_mpoint(vec![
            Signal::with_data(SignalType::Raw, 1, 0.0, 1e-9, vec![1.0; 16]),
            Signal::with_data(SignalType::Raw, 2, 0.0, 1e-9, vec![2.0; 16]),
        ])
        .unwrap();
        session.add_run(MRun::new(format!("run {i}"), group, data));
    }
    session
}

fn raw_names(session: &ProcessingSession, run: usize) -> Vec<&'static str> {
    session.run(run).unwrap().chain(SignalType::Raw).plugins().iter().map(|p| p.name()).collect()
}

fn with_end(session: &ProcessingSession, uid: u64, end: f64) -> lii_processing::InputList {
    let mut inputs = session.plugin(uid).unwrap().inputs().clone();
    inputs.set_value("end", InputValue::Double(end)).unwrap();
    inputs
}

fn end_of(session: &ProcessingSession, uid: u64) -> f64 {
    session.plugin(uid).unwrap().inputs().f64("end").unwrap()
}

#[test]
fn linking_to_all_clones_onto_every_run() {
    let mut session = session();
    let uid = session.add_plugin(0, SignalType::Raw, Baseline::NAME).unwrap();
    session.set_link_state(uid, LinkState::All).unwrap();

    for run in 0..3 {
        assert_eq!(raw_names(&session, run), vec![Baseline::NAME]);
    }
    let clones = session.clones(uid);
    assert_eq!(clones.len(), 2);
    assert!(clones.iter().all(|c| session.plugin(*c).unwrap().link_state() == LinkState::All));

    let inputs = with_end(&session, uid, 5e-9);
    session.set_parameters(uid, &inputs).unwrap();
    for c in &clones {
        assert_eq!(end_of(&session, *c), 5e-9);
    }
    assert_eq!(session.connectors().count(), 1);
}

#[test]
fn group_link_mirrors_within_run_group_only() {
    let mut session = session();
    let uid = session.add_plugin(0, SignalType::Raw, Baseline::NAME).unwrap();
    session.set_link_state(uid, LinkState::Group).unwrap();

    let clones = session.clones(uid);
    assert_eq!(clones.len(), 1);
    let same_group = clones[0];
    assert!(session.run(1).unwrap().plugin(same_group).is_some());
    let other_group = session.run(2).unwrap().chain(SignalType::Raw).plugin(0).unwrap().uid();
    assert_eq!(session.plugin(other_group).unwrap().link_state(), LinkState::Single);

    let inputs = with_end(&session, uid, 3e-9);
    session.set_parameters(uid, &inputs).unwrap();
    assert_eq!(end_of(&session, same_group), 3e-9);
    assert_eq!(end_of(&session, other_group), 1e-8);

    session.set_activated(uid, false).unwrap();
    assert!(!session.plugin(same_group).unwrap().activated());
    assert!(session.plugin(other_group).unwrap().activated());
}

#[test]
fn narrowing_and_unlinking() {
    let mut session = session();
    let uid = session.add_plugin(0, SignalType::Raw, Baseline::NAME).unwrap();
    session.set_link_state(uid, LinkState::All).unwrap();
    session.set_link_state(uid, LinkState::Single).unwrap();
    assert!(session.clones(uid).is_empty());

    let inputs = with_end(&session, uid, 4e-9);
    session.set_parameters(uid, &inputs).unwrap();
    let other = session.run(1).unwrap().chain(SignalType::Raw).plugin(0).unwrap().uid();
    assert_eq!(end_of(&session, other), 1e-8);

    session.set_link_state(uid, LinkState::NoLink).unwrap();
    assert_eq!(session.connectors().count(), 0);
    assert!(session.run(2).unwrap().chain(SignalType::Raw).plugins().iter().all(|p| p.link_state() == LinkState::NoLink));
}

#[test]
fn linked_structure_edits_apply_to_clones() {
    let mut session = session();
    session.add_plugin(0, SignalType::Raw, MovingAverage::NAME).unwrap();
    for run in 1..3 {
        session.add_plugin(run, SignalType::Raw, MovingAverage::NAME).unwrap();
    }
    let uid = session.add_plugin(0, SignalType::Raw, Baseline::NAME).unwrap();
    session.set_link_state(uid, LinkState::All).unwrap();
    assert_eq!(raw_names(&session, 2), vec![MovingAverage::NAME, Baseline::NAME]);

    assert_eq!(session.move_plugin(uid, 0).unwrap(), 0);
    for run in 0..3 {
        assert_eq!(raw_names(&session, run), vec![Baseline::NAME, MovingAverage::NAME]);
    }

    session.remove_plugin(uid).unwrap();
    for run in 0..3 {
        assert_eq!(raw_names(&session, run), vec![MovingAverage::NAME]);
    }
    assert_eq!(session.connectors().count(), 0);
}

#[test]
fn linked_calculators_share_one_temperature_channel() {
    let mut session = session();
    let uid = session.add_plugin(0, SignalType::Temperature, TemperatureCalculator::NAME).unwrap();
    let channel = session.plugin(uid).unwrap().temperature_channel().unwrap();
    session.set_link_state(uid, LinkState::All).unwrap();

    for run in session.runs() {
        let tc = run.chain(SignalType::Temperature).plugin(0).unwrap();
        assert_eq!(tc.temperature_channel(), Some(channel));
        assert_eq!(run.data().channel_ids(SignalType::Temperature), vec![channel]);
    }
    assert_eq!(session.registry().ref_count(channel), 3);

    let results = session.process_all(&SchedulerOptions::default(), &AtomicBool::new(false));
    assert!(results.iter().all(Result::is_ok));
}

#[test]
fn saved_link_rejoins_connector_on_load() {
    let mut session = session();
    let uid = session.add_plugin(0, SignalType::Raw, Baseline::NAME).unwrap();
    session.set_link_state(uid, LinkState::All).unwrap();
    let link_id = session.plugin(uid).unwrap().link_id().unwrap();

    let text = session.save_chain(0, SignalType::Raw).unwrap();
    session.load_chain(2, SignalType::Raw, &text).unwrap();

    let loaded = session.run(2).unwrap().chain(SignalType::Raw).plugin(0).unwrap();
    assert_eq!(loaded.link_id(), Some(link_id));
    assert_eq!(loaded.link_state(), LinkState::All);
    let loaded_uid = loaded.uid();
    let connector = session.connector(link_id).unwrap();
    assert!(connector.contains(loaded_uid));
    assert_eq!(connector.len(), 3);
    assert!(session.clones(uid).contains(&loaded_uid));
}

#[test]
fn chain_round_trip_keeps_parameters_and_flags() {
    let mut session = session();
    let baseline = session.add_plugin(0, SignalType::Raw, Baseline::NAME).unwrap();
    let normalize = session.add_plugin(0, SignalType::Raw, Normalize::NAME).unwrap();
    session.add_plugin(0, SignalType::Raw, MovingAverage::NAME).unwrap();

    let inputs = with_end(&session, baseline, 7e-9);
    session.set_parameters(baseline, &inputs).unwrap();
    let mut inputs = session.plugin(normalize).unwrap().inputs().clone();
    inputs.set_value("mode", InputValue::Text("Value at time".into())).unwrap();
    session.set_parameters(normalize, &inputs).unwrap();
    session.set_activated(normalize, false).unwrap();
    session.set_step_buffer_enabled(baseline, true).unwrap();

    let text = session.save_chain(0, SignalType::Raw).unwrap();
    session.load_chain(1, SignalType::Raw, &text).unwrap();

    let original = session.run(0).unwrap().chain(SignalType::Raw).plugins();
    let loaded = session.run(1).unwrap().chain(SignalType::Raw).plugins();
    assert_eq!(loaded.len(), 3);
    for (a, b) in original.iter().zip(loaded) {
        assert_eq!(a.name(), b.name());
        assert_eq!(a.inputs(), b.inputs());
        assert_eq!(a.activated(), b.activated());
        assert_eq!(a.step_buffer_enabled(), b.step_buffer_enabled());
        assert_ne!(a.uid(), b.uid());
    }
}

#[test]
fn removing_a_run_drops_its_connector_members() {
    let mut session = session();
    let uid = session.add_plugin(0, SignalType::Raw, Baseline::NAME).unwrap();
    session.set_link_state(uid, LinkState::All).unwrap();
    let link_id = session.plugin(uid).unwrap().link_id().unwrap();
    session.remove_run(2).unwrap();
    assert_eq!(session.connector(link_id).unwrap().len(), 2);
    assert_eq!(session.clones(uid).len(), 1);
}

#[test]
fn reloading_keeps_unlinked_calculator_channels() {
    let mut session = session();
    let first = session.add_plugin(0, SignalType::Temperature, TemperatureCalculator::NAME).unwrap();
    let second = session.add_plugin(0, SignalType::Temperature, TemperatureCalculator::NAME).unwrap();
    let channels = vec![
        session.plugin(first).unwrap().temperature_channel().unwrap(),
        session.plugin(second).unwrap().temperature_channel().unwrap(),
    ];

    let text = session.save_chain(0, SignalType::Temperature).unwrap();
    for _ in 0..2 {
        session.load_chain(0, SignalType::Temperature, &text).unwrap();
    }

    let run = session.run(0).unwrap();
    let reloaded: Vec<u32> = run
        .chain(SignalType::Temperature)
        .plugins()
        .iter()
        .filter_map(|p| p.temperature_channel())
        .collect();
    assert_eq!(reloaded, channels);
    assert_eq!(run.data().channel_ids(SignalType::Temperature), channels);
    assert_eq!(session.registry().ids_in_use(), channels);
}

#[test]
fn loading_into_another_run_takes_fresh_channels() {
    let mut session = session();
    let uid = session.add_plugin(0, SignalType::Temperature, TemperatureCalculator::NAME).unwrap();
    let channel = session.plugin(uid).unwrap().temperature_channel().unwrap();
    let text = session.save_chain(0, SignalType::Temperature).unwrap();
    session.load_chain(1, SignalType::Temperature, &text).unwrap();

    let loaded = session.run(1).unwrap().chain(SignalType::Temperature).plugin(0).unwrap();
    assert_ne!(loaded.temperature_channel(), Some(channel));
    assert_eq!(session.registry().ref_count(channel), 1);
}
