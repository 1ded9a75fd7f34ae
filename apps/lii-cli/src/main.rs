use clap::{Args, Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::time::Instant;

use lii_core::units::{bar, k};
use lii_materials::catalog;
use lii_models::{
    HeatTransferContext, ParticleState, ProcessConditions, SimOptions, all_models, model_by_name,
    simulate_cooling,
};
use lii_processing::plugins::TemperatureCalculator;
use lii_processing::{
    BusyFlag, InputValue, MRun, PluginFactory, ProcessingChain, ProcessingProgress, ProcessingSession,
    SchedulerOptions, process_run, save_chain,
};
use lii_signal::{LiiSettings, RunData, RunDataSource, Signal, SignalType};
use lii_temperature::cooling_signal;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod error;

use error::{CliError, CliResult};

#[derive(Parser)]
#[command(name = "lii-cli")]
#[command(about = "LIISim CLI - laser-induced incandescence signal processing", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List processing plugins available for a signal type
    Plugins {
        /// raw, absolute or temperature
        #[arg(default_value = "raw")]
        signal_type: String,
    },
    /// List heat transfer models
    Models,
    /// Print a chain configuration with default parameters
    Template {
        /// raw, absolute or temperature
        signal_type: String,
        /// Plugin names in chain order
        plugins: Vec<String>,
    },
    /// Simulate runs of a cooling particle and process them
    Simulate(SimulateArgs),
}

#[derive(Args)]
struct SimulateArgs {
    /// Heat transfer model identifier
    #[arg(long, default_value = "Kock")]
    model: String,
    #[arg(long, default_value = "soot")]
    material: String,
    #[arg(long, default_value = "Ar")]
    gas: String,
    /// Gas pressure [bar]
    #[arg(long, default_value_t = 1.0)]
    pressure: f64,
    /// Gas temperature [K]
    #[arg(long, default_value_t = 1500.0)]
    gas_temperature: f64,
    /// Peak particle temperature [K]
    #[arg(long, default_value_t = 3500.0)]
    peak_temperature: f64,
    /// Initial particle diameter [nm]
    #[arg(long, default_value_t = 30.0)]
    diameter: f64,
    /// Detection wavelengths [nm], ignored with --settings
    #[arg(long, value_delimiter = ',', default_values_t = [650.0, 780.0])]
    wavelengths: Vec<f64>,
    /// Instrument settings (YAML)
    #[arg(long)]
    settings: Option<PathBuf>,
    #[arg(long, default_value_t = 1)]
    runs: usize,
    /// Measurement points per run
    #[arg(long, default_value_t = 10)]
    shots: usize,
    /// Signal duration [ns]
    #[arg(long, default_value_t = 1000.0)]
    duration: f64,
    /// Sample spacing [ns]
    #[arg(long, default_value_t = 1.0)]
    dt: f64,
    /// RAW chain configuration (TOML)
    #[arg(long)]
    raw_chain: Option<PathBuf>,
    /// ABS chain configuration (TOML)
    #[arg(long)]
    abs_chain: Option<PathBuf>,
    /// TEMPERATURE chain configuration (TOML); defaults to a two-color calculator
    #[arg(long)]
    temperature_chain: Option<PathBuf>,
    /// Worker threads for processing runs
    #[arg(long)]
    threads: Option<usize>,
    /// Process runs one after another with progress output
    #[arg(long)]
    sequential: bool,
    /// Write temperature traces as JSON
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Serialize)]
struct TemperatureReport<'a> {
    run: &'a str,
    mpoint: usize,
    channel: u32,
    start_time: f64,
    dt: f64,
    temperature: &'a [f64],
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Plugins { signal_type } => cmd_plugins(&signal_type),
        Commands::Models => cmd_models(),
        Commands::Template {
            signal_type,
            plugins,
        } => cmd_template(&signal_type, &plugins),
        Commands::Simulate(args) => cmd_simulate(&args),
    }
}

fn parse_signal_type(name: &str) -> CliResult<SignalType> {
    SignalType::parse(name).ok_or_else(|| {
        CliError::Usage(format!(
            "unknown signal type '{name}' (expected raw, absolute or temperature)"
        ))
    })
}

fn cmd_plugins(signal_type: &str) -> CliResult<()> {
    let signal_type = parse_signal_type(signal_type)?;
    let factory = PluginFactory::default();
    println!("Plugins for {signal_type} signals:");
    for name in factory.available(signal_type) {
        println!("  {name}");
    }
    Ok(())
}

fn cmd_models() -> CliResult<()> {
    println!("Heat transfer models:");
    for model in all_models() {
        let info = model.info();
        let terms: Vec<String> = model.supported_terms().iter().map(|t| format!("{t:?}")).collect();
        println!("  {} - {} (v{})", info.identifier, info.name, info.version);
        println!("      {}", info.description);
        println!("      terms: {}", terms.join(", "));
    }
    Ok(())
}

fn cmd_template(signal_type: &str, plugins: &[String]) -> CliResult<()> {
    let signal_type = parse_signal_type(signal_type)?;
    let factory = PluginFactory::default();
    let mut chain = ProcessingChain::new(signal_type, BusyFlag::default());
    for name in plugins {
        chain.add(factory.create(name, signal_type)?)?;
    }
    print!("{}", save_chain(&chain)?);
    Ok(())
}

fn canonical<'a>(names: &[&'a str], name: &str, what: &str) -> CliResult<&'a str> {
    names
        .iter()
        .find(|n| n.eq_ignore_ascii_case(name))
        .copied()
        .ok_or_else(|| CliError::Usage(format!("unknown {what} '{name}' (available: {})", names.join(", "))))
}

fn load_settings(args: &SimulateArgs) -> CliResult<LiiSettings> {
    let settings = match &args.settings {
        Some(path) => LiiSettings::load_yaml(path)?,
        None => LiiSettings::from_wavelengths("synthetic", &args.wavelengths),
    };
    if args.temperature_chain.is_none() && settings.channel_count() < 2 {
        return Err(CliError::Usage(
            "two-color temperatures need at least two detection channels".into(),
        ));
    }
    Ok(settings)
}

fn cmd_simulate(args: &SimulateArgs) -> CliResult<()> {
    if args.runs == 0 || args.shots == 0 {
        return Err(CliError::Usage("--runs and --shots must be positive".into()));
    }
    let material_name = canonical(&catalog::MATERIAL_NAMES, &args.material, "material")?;
    let gas_name = canonical(&catalog::GAS_NAMES, &args.gas, "gas")?;
    let material = catalog::material_by_name(material_name)
        .ok_or_else(|| CliError::Usage(format!("unknown material '{material_name}'")))?;
    let gas = catalog::gas_by_name(gas_name)
        .ok_or_else(|| CliError::Usage(format!("unknown gas '{gas_name}'")))?;
    let model = model_by_name(&args.model)
        .ok_or_else(|| CliError::Usage(format!("unknown heat transfer model '{}'", args.model)))?;
    let settings = load_settings(args)?;

    println!(
        "Simulating {} cooling of {} in {} ({:.0} K, {:.0} nm)",
        model.identifier(),
        material_name,
        gas_name,
        args.peak_temperature,
        args.diameter
    );
    let started = Instant::now();
    let ctx = HeatTransferContext::new(
        &material,
        &gas,
        ProcessConditions::new(bar(args.pressure), k(args.gas_temperature)),
    );
    let opts = SimOptions {
        dt: args.dt * 1e-9,
        t_end: args.duration * 1e-9,
        ..SimOptions::default()
    };
    let trace = simulate_cooling(
        model.as_ref(),
        ctx,
        ParticleState {
            temperature: args.peak_temperature,
            diameter: args.diameter * 1e-9,
        },
        &opts,
    )?;
    info!(samples = trace.len(), "cooling simulated");

    let mut session = ProcessingSession::default();
    for run in 0..args.runs {
        let mut data = RunData::new(settings.clone(), settings.channel_count());
        for shot in 0..args.shots {
            // shot-to-shot variation of the particle volume fraction
            let scaling = 1.0 + 0.05 * ((run + shot) % 5) as f64;
            let signals = (1..=settings.channel_count() as u32)
                .map(|id| {
                    let wavelength = settings
                        .channel(id)
                        .map(|c| c.wavelength_nm)
                        .ok_or_else(|| CliError::Usage(format!("channel {id} has no wavelength")))?;
                    Ok(cooling_signal(&trace, &material, wavelength, scaling, SignalType::Raw, id)?)
                })
                .collect::<CliResult<Vec<Signal>>>()?;
            data.push_mpoint(signals)?;
        }
        session.add_run(MRun::new(format!("run {}", run + 1), 0, data));
    }

    configure_chains(&mut session, args, material_name)?;
    process(&mut session, args)?;
    println!("✓ Processed {} run(s) in {:.3}s", session.runs().len(), started.elapsed().as_secs_f64());
    print_summary(&session);

    if let Some(path) = &args.output {
        write_report(&session, path)?;
    }
    Ok(())
}

fn configure_chains(session: &mut ProcessingSession, args: &SimulateArgs, material: &str) -> CliResult<()> {
    let configs = [
        (SignalType::Raw, &args.raw_chain),
        (SignalType::Abs, &args.abs_chain),
        (SignalType::Temperature, &args.temperature_chain),
    ];
    for (signal_type, path) in configs {
        let Some(path) = path else {
            continue;
        };
        let text = std::fs::read_to_string(path)?;
        for run in 0..session.runs().len() {
            session.load_chain(run, signal_type, &text)?;
        }
    }
    if args.temperature_chain.is_none() {
        for run in 0..session.runs().len() {
            let uid = session.add_plugin(run, SignalType::Temperature, TemperatureCalculator::NAME)?;
            let mut inputs = session
                .plugin(uid)
                .map(|p| p.inputs().clone())
                .ok_or(lii_processing::ProcessingError::PluginNotFound { uid })?;
            inputs.set_value("material", InputValue::Text(material.to_string()))?;
            session.set_parameters(uid, &inputs)?;
        }
    }
    Ok(())
}

fn process(session: &mut ProcessingSession, args: &SimulateArgs) -> CliResult<()> {
    let stop = AtomicBool::new(false);
    if args.sequential {
        for index in 0..session.runs().len() {
            let run = session.run_mut(index)?;
            process_run(run, &stop, Some(&mut |event| render_progress(&event)))?;
            clear_progress_line();
        }
        return Ok(());
    }
    let options = SchedulerOptions {
        threads: args.threads,
        force_sequential: false,
    };
    for result in session.process_all(&options, &stop) {
        result?;
    }
    Ok(())
}

fn clear_progress_line() {
    print!("\r{}\r", " ".repeat(80));
    let _ = io::stdout().flush();
}

fn render_progress(event: &ProcessingProgress) {
    let width = 12usize;
    let filled = width * event.completed_chains / event.total_chains.max(1);
    print!(
        "\r[{}{}] {}  {} chain done",
        "#".repeat(filled),
        "-".repeat(width - filled),
        event.run,
        event.signal_type
    );
    let _ = io::stdout().flush();
}

fn print_summary(session: &ProcessingSession) {
    for run in session.runs() {
        println!("  {}: {}", run.name(), run.status());
        for message in run.messages() {
            println!("    ! {message}");
        }
        let Some(first) = run.data().post(0) else {
            continue;
        };
        for channel in run.data().channel_ids(SignalType::Temperature) {
            let Some(signal) = first.signal(SignalType::Temperature, channel) else {
                continue;
            };
            if let (Some(peak), Some(last)) = (signal.max_value(), signal.data.last()) {
                println!(
                    "    T{channel}: peak {peak:.0} K, final {last:.0} K ({} samples)",
                    signal.len()
                );
            }
        }
    }
}

fn write_report(session: &ProcessingSession, path: &Path) -> CliResult<()> {
    let mut reports = Vec::new();
    for run in session.runs() {
        let data = run.data();
        for mpoint in 0..data.size_all_mpoints() {
            let Some(post) = data.post(mpoint) else {
                continue;
            };
            for channel in post.channel_ids(SignalType::Temperature) {
                if let Some(signal) = post.signal(SignalType::Temperature, channel) {
                    reports.push(TemperatureReport {
                        run: run.name(),
                        mpoint,
                        channel,
                        start_time: signal.start_time,
                        dt: signal.dt,
                        temperature: &signal.data,
                    });
                }
            }
        }
    }
    std::fs::write(path, serde_json::to_string_pretty(&reports)?)?;
    println!("✓ Exported {} temperature traces to {}", reports.len(), path.display());
    Ok(())
}
