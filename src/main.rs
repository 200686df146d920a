//! ccmap - MIDI controller remapper

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::prelude::*;

use ccmap::config::{self, CcmapConfig, DEFAULT_CONFIG};
use ccmap::engine::{Engine, Stats};
use ccmap::mapping::{DestinationType, MappingTable, MappingWarning, SourceSelector};
use ccmap::transport::midi::{self, MidiSink, MidiSource, PortSelection};
use ccmap::transport::stream::{spawn_reader, WriterSink};
use ccmap::transport::{ByteSink, ByteSource};

mod cli;

use cli::{Cli, Commands, MappingArgs};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    match cli.command {
        Commands::Run { mapping, input, output } => {
            let (cfg, table, _) = load_table(&mapping)?;

            let selection = PortSelection {
                client_name: cfg.midi.client_name.clone(),
                input: input.or(cfg.midi.input_port),
                output: output.or(cfg.midi.output_port),
                poll: Duration::from_millis(cfg.midi.poll_interval_ms),
            };

            let mut source = MidiSource::open(&selection)?;
            let mut sink = MidiSink::open(&selection)?;
            info!("Remapping {} -> {} (Ctrl-C to stop)", source.port_name(), sink.port_name());

            run_engine(&table, &mut source, &mut sink)?;
        }

        Commands::Pipe { mapping, input, output } => {
            let (cfg, table, _) = load_table(&mapping)?;
            let poll = Duration::from_millis(cfg.midi.poll_interval_ms);

            let mut source = match &input {
                Some(path) => {
                    let file = File::open(path)
                        .with_context(|| format!("failed to open input {}", path.display()))?;
                    spawn_reader(file, poll)?
                }
                None => spawn_reader(std::io::stdin(), poll)?,
            };

            let writer: Box<dyn Write> = match &output {
                Some(path) => Box::new(
                    OpenOptions::new()
                        .write(true)
                        .create(true)
                        .truncate(true)
                        .open(path)
                        .with_context(|| format!("failed to open output {}", path.display()))?,
                ),
                None => Box::new(std::io::stdout()),
            };
            let mut sink = WriterSink::new(writer);

            run_engine(&table, &mut source, &mut sink)?;
        }

        Commands::Check { mapping, json } => match load_table(&mapping) {
            Ok((_, table, warnings)) => {
                if json {
                    print_json(&table, &warnings)?;
                } else {
                    println!("Configuration is valid!");
                    let active: Vec<_> = table.active().collect();
                    println!("  Mappings: {}", active.len());
                    for (source, entry) in active {
                        println!("    - {} -> {}", source, entry);
                    }
                    for warning in &warnings {
                        println!("  Warning: {}", warning);
                    }
                }
            }
            Err(e) => {
                println!("Configuration is invalid: {:#}", e);
                std::process::exit(1);
            }
        },

        Commands::Ports => {
            let (inputs, outputs) = midi::list_ports()?;

            println!("Input ports:");
            if inputs.is_empty() {
                println!("  (none)");
            }
            for name in &inputs {
                println!("  - {}", name);
            }

            println!("\nOutput ports:");
            if outputs.is_empty() {
                println!("  (none)");
            }
            for name in &outputs {
                println!("  - {}", name);
            }
        }

        Commands::Init => {
            let example_config = include_str!("../ccmap.example.yaml");

            if Path::new(DEFAULT_CONFIG).exists() {
                println!("{} already exists. Not overwriting.", DEFAULT_CONFIG);
            } else {
                std::fs::write(DEFAULT_CONFIG, example_config)?;
                println!("Created {} with example configuration.", DEFAULT_CONFIG);
            }
        }
    }

    Ok(())
}

/// Load the configuration file (if any) and apply `--map` specs on top
fn load_table(args: &MappingArgs) -> Result<(CcmapConfig, MappingTable, Vec<MappingWarning>)> {
    let path = args.config.clone().or_else(|| {
        Path::new(DEFAULT_CONFIG)
            .exists()
            .then(|| PathBuf::from(DEFAULT_CONFIG))
    });

    let cfg = match &path {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            config::load_config(path)?
        }
        None => CcmapConfig::default(),
    };

    let extra = config::parse_map_specs(&args.map)?;
    let (table, warnings) = cfg.build_table(&extra)?;

    for warning in &warnings {
        warn!("{}", warning);
    }
    if table.active().next().is_none() {
        warn!("No mappings configured, all input is forwarded unchanged");
    }

    Ok((cfg, table, warnings))
}

fn run_engine<S, K>(table: &MappingTable, source: &mut S, sink: &mut K) -> Result<Stats>
where
    S: ByteSource,
    K: ByteSink,
{
    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = shutdown.clone();
    ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
    })
    .context("failed to install Ctrl-C handler")?;

    let mut engine = Engine::new(table);
    let stats = engine.run(source, sink, &shutdown)?;

    info!(
        "Total: {} bytes in, {} bytes out, {} remapped",
        stats.bytes_in, stats.bytes_out, stats.remapped
    );
    Ok(stats)
}

/// One active mapping, with bounds in configuration units
#[derive(Serialize)]
struct ActiveMapping {
    source: SourceSelector,
    dest: DestinationType,
    number: u16,
    from: i32,
    to: i32,
}

#[derive(Serialize)]
struct CheckReport {
    mappings: Vec<ActiveMapping>,
    warnings: Vec<String>,
}

fn check_report(table: &MappingTable, warnings: &[MappingWarning]) -> CheckReport {
    CheckReport {
        mappings: table
            .active()
            .map(|(source, entry)| {
                let (from, to) = entry.user_range();
                ActiveMapping {
                    source,
                    dest: entry.dest,
                    number: entry.number,
                    from,
                    to,
                }
            })
            .collect(),
        warnings: warnings.iter().map(ToString::to_string).collect(),
    }
}

fn print_json(table: &MappingTable, warnings: &[MappingWarning]) -> Result<()> {
    let report = check_report(table, warnings);
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn init_logging(verbose: u8) -> Result<()> {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();

    Ok(())
}
