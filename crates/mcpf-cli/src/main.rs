// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use mcpf_config::{Endpoint, FuzzConfig, Protocol};
use mcpf_core::{Outcome, RunRecord};
use mcpf_session::{SessionDriver, SessionOutcome};
use mcpf_strategy::{Mode, PhaseSelection};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Exit status for a session that never got to run at all (bad config,
/// unreachable endpoint). A completed session reports its own status via
/// `SessionSummary::exit_status`.
const EXIT_STARTUP_ERROR: i32 = 2;

#[derive(Parser, Debug)]
#[command(name = "mcpf", version, about = "MCP protocol-conformance fuzzer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging.
    #[arg(long)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a fuzzing session against a target server.
    Run(RunArgs),

    /// Print the configuration file's JSON schema.
    Schema,
}

#[derive(clap::Args, Debug)]
struct RunArgs {
    /// TOML config file to load before applying the flags below.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Wire protocol to speak.
    #[arg(long, value_enum)]
    protocol: Option<ProtocolArg>,

    /// Target URL, for the network-family protocols.
    #[arg(long)]
    url: Option<String>,

    /// Executable to spawn, for the stdio protocol.
    #[arg(long)]
    command: Option<String>,

    /// Argument passed to --command. Can be repeated.
    #[arg(long = "arg")]
    command_args: Vec<String>,

    /// Which targets to fuzz.
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,

    /// Which generation phase(s) to run.
    #[arg(long, value_enum)]
    phase: Option<PhaseArg>,

    /// RNG seed, for a reproducible run.
    #[arg(long)]
    seed: Option<u64>,

    /// Cases generated per phase, per target.
    #[arg(long)]
    runs_per_tool: Option<usize>,

    /// Maximum cases dispatched concurrently.
    #[arg(long)]
    max_concurrency: Option<usize>,

    /// Wall-clock budget per case, in seconds.
    #[arg(long)]
    timeout_s: Option<f64>,

    /// Absolute path the filesystem sandbox confines generated paths to.
    #[arg(long)]
    fs_root: Option<PathBuf>,

    /// Disable the safety filter. Only relaxes the network policy; the
    /// danger-pattern scan still runs.
    #[arg(long)]
    no_safety: bool,

    /// Disable filesystem sandbox scrubbing of path-shaped string leaves.
    #[arg(long)]
    no_sandbox_paths: bool,

    /// Emit one JSON `RunRecord` per line to stdout instead of a
    /// human-readable summary.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ProtocolArg {
    Http,
    Https,
    Sse,
    Stdio,
    StreamableHttp,
}

impl From<ProtocolArg> for Protocol {
    fn from(v: ProtocolArg) -> Self {
        match v {
            ProtocolArg::Http => Protocol::Http,
            ProtocolArg::Https => Protocol::Https,
            ProtocolArg::Sse => Protocol::Sse,
            ProtocolArg::Stdio => Protocol::Stdio,
            ProtocolArg::StreamableHttp => Protocol::StreamableHttp,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Tools,
    Protocol,
    Both,
}

impl From<ModeArg> for Mode {
    fn from(v: ModeArg) -> Self {
        match v {
            ModeArg::Tools => Mode::Tools,
            ModeArg::Protocol => Mode::Protocol,
            ModeArg::Both => Mode::Both,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PhaseArg {
    Realistic,
    Aggressive,
    Both,
}

impl From<PhaseArg> for PhaseSelection {
    fn from(v: PhaseArg) -> Self {
        match v {
            PhaseArg::Realistic => PhaseSelection::Realistic,
            PhaseArg::Aggressive => PhaseSelection::Aggressive,
            PhaseArg::Both => PhaseSelection::Both,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = if cli.debug { EnvFilter::new("mcpf=debug") } else { EnvFilter::new("mcpf=info") };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let exit_code = match cli.command {
        Commands::Schema => cmd_schema(),
        Commands::Run(args) => match cmd_run(args).await {
            Ok(code) => code,
            Err(err) => {
                eprintln!("error: {err:#}");
                EXIT_STARTUP_ERROR
            }
        },
    };

    std::process::exit(exit_code);
}

fn cmd_schema() -> i32 {
    let schema = schemars::schema_for!(FuzzConfig);
    println!("{}", serde_json::to_string_pretty(&schema).expect("schema serializes"));
    0
}

async fn cmd_run(args: RunArgs) -> Result<i32> {
    let mut config = mcpf_config::load_config(args.config.as_deref())
        .with_context(|| "load configuration")?;
    apply_overrides(&mut config, &args)?;

    let warnings = mcpf_config::validate_config(&config).with_context(|| "validate configuration")?;
    for warning in &warnings {
        tracing::warn!(target: "mcpf.cli", "{warning}");
    }

    let driver = SessionDriver::new(config);
    let cancel = driver.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!(target: "mcpf.cli", "received interrupt, stopping at the next dispatch boundary");
            cancel.cancel();
        }
    });

    let outcome = driver.run().await.with_context(|| "run session")?;
    print_outcome(&outcome, args.json);

    Ok(outcome.summary.exit_status())
}

fn apply_overrides(config: &mut FuzzConfig, args: &RunArgs) -> Result<()> {
    if let Some(protocol) = args.protocol {
        config.protocol = protocol.into();
    }
    if let Some(ref command) = args.command {
        config.endpoint = Endpoint::Process { command: command.clone(), args: args.command_args.clone() };
    } else if let Some(ref url) = args.url {
        config.endpoint = Endpoint::Network { url: url.parse().with_context(|| format!("parse --url '{url}'"))? };
    }
    if let Some(mode) = args.mode {
        config.mode = mode.into();
    }
    if let Some(phase) = args.phase {
        config.phase = phase.into();
    }
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    if let Some(runs_per_tool) = args.runs_per_tool {
        config.runs_per_tool = runs_per_tool;
    }
    if let Some(max_concurrency) = args.max_concurrency {
        config.max_concurrency = max_concurrency;
    }
    if let Some(timeout_s) = args.timeout_s {
        config.timeout_s = timeout_s;
    }
    if let Some(ref fs_root) = args.fs_root {
        config.fs_root = fs_root.clone();
    }
    if args.no_safety {
        config.safety_enabled = false;
    }
    if args.no_sandbox_paths {
        config.sandbox_paths = false;
    }
    Ok(())
}

fn print_outcome(outcome: &SessionOutcome, json: bool) {
    if json {
        for record in &outcome.records {
            println!("{}", serde_json::to_string(record).expect("run record serializes"));
        }
        println!("{}", serde_json::to_string(&outcome.summary).expect("summary serializes"));
        return;
    }

    for record in &outcome.records {
        print_record(record);
    }
    eprintln!("---");
    eprintln!("cases:               {}", outcome.records.len());
    eprintln!("blocked:             {}", outcome.summary.blocked_count);
    eprintln!("invariant_violations: {}", outcome.summary.invariant_violations);
    eprintln!("exit_status:         {}", outcome.summary.exit_status());
}

fn print_record(record: &RunRecord) {
    match &record.outcome {
        Outcome::Success { .. } => eprintln!("[ok]      {}", record.case.fingerprint()),
        Outcome::Blocked { reason } => eprintln!("[blocked] {} :: {reason}", record.case.fingerprint()),
        Outcome::ProtocolError { code, msg } => {
            eprintln!("[proto]   {} :: {code} {msg}", record.case.fingerprint())
        }
        Outcome::TransportError { kind } => eprintln!("[xport]   {} :: {kind:?}", record.case.fingerprint()),
        Outcome::Timeout => eprintln!("[timeout] {}", record.case.fingerprint()),
        Outcome::InvariantViolation { kind } => {
            eprintln!("[invariant] {} :: {kind:?}", record.case.fingerprint())
        }
    }
}
