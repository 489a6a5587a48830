//! hookgate: policy gateway for autonomous coding agents.
//!
//! The agent runtime invokes `hookgate dispatch` at each lifecycle point with
//! one event as JSON on stdin. The decision is written as JSON on stdout and
//! a binding block is signalled with exit code 2, the reason going to stderr.
//! A dispatch that cannot reach a decision (bad event, bad configuration,
//! unwritable audit log) also exits 2, with the error as the reason.
//! Logs go to stderr so stdout stays machine-readable.
//!
//! Usage:
//!   hookgate dispatch --config hookgate.toml < event.json
//!   hookgate check-config --config hookgate.toml
//!   hookgate verify-audit logs/audit.jsonl

use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use thiserror::Error;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use hookgate_audit::{verify_file, InMemoryAuditLog, JsonlAuditLog};
use hookgate_config::GateConfig;
use hookgate_contracts::{error::GateError, event::Event, verdict::Decision};
use hookgate_core::{check::CheckRegistry, traits::AuditSink, Dispatcher};

/// Exit code for a binding block. Agent hook runners read it as "deny".
const EXIT_BLOCK: u8 = 2;

// ── CLI definition ────────────────────────────────────────────────────────────

/// hookgate: evaluate agent actions against an ordered chain of policy hooks.
#[derive(Parser)]
#[command(
    name = "hookgate",
    about = "Policy gateway for autonomous coding agents",
    long_about = "Runs every agent action through an ordered chain of policy hooks,\n\
                  returns one allow/block decision, and records it in a hash-chained audit log."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Evaluate one event read as JSON from stdin.
    Dispatch {
        /// Hook configuration file.
        #[arg(short, long, default_value = "hookgate.toml")]
        config: PathBuf,
        /// JSON-lines audit log. Overrides `audit_log` in the configuration.
        #[arg(long)]
        audit_log: Option<PathBuf>,
    },
    /// Load and validate a hook configuration without dispatching anything.
    CheckConfig {
        #[arg(short, long, default_value = "hookgate.toml")]
        config: PathBuf,
    },
    /// Verify the hash chain of a JSON-lines audit log.
    VerifyAudit {
        path: PathBuf,
    },
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Gate(#[from] GateError),

    #[error("failed to read event from stdin: {0}")]
    Input(#[source] std::io::Error),

    #[error("malformed event: {0}")]
    Event(#[source] serde_json::Error),

    #[error("failed to write decision: {0}")]
    Output(#[source] std::io::Error),
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> ExitCode {
    // Set RUST_LOG=debug for per-hook output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Dispatch { config, audit_log } => return dispatch_stdin(&config, audit_log).await,
        Command::CheckConfig { config } => check_config(&config),
        Command::VerifyAudit { path } => verify_audit(&path),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("hookgate: {}", e);
            ExitCode::FAILURE
        }
    }
}

// ── dispatch ──────────────────────────────────────────────────────────────────

async fn dispatch_stdin(config: &Path, audit_log: Option<PathBuf>) -> ExitCode {
    let mut input = String::new();
    let result = match std::io::stdin().read_to_string(&mut input) {
        Ok(_) => run_dispatch(&input, config, audit_log).await,
        Err(e) => Err(CliError::Input(e)),
    };
    let result = result.and_then(|decision| {
        print_decision(&decision)?;
        Ok(decision)
    });

    let code = dispatch_exit_code(&result);
    match &result {
        Ok(decision) if code == EXIT_BLOCK => {
            if let Some(reason) = &decision.reason {
                eprintln!("{}", reason);
            }
        }
        Ok(_) => {}
        Err(e) => eprintln!("hookgate: {}", e),
    }
    ExitCode::from(code)
}

fn print_decision(decision: &Decision) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer(&mut stdout, decision).map_err(|e| CliError::Output(e.into()))?;
    writeln!(stdout).map_err(CliError::Output)
}

/// Parse, configure, dispatch. The configuration is loaded before the event
/// is dispatched, so a configuration error means no decision at all.
async fn run_dispatch(
    input: &str,
    config_path: &Path,
    audit_log: Option<PathBuf>,
) -> Result<Decision, CliError> {
    let event: Event = serde_json::from_str(input).map_err(CliError::Event)?;

    let config = GateConfig::from_file(config_path)?;
    let hooks = config.build(&CheckRegistry::new())?;

    let sink = audit_sink(audit_log.or_else(|| config.audit_log()));
    // Each invocation is a fresh process: register the session before the
    // dispatcher appends to the log.
    sink.open(event.session_id())?;

    let dispatcher = Dispatcher::new(hooks, sink);
    let decision = dispatcher.dispatch(&event).await?;

    info!(
        session_id = %event.session_id(),
        phase = %event.phase(),
        outcome = decision.outcome.as_str(),
        "event dispatched"
    );
    Ok(decision)
}

fn audit_sink(path: Option<PathBuf>) -> Arc<dyn AuditSink> {
    match path {
        Some(path) => Arc::new(JsonlAuditLog::new(path)),
        None => {
            warn!("no audit log configured, decisions are not persisted");
            Arc::new(InMemoryAuditLog::new())
        }
    }
}

/// 0 for allow and advisory blocks, `EXIT_BLOCK` for binding blocks.
fn exit_code(decision: &Decision) -> u8 {
    if decision.is_blocked() && !decision.advisory {
        EXIT_BLOCK
    } else {
        0
    }
}

/// Like `exit_code`, but a dispatch that failed before deciding blocks.
fn dispatch_exit_code(result: &Result<Decision, CliError>) -> u8 {
    match result {
        Ok(decision) => exit_code(decision),
        Err(_) => EXIT_BLOCK,
    }
}

// ── check-config ──────────────────────────────────────────────────────────────

fn check_config(path: &Path) -> Result<ExitCode, CliError> {
    let config = GateConfig::from_file(path)?;
    let hooks = config.build(&CheckRegistry::new())?;

    println!("{}: {} hook(s)", path.display(), hooks.len());
    for hook in &hooks {
        println!(
            "  {:<24} {:<32} timeout={}ms {}{}",
            hook.name(),
            hook.matcher().to_string(),
            hook.timeout().as_millis(),
            hook.failure_mode().as_str(),
            if hook.is_safety_critical() { " safety-critical" } else { "" }
        );
    }
    match config.audit_log() {
        Some(log) => println!("audit log: {}", log.display()),
        None => println!("audit log: none (decisions are not persisted)"),
    }
    Ok(ExitCode::SUCCESS)
}

// ── verify-audit ──────────────────────────────────────────────────────────────

fn verify_audit(path: &Path) -> Result<ExitCode, CliError> {
    let report = verify_file(path)?;

    println!("{}: {} entries", path.display(), report.entries);
    if !report.terminal_hash.is_empty() {
        println!("terminal hash: {}", report.terminal_hash);
    }
    match report.first_break {
        None => {
            println!("chain intact");
            Ok(ExitCode::SUCCESS)
        }
        Some(idx) => {
            println!("chain broken at entry {}", idx);
            Ok(ExitCode::FAILURE)
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
