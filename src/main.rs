use std::io::{self, BufRead, IsTerminal};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use company_avail::check::{CheckResult, Engine};
use company_avail::config::EngineConfig;
use company_avail::http::HttpRegistry;
use company_avail::registry::{InMemoryRegistry, Registry};
use company_avail::suggest;

#[derive(Parser)]
#[command(
    name = "company-avail",
    version,
    about = "Check whether company names comply with registry naming rules and are still available",
    after_help = "Checks naming rules (length, leading digit, prohibited terms such as \
                  Bank or National, legal suffix, punctuation) and queries the registry \
                  for identical or overlapping registrations.\n\n\
                  This approximates registry rules; it is not a substitute for an \
                  authoritative filing check."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Config file (TOML)
    #[arg(long, global = true, env = "COMPANY_AVAIL_CONFIG")]
    config: Option<PathBuf>,

    /// Base URL of the HTTP registry
    #[arg(long, global = true, env = "COMPANY_AVAIL_REGISTRY_URL")]
    registry_url: Option<String>,

    /// Use a JSON file of registrations instead of an HTTP registry
    #[arg(long, global = true, conflicts_with = "registry_url")]
    registry_file: Option<PathBuf>,

    /// API key for the HTTP registry
    #[arg(long, global = true, env = "COMPANY_AVAIL_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Concurrent registry lookups in a batch
    #[arg(long, global = true)]
    workers: Option<usize>,

    /// Per-lookup timeout in milliseconds
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Suppress output, exit code only
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log debug detail to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Check company names (also reads from stdin)
    Check {
        /// Names to check
        names: Vec<String>,

        /// Only print available names
        #[arg(short, long)]
        available_only: bool,
    },
    /// Generate alternative names
    Suggest {
        /// Name to derive alternatives from
        base: String,

        /// How many alternatives to generate
        #[arg(short = 'n', long, default_value_t = 5)]
        count: usize,

        /// Also check the base name and every alternative (alternatives
        /// beyond the batch limit minus one are dropped)
        #[arg(long)]
        check: bool,
    },
    /// Check that the registry is reachable
    Health,
}

fn main() -> ExitCode {
    reset_sigpipe();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(2);
        }
    };

    match &cli.command {
        Command::Check {
            names,
            available_only,
        } => run_check(&cli, config, names.clone(), *available_only),
        Command::Suggest { base, count, check } => run_suggest(&cli, config, base, *count, *check),
        Command::Health => run_health(&cli, config),
    }
}

fn run_check(cli: &Cli, config: EngineConfig, mut names: Vec<String>, available_only: bool) -> ExitCode {
    // Read from stdin if not a terminal
    if !io::stdin().is_terminal() {
        for line in io::stdin().lock().lines() {
            match line {
                Ok(l) => {
                    let trimmed = l.trim().to_string();
                    if !trimmed.is_empty() {
                        names.push(trimmed);
                    }
                }
                Err(e) => {
                    eprintln!("error: reading stdin: {e}");
                    return ExitCode::from(2);
                }
            }
        }
    }

    if names.is_empty() {
        eprintln!("error: no company names provided");
        eprintln!("usage: company-avail check [OPTIONS] [NAMES...]");
        return ExitCode::from(2);
    }

    // Deduplicate while preserving order
    let mut seen = std::collections::HashSet::new();
    names.retain(|n| seen.insert(n.clone()));

    let engine = match build_engine(cli, config) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(2);
        }
    };

    if let [name] = names.as_slice() {
        return match engine.check_one(name) {
            Ok(result) => {
                if cli.json {
                    print_json(cli, &result);
                } else {
                    print_results(cli, std::slice::from_ref(&result), available_only);
                }
                exit_for(result.is_available)
            }
            Err(e) => {
                if !cli.quiet {
                    println!("{name}\tinvalid: {e}");
                }
                ExitCode::from(1)
            }
        };
    }

    match engine.check_batch(&names) {
        Ok(batch) => {
            if cli.json {
                print_json(cli, &batch);
            } else {
                print_results(cli, &batch.results, available_only);
            }
            exit_for(batch.results.iter().all(|r| r.is_available))
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(2)
        }
    }
}

fn run_suggest(cli: &Cli, config: EngineConfig, base: &str, count: usize, check: bool) -> ExitCode {
    if !check {
        return match suggest::suggest(base, count, &config.legal_suffix) {
            Ok(set) => {
                if cli.json {
                    print_json(cli, &set);
                } else if !cli.quiet {
                    for suggestion in &set.suggestions {
                        println!("{suggestion}");
                    }
                }
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("error: {e}");
                ExitCode::from(2)
            }
        };
    }

    let engine = match build_engine(cli, config) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(2);
        }
    };
    match engine.check_with_alternatives(base, count) {
        Ok(batch) => {
            if cli.json {
                print_json(cli, &batch);
            } else {
                print_results(cli, &batch.results, false);
            }
            exit_for(batch.results.iter().any(|r| r.is_available))
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(2)
        }
    }
}

fn run_health(cli: &Cli, config: EngineConfig) -> ExitCode {
    let engine = match build_engine(cli, config) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(2);
        }
    };
    let report = engine.health();
    if cli.json {
        print_json(cli, &report);
    } else if !cli.quiet {
        match &report.message {
            None => println!("registry\treachable ({}ms)", report.latency_ms),
            Some(msg) => println!("registry\tunreachable: {msg}"),
        }
    }
    exit_for(report.reachable)
}

fn load_config(cli: &Cli) -> Result<EngineConfig, String> {
    let mut config = match &cli.config {
        Some(path) => EngineConfig::load(path).map_err(|e| e.to_string())?,
        None => EngineConfig::default(),
    };
    if let Some(workers) = cli.workers {
        config.workers = workers;
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        config.lookup_timeout_ms = timeout_ms;
    }
    if let Some(url) = &cli.registry_url {
        config.registry.base_url = Some(url.clone());
    }
    if let Some(key) = &cli.api_key {
        config.registry.api_key = Some(key.clone());
    }
    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

fn build_engine(cli: &Cli, config: EngineConfig) -> Result<Engine, String> {
    let registry: Arc<dyn Registry> = if let Some(path) = &cli.registry_file {
        let registry = InMemoryRegistry::from_json_file(path)
            .map_err(|e| format!("reading registry file {}: {e}", path.display()))?;
        Arc::new(registry)
    } else if let Some(url) = &config.registry.base_url {
        let mut registry = HttpRegistry::new(url.as_str(), config.lookup_timeout());
        if let Some(key) = &config.registry.api_key {
            registry = registry.with_api_key(config.registry.api_key_header.as_str(), key.as_str());
        }
        Arc::new(registry)
    } else {
        return Err(
            "no registry configured (use --registry-url, --registry-file or a config file)".into(),
        );
    };
    Ok(Engine::new(registry, config))
}

fn print_results(cli: &Cli, results: &[CheckResult], available_only: bool) {
    if cli.quiet {
        return;
    }
    for result in results {
        if available_only && !result.is_available {
            continue;
        }
        let detail = result
            .degraded
            .as_deref()
            .or_else(|| result.validation.errors.first().map(String::as_str))
            .map(|d| format!(": {d}"))
            .unwrap_or_default();
        println!(
            "{}\t{} (score {}, {}){detail}",
            result.name,
            result.recommendation.label(),
            result.validation.score,
            result.validation.band()
        );
    }
}

fn print_json<T: Serialize>(cli: &Cli, value: &T) {
    if cli.quiet {
        return;
    }
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("error: serializing output: {e}"),
    }
}

fn exit_for(ok: bool) -> ExitCode {
    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let env_filter =
        EnvFilter::try_from_env("COMPANY_AVAIL_LOG").unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr).with_target(false))
        .with(env_filter)
        .init();
}

#[cfg(unix)]
fn reset_sigpipe() {
    // Piping into `head` should end the process quietly rather than panic in println!.
    unsafe {
        libc::signal(libc::SIGPIPE, libc::SIG_DFL);
    }
}

#[cfg(not(unix))]
fn reset_sigpipe() {}
