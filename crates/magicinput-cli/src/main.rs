//! Magic Input
//!
//! Classifies pasted text locally and, when the local detectors are
//! inconclusive, asks an external language model for a semantic reading.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use magicinput_cli::config::{default_config_path, AppConfig, ConfigOverrides};
use magicinput_cli::render::{self, ReportJson};
use magicinput_cli::watch::{LineWatcher, WatchedReport};
use magicinput_cli::{AnalysisSession, EscalationOutcome};
use magicinput_detectors::ClassificationEngine;
use magicinput_gateway::{EscalationGateway, OpenAiGateway};
use magicinput_history::{FileStore, HistoryLedger};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::signal;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "magic-input")]
#[command(about = "Recognize what a piece of pasted text is", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// API key for the semantic analysis service
    #[arg(long, env = "MAGIC_INPUT_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    /// Base URL of the OpenAI-compatible API
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Model used for semantic analysis
    #[arg(long, global = true)]
    model: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze text given as an argument or read from stdin
    Analyze {
        /// Text to analyze; stdin is read when omitted
        text: Option<String>,

        #[command(flatten)]
        opts: AnalyzeOpts,
    },

    /// Analyze each stdin line as it arrives; newer lines supersede older ones
    Watch {
        #[command(flatten)]
        opts: AnalyzeOpts,
    },

    /// Inspect or edit past analyses
    History {
        #[command(subcommand)]
        action: HistoryCommand,
    },

    /// Inspect or edit configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
}

#[derive(Args, Debug)]
struct AnalyzeOpts {
    /// Never contact the semantic analysis service
    #[arg(long)]
    no_escalate: bool,

    /// Escalation timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Print JSON instead of text
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum HistoryCommand {
    /// List entries, most recent first
    List {
        #[arg(long)]
        json: bool,
    },
    /// Show one entry
    Show {
        id: u64,
        #[arg(long)]
        json: bool,
    },
    /// Delete one entry
    Delete { id: u64 },
    /// Delete every entry
    Clear,
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Print the effective configuration with the API key masked
    Show,
    /// Print the configuration file path
    Path,
    /// Store an API key in the configuration file
    SetKey { key: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let Cli {
        config,
        api_key,
        base_url,
        model,
        verbose,
        command,
    } = Cli::parse();

    init_tracing(verbose);
    describe_metrics();

    let config_path = match config {
        Some(path) => path,
        None => default_config_path().context("no configuration directory available")?,
    };
    let overrides = ConfigOverrides {
        api_key,
        base_url,
        model,
        ..Default::default()
    };

    match command {
        Command::Analyze { text, opts } => {
            let config = load_config(&config_path, &with_timeout(&overrides, &opts))?;
            let content = match text {
                Some(text) => text,
                None => read_stdin().await?,
            };
            run_analyze(&config, content, &opts).await
        }
        Command::Watch { opts } => {
            let config = load_config(&config_path, &with_timeout(&overrides, &opts))?;
            run_watch(&config, &opts).await
        }
        Command::History { action } => {
            let config = load_config(&config_path, &overrides)?;
            run_history(&config, action)
        }
        Command::Config { action } => run_config(&config_path, &overrides, action),
    }
}

/// Initialize tracing subscriber
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("magicinput=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("magicinput=info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Register metric descriptions; embedders install the recorder
fn describe_metrics() {
    metrics::describe_counter!(
        "magicinput_classifications_total",
        "Total number of inputs classified"
    );
    metrics::describe_counter!(
        "magicinput_escalations_total",
        "Escalation outcomes by kind"
    );
    metrics::describe_histogram!(
        "magicinput_classify_latency_us",
        metrics::Unit::Microseconds,
        "Local classification latency in microseconds"
    );
}

fn with_timeout(overrides: &ConfigOverrides, opts: &AnalyzeOpts) -> ConfigOverrides {
    ConfigOverrides {
        timeout_secs: opts.timeout,
        ..overrides.clone()
    }
}

fn load_config(path: &std::path::Path, overrides: &ConfigOverrides) -> Result<AppConfig> {
    let mut config = AppConfig::load(path)?;
    config.apply(overrides);
    debug!(path = %path.display(), "Configuration loaded");
    Ok(config)
}

fn open_ledger(config: &AppConfig) -> Result<Arc<HistoryLedger>> {
    let dir = config.history_dir()?;
    let ledger = HistoryLedger::load(Box::new(FileStore::new(dir)), config.history.limits);
    Ok(Arc::new(ledger))
}

fn build_session(config: &AppConfig, opts: &AnalyzeOpts) -> Result<AnalysisSession> {
    let engine = ClassificationEngine::builtin()?;
    info!(detectors = engine.registry().len(), "Detector registry ready");

    let gateway: Arc<dyn EscalationGateway> = Arc::new(OpenAiGateway::new(config.gateway.clone())?);
    let mut settings = config.session.clone();
    if opts.no_escalate {
        settings.escalate = false;
    }

    Ok(AnalysisSession::new(
        engine,
        Some(gateway),
        open_ledger(config)?,
        &settings,
    ))
}

async fn read_stdin() -> Result<String> {
    let mut content = String::new();
    tokio::io::stdin()
        .read_to_string(&mut content)
        .await
        .context("failed to read stdin")?;
    Ok(content)
}

async fn run_analyze(config: &AppConfig, content: String, opts: &AnalyzeOpts) -> Result<()> {
    let session = Arc::new(build_session(config, opts)?);

    let mut task = {
        let session = Arc::clone(&session);
        tokio::spawn(async move { session.analyze(&content).await })
    };

    let report = tokio::select! {
        report = &mut task => report?,
        _ = signal::ctrl_c() => {
            info!("Interrupted, cancelling analysis");
            session.cancel_inflight();
            task.await?
        }
    };

    print_report(&report, opts.json)
}

async fn run_watch(config: &AppConfig, opts: &AnalyzeOpts) -> Result<()> {
    let session = Arc::new(build_session(config, opts)?);
    let mut watcher = LineWatcher::new(session);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line.context("failed to read stdin")? {
                    Some(line) => {
                        watcher.submit(line);
                    }
                    None => break,
                }
            }
            Some(done) = watcher.next_report(), if watcher.pending() > 0 => {
                print_watched(&done?, opts.json)?;
            }
            _ = signal::ctrl_c() => {
                info!("Interrupted, cancelling analysis");
                watcher.session().cancel_inflight();
                break;
            }
        }
    }

    while let Some(done) = watcher.next_report().await {
        print_watched(&done?, opts.json)?;
    }
    Ok(())
}

fn print_watched(done: &WatchedReport, json: bool) -> Result<()> {
    if matches!(done.report.escalation, EscalationOutcome::Superseded) {
        debug!(line = done.index, "Dropping superseded report");
        return Ok(());
    }
    print_report(&done.report, json)
}

fn print_report(report: &magicinput_cli::AnalysisReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&ReportJson::from(report))?);
    } else {
        print!("{}", render::report_text(report));
    }
    Ok(())
}

fn run_history(config: &AppConfig, action: HistoryCommand) -> Result<()> {
    let ledger = open_ledger(config)?;

    match action {
        HistoryCommand::List { json } => {
            let entries = ledger.list();
            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else {
                print!("{}", render::history_list_text(&entries));
            }
        }
        HistoryCommand::Show { id, json } => {
            let entry = ledger
                .get(id)
                .with_context(|| format!("no history entry with id {}", id))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&entry)?);
            } else {
                print!("{}", render::history_entry_text(&entry));
            }
        }
        HistoryCommand::Delete { id } => {
            if !ledger.delete(id) {
                anyhow::bail!("no history entry with id {}", id);
            }
            println!("Deleted {}", id);
        }
        HistoryCommand::Clear => {
            ledger.clear();
            println!("History cleared");
        }
    }
    Ok(())
}

fn run_config(
    config_path: &std::path::Path,
    overrides: &ConfigOverrides,
    action: ConfigCommand,
) -> Result<()> {
    match action {
        ConfigCommand::Show => {
            let config = load_config(config_path, overrides)?;
            let mut shown = config.clone();
            shown.gateway.api_key = config.gateway.masked_api_key();
            print!("{}", serde_yaml::to_string(&shown)?);
            println!("# history dir: {}", config.history_dir()?.display());
        }
        ConfigCommand::Path => {
            println!("{}", config_path.display());
        }
        ConfigCommand::SetKey { key } => {
            AppConfig::set_api_key(config_path, &key)?;
            info!(path = %config_path.display(), "API key saved");
            println!("API key saved to {}", config_path.display());
        }
    }
    Ok(())
}
