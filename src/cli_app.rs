//! Top-level CLI definition and dispatch.

use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{Shell as CompletionShell, generate};
use colored::{Colorize, control};
use serde_json::{Value, json};
use thiserror::Error;

use invoices_validator::controller::{self, RunOutcome, ScanReport};
use invoices_validator::core::config::Config;
use invoices_validator::core::errors::IvError;
use invoices_validator::core::logging::init_logging;
use invoices_validator::notify::NotificationManager;
use invoices_validator::scanner::rules::ValidationError;
use invoices_validator::storage::dropbox::DropboxClient;

const OUTPUT_FORMAT_ENV: &str = "INVOICES_VALIDATOR_OUTPUT_FORMAT";

/// Validates invoice folder and file names in Dropbox and reports violations.
#[derive(Debug, Parser)]
#[command(
    name = "invoices-validator",
    author,
    version,
    about = "Dropbox invoice naming validator",
    long_about = None,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Override config file path.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Force JSON output mode.
    #[arg(long, global = true)]
    json: bool,
    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
    /// Log level or filter directive (overrides LOG_LEVEL).
    #[arg(long, global = true, value_name = "LEVEL")]
    log_level: Option<String>,
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Scan the invoice tree and notify the configured channels.
    Run,
    /// Scan the invoice tree and print violations without notifying.
    Scan(ScanArgs),
    /// View configuration state.
    Config(ConfigArgs),
    /// Generate shell completions.
    Completions(CompletionsArgs),
    /// Show version and build metadata.
    Version(VersionArgs),
}

#[derive(Debug, Clone, Args, Default)]
struct ScanArgs {
    /// Exit with status 1 when any violation is found.
    #[arg(long)]
    fail_on_violations: bool,
}

#[derive(Debug, Clone, Args, Default)]
struct ConfigArgs {
    /// Config operation to run.
    #[command(subcommand)]
    command: Option<ConfigCommand>,
}

#[derive(Debug, Clone, Subcommand)]
enum ConfigCommand {
    /// Print resolved config file path.
    Path,
    /// Print effective configuration with credentials masked.
    Show,
}

#[derive(Debug, Clone, Args)]
struct CompletionsArgs {
    /// Shell to generate completion script for.
    #[arg(value_enum)]
    shell: CompletionShell,
}

#[derive(Debug, Clone, Args, Default)]
struct VersionArgs {
    /// Include additional build metadata fields.
    #[arg(long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Human,
    Json,
}

/// CLI error type with explicit exit-code mapping.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid user input or configuration.
    #[error("{0}")]
    User(String),
    /// Environment/runtime failure.
    #[error("{0}")]
    Runtime(String),
    /// Internal bug or invariant violation.
    #[error("{0}")]
    Internal(String),
    /// Scan finished with violations and the caller asked to fail on them.
    #[error("{0} failed validation(s)")]
    Violations(usize),
    /// JSON serialization failed.
    #[error("failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
    /// Output write failed.
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

impl CliError {
    /// Process exit code contract for the CLI.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::User(_) | Self::Violations(_) => 1,
            Self::Runtime(_) | Self::Io(_) => 2,
            Self::Internal(_) | Self::Json(_) => 3,
        }
    }
}

impl From<IvError> for CliError {
    fn from(err: IvError) -> Self {
        if err.is_fatal() {
            Self::User(err.to_string())
        } else {
            Self::Runtime(err.to_string())
        }
    }
}

/// Dispatch CLI commands.
pub fn run(cli: &Cli) -> Result<(), CliError> {
    if cli.no_color {
        control::set_override(false);
    }
    init_logging(cli.log_level.as_deref());

    match &cli.command {
        Command::Run => run_pipeline(cli),
        Command::Scan(args) => run_scan(cli, args),
        Command::Config(args) => run_config(cli, args),
        Command::Version(args) => emit_version(cli, args),
        Command::Completions(args) => {
            let mut command = Cli::command();
            let binary_name = command.get_name().to_string();
            generate(args.shell, &mut command, binary_name, &mut io::stdout());
            Ok(())
        }
    }
}

fn load_config(cli: &Cli) -> Result<Config, CliError> {
    Config::load(cli.config.as_deref()).map_err(|e| {
        tracing::error!("failed to load configuration: {e}");
        CliError::from(e)
    })
}

fn run_pipeline(cli: &Cli) -> Result<(), CliError> {
    let config = load_config(cli)?;
    let manager = NotificationManager::from_config(&config.notifications)?;
    let client = DropboxClient::new(config.storage.access_token.clone())?;
    let today = chrono::Local::now().date_naive();

    let outcome = controller::run(&config, &client, &manager, today);

    match output_mode(cli) {
        OutputMode::Human => print_run_human(&outcome),
        OutputMode::Json => {
            let payload = json!({
                "command": "run",
                "report": report_json(&outcome.report)?,
                "subject": outcome.subject,
                "dispatch": serde_json::to_value(&outcome.dispatch)?,
            });
            write_json_line(&payload)?;
        }
    }
    Ok(())
}

fn run_scan(cli: &Cli, args: &ScanArgs) -> Result<(), CliError> {
    let config = load_config(cli)?;
    let client = DropboxClient::new(config.storage.access_token.clone())?;

    let report = controller::scan(&config, &client);

    match output_mode(cli) {
        OutputMode::Human => print_report_human(&report),
        OutputMode::Json => {
            let payload = json!({
                "command": "scan",
                "report": report_json(&report)?,
            });
            write_json_line(&payload)?;
        }
    }

    if args.fail_on_violations && !report.is_clean() {
        return Err(CliError::Violations(report.violations.len()));
    }
    Ok(())
}

fn run_config(cli: &Cli, args: &ConfigArgs) -> Result<(), CliError> {
    match &args.command {
        None | Some(ConfigCommand::Path) => {
            let path = cli.config.clone().or_else(Config::default_path);
            let exists = path.as_ref().is_some_and(|p| p.exists());

            match output_mode(cli) {
                OutputMode::Human => match &path {
                    Some(path) => {
                        println!("{}", path.display());
                        if !exists {
                            println!("  (file does not exist; environment and defaults will be used)");
                        }
                    }
                    None => println!("(HOME is not set; environment and defaults will be used)"),
                },
                OutputMode::Json => {
                    let payload = json!({
                        "command": "config path",
                        "path": path.as_ref().map(|p| p.to_string_lossy().into_owned()),
                        "exists": exists,
                    });
                    write_json_line(&payload)?;
                }
            }
            Ok(())
        }
        Some(ConfigCommand::Show) => {
            let config = load_config(cli)?.redacted();

            match output_mode(cli) {
                OutputMode::Human => {
                    let toml_str = toml::to_string_pretty(&config)
                        .map_err(|e| CliError::Internal(format!("serialize config: {e}")))?;
                    println!("{toml_str}");
                }
                OutputMode::Json => {
                    let payload = json!({
                        "command": "config show",
                        "source": config.source_file.as_ref().map(|p| p.to_string_lossy().into_owned()),
                        "config": serde_json::to_value(&config)?,
                    });
                    write_json_line(&payload)?;
                }
            }
            Ok(())
        }
    }
}

fn print_run_human(outcome: &RunOutcome) {
    print_report_human(&outcome.report);

    let Some(subject) = &outcome.subject else {
        if !outcome.report.is_clean() {
            println!("\n  No notifiers enabled; nothing was sent.");
        }
        return;
    };
    println!("\n  Notification: {subject}");
    for channel in &outcome.dispatch.delivered {
        println!("    {} {channel}", "sent".green());
    }
    for failure in &outcome.dispatch.failed {
        println!(
            "    {} {}: {}",
            "failed".red().bold(),
            failure.channel,
            failure.error
        );
    }
}

fn print_report_human(report: &ScanReport) {
    println!(
        "Invoice Validation Results\n  Root: {}\n  Checked: {} entries ({} folders, {} files, {} ignored)\n  Pages: {} fetched, {} failed",
        report.root_path,
        report.entries_checked,
        report.folders_checked,
        report.files_checked,
        report.entries_ignored,
        report.pages_fetched,
        report.pages_failed,
    );
    if !report.is_complete() {
        println!(
            "  {}",
            "Listing ended early; part of the tree was not checked.".yellow()
        );
    }
    println!();

    if report.is_clean() {
        println!("  {}", "All files and folders passed validation.".green());
        return;
    }

    println!(
        "  {} failed validation(s):",
        report.violations.len().to_string().red().bold()
    );
    for err in &report.violations {
        print_violation(err);
    }
}

fn print_violation(err: &ValidationError) {
    println!("\n    {}", err.additional_info.bold());
    println!("      Actual:   {}", err.actual.red());
    println!("      Expected: {}", err.expected);
}

fn report_json(report: &ScanReport) -> Result<Value, CliError> {
    let mut value = serde_json::to_value(report)?;
    if let Value::Object(map) = &mut value {
        map.insert("clean".to_string(), Value::Bool(report.is_clean()));
        map.insert("complete".to_string(), Value::Bool(report.is_complete()));
    }
    Ok(value)
}

fn emit_version(cli: &Cli, args: &VersionArgs) -> Result<(), CliError> {
    let version = env!("CARGO_PKG_VERSION");
    let package = env!("CARGO_PKG_NAME");
    let target = option_env!("TARGET").unwrap_or("unknown");
    let profile = option_env!("PROFILE").unwrap_or("unknown");
    let git_sha = option_env!("GIT_SHA").unwrap_or("unknown");

    match output_mode(cli) {
        OutputMode::Human => {
            println!("invoices-validator {version}");
            if args.verbose {
                println!("package: {package}");
                println!("target: {target}");
                println!("profile: {profile}");
                println!("git_sha: {git_sha}");
            }
        }
        OutputMode::Json => {
            let payload = json!({
                "binary": "invoices-validator",
                "version": version,
                "package": package,
                "build": {
                    "target": target,
                    "profile": profile,
                    "git_sha": git_sha,
                }
            });
            write_json_line(&payload)?;
        }
    }
    Ok(())
}

fn write_json_line(payload: &Value) -> Result<(), CliError> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, payload)?;
    writeln!(stdout)?;
    Ok(())
}

fn output_mode(cli: &Cli) -> OutputMode {
    let env_mode = std::env::var(OUTPUT_FORMAT_ENV).ok();
    resolve_output_mode(cli.json, env_mode.as_deref(), io::stdout().is_terminal())
}

fn resolve_output_mode(json_flag: bool, env_mode: Option<&str>, stdout_is_tty: bool) -> OutputMode {
    if json_flag {
        return OutputMode::Json;
    }

    let fallback = if stdout_is_tty {
        OutputMode::Human
    } else {
        OutputMode::Json
    };

    match env_mode
        .map(str::trim)
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("json") => OutputMode::Json,
        Some("human") => OutputMode::Human,
        _ => fallback,
    }
}
