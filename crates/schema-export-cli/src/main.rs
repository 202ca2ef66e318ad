//! schema-export CLI - export a database's tables as a portable SQL script.

use clap::{Parser, Subcommand};
use schema_export::{Config, ExportError, Orchestrator};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, Level};
use tracing_subscriber::fmt::format::FmtSpan;

/// Log file used by `log` when neither `--output` nor `output.log_file` is set.
const DEFAULT_LOG_FILE: &str = "metadata.log";

#[derive(Parser)]
#[command(name = "schema-export")]
#[command(about = "Export database tables as a portable SQL script")]
#[command(version)]
struct Cli {
    /// Path to YAML configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Output JSON result to stdout
    #[arg(long)]
    output_json: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info")]
    verbosity: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the SQL script (and the metadata log when configured)
    Run {
        /// Emit INSERT statements for every row
        #[arg(long, conflicts_with = "no_data")]
        include_data: bool,

        /// Emit table definitions only
        #[arg(long)]
        no_data: bool,

        /// Override the script file
        #[arg(long)]
        script: Option<PathBuf>,

        /// Override the metadata log file
        #[arg(long)]
        log: Option<PathBuf>,

        /// Replace an existing script file
        #[arg(long, short)]
        force: bool,
    },

    /// Write the metadata log only
    Log {
        /// Log file [default: output.log_file, then metadata.log]
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Capture the source into a JSON snapshot
    Snapshot {
        /// Snapshot file to write
        #[arg(short, long)]
        output: PathBuf,

        /// Also capture the rows of every table
        #[arg(long)]
        include_data: bool,
    },

    /// Test the source connection
    HealthCheck,
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

fn run() -> Result<(), ExportError> {
    let cli = Cli::parse();

    setup_logging(&cli.verbosity, &cli.log_format);

    let mut config = Config::load(&cli.config)?;
    info!("Loaded configuration from {:?}", cli.config);

    match cli.command {
        Commands::Run {
            include_data,
            no_data,
            script,
            log,
            force,
        } => {
            // Apply overrides
            if include_data {
                config.export.include_data = true;
            }
            if no_data {
                config.export.include_data = false;
            }
            if let Some(path) = script {
                config.output.script_file = path;
            }
            if let Some(path) = log {
                config.output.log_file = Some(path);
            }
            if force {
                config.output.overwrite = true;
            }

            let orchestrator = Orchestrator::new(config)?;
            let result = orchestrator.run()?;

            if cli.output_json {
                println!("{}", result.to_json()?);
            } else {
                println!("\nExport completed!");
                println!("  Run ID: {}", result.run_id);
                println!("  Source: {}", result.source);
                println!("  Duration: {:.2}s", result.duration_seconds);
                println!("  Tables: {}", result.tables);
                println!("  Rows: {}", result.rows_written);
                println!("  Script: {}", result.script_file.display());
                if let Some(ref log_file) = result.log_file {
                    println!("  Log: {}", log_file.display());
                }
                if result.null_substitutions > 0 {
                    println!("  Values written as NULL: {}", result.null_substitutions);
                }
                if !result.tables_without_data.is_empty() {
                    println!("  Tables without data: {:?}", result.tables_without_data);
                }
            }
        }

        Commands::Log { output } => {
            let path = output
                .or_else(|| config.output.log_file.clone())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE));
            let orchestrator = Orchestrator::new(config)?;
            orchestrator.write_log(&path)?;
            println!("Metadata log written to {}", path.display());
        }

        Commands::Snapshot {
            output,
            include_data,
        } => {
            let orchestrator = Orchestrator::new(config)?;
            let collections = orchestrator.snapshot(&output, include_data)?;
            println!(
                "Snapshot written to {} ({} collections)",
                output.display(),
                collections
            );
        }

        Commands::HealthCheck => {
            let orchestrator = Orchestrator::new(config)?;
            let result = orchestrator.health_check()?;

            if cli.output_json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("Health Check Results:");
                println!(
                    "  Source ({}): {} ({}ms)",
                    result.source,
                    if result.connected { "OK" } else { "FAILED" },
                    result.latency_ms
                );
                if let Some(tables) = result.tables {
                    println!("    Tables: {}", tables);
                }
                if let Some(ref err) = result.error {
                    println!("    Error: {}", err);
                }
                println!(
                    "\n  Overall: {}",
                    if result.healthy { "HEALTHY" } else { "UNHEALTHY" }
                );
            }

            if !result.healthy {
                return Err(ExportError::metadata("Tables", "health check failed"));
            }
        }
    }

    Ok(())
}

fn setup_logging(verbosity: &str, format: &str) {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(std::io::stderr);

    if format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}
