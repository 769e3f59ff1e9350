//! PlotterKit CLI
//!
//! Usage:
//!     plotterkit init-config
//!     plotterkit intake --drop inbox --senders allowed_senders.txt
//!     plotterkit convert
//!     plotterkit stream
//!     plotterkit run
//!     plotterkit ports
//!     plotterkit fit --svg drawing.svg

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use plotterkit::{commands, init_logging, LogFormat, PlotterConfig, RunOutcome, BUILD_DATE, VERSION};
use std::path::{Path, PathBuf};

/// PlotterKit - trace images and plot them on a GRBL pen plotter
#[derive(Parser)]
#[command(name = "plotterkit")]
#[command(version)]
#[command(about = "Image to pen plot pipeline for GRBL controllers", long_about = None)]
struct Cli {
    /// Configuration file (.ini, .toml or .json)
    #[arg(short, long, default_value = "config.ini", global = true)]
    config: PathBuf,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormatArg::Pretty, global = true)]
    log_format: LogFormatArg,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormatArg {
    Pretty,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Write a configuration file with default settings
    InitConfig,

    /// Collect images from a drop folder
    Intake {
        /// Drop folder with one subdirectory per sender
        #[arg(long)]
        drop: PathBuf,

        /// Allowed senders, one address per line
        #[arg(long, default_value = "allowed_senders.txt")]
        senders: PathBuf,
    },

    /// Trace waiting images and queue their programs
    Convert,

    /// Stream the next pending program to the plotter
    Stream {
        /// Keep going until no program is pending
        #[arg(long)]
        all: bool,
    },

    /// Intake (optional), convert and stream in one go
    Run {
        #[arg(long, requires = "senders")]
        drop: Option<PathBuf>,

        #[arg(long, requires = "drop")]
        senders: Option<PathBuf>,
    },

    /// List serial ports
    Ports,

    /// Show how an SVG would be fitted to the plot area
    Fit {
        #[arg(long)]
        svg: PathBuf,
    },
}

fn load_config(path: &Path) -> anyhow::Result<PlotterConfig> {
    PlotterConfig::load_or_create(path)
        .with_context(|| format!("failed to load configuration from {}", path.display()))
}

fn print_outcomes(outcomes: &[RunOutcome]) {
    if outcomes.is_empty() {
        println!("No pending programs.");
    }
    for outcome in outcomes {
        match outcome {
            RunOutcome::Idle => println!("No pending programs."),
            RunOutcome::Completed(summary) => println!(
                "Plotted {}: {} lines sent, {} error acks, archived to {}",
                summary.job.name,
                summary.report.sent,
                summary.report.error_acks,
                summary.archived_to.display()
            ),
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.log_format.into())?;
    tracing::debug!("plotterkit {} (built {})", VERSION, BUILD_DATE);

    match cli.command {
        Commands::InitConfig => {
            if commands::init_config(&cli.config)? {
                println!("Wrote {}", cli.config.display());
            } else {
                println!("{} already exists", cli.config.display());
            }
        }
        Commands::Intake { drop, senders } => {
            let config = load_config(&cli.config)?;
            let saved = commands::intake(&config, &drop, &senders)?;
            println!("Received {} images", saved.len());
        }
        Commands::Convert => {
            let config = load_config(&cli.config)?;
            let report = commands::convert(&config)?;
            for path in &report.converted {
                println!("Queued {}", path.display());
            }
            if !report.failed.is_empty() {
                anyhow::bail!("{} images failed to convert", report.failed.len());
            }
        }
        Commands::Stream { all } => {
            let config = load_config(&cli.config)?;
            print_outcomes(&commands::stream(&config, all)?);
        }
        Commands::Run { drop, senders } => {
            let config = load_config(&cli.config)?;
            print_outcomes(&commands::run(&config, drop.as_deref(), senders.as_deref())?);
        }
        Commands::Ports => {
            for port in commands::ports()? {
                let marker = if port.likely_controller { "*" } else { " " };
                println!("{} {:<24} {}", marker, port.port_name, port.description);
            }
        }
        Commands::Fit { svg } => {
            let config = load_config(&cli.config)?;
            let report = commands::fit(&config, &svg)?;
            let b = report.fitted_bounds;
            println!("Scale factor: {:.6}", report.scale_factor);
            println!("Offset: ({:.3}, {:.3})", report.offset.x, report.offset.y);
            println!(
                "Original size: {:.3} x {:.3} mm",
                report.original_bounds.width(),
                report.original_bounds.height()
            );
            println!(
                "Fitted bounds: ({:.3}, {:.3}) - ({:.3}, {:.3})",
                b.min.x, b.min.y, b.max.x, b.max.y
            );
        }
    }

    Ok(())
}
