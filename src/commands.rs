//! CLI command implementations
//!
//! Each command takes the already-loaded configuration and returns what it
//! did, so `main` only parses arguments and prints results.

use anyhow::{bail, Context};
use plotterkit_camtools::{import_svg, CommandVectorizer};
use plotterkit_communication::{list_ports, SerialLink, SerialPortInfo};
use plotterkit_core::{fit_to_area, FitReport};
use plotterkit_jobs::{
    save_attachments, AllowedSenders, ConversionReport, Converter, DropFolderIntake, FsJobStore,
    JobIntake, JobRunner, LogNotifier, RunOutcome,
};
use plotterkit_settings::PlotterConfig;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Write the default configuration unless the file already exists.
///
/// Returns `true` when a file was written.
pub fn init_config(path: &Path) -> anyhow::Result<bool> {
    if path.exists() {
        info!("{} already exists, leaving it untouched", path.display());
        return Ok(false);
    }
    PlotterConfig::create_default_config(path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(true)
}

/// Pull images from a drop folder into the attachments folder
pub fn intake(config: &PlotterConfig, drop: &Path, senders: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let allowed = AllowedSenders::load(senders)
        .with_context(|| format!("failed to read sender list {}", senders.display()))?;
    if allowed.is_empty() {
        info!("No allowed senders configured");
        return Ok(Vec::new());
    }

    let mut source = DropFolderIntake::new(drop, allowed.clone());
    let incoming = source.fetch()?;
    let saved = save_attachments(
        &incoming,
        &allowed,
        &config.folders.attachments,
        &config.folders.metadata,
    )?;
    source.acknowledge(&incoming)?;
    Ok(saved)
}

/// Convert every waiting image into a pending program
pub fn convert(config: &PlotterConfig) -> anyhow::Result<ConversionReport> {
    let vectorizer = CommandVectorizer::new(&config.vectorizer_command)?;
    let converter = Converter::from_config(vectorizer, config)?;
    Ok(converter.convert_pending()?)
}

/// Stream the next pending program, or every pending program with `all`
pub fn stream(config: &PlotterConfig, all: bool) -> anyhow::Result<Vec<RunOutcome>> {
    let store = FsJobStore::new(config.folders.clone());
    store.ensure_folders()?;
    let link = SerialLink::new(&config.connection.usb_port, config.connection.baud_rate);
    let mut runner = JobRunner::new(store, link, Box::new(LogNotifier));

    if all {
        let done = runner.run_all()?;
        Ok(done.into_iter().map(RunOutcome::Completed).collect())
    } else {
        Ok(vec![runner.run_once()?])
    }
}

/// Optional intake, then conversion, then streaming of one job
pub fn run(
    config: &PlotterConfig,
    drop: Option<&Path>,
    senders: Option<&Path>,
) -> anyhow::Result<Vec<RunOutcome>> {
    match (drop, senders) {
        (Some(drop), Some(senders)) => {
            intake(config, drop, senders)?;
        }
        (None, None) => {}
        _ => bail!("--drop and --senders must be given together"),
    }

    let report = convert(config)?;
    let outcomes = stream(config, false)?;

    if !report.failed.is_empty() {
        for (image, e) in &report.failed {
            error!("{}: {}", image.display(), e);
        }
        bail!("{} images failed to convert", report.failed.len());
    }
    Ok(outcomes)
}

/// Enumerate serial ports
pub fn ports() -> anyhow::Result<Vec<SerialPortInfo>> {
    Ok(list_ports()?)
}

/// Fit an SVG to the configured plot area without plotting it
pub fn fit(config: &PlotterConfig, svg: &Path) -> anyhow::Result<FitReport> {
    let document =
        fs::read_to_string(svg).with_context(|| format!("failed to read {}", svg.display()))?;
    let mut drawing = import_svg(&document)?;
    if drawing.is_empty() {
        bail!("{} contains no drawable elements", svg.display());
    }
    Ok(fit_to_area(&mut drawing, &config.plot_area)?)
}
