mod batch;
mod config;
mod error;
mod output;
mod processing;
mod table;

use crate::{
    batch::{find_data_files, run_batch},
    config::{default_channel_configs, load_channel_configs},
    processing::{ChargeUnit, ProcessOptions, process_file},
};
use anyhow::Result;
use clap::{CommandFactory, Parser, error::ErrorKind};
use std::{io::IsTerminal, path::PathBuf};
use tracing::{debug, error, info, warn};
use wavedump_common::{init_tracer, tracer::TracerOptions};
use wavedump_reader::FileType;

/// Extracts pulse features from CAEN WaveDump files into HDF5 tables.
#[derive(Debug, Parser)]
#[clap(author, version, about)]
struct Cli {
    /// Input file, or a channel file pattern such as `run/wave*.txt` for ASCII input.
    /// In batch mode, the directory to search.
    input: PathBuf,

    /// Output HDF5 file. Required unless in batch mode.
    output: Option<PathBuf>,

    /// JSON file holding the channel configuration.
    #[clap(long)]
    config: Option<PathBuf>,

    #[clap(long, value_enum, default_value_t)]
    file_type: FileType,

    /// Process every input found below `input`.
    #[clap(long)]
    batch: bool,

    /// File name pattern of binary inputs in batch mode.
    #[clap(long, default_value = "*.dat")]
    pattern: String,

    #[clap(long, value_enum, default_value_t)]
    charge_unit: ChargeUnit,

    /// Number of events between progress messages, zero to disable.
    #[clap(long, default_value = "1000")]
    progress_interval: usize,
}

fn main() -> Result<()> {
    let _tracer = init_tracer!(TracerOptions {
        with_ansi: std::io::stdout().is_terminal(),
        ..Default::default()
    })?;

    let args = Cli::parse();
    debug!("{args:?}");

    let output = match (args.batch, &args.output) {
        (false, None) => Cli::command()
            .error(
                ErrorKind::MissingRequiredArgument,
                "an output file is required unless --batch is given",
            )
            .exit(),
        (true, Some(_)) => {
            warn!("Output file is ignored in batch mode");
            None
        }
        (_, output) => output.clone(),
    };

    let configs = match &args.config {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            load_channel_configs(path)?
        }
        None => {
            warn!("No configuration given, using the default channel configuration");
            default_channel_configs()?
        }
    };
    for config in &configs {
        info!("{config}");
    }

    let options = ProcessOptions {
        file_type: args.file_type,
        charge_unit: args.charge_unit,
        progress_interval: args.progress_interval,
    };

    match output {
        Some(output) => {
            let report = process_file(&args.input, &output, &configs, &options)?;
            report.log_summary();
        }
        None => {
            let files = find_data_files(&args.input, &args.pattern, args.file_type)?;
            if files.is_empty() {
                warn!("No {} inputs found in {}", args.file_type, args.input.display());
                return Ok(());
            }
            info!("Found {} inputs", files.len());
            let summary = run_batch(&files, &configs, &options);
            info!(
                "Batch complete: {} succeeded, {} failed, {} events",
                summary.successful, summary.failed, summary.events
            );
            if summary.failed > 0 {
                error!("{} of {} inputs failed", summary.failed, files.len());
            }
        }
    }
    Ok(())
}
