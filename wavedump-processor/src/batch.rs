use crate::{
    error::ProcessorResult,
    processing::{ProcessOptions, process_file},
};
use glob::Pattern;
use pulse_features::ChannelConfigs;
use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
};
use tracing::{error, info};
use wavedump_reader::FileType;

const ASCII_CHANNEL_FILES: &str = "wave*.txt";
const ASCII_OUTPUT_FILE: &str = "output.h5";
const OUTPUT_EXTENSION: &str = "h5";

/// An input found in batch mode, and the file its features are written to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DataFile {
    /// A file path for binary inputs, a channel file pattern for ASCII inputs.
    pub(crate) input: PathBuf,
    pub(crate) output: PathBuf,
}

#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub(crate) struct BatchSummary {
    pub(crate) successful: usize,
    pub(crate) failed: usize,
    pub(crate) events: usize,
}

fn recursive_pattern(parent: &Path, pattern: &str) -> String {
    format!(
        "{}/**/{pattern}",
        Pattern::escape(&parent.to_string_lossy())
    )
}

/// Finds every input under `parent`.
/// - Binary: every file matching `pattern`, in any subdirectory, written alongside with an `.h5` extension.
/// - ASCII: every directory holding `wave*.txt` files, written to `output.h5` in that directory.
///   `pattern` is not used.
/// # Error Modes
/// - Propagates [glob] errors.
#[tracing::instrument(level = "debug", skip(parent), fields(parent = %parent.display()))]
pub(crate) fn find_data_files(
    parent: &Path,
    pattern: &str,
    file_type: FileType,
) -> ProcessorResult<Vec<DataFile>> {
    Ok(match file_type {
        FileType::Binary => glob::glob(&recursive_pattern(parent, pattern))?
            .map(|path| -> ProcessorResult<DataFile> {
                let input = path?;
                let output = input.with_extension(OUTPUT_EXTENSION);
                Ok(DataFile { input, output })
            })
            .collect::<ProcessorResult<_>>()?,
        FileType::Ascii => glob::glob(&recursive_pattern(parent, ASCII_CHANNEL_FILES))?
            .map(|path| -> ProcessorResult<_> { Ok(path?.parent().map(Path::to_path_buf)) })
            .collect::<ProcessorResult<BTreeSet<_>>>()?
            .into_iter()
            .flatten()
            .map(|dir| DataFile {
                input: dir.join(ASCII_CHANNEL_FILES),
                output: dir.join(ASCII_OUTPUT_FILE),
            })
            .collect(),
    })
}

/// Processes each of `files` in turn. A file which fails is logged and skipped.
pub(crate) fn run_batch(
    files: &[DataFile],
    configs: &ChannelConfigs,
    options: &ProcessOptions,
) -> BatchSummary {
    let mut summary = BatchSummary::default();
    for (index, file) in files.iter().enumerate() {
        info!(
            "Processing file {} of {}: {}",
            index + 1,
            files.len(),
            file.input.display()
        );
        match process_file(&file.input, &file.output, configs, options) {
            Ok(report) => {
                report.log_summary();
                summary.successful += 1;
                summary.events += report.events;
            }
            Err(e) => {
                error!("Failed to process {}: {e}", file.input.display());
                summary.failed += 1;
            }
        }
    }
    summary
}
