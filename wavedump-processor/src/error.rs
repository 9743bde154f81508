use pulse_features::ConfigError;
use std::path::PathBuf;
use thiserror::Error;
use wavedump_reader::ReaderError;

pub(crate) type ProcessorResult<T> = Result<T, ProcessorError>;

#[derive(Debug, Error)]
pub(crate) enum ProcessorError {
    #[error("Cannot read configuration {path}: {source}")]
    ConfigFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid configuration {path}: {source}")]
    ConfigJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Configuration Error: {0}")]
    Config(#[from] ConfigError),
    #[error("Configuration lists no channels")]
    NoChannels,
    #[error("Reader Error: {0}")]
    Reader(#[from] ReaderError),
    #[error("Output Error: {0}")]
    Output(#[from] OutputError),
    #[error("Cannot create output directory {path}: {source}")]
    OutputDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid search pattern: {0}")]
    Pattern(#[from] glob::PatternError),
    #[error("Cannot search for input files: {0}")]
    Glob(#[from] glob::GlobError),
}

const NO_HDF5_PATH_SET: &str = "[No HDF5 Path Set]";

#[derive(Debug, Error)]
pub(crate) enum OutputError {
    #[error("HDF5 Error: {error} at {0}", hdf5_path.as_deref().unwrap_or(NO_HDF5_PATH_SET))]
    HDF5 {
        error: hdf5::Error,
        hdf5_path: Option<String>,
    },
    #[error("HDF5String Error: {error} at {0}", hdf5_path.as_deref().unwrap_or(NO_HDF5_PATH_SET))]
    HDF5String {
        error: hdf5::types::StringError,
        hdf5_path: Option<String>,
    },
}

impl OutputError {
    fn with_hdf5_path(self, path: String) -> Self {
        match self {
            Self::HDF5 {
                error,
                hdf5_path: None,
            } => Self::HDF5 {
                error,
                hdf5_path: Some(path),
            },
            Self::HDF5String {
                error,
                hdf5_path: None,
            } => Self::HDF5String {
                error,
                hdf5_path: Some(path),
            },
            other => other,
        }
    }
}

impl From<hdf5::Error> for OutputError {
    fn from(error: hdf5::Error) -> Self {
        OutputError::HDF5 {
            error,
            hdf5_path: None,
        }
    }
}

impl From<hdf5::types::StringError> for OutputError {
    fn from(error: hdf5::types::StringError) -> Self {
        OutputError::HDF5String {
            error,
            hdf5_path: None,
        }
    }
}

/// Allows errors which can be converted to [OutputError] to be
/// appended with the path of the hdf5 object they occurred on.
pub(crate) trait ConvertResult<T, E>
where
    E: std::error::Error + Into<OutputError>,
{
    fn err_group(self, group: &hdf5::Group) -> Result<T, OutputError>;
    fn err_dataset(self, dataset: &hdf5::Dataset) -> Result<T, OutputError>;
}

impl<T, E> ConvertResult<T, E> for Result<T, E>
where
    E: std::error::Error + Into<OutputError>,
{
    fn err_group(self, group: &hdf5::Group) -> Result<T, OutputError> {
        self.map_err(|e| e.into().with_hdf5_path(group.name()))
    }

    fn err_dataset(self, dataset: &hdf5::Dataset) -> Result<T, OutputError> {
        self.map_err(|e| e.into().with_hdf5_path(dataset.name()))
    }
}
