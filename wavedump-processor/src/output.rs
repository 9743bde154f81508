//! Writes [FeatureTable] rows to an HDF5 file.
//!
//! Every column is a one-dimensional, chunked dataset in the `events` group,
//! which is extended each time a batch of rows is written.
use crate::{
    error::{ConvertResult, OutputError},
    processing::ChargeUnit,
    table::{FeatureTable, column_names},
};
use chrono::Utc;
use hdf5::{types::VarLenUnicode, Dataset, File, Group, H5Type, SimpleExtents};
use ndarray::s;
use pulse_features::{ChannelConfigs, Real};
use std::path::Path;
use tracing::debug;
use wavedump_common::{BoardId, EventNumber, TriggerTime};

const EVENTS_GROUP: &str = "events";
const CHUNK_SIZE: usize = 1024;
const CHARGE_FIELD: usize = 4;

trait GroupExt {
    fn create_resizable_empty_dataset<T: H5Type>(&self, name: &str) -> Result<Dataset, OutputError>;
}

impl GroupExt for Group {
    fn create_resizable_empty_dataset<T: H5Type>(&self, name: &str) -> Result<Dataset, OutputError> {
        self.new_dataset::<T>()
            .shape(SimpleExtents::resizable(vec![0]))
            .chunk(vec![CHUNK_SIZE])
            .create(name)
            .err_group(self)
    }
}

trait HasAttributesExt {
    fn add_constant_string_attribute(&self, attr: &str, value: &str) -> Result<(), OutputError>;
}

impl HasAttributesExt for Group {
    fn add_constant_string_attribute(&self, attr: &str, value: &str) -> Result<(), OutputError> {
        let attr = self.new_attr::<VarLenUnicode>().create(attr).err_group(self)?;
        attr.write_scalar(&value.parse::<VarLenUnicode>().err_group(self)?)
            .err_group(self)
    }
}

impl HasAttributesExt for Dataset {
    fn add_constant_string_attribute(&self, attr: &str, value: &str) -> Result<(), OutputError> {
        let attr = self.new_attr::<VarLenUnicode>().create(attr).err_dataset(self)?;
        attr.write_scalar(&value.parse::<VarLenUnicode>().err_dataset(self)?)
            .err_dataset(self)
    }
}

trait DatasetExt {
    fn append_slice<T: H5Type>(&self, value: &[T]) -> Result<(), OutputError>;
}

impl DatasetExt for Dataset {
    fn append_slice<T: H5Type>(&self, value: &[T]) -> Result<(), OutputError> {
        let cur_size = self.size();
        let new_size = cur_size + value.len();
        self.resize(new_size).err_dataset(self)?;
        self.write_slice(value, s![cur_size..new_size])
            .err_dataset(self)
    }
}

pub(crate) struct OutputFile {
    file: File,
    event_number: Dataset,
    trigger_time: Dataset,
    board_id: Dataset,
    /// The feature datasets of each configured channel, in configuration order.
    channels: Vec<Vec<Dataset>>,
    rows: usize,
}

impl OutputFile {
    /// Creates (or truncates) the file at `path`, with an empty dataset for every column.
    #[tracing::instrument(skip_all, level = "debug", err(level = "warn"), fields(path = %path.display()))]
    pub(crate) fn create(
        path: &Path,
        configs: &ChannelConfigs,
        charge_unit: ChargeUnit,
    ) -> Result<Self, OutputError> {
        let file = File::create(path)?;
        file.add_constant_string_attribute(
            "creator",
            concat!(env!("CARGO_PKG_NAME"), " ", env!("CARGO_PKG_VERSION")),
        )?;
        file.add_constant_string_attribute("created", &Utc::now().to_rfc3339())?;

        let group = file.create_group(EVENTS_GROUP).err_group(&file)?;
        let event_number = group.create_resizable_empty_dataset::<EventNumber>("event_number")?;
        let trigger_time = group.create_resizable_empty_dataset::<TriggerTime>("trigger_time")?;
        let board_id = group.create_resizable_empty_dataset::<BoardId>("board_id")?;

        let channels = configs
            .iter()
            .map(|config| -> Result<Vec<Dataset>, OutputError> {
                let datasets = column_names(config.channel_id())
                    .iter()
                    .map(|name| group.create_resizable_empty_dataset::<Real>(name))
                    .collect::<Result<Vec<_>, _>>()?;
                if let Some(charge) = datasets.get(CHARGE_FIELD) {
                    charge.add_constant_string_attribute("units", charge_unit.units())?;
                }
                Ok(datasets)
            })
            .collect::<Result<_, _>>()?;

        debug!("Created output with {} channels", configs.len());
        Ok(Self {
            file,
            event_number,
            trigger_time,
            board_id,
            channels,
            rows: 0,
        })
    }

    /// Appends every row of `table`.
    pub(crate) fn write(&mut self, table: &FeatureTable) -> Result<(), OutputError> {
        self.event_number.append_slice(&table.event_number)?;
        self.trigger_time.append_slice(&table.trigger_time)?;
        self.board_id.append_slice(&table.board_id)?;
        for (datasets, columns) in self.channels.iter().zip(&table.channels) {
            for (dataset, column) in datasets.iter().zip(columns) {
                dataset.append_slice(column)?;
            }
        }
        self.rows += table.len();
        Ok(())
    }

    pub(crate) fn rows(&self) -> usize {
        self.rows
    }

    /// Flushes all buffered data to disk and closes the file.
    pub(crate) fn close(self) -> Result<(), OutputError> {
        self.file.flush().err_group(&self.file)
    }
}
