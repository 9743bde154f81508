use crate::{
    error::{ProcessorError, ProcessorResult},
    output::OutputFile,
    table::FeatureTable,
};
use clap::ValueEnum;
use pulse_features::{
    ChannelConfigs, FIELD_COUNT, FeatureRecord, Real, WaveformProcessor,
};
use std::{fs, path::Path};
use tracing::{debug, info, warn};
use wavedump_common::Channel;
use wavedump_reader::{FileType, WaveDumpEvent, open_source};

/// Rows are buffered in memory and written out in blocks of this many events.
const ROWS_PER_WRITE: usize = 4096;

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, ValueEnum, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub(crate) enum ChargeUnit {
    /// Sum of baseline-subtracted ADC counts.
    #[default]
    Adc,
    /// Picocoulombs, for a 1 mV/count digitiser into 50 Ohm at 500 MS/s.
    Pc,
}

impl ChargeUnit {
    const PICOCOULOMBS_PER_ADC_SAMPLE: Real = 1e-3 * 1e12 / (50.0 * 500e6);

    pub(crate) fn scale(self) -> Real {
        match self {
            ChargeUnit::Adc => 1.0,
            ChargeUnit::Pc => Self::PICOCOULOMBS_PER_ADC_SAMPLE,
        }
    }

    pub(crate) fn units(self) -> &'static str {
        match self {
            ChargeUnit::Adc => "ADC*samples",
            ChargeUnit::Pc => "pC",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct ProcessOptions {
    pub(crate) file_type: FileType,
    pub(crate) charge_unit: ChargeUnit,
    /// Events between progress messages, or zero for none.
    pub(crate) progress_interval: usize,
}

/// Channels of a run which had to be written as missing.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub(crate) struct ChannelReport {
    pub(crate) channel: Channel,
    /// Events in which the channel was absent.
    pub(crate) missing: usize,
    /// Events in which the channel's waveform could not be analysed.
    pub(crate) malformed: usize,
}

#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub(crate) struct RunReport {
    pub(crate) events: usize,
    pub(crate) channels: Vec<ChannelReport>,
    /// Set if reading stopped early because the input could not be decoded.
    pub(crate) read_error: bool,
}

impl RunReport {
    fn new(configs: &ChannelConfigs) -> Self {
        Self {
            channels: configs
                .iter()
                .map(|config| ChannelReport {
                    channel: config.channel_id(),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        }
    }

    pub(crate) fn log_summary(&self) {
        info!("Processed {} events", self.events);
        for report in &self.channels {
            if report.missing > 0 || report.malformed > 0 {
                warn!(
                    "Channel {}: absent from {} events, malformed in {} events",
                    report.channel, report.missing, report.malformed
                );
            }
        }
        if self.read_error {
            warn!("Input was only partially read");
        }
    }
}

/// Extracts the features of every configured channel of `event`, in configuration order.
fn extract_features(
    event: &WaveDumpEvent,
    processors: &[WaveformProcessor],
    report: &mut RunReport,
    charge_unit: ChargeUnit,
) -> Vec<[Real; FIELD_COUNT]> {
    processors
        .iter()
        .zip(report.channels.iter_mut())
        .map(|(processor, counts)| {
            let Some(raw) = event.channels.get(&counts.channel) else {
                counts.missing += 1;
                return FeatureRecord::missing_columns();
            };
            match processor.process(raw) {
                Ok(mut record) => {
                    record.charge *= charge_unit.scale();
                    record.to_columns()
                }
                Err(e) => {
                    debug!(
                        "Event {}: channel {}: {e}",
                        event.metadata.event_number, counts.channel
                    );
                    counts.malformed += 1;
                    FeatureRecord::missing_columns()
                }
            }
        })
        .collect()
}

/// Extracts the features of every event of `input` and writes them to `output`.
/// # Error Modes
/// - [ProcessorError::Config] if `configs` does not fit the record length of the first event.
/// - [ProcessorError::Reader] if `input` cannot be opened, or its first event cannot be read.
/// - [ProcessorError::Output] if `output` cannot be written.
///
/// Read errors after the first event end the input, and the events read so far are kept.
#[tracing::instrument(skip_all, fields(input = %input.display(), output = %output.display()))]
pub(crate) fn process_file(
    input: &Path,
    output: &Path,
    configs: &ChannelConfigs,
    options: &ProcessOptions,
) -> ProcessorResult<RunReport> {
    let mut source = open_source(input, options.file_type)?;

    let mut next = source.next().transpose()?;
    match next.as_ref().and_then(WaveDumpEvent::record_length) {
        Some(record_length) => {
            debug!("Record length: {record_length}");
            configs.validate_record_length(record_length)?;
        }
        None => warn!("No waveforms to check the record length against"),
    }

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| ProcessorError::OutputDirectory {
            path: parent.to_owned(),
            source,
        })?;
    }
    let mut file = OutputFile::create(output, configs, options.charge_unit)?;

    let processors: Vec<_> = configs.iter().map(WaveformProcessor::new).collect();
    let mut table = FeatureTable::new(configs);
    let mut report = RunReport::new(configs);

    while let Some(event) = next.take().map(Ok).or_else(|| source.next()) {
        let event = match event {
            Ok(event) => event,
            Err(e) => {
                warn!("Stopped reading {}: {e}", input.display());
                report.read_error = true;
                break;
            }
        };
        let rows = extract_features(&event, &processors, &mut report, options.charge_unit);
        table.push(&event.metadata, rows);
        report.events += 1;

        if table.len() >= ROWS_PER_WRITE {
            file.write(&table)?;
            table.clear();
        }
        if options.progress_interval > 0 && report.events % options.progress_interval == 0 {
            match source.progress() {
                Some(fraction) => info!(
                    "Processed {} events ({:.1}%)",
                    report.events,
                    100.0 * fraction
                ),
                None => info!("Processed {} events", report.events),
            }
        }
    }
    if !table.is_empty() {
        file.write(&table)?;
    }
    info!("Wrote {} events to {}", file.rows(), output.display());
    file.close()?;
    Ok(report)
}
