use std::collections::BTreeMap;
use wavedump_common::{BoardId, Channel, EventNumber, Sample, TriggerTime};

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventMetadata {
    pub event_number: EventNumber,
    /// Trigger time tag, in digitiser clock ticks.
    pub trigger_time: TriggerTime,
    pub board_id: BoardId,
}

/// One trigger of the digitiser, with the raw waveform of every channel it recorded.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct WaveDumpEvent {
    pub metadata: EventMetadata,
    pub channels: BTreeMap<Channel, Vec<Sample>>,
}

impl WaveDumpEvent {
    /// The number of samples per waveform, taken from the lowest-numbered channel.
    pub fn record_length(&self) -> Option<usize> {
        self.channels.values().next().map(Vec::len)
    }
}
