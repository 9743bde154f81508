use pulse_features::{ChannelConfigs, FIELD_COUNT, FIELD_NAMES, Real};
use wavedump_common::{BoardId, Channel, EventNumber, TriggerTime};
use wavedump_reader::EventMetadata;

/// The feature columns of one channel.
pub(crate) type ChannelColumns = [Vec<Real>; FIELD_COUNT];

/// Column names of `channel`, as `ch{channel}_{field}`, in the order of its [ChannelColumns].
pub(crate) fn column_names(channel: Channel) -> [String; FIELD_COUNT] {
    FIELD_NAMES.map(|field| format!("ch{channel}_{field}"))
}

/// Rows of per-event features, stored column by column.
/// Rows are appended as events are processed, and drained when written out.
#[derive(Debug, Clone)]
pub(crate) struct FeatureTable {
    pub(crate) event_number: Vec<EventNumber>,
    pub(crate) trigger_time: Vec<TriggerTime>,
    pub(crate) board_id: Vec<BoardId>,
    /// One entry per configured channel, in configuration order.
    pub(crate) channels: Vec<ChannelColumns>,
}

impl FeatureTable {
    pub(crate) fn new(configs: &ChannelConfigs) -> Self {
        Self {
            event_number: Vec::new(),
            trigger_time: Vec::new(),
            board_id: Vec::new(),
            channels: vec![Default::default(); configs.len()],
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.event_number.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.event_number.is_empty()
    }

    /// Appends one row. `rows` holds the columns of each channel, in configuration order.
    pub(crate) fn push<I>(&mut self, metadata: &EventMetadata, rows: I)
    where
        I: IntoIterator<Item = [Real; FIELD_COUNT]>,
    {
        self.event_number.push(metadata.event_number);
        self.trigger_time.push(metadata.trigger_time);
        self.board_id.push(metadata.board_id);
        for (columns, row) in self.channels.iter_mut().zip(rows) {
            for (column, value) in columns.iter_mut().zip(row) {
                column.push(value);
            }
        }
    }

    /// Empties every column, keeping the channel layout.
    pub(crate) fn clear(&mut self) {
        self.event_number.clear();
        self.trigger_time.clear();
        self.board_id.clear();
        self.channels
            .iter_mut()
            .flat_map(|columns| columns.iter_mut())
            .for_each(Vec::clear);
    }
}
