pub mod tracer;

pub type Channel = u32;
pub type Sample = u16;
pub type BoardId = u32;
pub type EventNumber = u32;
pub type TriggerTime = u32;

/// Timing fields take this value when no crossing of the level exists.
pub const NOT_FOUND: f64 = -1.0;

/// Every field of a channel takes this value when the channel has no
/// usable waveform in an event.
pub const MISSING: f64 = -999.0;

/// The DT5730 digitiser reports at most this many channels per board.
pub const CHANNELS_PER_DIGITIZER: usize = 8;

/// The DT5730 ADC is 14 bits wide; the upper two bits of each sample word are not data.
pub const ADC_SAMPLE_MASK: Sample = 0x3FFF;
