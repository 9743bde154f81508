use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt};

/// The filter used when `RUST_LOG` is not set.
const DEFAULT_FILTER: &str = "info";

/// This object initialises the stdout tracer, given a TracerOptions struct.
#[derive(Default)]
pub struct TracerOptions<'a> {
    /// Overrides both `RUST_LOG` and [DEFAULT_FILTER] when present.
    pub filter: Option<&'a str>,
    pub with_ansi: bool,
}

pub struct TracerEngine;

impl TracerEngine {
    /// Installs the global subscriber, this should be called once at the start of each binary.
    /// #Arguments
    /// * `options` - The caller-specified instance of TracerOptions.
    /// #Returns
    /// An error if a global subscriber has already been set.
    pub fn new(options: TracerOptions) -> Result<Self, tracing::subscriber::SetGlobalDefaultError> {
        let log_filter = match options.filter {
            Some(filter) => EnvFilter::new(filter),
            None => EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
        };

        let stdout_tracer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stdout)
            .with_ansi(options.with_ansi)
            .with_target(false);

        let subscriber =
            tracing_subscriber::Registry::default().with(stdout_tracer.with_filter(log_filter));

        tracing::subscriber::set_global_default(subscriber)?;
        Ok(Self)
    }
}

/// Should be called at the start of each binary, before any events are emitted.
#[macro_export]
macro_rules! init_tracer {
    ($options:expr) => {{ $crate::tracer::TracerEngine::new($options) }};
}
