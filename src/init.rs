use tracing::level_filters::LevelFilter;
use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

/// Configuration of the crate's own diagnostics output.
///
/// The logger reports its internal trouble (failed sink writes, dropped
/// context keys, missing requests) through `tracing`. This subscriber
/// prints those events to stderr; it never writes to the log channels.
///
/// **Fields**
/// - `max_level`: most verbose level printed.
/// - `enable_stderr`: if `false`, events are filtered but not printed,
///   which is useful when the host installs its own `fmt` layer.
#[derive(Clone, Debug)]
pub struct SelfLogConfig {
    pub max_level: LevelFilter,
    pub enable_stderr: bool,
}

impl Default for SelfLogConfig {
    fn default() -> Self {
        Self {
            max_level: LevelFilter::WARN,
            enable_stderr: true,
        }
    }
}

/// Install the self-diagnostics subscriber as the global default.
///
/// **Returns**
/// - `Err(..)` if a global subscriber was already installed.
pub fn init_self_log(config: SelfLogConfig) -> Result<(), SetGlobalDefaultError> {
    let fmt_layer = config
        .enable_stderr
        .then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    let subscriber = Registry::default().with(config.max_level).with(fmt_layer);
    tracing::subscriber::set_global_default(subscriber)
}
