// Logging for drover.
// Built on the `tracing` ecosystem; initialisation is optional and the pool
// works fine under whatever global subscriber the host application installs.

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::{fmt, EnvFilter};

/// Configuration for the drover logging setup.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Minimum log level to display.
    pub level: Level,
    /// Whether to emit JSON-formatted log lines.
    pub json_format: bool,
    /// Whether to include file and line information.
    pub show_file_line: bool,
    /// Whether to include thread names and ids.
    pub show_thread_info: bool,
    /// Whether to include timestamps.
    pub show_time: bool,
    /// Target filter expressions (format: "target=level,target2=level2,...").
    pub target_filters: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            json_format: false,
            show_file_line: true,
            show_thread_info: true,
            show_time: true,
            target_filters: None,
        }
    }
}

// Initialization guard to ensure we only initialize once
static INIT: Once = Once::new();

/// Initialize the global subscriber with the given configuration.
///
/// Safe to call more than once; only the first call takes effect.
pub fn init(config: LogConfig) {
    INIT.call_once(|| {
        let mut env_filter = EnvFilter::from_default_env().add_directive(config.level.into());

        if let Some(filters) = &config.target_filters {
            for directive in filters
                .split(',')
                .filter_map(|f| f.trim().parse::<Directive>().ok())
            {
                env_filter = env_filter.add_directive(directive);
            }
        }

        let builder = fmt()
            .with_env_filter(env_filter)
            .with_ansi(atty::is(atty::Stream::Stdout))
            .with_file(config.show_file_line)
            .with_line_number(config.show_file_line)
            .with_thread_names(config.show_thread_info)
            .with_thread_ids(config.show_thread_info);

        let result = if config.json_format {
            builder.json().try_init()
        } else if config.show_time {
            builder.with_timer(fmt::time::uptime()).try_init()
        } else {
            builder.without_time().try_init()
        };

        if let Err(err) = result {
            eprintln!("failed to set global tracing subscriber: {err}");
        }
    });
}

/// Initialize logging with reasonable defaults.
pub fn init_default() {
    init(LogConfig::default());
}

/// Initialize logging for tests: warnings and errors only, no timestamps.
pub fn init_test() {
    init(LogConfig {
        level: Level::WARN,
        json_format: false,
        show_file_line: true,
        show_thread_info: false,
        show_time: false,
        target_filters: None,
    });
}
