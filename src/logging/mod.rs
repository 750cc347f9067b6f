//! slog loggers for service audit lines.
//!
//! Request/response logging goes through `tracing`; the services keep a
//! component logger for the file-store side effects that have to be
//! reconstructable after the fact (uploads, deletions, cascades).

use slog::{o, Discard, Drain, Logger};
use slog_async::Async;
use slog_term::{FullFormat, TermDecorator};

/// Configuration for setting up the logger
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub async_buffer_size: usize,
    pub use_color: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            async_buffer_size: 1024,
            use_color: true,
        }
    }
}

/// Sets up a logger with configurable options
pub fn setup_logger(config: LoggerConfig) -> Logger {
    let decorator = {
        let builder = TermDecorator::new().stderr();
        let builder = if config.use_color {
            builder.force_color()
        } else {
            builder.force_plain()
        };
        builder.build()
    };

    let drain = FullFormat::new(decorator).build().fuse();

    let drain = Async::new(drain)
        .chan_size(config.async_buffer_size)
        .build()
        .fuse();

    Logger::root(drain, o!("version" => env!("CARGO_PKG_VERSION")))
}

/// Logger that drops every record; used by tests and tools.
pub fn discard_logger() -> Logger {
    Logger::root(Discard, o!())
}

/// Child logger tagged with the owning component
pub fn component_logger(root: &Logger, component: &'static str) -> Logger {
    root.new(o!("component" => component))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn component_logger_accepts_records() {
        let root = discard_logger();
        let logger = component_logger(&root, "folders");
        slog::info!(logger, "folder removed"; "folder_id" => "abc");
    }
}
