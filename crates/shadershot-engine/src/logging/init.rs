use std::sync::Once;

/// Logger configuration.
///
/// `env_filter` follows the `env_logger` filter syntax (e.g. "info",
/// "shadershot_engine=debug,wgpu_core=warn"). `verbosity` and `quiet` are
/// the CLI-facing knobs; an explicit filter wins over both.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub env_filter: Option<String>,
    pub write_style: env_logger::WriteStyle,

    /// Repeatable `-v` count; raises the level from the warn default.
    pub verbosity: u8,

    /// Errors only. Diagnostics the tool owes its caller (compiler output,
    /// fatal errors) bypass the logger and still reach stderr.
    pub quiet: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            write_style: env_logger::WriteStyle::Auto,
            verbosity: 0,
            quiet: false,
        }
    }
}

impl LoggingConfig {
    /// Builds a config from the CLI's `-v`/`-q` flags.
    pub fn from_flags(verbosity: u8, quiet: bool) -> Self {
        Self {
            verbosity,
            quiet,
            ..Self::default()
        }
    }

    fn base_level(&self) -> log::LevelFilter {
        if self.quiet {
            return log::LevelFilter::Error;
        }
        match self.verbosity {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}

static INIT: Once = Once::new();

/// Initializes the global logger once; later calls are ignored.
///
/// Intended usage is early in `main`, before any device work. Precedence:
/// an explicit `env_filter`, then `RUST_LOG` (only when no flag raised or
/// lowered the level), then the level `-v`/`-q` resolve to.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();
        builder.filter_level(config.base_level());

        if let Some(filter) = &config.env_filter {
            builder.parse_filters(filter);
        } else if config.verbosity == 0 && !config.quiet {
            if let Ok(filter) = std::env::var("RUST_LOG") {
                builder.parse_filters(&filter);
            }
        }

        builder.write_style(config.write_style);
        builder.init();

        log::debug!("logging initialized");
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_level_is_warn() {
        assert_eq!(LoggingConfig::default().base_level(), log::LevelFilter::Warn);
    }

    #[test]
    fn verbosity_raises_the_level_stepwise() {
        assert_eq!(
            LoggingConfig::from_flags(1, false).base_level(),
            log::LevelFilter::Info
        );
        assert_eq!(
            LoggingConfig::from_flags(2, false).base_level(),
            log::LevelFilter::Debug
        );
        assert_eq!(
            LoggingConfig::from_flags(5, false).base_level(),
            log::LevelFilter::Trace
        );
    }

    #[test]
    fn quiet_drops_to_errors_regardless_of_verbosity() {
        assert_eq!(
            LoggingConfig::from_flags(3, true).base_level(),
            log::LevelFilter::Error
        );
    }
}
