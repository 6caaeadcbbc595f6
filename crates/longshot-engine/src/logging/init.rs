use std::sync::Once;

use log::LevelFilter;

/// GPU stack modules that log per-frame detail at info.
const GPU_MODULES: [&str; 3] = ["wgpu_core", "wgpu_hal", "naga"];

/// Logger setup for the range binaries.
///
/// Filter precedence: `filter`, then `RUST_LOG`, then `level` with the GPU
/// stack held at `gpu_level`. Filters use `env_logger` syntax, e.g.
/// `"longshot_range=debug,wgpu_core=warn"`.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub filter: Option<String>,
    pub level: LevelFilter,
    pub gpu_level: LevelFilter,
    pub write_style: env_logger::WriteStyle,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: None,
            level: LevelFilter::Info,
            gpu_level: LevelFilter::Warn,
            write_style: env_logger::WriteStyle::Auto,
        }
    }
}

static INIT: Once = Once::new();

/// Installs the global logger. Only the first call has any effect.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();

        match config.filter.or_else(|| std::env::var("RUST_LOG").ok()) {
            Some(filter) => {
                builder.parse_filters(&filter);
            }
            None => {
                builder.filter_level(config.level);
                for module in GPU_MODULES {
                    builder.filter_module(module, config.gpu_level);
                }
            }
        }

        builder.write_style(config.write_style).init();
        log::debug!("logging initialized");
    });
}
