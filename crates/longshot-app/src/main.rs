mod app;

use anyhow::Result;
use winit::dpi::LogicalSize;

use longshot_engine::device::GpuInit;
use longshot_engine::logging::{init_logging, LoggingConfig};
use longshot_engine::window::{Runtime, RuntimeConfig};
use longshot_range::config::RangeConfig;

use app::RangeApp;

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let config = RangeConfig::default().validated();
    let runtime = RuntimeConfig {
        title: config.title.clone(),
        initial_size: LogicalSize::new(config.window_width, config.window_height),
    };

    Runtime::run(runtime, GpuInit::default(), RangeApp::new(config))
}
