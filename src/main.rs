// src/main.rs

mod app_logic;
mod core;
mod platform_layer;
mod ui_description_layer;

use crate::app_logic::handler::{APP_NAME, MyAppLogic};
use crate::core::{CoreConfigManager, CoreProcessLauncher, CoreToolLocator, HostPlatform};
use crate::platform_layer::{PlatformInterface, PlatformResult, WindowConfig};

use std::sync::{Arc, Mutex};

const LOG_FILENAME: &str = "neosigner.log";
const MAIN_WINDOW_WIDTH: i32 = 820;
const MAIN_WINDOW_HEIGHT: i32 = 900;

/*
 * Sets up logging to the terminal (info and above) and to a log file in the
 * application's configuration directory (debug and above). If the file cannot
 * be created, only the terminal logger is installed.
 */
#[cfg(not(test))]
pub(crate) fn initialize_logging() {
    use simplelog::{
        ColorChoice, CombinedLogger, ConfigBuilder, LevelFilter, SharedLogger, TermLogger,
        TerminalMode, WriteLogger,
    };

    let config = ConfigBuilder::new().set_time_format_rfc3339().build();
    let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::new();
    loggers.push(TermLogger::new(
        LevelFilter::Info,
        config.clone(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    ));

    let log_path = core::path_utils::get_base_app_config_local_dir(APP_NAME)
        .map(|dir| dir.join(LOG_FILENAME));
    let mut file_error = None;
    if let Some(path) = &log_path {
        match std::fs::File::create(path) {
            Ok(file) => loggers.push(WriteLogger::new(LevelFilter::Debug, config, file)),
            Err(e) => file_error = Some(e),
        }
    }

    if let Err(e) = CombinedLogger::init(loggers) {
        eprintln!("Failed to initialize logger: {e}");
        return;
    }
    match (log_path, file_error) {
        (Some(path), None) => log::info!("Main: Logging to {path:?}."),
        (Some(path), Some(e)) => log::warn!("Main: Could not create log file {path:?}: {e}"),
        (None, _) => log::warn!("Main: No configuration directory; file logging disabled."),
    }
}

// Tests share one process; only the first call installs the logger.
#[cfg(test)]
pub(crate) fn initialize_logging() {
    use simplelog::{Config, LevelFilter, SimpleLogger};
    let _ = SimpleLogger::init(LevelFilter::Debug, Config::default());
}

fn main() -> PlatformResult<()> {
    initialize_logging();
    log::info!("Main: {APP_NAME} starting.");

    let app_logic = Arc::new(Mutex::new(MyAppLogic::new(
        Arc::new(CoreConfigManager::new()),
        Arc::new(CoreToolLocator::new()),
        Arc::new(CoreProcessLauncher::new()),
        HostPlatform::current(),
    )));

    let platform_interface = PlatformInterface::new(APP_NAME.to_string()).inspect_err(|e| {
        log::error!("Main: Failed to initialize the platform layer: {e}");
    })?;

    let main_window_id = platform_interface
        .create_window(WindowConfig {
            title: APP_NAME,
            width: MAIN_WINDOW_WIDTH,
            height: MAIN_WINDOW_HEIGHT,
        })
        .inspect_err(|e| log::error!("Main: Failed to create the main window: {e}"))?;

    match app_logic.lock() {
        Ok(mut logic) => {
            for command in ui_description_layer::build_main_window_static_layout(main_window_id) {
                logic.enqueue_command(command);
            }
        }
        Err(e) => {
            log::error!("Main: Application logic lock poisoned before start: {e}");
            return Ok(());
        }
    }

    let run_result = platform_interface.run(app_logic);
    match &run_result {
        Ok(()) => log::info!("Main: {APP_NAME} exited normally."),
        Err(e) => log::error!("Main: Message loop ended with error: {e}"),
    }
    run_result
}
