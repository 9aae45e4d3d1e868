/*
 * This module consolidates the core, platform-agnostic logic of the application.
 * It re-exports the abstractions the application logic depends on
 * (`ToolLocatorOperations`, `ProcessLauncherOperations`, `ConfigManagerOperations`)
 * together with the signing request model, the command synthesizer and the
 * installer helpers. Nothing in here touches the UI.
 */
pub mod command_synthesizer;
pub mod config;
pub mod installer;
pub mod path_utils;
pub mod process_runner;
pub mod signing_request;
pub mod tool_locator;

// Re-export the signing request model and its argument builder
pub use command_synthesizer::synthesize;
pub use signing_request::{DEFAULT_ZIP_LEVEL, SigningRequest};

// Re-export tool discovery items
pub use tool_locator::{
    CoreToolLocator, HostPlatform, ToolKind, ToolLocation, ToolLocatorOperations,
    VERSION_PROBE_ARGS, version_from_probe,
};

// Re-export process items
pub use process_runner::{
    CoreProcessLauncher, ExitOutcome, ProcessEvent, ProcessInvocation, ProcessLauncherOperations,
    RunningProcess,
};

// Re-export config related items
pub use config::{AppSettings, ConfigManagerOperations, CoreConfigManager};

// Error types only named by the application logic tests
#[cfg(test)]
pub use config::ConfigError;
#[cfg(test)]
pub use process_runner::{CapturedOutput, RunnerError};
#[cfg(test)]
pub use tool_locator::LocatorError;
