#[cfg(target_os = "windows")]
pub mod app;
#[cfg(not(target_os = "windows"))]
#[path = "platform_layer/app_stub.rs"]
pub mod app;
#[cfg(target_os = "windows")]
pub(crate) mod command_executor;
#[cfg(target_os = "windows")]
pub(crate) mod controls;
pub mod error;
pub(crate) mod layout;
pub mod types;
#[cfg(target_os = "windows")]
pub(crate) mod window_common;

pub use app::PlatformInterface;
pub use error::Result as PlatformResult;
pub use types::{
    AppEvent, ControlId, DockStyle, InputKind, LayoutRule, MessageSeverity, PlatformCommand,
    PlatformEventHandler, WindowConfig, WindowId,
};
