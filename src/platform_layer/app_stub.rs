/*
 * Non-Windows stand-in for `PlatformInterface`. It keeps the crate building
 * on other hosts, so the application logic and its tests run anywhere, but it
 * cannot show a window: construction fails with `InitializationFailed`.
 */

use super::error::{PlatformError, Result as PlatformResult};
use super::types::{PlatformEventHandler, WindowConfig, WindowId};
use std::sync::{Arc, Mutex};

pub struct PlatformInterface {
    _private: (),
}

impl PlatformInterface {
    pub fn new(app_name_for_class: String) -> PlatformResult<Self> {
        log::error!(
            "Platform: No native UI backend for this target ({app_name_for_class} requires Windows)."
        );
        Err(PlatformError::InitializationFailed(format!(
            "{app_name_for_class} has no native UI backend on this platform"
        )))
    }

    pub fn create_window(&self, config: WindowConfig) -> PlatformResult<WindowId> {
        Err(PlatformError::WindowCreationFailed(format!(
            "Cannot create window '{}' without a native UI backend",
            config.title
        )))
    }

    pub fn run(&self, _event_handler: Arc<Mutex<dyn PlatformEventHandler>>) -> PlatformResult<()> {
        Err(PlatformError::OperationFailed(
            "No native message loop on this platform".into(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_reports_missing_backend() {
        // Act
        let result = PlatformInterface::new("NeoSigner".to_string());

        // Assert
        assert!(matches!(result, Err(PlatformError::InitializationFailed(_))));
    }
}
