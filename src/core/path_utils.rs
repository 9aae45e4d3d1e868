/*
 * Path helpers shared by the core: the per-user configuration directory,
 * the directory holding the running executable (used as the anchor for
 * bundled tool binaries), the user's home directory, and the human-readable
 * size string used when reporting the signed output file.
 */
use directories::{BaseDirs, ProjectDirs};
use std::fs;
use std::path::{Path, PathBuf};

/*
 * Retrieves the application's local configuration directory, creating it if
 * necessary. Returns `None` when the platform offers no such directory or it
 * cannot be created.
 */
pub fn get_base_app_config_local_dir(app_name: &str) -> Option<PathBuf> {
    log::trace!("PathUtils: Attempting to get base app config local dir for '{app_name}'");
    ProjectDirs::from("", "", app_name).and_then(|proj_dirs| {
        let config_path = proj_dirs.config_local_dir();
        if !config_path.exists() {
            if let Err(e) = fs::create_dir_all(config_path) {
                log::error!(
                    "PathUtils: Failed to create base app config directory {config_path:?}: {e}"
                );
                return None;
            }
            log::debug!("PathUtils: Created base app config directory: {config_path:?}");
        }
        Some(config_path.to_path_buf())
    })
}

/*
 * The directory that contains the running executable. Tool binaries shipped
 * next to the application are looked up relative to this directory. Falls
 * back to the current working directory if the executable path is unknown.
 */
pub fn application_base_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn home_dir() -> Option<PathBuf> {
    BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf())
}

// Formats a byte count as megabytes with two decimals, e.g. "12.50 MB".
pub fn format_size_in_megabytes(bytes: u64) -> String {
    format!("{:.2} MB", bytes as f64 / (1024.0 * 1024.0))
}
