/*
 * Discovers the external command-line tools the application drives: the
 * re-signing tool (`zsign`) and the device installer (`ideviceinstaller`).
 *
 * Discovery walks a platform-specific, ordered list of candidate paths
 * (application-relative directories, common install prefixes and
 * home-relative locations). A `PATH` match, when one exists, is tried first.
 * The first candidate that is a regular file, and on non-Windows platforms
 * carries an execute bit, wins. Every attempted candidate is logged so a
 * failed discovery can be diagnosed from the log file.
 *
 * The `ToolLocatorOperations` trait is the seam used by the application
 * logic, allowing discovery to be replaced by a mock in tests.
 */
use crate::core::path_utils;
use crate::core::process_runner::CapturedOutput;

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

pub const VERSION_PROBE_ARGS: [&str; 1] = ["-v"];

// The operating system family the candidate lists are built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostPlatform {
    MacOs,
    Linux,
    Windows,
    Other,
}

impl HostPlatform {
    pub fn current() -> Self {
        match std::env::consts::OS {
            "macos" => HostPlatform::MacOs,
            "linux" => HostPlatform::Linux,
            "windows" => HostPlatform::Windows,
            _ => HostPlatform::Other,
        }
    }

    // On Windows a file only needs to exist to be runnable.
    pub fn requires_execute_bit(self) -> bool {
        self != HostPlatform::Windows
    }

    fn has_path_lookup(self) -> bool {
        self != HostPlatform::Other
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    Signer,
    Installer,
}

impl ToolKind {
    pub fn display_name(self) -> &'static str {
        match self {
            ToolKind::Signer => "zsign",
            ToolKind::Installer => "ideviceinstaller",
        }
    }

    pub fn file_name(self, platform: HostPlatform) -> String {
        match platform {
            HostPlatform::Windows => format!("{}.exe", self.display_name()),
            _ => self.display_name().to_string(),
        }
    }
}

/*
 * A discovered or user-selected tool binary. `verified_executable` records
 * whether the execute permission bit was checked and found set; on Windows
 * only existence is checked and the flag stays false.
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolLocation {
    pub path: PathBuf,
    pub verified_executable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocatorError {
    DoesNotExist(PathBuf),
    NotExecutable(PathBuf),
}

impl std::fmt::Display for LocatorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LocatorError::DoesNotExist(_) => write!(f, "Selected file does not exist."),
            LocatorError::NotExecutable(_) => write!(f, "Selected file is not executable."),
        }
    }
}

impl std::error::Error for LocatorError {}

pub type Result<T> = std::result::Result<T, LocatorError>;

/*
 * The directories discovery is anchored on. Captured once from the process
 * environment by `from_environment`; tests build it by hand so candidate
 * lists can be checked against a temporary directory tree.
 */
#[derive(Debug, Clone)]
pub struct SearchRoots {
    pub base_dir: PathBuf,
    pub home_dir: Option<PathBuf>,
    pub path_var: Option<OsString>,
}

impl SearchRoots {
    pub fn from_environment() -> Self {
        SearchRoots {
            base_dir: path_utils::application_base_dir(),
            home_dir: path_utils::home_dir(),
            path_var: std::env::var_os("PATH"),
        }
    }
}

pub trait ToolLocatorOperations: Send + Sync {
    fn locate(&self, tool: ToolKind, platform: HostPlatform) -> Option<ToolLocation>;

    fn validate_selection(&self, path: &Path, platform: HostPlatform) -> Result<ToolLocation>;
}

/*
 * Builds the static, ordered candidate list for a tool. The `PATH` match is
 * not part of this list; `CoreToolLocator::locate` prepends it.
 */
pub fn candidate_paths(tool: ToolKind, platform: HostPlatform, roots: &SearchRoots) -> Vec<PathBuf> {
    let base = &roots.base_dir;
    let home = roots.home_dir.as_deref();
    let mut candidates = Vec::new();

    match (tool, platform) {
        (ToolKind::Signer, HostPlatform::MacOs) => {
            candidates.push(base.join("bin").join("zsign"));
            candidates.push(base.join("zsign_exe"));
            candidates.push(base.join("zsign").join("bin").join("zsign"));
            candidates.push(base.join("build").join("macos").join("zsign"));
            candidates.push(base.join("zsign"));
            candidates.push(PathBuf::from("/usr/local/bin/zsign"));
            candidates.push(PathBuf::from("/opt/homebrew/bin/zsign"));
            if let Some(home) = home {
                candidates.push(home.join("zsign").join("bin").join("zsign"));
                candidates.push(home.join("bin").join("zsign"));
                candidates.push(home.join(".local").join("bin").join("zsign"));
            }
            candidates.push(PathBuf::from("/usr/local/zsign/bin/zsign"));
            candidates.push(PathBuf::from("/zsign/bin/zsign"));
        }
        (ToolKind::Signer, HostPlatform::Linux) => {
            candidates.push(base.join("bin").join("zsign"));
            candidates.push(base.join("build").join("linux").join("zsign"));
            candidates.push(base.join("zsign"));
            if let Some(home) = home {
                candidates.push(home.join("zsign").join("bin").join("zsign"));
                candidates.push(home.join("bin").join("zsign"));
                candidates.push(home.join(".local").join("bin").join("zsign"));
            }
            candidates.push(PathBuf::from("/usr/local/bin/zsign"));
            candidates.push(PathBuf::from("/usr/bin/zsign"));
        }
        (ToolKind::Signer, HostPlatform::Windows) => {
            candidates.push(base.join("bin").join("zsign.exe"));
            candidates.push(
                base.join("build")
                    .join("windows")
                    .join("vs2022")
                    .join("x64")
                    .join("Release")
                    .join("zsign.exe"),
            );
            candidates.push(base.join("zsign.exe"));
        }
        (ToolKind::Installer, HostPlatform::MacOs) => {
            candidates.push(PathBuf::from("/usr/local/bin/ideviceinstaller"));
            candidates.push(PathBuf::from("/opt/homebrew/bin/ideviceinstaller"));
        }
        (ToolKind::Installer, HostPlatform::Linux) => {
            candidates.push(PathBuf::from("/usr/local/bin/ideviceinstaller"));
            candidates.push(PathBuf::from("/usr/bin/ideviceinstaller"));
        }
        (ToolKind::Installer, HostPlatform::Windows) => {
            candidates.push(base.join("bin").join("ideviceinstaller.exe"));
            candidates.push(base.join("ideviceinstaller.exe"));
        }
        (_, HostPlatform::Other) => {}
    }

    candidates
}

/*
 * Resolves `file_name` against the directories of a `PATH`-style variable,
 * the way `which` does. Empty entries are skipped. Returns the first entry
 * that passes `is_acceptable`.
 */
pub fn path_lookup(
    file_name: &str,
    path_var: Option<&OsString>,
    platform: HostPlatform,
) -> Option<PathBuf> {
    let raw = path_var?;
    std::env::split_paths(raw)
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(|dir| dir.join(file_name))
        .find(|candidate| is_acceptable(candidate, platform))
}

// A candidate is acceptable if it is a regular file and, where required, executable.
pub fn is_acceptable(path: &Path, platform: HostPlatform) -> bool {
    fs::metadata(path).is_ok_and(|metadata| {
        metadata.is_file() && (!platform.requires_execute_bit() || has_execute_permission(&metadata))
    })
}

#[cfg(unix)]
fn has_execute_permission(metadata: &fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn has_execute_permission(metadata: &fs::Metadata) -> bool {
    metadata.is_file()
}

/*
 * Checks a path the user picked by hand. A missing path reports
 * `DoesNotExist`. Anything that is not a regular file, or lacks an execute
 * bit on non-Windows platforms, reports `NotExecutable`.
 */
pub fn validate_manual_selection(path: &Path, platform: HostPlatform) -> Result<ToolLocation> {
    if !path.exists() {
        log::warn!("ToolLocator: Selected path {path:?} does not exist.");
        return Err(LocatorError::DoesNotExist(path.to_path_buf()));
    }
    if !is_acceptable(path, platform) {
        log::warn!("ToolLocator: Selected path {path:?} is not an executable file.");
        return Err(LocatorError::NotExecutable(path.to_path_buf()));
    }
    log::info!("ToolLocator: Accepted manually selected binary {path:?}.");
    Ok(ToolLocation {
        path: path.to_path_buf(),
        verified_executable: platform.requires_execute_bit(),
    })
}

/*
 * Extracts the version text from the output of `<signer> -v`. Some builds
 * print the banner on stderr, so stderr is used when stdout is empty.
 */
pub fn version_from_probe(output: &CapturedOutput) -> Option<String> {
    let stdout = output.stdout.trim();
    let text = if stdout.is_empty() {
        output.stderr.trim()
    } else {
        stdout
    };
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

pub struct CoreToolLocator {
    roots: SearchRoots,
}

impl CoreToolLocator {
    pub fn new() -> Self {
        Self::with_roots(SearchRoots::from_environment())
    }

    pub fn with_roots(roots: SearchRoots) -> Self {
        CoreToolLocator { roots }
    }
}

impl Default for CoreToolLocator {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolLocatorOperations for CoreToolLocator {
    fn locate(&self, tool: ToolKind, platform: HostPlatform) -> Option<ToolLocation> {
        let file_name = tool.file_name(platform);
        let mut candidates = Vec::new();
        if platform.has_path_lookup() {
            match path_lookup(&file_name, self.roots.path_var.as_ref(), platform) {
                Some(found) => {
                    log::debug!("ToolLocator: PATH lookup for '{file_name}' found {found:?}.");
                    candidates.push(found);
                }
                None => log::debug!("ToolLocator: PATH lookup for '{file_name}' found nothing."),
            }
        }
        candidates.extend(candidate_paths(tool, platform, &self.roots));

        for candidate in candidates {
            log::debug!("ToolLocator: Trying {} candidate {candidate:?}", tool.display_name());
            if is_acceptable(&candidate, platform) {
                log::info!(
                    "ToolLocator: Using {} binary at {candidate:?}",
                    tool.display_name()
                );
                return Some(ToolLocation {
                    path: candidate,
                    verified_executable: platform.requires_execute_bit(),
                });
            }
        }

        log::warn!(
            "ToolLocator: No {} binary found for platform {platform:?}.",
            tool.display_name()
        );
        None
    }

    fn validate_selection(&self, path: &Path, platform: HostPlatform) -> Result<ToolLocation> {
        validate_manual_selection(path, platform)
    }
}
