use super::main_window_ui_state::{DEFAULT_OUTPUT_FILENAME, MainWindowUiState, PathField};
use super::ui_constants;
use crate::core::{
    self, AppSettings, ConfigManagerOperations, ExitOutcome, HostPlatform, ProcessEvent,
    ProcessInvocation, ProcessLauncherOperations, RunningProcess, ToolKind, ToolLocation,
    ToolLocatorOperations, installer, path_utils,
};
use crate::platform_layer::{
    AppEvent, ControlId, MessageSeverity, PlatformCommand, PlatformEventHandler, WindowId,
};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub(crate) const APP_NAME: &str = "NeoSigner";

const SIGNER_LOCATE_TITLE: &str = "Select zsign binary";
const STARTUP_LOCATE_PROMPT: &str =
    "Could not find zsign binary automatically. Would you like to locate it manually?";
const SIGN_LOCATE_PROMPT: &str =
    "Zsign binary not found. Would you like to specify the location manually?";
const SIGNER_REQUIRED_MESSAGE: &str = "Zsign binary is required to run this application. Please compile it according to the README instructions.";
const INSTALL_AFTER_SIGN_PROMPT: &str =
    "Would you like to install the signed app to your device now?";

// Tracks a dialog whose completion event has not arrived yet.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum PendingAction {
    BrowseField(PathField),
    // The .ipa picker was cancelled; a folder picker for an app bundle is open.
    InputFolderFallback,
    // "Locate it manually?" confirmation is showing.
    LocateSignerPrompt { resume_sign: bool },
    // The file dialog for the signer binary is showing.
    LocateSignerDialog { resume_sign: bool },
    ConfirmInstallAfterSign,
}

#[derive(Debug, Clone, PartialEq)]
enum RunKind {
    Sign {
        output_path: String,
        install_after_sign: bool,
    },
    Install,
}

struct ActiveRun {
    kind: RunKind,
    process: Box<dyn RunningProcess>,
    cancel_requested: bool,
}

/*
 * Manages the application state and UI logic in a platform-agnostic manner.
 * It processes UI events received from the platform layer and enqueues
 * commands to update the UI. Tool discovery, process execution and settings
 * persistence are reached through the `...Operations` traits, so every flow
 * can be driven from tests with mocks.
 *
 * At most one child process runs at a time. While it runs, the form is
 * disabled and a poll timer drains its output into the log view.
 */
pub struct MyAppLogic {
    ui_state: Option<MainWindowUiState>,
    synchronous_command_queue: VecDeque<PlatformCommand>,
    signer: Option<ToolLocation>,
    installer: Option<ToolLocation>,
    active_run: Option<ActiveRun>,
    platform: HostPlatform,
    config_manager: Arc<dyn ConfigManagerOperations>,
    tool_locator: Arc<dyn ToolLocatorOperations>,
    launcher: Arc<dyn ProcessLauncherOperations>,
}

impl MyAppLogic {
    pub fn new(
        config_manager: Arc<dyn ConfigManagerOperations>,
        tool_locator: Arc<dyn ToolLocatorOperations>,
        launcher: Arc<dyn ProcessLauncherOperations>,
        platform: HostPlatform,
    ) -> Self {
        MyAppLogic {
            ui_state: None,
            synchronous_command_queue: VecDeque::new(),
            signer: None,
            installer: None,
            active_run: None,
            platform,
            config_manager,
            tool_locator,
            launcher,
        }
    }

    pub fn enqueue_command(&mut self, command: PlatformCommand) {
        self.synchronous_command_queue.push_back(command);
    }

    fn window_id(&self) -> Option<WindowId> {
        self.ui_state.as_ref().map(|s| s.window_id)
    }

    // --- Command helpers ---

    fn append_log(&mut self, line: impl Into<String>) {
        let line = line.into();
        log::info!("AppLogic: {line}");
        if let Some(window_id) = self.window_id() {
            self.enqueue_command(PlatformCommand::AppendLogLine {
                window_id,
                control_id: ui_constants::LOG_VIEW_ID,
                line,
            });
        }
    }

    fn show_message(&mut self, title: &str, text: impl Into<String>, severity: MessageSeverity) {
        if let Some(window_id) = self.window_id() {
            self.enqueue_command(PlatformCommand::ShowMessageBox {
                window_id,
                title: title.to_string(),
                text: text.into(),
                severity,
            });
        }
    }

    fn show_error(&mut self, text: impl Into<String>) {
        let text = text.into();
        log::warn!("AppLogic: Showing error: {text}");
        self.show_message("Error", text, MessageSeverity::Error);
    }

    fn show_success(&mut self, text: impl Into<String>) {
        self.show_message("Success", text, MessageSeverity::Information);
    }

    fn ask(&mut self, title: &str, text: &str, action: PendingAction) {
        let Some(window_id) = self.window_id() else {
            return;
        };
        self.enqueue_command(PlatformCommand::ShowConfirmation {
            window_id,
            title: title.to_string(),
            text: text.to_string(),
        });
        self.set_pending_action(action);
    }

    fn set_control_enabled(&mut self, control_id: ControlId, enabled: bool) {
        if let Some(window_id) = self.window_id() {
            self.enqueue_command(PlatformCommand::SetControlEnabled {
                window_id,
                control_id,
                enabled,
            });
        }
    }

    fn set_pending_action(&mut self, action: PendingAction) {
        if let Some(ui_state) = self.ui_state.as_mut() {
            if let Some(previous) = ui_state.pending_action.replace(action) {
                log::warn!("AppLogic: Replacing unfinished pending action {previous:?}.");
            }
        }
    }

    fn take_pending_action(&mut self) -> Option<PendingAction> {
        self.ui_state.as_mut().and_then(|s| s.pending_action.take())
    }

    /*
     * Enables or disables the form for a run. The install button is only
     * ever enabled when an installer was found, and Cancel is the inverse of
     * the rest of the form.
     */
    fn set_form_locked(&mut self, locked: bool) {
        for control_id in ui_constants::RUN_LOCKED_CONTROLS {
            self.set_control_enabled(control_id, !locked);
        }
        let install_enabled = !locked && self.installer.is_some();
        self.set_control_enabled(ui_constants::INSTALL_BUTTON_ID, install_enabled);
        self.set_control_enabled(ui_constants::CANCEL_BUTTON_ID, locked);
    }

    fn set_poll_timer(&mut self, active: bool) {
        if let Some(window_id) = self.window_id() {
            self.enqueue_command(PlatformCommand::SetPollTimer { window_id, active });
        }
    }

    // --- Startup ---

    /*
     * Resolves the signing tool. A persisted manual choice wins if it still
     * validates; otherwise the regular discovery runs.
     */
    fn resolve_signer(&self) -> Option<ToolLocation> {
        match self.config_manager.load_settings(APP_NAME) {
            Ok(AppSettings {
                signer_override: Some(path),
            }) => match self.tool_locator.validate_selection(&path, self.platform) {
                Ok(location) => {
                    log::info!("AppLogic: Using persisted zsign override {path:?}.");
                    return Some(location);
                }
                Err(e) => {
                    log::warn!("AppLogic: Ignoring persisted zsign override {path:?}: {e}");
                }
            },
            Ok(_) => {}
            Err(e) => log::warn!("AppLogic: Could not load settings: {e}"),
        }
        self.tool_locator.locate(ToolKind::Signer, self.platform)
    }

    fn report_signer_version(&mut self) {
        let Some(signer) = self.signer.clone() else {
            return;
        };
        let probe = ProcessInvocation::new(
            signer.path.clone(),
            core::VERSION_PROBE_ARGS.iter().map(|a| a.to_string()).collect(),
        );
        match self.launcher.capture(&probe) {
            Ok(output) => {
                let version = core::version_from_probe(&output).unwrap_or_default();
                self.append_log(format!("Zsign binary found: {}", signer.path.display()));
                self.append_log(format!("Version: {version}"));
            }
            Err(e) => {
                self.append_log(format!("Warning: Could not get zsign version: {e}"));
            }
        }
    }

    fn on_main_window_ready(&mut self, window_id: WindowId) {
        log::debug!("AppLogic: Main window {window_id:?} UI setup complete.");
        self.ui_state = Some(MainWindowUiState::new(window_id));
        self.enqueue_command(PlatformCommand::ShowWindow { window_id });

        self.signer = self.resolve_signer();
        self.report_signer_version();

        self.installer = self.tool_locator.locate(ToolKind::Installer, self.platform);
        if let Some(installer) = self.installer.clone() {
            self.append_log(format!(
                "ideviceinstaller found: {}",
                installer.path.display()
            ));
        }
        self.set_form_locked(false);

        if self.signer.is_none() {
            self.ask(
                "Zsign Binary Not Found",
                STARTUP_LOCATE_PROMPT,
                PendingAction::LocateSignerPrompt { resume_sign: false },
            );
        }
    }

    // --- Locating the signer manually ---

    fn show_signer_picker(&mut self, resume_sign: bool) {
        let Some(window_id) = self.window_id() else {
            return;
        };
        let filter_spec = if self.platform == HostPlatform::Windows {
            "Executable files (*.exe)\0*.exe\0All files (*.*)\0*.*\0\0"
        } else {
            "All files (*.*)\0*.*\0\0"
        };
        self.enqueue_command(PlatformCommand::ShowOpenFileDialog {
            window_id,
            title: SIGNER_LOCATE_TITLE.to_string(),
            filter_spec: filter_spec.to_string(),
            initial_dir: None,
        });
        self.set_pending_action(PendingAction::LocateSignerDialog { resume_sign });
    }

    fn on_signer_picked(&mut self, path: Option<PathBuf>, resume_sign: bool) {
        let Some(path) = path else {
            log::debug!("AppLogic: zsign selection cancelled.");
            return;
        };
        match self.tool_locator.validate_selection(&path, self.platform) {
            Ok(location) => {
                let settings = AppSettings {
                    signer_override: Some(location.path.clone()),
                };
                if let Err(e) = self.config_manager.save_settings(APP_NAME, &settings) {
                    log::warn!("AppLogic: Could not persist zsign override: {e}");
                }
                self.show_success(format!("Using zsign binary at: {}", location.path.display()));
                self.signer = Some(location);
                self.report_signer_version();
                if resume_sign {
                    self.start_signing();
                }
            }
            Err(e) => self.show_error(e.to_string()),
        }
    }

    // --- Signing ---

    fn signer_is_available(&self) -> bool {
        self.signer.as_ref().is_some_and(|s| s.path.exists())
    }

    fn on_sign_clicked(&mut self) {
        if self.active_run.is_some() {
            log::debug!("AppLogic: Sign clicked while a run is active; ignoring.");
            return;
        }
        if !self.signer_is_available() {
            self.ask(
                "Error",
                SIGN_LOCATE_PROMPT,
                PendingAction::LocateSignerPrompt { resume_sign: true },
            );
            return;
        }
        self.start_signing();
    }

    fn start_signing(&mut self) {
        let Some(signer) = self.signer.clone() else {
            return;
        };
        let Some(request) = self.ui_state.as_ref().map(|s| s.signing_request()) else {
            return;
        };
        let args = match core::synthesize(&request) {
            Ok(args) => args,
            Err(e) => {
                self.show_error(e.to_string());
                return;
            }
        };
        let invocation = ProcessInvocation::new(signer.path, args);
        self.append_log(format!("Running command: {}", invocation.display_redacted()));
        match self.launcher.spawn(&invocation) {
            Ok(process) => self.begin_run(
                RunKind::Sign {
                    output_path: request.output_path,
                    install_after_sign: request.install_after_sign,
                },
                process,
            ),
            Err(e) => {
                self.append_log(format!("Error: {e}"));
                self.show_error(e.to_string());
            }
        }
    }

    // --- Installing ---

    fn on_install_requested(&mut self) {
        if self.active_run.is_some() {
            log::debug!("AppLogic: Install requested while a run is active; ignoring.");
            return;
        }
        let Some(installer_location) = self.installer.clone() else {
            self.show_error("ideviceinstaller not found. Please install it first.");
            return;
        };
        let output = self
            .ui_state
            .as_ref()
            .map(|s| s.output_path())
            .unwrap_or_default();
        if output.is_empty() {
            self.show_error("No signed app specified. Please sign an app first.");
            return;
        }
        let signed_app = PathBuf::from(&output);
        if !signed_app.exists() {
            self.show_error(format!("Signed app not found: {output}"));
            return;
        }

        let probe = installer::device_probe_invocation(&installer_location.path);
        match self.launcher.capture(&probe) {
            Ok(captured) if !installer::device_present(&captured) => {
                self.show_error("No iOS device found. Please connect your device.");
                return;
            }
            Ok(_) => {}
            Err(e) => {
                self.show_error(format!("Error checking device: {e}"));
                return;
            }
        }

        self.append_log(format!("Installing app to device: {output}"));
        let invocation = installer::install_invocation(&installer_location.path, &signed_app);
        match self.launcher.spawn(&invocation) {
            Ok(process) => self.begin_run(RunKind::Install, process),
            Err(e) => {
                self.append_log(format!("Installation error: {e}"));
                self.show_error(format!("Installation error: {e}"));
            }
        }
    }

    // --- Running children ---

    fn begin_run(&mut self, kind: RunKind, process: Box<dyn RunningProcess>) {
        log::debug!("AppLogic: Run started: {kind:?}");
        self.active_run = Some(ActiveRun {
            kind,
            process,
            cancel_requested: false,
        });
        self.set_form_locked(true);
        self.set_poll_timer(true);
    }

    fn poll_active_run(&mut self) {
        let events = match self.active_run.as_mut() {
            Some(run) => run.process.poll(),
            None => return,
        };
        let mut exit = None;
        for event in events {
            match event {
                ProcessEvent::Line(line) => {
                    log::debug!("AppLogic: Tool output: {line}");
                    if let Some(window_id) = self.window_id() {
                        self.enqueue_command(PlatformCommand::AppendLogLine {
                            window_id,
                            control_id: ui_constants::LOG_VIEW_ID,
                            line,
                        });
                    }
                }
                ProcessEvent::Exited(outcome) => exit = Some(outcome),
            }
        }
        if let Some(outcome) = exit {
            if let Some(run) = self.active_run.take() {
                self.finish_run(run.kind, run.cancel_requested, outcome);
            }
        }
    }

    fn finish_run(&mut self, kind: RunKind, cancelled: bool, outcome: ExitOutcome) {
        log::debug!("AppLogic: Run {kind:?} finished with {outcome:?}.");
        self.set_poll_timer(false);
        self.set_form_locked(false);

        // A child that already exited cleanly before the kill landed counts as done.
        if cancelled && !outcome.success() {
            self.append_log("Command cancelled.");
            return;
        }

        match kind {
            RunKind::Sign {
                output_path,
                install_after_sign,
            } => self.finish_signing(&output_path, install_after_sign, outcome),
            RunKind::Install => {
                if outcome.success() {
                    self.append_log("App installed successfully!");
                    self.show_success("App installed successfully to your device!");
                } else {
                    let message = format!("Installation failed with code {}", outcome.describe());
                    self.append_log(message.clone());
                    self.show_error(message);
                }
            }
        }
    }

    fn finish_signing(&mut self, output_path: &str, install_after_sign: bool, outcome: ExitOutcome) {
        if !outcome.success() {
            let message = format!("Signature failed with return code {}", outcome.describe());
            self.append_log(message.clone());
            self.show_error(message);
            return;
        }

        self.append_log("Signature completed successfully!");
        let output = Path::new(output_path);
        let output_exists = !output_path.is_empty() && output.exists();
        if output_exists {
            match std::fs::metadata(output) {
                Ok(metadata) => self.append_log(format!(
                    "Output file: {output_path} ({})",
                    path_utils::format_size_in_megabytes(metadata.len())
                )),
                Err(e) => log::warn!("AppLogic: Could not stat output {output_path}: {e}"),
            }
        }
        self.show_success("Signature completed successfully!");

        if install_after_sign && self.installer.is_some() && output_exists {
            self.ask(
                "Install",
                INSTALL_AFTER_SIGN_PROMPT,
                PendingAction::ConfirmInstallAfterSign,
            );
        }
    }

    fn on_cancel_clicked(&mut self) {
        let Some(run) = self.active_run.as_mut() else {
            log::debug!("AppLogic: Cancel clicked with no active run.");
            return;
        };
        run.cancel_requested = true;
        if let Err(e) = run.process.cancel() {
            log::error!("AppLogic: Failed to cancel child process: {e}");
            self.append_log(format!("Error: {e}"));
        }
    }

    // Kills an active child without waiting for its exit to be reported.
    fn abort_active_run(&mut self) {
        if let Some(mut run) = self.active_run.take() {
            log::info!("AppLogic: Aborting active run {:?}.", run.kind);
            if let Err(e) = run.process.cancel() {
                log::error!("AppLogic: Failed to cancel child process: {e}");
            }
            self.set_poll_timer(false);
        }
    }

    // --- Browse dialogs ---

    fn on_browse_clicked(&mut self, field: PathField) {
        let Some(window_id) = self.window_id() else {
            return;
        };
        let title = field.dialog_title().to_string();
        let filter_spec = field.filter_spec().to_string();
        let initial_dir = self
            .ui_state
            .as_ref()
            .and_then(|state| state.browse_start_dir(field));
        let command = if field.uses_save_dialog() {
            PlatformCommand::ShowSaveFileDialog {
                window_id,
                title,
                default_filename: DEFAULT_OUTPUT_FILENAME.to_string(),
                filter_spec,
                initial_dir,
            }
        } else {
            PlatformCommand::ShowOpenFileDialog {
                window_id,
                title,
                filter_spec,
                initial_dir,
            }
        };
        self.enqueue_command(command);
        self.set_pending_action(PendingAction::BrowseField(field));
    }

    fn fill_path_field(&mut self, field: PathField, path: &Path) {
        let text = path.to_string_lossy().into_owned();
        let Some(ui_state) = self.ui_state.as_mut() else {
            return;
        };
        ui_state.set_path_field(field, text.clone());
        let window_id = ui_state.window_id;
        self.enqueue_command(PlatformCommand::SetInputText {
            window_id,
            control_id: field.input_control_id(),
            text,
        });
    }

    fn on_file_dialog_completed(&mut self, result: Option<PathBuf>) {
        match self.take_pending_action() {
            Some(PendingAction::BrowseField(field)) => match result {
                Some(path) => self.fill_path_field(field, &path),
                None if field == PathField::Input => {
                    // An app bundle directory is valid input too.
                    if let Some(window_id) = self.window_id() {
                        let initial_dir = self
                            .ui_state
                            .as_ref()
                            .and_then(|state| state.browse_start_dir(field));
                        self.enqueue_command(PlatformCommand::ShowFolderPickerDialog {
                            window_id,
                            title: "Select App Bundle Folder".to_string(),
                            initial_dir,
                        });
                        self.set_pending_action(PendingAction::InputFolderFallback);
                    }
                }
                None => log::debug!("AppLogic: Browse for {field:?} cancelled."),
            },
            Some(PendingAction::LocateSignerDialog { resume_sign }) => {
                self.on_signer_picked(result, resume_sign)
            }
            other => log::warn!(
                "AppLogic: File dialog completed with unexpected pending action {other:?}."
            ),
        }
    }

    fn on_folder_picker_completed(&mut self, path: Option<PathBuf>) {
        match self.take_pending_action() {
            Some(PendingAction::InputFolderFallback) => {
                if let Some(path) = path {
                    self.fill_path_field(PathField::Input, &path);
                }
            }
            other => log::warn!(
                "AppLogic: Folder picker completed with unexpected pending action {other:?}."
            ),
        }
    }

    fn on_confirmation_completed(&mut self, confirmed: bool) {
        match self.take_pending_action() {
            Some(PendingAction::LocateSignerPrompt { resume_sign }) => {
                if confirmed {
                    self.show_signer_picker(resume_sign);
                } else if !resume_sign {
                    self.show_error(SIGNER_REQUIRED_MESSAGE);
                }
            }
            Some(PendingAction::ConfirmInstallAfterSign) => {
                if confirmed {
                    self.on_install_requested();
                }
            }
            other => log::warn!(
                "AppLogic: Confirmation completed with unexpected pending action {other:?}."
            ),
        }
    }

    fn on_button_clicked(&mut self, control_id: ControlId) {
        match control_id {
            id if id == ui_constants::SIGN_BUTTON_ID => self.on_sign_clicked(),
            id if id == ui_constants::INSTALL_BUTTON_ID => self.on_install_requested(),
            id if id == ui_constants::CANCEL_BUTTON_ID => self.on_cancel_clicked(),
            id if id == ui_constants::CLEAR_LOGS_BUTTON_ID => {
                if let Some(window_id) = self.window_id() {
                    self.enqueue_command(PlatformCommand::SetInputText {
                        window_id,
                        control_id: ui_constants::LOG_VIEW_ID,
                        text: String::new(),
                    });
                }
            }
            id => match PathField::from_browse_button(id) {
                Some(field) => self.on_browse_clicked(field),
                None => log::warn!("AppLogic: Unhandled button click for {}.", id.raw()),
            },
        }
    }

    #[cfg(test)]
    pub(crate) fn test_drain_commands(&mut self) -> Vec<PlatformCommand> {
        self.synchronous_command_queue.drain(..).collect()
    }

    #[cfg(test)]
    pub(crate) fn test_has_active_run(&self) -> bool {
        self.active_run.is_some()
    }

    #[cfg(test)]
    pub(crate) fn test_signer(&self) -> Option<&ToolLocation> {
        self.signer.as_ref()
    }

    #[cfg(test)]
    pub(crate) fn test_pending_action(&self) -> Option<&PendingAction> {
        self.ui_state.as_ref().and_then(|s| s.pending_action.as_ref())
    }
}

impl PlatformEventHandler for MyAppLogic {
    fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::MainWindowUISetupComplete { window_id } => {
                self.on_main_window_ready(window_id)
            }
            AppEvent::ButtonClicked { control_id, .. } => self.on_button_clicked(control_id),
            AppEvent::InputTextChanged {
                control_id, text, ..
            } => {
                if let Some(ui_state) = self.ui_state.as_mut() {
                    if !ui_state.apply_text_change(control_id, text) {
                        log::trace!("AppLogic: Ignoring text change for {}.", control_id.raw());
                    }
                }
            }
            AppEvent::CheckboxToggled {
                control_id,
                checked,
                ..
            } => {
                if let Some(ui_state) = self.ui_state.as_mut() {
                    if !ui_state.apply_checkbox_change(control_id, checked) {
                        log::warn!("AppLogic: Unknown checkbox {}.", control_id.raw());
                    }
                }
            }
            AppEvent::FileOpenDialogCompleted { result, .. }
            | AppEvent::FileSaveDialogCompleted { result, .. } => {
                self.on_file_dialog_completed(result)
            }
            AppEvent::FolderPickerDialogCompleted { path, .. } => {
                self.on_folder_picker_completed(path)
            }
            AppEvent::ConfirmationDialogCompleted { confirmed, .. } => {
                self.on_confirmation_completed(confirmed)
            }
            AppEvent::PollTimerTick { .. } => self.poll_active_run(),
            AppEvent::WindowCloseRequestedByUser { window_id } => {
                self.abort_active_run();
                self.enqueue_command(PlatformCommand::CloseWindow { window_id });
            }
            AppEvent::WindowDestroyed { window_id } => {
                log::debug!("AppLogic: Window {window_id:?} destroyed.");
                if self.window_id() == Some(window_id) {
                    self.ui_state = None;
                    self.enqueue_command(PlatformCommand::QuitApplication);
                }
            }
        }
    }

    fn on_quit(&mut self) {
        log::debug!("AppLogic: on_quit called.");
        self.abort_active_run();
    }

    fn try_dequeue_command(&mut self) -> Option<PlatformCommand> {
        self.synchronous_command_queue.pop_front()
    }
}
