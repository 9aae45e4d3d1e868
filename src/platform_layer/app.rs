/*
 * The Win32 implementation of `PlatformInterface` and the shared
 * `Win32ApiInternalState` that window procedures and command handlers work on.
 *
 * Event delivery: `send_event` locks the application's handler only for the
 * duration of `handle_event`, then drains the handler's command queue one
 * command at a time with the lock released. Modal dialogs run their own
 * message loop and may deliver further events while a command executes, so
 * the handler lock must never be held across command execution.
 */

use super::command_executor;
use super::controls::{
    button_handler, dialog_handler, input_handler, label_handler, panel_handler,
};
use super::error::{PlatformError, Result as PlatformResult};
use super::types::{AppEvent, PlatformCommand, PlatformEventHandler, WindowConfig, WindowId};
use super::window_common::{self, NativeWindowData};

use windows::{
    Win32::{
        Foundation::{HINSTANCE, RPC_E_CHANGED_MODE, S_FALSE},
        System::{
            Com::{COINIT_APARTMENTTHREADED, CoInitializeEx, CoUninitialize},
            LibraryLoader::GetModuleHandleW,
        },
        UI::{
            Controls::{ICC_STANDARD_CLASSES, INITCOMMONCONTROLSEX, InitCommonControlsEx},
            WindowsAndMessaging::{DispatchMessageW, GetMessageW, MSG, TranslateMessage},
        },
    },
    core::PCWSTR,
};

use std::collections::HashMap;
use std::sync::{
    Arc, Mutex, RwLock, Weak,
    atomic::{AtomicUsize, Ordering},
};

/*
 * Internal state for the Win32 platform layer. Holds the module instance,
 * the map from `WindowId` to `NativeWindowData`, and a weak reference to the
 * application's event handler (weak so the handler can own the interface
 * without a cycle).
 */
pub(crate) struct Win32ApiInternalState {
    h_instance: HINSTANCE,
    next_window_id_counter: AtomicUsize,
    active_windows: RwLock<HashMap<WindowId, NativeWindowData>>,
    application_event_handler: Mutex<Option<Weak<Mutex<dyn PlatformEventHandler>>>>,
    app_name_for_class: String,
}

impl Win32ApiInternalState {
    pub(crate) fn new(app_name_for_class: String) -> PlatformResult<Arc<Self>> {
        unsafe {
            let hr = CoInitializeEx(None, COINIT_APARTMENTTHREADED);
            if hr.is_err() && hr != S_FALSE && hr != RPC_E_CHANGED_MODE {
                log::error!("Platform: CoInitializeEx failed: {hr:?}");
                return Err(PlatformError::InitializationFailed(format!(
                    "CoInitializeEx failed: {hr:?}"
                )));
            }

            let icex = INITCOMMONCONTROLSEX {
                dwSize: std::mem::size_of::<INITCOMMONCONTROLSEX>() as u32,
                dwICC: ICC_STANDARD_CLASSES,
            };
            if !InitCommonControlsEx(&icex).as_bool() {
                log::warn!("Platform: InitCommonControlsEx failed; using default control classes.");
            }

            let h_instance = HINSTANCE(GetModuleHandleW(PCWSTR::null())?.0);
            log::debug!("Platform: Internal state created for '{app_name_for_class}'.");
            Ok(Arc::new(Self {
                h_instance,
                next_window_id_counter: AtomicUsize::new(1),
                active_windows: RwLock::new(HashMap::new()),
                application_event_handler: Mutex::new(None),
                app_name_for_class,
            }))
        }
    }

    pub(crate) fn h_instance(&self) -> HINSTANCE {
        self.h_instance
    }

    pub(crate) fn app_name_for_class(&self) -> &str {
        &self.app_name_for_class
    }

    pub(crate) fn generate_window_id(&self) -> WindowId {
        WindowId(self.next_window_id_counter.fetch_add(1, Ordering::Relaxed))
    }

    /*
     * Runs `f` with shared access to the data of one window. Fails with
     * `InvalidHandle` if the window is unknown. `f` must not call into Win32
     * functions that send messages back to our window procedure.
     */
    pub(crate) fn with_window_data_read<R>(
        &self,
        window_id: WindowId,
        f: impl FnOnce(&NativeWindowData) -> PlatformResult<R>,
    ) -> PlatformResult<R> {
        let windows_guard = self.active_windows.read().map_err(|e| {
            log::error!("Platform: Failed to acquire read lock on windows map: {e}");
            PlatformError::OperationFailed("Failed to acquire read lock on windows map".into())
        })?;
        let window_data = windows_guard.get(&window_id).ok_or_else(|| {
            PlatformError::InvalidHandle(format!("WindowId {window_id:?} not found"))
        })?;
        f(window_data)
    }

    // Mutable counterpart of `with_window_data_read`.
    pub(crate) fn with_window_data_write<R>(
        &self,
        window_id: WindowId,
        f: impl FnOnce(&mut NativeWindowData) -> PlatformResult<R>,
    ) -> PlatformResult<R> {
        let mut windows_guard = self.active_windows.write().map_err(|e| {
            log::error!("Platform: Failed to acquire write lock on windows map: {e}");
            PlatformError::OperationFailed("Failed to acquire write lock on windows map".into())
        })?;
        let window_data = windows_guard.get_mut(&window_id).ok_or_else(|| {
            PlatformError::InvalidHandle(format!("WindowId {window_id:?} not found"))
        })?;
        f(window_data)
    }

    fn insert_window_data(&self, window_data: NativeWindowData, window_id: WindowId) -> PlatformResult<()> {
        self.active_windows
            .write()
            .map_err(|_| {
                PlatformError::OperationFailed("Failed to lock windows map for insert".into())
            })?
            .insert(window_id, window_data);
        Ok(())
    }

    pub(crate) fn remove_window_data(&self, window_id: WindowId) {
        match self.active_windows.write() {
            Ok(mut windows_guard) => {
                windows_guard.remove(&window_id);
            }
            Err(e) => log::error!("Platform: Failed to lock windows map for removal: {e}"),
        }
    }

    fn event_handler(&self) -> Option<Arc<Mutex<dyn PlatformEventHandler>>> {
        self.application_event_handler
            .lock()
            .ok()
            .and_then(|guard| guard.as_ref().and_then(Weak::upgrade))
    }

    /*
     * Delivers an event to the application and then executes every command it
     * enqueued. Safe to call re-entrantly from inside a modal dialog.
     */
    pub(crate) fn send_event(self: &Arc<Self>, event: AppEvent) {
        let Some(handler_arc) = self.event_handler() else {
            log::warn!("Platform: Event handler not available; dropping {event:?}.");
            return;
        };
        match handler_arc.lock() {
            Ok(mut handler) => handler.handle_event(event),
            Err(e) => {
                log::error!("Platform: Failed to lock event handler: {e}");
                return;
            }
        }
        self.process_pending_commands(&handler_arc);
    }

    fn process_pending_commands(self: &Arc<Self>, handler_arc: &Arc<Mutex<dyn PlatformEventHandler>>) {
        loop {
            let command = match handler_arc.lock() {
                Ok(mut handler) => handler.try_dequeue_command(),
                Err(e) => {
                    log::error!("Platform: Failed to lock event handler for commands: {e}");
                    None
                }
            };
            let Some(command) = command else {
                break;
            };
            if let Err(e) = self.execute_platform_command(command) {
                log::error!("Platform: Error executing command: {e}");
            }
        }
    }

    fn execute_platform_command(self: &Arc<Self>, command: PlatformCommand) -> PlatformResult<()> {
        log::trace!("Platform: Executing {command:?}");
        match command {
            PlatformCommand::ShowWindow { window_id } => {
                command_executor::execute_show_window(self, window_id)
            }
            PlatformCommand::CloseWindow { window_id } => {
                command_executor::execute_close_window(self, window_id)
            }
            PlatformCommand::QuitApplication => command_executor::execute_quit_application(),
            PlatformCommand::CreatePanel {
                window_id,
                parent_control_id,
                control_id,
            } => panel_handler::handle_create_panel_command(
                self,
                window_id,
                parent_control_id,
                control_id,
            ),
            PlatformCommand::CreateLabel {
                window_id,
                parent_control_id,
                control_id,
                text,
            } => label_handler::handle_create_label_command(
                self,
                window_id,
                parent_control_id,
                control_id,
                text,
            ),
            PlatformCommand::CreateInput {
                window_id,
                parent_control_id,
                control_id,
                initial_text,
                kind,
            } => input_handler::handle_create_input_command(
                self,
                window_id,
                parent_control_id,
                control_id,
                initial_text,
                kind,
            ),
            PlatformCommand::CreateCheckbox {
                window_id,
                parent_control_id,
                control_id,
                text,
                checked,
            } => button_handler::handle_create_checkbox_command(
                self,
                window_id,
                parent_control_id,
                control_id,
                text,
                checked,
            ),
            PlatformCommand::CreateButton {
                window_id,
                parent_control_id,
                control_id,
                text,
            } => button_handler::handle_create_button_command(
                self,
                window_id,
                parent_control_id,
                control_id,
                text,
            ),
            PlatformCommand::DefineLayout { window_id, rules } => {
                command_executor::execute_define_layout(self, window_id, rules)
            }
            PlatformCommand::SignalMainWindowUISetupComplete { window_id } => {
                command_executor::execute_signal_main_window_ui_setup_complete(self, window_id)
            }
            PlatformCommand::SetInputText {
                window_id,
                control_id,
                text,
            } => input_handler::handle_set_input_text_command(self, window_id, control_id, text),
            PlatformCommand::AppendLogLine {
                window_id,
                control_id,
                line,
            } => input_handler::handle_append_log_line_command(self, window_id, control_id, line),
            PlatformCommand::SetControlEnabled {
                window_id,
                control_id,
                enabled,
            } => command_executor::execute_set_control_enabled(self, window_id, control_id, enabled),
            PlatformCommand::ShowMessageBox {
                window_id,
                title,
                text,
                severity,
            } => dialog_handler::handle_show_message_box_command(
                self, window_id, title, text, severity,
            ),
            PlatformCommand::ShowConfirmation {
                window_id,
                title,
                text,
            } => dialog_handler::handle_show_confirmation_command(self, window_id, title, text),
            PlatformCommand::ShowOpenFileDialog {
                window_id,
                title,
                filter_spec,
                initial_dir,
            } => dialog_handler::handle_show_open_file_dialog_command(
                self,
                window_id,
                title,
                filter_spec,
                initial_dir,
            ),
            PlatformCommand::ShowSaveFileDialog {
                window_id,
                title,
                default_filename,
                filter_spec,
                initial_dir,
            } => dialog_handler::handle_show_save_file_dialog_command(
                self,
                window_id,
                title,
                default_filename,
                filter_spec,
                initial_dir,
            ),
            PlatformCommand::ShowFolderPickerDialog {
                window_id,
                title,
                initial_dir,
            } => dialog_handler::handle_show_folder_picker_dialog_command(
                self,
                window_id,
                title,
                initial_dir,
            ),
            PlatformCommand::SetPollTimer { window_id, active } => {
                command_executor::execute_set_poll_timer(self, window_id, active)
            }
        }
    }
}

impl Drop for Win32ApiInternalState {
    fn drop(&mut self) {
        log::debug!("Platform: Win32ApiInternalState dropped, calling CoUninitialize.");
        unsafe { CoUninitialize() };
    }
}

// The primary interface to the platform abstraction layer.
pub struct PlatformInterface {
    internal_state: Arc<Win32ApiInternalState>,
}

impl PlatformInterface {
    pub fn new(app_name_for_class: String) -> PlatformResult<Self> {
        let internal_state = Win32ApiInternalState::new(app_name_for_class)?;
        window_common::register_window_class(&internal_state)?;
        Ok(PlatformInterface { internal_state })
    }

    /*
     * Creates a top-level window. Its `NativeWindowData` is inserted before
     * `CreateWindowExW` so that messages sent during creation find it; the
     * HWND is filled in afterwards.
     */
    pub fn create_window(&self, config: WindowConfig) -> PlatformResult<WindowId> {
        let window_id = self.internal_state.generate_window_id();
        self.internal_state
            .insert_window_data(NativeWindowData::new(window_id), window_id)?;

        let hwnd = match window_common::create_native_window(
            &self.internal_state,
            window_id,
            config.title,
            config.width,
            config.height,
        ) {
            Ok(hwnd) => hwnd,
            Err(e) => {
                self.internal_state.remove_window_data(window_id);
                return Err(e);
            }
        };

        self.internal_state
            .with_window_data_write(window_id, |window_data| {
                window_data.set_hwnd(hwnd);
                Ok(())
            })?;
        log::debug!("Platform: Created window {window_id:?} with HWND {hwnd:?}.");
        Ok(window_id)
    }

    /*
     * Runs the message loop until `WM_QUIT`. Commands already queued by the
     * handler (the static UI description) are executed before the first
     * message is pumped.
     */
    pub fn run(&self, event_handler: Arc<Mutex<dyn PlatformEventHandler>>) -> PlatformResult<()> {
        {
            let mut handler_slot = self.internal_state.application_event_handler.lock().map_err(|_| {
                PlatformError::OperationFailed("Failed to lock event handler slot".into())
            })?;
            *handler_slot = Some(Arc::downgrade(&event_handler));
        }

        self.internal_state.process_pending_commands(&event_handler);

        let loop_result = unsafe {
            let mut msg = MSG::default();
            loop {
                let result = GetMessageW(&mut msg, None, 0, 0);
                if result.0 > 0 {
                    let _ = TranslateMessage(&msg);
                    DispatchMessageW(&msg);
                } else if result.0 == 0 {
                    log::debug!("Platform: WM_QUIT received, leaving message loop.");
                    break Ok(());
                } else {
                    let error = windows::core::Error::from_win32();
                    log::error!("Platform: GetMessageW failed: {error:?}");
                    break Err(PlatformError::OperationFailed(format!(
                        "GetMessageW failed: {error}"
                    )));
                }
            }
        };

        match event_handler.lock() {
            Ok(mut handler) => handler.on_quit(),
            Err(e) => log::error!("Platform: Failed to lock event handler for on_quit: {e}"),
        }
        if let Ok(mut handler_slot) = self.internal_state.application_event_handler.lock() {
            *handler_slot = None;
        }
        loop_result
    }
}
