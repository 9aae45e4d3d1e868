/*
 * This module defines core data types used for communication between the
 * application logic and the platform layer. It includes identifiers for windows
 * and controls, configuration for windows, layout primitives, platform-agnostic
 * event types (`AppEvent`), commands for the platform layer (`PlatformCommand`)
 * and severity levels for message dialogs (`MessageSeverity`). It also defines
 * the `PlatformEventHandler` trait that the application logic must implement.
 *
 * Nothing in here depends on a native toolkit, so the application logic can be
 * built and tested on any target.
 */

use std::path::PathBuf;

// An opaque identifier for a native window, managed by the platform layer.
//
// The application logic layer uses this ID to refer to specific windows
// when sending commands or receiving events, without needing to know about
// native window handles like HWND.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowId(pub(crate) usize);

impl WindowId {
    #[cfg(test)]
    pub(crate) fn new_for_test(raw: usize) -> Self {
        WindowId(raw)
    }
}

// A logical identifier for a control inside a window. The values are chosen by
// the application (see `app_logic::ui_constants`); the platform layer maps them
// to native handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ControlId(i32);

impl ControlId {
    pub const fn new(raw: i32) -> Self {
        ControlId(raw)
    }

    pub const fn raw(self) -> i32 {
        self.0
    }
}

// --- Data Structures for UI Description (Platform-Agnostic) ---

// Configuration for creating a new native window.
#[derive(Debug, Clone)]
pub struct WindowConfig<'a> {
    pub title: &'a str,
    pub width: i32,
    pub height: i32,
}

// The flavour of an EDIT control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    SingleLine,
    // Characters are masked; the text never leaves the form state.
    Password,
    // Multi-line, read-only, scrolled to the end on every append.
    Log,
}

// --- Layout Primitives ---

/*
 * Defines how a control should dock within its parent container.
 * Top/Bottom consume `fixed_size` pixels of height, Left/Right consume
 * `fixed_size` pixels of width, and Fill takes whatever is left.
 * ProportionalFill siblings share the remaining width by weight.
 */
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DockStyle {
    Top,
    Bottom,
    Left,
    Right,
    Fill,
    ProportionalFill { weight: f32 },
}

/*
 * A rule that associates a control (by its ID) with a specific docking style.
 * Rules sharing a parent are applied in ascending `order`. `parent_control_id`
 * of `None` means the main window client area.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutRule {
    pub control_id: ControlId,
    pub parent_control_id: Option<ControlId>,
    pub dock_style: DockStyle,
    pub order: u32,
    pub fixed_size: Option<i32>, // Height for Top/Bottom, width for Left/Right.
    pub margin: (i32, i32, i32, i32), // (top, right, bottom, left)
}

// --- Events from Platform to App Logic ---

/*
 * Represents platform-agnostic UI events generated by the native toolkit.
 *
 * The platform layer translates native OS events into these types and
 * sends them to the application logic layer for handling.
 */
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    WindowCloseRequestedByUser {
        window_id: WindowId,
    },
    // The `WindowId` should be considered invalid after this event.
    WindowDestroyed {
        window_id: WindowId,
    },
    // Signals that the initial static UI setup for the main window is complete.
    MainWindowUISetupComplete {
        window_id: WindowId,
    },
    ButtonClicked {
        window_id: WindowId,
        control_id: ControlId,
    },
    CheckboxToggled {
        window_id: WindowId,
        control_id: ControlId,
        checked: bool,
    },
    // Sent for every edit, including text set programmatically.
    InputTextChanged {
        window_id: WindowId,
        control_id: ControlId,
        text: String,
    },
    FileOpenDialogCompleted {
        window_id: WindowId,
        result: Option<PathBuf>,
    },
    FileSaveDialogCompleted {
        window_id: WindowId,
        result: Option<PathBuf>,
    },
    FolderPickerDialogCompleted {
        window_id: WindowId,
        path: Option<PathBuf>,
    },
    ConfirmationDialogCompleted {
        window_id: WindowId,
        confirmed: bool,
    },
    // Periodic tick while the poll timer is active.
    PollTimerTick {
        window_id: WindowId,
    },
}

// Severity of a modal message. Ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MessageSeverity {
    Information,
    Error,
}

// Represents platform-agnostic commands sent from the application logic to the platform layer.
//
// Control-creating commands only name the control; position and size are
// managed by `DefineLayout`.
#[derive(Debug, Clone, PartialEq)]
pub enum PlatformCommand {
    ShowWindow {
        window_id: WindowId,
    },
    CloseWindow {
        window_id: WindowId,
    },
    QuitApplication,
    CreatePanel {
        window_id: WindowId,
        parent_control_id: Option<ControlId>,
        control_id: ControlId,
    },
    CreateLabel {
        window_id: WindowId,
        parent_control_id: Option<ControlId>,
        control_id: ControlId,
        text: String,
    },
    CreateInput {
        window_id: WindowId,
        parent_control_id: Option<ControlId>,
        control_id: ControlId,
        initial_text: String,
        kind: InputKind,
    },
    CreateCheckbox {
        window_id: WindowId,
        parent_control_id: Option<ControlId>,
        control_id: ControlId,
        text: String,
        checked: bool,
    },
    CreateButton {
        window_id: WindowId,
        parent_control_id: Option<ControlId>,
        control_id: ControlId,
        text: String,
    },
    DefineLayout {
        window_id: WindowId,
        rules: Vec<LayoutRule>,
    },
    // Signals to the platform layer that all initial UI description commands
    // for the main window have been enqueued.
    SignalMainWindowUISetupComplete {
        window_id: WindowId,
    },
    SetInputText {
        window_id: WindowId,
        control_id: ControlId,
        text: String,
    },
    AppendLogLine {
        window_id: WindowId,
        control_id: ControlId,
        line: String,
    },
    SetControlEnabled {
        window_id: WindowId,
        control_id: ControlId,
        enabled: bool,
    },
    ShowMessageBox {
        window_id: WindowId,
        title: String,
        text: String,
        severity: MessageSeverity,
    },
    // Yes/No question; answered with `AppEvent::ConfirmationDialogCompleted`.
    ShowConfirmation {
        window_id: WindowId,
        title: String,
        text: String,
    },
    ShowOpenFileDialog {
        window_id: WindowId,
        title: String,
        filter_spec: String,
        initial_dir: Option<PathBuf>,
    },
    ShowSaveFileDialog {
        window_id: WindowId,
        title: String,
        default_filename: String,
        filter_spec: String,
        initial_dir: Option<PathBuf>,
    },
    ShowFolderPickerDialog {
        window_id: WindowId,
        title: String,
        initial_dir: Option<PathBuf>,
    },
    // Starts or stops the periodic `PollTimerTick` for the window.
    SetPollTimer {
        window_id: WindowId,
        active: bool,
    },
}

// --- Trait for App Logic to Handle Events ---

// A trait to be implemented by the application logic layer to handle UI events.
//
// The handler owns channel receivers for running children, which are not
// `Sync`, so only `Send` is required. The platform layer keeps it behind a
// `Mutex`.
pub trait PlatformEventHandler: Send + 'static {
    // Called by the platform layer when a native UI event has been processed.
    // The implementor should handle the event and enqueue `PlatformCommand`s
    // for the platform layer to execute.
    fn handle_event(&mut self, event: AppEvent);

    // Called by the platform layer when the application is about to exit its main loop.
    fn on_quit(&mut self) {}

    // Attempts to dequeue a single `PlatformCommand` from the internal queue.
    // This is called by the platform layer's run loop.
    fn try_dequeue_command(&mut self) -> Option<PlatformCommand>;
}
