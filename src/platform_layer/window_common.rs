/*
 * Shared Win32 window plumbing: the per-window `NativeWindowData`, window
 * class registration, native window creation, the static window procedure
 * router and the translation of window messages into `AppEvent`s.
 *
 * Locks on the window map are never held across Win32 calls that can send
 * messages back into the window procedure (SetWindowTextW, MoveWindow and
 * friends); handles are copied out first.
 */

use super::app::Win32ApiInternalState;
use super::controls::{button_handler, input_handler};
use super::error::{PlatformError, Result as PlatformResult};
use super::layout;
use super::types::{AppEvent, ControlId, InputKind, LayoutRule, WindowId};

use std::collections::HashMap;
use std::ffi::c_void;
use std::sync::Arc;

use windows::{
    Win32::{
        Foundation::{HWND, LPARAM, LRESULT, RECT, WPARAM},
        Graphics::Gdi::{COLOR_BTNFACE, DEFAULT_GUI_FONT, GetStockObject, HBRUSH},
        UI::WindowsAndMessaging::*,
    },
    core::{HSTRING, PCWSTR, w},
};

pub(crate) const WC_STATIC: PCWSTR = w!("STATIC");
pub(crate) const WC_BUTTON: PCWSTR = w!("BUTTON");
pub(crate) const WC_EDIT: PCWSTR = w!("EDIT");
pub(crate) const SS_LEFT: WINDOW_STYLE = WINDOW_STYLE(0);
pub(crate) const SS_CENTERIMAGE: WINDOW_STYLE = WINDOW_STYLE(0x0200);

// Timer driving `AppEvent::PollTimerTick` while a child process runs.
pub(crate) const POLL_TIMER_ID: usize = 1;
pub(crate) const POLL_INTERVAL_MS: u32 = 100;

/*
 * Holds native data associated with a specific window managed by the platform
 * layer: the window handle, the logical-ID-to-HWND map for its controls, and
 * the layout rules applied on every resize.
 */
#[derive(Debug)]
pub(crate) struct NativeWindowData {
    this_window_hwnd: HWND,
    logical_window_id: WindowId,
    control_hwnd_map: HashMap<ControlId, HWND>,
    layout_rules: Option<Vec<LayoutRule>>,
    // BN_CLICKED is shared by push buttons and checkboxes.
    checkbox_ids: Vec<ControlId>,
    input_kinds: HashMap<ControlId, InputKind>,
}

impl NativeWindowData {
    pub(crate) fn new(logical_window_id: WindowId) -> Self {
        NativeWindowData {
            this_window_hwnd: HWND(std::ptr::null_mut()),
            logical_window_id,
            control_hwnd_map: HashMap::new(),
            layout_rules: None,
            checkbox_ids: Vec::new(),
            input_kinds: HashMap::new(),
        }
    }

    pub(crate) fn get_hwnd(&self) -> HWND {
        self.this_window_hwnd
    }

    pub(crate) fn set_hwnd(&mut self, hwnd: HWND) {
        self.this_window_hwnd = hwnd;
    }

    pub(crate) fn has_control(&self, control_id: ControlId) -> bool {
        self.control_hwnd_map.contains_key(&control_id)
    }

    pub(crate) fn get_control_hwnd(&self, control_id: ControlId) -> Option<HWND> {
        self.control_hwnd_map.get(&control_id).copied()
    }

    pub(crate) fn register_control_hwnd(&mut self, control_id: ControlId, hwnd: HWND) {
        self.control_hwnd_map.insert(control_id, hwnd);
    }

    // Fails if a control with this logical ID was already created.
    pub(crate) fn ensure_control_absent(&self, control_id: ControlId) -> PlatformResult<()> {
        if self.has_control(control_id) {
            log::warn!(
                "WindowCommon: Control {} already exists in {:?}.",
                control_id.raw(),
                self.logical_window_id
            );
            return Err(PlatformError::OperationFailed(format!(
                "Control with logical ID {} already exists in {:?}",
                control_id.raw(),
                self.logical_window_id
            )));
        }
        Ok(())
    }

    /*
     * The native parent for a new control: the named panel, or the window
     * itself when no parent is given.
     */
    pub(crate) fn parent_hwnd_for(&self, parent_control_id: Option<ControlId>) -> PlatformResult<HWND> {
        let hwnd_parent = match parent_control_id {
            Some(id) => self.get_control_hwnd(id).ok_or_else(|| {
                PlatformError::InvalidHandle(format!(
                    "Parent control {} not found in {:?}",
                    id.raw(),
                    self.logical_window_id
                ))
            })?,
            None => self.this_window_hwnd,
        };
        if hwnd_parent.is_invalid() {
            return Err(PlatformError::InvalidHandle(format!(
                "Parent of new control in {:?} has no native handle",
                self.logical_window_id
            )));
        }
        Ok(hwnd_parent)
    }

    pub(crate) fn register_checkbox(&mut self, control_id: ControlId) {
        if !self.checkbox_ids.contains(&control_id) {
            self.checkbox_ids.push(control_id);
        }
    }

    pub(crate) fn is_checkbox(&self, control_id: ControlId) -> bool {
        self.checkbox_ids.contains(&control_id)
    }

    pub(crate) fn register_input_kind(&mut self, control_id: ControlId, kind: InputKind) {
        self.input_kinds.insert(control_id, kind);
    }

    pub(crate) fn input_kind(&self, control_id: ControlId) -> Option<InputKind> {
        self.input_kinds.get(&control_id).copied()
    }

    pub(crate) fn set_layout_rules(&mut self, rules: Vec<LayoutRule>) {
        self.layout_rules = Some(rules);
    }

    /*
     * Resolves the layout rules against a client size into native handles and
     * rectangles. Rules naming controls that were never created are skipped
     * with a warning.
     */
    fn placements_for(&self, width: i32, height: i32) -> Vec<(HWND, layout::LayoutRect)> {
        let Some(rules) = self.layout_rules.as_ref() else {
            return Vec::new();
        };
        layout::calculate_layout(rules, width, height)
            .into_iter()
            .filter_map(|(control_id, rect)| match self.get_control_hwnd(control_id) {
                Some(hwnd) => Some((hwnd, rect)),
                None => {
                    log::warn!(
                        "WindowCommon: Layout rule for unknown control {} in {:?}.",
                        control_id.raw(),
                        self.logical_window_id
                    );
                    None
                }
            })
            .collect()
    }
}

/*
 * Context passed to `CreateWindowExW` via `lpCreateParams`. This allows the
 * static `WndProc` to retrieve the `Arc`-ed state for the specific window
 * instance being created.
 */
struct WindowCreationContext {
    internal_state_arc: Arc<Win32ApiInternalState>,
    window_id: WindowId,
}

fn window_class_name(internal_state: &Win32ApiInternalState) -> HSTRING {
    HSTRING::from(format!(
        "{}_PlatformWindowClass",
        internal_state.app_name_for_class()
    ))
}

/*
 * Registers the main window class for the application. Called once during
 * platform initialization, before any windows are created.
 */
pub(crate) fn register_window_class(
    internal_state: &Arc<Win32ApiInternalState>,
) -> PlatformResult<()> {
    let class_name = window_class_name(internal_state);
    let class_name_pcwstr = PCWSTR(class_name.as_ptr());
    let h_instance = internal_state.h_instance();

    unsafe {
        let mut wc_test = WNDCLASSEXW::default();
        if GetClassInfoExW(Some(h_instance), class_name_pcwstr, &mut wc_test).is_ok() {
            log::debug!("WindowCommon: Window class already registered.");
            return Ok(());
        }

        let wc = WNDCLASSEXW {
            cbSize: std::mem::size_of::<WNDCLASSEXW>() as u32,
            style: CS_HREDRAW | CS_VREDRAW,
            lpfnWndProc: Some(facade_wnd_proc_router),
            cbClsExtra: 0,
            cbWndExtra: 0,
            hInstance: h_instance,
            hIcon: LoadIconW(None, IDI_APPLICATION)?,
            hCursor: LoadCursorW(None, IDC_ARROW)?,
            hbrBackground: HBRUSH((COLOR_BTNFACE.0 + 1) as *mut c_void),
            lpszMenuName: PCWSTR::null(),
            lpszClassName: class_name_pcwstr,
            hIconSm: LoadIconW(None, IDI_APPLICATION)?,
        };

        if RegisterClassExW(&wc) == 0 {
            let error = windows::core::Error::from_win32();
            log::error!("WindowCommon: RegisterClassExW failed: {error:?}");
            return Err(PlatformError::InitializationFailed(format!(
                "RegisterClassExW failed: {error}"
            )));
        }
    }
    log::debug!("WindowCommon: Window class registered.");
    Ok(())
}

/*
 * Creates a native top-level window. The `WindowCreationContext` handed to
 * `CreateWindowExW` is reclaimed by the router on `WM_NCDESTROY`.
 */
pub(crate) fn create_native_window(
    internal_state_arc: &Arc<Win32ApiInternalState>,
    window_id: WindowId,
    title: &str,
    width: i32,
    height: i32,
) -> PlatformResult<HWND> {
    let class_name = window_class_name(internal_state_arc);
    let creation_context = Box::into_raw(Box::new(WindowCreationContext {
        internal_state_arc: Arc::clone(internal_state_arc),
        window_id,
    }));

    let result = unsafe {
        CreateWindowExW(
            WINDOW_EX_STYLE::default(),
            &class_name,
            &HSTRING::from(title),
            WS_OVERLAPPEDWINDOW,
            CW_USEDEFAULT,
            CW_USEDEFAULT,
            width,
            height,
            None,
            None,
            Some(internal_state_arc.h_instance()),
            Some(creation_context as *const c_void),
        )
    };

    match result {
        Ok(hwnd) => Ok(hwnd),
        Err(e) => {
            // The context is not freed here: if WM_NCCREATE ran, WM_NCDESTROY
            // already reclaimed it.
            log::error!("WindowCommon: CreateWindowExW failed for {window_id:?}: {e:?}");
            Err(PlatformError::WindowCreationFailed(format!(
                "CreateWindowExW failed: {e}"
            )))
        }
    }
}

/*
 * The window procedure router for all windows created by this platform
 * layer. It retrieves the per-window `WindowCreationContext` from
 * GWLP_USERDATA and delegates to `Win32ApiInternalState::handle_window_message`.
 */
unsafe extern "system" fn facade_wnd_proc_router(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    let context_ptr = if msg == WM_NCCREATE {
        let create_struct = unsafe { &*(lparam.0 as *const CREATESTRUCTW) };
        let context_raw_ptr = create_struct.lpCreateParams as *mut WindowCreationContext;
        unsafe { SetWindowLongPtrW(hwnd, GWLP_USERDATA, context_raw_ptr as isize) };
        context_raw_ptr
    } else {
        unsafe { GetWindowLongPtrW(hwnd, GWLP_USERDATA) as *mut WindowCreationContext }
    };

    if context_ptr.is_null() {
        return unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) };
    }

    let context = unsafe { &*context_ptr };
    let internal_state_arc = Arc::clone(&context.internal_state_arc);
    let window_id = context.window_id;

    let result = internal_state_arc.handle_window_message(hwnd, msg, wparam, lparam, window_id);

    if msg == WM_NCDESTROY {
        unsafe { SetWindowLongPtrW(hwnd, GWLP_USERDATA, 0) };
        drop(unsafe { Box::from_raw(context_ptr) });
    }

    result
}

// Extracts the low-order 16-bit value from an LPARAM.
#[inline]
pub(crate) fn loword_from_lparam(lparam: LPARAM) -> i32 {
    (lparam.0 & 0xFFFF) as i32
}

// Extracts the high-order 16-bit value (from the lower 32 bits) of an LPARAM.
#[inline]
pub(crate) fn hiword_from_lparam(lparam: LPARAM) -> i32 {
    ((lparam.0 >> 16) & 0xFFFF) as i32
}

#[inline]
fn loword_from_wparam(wparam: WPARAM) -> i32 {
    (wparam.0 & 0xFFFF) as i32
}

#[inline]
fn hiword_from_wparam(wparam: WPARAM) -> u32 {
    ((wparam.0 >> 16) & 0xFFFF) as u32
}

// Gives a freshly created control the regular dialog font instead of the system font.
pub(crate) fn apply_default_font(hwnd: HWND) {
    unsafe {
        let font = GetStockObject(DEFAULT_GUI_FONT);
        SendMessageW(
            hwnd,
            WM_SETFONT,
            Some(WPARAM(font.0 as usize)),
            Some(LPARAM(1)),
        );
    }
}

/*
 * Moves every laid-out control of a window to the rectangle computed for
 * the given client size. The window map is only read to collect handles.
 */
pub(crate) fn apply_layout(
    internal_state: &Arc<Win32ApiInternalState>,
    window_id: WindowId,
    width: i32,
    height: i32,
) -> PlatformResult<()> {
    let placements = internal_state.with_window_data_read(window_id, |window_data| {
        Ok(window_data.placements_for(width, height))
    })?;
    log::trace!(
        "WindowCommon: Applying {} placements for {window_id:?} at {width}x{height}.",
        placements.len()
    );
    for (hwnd, rect) in placements {
        if let Err(e) =
            unsafe { MoveWindow(hwnd, rect.x, rect.y, rect.width, rect.height, true) }
        {
            log::warn!("WindowCommon: MoveWindow failed for {hwnd:?}: {e:?}");
        }
    }
    Ok(())
}

// Lays a window out again using its current client rectangle.
pub(crate) fn relayout(
    internal_state: &Arc<Win32ApiInternalState>,
    window_id: WindowId,
) -> PlatformResult<()> {
    let hwnd = internal_state.with_window_data_read(window_id, |window_data| {
        Ok(window_data.get_hwnd())
    })?;
    if hwnd.is_invalid() {
        return Ok(());
    }
    let mut client_rect = RECT::default();
    unsafe { GetClientRect(hwnd, &mut client_rect)? };
    apply_layout(
        internal_state,
        window_id,
        client_rect.right - client_rect.left,
        client_rect.bottom - client_rect.top,
    )
}

impl Win32ApiInternalState {
    /*
     * Translates a window message into an optional `AppEvent`, sends it to
     * the application and returns the message result.
     */
    fn handle_window_message(
        self: &Arc<Self>,
        hwnd: HWND,
        msg: u32,
        wparam: WPARAM,
        lparam: LPARAM,
        window_id: WindowId,
    ) -> LRESULT {
        let mut event: Option<AppEvent> = None;
        let mut handled = false;

        match msg {
            WM_COMMAND => {
                let control_id = ControlId::new(loword_from_wparam(wparam));
                let notification = hiword_from_wparam(wparam);
                let hwnd_control = HWND(lparam.0 as *mut c_void);
                if !hwnd_control.is_invalid() {
                    event = match notification {
                        BN_CLICKED => Some(button_handler::handle_bn_clicked(
                            self,
                            window_id,
                            control_id,
                            hwnd_control,
                        )),
                        EN_CHANGE => input_handler::handle_en_change(
                            self,
                            window_id,
                            control_id,
                            hwnd_control,
                        ),
                        _ => None,
                    };
                    handled = true;
                }
            }
            WM_TIMER => {
                if wparam.0 == POLL_TIMER_ID {
                    event = Some(AppEvent::PollTimerTick { window_id });
                    handled = true;
                }
            }
            WM_SIZE => {
                let width = loword_from_lparam(lparam);
                let height = hiword_from_lparam(lparam);
                if let Err(e) = apply_layout(self, window_id, width, height) {
                    log::debug!("WindowCommon: Layout skipped for {window_id:?}: {e}");
                }
                handled = true;
            }
            WM_GETMINMAXINFO => {
                let info = unsafe { &mut *(lparam.0 as *mut MINMAXINFO) };
                info.ptMinTrackSize.x = 640;
                info.ptMinTrackSize.y = 560;
                handled = true;
            }
            WM_CLOSE => {
                log::debug!("WindowCommon: WM_CLOSE for {window_id:?}.");
                // Destruction happens when the application answers with CloseWindow.
                self.send_event(AppEvent::WindowCloseRequestedByUser { window_id });
                return LRESULT(0);
            }
            WM_DESTROY => {
                log::debug!("WindowCommon: WM_DESTROY for {window_id:?}.");
                unsafe {
                    let _ = KillTimer(Some(hwnd), POLL_TIMER_ID);
                }
                self.remove_window_data(window_id);
                event = Some(AppEvent::WindowDestroyed { window_id });
                handled = true;
            }
            _ => {}
        }

        if let Some(event) = event {
            self.send_event(event);
        }
        if handled {
            return LRESULT(0);
        }
        unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lparam_words() {
        // Arrange
        let lparam = LPARAM((600 << 16) | 800);

        // Act & Assert
        assert_eq!(loword_from_lparam(lparam), 800);
        assert_eq!(hiword_from_lparam(lparam), 600);
    }

    #[test]
    fn test_wparam_splits_control_id_and_notification() {
        // Arrange
        let wparam = WPARAM(((EN_CHANGE as usize) << 16) | 1201);

        // Act & Assert
        assert_eq!(loword_from_wparam(wparam), 1201);
        assert_eq!(hiword_from_wparam(wparam), EN_CHANGE);
    }

    #[test]
    fn test_native_window_data_tracks_controls_and_kinds() {
        // Arrange
        let mut data = NativeWindowData::new(WindowId::new_for_test(1));
        let checkbox = ControlId::new(1501);
        let log_view = ControlId::new(1701);

        // Act
        data.register_control_hwnd(checkbox, HWND(0x10 as *mut c_void));
        data.register_checkbox(checkbox);
        data.register_input_kind(log_view, InputKind::Log);

        // Assert
        assert!(data.has_control(checkbox));
        assert!(data.is_checkbox(checkbox));
        assert!(!data.is_checkbox(log_view));
        assert_eq!(data.input_kind(log_view), Some(InputKind::Log));
        assert!(data.placements_for(100, 100).is_empty());
    }

    #[test]
    fn test_parent_resolution_and_duplicate_check() {
        // Arrange
        let mut data = NativeWindowData::new(WindowId::new_for_test(2));
        let panel = ControlId::new(1001);
        let panel_hwnd = HWND(0x20 as *mut c_void);

        // Act & Assert: no native window yet
        assert!(matches!(
            data.parent_hwnd_for(None),
            Err(PlatformError::InvalidHandle(_))
        ));

        data.set_hwnd(HWND(0x30 as *mut c_void));
        data.register_control_hwnd(panel, panel_hwnd);

        assert_eq!(data.parent_hwnd_for(Some(panel)).ok(), Some(panel_hwnd));
        assert!(data.parent_hwnd_for(Some(ControlId::new(9999))).is_err());
        assert!(data.ensure_control_absent(panel).is_err());
        assert!(data.ensure_control_absent(ControlId::new(1002)).is_ok());
    }
}
