/*
 * Row and action-bar containers. A panel is a STATIC window whose procedure
 * is subclassed so that notifications from the edits, buttons and checkboxes
 * it holds reach the main window procedure unchanged.
 */

use crate::platform_layer::app::Win32ApiInternalState;
use crate::platform_layer::error::Result as PlatformResult;
use crate::platform_layer::types::{ControlId, WindowId};
use crate::platform_layer::window_common::WC_STATIC;

use std::sync::Arc;
use windows::Win32::{
    Foundation::{HWND, LPARAM, LRESULT, WPARAM},
    UI::WindowsAndMessaging::{
        CallWindowProcW, CreateWindowExW, DefWindowProcW, GWLP_USERDATA, GWLP_WNDPROC, GetParent,
        GetWindowLongPtrW, HMENU, SendMessageW, SetWindowLongPtrW, WINDOW_EX_STYLE, WM_COMMAND,
        WM_CTLCOLOREDIT, WM_CTLCOLORSTATIC, WNDPROC, WS_CHILD, WS_CLIPCHILDREN, WS_VISIBLE,
    },
};

fn is_forwarded(msg: u32) -> bool {
    matches!(msg, WM_COMMAND | WM_CTLCOLOREDIT | WM_CTLCOLORSTATIC)
}

// The STATIC class procedure is kept in GWLP_USERDATA.
unsafe extern "system" fn forwarding_panel_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    unsafe {
        if is_forwarded(msg) {
            if let Ok(parent) = GetParent(hwnd) {
                return SendMessageW(parent, msg, Some(wparam), Some(lparam));
            }
        }
        match GetWindowLongPtrW(hwnd, GWLP_USERDATA) {
            0 => DefWindowProcW(hwnd, msg, wparam, lparam),
            original => {
                let original_proc: WNDPROC = std::mem::transmute(original);
                CallWindowProcW(original_proc, hwnd, msg, wparam, lparam)
            }
        }
    }
}

pub(crate) fn handle_create_panel_command(
    internal_state: &Arc<Win32ApiInternalState>,
    window_id: WindowId,
    parent_control_id: Option<ControlId>,
    panel_id: ControlId,
) -> PlatformResult<()> {
    internal_state.with_window_data_write(window_id, |window_data| {
        window_data.ensure_control_absent(panel_id)?;
        let hwnd_parent = window_data.parent_hwnd_for(parent_control_id)?;

        let hwnd_panel = unsafe {
            CreateWindowExW(
                WINDOW_EX_STYLE(0),
                WC_STATIC,
                None,
                WS_CHILD | WS_VISIBLE | WS_CLIPCHILDREN,
                0,
                0,
                0,
                0,
                Some(hwnd_parent),
                Some(HMENU(panel_id.raw() as *mut _)),
                Some(internal_state.h_instance()),
                None,
            )?
        };

        unsafe {
            #[allow(clippy::fn_to_numeric_cast)]
            let original = SetWindowLongPtrW(hwnd_panel, GWLP_WNDPROC, forwarding_panel_proc as isize);
            SetWindowLongPtrW(hwnd_panel, GWLP_USERDATA, original);
        }

        window_data.register_control_hwnd(panel_id, hwnd_panel);
        log::trace!(
            "PanelHandler: Panel {} created in {window_id:?} as {hwnd_panel:?}.",
            panel_id.raw()
        );
        Ok(())
    })
}
