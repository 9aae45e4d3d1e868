/*
 * Handles EDIT controls: the single-line path and text fields, the masked
 * password field and the read-only log view.
 *
 * Text is always set with the window map unlocked, since SetWindowTextW and
 * EM_REPLACESEL synchronously send EN_CHANGE back to the window procedure.
 */

use crate::platform_layer::app::Win32ApiInternalState;
use crate::platform_layer::error::{PlatformError, Result as PlatformResult};
use crate::platform_layer::types::{AppEvent, ControlId, InputKind, WindowId};
use crate::platform_layer::window_common::{self, WC_EDIT};

use std::sync::Arc;
use windows::Win32::{
    Foundation::{HWND, LPARAM, WPARAM},
    UI::WindowsAndMessaging::{
        CreateWindowExW, EM_REPLACESEL, EM_SETLIMITTEXT, EM_SETSEL, ES_AUTOHSCROLL,
        ES_AUTOVSCROLL, ES_MULTILINE, ES_PASSWORD, ES_READONLY, GetWindowTextLengthW,
        GetWindowTextW, HMENU, SendMessageW, SetWindowTextW, WINDOW_STYLE, WS_CHILD,
        WS_EX_CLIENTEDGE, WS_TABSTOP, WS_VISIBLE, WS_VSCROLL,
    },
};
use windows::core::{HSTRING, PCWSTR};

fn style_for_kind(kind: InputKind) -> WINDOW_STYLE {
    let base = WS_CHILD | WS_VISIBLE;
    match kind {
        InputKind::SingleLine => base | WS_TABSTOP | WINDOW_STYLE(ES_AUTOHSCROLL as u32),
        InputKind::Password => {
            base | WS_TABSTOP | WINDOW_STYLE((ES_AUTOHSCROLL | ES_PASSWORD) as u32)
        }
        InputKind::Log => {
            base | WS_VSCROLL
                | WINDOW_STYLE((ES_MULTILINE | ES_READONLY | ES_AUTOVSCROLL) as u32)
        }
    }
}

// Multi-line edits need CRLF line breaks.
fn log_line_for_edit(line: &str) -> String {
    let mut text = line.trim_end_matches(['\r', '\n']).replace("\r\n", "\n").replace('\n', "\r\n");
    text.push_str("\r\n");
    text
}

fn control_hwnd(
    internal_state: &Arc<Win32ApiInternalState>,
    window_id: WindowId,
    control_id: ControlId,
) -> PlatformResult<HWND> {
    internal_state.with_window_data_read(window_id, |window_data| {
        window_data.get_control_hwnd(control_id).ok_or_else(|| {
            PlatformError::InvalidHandle(format!(
                "Input {} not found in {window_id:?}",
                control_id.raw()
            ))
        })
    })
}

pub(crate) fn handle_create_input_command(
    internal_state: &Arc<Win32ApiInternalState>,
    window_id: WindowId,
    parent_control_id: Option<ControlId>,
    control_id: ControlId,
    initial_text: String,
    kind: InputKind,
) -> PlatformResult<()> {
    let hwnd_edit = internal_state.with_window_data_write(window_id, |window_data| {
        window_data.ensure_control_absent(control_id)?;
        let hwnd_parent = window_data.parent_hwnd_for(parent_control_id)?;

        let hwnd_edit = unsafe {
            CreateWindowExW(
                WS_EX_CLIENTEDGE,
                WC_EDIT,
                None,
                style_for_kind(kind),
                0,
                0,
                0,
                0,
                Some(hwnd_parent),
                Some(HMENU(control_id.raw() as *mut _)),
                Some(internal_state.h_instance()),
                None,
            )?
        };
        window_data.register_control_hwnd(control_id, hwnd_edit);
        window_data.register_input_kind(control_id, kind);
        Ok(hwnd_edit)
    })?;

    window_common::apply_default_font(hwnd_edit);
    if kind == InputKind::Log {
        // Lift the default 32K character cap; long signing runs exceed it.
        unsafe {
            SendMessageW(hwnd_edit, EM_SETLIMITTEXT, Some(WPARAM(0)), Some(LPARAM(0)));
        }
    }
    if !initial_text.is_empty() {
        unsafe { SetWindowTextW(hwnd_edit, &HSTRING::from(initial_text.as_str()))? };
    }
    log::trace!(
        "InputHandler: {kind:?} input {} created in {window_id:?}.",
        control_id.raw()
    );
    Ok(())
}

pub(crate) fn handle_set_input_text_command(
    internal_state: &Arc<Win32ApiInternalState>,
    window_id: WindowId,
    control_id: ControlId,
    text: String,
) -> PlatformResult<()> {
    let hwnd_edit = control_hwnd(internal_state, window_id, control_id)?;
    unsafe { SetWindowTextW(hwnd_edit, &HSTRING::from(text.as_str()))? };
    Ok(())
}

/*
 * Appends one line at the end of the log view. Moving the caret to the end
 * before replacing the (empty) selection keeps the view scrolled to the
 * newest output.
 */
pub(crate) fn handle_append_log_line_command(
    internal_state: &Arc<Win32ApiInternalState>,
    window_id: WindowId,
    control_id: ControlId,
    line: String,
) -> PlatformResult<()> {
    let hwnd_edit = control_hwnd(internal_state, window_id, control_id)?;
    let text = HSTRING::from(log_line_for_edit(&line));
    unsafe {
        let end = GetWindowTextLengthW(hwnd_edit).max(0) as usize;
        SendMessageW(hwnd_edit, EM_SETSEL, Some(WPARAM(end)), Some(LPARAM(end as isize)));
        SendMessageW(
            hwnd_edit,
            EM_REPLACESEL,
            Some(WPARAM(0)),
            Some(LPARAM(PCWSTR(text.as_ptr()).0 as isize)),
        );
    }
    Ok(())
}

/*
 * Translates EN_CHANGE into `AppEvent::InputTextChanged` carrying the full
 * text of the control. Changes of the log view are not reported.
 */
pub(crate) fn handle_en_change(
    internal_state: &Arc<Win32ApiInternalState>,
    window_id: WindowId,
    control_id: ControlId,
    hwnd_control: HWND,
) -> Option<AppEvent> {
    let kind = internal_state
        .with_window_data_read(window_id, |window_data| Ok(window_data.input_kind(control_id)))
        .ok()
        .flatten()?;
    if kind == InputKind::Log {
        return None;
    }

    let text = unsafe {
        let length = GetWindowTextLengthW(hwnd_control).max(0) as usize;
        let mut buffer = vec![0u16; length + 1];
        let copied = GetWindowTextW(hwnd_control, &mut buffer).max(0) as usize;
        String::from_utf16_lossy(&buffer[..copied])
    };
    Some(AppEvent::InputTextChanged {
        window_id,
        control_id,
        text,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_lines_get_crlf_endings() {
        // Act & Assert
        assert_eq!(log_line_for_edit("Signing..."), "Signing...\r\n");
        assert_eq!(log_line_for_edit("done\n"), "done\r\n");
        assert_eq!(log_line_for_edit("a\nb"), "a\r\nb\r\n");
        assert_eq!(log_line_for_edit(""), "\r\n");
    }

    #[test]
    fn test_password_style_masks_and_log_style_is_read_only() {
        // Act
        let password = style_for_kind(InputKind::Password).0;
        let log_view = style_for_kind(InputKind::Log).0;
        let single = style_for_kind(InputKind::SingleLine).0;

        // Assert
        assert_ne!(password & ES_PASSWORD as u32, 0);
        assert_eq!(single & ES_PASSWORD as u32, 0);
        assert_ne!(log_view & ES_READONLY as u32, 0);
        assert_ne!(log_view & ES_MULTILINE as u32, 0);
        assert_eq!(log_view & WS_TABSTOP.0, 0);
    }
}
