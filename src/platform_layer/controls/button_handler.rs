/*
 * Encapsulates Win32-specific operations for BUTTON-class controls: push
 * buttons (Sign App, Browse, ...) and auto checkboxes (the signing options).
 * Both report clicks through BN_CLICKED; the window data remembers which IDs
 * are checkboxes so the click can be reported with the new check state.
 */

use crate::platform_layer::app::Win32ApiInternalState;
use crate::platform_layer::error::Result as PlatformResult;
use crate::platform_layer::types::{AppEvent, ControlId, WindowId};
use crate::platform_layer::window_common::{self, WC_BUTTON};

use std::sync::Arc;
use windows::Win32::{
    Foundation::{HWND, LPARAM, WPARAM},
    UI::{
        Controls::{BST_CHECKED, BST_UNCHECKED},
        WindowsAndMessaging::{
            BM_GETCHECK, BM_SETCHECK, BS_AUTOCHECKBOX, BS_PUSHBUTTON, CreateWindowExW, HMENU,
            SendMessageW, WINDOW_EX_STYLE, WINDOW_STYLE, WS_CHILD, WS_TABSTOP, WS_VISIBLE,
        },
    },
};
use windows::core::HSTRING;

// Creates the native BUTTON and registers it; returns the new handle.
fn create_button_window(
    internal_state: &Arc<Win32ApiInternalState>,
    window_id: WindowId,
    parent_control_id: Option<ControlId>,
    control_id: ControlId,
    text: &str,
    button_style: i32,
    is_checkbox: bool,
) -> PlatformResult<HWND> {
    internal_state.with_window_data_write(window_id, |window_data| {
        window_data.ensure_control_absent(control_id)?;
        let hwnd_parent = window_data.parent_hwnd_for(parent_control_id)?;

        let hwnd_button = unsafe {
            CreateWindowExW(
                WINDOW_EX_STYLE(0),
                WC_BUTTON,
                &HSTRING::from(text),
                WS_CHILD | WS_VISIBLE | WS_TABSTOP | WINDOW_STYLE(button_style as u32),
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
        window_data.register_control_hwnd(control_id, hwnd_button);
        if is_checkbox {
            window_data.register_checkbox(control_id);
        }
        Ok(hwnd_button)
    })
}

pub(crate) fn handle_create_button_command(
    internal_state: &Arc<Win32ApiInternalState>,
    window_id: WindowId,
    parent_control_id: Option<ControlId>,
    control_id: ControlId,
    text: String,
) -> PlatformResult<()> {
    let hwnd_button = create_button_window(
        internal_state,
        window_id,
        parent_control_id,
        control_id,
        &text,
        BS_PUSHBUTTON,
        false,
    )?;
    window_common::apply_default_font(hwnd_button);
    log::trace!(
        "ButtonHandler: Button '{text}' ({}) created in {window_id:?}.",
        control_id.raw()
    );
    Ok(())
}

pub(crate) fn handle_create_checkbox_command(
    internal_state: &Arc<Win32ApiInternalState>,
    window_id: WindowId,
    parent_control_id: Option<ControlId>,
    control_id: ControlId,
    text: String,
    checked: bool,
) -> PlatformResult<()> {
    let hwnd_checkbox = create_button_window(
        internal_state,
        window_id,
        parent_control_id,
        control_id,
        &text,
        BS_AUTOCHECKBOX,
        true,
    )?;
    window_common::apply_default_font(hwnd_checkbox);
    let state = if checked { BST_CHECKED } else { BST_UNCHECKED };
    unsafe {
        SendMessageW(
            hwnd_checkbox,
            BM_SETCHECK,
            Some(WPARAM(state.0 as usize)),
            Some(LPARAM(0)),
        );
    }
    log::trace!(
        "ButtonHandler: Checkbox '{text}' ({}) created in {window_id:?}, checked: {checked}.",
        control_id.raw()
    );
    Ok(())
}

/*
 * Translates BN_CLICKED into an `AppEvent`. Auto checkboxes have already
 * flipped their state when the notification arrives, so the reported state
 * is the new one.
 */
pub(crate) fn handle_bn_clicked(
    internal_state: &Arc<Win32ApiInternalState>,
    window_id: WindowId,
    control_id: ControlId,
    hwnd_control: HWND,
) -> AppEvent {
    let is_checkbox = internal_state
        .with_window_data_read(window_id, |window_data| {
            Ok(window_data.is_checkbox(control_id))
        })
        .unwrap_or(false);

    if is_checkbox {
        let state = unsafe { SendMessageW(hwnd_control, BM_GETCHECK, None, None) };
        let checked = state.0 as u32 == BST_CHECKED.0;
        log::trace!(
            "ButtonHandler: Checkbox {} toggled to {checked}.",
            control_id.raw()
        );
        AppEvent::CheckboxToggled {
            window_id,
            control_id,
            checked,
        }
    } else {
        log::trace!("ButtonHandler: Button {} clicked.", control_id.raw());
        AppEvent::ButtonClicked {
            window_id,
            control_id,
        }
    }
}
