/*
 * Creation of the static field captions and the "Advanced Options" heading.
 * Labels are vertically centered in their row so they line up with the
 * edit beside them.
 */

use crate::platform_layer::{
    app::Win32ApiInternalState,
    error::Result as PlatformResult,
    types::{ControlId, WindowId},
    window_common::{self, SS_CENTERIMAGE, SS_LEFT, WC_STATIC},
};

use std::sync::Arc;
use windows::{
    Win32::UI::WindowsAndMessaging::{CreateWindowExW, HMENU, WINDOW_EX_STYLE, WS_CHILD, WS_VISIBLE},
    core::HSTRING,
};

pub(crate) fn handle_create_label_command(
    internal_state: &Arc<Win32ApiInternalState>,
    window_id: WindowId,
    parent_control_id: Option<ControlId>,
    label_id: ControlId,
    text: String,
) -> PlatformResult<()> {
    let hwnd_label = internal_state.with_window_data_write(window_id, |window_data| {
        window_data.ensure_control_absent(label_id)?;
        let hwnd_parent = window_data.parent_hwnd_for(parent_control_id)?;

        let hwnd_label = unsafe {
            CreateWindowExW(
                WINDOW_EX_STYLE(0),
                WC_STATIC,
                &HSTRING::from(text.as_str()),
                WS_CHILD | WS_VISIBLE | SS_LEFT | SS_CENTERIMAGE,
                0,
                0,
                0,
                0,
                Some(hwnd_parent),
                Some(HMENU(label_id.raw() as *mut _)),
                Some(internal_state.h_instance()),
                None,
            )?
        };
        window_data.register_control_hwnd(label_id, hwnd_label);
        Ok(hwnd_label)
    })?;

    window_common::apply_default_font(hwnd_label);
    log::trace!(
        "LabelHandler: Label '{text}' ({}) created in {window_id:?}.",
        label_id.raw()
    );
    Ok(())
}
