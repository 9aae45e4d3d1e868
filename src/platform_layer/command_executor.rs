/*
 * This module is responsible for executing the window-level `PlatformCommand`s.
 * Control creation and dialogs live in the `controls` handlers; what remains
 * here are the operations on a whole window (show, close, layout, timers) and
 * on the application (quit).
 */

use super::app::Win32ApiInternalState;
use super::error::{PlatformError, Result as PlatformResult};
use super::types::{AppEvent, ControlId, LayoutRule, WindowId};
use super::window_common::{self, POLL_INTERVAL_MS, POLL_TIMER_ID};

use std::sync::Arc;
use windows::Win32::{
    Foundation::HWND,
    Graphics::Gdi::UpdateWindow,
    UI::{
        Input::KeyboardAndMouse::EnableWindow,
        WindowsAndMessaging::{
            DestroyWindow, KillTimer, PostQuitMessage, SW_SHOW, SetTimer, ShowWindow,
        },
    },
};

fn window_hwnd(
    internal_state: &Arc<Win32ApiInternalState>,
    window_id: WindowId,
) -> PlatformResult<HWND> {
    let hwnd = internal_state.with_window_data_read(window_id, |window_data| {
        Ok(window_data.get_hwnd())
    })?;
    if hwnd.is_invalid() {
        return Err(PlatformError::InvalidHandle(format!(
            "WindowId {window_id:?} has no native window yet"
        )));
    }
    Ok(hwnd)
}

pub(crate) fn execute_show_window(
    internal_state: &Arc<Win32ApiInternalState>,
    window_id: WindowId,
) -> PlatformResult<()> {
    let hwnd = window_hwnd(internal_state, window_id)?;
    log::debug!("CommandExecutor: Showing window {window_id:?}.");
    unsafe {
        let _ = ShowWindow(hwnd, SW_SHOW);
        let _ = UpdateWindow(hwnd);
    }
    Ok(())
}

/*
 * Destroys the native window. WM_DESTROY then removes its data and reports
 * `AppEvent::WindowDestroyed`.
 */
pub(crate) fn execute_close_window(
    internal_state: &Arc<Win32ApiInternalState>,
    window_id: WindowId,
) -> PlatformResult<()> {
    let hwnd = window_hwnd(internal_state, window_id)?;
    log::debug!("CommandExecutor: Destroying window {window_id:?}.");
    unsafe { DestroyWindow(hwnd)? };
    Ok(())
}

pub(crate) fn execute_quit_application() -> PlatformResult<()> {
    log::debug!("CommandExecutor: execute_quit_application. Posting WM_QUIT.");
    unsafe { PostQuitMessage(0) };
    Ok(())
}

/*
 * Stores the layout rules for the window and applies them immediately to its
 * current client area. Later resizes reapply them from WM_SIZE.
 */
pub(crate) fn execute_define_layout(
    internal_state: &Arc<Win32ApiInternalState>,
    window_id: WindowId,
    rules: Vec<LayoutRule>,
) -> PlatformResult<()> {
    log::debug!(
        "CommandExecutor: execute_define_layout for {window_id:?}, with {} rules.",
        rules.len()
    );
    internal_state.with_window_data_write(window_id, |window_data| {
        window_data.set_layout_rules(rules);
        Ok(())
    })?;
    window_common::relayout(internal_state, window_id)
}

/*
 * Tells the application that every static UI command has been executed, so it
 * can fill the controls with data and show the window.
 */
pub(crate) fn execute_signal_main_window_ui_setup_complete(
    internal_state: &Arc<Win32ApiInternalState>,
    window_id: WindowId,
) -> PlatformResult<()> {
    log::debug!("CommandExecutor: Main window {window_id:?} UI setup complete.");
    internal_state.send_event(AppEvent::MainWindowUISetupComplete { window_id });
    Ok(())
}

pub(crate) fn execute_set_control_enabled(
    internal_state: &Arc<Win32ApiInternalState>,
    window_id: WindowId,
    control_id: ControlId,
    enabled: bool,
) -> PlatformResult<()> {
    let hwnd_ctrl = internal_state.with_window_data_read(window_id, |window_data| {
        window_data.get_control_hwnd(control_id).ok_or_else(|| {
            PlatformError::InvalidHandle(format!(
                "Control ID {} not found in window {window_id:?}",
                control_id.raw()
            ))
        })
    })?;
    unsafe {
        let _ = EnableWindow(hwnd_ctrl, enabled);
    }
    log::trace!(
        "CommandExecutor: Control ID {} in window {window_id:?} set to enabled: {enabled}",
        control_id.raw()
    );
    Ok(())
}

// Starts or stops the timer that produces `AppEvent::PollTimerTick`.
pub(crate) fn execute_set_poll_timer(
    internal_state: &Arc<Win32ApiInternalState>,
    window_id: WindowId,
    active: bool,
) -> PlatformResult<()> {
    let hwnd = window_hwnd(internal_state, window_id)?;
    if active {
        let timer = unsafe { SetTimer(Some(hwnd), POLL_TIMER_ID, POLL_INTERVAL_MS, None) };
        if timer == 0 {
            let error = windows::core::Error::from_win32();
            log::error!("CommandExecutor: SetTimer failed for {window_id:?}: {error:?}");
            return Err(PlatformError::Win32(error));
        }
        log::trace!("CommandExecutor: Poll timer started for {window_id:?}.");
    } else {
        // KillTimer fails harmlessly when the timer is not running.
        unsafe {
            let _ = KillTimer(Some(hwnd), POLL_TIMER_ID);
        }
        log::trace!("CommandExecutor: Poll timer stopped for {window_id:?}.");
    }
    Ok(())
}
