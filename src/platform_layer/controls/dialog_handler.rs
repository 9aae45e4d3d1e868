/*
 * Modal dialogs: the common Open/Save file dialogs used by the Browse
 * buttons, the shell folder picker, message boxes and the Yes/No
 * confirmation. Each dialog blocks in its own message loop; its result is
 * delivered to the application as an `AppEvent` once it closes.
 */

use crate::platform_layer::app::Win32ApiInternalState;
use crate::platform_layer::error::{PlatformError, Result as PlatformResult};
use crate::platform_layer::types::{AppEvent, MessageSeverity, WindowId};

use std::ffi::{OsString, c_void};
use std::os::windows::ffi::OsStringExt;
use std::path::PathBuf;
use std::sync::Arc;

use windows::{
    Win32::{
        Foundation::HWND,
        System::Com::{CLSCTX_INPROC_SERVER, CoCreateInstance, CoTaskMemFree},
        UI::Controls::Dialogs::{
            COMMON_DLG_ERRORS, CommDlgExtendedError, GetOpenFileNameW, GetSaveFileNameW,
            OFN_EXPLORER, OFN_FILEMUSTEXIST, OFN_HIDEREADONLY, OFN_NOCHANGEDIR,
            OFN_OVERWRITEPROMPT, OFN_PATHMUSTEXIST, OPEN_FILENAME_FLAGS, OPENFILENAMEW,
        },
        UI::Shell::{
            FOS_FORCEFILESYSTEM, FOS_PICKFOLDERS, FileOpenDialog, IFileOpenDialog, IShellItem,
            SHCreateItemFromParsingName, SIGDN_FILESYSPATH,
        },
        UI::WindowsAndMessaging::{
            IDYES, MB_ICONERROR, MB_ICONINFORMATION, MB_ICONQUESTION, MB_OK,
            MB_YESNO, MESSAGEBOX_STYLE, MessageBoxW,
        },
    },
    core::{HSTRING, PCWSTR, PWSTR},
};

// Large enough for long paths in the legacy common dialogs.
const FILE_BUFFER_LEN: usize = 2048;

/*
 * Creates a `PathBuf` from a wide-character buffer filled by a file dialog,
 * stopping at the first NUL (or taking the whole buffer when there is none).
 */
pub(crate) fn pathbuf_from_buf(buffer: &[u16]) -> PathBuf {
    let len = buffer.iter().position(|&c| c == 0).unwrap_or(buffer.len());
    PathBuf::from(OsString::from_wide(&buffer[..len]))
}

// Seeds the dialog's file name buffer with a suggested name.
fn file_buffer_with_default(default_filename: Option<&str>) -> Vec<u16> {
    let mut file_buffer = vec![0u16; FILE_BUFFER_LEN];
    if let Some(name) = default_filename {
        let name_utf16: Vec<u16> = name.encode_utf16().take(FILE_BUFFER_LEN - 1).collect();
        file_buffer[..name_utf16.len()].copy_from_slice(&name_utf16);
    }
    file_buffer
}

fn message_box_style(severity: MessageSeverity) -> MESSAGEBOX_STYLE {
    MB_OK
        | match severity {
            MessageSeverity::Information => MB_ICONINFORMATION,
            MessageSeverity::Error => MB_ICONERROR,
        }
}

pub(crate) fn get_hwnd_owner(
    internal_state: &Arc<Win32ApiInternalState>,
    window_id: WindowId,
) -> PlatformResult<HWND> {
    internal_state.with_window_data_read(window_id, |window_data| {
        let hwnd = window_data.get_hwnd();
        if hwnd.is_invalid() {
            return Err(PlatformError::InvalidHandle(format!(
                "HWND for {window_id:?} is invalid"
            )));
        }
        Ok(hwnd)
    })
}

/*
 * Runs GetOpenFileNameW or GetSaveFileNameW with the shared OPENFILENAMEW
 * setup and returns the chosen path, or `None` when the user cancelled.
 * `filter_spec` must already be in the double-NUL-terminated form.
 */
fn run_common_file_dialog(
    hwnd_owner: HWND,
    title: &str,
    default_filename: Option<&str>,
    filter_spec: &str,
    initial_dir: Option<&PathBuf>,
    specific_flags: OPEN_FILENAME_FLAGS,
    dialog_fn: impl FnOnce(&mut OPENFILENAMEW) -> windows::core::BOOL,
) -> Option<PathBuf> {
    let mut file_buffer = file_buffer_with_default(default_filename);
    let title_hstring = HSTRING::from(title);
    let filter_utf16: Vec<u16> = filter_spec.encode_utf16().collect();
    let initial_dir_hstring = initial_dir.map(|dir| HSTRING::from(dir.as_os_str()));

    let mut ofn = OPENFILENAMEW {
        lStructSize: std::mem::size_of::<OPENFILENAMEW>() as u32,
        hwndOwner: hwnd_owner,
        lpstrFile: PWSTR(file_buffer.as_mut_ptr()),
        nMaxFile: file_buffer.len() as u32,
        lpstrFilter: PCWSTR(filter_utf16.as_ptr()),
        lpstrTitle: PCWSTR(title_hstring.as_ptr()),
        lpstrInitialDir: initial_dir_hstring
            .as_ref()
            .map_or(PCWSTR::null(), |dir| PCWSTR(dir.as_ptr())),
        Flags: OFN_EXPLORER | OFN_NOCHANGEDIR | specific_flags,
        ..Default::default()
    };

    if dialog_fn(&mut ofn).as_bool() {
        let path = pathbuf_from_buf(&file_buffer);
        log::debug!("DialogHandler: '{title}' returned {path:?}.");
        return Some(path);
    }
    let error_code = unsafe { CommDlgExtendedError() };
    if error_code != COMMON_DLG_ERRORS(0) {
        log::error!("DialogHandler: '{title}' failed, CommDlgExtendedError: {error_code:?}");
    } else {
        log::debug!("DialogHandler: '{title}' cancelled by user.");
    }
    None
}

pub(crate) fn handle_show_open_file_dialog_command(
    internal_state: &Arc<Win32ApiInternalState>,
    window_id: WindowId,
    title: String,
    filter_spec: String,
    initial_dir: Option<PathBuf>,
) -> PlatformResult<()> {
    let hwnd_owner = get_hwnd_owner(internal_state, window_id)?;
    let result = run_common_file_dialog(
        hwnd_owner,
        &title,
        None,
        &filter_spec,
        initial_dir.as_ref(),
        OFN_FILEMUSTEXIST | OFN_PATHMUSTEXIST | OFN_HIDEREADONLY,
        |ofn| unsafe { GetOpenFileNameW(ofn) },
    );
    internal_state.send_event(AppEvent::FileOpenDialogCompleted { window_id, result });
    Ok(())
}

pub(crate) fn handle_show_save_file_dialog_command(
    internal_state: &Arc<Win32ApiInternalState>,
    window_id: WindowId,
    title: String,
    default_filename: String,
    filter_spec: String,
    initial_dir: Option<PathBuf>,
) -> PlatformResult<()> {
    let hwnd_owner = get_hwnd_owner(internal_state, window_id)?;
    let result = run_common_file_dialog(
        hwnd_owner,
        &title,
        Some(default_filename.as_str()).filter(|name| !name.is_empty()),
        &filter_spec,
        initial_dir.as_ref(),
        OFN_PATHMUSTEXIST | OFN_OVERWRITEPROMPT | OFN_HIDEREADONLY,
        |ofn| unsafe { GetSaveFileNameW(ofn) },
    );
    internal_state.send_event(AppEvent::FileSaveDialogCompleted { window_id, result });
    Ok(())
}

/*
 * Shows the shell's IFileOpenDialog in folder mode. `Ok(None)` means the
 * user cancelled; errors come from COM.
 */
fn pick_folder(
    hwnd_owner: HWND,
    title: &str,
    initial_dir: Option<&PathBuf>,
) -> PlatformResult<Option<PathBuf>> {
    unsafe {
        let file_dialog: IFileOpenDialog =
            CoCreateInstance(&FileOpenDialog, None, CLSCTX_INPROC_SERVER)?;
        file_dialog.SetOptions(FOS_PICKFOLDERS | FOS_FORCEFILESYSTEM)?;
        file_dialog.SetTitle(&HSTRING::from(title))?;

        if let Some(dir) = initial_dir {
            match SHCreateItemFromParsingName::<_, _, IShellItem>(&HSTRING::from(dir.as_os_str()), None) {
                Ok(item) => {
                    if let Err(e) = file_dialog.SetFolder(&item) {
                        log::warn!("DialogHandler: SetFolder({dir:?}) failed: {e:?}");
                    }
                }
                Err(e) => log::warn!("DialogHandler: Initial folder {dir:?} not usable: {e:?}"),
            }
        }

        if file_dialog.Show(Some(hwnd_owner)).is_err() {
            log::debug!("DialogHandler: Folder picker cancelled by user.");
            return Ok(None);
        }
        let display_name = file_dialog.GetResult()?.GetDisplayName(SIGDN_FILESYSPATH)?;
        let path = display_name.to_string().unwrap_or_default();
        CoTaskMemFree(Some(display_name.as_ptr() as *const c_void));
        Ok(Some(PathBuf::from(path)).filter(|p| !p.as_os_str().is_empty()))
    }
}

/*
 * Shows the folder picker. The completion event is sent even when COM fails,
 * so the application never waits for an answer that does not come.
 */
pub(crate) fn handle_show_folder_picker_dialog_command(
    internal_state: &Arc<Win32ApiInternalState>,
    window_id: WindowId,
    title: String,
    initial_dir: Option<PathBuf>,
) -> PlatformResult<()> {
    let hwnd_owner = get_hwnd_owner(internal_state, window_id)?;
    let outcome = pick_folder(hwnd_owner, &title, initial_dir.as_ref());
    let path = match &outcome {
        Ok(path) => path.clone(),
        Err(e) => {
            log::error!("DialogHandler: Folder picker failed: {e}");
            None
        }
    };
    internal_state.send_event(AppEvent::FolderPickerDialogCompleted { window_id, path });
    outcome.map(|_| ())
}

// The window may already be gone when an error is reported; the box is then unowned.
pub(crate) fn handle_show_message_box_command(
    internal_state: &Arc<Win32ApiInternalState>,
    window_id: WindowId,
    title: String,
    text: String,
    severity: MessageSeverity,
) -> PlatformResult<()> {
    let hwnd_owner = get_hwnd_owner(internal_state, window_id).ok();
    unsafe {
        MessageBoxW(
            hwnd_owner,
            &HSTRING::from(text.as_str()),
            &HSTRING::from(title.as_str()),
            message_box_style(severity),
        );
    }
    Ok(())
}

pub(crate) fn handle_show_confirmation_command(
    internal_state: &Arc<Win32ApiInternalState>,
    window_id: WindowId,
    title: String,
    text: String,
) -> PlatformResult<()> {
    let hwnd_owner = get_hwnd_owner(internal_state, window_id).ok();
    let answer = unsafe {
        MessageBoxW(
            hwnd_owner,
            &HSTRING::from(text.as_str()),
            &HSTRING::from(title.as_str()),
            MB_YESNO | MB_ICONQUESTION,
        )
    };
    let confirmed = answer == IDYES;
    log::debug!("DialogHandler: Confirmation '{title}' answered, confirmed: {confirmed}.");
    internal_state.send_event(AppEvent::ConfirmationDialogCompleted {
        window_id,
        confirmed,
    });
    Ok(())
}
