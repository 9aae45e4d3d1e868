/*
 * This module defines the MainWindowUiState struct.
 * MainWindowUiState holds the state tied to the main window: its identifier,
 * the current contents of every form field (mirrored from input and checkbox
 * events, since the presenter never reads widgets directly) and any pending
 * multi-step dialog flow.
 *
 * `PathField` describes the fields that have a Browse button, including the
 * dialog used to fill them.
 */
use super::handler::PendingAction;
use super::ui_constants;
use crate::core::{DEFAULT_ZIP_LEVEL, SigningRequest};
use crate::platform_layer::{ControlId, WindowId};

use std::path::{Path, PathBuf};

// A form field backed by a file or folder on disk, with its own Browse button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathField {
    Input,
    Certificate,
    ProvisioningProfile,
    Output,
    ExtraCertificate,
    Entitlements,
    Dylib,
}

impl PathField {
    pub const ALL: [PathField; 7] = [
        PathField::Input,
        PathField::Certificate,
        PathField::ProvisioningProfile,
        PathField::Output,
        PathField::ExtraCertificate,
        PathField::Entitlements,
        PathField::Dylib,
    ];

    pub fn from_browse_button(control_id: ControlId) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|field| field.browse_button_id() == control_id)
    }

    pub fn browse_button_id(self) -> ControlId {
        match self {
            PathField::Input => ui_constants::BROWSE_INPUT_BUTTON_ID,
            PathField::Certificate => ui_constants::BROWSE_CERTIFICATE_BUTTON_ID,
            PathField::ProvisioningProfile => ui_constants::BROWSE_PROFILE_BUTTON_ID,
            PathField::Output => ui_constants::BROWSE_OUTPUT_BUTTON_ID,
            PathField::ExtraCertificate => ui_constants::BROWSE_EXTRA_CERTIFICATE_BUTTON_ID,
            PathField::Entitlements => ui_constants::BROWSE_ENTITLEMENTS_BUTTON_ID,
            PathField::Dylib => ui_constants::BROWSE_DYLIB_BUTTON_ID,
        }
    }

    pub fn input_control_id(self) -> ControlId {
        match self {
            PathField::Input => ui_constants::INPUT_PATH_INPUT_ID,
            PathField::Certificate => ui_constants::CERTIFICATE_INPUT_ID,
            PathField::ProvisioningProfile => ui_constants::PROFILE_INPUT_ID,
            PathField::Output => ui_constants::OUTPUT_INPUT_ID,
            PathField::ExtraCertificate => ui_constants::EXTRA_CERTIFICATE_INPUT_ID,
            PathField::Entitlements => ui_constants::ENTITLEMENTS_INPUT_ID,
            PathField::Dylib => ui_constants::DYLIB_INPUT_ID,
        }
    }

    pub fn dialog_title(self) -> &'static str {
        match self {
            PathField::Input => "Select Unsigned App",
            PathField::Certificate => "Select Certificate File",
            PathField::ProvisioningProfile => "Select Provisioning Profile",
            PathField::Output => "Save Signed App As",
            PathField::ExtraCertificate => "Select Additional Certificate",
            PathField::Entitlements => "Select Entitlements File",
            PathField::Dylib => "Select Dylib to Inject",
        }
    }

    // Filter in the double-NUL terminated form of the native file dialogs.
    pub fn filter_spec(self) -> &'static str {
        match self {
            PathField::Input | PathField::Output => {
                "IPA files (*.ipa)\0*.ipa\0All files (*.*)\0*.*\0\0"
            }
            PathField::Certificate => {
                "Certificate files (*.p12;*.pem)\0*.p12;*.pem\0All files (*.*)\0*.*\0\0"
            }
            PathField::ProvisioningProfile => {
                "Provisioning profiles (*.mobileprovision)\0*.mobileprovision\0All files (*.*)\0*.*\0\0"
            }
            PathField::ExtraCertificate => {
                "Certificate files (*.pem;*.cer)\0*.pem;*.cer\0All files (*.*)\0*.*\0\0"
            }
            PathField::Entitlements => {
                "Entitlements files (*.plist;*.xml)\0*.plist;*.xml\0All files (*.*)\0*.*\0\0"
            }
            PathField::Dylib => "Dynamic libraries (*.dylib)\0*.dylib\0All files (*.*)\0*.*\0\0",
        }
    }

    // Only the output field is chosen with a Save dialog.
    pub fn uses_save_dialog(self) -> bool {
        self == PathField::Output
    }
}

pub const DEFAULT_OUTPUT_FILENAME: &str = "signed.ipa";

/*
 * Holds UI-specific state for the main application window. The form values
 * are raw, untrimmed text exactly as the controls report it; trimming happens
 * when a `SigningRequest` snapshot is taken.
 */
#[derive(Debug)]
pub struct MainWindowUiState {
    /* The unique identifier for the main application window. */
    pub window_id: WindowId,
    /* Tracks any pending multi-step UI action, such as an open dialog. */
    pub pending_action: Option<PendingAction>,
    form: SigningRequest,
}

impl MainWindowUiState {
    pub fn new(window_id: WindowId) -> Self {
        log::debug!("MainWindowUiState::new called for window_id: {window_id:?}");
        MainWindowUiState {
            window_id,
            pending_action: None,
            form: SigningRequest {
                zip_level: DEFAULT_ZIP_LEVEL.to_string(),
                ..Default::default()
            },
        }
    }

    /*
     * Records new text for an input control. Returns false if the control is
     * not a form field, in which case nothing changes.
     */
    pub fn apply_text_change(&mut self, control_id: ControlId, text: String) -> bool {
        match self.text_slot_mut(control_id) {
            Some(slot) => {
                *slot = text;
                true
            }
            None => false,
        }
    }

    // Records a checkbox state. Returns false for unknown controls.
    pub fn apply_checkbox_change(&mut self, control_id: ControlId, checked: bool) -> bool {
        let slot = match control_id {
            id if id == ui_constants::ADHOC_CHECKBOX_ID => &mut self.form.adhoc,
            id if id == ui_constants::WEAK_DYLIB_CHECKBOX_ID => &mut self.form.weak_dylib,
            id if id == ui_constants::FORCE_CHECKBOX_ID => &mut self.form.force,
            id if id == ui_constants::SHA256_ONLY_CHECKBOX_ID => &mut self.form.sha256_only,
            id if id == ui_constants::INSTALL_AFTER_CHECKBOX_ID => {
                &mut self.form.install_after_sign
            }
            _ => return false,
        };
        *slot = checked;
        true
    }

    pub fn set_path_field(&mut self, field: PathField, value: String) {
        if let Some(slot) = self.text_slot_mut(field.input_control_id()) {
            *slot = value;
        }
    }

    // Trimmed text of the output field.
    pub fn output_path(&self) -> String {
        self.form.output_path.trim().to_string()
    }

    // Folder the Browse dialog for `field` opens in: the parent of its current path, if that exists.
    pub fn browse_start_dir(&self, field: PathField) -> Option<PathBuf> {
        let f = &self.form;
        let current = match field {
            PathField::Input => &f.input_path,
            PathField::Certificate => &f.certificate_path,
            PathField::ProvisioningProfile => &f.provisioning_profile_path,
            PathField::Output => &f.output_path,
            PathField::ExtraCertificate => &f.extra_certificate_path,
            PathField::Entitlements => &f.entitlements_path,
            PathField::Dylib => &f.dylib_path,
        };
        Path::new(current.trim())
            .parent()
            .filter(|dir| dir.is_dir())
            .map(Path::to_path_buf)
    }

    /*
     * Takes the immutable snapshot handed to the synthesizer. Path and text
     * fields are trimmed. The password is passed on exactly as typed, since
     * surrounding spaces can be part of it.
     */
    pub fn signing_request(&self) -> SigningRequest {
        let f = &self.form;
        SigningRequest {
            input_path: f.input_path.trim().to_string(),
            adhoc: f.adhoc,
            certificate_path: f.certificate_path.trim().to_string(),
            password: f.password.clone(),
            provisioning_profile_path: f.provisioning_profile_path.trim().to_string(),
            output_path: f.output_path.trim().to_string(),
            extra_certificate_path: f.extra_certificate_path.trim().to_string(),
            bundle_id: f.bundle_id.trim().to_string(),
            bundle_name: f.bundle_name.trim().to_string(),
            bundle_version: f.bundle_version.trim().to_string(),
            entitlements_path: f.entitlements_path.trim().to_string(),
            dylib_path: f.dylib_path.trim().to_string(),
            weak_dylib: f.weak_dylib,
            force: f.force,
            sha256_only: f.sha256_only,
            install_after_sign: f.install_after_sign,
            zip_level: f.zip_level.trim().to_string(),
        }
    }

    fn text_slot_mut(&mut self, control_id: ControlId) -> Option<&mut String> {
        let f = &mut self.form;
        let slot = match control_id {
            id if id == ui_constants::INPUT_PATH_INPUT_ID => &mut f.input_path,
            id if id == ui_constants::CERTIFICATE_INPUT_ID => &mut f.certificate_path,
            id if id == ui_constants::PASSWORD_INPUT_ID => &mut f.password,
            id if id == ui_constants::PROFILE_INPUT_ID => &mut f.provisioning_profile_path,
            id if id == ui_constants::OUTPUT_INPUT_ID => &mut f.output_path,
            id if id == ui_constants::EXTRA_CERTIFICATE_INPUT_ID => &mut f.extra_certificate_path,
            id if id == ui_constants::BUNDLE_ID_INPUT_ID => &mut f.bundle_id,
            id if id == ui_constants::BUNDLE_NAME_INPUT_ID => &mut f.bundle_name,
            id if id == ui_constants::BUNDLE_VERSION_INPUT_ID => &mut f.bundle_version,
            id if id == ui_constants::ENTITLEMENTS_INPUT_ID => &mut f.entitlements_path,
            id if id == ui_constants::DYLIB_INPUT_ID => &mut f.dylib_path,
            id if id == ui_constants::ZIP_LEVEL_INPUT_ID => &mut f.zip_level,
            _ => return None,
        };
        Some(slot)
    }
}
