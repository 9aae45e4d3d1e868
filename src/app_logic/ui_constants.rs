/*
 * Defines shared constants for logical UI control identifiers.
 * These IDs are used by the `ui_description_layer` to define the initial UI
 * structure and by the `app_logic` (Presenter) to target specific controls
 * for dynamic updates. The `platform_layer` maps these logical IDs to native
 * UI element handles.
 */

use crate::platform_layer::types::ControlId;

// --- Row panels, top to bottom ---
pub const INPUT_ROW_PANEL_ID: ControlId = ControlId::new(1101);
pub const ADHOC_ROW_PANEL_ID: ControlId = ControlId::new(1102);
pub const CERTIFICATE_ROW_PANEL_ID: ControlId = ControlId::new(1103);
pub const PASSWORD_ROW_PANEL_ID: ControlId = ControlId::new(1104);
pub const PROFILE_ROW_PANEL_ID: ControlId = ControlId::new(1105);
pub const OUTPUT_ROW_PANEL_ID: ControlId = ControlId::new(1106);
pub const ADVANCED_HEADING_ROW_PANEL_ID: ControlId = ControlId::new(1107);
pub const EXTRA_CERTIFICATE_ROW_PANEL_ID: ControlId = ControlId::new(1108);
pub const BUNDLE_ID_ROW_PANEL_ID: ControlId = ControlId::new(1109);
pub const BUNDLE_NAME_ROW_PANEL_ID: ControlId = ControlId::new(1110);
pub const BUNDLE_VERSION_ROW_PANEL_ID: ControlId = ControlId::new(1111);
pub const ENTITLEMENTS_ROW_PANEL_ID: ControlId = ControlId::new(1112);
pub const DYLIB_ROW_PANEL_ID: ControlId = ControlId::new(1113);
pub const OPTIONS_ROW_PANEL_ID: ControlId = ControlId::new(1114);
pub const ZIP_LEVEL_ROW_PANEL_ID: ControlId = ControlId::new(1115);
// Docked to the bottom of the window, below the log view.
pub const ACTION_PANEL_ID: ControlId = ControlId::new(1116);

// --- Text inputs ---
pub const INPUT_PATH_INPUT_ID: ControlId = ControlId::new(1201);
pub const CERTIFICATE_INPUT_ID: ControlId = ControlId::new(1202);
pub const PASSWORD_INPUT_ID: ControlId = ControlId::new(1203);
pub const PROFILE_INPUT_ID: ControlId = ControlId::new(1204);
pub const OUTPUT_INPUT_ID: ControlId = ControlId::new(1205);
pub const EXTRA_CERTIFICATE_INPUT_ID: ControlId = ControlId::new(1206);
pub const BUNDLE_ID_INPUT_ID: ControlId = ControlId::new(1207);
pub const BUNDLE_NAME_INPUT_ID: ControlId = ControlId::new(1208);
pub const BUNDLE_VERSION_INPUT_ID: ControlId = ControlId::new(1209);
pub const ENTITLEMENTS_INPUT_ID: ControlId = ControlId::new(1210);
pub const DYLIB_INPUT_ID: ControlId = ControlId::new(1211);
pub const ZIP_LEVEL_INPUT_ID: ControlId = ControlId::new(1212);

// --- Browse buttons, one per path field ---
pub const BROWSE_INPUT_BUTTON_ID: ControlId = ControlId::new(1301);
pub const BROWSE_CERTIFICATE_BUTTON_ID: ControlId = ControlId::new(1302);
pub const BROWSE_PROFILE_BUTTON_ID: ControlId = ControlId::new(1304);
pub const BROWSE_OUTPUT_BUTTON_ID: ControlId = ControlId::new(1305);
pub const BROWSE_EXTRA_CERTIFICATE_BUTTON_ID: ControlId = ControlId::new(1306);
pub const BROWSE_ENTITLEMENTS_BUTTON_ID: ControlId = ControlId::new(1310);
pub const BROWSE_DYLIB_BUTTON_ID: ControlId = ControlId::new(1311);

// --- Labels ---
pub const INPUT_PATH_LABEL_ID: ControlId = ControlId::new(1401);
pub const CERTIFICATE_LABEL_ID: ControlId = ControlId::new(1402);
pub const PASSWORD_LABEL_ID: ControlId = ControlId::new(1403);
pub const PROFILE_LABEL_ID: ControlId = ControlId::new(1404);
pub const OUTPUT_LABEL_ID: ControlId = ControlId::new(1405);
pub const EXTRA_CERTIFICATE_LABEL_ID: ControlId = ControlId::new(1406);
pub const BUNDLE_ID_LABEL_ID: ControlId = ControlId::new(1407);
pub const BUNDLE_NAME_LABEL_ID: ControlId = ControlId::new(1408);
pub const BUNDLE_VERSION_LABEL_ID: ControlId = ControlId::new(1409);
pub const ENTITLEMENTS_LABEL_ID: ControlId = ControlId::new(1410);
pub const DYLIB_LABEL_ID: ControlId = ControlId::new(1411);
pub const ZIP_LEVEL_LABEL_ID: ControlId = ControlId::new(1412);
pub const ADVANCED_HEADING_LABEL_ID: ControlId = ControlId::new(1413);

// --- Checkboxes ---
pub const ADHOC_CHECKBOX_ID: ControlId = ControlId::new(1501);
pub const WEAK_DYLIB_CHECKBOX_ID: ControlId = ControlId::new(1502);
pub const FORCE_CHECKBOX_ID: ControlId = ControlId::new(1503);
pub const SHA256_ONLY_CHECKBOX_ID: ControlId = ControlId::new(1504);
pub const INSTALL_AFTER_CHECKBOX_ID: ControlId = ControlId::new(1505);

// --- Action buttons ---
pub const SIGN_BUTTON_ID: ControlId = ControlId::new(1601);
pub const INSTALL_BUTTON_ID: ControlId = ControlId::new(1602);
pub const CANCEL_BUTTON_ID: ControlId = ControlId::new(1603);
pub const CLEAR_LOGS_BUTTON_ID: ControlId = ControlId::new(1604);

// Multi-line, read-only view receiving the streamed tool output.
pub const LOG_VIEW_ID: ControlId = ControlId::new(1701);

// Every control that is disabled while a child process runs. The install
// button is handled separately since it also depends on installer discovery.
pub const RUN_LOCKED_CONTROLS: [ControlId; 25] = [
    INPUT_PATH_INPUT_ID,
    CERTIFICATE_INPUT_ID,
    PASSWORD_INPUT_ID,
    PROFILE_INPUT_ID,
    OUTPUT_INPUT_ID,
    EXTRA_CERTIFICATE_INPUT_ID,
    BUNDLE_ID_INPUT_ID,
    BUNDLE_NAME_INPUT_ID,
    BUNDLE_VERSION_INPUT_ID,
    ENTITLEMENTS_INPUT_ID,
    DYLIB_INPUT_ID,
    ZIP_LEVEL_INPUT_ID,
    BROWSE_INPUT_BUTTON_ID,
    BROWSE_CERTIFICATE_BUTTON_ID,
    BROWSE_PROFILE_BUTTON_ID,
    BROWSE_OUTPUT_BUTTON_ID,
    BROWSE_EXTRA_CERTIFICATE_BUTTON_ID,
    BROWSE_ENTITLEMENTS_BUTTON_ID,
    BROWSE_DYLIB_BUTTON_ID,
    ADHOC_CHECKBOX_ID,
    WEAK_DYLIB_CHECKBOX_ID,
    FORCE_CHECKBOX_ID,
    SHA256_ONLY_CHECKBOX_ID,
    INSTALL_AFTER_CHECKBOX_ID,
    SIGN_BUTTON_ID,
];
