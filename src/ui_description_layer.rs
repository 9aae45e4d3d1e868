/*
 * This module is responsible for defining the static structure of the UI.
 * It generates the `PlatformCommand`s that create the signing form: one row
 * panel per field docked to the top of the window, the action buttons docked
 * to the bottom and the log view filling the space in between. The platform
 * layer only executes these commands; it knows nothing about the form.
 */
use crate::app_logic::ui_constants::*;
use crate::core::DEFAULT_ZIP_LEVEL;

use crate::platform_layer::{
    ControlId,
    types::{DockStyle, InputKind, LayoutRule, PlatformCommand, WindowId},
};

// Heights and widths in pixels, margins included.
const ROW_HEIGHT: i32 = 30;
const HEADING_ROW_HEIGHT: i32 = 36;
const ACTION_PANEL_HEIGHT: i32 = 44;
const LABEL_WIDTH: i32 = 170;
const BROWSE_BUTTON_WIDTH: i32 = 80;
const ROW_MARGIN: (i32, i32, i32, i32) = (3, 10, 3, 10);
// Inputs without a Browse button stop where the others do.
const NO_BUTTON_INPUT_MARGIN: (i32, i32, i32, i32) = (0, BROWSE_BUTTON_WIDTH, 0, 0);

const BROWSE_TEXT: &str = "Browse";

// Collects creation commands and layout rules while the form is described.
struct FormBuilder {
    window_id: WindowId,
    commands: Vec<PlatformCommand>,
    rules: Vec<LayoutRule>,
    next_row_order: u32,
}

impl FormBuilder {
    fn new(window_id: WindowId) -> Self {
        FormBuilder {
            window_id,
            commands: Vec::new(),
            rules: Vec::new(),
            next_row_order: 0,
        }
    }

    fn rule(
        &mut self,
        control_id: ControlId,
        parent_control_id: Option<ControlId>,
        dock_style: DockStyle,
        order: u32,
        fixed_size: Option<i32>,
        margin: (i32, i32, i32, i32),
    ) {
        self.rules.push(LayoutRule {
            control_id,
            parent_control_id,
            dock_style,
            order,
            fixed_size,
            margin,
        });
    }

    // A panel docked below the previous row.
    fn row(&mut self, panel_id: ControlId, height: i32) {
        self.commands.push(PlatformCommand::CreatePanel {
            window_id: self.window_id,
            parent_control_id: None,
            control_id: panel_id,
        });
        let order = self.next_row_order;
        self.next_row_order += 1;
        self.rule(panel_id, None, DockStyle::Top, order, Some(height), ROW_MARGIN);
    }

    fn label(&mut self, panel_id: ControlId, label_id: ControlId, text: &str, dock: DockStyle) {
        self.commands.push(PlatformCommand::CreateLabel {
            window_id: self.window_id,
            parent_control_id: Some(panel_id),
            control_id: label_id,
            text: text.to_string(),
        });
        let fixed_size = (dock == DockStyle::Left).then_some(LABEL_WIDTH);
        self.rule(label_id, Some(panel_id), dock, 0, fixed_size, (0, 6, 0, 0));
    }

    fn input(
        &mut self,
        panel_id: ControlId,
        input_id: ControlId,
        initial_text: &str,
        kind: InputKind,
        margin: (i32, i32, i32, i32),
    ) {
        self.commands.push(PlatformCommand::CreateInput {
            window_id: self.window_id,
            parent_control_id: Some(panel_id),
            control_id: input_id,
            initial_text: initial_text.to_string(),
            kind,
        });
        self.rule(input_id, Some(panel_id), DockStyle::Fill, 2, None, margin);
    }

    fn button(
        &mut self,
        panel_id: ControlId,
        button_id: ControlId,
        text: &str,
        dock: DockStyle,
        order: u32,
        fixed_size: Option<i32>,
        margin: (i32, i32, i32, i32),
    ) {
        self.commands.push(PlatformCommand::CreateButton {
            window_id: self.window_id,
            parent_control_id: Some(panel_id),
            control_id: button_id,
            text: text.to_string(),
        });
        self.rule(button_id, Some(panel_id), dock, order, fixed_size, margin);
    }

    fn checkbox(&mut self, panel_id: ControlId, checkbox_id: ControlId, text: &str, dock: DockStyle, order: u32) {
        self.commands.push(PlatformCommand::CreateCheckbox {
            window_id: self.window_id,
            parent_control_id: Some(panel_id),
            control_id: checkbox_id,
            text: text.to_string(),
            checked: false,
        });
        self.rule(checkbox_id, Some(panel_id), dock, order, None, (0, 4, 0, 0));
    }

    // Caption, path input and Browse button.
    fn path_row(
        &mut self,
        panel_id: ControlId,
        label_id: ControlId,
        label_text: &str,
        input_id: ControlId,
        browse_id: ControlId,
    ) {
        self.row(panel_id, ROW_HEIGHT);
        self.label(panel_id, label_id, label_text, DockStyle::Left);
        self.button(
            panel_id,
            browse_id,
            BROWSE_TEXT,
            DockStyle::Right,
            1,
            Some(BROWSE_BUTTON_WIDTH),
            (0, 0, 0, 6),
        );
        self.input(panel_id, input_id, "", InputKind::SingleLine, (0, 0, 0, 0));
    }

    // Caption and input, aligned with the path rows.
    fn text_row(
        &mut self,
        panel_id: ControlId,
        label_id: ControlId,
        label_text: &str,
        input_id: ControlId,
        initial_text: &str,
        kind: InputKind,
    ) {
        self.row(panel_id, ROW_HEIGHT);
        self.label(panel_id, label_id, label_text, DockStyle::Left);
        self.input(panel_id, input_id, initial_text, kind, NO_BUTTON_INPUT_MARGIN);
    }
}

/*
 * Generates the `PlatformCommand`s that build the main signing window.
 * The list ends with `DefineLayout` followed by
 * `SignalMainWindowUISetupComplete`, which hands control back to the
 * application once every control exists.
 *
 * This function is intended to be called only once, during the initial
 * construction of the main window.
 */
pub fn build_main_window_static_layout(window_id: WindowId) -> Vec<PlatformCommand> {
    log::debug!("UiDescription: Building main window layout for {window_id:?}.");
    let mut form = FormBuilder::new(window_id);

    // 1. Basic signing inputs
    form.path_row(
        INPUT_ROW_PANEL_ID,
        INPUT_PATH_LABEL_ID,
        "Unsigned App (.ipa):",
        INPUT_PATH_INPUT_ID,
        BROWSE_INPUT_BUTTON_ID,
    );
    form.row(ADHOC_ROW_PANEL_ID, ROW_HEIGHT);
    form.checkbox(
        ADHOC_ROW_PANEL_ID,
        ADHOC_CHECKBOX_ID,
        "Ad-hoc Signature (No certificate needed)",
        DockStyle::Fill,
        0,
    );
    form.path_row(
        CERTIFICATE_ROW_PANEL_ID,
        CERTIFICATE_LABEL_ID,
        "Certificate File (.p12):",
        CERTIFICATE_INPUT_ID,
        BROWSE_CERTIFICATE_BUTTON_ID,
    );
    form.text_row(
        PASSWORD_ROW_PANEL_ID,
        PASSWORD_LABEL_ID,
        "Certificate Password:",
        PASSWORD_INPUT_ID,
        "",
        InputKind::Password,
    );
    form.path_row(
        PROFILE_ROW_PANEL_ID,
        PROFILE_LABEL_ID,
        "Provisioning Profile:",
        PROFILE_INPUT_ID,
        BROWSE_PROFILE_BUTTON_ID,
    );
    form.path_row(
        OUTPUT_ROW_PANEL_ID,
        OUTPUT_LABEL_ID,
        "Signed App Location:",
        OUTPUT_INPUT_ID,
        BROWSE_OUTPUT_BUTTON_ID,
    );

    // 2. Advanced options
    form.row(ADVANCED_HEADING_ROW_PANEL_ID, HEADING_ROW_HEIGHT);
    form.label(
        ADVANCED_HEADING_ROW_PANEL_ID,
        ADVANCED_HEADING_LABEL_ID,
        "Advanced Options",
        DockStyle::Fill,
    );
    form.path_row(
        EXTRA_CERTIFICATE_ROW_PANEL_ID,
        EXTRA_CERTIFICATE_LABEL_ID,
        "Additional Certificate:",
        EXTRA_CERTIFICATE_INPUT_ID,
        BROWSE_EXTRA_CERTIFICATE_BUTTON_ID,
    );
    for (panel_id, label_id, text, input_id) in [
        (BUNDLE_ID_ROW_PANEL_ID, BUNDLE_ID_LABEL_ID, "Override Bundle ID:", BUNDLE_ID_INPUT_ID),
        (BUNDLE_NAME_ROW_PANEL_ID, BUNDLE_NAME_LABEL_ID, "Override App Name:", BUNDLE_NAME_INPUT_ID),
        (
            BUNDLE_VERSION_ROW_PANEL_ID,
            BUNDLE_VERSION_LABEL_ID,
            "Override App Version:",
            BUNDLE_VERSION_INPUT_ID,
        ),
    ] {
        form.text_row(panel_id, label_id, text, input_id, "", InputKind::SingleLine);
    }
    form.path_row(
        ENTITLEMENTS_ROW_PANEL_ID,
        ENTITLEMENTS_LABEL_ID,
        "Entitlements File:",
        ENTITLEMENTS_INPUT_ID,
        BROWSE_ENTITLEMENTS_BUTTON_ID,
    );
    form.path_row(
        DYLIB_ROW_PANEL_ID,
        DYLIB_LABEL_ID,
        "Inject Dylib:",
        DYLIB_INPUT_ID,
        BROWSE_DYLIB_BUTTON_ID,
    );

    form.row(OPTIONS_ROW_PANEL_ID, ROW_HEIGHT);
    for (order, (checkbox_id, text)) in [
        (WEAK_DYLIB_CHECKBOX_ID, "Inject Dylib as Weak"),
        (FORCE_CHECKBOX_ID, "Force Sign Without Cache"),
        (SHA256_ONLY_CHECKBOX_ID, "SHA256 Only"),
        (INSTALL_AFTER_CHECKBOX_ID, "Install After Signing"),
    ]
    .into_iter()
    .enumerate()
    {
        form.checkbox(
            OPTIONS_ROW_PANEL_ID,
            checkbox_id,
            text,
            DockStyle::ProportionalFill { weight: 1.0 },
            order as u32,
        );
    }

    form.text_row(
        ZIP_LEVEL_ROW_PANEL_ID,
        ZIP_LEVEL_LABEL_ID,
        "Zip Compression Level (0-9):",
        ZIP_LEVEL_INPUT_ID,
        DEFAULT_ZIP_LEVEL,
        InputKind::SingleLine,
    );

    // 3. Action buttons along the bottom edge
    let action_order = form.next_row_order;
    form.commands.push(PlatformCommand::CreatePanel {
        window_id,
        parent_control_id: None,
        control_id: ACTION_PANEL_ID,
    });
    form.rule(
        ACTION_PANEL_ID,
        None,
        DockStyle::Bottom,
        action_order,
        Some(ACTION_PANEL_HEIGHT),
        (6, 10, 8, 10),
    );
    for (order, (button_id, text)) in [
        (SIGN_BUTTON_ID, "Sign App"),
        (INSTALL_BUTTON_ID, "Install to Device"),
        (CANCEL_BUTTON_ID, "Cancel"),
        (CLEAR_LOGS_BUTTON_ID, "Clear Logs"),
    ]
    .into_iter()
    .enumerate()
    {
        form.button(
            ACTION_PANEL_ID,
            button_id,
            text,
            DockStyle::ProportionalFill { weight: 1.0 },
            order as u32,
            None,
            (0, 4, 0, 4),
        );
    }

    // 4. Log view takes the remaining height
    form.commands.push(PlatformCommand::CreateInput {
        window_id,
        parent_control_id: None,
        control_id: LOG_VIEW_ID,
        initial_text: String::new(),
        kind: InputKind::Log,
    });
    form.rule(
        LOG_VIEW_ID,
        None,
        DockStyle::Fill,
        action_order + 1,
        None,
        (6, 10, 0, 10),
    );

    let FormBuilder {
        mut commands,
        rules,
        ..
    } = form;
    commands.push(PlatformCommand::DefineLayout { window_id, rules });
    commands.push(PlatformCommand::SignalMainWindowUISetupComplete { window_id });
    commands
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn created_ids(commands: &[PlatformCommand]) -> Vec<ControlId> {
        commands
            .iter()
            .filter_map(|command| match command {
                PlatformCommand::CreatePanel { control_id, .. }
                | PlatformCommand::CreateLabel { control_id, .. }
                | PlatformCommand::CreateInput { control_id, .. }
                | PlatformCommand::CreateCheckbox { control_id, .. }
                | PlatformCommand::CreateButton { control_id, .. } => Some(*control_id),
                _ => None,
            })
            .collect()
    }

    fn layout_rules(commands: &[PlatformCommand]) -> &[LayoutRule] {
        commands
            .iter()
            .find_map(|command| match command {
                PlatformCommand::DefineLayout { rules, .. } => Some(rules.as_slice()),
                _ => None,
            })
            .expect("layout must be defined")
    }

    #[test]
    fn test_layout_ends_with_define_layout_then_setup_signal() {
        // Arrange
        let window_id = WindowId::new_for_test(1);

        // Act
        let commands = build_main_window_static_layout(window_id);

        // Assert
        let count = commands.len();
        assert!(matches!(
            commands[count - 2],
            PlatformCommand::DefineLayout { .. }
        ));
        assert_eq!(
            commands[count - 1],
            PlatformCommand::SignalMainWindowUISetupComplete { window_id }
        );
    }

    #[test]
    fn test_every_control_is_created_once_and_laid_out() {
        // Arrange
        let commands = build_main_window_static_layout(WindowId::new_for_test(1));

        // Act
        let created = created_ids(&commands);
        let unique: HashSet<ControlId> = created.iter().copied().collect();
        let rules = layout_rules(&commands);

        // Assert
        assert_eq!(created.len(), unique.len(), "control created twice");
        assert_eq!(rules.len(), created.len());
        for rule in rules {
            assert!(unique.contains(&rule.control_id));
            if let Some(parent) = rule.parent_control_id {
                assert!(unique.contains(&parent));
            }
        }
        for id in RUN_LOCKED_CONTROLS {
            assert!(unique.contains(&id), "missing control {}", id.raw());
        }
        for id in [INSTALL_BUTTON_ID, CANCEL_BUTTON_ID, CLEAR_LOGS_BUTTON_ID, LOG_VIEW_ID] {
            assert!(unique.contains(&id));
        }
    }

    #[test]
    fn test_parents_are_created_before_children() {
        // Arrange
        let commands = build_main_window_static_layout(WindowId::new_for_test(1));
        let created = created_ids(&commands);

        // Act & Assert
        for command in &commands {
            let (control_id, parent) = match command {
                PlatformCommand::CreateLabel {
                    control_id,
                    parent_control_id,
                    ..
                }
                | PlatformCommand::CreateInput {
                    control_id,
                    parent_control_id,
                    ..
                }
                | PlatformCommand::CreateCheckbox {
                    control_id,
                    parent_control_id,
                    ..
                }
                | PlatformCommand::CreateButton {
                    control_id,
                    parent_control_id,
                    ..
                } => (*control_id, *parent_control_id),
                _ => continue,
            };
            if let Some(parent) = parent {
                let parent_pos = created.iter().position(|id| *id == parent);
                let child_pos = created.iter().position(|id| *id == control_id);
                assert!(parent_pos < child_pos);
            }
        }
    }

    #[test]
    fn test_password_is_masked_and_zip_level_has_default() {
        // Arrange
        let commands = build_main_window_static_layout(WindowId::new_for_test(1));

        // Act
        let input = |wanted: ControlId| {
            commands.iter().find_map(|command| match command {
                PlatformCommand::CreateInput {
                    control_id,
                    initial_text,
                    kind,
                    ..
                } if *control_id == wanted => Some((initial_text.clone(), *kind)),
                _ => None,
            })
        };

        // Assert
        assert_eq!(input(PASSWORD_INPUT_ID), Some((String::new(), InputKind::Password)));
        assert_eq!(input(ZIP_LEVEL_INPUT_ID), Some(("9".to_string(), InputKind::SingleLine)));
        assert_eq!(input(LOG_VIEW_ID), Some((String::new(), InputKind::Log)));
    }

    #[test]
    fn test_captions_match_the_form_fields() {
        // Arrange
        let commands = build_main_window_static_layout(WindowId::new_for_test(1));

        // Act
        let texts: Vec<&str> = commands
            .iter()
            .filter_map(|command| match command {
                PlatformCommand::CreateLabel { text, .. }
                | PlatformCommand::CreateCheckbox { text, .. }
                | PlatformCommand::CreateButton { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect();

        // Assert
        for expected in [
            "Unsigned App (.ipa):",
            "Ad-hoc Signature (No certificate needed)",
            "Certificate Password:",
            "Zip Compression Level (0-9):",
            "Install After Signing",
            "Sign App",
            "Install to Device",
        ] {
            assert!(texts.contains(&expected), "missing caption {expected}");
        }
        assert_eq!(texts.iter().filter(|t| **t == BROWSE_TEXT).count(), 7);
    }

    #[test]
    fn test_rows_stack_in_creation_order() {
        // Arrange
        let commands = build_main_window_static_layout(WindowId::new_for_test(1));
        let rules = layout_rules(&commands);

        // Act
        let top_orders: Vec<(ControlId, u32)> = rules
            .iter()
            .filter(|rule| rule.parent_control_id.is_none() && rule.dock_style == DockStyle::Top)
            .map(|rule| (rule.control_id, rule.order))
            .collect();

        // Assert
        assert_eq!(top_orders.len(), 15);
        assert_eq!(top_orders[0], (INPUT_ROW_PANEL_ID, 0));
        assert_eq!(top_orders[14], (ZIP_LEVEL_ROW_PANEL_ID, 14));
        assert!(top_orders.windows(2).all(|pair| pair[0].1 < pair[1].1));
    }
}
