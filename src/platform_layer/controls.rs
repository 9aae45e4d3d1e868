// Declare the control handler sub-modules
pub(crate) mod button_handler;
pub(crate) mod dialog_handler;
pub(crate) mod input_handler;
pub(crate) mod label_handler;
pub(crate) mod panel_handler;
