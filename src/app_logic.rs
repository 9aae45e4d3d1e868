/*
 * This module provides the application logic layer, primarily centered around
 * `MyAppLogic` which acts as the Presenter/Controller. It also includes
 * `MainWindowUiState` for the form state of the main window.
 * Unit tests for `MyAppLogic` are in `handler_tests.rs`.
 */
pub mod handler;
pub mod main_window_ui_state;
pub mod ui_constants;
