//! TUI module: Terminal User Interface using Ratatui.
//!
//! Provides:
//! - Screening form (age, result score, A1-A10, background selections)
//! - Prediction result view with confidence and fallback notes

mod app;
mod styles;
mod ui;

pub use app::{App, Screen};
pub use styles::ScreeningTheme;
pub use ui::form::ScreeningFormState;
pub use ui::result::ResultState;
