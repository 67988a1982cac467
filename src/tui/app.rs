//! Main TUI application state machine.
//!
//! Handles:
//! - Screen navigation
//! - Input event handling
//! - Synchronous inference on submit

use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    Terminal,
};

use crate::adapters::load_artifacts;
use crate::adapters::model::JsonClassifier;
use crate::application::InferenceService;
use crate::config::AppConfig;
use crate::ports::Classifier;

use super::ui::{
    form::{render_screening_form, ScreeningFormState},
    render_disclaimer,
    result::{render_result, ResultState},
};

/// Current screen/view in the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Form,
    Result,
}

/// Main application state
pub struct App<C: Classifier = JsonClassifier> {
    screen: Screen,

    should_quit: bool,

    /// Read-only inference context shared by every submission
    service: InferenceService<C>,

    form_state: ScreeningFormState,

    result_state: ResultState,
}

impl App<JsonClassifier> {
    /// Load the configured artifacts and build the application.
    ///
    /// # Errors
    /// Returns error if the model or encoders cannot be loaded.
    pub fn new(config: &AppConfig) -> Result<Self> {
        let artifacts = &config.artifacts;
        if !artifacts.dir.exists() {
            return Err(anyhow!(
                "Artifact directory not found at {:?}. Set AUTISCREEN_ARTIFACT_DIR to a directory containing {} and {}.",
                artifacts.dir,
                artifacts.model_file,
                artifacts.encoders_file
            ));
        }

        // Refuse to start without a usable model: there is nothing to show otherwise.
        let (classifier, encoders) = load_artifacts(artifacts)
            .map_err(|e| anyhow!("Failed to load artifacts from {:?}: {}", artifacts.dir, e))?;

        tracing::info!(
            "Loaded {} model from {:?}",
            classifier.estimator_kind(),
            artifacts.model_path()
        );

        Ok(Self::with_service(InferenceService::new(
            Arc::new(classifier),
            Arc::new(encoders),
        )))
    }
}

impl<C: Classifier> App<C> {
    /// Create application with an injected inference service.
    pub fn with_service(service: InferenceService<C>) -> Self {
        let form_state = ScreeningFormState::new(service.encoders());
        Self {
            screen: Screen::Form,
            should_quit: false,
            service,
            form_state,
            result_state: ResultState::default(),
        }
    }

    #[must_use]
    pub fn screen(&self) -> Screen {
        self.screen
    }

    #[must_use]
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    #[must_use]
    pub fn form_state(&self) -> &ScreeningFormState {
        &self.form_state
    }

    #[must_use]
    pub fn result_state(&self) -> &ResultState {
        &self.result_state
    }

    /// Run the main application loop.
    ///
    /// # Errors
    /// Returns error if terminal operations fail.
    pub fn run(&mut self) -> Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.main_loop(&mut terminal);

        // Restore terminal
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;

        result
    }

    fn main_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
        loop {
            terminal.draw(|f| {
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([Constraint::Min(0), Constraint::Length(2)])
                    .split(f.area());

                match self.screen {
                    Screen::Form => render_screening_form(f, chunks[0], &self.form_state),
                    Screen::Result => render_result(f, chunks[0], &self.result_state),
                }

                render_disclaimer(f, chunks[1]);
            })?;

            if event::poll(Duration::from_millis(100))? {
                if let Event::Key(key) = event::read()? {
                    self.handle_key(key.code, key.modifiers);
                }
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    pub fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) {
        // Global quit handling
        if key == KeyCode::Char('q') && modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        match self.screen {
            Screen::Form => self.handle_form_key(key),
            Screen::Result => self.handle_result_key(key),
        }
    }

    fn handle_form_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Up | KeyCode::BackTab => {
                self.form_state.prev_field();
            }
            KeyCode::Down | KeyCode::Tab => {
                self.form_state.next_field();
            }
            KeyCode::Right | KeyCode::Char(' ') => {
                self.form_state.cycle(true);
            }
            KeyCode::Left => {
                self.form_state.cycle(false);
            }
            KeyCode::Char(c) => {
                self.form_state.input_char(c);
            }
            KeyCode::Backspace => {
                self.form_state.delete_char();
            }
            KeyCode::Delete => {
                self.form_state.clear_field();
            }
            KeyCode::Enter => {
                self.submit_form();
            }
            _ => {}
        }
    }

    fn handle_result_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Enter | KeyCode::Esc => {
                self.screen = Screen::Form;
            }
            KeyCode::Char('n') | KeyCode::Char('N') => {
                self.form_state.reset(self.service.encoders());
                self.result_state = ResultState::Idle;
                self.screen = Screen::Form;
            }
            _ => {}
        }
    }

    /// Validate the form, run inference, and show the outcome.
    fn submit_form(&mut self) {
        let request = match self.form_state.to_request() {
            Ok(request) => request,
            Err(e) => {
                self.form_state.error_message = Some(e);
                return;
            }
        };

        self.result_state = match self.service.predict(&request) {
            Ok(prediction) => ResultState::Complete { prediction },
            Err(e) => {
                tracing::error!("Screening failed: {}", e);
                ResultState::Error {
                    message: e.to_string(),
                }
            }
        };
        self.form_state.error_message = None;
        self.screen = Screen::Result;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FEATURE_COUNT, PredictionLabel};
    use crate::ports::ClassifierError;
    use crate::tui::ui::form::tests::encoders;

    struct FixedClassifier(Vec<f64>);

    impl Classifier for FixedClassifier {
        fn n_features(&self) -> usize {
            FEATURE_COUNT
        }

        fn classes(&self) -> &[i64] {
            &[0, 1]
        }

        fn predict_proba(&self, row: &[f64]) -> Result<Vec<f64>, ClassifierError> {
            crate::ports::check_row(row, FEATURE_COUNT)?;
            Ok(self.0.clone())
        }
    }

    fn app(proba: Vec<f64>) -> App<FixedClassifier> {
        App::with_service(InferenceService::new(
            Arc::new(FixedClassifier(proba)),
            Arc::new(encoders()),
        ))
    }

    fn press(app: &mut App<FixedClassifier>, key: KeyCode) {
        app.handle_key(key, KeyModifiers::NONE);
    }

    #[test]
    fn test_submit_defaults_shows_prediction() {
        let mut app = app(vec![0.1, 0.9]);
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.screen(), Screen::Result);
        match app.result_state() {
            ResultState::Complete { prediction } => {
                assert_eq!(prediction.label, PredictionLabel::Likely);
                assert!((prediction.confidence - 0.9).abs() < f64::EPSILON);
            }
            other => panic!("unexpected state: {other:?}"),
        }
    }

    #[test]
    fn test_out_of_range_age_stays_on_form() {
        let mut app = app(vec![0.5, 0.5]);
        press(&mut app, KeyCode::Delete);
        press(&mut app, KeyCode::Char('0'));
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.screen(), Screen::Form);
        assert!(app.form_state().error_message.is_some());
    }

    #[test]
    fn test_blank_age_reports_error_and_recovers() {
        let mut app = app(vec![0.7, 0.3]);
        press(&mut app, KeyCode::Delete);
        press(&mut app, KeyCode::Enter);
        assert!(matches!(app.result_state(), ResultState::Error { .. }));

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.screen(), Screen::Form);
        press(&mut app, KeyCode::Char('7'));
        press(&mut app, KeyCode::Enter);
        assert!(matches!(app.result_state(), ResultState::Complete { .. }));
    }

    #[test]
    fn test_back_keeps_values_and_new_resets() {
        let mut app = app(vec![0.7, 0.3]);
        press(&mut app, KeyCode::Char('2'));
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.form_state().to_request().unwrap().age, "52");

        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.screen(), Screen::Form);
        assert_eq!(app.form_state().to_request().unwrap().age, "5");
        assert!(matches!(app.result_state(), ResultState::Idle));
    }

    #[test]
    fn test_quit_keys() {
        let mut app = app(vec![0.5, 0.5]);
        app.handle_key(KeyCode::Char('q'), KeyModifiers::CONTROL);
        assert!(app.should_quit());

        let mut app = self::app(vec![0.5, 0.5]);
        press(&mut app, KeyCode::Esc);
        assert!(app.should_quit());
    }
}
