//! Prediction result view.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
    Frame,
};

use crate::domain::{Encoding, FallbackReason, Prediction};
use crate::tui::styles::ScreeningTheme;

/// Shown beneath every prediction.
pub const DIAGNOSIS_NOTICE: &str = "This prediction is not a medical diagnosis.";

/// Result state
#[derive(Debug, Clone, Default)]
pub enum ResultState {
    /// Nothing submitted yet
    #[default]
    Idle,
    /// Completed with a prediction
    Complete { prediction: Prediction },
    /// Inference failed
    Error { message: String },
}

/// Confidence formatted to two decimals.
#[must_use]
pub fn format_confidence(confidence: f64) -> String {
    format!("{confidence:.2}")
}

/// Evaluation time shown under the confidence gauge.
#[must_use]
pub fn format_evaluated_at(at: &chrono::DateTime<chrono::Utc>) -> String {
    at.format("Evaluated %Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Human-readable note for a category that was not seen in training.
#[must_use]
pub fn describe_fallback(encoding: &Encoding) -> String {
    match encoding {
        Encoding::Fallback {
            reason: FallbackReason::Others,
            ..
        } => "unrecognized, treated as \"Others\"".to_string(),
        Encoding::Fallback {
            reason: FallbackReason::FirstCategory,
            code,
        } => format!("unrecognized, encoded as the first category (code {code})"),
        Encoding::Known(code) => format!("code {code}"),
    }
}

/// Render the result view
pub fn render_result(f: &mut Frame, area: Rect, state: &ResultState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Content
            Constraint::Length(3), // Footer
        ])
        .split(area);

    render_result_header(f, chunks[0]);
    match state {
        ResultState::Idle => render_idle(f, chunks[1]),
        ResultState::Complete { prediction } => render_prediction(f, chunks[1], prediction),
        ResultState::Error { message } => render_error(f, chunks[1], message),
    }
    render_result_footer(f, chunks[2]);
}

fn render_result_header(f: &mut Frame, area: Rect) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(" ", ScreeningTheme::text()),
        Span::styled("Prediction", ScreeningTheme::title()),
        Span::styled(" │ Screening outcome", ScreeningTheme::text_secondary()),
    ]))
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(ScreeningTheme::border()),
    );

    f.render_widget(header, area);
}

fn render_idle(f: &mut Frame, area: Rect) {
    let content = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            "No screening submitted yet",
            ScreeningTheme::text_secondary(),
        )),
    ])
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(ScreeningTheme::border()),
    );

    f.render_widget(content, area);
}

fn render_prediction(f: &mut Frame, area: Rect, prediction: &Prediction) {
    let block = Block::default()
        .title(Span::styled(" Result ", ScreeningTheme::section()))
        .borders(Borders::ALL)
        .border_style(ScreeningTheme::border_focused());

    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Label
            Constraint::Length(3), // Confidence
            Constraint::Length(1), // Timestamp
            Constraint::Min(0),    // Fallback notes
            Constraint::Length(2), // Notice
        ])
        .margin(1)
        .split(inner);

    let label_style = ScreeningTheme::prediction(prediction.label);
    let label = Paragraph::new(vec![
        Line::from(Span::styled(
            prediction.label.to_string(),
            label_style.add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            prediction.label.description(),
            ScreeningTheme::text_secondary(),
        )),
    ])
    .alignment(Alignment::Center);
    f.render_widget(label, chunks[0]);

    let gauge = Gauge::default()
        .block(
            Block::default()
                .title(Span::styled(" Confidence ", ScreeningTheme::text_secondary()))
                .borders(Borders::ALL)
                .border_style(ScreeningTheme::border()),
        )
        .gauge_style(label_style)
        .ratio(prediction.confidence.clamp(0.0, 1.0))
        .label(format_confidence(prediction.confidence));
    f.render_widget(gauge, chunks[1]);

    let evaluated = Paragraph::new(Line::from(Span::styled(
        format_evaluated_at(&prediction.evaluated_at),
        ScreeningTheme::text_muted(),
    )))
    .alignment(Alignment::Center);
    f.render_widget(evaluated, chunks[2]);

    let mut notes: Vec<Line> = Vec::new();
    if !prediction.fallbacks.is_empty() {
        notes.push(Line::from(Span::styled(
            "Some answers were not in the training data:",
            ScreeningTheme::warning(),
        )));
        for (field, encoding) in &prediction.fallbacks {
            notes.push(Line::from(vec![
                Span::styled(format!("  {field}: "), ScreeningTheme::text_secondary()),
                Span::styled(describe_fallback(encoding), ScreeningTheme::text()),
            ]));
        }
    }
    f.render_widget(Paragraph::new(notes).wrap(Wrap { trim: false }), chunks[3]);

    let notice = Paragraph::new(Line::from(Span::styled(
        DIAGNOSIS_NOTICE,
        ScreeningTheme::warning(),
    )))
    .alignment(Alignment::Center);
    f.render_widget(notice, chunks[4]);
}

fn render_error(f: &mut Frame, area: Rect, message: &str) {
    let content = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled("! Error", ScreeningTheme::danger())),
        Line::from(""),
        Line::from(Span::styled(message, ScreeningTheme::text())),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(ScreeningTheme::danger()),
    );

    f.render_widget(content, area);
}

fn render_result_footer(f: &mut Frame, area: Rect) {
    let content = Line::from(vec![
        Span::styled("[Enter/Esc] ", ScreeningTheme::key_hint()),
        Span::styled("Back to form ", ScreeningTheme::key_desc()),
        Span::styled("[N] ", ScreeningTheme::key_hint()),
        Span::styled("New screening ", ScreeningTheme::key_desc()),
        Span::styled("[Ctrl+Q] ", ScreeningTheme::key_hint()),
        Span::styled("Quit", ScreeningTheme::key_desc()),
    ]);

    let footer = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(ScreeningTheme::border()),
    );

    f.render_widget(footer, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_confidence_two_decimals() {
        assert_eq!(format_confidence(0.7), "0.70");
        assert_eq!(format_confidence(0.876), "0.88");
        assert_eq!(format_confidence(1.0), "1.00");
    }

    #[test]
    fn test_format_evaluated_at() {
        use chrono::TimeZone;
        let at = chrono::Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(format_evaluated_at(&at), "Evaluated 2024-03-09 14:05:07 UTC");
    }

    #[test]
    fn test_describe_fallback() {
        let others = Encoding::Fallback {
            code: 3,
            reason: FallbackReason::Others,
        };
        assert!(describe_fallback(&others).contains("Others"));

        let first = Encoding::Fallback {
            code: 0,
            reason: FallbackReason::FirstCategory,
        };
        assert!(describe_fallback(&first).contains("first category"));
    }
}
