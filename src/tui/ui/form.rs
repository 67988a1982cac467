//! Screening input form.
//!
//! Fields follow feature order: age, result score, A1..A10, then the seven
//! categorical selections whose options come from the loaded encoders.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use zeroize::Zeroize;

use crate::domain::{Answer, CategoricalField, EncoderSet, ScreeningRequest, QUESTION_COUNT};
use crate::tui::styles::ScreeningTheme;

/// Accepted age range in the form.
pub const AGE_RANGE: std::ops::RangeInclusive<i64> = 1..=120;

const DEFAULT_AGE: &str = "5";
const DEFAULT_RESULT: &str = "0.0";

const AGE_FIELD: usize = 0;
const RESULT_FIELD: usize = 1;
const FIRST_ANSWER: usize = 2;
const FIRST_CATEGORY: usize = FIRST_ANSWER + QUESTION_COUNT;

/// What a form field holds.
#[derive(Debug, Clone)]
pub enum FieldKind {
    /// Free-text number; `decimal` allows `.` and `-`.
    Number {
        value: String,
        hint: &'static str,
        decimal: bool,
    },
    /// Yes/no questionnaire answer.
    Answer(Answer),
    /// Choice among an encoder's known categories.
    Category {
        field: CategoricalField,
        options: Vec<String>,
        selected: usize,
    },
}

#[derive(Debug, Clone)]
pub struct FormField {
    pub label: String,
    pub kind: FieldKind,
}

impl FormField {
    /// Text shown inside the field box.
    fn display(&self) -> (String, bool) {
        match &self.kind {
            FieldKind::Number { value, hint, .. } => {
                if value.is_empty() {
                    ((*hint).to_string(), true)
                } else {
                    (value.clone(), false)
                }
            }
            FieldKind::Answer(answer) => (answer.label().to_string(), false),
            FieldKind::Category {
                options, selected, ..
            } => (format!("‹ {} ›", options[*selected]), false),
        }
    }
}

/// Screening form state
pub struct ScreeningFormState {
    pub fields: Vec<FormField>,
    pub selected_field: usize,
    pub error_message: Option<String>,
}

impl ScreeningFormState {
    /// Build a form with default values, drawing choices from `encoders`.
    #[must_use]
    pub fn new(encoders: &EncoderSet) -> Self {
        let mut fields = Vec::with_capacity(FIRST_CATEGORY + CategoricalField::ALL.len());
        fields.push(FormField {
            label: "Age".into(),
            kind: FieldKind::Number {
                value: DEFAULT_AGE.into(),
                hint: "years (1-120)",
                decimal: false,
            },
        });
        fields.push(FormField {
            label: "Result Score".into(),
            kind: FieldKind::Number {
                value: DEFAULT_RESULT.into(),
                hint: "numeric score",
                decimal: true,
            },
        });

        // Odd-numbered questions start at "No", even-numbered at "Yes".
        for i in 1..=QUESTION_COUNT {
            let answer = if i % 2 == 1 { Answer::No } else { Answer::Yes };
            fields.push(FormField {
                label: format!("A{i}"),
                kind: FieldKind::Answer(answer),
            });
        }

        for field in CategoricalField::ALL {
            fields.push(FormField {
                label: field.label().into(),
                kind: FieldKind::Category {
                    field,
                    options: encoders.get(field).classes().to_vec(),
                    selected: 0,
                },
            });
        }

        Self {
            fields,
            selected_field: 0,
            error_message: None,
        }
    }

    /// Move to the next field
    pub fn next_field(&mut self) {
        self.selected_field = (self.selected_field + 1) % self.fields.len();
    }

    /// Move to the previous field
    pub fn prev_field(&mut self) {
        if self.selected_field == 0 {
            self.selected_field = self.fields.len() - 1;
        } else {
            self.selected_field -= 1;
        }
    }

    /// Add a character to the current number field
    pub fn input_char(&mut self, c: char) {
        if let FieldKind::Number { value, decimal, .. } = &mut self.fields[self.selected_field].kind
        {
            let accepted = c.is_ascii_digit() || (*decimal && (c == '.' || c == '-'));
            if accepted {
                value.push(c);
                self.error_message = None;
            }
        }
    }

    /// Delete the last character of the current number field
    pub fn delete_char(&mut self) {
        if let FieldKind::Number { value, .. } = &mut self.fields[self.selected_field].kind {
            value.pop();
        }
    }

    /// Clear the current number field
    pub fn clear_field(&mut self) {
        if let FieldKind::Number { value, .. } = &mut self.fields[self.selected_field].kind {
            value.zeroize();
        }
    }

    /// Step the current choice forward (or backward).
    pub fn cycle(&mut self, forward: bool) {
        match &mut self.fields[self.selected_field].kind {
            FieldKind::Answer(answer) => *answer = answer.toggled(),
            FieldKind::Category {
                options, selected, ..
            } => {
                let n = options.len();
                *selected = if forward {
                    (*selected + 1) % n
                } else {
                    (*selected + n - 1) % n
                };
            }
            FieldKind::Number { .. } => {}
        }
        self.error_message = None;
    }

    /// Wipe typed values and restore defaults for a new screening.
    pub fn reset(&mut self, encoders: &EncoderSet) {
        for field in self.fields.iter_mut() {
            if let FieldKind::Number { value, .. } = &mut field.kind {
                value.zeroize();
            }
        }
        *self = Self::new(encoders);
    }

    fn number(&self, idx: usize) -> &str {
        match &self.fields[idx].kind {
            FieldKind::Number { value, .. } => value,
            _ => "",
        }
    }

    /// Collect the form into a raw request.
    ///
    /// Only the age range is checked here; a blank age is left to the
    /// inference service, which reports it as missing.
    pub fn to_request(&self) -> Result<ScreeningRequest, String> {
        let age = self.number(AGE_FIELD).to_string();
        let trimmed = age.trim();
        if !trimmed.is_empty() {
            // Digit strings too long for i64 are out of range as well.
            let in_range = trimmed
                .parse::<i64>()
                .is_ok_and(|years| AGE_RANGE.contains(&years));
            if !in_range {
                return Err(format!(
                    "Age: Value must be between {} and {}",
                    AGE_RANGE.start(),
                    AGE_RANGE.end()
                ));
            }
        }

        let mut answers = [Answer::No; QUESTION_COUNT];
        for (i, slot) in answers.iter_mut().enumerate() {
            if let FieldKind::Answer(answer) = &self.fields[FIRST_ANSWER + i].kind {
                *slot = *answer;
            }
        }

        let mut categories: [String; 7] = Default::default();
        for form_field in &self.fields[FIRST_CATEGORY..] {
            if let FieldKind::Category {
                field,
                options,
                selected,
            } = &form_field.kind
            {
                categories[field.index()] = options[*selected].clone();
            }
        }

        Ok(ScreeningRequest {
            age,
            result: self.number(RESULT_FIELD).to_string(),
            answers,
            categories,
        })
    }
}

/// Render the screening form
pub fn render_screening_form(f: &mut Frame, area: Rect, state: &ScreeningFormState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Length(4), // Personal information
            Constraint::Length(7), // Questionnaire
            Constraint::Min(0),    // Background information
            Constraint::Length(3), // Footer/error
        ])
        .split(area);

    render_form_header(f, chunks[0]);
    render_section(
        f,
        chunks[1],
        "Personal Information",
        state,
        AGE_FIELD..FIRST_ANSWER,
        2,
    );
    render_section(
        f,
        chunks[2],
        "Questionnaire (A1 - A10)",
        state,
        FIRST_ANSWER..FIRST_CATEGORY,
        5,
    );
    render_section(
        f,
        chunks[3],
        "Background Information",
        state,
        FIRST_CATEGORY..state.fields.len(),
        2,
    );
    render_form_footer(f, chunks[4], state);
}

fn render_form_header(f: &mut Frame, area: Rect) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(" ", ScreeningTheme::text()),
        Span::styled("Autism Prediction System", ScreeningTheme::title()),
        Span::styled(
            " │ Questionnaire & background",
            ScreeningTheme::text_secondary(),
        ),
    ]))
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(ScreeningTheme::border()),
    );

    f.render_widget(header, area);
}

/// Render a titled section laying `range` out in a grid of `columns`.
fn render_section(
    f: &mut Frame,
    area: Rect,
    title: &str,
    state: &ScreeningFormState,
    range: std::ops::Range<usize>,
    columns: usize,
) {
    let block = Block::default()
        .title(Span::styled(format!(" {title} "), ScreeningTheme::section()))
        .borders(Borders::TOP)
        .border_style(ScreeningTheme::border());
    let inner = block.inner(area);
    f.render_widget(block, area);

    let indices: Vec<usize> = range.collect();
    let rows: Vec<&[usize]> = indices.chunks(columns).collect();
    let row_areas = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            rows.iter()
                .map(|_| Constraint::Length(3))
                .chain(std::iter::once(Constraint::Min(0)))
                .collect::<Vec<_>>(),
        )
        .split(inner);

    for (row, row_area) in rows.iter().zip(row_areas.iter()) {
        let cells = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(vec![Constraint::Ratio(1, columns as u32); columns])
            .split(*row_area);
        for (idx, cell) in row.iter().zip(cells.iter()) {
            render_field(f, *cell, &state.fields[*idx], *idx == state.selected_field);
        }
    }
}

fn render_field(f: &mut Frame, area: Rect, field: &FormField, is_selected: bool) {
    let (border_style, title_style) = if is_selected {
        (ScreeningTheme::border_focused(), ScreeningTheme::focused())
    } else {
        (ScreeningTheme::border(), ScreeningTheme::text_secondary())
    };

    let block = Block::default()
        .title(Span::styled(format!(" {} ", field.label), title_style))
        .borders(Borders::ALL)
        .border_style(border_style);

    let (text, is_hint) = field.display();
    let value_style = if is_hint {
        ScreeningTheme::text_muted()
    } else {
        ScreeningTheme::text()
    };
    let cursor = if is_selected && matches!(field.kind, FieldKind::Number { .. }) {
        Span::styled("▌", ScreeningTheme::cursor())
    } else {
        Span::raw("")
    };

    let content = Paragraph::new(Line::from(vec![
        Span::raw(" "),
        Span::styled(text, value_style),
        cursor,
    ]))
    .block(block);

    f.render_widget(content, area);
}

fn render_form_footer(f: &mut Frame, area: Rect, state: &ScreeningFormState) {
    let content = if let Some(err) = &state.error_message {
        Line::from(vec![
            Span::styled("! ", ScreeningTheme::danger()),
            Span::styled(err.clone(), ScreeningTheme::danger()),
        ])
    } else {
        Line::from(vec![
            Span::styled("[↑↓/Tab] ", ScreeningTheme::key_hint()),
            Span::styled("Navigate ", ScreeningTheme::key_desc()),
            Span::styled("[←→/Space] ", ScreeningTheme::key_hint()),
            Span::styled("Change ", ScreeningTheme::key_desc()),
            Span::styled("[Enter] ", ScreeningTheme::key_hint()),
            Span::styled("Predict ", ScreeningTheme::key_desc()),
            Span::styled("[Esc] ", ScreeningTheme::key_hint()),
            Span::styled("Quit", ScreeningTheme::key_desc()),
        ])
    };

    let footer = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(ScreeningTheme::border()),
    );

    f.render_widget(footer, area);
}
