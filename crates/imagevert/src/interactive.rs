use std::path::PathBuf;

use anyhow::Result;
use ratatui::Frame;
use ratatui::crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::layout::{Constraint, Layout};
use ratatui::style::{Color, Modifier, Style, Stylize};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use tui_input::Input;
use tui_input::backend::crossterm::EventHandler;

use crate::cli::Imagevert;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    InputDir,
    OutputDir,
    InputFormat,
    OutputFormat,
    IncludeSubfolders,
    DeleteOriginal,
}

impl Field {
    const ALL: [Field; 6] = [
        Field::InputDir,
        Field::OutputDir,
        Field::InputFormat,
        Field::OutputFormat,
        Field::IncludeSubfolders,
        Field::DeleteOriginal,
    ];

    fn prompt(self) -> &'static str {
        match self {
            Field::InputDir => "Enter the input directory",
            Field::OutputDir => "Enter the output directory",
            Field::InputFormat => "Enter the input image format (e.g. tif, bmp)",
            Field::OutputFormat => "Enter the output image format (e.g. jpeg, png)",
            Field::IncludeSubfolders => "Include subfolders? (yes/no)",
            Field::DeleteOriginal => "Delete original files after conversion? (yes/no)",
        }
    }

    fn default_value(self) -> &'static str {
        match self {
            Field::InputDir => "./input",
            Field::OutputDir => "./output",
            Field::InputFormat => "tif",
            Field::OutputFormat => "jpeg",
            Field::IncludeSubfolders => "no",
            Field::DeleteOriginal => "no",
        }
    }
}

/// What to do after a key has been handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Continue,
    Submit,
    Cancel,
}

/// The form of options.
struct Form {
    inputs: [Input; 6],
    index: usize,
}

impl Form {
    /// Construct a form prefilled with options already given.
    fn new(opts: &Imagevert) -> Self {
        fn path(p: &Option<PathBuf>) -> String {
            p.as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default()
        }

        fn flag(value: bool) -> String {
            if value {
                String::from("yes")
            } else {
                String::new()
            }
        }

        Self {
            inputs: [
                Input::new(path(&opts.input_dir)),
                Input::new(path(&opts.output_dir)),
                Input::new(opts.input_format.clone().unwrap_or_default()),
                Input::new(opts.output_format.clone().unwrap_or_default()),
                Input::new(flag(opts.include_subfolders)),
                Input::new(flag(opts.delete_original)),
            ],
            index: 0,
        }
    }

    /// The value of a field, falling back to its default when empty.
    fn value(&self, field: Field) -> &str {
        let value = self.inputs[field as usize].value().trim();

        if value.is_empty() {
            field.default_value()
        } else {
            value
        }
    }

    fn yes(&self, field: Field) -> bool {
        self.value(field).eq_ignore_ascii_case("yes")
    }

    /// Write the values of the form into options.
    fn apply(&self, opts: &mut Imagevert) {
        opts.input_dir = Some(PathBuf::from(self.value(Field::InputDir)));
        opts.output_dir = Some(PathBuf::from(self.value(Field::OutputDir)));
        opts.input_format = Some(self.value(Field::InputFormat).to_owned());
        opts.output_format = Some(self.value(Field::OutputFormat).to_owned());
        opts.include_subfolders = self.yes(Field::IncludeSubfolders);
        opts.delete_original = self.yes(Field::DeleteOriginal);
    }

    fn handle(&mut self, e: &Event) -> Step {
        let Event::Key(KeyEvent { code, kind, .. }) = e else {
            return Step::Continue;
        };

        if *kind != KeyEventKind::Press {
            return Step::Continue;
        }

        let last = Field::ALL.len() - 1;

        match code {
            KeyCode::Esc => return Step::Cancel,
            KeyCode::Enter => {
                if self.index == last {
                    return Step::Submit;
                }

                self.index += 1;
            }
            KeyCode::Up | KeyCode::BackTab => {
                self.index = self.index.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Tab => {
                self.index = self.index.saturating_add(1).min(last);
            }
            _ => {
                _ = self.inputs[self.index].handle_event(e);
            }
        }

        Step::Continue
    }

    fn draw(&self, frame: &mut Frame) {
        let width = Field::ALL
            .iter()
            .map(|f| f.prompt().len() + f.default_value().len() + 5)
            .max()
            .unwrap_or_default() as u16;

        let mut constraints = vec![Constraint::Length(2)];
        constraints.extend(Field::ALL.map(|_| Constraint::Length(1)));
        constraints.push(Constraint::Min(0));
        constraints.push(Constraint::Length(1));

        let layout = Layout::vertical(constraints).split(frame.area());

        let header = Line::from(vec![
            Span::styled(
                "Welcome to imagevert!",
                Style::default().fg(Color::Cyan).bold(),
            ),
            Span::styled(
                " (Enter/↓ next, ↑ previous, Esc to quit)",
                Style::default().fg(Color::Cyan),
            ),
        ]);
        frame.render_widget(Paragraph::new(header), layout[0]);

        for (i, field) in Field::ALL.into_iter().enumerate() {
            let row = Layout::horizontal([Constraint::Length(width), Constraint::Min(1)])
                .split(layout[i + 1]);

            let is_selected = i == self.index;

            let style = if is_selected {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };

            let label = Line::from(vec![
                Span::styled(field.prompt(), style),
                Span::styled(
                    format!(" [{}]: ", field.default_value()),
                    Style::default().fg(Color::DarkGray),
                ),
            ]);
            frame.render_widget(Paragraph::new(label), row[0]);

            let input = &self.inputs[i];
            let scroll = input.visual_scroll(row[1].width.max(1) as usize - 1);
            let value = Paragraph::new(input.value()).scroll((0, scroll as u16));
            frame.render_widget(value, row[1]);

            if is_selected {
                let x = input.visual_cursor().saturating_sub(scroll) as u16;
                frame.set_cursor_position((row[1].x + x, row[1].y));
            }
        }

        let footer = Line::from(vec![Span::styled(
            "[Enter] on the last field starts the conversion",
            Style::default().fg(Color::Green),
        )]);
        frame.render_widget(Paragraph::new(footer), layout[Field::ALL.len() + 2]);
    }
}

/// Prompt for options in a terminal form.
///
/// Returns `false` if the form was cancelled.
pub(crate) fn prompt(opts: &mut Imagevert) -> Result<bool> {
    let mut form = Form::new(opts);
    let mut terminal = ratatui::init();

    let outcome = loop {
        if let Err(e) = terminal.draw(|f| form.draw(f)) {
            break Err(e);
        }

        let e = match event::read() {
            Ok(e) => e,
            Err(e) => break Err(e),
        };

        match form.handle(&e) {
            Step::Continue => {}
            Step::Submit => break Ok(true),
            Step::Cancel => break Ok(false),
        }
    };

    ratatui::restore();

    if outcome? {
        form.apply(opts);
        return Ok(true);
    }

    Ok(false)
}
