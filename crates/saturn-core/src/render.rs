use std::io::{self, IsTerminal, Write};

use unicode_width::UnicodeWidthStr;

use crate::adapter::DateAdapter;
use crate::body::{CalendarBody, CellState};
use crate::calendar::Calendar;
use crate::input::DatepickerInput;
use crate::validate::ValidationError;

/// Plain-text rendering of the calendar grid. Color is ANSI and only used
/// when asked for.
#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    /// Colors when stdout is a terminal and `NO_COLOR` is unset.
    pub fn for_stdout() -> Self {
        let no_color = std::env::var_os("NO_COLOR").is_some_and(|value| !value.is_empty());
        Self::new(!no_color && io::stdout().is_terminal())
    }

    #[tracing::instrument(skip(self, calendar))]
    pub fn print_calendar<A: DateAdapter>(&self, calendar: &Calendar<A>) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        write!(out, "{}", self.render_calendar(calendar))?;
        Ok(())
    }

    pub fn render_calendar<A: DateAdapter>(&self, calendar: &Calendar<A>) -> String {
        let body = calendar.body();
        let width = column_width(calendar);
        let columns = body.num_cols().max(1);
        let line_width = columns * (width + 2) + columns.saturating_sub(1);

        let mut lines = Vec::new();
        lines.push(header_line(
            &calendar.period_label(),
            calendar.previous_enabled(),
            calendar.next_enabled(),
            line_width,
        ));

        if let Some(month) = calendar.month_view() {
            let labels: Vec<String> = month
                .weekdays()
                .iter()
                .map(|day| format!(" {} ", pad_left(&day.narrow, width)))
                .collect();
            lines.push(labels.join(" "));
        }

        lines.extend(self.grid_lines(body, width));
        let mut text = lines.join("\n");
        text.push('\n');
        text
    }

    fn grid_lines(&self, body: &CalendarBody, width: usize) -> Vec<String> {
        let columns = body.num_cols();
        body.rows()
            .iter()
            .enumerate()
            .map(|(row, cells)| {
                let lead = if row == 0 {
                    columns.saturating_sub(cells.len())
                } else {
                    0
                };
                let mut parts = vec![" ".repeat(width + 2); lead];
                parts.extend(
                    (0..cells.len())
                        .filter_map(|col| body.cell_state(row, col))
                        .map(|state| self.cell(&state, width)),
                );
                parts.join(" ").trim_end().to_string()
            })
            .collect()
    }

    fn cell(&self, state: &CellState, width: usize) -> String {
        let open = if state.begin || state.selected {
            '['
        } else if state.semi_selected || state.between_over {
            '-'
        } else if !state.enabled {
            '~'
        } else {
            ' '
        };
        let close = if state.end || state.selected {
            ']'
        } else if state.semi_selected || state.preview_over {
            '-'
        } else if state.today {
            '*'
        } else {
            ' '
        };

        let value = pad_left(&state.display_value, width);
        let value = if state.active {
            self.paint(&value, "7")
        } else if !state.enabled {
            self.paint(&value, "2")
        } else if state.begin || state.end || state.selected {
            self.paint(&value, "1;36")
        } else if state.semi_selected {
            self.paint(&value, "36")
        } else if state.today {
            self.paint(&value, "4")
        } else {
            value
        };
        format!("{open}{value}{close}")
    }

    /// One line per failing validator, or `valid`.
    pub fn render_validation<A: DateAdapter>(&self, input: &DatepickerInput<A>) -> String {
        let errors: Vec<ValidationError<A::Date>> = input.validate();
        if errors.is_empty() {
            let text = input
                .value()
                .map(|value| input.format_value(value))
                .unwrap_or_default();
            return format!("{}: {text}\n", self.paint("valid", "32"));
        }
        errors
            .iter()
            .map(|error| format!("{}: {error}\n", self.paint(error.key(), "31")))
            .collect()
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn column_width<A: DateAdapter>(calendar: &Calendar<A>) -> usize {
    let cells = calendar
        .body()
        .rows()
        .iter()
        .flatten()
        .map(|cell| UnicodeWidthStr::width(cell.display_value.as_str()));
    let weekdays = calendar
        .month_view()
        .into_iter()
        .flat_map(|month| month.weekdays().iter())
        .map(|day| UnicodeWidthStr::width(day.narrow.as_str()));
    cells.chain(weekdays).max().unwrap_or(2).max(2)
}

fn header_line(label: &str, previous: bool, next: bool, width: usize) -> String {
    let previous = if previous { '<' } else { ' ' };
    let next = if next { '>' } else { ' ' };
    let inner = width.saturating_sub(4);
    let label_width = UnicodeWidthStr::width(label);
    let left = inner.saturating_sub(label_width) / 2;
    let right = inner.saturating_sub(label_width + left);
    format!(
        "{previous} {}{label}{} {next}",
        " ".repeat(left),
        " ".repeat(right)
    )
}

fn pad_left(text: &str, width: usize) -> String {
    let visible = UnicodeWidthStr::width(text);
    format!("{}{text}", " ".repeat(width.saturating_sub(visible)))
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use chrono::NaiveDate;

    use super::{Renderer, header_line, pad_left};
    use crate::adapter::{DateFormats, NativeDateAdapter};
    use crate::calendar::{Calendar, CalendarOptions};
    use crate::range::{Bound, SelectionMode, SelectionState};
    use crate::view::ViewContext;

    fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
    }

    fn calendar(selection: SelectionState<NaiveDate>) -> Calendar<NativeDateAdapter> {
        let mut ctx = ViewContext::new(
            Rc::new(NativeDateAdapter::default()),
            Rc::new(DateFormats::default()),
        );
        ctx.selection_mode = SelectionMode::Range;
        Calendar::new(
            ctx,
            selection,
            CalendarOptions {
                start_at: Some(ymd(2024, 1, 15)),
                ..CalendarOptions::default()
            },
        )
    }

    #[test]
    fn pads_by_display_width() {
        assert_eq!(pad_left("7", 2), " 7");
        assert_eq!(pad_left("日", 3), " 日");
        assert_eq!(pad_left("12", 1), "12");
    }

    #[test]
    fn header_centers_the_label() {
        assert_eq!(header_line("JAN 2024", true, false, 16), "<   JAN 2024    ");
    }

    #[test]
    fn month_grid_marks_the_range() {
        let selection = SelectionState {
            begin: Some(Bound::Date(ymd(2024, 1, 5))),
            end: Some(Bound::Date(ymd(2024, 1, 20))),
            ..SelectionState::default()
        };
        let text = Renderer::new(false).render_calendar(&calendar(selection));
        let lines: Vec<&str> = text.lines().collect();

        assert!(lines[0].starts_with('<'));
        assert!(lines[0].contains("2024"));
        // Jan 1 2024 is a Monday, so one blank column leads the first week.
        assert!(lines[2].starts_with("    "));
        assert!(text.contains("[ 5"));
        assert!(text.contains("20]"));
        assert!(text.contains("-10-"));
        assert!(!text.contains("\x1b["));
    }

    #[test]
    fn color_wraps_cells() {
        let text = Renderer::new(true).render_calendar(&calendar(SelectionState::default()));
        assert!(text.contains("\x1b[7m"));
    }
}
