use std::cell::RefCell;
use std::rc::Rc;

use anyhow::{Context, anyhow};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::adapter::{DateAdapter, NativeDateAdapter, Parsed};
use crate::body::CellState;
use crate::calendar::Calendar;
use crate::cli::{Command, Step};
use crate::config::PickerConfig;
use crate::datepicker::{Datepicker, PickerOptions};
use crate::focus::DetachedFocus;
use crate::panels::PanelSlot;
use crate::range::{RawValue, SelectionMode};
use crate::render::Renderer;
use crate::view::CalendarView;

type Picker = Datepicker<NativeDateAdapter, DetachedFocus>;

#[derive(Debug, Serialize)]
struct GridReport {
    view: CalendarView,
    period: String,
    previous_enabled: bool,
    next_enabled: bool,
    weekdays: Vec<String>,
    rows: Vec<Vec<CellState>>,
}

#[derive(Debug, Serialize)]
struct ErrorReport {
    key: String,
    message: String,
}

#[derive(Debug, Serialize)]
struct PickReport {
    mode: SelectionMode,
    opened: bool,
    events: Vec<String>,
    value: Option<RawValue>,
    text: String,
    errors: Vec<ErrorReport>,
}

#[derive(Debug, Serialize)]
struct ParseReport {
    text: String,
    mode: SelectionMode,
    valid: bool,
    value: Option<RawValue>,
    errors: Vec<ErrorReport>,
}

#[instrument(skip(cfg, renderer, command))]
pub fn dispatch(
    cfg: &PickerConfig,
    renderer: &Renderer,
    command: Command,
    json: bool,
) -> anyhow::Result<()> {
    match command {
        Command::Month {
            date,
            view,
            mode,
            select,
        } => cmd_month(cfg, renderer, date, view, mode, select, json),
        Command::Pick { mode, steps } => cmd_pick(cfg, renderer, mode, steps, json),
        Command::Parse { text, mode } => cmd_parse(cfg, renderer, &text, mode, json),
        Command::Config => cmd_config(cfg, json),
    }
}

/// A picker with its input bound, built from the config.
fn build_picker(
    cfg: &PickerConfig,
    start_at: Option<&str>,
    start_view: Option<CalendarView>,
    mode: Option<SelectionMode>,
) -> anyhow::Result<(Picker, Rc<RefCell<Vec<String>>>)> {
    let adapter = cfg.adapter();
    let mut options = PickerOptions::from_config(cfg, &adapter)?;
    if let Some(raw) = start_at {
        options.start_at = match adapter.deserialize(raw) {
            Parsed::Valid(date) => Some(date),
            Parsed::Empty => None,
            Parsed::Invalid => return Err(anyhow!("`{raw}` is not an ISO 8601 date")),
        };
    }
    if let Some(view) = start_view {
        options.start_view = view;
    }

    let mut picker = Datepicker::new(Rc::new(adapter), options, DetachedFocus);
    let input = picker.new_input();
    picker.register_input(input)?;
    if let Some(mode) = mode {
        picker.set_selection_mode(mode)?;
    }

    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    picker.subscribe(move |event| sink.borrow_mut().push(event.name().to_string()));
    Ok((picker, events))
}

fn error_reports(picker: &Picker) -> Vec<ErrorReport> {
    picker
        .input()
        .map(|input| input.validate())
        .unwrap_or_default()
        .iter()
        .map(|error| ErrorReport {
            key: error.key().to_string(),
            message: error.to_string(),
        })
        .collect()
}

fn grid_report<A: DateAdapter>(calendar: &Calendar<A>) -> GridReport {
    let body = calendar.body();
    let rows: Vec<Vec<CellState>> = body
        .rows()
        .iter()
        .enumerate()
        .map(|(row, cells)| {
            (0..cells.len())
                .filter_map(|col| body.cell_state(row, col))
                .collect()
        })
        .collect();
    GridReport {
        view: calendar.current_view(),
        period: calendar.period_label(),
        previous_enabled: calendar.previous_enabled(),
        next_enabled: calendar.next_enabled(),
        weekdays: calendar
            .month_view()
            .map(|month| month.weekdays().iter().map(|day| day.long.clone()).collect())
            .unwrap_or_default(),
        rows,
    }
}

fn cmd_month(
    cfg: &PickerConfig,
    renderer: &Renderer,
    date: Option<String>,
    view: Option<CalendarView>,
    mode: Option<SelectionMode>,
    select: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let (mut picker, _) = build_picker(cfg, date.as_deref(), view, mode)?;
    if let Some(text) = select {
        picker.type_text(&text)?;
    }
    picker.open()?;
    let calendar = picker
        .calendar()
        .ok_or_else(|| anyhow!("calendar did not open; is the picker disabled?"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&grid_report(calendar))?);
    } else {
        renderer.print_calendar(calendar)?;
    }
    Ok(())
}

fn cmd_pick(
    cfg: &PickerConfig,
    renderer: &Renderer,
    mode: Option<SelectionMode>,
    steps: Vec<Step>,
    json: bool,
) -> anyhow::Result<()> {
    let (mut picker, events) = build_picker(cfg, None, None, mode)?;
    for (index, step) in steps.into_iter().enumerate() {
        debug!(index, ?step, "applying step");
        apply_step(&mut picker, step).with_context(|| format!("step {} failed", index + 1))?;
        picker.run_pending_tasks();
    }

    let input = picker.input().ok_or_else(|| anyhow!("picker lost its input"))?;
    let report = PickReport {
        mode: picker.selection_mode(),
        opened: picker.is_opened(),
        events: events.borrow().clone(),
        value: input.raw_value(),
        text: input.text().to_string(),
        errors: error_reports(&picker),
    };
    info!(events = report.events.len(), "pick finished");

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    for event in &report.events {
        println!("event  {event}");
    }
    println!("mode   {}", report.mode);
    println!("value  {}", report.text);
    for error in &report.errors {
        println!("error  {}: {}", error.key, error.message);
    }
    if let Some(calendar) = picker.calendar() {
        renderer.print_calendar(calendar)?;
    }
    Ok(())
}

pub fn apply_step(picker: &mut Picker, step: Step) -> anyhow::Result<()> {
    let calendar_step = |picker: &mut Picker, name: &str| -> anyhow::Result<()> {
        let calendar = picker
            .calendar_mut()
            .ok_or_else(|| anyhow!("`{name}` needs an open calendar"))?;
        match name {
            "previous" => calendar.previous_clicked(),
            "next" => calendar.next_clicked(),
            _ => calendar.period_clicked(),
        }
        Ok(())
    };

    match step {
        Step::Open => picker.open()?,
        Step::Close => picker.close(),
        Step::Toggle => picker.toggle()?,
        Step::Click(value) => picker.click_cell(value),
        Step::Hover(value) => picker.hover_cell(value),
        Step::Key(press) if picker.is_opened() => picker.calendar_keydown(press),
        Step::Key(press) => picker.input_keydown(press)?,
        Step::Type(text) => picker.type_text(&text)?,
        Step::Commit => picker.commit_text()?,
        Step::Blur => picker.blur_input()?,
        Step::Previous => calendar_step(picker, "previous")?,
        Step::Next => calendar_step(picker, "next")?,
        Step::Period => calendar_step(picker, "period")?,
        Step::Shortcut(key) => picker.apply_shortcut(PanelSlot::Footer, &key),
        Step::Mode(mode) => picker.set_selection_mode(mode)?,
    }
    Ok(())
}

fn cmd_parse(
    cfg: &PickerConfig,
    renderer: &Renderer,
    text: &str,
    mode: Option<SelectionMode>,
    json: bool,
) -> anyhow::Result<()> {
    let (mut picker, _) = build_picker(cfg, None, None, mode)?;
    picker.type_text(text)?;
    picker.commit_text()?;
    let input = picker.input().ok_or_else(|| anyhow!("picker lost its input"))?;

    if json {
        let errors = error_reports(&picker);
        let report = ParseReport {
            text: text.to_string(),
            mode: picker.selection_mode(),
            valid: errors.is_empty(),
            value: input.raw_value(),
            errors,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", renderer.render_validation(input));
    }
    Ok(())
}

fn cmd_config(cfg: &PickerConfig, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(cfg)?);
        return Ok(());
    }
    if let Some(path) = &cfg.loaded_from {
        println!("# loaded from {}", path.display());
    }
    print!("{}", cfg.to_toml()?);
    Ok(())
}
