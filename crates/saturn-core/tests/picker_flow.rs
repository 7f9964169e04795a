use std::cell::RefCell;
use std::rc::Rc;

use chrono::{Datelike, NaiveDate, Weekday};
use saturn_core::adapter::{DateAdapter, NativeDateAdapter, Parsed};
use saturn_core::datepicker::{Datepicker, PickerOptions};
use saturn_core::focus::DetachedFocus;
use saturn_core::range::{Bound, PickerValue, RangeValue, SelectionMode};

type Picker = Datepicker<NativeDateAdapter, DetachedFocus>;

fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

fn picker(options: PickerOptions<NativeDateAdapter>) -> (Picker, Rc<RefCell<Vec<String>>>) {
    let mut picker = Datepicker::new(Rc::new(NativeDateAdapter::default()), options, DetachedFocus);
    let input = picker.new_input();
    picker.register_input(input).expect("first input binds");

    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    picker.subscribe(move |event| sink.borrow_mut().push(event.name().to_string()));
    (picker, events)
}

fn range_picker(start_at: NaiveDate) -> (Picker, Rc<RefCell<Vec<String>>>) {
    picker(PickerOptions {
        initial_selection_mode: Some(SelectionMode::Range),
        start_at: Some(start_at),
        ..PickerOptions::default()
    })
}

fn value(picker: &Picker) -> Option<PickerValue<NaiveDate>> {
    picker.input().and_then(|input| input.value().cloned())
}

#[test]
fn two_clicks_complete_a_range() {
    let (mut picker, events) = range_picker(ymd(2024, 1, 1));
    picker.open().expect("opens");
    picker.click_cell(5);
    assert_eq!(picker.begin_date_selected(), Some(&ymd(2024, 1, 5)));
    assert!(picker.is_opened());

    picker.click_cell(20);
    picker.run_pending_tasks();

    assert_eq!(
        value(&picker),
        Some(PickerValue::Range(RangeValue::new(
            Some(Bound::Date(ymd(2024, 1, 5))),
            Some(Bound::Date(ymd(2024, 1, 20))),
        )))
    );
    assert!(!picker.is_opened());
    assert_eq!(picker.begin_date_selected(), None);
    assert_eq!(events.borrow().last().map(String::as_str), Some("closed"));
}

#[test]
fn reversed_clicks_are_swapped() {
    let (mut picker, _) = range_picker(ymd(2024, 1, 1));
    picker.open().expect("opens");
    picker.click_cell(20);
    picker.click_cell(5);

    assert_eq!(picker.begin_date(), Some(&Bound::Date(ymd(2024, 1, 5))));
    assert_eq!(picker.end_date(), Some(&Bound::Date(ymd(2024, 1, 20))));
}

#[test]
fn disabled_cells_emit_nothing() {
    let (mut picker, events) = picker(PickerOptions {
        start_at: Some(ymd(2024, 1, 15)),
        min: Some(ymd(2024, 1, 10)),
        max: Some(ymd(2024, 1, 25)),
        date_filter: Some(Rc::new(|date: &NaiveDate| date.weekday() != Weekday::Sat)),
        ..PickerOptions::default()
    });
    picker.open().expect("opens");
    let before = events.borrow().len();

    let calendar = picker.calendar().expect("open calendar");
    let enabled: Vec<(u32, bool)> = calendar
        .body()
        .rows()
        .iter()
        .flatten()
        .map(|cell| (cell.value, cell.enabled))
        .collect();
    assert!(enabled.contains(&(9, false)));
    assert!(enabled.contains(&(26, false)));
    // 2024-01-13 is a Saturday.
    assert!(enabled.contains(&(13, false)));
    assert!(enabled.contains(&(15, true)));

    for day in [9, 13, 26] {
        picker.click_cell(day);
    }
    assert_eq!(events.borrow().len(), before);
    assert_eq!(value(&picker), None);
    assert!(picker.is_opened());
}

#[test]
fn close_is_idempotent() {
    let (mut picker, events) = range_picker(ymd(2024, 1, 1));
    picker.open().expect("opens");
    picker.close();
    picker.close();
    picker.run_pending_tasks();

    let closed = events.borrow().iter().filter(|name| *name == "closed").count();
    assert_eq!(closed, 1);
}

#[test]
fn written_ranges_infer_the_mode() {
    let (mut picker, _) = picker(PickerOptions::default());
    assert_eq!(picker.selection_mode(), SelectionMode::Date);

    picker
        .write_value(Some(PickerValue::Range(RangeValue::since(ymd(2024, 1, 1)))))
        .expect("input bound");
    assert_eq!(picker.selection_mode(), SelectionMode::Since);

    picker
        .write_value(Some(PickerValue::Range(RangeValue::until(ymd(2024, 1, 1)))))
        .expect("input bound");
    assert_eq!(picker.selection_mode(), SelectionMode::Until);
}

#[test]
fn typed_range_round_trips() {
    let (mut picker, events) = range_picker(ymd(2024, 1, 1));
    picker.type_text("2024-01-05 - 2024-01-20").expect("input bound");

    let input = picker.input().expect("bound input");
    assert!(input.is_valid());
    let shown = value(&picker)
        .map(|value| input.format_value(&value))
        .expect("parsed value");
    assert_eq!(shown, "2024-01-05 - 2024-01-20");
    assert!(events.borrow().contains(&"value_changed".to_string()));

    let adapter = NativeDateAdapter::default();
    let date = ymd(2024, 2, 29);
    let text = adapter.format(&date, "%Y-%m-%d").expect("formats");
    assert_eq!(adapter.parse(&text, "%Y-%m-%d"), Parsed::Valid(date));
}

#[test]
fn next_and_previous_cross_the_year() {
    let (mut picker, _) = range_picker(ymd(2024, 12, 15));
    picker.open().expect("opens");
    let calendar = picker.calendar_mut().expect("open calendar");

    calendar.next_clicked();
    assert_eq!(*calendar.active_date(), ymd(2025, 1, 15));
    calendar.previous_clicked();
    assert_eq!(*calendar.active_date(), ymd(2024, 12, 15));
}

#[test]
fn inner_days_are_semi_selected() {
    let (mut picker, _) = range_picker(ymd(2024, 1, 1));
    picker
        .write_value(Some(PickerValue::Range(RangeValue::new(
            Some(Bound::Date(ymd(2024, 1, 5))),
            Some(Bound::Date(ymd(2024, 1, 20))),
        ))))
        .expect("input bound");
    picker.open().expect("opens");

    let body = picker.calendar().expect("open calendar").body();
    assert!(body.is_semi_selected(10));
    assert!(!body.is_semi_selected(5));
    assert!(!body.is_semi_selected(20));
    assert!(body.is_begin(5));
    assert!(body.is_end(20));
}

#[test]
fn hovering_a_month_before_the_pending_begin() {
    let (mut picker, events) = range_picker(ymd(2024, 2, 10));
    picker.open().expect("opens");
    picker.click_cell(15);
    assert!(events.borrow().contains(&"begin_date_selected".to_string()));

    picker.calendar_mut().expect("open calendar").previous_clicked();
    picker.hover_cell(10);

    let body = picker.calendar().expect("open calendar").body();
    let marks = body.marks();
    assert!(marks.begin_selected);
    assert!(marks.is_before_selected);
    assert_eq!(marks.begin, None);

    assert!(body.is_begin(10));
    assert!(!body.is_begin(9));
    assert!(!body.is_end(10));
    assert!(!body.is_end(31));
    assert!(body.is_between_over_and_begin(20));
    assert!(!body.is_between_over_and_begin(5));
}

#[test]
fn unparsable_text_keeps_the_last_good_date() {
    let (mut picker, events) = picker(PickerOptions::default());
    picker.type_text("2024-05-06").expect("input bound");
    assert_eq!(picker.selected(), Some(&ymd(2024, 5, 6)));
    let before = events.borrow().len();

    picker.type_text("2024-05-0x").expect("input bound");
    assert_eq!(picker.selected(), Some(&ymd(2024, 5, 6)));
    assert_eq!(value(&picker), Some(PickerValue::Date(ymd(2024, 5, 6))));
    assert_eq!(events.borrow().len(), before);

    let input = picker.input().expect("bound input");
    assert_eq!(input.text(), "2024-05-0x");
    let keys: Vec<&str> = input.validate().iter().map(|error| error.key()).collect();
    assert_eq!(keys, vec!["parse"]);
}
