//! Month-grid calendar keyboard for browsing found items by date.

use chrono::{Datelike, Months, NaiveDate};
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::telegram::action::CallbackAction;

fn button(label: &str, action: CallbackAction) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(label, action.encode())
}

fn pad() -> InlineKeyboardButton {
    button(" ", CallbackAction::Ignore)
}

/// First day of the month `month_offset` months away from `today`.
pub fn month_start(today: NaiveDate, month_offset: i32) -> NaiveDate {
    let anchor = today.with_day(1).unwrap_or(today);
    if month_offset >= 0 {
        anchor + Months::new(month_offset as u32)
    } else {
        anchor - Months::new(month_offset.unsigned_abs())
    }
}

/// Build the calendar keyboard for the month `month_offset` months from today.
pub fn keyboard(today: NaiveDate, month_offset: i32) -> InlineKeyboardMarkup {
    let first = month_start(today, month_offset);
    let next_month = first + Months::new(1);
    let days = next_month.signed_duration_since(first).num_days() as u32;

    let mut rows = vec![
        vec![
            button("«", CallbackAction::CalendarNav { month_offset: month_offset - 1 }),
            button(&first.format("%B %Y").to_string(), CallbackAction::Ignore),
            button("»", CallbackAction::CalendarNav { month_offset: month_offset + 1 }),
        ],
        ["Mo", "Tu", "We", "Th", "Fr", "Sa", "Su"]
            .iter()
            .map(|d| button(d, CallbackAction::Ignore))
            .collect(),
    ];

    let lead = first.weekday().num_days_from_monday() as usize;
    let mut row: Vec<InlineKeyboardButton> = (0..lead).map(|_| pad()).collect();
    for day in 1..=days {
        if let Some(date) = first.with_day(day) {
            row.push(button(&day.to_string(), CallbackAction::CalendarDay { date }));
        }
        if row.len() == 7 {
            rows.push(std::mem::take(&mut row));
        }
    }
    if !row.is_empty() {
        while row.len() < 7 {
            row.push(pad());
        }
        rows.push(row);
    }

    InlineKeyboardMarkup::new(rows)
}
