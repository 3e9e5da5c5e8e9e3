//! Publication date parsing for Ukrainian listing dates such as `15 травня 2023`.

use chrono::{Datelike, Days, Local, NaiveDate};

/// Month names in the genitive case, as used after a day number
const MONTHS: [&str; 12] = [
    "січня",
    "лютого",
    "березня",
    "квітня",
    "травня",
    "червня",
    "липня",
    "серпня",
    "вересня",
    "жовтня",
    "листопада",
    "грудня",
];

const TODAY: &str = "сьогодні";
const YESTERDAY: &str = "вчора";

/// Current date in the local timezone
pub fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

/// Month number (1-12) for a month name, ignoring case
pub fn month_number(name: &str) -> Option<u32> {
    let name = name.to_lowercase();
    MONTHS
        .iter()
        .position(|month| *month == name)
        .map(|idx| idx as u32 + 1)
}

/// Resolve a listing date, falling back to `today` whenever the text can't be read.
///
/// Accepts `<day> <month> [<year>] ...`. Without a year the date is placed in
/// `today`'s year. `сьогодні` and `вчора` resolve relative to `today`.
pub fn normalize_date(text: &str, today: NaiveDate) -> NaiveDate {
    let parts: Vec<&str> = text.split_whitespace().collect();

    match parts.first().map(|word| word.to_lowercase()) {
        Some(word) if word == TODAY => return today,
        Some(word) if word == YESTERDAY => {
            return today.checked_sub_days(Days::new(1)).unwrap_or(today)
        }
        _ => {}
    }

    parse_day_month_year(&parts, today.year()).unwrap_or(today)
}

fn parse_day_month_year(parts: &[&str], current_year: i32) -> Option<NaiveDate> {
    let (day, month) = match parts {
        [day, month, ..] => (*day, *month),
        _ => return None,
    };

    let month = month_number(month)?;
    let day = parse_digits::<u32>(day).filter(|day| *day > 0)?;
    let year = match parts.get(2) {
        Some(year) if is_digits(year) => year.parse().ok()?,
        _ => current_year,
    };

    NaiveDate::from_ymd_opt(year, month, day)
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

fn parse_digits<T: std::str::FromStr>(s: &str) -> Option<T> {
    if is_digits(s) {
        s.parse().ok()
    } else {
        None
    }
}
