// libs/appointment-cell/src/services/dates.rs
use chrono::{Datelike, Days, Local, NaiveDate, Weekday};
use regex::{Captures, Regex};
use tracing::debug;

const TODAY_KEYWORDS: &[&str] = &["today", "hôm nay", "hom nay", "bữa nay"];
const TOMORROW_KEYWORDS: &[&str] = &["tomorrow", "ngày mai", "ngay mai", "mai"];
const DAY_AFTER_TOMORROW_KEYWORDS: &[&str] = &[
    "day after tomorrow",
    "the day after tomorrow",
    "ngày kia",
    "ngay kia",
    "ngày mốt",
    "ngay mot",
    "mốt",
];

const VI_WEEKDAY: &str = r"thứ (?:hai|ba|tư|năm|sáu|bảy|[2-7])|chủ nhật|cn";

/// Turns free-form date expressions into calendar dates. Never fails: anything
/// it cannot make sense of resolves to the day after the reference date.
pub struct DateResolver {
    iso: Regex,
    day_first: Regex,
    next_weekday_en: Regex,
    next_weekday_vi: Regex,
    weekday_next_week_vi: Regex,
    day_offset: Regex,
}

impl Default for DateResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl DateResolver {
    pub fn new() -> Self {
        Self {
            iso: Regex::new(r"\b(\d{4})-(\d{2})-(\d{2})\b").expect("valid ISO date pattern"),
            day_first: Regex::new(r"\b(\d{1,2})/(\d{1,2})/(\d{4})\b")
                .expect("valid day-first date pattern"),
            next_weekday_en: Regex::new(
                r"\bnext (monday|tuesday|wednesday|thursday|friday|saturday|sunday)\b",
            )
            .expect("valid weekday pattern"),
            next_weekday_vi: Regex::new(&format!(
                r"(?:^|\s)({VI_WEEKDAY}) (?:tới|tuần sau|tuần tới)(?:\s|$)"
            ))
            .expect("valid weekday pattern"),
            weekday_next_week_vi: Regex::new(&format!(
                r"(?:^|\s)tuần (?:sau|tới) ({VI_WEEKDAY})(?:\s|$)"
            ))
            .expect("valid weekday pattern"),
            day_offset: Regex::new(r"(\d+) ?(?:days?|ngày)\b").expect("valid day offset pattern"),
        }
    }

    pub fn today() -> NaiveDate {
        Local::now().date_naive()
    }

    /// Resolve `expression` relative to `reference`; the first matching rule wins.
    pub fn resolve(&self, expression: &str, reference: NaiveDate) -> NaiveDate {
        let text = normalize(expression);
        let tomorrow = add_days(reference, 1).unwrap_or(reference);

        if let Some(caps) = self.iso.captures(&text) {
            let resolved = ymd_from_captures(&caps, 1, 2, 3)
                .map(|date| clamp_to_reference(date, reference))
                .unwrap_or(reference);
            debug!("Resolved ISO date '{}' to {}", expression, resolved);
            return resolved;
        }

        if let Some(caps) = self.day_first.captures(&text) {
            let resolved = ymd_from_captures(&caps, 3, 2, 1)
                .map(|date| clamp_to_reference(date, reference))
                .unwrap_or(reference);
            debug!("Resolved day-first date '{}' to {}", expression, resolved);
            return resolved;
        }

        if TODAY_KEYWORDS.contains(&text.as_str()) {
            return reference;
        }
        if TOMORROW_KEYWORDS.contains(&text.as_str()) {
            return tomorrow;
        }
        if DAY_AFTER_TOMORROW_KEYWORDS.contains(&text.as_str()) {
            return add_days(reference, 2).unwrap_or(tomorrow);
        }

        let weekday_alias = self
            .next_weekday_en
            .captures(&text)
            .or_else(|| self.next_weekday_vi.captures(&text))
            .or_else(|| self.weekday_next_week_vi.captures(&text))
            .and_then(|caps| caps.get(1).map(|m| m.as_str().to_string()));
        if let Some(target) = weekday_alias.as_deref().and_then(weekday_from_alias) {
            let resolved = next_weekday(reference, target);
            debug!("Resolved weekday expression '{}' to {}", expression, resolved);
            return resolved;
        }

        if let Some(caps) = self.day_offset.captures(&text) {
            let resolved = caps[1].parse::<u64>().ok().and_then(|n| add_days(reference, n));
            if let Some(resolved) = resolved {
                debug!("Resolved day offset '{}' to {}", expression, resolved);
                return resolved;
            }
        }

        debug!("Unrecognized date expression '{}', defaulting to tomorrow", expression);
        tomorrow
    }

    /// A date is bookable when it is not before `today`.
    pub fn is_valid(date: NaiveDate, today: NaiveDate) -> bool {
        date >= today
    }

    /// `2026-10-19` becomes `Thứ Hai, 19/10/2026`; anything unparsable is returned as given.
    pub fn format_with_weekday(text: &str) -> String {
        match NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d") {
            Ok(date) => format!("{}, {}", weekday_label(date.weekday()), date.format("%d/%m/%Y")),
            Err(_) => text.to_string(),
        }
    }
}

pub fn weekday_label(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Thứ Hai",
        Weekday::Tue => "Thứ Ba",
        Weekday::Wed => "Thứ Tư",
        Weekday::Thu => "Thứ Năm",
        Weekday::Fri => "Thứ Sáu",
        Weekday::Sat => "Thứ Bảy",
        Weekday::Sun => "Chủ Nhật",
    }
}

fn normalize(expression: &str) -> String {
    expression
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn add_days(date: NaiveDate, days: u64) -> Option<NaiveDate> {
    date.checked_add_days(Days::new(days))
}

fn clamp_to_reference(date: NaiveDate, reference: NaiveDate) -> NaiveDate {
    if date < reference {
        reference
    } else {
        date
    }
}

fn ymd_from_captures(
    caps: &Captures<'_>,
    year: usize,
    month: usize,
    day: usize,
) -> Option<NaiveDate> {
    let year = caps[year].parse::<i32>().ok()?;
    let month = caps[month].parse::<u32>().ok()?;
    let day = caps[day].parse::<u32>().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

// Same weekday as the reference always means the following week.
fn next_weekday(reference: NaiveDate, target: Weekday) -> NaiveDate {
    let mut days_ahead =
        target.num_days_from_monday() as i64 - reference.weekday().num_days_from_monday() as i64;
    if days_ahead <= 0 {
        days_ahead += 7;
    }
    add_days(reference, days_ahead as u64).unwrap_or(reference)
}

fn weekday_from_alias(alias: &str) -> Option<Weekday> {
    match alias {
        "monday" | "thứ hai" | "thứ 2" => Some(Weekday::Mon),
        "tuesday" | "thứ ba" | "thứ 3" => Some(Weekday::Tue),
        "wednesday" | "thứ tư" | "thứ 4" => Some(Weekday::Wed),
        "thursday" | "thứ năm" | "thứ 5" => Some(Weekday::Thu),
        "friday" | "thứ sáu" | "thứ 6" => Some(Weekday::Fri),
        "saturday" | "thứ bảy" | "thứ 7" => Some(Weekday::Sat),
        "sunday" | "chủ nhật" | "cn" => Some(Weekday::Sun),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_weekday_aliases() {
        assert_eq!(weekday_from_alias("thứ 6"), Some(Weekday::Fri));
        assert_eq!(weekday_from_alias("chủ nhật"), Some(Weekday::Sun));
        assert_eq!(weekday_from_alias("someday"), None);
    }

    #[test]
    fn test_next_weekday_never_returns_reference() {
        // 2026-10-19 is a Monday
        let monday = date(2026, 10, 19);
        assert_eq!(next_weekday(monday, Weekday::Mon), date(2026, 10, 26));
        assert_eq!(next_weekday(monday, Weekday::Tue), date(2026, 10, 20));
        assert_eq!(next_weekday(monday, Weekday::Sun), date(2026, 10, 25));
    }

    #[test]
    fn test_normalize_collapses_whitespace() {
        assert_eq!(normalize("  Ngày   MAI "), "ngày mai");
    }
}
