// libs/appointment-cell/tests/date_resolver_test.rs
use chrono::NaiveDate;

use appointment_cell::services::DateResolver;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// ==============================================================================
// EXPLICIT DATE FORMATS
// ==============================================================================

#[test]
fn test_iso_past_date_clamps_to_reference() {
    let resolver = DateResolver::new();
    assert_eq!(resolver.resolve("2025-01-01", date(2025, 6, 1)), date(2025, 6, 1));
}

#[test]
fn test_iso_future_date_is_kept() {
    let resolver = DateResolver::new();
    assert_eq!(resolver.resolve("2025-07-15", date(2025, 6, 1)), date(2025, 7, 15));
    assert_eq!(resolver.resolve("ngày 2025-07-15 nhé", date(2025, 6, 1)), date(2025, 7, 15));
}

#[test]
fn test_iso_impossible_date_resolves_to_reference() {
    let resolver = DateResolver::new();
    assert_eq!(resolver.resolve("2025-13-40", date(2025, 6, 1)), date(2025, 6, 1));
}

#[test]
fn test_day_first_format() {
    let resolver = DateResolver::new();
    let reference = date(2025, 6, 1);

    assert_eq!(resolver.resolve("05/07/2025", reference), date(2025, 7, 5));
    assert_eq!(resolver.resolve("05/01/2025", reference), reference);
    assert_eq!(resolver.resolve("31/02/2025", reference), reference);
}

// ==============================================================================
// KEYWORDS
// ==============================================================================

#[test]
fn test_relative_keywords() {
    let resolver = DateResolver::new();
    let reference = date(2026, 10, 17);

    assert_eq!(resolver.resolve("today", reference), reference);
    assert_eq!(resolver.resolve("Hôm nay", reference), reference);
    assert_eq!(resolver.resolve("tomorrow", reference), date(2026, 10, 18));
    assert_eq!(resolver.resolve("ngày mai", reference), date(2026, 10, 18));
    assert_eq!(resolver.resolve("  Ngày   Mai ", reference), date(2026, 10, 18));
    assert_eq!(resolver.resolve("day after tomorrow", reference), date(2026, 10, 19));
    assert_eq!(resolver.resolve("ngày kia", reference), date(2026, 10, 19));
}

#[test]
fn test_next_weekday_on_same_weekday_advances_a_week() {
    let resolver = DateResolver::new();
    let monday = date(2026, 10, 19);

    assert_eq!(resolver.resolve("next monday", monday), date(2026, 10, 26));
    assert_eq!(resolver.resolve("thứ hai tới", monday), date(2026, 10, 26));
}

#[test]
fn test_next_weekday_variants() {
    let resolver = DateResolver::new();
    let saturday = date(2026, 10, 17);

    assert_eq!(resolver.resolve("next friday", saturday), date(2026, 10, 23));
    assert_eq!(resolver.resolve("thứ 6 tuần sau", saturday), date(2026, 10, 23));
    assert_eq!(resolver.resolve("tuần sau thứ ba", saturday), date(2026, 10, 20));
    assert_eq!(resolver.resolve("chủ nhật tới", saturday), date(2026, 10, 18));
}

#[test]
fn test_day_offsets() {
    let resolver = DateResolver::new();
    let reference = date(2026, 10, 17);

    assert_eq!(resolver.resolve("in 3 days", reference), date(2026, 10, 20));
    assert_eq!(resolver.resolve("5 ngày nữa", reference), date(2026, 10, 22));
    assert_eq!(resolver.resolve("1 day", reference), date(2026, 10, 18));
}

#[test]
fn test_unrecognized_text_falls_back_to_tomorrow() {
    let resolver = DateResolver::new();
    let reference = date(2025, 6, 1);

    assert_eq!(resolver.resolve("gibberish text", reference), date(2025, 6, 2));
    assert_eq!(resolver.resolve("", reference), date(2025, 6, 2));
}

// ==============================================================================
// VALIDATION AND FORMATTING
// ==============================================================================

#[test]
fn test_is_valid() {
    let today = date(2026, 10, 17);
    assert!(DateResolver::is_valid(today, today));
    assert!(DateResolver::is_valid(date(2026, 10, 18), today));
    assert!(!DateResolver::is_valid(date(2026, 10, 16), today));
}

#[test]
fn test_format_with_weekday() {
    assert_eq!(DateResolver::format_with_weekday("2026-10-19"), "Thứ Hai, 19/10/2026");
    assert_eq!(DateResolver::format_with_weekday("2026-10-18"), "Chủ Nhật, 18/10/2026");
    assert_eq!(DateResolver::format_with_weekday("not a date"), "not a date");
}
