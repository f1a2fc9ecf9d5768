use chrono::NaiveDate;
use marketplace_portal::attendance::{AttendanceError, AttendanceSheet};

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 2, d).unwrap()
}

#[test]
fn test_toggle_flips_presence() {
    let mut sheet = AttendanceSheet::new("batch-1", "student-1");
    let today = day(20);

    assert_eq!(sheet.toggle(day(10), today), Ok(true));
    assert!(sheet.is_present(day(10)));

    assert_eq!(sheet.toggle(day(10), today), Ok(false));
    assert!(!sheet.is_present(day(10)));
}

#[test]
fn test_future_days_cannot_be_marked() {
    let mut sheet = AttendanceSheet::new("batch-1", "student-1");
    assert_eq!(
        sheet.toggle(day(21), day(20)),
        Err(AttendanceError::FutureDate(day(21)))
    );
    assert!(!sheet.is_present(day(21)));
    // Today itself is allowed.
    assert_eq!(sheet.toggle(day(20), day(20)), Ok(true));
}

#[test]
fn test_month_view_covers_every_day() {
    let mut sheet = AttendanceSheet::new("batch-1", "student-1");
    sheet.toggle(day(3), day(15)).unwrap();

    let cells = sheet.month(2026, 2, day(15)).unwrap();
    assert_eq!(cells.len(), 28);
    assert_eq!(cells[0].date, day(1));
    assert!(cells[2].present);
    assert!(!cells[14].future);
    assert!(cells[15].future);
}

#[test]
fn test_invalid_month_rejected() {
    let sheet = AttendanceSheet::new("batch-1", "student-1");
    assert_eq!(
        sheet.month(2026, 13, day(1)),
        Err(AttendanceError::InvalidMonth { year: 2026, month: 13 })
    );
}

#[test]
fn test_rate_counts_only_elapsed_days() {
    let mut sheet = AttendanceSheet::new("batch-1", "student-1");
    for d in [1, 2, 3] {
        sheet.toggle(day(d), day(4)).unwrap();
    }

    // Range runs to the 28th but only four days have elapsed.
    assert_eq!(sheet.rate(day(1), day(28), day(4)), 0.75);
    assert_eq!(sheet.rate(day(10), day(28), day(4)), 0.0);
}

#[test]
fn test_sheet_exports_to_browser_shape() {
    use utoipa::ToSchema;

    let mut sheet = AttendanceSheet::new("batch-1", "student-1");
    sheet.toggle(day(3), day(15)).unwrap();

    let json = serde_json::to_value(&sheet).unwrap();
    assert_eq!(json["batchId"], "batch-1");
    assert_eq!(json["present"], serde_json::json!(["2026-02-03"]));

    let cell = serde_json::to_value(&sheet.month(2026, 2, day(15)).unwrap()[2]).unwrap();
    assert_eq!(cell["date"], "2026-02-03");
    assert_eq!(cell["present"], true);

    assert_eq!(AttendanceSheet::name(), "AttendanceSheet");
    assert_eq!(marketplace_portal::attendance::DayCell::name(), "DayCell");
}
