use anyhow::{Context, Result};
use time::macros::format_description;
use time::{Date, OffsetDateTime};

/// Calendar date in the machine's local offset, falling back to UTC when the
/// offset cannot be determined.
pub(crate) fn today_local() -> Date {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc()).date()
}

pub(crate) fn format_date(value: Date) -> String {
    value
        .format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| value.to_string())
}

pub(crate) fn parse_date(value: &str) -> Result<Date> {
    Date::parse(value.trim(), format_description!("[year]-[month]-[day]"))
        .with_context(|| format!("Invalid date '{value}', expected YYYY-MM-DD"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Month;

    #[test]
    fn format_date_pads_month_and_day() {
        let date = Date::from_calendar_date(2024, Month::January, 1).unwrap();
        assert_eq!(format_date(date), "2024-01-01");
    }

    #[test]
    fn parse_date_accepts_iso_dates() {
        let date = parse_date(" 2025-03-09 ").unwrap();
        assert_eq!(date, Date::from_calendar_date(2025, Month::March, 9).unwrap());
    }

    #[test]
    fn parse_date_rejects_other_layouts() {
        assert!(parse_date("09/03/2025").is_err());
        assert!(parse_date("2025-02-30").is_err());
    }
}
