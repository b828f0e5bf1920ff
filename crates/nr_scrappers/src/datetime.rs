//! Free-text publication dates, as displayed on listing cards, normalized
//! to UTC timestamps.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use nr_core::{Error, Result};

// The display formats the newsroom has been seen using, most common
// first. Date-only forms resolve to midnight UTC.
const DATE_FORMATS: &[&str] = &["%B %d, %Y", "%b %d, %Y", "%d %B %Y", "%m/%d/%Y", "%Y-%m-%d"];

pub fn normalize(raw: &str) -> Result<DateTime<Utc>> {
    let cleaned = raw.trim();
    if cleaned.is_empty() {
        return Err(Error::Scraping("empty date text".to_string()));
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(cleaned) {
        return Ok(parsed.with_timezone(&Utc));
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(cleaned, format) {
            return Ok(date.and_time(NaiveTime::MIN).and_utc());
        }
    }
    Err(Error::Scraping(format!("unrecognized date text `{cleaned}`")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_long_month_names() {
        let expected = Utc.with_ymd_and_hms(2025, 5, 6, 0, 0, 0).unwrap();
        assert_eq!(normalize("May 6, 2025").unwrap(), expected);
        assert_eq!(normalize("  May 6, 2025  ").unwrap(), expected);
    }

    #[test]
    fn parses_abbreviated_month_names() {
        let expected = Utc.with_ymd_and_hms(2024, 9, 3, 0, 0, 0).unwrap();
        assert_eq!(normalize("Sep 03, 2024").unwrap(), expected);
    }

    #[test]
    fn parses_day_first_forms() {
        let expected = Utc.with_ymd_and_hms(2024, 11, 2, 0, 0, 0).unwrap();
        assert_eq!(normalize("2 November 2024").unwrap(), expected);
    }

    #[test]
    fn parses_numeric_forms() {
        let expected = Utc.with_ymd_and_hms(2024, 5, 6, 0, 0, 0).unwrap();
        assert_eq!(normalize("05/06/2024").unwrap(), expected);
        assert_eq!(normalize("2024-05-06").unwrap(), expected);
    }

    #[test]
    fn passes_rfc3339_through() {
        let expected = Utc.with_ymd_and_hms(2024, 5, 6, 10, 30, 0).unwrap();
        assert_eq!(normalize("2024-05-06T10:30:00Z").unwrap(), expected);
    }

    #[test]
    fn rejects_garbage_and_empties() {
        assert!(normalize("yesterday-ish").is_err());
        assert!(normalize("").is_err());
        assert!(normalize("   ").is_err());
    }
}
