//! Date helper functions

use chrono::{DateTime, Datelike, FixedOffset, TimeZone, Timelike, Utc};
use chrono_tz::Tz;

const MONTHS_PT: [&str; 12] = [
    "jan", "fev", "mar", "abr", "mai", "jun", "jul", "ago", "set", "out", "nov", "dez",
];

const MONTHS_EN: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Resolve a timezone name like `America/Sao_Paulo`, falling back to UTC
pub fn parse_timezone(name: &str) -> Tz {
    if name.is_empty() {
        return Tz::UTC;
    }
    name.parse::<Tz>().unwrap_or_else(|_| {
        tracing::warn!("Unknown timezone {:?}, using UTC", name);
        Tz::UTC
    })
}

fn is_portuguese(lang: &str) -> bool {
    lang.to_ascii_lowercase().starts_with("pt")
}

/// Abbreviated month name (1-based month)
pub fn short_month(month: u32, lang: &str) -> &'static str {
    let index = (month.clamp(1, 12) - 1) as usize;
    if is_portuguese(lang) {
        MONTHS_PT[index]
    } else {
        MONTHS_EN[index]
    }
}

/// Format as `dd MMM yyyy` in the site timezone, e.g. `25 mar 2021`
pub fn format_day(date: &DateTime<FixedOffset>, tz: Tz, lang: &str) -> String {
    let local = tz.from_utc_datetime(&date.naive_utc());
    format!(
        "{:02} {} {}",
        local.day(),
        short_month(local.month(), lang),
        local.year()
    )
}

/// Format with the time of day, e.g. `25 mar 2021, às 19:25`
pub fn format_day_time(date: &DateTime<FixedOffset>, tz: Tz, lang: &str) -> String {
    let local = tz.from_utc_datetime(&date.naive_utc());
    let joiner = if is_portuguese(lang) { "às" } else { "at" };
    format!(
        "{}, {} {:02}:{:02}",
        format_day(date, tz, lang),
        joiner,
        local.hour(),
        local.minute()
    )
}

/// Format in ISO 8601 for `<time datetime="...">`
pub fn date_xml(date: &DateTime<FixedOffset>) -> String {
    date.with_timezone(&Utc)
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::parse_timestamp;

    #[test]
    fn test_format_day_portuguese() {
        let date = parse_timestamp("2021-03-25T19:25:28+0000").unwrap();
        assert_eq!(format_day(&date, Tz::UTC, "pt-BR"), "25 mar 2021");
    }

    #[test]
    fn test_format_day_english() {
        let date = parse_timestamp("2021-08-05T19:25:28+0000").unwrap();
        assert_eq!(format_day(&date, Tz::UTC, "en"), "05 Aug 2021");
    }

    #[test]
    fn test_format_day_uses_timezone() {
        // 01:00 UTC is still the previous day in Sao Paulo (UTC-3)
        let date = parse_timestamp("2021-03-26T01:00:00+0000").unwrap();
        let tz = parse_timezone("America/Sao_Paulo");
        assert_eq!(format_day(&date, tz, "pt-BR"), "25 mar 2021");
        assert_eq!(format_day_time(&date, tz, "pt-BR"), "25 mar 2021, às 22:00");
    }

    #[test]
    fn test_unknown_timezone_is_utc() {
        assert_eq!(parse_timezone("Mars/Olympus"), Tz::UTC);
        assert_eq!(parse_timezone(""), Tz::UTC);
    }

    #[test]
    fn test_date_xml() {
        let date = parse_timestamp("2021-03-25T19:25:28-0300").unwrap();
        assert_eq!(date_xml(&date), "2021-03-25T22:25:28.000Z");
    }
}
