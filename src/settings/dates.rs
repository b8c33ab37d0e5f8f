//! Date specifications
//!
//! | Form               | Example                  | Meaning                |
//! |--------------------|--------------------------|------------------------|
//! | `N` + `m`/`h`/`d`  | `90m`, `12h`, `14d`      | that long before now   |
//! | `YYYYMMDDHHMM`     | `201601011230`           | UTC minute             |
//! | `YYYYMMDD`         | `20160101`               | UTC midnight           |
//! | `YYYY-MM-DD`       | `2016-01-01`             | UTC midnight           |
//! | `YYYY-MM-DD HH:MM` | `2016-01-01 12:30`       | UTC minute             |
//! | RFC 3339           | `2016-01-01T12:30:00Z`   | exact instant          |

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};

use super::SettingsError;

/// Parse a date specification relative to `now`
pub fn parse_date_spec(input: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>, SettingsError> {
    let input = input.trim();
    let invalid = || SettingsError::InvalidDate(input.to_string());

    if input.is_empty() {
        return Err(invalid());
    }

    if let Some(back) = relative_offset(input) {
        return now.checked_sub_signed(back).ok_or_else(invalid);
    }

    let all_digits = input.chars().all(|c| c.is_ascii_digit());
    if all_digits && input.len() == 12 {
        return NaiveDateTime::parse_from_str(input, "%Y%m%d%H%M")
            .map(|dt| dt.and_utc())
            .map_err(|_| invalid());
    }
    if all_digits && input.len() == 8 {
        return midnight(NaiveDate::parse_from_str(input, "%Y%m%d").map_err(|_| invalid())?);
    }
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return midnight(date);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(input, "%Y-%m-%d %H:%M") {
        return Ok(dt.and_utc());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(input, "%Y-%m-%d %H:%M:%S") {
        return Ok(dt.and_utc());
    }
    DateTime::parse_from_rfc3339(input)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| invalid())
}

fn relative_offset(input: &str) -> Option<Duration> {
    let unit = input.chars().last()?.to_ascii_lowercase();
    let seconds_per_unit = match unit {
        'm' => 60.0,
        'h' => 3_600.0,
        'd' => 86_400.0,
        _ => return None,
    };
    let amount: f64 = input[..input.len() - 1].trim().parse().ok()?;
    if !amount.is_finite() || amount < 0.0 {
        return None;
    }
    Some(Duration::milliseconds((amount * seconds_per_unit * 1_000.0) as i64))
}

fn midnight(date: NaiveDate) -> Result<DateTime<Utc>, SettingsError> {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
        .ok_or_else(|| SettingsError::InvalidDate(date.to_string()))
}
