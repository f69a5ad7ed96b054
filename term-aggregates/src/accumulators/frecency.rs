//! Time-decayed action score (`frecency`).
//!
//! Every accepted action date contributes `points` scaled by a step function
//! of its age relative to a reference instant.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use tracing::debug;

use crate::cell::Cell;
use crate::config::FrecencyConfig;
use crate::error::AggregateResult;
use crate::traits::{unary, Accumulator, Configure};
use crate::value::AggregateValue;

/// Decay multiplier for an action of the given age.
///
/// Full weight up to 10 days, then 0.7 up to 30 days, 0.5 up to 3 months,
/// 0.3 up to 6 months and 0.1 beyond. Future dates count as fresh.
pub fn decay(age: Duration) -> f64 {
    if age <= Duration::days(10) {
        1.0
    } else if age <= Duration::days(30) {
        0.7
    } else if age <= Duration::days(30 * 3) {
        0.5
    } else if age <= Duration::days(30 * 6) {
        0.3
    } else {
        0.1
    }
}

const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M%:z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Parses an ISO 8601 date or date-time.
///
/// Accepts `YYYY`, `YYYY-MM`, `YYYY-MM-DD` and date-times with a `T` or space
/// separator, optional seconds and fraction, and an optional `Z` or `±hh:mm`
/// designator. Date-times without a designator are taken as UTC.
pub fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }

    let zoned = match text.strip_suffix('Z') {
        Some(stripped) => format!("{stripped}+00:00"),
        None => text.to_string(),
    };
    for format in OFFSET_FORMATS {
        if let Ok(parsed) = DateTime::parse_from_str(&zoned, format) {
            return Some(parsed.with_timezone(&Utc));
        }
    }

    let naive = text.strip_suffix('Z').unwrap_or(text);
    for format in NAIVE_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(naive, format) {
            return Some(parsed.and_utc());
        }
    }

    parse_calendar_date(naive)
}

/// `YYYY-MM-DD`, `YYYY-MM` or `YYYY` at midnight UTC.
fn parse_calendar_date(text: &str) -> Option<DateTime<Utc>> {
    let mut parts = text.splitn(3, '-');
    let year = parts.next().filter(|y| y.len() == 4)?.parse().ok()?;
    let month = parts.next().map_or(Some(1), |m| m.parse().ok())?;
    let day = parts.next().map_or(Some(1), |d| d.parse().ok())?;

    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    Some(date.and_hms_opt(0, 0, 0)?.and_utc())
}

/// Converts a cell into an action instant: text as ISO 8601, numbers as Unix
/// seconds.
pub fn cell_to_instant(cell: &Cell<'_>) -> Option<DateTime<Utc>> {
    match cell {
        Cell::Text(text) => parse_date(text),
        Cell::Number(seconds) if seconds.is_finite() => {
            let whole = seconds.floor();
            let nanos = ((seconds - whole) * 1e9) as u32;
            Utc.timestamp_opt(whole as i64, nanos).single()
        }
        _ => None,
    }
}

/// Sum of decayed points over action dates (`frecency`).
#[derive(Debug, Clone)]
pub struct Frecency {
    config: FrecencyConfig,
    score: f64,
    count: u64,
    skipped: u64,
}

impl Frecency {
    pub fn new(config: FrecencyConfig) -> Self {
        Self {
            config,
            score: 0.0,
            count: 0,
            skipped: 0,
        }
    }

    pub fn config(&self) -> &FrecencyConfig {
        &self.config
    }

    /// Number of non-null cells that were not dates.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }
}

impl Default for Frecency {
    fn default() -> Self {
        Self::new(FrecencyConfig::default())
    }
}

impl Configure for Frecency {
    fn configure(params: &[Cell<'_>]) -> AggregateResult<Self> {
        FrecencyConfig::from_params(params).map(Self::new)
    }
}

impl Accumulator for Frecency {
    fn name(&self) -> &'static str {
        "frecency"
    }

    fn fold(&mut self, args: &[Cell<'_>]) -> AggregateResult<()> {
        let cell = unary(self.name(), args)?;
        if cell.is_null() {
            return Ok(());
        }

        match cell_to_instant(cell) {
            Some(at) => {
                self.score += decay(self.config.now - at) * self.config.points;
                self.count += 1;
            }
            None => {
                self.skipped += 1;
                debug!(aggregate = "frecency", cell = %cell, "Skipping unparseable action date");
            }
        }
        Ok(())
    }

    fn finalize(&mut self) -> AggregateValue {
        if self.count == 0 {
            AggregateValue::NoData
        } else {
            AggregateValue::from_float(self.score)
        }
    }

    fn count(&self) -> u64 {
        self.count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    #[test]
    fn test_decay_steps() {
        assert_eq!(decay(Duration::days(-3)), 1.0);
        assert_eq!(decay(Duration::days(10)), 1.0);
        assert_eq!(decay(Duration::days(10) + Duration::seconds(1)), 0.7);
        assert_eq!(decay(Duration::days(30)), 0.7);
        assert_eq!(decay(Duration::days(90)), 0.5);
        assert_eq!(decay(Duration::days(180)), 0.3);
        assert_eq!(decay(Duration::days(181)), 0.1);
    }

    #[test]
    fn test_parse_iso_dates() {
        assert_eq!(parse_date("1997"), Some(utc(1997, 1, 1, 0, 0, 0)));
        assert_eq!(parse_date("1997-07"), Some(utc(1997, 7, 1, 0, 0, 0)));
        assert_eq!(parse_date("1997-07-16"), Some(utc(1997, 7, 16, 0, 0, 0)));
        assert_eq!(
            parse_date("1997-07-16 19:20+01:00"),
            Some(utc(1997, 7, 16, 18, 20, 0))
        );
        assert_eq!(
            parse_date("1997-07-16T19:20:30+01:00"),
            Some(utc(1997, 7, 16, 18, 20, 30))
        );
        assert_eq!(
            parse_date("1997-07-16 19:20:30"),
            Some(utc(1997, 7, 16, 19, 20, 30))
        );
        assert_eq!(
            parse_date("1997-07-16T19:20Z"),
            Some(utc(1997, 7, 16, 19, 20, 0))
        );
        assert_eq!(parse_date("yesterday"), None);
        assert_eq!(parse_date("1997-13-01"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn test_numbers_are_unix_seconds() {
        assert_eq!(
            cell_to_instant(&Cell::Number(0.0)),
            Some(utc(1970, 1, 1, 0, 0, 0))
        );
        assert_eq!(cell_to_instant(&Cell::Number(f64::INFINITY)), None);
    }

    #[test]
    fn test_frecency_score() {
        let config = FrecencyConfig::new(100.0, utc(2009, 9, 26, 4, 38, 30));
        let mut acc = Frecency::new(config);
        for date in ["2009-06-01", "2009-08-28", "2009-09-17", "not a date"] {
            acc.fold(&[Cell::Text(date)]).unwrap();
        }
        acc.fold(&[Cell::Null]).unwrap();

        assert_eq!(acc.count(), 3);
        assert_eq!(acc.skipped(), 1);
        let score = acc.finalize().as_f64().unwrap();
        assert!((score - 200.0).abs() < 1e-9);
    }

    #[test]
    fn test_frecency_empty() {
        assert_eq!(Frecency::default().finalize(), AggregateValue::NoData);
    }
}
