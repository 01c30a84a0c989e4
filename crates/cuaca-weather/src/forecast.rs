use std::collections::HashSet;

use chrono::{DateTime, FixedOffset, Offset, Utc};

use crate::types::{ForecastDay, RawForecastEntry};

/// Number of days kept in the digest
pub const FORECAST_DAYS: usize = 6;

/// Reduce sub-daily forecast entries to at most [`FORECAST_DAYS`] days.
///
/// Entries are expected in chronological order. Each one is placed on the
/// calendar of the location (`utc_offset_seconds`); the first entry seen for a
/// date represents that day. Collection stops once six dates are gathered.
pub fn build_forecast_digest(
    entries: &[RawForecastEntry],
    utc_offset_seconds: i32,
) -> Vec<ForecastDay> {
    let offset = FixedOffset::east_opt(utc_offset_seconds).unwrap_or_else(|| Utc.fix());
    let mut seen = HashSet::new();
    let mut days = Vec::with_capacity(FORECAST_DAYS);

    for entry in entries {
        if days.len() == FORECAST_DAYS {
            break;
        }

        let Some(instant) = DateTime::<Utc>::from_timestamp(entry.observed_at_unix, 0) else {
            tracing::debug!("Skipping forecast entry with bad timestamp {}", entry.observed_at_unix);
            continue;
        };
        let date = instant.with_timezone(&offset).date_naive();

        if seen.insert(date) {
            days.push(ForecastDay {
                date,
                observed_at_unix: entry.observed_at_unix,
                description: entry.description.clone(),
                temperature_c: entry.temperature_c,
                icon_id: entry.icon_id.clone(),
            });
        }
    }

    days
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use chrono::NaiveDate;

    const HOUR: i64 = 3600;
    // 2024-10-14T00:00:00Z
    const MIDNIGHT_UTC: i64 = 1_728_864_000;

    fn entry(ts: i64, temp: f64) -> RawForecastEntry {
        RawForecastEntry {
            observed_at_unix: ts,
            description: format!("t{}", temp),
            temperature_c: temp,
            icon_id: "01d".to_string(),
        }
    }

    #[test]
    fn test_four_dates_from_twelve_entries() {
        // Three 3-hourly readings per day (09:00, 12:00, 15:00 UTC) over four days
        let entries: Vec<_> = (0..4)
            .flat_map(|day| {
                (0..3).map(move |slot| {
                    entry(MIDNIGHT_UTC + day * 24 * HOUR + (9 + slot * 3) * HOUR, (day * 10 + slot) as f64)
                })
            })
            .collect();
        assert_eq!(entries.len(), 12);

        let digest = build_forecast_digest(&entries, 0);

        assert_eq!(digest.len(), 4);
        for (day, forecast) in digest.iter().enumerate() {
            let expected = &entries[day * 3];
            assert_eq!(forecast.observed_at_unix, expected.observed_at_unix);
            assert_eq!(forecast.temperature_c, expected.temperature_c);
        }
        assert_eq!(digest[0].date, NaiveDate::from_ymd_opt(2024, 10, 14).unwrap());
        assert_eq!(digest[3].date, NaiveDate::from_ymd_opt(2024, 10, 17).unwrap());
    }

    #[test]
    fn test_caps_at_six_days() {
        let entries: Vec<_> = (0..80).map(|i| entry(MIDNIGHT_UTC + i * 3 * HOUR, i as f64)).collect();
        let digest = build_forecast_digest(&entries, 0);
        assert_eq!(digest.len(), FORECAST_DAYS);
        // 8 three-hour slots per day
        assert_eq!(digest[5].observed_at_unix, entries[40].observed_at_unix);
    }

    #[test]
    fn test_fewer_days_when_input_short() {
        let entries: Vec<_> = (0..10).map(|i| entry(MIDNIGHT_UTC + i * 3 * HOUR, i as f64)).collect();
        let digest = build_forecast_digest(&entries, 0);
        assert_eq!(digest.len(), 2);
    }

    #[test]
    fn test_dates_follow_location_offset() {
        // 18:00Z and 21:00Z on the 14th are 01:00 and 04:00 on the 15th in WIB (UTC+7)
        let entries = vec![
            entry(MIDNIGHT_UTC + 15 * HOUR, 1.0),
            entry(MIDNIGHT_UTC + 18 * HOUR, 2.0),
            entry(MIDNIGHT_UTC + 21 * HOUR, 3.0),
        ];

        let utc = build_forecast_digest(&entries, 0);
        assert_eq!(utc.len(), 1);

        let wib = build_forecast_digest(&entries, 25200);
        assert_eq!(wib.len(), 2);
        assert_eq!(wib[1].temperature_c, 2.0);
        assert_eq!(wib[1].date, NaiveDate::from_ymd_opt(2024, 10, 15).unwrap());
    }

    #[test]
    fn test_empty_input() {
        assert!(build_forecast_digest(&[], 25200).is_empty());
    }
}
