//! Local wall clock for a weather observation.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

const WIB: i32 = 7 * 3600;
const WITA: i32 = 8 * 3600;
const WIT: i32 = 9 * 3600;

/// IANA zone name for one of Indonesia's three UTC offsets, `"UTC"` otherwise.
pub fn timezone_name(offset_seconds: i32) -> &'static str {
    zone_for_offset(offset_seconds).name()
}

pub fn zone_for_offset(offset_seconds: i32) -> Tz {
    match offset_seconds {
        WIB => chrono_tz::Asia::Jakarta,
        WITA => chrono_tz::Asia::Makassar,
        WIT => chrono_tz::Asia::Jayapura,
        _ => chrono_tz::UTC,
    }
}

/// `HH:MM:SS` at the location, as of `now_unix`.
///
/// The elapsed time since the observation is recomputed from the wall clock
/// and added to the observation instant, so the display keeps advancing from
/// the server-reported time.
pub fn local_clock_at(observed_at_unix: i64, offset_seconds: i32, now_unix: i64) -> String {
    let elapsed = now_unix - observed_at_unix;
    let instant = observed_at_unix + elapsed;

    match DateTime::<Utc>::from_timestamp(instant, 0) {
        Some(utc) => utc
            .with_timezone(&zone_for_offset(offset_seconds))
            .format("%H:%M:%S")
            .to_string(),
        None => "--:--:--".to_string(),
    }
}

/// [`local_clock_at`] for the current instant.
pub fn local_clock_tick(observed_at_unix: i64, offset_seconds: i32) -> String {
    local_clock_at(observed_at_unix, offset_seconds, Utc::now().timestamp())
}
