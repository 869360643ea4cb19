//! Hand-rolled ISO-8601 UTC timestamps from [`SystemTime`].
//!
//! This crate's dependency set has no date/time crate; pulling one in
//! just to stamp `metadata.json` would widen the stack for a single call
//! site, so this renders the civil calendar by hand (Howard Hinnant's
//! `civil_from_days` algorithm) instead.

use std::time::{SystemTime, UNIX_EPOCH};

/// Render `time` as `YYYY-MM-DDTHH:MM:SSZ`, truncated to whole seconds.
pub fn to_iso8601(time: SystemTime) -> String {
    let secs = time
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64;
    let days = secs.div_euclid(86_400);
    let time_of_day = secs.rem_euclid(86_400);
    let (year, month, day) = civil_from_days(days);
    let hour = time_of_day / 3600;
    let minute = (time_of_day % 3600) / 60;
    let second = time_of_day % 60;
    format!(
        "{year:04}-{month:02}-{day:02}T{hour:02}:{minute:02}:{second:02}Z"
    )
}

/// `SystemTime::now()` rendered as ISO-8601.
pub fn now_iso8601() -> String {
    to_iso8601(SystemTime::now())
}

/// Days-since-epoch (1970-01-01) to a proleptic Gregorian `(year, month, day)`.
fn civil_from_days(z: i64) -> (i64, u32, u32) {
    let z = z + 719_468;
    let era = if z >= 0 { z } else { z - 146_096 } / 146_097;
    let doe = (z - era * 146_097) as u64; // [0, 146096]
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146096) / 365; // [0, 399]
    let y = yoe as i64 + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100); // [0, 365]
    let mp = (5 * doy + 2) / 153; // [0, 11]
    let d = (doy - (153 * mp + 2) / 5 + 1) as u32; // [1, 31]
    let m = if mp < 10 { mp + 3 } else { mp - 9 } as u32; // [1, 12]
    let year = if m <= 2 { y + 1 } else { y };
    (year, m, d)
}
