use chrono::{DateTime, NaiveDate, Utc};

const DEFAULT_EXCHANGE_OFFSET_SECS: i32 = 2 * 3600;

/// Exchange-local UTC offset. The reference prices (10:20/11:20/12:20) are
/// captured in exchange time, so "today" must be resolved there too.
/// Override via EXCHANGE_UTC_OFFSET_SECS.
pub fn exchange_offset_secs() -> i32 {
    std::env::var("EXCHANGE_UTC_OFFSET_SECS")
        .ok()
        .and_then(|s| s.parse::<i32>().ok())
        .unwrap_or(DEFAULT_EXCHANGE_OFFSET_SECS)
}

pub fn session_date_with_offset(now_utc: DateTime<Utc>, offset_secs: i32) -> NaiveDate {
    match chrono::FixedOffset::east_opt(offset_secs) {
        Some(offset) => now_utc.with_timezone(&offset).date_naive(),
        // Out-of-range override falls back to UTC.
        None => now_utc.date_naive(),
    }
}

/// The current trading session date in exchange-local time.
pub fn session_date(now_utc: DateTime<Utc>) -> NaiveDate {
    session_date_with_offset(now_utc, exchange_offset_secs())
}

/// Gates the live overlay and the pollers: only the current session date
/// gets live treatment.
pub fn is_today(date: NaiveDate, now_utc: DateTime<Utc>) -> bool {
    date == session_date(now_utc)
}
