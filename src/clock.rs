//! Calendar-day keys used to detect rollover for daily resets.

use chrono::{NaiveDate, Utc};

/// A calendar-day identifier. Two of these are kept per chat (quota day and
/// consumption day) and compared independently.
pub type DayKey = NaiveDate;

/// The current calendar day in UTC.
pub fn today() -> DayKey {
    Utc::now().date_naive()
}
