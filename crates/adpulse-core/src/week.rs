//! Week arithmetic for longevity tracking and snapshot identity.
//!
//! Weeks are Monday-anchored: every date maps to the Monday of its week,
//! and that Monday is the identity used both for `weeks_in_top10`
//! advancement and for the `(brand, ad, week_start)` snapshot key.

use chrono::{Datelike, Days, NaiveDate};

/// Monday of the week containing `date`.
#[must_use]
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Days::new(u64::from(date.weekday().num_days_from_monday()))
}

/// Apply the weekly-longevity rule to an ad seen again `today`.
///
/// Returns the new `weeks_in_top10`: incremented exactly once when
/// `last_seen` falls in a different week than `today`, unchanged when both
/// dates share a week. An ad that vanished for several weeks and returned
/// still advances by one — absence from intermediate scrapes is treated as
/// continuity, not a reset.
#[must_use]
pub fn advance_weeks(last_seen: NaiveDate, weeks_in_top10: i32, today: NaiveDate) -> i32 {
    if week_start(last_seen) == week_start(today) {
        weeks_in_top10
    } else {
        weeks_in_top10 + 1
    }
}
