//! Late-return fines.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// Fine per whole day late when nothing else is configured.
pub const DEFAULT_FINE_PER_DAY: u32 = 5;

/// Fine owed for returning at `returned_at` an item due at `due_at`.
///
/// Only whole days count: returning less than 24 hours after the due
/// instant costs nothing.
#[must_use]
pub fn calculate_fine(returned_at: NaiveDateTime, due_at: NaiveDateTime, per_day: u32) -> u32 {
    if returned_at <= due_at {
        return 0;
    }

    let days_late = (returned_at - due_at).num_days();
    u32::try_from(days_late)
        .unwrap_or(u32::MAX)
        .saturating_mul(per_day)
}

/// Due dates are stored without a time; they fall due at midnight.
#[must_use]
pub fn due_instant(due_date: NaiveDate) -> NaiveDateTime {
    due_date.and_time(NaiveTime::MIN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn due() -> NaiveDateTime {
        due_instant(NaiveDate::from_ymd_opt(2024, 6, 15).unwrap())
    }

    #[test]
    fn on_time_is_free() {
        assert_eq!(calculate_fine(due(), due(), DEFAULT_FINE_PER_DAY), 0);
        assert_eq!(
            calculate_fine(due() - Duration::days(1), due(), DEFAULT_FINE_PER_DAY),
            0
        );
    }

    #[test]
    fn charges_per_whole_day() {
        assert_eq!(
            calculate_fine(due() + Duration::days(1), due(), DEFAULT_FINE_PER_DAY),
            5
        );
        assert_eq!(
            calculate_fine(due() + Duration::days(10), due(), DEFAULT_FINE_PER_DAY),
            50
        );
    }

    #[test]
    fn partial_days_are_not_charged() {
        let later_same_day = due() + Duration::hours(17);
        assert_eq!(calculate_fine(later_same_day, due(), DEFAULT_FINE_PER_DAY), 0);

        let a_day_and_a_half = due() + Duration::hours(36);
        assert_eq!(calculate_fine(a_day_and_a_half, due(), DEFAULT_FINE_PER_DAY), 5);
    }

    #[test]
    fn honours_custom_rate() {
        assert_eq!(calculate_fine(due() + Duration::days(3), due(), 2), 6);
    }
}
