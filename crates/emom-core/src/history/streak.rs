//! Consecutive-day streak.
//!
//! The streak is anchored at today: it counts back from today over calendar
//! days that each have at least one completed workout, and stops at the first
//! day without one. No workout today means a streak of 0, even if yesterday
//! ended an unbroken run.

use std::collections::BTreeSet;

use chrono::NaiveDate;

pub fn streak_days<I>(completed_days: I, today: NaiveDate) -> u32
where
    I: IntoIterator<Item = NaiveDate>,
{
    let days: BTreeSet<NaiveDate> = completed_days.into_iter().collect();

    let mut streak = 0;
    let mut expected = Some(today);
    while let Some(day) = expected.filter(|d| days.contains(d)) {
        streak += 1;
        expected = day.pred_opt();
    }
    streak
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn today_and_yesterday() {
        let today = day(2024, 3, 10);
        assert_eq!(streak_days([today, day(2024, 3, 9)], today), 2);
    }

    #[test]
    fn gap_yesterday_breaks_streak() {
        let today = day(2024, 3, 10);
        assert_eq!(streak_days([day(2024, 3, 8)], today), 0);
    }

    #[test]
    fn no_workout_today_is_zero() {
        let today = day(2024, 3, 10);
        assert_eq!(streak_days([day(2024, 3, 9), day(2024, 3, 8)], today), 0);
    }

    #[test]
    fn several_workouts_on_one_day_count_once() {
        let today = day(2024, 3, 1);
        let days = [today, today, day(2024, 2, 29), day(2024, 2, 29), day(2024, 2, 27)];
        assert_eq!(streak_days(days, today), 2);
    }

    #[test]
    fn future_dates_are_ignored() {
        let today = day(2024, 3, 10);
        assert_eq!(streak_days([day(2024, 3, 11), today], today), 1);
    }

    #[test]
    fn empty_history() {
        assert_eq!(streak_days(std::iter::empty(), day(2024, 1, 1)), 0);
    }
}
