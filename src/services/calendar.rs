use std::collections::HashSet;

use chrono::{Datelike, NaiveDate, Weekday};

/// Working-day arithmetic over a fixed-date holiday table.
///
/// Both the balance-sufficiency check at creation time and the debit amount
/// at approval time go through [`CalendarService::count_working_days`]; the
/// result depends only on the two dates and the holiday table, so the two
/// calls can never disagree.
#[derive(Debug, Clone)]
pub struct CalendarService {
    holidays: HashSet<(u32, u32)>,
}

impl CalendarService {
    pub fn new(holidays: &[(u32, u32)]) -> Self {
        Self {
            holidays: holidays.iter().copied().collect(),
        }
    }

    /// A date can be booked only if it lies strictly in the future.
    pub fn date_is_bookable(&self, date: NaiveDate, today: NaiveDate) -> bool {
        date > today
    }

    pub fn is_working_day(&self, date: NaiveDate) -> bool {
        if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            return false;
        }
        !self.holidays.contains(&(date.month(), date.day()))
    }

    /// Inclusive count of working days in [start, end]. Zero for an inverted
    /// range.
    pub fn count_working_days(&self, start: NaiveDate, end: NaiveDate) -> i64 {
        start
            .iter_days()
            .take_while(|day| *day <= end)
            .filter(|day| self.is_working_day(*day))
            .count() as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_HOLIDAYS;
    use pretty_assertions::assert_eq;

    fn calendar() -> CalendarService {
        CalendarService::new(DEFAULT_HOLIDAYS)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn future_date_is_bookable() {
        let today = date(2022, 1, 1);
        assert!(calendar().date_is_bookable(date(2022, 1, 2), today));
    }

    #[test]
    fn today_and_past_are_not_bookable() {
        let today = date(2022, 1, 10);
        assert!(!calendar().date_is_bookable(today, today));
        assert!(!calendar().date_is_bookable(date(2021, 12, 31), today));
    }

    #[test]
    fn weekends_are_not_working_days() {
        // 2022-01-08 is a Saturday
        assert!(!calendar().is_working_day(date(2022, 1, 8)));
        assert!(!calendar().is_working_day(date(2022, 1, 9)));
        assert!(calendar().is_working_day(date(2022, 1, 10)));
    }

    #[test]
    fn holidays_are_not_working_days() {
        // Christmas Eve 2021 falls on a Friday
        assert!(!calendar().is_working_day(date(2021, 12, 24)));
    }

    #[test]
    fn working_day_count_over_year_boundary() {
        // 2021-12-24 plus 15 days: 11 weekdays, one of them a holiday
        let start = date(2021, 12, 24);
        let end = start + chrono::Duration::days(15);
        assert_eq!(calendar().count_working_days(start, end), 10);
    }

    #[test]
    fn plain_monday_to_friday_is_five_days() {
        // 2022-02-07 through 2022-02-11, no holiday in range
        assert_eq!(
            calendar().count_working_days(date(2022, 2, 7), date(2022, 2, 11)),
            5
        );
    }

    #[test]
    fn single_day_range() {
        assert_eq!(
            calendar().count_working_days(date(2022, 2, 7), date(2022, 2, 7)),
            1
        );
    }

    #[test]
    fn inverted_range_counts_zero() {
        assert_eq!(
            calendar().count_working_days(date(2022, 2, 11), date(2022, 2, 7)),
            0
        );
    }
}
