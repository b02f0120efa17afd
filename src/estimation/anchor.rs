//! Week offsets measured from a fixed per-weekday epoch.
//!
//! The historical sheets hold one column per occurrence of a weekday, starting at the
//! first recorded week. Each weekday's epoch is the date of its first column.

use time::macros::date;
use time::{Date, Duration, Weekday};

/// First recorded Monday; the other weekdays follow on consecutive days.
pub const MONDAY_EPOCH: Date = date!(2022 - 01 - 31);

/// Map a Monday-based index (Mon=0..Sun=6) to a weekday.
pub fn weekday_from_index(index: u8) -> Option<Weekday> {
    if index > 6 {
        return None;
    }
    Some(Weekday::Monday.nth_next(index))
}

/// Epoch date for the given weekday.
pub fn anchor_date(weekday: Weekday) -> Date {
    MONDAY_EPOCH + Duration::days(i64::from(weekday.number_days_from_monday()))
}

/// Whole weeks between the weekday's epoch and `start`, with the legacy column label.
///
/// Steps forward one week at a time until the anchor is no longer before `start`, so a
/// `start` that falls between two occurrences rounds up.
pub fn week_offset(weekday: Weekday, start: Date) -> (u32, String) {
    let mut anchor = anchor_date(weekday);
    let mut offset = 0u32;
    while anchor < start {
        anchor += Duration::weeks(1);
        offset += 1;
    }
    (offset, column_label(offset))
}

/// Bijective base-26 spreadsheet column for a zero-based index: 0 → A, 25 → Z, 26 → AA.
pub fn column_label(index: u32) -> String {
    let mut letters = Vec::new();
    let mut working = i64::from(index);
    while working >= 0 {
        letters.push(char::from(b'A' + (working % 26) as u8));
        working = working / 26 - 1;
    }
    letters.iter().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anchors_land_on_their_weekday() {
        for index in 0..7 {
            let weekday = weekday_from_index(index).expect("valid index");
            assert_eq!(anchor_date(weekday).weekday(), weekday);
        }
        assert_eq!(anchor_date(Weekday::Sunday), date!(2022 - 02 - 06));
    }

    #[test]
    fn weekday_index_out_of_range_is_none() {
        assert_eq!(weekday_from_index(0), Some(Weekday::Monday));
        assert_eq!(weekday_from_index(6), Some(Weekday::Sunday));
        assert_eq!(weekday_from_index(7), None);
    }

    #[test]
    fn offset_at_anchor_is_zero() {
        for index in 0..7 {
            let weekday = weekday_from_index(index).expect("valid index");
            assert_eq!(
                week_offset(weekday, anchor_date(weekday)),
                (0, "A".to_string())
            );
        }
    }

    #[test]
    fn offset_two_weeks_later_is_column_c() {
        let start = anchor_date(Weekday::Wednesday) + Duration::days(14);
        assert_eq!(week_offset(Weekday::Wednesday, start), (2, "C".to_string()));
    }

    #[test]
    fn offset_before_anchor_is_zero() {
        let start = anchor_date(Weekday::Friday) - Duration::weeks(3);
        assert_eq!(week_offset(Weekday::Friday, start).0, 0);
    }

    #[test]
    fn offset_between_occurrences_rounds_up() {
        let start = anchor_date(Weekday::Monday) + Duration::days(8);
        assert_eq!(week_offset(Weekday::Monday, start).0, 2);
    }

    #[test]
    fn column_labels_are_bijective_base_26() {
        assert_eq!(column_label(0), "A");
        assert_eq!(column_label(25), "Z");
        assert_eq!(column_label(26), "AA");
        assert_eq!(column_label(27), "AB");
        assert_eq!(column_label(51), "AZ");
        assert_eq!(column_label(52), "BA");
        assert_eq!(column_label(701), "ZZ");
        assert_eq!(column_label(702), "AAA");
    }
}
