//! Local clock-time helpers shared by the domain and the weather series
//!
//! Timestamps are naive local times: the daily moisture cycle is anchored to
//! wall-clock hours at the fireground, not to UTC.

use chrono::{Duration, NaiveDateTime, NaiveTime, Timelike};

/// Hour of day at which each daily moisture cycle starts
pub const DAILY_CYCLE_START_HOUR: u32 = 14;

/// Fractional clock hours (`hour + minute / 60`)
pub fn clock_hours(time: NaiveDateTime) -> f64 {
    f64::from(time.hour()) + f64::from(time.minute()) / 60.0
}

/// Move `start` to `hour`:00:00 on the same date
///
/// Returns `None` for an hour outside `0..24`.
pub fn normalize_to_hour(start: NaiveDateTime, hour: u32) -> Option<NaiveDateTime> {
    NaiveTime::from_hms_opt(hour, 0, 0).map(|t| start.date().and_time(t))
}

/// `count` consecutive hourly timestamps starting at `first`
pub fn hourly_steps(first: NaiveDateTime, count: usize) -> Vec<NaiveDateTime> {
    let mut times = Vec::with_capacity(count);
    let mut t = first;
    for _ in 0..count {
        times.push(t);
        t += Duration::hours(1);
    }
    times
}

/// Index of the timestamp closest to `time` in an ascending list
///
/// Ties resolve to the earlier sample. Returns `None` for an empty list.
pub fn nearest_time_index(times: &[NaiveDateTime], time: NaiveDateTime) -> Option<usize> {
    if times.is_empty() {
        return None;
    }
    let pos = times.partition_point(|t| *t < time);
    if pos == 0 {
        return Some(0);
    }
    if pos == times.len() {
        return Some(times.len() - 1);
    }
    let before = time - times[pos - 1];
    let after = times[pos] - time;
    Some(if after < before { pos } else { pos - 1 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 7, 1)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn test_clock_hours() {
        assert_eq!(clock_hours(at(13, 30)), 13.5);
        assert_eq!(clock_hours(at(0, 0)), 0.0);
    }

    #[test]
    fn test_normalize_drops_minutes() {
        let t = NaiveDate::from_ymd_opt(2024, 7, 1)
            .unwrap()
            .and_hms_opt(9, 41, 17)
            .unwrap();
        assert_eq!(normalize_to_hour(t, 14), Some(at(14, 0)));
        assert_eq!(normalize_to_hour(t, 24), None);
    }

    #[test]
    fn test_nearest_time_index() {
        let times = hourly_steps(at(10, 0), 4);
        assert_eq!(nearest_time_index(&times, at(9, 0)), Some(0));
        assert_eq!(nearest_time_index(&times, at(11, 20)), Some(1));
        assert_eq!(nearest_time_index(&times, at(11, 40)), Some(2));
        assert_eq!(nearest_time_index(&times, at(11, 30)), Some(1));
        assert_eq!(nearest_time_index(&times, at(23, 0)), Some(3));
        assert_eq!(nearest_time_index(&[], at(23, 0)), None);
    }
}
