//! Epoch-second conversions for file names, header timestamps and table rows.

use chrono::{DateTime, Datelike, Utc};

/// UTC instant of `epoch_seconds`. Non-finite or unrepresentable values map
/// to the epoch origin.
pub fn utc_from_epoch(epoch_seconds: f64) -> DateTime<Utc> {
    if !epoch_seconds.is_finite() {
        return DateTime::<Utc>::default();
    }
    let whole = epoch_seconds.floor();
    let nanos = ((epoch_seconds - whole) * 1.0e9).min(999_999_999.0) as u32;
    DateTime::from_timestamp(whole as i64, nanos).unwrap_or_default()
}

/// `YYYYDDD` as an integer, the `jdate` column.
pub fn julian_day(epoch_seconds: f64) -> i64 {
    let time = utc_from_epoch(epoch_seconds);
    i64::from(time.year()) * 1_000 + i64::from(time.ordinal())
}

/// `YYYYDDD` as it appears in response file names.
pub fn julian_day_stamp(epoch_seconds: f64) -> String {
    utc_from_epoch(epoch_seconds).format("%Y%j").to_string()
}

pub fn timestamp(epoch_seconds: f64) -> String {
    utc_from_epoch(epoch_seconds)
        .format("%Y-%m-%dT%H:%M:%S")
        .to_string()
}

/// `%y-%m-%d %H:%M:%S`, the load-date layout of the metadata tables.
pub fn load_date(time: &DateTime<Utc>) -> String {
    time.format("%y-%m-%d %H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::{julian_day, julian_day_stamp, load_date, timestamp, utc_from_epoch};

    #[test]
    fn epoch_origin_is_first_day_of_1970() {
        assert_eq!(julian_day(0.0), 1_970_001);
        assert_eq!(julian_day_stamp(0.0), "1970001");
        assert_eq!(timestamp(0.0), "1970-01-01T00:00:00");
        assert_eq!(load_date(&utc_from_epoch(0.0)), "70-01-01 00:00:00");
    }

    #[test]
    fn leap_year_day_numbers_are_counted() {
        // 2020-12-31T23:59:59Z
        assert_eq!(julian_day(1_609_459_199.0), 2_020_366);
        assert_eq!(
            load_date(&utc_from_epoch(1_609_459_199.0)),
            "20-12-31 23:59:59"
        );
        // 2021-03-01T00:00:00Z
        assert_eq!(julian_day_stamp(1_614_556_800.0), "2021060");
    }

    #[test]
    fn times_before_epoch_resolve_to_previous_days() {
        assert_eq!(timestamp(-1.0), "1969-12-31T23:59:59");
        assert_eq!(julian_day(-1.0), 1_969_365);
    }

    #[test]
    fn unusable_epochs_fall_back_to_origin() {
        assert_eq!(timestamp(f64::NAN), "1970-01-01T00:00:00");
        assert_eq!(timestamp(1.0e300), "1970-01-01T00:00:00");
    }
}
