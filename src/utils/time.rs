use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use now::DateTimeNow;

/// This is the standard way of converting a date to a string in devtimer. Record files
/// and daily report buckets both use it.
pub fn date_to_record_name(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Midnight of the calendar day containing `moment`.
pub fn day_start(moment: DateTime<Utc>) -> DateTime<Utc> {
    moment.beginning_of_day()
}

/// Midnight of the most recent Sunday. A Sunday moment starts its own week.
pub fn week_start_sunday(moment: DateTime<Utc>) -> DateTime<Utc> {
    let days_back = moment.weekday().num_days_from_sunday() as i64;
    day_start(moment - Duration::days(days_back))
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

    use super::{day_start, week_start_sunday};

    fn at(date: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
        Utc.from_utc_datetime(&NaiveDateTime::new(date, time))
    }

    #[test]
    fn day_start_truncates_to_midnight() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let moment = at(date, NaiveTime::from_hms_opt(18, 45, 12).unwrap());
        assert_eq!(day_start(moment), at(date, NaiveTime::MIN));
    }

    #[test]
    fn week_starts_on_previous_sunday() {
        // 2024-01-10 is a Wednesday
        let wednesday = at(
            NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
        );
        assert_eq!(
            week_start_sunday(wednesday),
            at(NaiveDate::from_ymd_opt(2024, 1, 7).unwrap(), NaiveTime::MIN)
        );
    }

    #[test]
    fn sunday_starts_its_own_week() {
        let sunday = at(
            NaiveDate::from_ymd_opt(2024, 1, 7).unwrap(),
            NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
        );
        assert_eq!(
            week_start_sunday(sunday),
            at(NaiveDate::from_ymd_opt(2024, 1, 7).unwrap(), NaiveTime::MIN)
        );
    }

    #[test]
    fn saturday_reaches_back_six_days() {
        let saturday = at(
            NaiveDate::from_ymd_opt(2024, 1, 13).unwrap(),
            NaiveTime::from_hms_opt(23, 59, 59).unwrap(),
        );
        assert_eq!(
            week_start_sunday(saturday),
            at(NaiveDate::from_ymd_opt(2024, 1, 7).unwrap(), NaiveTime::MIN)
        );
    }
}
