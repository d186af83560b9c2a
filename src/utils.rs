use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

pub struct Utils {}

impl Utils {
    /// Presentation format of dates arriving in query parameters
    pub const QUERY_DATE_FORMAT: &str = "%d/%m/%Y";

    /// Storage format of `users.created_at`. Lexical order matches chronological order.
    pub const DB_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    /// Parses a `dd/mm/yyyy` date. Surrounding whitespace is ignored.
    pub fn parse_query_date(date_str: &str) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(date_str.trim(), Self::QUERY_DATE_FORMAT).ok()
    }

    /// First second of the given day
    pub fn start_of_day(date: NaiveDate) -> NaiveDateTime {
        date.and_time(NaiveTime::MIN)
    }

    /// Last whole second of the given day
    pub fn end_of_day(date: NaiveDate) -> NaiveDateTime {
        // 23:59:59 is always a valid time
        date.and_hms_opt(23, 59, 59)
            .unwrap_or_else(|| date.and_time(NaiveTime::MIN))
    }

    pub fn format_db_datetime(datetime: &NaiveDateTime) -> String {
        datetime.format(Self::DB_DATETIME_FORMAT).to_string()
    }

    pub fn parse_db_datetime(datetime_str: &str) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(datetime_str, Self::DB_DATETIME_FORMAT).ok()
    }
}
