//! Calendar-day helpers. Every log is keyed by the user's local calendar day,
//! never by a UTC slice of a timestamp.

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, TimeZone};

const ISO_FORMAT: &str = "%Y-%m-%d";

/// Anything that can be read as a calendar day.
pub trait ToDate {
    fn to_date(&self) -> Option<NaiveDate>;
}

impl ToDate for NaiveDate {
    fn to_date(&self) -> Option<NaiveDate> {
        Some(*self)
    }
}

impl ToDate for NaiveDateTime {
    fn to_date(&self) -> Option<NaiveDate> {
        Some(self.date())
    }
}

impl<Tz: TimeZone> ToDate for DateTime<Tz> {
    fn to_date(&self) -> Option<NaiveDate> {
        Some(self.with_timezone(&Local).date_naive())
    }
}

impl ToDate for str {
    fn to_date(&self) -> Option<NaiveDate> {
        let value = self.trim();
        if value.is_empty() {
            return None;
        }
        if let Ok(date) = NaiveDate::parse_from_str(value, ISO_FORMAT) {
            return Some(date);
        }
        if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
            return ts.to_date();
        }
        NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
            .ok()
            .map(|dt| dt.date())
    }
}

impl ToDate for String {
    fn to_date(&self) -> Option<NaiveDate> {
        self.as_str().to_date()
    }
}

impl<T: ToDate + ?Sized> ToDate for &T {
    fn to_date(&self) -> Option<NaiveDate> {
        (**self).to_date()
    }
}

impl<T: ToDate> ToDate for Option<T> {
    fn to_date(&self) -> Option<NaiveDate> {
        self.as_ref().and_then(|v| v.to_date())
    }
}

/// Parses any date-like value; fails closed with `None`.
pub fn to_date<T: ToDate + ?Sized>(value: &T) -> Option<NaiveDate> {
    value.to_date()
}

/// Whole days from `a` to `b` (negative when `b` precedes `a`).
pub fn diff_in_days<A: ToDate + ?Sized, B: ToDate + ?Sized>(a: &A, b: &B) -> Option<i64> {
    let a = a.to_date()?;
    let b = b.to_date()?;
    Some(b.signed_duration_since(a).num_days())
}

pub fn format_iso_date(date: NaiveDate) -> String {
    date.format(ISO_FORMAT).to_string()
}

/// Today's calendar day in the local time zone.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// `None` once the result leaves chrono's calendar range.
pub fn add_days(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    date.checked_add_signed(Duration::try_days(days)?)
}
