use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Offset, TimeZone, Timelike};
use serde_json::Value;

/// One endpoint of a range predicate.
///
/// Temporal endpoints are kept typed until compilation and rendered as
/// ISO-8601 strings in the emitted fragment.
#[derive(Debug, Clone, PartialEq)]
pub enum Bound {
    /// Plain JSON scalar (number or string), emitted verbatim.
    Scalar(Value),
    /// Calendar date, `YYYY-MM-DD`.
    Date(NaiveDate),
    /// Date and time without offset, `YYYY-MM-DDTHH:MM:SS[.ffffff]`.
    DateTime(NaiveDateTime),
    /// Date and time with offset, `YYYY-MM-DDTHH:MM:SS[.ffffff]+HH:MM`.
    Timestamp(DateTime<FixedOffset>),
}

impl Bound {
    /// JSON value placed into the `range` fragment.
    pub fn to_value(&self) -> Value {
        match self {
            Bound::Scalar(value) => value.clone(),
            Bound::Date(date) => Value::String(date.format("%Y-%m-%d").to_string()),
            Bound::DateTime(dt) => Value::String(iso_datetime(dt, "")),
            Bound::Timestamp(ts) => {
                let offset = ts.format("%:z").to_string();
                Value::String(iso_datetime(&ts.naive_local(), &offset))
            }
        }
    }
}

fn iso_datetime(dt: &NaiveDateTime, offset: &str) -> String {
    let base = if dt.nanosecond() == 0 {
        dt.format("%Y-%m-%dT%H:%M:%S")
    } else {
        dt.format("%Y-%m-%dT%H:%M:%S%.6f")
    };
    format!("{base}{offset}")
}

impl From<Value> for Bound {
    fn from(value: Value) -> Self {
        Bound::Scalar(value)
    }
}

macro_rules! scalar_bound {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Bound {
                fn from(value: $ty) -> Self {
                    Bound::Scalar(Value::from(value))
                }
            }
        )*
    };
}

scalar_bound!(i32, i64, u32, u64, f64, &str, String);

impl From<NaiveDate> for Bound {
    fn from(value: NaiveDate) -> Self {
        Bound::Date(value)
    }
}

impl From<NaiveDateTime> for Bound {
    fn from(value: NaiveDateTime) -> Self {
        Bound::DateTime(value)
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for Bound {
    fn from(value: DateTime<Tz>) -> Self {
        let offset = value.offset().fix();
        Bound::Timestamp(value.with_timezone(&offset))
    }
}
