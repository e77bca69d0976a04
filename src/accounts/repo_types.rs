use serde::{Serialize, Serializer};
use sqlx::FromRow;
use time::{format_description::FormatItem, macros::format_description, Date};

/// ISO calendar date, `YYYY-MM-DD`.
pub const ISO_DATE: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Account {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub address: String,
    pub phone_number: String,
    #[serde(serialize_with = "serialize_iso_date")]
    pub date_joined: Date,
}

fn serialize_iso_date<S: Serializer>(date: &Date, serializer: S) -> Result<S::Ok, S::Error> {
    let text = date.format(ISO_DATE).map_err(serde::ser::Error::custom)?;
    serializer.serialize_str(&text)
}

pub fn parse_iso_date(raw: &str) -> Option<Date> {
    Date::parse(raw, ISO_DATE).ok()
}

pub fn today() -> Date {
    time::OffsetDateTime::now_utc().date()
}
