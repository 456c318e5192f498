use std::str::FromStr;

use chrono::{NaiveDate, ParseError};
use serde::Deserialize;

/// A bare TOML date (`2024-04-22`) read into a chrono date.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct TomlDate(pub NaiveDate);

impl<'de> Deserialize<'de> for TomlDate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: serde::Deserializer<'de>,
    {
        use serde::de::Error;
        let value = toml::value::Datetime::deserialize(deserializer)?;
        TomlDate::from_str(&value.to_string()).map_err(Error::custom)
    }
}

impl FromStr for TomlDate {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(NaiveDate::from_str(s)?))
    }
}

impl TomlDate {
    pub fn days_until(&self, today: NaiveDate) -> i64 {
        (today - self.0).num_days()
    }
}
