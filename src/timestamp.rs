//! Human-readable publication dates.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// How much of a date to spell out.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DateFormat {
    /// `Friday, March 1, 2024`
    Full,
    /// `March 1, 2024`
    #[default]
    Long,
    /// `Mar 1, 2024`
    Medium,
    /// `3/1/24`
    Short,
}

impl DateFormat {
    fn pattern(&self) -> &'static str {
        match self {
            DateFormat::Full => "%A, %B %-d, %Y",
            DateFormat::Long => "%B %-d, %Y",
            DateFormat::Medium => "%b %-d, %Y",
            DateFormat::Short => "%-m/%-d/%y",
        }
    }
}

pub fn format_date(date: NaiveDate, format: DateFormat) -> String {
    date.format(format.pattern()).to_string()
}

/// A record's publication date ready for display.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Timestamp {
    /// For `<time datetime="...">`.
    pub iso: String,

    pub display: String,

    /// The formatted revision date, if the record was updated.
    pub updated: Option<String>,
}

impl Timestamp {
    pub fn new(date: NaiveDate, updated: Option<NaiveDate>, format: DateFormat) -> Timestamp {
        Timestamp {
            iso: date.format("%Y-%m-%d").to_string(),
            display: format_date(date, format),
            updated: updated.map(|u| format_date(u, format)),
        }
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match &self.updated {
            None => f.write_str(&self.display),
            Some(updated) => write!(f, "{} ▸ Updated: {}", self.display, updated),
        }
    }
}
