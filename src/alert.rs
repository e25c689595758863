//! The alert value type.
//!
//! An `Alert` is one recorded occurrence of the monitored event class. It has
//! no identity beyond its fields: two alerts with the same region,
//! description and timestamp are the same event as far as detection goes.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Timestamp layout used by the upstream feed and by `Display`.
pub const ALERT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One occurrence of the monitored event.
///
/// Field names follow the upstream feed (`data`, `title`, `alertDate`) when
/// (de)serialized; unknown upstream fields are ignored.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use redalert::Alert;
///
/// let at = NaiveDate::from_ymd_opt(2023, 10, 7).unwrap().and_hms_opt(6, 30, 0).unwrap();
/// let alert = Alert::new("Tel Aviv", "Rocket fire", at);
/// assert_eq!(alert.region(), "Tel Aviv");
/// assert_eq!(alert, Alert::new("Tel Aviv", "Rocket fire", at));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Alert {
    #[serde(rename = "data")]
    region: String,

    #[serde(rename = "title")]
    description: String,

    #[serde(rename = "alertDate", with = "alert_date")]
    timestamp: NaiveDateTime,
}

impl Alert {
    /// Creates an alert.
    #[must_use]
    pub fn new(
        region: impl Into<String>,
        description: impl Into<String>,
        timestamp: NaiveDateTime,
    ) -> Self {
        Self {
            region: region.into(),
            description: description.into(),
            timestamp,
        }
    }

    /// The approximate region where the alert happened.
    #[must_use]
    pub fn region(&self) -> &str {
        &self.region
    }

    /// What caused the alert.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// When the alert happened, in upstream local time.
    #[must_use]
    pub const fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Alert [region={}, description={}, date={}]",
            self.region,
            self.description,
            self.timestamp.format(ALERT_DATE_FORMAT)
        )
    }
}

mod alert_date {
    use chrono::NaiveDateTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    use super::ALERT_DATE_FORMAT;

    pub(super) fn serialize<S: Serializer>(
        value: &NaiveDateTime,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&value.format(ALERT_DATE_FORMAT))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(raw.trim(), ALERT_DATE_FORMAT).map_err(de::Error::custom)
    }
}
