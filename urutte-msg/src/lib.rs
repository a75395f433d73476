use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{
    de::{self, Visitor},
    Deserialize, Deserializer, Serialize,
};
use serde_with::{serde_as, DefaultOnError};
use std::{fmt, path::PathBuf};
use thiserror::Error as ThisError;

pub type RecordId = i64;

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("Failed to parse JSON, cause: {0}")]
    Json(#[from] serde_json::Error),
}

/// A post as the backend hands it out: either a thread root or a reply.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadRecord {
    pub id: RecordId,
    #[serde(default)]
    pub content: String,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub parent_id: Option<RecordId>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub path: Option<String>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<Utc>,
}

impl ThreadRecord {
    pub fn is_reply_to(&self, id: RecordId) -> bool {
        self.id != id && self.parent_id == Some(id)
    }

    pub fn to_page_path(&self) -> PathBuf {
        PathBuf::from("thread").join(self.id.to_string())
    }
}

/// One page of results. The backend answers the same endpoint with either a
/// bare array or a `{ "content": [...], "last": bool }` wrapper; both land here.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub has_more: bool,
}

impl<T> Page<T> {
    pub fn last(items: Vec<T>) -> Self {
        Page {
            items,
            has_more: false,
        }
    }
}

impl<T> Page<T>
where
    T: for<'de> Deserialize<'de>,
{
    pub fn from_json_str(json: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(json)?)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPage<T> {
    Bare(Vec<T>),
    Wrapped {
        content: Vec<T>,
        #[serde(default)]
        last: Option<bool>,
    },
}

impl<T> From<RawPage<T>> for Page<T> {
    fn from(raw: RawPage<T>) -> Self {
        match raw {
            RawPage::Bare(items) => Page::last(items),
            RawPage::Wrapped { content, last } => Page {
                items: content,
                has_more: !last.unwrap_or(true),
            },
        }
    }
}

impl<'de, T> Deserialize<'de> for Page<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        RawPage::<T>::deserialize(deserializer).map(Page::from)
    }
}

// Accepts RFC 3339, an offset-less ISO timestamp (taken as UTC) or epoch millis.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    struct DeserializeTimestamp;

    impl<'de> Visitor<'de> for DeserializeTimestamp {
        type Value = DateTime<Utc>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("timestamp string or epoch milliseconds")
        }

        fn visit_str<E>(self, value: &str) -> Result<DateTime<Utc>, E>
        where
            E: de::Error,
        {
            if let Ok(date_time) = DateTime::parse_from_rfc3339(value) {
                return Ok(date_time.with_timezone(&Utc));
            }
            NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
                .map(|naive| Utc.from_utc_datetime(&naive))
                .map_err(|err| E::custom(format!("invalid timestamp {:?}: {}", value, err)))
        }

        fn visit_i64<E>(self, value: i64) -> Result<DateTime<Utc>, E>
        where
            E: de::Error,
        {
            Utc.timestamp_millis_opt(value)
                .single()
                .ok_or_else(|| E::custom(format!("timestamp out of range: {}", value)))
        }

        fn visit_u64<E>(self, value: u64) -> Result<DateTime<Utc>, E>
        where
            E: de::Error,
        {
            let millis = i64::try_from(value)
                .map_err(|_| E::custom(format!("timestamp out of range: {}", value)))?;
            self.visit_i64(millis)
        }

        fn visit_f64<E>(self, value: f64) -> Result<DateTime<Utc>, E>
        where
            E: de::Error,
        {
            self.visit_i64(value as i64)
        }
    }

    deserializer.deserialize_any(DeserializeTimestamp)
}
