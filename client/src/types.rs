use chrono::{DateTime, TimeZone, Utc};
use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use serde_with::{serde_as, DefaultOnNull};
use std::fmt;

/// One detected chart pattern as reported by the scan backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "strict-serde", serde(deny_unknown_fields))]
pub struct PatternRecord {
    pub symbol: String,
    /// Pattern tag, eg. `"cup_and_handle"`.
    pub pattern: String,
    /// Detector confidence in `[0, 1]`.
    pub confidence: f64,
    pub price: f64,
    pub change_percent: f64,
    pub volume: u64,
    /// Relative strength, when the backend computed it.
    #[serde(default)]
    pub rs: Option<f64>,
    /// Epoch milliseconds.
    pub timestamp: i64,
}

impl PatternRecord {
    /// Detection time, `None` if the timestamp is out of chrono's range.
    pub fn detected_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.timestamp).single()
    }

    /// Same symbol and same pattern tag.
    pub fn same_event(&self, other: &PatternRecord) -> bool {
        self.symbol == other.symbol && self.pattern == other.pattern
    }
}

/// Body of a successful scan response. A missing or `null` list is empty.
///
/// Only a JSON object is accepted; an array or scalar body is malformed.
#[derive(Debug, Clone, Default)]
pub struct PatternsResponse {
    pub patterns: Vec<PatternRecord>,
}

#[serde_as]
#[derive(Deserialize)]
struct PatternsBody {
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    patterns: Vec<PatternRecord>,
}

impl<'de> Deserialize<'de> for PatternsResponse {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ObjectOnly;

        impl<'de> Visitor<'de> for ObjectOnly {
            type Value = PatternsBody;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a JSON object with a `patterns` list")
            }

            fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<Self::Value, A::Error> {
                PatternsBody::deserialize(de::value::MapAccessDeserializer::new(map))
            }
        }

        let body = deserializer.deserialize_map(ObjectOnly)?;
        Ok(Self {
            patterns: body.patterns,
        })
    }
}
