use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Tag set attached to a record (`device_id`, `site`, `rack`, ...).
pub type Tags = BTreeMap<String, String>;

/// Semantic table a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Measurement {
    Metadata,
    Monitoring,
    Weather,
    Geolocation,
    Electrical,
    Sensor,
    Downlink,
    AirQuality,
    Motion,
    Synchro,
}

impl Measurement {
    pub fn as_str(&self) -> &'static str {
        match self {
            Measurement::Metadata => "metadata",
            Measurement::Monitoring => "monitoring",
            Measurement::Weather => "weather",
            Measurement::Geolocation => "geolocation",
            Measurement::Electrical => "electrical",
            Measurement::Sensor => "sensor",
            Measurement::Downlink => "downlink",
            Measurement::AirQuality => "air_quality",
            Measurement::Motion => "motion",
            Measurement::Synchro => "synchro",
        }
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Represents the value of a record field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl FieldValue {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric view of the value; integers are widened.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Int(v) => Some(*v as f64),
            FieldValue::Float(v) => Some(*v),
            FieldValue::Text(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(v) => Some(v),
            _ => None,
        }
    }
}

macro_rules! int_field_value {
    ($($t:ty),*) => {
        $(impl From<$t> for FieldValue {
            fn from(value: $t) -> Self {
                FieldValue::Int(value as i64)
            }
        })*
    };
}

int_field_value!(u8, u16, u32, i8, i16, i32, i64);

impl From<u64> for FieldValue {
    fn from(value: u64) -> Self {
        FieldValue::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

/// One decoded observation, ready for the time-series store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodedRecord {
    pub measurement: Measurement,
    /// Seconds since the Unix epoch.
    #[serde(rename = "time")]
    pub timestamp: i64,
    pub fields: BTreeMap<String, FieldValue>,
    pub tags: Tags,
}

impl DecodedRecord {
    pub fn new(measurement: Measurement, timestamp: i64, tags: Tags) -> Self {
        Self {
            measurement,
            timestamp,
            fields: BTreeMap::new(),
            tags,
        }
    }

    /// Builder-style field insertion.
    pub fn with_field(mut self, name: &str, value: impl Into<FieldValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: &str, value: impl Into<FieldValue>) {
        self.fields.insert(name.to_string(), value.into());
    }

    /// Insert the field only when a value was measured.
    pub fn insert_opt<V: Into<FieldValue>>(&mut self, name: &str, value: Option<V>) {
        if let Some(value) = value {
            self.insert(name, value);
        }
    }

    pub fn with_tag(mut self, name: &str, value: impl Into<String>) -> Self {
        self.tags.insert(name.to_string(), value.into());
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn tag(&self, name: &str) -> Option<&str> {
        self.tags.get(name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Accumulates the records of one frame, dropping any that ended up without fields.
#[derive(Debug, Default)]
pub struct RecordBatch {
    records: Vec<DecodedRecord>,
}

impl RecordBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a record; a record with no fields is discarded.
    pub fn push(&mut self, record: DecodedRecord) {
        if record.is_empty() {
            log::debug!(
                "dropping {} record at {}: every field was unavailable",
                record.measurement,
                record.timestamp
            );
            return;
        }
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_records(self) -> Vec<DecodedRecord> {
        self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_opt_skips_missing_values() {
        let mut record = DecodedRecord::new(Measurement::Sensor, 10, Tags::new());
        record.insert_opt("humidity", Some(41u8));
        record.insert_opt::<u8>("temperature", None);

        assert_eq!(record.field("humidity"), Some(&FieldValue::Int(41)));
        assert!(!record.has_field("temperature"));
    }

    #[test]
    fn test_batch_drops_empty_records() {
        let mut batch = RecordBatch::new();
        batch.push(DecodedRecord::new(Measurement::Weather, 1, Tags::new()));
        batch.push(
            DecodedRecord::new(Measurement::Metadata, 1, Tags::new())
                .with_field("last_communication", 1i64),
        );

        let records = batch.into_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].measurement, Measurement::Metadata);
    }

    #[test]
    fn test_measurement_names_match_serde() {
        let measurements = [
            Measurement::Metadata,
            Measurement::Monitoring,
            Measurement::Weather,
            Measurement::Geolocation,
            Measurement::Electrical,
            Measurement::Sensor,
            Measurement::Downlink,
            Measurement::AirQuality,
            Measurement::Motion,
            Measurement::Synchro,
        ];
        for measurement in measurements {
            let json = serde_json::to_value(measurement).unwrap();
            assert_eq!(json, measurement.as_str());
        }
        assert!(serde_json::from_str::<Measurement>("\"status\"").is_err());
    }

    #[test]
    fn test_field_value_serializes_untagged() {
        let record = DecodedRecord::new(Measurement::AirQuality, 7, Tags::new())
            .with_field("aqi_s", 120u16)
            .with_field("eco2", 415.5)
            .with_field("mode", "continuous")
            .with_tag("device_id", "1A2B3C");

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["measurement"], "air_quality");
        assert_eq!(json["time"], 7);
        assert_eq!(json["fields"]["aqi_s"], 120);
        assert_eq!(json["fields"]["eco2"], 415.5);
        assert_eq!(json["fields"]["mode"], "continuous");
        assert_eq!(json["tags"]["device_id"], "1A2B3C");
    }
}
