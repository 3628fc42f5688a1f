//! Persistence handoff.
//!
//! Decoded records are written as one batch per uplink to the database of the
//! family that produced them (`sigfox_<family>`). Two textual encodings are
//! provided for piping into a time-series store:
//!
//! - [`LineProtocolSink`]: InfluxDB line protocol with second precision. A
//!   `# CONTEXT-DATABASE:` comment is emitted whenever the target database
//!   changes, which is the format `influx -import` reads.
//! - [`JsonLinesSink`]: one JSON object per record, carrying its database.

use crate::error::DecodeError;
use crate::payload::record::{DecodedRecord, FieldValue};
use crate::registry::Family;
use serde::Serialize;
use std::io::Write;

/// Destination for decoded record batches.
pub trait RecordSink {
    /// Write the records of one uplink.
    fn write_batch(&mut self, family: Family, records: &[DecodedRecord]) -> Result<(), DecodeError>;

    fn flush(&mut self) -> Result<(), DecodeError> {
        Ok(())
    }
}

fn escape(value: &str, special: &[char]) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if special.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn format_field(value: &FieldValue) -> String {
    match value {
        FieldValue::Int(v) => format!("{v}i"),
        FieldValue::Float(v) => format!("{v}"),
        FieldValue::Text(v) => format!("\"{}\"", escape(v, &['"', '\\'])),
    }
}

/// One line-protocol line: `measurement,tag=v field=v timestamp`.
///
/// Tags and fields come out in key order, so equal records format identically.
pub fn format_line(record: &DecodedRecord) -> String {
    let mut line = escape(record.measurement.as_str(), &[',', ' ']);

    for (key, value) in &record.tags {
        if value.is_empty() {
            continue;
        }
        line.push(',');
        line.push_str(&escape(key, &[',', '=', ' ']));
        line.push('=');
        line.push_str(&escape(value, &[',', '=', ' ']));
    }

    let fields: Vec<String> = record
        .fields
        .iter()
        .map(|(key, value)| format!("{}={}", escape(key, &[',', '=', ' ']), format_field(value)))
        .collect();
    line.push(' ');
    line.push_str(&fields.join(","));
    line.push(' ');
    line.push_str(&record.timestamp.to_string());
    line
}

/// Line-protocol writer.
pub struct LineProtocolSink<W: Write> {
    writer: W,
    database: Option<String>,
}

impl<W: Write> LineProtocolSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            database: None,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> RecordSink for LineProtocolSink<W> {
    fn write_batch(&mut self, family: Family, records: &[DecodedRecord]) -> Result<(), DecodeError> {
        if records.is_empty() {
            return Ok(());
        }
        let database = family.database();
        if self.database.as_deref() != Some(database.as_str()) {
            writeln!(self.writer, "# CONTEXT-DATABASE: {database}")?;
            self.database = Some(database);
        }
        for record in records.iter().filter(|record| !record.is_empty()) {
            writeln!(self.writer, "{}", format_line(record))?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), DecodeError> {
        self.writer.flush()?;
        Ok(())
    }
}

#[derive(Serialize)]
struct RoutedRecord<'r> {
    database: String,
    #[serde(flatten)]
    record: &'r DecodedRecord,
}

/// JSON-lines writer.
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> RecordSink for JsonLinesSink<W> {
    fn write_batch(&mut self, family: Family, records: &[DecodedRecord]) -> Result<(), DecodeError> {
        let database = family.database();
        for record in records {
            let routed = RoutedRecord {
                database: database.clone(),
                record,
            };
            serde_json::to_writer(&mut self.writer, &routed)?;
            self.writer.write_all(b"\n")?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), DecodeError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// In-memory sink, grouping records by database.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub batches: Vec<(String, Vec<DecodedRecord>)>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> impl Iterator<Item = &DecodedRecord> {
        self.batches.iter().flat_map(|(_, records)| records.iter())
    }
}

impl RecordSink for MemorySink {
    fn write_batch(&mut self, family: Family, records: &[DecodedRecord]) -> Result<(), DecodeError> {
        self.batches.push((family.database(), records.to_vec()));
        Ok(())
    }
}
