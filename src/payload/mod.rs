//! The payload module contains the output record model and the pure numeric
//! building blocks shared by every family decoder.

pub mod codec;
pub mod record;
pub mod sentinel;

pub use codec::*;
pub use record::{DecodedRecord, FieldValue, Measurement, RecordBatch, Tags};
pub use sentinel::{decode_field, measured};
