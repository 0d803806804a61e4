//! The record model: a mutable [`Header`] carrying lineage and error metadata
//! plus a root [`Field`] holding the payload.
//!
//! Records are created by a stage through its context with a source id and an
//! initial value, flow through the pipeline immutable to everything outside
//! the current stage, and are diverted to the error sink with their error
//! headers populated when a stage reports them.

pub mod field;
pub mod ordered_map;
pub mod path;

pub use field::{Field, FieldType};
pub use ordered_map::{OrderedMap, OrderedMapEntries};
pub use path::{parse_field_path, PathSegment};

use crate::edgepipe::error::PipelineResult;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Record header: lineage, error metadata, and a bag of user attributes.
///
/// Field names serialize with the SDC-JSON wire names; the user attribute bag
/// serializes as `values`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Header {
    /// Origin stage instance that created the record
    pub stage_creator: String,
    /// Stable id within a batch of records produced from the same input unit
    pub source_id: String,
    /// Accumulated path of stages the record has transited
    pub stages_path: String,
    pub tracking_id: String,
    pub previous_tracking_id: String,
    pub error_data_collector_id: String,
    pub error_pipeline_name: String,
    pub error_stage: String,
    pub error_code: String,
    pub error_message: String,
    /// Milliseconds since epoch; zero when the record has no error
    pub error_timestamp: i64,
    pub error_stack_trace: String,
    /// Unordered user attributes
    #[serde(rename = "values")]
    pub attributes: HashMap<String, String>,
}

impl Header {
    /// Create a header for a newly produced record.
    pub fn new(stage_creator: impl Into<String>, source_id: impl Into<String>) -> Self {
        Header {
            stage_creator: stage_creator.into(),
            source_id: source_id.into(),
            ..Header::default()
        }
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    pub fn stage_creator(&self) -> &str {
        &self.stage_creator
    }

    /// Look up a user attribute.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Set a user attribute.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(name.into(), value.into());
    }

    /// Append a stage instance name to the accumulated stages path.
    pub fn append_stage(&mut self, stage: &str) {
        if self.stages_path.is_empty() {
            self.stages_path = stage.to_string();
        } else {
            self.stages_path = format!("{}:{}", self.stages_path, stage);
        }
    }

    /// Populate the error fields in one shot; the timestamp is stamped with
    /// the current time.
    pub fn set_error(
        &mut self,
        data_collector_id: impl Into<String>,
        pipeline_name: impl Into<String>,
        stage: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.error_data_collector_id = data_collector_id.into();
        self.error_pipeline_name = pipeline_name.into();
        self.error_stage = stage.into();
        self.error_message = message.into();
        self.error_timestamp = Utc::now().timestamp_millis();
    }
}

/// A unit of data flowing through a pipeline: `(header, root field)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    header: Header,
    value: Field,
}

impl Record {
    /// Create a record with a fresh header.
    pub fn new(
        stage_creator: impl Into<String>,
        source_id: impl Into<String>,
        value: Field,
    ) -> Self {
        Record {
            header: Header::new(stage_creator, source_id),
            value,
        }
    }

    /// Reassemble a record from its parts (used by codecs on the read path).
    pub fn from_parts(header: Header, value: Field) -> Self {
        Record { header, value }
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn header_mut(&mut self) -> &mut Header {
        &mut self.header
    }

    /// The root field.
    pub fn value(&self) -> &Field {
        &self.value
    }

    pub fn value_mut(&mut self) -> &mut Field {
        &mut self.value
    }

    /// Replace the root field, returning the previous one.
    pub fn set_value(&mut self, value: Field) -> Field {
        std::mem::replace(&mut self.value, value)
    }

    /// Resolve a field path against the root field.
    pub fn get(&self, path: &str) -> PipelineResult<Option<&Field>> {
        self.value.get_path(path)
    }

    /// Set the field at `path`; parents must exist.
    pub fn set(&mut self, path: &str, field: Field) -> PipelineResult<Option<Field>> {
        self.value.set_path(path, field)
    }

    /// Delete the field at `path` if present.
    pub fn delete(&mut self, path: &str) -> PipelineResult<Option<Field>> {
        self.value.delete_path(path)
    }

    /// Whether a field exists at `path`.
    pub fn has(&self, path: &str) -> bool {
        matches!(self.value.get_path(path), Ok(Some(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_attributes_round_trip() {
        let mut record = Record::new("origin_1", "file::1", Field::string("x"));
        record
            .header_mut()
            .set_attribute("Sample Attribute", "Sample Value1");
        assert_eq!(
            record.header().attribute("Sample Attribute"),
            Some("Sample Value1")
        );
        assert_eq!(record.header().attribute("missing"), None);
    }

    #[test]
    fn stages_path_accumulates() {
        let mut header = Header::new("origin_1", "id");
        header.append_stage("origin_1");
        header.append_stage("processor_1");
        assert_eq!(header.stages_path, "origin_1:processor_1");
    }

    #[test]
    fn set_error_stamps_timestamp() {
        let mut header = Header::new("origin_1", "id");
        assert_eq!(header.error_timestamp, 0);
        header.set_error("sdc-1", "pipe-1", "dest_1", "write refused");
        assert_eq!(header.error_stage, "dest_1");
        assert_eq!(header.error_message, "write refused");
        assert!(header.error_timestamp > 0);
    }
}
