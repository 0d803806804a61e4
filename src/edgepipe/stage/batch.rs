//! Batch containers passed between stages.

use crate::edgepipe::record::Record;

/// An immutable batch of records with the source offset it was produced at.
///
/// `records()` returns a fresh iterator each call; the records themselves are
/// shared, iterator state is not.
#[derive(Debug, Clone, Default)]
pub struct Batch {
    source_offset: String,
    records: Vec<Record>,
}

impl Batch {
    pub fn new(source_offset: impl Into<String>, records: Vec<Record>) -> Self {
        Batch {
            source_offset: source_offset.into(),
            records,
        }
    }

    /// Opaque offset the origin produced this batch at.
    pub fn source_offset(&self) -> &str {
        &self.source_offset
    }

    /// Fresh iterator over the batch contents, in production order.
    pub fn records(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Collects the records a stage emits during one invocation.
#[derive(Debug, Default)]
pub struct BatchMaker {
    lanes: Vec<String>,
    records: Vec<Record>,
}

impl BatchMaker {
    pub fn new() -> Self {
        BatchMaker::default()
    }

    pub fn with_lanes(lanes: Vec<String>) -> Self {
        BatchMaker {
            lanes,
            records: Vec::new(),
        }
    }

    /// Output lanes of the producing stage.
    pub fn lanes(&self) -> &[String] {
        &self.lanes
    }

    /// Append a record, preserving production order.
    pub fn add_record(&mut self, record: Record) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drain the collected records into a batch at the given offset.
    pub fn into_batch(self, source_offset: impl Into<String>) -> Batch {
        Batch::new(source_offset, self.records)
    }
}
