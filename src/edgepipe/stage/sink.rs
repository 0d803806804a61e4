//! Shared pipeline-wide sinks and metrics.
//!
//! The error sink, event sink, and metrics registry are shared by every stage
//! in a pipeline. Stages run sequentially but destinations may emit from
//! internal tasks, so all three are safe for concurrent mutation.

use crate::edgepipe::record::Record;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Collects records diverted out of the normal flow with their error headers
/// populated.
#[derive(Debug, Clone, Default)]
pub struct ErrorSink {
    records: Arc<Mutex<Vec<Record>>>,
}

impl ErrorSink {
    pub fn new() -> Self {
        ErrorSink::default()
    }

    pub fn add_record(&self, record: Record) {
        self.records.lock().unwrap().push(record);
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove and return everything collected so far.
    pub fn drain(&self) -> Vec<Record> {
        std::mem::take(&mut *self.records.lock().unwrap())
    }
}

/// Collects event records emitted by stages (lifecycle events, file-closed
/// notifications, and the like).
#[derive(Debug, Clone, Default)]
pub struct EventSink {
    records: Arc<Mutex<Vec<Record>>>,
}

impl EventSink {
    pub fn new() -> Self {
        EventSink::default()
    }

    pub fn add_record(&self, record: Record) {
        self.records.lock().unwrap().push(record);
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn drain(&self) -> Vec<Record> {
        std::mem::take(&mut *self.records.lock().unwrap())
    }
}

/// Named monotonic counters shared across a pipeline.
#[derive(Debug, Clone, Default)]
pub struct MetricsRegistry {
    counters: Arc<Mutex<HashMap<String, u64>>>,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        MetricsRegistry::default()
    }

    pub fn increment(&self, name: &str) {
        self.add(name, 1);
    }

    pub fn add(&self, name: &str, delta: u64) {
        let mut counters = self.counters.lock().unwrap();
        *counters.entry(name.to_string()).or_insert(0) += delta;
    }

    /// Current value of a counter; zero when never incremented.
    pub fn counter(&self, name: &str) -> u64 {
        self.counters
            .lock()
            .unwrap()
            .get(name)
            .copied()
            .unwrap_or(0)
    }

    /// Snapshot of all counters.
    pub fn snapshot(&self) -> HashMap<String, u64> {
        self.counters.lock().unwrap().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edgepipe::record::Field;

    #[test]
    fn error_sink_is_shared_between_clones() {
        let sink = ErrorSink::new();
        let other = sink.clone();
        other.add_record(Record::new("o", "s::1", Field::string("bad")));
        assert_eq!(sink.len(), 1);
        assert_eq!(sink.drain().len(), 1);
        assert!(sink.is_empty());
    }

    #[test]
    fn counters_accumulate() {
        let metrics = MetricsRegistry::new();
        metrics.increment("records.output");
        metrics.add("records.output", 4);
        assert_eq!(metrics.counter("records.output"), 5);
        assert_eq!(metrics.counter("records.error"), 0);
    }
}
