//! Evaluation context carried through expression evaluation.
//!
//! The context supplies the current record for `record:*`, pipeline identity
//! values for `pipeline:*`, job identity for `job:*`, and user parameter
//! bindings for free variables. Evaluation never mutates the context and the
//! evaluator fabricates no defaults: absent context values surface as errors
//! (`job:startTime()` alone falls back to the current time).

use crate::edgepipe::record::{Field, Record};
use std::collections::HashMap;

/// Pipeline identity values exposed to `pipeline:*` functions.
#[derive(Debug, Clone, Default)]
pub struct PipelineEl {
    pub id: String,
    pub title: String,
    pub user: String,
    /// Milliseconds since epoch
    pub start_time: i64,
}

/// Job identity values exposed to `job:*` functions.
#[derive(Debug, Clone, Default)]
pub struct JobEl {
    pub id: String,
    pub name: String,
    pub user: String,
    /// Milliseconds since epoch
    pub start_time: i64,
}

/// Per-evaluation context, read-only during evaluation.
#[derive(Debug, Clone, Default)]
pub struct EvalContext<'a> {
    record: Option<&'a Record>,
    pipeline: Option<PipelineEl>,
    job: Option<JobEl>,
    parameters: HashMap<String, Field>,
}

impl<'a> EvalContext<'a> {
    pub fn new() -> Self {
        EvalContext::default()
    }

    /// Attach the record evaluated against (`record:*`).
    pub fn set_record(&mut self, record: &'a Record) {
        self.record = Some(record);
    }

    pub fn record(&self) -> Option<&Record> {
        self.record
    }

    /// Attach pipeline identity values (`pipeline:*`).
    pub fn set_pipeline(&mut self, pipeline: PipelineEl) {
        self.pipeline = Some(pipeline);
    }

    pub fn pipeline(&self) -> Option<&PipelineEl> {
        self.pipeline.as_ref()
    }

    /// Attach job identity values (`job:*`).
    pub fn set_job(&mut self, job: JobEl) {
        self.job = Some(job);
    }

    pub fn job(&self) -> Option<&JobEl> {
        self.job.as_ref()
    }

    /// Bind a free variable.
    pub fn set_parameter(&mut self, name: impl Into<String>, value: Field) {
        self.parameters.insert(name.into(), value);
    }

    pub fn parameter(&self, name: &str) -> Option<&Field> {
        self.parameters.get(name)
    }

    /// Builder-style record attach, convenient at call sites.
    pub fn with_record(mut self, record: &'a Record) -> Self {
        self.record = Some(record);
        self
    }
}
