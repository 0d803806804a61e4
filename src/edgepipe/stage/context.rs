//! Per-stage runtime context.
//!
//! One context per stage instance, sharing the pipeline-wide sinks, metrics,
//! evaluator, and cancellation flag with every other stage in the pipeline.

use super::sink::{ErrorSink, EventSink, MetricsRegistry};
use crate::edgepipe::el::{EvalContext, Evaluator, JobEl, PipelineEl};
use crate::edgepipe::error::PipelineResult;
use crate::edgepipe::record::{Field, Record};
use log::{debug, error};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Clone)]
pub struct StageContext {
    stage_name: String,
    data_collector_id: String,
    pipeline_name: String,
    output_lanes: Vec<String>,
    evaluator: Arc<Evaluator>,
    parameters: HashMap<String, Field>,
    pipeline: Option<PipelineEl>,
    job: Option<JobEl>,
    error_sink: ErrorSink,
    event_sink: EventSink,
    metrics: MetricsRegistry,
    cancelled: Arc<AtomicBool>,
}

impl StageContext {
    pub fn new(stage_name: impl Into<String>) -> Self {
        StageContext {
            stage_name: stage_name.into(),
            data_collector_id: String::new(),
            pipeline_name: String::new(),
            output_lanes: Vec::new(),
            evaluator: Arc::new(Evaluator::default_libraries()),
            parameters: HashMap::new(),
            pipeline: None,
            job: None,
            error_sink: ErrorSink::new(),
            event_sink: EventSink::new(),
            metrics: MetricsRegistry::new(),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Clone of this context for another stage instance, sharing the sinks,
    /// metrics, evaluator, and cancellation flag.
    pub fn for_stage(&self, stage_name: impl Into<String>) -> Self {
        let mut ctx = self.clone();
        ctx.stage_name = stage_name.into();
        ctx
    }

    pub fn with_identity(
        mut self,
        data_collector_id: impl Into<String>,
        pipeline_name: impl Into<String>,
    ) -> Self {
        self.data_collector_id = data_collector_id.into();
        self.pipeline_name = pipeline_name.into();
        self
    }

    pub fn with_output_lanes(mut self, lanes: Vec<String>) -> Self {
        self.output_lanes = lanes;
        self
    }

    pub fn with_evaluator(mut self, evaluator: Arc<Evaluator>) -> Self {
        self.evaluator = evaluator;
        self
    }

    pub fn with_pipeline(mut self, pipeline: PipelineEl) -> Self {
        self.pipeline = Some(pipeline);
        self
    }

    pub fn with_job(mut self, job: JobEl) -> Self {
        self.job = Some(job);
        self
    }

    pub fn set_parameter(&mut self, name: impl Into<String>, value: Field) {
        self.parameters.insert(name.into(), value);
    }

    pub fn stage_name(&self) -> &str {
        &self.stage_name
    }

    pub fn output_lanes(&self) -> &[String] {
        &self.output_lanes
    }

    pub fn metrics(&self) -> &MetricsRegistry {
        &self.metrics
    }

    pub fn error_sink(&self) -> &ErrorSink {
        &self.error_sink
    }

    pub fn event_sink(&self) -> &EventSink {
        &self.event_sink
    }

    /// Create a record attributed to this stage.
    pub fn create_record(&self, source_id: impl Into<String>, value: Field) -> Record {
        Record::new(&self.stage_name, source_id, value)
    }

    fn eval_context(&self) -> EvalContext<'_> {
        let mut ctx = EvalContext::new();
        if let Some(pipeline) = &self.pipeline {
            ctx.set_pipeline(pipeline.clone());
        }
        if let Some(job) = &self.job {
            ctx.set_job(job.clone());
        }
        for (name, value) in &self.parameters {
            ctx.set_parameter(name.clone(), value.clone());
        }
        ctx
    }

    /// Resolve a config value: evaluated when templated, passed through
    /// untouched otherwise.
    pub fn get_resolved_value(&self, raw: &str) -> PipelineResult<Field> {
        Ok(self.evaluator.evaluate(raw, &self.eval_context())?)
    }

    /// Evaluate a config value against a record.
    pub fn evaluate(
        &self,
        raw: &str,
        config_name: &str,
        record: &Record,
    ) -> PipelineResult<Field> {
        let ctx = self.eval_context().with_record(record);
        self.evaluator.evaluate(raw, &ctx).map_err(|e| {
            debug!(
                "{}: evaluation of '{}' failed: {}",
                self.stage_name, config_name, e
            );
            e.into()
        })
    }

    /// Divert a record to the error sink with its error headers populated.
    pub fn to_error(&self, message: impl Into<String>, mut record: Record) {
        record.header_mut().set_error(
            &self.data_collector_id,
            &self.pipeline_name,
            &self.stage_name,
            message,
        );
        self.metrics.increment("records.error");
        self.error_sink.add_record(record);
    }

    /// Report a stage-level error that has no single offending record.
    pub fn report_error(&self, message: impl AsRef<str>) {
        error!("{}: {}", self.stage_name, message.as_ref());
        self.metrics.increment("stage.errors");
    }

    /// Emit an event record to the event sink.
    pub fn to_event(&self, record: Record) {
        self.event_sink.add_record(record);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Shared flag observed by the runner and embedders.
    pub fn cancellation_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_error_populates_error_headers() {
        let ctx = StageContext::new("dest_1").with_identity("edge-01", "readings");
        let record = ctx.create_record("src::1", Field::string("x"));
        ctx.to_error("no route", record);

        let errors = ctx.error_sink().drain();
        assert_eq!(errors.len(), 1);
        let header = errors[0].header();
        assert_eq!(header.error_stage, "dest_1");
        assert_eq!(header.error_message, "no route");
        assert_eq!(header.error_pipeline_name, "readings");
        assert!(header.error_timestamp > 0);
        assert_eq!(ctx.metrics().counter("records.error"), 1);
    }

    #[test]
    fn resolved_value_runs_el_only_for_templates() {
        let mut ctx = StageContext::new("origin_1");
        ctx.set_parameter("TOPIC", Field::string("readings"));

        let resolved = ctx.get_resolved_value("${TOPIC}").unwrap();
        assert_eq!(resolved, Field::string("readings"));

        let passthrough = ctx.get_resolved_value("plain-value").unwrap();
        assert_eq!(passthrough, Field::string("plain-value"));
    }

    #[test]
    fn cancellation_is_shared_across_stage_contexts() {
        let ctx = StageContext::new("origin_1");
        let downstream = ctx.for_stage("dest_1");
        downstream.cancel();
        assert!(ctx.is_cancelled());
    }
}
