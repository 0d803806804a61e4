//! Sequential pipeline execution.
//!
//! One origin, zero or more processors, one or more destinations, driven as a
//! single task. Stage calls are strictly sequential; a `None` offset from the
//! origin is terminal; cancellation is cooperative and checked between
//! batches. Stage errors always surface, never get swallowed.

use super::batch::{Batch, BatchMaker};
use super::context::StageContext;
use super::{Destination, Origin, Processor};
use crate::edgepipe::error::{ConfigIssue, PipelineError, PipelineResult};
use log::{debug, info, warn};

/// In-memory record of the last committed source offset. Offsets are opaque.
#[derive(Debug, Default)]
pub struct OffsetTracker {
    committed: Option<String>,
}

impl OffsetTracker {
    pub fn new() -> Self {
        OffsetTracker::default()
    }

    pub fn resume_from(offset: Option<String>) -> Self {
        OffsetTracker { committed: offset }
    }

    pub fn commit(&mut self, offset: impl Into<String>) {
        self.committed = Some(offset.into());
    }

    pub fn last(&self) -> Option<&str> {
        self.committed.as_deref()
    }
}

pub struct PipelineRunner {
    pipeline_name: String,
    context: StageContext,
    origin: Box<dyn Origin>,
    processors: Vec<Box<dyn Processor>>,
    destinations: Vec<Box<dyn Destination>>,
    max_batch_size: usize,
    offsets: OffsetTracker,
}

impl PipelineRunner {
    pub fn new(
        pipeline_name: impl Into<String>,
        context: StageContext,
        origin: Box<dyn Origin>,
        processors: Vec<Box<dyn Processor>>,
        destinations: Vec<Box<dyn Destination>>,
        max_batch_size: usize,
    ) -> Self {
        PipelineRunner {
            pipeline_name: pipeline_name.into(),
            context,
            origin,
            processors,
            destinations,
            max_batch_size,
            offsets: OffsetTracker::new(),
        }
    }

    /// Resume the origin from a previously committed offset.
    pub fn with_offset(mut self, offset: impl Into<String>) -> Self {
        self.offsets = OffsetTracker::resume_from(Some(offset.into()));
        self
    }

    pub fn last_offset(&self) -> Option<&str> {
        self.offsets.last()
    }

    pub fn context(&self) -> &StageContext {
        &self.context
    }

    fn init_stages(&mut self) -> PipelineResult<()> {
        let mut issues: Vec<ConfigIssue> = Vec::new();
        issues.extend(self.origin.init(&self.context));
        for processor in &mut self.processors {
            issues.extend(processor.init(&self.context));
        }
        for destination in &mut self.destinations {
            issues.extend(destination.init(&self.context));
        }
        if issues.is_empty() {
            Ok(())
        } else {
            for issue in &issues {
                warn!("{}: validation issue: {}", self.pipeline_name, issue);
            }
            Err(PipelineError::validation(issues))
        }
    }

    async fn destroy_stages(&mut self) {
        for destination in self.destinations.iter_mut().rev() {
            destination.destroy().await;
        }
        for processor in self.processors.iter_mut().rev() {
            processor.destroy().await;
        }
        self.origin.destroy().await;
    }

    async fn run_batch(&mut self) -> PipelineResult<Option<String>> {
        let last_offset = self.offsets.last().map(str::to_string);
        let mut maker = BatchMaker::with_lanes(self.context.output_lanes().to_vec());
        let next_offset = self
            .origin
            .produce(last_offset, self.max_batch_size, &mut maker)
            .await?;

        let offset_label = next_offset.clone().unwrap_or_default();
        let mut batch: Batch = maker.into_batch(offset_label.clone());
        debug!(
            "{}: produced batch of {} record(s) at offset '{}'",
            self.pipeline_name,
            batch.len(),
            offset_label
        );

        for processor in &mut self.processors {
            let mut maker = BatchMaker::with_lanes(self.context.output_lanes().to_vec());
            processor.process(&batch, &mut maker).await?;
            batch = maker.into_batch(offset_label.clone());
        }

        for destination in &mut self.destinations {
            destination.write(&batch).await?;
        }

        self.context
            .metrics()
            .add("records.output", batch.len() as u64);
        self.context.metrics().increment("pipeline.batches");
        Ok(next_offset)
    }

    /// Drive the pipeline until the origin signals terminal (a `None` offset),
    /// cancellation is requested, or a stage fails. Stages are destroyed in
    /// reverse order on every exit path.
    pub async fn run(&mut self) -> PipelineResult<()> {
        info!("{}: starting pipeline", self.pipeline_name);
        if let Err(err) = self.init_stages() {
            self.destroy_stages().await;
            return Err(err);
        }

        let result = loop {
            match self.run_batch().await {
                Ok(Some(offset)) => {
                    self.offsets.commit(offset);
                }
                Ok(None) => {
                    info!("{}: origin signaled end of data", self.pipeline_name);
                    break Ok(());
                }
                Err(err) => {
                    warn!("{}: batch failed: {}", self.pipeline_name, err);
                    break Err(err);
                }
            }
            if self.context.is_cancelled() {
                info!("{}: cancellation requested", self.pipeline_name);
                break Ok(());
            }
        };

        self.destroy_stages().await;
        info!("{}: pipeline stopped", self.pipeline_name);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edgepipe::record::{Field, Record};
    use crate::edgepipe::stage::Stage;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    struct VecOrigin {
        lines: Vec<String>,
    }

    #[async_trait]
    impl Stage for VecOrigin {}

    #[async_trait]
    impl Origin for VecOrigin {
        async fn produce(
            &mut self,
            last_offset: Option<String>,
            max_batch_size: usize,
            batch_maker: &mut BatchMaker,
        ) -> PipelineResult<Option<String>> {
            let start: usize = last_offset
                .as_deref()
                .map(|o| o.parse().unwrap_or(0))
                .unwrap_or(0);
            if start >= self.lines.len() {
                return Ok(None);
            }
            let end = (start + max_batch_size).min(self.lines.len());
            for (i, line) in self.lines[start..end].iter().enumerate() {
                batch_maker.add_record(Record::new(
                    "origin_1",
                    format!("lines::{}", start + i + 1),
                    Field::string(line.clone()),
                ));
            }
            Ok(Some(end.to_string()))
        }
    }

    struct UppercaseProcessor;

    #[async_trait]
    impl Stage for UppercaseProcessor {}

    #[async_trait]
    impl Processor for UppercaseProcessor {
        async fn process(
            &mut self,
            batch: &Batch,
            batch_maker: &mut BatchMaker,
        ) -> PipelineResult<()> {
            for record in batch.records() {
                let mut out = record.clone();
                if let Some(text) = record.value().as_str() {
                    out.set_value(Field::string(text.to_uppercase()));
                }
                batch_maker.add_record(out);
            }
            Ok(())
        }
    }

    #[derive(Clone)]
    struct CollectingDestination {
        written: Arc<Mutex<Vec<Record>>>,
    }

    #[async_trait]
    impl Stage for CollectingDestination {}

    #[async_trait]
    impl Destination for CollectingDestination {
        async fn write(&mut self, batch: &Batch) -> PipelineResult<()> {
            self.written.lock().unwrap().extend(batch.records().cloned());
            Ok(())
        }
    }

    #[tokio::test]
    async fn runs_to_terminal_offset_preserving_order() {
        let written = Arc::new(Mutex::new(Vec::new()));
        let mut runner = PipelineRunner::new(
            "test-pipeline",
            StageContext::new("origin_1"),
            Box::new(VecOrigin {
                lines: vec!["a".into(), "b".into(), "c".into()],
            }),
            vec![Box::new(UppercaseProcessor)],
            vec![Box::new(CollectingDestination {
                written: written.clone(),
            })],
            2,
        );
        runner.run().await.unwrap();

        let records = written.lock().unwrap();
        let values: Vec<String> = records.iter().map(|r| r.value().to_string()).collect();
        assert_eq!(values, ["A", "B", "C"]);
        assert_eq!(runner.last_offset(), Some("3"));
        assert_eq!(runner.context().metrics().counter("records.output"), 3);
    }

    #[tokio::test]
    async fn resumes_from_a_committed_offset() {
        let written = Arc::new(Mutex::new(Vec::new()));
        let mut runner = PipelineRunner::new(
            "test-pipeline",
            StageContext::new("origin_1"),
            Box::new(VecOrigin {
                lines: vec!["a".into(), "b".into(), "c".into()],
            }),
            Vec::new(),
            vec![Box::new(CollectingDestination {
                written: written.clone(),
            })],
            10,
        )
        .with_offset("2");
        runner.run().await.unwrap();

        let records = written.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].header().source_id(), "lines::3");
    }

    #[tokio::test]
    async fn cancellation_stops_between_batches() {
        let written = Arc::new(Mutex::new(Vec::new()));
        let context = StageContext::new("origin_1");
        context.cancel();
        let mut runner = PipelineRunner::new(
            "test-pipeline",
            context,
            Box::new(VecOrigin {
                lines: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            }),
            Vec::new(),
            vec![Box::new(CollectingDestination {
                written: written.clone(),
            })],
            1,
        );
        runner.run().await.unwrap();

        // The in-flight batch finishes; nothing further is produced.
        assert_eq!(written.lock().unwrap().len(), 1);
    }
}
