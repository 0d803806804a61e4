//! The batch-driven stage execution contract.
//!
//! A pipeline is one origin, zero or more processors, and one or more
//! destinations, invoked strictly sequentially by the [`runner`]. Stages
//! validate their configuration in `init` (returning issues, not panicking),
//! release resources in `destroy`, and interact with the pipeline through
//! their [`StageContext`].

pub mod batch;
pub mod context;
pub mod partition;
pub mod runner;
pub mod sink;

pub use batch::{Batch, BatchMaker};
pub use context::StageContext;
pub use partition::partition_batch;
pub use runner::{OffsetTracker, PipelineRunner};
pub use sink::{ErrorSink, EventSink, MetricsRegistry};

use crate::edgepipe::error::{ConfigIssue, PipelineResult};
use async_trait::async_trait;

/// Lifecycle shared by every stage kind.
#[async_trait]
pub trait Stage: Send + Sync {
    /// Validate configuration and acquire resources. Returning a non-empty
    /// issue list aborts pipeline startup.
    fn init(&mut self, _context: &StageContext) -> Vec<ConfigIssue> {
        Vec::new()
    }

    /// Release resources. Called in reverse dependency order, including after
    /// failed runs.
    async fn destroy(&mut self) {}
}

/// Produces batches from an external source.
#[async_trait]
pub trait Origin: Stage {
    /// Produce up to `max_batch_size` records into `batch_maker`.
    ///
    /// Must not block indefinitely: with no data available, return an empty
    /// batch and a fresh offset. Returning `None` is terminal; the pipeline
    /// drains the current batch and stops.
    async fn produce(
        &mut self,
        last_offset: Option<String>,
        max_batch_size: usize,
        batch_maker: &mut BatchMaker,
    ) -> PipelineResult<Option<String>>;
}

/// Transforms one batch into the next.
///
/// Stateless with respect to the framework; stage-local state lives in the
/// implementing struct.
#[async_trait]
pub trait Processor: Stage {
    async fn process(&mut self, batch: &Batch, batch_maker: &mut BatchMaker)
        -> PipelineResult<()>;
}

/// Delivers a batch to an external system.
///
/// Partial failure routes the offending records to the error sink through the
/// stage context; returning an error is reserved for transport-level failure
/// and is terminal for the batch.
#[async_trait]
pub trait Destination: Stage {
    async fn write(&mut self, batch: &Batch) -> PipelineResult<()>;
}
