//! # edgepipe
//!
//! A lightweight, edge-deployed streaming data pipeline engine: origins produce
//! records in bounded batches, processors transform them, and destinations sink
//! them, with durable progress tracked through opaque source offsets.
//!
//! ## Features
//!
//! - **Schema-flexible records**: a dynamically typed, nested [`Field`] tree with
//!   path addressing, typed nulls, and an insertion-ordered map variant
//! - **Batch-driven stage contract**: `Origin` / `Processor` / `Destination`
//!   traits exchanging immutable records under backpressure
//! - **Expression language**: `${...}` templated expressions with namespaced
//!   function packages (`str:`, `math:`, `record:`, `pipeline:`, `job:`, `sdc:`)
//! - **Record codecs**: text, JSON, delimited, binary, whole-file, and the
//!   SDC-JSON framing format with exact round-trip fidelity
//!
//! ## Quick Start
//!
//! ```rust
//! use edgepipe::{EvalContext, Evaluator, Field, Record};
//!
//! let record = Record::new("list_reader", "file::1", Field::string("hello"));
//! assert_eq!(record.header().source_id(), "file::1");
//!
//! let evaluator = Evaluator::default_libraries();
//! let mut ctx = EvalContext::new();
//! ctx.set_parameter("NAME", Field::string("world"));
//! let out = evaluator.evaluate("${str:toUpper(NAME)}", &ctx).unwrap();
//! assert_eq!(out, Field::string("WORLD"));
//! ```

#![allow(clippy::collapsible_if)]
#![allow(clippy::large_enum_variant)]

pub mod edgepipe;

// Re-export main API at crate root for easy access
pub use edgepipe::codec::{RecordReader, RecordWriter};
pub use edgepipe::el::{EvalContext, Evaluator};
pub use edgepipe::error::{ElError, PipelineError, PipelineResult};
pub use edgepipe::record::{Field, FieldType, Header, OrderedMap, Record};
pub use edgepipe::stage::{
    Batch, BatchMaker, Destination, Origin, Processor, Stage, StageContext,
};
