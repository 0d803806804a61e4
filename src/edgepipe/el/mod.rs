//! The expression language (EL).
//!
//! Configuration strings of the exact form `${ <expr> }` are evaluated against
//! a per-record context; any other string passes through untouched. Functions
//! are provided by namespaced libraries (`str:`, `math:`, `record:`,
//! `pipeline:`, `job:`, `sdc:`, plus un-namespaced map/list helpers and
//! `uuid:uuid()`), composed into a single name table per evaluator.

pub mod ast;
pub mod context;
pub mod evaluator;
pub mod functions;
pub mod lexer;
pub mod parser;

pub use context::{EvalContext, JobEl, PipelineEl};
pub use evaluator::{ElFunction, Evaluator, FunctionLibrary};
