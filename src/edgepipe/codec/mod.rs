//! Record codecs: per-format readers and writers bound to byte streams.
//!
//! Readers expose `read_record() → Ok(None)` at end of stream (never an
//! error); writers expose `write_record`, `flush`, `close`. Every codec is
//! constructed from a config-bearing factory in [`crate::edgepipe::service`],
//! binding it to a byte source or sink.
//!
//! When one input unit with message id `mid` yields multiple records, the
//! records carry source ids `mid::1`, `mid::2`, ... — a stable contract that
//! downstream event identity relies on.

pub mod binary;
pub mod delimited;
pub mod json;
pub mod sdc_json;
pub mod text;
pub mod whole_file;

use crate::edgepipe::error::PipelineResult;
use crate::edgepipe::record::Record;

/// Reads records from a byte stream, one per call.
pub trait RecordReader {
    /// The next record, or `None` at end of stream.
    fn read_record(&mut self) -> PipelineResult<Option<Record>>;

    /// Release the underlying stream. A stream that is not closable makes
    /// this a no-op.
    fn close(&mut self) -> PipelineResult<()> {
        Ok(())
    }
}

/// Writes records to a byte sink.
pub trait RecordWriter {
    fn write_record(&mut self, record: &Record) -> PipelineResult<()>;

    /// Push buffered bytes to the sink.
    fn flush(&mut self) -> PipelineResult<()>;

    /// Flush and release the underlying sink. A sink that is not closable
    /// makes the release a no-op.
    fn close(&mut self) -> PipelineResult<()>;
}

/// Source id for the `n`th record (1-based) produced from one input unit.
pub(crate) fn nth_source_id(message_id: &str, n: usize) -> String {
    format!("{}::{}", message_id, n)
}
