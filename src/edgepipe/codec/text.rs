//! Text codec: one record per line.
//!
//! The reader splits the stream on `\n` and emits a map `{text: <line>}`;
//! the writer renders a configured field path followed by a newline.

use super::{nth_source_id, RecordReader, RecordWriter};
use crate::edgepipe::error::{PipelineError, PipelineResult};
use crate::edgepipe::record::{Field, Record};
use std::collections::HashMap;
use std::io::{BufRead, Write};

/// Key the reader stores each line under.
pub const TEXT_FIELD: &str = "text";

pub struct TextReader<R: BufRead> {
    reader: R,
    stage: String,
    message_id: String,
    counter: usize,
}

impl<R: BufRead> TextReader<R> {
    pub fn new(stage: impl Into<String>, message_id: impl Into<String>, reader: R) -> Self {
        TextReader {
            reader,
            stage: stage.into(),
            message_id: message_id.into(),
            counter: 0,
        }
    }
}

impl<R: BufRead> RecordReader for TextReader<R> {
    fn read_record(&mut self) -> PipelineResult<Option<Record>> {
        let mut line = String::new();
        let n = self.reader.read_line(&mut line)?;
        if n == 0 {
            return Ok(None);
        }
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        self.counter += 1;
        let mut root = HashMap::new();
        root.insert(TEXT_FIELD.to_string(), Field::string(line));
        Ok(Some(Record::new(
            &self.stage,
            nth_source_id(&self.message_id, self.counter),
            Field::Map(root),
        )))
    }
}

pub struct TextWriter<W: Write> {
    writer: W,
    /// Field rendered per record; defaults to `/text`
    field_path: String,
}

impl<W: Write> TextWriter<W> {
    pub fn new(writer: W) -> Self {
        TextWriter {
            writer,
            field_path: format!("/{}", TEXT_FIELD),
        }
    }

    pub fn with_field_path(writer: W, field_path: impl Into<String>) -> Self {
        TextWriter {
            writer,
            field_path: field_path.into(),
        }
    }
}

impl<W: Write> RecordWriter for TextWriter<W> {
    fn write_record(&mut self, record: &Record) -> PipelineResult<()> {
        let field = record.get(&self.field_path)?.ok_or_else(|| {
            PipelineError::record_error(
                Some(record.header().source_id().to_string()),
                format!("field path '{}' does not exist", self.field_path),
            )
        })?;
        writeln!(self.writer, "{}", field)?;
        Ok(())
    }

    fn flush(&mut self) -> PipelineResult<()> {
        self.writer.flush()?;
        Ok(())
    }

    fn close(&mut self) -> PipelineResult<()> {
        self.flush()
    }
}
