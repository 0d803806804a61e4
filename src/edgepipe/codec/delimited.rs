//! Delimited (CSV) codec.
//!
//! Header semantics: with `WithHeader` the first row becomes the field keys;
//! with `IgnoreHeader` it is discarded and keys become stringified column
//! indices; with `NoHeader` every row including the first is data. Start-line
//! skipping applies after the header decision. Record counters are 1-based.
//!
//! Parsing is hand-rolled and quote-aware (RFC 4180 double quotes) on a
//! configurable delimiter.

use super::{nth_source_id, RecordReader, RecordWriter};
use crate::edgepipe::error::{PipelineError, PipelineResult};
use crate::edgepipe::record::{Field, OrderedMap, Record};
use std::collections::HashMap;
use std::io::{BufRead, Write};

/// Delimiter selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CsvFormat {
    /// Comma
    #[default]
    Default,
    /// `custom_delimiter` from the config
    Custom,
}

/// Shape of the produced root field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CsvRecordType {
    /// A list of `{header, value}` cell maps
    List,
    /// An insertion-ordered map keyed by header (or column index)
    #[default]
    ListMap,
}

/// What to do with the first row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CsvHeader {
    /// First row becomes the field keys
    #[default]
    WithHeader,
    /// First row is discarded; keys are column indices
    IgnoreHeader,
    /// All rows are data; keys are column indices
    NoHeader,
}

#[derive(Debug, Clone)]
pub struct DelimitedConfig {
    pub format: CsvFormat,
    pub custom_delimiter: char,
    pub record_type: CsvRecordType,
    pub header: CsvHeader,
    /// Data lines dropped after the header decision
    pub skip_start_lines: usize,
}

impl Default for DelimitedConfig {
    fn default() -> Self {
        DelimitedConfig {
            format: CsvFormat::Default,
            custom_delimiter: '|',
            record_type: CsvRecordType::ListMap,
            header: CsvHeader::WithHeader,
            skip_start_lines: 0,
        }
    }
}

impl DelimitedConfig {
    fn delimiter(&self) -> char {
        match self.format {
            CsvFormat::Default => ',',
            CsvFormat::Custom => self.custom_delimiter,
        }
    }
}

/// Split one line into cells, honoring RFC 4180 double quotes.
fn split_line(line: &str, delimiter: char) -> Vec<String> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quotes {
            if ch == '"' {
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                current.push(ch);
            }
        } else if ch == '"' {
            in_quotes = true;
        } else if ch == delimiter {
            cells.push(std::mem::take(&mut current));
        } else {
            current.push(ch);
        }
    }
    cells.push(current);
    cells
}

pub struct DelimitedReader<R: BufRead> {
    reader: R,
    config: DelimitedConfig,
    stage: String,
    message_id: String,
    headers: Option<Vec<String>>,
    started: bool,
    counter: usize,
}

impl<R: BufRead> DelimitedReader<R> {
    pub fn new(
        stage: impl Into<String>,
        message_id: impl Into<String>,
        config: DelimitedConfig,
        reader: R,
    ) -> Self {
        DelimitedReader {
            reader,
            config,
            stage: stage.into(),
            message_id: message_id.into(),
            headers: None,
            started: false,
            counter: 0,
        }
    }

    fn next_line(&mut self) -> PipelineResult<Option<String>> {
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
        Ok(Some(line))
    }

    fn start(&mut self) -> PipelineResult<()> {
        match self.config.header {
            CsvHeader::WithHeader => {
                if let Some(line) = self.next_line()? {
                    let delimiter = self.config.delimiter();
                    self.headers = Some(split_line(&line, delimiter));
                }
            }
            CsvHeader::IgnoreHeader => {
                self.next_line()?;
            }
            CsvHeader::NoHeader => {}
        }
        for _ in 0..self.config.skip_start_lines {
            if self.next_line()?.is_none() {
                break;
            }
        }
        self.started = true;
        Ok(())
    }

    fn key_for(&self, column: usize) -> String {
        match &self.headers {
            Some(headers) if column < headers.len() => headers[column].clone(),
            _ => column.to_string(),
        }
    }

    fn row_to_field(&self, cells: Vec<String>) -> Field {
        match self.config.record_type {
            CsvRecordType::ListMap => {
                let mut map = OrderedMap::new();
                for (column, cell) in cells.into_iter().enumerate() {
                    map.put(self.key_for(column), Field::string(cell));
                }
                Field::ListMap(map)
            }
            CsvRecordType::List => {
                let mut rows = Vec::new();
                for (column, cell) in cells.into_iter().enumerate() {
                    let mut entry = HashMap::new();
                    if let Some(headers) = &self.headers {
                        if column < headers.len() {
                            entry.insert(
                                "header".to_string(),
                                Field::string(headers[column].clone()),
                            );
                        }
                    }
                    entry.insert("value".to_string(), Field::string(cell));
                    rows.push(Field::Map(entry));
                }
                Field::List(rows)
            }
        }
    }
}

impl<R: BufRead> RecordReader for DelimitedReader<R> {
    fn read_record(&mut self) -> PipelineResult<Option<Record>> {
        if !self.started {
            self.start()?;
        }
        let Some(line) = self.next_line()? else {
            return Ok(None);
        };
        let delimiter = self.config.delimiter();
        let cells = split_line(&line, delimiter);
        self.counter += 1;
        Ok(Some(Record::new(
            &self.stage,
            nth_source_id(&self.message_id, self.counter),
            self.row_to_field(cells),
        )))
    }
}

pub struct DelimitedWriter<W: Write> {
    writer: W,
    config: DelimitedConfig,
    wrote_header: bool,
}

impl<W: Write> DelimitedWriter<W> {
    pub fn new(config: DelimitedConfig, writer: W) -> Self {
        DelimitedWriter {
            writer,
            config,
            wrote_header: false,
        }
    }

    fn quote(cell: &str, delimiter: char) -> String {
        if cell.contains(delimiter) || cell.contains('"') || cell.contains('\n') {
            format!("\"{}\"", cell.replace('"', "\"\""))
        } else {
            cell.to_string()
        }
    }

    fn write_row(&mut self, cells: &[String]) -> PipelineResult<()> {
        let delimiter = self.config.delimiter();
        let row: Vec<String> = cells.iter().map(|c| Self::quote(c, delimiter)).collect();
        writeln!(self.writer, "{}", row.join(&delimiter.to_string()))?;
        Ok(())
    }

    fn record_cells(record: &Record) -> PipelineResult<(Vec<String>, Vec<String>)> {
        match record.value() {
            Field::ListMap(map) => {
                let keys = map.keys().cloned().collect();
                let values = map.values().map(|v| v.to_string()).collect();
                Ok((keys, values))
            }
            Field::List(cells) => {
                let mut keys = Vec::new();
                let mut values = Vec::new();
                for cell in cells {
                    if let Field::Map(entry) = cell {
                        if let Some(header) = entry.get("header") {
                            keys.push(header.to_string());
                        }
                        values.push(
                            entry.get("value").map(|v| v.to_string()).unwrap_or_default(),
                        );
                    }
                }
                Ok((keys, values))
            }
            other => Err(PipelineError::codec_error(
                "DELIMITED",
                format!(
                    "record '{}' root must be LIST or LIST_MAP but was {}",
                    record.header().source_id(),
                    other.field_type()
                ),
            )),
        }
    }
}

impl<W: Write> RecordWriter for DelimitedWriter<W> {
    fn write_record(&mut self, record: &Record) -> PipelineResult<()> {
        let (keys, values) = Self::record_cells(record)?;
        if !self.wrote_header {
            self.wrote_header = true;
            if self.config.header == CsvHeader::WithHeader && !keys.is_empty() {
                self.write_row(&keys)?;
            }
        }
        self.write_row(&values)
    }

    fn flush(&mut self) -> PipelineResult<()> {
        self.writer.flush()?;
        Ok(())
    }

    fn close(&mut self) -> PipelineResult<()> {
        self.flush()
    }
}
