//! Binary codec: chunks a byte stream into BYTE_ARRAY records.

use super::{nth_source_id, RecordReader, RecordWriter};
use crate::edgepipe::error::{PipelineError, PipelineResult};
use crate::edgepipe::record::{Field, FieldType, Record};
use flate2::read::GzDecoder;
use std::io::{Read, Write};

pub const DEFAULT_MAX_OBJECT_LEN: usize = 1024;

#[derive(Debug, Clone)]
pub struct BinaryConfig {
    /// Chunk size; a shorter final chunk still yields a record
    pub max_object_len: usize,
    /// Gunzip the stream before chunking
    pub compressed: bool,
}

impl Default for BinaryConfig {
    fn default() -> Self {
        BinaryConfig {
            max_object_len: DEFAULT_MAX_OBJECT_LEN,
            compressed: false,
        }
    }
}

pub struct BinaryReader {
    reader: Box<dyn Read>,
    max_object_len: usize,
    stage: String,
    message_id: String,
    counter: usize,
}

impl BinaryReader {
    pub fn new<R: Read + 'static>(
        stage: impl Into<String>,
        message_id: impl Into<String>,
        config: BinaryConfig,
        reader: R,
    ) -> Self {
        let reader: Box<dyn Read> = if config.compressed {
            Box::new(GzDecoder::new(reader))
        } else {
            Box::new(reader)
        };
        BinaryReader {
            reader,
            max_object_len: config.max_object_len,
            stage: stage.into(),
            message_id: message_id.into(),
            counter: 0,
        }
    }

    /// Read up to `max_object_len` bytes, retrying short reads until EOF.
    fn fill_chunk(&mut self) -> PipelineResult<Vec<u8>> {
        let mut buf = vec![0u8; self.max_object_len];
        let mut filled = 0;
        while filled < buf.len() {
            let n = self.reader.read(&mut buf[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        buf.truncate(filled);
        Ok(buf)
    }
}

impl RecordReader for BinaryReader {
    fn read_record(&mut self) -> PipelineResult<Option<Record>> {
        let chunk = self.fill_chunk()?;
        if chunk.is_empty() {
            return Ok(None);
        }
        self.counter += 1;
        Ok(Some(Record::new(
            &self.stage,
            nth_source_id(&self.message_id, self.counter),
            Field::ByteArray(chunk),
        )))
    }
}

pub struct BinaryWriter<W: Write> {
    writer: W,
    field_path: String,
}

impl<W: Write> BinaryWriter<W> {
    pub fn new(writer: W) -> Self {
        Self::with_field_path("/", writer)
    }

    pub fn with_field_path(field_path: impl Into<String>, writer: W) -> Self {
        BinaryWriter {
            writer,
            field_path: field_path.into(),
        }
    }
}

impl<W: Write> RecordWriter for BinaryWriter<W> {
    fn write_record(&mut self, record: &Record) -> PipelineResult<()> {
        let field = record.get(&self.field_path)?.ok_or_else(|| {
            PipelineError::codec_error(
                "BINARY",
                format!(
                    "record '{}' has no field at '{}'",
                    record.header().source_id(),
                    self.field_path
                ),
            )
        })?;
        match field {
            Field::ByteArray(bytes) => {
                self.writer.write_all(bytes)?;
                Ok(())
            }
            other => Err(PipelineError::codec_error(
                "BINARY",
                format!(
                    "field '{}' of record '{}' must be {} but was {}",
                    self.field_path,
                    record.header().source_id(),
                    FieldType::ByteArray,
                    other.field_type()
                ),
            )),
        }
    }

    fn flush(&mut self) -> PipelineResult<()> {
        self.writer.flush()?;
        Ok(())
    }

    fn close(&mut self) -> PipelineResult<()> {
        self.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunks_stream_with_short_tail() {
        let config = BinaryConfig {
            max_object_len: 4,
            compressed: false,
        };
        let mut reader = BinaryReader::new("origin_1", "bin", config, b"abcdefghij".as_slice());

        let first = reader.read_record().unwrap().unwrap();
        assert_eq!(first.value(), &Field::ByteArray(b"abcd".to_vec()));
        assert_eq!(first.header().source_id(), "bin::1");

        let second = reader.read_record().unwrap().unwrap();
        assert_eq!(second.value(), &Field::ByteArray(b"efgh".to_vec()));

        let tail = reader.read_record().unwrap().unwrap();
        assert_eq!(tail.value(), &Field::ByteArray(b"ij".to_vec()));
        assert_eq!(tail.header().source_id(), "bin::3");

        assert!(reader.read_record().unwrap().is_none());
    }

    #[test]
    fn gunzips_before_chunking() {
        use flate2::write::GzEncoder;
        use flate2::Compression;

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"hello").unwrap();
        let gz = encoder.finish().unwrap();

        let config = BinaryConfig {
            max_object_len: 16,
            compressed: true,
        };
        let mut reader = BinaryReader::new("origin_1", "bin", config, std::io::Cursor::new(gz));
        let record = reader.read_record().unwrap().unwrap();
        assert_eq!(record.value(), &Field::ByteArray(b"hello".to_vec()));
    }

    #[test]
    fn writer_requires_byte_array() {
        let mut out = Vec::new();
        let mut writer = BinaryWriter::new(&mut out);

        let good = Record::new("o", "id::1", Field::ByteArray(b"raw".to_vec()));
        writer.write_record(&good).unwrap();

        let bad = Record::new("o", "id::2", Field::string("nope"));
        assert!(writer.write_record(&bad).is_err());

        writer.flush().unwrap();
        drop(writer);
        assert_eq!(out, b"raw");
    }
}
