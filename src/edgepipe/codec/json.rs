//! JSON codec: streams JSON values (objects, arrays, scalars) one at a time
//! on the read path and encodes the record root field preserving Map/List
//! structure on the write path.

use super::{nth_source_id, RecordReader, RecordWriter};
use crate::edgepipe::error::{PipelineError, PipelineResult};
use crate::edgepipe::record::{Field, FieldType, Record};
use serde_json::Value;
use std::collections::HashMap;
use std::io::{Read, Write};

/// Convert a parsed JSON value into a field tree. Integers land on `LONG`,
/// other numbers on `DOUBLE`, `null` on a string-tagged typed null.
pub fn json_to_field(value: &Value) -> Field {
    match value {
        Value::Null => Field::null(FieldType::String),
        Value::Bool(b) => Field::boolean(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Field::long(i)
            } else {
                Field::double(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        Value::String(s) => Field::string(s.clone()),
        Value::Array(items) => Field::List(items.iter().map(json_to_field).collect()),
        Value::Object(entries) => {
            let mut map = HashMap::new();
            for (key, item) in entries {
                map.insert(key.clone(), json_to_field(item));
            }
            Field::Map(map)
        }
    }
}

/// Convert a field tree into a JSON value. `LIST_MAP` keeps its key order.
pub fn field_to_json(field: &Field) -> Value {
    match field {
        Field::Boolean(b) => Value::Bool(*b),
        Field::Byte(v) => Value::from(*v),
        Field::ByteArray(bytes) => {
            use base64::Engine;
            Value::String(base64::engine::general_purpose::STANDARD.encode(bytes))
        }
        Field::Short(v) => Value::from(*v),
        Field::Integer(v) => Value::from(*v),
        Field::Long(v) => Value::from(*v),
        Field::Float(v) => Value::from(*v as f64),
        Field::Double(v) => Value::from(*v),
        Field::Decimal(v) => Value::String(v.to_string()),
        Field::String(s) => Value::String(s.clone()),
        Field::Map(map) => {
            let mut entries = serde_json::Map::new();
            for (key, item) in map {
                entries.insert(key.clone(), field_to_json(item));
            }
            Value::Object(entries)
        }
        Field::List(items) => Value::Array(items.iter().map(field_to_json).collect()),
        Field::ListMap(map) => {
            let mut entries = serde_json::Map::new();
            for (key, item) in map.iter() {
                entries.insert(key.clone(), field_to_json(item));
            }
            Value::Object(entries)
        }
        Field::TypedNull(_) => Value::Null,
    }
}

pub struct JsonReader<R: Read> {
    stream: serde_json::StreamDeserializer<'static, serde_json::de::IoRead<R>, Value>,
    stage: String,
    message_id: String,
    counter: usize,
}

impl<R: Read> JsonReader<R> {
    pub fn new(stage: impl Into<String>, message_id: impl Into<String>, reader: R) -> Self {
        JsonReader {
            stream: serde_json::Deserializer::from_reader(reader).into_iter(),
            stage: stage.into(),
            message_id: message_id.into(),
            counter: 0,
        }
    }
}

impl<R: Read> RecordReader for JsonReader<R> {
    fn read_record(&mut self) -> PipelineResult<Option<Record>> {
        match self.stream.next() {
            None => Ok(None),
            Some(Err(e)) => Err(PipelineError::codec_error(
                "JSON",
                format!("{} in message '{}'", e, self.message_id),
            )),
            Some(Ok(value)) => {
                self.counter += 1;
                Ok(Some(Record::new(
                    &self.stage,
                    nth_source_id(&self.message_id, self.counter),
                    json_to_field(&value),
                )))
            }
        }
    }
}

pub struct JsonWriter<W: Write> {
    writer: W,
}

impl<W: Write> JsonWriter<W> {
    pub fn new(writer: W) -> Self {
        JsonWriter { writer }
    }
}

impl<W: Write> RecordWriter for JsonWriter<W> {
    fn write_record(&mut self, record: &Record) -> PipelineResult<()> {
        let value = field_to_json(record.value());
        serde_json::to_writer(&mut self.writer, &value).map_err(|e| {
            PipelineError::codec_error(
                "JSON",
                format!("{} for record '{}'", e, record.header().source_id()),
            )
        })?;
        self.writer.write_all(b"\n")?;
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
