//! SDC-JSON codec: the lossless interchange format.
//!
//! A stream starts with a single magic byte (0xA1) followed by one JSON
//! object per line:
//!
//! ```text
//! {"header": {..., "values": {...}}, "value": {"type", "value", "sqpath", "dqpath"}}
//! ```
//!
//! The value envelope is recursive; container envelopes hold child envelopes.
//! `BYTE_ARRAY` travels as base64, `DECIMAL` as its string rendering, and a
//! typed null as a JSON null under its tag, so the exact field tree round
//! trips.

use super::{RecordReader, RecordWriter};
use crate::edgepipe::error::{PipelineError, PipelineResult};
use crate::edgepipe::record::{Field, FieldType, Header, OrderedMap, Record};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rust_decimal::Decimal;
use serde_json::{json, Map as JsonMap, Value};
use std::collections::HashMap;
use std::io::{BufRead, Write};

pub const MAGIC_BYTE: u8 = 0xA1;

fn codec_err(message: impl Into<String>) -> PipelineError {
    PipelineError::codec_error("SDC_JSON", message)
}

/// Encode a field tree as a recursive value envelope.
fn field_to_envelope(field: &Field, path: &str) -> Value {
    let value = match field {
        Field::Boolean(b) => json!(b),
        Field::Byte(b) => json!(b),
        Field::ByteArray(bytes) => json!(BASE64.encode(bytes)),
        Field::Short(n) => json!(n),
        Field::Integer(n) => json!(n),
        Field::Long(n) => json!(n),
        Field::Float(f) => json!(f),
        Field::Double(f) => json!(f),
        Field::Decimal(d) => json!(d.to_string()),
        Field::String(s) => json!(s),
        Field::Map(map) => {
            let mut entries = JsonMap::new();
            for (key, child) in map {
                let child_path = format!("{}/{}", path, key);
                entries.insert(key.clone(), field_to_envelope(child, &child_path));
            }
            Value::Object(entries)
        }
        Field::List(list) => Value::Array(
            list.iter()
                .enumerate()
                .map(|(i, child)| field_to_envelope(child, &format!("{}[{}]", path, i)))
                .collect(),
        ),
        Field::ListMap(map) => {
            let mut entries = JsonMap::new();
            for (key, child) in map.iter() {
                let child_path = format!("{}/{}", path, key);
                entries.insert(key.clone(), field_to_envelope(child, &child_path));
            }
            Value::Object(entries)
        }
        Field::TypedNull(_) => Value::Null,
    };
    // The root envelope carries "/" even though child paths build from "".
    let wire_path = if path.is_empty() { "/" } else { path };
    json!({
        "type": field.field_type().as_str(),
        "value": value,
        "sqpath": wire_path,
        "dqpath": wire_path,
    })
}

/// Decode a value envelope back into the exact field it came from.
fn envelope_to_field(envelope: &Value) -> PipelineResult<Field> {
    let obj = envelope
        .as_object()
        .ok_or_else(|| codec_err("value envelope is not an object"))?;
    let tag = obj
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| codec_err("value envelope has no 'type'"))?;
    let field_type = FieldType::parse(tag)
        .ok_or_else(|| codec_err(format!("unknown field type '{}'", tag)))?;
    let value = obj.get("value").unwrap_or(&Value::Null);

    if value.is_null() {
        return Ok(Field::TypedNull(field_type));
    }

    let type_mismatch =
        || codec_err(format!("value does not match declared type '{}'", tag));

    let field = match field_type {
        FieldType::Boolean => Field::Boolean(value.as_bool().ok_or_else(type_mismatch)?),
        FieldType::Byte => {
            let n = value.as_u64().ok_or_else(type_mismatch)?;
            Field::Byte(u8::try_from(n).map_err(|_| type_mismatch())?)
        }
        FieldType::ByteArray => {
            let encoded = value.as_str().ok_or_else(type_mismatch)?;
            let bytes = BASE64
                .decode(encoded)
                .map_err(|e| codec_err(format!("invalid base64 byte array: {}", e)))?;
            Field::ByteArray(bytes)
        }
        FieldType::Short => {
            let n = value.as_i64().ok_or_else(type_mismatch)?;
            Field::Short(i16::try_from(n).map_err(|_| type_mismatch())?)
        }
        FieldType::Integer => {
            let n = value.as_i64().ok_or_else(type_mismatch)?;
            Field::Integer(i32::try_from(n).map_err(|_| type_mismatch())?)
        }
        FieldType::Long => Field::Long(value.as_i64().ok_or_else(type_mismatch)?),
        FieldType::Float => Field::Float(value.as_f64().ok_or_else(type_mismatch)? as f32),
        FieldType::Double => Field::Double(value.as_f64().ok_or_else(type_mismatch)?),
        FieldType::Decimal => {
            let text = value.as_str().ok_or_else(type_mismatch)?;
            let decimal: Decimal = text
                .parse()
                .map_err(|e| codec_err(format!("invalid decimal '{}': {}", text, e)))?;
            Field::Decimal(decimal)
        }
        FieldType::String => Field::String(value.as_str().ok_or_else(type_mismatch)?.to_string()),
        FieldType::Map => {
            let entries = value.as_object().ok_or_else(type_mismatch)?;
            let mut map = HashMap::with_capacity(entries.len());
            for (key, child) in entries {
                map.insert(key.clone(), envelope_to_field(child)?);
            }
            Field::Map(map)
        }
        FieldType::List => {
            let items = value.as_array().ok_or_else(type_mismatch)?;
            let mut list = Vec::with_capacity(items.len());
            for child in items {
                list.push(envelope_to_field(child)?);
            }
            Field::List(list)
        }
        FieldType::ListMap => {
            let entries = value.as_object().ok_or_else(type_mismatch)?;
            let mut map = OrderedMap::new();
            for (key, child) in entries {
                map.put(key.clone(), envelope_to_field(child)?);
            }
            Field::ListMap(map)
        }
    };
    Ok(field)
}

pub struct SdcJsonWriter<W: Write> {
    writer: W,
    wrote_magic: bool,
}

impl<W: Write> SdcJsonWriter<W> {
    pub fn new(writer: W) -> Self {
        SdcJsonWriter {
            writer,
            wrote_magic: false,
        }
    }
}

impl<W: Write> RecordWriter for SdcJsonWriter<W> {
    fn write_record(&mut self, record: &Record) -> PipelineResult<()> {
        if !self.wrote_magic {
            self.writer.write_all(&[MAGIC_BYTE])?;
            self.wrote_magic = true;
        }
        let line = json!({
            "header": serde_json::to_value(record.header())
                .map_err(|e| codec_err(format!("cannot serialize header: {}", e)))?,
            "value": field_to_envelope(record.value(), ""),
        });
        serde_json::to_writer(&mut self.writer, &line)
            .map_err(|e| codec_err(format!("cannot serialize record: {}", e)))?;
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

pub struct SdcJsonReader<R: BufRead> {
    reader: R,
    checked_magic: bool,
}

impl<R: BufRead> SdcJsonReader<R> {
    pub fn new(reader: R) -> Self {
        SdcJsonReader {
            reader,
            checked_magic: false,
        }
    }

    fn check_magic(&mut self) -> PipelineResult<()> {
        let mut magic = [0u8; 1];
        self.reader
            .read_exact(&mut magic)
            .map_err(|_| codec_err("stream is empty, expected magic byte 0xA1"))?;
        if magic[0] != MAGIC_BYTE {
            return Err(codec_err(format!(
                "bad magic byte 0x{:02X}, expected 0xA1",
                magic[0]
            )));
        }
        self.checked_magic = true;
        Ok(())
    }
}

impl<R: BufRead> RecordReader for SdcJsonReader<R> {
    fn read_record(&mut self) -> PipelineResult<Option<Record>> {
        if !self.checked_magic {
            self.check_magic()?;
        }
        let mut line = String::new();
        loop {
            line.clear();
            if self.reader.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            if !line.trim().is_empty() {
                break;
            }
        }
        let parsed: Value = serde_json::from_str(&line)
            .map_err(|e| codec_err(format!("malformed record line: {}", e)))?;
        let header: Header = parsed
            .get("header")
            .map(|h| serde_json::from_value(h.clone()))
            .transpose()
            .map_err(|e| codec_err(format!("malformed record header: {}", e)))?
            .ok_or_else(|| codec_err("record line has no 'header'"))?;
        let value = envelope_to_field(
            parsed
                .get("value")
                .ok_or_else(|| codec_err("record line has no 'value'"))?,
        )?;
        Ok(Some(Record::from_parts(header, value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record(n: i64) -> Record {
        let mut map = OrderedMap::new();
        map.put("id", Field::Long(n));
        map.put("name", Field::string(format!("record-{}", n)));
        map.put("payload", Field::ByteArray(vec![0xDE, 0xAD]));
        map.put("score", Field::Decimal("12.50".parse().unwrap()));
        map.put("missing", Field::null(FieldType::String));
        let mut record = Record::new("origin_1", format!("src::{}", n), Field::ListMap(map));
        record.header_mut().set_attribute("color", "blue");
        record
    }

    #[test]
    fn stream_begins_with_magic_byte() {
        let mut out = Vec::new();
        let mut writer = SdcJsonWriter::new(&mut out);
        writer.write_record(&sample_record(1)).unwrap();
        writer.flush().unwrap();
        drop(writer);
        assert_eq!(out[0], 0xA1);
        assert_eq!(*out.last().unwrap(), b'\n');

        let line: Value = serde_json::from_slice(&out[1..]).unwrap();
        let root = &line["value"];
        assert_eq!(root["sqpath"], "/");
        assert_eq!(root["dqpath"], "/");
        assert_eq!(root["value"]["id"]["sqpath"], "/id");
    }

    #[test]
    fn two_records_round_trip_exactly() {
        let first = sample_record(1);
        let second = sample_record(2);

        let mut out = Vec::new();
        {
            let mut writer = SdcJsonWriter::new(&mut out);
            writer.write_record(&first).unwrap();
            writer.write_record(&second).unwrap();
            writer.flush().unwrap();
        }

        let mut reader = SdcJsonReader::new(out.as_slice());
        let got_first = reader.read_record().unwrap().unwrap();
        let got_second = reader.read_record().unwrap().unwrap();
        assert!(reader.read_record().unwrap().is_none());

        assert_eq!(&first, &got_first);
        assert_eq!(&second, &got_second);
        assert_eq!(got_first.header().attribute("color"), Some("blue"));
        match got_first.value() {
            Field::ListMap(map) => {
                let keys: Vec<&String> = map.keys().collect();
                assert_eq!(keys, ["id", "name", "payload", "score", "missing"]);
            }
            other => panic!("expected LIST_MAP, got {:?}", other),
        }
    }

    #[test]
    fn rejects_missing_magic_byte() {
        let mut reader = SdcJsonReader::new(b"{\"header\":{}}\n".as_slice());
        let err = reader.read_record().unwrap_err();
        assert!(err.to_string().contains("magic byte"));
    }

    #[test]
    fn typed_null_survives_the_wire() {
        let record = Record::new("o", "s::1", Field::null(FieldType::Integer));
        let mut out = Vec::new();
        {
            let mut writer = SdcJsonWriter::new(&mut out);
            writer.write_record(&record).unwrap();
        }
        let mut reader = SdcJsonReader::new(out.as_slice());
        let got = reader.read_record().unwrap().unwrap();
        assert_eq!(got.value(), &Field::TypedNull(FieldType::Integer));
    }
}
