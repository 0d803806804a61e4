//! Integration tests for the record codecs: delimited header handling,
//! SDC-JSON framing and round-trip fidelity, JSON streaming, text, and
//! binary chunking.

use edgepipe::edgepipe::codec::delimited::{DelimitedConfig, DelimitedReader};
use edgepipe::edgepipe::codec::json::{JsonReader, JsonWriter};
use edgepipe::edgepipe::codec::sdc_json::{SdcJsonReader, SdcJsonWriter};
use edgepipe::edgepipe::codec::text::TextReader;
use edgepipe::edgepipe::codec::binary::{BinaryConfig, BinaryReader};
use edgepipe::edgepipe::record::{Field, OrderedMap, Record};
use edgepipe::{RecordReader, RecordWriter};

#[test]
fn test_delimited_with_header_produces_ordered_list_map() {
    let data = b"policyID,statecode\n119736,FL\n".as_slice();
    let mut reader = DelimitedReader::new("origin_1", "claims.csv", DelimitedConfig::default(), data);

    let record = reader.read_record().unwrap().unwrap();
    assert_eq!(record.header().source_id(), "claims.csv::1");
    match record.value() {
        Field::ListMap(map) => {
            let keys: Vec<&String> = map.keys().collect();
            assert_eq!(keys, ["policyID", "statecode"]);
            assert_eq!(map.get("policyID"), Some(&Field::string("119736")));
            assert_eq!(map.get("statecode"), Some(&Field::string("FL")));
        }
        other => panic!("expected LIST_MAP, got {:?}", other),
    }
    assert!(reader.read_record().unwrap().is_none());
}

#[test]
fn test_delimited_multiple_rows_share_header_keys() {
    let data = b"name,age\nalice,30\nbob,41\ncarol,52\n".as_slice();
    let mut reader = DelimitedReader::new("origin_1", "people.csv", DelimitedConfig::default(), data);

    let mut n = 0;
    while let Some(record) = reader.read_record().unwrap() {
        n += 1;
        assert_eq!(record.header().source_id(), format!("people.csv::{}", n));
        match record.value() {
            Field::ListMap(map) => {
                let keys: Vec<&String> = map.keys().collect();
                assert_eq!(keys, ["name", "age"]);
            }
            other => panic!("expected LIST_MAP, got {:?}", other),
        }
    }
    assert_eq!(n, 3);
}

#[test]
fn test_sdc_json_round_trip_with_attributes() {
    let mut first = Record::new(
        "origin_1",
        "Sample Record Id1",
        Field::string("Sample Value1"),
    );
    first
        .header_mut()
        .set_attribute("Sample Attribute", "Sample Value1");
    let mut second = Record::new(
        "origin_1",
        "Sample Record Id2",
        Field::string("Sample Value2"),
    );
    second
        .header_mut()
        .set_attribute("Sample Attribute", "Sample Value2");

    let mut bytes = Vec::new();
    {
        let mut writer = SdcJsonWriter::new(&mut bytes);
        writer.write_record(&first).unwrap();
        writer.write_record(&second).unwrap();
        writer.close().unwrap();
    }
    assert_eq!(bytes[0], 0xA1);

    let mut reader = SdcJsonReader::new(bytes.as_slice());
    let got_first = reader.read_record().unwrap().unwrap();
    let got_second = reader.read_record().unwrap().unwrap();
    assert!(reader.read_record().unwrap().is_none());

    assert_eq!(got_first, first);
    assert_eq!(got_second, second);
    assert_eq!(
        got_second.header().attribute("Sample Attribute"),
        Some("Sample Value2")
    );
}

#[test]
fn test_sdc_json_round_trips_every_scalar_tag() {
    let mut map = OrderedMap::new();
    map.put("bool", Field::boolean(true));
    map.put("byte", Field::Byte(7));
    map.put("bytes", Field::byte_array(vec![1, 2, 3]));
    map.put("short", Field::Short(-12));
    map.put("int", Field::Integer(42));
    map.put("long", Field::long(1234567890123));
    map.put("float", Field::Float(1.5));
    map.put("double", Field::double(2.25));
    map.put("decimal", Field::Decimal("99.990".parse().unwrap()));
    map.put("string", Field::string("text"));
    map.put(
        "list",
        Field::List(vec![Field::long(1), Field::string("two")]),
    );
    let record = Record::new("origin_1", "all::1", Field::ListMap(map));

    let mut bytes = Vec::new();
    {
        let mut writer = SdcJsonWriter::new(&mut bytes);
        writer.write_record(&record).unwrap();
        writer.flush().unwrap();
    }
    let mut reader = SdcJsonReader::new(bytes.as_slice());
    assert_eq!(reader.read_record().unwrap().unwrap(), record);
}

#[test]
fn test_json_reader_streams_multiple_values() {
    let data = br#"{"a": 1} {"a": 2}
[1, 2, 3] "scalar""#
        .as_slice();
    let mut reader = JsonReader::new("origin_1", "in.json", data);

    let first = reader.read_record().unwrap().unwrap();
    assert_eq!(first.get("/a").unwrap(), Some(&Field::long(1)));
    assert_eq!(first.header().source_id(), "in.json::1");

    let second = reader.read_record().unwrap().unwrap();
    assert_eq!(second.get("/a").unwrap(), Some(&Field::long(2)));

    let third = reader.read_record().unwrap().unwrap();
    assert_eq!(third.get("[2]").unwrap(), Some(&Field::long(3)));

    let fourth = reader.read_record().unwrap().unwrap();
    assert_eq!(fourth.value(), &Field::string("scalar"));
    assert_eq!(fourth.header().source_id(), "in.json::4");

    assert!(reader.read_record().unwrap().is_none());
}

#[test]
fn test_json_writer_preserves_list_map_order() {
    let mut map = OrderedMap::new();
    map.put("zulu", Field::long(1));
    map.put("alpha", Field::long(2));
    let record = Record::new("origin_1", "out::1", Field::ListMap(map));

    let mut bytes = Vec::new();
    {
        let mut writer = JsonWriter::new(&mut bytes);
        writer.write_record(&record).unwrap();
        writer.flush().unwrap();
    }
    assert_eq!(
        String::from_utf8(bytes).unwrap(),
        "{\"zulu\":1,\"alpha\":2}\n"
    );
}

#[test]
fn test_text_reader_strips_line_endings() {
    let data = b"unix line\nwindows line\r\nlast".as_slice();
    let mut reader = TextReader::new("origin_1", "log.txt", data);

    let lines: Vec<String> = std::iter::from_fn(|| reader.read_record().unwrap())
        .map(|r| {
            r.get("/text")
                .unwrap()
                .and_then(Field::as_str)
                .unwrap()
                .to_string()
        })
        .collect();
    assert_eq!(lines, ["unix line", "windows line", "last"]);
}

#[test]
fn test_binary_reader_final_short_chunk_is_a_record() {
    let config = BinaryConfig {
        max_object_len: 8,
        compressed: false,
    };
    let mut reader = BinaryReader::new("origin_1", "blob", config, b"0123456789".as_slice());

    assert_eq!(
        reader.read_record().unwrap().unwrap().value(),
        &Field::byte_array(b"01234567".to_vec())
    );
    assert_eq!(
        reader.read_record().unwrap().unwrap().value(),
        &Field::byte_array(b"89".to_vec())
    );
    assert!(reader.read_record().unwrap().is_none());
}
