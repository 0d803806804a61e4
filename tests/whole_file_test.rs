//! Integration tests for whole-file transfer: metadata record shape and
//! reading the referenced stream back.

use edgepipe::edgepipe::codec::whole_file::{FileRef, LocalFileRef, WholeFileReader};
use edgepipe::edgepipe::record::Field;
use edgepipe::RecordReader;
use std::io::{Read, Write};

#[test]
fn test_whole_file_record_references_the_source_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a.txt");
    std::fs::File::create(&path)
        .unwrap()
        .write_all(b"Testing Whole File record")
        .unwrap();

    let mut reader = WholeFileReader::new("origin_1", "wf", &path, 0);
    let record = reader.read_record().unwrap().unwrap();
    assert!(reader.read_record().unwrap().is_none());

    assert_eq!(
        record.get("/fileInfo/file").unwrap(),
        Some(&Field::string(path.to_string_lossy()))
    );
    assert_eq!(
        record.get("/fileInfo/filename").unwrap(),
        Some(&Field::string("a.txt"))
    );
    assert_eq!(
        record.get("/fileInfo/size").unwrap(),
        Some(&Field::long(25))
    );
    assert_eq!(
        record.get("/fileInfo/isRegularFile").unwrap(),
        Some(&Field::boolean(true))
    );
    assert_eq!(
        record.get("/fileInfo/isDirectory").unwrap(),
        Some(&Field::boolean(false))
    );

    let file_ref = LocalFileRef::from_record(&record).unwrap();
    let mut stream = file_ref.create_input_stream().unwrap();
    let mut contents = String::new();
    stream.read_to_string(&mut contents).unwrap();
    assert_eq!(contents, "Testing Whole File record");
}

#[test]
fn test_rate_limit_travels_with_the_record() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("big.bin");
    std::fs::File::create(&path)
        .unwrap()
        .write_all(&[0u8; 64])
        .unwrap();

    let mut reader = WholeFileReader::new("origin_1", "wf", &path, 1024);
    let record = reader.read_record().unwrap().unwrap();
    assert_eq!(
        record.get("/fileRef/rateLimit").unwrap(),
        Some(&Field::long(1024))
    );

    let file_ref = LocalFileRef::from_record(&record).unwrap();
    assert_eq!(file_ref.rate_limit(), 1024);
    let mut stream = file_ref.create_input_stream().unwrap();
    let mut out = Vec::new();
    stream.read_to_end(&mut out).unwrap();
    assert_eq!(out.len(), 64);
}
