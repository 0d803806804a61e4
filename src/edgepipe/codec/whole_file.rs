//! Whole-file codec: one record per file, carrying a stream reference plus
//! file metadata instead of the file contents.
//!
//! The record shape is:
//!
//! ```text
//! /fileRef   -> MAP { path, rateLimit }
//! /fileInfo  -> MAP { file, filename, size, lastModifiedTime, permissions,
//!                     isDirectory, isRegularFile, isSymlink }
//! ```

use super::{nth_source_id, RecordReader};
use crate::edgepipe::error::{PipelineError, PipelineResult};
use crate::edgepipe::record::{Field, Record};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, UNIX_EPOCH};

pub const FILE_REF_FIELD: &str = "/fileRef";
pub const FILE_INFO_FIELD: &str = "/fileInfo";

/// Handle to the underlying file stream of a whole-file record.
pub trait FileRef {
    fn create_input_stream(&self) -> PipelineResult<Box<dyn Read>>;

    /// Release a stream obtained from [`create_input_stream`]. Dropping closes
    /// file-backed streams, so the default consumes the box.
    ///
    /// [`create_input_stream`]: FileRef::create_input_stream
    fn close_input_stream(&self, stream: Box<dyn Read>) -> PipelineResult<()> {
        drop(stream);
        Ok(())
    }
}

/// File on the local filesystem, optionally throttled to a byte rate.
#[derive(Debug, Clone)]
pub struct LocalFileRef {
    path: PathBuf,
    /// Bytes per second; 0 means unthrottled
    rate_limit: u64,
}

impl LocalFileRef {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        LocalFileRef {
            path: path.into(),
            rate_limit: 0,
        }
    }

    pub fn with_rate_limit(path: impl Into<PathBuf>, rate_limit: u64) -> Self {
        LocalFileRef {
            path: path.into(),
            rate_limit,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rate_limit(&self) -> u64 {
        self.rate_limit
    }

    /// Rebuild the reference from a record's `/fileRef` map.
    pub fn from_record(record: &Record) -> PipelineResult<Self> {
        let source_id = record.header().source_id().to_string();
        let missing = |what: &str| {
            PipelineError::codec_error(
                "WHOLE_FILE",
                format!("record '{}' has no '{}' entry", source_id, what),
            )
        };
        let Some(Field::Map(file_ref)) = record.get(FILE_REF_FIELD)? else {
            return Err(missing(FILE_REF_FIELD));
        };
        let path = file_ref
            .get("path")
            .and_then(|f| f.as_str())
            .ok_or_else(|| missing("path"))?;
        let rate_limit = match file_ref.get("rateLimit") {
            Some(Field::Long(n)) if *n > 0 => *n as u64,
            _ => 0,
        };
        Ok(LocalFileRef {
            path: PathBuf::from(path),
            rate_limit,
        })
    }
}

impl FileRef for LocalFileRef {
    fn create_input_stream(&self) -> PipelineResult<Box<dyn Read>> {
        let file = File::open(&self.path)?;
        if self.rate_limit > 0 {
            Ok(Box::new(ThrottledReader::new(file, self.rate_limit)))
        } else {
            Ok(Box::new(file))
        }
    }
}

/// Sleeps as needed to keep throughput at or below `bytes_per_sec`.
struct ThrottledReader<R: Read> {
    inner: R,
    bytes_per_sec: u64,
    started: Instant,
    consumed: u64,
}

impl<R: Read> ThrottledReader<R> {
    fn new(inner: R, bytes_per_sec: u64) -> Self {
        ThrottledReader {
            inner,
            bytes_per_sec,
            started: Instant::now(),
            consumed: 0,
        }
    }
}

impl<R: Read> Read for ThrottledReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.consumed += n as u64;
        let due = Duration::from_secs_f64(self.consumed as f64 / self.bytes_per_sec as f64);
        let elapsed = self.started.elapsed();
        if due > elapsed {
            std::thread::sleep(due - elapsed);
        }
        Ok(n)
    }
}

/// Produces exactly one record describing `path`, then end-of-stream.
pub struct WholeFileReader {
    path: PathBuf,
    rate_limit: u64,
    stage: String,
    message_id: String,
    produced: bool,
}

impl WholeFileReader {
    pub fn new(
        stage: impl Into<String>,
        message_id: impl Into<String>,
        path: impl Into<PathBuf>,
        rate_limit: u64,
    ) -> Self {
        WholeFileReader {
            path: path.into(),
            rate_limit,
            stage: stage.into(),
            message_id: message_id.into(),
            produced: false,
        }
    }

    fn file_info(&self) -> PipelineResult<Field> {
        let metadata = std::fs::symlink_metadata(&self.path)?;
        let modified_millis = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0);

        let mut info = HashMap::new();
        info.insert(
            "file".to_string(),
            Field::string(self.path.to_string_lossy()),
        );
        info.insert(
            "filename".to_string(),
            Field::string(
                self.path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default(),
            ),
        );
        info.insert("size".to_string(), Field::Long(metadata.len() as i64));
        info.insert(
            "lastModifiedTime".to_string(),
            Field::Long(modified_millis),
        );
        info.insert(
            "permissions".to_string(),
            Field::string(permissions_string(&metadata)),
        );
        info.insert(
            "isDirectory".to_string(),
            Field::Boolean(metadata.is_dir()),
        );
        info.insert(
            "isRegularFile".to_string(),
            Field::Boolean(metadata.is_file()),
        );
        info.insert(
            "isSymlink".to_string(),
            Field::Boolean(metadata.file_type().is_symlink()),
        );
        Ok(Field::Map(info))
    }
}

#[cfg(unix)]
fn permissions_string(metadata: &std::fs::Metadata) -> String {
    use std::os::unix::fs::PermissionsExt;
    let mode = metadata.permissions().mode();
    let mut out = String::with_capacity(9);
    for shift in [6u32, 3, 0] {
        let bits = (mode >> shift) & 0o7;
        out.push(if bits & 0o4 != 0 { 'r' } else { '-' });
        out.push(if bits & 0o2 != 0 { 'w' } else { '-' });
        out.push(if bits & 0o1 != 0 { 'x' } else { '-' });
    }
    out
}

#[cfg(not(unix))]
fn permissions_string(metadata: &std::fs::Metadata) -> String {
    if metadata.permissions().readonly() {
        "r--r--r--".to_string()
    } else {
        "rw-rw-rw-".to_string()
    }
}

impl RecordReader for WholeFileReader {
    fn read_record(&mut self) -> PipelineResult<Option<Record>> {
        if self.produced {
            return Ok(None);
        }
        self.produced = true;

        let mut file_ref = HashMap::new();
        file_ref.insert(
            "path".to_string(),
            Field::string(self.path.to_string_lossy()),
        );
        file_ref.insert("rateLimit".to_string(), Field::Long(self.rate_limit as i64));

        let mut root = HashMap::new();
        root.insert("fileRef".to_string(), Field::Map(file_ref));
        root.insert("fileInfo".to_string(), self.file_info()?);

        Ok(Some(Record::new(
            &self.stage,
            nth_source_id(&self.message_id, 1),
            Field::Map(root),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn emits_one_record_with_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("payload.bin");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(b"0123456789")
            .unwrap();

        let mut reader = WholeFileReader::new("origin_1", "wf", &path, 0);
        let record = reader.read_record().unwrap().unwrap();
        assert_eq!(record.header().source_id(), "wf::1");
        assert_eq!(
            record.get("/fileInfo/size").unwrap(),
            Some(&Field::Long(10))
        );
        assert_eq!(
            record.get("/fileInfo/isRegularFile").unwrap(),
            Some(&Field::Boolean(true))
        );
        assert_eq!(
            record.get("/fileInfo/filename").unwrap(),
            Some(&Field::string("payload.bin"))
        );
        assert!(reader.read_record().unwrap().is_none());
    }

    #[test]
    fn file_ref_round_trips_through_the_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.txt");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(b"contents")
            .unwrap();

        let mut reader = WholeFileReader::new("origin_1", "wf", &path, 0);
        let record = reader.read_record().unwrap().unwrap();

        let file_ref = LocalFileRef::from_record(&record).unwrap();
        let mut stream = file_ref.create_input_stream().unwrap();
        let mut contents = String::new();
        stream.read_to_string(&mut contents).unwrap();
        assert_eq!(contents, "contents");
    }
}
