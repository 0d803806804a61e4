//! Data format services: the seam between stage configuration and codecs.
//!
//! Origins hold a [`DataFormatParserService`] and ask it for a
//! [`RecordReader`] per input unit; destinations hold a
//! [`DataFormatGeneratorService`] and ask it for a [`RecordWriter`] per
//! output stream. Both dispatch on a shared [`DataFormatConfig`].

use crate::edgepipe::codec::binary::{BinaryConfig, BinaryReader, BinaryWriter};
use crate::edgepipe::codec::delimited::{DelimitedConfig, DelimitedReader, DelimitedWriter};
use crate::edgepipe::codec::json::{JsonReader, JsonWriter};
use crate::edgepipe::codec::sdc_json::{SdcJsonReader, SdcJsonWriter};
use crate::edgepipe::codec::text::{TextReader, TextWriter};
use crate::edgepipe::codec::whole_file::WholeFileReader;
use crate::edgepipe::codec::{RecordReader, RecordWriter};
use crate::edgepipe::error::{PipelineError, PipelineResult};
use crate::edgepipe::record::Record;
use crate::edgepipe::stage::StageContext;
use std::io::{BufRead, Write};

/// Which codec a stage speaks, with its per-format settings.
#[derive(Debug, Clone)]
pub enum DataFormatConfig {
    Text {
        /// Field the writer reads from; the reader always writes `/text`
        field_path: String,
    },
    Json,
    Delimited(DelimitedConfig),
    Binary(BinaryConfig),
    /// Whole-file transfer. For parsing, the message id is the file path;
    /// `file_name_expression` names the output file on the generate side.
    WholeFile {
        file_name_expression: String,
        rate_limit: u64,
    },
    SdcJson,
}

impl DataFormatConfig {
    pub fn text() -> Self {
        DataFormatConfig::Text {
            field_path: "/text".to_string(),
        }
    }

    fn format_name(&self) -> &'static str {
        match self {
            DataFormatConfig::Text { .. } => "TEXT",
            DataFormatConfig::Json => "JSON",
            DataFormatConfig::Delimited(_) => "DELIMITED",
            DataFormatConfig::Binary(_) => "BINARY",
            DataFormatConfig::WholeFile { .. } => "WHOLE_FILE",
            DataFormatConfig::SdcJson => "SDC_JSON",
        }
    }
}

/// Hands out a [`RecordReader`] per input unit for an origin.
pub struct DataFormatParserService {
    stage: String,
    config: DataFormatConfig,
}

impl DataFormatParserService {
    pub fn new(stage: impl Into<String>, config: DataFormatConfig) -> Self {
        DataFormatParserService {
            stage: stage.into(),
            config,
        }
    }

    /// Build a reader over one input unit. Records parsed from it get ids
    /// `message_id::n` with n 1-based.
    pub fn get_parser(
        &self,
        message_id: &str,
        reader: Box<dyn BufRead + Send>,
    ) -> PipelineResult<Box<dyn RecordReader>> {
        let parser: Box<dyn RecordReader> = match &self.config {
            DataFormatConfig::Text { .. } => {
                Box::new(TextReader::new(&self.stage, message_id, reader))
            }
            DataFormatConfig::Json => Box::new(JsonReader::new(&self.stage, message_id, reader)),
            DataFormatConfig::Delimited(config) => Box::new(DelimitedReader::new(
                &self.stage,
                message_id,
                config.clone(),
                reader,
            )),
            DataFormatConfig::Binary(config) => Box::new(BinaryReader::new(
                &self.stage,
                message_id,
                config.clone(),
                reader,
            )),
            DataFormatConfig::WholeFile { rate_limit, .. } => Box::new(WholeFileReader::new(
                &self.stage,
                message_id,
                message_id,
                *rate_limit,
            )),
            DataFormatConfig::SdcJson => Box::new(SdcJsonReader::new(reader)),
        };
        Ok(parser)
    }
}

/// Hands out a [`RecordWriter`] per output stream for a destination.
pub struct DataFormatGeneratorService {
    stage: String,
    config: DataFormatConfig,
}

impl DataFormatGeneratorService {
    pub fn new(stage: impl Into<String>, config: DataFormatConfig) -> Self {
        DataFormatGeneratorService {
            stage: stage.into(),
            config,
        }
    }

    pub fn get_generator(
        &self,
        writer: Box<dyn Write + Send>,
    ) -> PipelineResult<Box<dyn RecordWriter>> {
        let generator: Box<dyn RecordWriter> = match &self.config {
            DataFormatConfig::Text { field_path } => {
                Box::new(TextWriter::with_field_path(writer, field_path.clone()))
            }
            DataFormatConfig::Json => Box::new(JsonWriter::new(writer)),
            DataFormatConfig::Delimited(config) => {
                Box::new(DelimitedWriter::new(config.clone(), writer))
            }
            DataFormatConfig::Binary(_) => Box::new(BinaryWriter::new(writer)),
            DataFormatConfig::WholeFile { .. } => {
                return Err(PipelineError::codec_error(
                    self.config.format_name(),
                    "whole-file format transfers streams, not generated records",
                ));
            }
            DataFormatConfig::SdcJson => Box::new(SdcJsonWriter::new(writer)),
        };
        Ok(generator)
    }

    pub fn is_whole_file_format(&self) -> bool {
        matches!(self.config, DataFormatConfig::WholeFile { .. })
    }

    /// Resolve the output file name for a whole-file record by evaluating the
    /// configured expression against it.
    pub fn get_whole_file_name(
        &self,
        context: &StageContext,
        record: &Record,
    ) -> PipelineResult<String> {
        let DataFormatConfig::WholeFile {
            file_name_expression,
            ..
        } = &self.config
        else {
            return Err(PipelineError::stage_error(
                &self.stage,
                "file name requested for a non-whole-file format",
            ));
        };
        Ok(context
            .evaluate(file_name_expression, "fileNameEL", record)?
            .to_string())
    }
}
