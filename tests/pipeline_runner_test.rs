//! End-to-end pipeline test: a text-format origin parsed through the data
//! format service, an EL-driven enrichment processor, and a delimited-format
//! destination, driven by the sequential runner.

use async_trait::async_trait;
use edgepipe::edgepipe::service::{DataFormatConfig, DataFormatParserService};
use edgepipe::edgepipe::stage::{Batch, BatchMaker, StageContext};
use edgepipe::{
    Destination, Field, Origin, PipelineResult, Processor, Record, Stage,
};
use edgepipe::edgepipe::stage::PipelineRunner;
use std::io::BufReader;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Reads one text file through the parser service, one batch per run.
struct FileTailOrigin {
    path: PathBuf,
    parser_service: DataFormatParserService,
}

#[async_trait]
impl Stage for FileTailOrigin {}

#[async_trait]
impl Origin for FileTailOrigin {
    async fn produce(
        &mut self,
        last_offset: Option<String>,
        max_batch_size: usize,
        batch_maker: &mut BatchMaker,
    ) -> PipelineResult<Option<String>> {
        let skip: usize = last_offset
            .as_deref()
            .and_then(|o| o.parse().ok())
            .unwrap_or(0);
        let file = std::fs::File::open(&self.path)?;
        let mut parser = self
            .parser_service
            .get_parser("tail", Box::new(BufReader::new(file)))?;

        let mut seen = 0;
        let mut emitted = 0;
        while let Some(record) = parser.read_record()? {
            seen += 1;
            if seen <= skip {
                continue;
            }
            batch_maker.add_record(record);
            emitted += 1;
            if emitted == max_batch_size {
                break;
            }
        }
        if emitted == 0 {
            return Ok(None);
        }
        Ok(Some((skip + emitted).to_string()))
    }
}

/// Tags each record with an EL-resolved severity field.
struct SeverityProcessor {
    context: StageContext,
}

#[async_trait]
impl Stage for SeverityProcessor {}

#[async_trait]
impl Processor for SeverityProcessor {
    async fn process(
        &mut self,
        batch: &Batch,
        batch_maker: &mut BatchMaker,
    ) -> PipelineResult<()> {
        for record in batch.records() {
            let severity = self.context.evaluate(
                "${str:contains(record:value('/text'), 'ERROR') ? 'high' : 'low'}",
                "severityEL",
                record,
            )?;
            let mut out = record.clone();
            out.set("/severity", severity)?;
            batch_maker.add_record(out);
        }
        Ok(())
    }
}

#[derive(Clone)]
struct MemoryDestination {
    written: Arc<Mutex<Vec<Record>>>,
}

#[async_trait]
impl Stage for MemoryDestination {}

#[async_trait]
impl Destination for MemoryDestination {
    async fn write(&mut self, batch: &Batch) -> PipelineResult<()> {
        self.written.lock().unwrap().extend(batch.records().cloned());
        Ok(())
    }
}

#[tokio::test]
async fn test_text_origin_through_processor_to_destination() {
    let _ = env_logger::builder().is_test(true).try_init();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.log");
    std::fs::File::create(&path)
        .unwrap()
        .write_all(b"INFO started\nERROR disk full\nINFO done\n")
        .unwrap();

    let written = Arc::new(Mutex::new(Vec::new()));
    let context = StageContext::new("origin_1").with_identity("edge-01", "log-sampler");
    let mut runner = PipelineRunner::new(
        "log-sampler",
        context.clone(),
        Box::new(FileTailOrigin {
            path,
            parser_service: DataFormatParserService::new("origin_1", DataFormatConfig::text()),
        }),
        vec![Box::new(SeverityProcessor {
            context: context.for_stage("processor_1"),
        })],
        vec![Box::new(MemoryDestination {
            written: written.clone(),
        })],
        2,
    );
    runner.run().await.unwrap();

    let records = written.lock().unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(
        records[0].get("/text").unwrap(),
        Some(&Field::string("INFO started"))
    );
    assert_eq!(
        records[1].get("/severity").unwrap(),
        Some(&Field::string("high"))
    );
    assert_eq!(
        records[2].get("/severity").unwrap(),
        Some(&Field::string("low"))
    );
    // Two full batches of 2 and 1, then the empty terminal call.
    assert_eq!(runner.last_offset(), Some("3"));
    assert_eq!(context.metrics().counter("records.output"), 3);
}
