//! Per-record routing for destinations.
//!
//! Groups a batch by a routing-key expression (topic, bucket, shard), keeping
//! first-seen group order and within-group record order. Records whose key
//! evaluates empty go to the error sink instead of a group.

use super::batch::Batch;
use super::context::StageContext;
use crate::edgepipe::error::PipelineResult;
use crate::edgepipe::record::Record;
use indexmap::IndexMap;

/// Partition `batch` by evaluating `key_expression` against each record.
pub fn partition_batch(
    batch: &Batch,
    key_expression: &str,
    config_name: &str,
    context: &StageContext,
) -> PipelineResult<IndexMap<String, Vec<Record>>> {
    let mut groups: IndexMap<String, Vec<Record>> = IndexMap::new();
    for record in batch.records() {
        let key = match context.evaluate(key_expression, config_name, record) {
            Ok(field) if field.is_null() => String::new(),
            Ok(field) => field.to_string(),
            Err(err) => {
                context.to_error(err.to_string(), record.clone());
                continue;
            }
        };
        if key.is_empty() {
            context.to_error(
                format!("routing key '{}' evaluated to an empty value", config_name),
                record.clone(),
            );
            continue;
        }
        groups.entry(key).or_default().push(record.clone());
    }
    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edgepipe::record::Field;
    use crate::edgepipe::stage::batch::BatchMaker;
    use std::collections::HashMap;

    fn record_with_topic(ctx: &StageContext, n: usize, topic: &str) -> Record {
        let mut map = HashMap::new();
        map.insert("topic".to_string(), Field::string(topic));
        ctx.create_record(format!("src::{}", n), Field::Map(map))
    }

    #[test]
    fn groups_preserve_first_seen_and_within_group_order() {
        let ctx = StageContext::new("dest_1");
        let mut maker = BatchMaker::new();
        maker.add_record(record_with_topic(&ctx, 1, "b"));
        maker.add_record(record_with_topic(&ctx, 2, "a"));
        maker.add_record(record_with_topic(&ctx, 3, "b"));
        let batch = maker.into_batch("off");

        let groups =
            partition_batch(&batch, "${record:value('/topic')}", "topic", &ctx).unwrap();
        let keys: Vec<&String> = groups.keys().collect();
        assert_eq!(keys, ["b", "a"]);
        let ids: Vec<&str> = groups["b"]
            .iter()
            .map(|r| r.header().source_id())
            .collect();
        assert_eq!(ids, ["src::1", "src::3"]);
    }

    #[test]
    fn empty_key_goes_to_the_error_sink() {
        let ctx = StageContext::new("dest_1");
        let mut maker = BatchMaker::new();
        maker.add_record(record_with_topic(&ctx, 1, ""));
        maker.add_record(record_with_topic(&ctx, 2, "a"));
        let batch = maker.into_batch("off");

        let groups =
            partition_batch(&batch, "${record:value('/topic')}", "topic", &ctx).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(ctx.error_sink().len(), 1);
        assert_eq!(
            ctx.error_sink().drain()[0].header().source_id(),
            "src::1"
        );
    }
}
