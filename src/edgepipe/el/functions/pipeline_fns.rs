//! The `pipeline:`, `job:`, `sdc:`, and `uuid:` function libraries: identity
//! values pulled from the evaluation context, never fabricated — with the one
//! specified exception that `job:startTime()` falls back to the current time
//! when no job context is present.

use super::check_arity;
use crate::edgepipe::el::context::EvalContext;
use crate::edgepipe::el::evaluator::FunctionLibrary;
use crate::edgepipe::error::{ElError, ElResult};
use crate::edgepipe::record::Field;
use chrono::Utc;
use uuid::Uuid;

pub fn pipeline_library() -> FunctionLibrary {
    FunctionLibrary {
        name: "pipeline",
        functions: vec![
            ("pipeline:id", pipeline_id),
            ("pipeline:title", pipeline_title),
            ("pipeline:user", pipeline_user),
            ("pipeline:startTime", pipeline_start_time),
        ],
    }
}

pub fn job_library() -> FunctionLibrary {
    FunctionLibrary {
        name: "job",
        functions: vec![
            ("job:id", job_id),
            ("job:name", job_name),
            ("job:user", job_user),
            ("job:startTime", job_start_time),
        ],
    }
}

pub fn sdc_library() -> FunctionLibrary {
    FunctionLibrary {
        name: "sdc",
        functions: vec![("sdc:hostname", sdc_hostname)],
    }
}

pub fn uuid_library() -> FunctionLibrary {
    FunctionLibrary {
        name: "uuid",
        functions: vec![("uuid:uuid", uuid_v4)],
    }
}

fn pipeline_id(ctx: &EvalContext, args: &[Field]) -> ElResult<Field> {
    check_arity("pipeline:id", 0, args)?;
    let pipeline = ctx.pipeline().ok_or(ElError::NoPipelineContext)?;
    Ok(Field::string(pipeline.id.clone()))
}

fn pipeline_title(ctx: &EvalContext, args: &[Field]) -> ElResult<Field> {
    check_arity("pipeline:title", 0, args)?;
    let pipeline = ctx.pipeline().ok_or(ElError::NoPipelineContext)?;
    Ok(Field::string(pipeline.title.clone()))
}

fn pipeline_user(ctx: &EvalContext, args: &[Field]) -> ElResult<Field> {
    check_arity("pipeline:user", 0, args)?;
    let pipeline = ctx.pipeline().ok_or(ElError::NoPipelineContext)?;
    Ok(Field::string(pipeline.user.clone()))
}

fn pipeline_start_time(ctx: &EvalContext, args: &[Field]) -> ElResult<Field> {
    check_arity("pipeline:startTime", 0, args)?;
    let pipeline = ctx.pipeline().ok_or(ElError::NoPipelineContext)?;
    Ok(Field::long(pipeline.start_time))
}

fn job_id(ctx: &EvalContext, args: &[Field]) -> ElResult<Field> {
    check_arity("job:id", 0, args)?;
    let job = ctx.job().ok_or(ElError::NoJobContext)?;
    Ok(Field::string(job.id.clone()))
}

fn job_name(ctx: &EvalContext, args: &[Field]) -> ElResult<Field> {
    check_arity("job:name", 0, args)?;
    let job = ctx.job().ok_or(ElError::NoJobContext)?;
    Ok(Field::string(job.name.clone()))
}

fn job_user(ctx: &EvalContext, args: &[Field]) -> ElResult<Field> {
    check_arity("job:user", 0, args)?;
    let job = ctx.job().ok_or(ElError::NoJobContext)?;
    Ok(Field::string(job.user.clone()))
}

/// Falls back to the current time when no job context is present.
fn job_start_time(ctx: &EvalContext, args: &[Field]) -> ElResult<Field> {
    check_arity("job:startTime", 0, args)?;
    let start_time = match ctx.job() {
        Some(job) => job.start_time,
        None => Utc::now().timestamp_millis(),
    };
    Ok(Field::long(start_time))
}

fn sdc_hostname(_ctx: &EvalContext, args: &[Field]) -> ElResult<Field> {
    check_arity("sdc:hostname", 0, args)?;
    match hostname::get() {
        Ok(name) => Ok(Field::string(name.to_string_lossy().to_string())),
        Err(e) => Err(ElError::function(format!(
            "Failed to resolve hostname: {}",
            e
        ))),
    }
}

/// A fresh v4 identifier per call.
fn uuid_v4(_ctx: &EvalContext, args: &[Field]) -> ElResult<Field> {
    check_arity("uuid:uuid", 0, args)?;
    Ok(Field::string(Uuid::new_v4().to_string()))
}
