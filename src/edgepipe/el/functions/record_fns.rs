//! The `record:` function library: field-path probes against the record in
//! the evaluation context. A missing record context is an error, not a silent
//! miss.

use super::{check_arity, string_arg};
use crate::edgepipe::el::context::EvalContext;
use crate::edgepipe::el::evaluator::FunctionLibrary;
use crate::edgepipe::error::{ElError, ElResult};
use crate::edgepipe::record::{Field, FieldType, Record};

pub fn library() -> FunctionLibrary {
    FunctionLibrary {
        name: "record",
        functions: vec![
            ("record:type", field_type),
            ("record:value", value),
            ("record:valueOrDefault", value_or_default),
            ("record:exists", exists),
        ],
    }
}

fn record<'a>(ctx: &'a EvalContext) -> ElResult<&'a Record> {
    ctx.record().ok_or(ElError::NoRecordContext)
}

fn lookup<'a>(record: &'a Record, path: &str) -> ElResult<Option<&'a Field>> {
    record
        .get(path)
        .map_err(|e| ElError::function(e.to_string()))
}

/// `record:type(path)` — the tag name of the field, or a typed null when the
/// path does not resolve.
fn field_type(ctx: &EvalContext, args: &[Field]) -> ElResult<Field> {
    check_arity("record:type", 1, args)?;
    let path = string_arg("record:type", args, 0)?;
    match lookup(record(ctx)?, path)? {
        Some(field) => Ok(Field::string(field.field_type().as_str())),
        None => Ok(Field::null(FieldType::String)),
    }
}

/// `record:value(path)` — the field value, or a typed null when the path does
/// not resolve.
fn value(ctx: &EvalContext, args: &[Field]) -> ElResult<Field> {
    check_arity("record:value", 1, args)?;
    let path = string_arg("record:value", args, 0)?;
    match lookup(record(ctx)?, path)? {
        Some(field) => Ok(field.clone()),
        None => Ok(Field::null(FieldType::String)),
    }
}

/// `record:valueOrDefault(path, default)` — the field value, or `default`
/// when the path does not resolve or holds a typed null.
fn value_or_default(ctx: &EvalContext, args: &[Field]) -> ElResult<Field> {
    check_arity("record:valueOrDefault", 2, args)?;
    let path = string_arg("record:valueOrDefault", args, 0)?;
    match lookup(record(ctx)?, path)? {
        Some(field) if !field.is_null() => Ok(field.clone()),
        _ => Ok(args[1].clone()),
    }
}

/// `record:exists(path)`.
fn exists(ctx: &EvalContext, args: &[Field]) -> ElResult<Field> {
    check_arity("record:exists", 1, args)?;
    let path = string_arg("record:exists", args, 0)?;
    Ok(Field::boolean(lookup(record(ctx)?, path)?.is_some()))
}
