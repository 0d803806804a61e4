//! Un-namespaced map/list helpers. Wrong element types fail with a typed
//! error naming the function.

use super::check_arity;
use crate::edgepipe::el::context::EvalContext;
use crate::edgepipe::el::evaluator::FunctionLibrary;
use crate::edgepipe::error::{ElError, ElResult};
use crate::edgepipe::record::Field;

pub fn library() -> FunctionLibrary {
    FunctionLibrary {
        name: "collections",
        functions: vec![
            ("emptyMap", empty_map),
            ("emptyList", empty_list),
            ("size", size),
            ("isEmptyMap", is_empty_map),
            ("length", length),
            ("isEmptyList", is_empty_list),
        ],
    }
}

fn map_len(function: &str, arg: &Field) -> ElResult<usize> {
    match arg {
        Field::Map(map) => Ok(map.len()),
        Field::ListMap(map) => Ok(map.len()),
        other => Err(ElError::function(format!(
            "The function '{}' expects a map argument but got '{}'",
            function,
            other.field_type()
        ))),
    }
}

fn list_len(function: &str, arg: &Field) -> ElResult<usize> {
    match arg {
        Field::List(list) => Ok(list.len()),
        other => Err(ElError::function(format!(
            "The function '{}' expects a list argument but got '{}'",
            function,
            other.field_type()
        ))),
    }
}

fn empty_map(_ctx: &EvalContext, args: &[Field]) -> ElResult<Field> {
    check_arity("emptyMap", 0, args)?;
    Ok(Field::empty_map())
}

fn empty_list(_ctx: &EvalContext, args: &[Field]) -> ElResult<Field> {
    check_arity("emptyList", 0, args)?;
    Ok(Field::empty_list())
}

fn size(_ctx: &EvalContext, args: &[Field]) -> ElResult<Field> {
    check_arity("size", 1, args)?;
    Ok(Field::long(map_len("size", &args[0])? as i64))
}

fn is_empty_map(_ctx: &EvalContext, args: &[Field]) -> ElResult<Field> {
    check_arity("isEmptyMap", 1, args)?;
    Ok(Field::boolean(map_len("isEmptyMap", &args[0])? == 0))
}

fn length(_ctx: &EvalContext, args: &[Field]) -> ElResult<Field> {
    check_arity("length", 1, args)?;
    Ok(Field::long(list_len("length", &args[0])? as i64))
}

fn is_empty_list(_ctx: &EvalContext, args: &[Field]) -> ElResult<Field> {
    check_arity("isEmptyList", 1, args)?;
    Ok(Field::boolean(list_len("isEmptyList", &args[0])? == 0))
}
