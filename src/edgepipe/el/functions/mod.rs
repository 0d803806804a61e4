//! Built-in expression function libraries.
//!
//! Each submodule exposes one library; [`builtin_libraries`] composes them in
//! registration order (later libraries override earlier ones on collision).

pub mod collections;
pub mod math;
pub mod pipeline_fns;
pub mod record_fns;
pub mod strings;

use super::evaluator::FunctionLibrary;
use crate::edgepipe::error::{ElError, ElResult};
use crate::edgepipe::record::Field;

/// All built-in libraries in default registration order.
pub fn builtin_libraries() -> Vec<FunctionLibrary> {
    vec![
        strings::library(),
        math::library(),
        record_fns::library(),
        pipeline_fns::pipeline_library(),
        pipeline_fns::job_library(),
        pipeline_fns::sdc_library(),
        pipeline_fns::uuid_library(),
        collections::library(),
    ]
}

/// Enforce an exact argument count, producing the contract arity message.
pub(crate) fn check_arity(function: &str, expected: usize, args: &[Field]) -> ElResult<()> {
    if args.len() != expected {
        return Err(ElError::arity(function, expected, args.len()));
    }
    Ok(())
}

/// A string argument at `index`, rejecting every other tag.
pub(crate) fn string_arg<'a>(
    function: &str,
    args: &'a [Field],
    index: usize,
) -> ElResult<&'a str> {
    args[index].as_str().ok_or_else(|| {
        ElError::function(format!(
            "The function '{}' expects a string at argument {} but got '{}'",
            function,
            index,
            args[index].field_type()
        ))
    })
}

/// A numeric argument at `index`, truncated to an integer.
pub(crate) fn int_arg(function: &str, args: &[Field], index: usize) -> ElResult<i64> {
    args[index].to_f64().map(|n| n as i64).ok_or_else(|| {
        ElError::function(format!(
            "The function '{}' expects a number at argument {} but got '{}'",
            function,
            index,
            args[index].field_type()
        ))
    })
}

/// A float argument at `index` for a math operation, with the contract
/// conversion message on mismatch.
pub(crate) fn float_arg(operation: &str, args: &[Field], index: usize) -> ElResult<f64> {
    args[index].to_f64().ok_or_else(|| {
        ElError::float_conversion(
            index,
            args[index].to_string(),
            args[index].field_type().as_str(),
            operation,
        )
    })
}
