//! The `math:` function library. All operands must convert to floats; a
//! mismatch fails with a conversion error naming the argument index, value,
//! and type.

use super::{check_arity, float_arg};
use crate::edgepipe::el::context::EvalContext;
use crate::edgepipe::el::evaluator::FunctionLibrary;
use crate::edgepipe::error::ElResult;
use crate::edgepipe::record::Field;

pub fn library() -> FunctionLibrary {
    FunctionLibrary {
        name: "math",
        functions: vec![
            ("math:abs", abs),
            ("math:ceil", ceil),
            ("math:floor", floor),
            ("math:max", max),
            ("math:min", min),
        ],
    }
}

fn abs(_ctx: &EvalContext, args: &[Field]) -> ElResult<Field> {
    check_arity("math:abs", 1, args)?;
    Ok(Field::double(float_arg("abs", args, 0)?.abs()))
}

fn ceil(_ctx: &EvalContext, args: &[Field]) -> ElResult<Field> {
    check_arity("math:ceil", 1, args)?;
    Ok(Field::double(float_arg("ceil", args, 0)?.ceil()))
}

fn floor(_ctx: &EvalContext, args: &[Field]) -> ElResult<Field> {
    check_arity("math:floor", 1, args)?;
    Ok(Field::double(float_arg("floor", args, 0)?.floor()))
}

fn max(_ctx: &EvalContext, args: &[Field]) -> ElResult<Field> {
    check_arity("math:max", 2, args)?;
    let a = float_arg("max", args, 0)?;
    let b = float_arg("max", args, 1)?;
    Ok(Field::double(a.max(b)))
}

fn min(_ctx: &EvalContext, args: &[Field]) -> ElResult<Field> {
    check_arity("math:min", 2, args)?;
    let a = float_arg("min", args, 0)?;
    let b = float_arg("min", args, 1)?;
    Ok(Field::double(a.min(b)))
}
