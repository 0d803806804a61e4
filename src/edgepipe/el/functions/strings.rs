//! The `str:` function library.
//!
//! All index arithmetic is on characters, not bytes, so multi-byte input
//! behaves the way callers expect.

use super::{check_arity, int_arg, string_arg};
use crate::edgepipe::el::context::EvalContext;
use crate::edgepipe::el::evaluator::FunctionLibrary;
use crate::edgepipe::error::{ElError, ElResult};
use crate::edgepipe::record::Field;
use regex::Regex;

pub fn library() -> FunctionLibrary {
    FunctionLibrary {
        name: "str",
        functions: vec![
            ("str:substring", substring),
            ("str:indexOf", index_of),
            ("str:trim", trim),
            ("str:toUpper", to_upper),
            ("str:toLower", to_lower),
            ("str:replace", replace),
            ("str:replaceAll", replace_all),
            ("str:truncate", truncate),
            ("str:regExCapture", regex_capture),
            ("str:contains", contains),
            ("str:startsWith", starts_with),
            ("str:endsWith", ends_with),
            ("str:concat", concat),
            ("str:length", length),
            ("str:urlEncode", url_encode),
            ("str:split", split),
            ("str:escapeXML10", escape_xml10),
            ("str:escapeXML11", escape_xml11),
            ("str:unescapeXML", unescape_xml),
            ("str:unescapeJava", unescape_java),
        ],
    }
}

fn compile(function: &str, pattern: &str) -> ElResult<Regex> {
    Regex::new(pattern).map_err(|e| {
        ElError::function(format!(
            "The function '{}' was passed an invalid regular expression '{}': {}",
            function, pattern, e
        ))
    })
}

/// `str:substring(s, beginIndex, endIndex)` — zero-based; `endIndex` clamps to
/// the string length; a `beginIndex` past the end yields the empty string;
/// negative indices are errors.
fn substring(_ctx: &EvalContext, args: &[Field]) -> ElResult<Field> {
    check_arity("str:substring", 3, args)?;
    let s = string_arg("str:substring", args, 0)?;
    let begin = int_arg("str:substring", args, 1)?;
    let end = int_arg("str:substring", args, 2)?;
    if begin < 0 {
        return Err(ElError::function("Argument beginIndex should be 0 or greater"));
    }
    if end < 0 {
        return Err(ElError::function("Argument endIndex should be 0 or greater"));
    }
    let chars: Vec<char> = s.chars().collect();
    let begin = begin as usize;
    let end = (end as usize).min(chars.len());
    if begin >= chars.len() || begin >= end {
        return Ok(Field::string(""));
    }
    Ok(Field::string(chars[begin..end].iter().collect::<String>()))
}

/// `str:indexOf(s, sub)` — character index of the first occurrence, -1 on miss.
fn index_of(_ctx: &EvalContext, args: &[Field]) -> ElResult<Field> {
    check_arity("str:indexOf", 2, args)?;
    let s = string_arg("str:indexOf", args, 0)?;
    let sub = string_arg("str:indexOf", args, 1)?;
    let index = match s.find(sub) {
        Some(byte_index) => s[..byte_index].chars().count() as i64,
        None => -1,
    };
    Ok(Field::long(index))
}

fn trim(_ctx: &EvalContext, args: &[Field]) -> ElResult<Field> {
    check_arity("str:trim", 1, args)?;
    Ok(Field::string(string_arg("str:trim", args, 0)?.trim()))
}

fn to_upper(_ctx: &EvalContext, args: &[Field]) -> ElResult<Field> {
    check_arity("str:toUpper", 1, args)?;
    Ok(Field::string(
        string_arg("str:toUpper", args, 0)?.to_uppercase(),
    ))
}

fn to_lower(_ctx: &EvalContext, args: &[Field]) -> ElResult<Field> {
    check_arity("str:toLower", 1, args)?;
    Ok(Field::string(
        string_arg("str:toLower", args, 0)?.to_lowercase(),
    ))
}

/// `str:replace(s, old, new)` — every occurrence, literal match.
fn replace(_ctx: &EvalContext, args: &[Field]) -> ElResult<Field> {
    check_arity("str:replace", 3, args)?;
    let s = string_arg("str:replace", args, 0)?;
    let old = string_arg("str:replace", args, 1)?;
    let new = string_arg("str:replace", args, 2)?;
    Ok(Field::string(s.replace(old, new)))
}

/// `str:replaceAll(s, regex, replacement)` — regex match.
fn replace_all(_ctx: &EvalContext, args: &[Field]) -> ElResult<Field> {
    check_arity("str:replaceAll", 3, args)?;
    let s = string_arg("str:replaceAll", args, 0)?;
    let pattern = string_arg("str:replaceAll", args, 1)?;
    let replacement = string_arg("str:replaceAll", args, 2)?;
    let regex = compile("str:replaceAll", pattern)?;
    Ok(Field::string(regex.replace_all(s, replacement).into_owned()))
}

/// `str:truncate(s, endIndex)` — clamps to the string length; negative is an
/// error.
fn truncate(_ctx: &EvalContext, args: &[Field]) -> ElResult<Field> {
    check_arity("str:truncate", 2, args)?;
    let s = string_arg("str:truncate", args, 0)?;
    let end = int_arg("str:truncate", args, 1)?;
    if end < 0 {
        return Err(ElError::function("Argument endIndex should be 0 or greater"));
    }
    let chars: Vec<char> = s.chars().collect();
    let end = (end as usize).min(chars.len());
    Ok(Field::string(chars[..end].iter().collect::<String>()))
}

/// `str:regExCapture(s, regex, groupIndex)` — the captured group text, empty
/// when the expression does not match; an out-of-range group is an error.
fn regex_capture(_ctx: &EvalContext, args: &[Field]) -> ElResult<Field> {
    check_arity("str:regExCapture", 3, args)?;
    let s = string_arg("str:regExCapture", args, 0)?;
    let pattern = string_arg("str:regExCapture", args, 1)?;
    let group = int_arg("str:regExCapture", args, 2)?;
    let regex = compile("str:regExCapture", pattern)?;
    if group < 0 || group as usize >= regex.captures_len() {
        return Err(ElError::function(format!(
            "Group {} is out of range for the regular expression '{}'",
            group, pattern
        )));
    }
    let captured = regex
        .captures(s)
        .and_then(|c| c.get(group as usize))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default();
    Ok(Field::string(captured))
}

fn contains(_ctx: &EvalContext, args: &[Field]) -> ElResult<Field> {
    check_arity("str:contains", 2, args)?;
    let s = string_arg("str:contains", args, 0)?;
    let sub = string_arg("str:contains", args, 1)?;
    Ok(Field::boolean(s.contains(sub)))
}

fn starts_with(_ctx: &EvalContext, args: &[Field]) -> ElResult<Field> {
    check_arity("str:startsWith", 2, args)?;
    let s = string_arg("str:startsWith", args, 0)?;
    let prefix = string_arg("str:startsWith", args, 1)?;
    Ok(Field::boolean(s.starts_with(prefix)))
}

fn ends_with(_ctx: &EvalContext, args: &[Field]) -> ElResult<Field> {
    check_arity("str:endsWith", 2, args)?;
    let s = string_arg("str:endsWith", args, 0)?;
    let suffix = string_arg("str:endsWith", args, 1)?;
    Ok(Field::boolean(s.ends_with(suffix)))
}

fn concat(_ctx: &EvalContext, args: &[Field]) -> ElResult<Field> {
    check_arity("str:concat", 2, args)?;
    let a = string_arg("str:concat", args, 0)?;
    let b = string_arg("str:concat", args, 1)?;
    Ok(Field::string(format!("{}{}", a, b)))
}

fn length(_ctx: &EvalContext, args: &[Field]) -> ElResult<Field> {
    check_arity("str:length", 1, args)?;
    let s = string_arg("str:length", args, 0)?;
    Ok(Field::long(s.chars().count() as i64))
}

/// `str:urlEncode(s)` — application/x-www-form-urlencoded encoding.
fn url_encode(_ctx: &EvalContext, args: &[Field]) -> ElResult<Field> {
    check_arity("str:urlEncode", 1, args)?;
    let s = string_arg("str:urlEncode", args, 0)?;
    let encoded: String = url::form_urlencoded::byte_serialize(s.as_bytes()).collect();
    Ok(Field::string(encoded))
}

/// `str:split(s, separator)` — literal separator, yields a list of strings.
fn split(_ctx: &EvalContext, args: &[Field]) -> ElResult<Field> {
    check_arity("str:split", 2, args)?;
    let s = string_arg("str:split", args, 0)?;
    let separator = string_arg("str:split", args, 1)?;
    let parts = s.split(separator).map(Field::string).collect();
    Ok(Field::List(parts))
}

fn escape_xml10(_ctx: &EvalContext, args: &[Field]) -> ElResult<Field> {
    check_arity("str:escapeXML10", 1, args)?;
    Err(ElError::Unsupported("str:escapeXML10".to_string()))
}

fn escape_xml11(_ctx: &EvalContext, args: &[Field]) -> ElResult<Field> {
    check_arity("str:escapeXML11", 1, args)?;
    Err(ElError::Unsupported("str:escapeXML11".to_string()))
}

fn unescape_xml(_ctx: &EvalContext, args: &[Field]) -> ElResult<Field> {
    check_arity("str:unescapeXML", 1, args)?;
    Err(ElError::Unsupported("str:unescapeXML".to_string()))
}

fn unescape_java(_ctx: &EvalContext, args: &[Field]) -> ElResult<Field> {
    check_arity("str:unescapeJava", 1, args)?;
    Err(ElError::Unsupported("str:unescapeJava".to_string()))
}
