//! Environment-driven expression evaluation.
//!
//! Evaluation is pure: the context is never mutated, function libraries are
//! read-only after construction, and all failures surface as [`ElError`]s.
//! Numeric operands compare on their numeric value, never on their string
//! rendering.

use super::ast::{BinaryOp, Expr, Literal, UnaryOp};
use super::context::EvalContext;
use super::parser;
use crate::edgepipe::error::{ElError, ElResult};
use crate::edgepipe::record::{Field, FieldType};
use std::collections::HashMap;

/// Signature of an expression function: `(context, args) → value`.
pub type ElFunction = fn(&EvalContext, &[Field]) -> ElResult<Field>;

/// A named library of expression functions. Function names carry their
/// namespace prefix (`str:trim`); un-namespaced functions use the bare name.
pub struct FunctionLibrary {
    /// Library name, for diagnostics
    pub name: &'static str,
    /// `(full function name, implementation)` pairs
    pub functions: Vec<(&'static str, ElFunction)>,
}

/// Expression evaluator with a composed function table.
pub struct Evaluator {
    functions: HashMap<String, ElFunction>,
}

impl Evaluator {
    /// Compose an evaluator from the supplied libraries. Later libraries
    /// override earlier ones on name collision.
    pub fn new(libraries: Vec<FunctionLibrary>) -> Self {
        let mut functions = HashMap::new();
        for library in libraries {
            for (name, function) in library.functions {
                functions.insert(name.to_string(), function);
            }
        }
        Evaluator { functions }
    }

    /// Evaluator loaded with every built-in library.
    pub fn default_libraries() -> Self {
        Evaluator::new(super::functions::builtin_libraries())
    }

    /// Whether a configuration string is an expression template. Only the
    /// exact form `${ ... }` is recognized; nested templates are not.
    pub fn is_template(raw: &str) -> bool {
        raw.len() > 3 && raw.starts_with("${") && raw.ends_with('}')
    }

    /// Evaluate a configuration string. A `${ ... }` template is parsed and
    /// evaluated; any other string passes through untouched.
    pub fn evaluate(&self, raw: &str, ctx: &EvalContext) -> ElResult<Field> {
        if Self::is_template(raw) {
            let inner = &raw[2..raw.len() - 1];
            self.evaluate_expression(inner, ctx)
        } else {
            Ok(Field::string(raw))
        }
    }

    /// Evaluate bare expression text (without the `${ ... }` wrapper).
    pub fn evaluate_expression(&self, text: &str, ctx: &EvalContext) -> ElResult<Field> {
        let expr = parser::parse(text)?;
        self.eval(&expr, ctx)
    }

    /// Evaluate a configuration string to its string rendering.
    pub fn resolve(&self, raw: &str, ctx: &EvalContext) -> ElResult<String> {
        Ok(self.evaluate(raw, ctx)?.to_string())
    }

    fn eval(&self, expr: &Expr, ctx: &EvalContext) -> ElResult<Field> {
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                Literal::Str(s) => Field::string(s.clone()),
                Literal::Number(n) => Field::double(*n),
                Literal::Bool(b) => Field::boolean(*b),
                Literal::Null => Field::null(FieldType::String),
            }),
            Expr::Identifier(name) => match ctx.parameter(name) {
                Some(value) => Ok(value.clone()),
                None => Err(ElError::UnknownParameter(name.clone())),
            },
            Expr::Unary { op, expr } => self.eval_unary(*op, expr, ctx),
            Expr::Binary { op, left, right } => self.eval_binary(*op, left, right, ctx),
            Expr::Ternary {
                condition,
                then_expr,
                else_expr,
            } => {
                let cond = self.eval(condition, ctx)?;
                match cond.as_bool() {
                    Some(true) => self.eval(then_expr, ctx),
                    Some(false) => self.eval(else_expr, ctx),
                    None => Err(ElError::function(format!(
                        "Ternary condition must be a boolean but was '{}'",
                        cond.field_type()
                    ))),
                }
            }
            Expr::Call { name, args } => {
                let function = self
                    .functions
                    .get(name)
                    .ok_or_else(|| ElError::UnknownFunction(name.clone()))?;
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.eval(arg, ctx)?);
                }
                function(ctx, &values)
            }
        }
    }

    fn eval_unary(&self, op: UnaryOp, expr: &Expr, ctx: &EvalContext) -> ElResult<Field> {
        let value = self.eval(expr, ctx)?;
        match op {
            UnaryOp::Not => value.as_bool().map(|b| Field::boolean(!b)).ok_or_else(|| {
                ElError::function(format!(
                    "Operator '!' requires a boolean operand but got '{}'",
                    value.field_type()
                ))
            }),
            UnaryOp::Neg => value.to_f64().map(|n| Field::double(-n)).ok_or_else(|| {
                ElError::function(format!(
                    "Operator '-' requires a numeric operand but got '{}'",
                    value.field_type()
                ))
            }),
            UnaryOp::BitNot => value
                .to_f64()
                .map(|n| Field::long(!(n as i64)))
                .ok_or_else(|| {
                    ElError::function(format!(
                        "Operator '~' requires a numeric operand but got '{}'",
                        value.field_type()
                    ))
                }),
        }
    }

    fn eval_binary(
        &self,
        op: BinaryOp,
        left: &Expr,
        right: &Expr,
        ctx: &EvalContext,
    ) -> ElResult<Field> {
        // Logical operators short-circuit
        if matches!(op, BinaryOp::And | BinaryOp::Or) {
            let lhs = self.eval(left, ctx)?;
            let lhs = lhs.as_bool().ok_or_else(|| {
                ElError::function(format!(
                    "Operator '{}' requires boolean operands but got '{}'",
                    op.as_str(),
                    lhs.field_type()
                ))
            })?;
            match (op, lhs) {
                (BinaryOp::And, false) => return Ok(Field::boolean(false)),
                (BinaryOp::Or, true) => return Ok(Field::boolean(true)),
                _ => {}
            }
            let rhs = self.eval(right, ctx)?;
            return rhs.as_bool().map(Field::boolean).ok_or_else(|| {
                ElError::function(format!(
                    "Operator '{}' requires boolean operands but got '{}'",
                    op.as_str(),
                    rhs.field_type()
                ))
            });
        }

        let lhs = self.eval(left, ctx)?;
        let rhs = self.eval(right, ctx)?;

        match op {
            BinaryOp::Multiply | BinaryOp::Divide | BinaryOp::Modulo | BinaryOp::Add
            | BinaryOp::Subtract => {
                let (a, b) = numeric_operands(op, &lhs, &rhs)?;
                Ok(Field::double(match op {
                    BinaryOp::Multiply => a * b,
                    BinaryOp::Divide => a / b,
                    BinaryOp::Modulo => a % b,
                    BinaryOp::Add => a + b,
                    BinaryOp::Subtract => a - b,
                    _ => unreachable!(),
                }))
            }
            BinaryOp::Equal => Ok(Field::boolean(values_equal(&lhs, &rhs))),
            BinaryOp::NotEqual => Ok(Field::boolean(!values_equal(&lhs, &rhs))),
            BinaryOp::LessThan
            | BinaryOp::LessThanOrEqual
            | BinaryOp::GreaterThan
            | BinaryOp::GreaterThanOrEqual => {
                let ordering = compare_values(op, &lhs, &rhs)?;
                Ok(Field::boolean(match op {
                    BinaryOp::LessThan => ordering.is_lt(),
                    BinaryOp::LessThanOrEqual => ordering.is_le(),
                    BinaryOp::GreaterThan => ordering.is_gt(),
                    BinaryOp::GreaterThanOrEqual => ordering.is_ge(),
                    _ => unreachable!(),
                }))
            }
            BinaryOp::And | BinaryOp::Or => unreachable!(),
        }
    }
}

fn numeric_operands(op: BinaryOp, lhs: &Field, rhs: &Field) -> ElResult<(f64, f64)> {
    match (lhs.to_f64(), rhs.to_f64()) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => Err(ElError::function(format!(
            "Operator '{}' requires numeric operands but got '{}' and '{}'",
            op.as_str(),
            lhs.field_type(),
            rhs.field_type()
        ))),
    }
}

/// Equality: numbers compare numerically, everything else by tagged value.
fn values_equal(lhs: &Field, rhs: &Field) -> bool {
    if let (Some(a), Some(b)) = (lhs.to_f64(), rhs.to_f64()) {
        return a == b;
    }
    lhs == rhs
}

fn compare_values(op: BinaryOp, lhs: &Field, rhs: &Field) -> ElResult<std::cmp::Ordering> {
    if let (Some(a), Some(b)) = (lhs.to_f64(), rhs.to_f64()) {
        return a.partial_cmp(&b).ok_or_else(|| {
            ElError::function(format!(
                "Operands of '{}' are not comparable",
                op.as_str()
            ))
        });
    }
    if let (Field::String(a), Field::String(b)) = (lhs, rhs) {
        return Ok(a.cmp(b));
    }
    Err(ElError::function(format!(
        "Cannot compare operands of type '{}' and '{}' with '{}'",
        lhs.field_type(),
        rhs.field_type(),
        op.as_str()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(text: &str) -> ElResult<Field> {
        let evaluator = Evaluator::default_libraries();
        evaluator.evaluate(text, &EvalContext::new())
    }

    #[test]
    fn untemplated_strings_pass_through() {
        assert_eq!(eval("plain value").unwrap(), Field::string("plain value"));
        assert_eq!(eval("${}").unwrap(), Field::string("${}"));
    }

    #[test]
    fn arithmetic_and_precedence() {
        assert_eq!(eval("${1 + 2 * 3}").unwrap(), Field::double(7.0));
        assert_eq!(eval("${(1 + 2) * 3}").unwrap(), Field::double(9.0));
        assert_eq!(eval("${10 % 3}").unwrap(), Field::double(1.0));
    }

    #[test]
    fn numeric_comparison_is_numeric_not_lexical() {
        // Lexically "9" > "10"; numerically it is not
        assert_eq!(eval("${9 > 10}").unwrap(), Field::boolean(false));
        assert_eq!(eval("${9 == 9.0}").unwrap(), Field::boolean(true));
    }

    #[test]
    fn parameter_comparison() {
        let evaluator = Evaluator::default_libraries();
        let mut ctx = EvalContext::new();
        ctx.set_parameter("PARAM1", Field::double(10.0));
        ctx.set_parameter("PARAM2", Field::double(20.0));
        let out = evaluator.evaluate("${PARAM1 > PARAM2}", &ctx).unwrap();
        assert_eq!(out, Field::boolean(false));
    }

    #[test]
    fn unknown_parameter_message() {
        let err = eval("${MISSING}").unwrap_err();
        assert_eq!(err.to_string(), "No parameter 'MISSING' found");
    }

    #[test]
    fn logical_short_circuit() {
        // The right side would fail on the unknown parameter if evaluated
        assert_eq!(eval("${false && MISSING}").unwrap(), Field::boolean(false));
        assert_eq!(eval("${true || MISSING}").unwrap(), Field::boolean(true));
    }

    #[test]
    fn ternary_selects_branch() {
        assert_eq!(eval("${1 < 2 ? 'yes' : 'no'}").unwrap(), Field::string("yes"));
        assert_eq!(eval("${1 > 2 ? 'yes' : 'no'}").unwrap(), Field::string("no"));
    }
}
