use crate::ast::{Builtin, Value};
use crate::error::RuntimeError;
use itertools::Itertools;
use tracing::debug;

/// Invokes an allow-listed built-in on already evaluated arguments.
pub(super) fn call(builtin: Builtin, args: Vec<Value>) -> Result<Value, RuntimeError> {
    match builtin {
        Builtin::Abs => unary(builtin, &args, f64::abs),
        Builtin::Floor => unary(builtin, &args, f64::floor),
        Builtin::Ceil => unary(builtin, &args, f64::ceil),
        Builtin::Trunc => unary(builtin, &args, f64::trunc),
        Builtin::Sqrt => unary(builtin, &args, f64::sqrt),
        Builtin::Round => unary(builtin, &args, round_half_up),
        Builtin::Sign => unary(builtin, &args, sign),
        Builtin::Pow => {
            let [base, exponent] = args.as_slice() else {
                return Err(arity(builtin, "2", args.len()));
            };
            Ok(Value::Number(
                number(builtin, base)?.powf(number(builtin, exponent)?),
            ))
        }
        Builtin::Min => fold(builtin, &args, f64::INFINITY, f64::min),
        Builtin::Max => fold(builtin, &args, f64::NEG_INFINITY, f64::max),
        Builtin::ToNumber => match args.as_slice() {
            [] => Ok(Value::Number(0.0)),
            [value] => Ok(Value::Number(to_number(value))),
            _ => Err(arity(builtin, "0 or 1", args.len())),
        },
        Builtin::ToText => match args.as_slice() {
            [] => Ok(Value::Str(String::new())),
            [value] => Ok(Value::Str(value.to_string())),
            _ => Err(arity(builtin, "0 or 1", args.len())),
        },
        Builtin::ToBoolean => match args.as_slice() {
            [] => Ok(Value::Bool(false)),
            [value] => Ok(Value::Bool(value.is_truthy())),
            _ => Err(arity(builtin, "0 or 1", args.len())),
        },
        Builtin::ConsoleLog => {
            let line = args.iter().join(" ");
            debug!(target: "keisan::console", "{}", line);
            Ok(Value::Null)
        }
    }
}

fn unary(builtin: Builtin, args: &[Value], f: impl Fn(f64) -> f64) -> Result<Value, RuntimeError> {
    let [value] = args else {
        return Err(arity(builtin, "1", args.len()));
    };
    Ok(Value::Number(f(number(builtin, value)?)))
}

/// `min`/`max` over any number of arguments. A single NaN poisons the result.
fn fold(
    builtin: Builtin,
    args: &[Value],
    init: f64,
    f: impl Fn(f64, f64) -> f64,
) -> Result<Value, RuntimeError> {
    let mut acc = init;
    for arg in args {
        let n = number(builtin, arg)?;
        if n.is_nan() {
            return Ok(Value::Number(f64::NAN));
        }
        acc = f(acc, n);
    }
    Ok(Value::Number(acc))
}

fn number(builtin: Builtin, value: &Value) -> Result<f64, RuntimeError> {
    value.as_number().ok_or_else(|| RuntimeError::TypeMismatch {
        operation: builtin.name().to_string(),
        expected: "Number".to_string(),
        found: value.clone(),
    })
}

fn arity(builtin: Builtin, expected: &'static str, found: usize) -> RuntimeError {
    RuntimeError::Arity {
        function: builtin.name(),
        expected,
        found,
    }
}

/// Rounds half-way cases towards positive infinity: `round(-2.5) == -2`.
fn round_half_up(n: f64) -> f64 {
    let rounded = n.round();
    if n < 0.0 && n - n.trunc() == -0.5 {
        rounded + 1.0
    } else {
        rounded
    }
}

fn sign(n: f64) -> f64 {
    if n.is_nan() || n == 0.0 { n } else { n.signum() }
}

fn to_number(value: &Value) -> f64 {
    match value {
        Value::Null => 0.0,
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Number(n) => *n,
        Value::Str(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                0.0
            } else {
                trimmed.parse().unwrap_or(f64::NAN)
            }
        }
        Value::List(_) | Value::Record(_) => f64::NAN,
    }
}
