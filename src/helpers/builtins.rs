use super::HelperRegistry;
use crate::value::{as_number, display, is_truthy, length as value_length, number_value};
use anyhow::{anyhow, bail, Result};
use log::warn;
use regex::Regex;
use serde_json::Value;
use std::cmp::Ordering;
use std::ops::{Add, Div, Mul, Rem, Sub};

use cruet::{
    case::{
        camel::to_camel_case, kebab::to_kebab_case, pascal::to_pascal_case,
        screaming_snake::to_screaming_snake_case, snake::to_snake_case,
        table::to_table_case, train::to_train_case,
    },
    string::{pluralize::to_plural, singularize::to_singular},
    suffix::foreign_key::to_foreign_key,
};

/// Registers every built-in helper.
pub fn register_builtins(registry: &mut HelperRegistry) {
    registry.register("uppercase", |args: &[Value]| text(args, |s| s.to_uppercase()));
    registry.register("lowercase", |args: &[Value]| text(args, |s| s.to_lowercase()));
    registry.register("capitalize", |args: &[Value]| text(args, capitalize));
    registry.register("trim", |args: &[Value]| text(args, |s| s.trim().to_string()));
    registry.register("camel_case", |args: &[Value]| text(args, to_camel_case));
    registry.register("kebab_case", |args: &[Value]| text(args, to_kebab_case));
    registry.register("pascal_case", |args: &[Value]| text(args, to_pascal_case));
    registry.register("snake_case", |args: &[Value]| text(args, to_snake_case));
    registry.register("screaming_snake_case", |args: &[Value]| {
        text(args, to_screaming_snake_case)
    });
    registry.register("train_case", |args: &[Value]| text(args, to_train_case));
    registry.register("table_case", |args: &[Value]| text(args, to_table_case));
    registry.register("plural", |args: &[Value]| text(args, to_plural));
    registry.register("singular", |args: &[Value]| text(args, to_singular));
    registry.register("foreign_key", |args: &[Value]| text(args, to_foreign_key));
    registry.register("concat", concat);
    registry.register("replace", replace);
    registry.register("regex", regex_match);

    registry.register("add", |args: &[Value]| arithmetic(args, &ADD));
    registry.register("subtract", |args: &[Value]| arithmetic(args, &SUBTRACT));
    registry.register("multiply", |args: &[Value]| arithmetic(args, &MULTIPLY));
    registry.register("divide", |args: &[Value]| arithmetic(args, &DIVIDE));
    registry.register("modulo", |args: &[Value]| arithmetic(args, &MODULO));

    registry.register("length", length);
    registry.register("first", first);
    registry.register("last", last);
    registry.register("join", join);

    registry.register("eq", |args: &[Value]| {
        let (a, b) = pair(args)?;
        Ok(Value::Bool(loose_eq(a, b)))
    });
    registry.register("ne", |args: &[Value]| {
        let (a, b) = pair(args)?;
        Ok(Value::Bool(!loose_eq(a, b)))
    });
    registry.register("gt", |args: &[Value]| compare(args, Ordering::is_gt));
    registry.register("gte", |args: &[Value]| compare(args, Ordering::is_ge));
    registry.register("lt", |args: &[Value]| compare(args, Ordering::is_lt));
    registry.register("lte", |args: &[Value]| compare(args, Ordering::is_le));
    registry.register("and", |args: &[Value]| Ok(Value::Bool(args.iter().all(is_truthy))));
    registry.register("or", |args: &[Value]| Ok(Value::Bool(args.iter().any(is_truthy))));
    registry.register("not", |args: &[Value]| Ok(Value::Bool(!is_truthy(single(args)?))));
    registry.register("default", default);

    registry.register("json", |args: &[Value]| Ok(Value::String(single(args)?.to_string())));
}

fn single(args: &[Value]) -> Result<&Value> {
    match args {
        [value] => Ok(value),
        _ => bail!("expected 1 argument, got {}", args.len()),
    }
}

fn pair(args: &[Value]) -> Result<(&Value, &Value)> {
    match args {
        [a, b] => Ok((a, b)),
        _ => bail!("expected 2 arguments, got {}", args.len()),
    }
}

/// Applies a string transform to the display form of the single argument.
fn text<F, S>(args: &[Value], transform: F) -> Result<Value>
where
    F: Fn(&str) -> S,
    S: Into<String>,
{
    let input = display(single(args)?);
    Ok(Value::String(transform(&input).into()))
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn concat(args: &[Value]) -> Result<Value> {
    Ok(Value::String(args.iter().map(display).collect()))
}

fn replace(args: &[Value]) -> Result<Value> {
    let [input, from, to] = args else {
        bail!("expected 3 arguments, got {}", args.len());
    };
    let from = display(from);
    if from.is_empty() {
        bail!("cannot replace an empty pattern");
    }
    Ok(Value::String(display(input).replace(&from, &display(to))))
}

/// Tests if a string matches a given regular expression pattern.
///
/// An invalid pattern is logged and evaluates to `false`.
fn regex_match(args: &[Value]) -> Result<Value> {
    let (value, pattern) = pair(args)?;
    let pattern = display(pattern);
    let matched = match Regex::new(&pattern) {
        Ok(re) => re.is_match(&display(value)),
        Err(err) => {
            warn!("Invalid regex '{pattern}': {err}");
            false
        }
    };
    Ok(Value::Bool(matched))
}

/// An arithmetic operator. Integer operands use the exact `integer` form
/// while it yields a result; anything else falls back to `float`.
struct Operator {
    integer: fn(i64, i64) -> Option<i64>,
    float: fn(f64, f64) -> f64,
    /// Error raised for a zero right-hand operand.
    by_zero: Option<&'static str>,
}

const ADD: Operator =
    Operator { integer: i64::checked_add, float: <f64 as Add>::add, by_zero: None };
const SUBTRACT: Operator =
    Operator { integer: i64::checked_sub, float: <f64 as Sub>::sub, by_zero: None };
const MULTIPLY: Operator =
    Operator { integer: i64::checked_mul, float: <f64 as Mul>::mul, by_zero: None };
const DIVIDE: Operator =
    Operator { integer: exact_div, float: <f64 as Div>::div, by_zero: Some("division by zero") };
const MODULO: Operator = Operator {
    integer: i64::checked_rem,
    float: <f64 as Rem>::rem,
    by_zero: Some("modulo by zero"),
};

/// Integer division that only succeeds without a remainder.
fn exact_div(a: i64, b: i64) -> Option<i64> {
    a.checked_rem(b).filter(|rem| *rem == 0).and_then(|_| a.checked_div(b))
}

#[derive(Debug, Clone, Copy)]
enum Operand {
    Int(i64),
    Float(f64),
}

impl Operand {
    fn parse(value: &Value) -> Result<Self> {
        let int = match value {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        };
        match int {
            Some(int) => Ok(Operand::Int(int)),
            None => as_number(value)
                .map(Operand::Float)
                .ok_or_else(|| anyhow!("'{}' is not a number", display(value))),
        }
    }

    fn as_f64(self) -> f64 {
        match self {
            Operand::Int(int) => int as f64,
            Operand::Float(float) => float,
        }
    }
}

/// Left fold over the numeric arguments.
fn arithmetic(args: &[Value], op: &Operator) -> Result<Value> {
    let mut operands = args.iter().map(Operand::parse);
    let mut acc = match operands.next() {
        Some(first) => first?,
        None => bail!("expected at least 1 argument"),
    };
    for operand in operands {
        let operand = operand?;
        if let Some(message) = op.by_zero {
            if operand.as_f64() == 0.0 {
                bail!(message);
            }
        }
        let exact = match (acc, operand) {
            (Operand::Int(a), Operand::Int(b)) => (op.integer)(a, b),
            _ => None,
        };
        acc = match exact {
            Some(int) => Operand::Int(int),
            None => {
                let float = (op.float)(acc.as_f64(), operand.as_f64());
                if !float.is_finite() {
                    bail!("result is not a finite number");
                }
                Operand::Float(float)
            }
        };
    }
    Ok(match acc {
        Operand::Int(int) => Value::from(int),
        Operand::Float(float) => number_value(float),
    })
}

fn length(args: &[Value]) -> Result<Value> {
    match single(args)? {
        Value::Null => Ok(Value::from(0)),
        value => value_length(value)
            .map(Value::from)
            .ok_or_else(|| anyhow!("'{}' has no length", display(value))),
    }
}

fn first(args: &[Value]) -> Result<Value> {
    Ok(match single(args)? {
        Value::Array(items) => items.first().cloned().unwrap_or(Value::Null),
        Value::String(s) => s.chars().next().map_or(Value::Null, |c| c.to_string().into()),
        _ => Value::Null,
    })
}

fn last(args: &[Value]) -> Result<Value> {
    Ok(match single(args)? {
        Value::Array(items) => items.last().cloned().unwrap_or(Value::Null),
        Value::String(s) => s.chars().last().map_or(Value::Null, |c| c.to_string().into()),
        _ => Value::Null,
    })
}

fn join(args: &[Value]) -> Result<Value> {
    let (items, separator) = match args {
        [items] => (items, ",".to_string()),
        [items, separator] => (items, display(separator)),
        _ => bail!("expected 1 or 2 arguments, got {}", args.len()),
    };
    let Value::Array(items) = items else {
        bail!("'{}' is not a list", display(items));
    };
    let parts: Vec<String> = items.iter().map(display).collect();
    Ok(Value::String(parts.join(&separator)))
}

/// First truthy argument, else the last one.
fn default(args: &[Value]) -> Result<Value> {
    let Some(fallback) = args.last() else {
        bail!("expected at least 1 argument");
    };
    Ok(args.iter().find(|value| is_truthy(value)).unwrap_or(fallback).clone())
}

/// Equality where numbers compare by value (`1 == 1.0`).
fn loose_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

/// Orders two values numerically when both are numeric, otherwise as
/// strings when both are strings.
fn compare<F>(args: &[Value], accept: F) -> Result<Value>
where
    F: Fn(Ordering) -> bool,
{
    let (a, b) = pair(args)?;
    let ordering = match (as_number(a), as_number(b)) {
        (Some(x), Some(y)) => x.partial_cmp(&y),
        _ => match (a, b) {
            (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
            _ => None,
        },
    };
    let ordering = ordering.ok_or_else(|| {
        anyhow!("cannot compare '{}' with '{}'", display(a), display(b))
    })?;
    Ok(Value::Bool(accept(ordering)))
}
