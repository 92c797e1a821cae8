//! Built-in read handlers.
//!
//! Scalar handlers accept both the text payload of a `~x...` string and
//! the natural decoded form of the same value (`~#t` with integer millis,
//! `~#u` with a `[msb, lsb]` pair, ...), since producers differ in which
//! one they send.

use std::str::FromStr;
use std::sync::Arc;

use base64::Engine;
use bigdecimal::BigDecimal;
use indexmap::IndexMap;
use num_bigint::BigInt;
use uuid::Uuid;

use super::read::{ReadHandler, ReadTable};
use crate::error::RepError;
use crate::time;
use crate::value::{Link, LinkRender, Ratio, TypedArray, Value};

type ReadResult = Result<Value, RepError>;

fn into_text(rep: Value, expected: &'static str) -> Result<String, RepError> {
    match rep {
        Value::String(s) => Ok(s),
        other => Err(RepError::expected(expected, other)),
    }
}

fn into_array(rep: Value, expected: &'static str) -> Result<Vec<Value>, RepError> {
    match rep {
        Value::Array(items) | Value::List(items) => Ok(items),
        other => Err(RepError::expected(expected, other)),
    }
}

fn parse_integer(s: &str) -> Option<BigInt> {
    BigInt::from_str(s).ok()
}

// ── Scalars ─────────────────────────────────────────────────────────────

fn read_null(_rep: Value) -> ReadResult {
    Ok(Value::Null)
}

fn read_bool(rep: Value) -> ReadResult {
    match rep {
        Value::Bool(b) => Ok(Value::Bool(b)),
        Value::String(s) if s == "t" => Ok(Value::Bool(true)),
        Value::String(s) if s == "f" => Ok(Value::Bool(false)),
        other => Err(RepError::expected("`t`, `f` or a boolean", other)),
    }
}

fn read_string(rep: Value) -> ReadResult {
    Ok(rep)
}

fn read_integer(rep: Value) -> ReadResult {
    match rep {
        Value::Integer(i) => Ok(Value::Integer(i)),
        Value::String(s) => match parse_integer(&s) {
            Some(i) => Ok(Value::Integer(i)),
            None => Err(RepError::invalid("invalid integer", Value::String(s))),
        },
        other => Err(RepError::expected("integer", other)),
    }
}

fn read_float(rep: Value) -> ReadResult {
    match rep {
        Value::Float(f) => Ok(Value::Float(f)),
        Value::Integer(i) => match i.to_string().parse::<f64>() {
            Ok(f) => Ok(Value::Float(f)),
            Err(_) => Err(RepError::invalid("invalid float", Value::Integer(i))),
        },
        Value::String(s) => match s.parse::<f64>() {
            Ok(f) => Ok(Value::Float(f)),
            Err(_) => Err(RepError::invalid("invalid float", Value::String(s))),
        },
        other => Err(RepError::expected("float", other)),
    }
}

fn read_special_float(rep: Value) -> ReadResult {
    let s = into_text(rep, "`NaN`, `INF` or `-INF`")?;
    match s.as_str() {
        "NaN" => Ok(Value::Float(f64::NAN)),
        "INF" => Ok(Value::Float(f64::INFINITY)),
        "-INF" => Ok(Value::Float(f64::NEG_INFINITY)),
        _ => Err(RepError::invalid("unknown special float", Value::String(s))),
    }
}

fn read_decimal(rep: Value) -> ReadResult {
    match rep {
        Value::Integer(i) => Ok(Value::Decimal(BigDecimal::new(i, 0))),
        Value::String(s) => match BigDecimal::from_str(&s) {
            Ok(d) => Ok(Value::Decimal(d)),
            Err(_) => Err(RepError::invalid("invalid decimal", Value::String(s))),
        },
        other => Err(RepError::expected("decimal string", other)),
    }
}

fn read_char(rep: Value) -> ReadResult {
    let s = into_text(rep, "string")?;
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(Value::Char(c)),
        _ => Ok(Value::String(s)),
    }
}

fn read_keyword(rep: Value) -> ReadResult {
    into_text(rep, "string").map(Value::Keyword)
}

fn read_symbol(rep: Value) -> ReadResult {
    into_text(rep, "string").map(Value::Symbol)
}

fn read_uri(rep: Value) -> ReadResult {
    match rep {
        Value::Uri(u) => Ok(Value::Uri(u)),
        other => into_text(other, "string").map(Value::Uri),
    }
}

fn instant_from_millis(millis: i64, rep: Value) -> ReadResult {
    match time::from_millis(millis) {
        Some(t) => Ok(Value::Instant(t)),
        None => Err(RepError::invalid("instant out of range", rep)),
    }
}

fn read_millis(rep: Value) -> ReadResult {
    let millis = match &rep {
        Value::Instant(t) => return Ok(Value::Instant(*t)),
        Value::Integer(i) => i64::try_from(i).ok(),
        Value::String(s) => s.parse::<i64>().ok(),
        _ => None,
    };
    match millis {
        Some(ms) => instant_from_millis(ms, rep),
        None => Err(RepError::expected("milliseconds", rep)),
    }
}

fn read_instant(rep: Value) -> ReadResult {
    let parsed = match &rep {
        Value::String(s) => Some((time::from_iso(s), s.parse::<i64>().is_ok())),
        _ => None,
    };
    match parsed {
        Some((Some(t), _)) => Ok(Value::Instant(t)),
        Some((None, false)) => Err(RepError::invalid("invalid ISO-8601 instant", rep)),
        _ => read_millis(rep),
    }
}

fn uuid_half(v: &Value) -> Option<u64> {
    let i = v.as_integer()?;
    i64::try_from(i)
        .map(|signed| signed as u64)
        .or_else(|_| u64::try_from(i))
        .ok()
}

fn read_uuid(rep: Value) -> ReadResult {
    match rep {
        Value::Uuid(u) => Ok(Value::Uuid(u)),
        Value::String(s) => match Uuid::parse_str(&s) {
            Ok(u) => Ok(Value::Uuid(u)),
            Err(_) => Err(RepError::invalid("invalid uuid", Value::String(s))),
        },
        Value::Array(halves) => {
            let pair = match halves.as_slice() {
                [msb, lsb] => uuid_half(msb).zip(uuid_half(lsb)),
                _ => None,
            };
            match pair {
                Some((hi, lo)) => Ok(Value::Uuid(Uuid::from_u64_pair(hi, lo))),
                None => Err(RepError::expected("[msb, lsb] 64-bit halves", Value::Array(halves))),
            }
        }
        other => Err(RepError::expected("uuid string or [msb, lsb]", other)),
    }
}

fn read_bytes(rep: Value) -> ReadResult {
    let s = into_text(rep, "base64 string")?;
    // line-wrapping encoders insert whitespace
    let compact: String = s.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    match base64::engine::general_purpose::STANDARD.decode(compact.as_bytes()) {
        Ok(bytes) => Ok(Value::Bytes(bytes)),
        Err(_) => Err(RepError::invalid("invalid base64", Value::String(s))),
    }
}

fn read_quote(rep: Value) -> ReadResult {
    Ok(rep)
}

// ── Collections ─────────────────────────────────────────────────────────

fn read_array(rep: Value) -> ReadResult {
    into_array(rep, "array").map(Value::Array)
}

fn read_list(rep: Value) -> ReadResult {
    into_array(rep, "array").map(Value::List)
}

fn read_set(rep: Value) -> ReadResult {
    into_array(rep, "array").map(|items| Value::Set(items.into_iter().collect()))
}

fn read_map(rep: Value) -> ReadResult {
    match rep {
        Value::Map(m) => Ok(Value::Map(m)),
        other => Err(RepError::expected("map", other)),
    }
}

fn read_cmap(rep: Value) -> ReadResult {
    let items = into_array(rep, "array of alternating keys and values")?;
    if items.len() % 2 != 0 {
        return Err(RepError::invalid(
            "odd number of cmap entries",
            Value::Array(items),
        ));
    }
    let mut map = IndexMap::with_capacity(items.len() / 2);
    let mut it = items.into_iter();
    while let (Some(k), Some(v)) = (it.next(), it.next()) {
        map.insert(k, v);
    }
    Ok(Value::Map(map))
}

fn read_ratio(rep: Value) -> ReadResult {
    let items = into_array(rep, "[numerator, denominator]")?;
    let parts = match items.as_slice() {
        [Value::Integer(n), Value::Integer(d)] => Some((n.clone(), d.clone())),
        _ => None,
    };
    match parts {
        Some((n, d)) => match Ratio::new(n, d) {
            Some(r) => Ok(Value::Ratio(r)),
            None => Err(RepError::invalid("zero denominator", Value::Array(items))),
        },
        None => Err(RepError::expected("[numerator, denominator]", Value::Array(items))),
    }
}

fn read_link(rep: Value) -> ReadResult {
    let map = match rep {
        Value::Map(m) => m,
        other => return Err(RepError::expected("link map", other)),
    };
    let text = |name: &str| match map.get(&Value::from(name)) {
        Some(Value::String(s)) | Some(Value::Uri(s)) => Some(s.clone()),
        _ => None,
    };
    let (href, rel, name, render, prompt) = (
        text("href"),
        text("rel"),
        text("name"),
        text("render"),
        text("prompt"),
    );
    let (href, rel) = match (href, rel) {
        (Some(href), Some(rel)) => (href, rel),
        _ => return Err(RepError::invalid("link needs href and rel", Value::Map(map))),
    };
    let render = match render.as_deref().map(LinkRender::parse) {
        None => None,
        Some(Some(render)) => Some(render),
        Some(None) => {
            return Err(RepError::invalid("render must be link or image", Value::Map(map)))
        }
    };
    Ok(Value::Link(Link {
        href,
        rel,
        name,
        render,
        prompt,
    }))
}

// ── Typed arrays ────────────────────────────────────────────────────────

fn typed<T>(
    rep: Value,
    expected: &'static str,
    item: impl Fn(&Value) -> Option<T>,
    wrap: impl FnOnce(Vec<T>) -> TypedArray,
) -> ReadResult {
    let items = into_array(rep, expected)?;
    match items.iter().map(&item).collect::<Option<Vec<T>>>() {
        Some(out) => Ok(Value::TypedArray(wrap(out))),
        None => Err(RepError::expected(expected, Value::Array(items))),
    }
}

fn number(v: &Value) -> Option<f64> {
    match v {
        Value::Float(f) => Some(*f),
        Value::Integer(i) => i64::try_from(i).ok().map(|i| i as f64),
        _ => None,
    }
}

fn read_ints(rep: Value) -> ReadResult {
    typed(
        rep,
        "array of 32-bit integers",
        |v| v.as_integer().and_then(|i| i32::try_from(i).ok()),
        TypedArray::Ints,
    )
}

fn read_longs(rep: Value) -> ReadResult {
    typed(rep, "array of 64-bit integers", Value::as_i64, TypedArray::Longs)
}

fn read_floats(rep: Value) -> ReadResult {
    typed(
        rep,
        "array of numbers",
        |v| number(v).map(|f| f as f32),
        TypedArray::Floats,
    )
}

fn read_doubles(rep: Value) -> ReadResult {
    typed(rep, "array of numbers", number, TypedArray::Doubles)
}

fn read_bools(rep: Value) -> ReadResult {
    typed(rep, "array of booleans", Value::as_bool, TypedArray::Bools)
}

/// The default tag → handler table.
pub(super) fn table() -> ReadTable {
    let entries: [(&str, Arc<dyn ReadHandler>); 29] = [
        ("_", Arc::new(read_null)),
        ("?", Arc::new(read_bool)),
        ("s", Arc::new(read_string)),
        ("i", Arc::new(read_integer)),
        ("n", Arc::new(read_integer)),
        ("d", Arc::new(read_float)),
        ("z", Arc::new(read_special_float)),
        ("f", Arc::new(read_decimal)),
        ("c", Arc::new(read_char)),
        (":", Arc::new(read_keyword)),
        ("$", Arc::new(read_symbol)),
        ("r", Arc::new(read_uri)),
        ("t", Arc::new(read_instant)),
        ("m", Arc::new(read_millis)),
        ("u", Arc::new(read_uuid)),
        ("b", Arc::new(read_bytes)),
        ("'", Arc::new(read_quote)),
        ("array", Arc::new(read_array)),
        ("map", Arc::new(read_map)),
        ("list", Arc::new(read_list)),
        ("set", Arc::new(read_set)),
        ("cmap", Arc::new(read_cmap)),
        ("ratio", Arc::new(read_ratio)),
        ("link", Arc::new(read_link)),
        ("ints", Arc::new(read_ints)),
        ("longs", Arc::new(read_longs)),
        ("floats", Arc::new(read_floats)),
        ("doubles", Arc::new(read_doubles)),
        ("bools", Arc::new(read_bools)),
    ];
    entries
        .into_iter()
        .map(|(tag, handler)| (tag.to_owned(), handler))
        .collect()
}
