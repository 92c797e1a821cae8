//! Compact textual rendering of values, used in error messages.

use std::fmt;

use base64::Engine;

use super::Value;

fn join<'a, I>(f: &mut fmt::Formatter<'_>, items: I) -> fmt::Result
where
    I: IntoIterator<Item = &'a Value>,
{
    for (i, item) in items.into_iter().enumerate() {
        if i > 0 {
            f.write_str(" ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("nil"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::String(s) => write!(f, "{s:?}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x:?}"),
            Value::Decimal(d) => write!(f, "{d}M"),
            Value::Keyword(k) => write!(f, ":{k}"),
            Value::Symbol(s) => f.write_str(s),
            Value::Char(c) => write!(f, "\\{c}"),
            Value::Instant(t) => write!(f, "#inst {:?}", crate::time::to_iso(t)),
            Value::Uuid(u) => write!(f, "#uuid \"{u}\""),
            Value::Uri(u) => write!(f, "#uri {u:?}"),
            Value::Bytes(b) => write!(
                f,
                "#bytes \"{}\"",
                base64::engine::general_purpose::STANDARD.encode(b)
            ),
            Value::Array(items) => {
                f.write_str("[")?;
                join(f, items)?;
                f.write_str("]")
            }
            Value::List(items) => {
                f.write_str("(")?;
                join(f, items)?;
                f.write_str(")")
            }
            Value::Set(items) => {
                f.write_str("#{")?;
                join(f, items)?;
                f.write_str("}")
            }
            Value::Map(map) => {
                f.write_str("{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k} {v}")?;
                }
                f.write_str("}")
            }
            Value::TypedArray(t) => {
                write!(f, "#{} [", t.tag())?;
                join(f, &t.to_values())?;
                f.write_str("]")
            }
            Value::Ratio(r) => write!(f, "{}/{}", r.numerator(), r.denominator()),
            Value::Link(l) => write!(f, "#link {{:href {:?} :rel {:?}}}", l.href, l.rel),
            Value::Tagged(t) => write!(f, "#{} {}", t.tag, t.rep),
            Value::Ext(e) => write!(f, "{e:?}"),
        }
    }
}
