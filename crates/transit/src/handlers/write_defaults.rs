//! Built-in write handlers.

use std::borrow::Cow;
use std::sync::Arc;

use base64::Engine;
use chrono::{DateTime, Utc};

use super::type_key::TypeKey;
use super::write::{WriteHandler, WriteTable};
use crate::time;
use crate::transport::ScalarForm;
use crate::value::{Link, Value};

fn owned_str<'a>(s: String) -> Cow<'a, Value> {
    Cow::Owned(Value::String(s))
}

/// Top-type entry. Its empty tag makes the encoder report the value's type
/// as unwritable.
pub(super) struct UnknownType;

impl WriteHandler for UnknownType {
    fn tag<'a>(&'a self, _value: &'a Value) -> Cow<'a, str> {
        Cow::Borrowed("")
    }

    fn rep<'a>(&self, value: &'a Value) -> Cow<'a, Value> {
        Cow::Borrowed(value)
    }

    fn string_rep(&self, _value: &Value) -> Option<String> {
        None
    }
}

/// Handlers whose representation is the value itself.
struct Identity {
    tag: &'static str,
}

impl WriteHandler for Identity {
    fn tag<'a>(&'a self, _value: &'a Value) -> Cow<'a, str> {
        Cow::Borrowed(self.tag)
    }

    fn rep<'a>(&self, value: &'a Value) -> Cow<'a, Value> {
        Cow::Borrowed(value)
    }

    fn string_rep(&self, value: &Value) -> Option<String> {
        match value {
            Value::Null => Some(String::new()),
            Value::Bool(b) => Some(if *b { "t" } else { "f" }.to_owned()),
            Value::String(s) => Some(s.clone()),
            Value::Integer(i) => Some(i.to_string()),
            _ => None,
        }
    }
}

struct FloatHandler;

impl WriteHandler for FloatHandler {
    fn tag<'a>(&'a self, value: &'a Value) -> Cow<'a, str> {
        match value {
            Value::Float(f) if !f.is_finite() => Cow::Borrowed("z"),
            _ => Cow::Borrowed("d"),
        }
    }

    fn rep<'a>(&self, value: &'a Value) -> Cow<'a, Value> {
        match value {
            Value::Float(f) if f.is_nan() => owned_str("NaN".to_owned()),
            Value::Float(f) if f.is_infinite() && *f > 0.0 => owned_str("INF".to_owned()),
            Value::Float(f) if f.is_infinite() => owned_str("-INF".to_owned()),
            _ => Cow::Borrowed(value),
        }
    }

    fn string_rep(&self, value: &Value) -> Option<String> {
        match self.rep(value).as_ref() {
            Value::Float(f) => Some(format!("{f:?}")),
            Value::String(s) => Some(s.clone()),
            _ => None,
        }
    }
}

/// Scalars carried as text under a one-character tag.
struct Textual {
    tag: &'static str,
}

impl WriteHandler for Textual {
    fn tag<'a>(&'a self, _value: &'a Value) -> Cow<'a, str> {
        Cow::Borrowed(self.tag)
    }

    fn rep<'a>(&self, value: &'a Value) -> Cow<'a, Value> {
        let text = match value {
            Value::Decimal(d) => d.to_string(),
            Value::Keyword(s) | Value::Symbol(s) | Value::Uri(s) => s.clone(),
            Value::Char(c) => c.to_string(),
            Value::Bytes(b) => base64::engine::general_purpose::STANDARD.encode(b),
            _ => return Cow::Borrowed(value),
        };
        owned_str(text)
    }
}

struct InstantHandler {
    form: ScalarForm,
}

impl WriteHandler for InstantHandler {
    fn tag<'a>(&'a self, value: &'a Value) -> Cow<'a, str> {
        match value {
            Value::Instant(t) if !time::has_iso_form(t) => Cow::Borrowed("m"),
            _ => Cow::Borrowed("t"),
        }
    }

    fn rep<'a>(&self, value: &'a Value) -> Cow<'a, Value> {
        match (value, self.form) {
            (Value::Instant(t), ScalarForm::Textual) => owned_str(instant_text(t)),
            (Value::Instant(t), ScalarForm::Structural) => {
                Cow::Owned(Value::from(time::to_millis(t)))
            }
            _ => Cow::Borrowed(value),
        }
    }

    fn string_rep(&self, value: &Value) -> Option<String> {
        match value {
            Value::Instant(t) => Some(instant_text(t)),
            _ => None,
        }
    }
}

/// Payload of `~t` or, outside four-digit years, of `~m`.
fn instant_text(t: &DateTime<Utc>) -> String {
    if time::has_iso_form(t) {
        time::to_iso(t)
    } else {
        time::to_millis(t).to_string()
    }
}

struct UuidHandler {
    form: ScalarForm,
}

impl WriteHandler for UuidHandler {
    fn tag<'a>(&'a self, _value: &'a Value) -> Cow<'a, str> {
        Cow::Borrowed("u")
    }

    fn rep<'a>(&self, value: &'a Value) -> Cow<'a, Value> {
        match (value, self.form) {
            (Value::Uuid(u), ScalarForm::Textual) => owned_str(u.hyphenated().to_string()),
            (Value::Uuid(u), ScalarForm::Structural) => {
                // Signed halves, as JVM-based peers expect.
                let (msb, lsb) = u.as_u64_pair();
                Cow::Owned(Value::Array(vec![
                    Value::from(msb as i64),
                    Value::from(lsb as i64),
                ]))
            }
            _ => Cow::Borrowed(value),
        }
    }

    fn string_rep(&self, value: &Value) -> Option<String> {
        match value {
            Value::Uuid(u) => Some(u.hyphenated().to_string()),
            _ => None,
        }
    }
}

/// Collections written as a tagged array of their elements.
struct Sequence {
    tag: &'static str,
}

impl WriteHandler for Sequence {
    fn tag<'a>(&'a self, _value: &'a Value) -> Cow<'a, str> {
        Cow::Borrowed(self.tag)
    }

    fn rep<'a>(&self, value: &'a Value) -> Cow<'a, Value> {
        match value {
            Value::List(items) => Cow::Owned(Value::Array(items.clone())),
            Value::Set(items) => Cow::Owned(Value::Array(items.iter().cloned().collect())),
            Value::Ratio(r) => Cow::Owned(Value::Array(vec![
                Value::Integer(r.numerator().clone()),
                Value::Integer(r.denominator().clone()),
            ])),
            _ => Cow::Borrowed(value),
        }
    }
}

struct TypedArrayHandler;

impl WriteHandler for TypedArrayHandler {
    fn tag<'a>(&'a self, value: &'a Value) -> Cow<'a, str> {
        match value {
            Value::TypedArray(t) => Cow::Borrowed(t.tag()),
            _ => Cow::Borrowed("array"),
        }
    }

    fn rep<'a>(&self, value: &'a Value) -> Cow<'a, Value> {
        match value {
            Value::TypedArray(t) => Cow::Owned(Value::Array(t.to_values())),
            _ => Cow::Borrowed(value),
        }
    }
}

struct LinkHandler;

fn link_rep(link: &Link) -> Value {
    let opt = |s: &Option<String>| s.clone().map_or(Value::Null, Value::String);
    Value::map([
        (Value::from("href"), Value::Uri(link.href.clone())),
        (Value::from("rel"), Value::from(link.rel.as_str())),
        (Value::from("name"), opt(&link.name)),
        (
            Value::from("render"),
            link.render
                .map_or(Value::Null, |r| Value::from(r.as_str())),
        ),
        (Value::from("prompt"), opt(&link.prompt)),
    ])
}

impl WriteHandler for LinkHandler {
    fn tag<'a>(&'a self, _value: &'a Value) -> Cow<'a, str> {
        Cow::Borrowed("link")
    }

    fn rep<'a>(&self, value: &'a Value) -> Cow<'a, Value> {
        match value {
            Value::Link(link) => Cow::Owned(link_rep(link)),
            _ => Cow::Borrowed(value),
        }
    }
}

/// Writes an opaque tagged value back out under its original tag.
struct TaggedHandler;

impl WriteHandler for TaggedHandler {
    fn tag<'a>(&'a self, value: &'a Value) -> Cow<'a, str> {
        match value {
            Value::Tagged(t) => Cow::Borrowed(t.tag.as_str()),
            _ => Cow::Borrowed(""),
        }
    }

    fn rep<'a>(&self, value: &'a Value) -> Cow<'a, Value> {
        match value {
            Value::Tagged(t) => Cow::Borrowed(t.rep.as_ref()),
            _ => Cow::Borrowed(value),
        }
    }
}

/// The default write table for `form`.
pub(super) fn table(form: ScalarForm) -> WriteTable {
    let entries: [(TypeKey, Arc<dyn WriteHandler>); 22] = [
        (TypeKey::Null, Arc::new(Identity { tag: "_" })),
        (TypeKey::Bool, Arc::new(Identity { tag: "?" })),
        (TypeKey::String, Arc::new(Identity { tag: "s" })),
        (TypeKey::Integer, Arc::new(Identity { tag: "i" })),
        (TypeKey::Float, Arc::new(FloatHandler)),
        (TypeKey::Decimal, Arc::new(Textual { tag: "f" })),
        (TypeKey::Keyword, Arc::new(Textual { tag: ":" })),
        (TypeKey::Symbol, Arc::new(Textual { tag: "$" })),
        (TypeKey::Char, Arc::new(Textual { tag: "c" })),
        (TypeKey::Uri, Arc::new(Textual { tag: "r" })),
        (TypeKey::Bytes, Arc::new(Textual { tag: "b" })),
        (TypeKey::Instant, Arc::new(InstantHandler { form })),
        (TypeKey::Uuid, Arc::new(UuidHandler { form })),
        (TypeKey::Array, Arc::new(Identity { tag: "array" })),
        (TypeKey::Map, Arc::new(Identity { tag: "map" })),
        (TypeKey::List, Arc::new(Sequence { tag: "list" })),
        (TypeKey::Set, Arc::new(Sequence { tag: "set" })),
        (TypeKey::Ratio, Arc::new(Sequence { tag: "ratio" })),
        (TypeKey::TypedArray, Arc::new(TypedArrayHandler)),
        (TypeKey::Link, Arc::new(LinkHandler)),
        (TypeKey::Tagged, Arc::new(TaggedHandler)),
        (TypeKey::Any, Arc::new(UnknownType)),
    ];
    entries.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{LinkRender, Ratio, TypedArray};
    use uuid::Uuid;

    fn tag_and_rep(form: ScalarForm, v: &Value) -> (String, Value) {
        let table = table(form);
        let h = &table[&v.type_key()];
        (h.tag(v).into_owned(), h.rep(v).into_owned())
    }

    #[test]
    fn textual_scalars() {
        let (tag, rep) = tag_and_rep(ScalarForm::Textual, &Value::bytes(b"hi".to_vec()));
        assert_eq!((tag.as_str(), rep), ("b", Value::from("aGk=")));
        let (tag, rep) = tag_and_rep(ScalarForm::Textual, &Value::Char('x'));
        assert_eq!((tag.as_str(), rep), ("c", Value::from("x")));
    }

    #[test]
    fn far_instants_fall_back_to_millis() {
        let far = Value::instant_millis(253_402_300_800_000).unwrap();
        let (tag, rep) = tag_and_rep(ScalarForm::Textual, &far);
        assert_eq!((tag.as_str(), rep), ("m", Value::from("253402300800000")));
        let (tag, rep) = tag_and_rep(ScalarForm::Structural, &far);
        assert_eq!((tag.as_str(), rep), ("m", Value::from(253_402_300_800_000i64)));

        let near = Value::instant_millis(0).unwrap();
        let (tag, rep) = tag_and_rep(ScalarForm::Textual, &near);
        assert_eq!((tag.as_str(), rep), ("t", Value::from("1970-01-01T00:00:00.000Z")));
    }

    #[test]
    fn special_floats_use_z() {
        for (f, text) in [(f64::NAN, "NaN"), (f64::INFINITY, "INF"), (f64::NEG_INFINITY, "-INF")] {
            let (tag, rep) = tag_and_rep(ScalarForm::Textual, &Value::Float(f));
            assert_eq!(tag, "z");
            assert_eq!(rep, Value::from(text));
        }
        let (tag, _) = tag_and_rep(ScalarForm::Textual, &Value::Float(1.5));
        assert_eq!(tag, "d");
    }

    #[test]
    fn uuid_forms() {
        let u = Uuid::from_u64_pair(u64::MAX, 1);
        let (_, textual) = tag_and_rep(ScalarForm::Textual, &Value::Uuid(u));
        assert_eq!(textual, Value::from("ffffffff-ffff-ffff-0000-000000000001"));
        let (tag, structural) = tag_and_rep(ScalarForm::Structural, &Value::Uuid(u));
        assert_eq!(tag, "u");
        assert_eq!(structural, Value::from(vec![Value::from(-1i64), Value::from(1i64)]));
    }

    #[test]
    fn instant_forms() {
        let t = Value::instant_millis(1_000).unwrap();
        assert_eq!(
            tag_and_rep(ScalarForm::Textual, &t).1,
            Value::from("1970-01-01T00:00:01.000Z")
        );
        assert_eq!(tag_and_rep(ScalarForm::Structural, &t).1, Value::from(1_000i64));
    }

    #[test]
    fn composite_reps() {
        let (tag, rep) = tag_and_rep(
            ScalarForm::Textual,
            &Value::from(TypedArray::Longs(vec![1, 2])),
        );
        assert_eq!(tag, "longs");
        assert_eq!(rep, Value::from(vec![Value::from(1i64), Value::from(2i64)]));

        let (tag, rep) = tag_and_rep(ScalarForm::Textual, &Value::from(Ratio::new(1, 3).unwrap()));
        assert_eq!(tag, "ratio");
        assert_eq!(rep, Value::from(vec![Value::from(1), Value::from(3)]));

        let link = Link::new("http://x", "self").with_render(LinkRender::Image);
        let (tag, rep) = tag_and_rep(ScalarForm::Textual, &Value::from(link));
        assert_eq!(tag, "link");
        let map = rep.as_map().unwrap();
        assert_eq!(map[&Value::from("href")], Value::uri("http://x"));
        assert_eq!(map[&Value::from("render")], Value::from("image"));
        assert_eq!(map[&Value::from("name")], Value::Null);
    }

    #[test]
    fn tagged_values_keep_their_tag() {
        let v = Value::tagged("point", Value::from(vec![Value::from(1)]));
        let (tag, rep) = tag_and_rep(ScalarForm::Textual, &v);
        assert_eq!(tag, "point");
        assert_eq!(rep, Value::from(vec![Value::from(1)]));
    }
}
