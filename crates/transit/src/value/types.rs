//! Compound value kinds: typed arrays, ratios, links and opaque tagged values.

use std::hash::{Hash, Hasher};

use num_bigint::{BigInt, Sign};

use super::{float_key, Value};

/// Homogeneous numeric/boolean array, tagged on the wire by element kind.
#[derive(Debug, Clone)]
pub enum TypedArray {
    Ints(Vec<i32>),
    Longs(Vec<i64>),
    Floats(Vec<f32>),
    Doubles(Vec<f64>),
    Bools(Vec<bool>),
}

impl TypedArray {
    /// Wire tag for this element kind.
    pub fn tag(&self) -> &'static str {
        match self {
            TypedArray::Ints(_) => "ints",
            TypedArray::Longs(_) => "longs",
            TypedArray::Floats(_) => "floats",
            TypedArray::Doubles(_) => "doubles",
            TypedArray::Bools(_) => "bools",
        }
    }

    pub fn len(&self) -> usize {
        match self {
            TypedArray::Ints(v) => v.len(),
            TypedArray::Longs(v) => v.len(),
            TypedArray::Floats(v) => v.len(),
            TypedArray::Doubles(v) => v.len(),
            TypedArray::Bools(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Elements as generic values.
    pub fn to_values(&self) -> Vec<Value> {
        match self {
            TypedArray::Ints(v) => v.iter().map(|&i| Value::from(i64::from(i))).collect(),
            TypedArray::Longs(v) => v.iter().map(|&i| Value::from(i)).collect(),
            TypedArray::Floats(v) => v.iter().map(|&f| Value::Float(f64::from(f))).collect(),
            TypedArray::Doubles(v) => v.iter().map(|&f| Value::Float(f)).collect(),
            TypedArray::Bools(v) => v.iter().map(|&b| Value::Bool(b)).collect(),
        }
    }
}

impl PartialEq for TypedArray {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (TypedArray::Ints(a), TypedArray::Ints(b)) => a == b,
            (TypedArray::Longs(a), TypedArray::Longs(b)) => a == b,
            (TypedArray::Floats(a), TypedArray::Floats(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .zip(b)
                        .all(|(x, y)| float_key(f64::from(*x)) == float_key(f64::from(*y)))
            }
            (TypedArray::Doubles(a), TypedArray::Doubles(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| float_key(*x) == float_key(*y))
            }
            (TypedArray::Bools(a), TypedArray::Bools(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for TypedArray {}

impl Hash for TypedArray {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.tag().hash(state);
        match self {
            TypedArray::Ints(v) => v.hash(state),
            TypedArray::Longs(v) => v.hash(state),
            TypedArray::Floats(v) => v.iter().for_each(|f| float_key(f64::from(*f)).hash(state)),
            TypedArray::Doubles(v) => v.iter().for_each(|f| float_key(*f).hash(state)),
            TypedArray::Bools(v) => v.hash(state),
        }
    }
}

/// Exact rational number. The denominator is never zero.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ratio {
    numerator: BigInt,
    denominator: BigInt,
}

impl Ratio {
    /// Returns `None` for a zero denominator.
    pub fn new(numerator: impl Into<BigInt>, denominator: impl Into<BigInt>) -> Option<Self> {
        let denominator = denominator.into();
        if denominator.sign() == Sign::NoSign {
            return None;
        }
        Some(Ratio {
            numerator: numerator.into(),
            denominator,
        })
    }

    pub fn numerator(&self) -> &BigInt {
        &self.numerator
    }

    pub fn denominator(&self) -> &BigInt {
        &self.denominator
    }
}

/// How a [`Link`] is meant to be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkRender {
    Link,
    Image,
}

impl LinkRender {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkRender::Link => "link",
            LinkRender::Image => "image",
        }
    }

    /// Case-insensitive parse of `"link"` / `"image"`.
    pub fn parse(s: &str) -> Option<Self> {
        if s.eq_ignore_ascii_case("link") {
            Some(LinkRender::Link)
        } else if s.eq_ignore_ascii_case("image") {
            Some(LinkRender::Image)
        } else {
            None
        }
    }
}

/// Hypermedia link.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Link {
    pub href: String,
    pub rel: String,
    pub name: Option<String>,
    pub render: Option<LinkRender>,
    pub prompt: Option<String>,
}

impl Link {
    pub fn new(href: impl Into<String>, rel: impl Into<String>) -> Self {
        Link {
            href: href.into(),
            rel: rel.into(),
            name: None,
            render: None,
            prompt: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_render(mut self, render: LinkRender) -> Self {
        self.render = Some(render);
        self
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }
}

/// A value whose tag had no read handler, kept verbatim so it can be
/// written back out unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaggedValue {
    pub tag: String,
    pub rep: Box<Value>,
}

impl TaggedValue {
    pub fn new(tag: impl Into<String>, rep: Value) -> Self {
        TaggedValue {
            tag: tag.into(),
            rep: Box::new(rep),
        }
    }
}
