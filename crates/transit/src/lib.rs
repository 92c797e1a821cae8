//! Transit marshaling engine.
//!
//! Transit layers tagged, self-describing values on top of JSON and
//! MessagePack. Anything beyond the ground types travels as a tagged
//! string (`"~:keyword"`), or as a tagged composite (`{"~#set": [...]}` or
//! `["~#set", [...]]`). Repeated map keys, tags, keywords and symbols are
//! shortened by a [rolling cache](cache).
//!
//! ```
//! use transit::{Transport, Value};
//!
//! let value = Value::map([(Value::keyword("id"), Value::from(7))]);
//! let text = transit::to_string(&value).unwrap();
//! assert_eq!(text, r#"{"~:id":7}"#);
//! assert_eq!(transit::from_str(&text).unwrap(), value);
//!
//! let bytes = transit::to_vec(&value, Transport::MsgPack).unwrap();
//! assert_eq!(transit::from_slice(&bytes, Transport::MsgPack).unwrap(), value);
//! ```
//!
//! Application types implement [`Extension`] and get a write handler
//! registered on an [`Encoder`] and a read handler on a [`Decoder`].

pub mod cache;
mod decoder;
mod encoder;
mod error;
pub mod handlers;
mod io;
pub mod time;
mod transport;
mod value;

/// Escape character. Starts every tagged string.
pub const ESC: char = '~';
/// Starts a cache code.
pub const SUB: char = '^';
/// Reserved.
pub const RES: char = '`';
/// Prefix of a composite tag: `~#set`.
pub const TAG: &str = "~#";
/// Head of a map written as an array.
pub const MAP_AS_ARRAY: &str = "^ ";

pub use cache::RollingCache;
pub use decoder::Decoder;
pub use encoder::Encoder;
pub use error::{DecodeError, EncodeError, Error, RepError};
pub use handlers::{
    DefaultReadHandler, FnWriteHandler, KeepTagged, ReadHandler, ReadHandlers, TypeKey,
    WriteHandler, WriteHandlers,
};
pub use io::{from_slice, from_str, to_string, to_vec, Reader, Writer};
pub use transport::{IntRange, ScalarForm, Transport, TransportProfile};
pub use value::{
    DynExtension, ExtValue, Extension, Link, LinkRender, Ratio, TaggedValue, TypedArray, Value,
};
