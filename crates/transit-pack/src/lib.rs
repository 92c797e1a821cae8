//! Generic node tree and byte codecs for transit streams.
//!
//! The marshaling engine in the `transit` crate only ever produces and
//! consumes [`PackValue`] trees. This crate turns those trees into bytes and
//! back, for the two wire formats transit is layered on:
//!
//! - [`json`]: JSON via `serde_json`, with object key order preserved.
//! - [`msgpack`]: MessagePack, hand-rolled over [`PackValue`].

mod pack_value;

pub mod json;
pub mod msgpack;

pub use json::JsonError;
pub use msgpack::{MsgPackDecoder, MsgPackEncoder, MsgPackError};
pub use pack_value::PackValue;
