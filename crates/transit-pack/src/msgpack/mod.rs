//! MessagePack encoder/decoder for [`PackValue`](crate::PackValue) trees.
//!
//! Only the subset of MessagePack that maps onto the generic node tree is
//! supported: nil, booleans, the integer and float families, strings,
//! arrays and string-keyed maps. `bin` and `ext` payloads are rejected.

pub mod decoder;
pub mod encoder;
pub mod error;

pub use decoder::MsgPackDecoder;
pub use encoder::MsgPackEncoder;
pub use error::MsgPackError;

use crate::PackValue;

/// Encode one value.
pub fn encode(value: &PackValue) -> Vec<u8> {
    let mut encoder = MsgPackEncoder::new();
    encoder.encode(value)
}

/// Decode exactly one value; trailing bytes are an error.
pub fn decode(blob: &[u8]) -> Result<PackValue, MsgPackError> {
    let mut decoder = MsgPackDecoder::new(blob);
    let value = decoder.read_any()?;
    if decoder.position() != blob.len() {
        return Err(MsgPackError::TrailingBytes(decoder.position()));
    }
    Ok(value)
}

/// Decode the first value of `blob`, returning it with the number of bytes
/// it occupied. Used to walk a buffer holding several concatenated values.
pub fn decode_prefix(blob: &[u8]) -> Result<(PackValue, usize), MsgPackError> {
    let mut decoder = MsgPackDecoder::new(blob);
    let value = decoder.read_any()?;
    Ok((value, decoder.position()))
}
