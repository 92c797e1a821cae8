//! Byte-level entry points: one-shot helpers and streaming [`Writer`] /
//! [`Reader`].
//!
//! A JSON stream is a sequence of documents separated by newlines; a
//! MessagePack stream is a plain concatenation of values. Every top-level
//! value starts with an empty rolling cache.

use std::io::{Read, Write};

use transit_pack::{json, msgpack, PackValue};

use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::error::Error;
use crate::transport::Transport;
use crate::value::Value;

fn node_to_vec(node: &PackValue, transport: Transport) -> Result<Vec<u8>, Error> {
    if transport.is_json() {
        Ok(json::to_vec(node)?)
    } else {
        Ok(msgpack::encode(node))
    }
}

/// Encode one value with the default handlers.
pub fn to_vec(value: &Value, transport: Transport) -> Result<Vec<u8>, Error> {
    let node = Encoder::new(transport).encode(value)?;
    node_to_vec(&node, transport)
}

/// Decode exactly one value with the default handlers.
pub fn from_slice(input: &[u8], transport: Transport) -> Result<Value, Error> {
    let node = if transport.is_json() {
        json::from_slice(input)?
    } else {
        msgpack::decode(input)?
    };
    Ok(Decoder::new().decode(&node)?)
}

/// Encode one value as cached JSON text.
pub fn to_string(value: &Value) -> Result<String, Error> {
    let node = Encoder::new(Transport::Json).encode(value)?;
    Ok(json::to_string(&node)?)
}

/// Decode one value from JSON text.
pub fn from_str(input: &str) -> Result<Value, Error> {
    from_slice(input.as_bytes(), Transport::Json)
}

/// Writes values to a byte sink.
#[derive(Debug)]
pub struct Writer<W: Write> {
    out: W,
    encoder: Encoder,
}

impl<W: Write> Writer<W> {
    pub fn new(transport: Transport, out: W) -> Self {
        Self::with_encoder(Encoder::new(transport), out)
    }

    pub fn with_encoder(encoder: Encoder, out: W) -> Self {
        Writer { out, encoder }
    }

    pub fn encoder_mut(&mut self) -> &mut Encoder {
        &mut self.encoder
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    /// Encode and write one top-level value. JSON values are terminated by
    /// a newline. Nothing is written when encoding fails.
    #[tracing::instrument(level = "trace", skip_all)]
    pub fn write(&mut self, value: &Value) -> Result<(), Error> {
        let node = self.encoder.encode(value)?;
        let transport = self.encoder.profile().transport;
        let mut bytes = node_to_vec(&node, transport)?;
        if transport.is_json() {
            bytes.push(b'\n');
        }
        self.out.write_all(&bytes)?;
        tracing::trace!(len = bytes.len(), "value written");
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), Error> {
        Ok(self.out.flush()?)
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReadState {
    Fresh,
    Loaded,
    Done,
}

/// Reads values from a byte source.
///
/// Input is buffered in full on the first read. A value whose node tree
/// cannot be turned into a [`Value`] is reported and skipped; a syntax
/// error in the underlying format ends the stream.
#[derive(Debug)]
pub struct Reader<R: Read> {
    input: R,
    transport: Transport,
    decoder: Decoder,
    buf: Vec<u8>,
    pos: usize,
    state: ReadState,
}

impl<R: Read> Reader<R> {
    pub fn new(transport: Transport, input: R) -> Self {
        Self::with_decoder(transport, Decoder::new(), input)
    }

    pub fn with_decoder(transport: Transport, decoder: Decoder, input: R) -> Self {
        Reader {
            input,
            transport,
            decoder,
            buf: Vec::new(),
            pos: 0,
            state: ReadState::Fresh,
        }
    }

    pub fn decoder_mut(&mut self) -> &mut Decoder {
        &mut self.decoder
    }

    fn next_node(&mut self) -> Result<Option<PackValue>, Error> {
        let rest = &self.buf[self.pos..];
        let next = if self.transport.is_json() {
            match json::next_value(rest) {
                None => None,
                Some(parsed) => Some(parsed?),
            }
        } else if rest.is_empty() {
            None
        } else {
            Some(msgpack::decode_prefix(rest)?)
        };
        Ok(next.map(|(node, used)| {
            self.pos += used;
            node
        }))
    }

    /// The next value, or `None` at the end of the input.
    #[tracing::instrument(level = "trace", skip_all)]
    pub fn read(&mut self) -> Result<Option<Value>, Error> {
        match self.state {
            ReadState::Done => return Ok(None),
            ReadState::Fresh => {
                self.state = ReadState::Done;
                self.input.read_to_end(&mut self.buf)?;
                self.state = ReadState::Loaded;
            }
            ReadState::Loaded => {}
        }

        let node = match self.next_node() {
            Ok(Some(node)) => node,
            Ok(None) => {
                self.state = ReadState::Done;
                return Ok(None);
            }
            Err(err) => {
                tracing::debug!(offset = self.pos, "malformed input, ending stream");
                self.state = ReadState::Done;
                return Err(err);
            }
        };
        Ok(Some(self.decoder.decode(&node)?))
    }
}

impl<R: Read> Iterator for Reader<R> {
    type Item = Result<Value, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read().transpose()
    }
}
