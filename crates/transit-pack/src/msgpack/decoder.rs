//! `MsgPackDecoder`: reads MessagePack into [`PackValue`] trees.
//!
//! The decoder borrows its input and keeps a cursor, so a buffer holding
//! several concatenated values can be drained one value at a time.

use super::error::MsgPackError;
use crate::PackValue;

pub struct MsgPackDecoder<'a> {
    data: &'a [u8],
    x: usize,
}

impl<'a> MsgPackDecoder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, x: 0 }
    }

    /// Byte offset of the next unread value.
    pub fn position(&self) -> usize {
        self.x
    }

    pub fn is_empty(&self) -> bool {
        self.x >= self.data.len()
    }

    #[inline]
    fn take(&mut self, n: usize) -> Result<&'a [u8], MsgPackError> {
        if self.x + n > self.data.len() {
            return Err(MsgPackError::UnexpectedEof);
        }
        let slice = &self.data[self.x..self.x + n];
        self.x += n;
        Ok(slice)
    }

    #[inline]
    fn take_array<const N: usize>(&mut self) -> Result<[u8; N], MsgPackError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    #[inline]
    fn u8(&mut self) -> Result<u8, MsgPackError> {
        Ok(self.take(1)?[0])
    }

    #[inline]
    fn u16(&mut self) -> Result<u16, MsgPackError> {
        Ok(u16::from_be_bytes(self.take_array()?))
    }

    #[inline]
    fn u32(&mut self) -> Result<u32, MsgPackError> {
        Ok(u32::from_be_bytes(self.take_array()?))
    }

    #[inline]
    fn utf8(&mut self, size: usize) -> Result<String, MsgPackError> {
        let slice = self.take(size)?;
        std::str::from_utf8(slice)
            .map(str::to_owned)
            .map_err(|_| MsgPackError::InvalidUtf8)
    }

    pub fn read_any(&mut self) -> Result<PackValue, MsgPackError> {
        let byte = self.u8()?;

        // negative fixint: 0xe0–0xff → -32..–1
        if byte >= 0xe0 {
            return Ok(PackValue::Integer(byte as i8 as i64));
        }
        // positive fixint: 0x00–0x7f
        if byte <= 0x7f {
            return Ok(PackValue::Integer(byte as i64));
        }
        // fixmap: 0x80–0x8f
        if (0x80..=0x8f).contains(&byte) {
            return self.read_obj(byte as usize & 0xf);
        }
        // fixarray: 0x90–0x9f
        if (0x90..=0x9f).contains(&byte) {
            return self.read_arr(byte as usize & 0xf);
        }
        // fixstr: 0xa0–0xbf
        if (0xa0..=0xbf).contains(&byte) {
            return self.utf8(byte as usize & 0x1f).map(PackValue::Str);
        }

        match byte {
            0xc0 => Ok(PackValue::Null),
            0xc2 => Ok(PackValue::Bool(false)),
            0xc3 => Ok(PackValue::Bool(true)),
            0xca => Ok(PackValue::Float(
                f32::from_be_bytes(self.take_array()?) as f64
            )),
            0xcb => Ok(PackValue::Float(f64::from_be_bytes(self.take_array()?))),
            0xcc => Ok(PackValue::Integer(self.u8()? as i64)),
            0xcd => Ok(PackValue::Integer(self.u16()? as i64)),
            0xce => Ok(PackValue::Integer(self.u32()? as i64)),
            0xcf => {
                let u = u64::from_be_bytes(self.take_array()?);
                Ok(match i64::try_from(u) {
                    Ok(i) => PackValue::Integer(i),
                    Err(_) => PackValue::UInteger(u),
                })
            }
            0xd0 => Ok(PackValue::Integer(self.u8()? as i8 as i64)),
            0xd1 => Ok(PackValue::Integer(
                i16::from_be_bytes(self.take_array()?) as i64
            )),
            0xd2 => Ok(PackValue::Integer(
                i32::from_be_bytes(self.take_array()?) as i64
            )),
            0xd3 => Ok(PackValue::Integer(i64::from_be_bytes(self.take_array()?))),
            0xd9 => {
                let n = self.u8()? as usize;
                self.utf8(n).map(PackValue::Str)
            }
            0xda => {
                let n = self.u16()? as usize;
                self.utf8(n).map(PackValue::Str)
            }
            0xdb => {
                let n = self.u32()? as usize;
                self.utf8(n).map(PackValue::Str)
            }
            0xdc => {
                let n = self.u16()? as usize;
                self.read_arr(n)
            }
            0xdd => {
                let n = self.u32()? as usize;
                self.read_arr(n)
            }
            0xde => {
                let n = self.u16()? as usize;
                self.read_obj(n)
            }
            0xdf => {
                let n = self.u32()? as usize;
                self.read_obj(n)
            }
            // bin8..bin32, ext8..ext32, fixext1..fixext16
            0xc4..=0xc9 | 0xd4..=0xd8 => Err(MsgPackError::Unsupported(byte)),
            _ => Err(MsgPackError::InvalidByte(self.x - 1)),
        }
    }

    fn read_obj(&mut self, size: usize) -> Result<PackValue, MsgPackError> {
        let mut obj = Vec::with_capacity(size.min(1024));
        for _ in 0..size {
            let key = self.read_key()?;
            let val = self.read_any()?;
            obj.push((key, val));
        }
        Ok(PackValue::Object(obj))
    }

    fn read_arr(&mut self, size: usize) -> Result<PackValue, MsgPackError> {
        let mut arr = Vec::with_capacity(size.min(1024));
        for _ in 0..size {
            arr.push(self.read_any()?);
        }
        Ok(PackValue::Array(arr))
    }

    /// Read a map key, which must be a string.
    pub fn read_key(&mut self) -> Result<String, MsgPackError> {
        let byte = *self.data.get(self.x).ok_or(MsgPackError::UnexpectedEof)?;
        let size = match byte {
            0xa0..=0xbf => {
                self.x += 1;
                (byte & 0x1f) as usize
            }
            0xd9 => {
                self.x += 1;
                self.u8()? as usize
            }
            0xda => {
                self.x += 1;
                self.u16()? as usize
            }
            0xdb => {
                self.x += 1;
                self.u32()? as usize
            }
            _ => return Err(MsgPackError::NotStr),
        };
        self.utf8(size)
    }
}
