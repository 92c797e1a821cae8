//! `MsgPackEncoder`: writes [`PackValue`] trees as MessagePack.
//!
//! Integers always take the smallest marker that holds them; floats are
//! always float64 so that no precision is lost on the way through.

use crate::PackValue;

#[derive(Debug, Default)]
pub struct MsgPackEncoder {
    out: Vec<u8>,
}

impl MsgPackEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode `value` and return its bytes, leaving the encoder empty.
    pub fn encode(&mut self, value: &PackValue) -> Vec<u8> {
        self.out.clear();
        self.write_any(value);
        std::mem::take(&mut self.out)
    }

    pub fn write_any(&mut self, value: &PackValue) {
        match value {
            PackValue::Null => self.write_null(),
            PackValue::Bool(b) => self.write_boolean(*b),
            PackValue::Integer(i) => self.write_integer(*i),
            PackValue::UInteger(u) => self.write_u_integer(*u),
            PackValue::Float(f) => self.write_float(*f),
            PackValue::Str(s) => self.write_str(s),
            PackValue::Array(arr) => self.write_arr(arr),
            PackValue::Object(obj) => self.write_obj_pairs(obj),
        }
    }

    pub fn write_null(&mut self) {
        self.out.push(0xc0);
    }

    pub fn write_boolean(&mut self, b: bool) {
        self.out.push(if b { 0xc3 } else { 0xc2 });
    }

    pub fn write_float(&mut self, float: f64) {
        self.out.push(0xcb);
        self.out.extend_from_slice(&float.to_be_bytes());
    }

    pub fn write_integer(&mut self, int: i64) {
        if int >= 0 {
            self.write_u_integer(int as u64);
        } else if int >= -0x20 {
            // negative fixint: 0xe0..0xff
            self.out.push(int as i8 as u8);
        } else if int >= i8::MIN as i64 {
            self.out.push(0xd0);
            self.out.push(int as i8 as u8);
        } else if int >= i16::MIN as i64 {
            self.out.push(0xd1);
            self.out.extend_from_slice(&(int as i16).to_be_bytes());
        } else if int >= i32::MIN as i64 {
            self.out.push(0xd2);
            self.out.extend_from_slice(&(int as i32).to_be_bytes());
        } else {
            self.out.push(0xd3);
            self.out.extend_from_slice(&int.to_be_bytes());
        }
    }

    pub fn write_u_integer(&mut self, uint: u64) {
        if uint <= 0x7f {
            self.out.push(uint as u8);
        } else if uint <= 0xff {
            self.out.push(0xcc);
            self.out.push(uint as u8);
        } else if uint <= 0xffff {
            self.out.push(0xcd);
            self.out.extend_from_slice(&(uint as u16).to_be_bytes());
        } else if uint <= 0xffff_ffff {
            self.out.push(0xce);
            self.out.extend_from_slice(&(uint as u32).to_be_bytes());
        } else {
            self.out.push(0xcf);
            self.out.extend_from_slice(&uint.to_be_bytes());
        }
    }

    pub fn write_str_hdr(&mut self, length: usize) {
        if length <= 0x1f {
            self.out.push(0xa0 | length as u8);
        } else if length <= 0xff {
            self.out.push(0xd9);
            self.out.push(length as u8);
        } else if length <= 0xffff {
            self.out.push(0xda);
            self.out.extend_from_slice(&(length as u16).to_be_bytes());
        } else {
            self.out.push(0xdb);
            self.out.extend_from_slice(&(length as u32).to_be_bytes());
        }
    }

    pub fn write_str(&mut self, s: &str) {
        self.write_str_hdr(s.len());
        self.out.extend_from_slice(s.as_bytes());
    }

    pub fn write_arr_hdr(&mut self, length: usize) {
        if length <= 0xf {
            self.out.push(0x90 | length as u8);
        } else if length <= 0xffff {
            self.out.push(0xdc);
            self.out.extend_from_slice(&(length as u16).to_be_bytes());
        } else {
            self.out.push(0xdd);
            self.out.extend_from_slice(&(length as u32).to_be_bytes());
        }
    }

    pub fn write_arr(&mut self, arr: &[PackValue]) {
        self.write_arr_hdr(arr.len());
        for item in arr {
            self.write_any(item);
        }
    }

    pub fn write_obj_hdr(&mut self, length: usize) {
        if length <= 0xf {
            self.out.push(0x80 | length as u8);
        } else if length <= 0xffff {
            self.out.push(0xde);
            self.out.extend_from_slice(&(length as u16).to_be_bytes());
        } else {
            self.out.push(0xdf);
            self.out.extend_from_slice(&(length as u32).to_be_bytes());
        }
    }

    pub fn write_obj_pairs(&mut self, pairs: &[(String, PackValue)]) {
        self.write_obj_hdr(pairs.len());
        for (key, val) in pairs {
            self.write_str(key);
            self.write_any(val);
        }
    }
}
