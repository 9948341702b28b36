use byteorder::{BigEndian, ByteOrder};
use rmp::Marker;
use stashpack_error::{bail, CodecError, CodecResult};

use super::{registry::TypeRegistry, types::UnpackFn};
use crate::Value;

/// Декодер MessagePack в [`Value`] поверх среза байтов.
pub struct Decoder<'a> {
    registry: &'a TypeRegistry,
    input: &'a [u8],
    pos: usize,
    depth: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(
        registry: &'a TypeRegistry,
        input: &'a [u8],
    ) -> Self {
        Self {
            registry,
            input,
            pos: 0,
            depth: 0,
        }
    }

    pub fn registry(&self) -> &TypeRegistry {
        self.registry
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Проверяет, что вход прочитан до конца.
    pub fn finish(&self) -> CodecResult<()> {
        if !self.is_empty() {
            bail!(
                unpack,
                "{} extra bytes after the deserialized object",
                self.input.len() - self.pos
            );
        }
        Ok(())
    }

    /// Читает целое, которое должно влезать в `i64`.
    pub fn read_i64(
        &mut self,
        what: &str,
    ) -> CodecResult<i64> {
        let value = self.read()?;
        value.as_i64().ok_or_else(|| {
            CodecError::unpack(format!("{what}: expected integer, got {}", value.type_name()))
        })
    }

    /// Читает одно значение целиком.
    pub fn read(&mut self) -> CodecResult<Value> {
        let byte = self.take_u8()?;

        let value = match Marker::from_u8(byte) {
            Marker::Null => Value::Nil,
            Marker::True => Value::Bool(true),
            Marker::False => Value::Bool(false),
            Marker::FixPos(n) => Value::Int(n as i64),
            Marker::FixNeg(n) => Value::Int(n as i64),
            Marker::U8 => Value::Int(self.take_u8()? as i64),
            Marker::U16 => Value::Int(BigEndian::read_u16(self.take(2)?) as i64),
            Marker::U32 => Value::Int(BigEndian::read_u32(self.take(4)?) as i64),
            Marker::U64 => Value::integer(BigEndian::read_u64(self.take(8)?) as i128),
            Marker::I8 => Value::Int(self.take_u8()? as i8 as i64),
            Marker::I16 => Value::Int(BigEndian::read_i16(self.take(2)?) as i64),
            Marker::I32 => Value::Int(BigEndian::read_i32(self.take(4)?) as i64),
            Marker::I64 => Value::Int(BigEndian::read_i64(self.take(8)?)),
            Marker::F32 => Value::Float(BigEndian::read_f32(self.take(4)?) as f64),
            Marker::F64 => Value::Float(BigEndian::read_f64(self.take(8)?)),
            Marker::FixStr(len) => self.read_str(len as usize)?,
            Marker::Str8 => {
                let len = self.take_u8()? as usize;
                self.read_str(len)?
            }
            Marker::Str16 => {
                let len = self.take_len16()?;
                self.read_str(len)?
            }
            Marker::Str32 => {
                let len = self.take_len32()?;
                self.read_str(len)?
            }
            Marker::Bin8 => {
                let len = self.take_u8()? as usize;
                Value::Bin(self.take(len)?.to_vec())
            }
            Marker::Bin16 => {
                let len = self.take_len16()?;
                Value::Bin(self.take(len)?.to_vec())
            }
            Marker::Bin32 => {
                let len = self.take_len32()?;
                Value::Bin(self.take(len)?.to_vec())
            }
            Marker::FixArray(len) => self.read_array(len as usize)?,
            Marker::Array16 => {
                let len = self.take_len16()?;
                self.read_array(len)?
            }
            Marker::Array32 => {
                let len = self.take_len32()?;
                self.read_array(len)?
            }
            Marker::FixMap(len) => self.read_map(len as usize)?,
            Marker::Map16 => {
                let len = self.take_len16()?;
                self.read_map(len)?
            }
            Marker::Map32 => {
                let len = self.take_len32()?;
                self.read_map(len)?
            }
            Marker::FixExt1 => self.read_ext(1)?,
            Marker::FixExt2 => self.read_ext(2)?,
            Marker::FixExt4 => self.read_ext(4)?,
            Marker::FixExt8 => self.read_ext(8)?,
            Marker::FixExt16 => self.read_ext(16)?,
            Marker::Ext8 => {
                let len = self.take_u8()? as usize;
                self.read_ext(len)?
            }
            Marker::Ext16 => {
                let len = self.take_len16()?;
                self.read_ext(len)?
            }
            Marker::Ext32 => {
                let len = self.take_len32()?;
                self.read_ext(len)?
            }
            Marker::Reserved => bail!(unpack, "invalid byte 0x{byte:02X}"),
        };
        Ok(value)
    }

    fn read_str(
        &mut self,
        len: usize,
    ) -> CodecResult<Value> {
        let bytes = self.take(len)?;
        Ok(match std::str::from_utf8(bytes) {
            Ok(s) => Value::Str(s.to_string()),
            Err(_) => Value::Bin(bytes.to_vec()),
        })
    }

    fn read_array(
        &mut self,
        len: usize,
    ) -> CodecResult<Value> {
        self.enter()?;
        // каждый элемент занимает минимум байт
        let mut items = Vec::with_capacity(len.min(self.remaining()));
        for _ in 0..len {
            items.push(self.read()?);
        }
        self.leave();
        Ok(Value::Array(items))
    }

    fn read_map(
        &mut self,
        len: usize,
    ) -> CodecResult<Value> {
        self.enter()?;
        let mut pairs = Vec::with_capacity(len.min(self.remaining() / 2));
        for _ in 0..len {
            let key = self.read()?;
            let value = self.read()?;
            pairs.push((key, value));
        }
        self.leave();
        Ok(Value::Map(pairs))
    }

    fn read_ext(
        &mut self,
        len: usize,
    ) -> CodecResult<Value> {
        let code = self.take_u8()? as i8;
        let payload = self.take(len)?;

        let Some(desc) = self.registry.unpacker(code) else {
            bail!(unpack, "unknown extension type {code}");
        };

        match desc.unpack {
            UnpackFn::Flat(unpack) => unpack(payload),
            UnpackFn::Recursive(unpack) => {
                self.enter()?;
                let mut inner = Decoder {
                    registry: self.registry,
                    input: payload,
                    pos: 0,
                    depth: self.depth,
                };
                let value = unpack(&mut inner)?;
                inner.finish()?;
                self.leave();
                Ok(value)
            }
        }
    }

    fn enter(&mut self) -> CodecResult<()> {
        self.depth += 1;
        if self.depth > self.registry.max_depth() {
            bail!(unpack, "nesting deeper than {} levels", self.registry.max_depth());
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn remaining(&self) -> usize {
        self.input.len().saturating_sub(self.pos)
    }

    fn take(
        &mut self,
        n: usize,
    ) -> CodecResult<&'a [u8]> {
        if self.remaining() < n {
            bail!(
                unpack,
                "unexpected end of input: need {n} bytes at offset {}, have {}",
                self.pos,
                self.remaining()
            );
        }
        let slice = &self.input[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn take_u8(&mut self) -> CodecResult<u8> {
        Ok(self.take(1)?[0])
    }

    fn take_len16(&mut self) -> CodecResult<usize> {
        Ok(BigEndian::read_u16(self.take(2)?) as usize)
    }

    fn take_len32(&mut self) -> CodecResult<usize> {
        Ok(BigEndian::read_u32(self.take(4)?) as usize)
    }
}

/// Декодирует ровно одно значение; лишние байты после него считаются
/// ошибкой.
pub fn decode_value(
    registry: &TypeRegistry,
    bytes: &[u8],
) -> CodecResult<Value> {
    let mut dec = Decoder::new(registry, bytes);
    let value = dec.read()?;
    dec.finish()?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::msgpack::{encode_value, TypeKind};

    #[test]
    fn test_malformed_payload_is_unpack_error() {
        let registry = TypeRegistry::default();
        assert!(decode_value(&registry, b"\x00\x00").unwrap_err().is_unpack());
        assert!(decode_value(&registry, b"").unwrap_err().is_unpack());
        assert!(decode_value(&registry, b"\xA5ab").unwrap_err().is_unpack());
        assert!(decode_value(&registry, b"\xC1").unwrap_err().is_unpack());
    }

    #[test]
    fn test_unknown_extension() {
        let registry = TypeRegistry::default();
        let err = decode_value(&registry, b"\xD4\x00a").unwrap_err();
        assert_eq!(err.to_string(), "unknown extension type 0");
    }

    #[test]
    fn test_nested_set() {
        let registry = TypeRegistry::builder().kind(TypeKind::Set).build().unwrap();
        let value = Value::Set(vec![
            1.into(),
            2.into(),
            Value::Array(vec![3.into(), 4.into(), Value::Set(vec![5.into()])]),
        ]);
        let bytes = encode_value(&registry, &value).unwrap();
        assert_eq!(bytes, b"\xC7\x0A\x09\x93\x01\x02\x93\x03\x04\xD5\x09\x91\x05".to_vec());
        assert_eq!(decode_value(&registry, &bytes).unwrap(), value);
    }

    #[test]
    fn test_u64_above_i64_range() {
        let registry = TypeRegistry::default();
        let bytes = encode_value(&registry, &Value::UInt(u64::MAX)).unwrap();
        assert!(matches!(decode_value(&registry, &bytes).unwrap(), Value::UInt(u64::MAX)));
    }

    #[test]
    fn test_depth_limit_on_decode() {
        let registry = TypeRegistry::builder().max_depth(2).build().unwrap();
        // [[[nil]]]
        assert!(decode_value(&registry, b"\x91\x91\x91\xC0").unwrap_err().is_unpack());
        assert!(decode_value(&registry, b"\x91\x91\xC0").is_ok());
    }
}
