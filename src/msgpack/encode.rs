use std::fmt::Debug;

use rmp::encode as wr;
use stashpack_error::{CodecError, CodecResult};

use super::{
    registry::TypeRegistry,
    types::{PackFn, TypeKind},
};
use crate::Value;

/// Переводит ошибку записи `rmp` в `PackError`.
fn io<T, E: Debug>(res: Result<T, E>) -> CodecResult<T> {
    res.map_err(|e| CodecError::pack(format!("{e:?}")))
}

/// Потоковый энкодер [`Value`] в MessagePack поверх внешнего буфера.
///
/// Рекурсивные extension-типы получают вложенный энкодер над отдельным
/// буфером: длина payload'а extension'а записывается до самого payload'а.
pub struct Encoder<'a> {
    registry: &'a TypeRegistry,
    out: &'a mut Vec<u8>,
    depth: usize,
}

impl<'a> Encoder<'a> {
    pub fn new(
        registry: &'a TypeRegistry,
        out: &'a mut Vec<u8>,
    ) -> Self {
        Self {
            registry,
            out,
            depth: 0,
        }
    }

    pub fn registry(&self) -> &TypeRegistry {
        self.registry
    }

    /// Записывает одно значение целиком.
    pub fn write(
        &mut self,
        value: &Value,
    ) -> CodecResult<()> {
        match value {
            Value::Nil => io(wr::write_nil(self.out)),
            Value::Bool(b) => io(wr::write_bool(self.out, *b)),
            Value::Int(i) => io(wr::write_sint(self.out, *i)).map(drop),
            Value::UInt(u) => io(wr::write_uint(self.out, *u)).map(drop),
            Value::BigInt(n) => self.write_int(*n),
            Value::Float(f) => io(wr::write_f64(self.out, *f)),
            Value::Str(s) | Value::Ascii(s) => io(wr::write_str(self.out, s)),
            Value::Bin(b) => io(wr::write_bin(self.out, b)),
            Value::Array(items) => self.write_array(items),
            Value::Map(pairs) => self.write_map(pairs),
            other => self.write_ext(other),
        }
    }

    /// Целое любого размера: нативно, если влезает в 64 бита, иначе через
    /// extension `BigInt` (если он зарегистрирован).
    pub fn write_int(
        &mut self,
        n: i128,
    ) -> CodecResult<()> {
        if let Ok(i) = i64::try_from(n) {
            return io(wr::write_sint(self.out, i)).map(drop);
        }
        if let Ok(u) = u64::try_from(n) {
            return io(wr::write_uint(self.out, u)).map(drop);
        }
        if !self.registry.has_kind(TypeKind::BigInt) {
            return Err(CodecError::pack_value(
                format!("integer {n} too big to pack without the Integer extension"),
                "Integer",
            ));
        }
        self.write_ext(&Value::BigInt(n))
    }

    pub fn write_array_len(
        &mut self,
        len: usize,
    ) -> CodecResult<()> {
        let len = u32::try_from(len).map_err(|_| CodecError::pack("array too long"))?;
        io(wr::write_array_len(self.out, len)).map(drop)
    }

    pub fn write_array(
        &mut self,
        items: &[Value],
    ) -> CodecResult<()> {
        self.write_array_len(items.len())?;
        self.enter()?;
        for item in items {
            self.write(item)?;
        }
        self.leave();
        Ok(())
    }

    pub fn write_map(
        &mut self,
        pairs: &[(Value, Value)],
    ) -> CodecResult<()> {
        let len = u32::try_from(pairs.len()).map_err(|_| CodecError::pack("map too long"))?;
        io(wr::write_map_len(self.out, len))?;
        self.enter()?;
        for (key, value) in pairs {
            self.write(key)?;
            self.write(value)?;
        }
        self.leave();
        Ok(())
    }

    fn write_ext(
        &mut self,
        value: &Value,
    ) -> CodecResult<()> {
        let Some(kind) = value.kind() else {
            return Err(CodecError::pack_value(
                format!("{} is not registered", value.type_name()),
                value.type_name(),
            ));
        };
        let Some(desc) = self.registry.packer(kind) else {
            return Err(CodecError::pack_value(
                format!("undefined packer for {}", value.type_name()),
                value.type_name(),
            ));
        };

        let payload = match desc.pack {
            PackFn::Flat(pack) => pack(value)?,
            PackFn::Recursive(pack) => {
                self.enter()?;
                let mut nested = Vec::new();
                let mut inner = Encoder {
                    registry: self.registry,
                    out: &mut nested,
                    depth: self.depth,
                };
                pack(value, &mut inner)?;
                self.leave();
                nested
            }
        };

        let len = u32::try_from(payload.len())
            .map_err(|_| CodecError::pack("extension payload too long"))?;
        io(wr::write_ext_meta(self.out, len, desc.code))?;
        self.out.extend_from_slice(&payload);
        Ok(())
    }

    fn enter(&mut self) -> CodecResult<()> {
        self.depth += 1;
        if self.depth > self.registry.max_depth() {
            return Err(CodecError::pack(format!(
                "nesting deeper than {} levels",
                self.registry.max_depth()
            )));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }
}

/// Кодирует значение в новый буфер.
pub fn encode_value(
    registry: &TypeRegistry,
    value: &Value,
) -> CodecResult<Vec<u8>> {
    let mut out = Vec::new();
    encode_into(registry, value, &mut out)?;
    Ok(out)
}

/// Кодирует значение в конец существующего буфера.
pub fn encode_into(
    registry: &TypeRegistry,
    value: &Value,
    out: &mut Vec<u8>,
) -> CodecResult<()> {
    Encoder::new(registry, out).write(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain() -> TypeRegistry {
        TypeRegistry::default()
    }

    #[test]
    fn test_scalars() {
        let r = plain();
        assert_eq!(encode_value(&r, &Value::Nil).unwrap(), vec![0xC0]);
        assert_eq!(encode_value(&r, &Value::Bool(true)).unwrap(), vec![0xC3]);
        assert_eq!(encode_value(&r, &Value::Int(1)).unwrap(), vec![0x01]);
        assert_eq!(encode_value(&r, &Value::Int(-1)).unwrap(), vec![0xFF]);
        assert_eq!(encode_value(&r, &Value::Int(2000)).unwrap(), vec![0xCD, 0x07, 0xD0]);
        assert_eq!(
            encode_value(&r, &Value::from("foo")).unwrap(),
            vec![0xA3, b'f', b'o', b'o']
        );
        assert_eq!(
            encode_value(&r, &Value::Bin(b"foo".to_vec())).unwrap(),
            vec![0xC4, 0x03, b'f', b'o', b'o']
        );
    }

    #[test]
    fn test_unregistered_type_names_receiver() {
        let err = encode_value(&plain(), &Value::Symbol("a".into())).unwrap_err();
        assert!(err.is_pack());
        assert_eq!(err.receiver(), Some("Symbol"));
    }

    #[test]
    fn test_bigint_without_extension_is_pack_error() {
        let err = encode_value(&plain(), &Value::BigInt(i128::MAX)).unwrap_err();
        assert!(err.is_pack());
        assert_eq!(err.receiver(), Some("Integer"));

        // значения в пределах u64 пишутся нативно
        let bytes = encode_value(&plain(), &Value::BigInt(u64::MAX as i128)).unwrap();
        assert_eq!(bytes[0], 0xCF);
    }

    #[test]
    fn test_depth_limit() {
        let registry = TypeRegistry::builder().max_depth(3).build().unwrap();
        let mut value = Value::Nil;
        for _ in 0..4 {
            value = Value::Array(vec![value]);
        }
        assert!(encode_value(&registry, &value).unwrap_err().is_pack());

        let shallow = Value::Array(vec![Value::Array(vec![Value::Nil])]);
        assert!(encode_value(&registry, &shallow).is_ok());
    }
}
