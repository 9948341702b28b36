//! Открытые объекты (extension 127).
//!
//! Любой тип, реализующий [`Packable`], может быть закодирован как пара
//! `[packed, type_name]`. Для распаковки имя типа ищется в
//! [`ObjectRegistry`]; неизвестное имя означает, что тип был удалён или
//! переименован после записи payload'а.

use std::{any::Any, collections::HashMap, fmt, sync::Arc};

use stashpack_error::{bail, CodecError, CodecResult};

use super::{decode::Decoder, encode::Encoder};
use crate::Value;

/// Объект, умеющий представить себя в виде [`Value`].
pub trait Packable: fmt::Debug + Send + Sync + 'static {
    /// Стабильное имя типа, записываемое в payload.
    fn type_name(&self) -> &str;

    fn as_pack(&self) -> CodecResult<Value>;

    fn as_any(&self) -> &dyn Any;
}

/// Тип, который можно восстановить из упакованного представления.
pub trait FromPack: Packable + Sized {
    const TYPE_NAME: &'static str;

    fn from_pack(payload: Value) -> CodecResult<Self>;
}

pub type ObjectUnpacker = fn(Value) -> CodecResult<Arc<dyn Packable>>;

fn unpack_as<T: FromPack>(payload: Value) -> CodecResult<Arc<dyn Packable>> {
    Ok(Arc::new(T::from_pack(payload)?))
}

/// Таблица `имя типа -> распаковщик` для открытых объектов.
#[derive(Clone, Default)]
pub struct ObjectRegistry {
    unpackers: HashMap<String, ObjectUnpacker>,
}

impl ObjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Регистрирует тип. Повторная регистрация имени запрещена.
    pub fn register<T: FromPack>(&mut self) -> CodecResult<&mut Self> {
        self.register_fn(T::TYPE_NAME, unpack_as::<T>)
    }

    pub fn register_fn(
        &mut self,
        type_name: &str,
        unpacker: ObjectUnpacker,
    ) -> CodecResult<&mut Self> {
        if self.unpackers.contains_key(type_name) {
            return Err(CodecError::InvalidArgument(format!(
                "unpacker for {type_name} already defined"
            )));
        }
        self.unpackers.insert(type_name.to_string(), unpacker);
        Ok(self)
    }

    pub fn with<T: FromPack>(mut self) -> CodecResult<Self> {
        self.register::<T>()?;
        Ok(self)
    }

    pub fn contains(
        &self,
        type_name: &str,
    ) -> bool {
        self.unpackers.contains_key(type_name)
    }

    pub fn len(&self) -> usize {
        self.unpackers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.unpackers.is_empty()
    }

    fn unpacker(
        &self,
        type_name: &str,
    ) -> Option<ObjectUnpacker> {
        self.unpackers.get(type_name).copied()
    }
}

impl fmt::Debug for ObjectRegistry {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let mut names: Vec<_> = self.unpackers.keys().collect();
        names.sort();
        f.debug_struct("ObjectRegistry").field("types", &names).finish()
    }
}

pub(super) fn pack_object(
    value: &Value,
    enc: &mut Encoder<'_>,
) -> CodecResult<()> {
    let Value::Object(object) = value else {
        return Err(CodecError::pack_value(
            format!("{} is not an object", value.type_name()),
            value.type_name(),
        ));
    };

    let name = object.type_name();
    let known = enc
        .registry()
        .objects()
        .is_some_and(|objects| objects.contains(name));
    if !known {
        return Err(CodecError::pack_value(
            format!("{name} is not deserializable"),
            name,
        ));
    }

    let packed = object.as_pack()?;
    enc.write_array_len(2)?;
    enc.write(&packed)?;
    enc.write(&Value::Str(name.to_string()))
}

pub(super) fn unpack_object(dec: &mut Decoder<'_>) -> CodecResult<Value> {
    let mut pair = match dec.read()? {
        Value::Array(items) if items.len() == 2 => items,
        other => bail!(unpack, "Corrupted object payload: {}", other.type_name()),
    };
    let name_value = pair.pop().unwrap_or(Value::Nil);
    let payload = pair.pop().unwrap_or(Value::Nil);

    let Some(name) = name_value.as_str() else {
        bail!(unpack, "Corrupted object payload: type name is not a string");
    };
    let unpacker = dec
        .registry()
        .objects()
        .and_then(|objects| objects.unpacker(name))
        .ok_or_else(|| CodecError::ClassMissing(format!("missing {name} class")))?;

    Ok(Value::Object(unpacker(payload)?))
}
