//! Структуры с дайджестом набора полей.
//!
//! Структура упаковывается в `[digest, value_1, ..., value_k]`, где
//! `digest` вычисляется по именам полей. При распаковке дайджест
//! сравнивается с текущим: добавление, удаление или переименование поля
//! даёт `VersionMismatch` вместо молчаливо перепутанных значений.
//!
//! ```ignore
//! stashpack::pack_struct! {
//!     #[derive(Debug, Clone, PartialEq)]
//!     pub struct Point { pub x: i64, pub y: i64 }
//! }
//!
//! let coder = StructCoder::<Point>::new();
//! let packed = coder.pack(&Point { x: 1, y: 2 })?;
//! ```

pub mod from_value;

use std::marker::PhantomData;

pub use from_value::FromValue;
use md5::{Digest, Md5};

use crate::{codec::ValueCoder, CodecError, CodecResult, Value};

/// Структура с фиксированным упорядоченным набором полей.
pub trait PackStruct: Sized {
    const NAME: &'static str;
    const MEMBERS: &'static [&'static str];
    /// Значения сопоставляются с полями по имени: лишние значения
    /// отбрасываются вместо ошибки.
    const KEYWORD_INIT: bool = false;

    /// Значения полей в порядке [`MEMBERS`](Self::MEMBERS).
    fn values(&self) -> Vec<Value>;

    fn from_values(values: StructValues) -> CodecResult<Self>;
}

/// Распакованные значения полей, извлекаемые по имени.
#[derive(Debug)]
pub struct StructValues {
    members: &'static [&'static str],
    values: Vec<Option<Value>>,
}

impl StructValues {
    pub fn new<T: PackStruct>(mut values: Vec<Value>) -> CodecResult<Self> {
        if values.len() > T::MEMBERS.len() {
            if !T::KEYWORD_INIT {
                return Err(CodecError::unpack(format!(
                    "{} struct size differs: {} values for {} members",
                    T::NAME,
                    values.len(),
                    T::MEMBERS.len()
                )));
            }
            values.truncate(T::MEMBERS.len());
        }

        Ok(Self {
            members: T::MEMBERS,
            values: values.into_iter().map(Some).collect(),
        })
    }

    /// Забирает значение поля; отсутствующее значение читается как `Nil`.
    pub fn take<T: FromValue>(
        &mut self,
        member: &str,
    ) -> CodecResult<T> {
        let index = self
            .members
            .iter()
            .position(|m| *m == member)
            .ok_or_else(|| CodecError::unpack(format!("unknown struct member {member}")))?;
        let value = self
            .values
            .get_mut(index)
            .and_then(Option::take)
            .unwrap_or(Value::Nil);
        T::from_value(value).map_err(|e| CodecError::unpack(format!("{member}: {e}")))
    }
}

/// MD5 от имён полей через запятую, первые два байта как little-endian i16.
pub fn digest(members: &[&str]) -> i32 {
    let digest = Md5::digest(members.join(",").as_bytes());
    i16::from_le_bytes([digest[0], digest[1]]) as i32
}

pub fn pack_digest<T: PackStruct>() -> i32 {
    digest(T::MEMBERS)
}

/// `[digest, values...]`
pub fn as_pack<T: PackStruct>(item: &T) -> Value {
    let mut packed = Vec::with_capacity(T::MEMBERS.len() + 1);
    packed.push(Value::from(pack_digest::<T>()));
    packed.extend(item.values());
    Value::Array(packed)
}

pub fn from_pack<T: PackStruct>(packed: Value) -> CodecResult<T> {
    let Some(mut parts) = packed.into_array() else {
        return Err(CodecError::unpack(format!("{} payload must be an array", T::NAME)));
    };
    if parts.is_empty() {
        return Err(CodecError::unpack(format!("{} payload is empty", T::NAME)));
    }

    let digest = parts.remove(0);
    if digest.as_i64() != Some(pack_digest::<T>() as i64) {
        return Err(CodecError::VersionMismatch(format!(
            "{} digests do not match",
            T::NAME
        )));
    }

    T::from_values(StructValues::new::<T>(parts)?)
}

/// [`ValueCoder`] для структур с дайджестом.
pub struct StructCoder<T>(PhantomData<fn() -> T>);

impl<T> StructCoder<T> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for StructCoder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for StructCoder<T> {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.write_str("StructCoder")
    }
}

impl<T: PackStruct> ValueCoder for StructCoder<T> {
    type Item = T;

    fn pack(
        &self,
        item: &T,
    ) -> CodecResult<Value> {
        Ok(as_pack(item))
    }

    fn unpack(
        &self,
        value: Value,
    ) -> CodecResult<T> {
        from_pack(value)
    }
}

/// Объявляет структуру вместе с [`PackStruct`], `Packable` и `FromPack`.
///
/// Префикс `keyword_init;` включает сопоставление значений по именам.
/// Для `Packable` структуре нужен `Debug`, типы полей должны реализовывать
/// `Clone`, `Into<Value>` и [`FromValue`].
#[macro_export]
macro_rules! pack_struct {
    (keyword_init; $($rest:tt)*) => {
        $crate::pack_struct!(@impl true; $($rest)*);
    };
    (
        @impl $kw:literal;
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $($fvis:vis $field:ident : $ty:ty),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $($fvis $field: $ty),*
        }

        impl $crate::structs::PackStruct for $name {
            const NAME: &'static str = stringify!($name);
            const MEMBERS: &'static [&'static str] = &[$(stringify!($field)),*];
            const KEYWORD_INIT: bool = $kw;

            fn values(&self) -> Vec<$crate::Value> {
                vec![$($crate::Value::from(::std::clone::Clone::clone(&self.$field))),*]
            }

            #[allow(unused_mut, unused_variables)]
            fn from_values(
                mut values: $crate::structs::StructValues,
            ) -> $crate::CodecResult<Self> {
                Ok(Self {
                    $($field: values.take::<$ty>(stringify!($field))?),*
                })
            }
        }

        impl $crate::msgpack::Packable for $name {
            fn type_name(&self) -> &str {
                <Self as $crate::structs::PackStruct>::NAME
            }

            fn as_pack(&self) -> $crate::CodecResult<$crate::Value> {
                Ok($crate::structs::as_pack(self))
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }
        }

        impl $crate::msgpack::FromPack for $name {
            const TYPE_NAME: &'static str = stringify!($name);

            fn from_pack(payload: $crate::Value) -> $crate::CodecResult<Self> {
                $crate::structs::from_pack(payload)
            }
        }
    };
    ($($rest:tt)*) => {
        $crate::pack_struct!(@impl false; $($rest)*);
    };
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
