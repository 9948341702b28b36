//! Модель значений в памяти, общая для всех кодеков крейта.
//!
//! `Value` повторяет то, что MessagePack переносит сам (nil, булевы,
//! целые, числа с плавающей точкой, текст, бинарные данные, массивы,
//! словари), и добавляет типы, которым нужен зарегистрированный
//! дескриптор extension: символы, время, даты, decimal, множества, время
//! с зоной, целые шире 64 бит и открытые объекты.

mod zoned;

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate};
use rust_decimal::Decimal;

pub use zoned::ZonedTime;

use crate::msgpack::{Packable, TypeKind};

/// Кодировка текста у трёх текстовых вариантов.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextEncoding {
    Utf8,
    Binary,
    Ascii,
}

/// Значение в памяти, готовое к кодированию.
#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    /// Знаковое 64-битное целое.
    Int(i64),
    /// Беззнаковое целое больше `i64::MAX`.
    UInt(u64),
    /// Целое вне 64-битного диапазона. Кодируется только при
    /// зарегистрированном дескрипторе `BigInt`.
    BigInt(i128),
    Float(f64),
    /// Текст в UTF-8.
    Str(String),
    /// Текст с меткой US-ASCII.
    Ascii(String),
    /// Бинарный текст (сырые байты).
    Bin(Vec<u8>),
    Array(Vec<Value>),
    /// Словарь с сохранённым порядком вставки.
    Map(Vec<(Value, Value)>),
    Symbol(String),
    /// Момент времени со смещением от UTC.
    Time(DateTime<FixedOffset>),
    /// Календарные дата и время со смещением в долях суток.
    DateTime(DateTime<FixedOffset>),
    Date(NaiveDate),
    Decimal(Decimal),
    Set(Vec<Value>),
    ZonedTime(ZonedTime),
    /// Произвольный объект, идущий через extension открытых объектов.
    Object(Arc<dyn Packable>),
}

impl Value {
    /// Самый узкий целочисленный вариант, вмещающий `n`.
    pub fn integer(n: i128) -> Value {
        if let Ok(i) = i64::try_from(n) {
            Value::Int(i)
        } else if let Ok(u) = u64::try_from(n) {
            Value::UInt(u)
        } else {
            Value::BigInt(n)
        }
    }

    /// Имя типа значения для сообщений об ошибках.
    pub fn type_name(&self) -> &str {
        match self {
            Value::Nil => "Nil",
            Value::Bool(_) => "Bool",
            Value::Int(_) | Value::UInt(_) | Value::BigInt(_) => "Integer",
            Value::Float(_) => "Float",
            Value::Str(_) | Value::Ascii(_) | Value::Bin(_) => "String",
            Value::Array(_) => "Array",
            Value::Map(_) => "Map",
            Value::Symbol(_) => "Symbol",
            Value::Time(_) => "Time",
            Value::DateTime(_) => "DateTime",
            Value::Date(_) => "Date",
            Value::Decimal(_) => "Decimal",
            Value::Set(_) => "Set",
            Value::ZonedTime(_) => "ZonedTime",
            Value::Object(obj) => obj.type_name(),
        }
    }

    /// Вид extension, нужный для кодирования значения; `None` для типов,
    /// которые MessagePack кодирует сам.
    pub fn kind(&self) -> Option<TypeKind> {
        match self {
            Value::Symbol(_) => Some(TypeKind::Symbol),
            Value::Time(_) => Some(TypeKind::Time),
            Value::DateTime(_) => Some(TypeKind::DateTime),
            Value::Date(_) => Some(TypeKind::Date),
            Value::Decimal(_) => Some(TypeKind::Decimal),
            Value::Set(_) => Some(TypeKind::Set),
            Value::ZonedTime(_) => Some(TypeKind::ZonedTime),
            Value::BigInt(_) => Some(TypeKind::BigInt),
            Value::Object(_) => Some(TypeKind::Object),
            _ => None,
        }
    }

    pub fn text_encoding(&self) -> Option<TextEncoding> {
        match self {
            Value::Str(_) => Some(TextEncoding::Utf8),
            Value::Bin(_) => Some(TextEncoding::Binary),
            Value::Ascii(_) => Some(TextEncoding::Ascii),
            _ => None,
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn as_i128(&self) -> Option<i128> {
        match self {
            Value::Int(i) => Some(*i as i128),
            Value::UInt(u) => Some(*u as i128),
            Value::BigInt(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_i128().and_then(|n| i64::try_from(n).ok())
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Текст `Str`/`Ascii`, а также `Bin`, если это корректный UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) | Value::Ascii(s) | Value::Symbol(s) => Some(s),
            Value::Bin(b) => std::str::from_utf8(b).ok(),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn into_array(self) -> Option<Vec<Value>> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&[(Value, Value)]> {
        match self {
            Value::Map(pairs) => Some(pairs),
            _ => None,
        }
    }

    /// Значение словаря по текстовому ключу.
    pub fn get(
        &self,
        key: &str,
    ) -> Option<&Value> {
        self.as_map()?
            .iter()
            .find(|(k, _)| k.as_str() == Some(key))
            .map(|(_, v)| v)
    }
}

impl PartialEq for Value {
    fn eq(
        &self,
        other: &Self,
    ) -> bool {
        use Value::*;

        match (self, other) {
            (Nil, Nil) => true,
            (Bool(a), Bool(b)) => a == b,
            (Int(_) | UInt(_) | BigInt(_), Int(_) | UInt(_) | BigInt(_)) => {
                self.as_i128() == other.as_i128()
            }
            (Float(a), Float(b)) => a == b,
            // US-ASCII входит в UTF-8
            (Str(a) | Ascii(a), Str(b) | Ascii(b)) => a == b,
            (Bin(a), Bin(b)) => a == b,
            (Array(a), Array(b)) | (Set(a), Set(b)) => a == b,
            (Map(a), Map(b)) => a == b,
            (Symbol(a), Symbol(b)) => a == b,
            (Time(a), Time(b)) | (DateTime(a), DateTime(b)) => a == b,
            (Date(a), Date(b)) => a == b,
            (Decimal(a), Decimal(b)) => a == b,
            (ZonedTime(a), ZonedTime(b)) => a == b,
            (Object(a), Object(b)) => {
                a.type_name() == b.type_name() && a.as_pack().ok() == b.as_pack().ok()
            }
            _ => false,
        }
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::integer(v as i128)
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32, u64, i128);

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Array(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl From<Decimal> for Value {
    fn from(v: Decimal) -> Self {
        Value::Decimal(v)
    }
}

impl From<ZonedTime> for Value {
    fn from(v: ZonedTime) -> Self {
        Value::ZonedTime(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Nil, Into::into)
    }
}
