use chrono::{DateTime, FixedOffset, NaiveDate};
use rust_decimal::Decimal;

use crate::{CodecError, CodecResult, Value, ZonedTime};

/// Преобразование [`Value`] в тип поля структуры.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> CodecResult<Self>;
}

fn mismatch(
    expected: &str,
    got: &Value,
) -> CodecError {
    CodecError::unpack(format!("expected {expected}, got {}", got.type_name()))
}

impl FromValue for Value {
    fn from_value(value: Value) -> CodecResult<Self> {
        Ok(value)
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> CodecResult<Self> {
        match value {
            Value::Str(s) | Value::Ascii(s) | Value::Symbol(s) => Ok(s),
            Value::Bin(bytes) => {
                String::from_utf8(bytes).map_err(|e| CodecError::unpack(format!("{e}")))
            }
            other => Err(mismatch("String", &other)),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> CodecResult<Self> {
        value.as_bool().ok_or_else(|| mismatch("Boolean", &value))
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> CodecResult<Self> {
        value.as_f64().ok_or_else(|| mismatch("Float", &value))
    }
}

macro_rules! impl_from_value_int {
    ($($t:ty),*) => {
        $(
            impl FromValue for $t {
                fn from_value(value: Value) -> CodecResult<Self> {
                    value
                        .as_i128()
                        .and_then(|n| <$t>::try_from(n).ok())
                        .ok_or_else(|| mismatch(stringify!($t), &value))
                }
            }
        )*
    };
}

impl_from_value_int!(i8, i16, i32, i64, u8, u16, u32, u64, i128);

impl FromValue for NaiveDate {
    fn from_value(value: Value) -> CodecResult<Self> {
        match value {
            Value::Date(d) => Ok(d),
            other => Err(mismatch("Date", &other)),
        }
    }
}

impl FromValue for DateTime<FixedOffset> {
    fn from_value(value: Value) -> CodecResult<Self> {
        match value {
            Value::Time(t) | Value::DateTime(t) => Ok(t),
            other => Err(mismatch("Time", &other)),
        }
    }
}

impl FromValue for Decimal {
    fn from_value(value: Value) -> CodecResult<Self> {
        match value {
            Value::Decimal(d) => Ok(d),
            other => Err(mismatch("Decimal", &other)),
        }
    }
}

impl FromValue for ZonedTime {
    fn from_value(value: Value) -> CodecResult<Self> {
        match value {
            Value::ZonedTime(t) => Ok(t),
            other => Err(mismatch("ZonedTime", &other)),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> CodecResult<Self> {
        match value {
            Value::Nil => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}
