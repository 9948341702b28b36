//! Записи кеша: значение, срок жизни и тег версии.
//!
//! [`CacheEntryCoder`] упаковывает запись в массив `[value, expires_at,
//! version]`. [`FlatCacheEntryCoder`] кладёт метаданные в фиксированный
//! 12-байтовый префикс перед значением, чтобы их можно было прочитать без
//! декодирования (возможно, большого) значения.

use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use stashpack_error::ResultExt;

use crate::{
    codec::{Coder, ValueCoder},
    CodecError, CodecResult, Value,
};

/// Запись кеша.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<V = Value> {
    pub value: V,
    /// Время истечения в секундах Unix epoch.
    pub expires_at: Option<f64>,
    pub version: Option<String>,
}

impl<V> CacheEntry<V> {
    pub fn new(value: V) -> Self {
        Self {
            value,
            expires_at: None,
            version: None,
        }
    }

    pub fn expires_at(
        mut self,
        at: f64,
    ) -> Self {
        self.expires_at = Some(at);
        self
    }

    pub fn version(
        mut self,
        version: impl Into<String>,
    ) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn is_expired(
        &self,
        now: f64,
    ) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// `[value, expires_at, version]` без завершающих `Nil`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheEntryCoder;

impl ValueCoder for CacheEntryCoder {
    type Item = CacheEntry;

    fn pack(
        &self,
        entry: &CacheEntry,
    ) -> CodecResult<Value> {
        let mut attrs = vec![
            entry.value.clone(),
            entry.expires_at.map_or(Value::Nil, Value::Float),
            entry.version.clone().map_or(Value::Nil, Value::Str),
        ];
        while attrs.last().is_some_and(Value::is_nil) {
            attrs.pop();
        }
        Ok(Value::Array(attrs))
    }

    fn unpack(
        &self,
        payload: Value,
    ) -> CodecResult<CacheEntry> {
        let Some(attrs) = payload.into_array() else {
            return Err(CodecError::unpack("cache entry payload must be an array"));
        };
        let mut attrs = attrs.into_iter();

        let value = attrs.next().unwrap_or(Value::Nil);
        let expires_at = match attrs.next() {
            None | Some(Value::Nil) => None,
            Some(Value::Float(f)) => Some(f),
            Some(other) => Some(
                other
                    .as_i64()
                    .ok_or_else(|| {
                        CodecError::unpack(format!(
                            "cache entry expiry must be a number, got {}",
                            other.type_name()
                        ))
                    })? as f64,
            ),
        };
        let version = match attrs.next() {
            None | Some(Value::Nil) => None,
            Some(other) => Some(
                other
                    .as_str()
                    .ok_or_else(|| CodecError::unpack("cache entry version must be a string"))?
                    .to_string(),
            ),
        };

        Ok(CacheEntry {
            value,
            expires_at,
            version,
        })
    }
}

const VERSION_OFFSET: usize = 12;

/// Плоский формат записи:
///
/// ```text
/// +------------------+-------------------+-----------+-------------+
/// | expires_at f64LE | version_len i32LE |  version  |    value    |
/// | 0.0 = нет        | -1 = нет          |  (байты)  | (value codec)|
/// +------------------+-------------------+-----------+-------------+
/// ```
#[derive(Debug, Clone)]
pub struct FlatCacheEntryCoder<C> {
    value_coder: C,
}

impl<C: Coder> FlatCacheEntryCoder<C> {
    pub fn new(value_coder: C) -> Self {
        Self { value_coder }
    }

    /// Читает только метаданные, не трогая значение.
    pub fn metadata(bytes: &[u8]) -> CodecResult<(Option<f64>, Option<String>, usize)> {
        if bytes.len() < VERSION_OFFSET {
            return Err(CodecError::unpack(format!(
                "cache entry prefix truncated: {} of {VERSION_OFFSET} bytes",
                bytes.len()
            )));
        }

        let mut cursor = Cursor::new(bytes);
        let expires_at = cursor
            .read_f64::<LittleEndian>()
            .or_unpack("cache entry expiry")?;
        let version_size = cursor
            .read_i32::<LittleEndian>()
            .or_unpack("cache entry version size")?;

        let expires_at = (expires_at != 0.0).then_some(expires_at);
        if version_size < 0 {
            return Ok((expires_at, None, VERSION_OFFSET));
        }

        let end = VERSION_OFFSET + version_size as usize;
        let Some(raw) = bytes.get(VERSION_OFFSET..end) else {
            return Err(CodecError::unpack(format!(
                "cache entry version truncated: expected {version_size} bytes"
            )));
        };
        let version = std::str::from_utf8(raw)
            .or_unpack("cache entry version")?
            .to_string();
        Ok((expires_at, Some(version), end))
    }
}

impl<C: Coder> Coder for FlatCacheEntryCoder<C> {
    type Value = CacheEntry<C::Value>;

    fn encode(
        &self,
        entry: &Self::Value,
    ) -> CodecResult<Vec<u8>> {
        let value = self.value_coder.encode(&entry.value)?;
        let version = entry.version.as_deref().map(str::as_bytes);
        let version_size = match version {
            Some(v) => i32::try_from(v.len()).or_pack("cache entry version too long")?,
            None => -1,
        };

        let mut out =
            Vec::with_capacity(VERSION_OFFSET + version.map_or(0, <[u8]>::len) + value.len());
        out.write_f64::<LittleEndian>(entry.expires_at.unwrap_or(0.0))
            .or_pack("cache entry expiry")?;
        out.write_i32::<LittleEndian>(version_size)
            .or_pack("cache entry version size")?;
        if let Some(version) = version {
            out.extend_from_slice(version);
        }
        out.extend_from_slice(&value);
        Ok(out)
    }

    fn decode(
        &self,
        bytes: &[u8],
    ) -> CodecResult<Self::Value> {
        let (expires_at, version, offset) = Self::metadata(bytes)?;
        Ok(CacheEntry {
            value: self.value_coder.decode(&bytes[offset..])?,
            expires_at,
            version,
        })
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
