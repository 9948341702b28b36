//! Перевод ошибок сторонних кодеров в таксономию [`CodecError`].

use std::{error::Error, fmt, marker::PhantomData};

use serde::{de::DeserializeOwned, Serialize};

use super::Coder;
use crate::{CodecError, CodecResult};

/// Кодер с собственными типами ошибок (serde-форматы, сторонние
/// библиотеки).
pub trait ForeignCoder: Send + Sync {
    type Value;
    type DumpError: Error + 'static;
    type LoadError: Error + 'static;

    fn dump(
        &self,
        value: &Self::Value,
    ) -> Result<Vec<u8>, Self::DumpError>;

    fn load(
        &self,
        bytes: &[u8],
    ) -> Result<Self::Value, Self::LoadError>;
}

/// Ошибка, уже принадлежащая таксономии, проходит без изменений.
fn passthrough(err: &(dyn Error + 'static)) -> Option<CodecError> {
    err.downcast_ref::<CodecError>().cloned()
}

/// Оборачивает [`ForeignCoder`]: ошибки записи становятся `PackError`,
/// ошибки чтения `UnpackError`.
#[derive(Debug, Clone, Default)]
pub struct TranslateErrors<F> {
    inner: F,
}

impl<F> TranslateErrors<F> {
    pub fn new(inner: F) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> F {
        self.inner
    }
}

impl<F: ForeignCoder> Coder for TranslateErrors<F> {
    type Value = F::Value;

    fn encode(
        &self,
        value: &F::Value,
    ) -> CodecResult<Vec<u8>> {
        self.inner
            .dump(value)
            .map_err(|e| passthrough(&e).unwrap_or_else(|| CodecError::pack(e.to_string())))
    }

    fn decode(
        &self,
        bytes: &[u8],
    ) -> CodecResult<F::Value> {
        self.inner
            .load(bytes)
            .map_err(|e| passthrough(&e).unwrap_or_else(|| CodecError::unpack(e.to_string())))
    }
}

/// JSON через `serde_json`.
pub struct SerdeJson<T>(PhantomData<fn() -> T>);

impl<T> SerdeJson<T> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for SerdeJson<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for SerdeJson<T> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "SerdeJson<{}>", std::any::type_name::<T>())
    }
}

impl<T: Serialize + DeserializeOwned> ForeignCoder for SerdeJson<T> {
    type Value = T;
    type DumpError = serde_json::Error;
    type LoadError = serde_json::Error;

    fn dump(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(value)
    }

    fn load(
        &self,
        bytes: &[u8],
    ) -> Result<T, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

/// MessagePack через `rmp-serde` (структуры как map с именами полей).
pub struct SerdeMsgPack<T>(PhantomData<fn() -> T>);

impl<T> SerdeMsgPack<T> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for SerdeMsgPack<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for SerdeMsgPack<T> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "SerdeMsgPack<{}>", std::any::type_name::<T>())
    }
}

impl<T: Serialize + DeserializeOwned> ForeignCoder for SerdeMsgPack<T> {
    type Value = T;
    type DumpError = rmp_serde::encode::Error;
    type LoadError = rmp_serde::decode::Error;

    fn dump(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, rmp_serde::encode::Error> {
        rmp_serde::to_vec_named(value)
    }

    fn load(
        &self,
        bytes: &[u8],
    ) -> Result<T, rmp_serde::decode::Error> {
        rmp_serde::from_slice(bytes)
    }
}
