//! Кодеры: общий трейт [`Coder`] и композиции поверх него.
//!
//! Каждый компонент крейта реализует пару `encode`/`decode`. Кодеры
//! складываются друг в друга: версионный конверт оборачивает кодек
//! MessagePack, компрессор оборачивает байты конверта и т.д.

pub mod allow_nil;
pub mod chain;
pub mod compression;
pub mod conditional;
pub mod factory;
pub mod pooled;
pub mod translate;

use std::sync::Arc;

pub use allow_nil::AllowNil;
pub use chain::CoderChain;
pub use compression::{Zlib, Zstd};
pub use conditional::ConditionalCompressor;
pub use factory::{CodecFactory, CodecOptions, MessagePackCodec};
pub use pooled::PooledCodec;
pub use translate::{ForeignCoder, SerdeJson, SerdeMsgPack, TranslateErrors};

use crate::{CodecResult, Value};

/// Пара преобразований между значением в памяти и байтами.
pub trait Coder: Send + Sync {
    type Value;

    fn encode(
        &self,
        value: &Self::Value,
    ) -> CodecResult<Vec<u8>>;

    fn decode(
        &self,
        bytes: &[u8],
    ) -> CodecResult<Self::Value>;
}

/// Кодер байтов в байты (сжатие, конверты над сырыми данными).
pub type BytesCoder = dyn Coder<Value = Vec<u8>>;

impl<C: Coder + ?Sized> Coder for Box<C> {
    type Value = C::Value;

    fn encode(
        &self,
        value: &Self::Value,
    ) -> CodecResult<Vec<u8>> {
        (**self).encode(value)
    }

    fn decode(
        &self,
        bytes: &[u8],
    ) -> CodecResult<Self::Value> {
        (**self).decode(bytes)
    }
}

impl<C: Coder + ?Sized> Coder for Arc<C> {
    type Value = C::Value;

    fn encode(
        &self,
        value: &Self::Value,
    ) -> CodecResult<Vec<u8>> {
        (**self).encode(value)
    }

    fn decode(
        &self,
        bytes: &[u8],
    ) -> CodecResult<Self::Value> {
        (**self).decode(bytes)
    }
}

/// Тождественный кодер байтов.
#[derive(Debug, Clone, Copy, Default)]
pub struct Raw;

impl Coder for Raw {
    type Value = Vec<u8>;

    fn encode(
        &self,
        value: &Vec<u8>,
    ) -> CodecResult<Vec<u8>> {
        Ok(value.clone())
    }

    fn decode(
        &self,
        bytes: &[u8],
    ) -> CodecResult<Vec<u8>> {
        Ok(bytes.to_vec())
    }
}

/// Преобразование доменного типа в [`Value`] и обратно.
pub trait ValueCoder: Send + Sync {
    type Item;

    fn pack(
        &self,
        item: &Self::Item,
    ) -> CodecResult<Value>;

    fn unpack(
        &self,
        value: Value,
    ) -> CodecResult<Self::Item>;
}

/// [`ValueCoder`], за которым следует байтовый кодек значений.
#[derive(Debug, Clone)]
pub struct Packed<P, C> {
    packer: P,
    codec: C,
}

impl<P, C> Packed<P, C> {
    pub fn new(
        packer: P,
        codec: C,
    ) -> Self {
        Self { packer, codec }
    }

    pub fn packer(&self) -> &P {
        &self.packer
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }
}

impl<P, C> Coder for Packed<P, C>
where
    P: ValueCoder,
    C: Coder<Value = Value>,
{
    type Value = P::Item;

    fn encode(
        &self,
        value: &P::Item,
    ) -> CodecResult<Vec<u8>> {
        self.codec.encode(&self.packer.pack(value)?)
    }

    fn decode(
        &self,
        bytes: &[u8],
    ) -> CodecResult<P::Item> {
        self.packer.unpack(self.codec.decode(bytes)?)
    }
}
