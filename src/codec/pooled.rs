//! Кодек MessagePack с пулами переиспользуемых воркеров.
//!
//! Каждое направление (упаковка, распаковка) имеет свой ограниченный пул.
//! Вызов берёт воркер из пула (или создаёт новый, если пул пуст),
//! пользуется им монопольно и возвращает его через guard при любом
//! исходе, включая ошибку. Лишние воркеры при возврате отбрасываются,
//! поэтому пул никогда не превышает своей ёмкости и никогда не блокирует
//! вызывающего дольше, чем на короткую критическую секцию.

use std::{
    ops::{Deref, DerefMut},
    sync::Arc,
};

use parking_lot::{Mutex, RwLock};

use super::Coder;
use crate::{
    config::CodecSettings,
    msgpack::{decode_value, encode_into, TypeKind, TypeRegistry},
    CodecResult, Value,
};

/// Состояние, которое можно сбросить перед повторным использованием.
trait Worker: Send {
    fn reset(&mut self);
}

/// Упаковщик с переиспользуемым выходным буфером.
#[derive(Debug)]
struct EncoderWorker {
    registry: Arc<TypeRegistry>,
    buf: Vec<u8>,
}

impl EncoderWorker {
    fn new(registry: Arc<TypeRegistry>) -> Self {
        Self {
            registry,
            buf: Vec::new(),
        }
    }

    fn write(
        &mut self,
        value: &Value,
    ) -> CodecResult<()> {
        encode_into(&self.registry, value, &mut self.buf)
    }

    fn full_pack(&mut self) -> Vec<u8> {
        let out = self.buf.clone();
        self.buf.clear();
        out
    }
}

impl Worker for EncoderWorker {
    fn reset(&mut self) {
        self.buf.clear();
    }
}

/// Распаковщик с переиспользуемым входным буфером.
#[derive(Debug)]
struct DecoderWorker {
    registry: Arc<TypeRegistry>,
    buf: Vec<u8>,
}

impl DecoderWorker {
    fn new(registry: Arc<TypeRegistry>) -> Self {
        Self {
            registry,
            buf: Vec::new(),
        }
    }

    fn feed(
        &mut self,
        bytes: &[u8],
    ) {
        self.buf.extend_from_slice(bytes);
    }

    /// Декодирует ровно одно значение из накопленного буфера.
    fn full_unpack(&mut self) -> CodecResult<Value> {
        let result = decode_value(&self.registry, &self.buf);
        self.buf.clear();
        result
    }
}

impl Worker for DecoderWorker {
    fn reset(&mut self) {
        self.buf.clear();
    }
}

#[derive(Debug)]
struct PoolState<W> {
    members: Vec<W>,
    capacity: usize,
    /// Увеличивается при очистке пула; воркеры прошлых поколений не
    /// возвращаются.
    generation: u64,
}

#[derive(Debug)]
struct Pool<W> {
    name: &'static str,
    state: Mutex<PoolState<W>>,
}

impl<W: Worker> Pool<W> {
    fn new(
        name: &'static str,
        capacity: usize,
    ) -> Self {
        Self {
            name,
            state: Mutex::new(PoolState {
                members: Vec::with_capacity(capacity),
                capacity,
                generation: 0,
            }),
        }
    }

    fn checkout(
        &self,
        make: impl FnOnce() -> W,
    ) -> PoolGuard<'_, W> {
        let (member, generation) = {
            let mut state = self.state.lock();
            (state.members.pop(), state.generation)
        };
        let worker = member.unwrap_or_else(|| {
            tracing::trace!(pool = self.name, "Constructing pool worker");
            make()
        });

        PoolGuard {
            pool: self,
            worker: Some(worker),
            generation,
        }
    }

    fn checkin(
        &self,
        mut worker: W,
        generation: u64,
    ) {
        worker.reset();
        let mut state = self.state.lock();
        if state.generation == generation && state.members.len() < state.capacity {
            state.members.push(worker);
        } else {
            drop(state);
            tracing::trace!(pool = self.name, "Discarding excess pool worker");
        }
    }

    fn clear(&self) {
        let mut state = self.state.lock();
        state.members.clear();
        state.generation += 1;
    }

    fn capacity(&self) -> usize {
        self.state.lock().capacity
    }

    fn set_capacity(
        &self,
        capacity: usize,
    ) {
        let mut state = self.state.lock();
        state.capacity = capacity;
        state.members.truncate(capacity);
    }

    fn idle(&self) -> usize {
        self.state.lock().members.len()
    }
}

/// Монопольный доступ к воркеру; возвращает его в пул при drop.
struct PoolGuard<'a, W: Worker> {
    pool: &'a Pool<W>,
    worker: Option<W>,
    generation: u64,
}

impl<W: Worker> Deref for PoolGuard<'_, W> {
    type Target = W;

    fn deref(&self) -> &W {
        // заполнен от создания до drop
        self.worker.as_ref().unwrap_or_else(|| unreachable!())
    }
}

impl<W: Worker> DerefMut for PoolGuard<'_, W> {
    fn deref_mut(&mut self) -> &mut W {
        self.worker.as_mut().unwrap_or_else(|| unreachable!())
    }
}

impl<W: Worker> Drop for PoolGuard<'_, W> {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            self.pool.checkin(worker, self.generation);
        }
    }
}

/// Кодек [`Value`] <-> MessagePack, переиспользующий состояние воркеров
/// между вызовами.
#[derive(Debug)]
pub struct PooledCodec {
    registry: RwLock<Arc<TypeRegistry>>,
    encoders: Pool<EncoderWorker>,
    decoders: Pool<DecoderWorker>,
}

impl PooledCodec {
    pub fn new(
        registry: TypeRegistry,
        capacity: usize,
    ) -> Self {
        Self {
            registry: RwLock::new(Arc::new(registry)),
            encoders: Pool::new("encoders", capacity),
            decoders: Pool::new("decoders", capacity),
        }
    }

    pub fn from_settings(
        kinds: &[TypeKind],
        settings: &CodecSettings,
    ) -> CodecResult<Self> {
        let registry = TypeRegistry::builder()
            .format_version(settings.format_version)
            .max_depth(settings.max_depth)
            .kinds(kinds.iter().copied())
            .build()?;
        Ok(Self::new(registry, settings.pool_size))
    }

    pub fn registry(&self) -> Arc<TypeRegistry> {
        self.registry.read().clone()
    }

    /// Регистрирует дополнительный тип.
    ///
    /// Реестр заменяется копией с новым типом; оба пула очищаются, так как
    /// их воркеры держат старую таблицу диспетчеризации.
    pub fn register_type(
        &self,
        kind: TypeKind,
    ) -> CodecResult<()> {
        {
            let mut registry = self.registry.write();
            let next = registry.with_kind(kind)?;
            *registry = Arc::new(next);
        }
        self.encoders.clear();
        self.decoders.clear();
        tracing::debug!(kind = %kind, "Pools cleared after type registration");
        Ok(())
    }

    pub fn capacity(&self) -> usize {
        self.encoders.capacity()
    }

    /// Меняет ёмкость обоих пулов. Лишние простаивающие воркеры
    /// отбрасываются сразу, занятые отбросятся при возврате.
    pub fn set_capacity(
        &self,
        capacity: usize,
    ) {
        self.encoders.set_capacity(capacity);
        self.decoders.set_capacity(capacity);
    }

    /// Количество простаивающих воркеров `(encoders, decoders)`.
    pub fn idle_workers(&self) -> (usize, usize) {
        (self.encoders.idle(), self.decoders.idle())
    }
}

impl Coder for PooledCodec {
    type Value = Value;

    fn encode(
        &self,
        value: &Value,
    ) -> CodecResult<Vec<u8>> {
        let mut worker = self
            .encoders
            .checkout(|| EncoderWorker::new(self.registry()));
        worker.write(value)?;
        Ok(worker.full_pack())
    }

    fn decode(
        &self,
        bytes: &[u8],
    ) -> CodecResult<Value> {
        let mut worker = self
            .decoders
            .checkout(|| DecoderWorker::new(self.registry()));
        worker.feed(bytes);
        worker.full_unpack()
    }
}
