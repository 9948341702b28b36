use std::sync::Arc;

use super::{pooled::PooledCodec, Coder};
use crate::{
    config::CodecSettings,
    msgpack::{decode_value, encode_value, ObjectRegistry, TypeKind, TypeRegistry},
    CodecResult, Value,
};

/// Параметры сборки кодека.
#[derive(Debug, Clone)]
pub struct CodecOptions {
    pub format_version: u8,
    /// Таблица открытых объектов; `Some` включает extension 127.
    pub open_objects: Option<ObjectRegistry>,
    pub max_depth: usize,
}

impl Default for CodecOptions {
    fn default() -> Self {
        Self {
            format_version: 0,
            open_objects: None,
            max_depth: crate::msgpack::DEFAULT_MAX_DEPTH,
        }
    }
}

impl CodecOptions {
    pub fn from_settings(settings: &CodecSettings) -> Self {
        Self {
            format_version: settings.format_version,
            open_objects: None,
            max_depth: settings.max_depth,
        }
    }

    pub fn format_version(
        mut self,
        version: u8,
    ) -> Self {
        self.format_version = version;
        self
    }

    pub fn open_objects(
        mut self,
        objects: ObjectRegistry,
    ) -> Self {
        self.open_objects = Some(objects);
        self
    }

    pub fn max_depth(
        mut self,
        depth: usize,
    ) -> Self {
        self.max_depth = depth;
        self
    }

    fn registry(
        self,
        kinds: &[TypeKind],
    ) -> CodecResult<TypeRegistry> {
        let mut builder = TypeRegistry::builder()
            .format_version(self.format_version)
            .max_depth(self.max_depth)
            .kinds(kinds.iter().copied());
        if let Some(objects) = self.open_objects {
            builder = builder.open_objects(objects);
        }
        builder.build()
    }
}

/// Сборка кодеков MessagePack с заданным набором типов.
pub struct CodecFactory;

impl CodecFactory {
    pub fn build(
        kinds: &[TypeKind],
        options: CodecOptions,
    ) -> CodecResult<MessagePackCodec> {
        Ok(MessagePackCodec::new(Arc::new(options.registry(kinds)?)))
    }

    /// Как [`build`](Self::build), но с пулами переиспользуемых воркеров.
    pub fn build_pooled(
        kinds: &[TypeKind],
        options: CodecOptions,
        pool_size: usize,
    ) -> CodecResult<PooledCodec> {
        Ok(PooledCodec::new(options.registry(kinds)?, pool_size))
    }

    pub fn from_settings(
        kinds: &[TypeKind],
        settings: &CodecSettings,
    ) -> CodecResult<MessagePackCodec> {
        Self::build(kinds, CodecOptions::from_settings(settings))
    }
}

/// Кодек [`Value`] <-> MessagePack поверх неизменяемого реестра типов.
#[derive(Debug, Clone)]
pub struct MessagePackCodec {
    registry: Arc<TypeRegistry>,
}

impl MessagePackCodec {
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }
}

impl Default for MessagePackCodec {
    fn default() -> Self {
        Self::new(Arc::new(TypeRegistry::default()))
    }
}

impl Coder for MessagePackCodec {
    type Value = Value;

    fn encode(
        &self,
        value: &Value,
    ) -> CodecResult<Vec<u8>> {
        encode_value(&self.registry, value)
    }

    fn decode(
        &self,
        bytes: &[u8],
    ) -> CodecResult<Value> {
        decode_value(&self.registry, bytes)
    }
}
