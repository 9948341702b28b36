/// Кодеки записей кэша: массив и плоская форма с префиксом метаданных.
pub mod cache_entry;
/// Трейт `Coder` и композиции: фабрика, пул, сжатие, цепочки.
pub mod codec;
/// Настройки кодеков из значений по умолчанию и переменных `STASHPACK_*`.
pub mod config;
/// Кодек графа сущностей с дедупликацией по идентичности.
pub mod entity;
/// Версионированные конверты: один байт, префикс-комментарий, обход строк.
pub mod envelope;
/// Таксономия ошибок, реэкспорт из `stashpack-error`.
pub mod error;
/// Настройка подписчика `tracing`.
pub mod logging;
/// MessagePack с зарегистрированными extension-типами.
pub mod msgpack;
/// Структуры с дайджестом формы.
pub mod structs;
/// Модель значений в памяти.
pub mod value;

// -----------------------------------------------------------------------------
//  Часто используемые публичные типы
// -----------------------------------------------------------------------------

/// Записи кэша.
pub use cache_entry::{CacheEntry, CacheEntryCoder, FlatCacheEntryCoder};
/// Кодеки.
pub use codec::{
    AllowNil, CodecFactory, CodecOptions, Coder, CoderChain, ConditionalCompressor,
    MessagePackCodec, Packed, PooledCodec, Raw, TranslateErrors, ValueCoder, Zlib, Zstd,
};
/// Конфигурация.
pub use config::CodecSettings;
/// Сущности.
pub use entity::{Entity, EntityCatalog, EntityGraphCoder, EntityRef, Link, LinkKind, RecordCodec};
/// Конверты.
pub use envelope::{CommentPrefixVersion, SingleBytePrefixVersion, StringBypassVersion, Versions};
/// Ошибки.
pub use error::{CodecError, CodecResult, ErrorExt, StatusCode};
/// Бинарный кодек.
pub use msgpack::{FromPack, ObjectRegistry, Packable, TypeKind, TypeRegistry};
/// Структуры.
pub use structs::{PackStruct, StructCoder};
/// Значения.
pub use value::{TextEncoding, Value, ZonedTime};
