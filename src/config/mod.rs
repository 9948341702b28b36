//! Конфигурация кодеков: значения по умолчанию и переменные окружения
//! с префиксом `STASHPACK_`.

pub mod settings;

pub use settings::{CodecSettings, ENV_PREFIX};
