use config::{Config, ConfigError, Environment};
use serde::{Deserialize, Serialize};

use crate::msgpack::DEFAULT_MAX_DEPTH;

/// Префикс переменных окружения: `STASHPACK_FORMAT_VERSION`, `STASHPACK_POOL_SIZE`...
pub const ENV_PREFIX: &str = "STASHPACK";

/// Параметры кодеков.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecSettings {
    /// Поколение wire-форматов date/time/zoned-типов.
    pub format_version: u8,
    /// Ёмкость пулов кодировщиков и декодировщиков.
    pub pool_size: usize,
    /// Минимальный размер payload'а (байт) для сжатия.
    pub compress_threshold: usize,
    pub max_depth: usize,
    /// Версия для payload'ов без заголовка в `CommentPrefixVersion`.
    pub legacy_comment_version: u8,
}

impl Default for CodecSettings {
    fn default() -> Self {
        Self {
            format_version: 0,
            pool_size: 4,
            compress_threshold: 1024,
            max_depth: DEFAULT_MAX_DEPTH,
            legacy_comment_version: 0,
        }
    }
}

impl CodecSettings {
    /// Значения по умолчанию, переопределённые переменными окружения.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
    }

    pub fn load_with(env: Environment) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let cfg = Config::builder()
            // Добавляем значения по умолчанию
            .set_default("format_version", defaults.format_version as u64)?
            .set_default("pool_size", defaults.pool_size as u64)?
            .set_default("compress_threshold", defaults.compress_threshold as u64)?
            .set_default("max_depth", defaults.max_depth as u64)?
            .set_default("legacy_comment_version", defaults.legacy_comment_version as u64)?
            .add_source(env)
            .build()?;

        cfg.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, env};

    use super::*;

    #[test]
    #[serial_test::serial]
    fn test_defaults() {
        let settings = CodecSettings::load_with(
            Environment::with_prefix(ENV_PREFIX).source(Some(HashMap::new())),
        )
        .unwrap();
        assert_eq!(settings, CodecSettings::default());
        assert_eq!(settings.pool_size, 4);
        assert_eq!(settings.compress_threshold, 1024);
    }

    #[test]
    #[serial_test::serial]
    fn test_env_overrides() {
        env::set_var("STASHPACK_FORMAT_VERSION", "1");
        env::set_var("STASHPACK_POOL_SIZE", "16");
        let settings = CodecSettings::load();
        env::remove_var("STASHPACK_FORMAT_VERSION");
        env::remove_var("STASHPACK_POOL_SIZE");

        let settings = settings.unwrap();
        assert_eq!(settings.format_version, 1);
        assert_eq!(settings.pool_size, 16);
        assert_eq!(settings.max_depth, DEFAULT_MAX_DEPTH);
    }

    #[test]
    #[serial_test::serial]
    fn test_explicit_source() {
        let mut vars = HashMap::new();
        vars.insert("STASHPACK_LEGACY_COMMENT_VERSION".to_string(), "3".to_string());
        let settings = CodecSettings::load_with(
            Environment::with_prefix(ENV_PREFIX)
                .try_parsing(true)
                .source(Some(vars)),
        )
        .unwrap();
        assert_eq!(settings.legacy_comment_version, 3);
    }
}
