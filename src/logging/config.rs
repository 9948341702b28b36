use std::{env, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Переменная окружения, переопределяющая уровень и директивы фильтра.
pub const LOG_ENV: &str = "STASHPACK_LOG";
/// Переменная окружения, переопределяющая формат вывода.
pub const LOG_FORMAT_ENV: &str = "STASHPACK_LOG_FORMAT";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "compact" => Ok(LogFormat::Compact),
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format: {other}")),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let name = match self {
            LogFormat::Compact => "compact",
            LogFormat::Pretty => "pretty",
            LogFormat::Json => "json",
        };
        f.write_str(name)
    }
}

/// Настройки логирования.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Базовый уровень: trace, debug, info, warn, error.
    pub level: String,
    pub format: LogFormat,
    pub with_ansi: bool,
    pub with_target: bool,
    pub with_thread_ids: bool,
    pub with_line_numbers: bool,
    /// Дополнительные директивы `EnvFilter`, например `stashpack::codec=trace`.
    pub directives: Vec<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
            with_ansi: true,
            with_target: true,
            with_thread_ids: false,
            with_line_numbers: false,
            directives: Vec::new(),
        }
    }
}

impl LoggingConfig {
    /// Формат из `STASHPACK_LOG_FORMAT`, если он задан и распознан.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(raw) = env::var(LOG_FORMAT_ENV) {
            match raw.parse() {
                Ok(format) => self.format = format,
                Err(e) => eprintln!("Ignoring {LOG_FORMAT_ENV}: {e}"),
            }
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        const LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];
        if !LEVELS.contains(&self.level.to_ascii_lowercase().as_str()) {
            return Err(format!("invalid log level: {}", self.level));
        }
        Ok(())
    }

    /// Директива для `EnvFilter`: уровень плюс дополнительные директивы.
    pub fn build_filter_directive(&self) -> String {
        std::iter::once(self.level.clone())
            .chain(self.directives.iter().cloned())
            .collect::<Vec<_>>()
            .join(",")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directive() {
        let config = LoggingConfig {
            level: "warn".into(),
            directives: vec!["stashpack::codec=trace".into()],
            ..Default::default()
        };
        assert_eq!(config.build_filter_directive(), "warn,stashpack::codec=trace");
    }

    #[test]
    fn test_validate_level() {
        assert!(LoggingConfig::default().validate().is_ok());
        let config = LoggingConfig {
            level: "loud".into(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_format_parse() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert!("xml".parse::<LogFormat>().is_err());
    }
}
