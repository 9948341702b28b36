use std::any::Any;

use thiserror::Error;

use crate::{ErrorExt, StatusCode};

/// Ошибки кодеков: упаковка, распаковка, версии и разрешение типов.
///
/// Все варианты фатальны только для одной операции; вызывающий слой
/// трактует их как промах кеша и пересериализует значение.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Значение невозможно закодировать: незарегистрированный тип,
    /// переполнение, несовместимое представление.
    #[error("{message}")]
    Pack {
        message: String,
        /// Имя типа значения, на котором упала упаковка.
        receiver: Option<String>,
    },

    /// Байты невозможно декодировать: обрезанный или повреждённый payload.
    #[error("{0}")]
    Unpack(String),

    /// Явный тег версии не распознан.
    #[error("{0}")]
    UnsupportedCodec(String),

    /// Тип, упомянутый в payload'е, не найден во время выполнения.
    #[error("{0}")]
    ClassMissing(String),

    /// Связь (link) с таким именем не определена у целевого типа.
    #[error("{0}")]
    MissingLink(String),

    /// Дайджест набора колонок не совпадает с текущим.
    #[error("\"{got}\" does not match the expected digest of \"{expected}\"")]
    ShapeMismatch { got: i32, expected: i32 },

    /// Дайджест полей структуры не совпадает с текущим.
    #[error("{0}")]
    VersionMismatch(String),

    /// Ни один дескриптор типа не подходит под активную версию формата.
    #[error("No type found for {type_name:?} with format_version={format_version}")]
    MissingTypeDescriptor {
        type_name: String,
        format_version: u8,
    },

    /// Некорректная конфигурация кодека.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl CodecError {
    pub fn pack(message: impl Into<String>) -> Self {
        Self::Pack {
            message: message.into(),
            receiver: None,
        }
    }

    /// Ошибка упаковки с указанием типа проблемного значения.
    pub fn pack_value(
        message: impl Into<String>,
        receiver: impl Into<String>,
    ) -> Self {
        Self::Pack {
            message: message.into(),
            receiver: Some(receiver.into()),
        }
    }

    pub fn unpack(message: impl Into<String>) -> Self {
        Self::Unpack(message.into())
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::UnsupportedCodec(message.into())
    }

    /// Имя типа, на котором упала упаковка (если известно).
    pub fn receiver(&self) -> Option<&str> {
        match self {
            Self::Pack { receiver, .. } => receiver.as_deref(),
            _ => None,
        }
    }

    pub fn is_pack(&self) -> bool {
        matches!(self, Self::Pack { .. })
    }

    pub fn is_unpack(&self) -> bool {
        matches!(self, Self::Unpack(_))
    }
}

impl ErrorExt for CodecError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Pack {
                receiver: Some(_), ..
            } => StatusCode::UnregisteredType,
            Self::Pack { .. } => StatusCode::PackFailed,
            Self::Unpack(_) => StatusCode::UnpackFailed,
            Self::UnsupportedCodec(_) => StatusCode::UnsupportedCodec,
            Self::ClassMissing(_) => StatusCode::ClassMissing,
            Self::MissingLink(_) => StatusCode::MissingLink,
            Self::ShapeMismatch { .. } => StatusCode::ShapeMismatch,
            Self::VersionMismatch(_) => StatusCode::VersionMismatch,
            Self::MissingTypeDescriptor { .. } => StatusCode::MissingTypeDescriptor,
            Self::InvalidArgument(_) => StatusCode::InvalidArgs,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn log_fields(&self) -> Vec<(&'static str, String)> {
        let mut tags = vec![
            ("error_type", self.type_name()),
            ("status_code", self.status_code().to_string()),
        ];
        if let Some(receiver) = self.receiver() {
            tags.push(("receiver", receiver.to_string()));
        }
        tags
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_mismatch_message() {
        let err = CodecError::ShapeMismatch {
            got: 10,
            expected: -4271,
        };
        assert_eq!(
            err.to_string(),
            "\"10\" does not match the expected digest of \"-4271\""
        );
        assert_eq!(err.status_code(), StatusCode::ShapeMismatch);
    }

    #[test]
    fn test_missing_type_descriptor_message() {
        let err = CodecError::MissingTypeDescriptor {
            type_name: "Time".into(),
            format_version: 0,
        };
        assert_eq!(
            err.to_string(),
            "No type found for \"Time\" with format_version=0"
        );
    }

    /// Тест проверяет, что receiver попадает в поля логов и меняет статус.
    #[test]
    fn test_pack_value_receiver() {
        let err = CodecError::pack_value("Date is not registered", "Date");
        assert_eq!(err.receiver(), Some("Date"));
        assert_eq!(err.status_code(), StatusCode::UnregisteredType);
        assert!(err
            .log_fields()
            .contains(&("receiver", "Date".to_string())));

        let plain = CodecError::pack("boom");
        assert_eq!(plain.receiver(), None);
        assert_eq!(plain.status_code(), StatusCode::PackFailed);
    }

    #[test]
    fn test_predicates() {
        assert!(CodecError::pack("x").is_pack());
        assert!(CodecError::unpack("x").is_unpack());
        assert!(!CodecError::unsupported("x").is_unpack());
        assert!(CodecError::unsupported("x").status_code().is_stale_payload());
    }
}
