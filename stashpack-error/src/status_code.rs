use std::fmt;

use num_enum::TryFromPrimitive;

/// Коды статуса для категоризации ошибок кодеков.
///
/// # Диапазоны:
/// - 1xxx: Общие ошибки
/// - 2xxx: Ошибки упаковки (encode)
/// - 3xxx: Ошибки распаковки (decode)
/// - 4xxx: Версионирование и формы (shape) данных
/// - 5xxx: Разрешение типов во время выполнения
///
/// `num_enum::TryFromPrimitive` даёт нативную реализацию `TryFrom<u32>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive)]
#[repr(u32)]
#[non_exhaustive]
pub enum StatusCode {
    // === 1xxx: Общие ошибки ===
    Internal = 1001,
    InvalidArgs = 1002,

    // === 2xxx: Упаковка ===
    PackFailed = 2000,
    UnregisteredType = 2001,

    // === 3xxx: Распаковка ===
    UnpackFailed = 3000,

    // === 4xxx: Версии ===
    UnsupportedCodec = 4000,
    VersionMismatch = 4001,
    ShapeMismatch = 4002,

    // === 5xxx: Разрешение типов ===
    ClassMissing = 5000,
    MissingLink = 5001,
    MissingTypeDescriptor = 5002,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl StatusCode {
    /// Числовое представление кода статуса.
    pub const fn code(self) -> u32 {
        self as u32
    }

    /// Пытается получить вариант `StatusCode` из `u32`.
    pub fn from_u32(v: u32) -> Option<Self> {
        Self::try_from(v).ok()
    }

    /// Ошибка при упаковке значения (диапазон 2xxx).
    pub fn is_pack_error(&self) -> bool {
        (2000..=2999).contains(&self.code())
    }

    /// Ошибка при распаковке байтов (диапазон 3xxx).
    pub fn is_unpack_error(&self) -> bool {
        (3000..=3999).contains(&self.code())
    }

    /// Ошибки, после которых закешированный payload стоит считать промахом
    /// кеша: данные были записаны другой версией формата или схемы.
    pub fn is_stale_payload(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedCodec
                | Self::VersionMismatch
                | Self::ShapeMismatch
                | Self::ClassMissing
                | Self::MissingLink
        )
    }
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов для StatusCode
////////////////////////////////////////////////////////////////////////////////

impl From<StatusCode> for u32 {
    fn from(c: StatusCode) -> Self {
        c.code()
    }
}

impl fmt::Display for StatusCode {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{:?} ({})", self, self.code())
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
