/// Немедленно возвращает ошибку (аналогично `anyhow::bail!`).
///
/// Поддерживает формы:
/// - `bail!(err)`: принимает готовый [`CodecError`](crate::CodecError);
/// - `bail!(pack, "fmt {}", arg)`: создаёт `CodecError::Pack`;
/// - `bail!(unpack, "fmt {}", arg)`: создаёт `CodecError::Unpack`;
/// - `bail!(unsupported, "fmt {}", arg)`: создаёт `CodecError::UnsupportedCodec`.
///
/// Пример:
///
/// ```ignore
/// use stashpack_error::{bail, CodecResult};
///
/// fn version_byte(payload: &[u8]) -> CodecResult<u8> {
///     match payload.first() {
///         Some(v) => Ok(*v),
///         None => bail!(unsupported, "Missing version byte."),
///     }
/// }
/// ```
#[macro_export]
macro_rules! bail {
    (pack, $($arg:tt)*) => {
        return Err($crate::CodecError::pack(format!($($arg)*)))
    };
    (unpack, $($arg:tt)*) => {
        return Err($crate::CodecError::unpack(format!($($arg)*)))
    };
    (unsupported, $($arg:tt)*) => {
        return Err($crate::CodecError::unsupported(format!($($arg)*)))
    };
    ($err:expr) => {
        return Err($crate::CodecError::from($err))
    };
}

/// Проверяет условие и вызывает `bail!`, если условие ложно.
///
/// Формы аналогичны `bail!`:
/// - `ensure!(cond, err)`;
/// - `ensure!(cond, unpack, "fmt {}", arg)` и т.д.
#[macro_export]
macro_rules! ensure {
    ($cond:expr, pack, $($arg:tt)*) => {
        if !($cond) {
            $crate::bail!(pack, $($arg)*);
        }
    };
    ($cond:expr, unpack, $($arg:tt)*) => {
        if !($cond) {
            $crate::bail!(unpack, $($arg)*);
        }
    };
    ($cond:expr, unsupported, $($arg:tt)*) => {
        if !($cond) {
            $crate::bail!(unsupported, $($arg)*);
        }
    };
    ($cond:expr, $err:expr) => {
        if !($cond) {
            $crate::bail!($err);
        }
    };
}

/// Трейт-расширение для `Result`, переводящее чужие ошибки (io, utf-8,
/// сторонние кодеки) в таксономию [`CodecError`](crate::CodecError).
pub trait ResultExt<T> {
    /// Ошибка при упаковке: `Err(e)` превращается в `CodecError::Pack` с
    /// контекстом.
    fn or_pack<C>(
        self,
        ctx: C,
    ) -> crate::CodecResult<T>
    where
        C: Into<String>;

    /// Ошибка при распаковке: `Err(e)` превращается в `CodecError::Unpack` с
    /// контекстом.
    fn or_unpack<C>(
        self,
        ctx: C,
    ) -> crate::CodecResult<T>
    where
        C: Into<String>;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: std::fmt::Display,
{
    fn or_pack<C>(
        self,
        ctx: C,
    ) -> crate::CodecResult<T>
    where
        C: Into<String>,
    {
        self.map_err(|e| crate::CodecError::pack(format!("{}: {e}", ctx.into())))
    }

    fn or_unpack<C>(
        self,
        ctx: C,
    ) -> crate::CodecResult<T>
    where
        C: Into<String>,
    {
        self.map_err(|e| crate::CodecError::unpack(format!("{}: {e}", ctx.into())))
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
