//! Ошибки кодеков. Типы живут в крейте `stashpack-error`; модуль
//! переэкспортирует их, чтобы пользователям хватало одной зависимости.

pub use stashpack_error::{
    bail, ensure, CodecError, CodecResult, ErrorExt, ResultExt, StatusCode,
};
