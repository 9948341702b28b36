//! Коды extension-типов MessagePack.
//!
//! Коды являются частью формата хранения: их нельзя менять или
//! переиспользовать, новые типы получают только новые коды.

/// Symbol (имя в UTF-8)
pub const EXT_SYMBOL: i8 = 0;
/// Time v0: рациональное число секунд (`q< L<`)
pub const EXT_TIME_V0: i8 = 1;
/// DateTime v0: `s< C C C C q< L< c C`
pub const EXT_DATE_TIME_V0: i8 = 2;
/// Date: `s< C C`
pub const EXT_DATE: i8 = 3;
/// Decimal в текстовом виде `"<prec>:0.<digits>e<exp>"`
pub const EXT_DECIMAL: i8 = 4;
/// Выведен из употребления (Range), не переиспользовать.
pub const EXT_RESERVED_RANGE: i8 = 5;
/// Зарезервирован за записями ORM.
pub const EXT_RESERVED_RECORD: i8 = 6;
/// Зарезервирован за map с индифферентным доступом.
pub const EXT_RESERVED_INDIFFERENT_MAP: i8 = 7;
/// ZonedTime v0: `q< L< a*`
pub const EXT_ZONED_TIME_V0: i8 = 8;
/// Set: рекурсивный, payload: закодированный массив.
pub const EXT_SET: i8 = 9;
/// Целые вне диапазона 64 бит.
pub const EXT_BIGINT: i8 = 10;
/// Time v1: последовательные поля (sec, nsec, utc_offset).
pub const EXT_TIME_V1: i8 = 11;
/// DateTime v1: последовательные поля.
pub const EXT_DATE_TIME_V1: i8 = 12;
/// ZonedTime v1: последовательные поля (sec, nsec, zone).
pub const EXT_ZONED_TIME_V1: i8 = 13;
/// Открытый объект: payload: закодированный массив `[packed, type_name]`.
pub const EXT_OBJECT: i8 = 127;
