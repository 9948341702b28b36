//! Таблица extension-типов и их бинарные форматы.
//!
//! Каждый [`TypeDescriptor`] связывает логический тип ([`TypeKind`]) с
//! кодом extension'а, версией формата, в которой он появился, и парой
//! функций упаковки/распаковки. Форматы здесь побайтно фиксированы:
//! уже сохранённые payload'ы должны оставаться читаемыми.

use std::{fmt, str::FromStr};

use byteorder::{ByteOrder, LittleEndian};
use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, TimeZone, Timelike, Utc};
use num_integer::Integer;
use rust_decimal::Decimal;
use stashpack_error::{bail, ensure, CodecError, CodecResult};

use super::{
    decode::Decoder,
    encode::Encoder,
    tags::{
        EXT_BIGINT, EXT_DATE, EXT_DATE_TIME_V0, EXT_DATE_TIME_V1, EXT_DECIMAL, EXT_OBJECT,
        EXT_SET, EXT_SYMBOL, EXT_TIME_V0, EXT_TIME_V1, EXT_ZONED_TIME_V0, EXT_ZONED_TIME_V1,
    },
};
use crate::{Value, ZonedTime};

const NANOS_PER_SEC: i128 = 1_000_000_000;
const SECS_PER_DAY: i128 = 86_400;

/// Логический тип, который можно зарегистрировать в кодеке.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeKind {
    Symbol,
    Time,
    DateTime,
    Date,
    Decimal,
    Set,
    BigInt,
    ZonedTime,
    Object,
}

impl TypeKind {
    pub const ALL: [TypeKind; 9] = [
        TypeKind::Symbol,
        TypeKind::Time,
        TypeKind::DateTime,
        TypeKind::Date,
        TypeKind::Decimal,
        TypeKind::Set,
        TypeKind::BigInt,
        TypeKind::ZonedTime,
        TypeKind::Object,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TypeKind::Symbol => "Symbol",
            TypeKind::Time => "Time",
            TypeKind::DateTime => "DateTime",
            TypeKind::Date => "Date",
            TypeKind::Decimal => "Decimal",
            TypeKind::Set => "Set",
            TypeKind::BigInt => "Integer",
            TypeKind::ZonedTime => "ZonedTime",
            TypeKind::Object => "Object",
        }
    }
}

impl fmt::Display for TypeKind {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Упаковка: плоская (значение -> байты) или рекурсивная (значение пишется
/// через вложенный энкодер).
#[derive(Clone, Copy)]
pub enum PackFn {
    Flat(fn(&Value) -> CodecResult<Vec<u8>>),
    Recursive(fn(&Value, &mut Encoder<'_>) -> CodecResult<()>),
}

/// Распаковка, симметричная [`PackFn`].
#[derive(Clone, Copy)]
pub enum UnpackFn {
    Flat(fn(&[u8]) -> CodecResult<Value>),
    Recursive(fn(&mut Decoder<'_>) -> CodecResult<Value>),
}

/// Неизменяемое описание одного бинарного формата типа.
#[derive(Clone, Copy)]
pub struct TypeDescriptor {
    pub kind: TypeKind,
    pub code: i8,
    /// Версия формата, начиная с которой дескриптор используется для упаковки.
    pub version: u8,
    pub pack: PackFn,
    pub unpack: UnpackFn,
}

impl TypeDescriptor {
    pub fn is_recursive(&self) -> bool {
        matches!(self.pack, PackFn::Recursive(_))
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("kind", &self.kind)
            .field("code", &self.code)
            .field("version", &self.version)
            .field("recursive", &self.is_recursive())
            .finish()
    }
}

/// Все встроенные форматы. Порядок не важен: выбор активного упаковщика
/// делает [`TypeRegistryBuilder`](super::TypeRegistryBuilder).
pub static BUILTIN: &[TypeDescriptor] = &[
    TypeDescriptor {
        kind: TypeKind::Symbol,
        code: EXT_SYMBOL,
        version: 0,
        pack: PackFn::Flat(pack_symbol),
        unpack: UnpackFn::Flat(unpack_symbol),
    },
    TypeDescriptor {
        kind: TypeKind::Time,
        code: EXT_TIME_V0,
        version: 0,
        pack: PackFn::Flat(pack_time_v0),
        unpack: UnpackFn::Flat(unpack_time_v0),
    },
    TypeDescriptor {
        kind: TypeKind::DateTime,
        code: EXT_DATE_TIME_V0,
        version: 0,
        pack: PackFn::Flat(pack_date_time_v0),
        unpack: UnpackFn::Flat(unpack_date_time_v0),
    },
    TypeDescriptor {
        kind: TypeKind::Date,
        code: EXT_DATE,
        version: 0,
        pack: PackFn::Flat(pack_date),
        unpack: UnpackFn::Flat(unpack_date),
    },
    TypeDescriptor {
        kind: TypeKind::Decimal,
        code: EXT_DECIMAL,
        version: 0,
        pack: PackFn::Flat(pack_decimal),
        unpack: UnpackFn::Flat(unpack_decimal),
    },
    TypeDescriptor {
        kind: TypeKind::ZonedTime,
        code: EXT_ZONED_TIME_V0,
        version: 0,
        pack: PackFn::Flat(pack_zoned_time_v0),
        unpack: UnpackFn::Flat(unpack_zoned_time_v0),
    },
    TypeDescriptor {
        kind: TypeKind::Set,
        code: EXT_SET,
        version: 0,
        pack: PackFn::Recursive(pack_set),
        unpack: UnpackFn::Recursive(unpack_set),
    },
    TypeDescriptor {
        kind: TypeKind::BigInt,
        code: EXT_BIGINT,
        version: 0,
        pack: PackFn::Flat(pack_bigint),
        unpack: UnpackFn::Flat(unpack_bigint),
    },
    TypeDescriptor {
        kind: TypeKind::Time,
        code: EXT_TIME_V1,
        version: 1,
        pack: PackFn::Recursive(pack_time_v1),
        unpack: UnpackFn::Recursive(unpack_time_v1),
    },
    TypeDescriptor {
        kind: TypeKind::DateTime,
        code: EXT_DATE_TIME_V1,
        version: 1,
        pack: PackFn::Recursive(pack_date_time_v1),
        unpack: UnpackFn::Recursive(unpack_date_time_v1),
    },
    TypeDescriptor {
        kind: TypeKind::ZonedTime,
        code: EXT_ZONED_TIME_V1,
        version: 1,
        pack: PackFn::Recursive(pack_zoned_time_v1),
        unpack: UnpackFn::Recursive(unpack_zoned_time_v1),
    },
    TypeDescriptor {
        kind: TypeKind::Object,
        code: EXT_OBJECT,
        version: 0,
        pack: PackFn::Recursive(super::object::pack_object),
        unpack: UnpackFn::Recursive(super::object::unpack_object),
    },
];

fn mismatch(
    expected: &str,
    value: &Value,
) -> CodecError {
    CodecError::pack_value(
        format!("expected {expected}, got {}", value.type_name()),
        value.type_name(),
    )
}

/// Несократимая дробь `num/den`.
fn reduce(
    num: i128,
    den: i128,
) -> (i128, i128) {
    let g = num.gcd(&den);
    if g == 0 {
        (num, den)
    } else {
        (num / g, den / g)
    }
}

/// Секунды и наносекунды из рационального числа секунд.
fn split_rational(
    num: i128,
    den: i128,
) -> (i64, u32) {
    let secs = num.div_euclid(den);
    let nanos = num.rem_euclid(den) * NANOS_PER_SEC / den;
    (secs as i64, nanos as u32)
}

fn fixed_offset(secs: i64) -> CodecResult<FixedOffset> {
    i32::try_from(secs)
        .ok()
        .and_then(FixedOffset::east_opt)
        .ok_or_else(|| CodecError::unpack(format!("invalid UTC offset: {secs}")))
}

fn utc_from_parts(
    secs: i64,
    nanos: u32,
) -> CodecResult<DateTime<Utc>> {
    DateTime::from_timestamp(secs, nanos)
        .ok_or_else(|| CodecError::unpack(format!("timestamp out of range: {secs}.{nanos:09}")))
}

////////////////////////////////////////////////////////////////////////////////
// Symbol
////////////////////////////////////////////////////////////////////////////////

fn pack_symbol(value: &Value) -> CodecResult<Vec<u8>> {
    match value {
        Value::Symbol(name) => Ok(name.as_bytes().to_vec()),
        other => Err(mismatch("Symbol", other)),
    }
}

fn unpack_symbol(payload: &[u8]) -> CodecResult<Value> {
    let name = std::str::from_utf8(payload)
        .map_err(|e| CodecError::unpack(format!("invalid Symbol name: {e}")))?;
    Ok(Value::Symbol(name.to_string()))
}

////////////////////////////////////////////////////////////////////////////////
// Time
////////////////////////////////////////////////////////////////////////////////

/// `q< L<`: числитель и знаменатель несократимой дроби секунд от эпохи.
fn pack_time_v0(value: &Value) -> CodecResult<Vec<u8>> {
    let Value::Time(time) = value else {
        return Err(mismatch("Time", value));
    };
    let total = time.timestamp() as i128 * NANOS_PER_SEC + time.timestamp_subsec_nanos() as i128;
    let (num, den) = reduce(total, NANOS_PER_SEC);

    let (Ok(num), Ok(den)) = (i64::try_from(num), u32::try_from(den)) else {
        bail!(pack, "Time instance out of bounds ({num}/{den})");
    };

    let mut buf = [0u8; 12];
    LittleEndian::write_i64(&mut buf[0..8], num);
    LittleEndian::write_u32(&mut buf[8..12], den);
    Ok(buf.to_vec())
}

fn unpack_time_v0(payload: &[u8]) -> CodecResult<Value> {
    ensure!(payload.len() == 12, unpack, "Corrupted Time object: {} bytes", payload.len());

    let num = LittleEndian::read_i64(&payload[0..8]) as i128;
    let den = LittleEndian::read_u32(&payload[8..12]) as i128;
    ensure!(den != 0, unpack, "Corrupted Time object: zero denominator");

    let (secs, nanos) = split_rational(num, den);
    Ok(Value::Time(utc_from_parts(secs, nanos)?.fixed_offset()))
}

fn pack_time_v1(
    value: &Value,
    enc: &mut Encoder<'_>,
) -> CodecResult<()> {
    let Value::Time(time) = value else {
        return Err(mismatch("Time", value));
    };
    enc.write_int(time.timestamp() as i128)?;
    enc.write_int(time.timestamp_subsec_nanos() as i128)?;
    enc.write_int(time.offset().local_minus_utc() as i128)
}

fn unpack_time_v1(dec: &mut Decoder<'_>) -> CodecResult<Value> {
    let secs = dec.read_i64("Time seconds")?;
    let nanos = dec.read_i64("Time nanoseconds")?;
    let offset = dec.read_i64("Time offset")?;

    let nanos = u32::try_from(nanos)
        .map_err(|_| CodecError::unpack(format!("Corrupted Time object: {nanos} ns")))?;
    let utc = utc_from_parts(secs, nanos)?;
    Ok(Value::Time(utc.with_timezone(&fixed_offset(offset)?)))
}

////////////////////////////////////////////////////////////////////////////////
// DateTime
////////////////////////////////////////////////////////////////////////////////

/// Поля календарной даты-времени в локальном смещении.
struct DateTimeParts {
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    sec_num: i128,
    sec_den: i128,
    offset_num: i128,
    offset_den: i128,
}

impl DateTimeParts {
    fn from_value(value: &Value) -> CodecResult<Self> {
        let Value::DateTime(dt) = value else {
            return Err(mismatch("DateTime", value));
        };
        let sec_total = dt.second() as i128 * NANOS_PER_SEC + dt.nanosecond() as i128;
        let (sec_num, sec_den) = reduce(sec_total, NANOS_PER_SEC);
        let (offset_num, offset_den) =
            reduce(dt.offset().local_minus_utc() as i128, SECS_PER_DAY);

        Ok(Self {
            year: dt.year(),
            month: dt.month(),
            day: dt.day(),
            hour: dt.hour(),
            minute: dt.minute(),
            sec_num,
            sec_den,
            offset_num,
            offset_den,
        })
    }

    fn into_value(self) -> CodecResult<Value> {
        ensure!(
            self.sec_den > 0 && self.offset_den > 0,
            unpack,
            "Corrupted DateTime object: non-positive denominator"
        );

        let (sec, nanos) = split_rational(self.sec_num, self.sec_den);
        let offset = fixed_offset((self.offset_num * SECS_PER_DAY / self.offset_den) as i64)?;

        let naive = NaiveDate::from_ymd_opt(self.year, self.month, self.day)
            .and_then(|d| {
                let sec = u32::try_from(sec).ok()?;
                d.and_hms_nano_opt(self.hour, self.minute, sec, nanos)
            })
            .ok_or_else(|| CodecError::unpack("Corrupted DateTime object: invalid fields"))?;

        offset
            .from_local_datetime(&naive)
            .single()
            .map(Value::DateTime)
            .ok_or_else(|| CodecError::unpack("Corrupted DateTime object: ambiguous local time"))
    }
}

/// `s< C C C C q< L< c C`
fn pack_date_time_v0(value: &Value) -> CodecResult<Vec<u8>> {
    let p = DateTimeParts::from_value(value)?;

    let year = i16::try_from(p.year)
        .map_err(|_| CodecError::pack(format!("DateTime year out of bounds ({})", p.year)))?;
    let (Ok(sec_num), Ok(sec_den)) = (i64::try_from(p.sec_num), u32::try_from(p.sec_den)) else {
        bail!(pack, "DateTime#sec_fraction out of bounds ({}/{})", p.sec_num, p.sec_den);
    };
    let (Ok(offset_num), Ok(offset_den)) = (i8::try_from(p.offset_num), u8::try_from(p.offset_den))
    else {
        bail!(pack, "DateTime#offset out of bounds ({}/{})", p.offset_num, p.offset_den);
    };

    let mut buf = vec![0u8; 20];
    LittleEndian::write_i16(&mut buf[0..2], year);
    buf[2] = p.month as u8;
    buf[3] = p.day as u8;
    buf[4] = p.hour as u8;
    buf[5] = p.minute as u8;
    LittleEndian::write_i64(&mut buf[6..14], sec_num);
    LittleEndian::write_u32(&mut buf[14..18], sec_den);
    buf[18] = offset_num as u8;
    buf[19] = offset_den;
    Ok(buf)
}

fn unpack_date_time_v0(payload: &[u8]) -> CodecResult<Value> {
    ensure!(
        payload.len() == 20,
        unpack,
        "Corrupted DateTime object: {} bytes",
        payload.len()
    );

    DateTimeParts {
        year: LittleEndian::read_i16(&payload[0..2]) as i32,
        month: payload[2] as u32,
        day: payload[3] as u32,
        hour: payload[4] as u32,
        minute: payload[5] as u32,
        sec_num: LittleEndian::read_i64(&payload[6..14]) as i128,
        sec_den: LittleEndian::read_u32(&payload[14..18]) as i128,
        offset_num: payload[18] as i8 as i128,
        offset_den: payload[19] as i128,
    }
    .into_value()
}

fn pack_date_time_v1(
    value: &Value,
    enc: &mut Encoder<'_>,
) -> CodecResult<()> {
    let p = DateTimeParts::from_value(value)?;
    for field in [
        p.year as i128,
        p.month as i128,
        p.day as i128,
        p.hour as i128,
        p.minute as i128,
        p.sec_num,
        p.sec_den,
        p.offset_num,
        p.offset_den,
    ] {
        enc.write_int(field)?;
    }
    Ok(())
}

fn unpack_date_time_v1(dec: &mut Decoder<'_>) -> CodecResult<Value> {
    let mut field = |what: &str| -> CodecResult<i128> { Ok(dec.read_i64(what)? as i128) };

    let year = field("DateTime year")?;
    let month = field("DateTime month")?;
    let day = field("DateTime day")?;
    let hour = field("DateTime hour")?;
    let minute = field("DateTime minute")?;
    let sec_num = field("DateTime seconds")?;
    let sec_den = field("DateTime seconds")?;
    let offset_num = field("DateTime offset")?;
    let offset_den = field("DateTime offset")?;

    let narrow = |v: i128| u32::try_from(v).map_err(|_| CodecError::unpack("Corrupted DateTime object"));
    DateTimeParts {
        year: i32::try_from(year).map_err(|_| CodecError::unpack("Corrupted DateTime object"))?,
        month: narrow(month)?,
        day: narrow(day)?,
        hour: narrow(hour)?,
        minute: narrow(minute)?,
        sec_num,
        sec_den,
        offset_num,
        offset_den,
    }
    .into_value()
}

////////////////////////////////////////////////////////////////////////////////
// Date
////////////////////////////////////////////////////////////////////////////////

/// `s< C C`
fn pack_date(value: &Value) -> CodecResult<Vec<u8>> {
    let Value::Date(date) = value else {
        return Err(mismatch("Date", value));
    };
    let year = i16::try_from(date.year())
        .map_err(|_| CodecError::pack(format!("Date year out of bounds ({})", date.year())))?;

    let mut buf = vec![0u8; 4];
    LittleEndian::write_i16(&mut buf[0..2], year);
    buf[2] = date.month() as u8;
    buf[3] = date.day() as u8;
    Ok(buf)
}

fn unpack_date(payload: &[u8]) -> CodecResult<Value> {
    ensure!(payload.len() == 4, unpack, "Corrupted Date object: {} bytes", payload.len());

    let year = LittleEndian::read_i16(&payload[0..2]) as i32;
    NaiveDate::from_ymd_opt(year, payload[2] as u32, payload[3] as u32)
        .map(Value::Date)
        .ok_or_else(|| CodecError::unpack(format!("invalid date: {year}-{}-{}", payload[2], payload[3])))
}

////////////////////////////////////////////////////////////////////////////////
// Decimal
////////////////////////////////////////////////////////////////////////////////

const DECIMAL_WORD_DIGITS: usize = 9;

/// `"<prec>:<sign>0.<digits>e<exp>"`. Префикс `prec` только подсказка для
/// читающей стороны, при распаковке он игнорируется.
fn pack_decimal(value: &Value) -> CodecResult<Vec<u8>> {
    let Value::Decimal(dec) = value else {
        return Err(mismatch("Decimal", value));
    };

    if dec.is_zero() {
        return Ok(format!("{DECIMAL_WORD_DIGITS}:0.0").into_bytes());
    }

    let scale = dec.scale() as i64;
    let raw = dec.mantissa().unsigned_abs().to_string();
    let exponent = raw.len() as i64 - scale;
    let digits = raw.trim_end_matches('0');

    let int_digits = exponent.max(0) as usize;
    let frac_digits = (digits.len() as i64 - exponent).max(0) as usize;
    let mut words = int_digits.div_ceil(DECIMAL_WORD_DIGITS) + frac_digits.div_ceil(DECIMAL_WORD_DIGITS);
    if frac_digits > 0 {
        words += 1;
    }
    let precision = words.max(1) * DECIMAL_WORD_DIGITS;

    let sign = if dec.is_sign_negative() { "-" } else { "" };
    Ok(format!("{precision}:{sign}0.{digits}e{exponent}").into_bytes())
}

fn unpack_decimal(payload: &[u8]) -> CodecResult<Value> {
    let text = std::str::from_utf8(payload)
        .map_err(|e| CodecError::unpack(format!("invalid Decimal payload: {e}")))?;
    let body = match text.split_once(':') {
        Some((_, body)) => body,
        None => text,
    };

    if matches!(body, "NaN" | "Infinity" | "+Infinity" | "-Infinity") {
        bail!(unpack, "Decimal {body} is not representable");
    }

    let parsed = if body.contains(['e', 'E']) {
        Decimal::from_scientific(body)
    } else {
        Decimal::from_str(body)
    };
    parsed
        .map(|d| Value::Decimal(d.normalize()))
        .map_err(|e| CodecError::unpack(format!("invalid Decimal {body:?}: {e}")))
}

////////////////////////////////////////////////////////////////////////////////
// ZonedTime
////////////////////////////////////////////////////////////////////////////////

/// `q< L< a*`
fn pack_zoned_time_v0(value: &Value) -> CodecResult<Vec<u8>> {
    let Value::ZonedTime(zoned) = value else {
        return Err(mismatch("ZonedTime", value));
    };
    let zone = zoned.zone().as_bytes();

    let mut buf = vec![0u8; 12 + zone.len()];
    LittleEndian::write_i64(&mut buf[0..8], zoned.utc().timestamp());
    LittleEndian::write_u32(&mut buf[8..12], zoned.utc().timestamp_subsec_nanos());
    buf[12..].copy_from_slice(zone);
    Ok(buf)
}

fn unpack_zoned_time_v0(payload: &[u8]) -> CodecResult<Value> {
    ensure!(
        payload.len() >= 12,
        unpack,
        "Corrupted ZonedTime object: {} bytes",
        payload.len()
    );

    let secs = LittleEndian::read_i64(&payload[0..8]);
    let nanos = LittleEndian::read_u32(&payload[8..12]);
    let zone = std::str::from_utf8(&payload[12..])
        .map_err(|e| CodecError::unpack(format!("invalid zone name: {e}")))?;
    Ok(Value::ZonedTime(ZonedTime::new(utc_from_parts(secs, nanos)?, zone)))
}

fn pack_zoned_time_v1(
    value: &Value,
    enc: &mut Encoder<'_>,
) -> CodecResult<()> {
    let Value::ZonedTime(zoned) = value else {
        return Err(mismatch("ZonedTime", value));
    };
    enc.write_int(zoned.utc().timestamp() as i128)?;
    enc.write_int(zoned.utc().timestamp_subsec_nanos() as i128)?;
    enc.write(&Value::Str(zoned.zone().to_string()))
}

fn unpack_zoned_time_v1(dec: &mut Decoder<'_>) -> CodecResult<Value> {
    let secs = dec.read_i64("ZonedTime seconds")?;
    let nanos = dec.read_i64("ZonedTime nanoseconds")?;
    let zone = dec.read()?;

    let nanos = u32::try_from(nanos)
        .map_err(|_| CodecError::unpack(format!("Corrupted ZonedTime object: {nanos} ns")))?;
    let zone = zone
        .as_str()
        .ok_or_else(|| CodecError::unpack("Corrupted ZonedTime object: zone is not a string"))?;
    Ok(Value::ZonedTime(ZonedTime::new(utc_from_parts(secs, nanos)?, zone)))
}

////////////////////////////////////////////////////////////////////////////////
// Set
////////////////////////////////////////////////////////////////////////////////

fn pack_set(
    value: &Value,
    enc: &mut Encoder<'_>,
) -> CodecResult<()> {
    match value {
        Value::Set(items) => enc.write_array(items),
        other => Err(mismatch("Set", other)),
    }
}

fn unpack_set(dec: &mut Decoder<'_>) -> CodecResult<Value> {
    match dec.read()? {
        Value::Array(items) => Ok(Value::Set(items)),
        other => bail!(unpack, "Corrupted Set object: expected array, got {}", other.type_name()),
    }
}

////////////////////////////////////////////////////////////////////////////////
// BigInt
////////////////////////////////////////////////////////////////////////////////

/// Байт знака, затем 32-битные big-endian куски модуля, младший кусок первым.
fn pack_bigint(value: &Value) -> CodecResult<Vec<u8>> {
    let Some(n) = value.as_i128() else {
        return Err(mismatch("Integer", value));
    };

    let mut buf = vec![u8::from(n < 0)];
    let mut magnitude = n.unsigned_abs();
    while magnitude > 0 {
        buf.extend_from_slice(&(magnitude as u32).to_be_bytes());
        magnitude >>= 32;
    }
    Ok(buf)
}

fn unpack_bigint(payload: &[u8]) -> CodecResult<Value> {
    let Some((&sign, chunks)) = payload.split_first() else {
        bail!(unpack, "Corrupted Integer object: empty payload");
    };
    ensure!(
        sign <= 1 && chunks.len() % 4 == 0,
        unpack,
        "Corrupted Integer object"
    );

    let mut magnitude: u128 = 0;
    for (i, chunk) in chunks.chunks_exact(4).enumerate() {
        let word = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]) as u128;
        if word == 0 {
            continue;
        }
        let shifted = (i < 4).then(|| word << (32 * i));
        match shifted {
            Some(part) => magnitude |= part,
            None => bail!(unpack, "Integer too large to unpack ({} chunks)", chunks.len() / 4),
        }
    }

    let n = if sign == 1 {
        if magnitude == i128::MIN.unsigned_abs() {
            i128::MIN
        } else {
            i128::try_from(magnitude).map(|m| -m).map_err(|_| {
                CodecError::unpack(format!("Integer too large to unpack (-{magnitude})"))
            })?
        }
    } else {
        i128::try_from(magnitude)
            .map_err(|_| CodecError::unpack(format!("Integer too large to unpack ({magnitude})")))?
    };
    Ok(Value::integer(n))
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
