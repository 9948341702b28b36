use super::{missing_version_byte, Versions};
use crate::{
    codec::{BytesCoder, Coder},
    CodecError, CodecResult, Value,
};

pub const UTF8_VERSION: u8 = 255;
pub const BINARY_VERSION: u8 = 254;
pub const ASCII_VERSION: u8 = 253;
/// Наибольшая версия, доступная обычным кодерам.
pub const MAX_VERSION: u8 = 252;

/// Однобайтовый конверт, в котором текстовые значения не проходят через
/// кодек: байты строки пишутся сразу после тега её кодировки (`255`
/// UTF-8, `254` бинарная, `253` ASCII). Версии 0–252 доступны обычным
/// кодерам.
pub struct StringBypassVersion {
    current_version: u8,
    versions: Versions<Value>,
    string_coder: Option<Box<BytesCoder>>,
}

impl StringBypassVersion {
    pub fn new(
        current_version: u8,
        versions: Versions<Value>,
    ) -> CodecResult<Self> {
        if let Some(bad) = std::iter::once(current_version)
            .chain(versions.versions())
            .find(|v| *v > MAX_VERSION)
        {
            return Err(CodecError::InvalidArgument(format!(
                "Invalid version {bad}, versions must be an integer between 0 and {MAX_VERSION}"
            )));
        }
        versions.require_current(current_version)?;

        Ok(Self {
            current_version,
            versions,
            string_coder: None,
        })
    }

    /// Дополнительное преобразование байтов строки (например, сжатие).
    pub fn with_string_coder(
        mut self,
        coder: impl Coder<Value = Vec<u8>> + 'static,
    ) -> Self {
        self.string_coder = Some(Box::new(coder));
        self
    }

    pub fn current_version(&self) -> u8 {
        self.current_version
    }

    fn bypass(
        &self,
        tag: u8,
        bytes: &[u8],
    ) -> CodecResult<Vec<u8>> {
        let mut out = Vec::with_capacity(bytes.len() + 1);
        out.push(tag);
        match &self.string_coder {
            Some(coder) => out.extend(coder.encode(&bytes.to_vec())?),
            None => out.extend_from_slice(bytes),
        }
        Ok(out)
    }

    fn restore(
        &self,
        payload: &[u8],
    ) -> CodecResult<Vec<u8>> {
        match &self.string_coder {
            Some(coder) => coder.decode(payload),
            None => Ok(payload.to_vec()),
        }
    }

    fn restore_text(
        &self,
        payload: &[u8],
    ) -> CodecResult<String> {
        String::from_utf8(self.restore(payload)?)
            .map_err(|e| CodecError::unpack(format!("invalid text payload: {e}")))
    }
}

impl Coder for StringBypassVersion {
    type Value = Value;

    fn encode(
        &self,
        value: &Value,
    ) -> CodecResult<Vec<u8>> {
        match value {
            Value::Str(s) => self.bypass(UTF8_VERSION, s.as_bytes()),
            Value::Bin(b) => self.bypass(BINARY_VERSION, b),
            Value::Ascii(s) => self.bypass(ASCII_VERSION, s.as_bytes()),
            other => {
                let payload = self.versions.get(self.current_version)?.encode(other)?;
                let mut out = Vec::with_capacity(payload.len() + 1);
                out.push(self.current_version);
                out.extend_from_slice(&payload);
                Ok(out)
            }
        }
    }

    fn decode(
        &self,
        bytes: &[u8],
    ) -> CodecResult<Value> {
        let (&version, payload) = bytes.split_first().ok_or_else(missing_version_byte)?;
        match version {
            UTF8_VERSION => Ok(Value::Str(self.restore_text(payload)?)),
            BINARY_VERSION => Ok(Value::Bin(self.restore(payload)?)),
            ASCII_VERSION => Ok(Value::Ascii(self.restore_text(payload)?)),
            _ => self.versions.get(version)?.decode(payload),
        }
    }
}

impl std::fmt::Debug for StringBypassVersion {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("StringBypassVersion")
            .field("current_version", &self.current_version)
            .field("versions", &self.versions)
            .field("string_coder", &self.string_coder.is_some())
            .finish()
    }
}
