use super::{missing_version_byte, Versions};
use crate::{codec::Coder, CodecResult};

/// Один байт версии (0–255), затем вывод кодера этой версии.
#[derive(Debug)]
pub struct SingleBytePrefixVersion<V> {
    current_version: u8,
    versions: Versions<V>,
}

impl<V: 'static> SingleBytePrefixVersion<V> {
    /// Ошибка `InvalidArgument`, если для `current_version` нет кодера.
    pub fn new(
        current_version: u8,
        versions: Versions<V>,
    ) -> CodecResult<Self> {
        versions.require_current(current_version)?;
        Ok(Self {
            current_version,
            versions,
        })
    }

    pub fn current_version(&self) -> u8 {
        self.current_version
    }
}

impl<V: 'static> Coder for SingleBytePrefixVersion<V> {
    type Value = V;

    fn encode(
        &self,
        value: &V,
    ) -> CodecResult<Vec<u8>> {
        let payload = self.versions.get(self.current_version)?.encode(value)?;
        let mut out = Vec::with_capacity(payload.len() + 1);
        out.push(self.current_version);
        out.extend_from_slice(&payload);
        Ok(out)
    }

    fn decode(
        &self,
        bytes: &[u8],
    ) -> CodecResult<V> {
        let (&version, payload) = bytes.split_first().ok_or_else(missing_version_byte)?;
        self.versions.get(version)?.decode(payload)
    }
}
