use super::Coder;
use crate::CodecResult;

/// Пропускает отсутствующее значение мимо вложенного кодера: `None`
/// кодируется в `None` и декодируется обратно в `None`.
#[derive(Debug, Clone, Default)]
pub struct AllowNil<C> {
    inner: C,
}

impl<C: Coder> AllowNil<C> {
    pub fn new(inner: C) -> Self {
        Self { inner }
    }

    pub fn encode(
        &self,
        value: Option<&C::Value>,
    ) -> CodecResult<Option<Vec<u8>>> {
        value.map(|v| self.inner.encode(v)).transpose()
    }

    pub fn decode(
        &self,
        bytes: Option<&[u8]>,
    ) -> CodecResult<Option<C::Value>> {
        bytes.map(|b| self.inner.decode(b)).transpose()
    }
}
