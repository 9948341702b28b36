use super::{BytesCoder, Coder};
use crate::CodecResult;

/// Линейная композиция: головной кодер превращает значение в байты, затем
/// байты проходят через преобразования по порядку. Декодирование идёт в
/// обратном порядке.
pub struct CoderChain<V> {
    head: Box<dyn Coder<Value = V>>,
    transforms: Vec<Box<BytesCoder>>,
}

impl<V> CoderChain<V> {
    pub fn new(head: impl Coder<Value = V> + 'static) -> Self {
        Self {
            head: Box::new(head),
            transforms: Vec::new(),
        }
    }

    /// Добавляет байтовое преобразование в конец цепочки.
    pub fn then(
        mut self,
        transform: impl Coder<Value = Vec<u8>> + 'static,
    ) -> Self {
        self.transforms.push(Box::new(transform));
        self
    }

    pub fn len(&self) -> usize {
        self.transforms.len() + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

impl<V> Coder for CoderChain<V> {
    type Value = V;

    fn encode(
        &self,
        value: &V,
    ) -> CodecResult<Vec<u8>> {
        let mut payload = self.head.encode(value)?;
        for transform in &self.transforms {
            payload = transform.encode(&payload)?;
        }
        Ok(payload)
    }

    fn decode(
        &self,
        bytes: &[u8],
    ) -> CodecResult<V> {
        let mut payload = bytes.to_vec();
        for transform in self.transforms.iter().rev() {
            payload = transform.decode(&payload)?;
        }
        self.head.decode(&payload)
    }
}

impl<V> std::fmt::Debug for CoderChain<V> {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("CoderChain").field("len", &self.len()).finish()
    }
}
