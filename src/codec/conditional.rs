use stashpack_error::bail;

use super::Coder;
use crate::{config::CodecSettings, CodecResult};

const UNCOMPRESSED: u8 = 0;
const COMPRESSED: u8 = 1;

/// Сжимает payload, только если он больше порога и сжатие реально
/// уменьшает размер. Первый байт результата: `0` (как есть) или `1`
/// (сжато).
#[derive(Debug, Clone)]
pub struct ConditionalCompressor<C> {
    compressor: C,
    threshold: Option<usize>,
}

impl<C> ConditionalCompressor<C> {
    /// `threshold = None` отключает сжатие при записи; чтение сжатых
    /// payload'ов продолжает работать.
    pub fn new(
        compressor: C,
        threshold: Option<usize>,
    ) -> Self {
        Self {
            compressor,
            threshold,
        }
    }

    /// Порог из `compress_threshold`.
    pub fn from_settings(
        compressor: C,
        settings: &CodecSettings,
    ) -> Self {
        Self::new(compressor, Some(settings.compress_threshold))
    }

    pub fn threshold(&self) -> Option<usize> {
        self.threshold
    }
}

impl<C: Coder<Value = Vec<u8>>> Coder for ConditionalCompressor<C> {
    type Value = Vec<u8>;

    fn encode(
        &self,
        value: &Vec<u8>,
    ) -> CodecResult<Vec<u8>> {
        if self.threshold.is_some_and(|t| value.len() > t) {
            let compressed = self.compressor.encode(value)?;
            if compressed.len() < value.len() {
                let mut out = Vec::with_capacity(compressed.len() + 1);
                out.push(COMPRESSED);
                out.extend_from_slice(&compressed);
                return Ok(out);
            }
        }

        let mut out = Vec::with_capacity(value.len() + 1);
        out.push(UNCOMPRESSED);
        out.extend_from_slice(value);
        Ok(out)
    }

    fn decode(
        &self,
        bytes: &[u8],
    ) -> CodecResult<Vec<u8>> {
        match bytes.split_first() {
            Some((&UNCOMPRESSED, data)) => Ok(data.to_vec()),
            Some((&COMPRESSED, data)) => self.compressor.decode(data),
            _ => bail!(unpack, "invalid ConditionalCompressor version"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Zlib;

    fn coder() -> ConditionalCompressor<Zlib> {
        ConditionalCompressor::new(Zlib::default(), Some(4))
    }

    #[test]
    fn test_under_threshold_is_raw() {
        assert_eq!(coder().encode(&b"foo".to_vec()).unwrap(), b"\x00foo".to_vec());
    }

    #[test]
    fn test_over_threshold_is_compressed() {
        let data = b"foobar".repeat(25);
        let encoded = coder().encode(&data).unwrap();
        assert_eq!(encoded[0], 1);
        assert_eq!(&encoded[1..], Zlib::default().encode(&data).unwrap().as_slice());
        assert_eq!(coder().decode(&encoded).unwrap(), data);
    }

    /// Сжатие, не уменьшающее размер, не применяется.
    #[test]
    fn test_larger_compressed_payload_is_raw() {
        let data = b"foobar".to_vec();
        assert!(Zlib::default().encode(&data).unwrap().len() > data.len());
        assert_eq!(coder().encode(&data).unwrap(), b"\x00foobar".to_vec());
    }

    #[test]
    fn test_decompress_regardless_of_size() {
        let mut payload = vec![1];
        payload.extend(Zlib::default().encode(&b"foo".to_vec()).unwrap());
        assert_eq!(coder().decode(&payload).unwrap(), b"foo".to_vec());
        assert_eq!(coder().decode(b"\x00foobar").unwrap(), b"foobar".to_vec());
    }

    #[test]
    fn test_corrupted_prefix() {
        let err = coder().decode(b"\x02foobar").unwrap_err();
        assert!(err.is_unpack());
        assert!(err.to_string().contains("invalid ConditionalCompressor version"));
        assert!(coder().decode(b"").unwrap_err().is_unpack());
    }

    #[test]
    fn test_disabled_threshold() {
        let coder = ConditionalCompressor::new(Zlib::default(), None);
        assert_eq!(coder.encode(&vec![b'a'; 1000]).unwrap()[0], 0);
    }
}
