//! Адаптеры сжатия к интерфейсу [`Coder`].

use std::io::{Read, Write};

use flate2::{read::ZlibDecoder, write::ZlibEncoder, Compression};
use stashpack_error::ResultExt;

use super::Coder;
use crate::CodecResult;

/// Поток zlib (deflate с заголовком и adler32).
#[derive(Debug, Clone, Copy)]
pub struct Zlib {
    level: Compression,
}

impl Zlib {
    pub fn new(level: u32) -> Self {
        Self {
            level: Compression::new(level),
        }
    }
}

impl Default for Zlib {
    fn default() -> Self {
        Self {
            level: Compression::default(),
        }
    }
}

impl Coder for Zlib {
    type Value = Vec<u8>;

    fn encode(
        &self,
        value: &Vec<u8>,
    ) -> CodecResult<Vec<u8>> {
        let mut encoder = ZlibEncoder::new(Vec::with_capacity(value.len() / 2), self.level);
        encoder.write_all(value).or_pack("zlib deflate")?;
        encoder.finish().or_pack("zlib deflate")
    }

    fn decode(
        &self,
        bytes: &[u8],
    ) -> CodecResult<Vec<u8>> {
        let mut out = Vec::with_capacity(bytes.len() * 2);
        ZlibDecoder::new(bytes)
            .read_to_end(&mut out)
            .or_unpack("zlib inflate")?;
        Ok(out)
    }
}

/// Сжатие ZSTD.
#[derive(Debug, Clone, Copy)]
pub struct Zstd {
    level: i32,
}

impl Zstd {
    pub fn new(level: i32) -> Self {
        Self { level }
    }
}

impl Default for Zstd {
    fn default() -> Self {
        // баланс между скоростью и размером
        Self { level: 3 }
    }
}

impl Coder for Zstd {
    type Value = Vec<u8>;

    fn encode(
        &self,
        value: &Vec<u8>,
    ) -> CodecResult<Vec<u8>> {
        zstd::stream::encode_all(value.as_slice(), self.level).or_pack("zstd compress")
    }

    fn decode(
        &self,
        bytes: &[u8],
    ) -> CodecResult<Vec<u8>> {
        zstd::stream::decode_all(bytes).or_unpack("zstd decompress")
    }
}
