//! Версионные конверты: payload помечается версией формата, чтобы разные
//! поколения кодеков сосуществовали и корректно читали данные друг друга.
//!
//! - [`SingleBytePrefixVersion`]: один байт версии перед payload'ом;
//! - [`CommentPrefixVersion`]: текстовый маркер с цифрой версии, payload
//!   без маркера читается как legacy-версия;
//! - [`StringBypassVersion`]: как однобайтовый, но строки идут в обход
//!   кодека под тремя зарезервированными тегами.

pub mod comment_prefix;
pub mod single_byte;
pub mod string_bypass;

use std::collections::BTreeMap;

pub use comment_prefix::CommentPrefixVersion;
pub use single_byte::SingleBytePrefixVersion;
pub use string_bypass::StringBypassVersion;

use crate::{codec::Coder, CodecError, CodecResult};

/// Таблица `версия -> кодер`.
pub struct Versions<V> {
    coders: BTreeMap<u8, Box<dyn Coder<Value = V>>>,
}

impl<V: 'static> Versions<V> {
    pub fn new() -> Self {
        Self {
            coders: BTreeMap::new(),
        }
    }

    /// Добавляет кодер для версии, заменяя прежний.
    pub fn with(
        mut self,
        version: u8,
        coder: impl Coder<Value = V> + 'static,
    ) -> Self {
        self.coders.insert(version, Box::new(coder));
        self
    }

    pub fn contains(
        &self,
        version: u8,
    ) -> bool {
        self.coders.contains_key(&version)
    }

    pub fn versions(&self) -> impl Iterator<Item = u8> + '_ {
        self.coders.keys().copied()
    }

    /// Кодер для явной версии из payload'а.
    pub fn get(
        &self,
        version: u8,
    ) -> CodecResult<&dyn Coder<Value = V>> {
        self.coders
            .get(&version)
            .map(|c| c.as_ref())
            .ok_or_else(|| unsupported_version(version))
    }

    /// Проверяет, что для текущей версии есть кодер.
    fn require_current(
        &self,
        current: u8,
    ) -> CodecResult<()> {
        if !self.contains(current) {
            return Err(CodecError::InvalidArgument(format!(
                "no coder registered for current version {current}"
            )));
        }
        Ok(())
    }
}

impl<V: 'static> Default for Versions<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> std::fmt::Debug for Versions<V> {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_list().entries(self.coders.keys()).finish()
    }
}

pub(crate) fn unsupported_version(version: impl std::fmt::Display) -> CodecError {
    CodecError::unsupported(format!("Unsupported packer version {version}"))
}

pub(crate) fn missing_version_byte() -> CodecError {
    CodecError::unsupported("Missing version byte.")
}
