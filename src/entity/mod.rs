//! Граф сущностей: корневая запись и транзитивное замыкание её уже
//! загруженных связей.
//!
//! [`EntityGraphCoder`] сериализует граф с дедупликацией по идентичности
//! (указателю), поэтому общие и циклические связи не дублируются.
//! [`Record`]/[`Model`]/[`Schema`] дают готовую реализацию трейтов
//! [`Entity`] и [`EntityCatalog`], а [`RecordCodec`] собирает граф-кодер
//! поверх MessagePack с ограниченным набором типов.

pub mod graph;
pub mod packer;
pub mod record;

use std::{any::Any, fmt, sync::Arc};

pub use graph::EntityGraphCoder;
pub use packer::RecordCodec;
pub use record::{Association, Column, Model, Record, Schema};

use crate::{CodecResult, Value};

pub type EntityRef = Arc<dyn Entity>;

/// Кратность связи.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    One,
    Many,
}

/// Загруженная цель связи.
#[derive(Clone)]
pub enum Link {
    One(Option<EntityRef>),
    Many(Vec<EntityRef>),
}

impl Link {
    pub fn kind(&self) -> LinkKind {
        match self {
            Link::One(_) => LinkKind::One,
            Link::Many(_) => LinkKind::Many,
        }
    }

    pub fn targets(&self) -> Vec<EntityRef> {
        match self {
            Link::One(target) => target.iter().cloned().collect(),
            Link::Many(targets) => targets.clone(),
        }
    }
}

impl fmt::Debug for Link {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        // цели не раскрываются: граф может быть циклическим
        match self {
            Link::One(Some(e)) => write!(f, "One({})", e.type_name()),
            Link::One(None) => f.write_str("One(None)"),
            Link::Many(v) => write!(f, "Many(len={})", v.len()),
        }
    }
}

impl fmt::Debug for dyn Entity {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        // связи не раскрываются: граф может быть циклическим
        f.write_str(self.type_name())
    }
}

/// Сущность, которую умеет сериализовать [`EntityGraphCoder`].
pub trait Entity: Send + Sync + 'static {
    fn type_name(&self) -> &str;

    /// Значения полей в порядке объявления.
    fn fields(&self) -> Vec<(String, Value)>;

    /// Сущность ещё не сохранена.
    fn is_new(&self) -> bool;

    /// Уже загруженные связи, в порядке объявления. Не должен вызывать
    /// дозагрузку.
    fn loaded_links(&self) -> Vec<(String, Link)>;

    /// Кратность связи или `None`, если связь не объявлена.
    fn link_kind(
        &self,
        name: &str,
    ) -> Option<LinkKind>;

    fn assign_link(
        &self,
        name: &str,
        link: Link,
    ) -> CodecResult<()>;

    fn as_any(&self) -> &dyn Any;
}

/// Каталог типов сущностей: дайджест формы и конструктор.
pub trait EntityCatalog: Send + Sync {
    /// `ClassMissing`, если тип неизвестен.
    fn shape_digest(
        &self,
        type_name: &str,
    ) -> CodecResult<i32>;

    fn instantiate(
        &self,
        type_name: &str,
        fields: Vec<(String, Value)>,
        is_new: bool,
    ) -> CodecResult<EntityRef>;
}

impl<C: EntityCatalog + ?Sized> EntityCatalog for Arc<C> {
    fn shape_digest(
        &self,
        type_name: &str,
    ) -> CodecResult<i32> {
        (**self).shape_digest(type_name)
    }

    fn instantiate(
        &self,
        type_name: &str,
        fields: Vec<(String, Value)>,
        is_new: bool,
    ) -> CodecResult<EntityRef> {
        (**self).instantiate(type_name, fields, is_new)
    }
}

/// Сравнение сущностей по идентичности.
pub fn same_entity(
    a: &EntityRef,
    b: &EntityRef,
) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}
