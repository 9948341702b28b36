//! Готовая реализация сущностей: модель с колонками и ассоциациями,
//! запись с изменяемыми связями и каталог моделей.

use std::{any::Any, collections::HashMap, fmt, sync::Arc};

use md5::{Digest, Md5};
use parking_lot::RwLock;

use super::{Entity, EntityCatalog, EntityRef, Link, LinkKind};
use crate::{CodecError, CodecResult, Value};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub sql_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Association {
    pub name: String,
    pub target: String,
    pub collection: bool,
}

/// Описание типа записи.
#[derive(Debug, Clone)]
pub struct Model {
    name: String,
    columns: Vec<Column>,
    associations: Vec<Association>,
}

impl Model {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            associations: Vec::new(),
        }
    }

    pub fn column(
        mut self,
        name: impl Into<String>,
        sql_type: impl Into<String>,
    ) -> Self {
        self.columns.push(Column {
            name: name.into(),
            sql_type: sql_type.into(),
        });
        self
    }

    pub fn has_many(
        self,
        name: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        self.association(name, target, true)
    }

    pub fn has_one(
        self,
        name: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        self.association(name, target, false)
    }

    pub fn belongs_to(
        self,
        name: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        self.association(name, target, false)
    }

    fn association(
        mut self,
        name: impl Into<String>,
        target: impl Into<String>,
        collection: bool,
    ) -> Self {
        self.associations.push(Association {
            name: name.into(),
            target: target.into(),
            collection,
        });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn associations(&self) -> &[Association] {
        &self.associations
    }

    pub fn association_named(
        &self,
        name: &str,
    ) -> Option<&Association> {
        self.associations.iter().find(|a| a.name == name)
    }

    /// MD5 от `"name:sql_type,..."`, первые два байта как little-endian i16.
    pub fn columns_digest(&self) -> i32 {
        let joined = self
            .columns
            .iter()
            .map(|c| format!("{}:{}", c.name, c.sql_type))
            .collect::<Vec<_>>()
            .join(",");
        let digest = Md5::digest(joined.as_bytes());
        i16::from_le_bytes([digest[0], digest[1]]) as i32
    }
}

/// Запись: значения колонок и загруженные связи.
///
/// Связи держат цели через `Arc`, поэтому циклический граф (в том числе
/// раскодированный) не освобождается сам. Владелец графа разрывает циклы
/// вызовом [`Record::clear_links`] на его узлах.
pub struct Record {
    model: Arc<Model>,
    attributes: RwLock<Vec<(String, Value)>>,
    links: RwLock<HashMap<String, Link>>,
    new_record: bool,
}

impl Record {
    /// Новая (несохранённая) запись с пустыми колонками.
    pub fn new(model: &Arc<Model>) -> Arc<Self> {
        Self::build(model, Vec::new(), true)
    }

    /// Запись, загруженная из хранилища. Колонки, отсутствующие в `fields`,
    /// заполняются `Nil`; лишние поля отбрасываются.
    pub fn persisted(
        model: &Arc<Model>,
        fields: Vec<(String, Value)>,
    ) -> Arc<Self> {
        Self::build(model, fields, false)
    }

    fn build(
        model: &Arc<Model>,
        mut fields: Vec<(String, Value)>,
        new_record: bool,
    ) -> Arc<Self> {
        let attributes = model
            .columns()
            .iter()
            .map(|c| {
                let value = fields
                    .iter()
                    .position(|(name, _)| *name == c.name)
                    .map(|i| fields.swap_remove(i).1)
                    .unwrap_or(Value::Nil);
                (c.name.clone(), value)
            })
            .collect();

        Arc::new(Self {
            model: model.clone(),
            attributes: RwLock::new(attributes),
            links: RwLock::new(HashMap::new()),
            new_record,
        })
    }

    pub fn downcast(entity: &EntityRef) -> Option<&Record> {
        entity.as_any().downcast_ref::<Record>()
    }

    pub fn model(&self) -> &Arc<Model> {
        &self.model
    }

    pub fn get(
        &self,
        column: &str,
    ) -> Option<Value> {
        self.attributes
            .read()
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, v)| v.clone())
    }

    pub fn set(
        &self,
        column: &str,
        value: impl Into<Value>,
    ) -> CodecResult<()> {
        let mut attributes = self.attributes.write();
        let Some(slot) = attributes.iter_mut().find(|(name, _)| name == column) else {
            return Err(CodecError::InvalidArgument(format!(
                "undefined column {column} on {}",
                self.model.name()
            )));
        };
        slot.1 = value.into();
        Ok(())
    }

    pub fn link(
        &self,
        name: &str,
    ) -> Option<Link> {
        self.links.read().get(name).cloned()
    }

    pub fn is_loaded(
        &self,
        name: &str,
    ) -> bool {
        self.links.read().contains_key(name)
    }

    pub fn one(
        &self,
        name: &str,
    ) -> Option<EntityRef> {
        match self.link(name)? {
            Link::One(target) => target,
            Link::Many(_) => None,
        }
    }

    pub fn many(
        &self,
        name: &str,
    ) -> Vec<EntityRef> {
        match self.link(name) {
            Some(Link::Many(targets)) => targets,
            _ => Vec::new(),
        }
    }

    /// Снимает все загруженные связи и возвращает их.
    pub fn clear_links(&self) -> Vec<(String, Link)> {
        self.links.write().drain().collect()
    }
}

impl Entity for Record {
    fn type_name(&self) -> &str {
        self.model.name()
    }

    fn fields(&self) -> Vec<(String, Value)> {
        self.attributes.read().clone()
    }

    fn is_new(&self) -> bool {
        self.new_record
    }

    fn loaded_links(&self) -> Vec<(String, Link)> {
        let links = self.links.read();
        self.model
            .associations()
            .iter()
            .filter_map(|a| links.get(&a.name).map(|l| (a.name.clone(), l.clone())))
            .collect()
    }

    fn link_kind(
        &self,
        name: &str,
    ) -> Option<LinkKind> {
        self.model.association_named(name).map(|a| {
            if a.collection {
                LinkKind::Many
            } else {
                LinkKind::One
            }
        })
    }

    fn assign_link(
        &self,
        name: &str,
        link: Link,
    ) -> CodecResult<()> {
        let Some(kind) = self.link_kind(name) else {
            return Err(CodecError::MissingLink(format!("undefined association: {name}")));
        };
        if kind != link.kind() {
            return Err(CodecError::InvalidArgument(format!(
                "association {name} expects {kind:?}, got {:?}",
                link.kind()
            )));
        }
        self.links.write().insert(name.to_string(), link);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Debug for Record {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("Record")
            .field("model", &self.model.name())
            .field("attributes", &*self.attributes.read())
            .field("new_record", &self.new_record)
            .finish_non_exhaustive()
    }
}

/// Каталог моделей по имени.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    models: HashMap<String, Arc<Model>>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        model: Model,
    ) -> Arc<Model> {
        let model = Arc::new(model);
        self.models.insert(model.name().to_string(), model.clone());
        model
    }

    pub fn model(
        &self,
        name: &str,
    ) -> CodecResult<&Arc<Model>> {
        self.models
            .get(name)
            .ok_or_else(|| CodecError::ClassMissing(format!("undefined class: {name}")))
    }
}

impl EntityCatalog for Schema {
    fn shape_digest(
        &self,
        type_name: &str,
    ) -> CodecResult<i32> {
        Ok(self.model(type_name)?.columns_digest())
    }

    fn instantiate(
        &self,
        type_name: &str,
        fields: Vec<(String, Value)>,
        is_new: bool,
    ) -> CodecResult<EntityRef> {
        let record: EntityRef = Record::build(self.model(type_name)?, fields, is_new);
        Ok(record)
    }
}
