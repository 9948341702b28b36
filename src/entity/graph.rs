use std::collections::HashMap;

use super::{Entity, EntityCatalog, EntityRef, Link, LinkKind};
use crate::{codec::ValueCoder, msgpack::DEFAULT_MAX_DEPTH, CodecError, CodecResult, Value};

/// Посещённые сущности: индекс по идентичности и порядок первого обхода.
#[derive(Default)]
struct Tracker {
    ids: HashMap<*const (), usize>,
    nodes: Vec<EntityRef>,
}

impl Tracker {
    fn key(entity: &EntityRef) -> *const () {
        std::sync::Arc::as_ptr(entity) as *const ()
    }

    fn lookup(
        &self,
        entity: &EntityRef,
    ) -> Option<usize> {
        self.ids.get(&Self::key(entity)).copied()
    }

    fn push(
        &mut self,
        entity: &EntityRef,
    ) -> usize {
        let id = self.nodes.len();
        self.ids.insert(Self::key(entity), id);
        self.nodes.push(entity.clone());
        id
    }
}

/// Кодер графа сущностей.
///
/// Формат: `[link_tree, node_0, ..., node_n]`. Дерево связей идёт первым:
/// при декодировании сначала создаются все узлы, затем связи между ними.
/// Узел дерева это либо индекс уже посещённой сущности, либо
/// `[index, [[name, target], ...]]`, если у неё есть загруженные связи.
/// Запись узла: `[type_name, {field: value}, is_new, digest]`.
pub struct EntityGraphCoder<C> {
    catalog: C,
    max_depth: usize,
}

impl<C: EntityCatalog> EntityGraphCoder<C> {
    pub fn new(catalog: C) -> Self {
        Self {
            catalog,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(
        mut self,
        max_depth: usize,
    ) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    fn pack_links(
        &self,
        entity: &EntityRef,
        tracker: &mut Tracker,
        depth: usize,
    ) -> CodecResult<Value> {
        if let Some(id) = tracker.lookup(entity) {
            return Ok(Value::from(id as u64));
        }
        if depth > self.max_depth {
            return Err(CodecError::pack(format!(
                "entity graph exceeds maximum depth of {}",
                self.max_depth
            )));
        }

        let id = Value::from(tracker.push(entity) as u64);
        let links = entity.loaded_links();
        if links.is_empty() {
            return Ok(id);
        }

        let mut packed = Vec::with_capacity(links.len());
        for (name, link) in links {
            let target = match link {
                Link::One(Some(target)) => self.pack_links(&target, tracker, depth + 1)?,
                Link::One(None) => Value::Nil,
                Link::Many(targets) => Value::Array(
                    targets
                        .iter()
                        .map(|t| self.pack_links(t, tracker, depth + 1))
                        .collect::<CodecResult<_>>()?,
                ),
            };
            packed.push(Value::Array(vec![Value::Symbol(name), target]));
        }
        Ok(Value::Array(vec![id, Value::Array(packed)]))
    }

    fn pack_node(
        &self,
        entity: &EntityRef,
    ) -> CodecResult<Value> {
        let fields = entity
            .fields()
            .into_iter()
            .map(|(name, value)| (Value::Str(name), value))
            .collect();
        Ok(Value::Array(vec![
            Value::Str(entity.type_name().to_string()),
            Value::Map(fields),
            Value::Bool(entity.is_new()),
            Value::from(self.catalog.shape_digest(entity.type_name())?),
        ]))
    }

    /// Первый проход: сущность из плоской записи узла.
    fn unpack_node(
        &self,
        record: Value,
    ) -> CodecResult<EntityRef> {
        let Some(mut parts) = record.into_array() else {
            return Err(CodecError::unpack("entity record must be an array"));
        };
        if parts.len() < 2 {
            return Err(CodecError::unpack(format!(
                "entity record has {} elements, expected at least 2",
                parts.len()
            )));
        }
        parts.truncate(4);
        let mut parts = parts.into_iter();

        let type_name = match parts.next() {
            Some(Value::Str(s)) | Some(Value::Ascii(s)) | Some(Value::Symbol(s)) => s,
            other => {
                return Err(CodecError::unpack(format!(
                    "entity type name must be a string, got {}",
                    other.as_ref().map_or("nothing", Value::type_name)
                )))
            }
        };
        let fields = match parts.next() {
            Some(Value::Map(pairs)) => pairs
                .into_iter()
                .map(|(k, v)| match k.as_str() {
                    Some(name) => Ok((name.to_string(), v)),
                    None => Err(CodecError::unpack(format!(
                        "field name must be a string, got {}",
                        k.type_name()
                    ))),
                })
                .collect::<CodecResult<Vec<_>>>()?,
            Some(Value::Nil) | None => Vec::new(),
            Some(other) => {
                return Err(CodecError::unpack(format!(
                    "entity fields must be a map, got {}",
                    other.type_name()
                )))
            }
        };
        let is_new = parts.next().and_then(|v| v.as_bool()).unwrap_or(false);
        let digest = parts.next().filter(|v| !v.is_nil());

        // неизвестный тип обнаруживается раньше несовпадения дайджеста
        let expected = self.catalog.shape_digest(&type_name)?;
        if let Some(digest) = digest {
            let got = digest
                .as_i64()
                .and_then(|d| i32::try_from(d).ok())
                .ok_or_else(|| CodecError::unpack("entity digest must be an integer"))?;
            if got != expected {
                return Err(CodecError::ShapeMismatch { got, expected });
            }
        }

        self.catalog.instantiate(&type_name, fields, is_new)
    }

    /// Второй проход: связывает созданные узлы по дереву связей.
    fn unpack_links(
        &self,
        tree: Value,
        nodes: &[EntityRef],
        depth: usize,
    ) -> CodecResult<Option<EntityRef>> {
        if depth > self.max_depth {
            return Err(CodecError::unpack(format!(
                "entity graph exceeds maximum depth of {}",
                self.max_depth
            )));
        }

        let (id, links) = match tree {
            Value::Nil => return Ok(None),
            Value::Array(parts) => {
                let mut parts = parts.into_iter();
                (
                    parts.next().unwrap_or(Value::Nil),
                    parts.next().unwrap_or(Value::Nil),
                )
            }
            id => (id, Value::Nil),
        };

        let entity = node_at(nodes, &id)?;
        let links = match links {
            Value::Nil => Vec::new(),
            Value::Array(links) => links,
            other => {
                return Err(CodecError::unpack(format!(
                    "entity links must be an array, got {}",
                    other.type_name()
                )))
            }
        };

        for pair in links {
            let Some(Ok([name, target])) = pair.into_array().map(<[Value; 2]>::try_from) else {
                return Err(CodecError::unpack("entity link must be a [name, target] pair"));
            };
            let name = name
                .as_str()
                .ok_or_else(|| CodecError::unpack("entity link name must be a string"))?
                .to_string();

            let Some(kind) = entity.link_kind(&name) else {
                return Err(CodecError::MissingLink(format!("undefined association: {name}")));
            };
            let link = match kind {
                LinkKind::One => Link::One(self.unpack_links(target, nodes, depth + 1)?),
                LinkKind::Many => {
                    let Some(targets) = target.into_array() else {
                        return Err(CodecError::unpack(format!(
                            "collection link {name} must be an array"
                        )));
                    };
                    let mut resolved = Vec::with_capacity(targets.len());
                    for target in targets {
                        match self.unpack_links(target, nodes, depth + 1)? {
                            Some(e) => resolved.push(e),
                            None => {
                                return Err(CodecError::unpack(format!(
                                    "collection link {name} contains nil"
                                )))
                            }
                        }
                    }
                    Link::Many(resolved)
                }
            };
            entity.assign_link(&name, link)?;
        }

        Ok(Some(entity))
    }
}

fn node_at(
    nodes: &[EntityRef],
    id: &Value,
) -> CodecResult<EntityRef> {
    id.as_i64()
        .and_then(|i| usize::try_from(i).ok())
        .and_then(|i| nodes.get(i))
        .cloned()
        .ok_or_else(|| CodecError::unpack(format!("unknown entity reference {id:?}")))
}

impl<C: EntityCatalog> ValueCoder for EntityGraphCoder<C> {
    type Item = EntityRef;

    fn pack(
        &self,
        root: &EntityRef,
    ) -> CodecResult<Value> {
        let mut tracker = Tracker::default();
        let tree = self.pack_links(root, &mut tracker, 0)?;

        let mut out = Vec::with_capacity(tracker.nodes.len() + 1);
        out.push(tree);
        for node in &tracker.nodes {
            out.push(self.pack_node(node)?);
        }
        Ok(Value::Array(out))
    }

    fn unpack(
        &self,
        value: Value,
    ) -> CodecResult<EntityRef> {
        let Some(parts) = value.into_array() else {
            return Err(CodecError::unpack("entity graph payload must be an array"));
        };
        let mut parts = parts.into_iter();
        let tree = parts.next().unwrap_or(Value::Nil);

        let nodes = parts
            .map(|record| self.unpack_node(record))
            .collect::<CodecResult<Vec<_>>>()?;

        self.unpack_links(tree, &nodes, 0)?
            .ok_or_else(|| CodecError::unpack("entity graph has no root"))
    }
}

impl<C> std::fmt::Debug for EntityGraphCoder<C> {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("EntityGraphCoder")
            .field("max_depth", &self.max_depth)
            .finish_non_exhaustive()
    }
}
