use super::{EntityCatalog, EntityGraphCoder, EntityRef};
use crate::{
    codec::{CodecFactory, CodecOptions, Coder, MessagePackCodec, ValueCoder},
    msgpack::TypeKind,
    CodecError, CodecResult, ErrorExt, Value,
};

/// Extension-типы, допустимые в значениях колонок записей.
pub const RECORD_KINDS: &[TypeKind] = &[
    TypeKind::Symbol,
    TypeKind::Time,
    TypeKind::DateTime,
    TypeKind::Date,
    TypeKind::Decimal,
    TypeKind::ZonedTime,
];

/// Уровней вложенности MessagePack на один уровень дерева связей:
/// `[index, links]`, список связей, пара `[name, target]` и массив has_many.
const LINK_TREE_LEVELS: usize = 4;

/// Граф записей поверх MessagePack с ограниченным набором типов.
///
/// Значение колонки вне [`RECORD_KINDS`] и базовых типов MessagePack
/// (множество, открытый объект, целое шире 64 бит) не кодируется: запись
/// с таким атрибутом отклоняется с `PackError`.
#[derive(Debug)]
pub struct RecordCodec<C> {
    graph: EntityGraphCoder<C>,
    codec: MessagePackCodec,
}

impl<C: EntityCatalog> RecordCodec<C> {
    pub fn new(
        catalog: C,
        options: CodecOptions,
    ) -> CodecResult<Self> {
        let max_depth = options.max_depth;
        // глубину графа ограничивает EntityGraphCoder, кодек лишь не должен
        // сработать раньше него
        let options = CodecOptions {
            open_objects: None,
            max_depth: max_depth.saturating_mul(LINK_TREE_LEVELS).saturating_add(2),
            ..options
        };
        Ok(Self {
            graph: EntityGraphCoder::new(catalog).with_max_depth(max_depth),
            codec: CodecFactory::build(RECORD_KINDS, options)?,
        })
    }

    pub fn graph(&self) -> &EntityGraphCoder<C> {
        &self.graph
    }

    /// Поля записи, которые не могут быть закодированы.
    fn undeclared_fields(
        &self,
        record: &EntityRef,
    ) -> Vec<String> {
        let registry = self.codec.registry();
        record
            .fields()
            .into_iter()
            .filter(|(_, value)| match value {
                Value::BigInt(_) => true,
                other => other.kind().is_some_and(|k| !registry.has_kind(k)),
            })
            .map(|(name, _)| name)
            .collect()
    }
}

impl<C: EntityCatalog> Coder for RecordCodec<C> {
    type Value = EntityRef;

    fn encode(
        &self,
        record: &EntityRef,
    ) -> CodecResult<Vec<u8>> {
        let packed = self.graph.pack(record)?;
        self.codec.encode(&packed).map_err(|err| {
            let Some(receiver) = err.receiver().map(str::to_string) else {
                return err;
            };
            tracing::warn!(
                class = record.type_name(),
                status = %err.status_code(),
                error_class = %receiver,
                error_attrs = %self.undeclared_fields(record).join(", "),
                "Failed to encode record with RecordCodec"
            );
            CodecError::pack_value(
                format!("failed to pack record: undeclared type {receiver}"),
                receiver,
            )
        })
    }

    fn decode(
        &self,
        bytes: &[u8],
    ) -> CodecResult<EntityRef> {
        self.graph.unpack(self.codec.decode(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use super::*;
    use crate::entity::{Entity, Link, Model, Record, Schema};

    fn schema() -> Arc<Schema> {
        let mut schema = Schema::new();
        schema.register(
            Model::new("Shop")
                .column("id", "INTEGER")
                .column("name", "varchar")
                .column("opened_on", "date")
                .column("balance", "decimal")
                .has_many("products", "Product"),
        );
        schema.register(
            Model::new("Product")
                .column("id", "INTEGER")
                .column("tags", "json")
                .belongs_to("shop", "Shop"),
        );
        Arc::new(schema)
    }

    #[test]
    fn test_roundtrip_with_extension_types() {
        let schema = schema();
        let codec = RecordCodec::new(schema.clone(), CodecOptions::default()).unwrap();
        let shop = schema
            .instantiate(
                "Shop",
                vec![
                    ("id".into(), Value::Int(1)),
                    ("name".into(), Value::from("Snow Devil")),
                    (
                        "opened_on".into(),
                        Value::Date(NaiveDate::from_ymd_opt(2017, 2, 8).unwrap()),
                    ),
                    ("balance".into(), Value::Decimal(Decimal::new(12345, 2))),
                ],
                false,
            )
            .unwrap();
        let product = schema
            .instantiate("Product", vec![("id".into(), Value::Int(2))], false)
            .unwrap();
        shop.assign_link("products", Link::Many(vec![product.clone()]))
            .unwrap();
        product
            .assign_link("shop", Link::One(Some(shop.clone())))
            .unwrap();

        let back = codec.decode(&codec.encode(&shop).unwrap()).unwrap();
        let record = Record::downcast(&back).unwrap();
        assert_eq!(record.fields(), shop.fields());
        assert_eq!(record.many("products").len(), 1);
    }

    #[test]
    fn test_undeclared_type_rejected() {
        let schema = schema();
        let codec = RecordCodec::new(schema.clone(), CodecOptions::default()).unwrap();
        let product = schema
            .instantiate(
                "Product",
                vec![("tags".into(), Value::Set(vec![Value::from("a")]))],
                false,
            )
            .unwrap();

        let err = codec.encode(&product).unwrap_err();
        assert!(err.is_pack());
        assert_eq!(err.receiver(), Some("Set"));
        assert!(err.to_string().contains("undeclared type"));
        assert_eq!(codec.undeclared_fields(&product), vec!["tags".to_string()]);
    }

    fn chain(
        schema: &Schema,
        len: usize,
    ) -> EntityRef {
        let mut head = schema
            .instantiate("Step", vec![("id".into(), Value::from(len as u64))], false)
            .unwrap();
        for i in (0..len).rev() {
            let step = schema
                .instantiate("Step", vec![("id".into(), Value::from(i as u64))], false)
                .unwrap();
            step.assign_link("next", Link::One(Some(head))).unwrap();
            head = step;
        }
        head
    }

    fn steps() -> Arc<Schema> {
        let mut schema = Schema::new();
        schema.register(
            Model::new("Step")
                .column("id", "INTEGER")
                .belongs_to("next", "Step"),
        );
        Arc::new(schema)
    }

    /// Длинная цепочка кодируется целиком: вложенность дерева связей не
    /// упирается в лимит MessagePack раньше лимита графа.
    #[test]
    fn test_long_chain_roundtrip() {
        let schema = steps();
        let codec = RecordCodec::new(schema.clone(), CodecOptions::default()).unwrap();
        let head = chain(&schema, 200);

        let back = codec.decode(&codec.encode(&head).unwrap()).unwrap();
        let mut node = back;
        for i in 0..200 {
            let next = {
                let record = Record::downcast(&node).unwrap();
                assert_eq!(record.get("id"), Some(Value::Int(i)));
                record.one("next").unwrap()
            };
            node = next;
        }
        assert_eq!(Record::downcast(&node).unwrap().get("id"), Some(Value::Int(200)));
    }

    /// Превышение глубины графа отдаётся как есть, без подмены на ошибку
    /// незаявленного типа.
    #[test]
    fn test_depth_error_is_not_rewritten() {
        let schema = steps();
        let codec = RecordCodec::new(
            schema.clone(),
            CodecOptions::default().max_depth(16),
        )
        .unwrap();

        let err = codec.encode(&chain(&schema, 40)).unwrap_err();
        assert!(err.is_pack());
        assert_eq!(err.receiver(), None);
        assert!(err.to_string().contains("maximum depth of 16"));
        assert!(!err.to_string().contains("undeclared type"));

        assert!(codec.encode(&chain(&schema, 10)).is_ok());
    }

    #[test]
    fn test_big_integers_rejected() {
        let schema = schema();
        let codec = RecordCodec::new(schema.clone(), CodecOptions::default()).unwrap();
        let product = schema
            .instantiate("Product", vec![("id".into(), Value::BigInt(1 << 70))], false)
            .unwrap();

        assert!(codec.encode(&product).unwrap_err().is_pack());
    }
}
