use std::{collections::HashMap, fmt, sync::Arc};

use stashpack_error::{CodecError, CodecResult};

use super::{
    object::ObjectRegistry,
    types::{TypeDescriptor, TypeKind, BUILTIN},
};

/// Максимальная глубина вложенности массивов, map и extension'ов.
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// Неизменяемая после сборки таблица extension-типов.
///
/// Для каждого зарегистрированного [`TypeKind`] хранит ровно один активный
/// упаковщик и распаковщики для всех известных кодов этого типа, включая
/// форматы из более новых версий: старый читатель декодирует payload
/// нового писателя, если код ему известен.
#[derive(Clone)]
pub struct TypeRegistry {
    format_version: u8,
    max_depth: usize,
    kinds: Vec<TypeKind>,
    packers: HashMap<TypeKind, TypeDescriptor>,
    unpackers: HashMap<i8, TypeDescriptor>,
    objects: Option<Arc<ObjectRegistry>>,
}

impl TypeRegistry {
    pub fn builder() -> TypeRegistryBuilder {
        TypeRegistryBuilder::new()
    }

    pub fn format_version(&self) -> u8 {
        self.format_version
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Зарегистрированные типы в порядке регистрации.
    pub fn kinds(&self) -> &[TypeKind] {
        &self.kinds
    }

    pub fn has_kind(
        &self,
        kind: TypeKind,
    ) -> bool {
        self.packers.contains_key(&kind)
    }

    pub fn packer(
        &self,
        kind: TypeKind,
    ) -> Option<&TypeDescriptor> {
        self.packers.get(&kind)
    }

    pub fn unpacker(
        &self,
        code: i8,
    ) -> Option<&TypeDescriptor> {
        self.unpackers.get(&code)
    }

    pub fn objects(&self) -> Option<&ObjectRegistry> {
        self.objects.as_deref()
    }

    /// Копия реестра с дополнительным типом. Исходный реестр не меняется.
    pub fn with_kind(
        &self,
        kind: TypeKind,
    ) -> CodecResult<TypeRegistry> {
        let mut next = self.clone();
        next.install(kind)?;
        Ok(next)
    }

    fn empty(
        format_version: u8,
        max_depth: usize,
        objects: Option<Arc<ObjectRegistry>>,
    ) -> Self {
        Self {
            format_version,
            max_depth,
            kinds: Vec::new(),
            packers: HashMap::new(),
            unpackers: HashMap::new(),
            objects,
        }
    }

    fn install(
        &mut self,
        kind: TypeKind,
    ) -> CodecResult<()> {
        if self.kinds.contains(&kind) {
            return Ok(());
        }

        let order = override_order(BUILTIN, kind, self.format_version)?;
        for desc in &order {
            self.unpackers.insert(desc.code, **desc);
        }
        // последний элемент порядка и есть активный упаковщик
        if let Some(active) = order.last() {
            self.packers.insert(kind, **active);
            tracing::debug!(
                kind = %kind,
                code = active.code,
                version = active.version,
                format_version = self.format_version,
                "Registered type descriptor"
            );
        }
        self.kinds.push(kind);
        Ok(())
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::empty(0, DEFAULT_MAX_DEPTH, None)
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("format_version", &self.format_version)
            .field("max_depth", &self.max_depth)
            .field("kinds", &self.kinds)
            .field("objects", &self.objects)
            .finish()
    }
}

/// Явный порядок установки дескрипторов одного типа.
///
/// Сначала идут дескрипторы будущих версий (`version > format_version`),
/// затем прошлые по возрастанию версии. Последний элемент становится
/// активным упаковщиком, все элементы устанавливаются как распаковщики.
pub fn override_order(
    table: &'static [TypeDescriptor],
    kind: TypeKind,
    format_version: u8,
) -> CodecResult<Vec<&'static TypeDescriptor>> {
    let (mut past, future): (Vec<&'static TypeDescriptor>, Vec<_>) = table
        .iter()
        .filter(|desc| desc.kind == kind)
        .partition(|desc| desc.version <= format_version);

    if past.is_empty() {
        return Err(CodecError::MissingTypeDescriptor {
            type_name: kind.name().to_string(),
            format_version,
        });
    }

    past.sort_by_key(|desc| desc.version);
    Ok(future.into_iter().chain(past).collect())
}

/// Сборщик [`TypeRegistry`].
#[derive(Debug, Clone)]
pub struct TypeRegistryBuilder {
    format_version: u8,
    max_depth: usize,
    kinds: Vec<TypeKind>,
    objects: Option<ObjectRegistry>,
}

impl TypeRegistryBuilder {
    pub fn new() -> Self {
        Self {
            format_version: 0,
            max_depth: DEFAULT_MAX_DEPTH,
            kinds: Vec::new(),
            objects: None,
        }
    }

    pub fn format_version(
        mut self,
        version: u8,
    ) -> Self {
        self.format_version = version;
        self
    }

    pub fn max_depth(
        mut self,
        depth: usize,
    ) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn kind(
        mut self,
        kind: TypeKind,
    ) -> Self {
        self.kinds.push(kind);
        self
    }

    pub fn kinds(
        mut self,
        kinds: impl IntoIterator<Item = TypeKind>,
    ) -> Self {
        self.kinds.extend(kinds);
        self
    }

    /// Включает extension открытых объектов с данной таблицей типов.
    pub fn open_objects(
        mut self,
        objects: ObjectRegistry,
    ) -> Self {
        self.objects = Some(objects);
        self
    }

    pub fn build(self) -> CodecResult<TypeRegistry> {
        let open = self.objects.is_some();
        let mut registry =
            TypeRegistry::empty(self.format_version, self.max_depth, self.objects.map(Arc::new));

        for kind in self.kinds {
            registry.install(kind)?;
        }
        if open {
            registry.install(TypeKind::Object)?;
        }
        Ok(registry)
    }
}

impl Default for TypeRegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}
