//! Нижележащий бинарный кодек: MessagePack с реестром extension-типов.

pub mod decode;
pub mod encode;
pub mod object;
pub mod registry;
pub mod tags;
pub mod types;

pub use decode::{decode_value, Decoder};
pub use encode::{encode_into, encode_value, Encoder};
pub use object::{FromPack, ObjectRegistry, ObjectUnpacker, Packable};
pub use registry::{override_order, TypeRegistry, TypeRegistryBuilder, DEFAULT_MAX_DEPTH};
pub use types::{PackFn, TypeDescriptor, TypeKind, UnpackFn, BUILTIN};
