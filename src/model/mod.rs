//! The declarative type model
//!
//! Namespaces own type declarations (primitive, enum, collection,
//! datatype); datatypes own classified properties; the registry resolves
//! type references and classifies runtime values. Built once, read-only
//! afterwards.

pub mod builder;
pub mod declaration;
pub mod namespace;
pub mod property;
pub mod reference;
pub mod registry;

pub use builder::ModelBuilder;
pub use declaration::{
    BuiltinCollection, CollectionType, Datatype, EnumType, PrimitiveType, TypeDeclaration,
};
pub use namespace::Namespace;
pub use property::{DatatypeProperty, PropertyCharacteristic};
pub use reference::{TypeId, TypeInstance, TypeRef};
pub use registry::{TypeModel, ValueKind, STD_MODEL};
