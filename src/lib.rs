//! typewalk - schema-driven traversal of heterogeneous object graphs
//!
//! A declarative type model describes which datatypes exist and which of
//! their properties are identity, composite (owned) or reference (shared);
//! a generic fold-style walker traverses an arbitrary [`value::Value`]
//! graph and emits a deterministic event stream usable for serialization,
//! pretty-printing, diffing, or deep-copy.
//!
//! ## Quick start
//!
//! ```rust
//! use typewalk::{parse_model, pretty, Record, RecordIntrospector, STD_MODEL};
//!
//! let (mut model, _issues) = parse_model(STD_MODEL).unwrap();
//! model
//!     .register_from_str(
//!         r#"
//!         namespace app {
//!             datatype A {
//!                 composite-val prop1 : String
//!             }
//!         }
//!         "#,
//!     )
//!     .unwrap();
//!
//! let introspector = RecordIntrospector::new(&model);
//! let value = Record::new("A").with("prop1", "hello").into_value();
//! let trace = pretty(&model, &introspector, &value).unwrap();
//! assert_eq!(trace, "A { prop1 = 'hello' }");
//! ```
//!
//! Custom event handling goes through [`walk::Walker`] with a
//! [`walk::WalkHandlers`] record; every hook defaults to the identity
//! function, so callers override only the events they care about.

// Core error handling
pub mod error;

// Runtime values and the introspection capability
pub mod introspect;
pub mod value;

// The declarative type model and its text format
pub mod model;
pub mod parser;

// The walker engine
pub mod walk;

// Ready-made primitive mappers
pub mod mappers;

// Essential error types
pub use error::{ParseIssue, TypewalkError};

// Model types
pub use model::{
    BuiltinCollection, CollectionType, Datatype, DatatypeProperty, EnumType, ModelBuilder,
    Namespace, PrimitiveType, PropertyCharacteristic, TypeDeclaration, TypeId, TypeInstance,
    TypeModel, TypeRef, ValueKind, STD_MODEL,
};

// Parsing
pub use parser::parse_model;

// Values and introspection
pub use introspect::{ObjectIntrospector, RecordIntrospector};
pub use value::{DynObject, EnumValue, OpaqueValue, Primitive, PrimitiveMapper, Record, Value};

// Walking
pub use walk::{pretty, WalkConfig, WalkHandlers, WalkInfo, Walker};
