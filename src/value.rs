//! Dynamic runtime values the walker traverses
//!
//! The walker operates on `Value`, a dynamic representation of a
//! heterogeneous object graph: primitives, enum literals, ordered
//! collections, insertion-ordered maps, and objects. Objects are trait
//! objects (`DynObject`) so applications can expose their own types through
//! an [`crate::introspect::ObjectIntrospector`]; `Record` is the ready-made
//! implementation used by the built-in introspector.
//!
//! Maps are entry *lists*: walk order and separator placement are
//! structurally deterministic. Callers with unordered host maps choose an
//! ordering when converting.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

/// A dynamic value in a runtime object graph.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Primitive(Primitive),
    Enum(EnumValue),
    List(Vec<Value>),
    Set(Vec<Value>),
    Map(Vec<(Value, Value)>),
    Object(Rc<dyn DynObject>),
}

impl Value {
    /// Wrap a `DynObject` implementation.
    pub fn object(obj: impl DynObject + 'static) -> Self {
        Value::Object(Rc::new(obj))
    }

    /// The runtime type identifier used for classification against the
    /// model's registration table.
    pub fn type_name(&self) -> &str {
        match self {
            Value::Null => "Null",
            Value::Primitive(p) => p.type_name(),
            Value::Enum(e) => &e.type_name,
            Value::List(_) => "List",
            Value::Set(_) => "Set",
            Value::Map(_) => "Map",
            Value::Object(o) => o.type_name(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Primitive(a), Value::Primitive(b)) => a == b,
            (Value::Enum(a), Value::Enum(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Set(a), Value::Set(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            // objects compare by handle identity
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Primitive(Primitive::Bool(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Primitive(Primitive::Int(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Primitive(Primitive::Decimal(v))
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Primitive(Primitive::Str(v.to_string()))
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Primitive(Primitive::Str(v))
    }
}

impl From<Primitive> for Value {
    fn from(v: Primitive) -> Self {
        Value::Primitive(v)
    }
}

impl From<EnumValue> for Value {
    fn from(v: EnumValue) -> Self {
        Value::Enum(v)
    }
}

/// A primitive value: one of the built-in kinds, or an application-level
/// primitive carried opaquely (converted only by a [`PrimitiveMapper`]).
#[derive(Debug, Clone)]
pub enum Primitive {
    Bool(bool),
    Int(i64),
    Decimal(f64),
    Str(String),
    Opaque(OpaqueValue),
}

impl Primitive {
    pub fn type_name(&self) -> &str {
        match self {
            Primitive::Bool(_) => "Bool",
            Primitive::Int(_) => "Int",
            Primitive::Decimal(_) => "Decimal",
            Primitive::Str(_) => "String",
            Primitive::Opaque(o) => o.type_name(),
        }
    }
}

impl PartialEq for Primitive {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Primitive::Bool(a), Primitive::Bool(b)) => a == b,
            (Primitive::Int(a), Primitive::Int(b)) => a == b,
            (Primitive::Decimal(a), Primitive::Decimal(b)) => a == b,
            (Primitive::Str(a), Primitive::Str(b)) => a == b,
            (Primitive::Opaque(a), Primitive::Opaque(b)) => a == b,
            _ => false,
        }
    }
}

/// An application-level primitive: a declared type name plus an opaque
/// payload. The walker never looks inside; a registered mapper converts it
/// to and from a raw `Primitive` for consumers that need one.
#[derive(Clone)]
pub struct OpaqueValue {
    type_name: String,
    value: Rc<dyn Any>,
}

impl OpaqueValue {
    pub fn new<T: 'static>(type_name: impl Into<String>, value: T) -> Self {
        Self {
            type_name: type_name.into(),
            value: Rc::new(value),
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }
}

impl fmt::Debug for OpaqueValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpaqueValue")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

impl PartialEq for OpaqueValue {
    fn eq(&self, other: &Self) -> bool {
        self.type_name == other.type_name && Rc::ptr_eq(&self.value, &other.value)
    }
}

/// An enum literal: the enum's runtime type name plus the literal name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValue {
    pub type_name: String,
    pub literal: String,
}

impl EnumValue {
    pub fn new(type_name: impl Into<String>, literal: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            literal: literal.into(),
        }
    }
}

/// The object side of the introspection capability: anything with a runtime
/// type name that an [`crate::introspect::ObjectIntrospector`] knows how to
/// read. Implementations expose their concrete type through `as_any` so an
/// introspector can downcast.
pub trait DynObject: fmt::Debug {
    fn type_name(&self) -> &str;
    fn as_any(&self) -> &dyn Any;
}

/// Ready-made `DynObject`: a type name plus insertion-ordered named fields.
/// Field storage uses interior mutability so `set_property` works through a
/// shared `Rc<dyn DynObject>` handle.
#[derive(Debug)]
pub struct Record {
    type_name: String,
    fields: RefCell<IndexMap<String, Value>>,
}

impl Record {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: RefCell::new(IndexMap::new()),
        }
    }

    /// Builder-style field initialisation.
    pub fn with(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.borrow_mut().insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.fields.borrow().get(name).cloned()
    }

    pub fn set(&self, name: impl Into<String>, value: Value) {
        self.fields.borrow_mut().insert(name.into(), value);
    }

    pub fn field_names(&self) -> Vec<String> {
        self.fields.borrow().keys().cloned().collect()
    }

    /// Mutate a field in place; returns `None` when the field is absent.
    pub fn modify<R>(&self, name: &str, f: impl FnOnce(&mut Value) -> R) -> Option<R> {
        self.fields.borrow_mut().get_mut(name).map(f)
    }

    pub fn into_value(self) -> Value {
        Value::Object(Rc::new(self))
    }
}

impl DynObject for Record {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

type ToRawFn = Box<dyn Fn(&OpaqueValue) -> Option<Primitive> + Send + Sync>;
type FromRawFn = Box<dyn Fn(&Primitive) -> Option<OpaqueValue> + Send + Sync>;

/// Bidirectional conversion between an application primitive and a raw
/// representation, keyed by the application type name. Registered on the
/// model and handed to the walker's `primitive` hook; it never changes
/// traversal shape.
pub struct PrimitiveMapper {
    primitive_type: String,
    raw_type: String,
    to_raw: ToRawFn,
    from_raw: FromRawFn,
}

impl PrimitiveMapper {
    /// Typed constructor: the conversion closures see the payload type `T`,
    /// downcasting is handled here. A payload of another type converts to
    /// `None` rather than failing the walk.
    pub fn create<T: 'static>(
        primitive_type: impl Into<String>,
        raw_type: impl Into<String>,
        to_raw: impl Fn(&T) -> Primitive + Send + Sync + 'static,
        from_raw: impl Fn(&Primitive) -> Option<T> + Send + Sync + 'static,
    ) -> Self {
        let primitive_type = primitive_type.into();
        let name_for_from = primitive_type.clone();
        Self {
            primitive_type,
            raw_type: raw_type.into(),
            to_raw: Box::new(move |op| op.downcast_ref::<T>().map(&to_raw)),
            from_raw: Box::new(move |raw| {
                from_raw(raw).map(|v| OpaqueValue::new(name_for_from.clone(), v))
            }),
        }
    }

    pub fn primitive_type(&self) -> &str {
        &self.primitive_type
    }

    pub fn raw_type(&self) -> &str {
        &self.raw_type
    }

    pub fn to_raw(&self, value: &OpaqueValue) -> Option<Primitive> {
        (self.to_raw)(value)
    }

    pub fn from_raw(&self, raw: &Primitive) -> Option<OpaqueValue> {
        (self.from_raw)(raw)
    }
}

impl fmt::Debug for PrimitiveMapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrimitiveMapper")
            .field("primitive_type", &self.primitive_type)
            .field("raw_type", &self.raw_type)
            .finish_non_exhaustive()
    }
}
