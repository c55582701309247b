//! The graph walker engine
//!
//! A configurable recursive visitor: given a [`TypeModel`], an
//! [`ObjectIntrospector`] and a root [`Value`], it produces a left-to-right
//! deterministic event stream over objects, properties, collection
//! elements, map entries, primitives, enums, references and nulls, folding
//! a `(path, accumulator)` state through every event.
//!
//! The walk is single-threaded, strictly depth-first, and unbounded:
//! composite edges must form an acyclic graph (a composite cycle recurses
//! until stack exhaustion). Any value the model cannot classify aborts the
//! walk with an error carrying the partial path; there is no partial
//! recovery.

use std::rc::Rc;

use tracing::trace;

use crate::error::TypewalkError;
use crate::introspect::ObjectIntrospector;
use crate::model::declaration::{CollectionType, Datatype};
use crate::model::property::DatatypeProperty;
use crate::model::registry::{TypeModel, ValueKind};
use crate::value::{DynObject, EnumValue, Primitive, PrimitiveMapper, Value};

/// The fold state threaded through every traversal event: a caller-defined
/// "up" value plus the accumulator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkInfo<P, A> {
    pub up: P,
    pub acc: A,
}

impl<P, A> WalkInfo<P, A> {
    pub fn new(up: P, acc: A) -> Self {
        Self { up, acc }
    }
}

/// Path markers for positions that are not property names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkConfig {
    pub elements: String,
    pub entries: String,
    pub key: String,
    pub value: String,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            elements: "$elements".to_string(),
            entries: "$entries".to_string(),
            key: "$key".to_string(),
            value: "$value".to_string(),
        }
    }
}

pub type ObjectHook<P, A> =
    Box<dyn Fn(&[String], WalkInfo<P, A>, &Rc<dyn DynObject>, &Datatype) -> WalkInfo<P, A>>;
pub type PropertyHook<P, A> =
    Box<dyn Fn(&[String], WalkInfo<P, A>, &DatatypeProperty) -> WalkInfo<P, A>>;
pub type MapHook<P, A> =
    Box<dyn Fn(&[String], WalkInfo<P, A>, &[(Value, Value)]) -> WalkInfo<P, A>>;
pub type MapEntryHook<P, A> =
    Box<dyn Fn(&[String], WalkInfo<P, A>, &(Value, Value)) -> WalkInfo<P, A>>;
pub type MapSeparateHook<P, A> = Box<
    dyn Fn(&[String], WalkInfo<P, A>, &[(Value, Value)], &(Value, Value)) -> WalkInfo<P, A>,
>;
pub type CollHook<P, A> =
    Box<dyn Fn(&[String], WalkInfo<P, A>, &CollectionType, &[Value]) -> WalkInfo<P, A>>;
pub type CollElementHook<P, A> = Box<dyn Fn(&[String], WalkInfo<P, A>, &Value) -> WalkInfo<P, A>>;
pub type CollSeparateHook<P, A> = Box<
    dyn Fn(&[String], WalkInfo<P, A>, &CollectionType, &[Value], &Value) -> WalkInfo<P, A>,
>;
pub type ReferenceHook<P, A> =
    Box<dyn Fn(&[String], WalkInfo<P, A>, &Value, &DatatypeProperty) -> WalkInfo<P, A>>;
pub type PrimitiveHook<P, A> = Box<
    dyn Fn(&[String], WalkInfo<P, A>, &Primitive, Option<&PrimitiveMapper>) -> WalkInfo<P, A>,
>;
pub type EnumHook<P, A> = Box<dyn Fn(&[String], WalkInfo<P, A>, &EnumValue) -> WalkInfo<P, A>>;
pub type NullHook<P, A> = Box<dyn Fn(&[String], WalkInfo<P, A>) -> WalkInfo<P, A>>;

/// The walker's hook record. Every hook defaults to the identity function;
/// override only the ones you need via struct-update syntax:
///
/// ```ignore
/// let handlers = WalkHandlers::<(), String> {
///     null_value: Box::new(|_, info| WalkInfo::new(info.up, "null".to_string())),
///     ..WalkHandlers::default()
/// };
/// ```
pub struct WalkHandlers<P, A> {
    pub object_begin: ObjectHook<P, A>,
    pub object_end: ObjectHook<P, A>,
    pub property_begin: PropertyHook<P, A>,
    pub property_end: PropertyHook<P, A>,
    pub map_begin: MapHook<P, A>,
    pub map_entry_key_begin: MapEntryHook<P, A>,
    pub map_entry_key_end: MapEntryHook<P, A>,
    pub map_entry_value_begin: MapEntryHook<P, A>,
    pub map_entry_value_end: MapEntryHook<P, A>,
    pub map_separate: MapSeparateHook<P, A>,
    pub map_end: MapHook<P, A>,
    pub coll_begin: CollHook<P, A>,
    pub coll_element_begin: CollElementHook<P, A>,
    pub coll_element_end: CollElementHook<P, A>,
    pub coll_separate: CollSeparateHook<P, A>,
    pub coll_end: CollHook<P, A>,
    pub reference: ReferenceHook<P, A>,
    pub primitive: PrimitiveHook<P, A>,
    pub enum_value: EnumHook<P, A>,
    pub null_value: NullHook<P, A>,
}

impl<P, A> Default for WalkHandlers<P, A> {
    fn default() -> Self {
        Self {
            object_begin: Box::new(|_, info, _, _| info),
            object_end: Box::new(|_, info, _, _| info),
            property_begin: Box::new(|_, info, _| info),
            property_end: Box::new(|_, info, _| info),
            map_begin: Box::new(|_, info, _| info),
            map_entry_key_begin: Box::new(|_, info, _| info),
            map_entry_key_end: Box::new(|_, info, _| info),
            map_entry_value_begin: Box::new(|_, info, _| info),
            map_entry_value_end: Box::new(|_, info, _| info),
            map_separate: Box::new(|_, info, _, _| info),
            map_end: Box::new(|_, info, _| info),
            coll_begin: Box::new(|_, info, _, _| info),
            coll_element_begin: Box::new(|_, info, _| info),
            coll_element_end: Box::new(|_, info, _| info),
            coll_separate: Box::new(|_, info, _, _, _| info),
            coll_end: Box::new(|_, info, _, _| info),
            reference: Box::new(|_, info, _, _| info),
            primitive: Box::new(|_, info, _, _| info),
            enum_value: Box::new(|_, info, _| info),
            null_value: Box::new(|_, info| info),
        }
    }
}

/// The walker: a read-only type model, an introspector, and the hook
/// record, built once before the walk begins.
pub struct Walker<'w, P, A> {
    model: &'w TypeModel,
    introspector: &'w dyn ObjectIntrospector,
    handlers: WalkHandlers<P, A>,
    config: WalkConfig,
}

impl<'w, P: Clone, A> Walker<'w, P, A> {
    pub fn new(
        model: &'w TypeModel,
        introspector: &'w dyn ObjectIntrospector,
        handlers: WalkHandlers<P, A>,
    ) -> Self {
        Self {
            model,
            introspector,
            handlers,
            config: WalkConfig::default(),
        }
    }

    pub fn with_config(mut self, config: WalkConfig) -> Self {
        self.config = config;
        self
    }

    /// Walk a root value, threading `info` through every event.
    pub fn walk(&self, info: WalkInfo<P, A>, value: &Value) -> Result<WalkInfo<P, A>, TypewalkError> {
        let path: Vec<String> = Vec::new();
        self.walk_value(None, &path, info, value)
    }

    fn walk_value(
        &self,
        owning: Option<&DatatypeProperty>,
        path: &[String],
        info: WalkInfo<P, A>,
        value: &Value,
    ) -> Result<WalkInfo<P, A>, TypewalkError> {
        if value.is_null() {
            return Ok(self.walk_null(path, info));
        }
        match self.model.classify(value) {
            ValueKind::Primitive => Ok(self.walk_primitive(path, info, value)),
            ValueKind::Enum => Ok(self.walk_enum(path, info, value)),
            ValueKind::Collection => self.walk_collection(owning, path, info, value),
            ValueKind::Datatype => self.walk_object(path, info, value),
            ValueKind::Unknown => Err(TypewalkError::UnknownRuntimeType {
                type_name: value.type_name().to_string(),
                path: path.to_vec(),
            }),
        }
    }

    fn walk_property_value(
        &self,
        property: &DatatypeProperty,
        path: &[String],
        info: WalkInfo<P, A>,
        value: &Value,
    ) -> Result<WalkInfo<P, A>, TypewalkError> {
        if value.is_null() {
            return Ok(self.walk_null(path, info));
        }
        if self.model.classify(value) == ValueKind::Primitive {
            return Ok(self.walk_primitive(path, info, value));
        }
        if property.is_composite {
            self.walk_value(Some(property), path, info, value)
        } else {
            self.walk_reference(property, path, info, value)
        }
    }

    fn walk_object(
        &self,
        path: &[String],
        info: WalkInfo<P, A>,
        value: &Value,
    ) -> Result<WalkInfo<P, A>, TypewalkError> {
        let Value::Object(obj) = value else {
            return Err(TypewalkError::UnknownDatatype {
                type_name: value.type_name().to_string(),
                path: path.to_vec(),
            });
        };
        let datatype = self.model.find_datatype_for(obj.type_name()).ok_or_else(|| {
            TypewalkError::UnknownDatatype {
                type_name: obj.type_name().to_string(),
                path: path.to_vec(),
            }
        })?;
        let up_outer = info.up.clone();
        let info_ob = (self.handlers.object_begin)(path, info, obj, datatype);
        let up_ob = info_ob.up;
        let mut acc = info_ob.acc;
        let properties = datatype.all_explicit_properties(self.model)?;
        for property in properties.values() {
            if property.ignore {
                trace!(property = %property.name, "skipping ignored property");
                continue;
            }
            let prop_value = self
                .introspector
                .get_property(obj.as_ref(), &property.name)
                .map_err(|e| e.at_path(path))?;
            let mut ppath = path.to_vec();
            ppath.push(property.name.clone());
            let info_pb = (self.handlers.property_begin)(
                &ppath,
                WalkInfo::new(up_ob.clone(), acc),
                property,
            );
            let info_pv = self.walk_property_value(
                property,
                &ppath,
                WalkInfo::new(up_ob.clone(), info_pb.acc),
                &prop_value,
            )?;
            let info_pe = (self.handlers.property_end)(
                &ppath,
                WalkInfo::new(up_ob.clone(), info_pv.acc),
                property,
            );
            acc = info_pe.acc;
        }
        Ok((self.handlers.object_end)(
            path,
            WalkInfo::new(up_outer, acc),
            obj,
            datatype,
        ))
    }

    fn walk_collection(
        &self,
        owning: Option<&DatatypeProperty>,
        path: &[String],
        info: WalkInfo<P, A>,
        value: &Value,
    ) -> Result<WalkInfo<P, A>, TypewalkError> {
        let coll_type = self.model.find_collection_type_for(value).ok_or_else(|| {
            TypewalkError::UnknownCollectionType {
                type_name: value.type_name().to_string(),
                path: path.to_vec(),
            }
        })?;
        match value {
            Value::List(items) | Value::Set(items) => {
                self.walk_coll(owning, path, info, coll_type, items)
            }
            Value::Map(entries) => self.walk_map(owning, path, info, coll_type, entries),
            _ => Err(TypewalkError::UnknownCollectionType {
                type_name: value.type_name().to_string(),
                path: path.to_vec(),
            }),
        }
    }

    fn walk_coll(
        &self,
        owning: Option<&DatatypeProperty>,
        path: &[String],
        info: WalkInfo<P, A>,
        coll_type: &CollectionType,
        items: &[Value],
    ) -> Result<WalkInfo<P, A>, TypewalkError> {
        let info_cb = (self.handlers.coll_begin)(path, info, coll_type, items);
        let up_cb = info_cb.up;
        let mut acc = info_cb.acc;
        let mut elements_path = path.to_vec();
        elements_path.push(self.config.elements.clone());
        let count = items.len();
        for (index, element) in items.iter().enumerate() {
            let mut ppath = elements_path.clone();
            ppath.push(index.to_string());
            let info_eb = (self.handlers.coll_element_begin)(
                &ppath,
                WalkInfo::new(up_cb.clone(), acc),
                element,
            );
            let info_ev = self.walk_coll_value(owning, &ppath, info_eb, element)?;
            let info_ee = (self.handlers.coll_element_end)(&ppath, info_ev, element);
            acc = if index + 1 < count {
                (self.handlers.coll_separate)(&ppath, info_ee, coll_type, items, element).acc
            } else {
                info_ee.acc
            };
        }
        Ok((self.handlers.coll_end)(
            path,
            WalkInfo::new(up_cb, acc),
            coll_type,
            items,
        ))
    }

    fn walk_coll_value(
        &self,
        owning: Option<&DatatypeProperty>,
        path: &[String],
        info: WalkInfo<P, A>,
        value: &Value,
    ) -> Result<WalkInfo<P, A>, TypewalkError> {
        if value.is_null() {
            return Ok(self.walk_null(path, info));
        }
        if self.model.classify(value) == ValueKind::Primitive {
            return Ok(self.walk_primitive(path, info, value));
        }
        match owning {
            None => self.walk_value(owning, path, info, value),
            Some(property) if property.is_composite => self.walk_value(owning, path, info, value),
            Some(property) => self.walk_reference(property, path, info, value),
        }
    }

    fn walk_map(
        &self,
        owning: Option<&DatatypeProperty>,
        path: &[String],
        info: WalkInfo<P, A>,
        _coll_type: &CollectionType,
        entries: &[(Value, Value)],
    ) -> Result<WalkInfo<P, A>, TypewalkError> {
        let info_mb = (self.handlers.map_begin)(path, info, entries);
        let up_mb = info_mb.up;
        let mut acc = info_mb.acc;
        let mut entries_path = path.to_vec();
        entries_path.push(self.config.entries.clone());
        let count = entries.len();
        for (index, entry) in entries.iter().enumerate() {
            let mut ppath = entries_path.clone();
            ppath.push(index.to_string());
            let mut key_path = ppath.clone();
            key_path.push(self.config.key.clone());
            let mut value_path = ppath.clone();
            value_path.push(self.config.value.clone());
            let info_kb = (self.handlers.map_entry_key_begin)(
                &key_path,
                WalkInfo::new(up_mb.clone(), acc),
                entry,
            );
            let info_kv = self.walk_map_entry_key(owning, &key_path, info_kb, &entry.0)?;
            let info_ke = (self.handlers.map_entry_key_end)(&key_path, info_kv, entry);
            let info_vb = (self.handlers.map_entry_value_begin)(&value_path, info_ke, entry);
            let info_vv = self.walk_map_entry_value(owning, &value_path, info_vb, &entry.1)?;
            let info_ve = (self.handlers.map_entry_value_end)(&value_path, info_vv, entry);
            acc = if index + 1 < count {
                (self.handlers.map_separate)(&ppath, info_ve, entries, entry).acc
            } else {
                info_ve.acc
            };
        }
        Ok((self.handlers.map_end)(
            path,
            WalkInfo::new(up_mb, acc),
            entries,
        ))
    }

    fn walk_map_entry_key(
        &self,
        owning: Option<&DatatypeProperty>,
        path: &[String],
        info: WalkInfo<P, A>,
        key: &Value,
    ) -> Result<WalkInfo<P, A>, TypewalkError> {
        // keys are primitive or reference, unless the map is the traversal
        // root (no owning property), in which case they walk as full values
        if key.is_null() {
            return Ok(self.walk_null(path, info));
        }
        if self.model.classify(key) == ValueKind::Primitive {
            return Ok(self.walk_primitive(path, info, key));
        }
        match owning {
            None => self.walk_value(owning, path, info, key),
            Some(property) => self.walk_reference(property, path, info, key),
        }
    }

    fn walk_map_entry_value(
        &self,
        owning: Option<&DatatypeProperty>,
        path: &[String],
        info: WalkInfo<P, A>,
        value: &Value,
    ) -> Result<WalkInfo<P, A>, TypewalkError> {
        if value.is_null() {
            return Ok(self.walk_null(path, info));
        }
        if self.model.classify(value) == ValueKind::Primitive {
            return Ok(self.walk_primitive(path, info, value));
        }
        match owning {
            None => self.walk_value(owning, path, info, value),
            Some(property) if property.is_composite => self.walk_value(owning, path, info, value),
            Some(property) => self.walk_reference(property, path, info, value),
        }
    }

    fn walk_reference(
        &self,
        property: &DatatypeProperty,
        path: &[String],
        info: WalkInfo<P, A>,
        value: &Value,
    ) -> Result<WalkInfo<P, A>, TypewalkError> {
        if value.is_null() {
            return Ok(self.walk_null(path, info));
        }
        // a reference property may hold a collection of shared objects:
        // the collection shape is still walked, its elements stay references
        if self.model.classify(value) == ValueKind::Collection {
            return self.walk_collection(Some(property), path, info, value);
        }
        Ok((self.handlers.reference)(path, info, value, property))
    }

    fn walk_primitive(&self, path: &[String], info: WalkInfo<P, A>, value: &Value) -> WalkInfo<P, A> {
        let Value::Primitive(primitive) = value else {
            unreachable!("classified as primitive");
        };
        let mapper = self.model.find_primitive_mapper_for(primitive.type_name());
        (self.handlers.primitive)(path, info, primitive, mapper)
    }

    fn walk_enum(&self, path: &[String], info: WalkInfo<P, A>, value: &Value) -> WalkInfo<P, A> {
        let Value::Enum(literal) = value else {
            unreachable!("classified as enum");
        };
        (self.handlers.enum_value)(path, info, literal)
    }

    fn walk_null(&self, path: &[String], info: WalkInfo<P, A>) -> WalkInfo<P, A> {
        (self.handlers.null_value)(path, info)
    }
}
