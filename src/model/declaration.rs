//! Type declarations: primitives, enums, collections and datatypes
//!
//! Declarations are built during model construction and never mutated once
//! traversal begins. Datatype derived sets (identity ordering, supertype
//! closure, merged property map) are computed on demand against the owning
//! [`TypeModel`], so they stay consistent regardless of the order in which
//! supertypes and subtypes were registered.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::TypewalkError;
use crate::model::property::{DatatypeProperty, PropertyCharacteristic};
use crate::model::reference::TypeRef;
use crate::model::registry::TypeModel;

/// A named entity in the model: primitive, enum, collection or datatype.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TypeDeclaration {
    Primitive(PrimitiveType),
    Enum(EnumType),
    Collection(CollectionType),
    Datatype(Datatype),
}

impl TypeDeclaration {
    pub fn name(&self) -> &str {
        match self {
            TypeDeclaration::Primitive(d) => &d.name,
            TypeDeclaration::Enum(d) => &d.name,
            TypeDeclaration::Collection(d) => &d.name,
            TypeDeclaration::Datatype(d) => &d.name,
        }
    }

    pub fn namespace_path(&self) -> &[String] {
        match self {
            TypeDeclaration::Primitive(d) => &d.namespace,
            TypeDeclaration::Enum(d) => &d.namespace,
            TypeDeclaration::Collection(d) => &d.namespace,
            TypeDeclaration::Datatype(d) => &d.namespace,
        }
    }

    pub fn qualified_name(&self) -> String {
        self.qualified_name_by(".")
    }

    pub fn qualified_name_by(&self, separator: &str) -> String {
        let mut s = self.namespace_path().join(separator);
        if !s.is_empty() {
            s.push_str(separator);
        }
        s.push_str(self.name());
        s
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, TypeDeclaration::Primitive(_))
    }

    pub fn is_enum(&self) -> bool {
        matches!(self, TypeDeclaration::Enum(_))
    }

    pub fn is_collection(&self) -> bool {
        matches!(self, TypeDeclaration::Collection(_))
    }

    pub fn is_datatype(&self) -> bool {
        matches!(self, TypeDeclaration::Datatype(_))
    }

    /// The universal type every otherwise-untyped reference resolves to.
    pub fn is_any(&self) -> bool {
        matches!(self, TypeDeclaration::Datatype(_)) && self.qualified_name() == "std.Any"
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimitiveType {
    pub namespace: Vec<String>,
    pub name: String,
}

impl PrimitiveType {
    pub fn new(namespace: Vec<String>, name: impl Into<String>) -> Self {
        Self {
            namespace,
            name: name.into(),
        }
    }
}

/// An enum declaration. The text grammar declares only the name; legal
/// literal names are populated by the programmatic builder (or left empty,
/// in which case literal lookups always miss).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumType {
    pub namespace: Vec<String>,
    pub name: String,
    pub literals: Vec<String>,
}

impl EnumType {
    pub fn new(namespace: Vec<String>, name: impl Into<String>) -> Self {
        Self {
            namespace,
            name: name.into(),
            literals: Vec::new(),
        }
    }

    pub fn with_literals(mut self, literals: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.literals = literals.into_iter().map(Into::into).collect();
        self
    }

    pub fn has_literal(&self, literal: &str) -> bool {
        self.literals.iter().any(|l| l == literal)
    }
}

/// A collection declaration with its declared type-parameter names.
///
/// The shape flags compare this declaration against the well-known built-in
/// collection declarations of the model (structural identity, not name
/// matching).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionType {
    pub namespace: Vec<String>,
    pub name: String,
    pub parameters: Vec<String>,
}

impl CollectionType {
    pub fn new(
        namespace: Vec<String>,
        name: impl Into<String>,
        parameters: Vec<String>,
    ) -> Self {
        Self {
            namespace,
            name: name.into(),
            parameters,
        }
    }

    pub fn is_array(&self, model: &TypeModel) -> bool {
        model.builtin_collection(BuiltinCollection::Array) == Some(self)
    }

    pub fn is_list(&self, model: &TypeModel) -> bool {
        model.builtin_collection(BuiltinCollection::List) == Some(self)
    }

    pub fn is_set(&self, model: &TypeModel) -> bool {
        model.builtin_collection(BuiltinCollection::Set) == Some(self)
    }

    pub fn is_map(&self, model: &TypeModel) -> bool {
        model.builtin_collection(BuiltinCollection::Map) == Some(self)
    }
}

/// The well-known built-in collection shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinCollection {
    Array,
    List,
    Set,
    Map,
}

/// A structured type with properties and optional supertypes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Datatype {
    pub namespace: Vec<String>,
    pub name: String,
    pub type_parameters: Vec<String>,
    pub super_types: Vec<TypeRef>,
    properties: IndexMap<String, DatatypeProperty>,
}

impl Datatype {
    pub fn new(namespace: Vec<String>, name: impl Into<String>) -> Self {
        Self {
            namespace,
            name: name.into(),
            type_parameters: Vec::new(),
            super_types: Vec::new(),
            properties: IndexMap::new(),
        }
    }

    pub fn qualified_name(&self) -> String {
        let mut s = self.namespace.join(".");
        if !s.is_empty() {
            s.push('.');
        }
        s.push_str(&self.name);
        s
    }

    pub fn add_super_type(&mut self, reference: TypeRef) {
        self.super_types.push(reference);
    }

    pub fn add_type_parameter(&mut self, name: impl Into<String>) {
        self.type_parameters.push(name.into());
    }

    pub fn add_property(&mut self, property: DatatypeProperty) {
        self.properties.insert(property.name.clone(), property);
    }

    /// Declare a property by its DSL characteristic; `*-val` properties are
    /// auto-assigned the next identity index of this datatype.
    pub fn declare_property(
        &mut self,
        characteristic: PropertyCharacteristic,
        name: impl Into<String>,
        type_reference: TypeRef,
    ) {
        let next = self.identity_properties().len();
        let prop = DatatypeProperty::from_characteristic(
            self.qualified_name(),
            name,
            type_reference,
            characteristic,
            next,
        );
        self.add_property(prop);
    }

    /// Properties declared directly on this datatype, in declaration order.
    pub fn properties(&self) -> &IndexMap<String, DatatypeProperty> {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&DatatypeProperty> {
        self.properties.get(name)
    }

    /// Identity-marked properties of this type only, ascending by identity
    /// index. Indices are contiguous from zero in declaration order.
    pub fn identity_properties(&self) -> Vec<&DatatypeProperty> {
        let mut props: Vec<&DatatypeProperty> = self
            .properties
            .values()
            .filter(|p| p.is_identity())
            .collect();
        props.sort_by_key(|p| p.identity_index);
        props
    }

    /// Own non-identity properties that are explicitly declared.
    pub fn explicit_non_identity_properties(&self) -> Vec<&DatatypeProperty> {
        self.properties
            .values()
            .filter(|p| !p.is_identity())
            .collect()
    }

    pub fn composite_properties(&self) -> Vec<&DatatypeProperty> {
        self.properties.values().filter(|p| p.is_composite).collect()
    }

    pub fn explicit_reference_properties(&self) -> Vec<&DatatypeProperty> {
        self.properties
            .values()
            .filter(|p| p.is_reference())
            .collect()
    }

    pub fn ignored_properties(&self) -> Vec<&DatatypeProperty> {
        self.properties.values().filter(|p| p.ignore).collect()
    }

    /// Transitive closure of declared supertypes: declared references
    /// first, then each supertype's own closure in order.
    pub fn all_super_types(&self, model: &TypeModel) -> Result<Vec<TypeRef>, TypewalkError> {
        let mut out = self.super_types.clone();
        for reference in &self.super_types {
            if let TypeDeclaration::Datatype(sup) = model.resolve_for(reference, self)? {
                out.extend(sup.all_super_types(model)?);
            }
        }
        Ok(out)
    }

    /// All explicitly-declared properties from supertypes (recursively,
    /// supertype-declared first) merged with this type's own; same-named
    /// own properties override inherited ones in place.
    pub fn all_explicit_properties(
        &self,
        model: &TypeModel,
    ) -> Result<IndexMap<String, DatatypeProperty>, TypewalkError> {
        let mut merged: IndexMap<String, DatatypeProperty> = IndexMap::new();
        for reference in &self.super_types {
            if let TypeDeclaration::Datatype(sup) = model.resolve_for(reference, self)? {
                for (name, prop) in sup.all_explicit_properties(model)? {
                    merged.insert(name, prop);
                }
            }
        }
        for (name, prop) in &self.properties {
            merged.insert(name.clone(), prop.clone());
        }
        Ok(merged)
    }

    /// All properties found on an object (declared plus synthesized for the
    /// given introspected names) excluding identity and ignored ones.
    pub fn object_non_identity_properties(&self, property_names: &[String]) -> Vec<DatatypeProperty> {
        self.object_properties(property_names)
            .into_iter()
            .filter(|p| !p.is_identity() && !p.ignore)
            .collect()
    }

    /// As [`Self::object_non_identity_properties`], restricted to mutable
    /// properties.
    pub fn object_non_identity_mutable_properties(
        &self,
        model: &TypeModel,
        property_names: &[String],
    ) -> Vec<DatatypeProperty> {
        self.object_non_identity_properties(property_names)
            .into_iter()
            .filter(|p| p.is_mutable(model))
            .collect()
    }

    /// All properties found on an object excluding composite and ignored
    /// ones: the reference-classified view of the object.
    pub fn object_reference_properties(&self, property_names: &[String]) -> Vec<DatatypeProperty> {
        self.object_properties(property_names)
            .into_iter()
            .filter(|p| !p.is_composite && !p.ignore)
            .collect()
    }

    /// Declared properties plus a synthesized default (reference, `Any`)
    /// for every introspected name with no declaration, in declared-then-
    /// introspected order.
    fn object_properties(&self, property_names: &[String]) -> Vec<DatatypeProperty> {
        let mut out: IndexMap<String, DatatypeProperty> = self.properties.clone();
        for name in property_names {
            if !out.contains_key(name) {
                out.insert(
                    name.clone(),
                    DatatypeProperty::synthesized(self.qualified_name(), name),
                );
            }
        }
        out.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tref(name: &str) -> TypeRef {
        TypeRef::new(vec![name.to_string()], vec![])
    }

    fn datatype_with_props() -> Datatype {
        let mut dt = Datatype::new(vec!["app".into()], "Person");
        dt.declare_property(PropertyCharacteristic::CompositeVal, "id", tref("String"));
        dt.declare_property(PropertyCharacteristic::ReferenceVar, "friend", tref("Person"));
        dt.declare_property(PropertyCharacteristic::CompositeVal, "name", tref("String"));
        dt.declare_property(PropertyCharacteristic::Disregard, "cache", tref("String"));
        dt
    }

    #[test]
    fn identity_indices_are_contiguous_in_declaration_order() {
        let dt = datatype_with_props();
        let ids = dt.identity_properties();
        assert_eq!(ids.len(), 2);
        assert_eq!(ids[0].name, "id");
        assert_eq!(ids[0].identity_index, Some(0));
        assert_eq!(ids[1].name, "name");
        assert_eq!(ids[1].identity_index, Some(1));
    }

    #[test]
    fn derived_own_sets() {
        let dt = datatype_with_props();
        let non_id: Vec<&str> = dt
            .explicit_non_identity_properties()
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(non_id, vec!["friend", "cache"]);
        let ignored: Vec<&str> = dt.ignored_properties().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(ignored, vec!["cache"]);
        let comps: Vec<&str> = dt.composite_properties().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(comps, vec!["id", "name"]);
    }

    #[test]
    fn object_properties_synthesize_for_undeclared_names() {
        let dt = datatype_with_props();
        let names = vec![
            "id".to_string(),
            "friend".to_string(),
            "nickname".to_string(),
        ];
        let refs = dt.object_reference_properties(&names);
        // composite (id, name) and ignored (cache) excluded; synthesized
        // nickname included as a reference to Any
        let ref_names: Vec<&str> = refs.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(ref_names, vec!["friend", "nickname"]);
        let synth = refs.iter().find(|p| p.name == "nickname").unwrap();
        assert_eq!(synth.type_reference, TypeRef::any());
        assert!(synth.is_reference());
        assert!(!synth.ignore);

        let non_id = dt.object_non_identity_properties(&names);
        let names: Vec<&str> = non_id.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["friend", "nickname"]);
    }
}
