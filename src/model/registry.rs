//! The type model registry
//!
//! `TypeModel` owns the namespaces, classifies runtime values against the
//! registered declarations, and resolves type references. Construction is
//! two-phase: registration appends namespaces and declarations (phase 1);
//! resolution is a lookup against the finished namespace table (phase 2),
//! either on demand or eagerly via [`TypeModel::resolve_all`]. Once built,
//! the model is read-only and freely shareable across concurrent walks.

use std::collections::HashMap;

use tracing::debug;

use crate::error::{ParseIssue, TypewalkError};
use crate::model::declaration::{
    BuiltinCollection, CollectionType, Datatype, TypeDeclaration,
};
use crate::model::namespace::Namespace;
use crate::model::reference::{TypeId, TypeInstance, TypeRef};
use crate::value::{PrimitiveMapper, Value};

/// Built-in model description registered by most applications: the raw
/// primitive kinds of [`crate::value::Primitive`] and the built-in
/// collection shapes.
pub const STD_MODEL: &str = r#"
namespace std {
    primitive Bool
    primitive Int
    primitive Decimal
    primitive String
}
namespace std.collections {
    collection Array<E>
    collection List<E>
    collection Set<E>
    collection Map<K,V>
}
"#;

/// Classification of a runtime value against the registered declaration
/// sets. `Unknown` is not an error by itself; the walker treats it as a
/// precondition failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Primitive,
    Enum,
    Collection,
    Datatype,
    Unknown,
}

/// The type model: a set of namespaces plus derived lookup tables.
pub struct TypeModel {
    namespaces: Vec<Namespace>,
    /// Runtime-type registration table: qualified names always, simple
    /// names first-registration-wins, in namespace registration order.
    runtime_types: HashMap<String, TypeId>,
    mappers: HashMap<String, PrimitiveMapper>,
}

impl TypeModel {
    /// An empty model containing only the built-in `std.Any` datatype.
    pub fn new() -> Self {
        let mut model = Self {
            namespaces: Vec::new(),
            runtime_types: HashMap::new(),
            mappers: HashMap::new(),
        };
        let mut std_ns = Namespace::from_qualified_name("std");
        std_ns.add_declaration(TypeDeclaration::Datatype(Datatype::new(
            vec!["std".to_string()],
            "Any",
        )));
        model.register_namespace(std_ns);
        model
    }

    pub fn namespaces(&self) -> &[Namespace] {
        &self.namespaces
    }

    /// Register (or merge, when a namespace with the same path exists) a
    /// namespace and rebuild the runtime-type table.
    pub fn register_namespace(&mut self, namespace: Namespace) {
        match self
            .namespaces
            .iter()
            .position(|ns| ns.path() == namespace.path())
        {
            Some(index) => {
                let existing = &mut self.namespaces[index];
                for (_, decl) in namespace.declarations() {
                    if existing.add_declaration(decl.clone()).is_some() {
                        debug!(
                            declaration = %decl.qualified_name(),
                            "replaced existing declaration during merge"
                        );
                    }
                }
            }
            None => self.namespaces.push(namespace),
        }
        self.rebuild_index();
    }

    /// Parse a model description and register its namespaces. Parse
    /// failures surface as [`TypewalkError::ConfigParse`]; semantic issues
    /// that do not prevent registration are returned.
    pub fn register_from_str(&mut self, text: &str) -> Result<Vec<ParseIssue>, TypewalkError> {
        let (namespaces, issues) = crate::parser::parse_namespaces(text)?;
        for ns in namespaces {
            debug!(namespace = %ns.qualified_name(), "registering namespace");
            self.register_namespace(ns);
        }
        Ok(issues)
    }

    pub fn register_primitive_mapper(&mut self, mapper: PrimitiveMapper) {
        self.mappers.insert(mapper.primitive_type().to_string(), mapper);
    }

    pub fn find_primitive_mapper_for(&self, type_name: &str) -> Option<&PrimitiveMapper> {
        self.mappers.get(type_name)
    }

    pub fn declaration(&self, id: TypeId) -> Option<&TypeDeclaration> {
        self.namespaces
            .get(id.namespace as usize)?
            .declaration_by_index(id.decl as usize)
    }

    /// Look up a declaration by runtime type identifier (qualified or
    /// simple name).
    pub fn find_declaration_for(&self, type_name: &str) -> Option<&TypeDeclaration> {
        self.runtime_types
            .get(type_name)
            .and_then(|id| self.declaration(*id))
    }

    pub fn find_datatype_for(&self, type_name: &str) -> Option<&Datatype> {
        match self.find_declaration_for(type_name) {
            Some(TypeDeclaration::Datatype(dt)) => Some(dt),
            _ => None,
        }
    }

    /// The collection declaration for a collection-shaped value, selected
    /// by structural shape first (list/set/map), then by name lookup.
    pub fn find_collection_type_for(&self, value: &Value) -> Option<&CollectionType> {
        let name = match value {
            Value::List(_) => "List",
            Value::Set(_) => "Set",
            Value::Map(_) => "Map",
            _ => return None,
        };
        match self.find_declaration_for(name) {
            Some(TypeDeclaration::Collection(ct)) => Some(ct),
            _ => None,
        }
    }

    /// One of the well-known built-in collection declarations, if
    /// registered (they live in `std.collections`).
    pub fn builtin_collection(&self, kind: BuiltinCollection) -> Option<&CollectionType> {
        let name = match kind {
            BuiltinCollection::Array => "Array",
            BuiltinCollection::List => "List",
            BuiltinCollection::Set => "Set",
            BuiltinCollection::Map => "Map",
        };
        let ns = self
            .namespaces
            .iter()
            .find(|ns| ns.qualified_name() == "std.collections")?;
        match ns.declaration(name) {
            Some(TypeDeclaration::Collection(ct)) => Some(ct),
            _ => None,
        }
    }

    /// Classify a runtime value against the registered declaration sets.
    pub fn classify(&self, value: &Value) -> ValueKind {
        match value {
            Value::Null => ValueKind::Unknown,
            Value::Primitive(p) => match self.find_declaration_for(p.type_name()) {
                Some(decl) if decl.is_primitive() => ValueKind::Primitive,
                _ => ValueKind::Unknown,
            },
            Value::Enum(e) => match self.find_declaration_for(&e.type_name) {
                Some(decl) if decl.is_enum() => ValueKind::Enum,
                _ => ValueKind::Unknown,
            },
            Value::List(_) | Value::Set(_) | Value::Map(_) => {
                if self.find_collection_type_for(value).is_some() {
                    ValueKind::Collection
                } else {
                    ValueKind::Unknown
                }
            }
            Value::Object(o) => match self.find_declaration_for(o.type_name()) {
                Some(decl) if decl.is_datatype() => ValueKind::Datatype,
                _ => ValueKind::Unknown,
            },
        }
    }

    /// Resolve a type reference to its declaration id.
    ///
    /// An empty namespace path scans all namespaces in registration order
    /// and takes the first match; otherwise the namespace path must match a
    /// registered namespace exactly.
    pub fn lookup(&self, reference: &TypeRef) -> Result<TypeId, TypewalkError> {
        if reference.path.is_empty() {
            return Err(TypewalkError::UnresolvedType {
                message: "empty type reference".to_string(),
            });
        }
        let ns_path = reference.namespace_path();
        let type_name = reference.type_name();
        if ns_path.is_empty() {
            for (ns_index, ns) in self.namespaces.iter().enumerate() {
                if let Some(decl_index) = ns.index_of(type_name) {
                    return Ok(TypeId::new(ns_index, decl_index));
                }
            }
            Err(TypewalkError::UnresolvedType {
                message: format!("type '{type_name}' not found in any namespace"),
            })
        } else {
            let (ns_index, ns) = self
                .namespaces
                .iter()
                .enumerate()
                .find(|(_, ns)| ns.path() == ns_path)
                .ok_or_else(|| TypewalkError::UnresolvedType {
                    message: format!("namespace '{}' not found", ns_path.join(".")),
                })?;
            let decl_index = ns.index_of(type_name).ok_or_else(|| {
                TypewalkError::UnresolvedType {
                    message: format!(
                        "type '{}' not found in namespace '{}'",
                        type_name,
                        ns_path.join(".")
                    ),
                }
            })?;
            Ok(TypeId::new(ns_index, decl_index))
        }
    }

    /// Resolve a type reference to its declaration.
    pub fn resolve(&self, reference: &TypeRef) -> Result<&TypeDeclaration, TypewalkError> {
        let id = self.lookup(reference)?;
        self.declaration(id)
            .ok_or_else(|| TypewalkError::UnresolvedType {
                message: format!("stale type id for '{reference}'"),
            })
    }

    /// Resolve within a datatype context: a single-segment path matching
    /// one of the datatype's type parameters resolves to `std.Any`.
    pub fn resolve_for(
        &self,
        reference: &TypeRef,
        context: &Datatype,
    ) -> Result<&TypeDeclaration, TypewalkError> {
        if reference.path.len() == 1 && context.type_parameters.contains(&reference.path[0]) {
            return self.resolve(&TypeRef::any());
        }
        self.resolve(reference)
    }

    /// Resolve a reference and its arguments into a [`TypeInstance`].
    pub fn instance(
        &self,
        reference: &TypeRef,
        context: Option<&Datatype>,
    ) -> Result<TypeInstance, TypewalkError> {
        let id = match context {
            Some(dt)
                if reference.path.len() == 1
                    && dt.type_parameters.contains(&reference.path[0]) =>
            {
                self.lookup(&TypeRef::any())?
            }
            _ => self.lookup(reference)?,
        };
        let arguments = reference
            .arguments
            .iter()
            .map(|arg| self.instance(arg, context))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(TypeInstance::new(id, arguments))
    }

    /// Phase-2 validation: resolve every stored reference (supertypes and
    /// property types) against the finished namespace table.
    pub fn resolve_all(&self) -> Result<(), TypewalkError> {
        let mut failures = Vec::new();
        for ns in &self.namespaces {
            for (_, decl) in ns.declarations() {
                let TypeDeclaration::Datatype(dt) = decl else {
                    continue;
                };
                for reference in &dt.super_types {
                    if let Err(e) = self.resolve_for(reference, dt) {
                        failures.push(format!("{} (supertype of {})", e, dt.qualified_name()));
                    }
                }
                for prop in dt.properties().values() {
                    if let Err(e) = self.resolve_for(&prop.type_reference, dt) {
                        failures.push(format!(
                            "{} (property {}.{})",
                            e,
                            dt.qualified_name(),
                            prop.name
                        ));
                    }
                }
            }
        }
        if failures.is_empty() {
            Ok(())
        } else {
            Err(TypewalkError::UnresolvedType {
                message: failures.join("; "),
            })
        }
    }

    fn rebuild_index(&mut self) {
        self.runtime_types.clear();
        for (ns_index, ns) in self.namespaces.iter().enumerate() {
            for (decl_index, (name, decl)) in ns.declarations().iter().enumerate() {
                let id = TypeId::new(ns_index, decl_index);
                self.runtime_types.insert(decl.qualified_name(), id);
                self.runtime_types.entry(name.clone()).or_insert(id);
            }
        }
    }
}

impl Default for TypeModel {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TypeModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeModel")
            .field("namespaces", &self.namespaces)
            .field("mappers", &self.mappers.keys().collect::<Vec<_>>())
            .finish()
    }
}
