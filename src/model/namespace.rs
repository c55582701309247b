//! Namespaces: dotted-path groupings of type declarations

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::model::declaration::TypeDeclaration;

/// A named grouping of type declarations, identified by a dotted path.
/// Declaration names are unique within a namespace; insertion order is
/// preserved (the runtime-type table is derived from it deterministically).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Namespace {
    path: Vec<String>,
    declarations: IndexMap<String, TypeDeclaration>,
}

impl Namespace {
    pub fn new(path: Vec<String>) -> Self {
        Self {
            path,
            declarations: IndexMap::new(),
        }
    }

    /// Build from a dotted qualified name, e.g. `"std.collections"`.
    pub fn from_qualified_name(qualified: &str) -> Self {
        Self::new(qualified.split('.').map(str::to_string).collect())
    }

    pub fn path(&self) -> &[String] {
        &self.path
    }

    pub fn qualified_name(&self) -> String {
        self.qualified_name_by(".")
    }

    pub fn qualified_name_by(&self, separator: &str) -> String {
        self.path.join(separator)
    }

    pub fn declarations(&self) -> &IndexMap<String, TypeDeclaration> {
        &self.declarations
    }

    pub fn declaration(&self, name: &str) -> Option<&TypeDeclaration> {
        self.declarations.get(name)
    }

    /// Add a declaration; a same-named existing declaration is replaced in
    /// place (position preserved) and returned.
    pub fn add_declaration(&mut self, declaration: TypeDeclaration) -> Option<TypeDeclaration> {
        self.declarations
            .insert(declaration.name().to_string(), declaration)
    }

    pub(crate) fn declaration_by_index(&self, index: usize) -> Option<&TypeDeclaration> {
        self.declarations.get_index(index).map(|(_, d)| d)
    }

    pub(crate) fn index_of(&self, name: &str) -> Option<usize> {
        self.declarations.get_index_of(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::declaration::PrimitiveType;

    #[test]
    fn qualified_names() {
        let ns = Namespace::from_qualified_name("std.collections");
        assert_eq!(ns.path(), ["std".to_string(), "collections".to_string()]);
        assert_eq!(ns.qualified_name(), "std.collections");
        assert_eq!(ns.qualified_name_by("::"), "std::collections");
    }

    #[test]
    fn declarations_keep_order_and_replace_in_place() {
        let mut ns = Namespace::from_qualified_name("std");
        ns.add_declaration(TypeDeclaration::Primitive(PrimitiveType::new(
            vec!["std".into()],
            "Bool",
        )));
        ns.add_declaration(TypeDeclaration::Primitive(PrimitiveType::new(
            vec!["std".into()],
            "Int",
        )));
        let replaced = ns.add_declaration(TypeDeclaration::Primitive(PrimitiveType::new(
            vec!["std".into()],
            "Bool",
        )));
        assert!(replaced.is_some());
        let names: Vec<&str> = ns.declarations().keys().map(String::as_str).collect();
        assert_eq!(names, vec!["Bool", "Int"]);
    }
}
