//! Type references and their resolved forms
//!
//! A `TypeRef` is an unresolved dotted path plus type arguments, exactly as
//! written in a model description. Resolution is a lookup against the
//! finished namespace table of a [`crate::model::TypeModel`]; references
//! carry no resolver state of their own, so a partially-built model is
//! plainly inspectable.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypewalkError;

/// Stable identifier for a registered declaration, assigned at
/// model-construction time: namespace index plus declaration index within
/// that namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeId {
    pub(crate) namespace: u32,
    pub(crate) decl: u32,
}

impl TypeId {
    pub(crate) fn new(namespace: usize, decl: usize) -> Self {
        Self {
            namespace: namespace as u32,
            decl: decl as u32,
        }
    }
}

/// A possibly-parameterized reference to a type: dotted path segments (the
/// last being the type name), type arguments, and a nullability marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeRef {
    pub path: Vec<String>,
    pub arguments: Vec<TypeRef>,
    pub nullable: bool,
}

impl TypeRef {
    pub fn new(path: Vec<String>, arguments: Vec<TypeRef>) -> Self {
        Self {
            path,
            arguments,
            nullable: false,
        }
    }

    /// Reference to the universal `std.Any` type, used for synthesized
    /// properties and resolved type parameters.
    pub fn any() -> Self {
        Self::new(vec!["std".to_string(), "Any".to_string()], Vec::new())
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// The namespace portion of the path (everything but the last segment).
    pub fn namespace_path(&self) -> &[String] {
        &self.path[..self.path.len().saturating_sub(1)]
    }

    /// The referenced type's simple name (the last path segment).
    pub fn type_name(&self) -> &str {
        self.path.last().map(String::as_str).unwrap_or("")
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.join("."))?;
        if !self.arguments.is_empty() {
            let args: Vec<String> = self.arguments.iter().map(|a| a.to_string()).collect();
            write!(f, "<{}>", args.join(","))?;
        }
        if self.nullable {
            write!(f, "?")?;
        }
        Ok(())
    }
}

impl FromStr for TypeRef {
    type Err = TypewalkError;

    /// Parse a reference in the model-description syntax, e.g.
    /// `std.collections.List<String>` or `Address?`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        crate::parser::parse_type_ref(s)
    }
}

/// A resolved type reference: the declaration it names plus resolved
/// argument instances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeInstance {
    pub declaration: TypeId,
    pub arguments: Vec<TypeInstance>,
}

impl TypeInstance {
    pub fn new(declaration: TypeId, arguments: Vec<TypeInstance>) -> Self {
        Self {
            declaration,
            arguments,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_round_trips_syntax() {
        let r = TypeRef::new(
            vec!["std".into(), "collections".into(), "Map".into()],
            vec![
                TypeRef::new(vec!["String".into()], vec![]),
                TypeRef::new(vec!["Int".into()], vec![]).nullable(),
            ],
        );
        assert_eq!(r.to_string(), "std.collections.Map<String,Int?>");
        assert_eq!(r.namespace_path(), ["std".to_string(), "collections".to_string()]);
        assert_eq!(r.type_name(), "Map");
    }

    #[test]
    fn parse_from_str() {
        let r: TypeRef = "app.model.Person".parse().unwrap();
        assert_eq!(r.path, vec!["app", "model", "Person"]);
        assert!(r.arguments.is_empty());
        assert!(!r.nullable);

        let r: TypeRef = "List<Person?>".parse().unwrap();
        assert_eq!(r.type_name(), "List");
        assert_eq!(r.arguments.len(), 1);
        assert!(r.arguments[0].nullable);
    }
}
