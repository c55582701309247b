//! Property descriptors for datatype declarations

use serde::{Deserialize, Serialize};

use crate::model::reference::TypeRef;
use crate::model::registry::TypeModel;

/// The five property classifications of the model description language.
///
/// `*Val` variants are constructor arguments and receive the next identity
/// index of their datatype; `*Var` variants are mutable non-identity
/// properties; `Disregard` excludes the property from traversal and from
/// all derived sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropertyCharacteristic {
    ReferenceVal,
    ReferenceVar,
    CompositeVal,
    CompositeVar,
    Disregard,
}

impl PropertyCharacteristic {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyCharacteristic::ReferenceVal => "reference-val",
            PropertyCharacteristic::ReferenceVar => "reference-var",
            PropertyCharacteristic::CompositeVal => "composite-val",
            PropertyCharacteristic::CompositeVar => "composite-var",
            PropertyCharacteristic::Disregard => "dis",
        }
    }
}

impl std::fmt::Display for PropertyCharacteristic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A property declared on (or synthesized for) a datatype.
///
/// Classification bits are independent except that composite and reference
/// are mutually exclusive: `is_reference` is defined as the complement of
/// `is_composite`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatatypeProperty {
    /// Qualified name of the owning datatype (for diagnostics).
    pub owner: String,
    pub name: String,
    pub type_reference: TypeRef,
    /// Position among the owning datatype's identity properties, assigned
    /// contiguously in declaration order; `None` for non-identity.
    pub identity_index: Option<usize>,
    pub is_composite: bool,
    pub ignore: bool,
}

impl DatatypeProperty {
    /// Build a property from its DSL characteristic. `next_identity_index`
    /// is the count of identity properties already declared on the owner.
    pub fn from_characteristic(
        owner: impl Into<String>,
        name: impl Into<String>,
        type_reference: TypeRef,
        characteristic: PropertyCharacteristic,
        next_identity_index: usize,
    ) -> Self {
        let mut prop = Self {
            owner: owner.into(),
            name: name.into(),
            type_reference,
            identity_index: None,
            is_composite: false,
            ignore: false,
        };
        match characteristic {
            PropertyCharacteristic::ReferenceVal => {
                prop.identity_index = Some(next_identity_index);
            }
            PropertyCharacteristic::ReferenceVar => {}
            PropertyCharacteristic::CompositeVal => {
                prop.is_composite = true;
                prop.identity_index = Some(next_identity_index);
            }
            PropertyCharacteristic::CompositeVar => {
                prop.is_composite = true;
            }
            PropertyCharacteristic::Disregard => {
                prop.ignore = true;
            }
        }
        prop
    }

    /// A synthesized default property: reference-classified, not ignored,
    /// typed as the universal `Any`. Used for introspected property names
    /// that have no declaration on the datatype.
    pub fn synthesized(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            type_reference: TypeRef::any(),
            identity_index: None,
            is_composite: false,
            ignore: false,
        }
    }

    pub fn is_identity(&self) -> bool {
        self.identity_index.is_some()
    }

    pub fn is_reference(&self) -> bool {
        !self.is_composite
    }

    /// Settable after construction: identity and collection-typed
    /// properties are immutable for this purpose. An unresolvable declared
    /// type is treated as non-collection.
    pub fn is_mutable(&self, model: &TypeModel) -> bool {
        if self.is_identity() {
            return false;
        }
        match model.resolve(&self.type_reference) {
            Ok(decl) => !decl.is_collection(),
            Err(_) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tref(name: &str) -> TypeRef {
        TypeRef::new(vec![name.to_string()], vec![])
    }

    #[test]
    fn characteristics_classify() {
        let p = DatatypeProperty::from_characteristic(
            "app.A",
            "id",
            tref("String"),
            PropertyCharacteristic::CompositeVal,
            0,
        );
        assert!(p.is_identity());
        assert!(p.is_composite);
        assert!(!p.is_reference());
        assert!(!p.ignore);

        let p = DatatypeProperty::from_characteristic(
            "app.A",
            "other",
            tref("A"),
            PropertyCharacteristic::ReferenceVar,
            1,
        );
        assert!(!p.is_identity());
        assert!(p.is_reference());

        let p = DatatypeProperty::from_characteristic(
            "app.A",
            "cache",
            tref("String"),
            PropertyCharacteristic::Disregard,
            1,
        );
        assert!(p.ignore);
        assert!(!p.is_identity());
    }

    #[test]
    fn composite_and_reference_are_exclusive() {
        let p = DatatypeProperty::from_characteristic(
            "app.A",
            "child",
            tref("B"),
            PropertyCharacteristic::CompositeVar,
            0,
        );
        assert!(p.is_composite && !p.is_reference());
        let p = DatatypeProperty::synthesized("app.A", "extra");
        assert!(!p.is_composite && p.is_reference());
        assert_eq!(p.type_reference, TypeRef::any());
    }
}
