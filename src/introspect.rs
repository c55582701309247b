//! Runtime object introspection
//!
//! The walker never reads objects itself; it goes through an
//! `ObjectIntrospector`. Implementations bridge the model to an
//! application's own object representation (explicit mapping structs,
//! generated accessor tables, ...). `RecordIntrospector` is the reference
//! implementation over [`Record`] values.

use tracing::trace;

use crate::error::TypewalkError;
use crate::model::declaration::{Datatype, EnumType};
use crate::model::property::DatatypeProperty;
use crate::model::registry::TypeModel;
use crate::value::{DynObject, EnumValue, Record, Value};

/// Capability interface for reading and writing arbitrary runtime objects.
pub trait ObjectIntrospector {
    /// The ordered property names present on an object.
    fn property_names(&self, obj: &dyn DynObject) -> Result<Vec<String>, TypewalkError>;

    /// Read a named property's current value.
    fn get_property(&self, obj: &dyn DynObject, name: &str) -> Result<Value, TypewalkError>;

    /// Write a property. Mutable properties are set directly; an immutable
    /// property whose current value is a collection of the same shape is
    /// updated in place (clear and extend); anything else fails with
    /// [`TypewalkError::PropertyAccess`].
    fn set_property(
        &self,
        obj: &dyn DynObject,
        property: &DatatypeProperty,
        value: Value,
    ) -> Result<(), TypewalkError>;

    /// Construct an instance of a datatype from its identity-property
    /// values, in identity order.
    fn construct(&self, datatype: &Datatype, args: Vec<Value>) -> Result<Value, TypewalkError>;

    /// Resolve an enum literal by name; `None` when the literal is not
    /// legal for the enum.
    fn enum_value_of(&self, enum_type: &EnumType, literal: &str) -> Option<Value>;
}

/// Reference introspector over [`Record`] objects.
pub struct RecordIntrospector<'m> {
    model: &'m TypeModel,
}

impl<'m> RecordIntrospector<'m> {
    pub fn new(model: &'m TypeModel) -> Self {
        Self { model }
    }

    fn record<'o>(&self, obj: &'o dyn DynObject) -> Result<&'o Record, TypewalkError> {
        obj.as_any()
            .downcast_ref::<Record>()
            .ok_or_else(|| TypewalkError::PropertyAccess {
                datatype: obj.type_name().to_string(),
                property: String::new(),
                message: "object is not a Record".to_string(),
            })
    }
}

impl ObjectIntrospector for RecordIntrospector<'_> {
    fn property_names(&self, obj: &dyn DynObject) -> Result<Vec<String>, TypewalkError> {
        Ok(self.record(obj)?.field_names())
    }

    fn get_property(&self, obj: &dyn DynObject, name: &str) -> Result<Value, TypewalkError> {
        let record = self.record(obj)?;
        record
            .get(name)
            .ok_or_else(|| TypewalkError::PropertyAccess {
                datatype: obj.type_name().to_string(),
                property: name.to_string(),
                message: "no such field".to_string(),
            })
    }

    fn set_property(
        &self,
        obj: &dyn DynObject,
        property: &DatatypeProperty,
        value: Value,
    ) -> Result<(), TypewalkError> {
        let record = self.record(obj)?;
        if property.is_mutable(self.model) {
            record.set(property.name.clone(), value);
            return Ok(());
        }
        // immutable: only an in-place update of an existing same-shaped
        // collection is allowed
        let updated = record.modify(&property.name, |existing| match (existing, &value) {
            (Value::List(dst), Value::List(src)) => {
                dst.clear();
                dst.extend(src.iter().cloned());
                true
            }
            (Value::Set(dst), Value::Set(src)) => {
                dst.clear();
                dst.extend(src.iter().cloned());
                true
            }
            (Value::Map(dst), Value::Map(src)) => {
                dst.clear();
                dst.extend(src.iter().cloned());
                true
            }
            _ => false,
        });
        match updated {
            Some(true) => Ok(()),
            _ => Err(TypewalkError::PropertyAccess {
                datatype: property.owner.clone(),
                property: property.name.clone(),
                message: "immutable property without an in-place-clearable collection"
                    .to_string(),
            }),
        }
    }

    fn construct(&self, datatype: &Datatype, args: Vec<Value>) -> Result<Value, TypewalkError> {
        let identity = datatype.identity_properties();
        if identity.len() != args.len() {
            return Err(TypewalkError::PropertyAccess {
                datatype: datatype.qualified_name(),
                property: String::new(),
                message: format!(
                    "constructor expects {} identity argument(s), got {}",
                    identity.len(),
                    args.len()
                ),
            });
        }
        trace!(datatype = %datatype.qualified_name(), "constructing record");
        let mut record = Record::new(datatype.name.clone());
        for (prop, value) in identity.iter().zip(args) {
            record = record.with(prop.name.clone(), value);
        }
        Ok(record.into_value())
    }

    fn enum_value_of(&self, enum_type: &EnumType, literal: &str) -> Option<Value> {
        if enum_type.has_literal(literal) {
            Some(Value::Enum(EnumValue::new(
                enum_type.name.clone(),
                literal,
            )))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::builder::ModelBuilder;
    use crate::model::property::PropertyCharacteristic;

    fn model() -> TypeModel {
        let mut b = ModelBuilder::new();
        b.std_model()
            .namespace("app")
            .enum_type("Colour", &["RED", "GREEN"])
            .datatype("Person")
            .property(
                PropertyCharacteristic::CompositeVal,
                "name",
                "String".parse().unwrap(),
            )
            .property(
                PropertyCharacteristic::ReferenceVar,
                "nickname",
                "String".parse().unwrap(),
            )
            .property(
                PropertyCharacteristic::CompositeVar,
                "tags",
                "std.collections.List<String>".parse().unwrap(),
            );
        b.build().unwrap()
    }

    #[test]
    fn get_and_set_mutable_property() {
        let model = model();
        let intro = RecordIntrospector::new(&model);
        let person = Record::new("Person").with("name", "Ada").with("nickname", "A");
        let dt = model.find_datatype_for("Person").unwrap();

        assert_eq!(
            intro.get_property(&person, "name").unwrap(),
            Value::from("Ada")
        );
        assert!(intro.get_property(&person, "shoe_size").is_err());

        let nickname = dt.property("nickname").unwrap();
        intro
            .set_property(&person, nickname, Value::from("Lovelace"))
            .unwrap();
        assert_eq!(person.get("nickname"), Some(Value::from("Lovelace")));
    }

    #[test]
    fn set_identity_property_fails() {
        let model = model();
        let intro = RecordIntrospector::new(&model);
        let person = Record::new("Person").with("name", "Ada");
        let dt = model.find_datatype_for("Person").unwrap();
        let name = dt.property("name").unwrap();
        let err = intro
            .set_property(&person, name, Value::from("Grace"))
            .unwrap_err();
        assert!(matches!(err, TypewalkError::PropertyAccess { .. }));
        assert_eq!(person.get("name"), Some(Value::from("Ada")));
    }

    #[test]
    fn set_collection_property_updates_in_place() {
        let model = model();
        let intro = RecordIntrospector::new(&model);
        let person = Record::new("Person")
            .with("tags", Value::List(vec![Value::from("old")]));
        let dt = model.find_datatype_for("Person").unwrap();
        let tags = dt.property("tags").unwrap();
        // collection-typed, hence immutable, but in-place clearable
        assert!(!tags.is_mutable(&model));
        intro
            .set_property(
                &person,
                tags,
                Value::List(vec![Value::from("a"), Value::from("b")]),
            )
            .unwrap();
        assert_eq!(
            person.get("tags"),
            Some(Value::List(vec![Value::from("a"), Value::from("b")]))
        );
    }

    #[test]
    fn construct_from_identity_args() {
        let model = model();
        let intro = RecordIntrospector::new(&model);
        let dt = model.find_datatype_for("Person").unwrap();
        let value = intro.construct(dt, vec![Value::from("Ada")]).unwrap();
        let Value::Object(obj) = &value else {
            panic!("expected object");
        };
        assert_eq!(obj.type_name(), "Person");
        assert!(intro.construct(dt, vec![]).is_err());
    }

    #[test]
    fn enum_value_of_checks_literals() {
        let model = model();
        let intro = RecordIntrospector::new(&model);
        let Some(crate::model::TypeDeclaration::Enum(colour)) =
            model.find_declaration_for("Colour")
        else {
            panic!("expected enum");
        };
        let red = intro.enum_value_of(colour, "RED").unwrap();
        assert_eq!(red, Value::Enum(EnumValue::new("Colour", "RED")));
        assert!(intro.enum_value_of(colour, "PURPLE").is_none());
    }
}
