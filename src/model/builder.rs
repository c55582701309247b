//! Programmatic model construction
//!
//! `ModelBuilder` builds a [`TypeModel`] in code, without a model
//! description text. It is a cursor-style builder: `namespace` selects the
//! namespace subsequent declarations land in, `datatype` selects the
//! datatype subsequent supertypes/properties attach to. Identity indices
//! are auto-assigned to `*-val` properties exactly as the parser does.

use crate::error::TypewalkError;
use crate::model::declaration::{
    CollectionType, Datatype, EnumType, PrimitiveType, TypeDeclaration,
};
use crate::model::namespace::Namespace;
use crate::model::property::PropertyCharacteristic;
use crate::model::reference::TypeRef;
use crate::model::registry::TypeModel;

/// Builds a [`TypeModel`] declaration by declaration.
#[derive(Debug)]
pub struct ModelBuilder {
    model: TypeModel,
    current_namespace: Option<Namespace>,
    current_datatype: Option<Datatype>,
}

impl ModelBuilder {
    pub fn new() -> Self {
        Self {
            model: TypeModel::new(),
            current_namespace: None,
            current_datatype: None,
        }
    }

    /// Register the built-in [`crate::model::STD_MODEL`] declarations.
    pub fn std_model(&mut self) -> &mut Self {
        self.flush_namespace();
        self.model
            .register_from_str(crate::model::registry::STD_MODEL)
            .expect("built-in std model parses");
        self
    }

    /// Open a namespace; closes the previously open one (and any open
    /// datatype in it).
    pub fn namespace(&mut self, qualified_name: &str) -> &mut Self {
        self.flush_namespace();
        self.current_namespace = Some(Namespace::from_qualified_name(qualified_name));
        self
    }

    pub fn primitive(&mut self, name: &str) -> &mut Self {
        self.flush_datatype();
        let ns = self.namespace_mut();
        let path = ns.path().to_vec();
        ns.add_declaration(TypeDeclaration::Primitive(PrimitiveType::new(path, name)));
        self
    }

    pub fn enum_type(&mut self, name: &str, literals: &[&str]) -> &mut Self {
        self.flush_datatype();
        let ns = self.namespace_mut();
        let path = ns.path().to_vec();
        ns.add_declaration(TypeDeclaration::Enum(
            EnumType::new(path, name).with_literals(literals.iter().copied()),
        ));
        self
    }

    pub fn collection(&mut self, name: &str, parameters: &[&str]) -> &mut Self {
        self.flush_datatype();
        let ns = self.namespace_mut();
        let path = ns.path().to_vec();
        ns.add_declaration(TypeDeclaration::Collection(CollectionType::new(
            path,
            name,
            parameters.iter().map(|p| p.to_string()).collect(),
        )));
        self
    }

    /// Open a datatype; closes the previously open one.
    pub fn datatype(&mut self, name: &str) -> &mut Self {
        self.flush_datatype();
        let path = self.namespace_mut().path().to_vec();
        self.current_datatype = Some(Datatype::new(path, name));
        self
    }

    pub fn super_type(&mut self, reference: TypeRef) -> &mut Self {
        self.datatype_mut().add_super_type(reference);
        self
    }

    pub fn type_parameter(&mut self, name: &str) -> &mut Self {
        self.datatype_mut().add_type_parameter(name);
        self
    }

    pub fn property(
        &mut self,
        characteristic: PropertyCharacteristic,
        name: &str,
        type_reference: TypeRef,
    ) -> &mut Self {
        self.datatype_mut()
            .declare_property(characteristic, name, type_reference);
        self
    }

    /// Close any open declarations and return the finished model after a
    /// full reference-resolution pass.
    pub fn build(mut self) -> Result<TypeModel, TypewalkError> {
        self.flush_namespace();
        self.model.resolve_all()?;
        Ok(self.model)
    }

    fn namespace_mut(&mut self) -> &mut Namespace {
        if self.current_namespace.is_none() {
            self.current_namespace = Some(Namespace::from_qualified_name("app"));
        }
        self.current_namespace.as_mut().expect("namespace just set")
    }

    fn datatype_mut(&mut self) -> &mut Datatype {
        self.current_datatype
            .as_mut()
            .expect("datatype() must be called before supertypes/properties")
    }

    fn flush_datatype(&mut self) {
        if let Some(dt) = self.current_datatype.take() {
            self.namespace_mut()
                .add_declaration(TypeDeclaration::Datatype(dt));
        }
    }

    fn flush_namespace(&mut self) {
        self.flush_datatype();
        if let Some(ns) = self.current_namespace.take() {
            self.model.register_namespace(ns);
        }
    }
}

impl Default for ModelBuilder {
    fn default() -> Self {
        Self::new()
    }
}
