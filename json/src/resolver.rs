// SPDX-FileCopyrightText: Copyright (c) 2025 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! EDM type resolution.
//!
//! Given the type expected by the model and the type annotated in the
//! payload, [`TypeResolver`] decides how a resource or property value is
//! read. Lenient fallbacks (undeclared properties retained, payload type
//! overriding metadata) are controlled by
//! [`Validations`](odata_json_core::settings::Validations).

use crate::lexer::JsonNode;
use crate::Error;
use odata_json_core::edm::model::UNTYPED;
use odata_json_core::edm::EnumType;
use odata_json_core::edm::PrimitiveKind;
use odata_json_core::edm::Property;
use odata_json_core::edm::SchemaType;
use odata_json_core::edm::StructuredType;
use odata_json_core::edm::TypeKind;
use odata_json_core::edm::TypeName;
use odata_json_core::edm::TypeRef;
use odata_json_core::EdmModel;
use odata_json_core::ReaderSettings;
use tracing::warn;

/// Effective type of a resource.
#[derive(Debug, Clone, Default)]
pub struct ResourceType<'m> {
    /// Model type used for property lookups.
    pub structured: Option<&'m StructuredType>,
    /// Type name reported to the caller.
    pub name: Option<String>,
    /// Content of an `Edm.Untyped` value.
    pub untyped: bool,
}

impl<'m> ResourceType<'m> {
    #[must_use]
    pub fn model(ty: &'m StructuredType) -> Self {
        Self {
            structured: Some(ty),
            name: Some(ty.name.to_string()),
            untyped: false,
        }
    }

    /// Type trusted by name only.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            structured: None,
            name: Some(name.into()),
            untyped: false,
        }
    }

    #[must_use]
    pub fn untyped() -> Self {
        Self {
            structured: None,
            name: None,
            untyped: true,
        }
    }

    /// Properties not declared by the model are allowed.
    #[must_use]
    pub fn is_open(&self, model: &EdmModel) -> bool {
        self.untyped || self.structured.map_or(true, |t| model.is_open(t))
    }
}

/// JSON shape of a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Null,
    Scalar,
    Object,
    Array,
}

impl Shape {
    #[must_use]
    pub const fn of(node: &JsonNode<'_>) -> Self {
        match node {
            JsonNode::StartObject => Self::Object,
            JsonNode::StartArray => Self::Array,
            JsonNode::Primitive(v) if v.is_null() => Self::Null,
            _ => Self::Scalar,
        }
    }
}

/// How a property value is read.
#[derive(Debug, Clone)]
pub enum ValueKind<'m> {
    Primitive(PrimitiveKind),
    Enum(&'m EnumType),
    PrimitiveCollection(PrimitiveKind),
    EnumCollection(&'m EnumType),
    /// Nested resource.
    Resource(ResourceType<'m>),
    /// Nested resource set.
    ResourceSet(ResourceType<'m>),
    /// `Edm.Untyped`: materialized by JSON shape.
    Untyped,
    /// Raw JSON text.
    Raw,
    /// Scalar without type information.
    Dynamic,
}

/// Resolution of a property.
#[derive(Debug, Clone)]
pub struct ResolvedProperty<'m> {
    pub declared: Option<&'m Property>,
    pub kind: ValueKind<'m>,
    /// Type annotated in the payload, normalized.
    pub type_name: Option<String>,
}

impl ResolvedProperty<'_> {
    /// `null` is allowed for the property.
    #[must_use]
    pub fn is_nullable(&self) -> bool {
        self.declared
            .map_or(true, |p| p.type_ref.nullable || p.type_ref.collection)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TypeResolver<'m> {
    model: &'m EdmModel,
    settings: &'m ReaderSettings,
}

impl<'m> TypeResolver<'m> {
    #[must_use]
    pub const fn new(model: &'m EdmModel, settings: &'m ReaderSettings) -> Self {
        Self { model, settings }
    }

    #[must_use]
    pub const fn model(&self) -> &'m EdmModel {
        self.model
    }

    /// Effective type of a resource expected to be of type `expected`
    /// that carries `payload_type` in its `@odata.type` annotation.
    ///
    /// # Errors
    ///
    /// Returns error if the payload type is malformed, not structured, not
    /// derived from the expected type or unknown (the last two only when
    /// conflicts with metadata are rejected).
    pub fn resolve_resource_type(
        &self,
        expected: &ResourceType<'m>,
        payload_type: Option<&str>,
    ) -> Result<ResourceType<'m>, Error> {
        let Some(payload_type) = payload_type else {
            return Ok(expected.clone());
        };
        let type_name = TypeName::from_payload(payload_type)?;
        let TypeName::One(name) = &type_name else {
            return Err(Error::CollectionTypeMismatch {
                property: expected.name.clone().unwrap_or_default(),
                type_name: type_name.to_string(),
            });
        };
        let strict = self.settings.validations.throw_if_type_conflicts_with_metadata;
        match self.model.find_type(name) {
            Some(SchemaType::Structured(actual)) => match expected.structured {
                Some(base) if !self.model.is_derived_from(actual, base) => {
                    if strict {
                        return Err(Error::IncompatibleResourceType {
                            expected: base.name.to_string(),
                            actual: name.to_string(),
                        });
                    }
                    warn!(expected = %base.name, actual = %name, "payload type overrides metadata");
                    Ok(ResourceType::model(actual))
                }
                _ => Ok(ResourceType::model(actual)),
            },
            Some(_) => Err(Error::NotAStructuredType(name.to_string())),
            None => match expected.structured {
                Some(_) if strict => Err(Error::UnknownTypeName(name.to_string())),
                Some(base) => {
                    warn!(expected = %base.name, actual = %name, "unknown payload type");
                    Ok(ResourceType {
                        structured: Some(base),
                        name: Some(name.to_string()),
                        untyped: false,
                    })
                }
                None => Ok(ResourceType {
                    structured: None,
                    name: Some(name.to_string()),
                    untyped: expected.untyped,
                }),
            },
        }
    }

    /// Resolve how to read property `name` of a resource of type `owner`.
    ///
    /// # Errors
    ///
    /// Returns error if the property is undeclared on a non-open type, its
    /// payload type conflicts with the declared type, or the type does not
    /// match the JSON shape of the value.
    pub fn resolve_property(
        &self,
        owner: &ResourceType<'m>,
        name: &str,
        payload_type: Option<&str>,
        shape: Shape,
    ) -> Result<ResolvedProperty<'m>, Error> {
        let payload_type = payload_type.map(TypeName::from_payload).transpose()?;
        let declared = owner
            .structured
            .and_then(|t| self.model.find_property(t, name));
        let kind = match declared {
            Some(p) => self.declared_kind(p, payload_type.as_ref(), shape)?,
            None => self.undeclared_kind(owner, name, payload_type.as_ref(), shape)?,
        };
        Ok(ResolvedProperty {
            declared,
            kind,
            type_name: payload_type.map(|t| t.to_string()),
        })
    }

    /// Check the `@odata.type` annotation of a value declared as
    /// `type_ref`, such as an operation parameter. Derived and promoted
    /// payload types are accepted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeConflict`] if the payload type conflicts with
    /// the declared type and conflicts with metadata are rejected.
    pub fn check_declared_type(&self, name: &str, type_ref: &TypeRef, payload_type: Option<&str>) -> Result<(), Error> {
        let Some(payload_type) = payload_type else {
            return Ok(());
        };
        let actual = TypeName::from_payload(payload_type)?;
        let declared_name = type_ref.type_name();
        if type_ref.element == TypeKind::Untyped || actual == declared_name {
            return Ok(());
        }
        let conflict = || Error::TypeConflict {
            property: name.to_string(),
            expected: declared_name.to_string(),
            actual: actual.to_string(),
        };
        if actual.is_collection() != type_ref.collection {
            return Err(conflict());
        }
        match self.compatibility(&actual, type_ref) {
            Compatibility::Derived | Compatibility::Promoted => Ok(()),
            Compatibility::Conflict if self.settings.validations.throw_if_type_conflicts_with_metadata => {
                Err(conflict())
            }
            Compatibility::Conflict => {
                warn!(
                    property = name,
                    expected = %declared_name,
                    actual = %actual,
                    "payload type conflicts with metadata"
                );
                Ok(())
            }
        }
    }

    fn declared_kind(
        &self,
        property: &'m Property,
        payload_type: Option<&TypeName>,
        shape: Shape,
    ) -> Result<ValueKind<'m>, Error> {
        let name = property.name.inner();
        let type_ref = &property.type_ref;
        if type_ref.element == TypeKind::Untyped {
            return match payload_type {
                Some(t) => self.kind_for_type_name(t, name, shape),
                None if type_ref.collection => {
                    check_shape(true, shape, name, &type_ref.type_name())?;
                    Ok(ValueKind::Untyped)
                }
                None => Ok(ValueKind::Untyped),
            };
        }
        let declared_name = type_ref.type_name();
        if let Some(actual) = payload_type.filter(|t| **t != declared_name) {
            let conflict = || Error::TypeConflict {
                property: name.to_string(),
                expected: declared_name.to_string(),
                actual: actual.to_string(),
            };
            if actual.is_collection() != type_ref.collection {
                return Err(conflict());
            }
            match self.compatibility(actual, type_ref) {
                Compatibility::Derived => return self.kind_for_type_name(actual, name, shape),
                Compatibility::Promoted => {}
                Compatibility::Conflict => {
                    if self.settings.validations.throw_if_type_conflicts_with_metadata {
                        return Err(conflict());
                    }
                    warn!(
                        property = name,
                        expected = %declared_name,
                        actual = %actual,
                        "payload type overrides metadata"
                    );
                    return self.kind_for_type_name(actual, name, shape);
                }
            }
        }
        self.kind_for_type_ref(type_ref, name, shape)
    }

    fn undeclared_kind(
        &self,
        owner: &ResourceType<'m>,
        name: &str,
        payload_type: Option<&TypeName>,
        shape: Shape,
    ) -> Result<ValueKind<'m>, Error> {
        let open = owner.is_open(self.model);
        if !open {
            if self
                .settings
                .validations
                .throw_on_undeclared_property_for_non_open_type
            {
                return Err(Error::UndeclaredProperty {
                    type_name: owner.name.clone().unwrap_or_default(),
                    property: name.into(),
                });
            }
            warn!(property = name, "undeclared property retained");
        }
        if let Some(t) = payload_type {
            return self.kind_for_type_name(t, name, shape);
        }
        Ok(match shape {
            Shape::Object | Shape::Array if owner.untyped => ValueKind::Untyped,
            Shape::Object | Shape::Array if self.settings.read_untyped_as_string => ValueKind::Raw,
            Shape::Object | Shape::Array => ValueKind::Untyped,
            Shape::Scalar | Shape::Null if !open && self.settings.read_untyped_as_string => {
                ValueKind::Raw
            }
            Shape::Scalar | Shape::Null => ValueKind::Dynamic,
        })
    }

    /// Value kind of a declared type.
    ///
    /// # Errors
    ///
    /// Returns error if the type does not match the JSON shape or refers
    /// to a type missing from the model.
    pub fn kind_for_type_ref(
        &self,
        type_ref: &TypeRef,
        name: &str,
        shape: Shape,
    ) -> Result<ValueKind<'m>, Error> {
        if type_ref.element != TypeKind::Untyped {
            check_shape(type_ref.collection, shape, name, &type_ref.type_name())?;
        }
        let collection = type_ref.collection;
        Ok(match &type_ref.element {
            TypeKind::Primitive(k) | TypeKind::Definition(_, k) if collection => {
                ValueKind::PrimitiveCollection(*k)
            }
            TypeKind::Primitive(k) | TypeKind::Definition(_, k) => ValueKind::Primitive(*k),
            TypeKind::Untyped => ValueKind::Untyped,
            TypeKind::Enum(qname) => {
                let ty = self
                    .model
                    .find_enum_type(qname)
                    .ok_or_else(|| Error::UnknownTypeName(qname.to_string()))?;
                if collection {
                    ValueKind::EnumCollection(ty)
                } else {
                    ValueKind::Enum(ty)
                }
            }
            TypeKind::Structured(qname) => {
                let ty = self
                    .model
                    .find_structured_type(qname)
                    .ok_or_else(|| Error::UnknownTypeName(qname.to_string()))?;
                if collection {
                    ValueKind::ResourceSet(ResourceType::model(ty))
                } else {
                    ValueKind::Resource(ResourceType::model(ty))
                }
            }
        })
    }

    /// Value kind of a type named in the payload. Structured types unknown
    /// to the model are trusted by name.
    ///
    /// # Errors
    ///
    /// Returns error if the type does not match the JSON shape or is an
    /// unknown `Edm` type.
    pub fn kind_for_type_name(
        &self,
        type_name: &TypeName,
        name: &str,
        shape: Shape,
    ) -> Result<ValueKind<'m>, Error> {
        let collection = type_name.is_collection();
        let element = type_name.element();
        if element.is_edm() && element.name.as_str() == UNTYPED {
            if collection {
                check_shape(true, shape, name, type_name)?;
            }
            return Ok(ValueKind::Untyped);
        }
        check_shape(collection, shape, name, type_name)?;
        if element.is_edm() {
            let kind = PrimitiveKind::from_name(element.name.as_str())
                .ok_or_else(|| Error::UnknownTypeName(element.to_string()))?;
            return Ok(if collection {
                ValueKind::PrimitiveCollection(kind)
            } else {
                ValueKind::Primitive(kind)
            });
        }
        Ok(match (self.model.find_type(element), collection) {
            (Some(SchemaType::Structured(t)), false) => ValueKind::Resource(ResourceType::model(t)),
            (Some(SchemaType::Structured(t)), true) => ValueKind::ResourceSet(ResourceType::model(t)),
            (Some(SchemaType::Enum(t)), false) => ValueKind::Enum(t),
            (Some(SchemaType::Enum(t)), true) => ValueKind::EnumCollection(t),
            (Some(SchemaType::Definition(t)), false) => ValueKind::Primitive(t.underlying),
            (Some(SchemaType::Definition(t)), true) => ValueKind::PrimitiveCollection(t.underlying),
            (None, _) => match shape {
                Shape::Object => ValueKind::Resource(ResourceType::named(element.to_string())),
                Shape::Array => ValueKind::ResourceSet(ResourceType::named(element.to_string())),
                Shape::Scalar | Shape::Null => {
                    warn!(property = name, type_name = %element, "unknown type of primitive value");
                    ValueKind::Dynamic
                }
            },
        })
    }

    fn compatibility(&self, actual: &TypeName, declared: &TypeRef) -> Compatibility {
        let element = actual.element();
        let compatible = match &declared.element {
            TypeKind::Primitive(k) | TypeKind::Definition(_, k) => element.is_edm()
                && PrimitiveKind::from_name(element.name.as_str())
                    .is_some_and(|a| a == *k || a.promotes_to(*k)),
            TypeKind::Enum(qname) => element == qname,
            TypeKind::Structured(qname) => {
                match (
                    self.model.find_structured_type(element),
                    self.model.find_structured_type(qname),
                ) {
                    (Some(a), Some(d)) if self.model.is_derived_from(a, d) => {
                        return Compatibility::Derived
                    }
                    _ => false,
                }
            }
            TypeKind::Untyped => true,
        };
        if compatible {
            Compatibility::Promoted
        } else {
            Compatibility::Conflict
        }
    }
}

enum Compatibility {
    /// Payload type is derived from the declared structured type.
    Derived,
    /// Values of the payload type are read as the declared type.
    Promoted,
    Conflict,
}

fn check_shape(collection: bool, shape: Shape, name: &str, type_name: &TypeName) -> Result<(), Error> {
    match (collection, shape) {
        (true, Shape::Object | Shape::Scalar) => Err(Error::CollectionTypeMismatch {
            property: name.into(),
            type_name: type_name.to_string(),
        }),
        (false, Shape::Array) => Err(Error::SingletonTypeMismatch {
            property: name.into(),
            type_name: type_name.to_string(),
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use odata_json_core::edm::builder::StructuredTypeDecl;
    use odata_json_core::settings::Validations;

    fn model() -> EdmModel {
        EdmModel::builder()
            .structured(
                StructuredTypeDecl::complex("NS.Address")
                    .property("Street", "Edm.String", true)
                    .property("Amount", "Edm.Decimal", false)
                    .property("Any", "Edm.Untyped", true)
                    .property("Tags", "Collection(Edm.String)", false),
            )
            .structured(
                StructuredTypeDecl::complex("NS.DerivedAddress")
                    .base_type("NS.Address")
                    .property("Number", "Edm.Int32", true),
            )
            .structured(StructuredTypeDecl::complex("NS.Other"))
            .structured(StructuredTypeDecl::complex("NS.OpenThing").open())
            .build()
            .unwrap()
    }

    fn address(model: &EdmModel) -> ResourceType<'_> {
        let name = "NS.Address".parse().unwrap();
        ResourceType::model(model.find_structured_type(&name).unwrap())
    }

    #[test]
    fn derived_resource_type() {
        let model = model();
        let settings = ReaderSettings::default();
        let r = TypeResolver::new(&model, &settings);
        let ty = r
            .resolve_resource_type(&address(&model), Some("#NS.DerivedAddress"))
            .unwrap();
        assert_eq!(ty.name.as_deref(), Some("NS.DerivedAddress"));
        assert!(matches!(
            r.resolve_resource_type(&address(&model), Some("#NS.Other")),
            Err(Error::IncompatibleResourceType { .. })
        ));
        assert!(matches!(
            r.resolve_resource_type(&address(&model), Some("#NS.Missing")),
            Err(Error::UnknownTypeName(_))
        ));
    }

    #[test]
    fn lenient_resource_type() {
        let model = model();
        let settings = ReaderSettings::default().validations(Validations::none());
        let r = TypeResolver::new(&model, &settings);
        let ty = r
            .resolve_resource_type(&address(&model), Some("#NS.Other"))
            .unwrap();
        assert_eq!(ty.name.as_deref(), Some("NS.Other"));
        let ty = r
            .resolve_resource_type(&address(&model), Some("#NS.Missing"))
            .unwrap();
        assert_eq!(ty.name.as_deref(), Some("NS.Missing"));
        assert_eq!(ty.structured.map(|t| t.name.to_string()).as_deref(), Some("NS.Address"));
    }

    #[test]
    fn undeclared_property() {
        let model = model();
        let settings = ReaderSettings::default();
        let r = TypeResolver::new(&model, &settings);
        assert!(matches!(
            r.resolve_property(&address(&model), "Nope", None, Shape::Scalar),
            Err(Error::UndeclaredProperty { .. })
        ));
        let settings = ReaderSettings::default().validations(Validations::none());
        let r = TypeResolver::new(&model, &settings);
        let p = r
            .resolve_property(&address(&model), "Nope", None, Shape::Scalar)
            .unwrap();
        assert!(matches!(p.kind, ValueKind::Raw));
        let p = r
            .resolve_property(&address(&model), "Nope", Some("#Collection(NS.Unknown)"), Shape::Array)
            .unwrap();
        assert!(matches!(p.kind, ValueKind::ResourceSet(t) if t.name.as_deref() == Some("NS.Unknown")));
    }

    #[test]
    fn shape_mismatch() {
        let model = model();
        let settings = ReaderSettings::default().validations(Validations::none());
        let r = TypeResolver::new(&model, &settings);
        assert!(matches!(
            r.resolve_property(&address(&model), "Nope", Some("#Collection(NS.Unknown)"), Shape::Object),
            Err(Error::CollectionTypeMismatch { .. })
        ));
        assert!(matches!(
            r.resolve_property(&address(&model), "Nope", Some("#NS.Unknown"), Shape::Array),
            Err(Error::SingletonTypeMismatch { .. })
        ));
        assert!(matches!(
            r.resolve_property(&address(&model), "Tags", None, Shape::Scalar),
            Err(Error::CollectionTypeMismatch { .. })
        ));
    }

    #[test]
    fn collection_annotation_on_single_property() {
        let model = model();
        let settings = ReaderSettings::default().validations(Validations::none());
        let r = TypeResolver::new(&model, &settings);
        assert!(matches!(
            r.resolve_property(&address(&model), "Street", Some("#Collection(Edm.String)"), Shape::Array),
            Err(Error::TypeConflict { .. })
        ));
    }

    #[test]
    fn type_conflict() {
        let model = model();
        let settings = ReaderSettings::default();
        let r = TypeResolver::new(&model, &settings);
        assert!(matches!(
            r.resolve_property(&address(&model), "Street", Some("#Int32"), Shape::Scalar),
            Err(Error::TypeConflict { .. })
        ));
        let settings = ReaderSettings::default().validations(Validations::none());
        let r = TypeResolver::new(&model, &settings);
        let p = r
            .resolve_property(&address(&model), "Street", Some("#Int32"), Shape::Scalar)
            .unwrap();
        assert!(matches!(p.kind, ValueKind::Primitive(PrimitiveKind::Int32)));
    }

    #[test]
    fn declared_type_check() {
        let model = model();
        let settings = ReaderSettings::default();
        let r = TypeResolver::new(&model, &settings);
        let street = model
            .find_structured_type(&"NS.Address".parse().unwrap())
            .and_then(|t| model.find_property(t, "Street"))
            .unwrap();
        assert!(r.check_declared_type("Street", &street.type_ref, None).is_ok());
        assert!(r.check_declared_type("Street", &street.type_ref, Some("#String")).is_ok());
        assert!(matches!(
            r.check_declared_type("Street", &street.type_ref, Some("#Int32")),
            Err(Error::TypeConflict { .. })
        ));
        assert!(matches!(
            r.check_declared_type("Street", &street.type_ref, Some("#Collection(Edm.String)")),
            Err(Error::TypeConflict { .. })
        ));
        let settings = ReaderSettings::default().validations(Validations::none());
        let r = TypeResolver::new(&model, &settings);
        assert!(r.check_declared_type("Street", &street.type_ref, Some("#Int32")).is_ok());
    }

    #[test]
    fn promoted_type_keeps_declared_kind() {
        let model = model();
        let settings = ReaderSettings::default();
        let r = TypeResolver::new(&model, &settings);
        let p = r
            .resolve_property(&address(&model), "Amount", Some("#Int32"), Shape::Scalar)
            .unwrap();
        assert!(matches!(p.kind, ValueKind::Primitive(PrimitiveKind::Decimal)));
    }

    #[test]
    fn untyped_declared_property() {
        let model = model();
        let settings = ReaderSettings::default();
        let r = TypeResolver::new(&model, &settings);
        for shape in [Shape::Object, Shape::Array, Shape::Scalar, Shape::Null] {
            let p = r.resolve_property(&address(&model), "Any", None, shape).unwrap();
            assert!(matches!(p.kind, ValueKind::Untyped));
        }
    }

    #[test]
    fn open_type_dynamic_values() {
        let model = model();
        let settings = ReaderSettings::default();
        let r = TypeResolver::new(&model, &settings);
        let name = "NS.OpenThing".parse().unwrap();
        let open = ResourceType::model(model.find_structured_type(&name).unwrap());
        let p = r.resolve_property(&open, "X", None, Shape::Scalar).unwrap();
        assert!(matches!(p.kind, ValueKind::Dynamic));
        let p = r.resolve_property(&open, "X", None, Shape::Object).unwrap();
        assert!(matches!(p.kind, ValueKind::Raw));
        let p = r
            .resolve_property(&ResourceType::untyped(), "X", None, Shape::Object)
            .unwrap();
        assert!(matches!(p.kind, ValueKind::Untyped));
    }
}
