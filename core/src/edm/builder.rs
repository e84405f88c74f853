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

//! Fluent construction of an [`EdmModel`].
//!
//! Declarations keep names as text; everything is parsed, resolved and
//! validated by [`ModelBuilder::build`], which reports all failures at
//! once.
//!
//! ```rust
//! use odata_json_core::edm::builder::OperationDecl;
//! use odata_json_core::edm::builder::StructuredTypeDecl;
//! use odata_json_core::EdmModel;
//!
//! let model = EdmModel::builder()
//!     .structured(
//!         StructuredTypeDecl::entity("TestModel.Product")
//!             .key("Id")
//!             .property("Id", "Edm.Int32", false)
//!             .property("Name", "Edm.String", true),
//!     )
//!     .operation(OperationDecl::action("TestModel.Discount").parameter("percent", "Edm.Int32", false))
//!     .build()
//!     .unwrap();
//! assert!(model.find_type_by_name("TestModel.Product").is_some());
//! ```

use crate::edm::error::Error;
use crate::edm::model::EdmModel;
use crate::edm::model::EnumMember;
use crate::edm::model::EnumType;
use crate::edm::model::NavigationSource;
use crate::edm::model::NavigationSourceKind;
use crate::edm::model::Operation;
use crate::edm::model::OperationKind;
use crate::edm::model::Parameter;
use crate::edm::model::ParameterName;
use crate::edm::model::Property;
use crate::edm::model::PropertyKind;
use crate::edm::model::PropertyName;
use crate::edm::model::SchemaType;
use crate::edm::model::StructuredKind;
use crate::edm::model::StructuredType;
use crate::edm::model::TypeDefinition;
use crate::edm::model::TypeKind;
use crate::edm::model::TypeRef;
use crate::edm::model::UNTYPED;
use crate::edm::names::QualifiedName;
use crate::edm::names::SimpleIdentifier;
use crate::edm::names::TypeName;
use crate::edm::primitive::PrimitiveKind;
use std::collections::HashMap;
use std::collections::HashSet;

#[derive(Debug, Clone)]
struct PropertyDecl {
    name: String,
    type_name: String,
    nullable: bool,
    kind: PropertyKind,
}

/// Declaration of an entity or complex type.
#[derive(Debug, Clone)]
pub struct StructuredTypeDecl {
    name: String,
    kind: StructuredKind,
    base: Option<String>,
    is_abstract: bool,
    is_open: bool,
    has_stream: bool,
    key: Vec<String>,
    properties: Vec<PropertyDecl>,
}

impl StructuredTypeDecl {
    #[must_use]
    pub fn entity(name: &str) -> Self {
        Self::new(name, StructuredKind::Entity)
    }

    #[must_use]
    pub fn complex(name: &str) -> Self {
        Self::new(name, StructuredKind::Complex)
    }

    fn new(name: &str, kind: StructuredKind) -> Self {
        Self {
            name: name.into(),
            kind,
            base: None,
            is_abstract: false,
            is_open: false,
            has_stream: false,
            key: Vec::new(),
            properties: Vec::new(),
        }
    }

    #[must_use]
    pub fn base_type(mut self, base: &str) -> Self {
        self.base = Some(base.into());
        self
    }

    #[must_use]
    pub const fn open(mut self) -> Self {
        self.is_open = true;
        self
    }

    #[must_use]
    pub const fn abstract_type(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    #[must_use]
    pub const fn has_stream(mut self) -> Self {
        self.has_stream = true;
        self
    }

    #[must_use]
    pub fn key(mut self, name: &str) -> Self {
        self.key.push(name.into());
        self
    }

    /// Add structural property. `type_name` is a qualified type name,
    /// possibly `Collection(...)`.
    #[must_use]
    pub fn property(self, name: &str, type_name: &str, nullable: bool) -> Self {
        self.with_property(name, type_name, nullable, PropertyKind::Structural)
    }

    /// Add navigation property.
    #[must_use]
    pub fn navigation(self, name: &str, type_name: &str, nullable: bool) -> Self {
        let kind = PropertyKind::Navigation {
            contains_target: false,
        };
        self.with_property(name, type_name, nullable, kind)
    }

    /// Add containment navigation property.
    #[must_use]
    pub fn contained_navigation(self, name: &str, type_name: &str, nullable: bool) -> Self {
        let kind = PropertyKind::Navigation {
            contains_target: true,
        };
        self.with_property(name, type_name, nullable, kind)
    }

    fn with_property(mut self, name: &str, type_name: &str, nullable: bool, kind: PropertyKind) -> Self {
        self.properties.push(PropertyDecl {
            name: name.into(),
            type_name: type_name.into(),
            nullable,
            kind,
        });
        self
    }
}

/// Declaration of an enum type.
#[derive(Debug, Clone)]
pub struct EnumTypeDecl {
    name: String,
    underlying: String,
    is_flags: bool,
    members: Vec<(String, i64)>,
}

impl EnumTypeDecl {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.into(),
            underlying: "Edm.Int32".into(),
            is_flags: false,
            members: Vec::new(),
        }
    }

    #[must_use]
    pub fn underlying_type(mut self, type_name: &str) -> Self {
        self.underlying = type_name.into();
        self
    }

    #[must_use]
    pub const fn flags(mut self) -> Self {
        self.is_flags = true;
        self
    }

    #[must_use]
    pub fn member(mut self, name: &str, value: i64) -> Self {
        self.members.push((name.into(), value));
        self
    }
}

#[derive(Debug, Clone)]
struct ParameterDecl {
    name: String,
    type_name: String,
    nullable: bool,
    optional: bool,
}

/// Declaration of an action or function.
#[derive(Debug, Clone)]
pub struct OperationDecl {
    name: String,
    kind: OperationKind,
    is_bound: bool,
    parameters: Vec<ParameterDecl>,
    return_type: Option<(String, bool)>,
}

impl OperationDecl {
    #[must_use]
    pub fn action(name: &str) -> Self {
        Self::new(name, OperationKind::Action)
    }

    #[must_use]
    pub fn function(name: &str) -> Self {
        Self::new(name, OperationKind::Function)
    }

    fn new(name: &str, kind: OperationKind) -> Self {
        Self {
            name: name.into(),
            kind,
            is_bound: false,
            parameters: Vec::new(),
            return_type: None,
        }
    }

    /// Make the operation bound. The binding parameter is inserted as the
    /// first parameter.
    #[must_use]
    pub fn bound(mut self, name: &str, type_name: &str) -> Self {
        self.is_bound = true;
        self.parameters.insert(
            0,
            ParameterDecl {
                name: name.into(),
                type_name: type_name.into(),
                nullable: false,
                optional: false,
            },
        );
        self
    }

    #[must_use]
    pub fn parameter(mut self, name: &str, type_name: &str, nullable: bool) -> Self {
        self.parameters.push(ParameterDecl {
            name: name.into(),
            type_name: type_name.into(),
            nullable,
            optional: false,
        });
        self
    }

    /// Parameter that may be omitted from payloads.
    #[must_use]
    pub fn optional_parameter(mut self, name: &str, type_name: &str) -> Self {
        self.parameters.push(ParameterDecl {
            name: name.into(),
            type_name: type_name.into(),
            nullable: true,
            optional: true,
        });
        self
    }

    #[must_use]
    pub fn returns(mut self, type_name: &str, nullable: bool) -> Self {
        self.return_type = Some((type_name.into(), nullable));
        self
    }
}

/// Declaration of an entity set or singleton.
#[derive(Debug, Clone)]
pub struct NavigationSourceDecl {
    name: String,
    kind: NavigationSourceKind,
    entity_type: String,
    bindings: Vec<(String, String)>,
}

impl NavigationSourceDecl {
    #[must_use]
    pub fn entity_set(name: &str, entity_type: &str) -> Self {
        Self::new(name, NavigationSourceKind::EntitySet, entity_type)
    }

    #[must_use]
    pub fn singleton(name: &str, entity_type: &str) -> Self {
        Self::new(name, NavigationSourceKind::Singleton, entity_type)
    }

    fn new(name: &str, kind: NavigationSourceKind, entity_type: &str) -> Self {
        Self {
            name: name.into(),
            kind,
            entity_type: entity_type.into(),
            bindings: Vec::new(),
        }
    }

    /// Bind navigation property `path` to navigation source `target`.
    #[must_use]
    pub fn binding(mut self, path: &str, target: &str) -> Self {
        self.bindings.push((path.into(), target.into()));
        self
    }
}

#[derive(Debug, Clone)]
enum TypeDecl {
    Structured(StructuredTypeDecl),
    Enum(EnumTypeDecl),
    Definition { name: String, underlying: String },
}

impl TypeDecl {
    fn name(&self) -> &str {
        match self {
            Self::Structured(v) => &v.name,
            Self::Enum(v) => &v.name,
            Self::Definition { name, .. } => name,
        }
    }
}

/// Builder of [`EdmModel`].
#[derive(Debug, Clone, Default)]
pub struct ModelBuilder {
    types: Vec<TypeDecl>,
    operations: Vec<OperationDecl>,
    sources: Vec<NavigationSourceDecl>,
}

/// Declared kind of a type, known before types are resolved.
#[derive(Clone, Copy)]
enum DeclaredKind {
    Structured(StructuredKind),
    Enum,
    Definition(PrimitiveKind),
}

impl ModelBuilder {
    #[must_use]
    pub fn structured(mut self, decl: StructuredTypeDecl) -> Self {
        self.types.push(TypeDecl::Structured(decl));
        self
    }

    #[must_use]
    pub fn enum_type(mut self, decl: EnumTypeDecl) -> Self {
        self.types.push(TypeDecl::Enum(decl));
        self
    }

    #[must_use]
    pub fn type_definition(mut self, name: &str, underlying: &str) -> Self {
        self.types.push(TypeDecl::Definition {
            name: name.into(),
            underlying: underlying.into(),
        });
        self
    }

    #[must_use]
    pub fn operation(mut self, decl: OperationDecl) -> Self {
        self.operations.push(decl);
        self
    }

    #[must_use]
    pub fn navigation_source(mut self, decl: NavigationSourceDecl) -> Self {
        self.sources.push(decl);
        self
    }

    /// Resolve and validate all declarations.
    ///
    /// # Errors
    ///
    /// Returns all problems found: invalid names, unresolved type
    /// references, inheritance problems, invalid bindings.
    pub fn build(self) -> Result<EdmModel, Error> {
        let mut errors = Vec::new();
        let kinds = self.declared_kinds(&mut errors);

        let mut model = EdmModel::default();
        for decl in &self.types {
            let result = match decl {
                TypeDecl::Structured(v) => build_structured(v, &kinds).map(SchemaType::Structured),
                TypeDecl::Enum(v) => build_enum(v).map(SchemaType::Enum),
                TypeDecl::Definition { name, underlying } => {
                    build_definition(name, underlying).map(SchemaType::Definition)
                }
            };
            match result {
                Ok(ty) => {
                    let name = match &ty {
                        SchemaType::Structured(t) => t.name.clone(),
                        SchemaType::Enum(t) => t.name.clone(),
                        SchemaType::Definition(t) => t.name.clone(),
                    };
                    model.types.entry(name).or_insert(ty);
                }
                Err(err) => errors.push(Error::Type(decl.name().into(), Box::new(err))),
            }
        }

        for ty in model.types.values() {
            if let SchemaType::Structured(t) = ty {
                if let Err(err) = check_inheritance(&model, t) {
                    errors.push(Error::Type(t.name.to_string(), Box::new(err)));
                } else if let Some(base) = &t.base_type {
                    model
                        .child_map
                        .entry(base.clone())
                        .or_default()
                        .push(t.name.clone());
                }
            }
        }

        for decl in &self.operations {
            match build_operation(decl, &kinds) {
                Ok(op) => model.operations.entry(op.name.clone()).or_default().push(op),
                Err(err) => errors.push(Error::Operation(decl.name.clone(), Box::new(err))),
            }
        }

        for decl in &self.sources {
            if model.navigation_sources.contains_key(&decl.name) {
                errors.push(Error::DuplicateNavigationSource(decl.name.clone()));
                continue;
            }
            match build_navigation_source(decl, &model, &self.sources) {
                Ok(source) => {
                    model.navigation_sources.insert(source.name.clone(), source);
                }
                Err(err) => errors.push(Error::NavigationSource(decl.name.clone(), Box::new(err))),
            }
        }

        match errors.len() {
            0 => Ok(model),
            1 => Err(errors.remove(0)),
            _ => Err(Error::Multiple(errors)),
        }
    }

    fn declared_kinds(&self, errors: &mut Vec<Error>) -> HashMap<QualifiedName, DeclaredKind> {
        let mut kinds = HashMap::new();
        for decl in &self.types {
            let kind = match decl {
                TypeDecl::Structured(v) => DeclaredKind::Structured(v.kind),
                TypeDecl::Enum(_) => DeclaredKind::Enum,
                TypeDecl::Definition { underlying, .. } => match primitive_kind(underlying) {
                    Some(k) => DeclaredKind::Definition(k),
                    // Reported when the definition itself is built.
                    None => continue,
                },
            };
            // Invalid names are reported when the type itself is built.
            if let Ok(name) = decl.name().parse::<QualifiedName>() {
                if kinds.insert(name, kind).is_some() {
                    errors.push(Error::DuplicateType(decl.name().into()));
                }
            }
        }
        kinds
    }
}

fn primitive_kind(type_name: &str) -> Option<PrimitiveKind> {
    type_name
        .parse::<QualifiedName>()
        .ok()
        .filter(QualifiedName::is_edm)
        .and_then(|n| PrimitiveKind::from_name(n.name.as_str()))
}

fn resolve_type(
    type_name: &str,
    nullable: bool,
    kinds: &HashMap<QualifiedName, DeclaredKind>,
) -> Result<TypeRef, Error> {
    let type_name: TypeName = type_name.parse()?;
    let element = type_name.element();
    let kind = if element.is_edm() {
        if element.name.as_str() == UNTYPED {
            TypeKind::Untyped
        } else {
            PrimitiveKind::from_name(element.name.as_str())
                .map(TypeKind::Primitive)
                .ok_or_else(|| Error::TypeNotFound(element.to_string()))?
        }
    } else {
        match kinds.get(element) {
            Some(DeclaredKind::Structured(_)) => TypeKind::Structured(element.clone()),
            Some(DeclaredKind::Enum) => TypeKind::Enum(element.clone()),
            Some(DeclaredKind::Definition(k)) => TypeKind::Definition(element.clone(), *k),
            None => return Err(Error::TypeNotFound(element.to_string())),
        }
    };
    Ok(TypeRef {
        element: kind,
        collection: type_name.is_collection(),
        nullable,
    })
}

fn build_structured(
    decl: &StructuredTypeDecl,
    kinds: &HashMap<QualifiedName, DeclaredKind>,
) -> Result<StructuredType, Error> {
    let name: QualifiedName = decl.name.parse()?;
    let base_type = decl
        .base
        .as_ref()
        .map(|base| {
            let base: QualifiedName = base.parse()?;
            match kinds.get(&base) {
                Some(DeclaredKind::Structured(kind)) if *kind == decl.kind => Ok(base),
                Some(DeclaredKind::Structured(_)) => Err(Error::BaseTypeKindMismatch(base.to_string())),
                Some(_) => Err(Error::NotAStructuredType(base.to_string())),
                None => Err(Error::TypeNotFound(base.to_string())),
            }
        })
        .transpose()?;

    let mut seen = HashSet::new();
    let properties = decl
        .properties
        .iter()
        .map(|p| {
            build_property(p, kinds, &mut seen).map_err(|err| Error::Property(p.name.clone(), Box::new(err)))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(StructuredType {
        name,
        kind: decl.kind,
        base_type,
        is_abstract: decl.is_abstract,
        is_open: decl.is_open,
        has_stream: decl.has_stream,
        key: decl.key.iter().map(|k| PropertyName::new(k.clone())).collect(),
        properties,
    })
}

fn build_property(
    decl: &PropertyDecl,
    kinds: &HashMap<QualifiedName, DeclaredKind>,
    seen: &mut HashSet<String>,
) -> Result<Property, Error> {
    decl.name.parse::<SimpleIdentifier>()?;
    if !seen.insert(decl.name.clone()) {
        return Err(Error::DuplicateProperty(decl.name.clone()));
    }
    let type_ref = resolve_type(&decl.type_name, decl.nullable, kinds)?;
    if matches!(decl.kind, PropertyKind::Navigation { .. }) {
        let is_entity = match &type_ref.element {
            TypeKind::Structured(n) => {
                matches!(kinds.get(n), Some(DeclaredKind::Structured(StructuredKind::Entity)))
            }
            _ => false,
        };
        if !is_entity {
            return Err(Error::NotAnEntityType(decl.type_name.clone()));
        }
    }
    Ok(Property {
        name: PropertyName::new(decl.name.clone()),
        type_ref,
        kind: decl.kind.clone(),
    })
}

fn build_enum(decl: &EnumTypeDecl) -> Result<EnumType, Error> {
    let name: QualifiedName = decl.name.parse()?;
    let underlying = primitive_kind(&decl.underlying)
        .filter(|k| k.is_integral())
        .ok_or_else(|| Error::InvalidUnderlyingType(decl.underlying.clone()))?;
    let members = decl
        .members
        .iter()
        .map(|(name, value)| {
            name.parse::<SimpleIdentifier>()?;
            Ok(EnumMember {
                name: name.clone(),
                value: *value,
            })
        })
        .collect::<Result<Vec<_>, Error>>()?;
    Ok(EnumType {
        name,
        underlying,
        is_flags: decl.is_flags,
        members,
    })
}

fn build_definition(name: &str, underlying: &str) -> Result<TypeDefinition, Error> {
    Ok(TypeDefinition {
        name: name.parse()?,
        underlying: primitive_kind(underlying)
            .ok_or_else(|| Error::InvalidUnderlyingType(underlying.into()))?,
    })
}

fn check_inheritance(model: &EdmModel, ty: &StructuredType) -> Result<(), Error> {
    let mut visited = HashSet::new();
    let mut current = ty;
    visited.insert(&current.name);
    while let Some(base) = model.base_type(current) {
        if !visited.insert(&base.name) {
            return Err(Error::InheritanceCycle(base.name.to_string()));
        }
        current = base;
    }
    for key in &ty.key {
        if model.find_property(ty, key.inner()).is_none() {
            return Err(Error::KeyPropertyNotFound(key.inner().clone()));
        }
    }
    Ok(())
}

fn build_operation(
    decl: &OperationDecl,
    kinds: &HashMap<QualifiedName, DeclaredKind>,
) -> Result<Operation, Error> {
    let name: QualifiedName = decl.name.parse()?;
    if decl.is_bound && decl.parameters.is_empty() {
        return Err(Error::NoBindingParameter);
    }
    let parameters = decl
        .parameters
        .iter()
        .map(|p| {
            p.name
                .parse::<SimpleIdentifier>()
                .map_err(Error::from)
                .and_then(|_| resolve_type(&p.type_name, p.nullable, kinds))
                .map(|type_ref| Parameter {
                    name: ParameterName::new(p.name.clone()),
                    type_ref,
                    optional: p.optional,
                })
                .map_err(|err| Error::Parameter(p.name.clone(), Box::new(err)))
        })
        .collect::<Result<Vec<_>, _>>()?;
    let return_type = decl
        .return_type
        .as_ref()
        .map(|(t, nullable)| resolve_type(t, *nullable, kinds))
        .transpose()?;
    Ok(Operation {
        name,
        kind: decl.kind,
        is_bound: decl.is_bound,
        parameters,
        return_type,
    })
}

fn build_navigation_source(
    decl: &NavigationSourceDecl,
    model: &EdmModel,
    all: &[NavigationSourceDecl],
) -> Result<NavigationSource, Error> {
    let entity_type: QualifiedName = decl.entity_type.parse()?;
    let ty = match model.find_structured_type(&entity_type) {
        Some(t) if t.kind == StructuredKind::Entity => t,
        Some(_) => return Err(Error::NotAnEntityType(decl.entity_type.clone())),
        None => return Err(Error::TypeNotFound(decl.entity_type.clone())),
    };
    for (path, target) in &decl.bindings {
        if !model.find_property(ty, path).is_some_and(Property::is_navigation) {
            return Err(Error::NavigationPropertyNotFound(path.clone()));
        }
        if !all.iter().any(|s| &s.name == target) {
            return Err(Error::NavigationSourceNotFound(target.clone()));
        }
    }
    Ok(NavigationSource {
        name: decl.name.clone(),
        kind: decl.kind,
        entity_type,
        bindings: decl.bindings.iter().cloned().collect(),
    })
}
