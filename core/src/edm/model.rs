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

//! Built Entity Data Model and its lookups.

use crate::edm::builder::ModelBuilder;
use crate::edm::names::QualifiedName;
use crate::edm::names::TypeName;
use crate::edm::primitive::PrimitiveKind;
use std::collections::HashMap;
use tagged_types::TaggedType;

pub type PropertyName = TaggedType<String, PropertyNameTag>;
#[derive(tagged_types::Tag)]
#[implement(Clone, Hash, PartialEq, Eq)]
#[transparent(Debug, Display)]
#[capability(inner_access)]
pub enum PropertyNameTag {}

pub type ParameterName = TaggedType<String, ParameterNameTag>;
#[derive(tagged_types::Tag)]
#[implement(Clone, Hash, PartialEq, Eq)]
#[transparent(Debug, Display)]
#[capability(inner_access)]
pub enum ParameterNameTag {}

/// Name of `Edm.Untyped` without namespace.
pub const UNTYPED: &str = "Untyped";

/// Resolved element type of a property, parameter or return type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeKind {
    Primitive(PrimitiveKind),
    /// `Edm.Untyped`: any JSON value.
    Untyped,
    /// Entity or complex type.
    Structured(QualifiedName),
    Enum(QualifiedName),
    /// Type definition; values have the underlying primitive type.
    Definition(QualifiedName, PrimitiveKind),
}

impl TypeKind {
    #[must_use]
    pub fn qualified_name(&self) -> QualifiedName {
        match self {
            Self::Primitive(k) => QualifiedName::builtin(k.name()),
            Self::Untyped => QualifiedName::builtin(UNTYPED),
            Self::Structured(n) | Self::Enum(n) | Self::Definition(n, _) => n.clone(),
        }
    }

    /// Primitive kind values of this type are read as.
    #[must_use]
    pub const fn primitive(&self) -> Option<PrimitiveKind> {
        match self {
            Self::Primitive(k) | Self::Definition(_, k) => Some(*k),
            _ => None,
        }
    }
}

/// Reference to a type with facets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRef {
    pub element: TypeKind,
    pub collection: bool,
    pub nullable: bool,
}

impl TypeRef {
    #[must_use]
    pub fn type_name(&self) -> TypeName {
        let name = self.element.qualified_name();
        if self.collection {
            TypeName::CollectionOf(name)
        } else {
            TypeName::One(name)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructuredKind {
    Entity,
    Complex,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyKind {
    Structural,
    Navigation { contains_target: bool },
}

/// Structural or navigation property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub name: PropertyName,
    pub type_ref: TypeRef,
    pub kind: PropertyKind,
}

impl Property {
    #[must_use]
    pub const fn is_navigation(&self) -> bool {
        matches!(self.kind, PropertyKind::Navigation { .. })
    }
}

/// Entity or complex type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuredType {
    pub name: QualifiedName,
    pub kind: StructuredKind,
    pub base_type: Option<QualifiedName>,
    pub is_abstract: bool,
    pub is_open: bool,
    pub has_stream: bool,
    pub key: Vec<PropertyName>,
    pub properties: Vec<Property>,
}

impl StructuredType {
    /// Property declared on this type itself (base types not included).
    #[must_use]
    pub fn declared_property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name.inner() == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumMember {
    pub name: String,
    pub value: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumType {
    pub name: QualifiedName,
    pub underlying: PrimitiveKind,
    pub is_flags: bool,
    pub members: Vec<EnumMember>,
}

impl EnumType {
    #[must_use]
    pub fn member(&self, name: &str) -> Option<&EnumMember> {
        self.members.iter().find(|m| m.name == name)
    }

    /// Check a payload value: a member name, a comma separated list of
    /// member names for flags, or the integer value of a member.
    #[must_use]
    pub fn is_valid_value(&self, value: &str) -> bool {
        let is_member = |v: &str| {
            let v = v.trim();
            self.member(v).is_some()
                || v.parse::<i64>()
                    .is_ok_and(|n| self.members.iter().any(|m| m.value == n))
        };
        if self.is_flags {
            value.split(',').all(is_member)
        } else {
            is_member(value)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDefinition {
    pub name: QualifiedName,
    pub underlying: PrimitiveKind,
}

/// Named type declared in a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaType {
    Structured(StructuredType),
    Enum(EnumType),
    Definition(TypeDefinition),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Action,
    Function,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: ParameterName,
    pub type_ref: TypeRef,
    pub optional: bool,
}

/// Action or function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub name: QualifiedName,
    pub kind: OperationKind,
    pub is_bound: bool,
    /// For bound operations the first parameter is the binding parameter.
    pub parameters: Vec<Parameter>,
    pub return_type: Option<TypeRef>,
}

impl Operation {
    /// Parameters that appear in a request payload: the binding parameter
    /// is addressed by URL and excluded.
    pub fn payload_parameters(&self) -> impl Iterator<Item = &Parameter> {
        self.parameters.iter().skip(usize::from(self.is_bound))
    }

    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.payload_parameters().find(|p| p.name.inner() == name)
    }

    /// Parameters a payload must contain.
    pub fn required_parameters(&self) -> impl Iterator<Item = &Parameter> {
        self.payload_parameters()
            .filter(|p| !p.type_ref.nullable && !p.optional)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationSourceKind {
    EntitySet,
    Singleton,
}

/// Entity set or singleton of the entity container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationSource {
    pub name: String,
    pub kind: NavigationSourceKind,
    pub entity_type: QualifiedName,
    /// Navigation property path to target navigation source.
    pub bindings: HashMap<String, String>,
}

/// Immutable Entity Data Model.
#[derive(Debug, Clone, Default)]
pub struct EdmModel {
    pub(crate) types: HashMap<QualifiedName, SchemaType>,
    /// Mapping from base types to directly derived types.
    pub(crate) child_map: HashMap<QualifiedName, Vec<QualifiedName>>,
    pub(crate) operations: HashMap<QualifiedName, Vec<Operation>>,
    pub(crate) navigation_sources: HashMap<String, NavigationSource>,
}

impl EdmModel {
    /// Start building a model.
    #[must_use]
    pub fn builder() -> ModelBuilder {
        ModelBuilder::default()
    }

    #[must_use]
    pub fn find_type(&self, name: &QualifiedName) -> Option<&SchemaType> {
        self.types.get(name)
    }

    /// Find a type by its qualified name given as text.
    #[must_use]
    pub fn find_type_by_name(&self, name: &str) -> Option<&SchemaType> {
        name.parse().ok().and_then(|qname| self.types.get(&qname))
    }

    #[must_use]
    pub fn find_structured_type(&self, name: &QualifiedName) -> Option<&StructuredType> {
        match self.types.get(name) {
            Some(SchemaType::Structured(t)) => Some(t),
            _ => None,
        }
    }

    #[must_use]
    pub fn find_enum_type(&self, name: &QualifiedName) -> Option<&EnumType> {
        match self.types.get(name) {
            Some(SchemaType::Enum(t)) => Some(t),
            _ => None,
        }
    }

    #[must_use]
    pub fn base_type(&self, ty: &StructuredType) -> Option<&StructuredType> {
        ty.base_type
            .as_ref()
            .and_then(|base| self.find_structured_type(base))
    }

    /// Iterate over the type and all its base types, most derived first.
    pub fn type_chain<'a>(
        &'a self,
        ty: &'a StructuredType,
    ) -> impl Iterator<Item = &'a StructuredType> + 'a {
        std::iter::successors(Some(ty), move |t| self.base_type(t))
    }

    /// Find property declared on the type or any of its base types.
    #[must_use]
    pub fn find_property<'a>(&'a self, ty: &'a StructuredType, name: &str) -> Option<&'a Property> {
        self.type_chain(ty).find_map(|t| t.declared_property(name))
    }

    /// All properties including inherited ones, base type properties first.
    #[must_use]
    pub fn properties<'a>(&'a self, ty: &'a StructuredType) -> Vec<&'a Property> {
        let mut chain = self.type_chain(ty).collect::<Vec<_>>();
        chain.reverse();
        chain.into_iter().flat_map(|t| t.properties.iter()).collect()
    }

    /// Type is open if it or any base type is declared open.
    #[must_use]
    pub fn is_open(&self, ty: &StructuredType) -> bool {
        self.type_chain(ty).any(|t| t.is_open)
    }

    #[must_use]
    pub fn has_stream(&self, ty: &StructuredType) -> bool {
        self.type_chain(ty).any(|t| t.has_stream)
    }

    /// `derived` is `base` or inherits from it.
    #[must_use]
    pub fn is_derived_from(&self, derived: &StructuredType, base: &StructuredType) -> bool {
        self.type_chain(derived).any(|t| t.name == base.name)
    }

    /// Directly derived types.
    #[must_use]
    pub fn derived_types(&self, name: &QualifiedName) -> &[QualifiedName] {
        self.child_map.get(name).map_or(&[], Vec::as_slice)
    }

    /// First overload of the operation with the given name.
    #[must_use]
    pub fn find_operation(&self, name: &QualifiedName) -> Option<&Operation> {
        self.operations.get(name).and_then(|ops| ops.first())
    }

    /// All overloads of the operation with the given name.
    #[must_use]
    pub fn find_operations(&self, name: &QualifiedName) -> &[Operation] {
        self.operations.get(name).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn find_navigation_source(&self, name: &str) -> Option<&NavigationSource> {
        self.navigation_sources.get(name)
    }

    #[must_use]
    pub fn find_entity_set(&self, name: &str) -> Option<&NavigationSource> {
        self.find_navigation_source(name)
            .filter(|s| s.kind == NavigationSourceKind::EntitySet)
    }

    /// Target of a navigation property binding of the source.
    #[must_use]
    pub fn navigation_target(&self, source: &NavigationSource, path: &str) -> Option<&NavigationSource> {
        source
            .bindings
            .get(path)
            .and_then(|target| self.find_navigation_source(target))
    }

    /// Entity type of a navigation source.
    #[must_use]
    pub fn navigation_source_type(&self, source: &NavigationSource) -> Option<&StructuredType> {
        self.find_structured_type(&source.entity_type)
    }
}
