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

//! Identifiers and type names
//!
//! Follows the CSDL attribute value rules for `Namespace`,
//! `SimpleIdentifier`, `QualifiedName` and `TypeName`. Payload type names
//! (values of `@odata.type`) use the same grammar prefixed with `#`, and
//! may abbreviate primitive types (`#Int64` means `Edm.Int64`).

use serde::de::Error as DeError;
use serde::de::Visitor;
use serde::Deserialize;
use serde::Deserializer;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use std::str::FromStr;

const EDM_NAMESPACE: &str = "Edm";
const COLLECTION_PREFIX: &str = "Collection(";
const COLLECTION_SUFFIX: &str = ")";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameError {
    InvalidSimpleIdentifier(String),
    InvalidQualifiedName(String),
    InvalidTypeName(String),
}

impl Display for NameError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::InvalidSimpleIdentifier(id) => write!(f, "invalid simple identifier {id}"),
            Self::InvalidQualifiedName(id) => write!(f, "invalid qualified name {id}"),
            Self::InvalidTypeName(id) => write!(f, "invalid type name {id}"),
        }
    }
}

impl std::error::Error for NameError {}

/// `Namespace`: dot separated simple identifiers.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Namespace {
    pub ids: Vec<SimpleIdentifier>,
}

impl Namespace {
    #[must_use]
    pub fn is_edm(&self) -> bool {
        self.ids.len() == 1 && self.ids[0].as_str() == EDM_NAMESPACE
    }
}

impl FromStr for Namespace {
    type Err = NameError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self {
            ids: s
                .split('.')
                .map(SimpleIdentifier::from_str)
                .collect::<Result<Vec<_>, _>>()?,
        })
    }
}

impl Display for Namespace {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let mut iter = self.ids.iter();
        if let Some(v) = iter.next() {
            v.fmt(f)?;
        }
        for v in iter {
            ".".fmt(f)?;
            v.fmt(f)?;
        }
        Ok(())
    }
}

/// `SimpleIdentifier`: a letter or underscore followed by letters,
/// underscores or digits.
#[derive(Clone, Debug, PartialEq, Eq, Ord, PartialOrd, Hash)]
pub struct SimpleIdentifier(String);

impl SimpleIdentifier {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for SimpleIdentifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        self.0.fmt(f)
    }
}

impl AsRef<str> for SimpleIdentifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for SimpleIdentifier {
    type Err = NameError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        // Max length (128) is not checked.
        let valid_first = chars
            .next()
            .is_some_and(|first| first.is_alphabetic() || first == '_');
        if !valid_first || chars.any(|c| !c.is_alphanumeric() && c != '_') {
            Err(NameError::InvalidSimpleIdentifier(s.into()))
        } else {
            Ok(Self(s.into()))
        }
    }
}

/// `QualifiedName`: namespace and simple identifier. The namespace is
/// never empty.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct QualifiedName {
    pub namespace: Namespace,
    pub name: SimpleIdentifier,
}

impl QualifiedName {
    /// Qualified name in the `Edm` namespace.
    ///
    /// # Errors
    ///
    /// Returns error if `name` is not a simple identifier.
    pub fn edm(name: &str) -> Result<Self, NameError> {
        let name: SimpleIdentifier = name.parse()?;
        Ok(Self::builtin(name.as_str()))
    }

    /// Name of a built-in type. `name` must be a simple identifier.
    pub(crate) fn builtin(name: &str) -> Self {
        Self {
            namespace: Namespace {
                ids: vec![SimpleIdentifier(EDM_NAMESPACE.into())],
            },
            name: SimpleIdentifier(name.into()),
        }
    }

    #[must_use]
    pub fn is_edm(&self) -> bool {
        self.namespace.is_edm()
    }
}

impl FromStr for QualifiedName {
    type Err = NameError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut ids = s
            .split('.')
            .map(SimpleIdentifier::from_str)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| NameError::InvalidQualifiedName(s.into()))?;
        let name = ids
            .pop()
            .ok_or_else(|| NameError::InvalidQualifiedName(s.into()))?;
        if ids.is_empty() {
            return Err(NameError::InvalidQualifiedName(s.into()));
        }
        Ok(Self {
            namespace: Namespace { ids },
            name,
        })
    }
}

impl Display for QualifiedName {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}.{}", self.namespace, self.name)
    }
}

impl<'de> Deserialize<'de> for QualifiedName {
    fn deserialize<D: Deserializer<'de>>(de: D) -> Result<Self, D::Error> {
        struct QnVisitor {}
        impl Visitor<'_> for QnVisitor {
            type Value = QualifiedName;

            fn expecting(&self, formatter: &mut Formatter) -> FmtResult {
                formatter.write_str("QualifiedName string")
            }
            fn visit_str<E: DeError>(self, value: &str) -> Result<Self::Value, E> {
                value.parse().map_err(DeError::custom)
            }
        }

        de.deserialize_string(QnVisitor {})
    }
}

/// `TypeName`: a single type or a collection of it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeName {
    One(QualifiedName),
    CollectionOf(QualifiedName),
}

impl TypeName {
    /// Element type of the type name.
    #[must_use]
    pub const fn element(&self) -> &QualifiedName {
        match self {
            Self::One(v) | Self::CollectionOf(v) => v,
        }
    }

    #[must_use]
    pub const fn is_collection(&self) -> bool {
        matches!(self, Self::CollectionOf(_))
    }

    /// Parse the value of an `@odata.type` annotation.
    ///
    /// The leading `#` is optional. Names without a namespace are
    /// primitive type names in the `Edm` namespace.
    ///
    /// # Errors
    ///
    /// Returns error if the value is not a valid type name.
    pub fn from_payload(s: &str) -> Result<Self, NameError> {
        let s = s.strip_prefix('#').unwrap_or(s);
        let element = |v: &str| {
            if v.contains('.') {
                v.parse()
            } else {
                QualifiedName::edm(v).map_err(|_| NameError::InvalidTypeName(s.into()))
            }
        };
        match collection_element(s) {
            Some(v) => element(v).map(Self::CollectionOf),
            None => element(s).map(Self::One),
        }
    }

    /// Value of the `@odata.type` annotation for this type name. Primitive
    /// types use their short form.
    #[must_use]
    pub fn to_payload(&self) -> String {
        let element = |v: &QualifiedName| {
            if v.is_edm() {
                v.name.to_string()
            } else {
                v.to_string()
            }
        };
        match self {
            Self::One(v) => format!("#{}", element(v)),
            Self::CollectionOf(v) => format!("#Collection({})", element(v)),
        }
    }
}

fn collection_element(s: &str) -> Option<&str> {
    s.strip_prefix(COLLECTION_PREFIX)
        .and_then(|v| v.strip_suffix(COLLECTION_SUFFIX))
}

impl FromStr for TypeName {
    type Err = NameError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match collection_element(s) {
            Some(v) => Ok(Self::CollectionOf(v.parse()?)),
            None => Ok(Self::One(s.parse()?)),
        }
    }
}

impl Display for TypeName {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::One(v) => v.fmt(f),
            Self::CollectionOf(v) => write!(f, "{COLLECTION_PREFIX}{v}{COLLECTION_SUFFIX}"),
        }
    }
}

impl<'de> Deserialize<'de> for TypeName {
    fn deserialize<D: Deserializer<'de>>(de: D) -> Result<Self, D::Error> {
        struct TnVisitor {}
        impl Visitor<'_> for TnVisitor {
            type Value = TypeName;

            fn expecting(&self, formatter: &mut Formatter) -> FmtResult {
                formatter.write_str("type name string")
            }
            fn visit_str<E: DeError>(self, value: &str) -> Result<Self::Value, E> {
                value.parse().map_err(DeError::custom)
            }
        }

        de.deserialize_string(TnVisitor {})
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_identifiers() {
        assert!("Product".parse::<SimpleIdentifier>().is_ok());
        assert!("_hidden1".parse::<SimpleIdentifier>().is_ok());
        assert!("1st".parse::<SimpleIdentifier>().is_err());
        assert!("".parse::<SimpleIdentifier>().is_err());
        assert!("with-dash".parse::<SimpleIdentifier>().is_err());
    }

    #[test]
    fn qualified_name_requires_namespace() {
        let name: QualifiedName = "TestModel.Sub.Product".parse().unwrap();
        assert_eq!(name.namespace.to_string(), "TestModel.Sub");
        assert_eq!(name.name.as_str(), "Product");
        assert_eq!(name.to_string(), "TestModel.Sub.Product");
        assert!("Product".parse::<QualifiedName>().is_err());
        assert!("TestModel.".parse::<QualifiedName>().is_err());
    }

    #[test]
    fn collection_type_names() {
        let tn: TypeName = "Collection(TestModel.Address)".parse().unwrap();
        assert!(tn.is_collection());
        assert_eq!(tn.element().to_string(), "TestModel.Address");
        assert_eq!(tn.to_string(), "Collection(TestModel.Address)");
        assert!("Collection(Address)".parse::<TypeName>().is_err());
    }

    #[test]
    fn payload_type_names() {
        let tn = TypeName::from_payload("#TestModel.derivedAddress").unwrap();
        assert_eq!(tn, "TestModel.derivedAddress".parse().unwrap());

        let tn = TypeName::from_payload("#Int64").unwrap();
        assert!(tn.element().is_edm());
        assert_eq!(tn.to_string(), "Edm.Int64");
        assert_eq!(tn.to_payload(), "#Int64");

        let tn = TypeName::from_payload("#Collection(Edm.String)").unwrap();
        assert!(tn.is_collection());
        assert_eq!(tn.to_payload(), "#Collection(String)");

        assert!(TypeName::from_payload("#").is_err());
        assert!(TypeName::from_payload("#Collection(9x)").is_err());
    }

    #[test]
    fn deserialize_type_name() {
        let tn: TypeName = serde_json::from_str(r#""Collection(Edm.Guid)""#).unwrap();
        assert_eq!(tn, TypeName::CollectionOf(QualifiedName::edm("Guid").unwrap()));
    }
}
