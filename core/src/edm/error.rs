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

use crate::edm::names::NameError;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;

/// Model building error kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Invalid identifier or type name.
    Name(NameError),
    /// Two schema types share one qualified name.
    DuplicateType(String),
    /// Two properties of a structured type share one name.
    DuplicateProperty(String),
    /// Two navigation sources share one name.
    DuplicateNavigationSource(String),
    /// Referenced type was not found.
    TypeNotFound(String),
    /// Referenced type is not an entity or complex type.
    NotAStructuredType(String),
    /// Referenced type is not an entity type.
    NotAnEntityType(String),
    /// Base type has a different kind (entity vs complex).
    BaseTypeKindMismatch(String),
    /// Type inherits from itself.
    InheritanceCycle(String),
    /// Key property is not declared.
    KeyPropertyNotFound(String),
    /// Underlying type of an enum or type definition is not allowed.
    InvalidUnderlyingType(String),
    /// Bound operation without a binding parameter.
    NoBindingParameter,
    /// Navigation binding target was not found.
    NavigationSourceNotFound(String),
    /// Navigation binding path is not a navigation property.
    NavigationPropertyNotFound(String),
    /// Error while building a type.
    Type(String, Box<Error>),
    /// Error while building a property.
    Property(String, Box<Error>),
    /// Error while building an operation.
    Operation(String, Box<Error>),
    /// Error while building an operation parameter.
    Parameter(String, Box<Error>),
    /// Error while building an entity set or singleton.
    NavigationSource(String, Box<Error>),
    /// Several independent errors.
    Multiple(Vec<Error>),
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Name(err) => err.fmt(f),
            Self::DuplicateType(v) => write!(f, "duplicate type: {v}"),
            Self::DuplicateProperty(v) => write!(f, "duplicate property: {v}"),
            Self::DuplicateNavigationSource(v) => write!(f, "duplicate navigation source: {v}"),
            Self::TypeNotFound(v) => write!(f, "type not found: {v}"),
            Self::NotAStructuredType(v) => write!(f, "not a structured type: {v}"),
            Self::NotAnEntityType(v) => write!(f, "not an entity type: {v}"),
            Self::BaseTypeKindMismatch(v) => {
                write!(f, "base type is of a different kind: {v}")
            }
            Self::InheritanceCycle(v) => write!(f, "inheritance cycle through {v}"),
            Self::KeyPropertyNotFound(v) => write!(f, "key property not found: {v}"),
            Self::InvalidUnderlyingType(v) => write!(f, "invalid underlying type: {v}"),
            Self::NoBindingParameter => write!(f, "missing binding parameter for bound operation"),
            Self::NavigationSourceNotFound(v) => write!(f, "navigation source not found: {v}"),
            Self::NavigationPropertyNotFound(v) => {
                write!(f, "navigation property not found: {v}")
            }
            Self::Type(name, err) => write!(f, "while building type: {name}\n{err}"),
            Self::Property(name, err) => write!(f, "while building property: {name}\n{err}"),
            Self::Operation(name, err) => write!(f, "while building operation: {name}\n{err}"),
            Self::Parameter(name, err) => write!(f, "while building parameter: {name}\n{err}"),
            Self::NavigationSource(name, err) => {
                write!(f, "while building navigation source: {name}\n{err}")
            }
            Self::Multiple(errs) => {
                for (no, err) in errs.iter().enumerate() {
                    if no > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "#{}: {err}", no + 1)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for Error {}

impl From<NameError> for Error {
    fn from(err: NameError) -> Self {
        Self::Name(err)
    }
}
