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

//! Errors of readers and writers.
//!
//! Every error is fatal for the payload being processed: readers stop
//! after returning the first error and writers should be discarded.

use crate::lexer::NodeKind;
use odata_json_core::edm::NameError;
use odata_json_core::media_type::MediaTypeError;
use std::error::Error as StdError;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use std::io::Error as IoError;

/// Broad classification of errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Malformed JSON or payload structure.
    Structural,
    /// Payload does not match the model.
    Schema,
    /// Annotations or properties out of order, duplicated, or writer
    /// calls in an invalid sequence.
    Ordering,
    /// Required information is missing.
    MissingData,
    /// I/O, encoding and cancellation.
    Transport,
}

#[derive(Debug)]
pub enum Error {
    // Structural
    /// Malformed JSON text.
    Syntax { position: usize, message: String },
    /// JSON node of an unexpected kind.
    UnexpectedNode {
        position: usize,
        expected: &'static str,
        found: NodeKind,
    },
    /// JSON nesting deeper than allowed.
    MaxDepthExceeded(usize),
    /// `value` of a resource set payload is not an array.
    ResourceSetValueNotArray,
    /// Value cannot be read as the primitive type.
    InvalidPrimitiveValue {
        property: String,
        type_name: String,
        value: String,
    },
    /// Value is not a member of the enum type.
    InvalidEnumValue { type_name: String, value: String },
    /// Control annotation has a value of the wrong JSON type.
    InvalidAnnotationValue {
        annotation: String,
        expected: &'static str,
    },
    /// Property where only annotations are allowed.
    UnexpectedProperty(String),
    /// `null` in a resource set.
    NullResourceInSet,
    /// Raw untyped value written by a caller is not a JSON value.
    InvalidRawValue(String),

    // Schema
    /// Property not declared on a non-open type.
    UndeclaredProperty { type_name: String, property: String },
    /// Collection type for a JSON object or a collection-valued
    /// property.
    CollectionTypeMismatch { property: String, type_name: String },
    /// Single-valued type for a JSON array.
    SingletonTypeMismatch { property: String, type_name: String },
    /// Payload type conflicts with the declared type.
    TypeConflict {
        property: String,
        expected: String,
        actual: String,
    },
    /// Resource type is not the expected type nor derived from it.
    IncompatibleResourceType { expected: String, actual: String },
    /// Payload type is unknown to the model.
    UnknownTypeName(String),
    /// Payload type name is malformed.
    InvalidTypeName(NameError),
    /// Type of a resource is not a structured type.
    NotAStructuredType(String),
    /// Parameter type cannot be read from a payload.
    UnsupportedParameterType {
        operation: String,
        parameter: String,
        type_name: String,
    },
    /// `null` for a non-nullable property or parameter.
    NullValueForNonNullable(String),
    /// Operation is unknown to the model.
    UnknownOperation(String),
    /// Navigation source is unknown to the model.
    UnknownNavigationSource(String),
    /// Structured values are read with a resource reader.
    StructuredPropertyValue(String),

    // Ordering and protocol
    /// `Prop@odata.type` after `Prop`.
    TypeAnnotationAfterProperty(String),
    /// `Prop@annotation` after `Prop`.
    PropertyAnnotationAfterProperty { property: String, annotation: String },
    /// Resource control annotation after a property.
    InstanceAnnotationAfterProperty(String),
    DuplicateAnnotation {
        property: Option<String>,
        annotation: String,
    },
    DuplicateProperty(String),
    /// Control annotation not allowed in its position.
    UnexpectedAnnotation(String),
    /// Control annotation not allowed on a property.
    UnexpectedPropertyAnnotation { property: String, annotation: String },
    /// Annotation name is neither a control annotation nor a qualified
    /// term.
    InvalidAnnotationName(String),
    /// Deleted resource content not allowed before 4.01.
    DeletedResourceContentNotAllowed(String),
    /// Operation in an array of operations without `target`.
    OperationMissingTarget(String),
    /// `title` or `target` repeated in an operation object.
    DuplicateOperationProperty { operation: String, property: String },
    /// Operation value is not an object or an array of objects.
    InvalidOperationValue(String),
    MetadataReferenceInParameterPayload(String),
    InstanceAnnotationInParameterPayload(String),
    /// Property annotation without the property.
    OrphanedPropertyAnnotation(String),
    UnknownParameter { operation: String, parameter: String },
    DuplicateParameter { operation: String, parameter: String },
    /// `nextLink` and `deltaLink` on one resource set.
    NextLinkWithDeltaLink,
    /// Writer call not allowed in the current scope.
    InvalidWriterTransition {
        scope: &'static str,
        attempted: &'static str,
    },
    /// Content not allowed in request payloads.
    RequestModeViolation(&'static str),
    /// Stream not closed before its scope.
    StreamNotClosed,
    /// Output taken before all scopes were closed.
    WriterNotCompleted,

    // Missing data
    MissingParameter { operation: String, parameter: String },
    /// Resource set payload without `value`.
    MissingValueProperty,
    /// Delta link without `source`, `relationship` or `target`.
    MissingDeltaLinkProperty(&'static str),
    /// Deleted entity without `id`.
    MissingDeletedResourceId,
    /// Writing delta links needs a navigation source.
    MissingNavigationSource,

    // Transport
    Io(IoError),
    InvalidUtf8,
    UnsupportedCharset(String),
    MediaType(MediaTypeError),
    Cancelled,
    Json(serde_json::Error),
    Url(url::ParseError),
}

impl Error {
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Syntax { .. }
            | Self::UnexpectedNode { .. }
            | Self::MaxDepthExceeded(_)
            | Self::ResourceSetValueNotArray
            | Self::InvalidPrimitiveValue { .. }
            | Self::InvalidEnumValue { .. }
            | Self::InvalidAnnotationValue { .. }
            | Self::UnexpectedProperty(_)
            | Self::NullResourceInSet
            | Self::InvalidRawValue(_) => ErrorCategory::Structural,
            Self::UndeclaredProperty { .. }
            | Self::CollectionTypeMismatch { .. }
            | Self::SingletonTypeMismatch { .. }
            | Self::TypeConflict { .. }
            | Self::IncompatibleResourceType { .. }
            | Self::UnknownTypeName(_)
            | Self::InvalidTypeName(_)
            | Self::NotAStructuredType(_)
            | Self::UnsupportedParameterType { .. }
            | Self::NullValueForNonNullable(_)
            | Self::UnknownOperation(_)
            | Self::UnknownNavigationSource(_)
            | Self::StructuredPropertyValue(_) => ErrorCategory::Schema,
            Self::TypeAnnotationAfterProperty(_)
            | Self::PropertyAnnotationAfterProperty { .. }
            | Self::InstanceAnnotationAfterProperty(_)
            | Self::DuplicateAnnotation { .. }
            | Self::DuplicateProperty(_)
            | Self::UnexpectedAnnotation(_)
            | Self::UnexpectedPropertyAnnotation { .. }
            | Self::InvalidAnnotationName(_)
            | Self::DeletedResourceContentNotAllowed(_)
            | Self::OperationMissingTarget(_)
            | Self::DuplicateOperationProperty { .. }
            | Self::InvalidOperationValue(_)
            | Self::MetadataReferenceInParameterPayload(_)
            | Self::InstanceAnnotationInParameterPayload(_)
            | Self::OrphanedPropertyAnnotation(_)
            | Self::UnknownParameter { .. }
            | Self::DuplicateParameter { .. }
            | Self::NextLinkWithDeltaLink
            | Self::InvalidWriterTransition { .. }
            | Self::RequestModeViolation(_)
            | Self::StreamNotClosed
            | Self::WriterNotCompleted => ErrorCategory::Ordering,
            Self::MissingParameter { .. }
            | Self::MissingValueProperty
            | Self::MissingDeltaLinkProperty(_)
            | Self::MissingDeletedResourceId
            | Self::MissingNavigationSource => ErrorCategory::MissingData,
            Self::Io(_)
            | Self::InvalidUtf8
            | Self::UnsupportedCharset(_)
            | Self::MediaType(_)
            | Self::Cancelled
            | Self::Json(_)
            | Self::Url(_) => ErrorCategory::Transport,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Syntax { position, message } => {
                write!(f, "invalid JSON at {position}: {message}")
            }
            Self::UnexpectedNode {
                position,
                expected,
                found,
            } => write!(f, "expected {expected} at {position}, found {found}"),
            Self::MaxDepthExceeded(depth) => write!(f, "nesting depth exceeds {depth}"),
            Self::ResourceSetValueNotArray => write!(f, "resource set value is not an array"),
            Self::InvalidPrimitiveValue {
                property,
                type_name,
                value,
            } => write!(f, "invalid {type_name} value of {property}: {value}"),
            Self::InvalidEnumValue { type_name, value } => {
                write!(f, "invalid {type_name} value: {value}")
            }
            Self::InvalidAnnotationValue {
                annotation,
                expected,
            } => write!(f, "annotation {annotation} must be {expected}"),
            Self::UnexpectedProperty(v) => write!(f, "unexpected property: {v}"),
            Self::NullResourceInSet => write!(f, "null resource in resource set"),
            Self::InvalidRawValue(v) => write!(f, "raw value is not a JSON value: {v}"),
            Self::UndeclaredProperty {
                type_name,
                property,
            } => write!(f, "property {property} is not declared on non-open type {type_name}"),
            Self::CollectionTypeMismatch {
                property,
                type_name,
            } => write!(f, "collection type {type_name} of {property} does not match a single value"),
            Self::SingletonTypeMismatch {
                property,
                type_name,
            } => write!(f, "single type {type_name} of {property} does not match an array"),
            Self::TypeConflict {
                property,
                expected,
                actual,
            } => write!(f, "type {actual} of {property} conflicts with declared type {expected}"),
            Self::IncompatibleResourceType { expected, actual } => {
                write!(f, "resource type {actual} is not derived from {expected}")
            }
            Self::UnknownTypeName(v) => write!(f, "unknown type: {v}"),
            Self::InvalidTypeName(err) => err.fmt(f),
            Self::NotAStructuredType(v) => write!(f, "not a structured type: {v}"),
            Self::UnsupportedParameterType {
                operation,
                parameter,
                type_name,
            } => write!(f, "parameter {parameter} of {operation} has unsupported type {type_name}"),
            Self::NullValueForNonNullable(v) => write!(f, "null value for non-nullable {v}"),
            Self::UnknownOperation(v) => write!(f, "unknown operation: {v}"),
            Self::UnknownNavigationSource(v) => write!(f, "unknown navigation source: {v}"),
            Self::StructuredPropertyValue(v) => {
                write!(f, "value of structured type {v} must be read as a resource")
            }
            Self::TypeAnnotationAfterProperty(v) => {
                write!(f, "type annotation of {v} appears after its value")
            }
            Self::PropertyAnnotationAfterProperty {
                property,
                annotation,
            } => write!(f, "annotation {annotation} of {property} appears after its value"),
            Self::InstanceAnnotationAfterProperty(v) => {
                write!(f, "annotation {v} appears after properties")
            }
            Self::DuplicateAnnotation {
                property: Some(property),
                annotation,
            } => write!(f, "duplicate annotation {annotation} of {property}"),
            Self::DuplicateAnnotation {
                property: None,
                annotation,
            } => write!(f, "duplicate annotation {annotation}"),
            Self::DuplicateProperty(v) => write!(f, "duplicate property: {v}"),
            Self::UnexpectedAnnotation(v) => write!(f, "unexpected annotation: {v}"),
            Self::UnexpectedPropertyAnnotation {
                property,
                annotation,
            } => write!(f, "unexpected annotation {annotation} of {property}"),
            Self::InvalidAnnotationName(v) => write!(f, "invalid annotation name: {v}"),
            Self::DeletedResourceContentNotAllowed(v) => {
                write!(f, "deleted resource cannot contain {v}")
            }
            Self::OperationMissingTarget(v) => write!(f, "operation {v} has no target"),
            Self::DuplicateOperationProperty {
                operation,
                property,
            } => write!(f, "duplicate {property} of operation {operation}"),
            Self::InvalidOperationValue(v) => write!(f, "invalid value of operation {v}"),
            Self::MetadataReferenceInParameterPayload(v) => {
                write!(f, "metadata reference {v} in parameter payload")
            }
            Self::InstanceAnnotationInParameterPayload(v) => {
                write!(f, "annotation {v} in parameter payload")
            }
            Self::OrphanedPropertyAnnotation(v) => {
                write!(f, "annotations of {v} without a value")
            }
            Self::UnknownParameter {
                operation,
                parameter,
            } => write!(f, "unknown parameter {parameter} of {operation}"),
            Self::DuplicateParameter {
                operation,
                parameter,
            } => write!(f, "duplicate parameter {parameter} of {operation}"),
            Self::NextLinkWithDeltaLink => {
                write!(f, "resource set has both next link and delta link")
            }
            Self::InvalidWriterTransition { scope, attempted } => {
                write!(f, "cannot write {attempted} in {scope}")
            }
            Self::RequestModeViolation(v) => write!(f, "{v} not allowed in request payload"),
            Self::StreamNotClosed => write!(f, "stream is not closed"),
            Self::WriterNotCompleted => write!(f, "payload is not complete"),
            Self::MissingParameter {
                operation,
                parameter,
            } => write!(f, "missing parameter {parameter} of {operation}"),
            Self::MissingValueProperty => write!(f, "missing value property"),
            Self::MissingDeltaLinkProperty(v) => write!(f, "missing {v} of delta link"),
            Self::MissingDeletedResourceId => write!(f, "missing id of deleted resource"),
            Self::MissingNavigationSource => write!(f, "navigation source is required"),
            Self::Io(err) => write!(f, "i/o error: {err}"),
            Self::InvalidUtf8 => write!(f, "payload is not valid UTF-8"),
            Self::UnsupportedCharset(v) => write!(f, "unsupported charset: {v}"),
            Self::MediaType(err) => err.fmt(f),
            Self::Cancelled => write!(f, "operation cancelled"),
            Self::Json(err) => write!(f, "JSON error: {err}"),
            Self::Url(err) => write!(f, "invalid URL: {err}"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Json(err) => Some(err),
            Self::Url(err) => Some(err),
            Self::MediaType(err) => Some(err),
            Self::InvalidTypeName(err) => Some(err),
            _ => None,
        }
    }
}

impl From<IoError> for Error {
    fn from(err: IoError) -> Self {
        Self::Io(err)
    }
}

impl From<NameError> for Error {
    fn from(err: NameError) -> Self {
        Self::InvalidTypeName(err)
    }
}

impl From<MediaTypeError> for Error {
    fn from(err: MediaTypeError) -> Self {
        Self::MediaType(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::Url(err)
    }
}
