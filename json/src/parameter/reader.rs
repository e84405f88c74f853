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

//! Pull reader of operation parameter payloads.

use super::find_operation;
use super::operation_name;
use crate::collection::read_item;
use crate::collection::CollectionReader;
use crate::collection::ItemKind;
use crate::collector::PropertyAndAnnotationCollector;
use crate::lexer::JsonNode;
use crate::lexer::JsonReader;
use crate::lexer::NodeKind;
use crate::reader::resource::PayloadKind;
use crate::reader::values::read_string;
use crate::reader::values::skip_annotation;
use crate::reader::values::AnnotationName;
use crate::reader::values::MemberName;
use crate::reader::ResourceReader;
use crate::resolver::ResourceType;
use crate::resolver::Shape;
use crate::resolver::TypeResolver;
use crate::Error;
use odata_json_core::edm::Operation;
use odata_json_core::edm::PrimitiveKind;
use odata_json_core::edm::TypeKind;
use odata_json_core::edm::TypeRef;
use odata_json_core::value::UntypedValue;
use odata_json_core::ControlAnnotation;
use odata_json_core::EdmModel;
use odata_json_core::ODataValue;
use odata_json_core::ReaderSettings;
use std::fmt::Debug;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use tracing::debug;
use tracing::trace;

/// State of a [`ParameterReader`]: kind of the last parameter returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterReaderState {
    Start,
    Value,
    Collection,
    Resource,
    ResourceSet,
    Completed,
}

/// Value of one parameter. Collections and structured values come with a
/// reader over their source text.
pub enum ParameterValue<'a> {
    Value(ODataValue),
    Collection(CollectionReader<'a>),
    Resource(ResourceReader<'a>),
    ResourceSet(ResourceReader<'a>),
}

impl Debug for ParameterValue<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Self::Collection(_) => f.write_str("Collection(..)"),
            Self::Resource(_) => f.write_str("Resource(..)"),
            Self::ResourceSet(_) => f.write_str("ResourceSet(..)"),
        }
    }
}

#[derive(Debug)]
pub struct Parameter<'a> {
    pub name: String,
    pub value: ParameterValue<'a>,
}

/// Reader of an operation parameter payload, one parameter at a time.
///
/// Readers of collection and structured parameters work on a copy of the
/// parameter's source span, so the parameter reader moves past the value
/// whether or not the caller drains them.
pub struct ParameterReader<'a> {
    lexer: JsonReader<'a>,
    model: &'a EdmModel,
    settings: &'a ReaderSettings,
    operation: &'a Operation,
    collector: PropertyAndAnnotationCollector,
    state: ParameterReaderState,
    failed: bool,
}

impl<'a> ParameterReader<'a> {
    /// Reader of the parameters of `operation` (qualified name). An empty
    /// payload has no parameters.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownOperation`] if the model has no such
    /// operation.
    pub fn new(
        input: &'a str,
        model: &'a EdmModel,
        settings: &'a ReaderSettings,
        operation: &str,
    ) -> Result<Self, Error> {
        let operation = find_operation(model, operation)?;
        let input = if input.trim().is_empty() { "{}" } else { input };
        Ok(Self {
            lexer: JsonReader::new(input).with_max_depth(settings.max_nesting_depth),
            model,
            settings,
            operation,
            collector: PropertyAndAnnotationCollector::new(),
            state: ParameterReaderState::Start,
            failed: false,
        })
    }

    #[must_use]
    pub const fn state(&self) -> ParameterReaderState {
        self.state
    }

    fn read_next(&mut self) -> Result<Option<Parameter<'a>>, Error> {
        if self.state == ParameterReaderState::Start {
            self.lexer.read()?;
            self.lexer.expect(NodeKind::StartObject)?;
            self.lexer.read()?;
        }
        loop {
            if let JsonNode::EndObject = self.lexer.node() {
                self.lexer.read()?;
                self.lexer.expect(NodeKind::EndOfInput)?;
                self.complete()?;
                return Ok(None);
            }
            let name = self.lexer.take_property_name()?.into_owned();
            match MemberName::classify(&name) {
                MemberName::Scope(annotation) => self.scope_annotation(annotation)?,
                MemberName::MetadataReference(v) => {
                    return Err(Error::MetadataReferenceInParameterPayload(v.into()));
                }
                MemberName::PropertyAnnotation(parameter, annotation) => {
                    self.parameter_annotation(parameter, annotation)?;
                }
                MemberName::Property(parameter) => return self.read_parameter(parameter).map(Some),
            }
        }
    }

    /// Custom annotations of the payload are skipped; OData ones have no
    /// meaning here.
    fn scope_annotation(&mut self, annotation: &str) -> Result<(), Error> {
        match AnnotationName::parse(annotation, self.settings.version)? {
            AnnotationName::Custom(term) => {
                trace!(annotation = term, "parameter payload annotation skipped");
                skip_annotation(&mut self.lexer, term)
            }
            AnnotationName::Control(_) | AnnotationName::OtherOData(_) => {
                Err(Error::InstanceAnnotationInParameterPayload(annotation.into()))
            }
        }
    }

    fn parameter_annotation(&mut self, parameter: &str, annotation: &str) -> Result<(), Error> {
        match AnnotationName::parse(annotation, self.settings.version)? {
            AnnotationName::Control(ControlAnnotation::Type) => {
                let type_name = read_string(&mut self.lexer, annotation)?;
                self.collector
                    .annotations_mut(parameter, annotation, true)?
                    .type_name = Some(type_name);
                Ok(())
            }
            AnnotationName::Custom(term) => {
                self.collector.annotations_mut(parameter, annotation, false)?;
                trace!(parameter, annotation = term, "parameter annotation skipped");
                skip_annotation(&mut self.lexer, term)
            }
            AnnotationName::Control(_) | AnnotationName::OtherOData(_) => Err(
                Error::InstanceAnnotationInParameterPayload(format!("{parameter}@{annotation}")),
            ),
        }
    }

    fn read_parameter(&mut self, name: &str) -> Result<Parameter<'a>, Error> {
        let operation = self.operation;
        let parameter = operation.parameter(name).ok_or_else(|| Error::UnknownParameter {
            operation: operation_name(operation),
            parameter: name.into(),
        })?;
        let annotations = self.collector.mark_property(name).map_err(|err| match err {
            Error::DuplicateProperty(_) => Error::DuplicateParameter {
                operation: operation_name(operation),
                parameter: name.into(),
            },
            other => other,
        })?;
        let type_ref = &parameter.type_ref;
        TypeResolver::new(self.model, self.settings).check_declared_type(
            name,
            type_ref,
            annotations.type_name.as_deref(),
        )?;
        let shape = Shape::of(self.lexer.node());
        if shape == Shape::Null {
            if !type_ref.nullable {
                return Err(Error::NullValueForNonNullable(name.into()));
            }
            self.lexer.read()?;
            return self.yield_parameter(name, ParameterValue::Value(ODataValue::Null));
        }
        let value = self.read_value(name, type_ref, shape)?;
        self.yield_parameter(name, value)
    }

    fn read_value(&mut self, name: &str, type_ref: &'a TypeRef, shape: Shape) -> Result<ParameterValue<'a>, Error> {
        let unsupported = || Error::UnsupportedParameterType {
            operation: operation_name(self.operation),
            parameter: name.into(),
            type_name: type_ref.type_name().to_string(),
        };
        let kind = match &type_ref.element {
            TypeKind::Primitive(PrimitiveKind::Stream) => return Err(unsupported()),
            TypeKind::Primitive(k) | TypeKind::Definition(_, k) => ItemKind::Primitive(*k),
            TypeKind::Enum(qname) => ItemKind::Enum(
                self.model
                    .find_enum_type(qname)
                    .ok_or_else(|| Error::UnknownTypeName(qname.to_string()))?,
            ),
            TypeKind::Untyped => ItemKind::Dynamic,
            TypeKind::Structured(qname) => {
                let ty = self
                    .model
                    .find_structured_type(qname)
                    .ok_or_else(|| Error::UnknownTypeName(qname.to_string()))?;
                self.check_shape(name, type_ref, shape)?;
                let span = self.lexer.skip_value()?;
                let (kind, set) = if type_ref.collection {
                    (PayloadKind::ResourceSet, true)
                } else {
                    (PayloadKind::Resource, false)
                };
                let reader = ResourceReader::bare(span, self.model, self.settings, kind, ResourceType::model(ty));
                return Ok(if set {
                    ParameterValue::ResourceSet(reader)
                } else {
                    ParameterValue::Resource(reader)
                });
            }
        };
        if type_ref.element == TypeKind::Untyped && !type_ref.collection {
            return Ok(ParameterValue::Value(match shape {
                Shape::Object | Shape::Array => ODataValue::Untyped(UntypedValue::new(self.lexer.skip_value()?)),
                Shape::Scalar | Shape::Null => read_item(&mut self.lexer, kind, name)?,
            }));
        }
        self.check_shape(name, type_ref, shape)?;
        if type_ref.collection {
            let span = self.lexer.skip_value()?;
            let type_name = Some(type_ref.type_name().to_string());
            return Ok(ParameterValue::Collection(CollectionReader::bare(
                span,
                self.model,
                self.settings,
                kind,
                type_name,
                name,
            )));
        }
        read_item(&mut self.lexer, kind, name).map(ParameterValue::Value)
    }

    fn check_shape(&self, name: &str, type_ref: &TypeRef, shape: Shape) -> Result<(), Error> {
        match (type_ref.collection, shape) {
            (true, Shape::Scalar | Shape::Object) => Err(Error::CollectionTypeMismatch {
                property: name.into(),
                type_name: type_ref.type_name().to_string(),
            }),
            (false, Shape::Array) => Err(Error::SingletonTypeMismatch {
                property: name.into(),
                type_name: type_ref.type_name().to_string(),
            }),
            (false, Shape::Scalar) if matches!(type_ref.element, TypeKind::Structured(_)) => {
                Err(self.lexer.unexpected("object"))
            }
            _ => Ok(()),
        }
    }

    fn yield_parameter(&mut self, name: &str, value: ParameterValue<'a>) -> Result<Parameter<'a>, Error> {
        self.state = match value {
            ParameterValue::Value(_) => ParameterReaderState::Value,
            ParameterValue::Collection(_) => ParameterReaderState::Collection,
            ParameterValue::Resource(_) => ParameterReaderState::Resource,
            ParameterValue::ResourceSet(_) => ParameterReaderState::ResourceSet,
        };
        debug!(parameter = name, state = ?self.state, "parameter read");
        Ok(Parameter {
            name: name.into(),
            value,
        })
    }

    /// End of payload: annotations must belong to parameters and required
    /// parameters must be present.
    fn complete(&mut self) -> Result<(), Error> {
        let read = self
            .collector
            .read_properties()
            .map(String::from)
            .collect::<Vec<_>>();
        if let Some((orphan, _)) = self.collector.take_annotation_only().into_iter().next() {
            return Err(Error::OrphanedPropertyAnnotation(orphan));
        }
        let operation = self.operation;
        if let Some(missing) = operation
            .required_parameters()
            .find(|p| !read.iter().any(|r| r == p.name.inner()))
        {
            return Err(Error::MissingParameter {
                operation: operation_name(operation),
                parameter: missing.name.inner().to_string(),
            });
        }
        self.state = ParameterReaderState::Completed;
        debug!(operation = %operation.name, "parameter payload completed");
        Ok(())
    }
}

impl<'a> Iterator for ParameterReader<'a> {
    type Item = Result<Parameter<'a>, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.state == ParameterReaderState::Completed {
            return None;
        }
        match self.read_next() {
            Ok(v) => v.map(Ok),
            Err(err) => {
                self.failed = true;
                Some(Err(err))
            }
        }
    }
}
