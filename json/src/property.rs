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

//! Single property payloads: `{"@odata.context":"...","value":...}`.

use crate::collection::read_collection;
use crate::collection::ItemKind;
use crate::lexer::JsonReader;
use crate::lexer::NodeKind;
use crate::primitive::infer_primitive;
use crate::primitive::read_enum;
use crate::primitive::read_primitive;
use crate::reader::values::read_annotation_value;
use crate::reader::values::read_string;
use crate::reader::values::skip_annotation;
use crate::reader::values::AnnotationName;
use crate::reader::values::MemberName;
use crate::resolver::Shape;
use crate::resolver::TypeResolver;
use crate::resolver::ValueKind;
use crate::Error;
use odata_json_core::context_url::ContextUrl;
use odata_json_core::context_url::ContextUrlKind;
use odata_json_core::edm::TypeName;
use odata_json_core::item::InstanceAnnotation;
use odata_json_core::item::Property;
use odata_json_core::value::UntypedValue;
use odata_json_core::ControlAnnotation;
use odata_json_core::EdmModel;
use odata_json_core::ODataValue;
use odata_json_core::ReaderSettings;

const VALUE: &str = "value";

/// Read a top-level property payload. The property name is taken from
/// the context URL (`...#Customers(1)/Name`), `value` otherwise.
///
/// # Errors
///
/// Returns error if the payload is malformed, has no `value`, or the
/// value does not match the expected or annotated type.
pub fn read_property(
    input: &str,
    model: &EdmModel,
    settings: &ReaderSettings,
    expected_type: Option<&str>,
) -> Result<Property, Error> {
    let resolver = TypeResolver::new(model, settings);
    let mut lexer = JsonReader::new(input).with_max_depth(settings.max_nesting_depth);
    lexer.read()?;
    lexer.expect(NodeKind::StartObject)?;
    lexer.read()?;
    let mut type_name = expected_type.map(TypeName::from_payload).transpose()?;
    let mut name = VALUE.to_string();
    let mut annotations = Vec::new();
    let mut value = None;
    while lexer.node_kind() == NodeKind::Property {
        let member = lexer.take_property_name()?;
        match MemberName::classify(&member) {
            MemberName::Property(VALUE) if value.is_none() => {
                let shape = Shape::of(lexer.node());
                value = Some(read_value(&mut lexer, &resolver, type_name.as_ref(), &name, shape)?);
            }
            MemberName::Property(VALUE) => return Err(Error::DuplicateProperty(VALUE.into())),
            MemberName::PropertyAnnotation(VALUE, annotation) => skip_annotation(&mut lexer, annotation)?,
            MemberName::Scope(_) if value.is_some() => {
                return Err(Error::InstanceAnnotationAfterProperty(member.to_string()))
            }
            MemberName::Scope(annotation) => match AnnotationName::parse(annotation, settings.version)? {
                AnnotationName::Control(ControlAnnotation::Context) => {
                    let context = ContextUrl::parse(&read_string(&mut lexer, annotation)?);
                    match context.kind {
                        ContextUrlKind::Collection(element) if type_name.is_none() => {
                            type_name = Some(TypeName::from_payload(&format!("Collection({element})"))?);
                        }
                        ContextUrlKind::Other(fragment) => {
                            if let Some((_, last)) = fragment.rsplit_once('/') {
                                name = last.to_string();
                            }
                        }
                        _ => {}
                    }
                }
                AnnotationName::Control(ControlAnnotation::Type) => {
                    type_name = Some(TypeName::from_payload(&read_string(&mut lexer, annotation)?)?);
                }
                AnnotationName::Control(ControlAnnotation::MetadataEtag) | AnnotationName::OtherOData(_) => {
                    skip_annotation(&mut lexer, annotation)?;
                }
                AnnotationName::Control(_) => return Err(Error::UnexpectedAnnotation(annotation.into())),
                AnnotationName::Custom(term) if settings.include_annotation.matches(term) => {
                    let v = read_annotation_value(&mut lexer)?;
                    annotations.push(InstanceAnnotation::new(term, v));
                }
                AnnotationName::Custom(term) => skip_annotation(&mut lexer, term)?,
            },
            _ => return Err(Error::UnexpectedProperty(member.to_string())),
        }
    }
    lexer.expect(NodeKind::EndObject)?;
    lexer.read()?;
    lexer.expect(NodeKind::EndOfInput)?;
    let value = value.ok_or(Error::MissingValueProperty)?;
    Ok(Property {
        name,
        value,
        type_name: type_name.map(|t| t.to_string()),
        annotations,
    })
}

fn read_value(
    lexer: &mut JsonReader<'_>,
    resolver: &TypeResolver<'_>,
    type_name: Option<&TypeName>,
    name: &str,
    shape: Shape,
) -> Result<ODataValue, Error> {
    let Some(type_name) = type_name else {
        return Ok(match shape {
            Shape::Null | Shape::Scalar => infer_primitive(&lexer.take_scalar()?),
            Shape::Object | Shape::Array => ODataValue::Untyped(UntypedValue::new(lexer.skip_value()?)),
        });
    };
    let kind = resolver.kind_for_type_name(type_name, name, shape)?;
    if shape == Shape::Null {
        lexer.take_scalar()?;
        return Ok(ODataValue::Null);
    }
    let collection_type = Some(type_name.to_string());
    match kind {
        ValueKind::Primitive(k) => read_primitive(&lexer.take_scalar()?, k, name).map(Into::into),
        ValueKind::Enum(t) => read_enum(&lexer.take_scalar()?, t).map(ODataValue::Enum),
        ValueKind::PrimitiveCollection(k) => {
            read_collection(lexer, ItemKind::Primitive(k), name, collection_type).map(ODataValue::Collection)
        }
        ValueKind::EnumCollection(t) => {
            read_collection(lexer, ItemKind::Enum(t), name, collection_type).map(ODataValue::Collection)
        }
        ValueKind::Untyped | ValueKind::Raw | ValueKind::Dynamic => match shape {
            Shape::Scalar | Shape::Null => Ok(infer_primitive(&lexer.take_scalar()?)),
            Shape::Object | Shape::Array => Ok(ODataValue::Untyped(UntypedValue::new(lexer.skip_value()?))),
        },
        ValueKind::Resource(_) | ValueKind::ResourceSet(_) => {
            Err(Error::StructuredPropertyValue(type_name.to_string()))
        }
    }
}
