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

//! Collections of primitive and enum values.
//!
//! [`CollectionReader`] reads top-level collection payloads
//! (`{"value":[...]}`) and bare arrays such as collection parameters,
//! one item at a time.

use crate::lexer::JsonNode;
use crate::lexer::JsonReader;
use crate::lexer::NodeKind;
use crate::primitive::infer_primitive;
use crate::primitive::read_enum;
use crate::primitive::read_primitive;
use crate::reader::values::read_annotation_value;
use crate::reader::values::read_count;
use crate::reader::values::read_string;
use crate::reader::values::skip_annotation;
use crate::reader::values::AnnotationName;
use crate::reader::values::MemberName;
use crate::Error;
use odata_json_core::context_url::ContextUrl;
use odata_json_core::context_url::ContextUrlKind;
use odata_json_core::edm::EnumType;
use odata_json_core::edm::PrimitiveKind;
use odata_json_core::edm::SchemaType;
use odata_json_core::edm::TypeName;
use odata_json_core::item::InstanceAnnotation;
use odata_json_core::value::CollectionValue;
use odata_json_core::value::UntypedValue;
use odata_json_core::ControlAnnotation;
use odata_json_core::EdmModel;
use odata_json_core::ODataValue;
use odata_json_core::ReaderSettings;
use tracing::debug;

/// How collection items are read.
#[derive(Debug, Clone, Copy)]
pub enum ItemKind<'m> {
    Primitive(PrimitiveKind),
    Enum(&'m EnumType),
    /// No type information: scalars are inferred, objects and arrays kept
    /// as raw JSON.
    Dynamic,
}

impl<'m> ItemKind<'m> {
    /// Item kind of the element of a type name. `None` for structured or
    /// unknown types.
    #[must_use]
    pub fn of(model: &'m EdmModel, type_name: &TypeName) -> Option<Self> {
        let element = type_name.element();
        if element.is_edm() {
            return PrimitiveKind::from_name(element.name.as_str()).map(Self::Primitive);
        }
        match model.find_type(element)? {
            SchemaType::Enum(t) => Some(Self::Enum(t)),
            SchemaType::Definition(t) => Some(Self::Primitive(t.underlying)),
            SchemaType::Structured(_) => None,
        }
    }
}

/// Read one collection item at the current node.
///
/// # Errors
///
/// Returns error if the item is not a valid value of the item kind.
pub fn read_item(lexer: &mut JsonReader<'_>, kind: ItemKind<'_>, name: &str) -> Result<ODataValue, Error> {
    match (lexer.node(), kind) {
        (JsonNode::Primitive(_), _) => {
            let scalar = lexer.take_scalar()?;
            if scalar.is_null() {
                return Ok(ODataValue::Null);
            }
            match kind {
                ItemKind::Primitive(k) => read_primitive(&scalar, k, name).map(Into::into),
                ItemKind::Enum(t) => read_enum(&scalar, t).map(ODataValue::Enum),
                ItemKind::Dynamic => Ok(infer_primitive(&scalar)),
            }
        }
        (JsonNode::StartObject | JsonNode::StartArray, ItemKind::Dynamic) => {
            Ok(ODataValue::Untyped(UntypedValue::new(lexer.skip_value()?)))
        }
        _ => Err(lexer.unexpected("primitive value")),
    }
}

/// Read a whole array at the current node.
///
/// # Errors
///
/// Returns error if the current node is not an array or an item is
/// invalid.
pub fn read_collection(
    lexer: &mut JsonReader<'_>,
    kind: ItemKind<'_>,
    name: &str,
    type_name: Option<String>,
) -> Result<CollectionValue, Error> {
    lexer.expect(NodeKind::StartArray)?;
    lexer.read()?;
    let mut items = Vec::new();
    while !matches!(lexer.node(), JsonNode::EndArray) {
        items.push(read_item(lexer, kind, name)?);
    }
    lexer.read()?;
    Ok(CollectionValue { type_name, items })
}

/// Control information of a collection payload.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CollectionStart {
    pub type_name: Option<String>,
    pub count: Option<i64>,
    pub next_link: Option<String>,
    pub annotations: Vec<InstanceAnnotation>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CollectionEvent {
    Start(CollectionStart),
    Item(ODataValue),
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Start,
    Items,
    Completed,
    Failed,
}

/// Lazy reader of a collection of primitive or enum values.
pub struct CollectionReader<'a> {
    lexer: JsonReader<'a>,
    model: &'a EdmModel,
    settings: &'a ReaderSettings,
    kind: ItemKind<'a>,
    type_name: Option<String>,
    name: String,
    wrapped: bool,
    state: State,
}

impl<'a> CollectionReader<'a> {
    /// Reader of a top-level collection payload with items of
    /// `item_type` (element type or `Collection(...)`). Without an item
    /// type the context URL is consulted, then items are inferred.
    ///
    /// # Errors
    ///
    /// Returns error if the item type is malformed or not a primitive,
    /// enum or type definition.
    pub fn new(
        input: &'a str,
        model: &'a EdmModel,
        settings: &'a ReaderSettings,
        item_type: Option<&str>,
    ) -> Result<Self, Error> {
        let (kind, type_name) = match item_type {
            Some(t) => {
                let (kind, type_name) = resolve_item_type(model, t)?;
                (kind, Some(type_name))
            }
            None => (ItemKind::Dynamic, None),
        };
        Ok(Self {
            lexer: JsonReader::new(input).with_max_depth(settings.max_nesting_depth),
            model,
            settings,
            kind,
            type_name,
            name: "value".into(),
            wrapped: true,
            state: State::Start,
        })
    }

    /// Reader of a bare array, e.g. the value of a collection parameter.
    pub(crate) fn bare(
        input: &'a str,
        model: &'a EdmModel,
        settings: &'a ReaderSettings,
        kind: ItemKind<'a>,
        type_name: Option<String>,
        name: &str,
    ) -> Self {
        Self {
            lexer: JsonReader::new(input).with_max_depth(settings.max_nesting_depth),
            model,
            settings,
            kind,
            type_name,
            name: name.into(),
            wrapped: false,
            state: State::Start,
        }
    }

    /// Collection type name, if known.
    #[must_use]
    pub fn type_name(&self) -> Option<&str> {
        self.type_name.as_deref()
    }

    /// Read all remaining items.
    ///
    /// # Errors
    ///
    /// Returns the first error of the payload.
    pub fn read_to_end(mut self) -> Result<CollectionValue, Error> {
        let mut items = Vec::new();
        for event in self.by_ref() {
            if let CollectionEvent::Item(v) = event? {
                items.push(v);
            }
        }
        // Known only once the header was read.
        Ok(CollectionValue {
            type_name: self.type_name,
            items,
        })
    }

    fn step(&mut self) -> Result<CollectionEvent, Error> {
        match self.state {
            State::Start => {
                self.lexer.read()?;
                let start = if self.wrapped {
                    self.read_header()?
                } else {
                    CollectionStart {
                        type_name: self.type_name.clone(),
                        ..CollectionStart::default()
                    }
                };
                self.lexer.expect(NodeKind::StartArray)?;
                self.lexer.read()?;
                self.state = State::Items;
                debug!(type_name = ?self.type_name, "collection started");
                Ok(CollectionEvent::Start(start))
            }
            State::Items if matches!(self.lexer.node(), JsonNode::EndArray) => {
                self.lexer.read()?;
                if self.wrapped {
                    self.read_trailer()?;
                }
                self.lexer.expect(NodeKind::EndOfInput)?;
                self.state = State::Completed;
                Ok(CollectionEvent::End)
            }
            State::Items => read_item(&mut self.lexer, self.kind, &self.name).map(CollectionEvent::Item),
            State::Completed | State::Failed => Err(Error::WriterNotCompleted),
        }
    }

    fn read_header(&mut self) -> Result<CollectionStart, Error> {
        self.lexer.expect(NodeKind::StartObject)?;
        self.lexer.read()?;
        let mut start = CollectionStart::default();
        loop {
            if matches!(self.lexer.node(), JsonNode::EndObject) {
                return Err(Error::MissingValueProperty);
            }
            let name = self.lexer.take_property_name()?;
            match MemberName::classify(&name) {
                MemberName::Property("value") => {
                    if !matches!(self.lexer.node(), JsonNode::StartArray) {
                        return Err(Error::CollectionTypeMismatch {
                            property: self.name.clone(),
                            type_name: self.type_name.clone().unwrap_or_default(),
                        });
                    }
                    start.type_name.clone_from(&self.type_name);
                    return Ok(start);
                }
                MemberName::Scope(annotation) => self.read_annotation(&mut start, annotation)?,
                _ => return Err(Error::UnexpectedProperty(name.into_owned())),
            }
        }
    }

    fn read_annotation(&mut self, start: &mut CollectionStart, annotation: &str) -> Result<(), Error> {
        match AnnotationName::parse(annotation, self.settings.version)? {
            AnnotationName::Control(ControlAnnotation::Context) => {
                let context = ContextUrl::parse(&read_string(&mut self.lexer, annotation)?);
                if let (ItemKind::Dynamic, ContextUrlKind::Collection(element)) = (self.kind, context.kind) {
                    if let Ok((kind, type_name)) = resolve_item_type(self.model, &element) {
                        self.kind = kind;
                        self.type_name = Some(type_name);
                    }
                }
            }
            AnnotationName::Control(ControlAnnotation::Type) => {
                let type_name = read_string(&mut self.lexer, annotation)?;
                if matches!(self.kind, ItemKind::Dynamic) {
                    let (kind, type_name) = resolve_item_type(self.model, &type_name)?;
                    self.kind = kind;
                    self.type_name = Some(type_name);
                }
            }
            AnnotationName::Control(ControlAnnotation::Count) => {
                start.count = Some(read_count(&mut self.lexer, annotation)?);
            }
            AnnotationName::Control(ControlAnnotation::NextLink) => {
                start.next_link = Some(read_string(&mut self.lexer, annotation)?);
            }
            AnnotationName::Control(ControlAnnotation::MetadataEtag) | AnnotationName::OtherOData(_) => {
                skip_annotation(&mut self.lexer, annotation)?;
            }
            AnnotationName::Control(_) => return Err(Error::UnexpectedAnnotation(annotation.into())),
            AnnotationName::Custom(name) if self.settings.include_annotation.matches(name) => {
                let value = read_annotation_value(&mut self.lexer)?;
                start.annotations.push(InstanceAnnotation::new(name, value));
            }
            AnnotationName::Custom(name) => skip_annotation(&mut self.lexer, name)?,
        }
        Ok(())
    }

    fn read_trailer(&mut self) -> Result<(), Error> {
        while let JsonNode::Property(_) = self.lexer.node() {
            let name = self.lexer.take_property_name()?;
            match MemberName::classify(&name) {
                MemberName::Scope(annotation) => skip_annotation(&mut self.lexer, annotation)?,
                _ => return Err(Error::UnexpectedProperty(name.into_owned())),
            }
        }
        self.lexer.expect(NodeKind::EndObject)?;
        self.lexer.read()?;
        Ok(())
    }
}

impl Iterator for CollectionReader<'_> {
    type Item = Result<CollectionEvent, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if matches!(self.state, State::Completed | State::Failed) {
            return None;
        }
        let result = self.step();
        if result.is_err() {
            self.state = State::Failed;
        }
        Some(result)
    }
}

/// Item kind and normalized collection type name of a type name given
/// as element type or `Collection(...)`.
fn resolve_item_type<'m>(model: &'m EdmModel, text: &str) -> Result<(ItemKind<'m>, String), Error> {
    let type_name = TypeName::from_payload(text)?;
    let element = TypeName::One(type_name.element().clone());
    let kind = ItemKind::of(model, &element)
        .ok_or_else(|| Error::UnknownTypeName(type_name.element().to_string()))?;
    Ok((kind, TypeName::CollectionOf(type_name.element().clone()).to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use odata_json_core::PrimitiveValue;

    fn model() -> EdmModel {
        EdmModel::builder().build().unwrap()
    }

    #[test]
    fn wrapped_collection() {
        let model = model();
        let settings = ReaderSettings::default();
        let input = r##"{"@odata.context":"http://host/$metadata#Collection(Edm.Int64)","@odata.count":2,"value":[1,"2"]}"##;
        let events = CollectionReader::new(input, &model, &settings, None)
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(
            events,
            vec![
                CollectionEvent::Start(CollectionStart {
                    type_name: Some("Collection(Edm.Int64)".into()),
                    count: Some(2),
                    ..CollectionStart::default()
                }),
                CollectionEvent::Item(PrimitiveValue::Int64(1).into()),
                CollectionEvent::Item(PrimitiveValue::Int64(2).into()),
                CollectionEvent::End,
            ]
        );
    }

    #[test]
    fn read_to_end_takes_type_from_header() {
        let model = model();
        let settings = ReaderSettings::default();
        let input = r##"{"@odata.type":"#Collection(Edm.Int64)","value":[1]}"##;
        let value = CollectionReader::new(input, &model, &settings, None)
            .unwrap()
            .read_to_end()
            .unwrap();
        assert_eq!(value.type_name.as_deref(), Some("Collection(Edm.Int64)"));
        assert_eq!(value.items, vec![PrimitiveValue::Int64(1).into()]);
    }

    #[test]
    fn missing_value() {
        let model = model();
        let settings = ReaderSettings::default();
        let mut reader = CollectionReader::new(r#"{"@odata.count":2}"#, &model, &settings, None).unwrap();
        assert!(matches!(reader.next(), Some(Err(Error::MissingValueProperty))));
        assert!(reader.next().is_none());
    }

    #[test]
    fn bare_dynamic_items() {
        let model = model();
        let settings = ReaderSettings::default();
        let value = CollectionReader::bare(r#"[1,"a",null,{"x":1}]"#, &model, &settings, ItemKind::Dynamic, None, "p")
            .read_to_end()
            .unwrap();
        assert_eq!(
            value.items,
            vec![
                PrimitiveValue::Int32(1).into(),
                PrimitiveValue::String("a".into()).into(),
                ODataValue::Null,
                ODataValue::Untyped(UntypedValue::new(r#"{"x":1}"#)),
            ]
        );
    }

    #[test]
    fn typed_items_reject_objects() {
        let model = model();
        let settings = ReaderSettings::default();
        let result = CollectionReader::new(r#"{"value":[{}]}"#, &model, &settings, Some("Edm.String"))
            .unwrap()
            .read_to_end();
        assert!(matches!(result, Err(Error::UnexpectedNode { .. })));
    }
}
