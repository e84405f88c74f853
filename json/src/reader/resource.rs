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

//! Pull reader of resources, resource sets and delta resource sets.

use crate::collection::read_collection;
use crate::collection::ItemKind;
use crate::collector::PropertyAndAnnotationCollector;
use crate::collector::PropertyAnnotations;
use crate::lexer::JsonNode;
use crate::lexer::JsonReader;
use crate::lexer::NodeKind;
use crate::primitive::infer_primitive;
use crate::primitive::read_enum;
use crate::primitive::read_primitive;
use crate::reader::event::ReaderEvent;
use crate::reader::event::StreamData;
use crate::reader::event::StreamedProperty;
use crate::reader::values::operation_kind;
use crate::reader::values::read_annotation_value;
use crate::reader::values::read_count;
use crate::reader::values::read_operations;
use crate::reader::values::read_string;
use crate::reader::values::read_strings;
use crate::reader::values::skip_annotation;
use crate::reader::values::AnnotationName;
use crate::reader::values::MemberName;
use crate::reader::Expected;
use crate::resolver::ResolvedProperty;
use crate::resolver::ResourceType;
use crate::resolver::Shape;
use crate::resolver::TypeResolver;
use crate::resolver::ValueKind;
use crate::Error;
use odata_json_core::context_url::ContextUrl;
use odata_json_core::context_url::ContextUrlKind;
use odata_json_core::edm::NavigationSource;
use odata_json_core::edm::OperationKind;
use odata_json_core::edm::PrimitiveKind;
use odata_json_core::edm::TypeName;
use odata_json_core::item::DeletedResource;
use odata_json_core::item::DeltaDeletedEntryReason;
use odata_json_core::item::DeltaDeletedLink;
use odata_json_core::item::DeltaLink;
use odata_json_core::item::InstanceAnnotation;
use odata_json_core::item::NestedResourceInfo;
use odata_json_core::item::Property;
use odata_json_core::item::PropertyInfo;
use odata_json_core::item::Resource;
use odata_json_core::item::ResourceSet;
use odata_json_core::value::UntypedValue;
use odata_json_core::ControlAnnotation;
use odata_json_core::EdmModel;
use odata_json_core::ODataValue;
use odata_json_core::ODataVersion;
use odata_json_core::PrimitiveValue;
use odata_json_core::ReaderSettings;
use std::collections::VecDeque;
use tracing::debug;

/// Kind of payload read by a [`ResourceReader`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PayloadKind {
    Resource,
    ResourceSet,
    DeltaResourceSet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Running,
    Completed,
    Failed,
}

/// Representation of a deleted resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeletedForm {
    /// `#Set/$deletedEntity` context with `id` and `reason` members.
    Context,
    /// `@removed` annotation.
    Removed,
}

enum Item {
    Resource(Resource),
    Deleted(DeletedResource, DeletedForm),
}

impl Item {
    fn properties_mut(&mut self) -> &mut Vec<Property> {
        match self {
            Self::Resource(r) => &mut r.properties,
            Self::Deleted(d, _) => &mut d.properties,
        }
    }

    fn annotations_mut(&mut self) -> &mut Vec<InstanceAnnotation> {
        match self {
            Self::Resource(r) => &mut r.annotations,
            Self::Deleted(d, _) => &mut d.annotations,
        }
    }

    const fn is_deleted(&self) -> bool {
        matches!(self, Self::Deleted(..))
    }
}

struct ResourceFrame<'a> {
    ty: ResourceType<'a>,
    source: Option<&'a NavigationSource>,
    item: Item,
    collector: PropertyAndAnnotationCollector,
    started: bool,
    /// A property value was read: resource control annotations are over.
    property_seen: bool,
}

struct SetFrame<'a> {
    set: ResourceSet,
    delta: bool,
    item_type: ResourceType<'a>,
    source: Option<&'a NavigationSource>,
    /// `{"value":[...]}` rather than a bare array.
    wrapped: bool,
    started: bool,
    collector: PropertyAndAnnotationCollector,
}

impl<'a> SetFrame<'a> {
    fn new(
        delta: bool,
        item_type: ResourceType<'a>,
        source: Option<&'a NavigationSource>,
        wrapped: bool,
    ) -> Self {
        let set = ResourceSet {
            type_name: item_type.name.as_ref().map(|n| format!("Collection({n})")),
            ..ResourceSet::default()
        };
        Self {
            set,
            delta,
            item_type,
            source,
            wrapped,
            started: false,
            collector: PropertyAndAnnotationCollector::new(),
        }
    }

    fn start_event(&self) -> ReaderEvent {
        if self.delta {
            ReaderEvent::DeltaResourceSetStart(self.set.clone())
        } else {
            ReaderEvent::ResourceSetStart(self.set.clone())
        }
    }

    fn into_end_event(self) -> ReaderEvent {
        if self.delta {
            ReaderEvent::DeltaResourceSetEnd(self.set)
        } else {
            ReaderEvent::ResourceSetEnd(self.set)
        }
    }
}

enum Frame<'a> {
    Start {
        kind: PayloadKind,
        ty: ResourceType<'a>,
        source: Option<&'a NavigationSource>,
        wrapped: bool,
    },
    Set(SetFrame<'a>),
    Resource(ResourceFrame<'a>),
    /// Open nested resource info, closed when it becomes the top frame.
    NestedInfo(NestedResourceInfo),
}

/// Control information of an object found before reading it.
#[derive(Debug, Default)]
struct Peek {
    type_name: Option<String>,
    removed: bool,
    context: Option<ContextUrl>,
}

/// How an object inside a delta resource set is read.
enum Route {
    Resource,
    Deleted(DeletedForm),
    Link { deleted: bool },
}

impl Route {
    fn of(peek: &Peek) -> Self {
        if peek.removed {
            return Self::Deleted(DeletedForm::Removed);
        }
        match peek.context.as_ref().map(|c| &c.kind) {
            Some(ContextUrlKind::DeletedEntity) => Self::Deleted(DeletedForm::Context),
            Some(ContextUrlKind::Link) => Self::Link { deleted: false },
            Some(ContextUrlKind::DeletedLink) => Self::Link { deleted: true },
            _ => Self::Resource,
        }
    }
}

/// Lazy reader of a resource, resource set or delta resource set payload.
///
/// The reader is an iterator of [`ReaderEvent`]s. The first error ends the
/// sequence.
pub struct ResourceReader<'a> {
    lexer: JsonReader<'a>,
    resolver: TypeResolver<'a>,
    settings: &'a ReaderSettings,
    stack: Vec<Frame<'a>>,
    pending: VecDeque<ReaderEvent>,
    state: State,
}

impl<'a> ResourceReader<'a> {
    fn new(
        input: &'a str,
        model: &'a EdmModel,
        settings: &'a ReaderSettings,
        kind: PayloadKind,
        ty: ResourceType<'a>,
        source: Option<&'a NavigationSource>,
        wrapped: bool,
    ) -> Self {
        Self {
            lexer: JsonReader::new(input).with_max_depth(settings.max_nesting_depth),
            resolver: TypeResolver::new(model, settings),
            settings,
            stack: vec![Frame::Start {
                kind,
                ty,
                source,
                wrapped,
            }],
            pending: VecDeque::new(),
            state: State::Running,
        }
    }

    /// Reader of a single resource payload.
    ///
    /// # Errors
    ///
    /// Returns error if the expected navigation source or type is not in
    /// the model.
    pub fn resource(
        input: &'a str,
        model: &'a EdmModel,
        settings: &'a ReaderSettings,
        expected: Expected<'_>,
    ) -> Result<Self, Error> {
        let (ty, source) = expected.resolve(model)?;
        Ok(Self::new(input, model, settings, PayloadKind::Resource, ty, source, true))
    }

    /// Reader of a resource set payload (`{"value":[...]}`).
    ///
    /// # Errors
    ///
    /// Returns error if the expected navigation source or type is not in
    /// the model.
    pub fn resource_set(
        input: &'a str,
        model: &'a EdmModel,
        settings: &'a ReaderSettings,
        expected: Expected<'_>,
    ) -> Result<Self, Error> {
        let (ty, source) = expected.resolve(model)?;
        Ok(Self::new(input, model, settings, PayloadKind::ResourceSet, ty, source, true))
    }

    /// Reader of a delta resource set payload.
    ///
    /// # Errors
    ///
    /// Returns error if the expected navigation source or type is not in
    /// the model.
    pub fn delta_resource_set(
        input: &'a str,
        model: &'a EdmModel,
        settings: &'a ReaderSettings,
        expected: Expected<'_>,
    ) -> Result<Self, Error> {
        let (ty, source) = expected.resolve(model)?;
        Ok(Self::new(input, model, settings, PayloadKind::DeltaResourceSet, ty, source, true))
    }

    /// Reader of a bare resource or array of resources, e.g. the value of
    /// a structured parameter.
    pub(crate) fn bare(
        input: &'a str,
        model: &'a EdmModel,
        settings: &'a ReaderSettings,
        kind: PayloadKind,
        ty: ResourceType<'a>,
    ) -> Self {
        Self::new(input, model, settings, kind, ty, None, false)
    }

    fn model(&self) -> &'a EdmModel {
        self.resolver.model()
    }

    fn emit(&mut self, event: ReaderEvent) {
        self.pending.push_back(event);
    }

    fn step(&mut self) -> Result<(), Error> {
        let Some(frame) = self.stack.pop() else {
            self.lexer.expect(NodeKind::EndOfInput)?;
            self.state = State::Completed;
            debug!("payload completed");
            return Ok(());
        };
        match frame {
            Frame::Start {
                kind,
                ty,
                source,
                wrapped,
            } => self.start(kind, ty, source, wrapped),
            Frame::Set(set) if set.started => self.step_set(set),
            Frame::Set(set) => self.start_set(set),
            Frame::Resource(resource) => self.step_resource(resource),
            Frame::NestedInfo(info) => {
                self.emit(ReaderEvent::NestedResourceInfoEnd(info));
                Ok(())
            }
        }
    }

    fn start(
        &mut self,
        kind: PayloadKind,
        ty: ResourceType<'a>,
        source: Option<&'a NavigationSource>,
        wrapped: bool,
    ) -> Result<(), Error> {
        self.lexer.read()?;
        match kind {
            PayloadKind::Resource => {
                self.lexer.expect(NodeKind::StartObject)?;
                let peek = self.peek()?;
                let frame = self.begin_resource(&ty, source, &peek, None)?;
                self.stack.push(frame);
            }
            PayloadKind::ResourceSet | PayloadKind::DeltaResourceSet => {
                self.lexer.expect(if wrapped {
                    NodeKind::StartObject
                } else {
                    NodeKind::StartArray
                })?;
                let delta = kind == PayloadKind::DeltaResourceSet;
                self.stack
                    .push(Frame::Set(SetFrame::new(delta, ty, source, wrapped)));
            }
        }
        Ok(())
    }

    /// Scan the members of the object at the current node for the
    /// annotations that decide how it is read. The reader does not move.
    fn peek(&self) -> Result<Peek, Error> {
        let mut lexer = self.lexer.clone();
        lexer.read()?;
        let mut peek = Peek::default();
        while let JsonNode::Property(_) = lexer.node() {
            let name = lexer.take_property_name()?;
            let MemberName::Scope(annotation) = MemberName::classify(&name) else {
                lexer.skip_value()?;
                continue;
            };
            match ControlAnnotation::parse(annotation, self.settings.version) {
                Some(ControlAnnotation::Type) if peek.type_name.is_none() => {
                    peek.type_name = Some(read_string(&mut lexer, annotation)?);
                }
                Some(ControlAnnotation::Context) if peek.context.is_none() => {
                    peek.context = Some(ContextUrl::parse(&read_string(&mut lexer, annotation)?));
                }
                Some(ControlAnnotation::Removed) => {
                    peek.removed = true;
                    lexer.skip_value()?;
                }
                _ => {
                    lexer.skip_value()?;
                }
            }
        }
        Ok(peek)
    }

    /// Resolve the type of the object at the current node and enter it.
    fn begin_resource(
        &mut self,
        expected: &ResourceType<'a>,
        source: Option<&'a NavigationSource>,
        peek: &Peek,
        deleted: Option<DeletedForm>,
    ) -> Result<Frame<'a>, Error> {
        let model = self.model();
        let mut source = source;
        let mut expected = expected.clone();
        let context_source = peek
            .context
            .as_ref()
            .and_then(|c| c.navigation_source.as_deref())
            .and_then(|name| model.find_navigation_source(name));
        if let Some(context_source) = context_source {
            source = Some(context_source);
            if expected.structured.is_none() && !expected.untyped {
                if let Some(ty) = model.navigation_source_type(context_source) {
                    expected = ResourceType::model(ty);
                }
            }
        }
        let ty = self
            .resolver
            .resolve_resource_type(&expected, peek.type_name.as_deref())?;
        let type_name = ty.name.clone();
        let item = match deleted {
            None => Item::Resource(Resource {
                type_name,
                ..Resource::default()
            }),
            Some(form) => Item::Deleted(
                DeletedResource {
                    type_name,
                    ..DeletedResource::default()
                },
                form,
            ),
        };
        self.lexer.read()?;
        debug!(type_name = ?ty.name, deleted = deleted.is_some(), "resource started");
        Ok(Frame::Resource(ResourceFrame {
            ty,
            source,
            item,
            collector: PropertyAndAnnotationCollector::new(),
            started: false,
            property_seen: false,
        }))
    }

    fn start_set(&mut self, mut set: SetFrame<'a>) -> Result<(), Error> {
        self.lexer.read()?;
        if set.wrapped {
            loop {
                match self.lexer.node_kind() {
                    NodeKind::Property => {}
                    NodeKind::EndObject => return Err(Error::MissingValueProperty),
                    _ => return Err(self.lexer.unexpected("property")),
                }
                let name = self.lexer.take_property_name()?;
                match MemberName::classify(&name) {
                    MemberName::Property("value") => {
                        if self.lexer.node_kind() != NodeKind::StartArray {
                            return Err(Error::ResourceSetValueNotArray);
                        }
                        self.lexer.read()?;
                        break;
                    }
                    MemberName::Scope(annotation) => self.read_set_annotation(&mut set, annotation)?,
                    MemberName::MetadataReference(metadata) => {
                        let links = read_operations(&mut self.lexer, metadata)?;
                        match operation_kind(self.model(), metadata) {
                            OperationKind::Action => set.set.actions.extend(links),
                            OperationKind::Function => set.set.functions.extend(links),
                        }
                    }
                    _ => return Err(Error::UnexpectedProperty(name.to_string())),
                }
            }
        }
        check_set_links(&set.set)?;
        set.started = true;
        debug!(type_name = ?set.set.type_name, delta = set.delta, "resource set started");
        self.emit(set.start_event());
        self.stack.push(Frame::Set(set));
        Ok(())
    }

    fn read_set_annotation(&mut self, set: &mut SetFrame<'a>, annotation: &str) -> Result<(), Error> {
        let parsed = AnnotationName::parse(annotation, self.settings.version)?;
        set.collector.add_scope_annotation(annotation_key(parsed))?;
        match parsed {
            AnnotationName::Control(ControlAnnotation::Context) => {
                let context = ContextUrl::parse(&read_string(&mut self.lexer, annotation)?);
                let source = context
                    .navigation_source
                    .as_deref()
                    .and_then(|name| self.model().find_navigation_source(name));
                if let (None, Some(source)) = (set.source, source) {
                    set.source = Some(source);
                    let untyped = set.item_type.structured.is_none() && !set.item_type.untyped;
                    if let (true, Some(ty)) = (untyped, self.model().navigation_source_type(source)) {
                        set.item_type = ResourceType::model(ty);
                        set.set.type_name = Some(format!("Collection({})", ty.name));
                    }
                }
            }
            AnnotationName::Control(ControlAnnotation::Type) => {
                let type_name = TypeName::from_payload(&read_string(&mut self.lexer, annotation)?)?;
                let element = type_name.element().to_string();
                set.item_type = self
                    .resolver
                    .resolve_resource_type(&set.item_type, Some(&element))?;
                set.set.type_name = Some(TypeName::CollectionOf(type_name.element().clone()).to_string());
            }
            AnnotationName::Control(ControlAnnotation::Count) => {
                set.set.count = Some(read_count(&mut self.lexer, annotation)?);
            }
            AnnotationName::Control(ControlAnnotation::NextLink) => {
                set.set.next_link = Some(read_string(&mut self.lexer, annotation)?);
            }
            AnnotationName::Control(ControlAnnotation::DeltaLink) => {
                set.set.delta_link = Some(read_string(&mut self.lexer, annotation)?);
            }
            AnnotationName::Control(ControlAnnotation::MetadataEtag) | AnnotationName::OtherOData(_) => {
                skip_annotation(&mut self.lexer, annotation)?;
            }
            AnnotationName::Control(_) => return Err(Error::UnexpectedAnnotation(annotation.into())),
            AnnotationName::Custom(name) => {
                if let Some(a) = self.read_custom(name)? {
                    set.set.annotations.push(a);
                }
            }
        }
        Ok(())
    }

    fn read_custom(&mut self, name: &str) -> Result<Option<InstanceAnnotation>, Error> {
        if self.settings.include_annotation.matches(name) {
            let value = read_annotation_value(&mut self.lexer)?;
            Ok(Some(InstanceAnnotation::new(name, value)))
        } else {
            skip_annotation(&mut self.lexer, name)?;
            Ok(None)
        }
    }

    fn step_set(&mut self, set: SetFrame<'a>) -> Result<(), Error> {
        if self.lexer.node_kind() == NodeKind::EndArray {
            self.lexer.read()?;
            return self.end_set(set);
        }
        match Shape::of(self.lexer.node()) {
            Shape::Object => {
                let frame = self.begin_item(&set)?;
                self.stack.push(Frame::Set(set));
                self.stack.extend(frame);
            }
            Shape::Array if set.item_type.untyped => {
                self.stack.push(Frame::Set(set));
                self.stack.push(Frame::Set(SetFrame::new(
                    false,
                    ResourceType::untyped(),
                    None,
                    false,
                )));
            }
            Shape::Null | Shape::Scalar if set.item_type.untyped => {
                let value = infer_primitive(&self.lexer.take_scalar()?);
                self.emit(ReaderEvent::Primitive(value));
                self.stack.push(Frame::Set(set));
            }
            Shape::Null => return Err(Error::NullResourceInSet),
            Shape::Array | Shape::Scalar => return Err(self.lexer.unexpected("resource")),
        }
        Ok(())
    }

    /// Enter an object in a resource set. Delta links are read whole and
    /// yield no frame.
    fn begin_item(&mut self, set: &SetFrame<'a>) -> Result<Option<Frame<'a>>, Error> {
        let peek = self.peek()?;
        let route = if set.delta {
            Route::of(&peek)
        } else {
            Route::Resource
        };
        match route {
            Route::Resource => self
                .begin_resource(&set.item_type, set.source, &peek, None)
                .map(Some),
            Route::Deleted(form) => self
                .begin_resource(&set.item_type, set.source, &peek, Some(form))
                .map(Some),
            Route::Link { deleted } => {
                let event = self.read_delta_link(deleted)?;
                self.emit(event);
                Ok(None)
            }
        }
    }

    fn read_delta_link(&mut self, deleted: bool) -> Result<ReaderEvent, Error> {
        self.lexer.read()?;
        let mut source = None;
        let mut relationship = None;
        let mut target = None;
        while let JsonNode::Property(_) = self.lexer.node() {
            let name = self.lexer.take_property_name()?;
            match name.as_ref() {
                "source" => source = Some(read_string(&mut self.lexer, "source")?),
                "relationship" => relationship = Some(read_string(&mut self.lexer, "relationship")?),
                "target" => target = Some(read_string(&mut self.lexer, "target")?),
                other if other.starts_with('@') => skip_annotation(&mut self.lexer, other)?,
                other => return Err(Error::UnexpectedProperty(other.into())),
            }
        }
        self.lexer.expect(NodeKind::EndObject)?;
        self.lexer.read()?;
        let source = source.ok_or(Error::MissingDeltaLinkProperty("source"))?;
        let relationship = relationship.ok_or(Error::MissingDeltaLinkProperty("relationship"))?;
        let target = target.ok_or(Error::MissingDeltaLinkProperty("target"))?;
        Ok(if deleted {
            ReaderEvent::DeltaDeletedLink(DeltaDeletedLink::new(source, relationship, target))
        } else {
            ReaderEvent::DeltaLink(DeltaLink::new(source, relationship, target))
        })
    }

    fn end_set(&mut self, mut set: SetFrame<'a>) -> Result<(), Error> {
        if set.wrapped {
            while let JsonNode::Property(_) = self.lexer.node() {
                let name = self.lexer.take_property_name()?;
                match MemberName::classify(&name) {
                    MemberName::Scope(annotation) => self.read_set_annotation(&mut set, annotation)?,
                    _ => return Err(Error::UnexpectedProperty(name.to_string())),
                }
            }
            self.lexer.expect(NodeKind::EndObject)?;
            self.lexer.read()?;
        }
        check_set_links(&set.set)?;
        debug!(type_name = ?set.set.type_name, "resource set ended");
        self.emit(set.into_end_event());
        Ok(())
    }

    fn step_resource(&mut self, mut frame: ResourceFrame<'a>) -> Result<(), Error> {
        match self.lexer.node_kind() {
            NodeKind::EndObject => self.end_resource(frame),
            NodeKind::Property => {
                let name = self.lexer.take_property_name()?;
                let children = self.read_member(&mut frame, &name)?;
                self.stack.push(Frame::Resource(frame));
                self.stack.extend(children);
                Ok(())
            }
            _ => Err(self.lexer.unexpected("property")),
        }
    }

    fn read_member(&mut self, frame: &mut ResourceFrame<'a>, name: &str) -> Result<Vec<Frame<'a>>, Error> {
        match MemberName::classify(name) {
            MemberName::Scope(annotation) => {
                self.read_scope_annotation(frame, annotation)?;
                Ok(Vec::new())
            }
            MemberName::MetadataReference(metadata) => {
                let links = read_operations(&mut self.lexer, metadata)?;
                if let Item::Resource(resource) = &mut frame.item {
                    match operation_kind(self.model(), metadata) {
                        OperationKind::Action => resource.actions.extend(links),
                        OperationKind::Function => resource.functions.extend(links),
                    }
                }
                Ok(Vec::new())
            }
            MemberName::PropertyAnnotation(property, annotation) => {
                self.read_property_annotation(frame, property, annotation)
            }
            MemberName::Property(property) => self.read_property(frame, property),
        }
    }

    fn read_scope_annotation(&mut self, frame: &mut ResourceFrame<'a>, annotation: &str) -> Result<(), Error> {
        let parsed = AnnotationName::parse(annotation, self.settings.version)?;
        frame.collector.add_scope_annotation(annotation_key(parsed))?;
        let control = match parsed {
            AnnotationName::Control(c) => c,
            AnnotationName::OtherOData(_) => return skip_annotation(&mut self.lexer, annotation),
            AnnotationName::Custom(name) => {
                if let Some(a) = self.read_custom(name)? {
                    frame.item.annotations_mut().push(a);
                }
                return Ok(());
            }
        };
        match control {
            // Resolved before the resource was entered.
            ControlAnnotation::Type | ControlAnnotation::MetadataEtag => {
                skip_annotation(&mut self.lexer, annotation)
            }
            ControlAnnotation::Count
            | ControlAnnotation::NextLink
            | ControlAnnotation::DeltaLink
            | ControlAnnotation::Bind
            | ControlAnnotation::NavigationLink
            | ControlAnnotation::AssociationLink
            | ControlAnnotation::Delta => Err(Error::UnexpectedAnnotation(annotation.into())),
            _ if frame.property_seen => Err(Error::InstanceAnnotationAfterProperty(annotation.into())),
            ControlAnnotation::Context => skip_annotation(&mut self.lexer, annotation),
            ControlAnnotation::Removed => {
                let reason = read_removed(&mut self.lexer, annotation)?;
                if let Item::Deleted(deleted, _) = &mut frame.item {
                    deleted.reason = reason;
                }
                Ok(())
            }
            ControlAnnotation::Id => {
                let id = read_string(&mut self.lexer, annotation)?;
                match &mut frame.item {
                    Item::Resource(r) => r.id = Some(id.into()),
                    Item::Deleted(d, _) => d.id = Some(id.into()),
                }
                Ok(())
            }
            ControlAnnotation::ETag
            | ControlAnnotation::EditLink
            | ControlAnnotation::ReadLink
            | ControlAnnotation::MediaEditLink
            | ControlAnnotation::MediaReadLink
            | ControlAnnotation::MediaContentType
            | ControlAnnotation::MediaEtag => {
                let value = read_string(&mut self.lexer, annotation)?;
                if let Item::Resource(resource) = &mut frame.item {
                    set_resource_link(resource, control, value);
                }
                Ok(())
            }
        }
    }

    fn read_property_annotation(
        &mut self,
        frame: &mut ResourceFrame<'a>,
        property: &str,
        annotation: &str,
    ) -> Result<Vec<Frame<'a>>, Error> {
        let parsed = AnnotationName::parse(annotation, self.settings.version)?;
        if parsed == AnnotationName::Control(ControlAnnotation::Delta) {
            return self.read_nested_delta(frame, property);
        }
        let is_type = parsed == AnnotationName::Control(ControlAnnotation::Type);
        let include = match parsed {
            AnnotationName::Custom(name) => self.settings.include_annotation.matches(name),
            _ => false,
        };
        let entry = frame
            .collector
            .annotations_mut(property, annotation_key(parsed), is_type)?;
        let lexer = &mut self.lexer;
        match parsed {
            AnnotationName::Control(ControlAnnotation::Type) => {
                entry.type_name = Some(read_string(lexer, annotation)?);
            }
            AnnotationName::Control(ControlAnnotation::Count) => {
                entry.count = Some(read_count(lexer, annotation)?);
            }
            AnnotationName::Control(ControlAnnotation::NextLink) => {
                entry.next_link = Some(read_string(lexer, annotation)?);
            }
            AnnotationName::Control(ControlAnnotation::NavigationLink) => {
                entry.navigation_link = Some(read_string(lexer, annotation)?);
            }
            AnnotationName::Control(ControlAnnotation::AssociationLink) => {
                entry.association_link = Some(read_string(lexer, annotation)?);
            }
            AnnotationName::Control(ControlAnnotation::MediaEditLink) => {
                entry.media.edit_link = Some(read_string(lexer, annotation)?);
            }
            AnnotationName::Control(ControlAnnotation::MediaReadLink) => {
                entry.media.read_link = Some(read_string(lexer, annotation)?);
            }
            AnnotationName::Control(ControlAnnotation::MediaContentType) => {
                entry.media.content_type = Some(read_string(lexer, annotation)?);
            }
            AnnotationName::Control(ControlAnnotation::MediaEtag) => {
                entry.media.etag = Some(read_string(lexer, annotation)?);
            }
            AnnotationName::Control(ControlAnnotation::Bind) => {
                entry.bind = read_strings(lexer, annotation)?;
            }
            AnnotationName::Control(_) => {
                return Err(Error::UnexpectedPropertyAnnotation {
                    property: property.into(),
                    annotation: annotation.into(),
                })
            }
            AnnotationName::OtherOData(_) => skip_annotation(lexer, annotation)?,
            AnnotationName::Custom(name) if include => {
                let value = read_annotation_value(lexer)?;
                entry.custom.push(InstanceAnnotation::new(name, value));
            }
            AnnotationName::Custom(name) => skip_annotation(lexer, name)?,
        }
        Ok(Vec::new())
    }

    /// `Property@delta`: the annotation value is a nested delta resource
    /// set of the navigation property.
    fn read_nested_delta(&mut self, frame: &mut ResourceFrame<'a>, property: &str) -> Result<Vec<Frame<'a>>, Error> {
        self.ensure_started(frame);
        frame.property_seen = true;
        let annotations = frame.collector.mark_property(property)?;
        let resolved = self.resolver.resolve_property(
            &frame.ty,
            property,
            annotations.type_name.as_deref(),
            Shape::of(self.lexer.node()),
        )?;
        let ValueKind::ResourceSet(ty) = resolved.kind.clone() else {
            return Err(Error::UnexpectedPropertyAnnotation {
                property: property.into(),
                annotation: ControlAnnotation::Delta.name(self.settings.version).into(),
            });
        };
        let info = nested_info(property, true, &resolved, annotations);
        let mut set = SetFrame::new(true, ty, self.child_source(frame, property), false);
        set.set.count = info.count;
        self.emit(ReaderEvent::NestedResourceInfoStart(info.clone()));
        Ok(vec![Frame::NestedInfo(info), Frame::Set(set)])
    }

    fn read_property(&mut self, frame: &mut ResourceFrame<'a>, name: &str) -> Result<Vec<Frame<'a>>, Error> {
        if let Item::Deleted(deleted, DeletedForm::Context) = &mut frame.item {
            match name {
                "id" => {
                    deleted.id = Some(read_string(&mut self.lexer, name)?.into());
                    return Ok(Vec::new());
                }
                "reason" => {
                    deleted.reason = Some(read_reason(&mut self.lexer)?);
                    return Ok(Vec::new());
                }
                _ => {}
            }
        }
        self.ensure_started(frame);
        frame.property_seen = true;
        let annotations = frame.collector.mark_property(name)?;
        let shape = Shape::of(self.lexer.node());
        if frame.item.is_deleted()
            && self.settings.version == ODataVersion::V4
            && matches!(shape, Shape::Object | Shape::Array)
        {
            return Err(Error::DeletedResourceContentNotAllowed(name.into()));
        }
        let resolved = self.resolver.resolve_property(
            &frame.ty,
            name,
            annotations.type_name.as_deref(),
            shape,
        )?;
        let value = match resolved.kind.clone() {
            ValueKind::Primitive(kind) => {
                if shape == Shape::Null {
                    self.lexer.take_scalar()?;
                    self.null_value(&resolved, name)?
                } else if self.is_stream(Some(kind), name) {
                    return self.read_stream(name, Some(kind)).map(|()| Vec::new());
                } else {
                    read_primitive(&self.lexer.take_scalar()?, kind, name)?.into()
                }
            }
            ValueKind::Enum(ty) => {
                if shape == Shape::Null {
                    self.lexer.take_scalar()?;
                    self.null_value(&resolved, name)?
                } else {
                    ODataValue::Enum(read_enum(&self.lexer.take_scalar()?, ty)?)
                }
            }
            ValueKind::PrimitiveCollection(kind) => {
                self.collection_value(&resolved, ItemKind::Primitive(kind), name, shape)?
            }
            ValueKind::EnumCollection(ty) => self.collection_value(&resolved, ItemKind::Enum(ty), name, shape)?,
            ValueKind::Raw => ODataValue::Untyped(UntypedValue::new(self.lexer.skip_value()?)),
            ValueKind::Dynamic | ValueKind::Untyped if matches!(shape, Shape::Null | Shape::Scalar) => {
                if self.is_stream(None, name) {
                    return self.read_stream(name, None).map(|()| Vec::new());
                }
                infer_primitive(&self.lexer.take_scalar()?)
            }
            ValueKind::Dynamic => ODataValue::Untyped(UntypedValue::new(self.lexer.skip_value()?)),
            ValueKind::Untyped => return self.read_untyped_nested(frame, name, resolved, annotations, shape),
            ValueKind::Resource(ty) => return self.read_nested_resource(frame, name, &resolved, annotations, ty, shape),
            ValueKind::ResourceSet(ty) => {
                return self.read_nested_resource_set(frame, name, &resolved, annotations, ty, shape)
            }
        };
        let property = Property {
            name: name.into(),
            value,
            type_name: resolved.type_name,
            annotations: annotations.custom,
        };
        frame.item.properties_mut().push(property);
        Ok(Vec::new())
    }

    fn null_value(&self, resolved: &ResolvedProperty<'_>, name: &str) -> Result<ODataValue, Error> {
        if !resolved.is_nullable() {
            return Err(Error::NullValueForNonNullable(name.into()));
        }
        Ok(ODataValue::Null)
    }

    fn collection_value(
        &mut self,
        resolved: &ResolvedProperty<'_>,
        kind: ItemKind<'_>,
        name: &str,
        shape: Shape,
    ) -> Result<ODataValue, Error> {
        if shape == Shape::Null {
            self.lexer.take_scalar()?;
            return self.null_value(resolved, name);
        }
        let type_name = resolved
            .type_name
            .clone()
            .or_else(|| resolved.declared.map(|p| p.type_ref.type_name().to_string()));
        read_collection(&mut self.lexer, kind, name, type_name).map(ODataValue::Collection)
    }

    fn is_stream(&self, kind: Option<PrimitiveKind>, name: &str) -> bool {
        let streamable = kind.map_or(true, |k| {
            matches!(k, PrimitiveKind::String | PrimitiveKind::Binary | PrimitiveKind::Stream)
        });
        streamable
            && self.lexer.node().is_string()
            && self.settings.is_stream(kind, false, name)
    }

    fn read_stream(&mut self, name: &str, kind: Option<PrimitiveKind>) -> Result<(), Error> {
        let scalar = self.lexer.take_scalar()?;
        let data = match kind {
            Some(PrimitiveKind::Binary) => match read_primitive(&scalar, PrimitiveKind::Binary, name)? {
                PrimitiveValue::Binary(bytes) => StreamData::Binary(bytes),
                _ => return Err(self.lexer.unexpected("base64 string")),
            },
            _ => StreamData::Text(scalar.as_str().unwrap_or_default().to_string()),
        };
        self.emit(ReaderEvent::PropertyStream(StreamedProperty {
            name: name.into(),
            kind,
            data,
        }));
        Ok(())
    }

    fn read_nested_resource(
        &mut self,
        frame: &ResourceFrame<'a>,
        name: &str,
        resolved: &ResolvedProperty<'a>,
        annotations: PropertyAnnotations,
        ty: ResourceType<'a>,
        shape: Shape,
    ) -> Result<Vec<Frame<'a>>, Error> {
        let bind = annotations.bind.clone();
        let info = nested_info(name, false, resolved, annotations);
        match shape {
            Shape::Null => {
                self.null_value(resolved, name)?;
                self.lexer.take_scalar()?;
                self.emit(ReaderEvent::NestedResourceInfoStart(info.clone()));
                self.emit(ReaderEvent::NullResource);
                self.emit(ReaderEvent::NestedResourceInfoEnd(info));
                Ok(Vec::new())
            }
            Shape::Object => {
                let source = self.child_source(frame, name);
                let peek = self.peek()?;
                self.emit(ReaderEvent::NestedResourceInfoStart(info.clone()));
                self.emit_binds(bind);
                let child = self.begin_resource(&ty, source, &peek, None)?;
                Ok(vec![Frame::NestedInfo(info), child])
            }
            Shape::Array | Shape::Scalar => Err(self.lexer.unexpected("object")),
        }
    }

    fn read_nested_resource_set(
        &mut self,
        frame: &mut ResourceFrame<'a>,
        name: &str,
        resolved: &ResolvedProperty<'a>,
        annotations: PropertyAnnotations,
        ty: ResourceType<'a>,
        shape: Shape,
    ) -> Result<Vec<Frame<'a>>, Error> {
        if shape != Shape::Array {
            return Err(self.lexer.unexpected("array"));
        }
        // Items of a type trusted by name may turn out to be scalars.
        if ty.structured.is_none() && !ty.untyped && self.first_item_is_scalar()? {
            let value = read_collection(&mut self.lexer, ItemKind::Dynamic, name, resolved.type_name.clone())?;
            let property = Property {
                name: name.into(),
                value: ODataValue::Collection(value),
                type_name: resolved.type_name.clone(),
                annotations: annotations.custom,
            };
            frame.item.properties_mut().push(property);
            return Ok(Vec::new());
        }
        let bind = annotations.bind.clone();
        let next_link = annotations.next_link.clone();
        let info = nested_info(name, true, resolved, annotations);
        let mut set = SetFrame::new(false, ty, self.child_source(frame, name), false);
        set.set.count = info.count;
        set.set.next_link = next_link;
        self.emit(ReaderEvent::NestedResourceInfoStart(info.clone()));
        self.emit_binds(bind);
        Ok(vec![Frame::NestedInfo(info), Frame::Set(set)])
    }

    /// `Edm.Untyped` or untyped content: nested resources and sets by JSON
    /// shape.
    fn read_untyped_nested(
        &mut self,
        frame: &mut ResourceFrame<'a>,
        name: &str,
        resolved: ResolvedProperty<'a>,
        annotations: PropertyAnnotations,
        shape: Shape,
    ) -> Result<Vec<Frame<'a>>, Error> {
        let ty = ResourceType::untyped();
        if shape == Shape::Object {
            return self.read_nested_resource(frame, name, &resolved, annotations, ty, shape);
        }
        if !self.settings.enable_untyped_collections && self.first_item_is_scalar()? {
            let value = read_collection(&mut self.lexer, ItemKind::Dynamic, name, resolved.type_name.clone())?;
            let property = Property {
                name: name.into(),
                value: ODataValue::Collection(value),
                type_name: resolved.type_name,
                annotations: annotations.custom,
            };
            frame.item.properties_mut().push(property);
            return Ok(Vec::new());
        }
        self.read_nested_resource_set(frame, name, &resolved, annotations, ty, shape)
    }

    /// The array at the current node has a first non-null item that is not
    /// an object.
    fn first_item_is_scalar(&self) -> Result<bool, Error> {
        let mut lexer = self.lexer.clone();
        lexer.read()?;
        loop {
            match Shape::of(lexer.node()) {
                Shape::Null => {
                    lexer.take_scalar()?;
                }
                Shape::Scalar => return Ok(lexer.node_kind() == NodeKind::Primitive),
                Shape::Object | Shape::Array => return Ok(false),
            }
        }
    }

    fn emit_binds(&mut self, bind: Vec<String>) {
        for link in bind {
            self.emit(ReaderEvent::EntityReferenceLink(link));
        }
    }

    fn child_source(&self, frame: &ResourceFrame<'a>, property: &str) -> Option<&'a NavigationSource> {
        frame
            .source
            .and_then(|source| self.model().navigation_target(source, property))
    }

    fn ensure_started(&mut self, frame: &mut ResourceFrame<'a>) {
        if frame.started {
            return;
        }
        frame.started = true;
        let event = match &frame.item {
            Item::Resource(r) => ReaderEvent::ResourceStart(r.clone()),
            Item::Deleted(d, _) => ReaderEvent::DeletedResourceStart(d.clone()),
        };
        self.emit(event);
    }

    fn end_resource(&mut self, mut frame: ResourceFrame<'a>) -> Result<(), Error> {
        if let Item::Deleted(deleted, DeletedForm::Context) = &frame.item {
            if deleted.id.is_none() {
                return Err(Error::MissingDeletedResourceId);
            }
        }
        self.ensure_started(&mut frame);
        for (name, annotations) in frame.collector.take_annotation_only() {
            self.annotation_only_property(&mut frame, name, annotations);
        }
        self.lexer.read()?;
        debug!(type_name = ?frame.ty.name, "resource ended");
        let event = match frame.item {
            Item::Resource(r) => ReaderEvent::ResourceEnd(r),
            Item::Deleted(d, _) => ReaderEvent::DeletedResourceEnd(d),
        };
        self.emit(event);
        Ok(())
    }

    /// Property that carried annotations but no value: an entity reference
    /// binding, a deferred navigation property, a stream property or an
    /// annotated property info.
    fn annotation_only_property(&mut self, frame: &mut ResourceFrame<'a>, name: String, annotations: PropertyAnnotations) {
        let declared = frame
            .ty
            .structured
            .and_then(|t| self.model().find_property(t, &name));
        if !annotations.bind.is_empty() || annotations.is_navigation() {
            let info = NestedResourceInfo {
                name,
                is_collection: declared.map(|p| p.type_ref.collection),
                url: annotations.navigation_link,
                association_link_url: annotations.association_link,
                count: annotations.count,
                type_name: annotations.type_name,
                annotations: annotations.custom,
            };
            self.emit(ReaderEvent::NestedResourceInfoStart(info.clone()));
            self.emit_binds(annotations.bind);
            self.emit(ReaderEvent::NestedResourceInfoEnd(info));
            return;
        }
        if !annotations.media.is_empty() {
            let property = Property {
                name,
                value: ODataValue::Stream(annotations.media),
                type_name: annotations.type_name,
                annotations: annotations.custom,
            };
            frame.item.properties_mut().push(property);
            return;
        }
        let info = PropertyInfo {
            name,
            type_name: annotations.type_name,
            annotations: annotations.custom,
        };
        if let Item::Resource(resource) = &mut frame.item {
            resource.property_infos.push(info.clone());
        }
        self.emit(ReaderEvent::NestedProperty(info));
    }
}

impl Iterator for ResourceReader<'_> {
    type Item = Result<ReaderEvent, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(Ok(event));
            }
            if self.state != State::Running {
                return None;
            }
            if let Err(err) = self.step() {
                self.state = State::Failed;
                self.pending.clear();
                return Some(Err(err));
            }
        }
    }
}

/// Key of an annotation in the collector: control annotations collide in
/// both their prefixed and short forms.
fn annotation_key(parsed: AnnotationName<'_>) -> &str {
    match parsed {
        AnnotationName::Control(c) => c.qualified_name(),
        AnnotationName::OtherOData(name) | AnnotationName::Custom(name) => name,
    }
}

fn nested_info(
    name: &str,
    is_collection: bool,
    resolved: &ResolvedProperty<'_>,
    annotations: PropertyAnnotations,
) -> NestedResourceInfo {
    NestedResourceInfo {
        name: name.into(),
        is_collection: Some(is_collection),
        url: annotations.navigation_link,
        association_link_url: annotations.association_link,
        count: annotations.count,
        type_name: resolved.type_name.clone(),
        annotations: annotations.custom,
    }
}

fn check_set_links(set: &ResourceSet) -> Result<(), Error> {
    if set.next_link.is_some() && set.delta_link.is_some() {
        return Err(Error::NextLinkWithDeltaLink);
    }
    Ok(())
}

fn set_resource_link(resource: &mut Resource, control: ControlAnnotation, value: String) {
    match control {
        ControlAnnotation::ETag => resource.etag = Some(value.into()),
        ControlAnnotation::EditLink => resource.edit_link = Some(value),
        ControlAnnotation::ReadLink => resource.read_link = Some(value),
        ControlAnnotation::MediaEditLink => resource.media.get_or_insert_with(Default::default).edit_link = Some(value),
        ControlAnnotation::MediaReadLink => resource.media.get_or_insert_with(Default::default).read_link = Some(value),
        ControlAnnotation::MediaContentType => {
            resource.media.get_or_insert_with(Default::default).content_type = Some(value);
        }
        ControlAnnotation::MediaEtag => resource.media.get_or_insert_with(Default::default).etag = Some(value),
        _ => {}
    }
}

fn read_reason(lexer: &mut JsonReader<'_>) -> Result<DeltaDeletedEntryReason, Error> {
    read_string(lexer, "reason")?
        .parse()
        .map_err(|_| Error::InvalidAnnotationValue {
            annotation: "reason".into(),
            expected: "deleted or changed",
        })
}

/// Value of `@removed`: `{"reason":"deleted"|"changed"}`, `{}` or `null`.
fn read_removed(lexer: &mut JsonReader<'_>, annotation: &str) -> Result<Option<DeltaDeletedEntryReason>, Error> {
    match Shape::of(lexer.node()) {
        Shape::Object => {}
        Shape::Null => {
            lexer.take_scalar()?;
            return Ok(None);
        }
        Shape::Array | Shape::Scalar => {
            return Err(Error::InvalidAnnotationValue {
                annotation: annotation.into(),
                expected: "an object",
            })
        }
    }
    lexer.read()?;
    let mut reason = None;
    while let JsonNode::Property(_) = lexer.node() {
        let name = lexer.take_property_name()?;
        if name == "reason" {
            reason = Some(read_reason(lexer)?);
        } else {
            skip_annotation(lexer, &name)?;
        }
    }
    lexer.expect(NodeKind::EndObject)?;
    lexer.read()?;
    Ok(reason)
}
