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

//! Push writer of resources, resource sets and delta resource sets.
//!
//! The writer keeps a stack of open scopes and rejects calls that are not
//! valid in the current scope:
//!
//! ```rust
//! use odata_json::writer::ResourceWriter;
//! use odata_json_core::item::Property;
//! use odata_json_core::item::Resource;
//! use odata_json_core::EdmModel;
//! use odata_json_core::WriterSettings;
//!
//! let model = EdmModel::builder().build().unwrap();
//! let settings = WriterSettings::default();
//! let mut writer = ResourceWriter::new(&model, &settings);
//! let resource = Resource::new().with_property(Property::new("Name", "a"));
//! writer.write_start_resource(Some(&resource)).unwrap();
//! writer.write_end().unwrap();
//! assert_eq!(writer.finish().unwrap(), r#"{"Name":"a"}"#);
//! ```

mod scope;

use crate::json_writer::JsonWriter;
use crate::lexer::validate;
use crate::lexer::JsonNode;
use crate::lexer::JsonReader;
use crate::lexer::JsonScalar;
use crate::primitive::infer_primitive;
use crate::primitive::needs_type_annotation;
use crate::primitive::read_primitive;
use crate::primitive::write_primitive;
use crate::Error;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use odata_json_core::context_url::ContextUrl;
use odata_json_core::context_url::ContextUrlKind;
use odata_json_core::edm::NavigationSource;
use odata_json_core::edm::OperationKind;
use odata_json_core::edm::PrimitiveKind;
use odata_json_core::edm::QualifiedName;
use odata_json_core::edm::SchemaType;
use odata_json_core::edm::StructuredType;
use odata_json_core::edm::TypeName;
use odata_json_core::item::DeletedResource;
use odata_json_core::item::DeltaDeletedLink;
use odata_json_core::item::DeltaLink;
use odata_json_core::item::InstanceAnnotation;
use odata_json_core::item::NestedResourceInfo;
use odata_json_core::item::OperationLink;
use odata_json_core::item::Property;
use odata_json_core::item::Resource;
use odata_json_core::item::ResourceItem;
use odata_json_core::item::ResourceSet;
use odata_json_core::settings::MetadataLevel;
use odata_json_core::value::StreamReference;
use odata_json_core::ControlAnnotation;
use odata_json_core::EdmModel;
use odata_json_core::ODataValue;
use odata_json_core::ODataVersion;
use odata_json_core::PrimitiveValue;
use odata_json_core::WriterSettings;
use scope::NestedContent;
use scope::NestedScope;
use scope::OpenStream;
use scope::ResourceScope;
use scope::Scope;
use scope::SetScope;
use std::borrow::Cow;
use std::io::Write;
use std::mem;
use tracing::debug;

#[cfg(feature = "async")]
use crate::io::write_payload_async;
#[cfg(feature = "async")]
use crate::io::CancellationSignal;
#[cfg(feature = "async")]
use futures_util::io::AsyncWrite;

/// Writer of a resource, resource set or delta resource set payload.
pub struct ResourceWriter<'a> {
    model: &'a EdmModel,
    settings: &'a WriterSettings,
    json: JsonWriter,
    scopes: Vec<Scope<'a>>,
    navigation_source: Option<&'a NavigationSource>,
    /// Bare values (parameters): no wrapping object, no context.
    bare: bool,
    completed: bool,
    stream: Option<OpenStream>,
}

impl<'a> ResourceWriter<'a> {
    #[must_use]
    pub fn new(model: &'a EdmModel, settings: &'a WriterSettings) -> Self {
        Self {
            model,
            settings,
            json: JsonWriter::new(),
            scopes: Vec::new(),
            navigation_source: None,
            bare: false,
            completed: false,
            stream: None,
        }
    }

    /// Writer of a bare resource or array of resources.
    pub(crate) fn bare(model: &'a EdmModel, settings: &'a WriterSettings) -> Self {
        Self {
            bare: true,
            ..Self::new(model, settings)
        }
    }

    /// Entity set or singleton of the payload. Used for the context URL
    /// and the types of top-level resources.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownNavigationSource`] if the model has no such
    /// navigation source.
    pub fn with_navigation_source(mut self, name: &str) -> Result<Self, Error> {
        let source = self
            .model
            .find_navigation_source(name)
            .ok_or_else(|| Error::UnknownNavigationSource(name.into()))?;
        self.navigation_source = Some(source);
        Ok(self)
    }

    /// Text written so far and not yet flushed.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.json.as_str()
    }

    /// # Errors
    ///
    /// Returns error if the call is not valid in the current scope, or in
    /// request mode the set has a count or next link.
    pub fn write_start_resource_set(&mut self, set: &ResourceSet) -> Result<(), Error> {
        self.begin_set(set, false)
    }

    /// # Errors
    ///
    /// Returns error if the call is not valid in the current scope, or in
    /// request mode the set has a count or next link.
    pub fn write_start_delta_resource_set(&mut self, set: &ResourceSet) -> Result<(), Error> {
        self.begin_set(set, true)
    }

    fn begin_set(&mut self, set: &ResourceSet, delta: bool) -> Result<(), Error> {
        let attempted = if delta {
            "delta resource set"
        } else {
            "resource set"
        };
        self.check_stream()?;
        if self.settings.is_request() {
            if set.count.is_some() {
                return Err(Error::RequestModeViolation("count"));
            }
            if set.next_link.is_some() || set.delta_link.is_some() {
                return Err(Error::RequestModeViolation("next link"));
            }
        }
        if set.next_link.is_some() && set.delta_link.is_some() {
            return Err(Error::NextLinkWithDeltaLink);
        }
        let scope = if self.scopes.is_empty() && !self.completed {
            let item_type = self.lookup(set.type_name.as_deref()).or_else(|| self.source_type());
            if self.bare {
                self.json.start_array();
            } else {
                self.json.start_object();
                let kind = if delta {
                    ContextUrlKind::Delta
                } else {
                    ContextUrlKind::ResourceSet
                };
                self.write_context(&kind)?;
                if self.settings.metadata_level == MetadataLevel::Full {
                    if let Some(t) = &set.type_name {
                        self.write_type_annotation(None, t)?;
                    }
                }
                self.write_set_annotations(set, None)?;
                self.write_operations(&set.actions, &set.functions)?;
                self.json.name("value")?;
                self.json.start_array();
            }
            SetScope {
                delta,
                item_type,
                source: self.navigation_source,
                top: true,
            }
        } else {
            let content = self
                .begin_nested_content(true)
                .ok_or_else(|| self.transition(attempted))?;
            let mut content = content;
            if set.count.is_some() {
                content.count = None;
            }
            self.write_nested_annotations(&content)?;
            self.write_set_annotations(set, Some(&content.name))?;
            if delta {
                self.json.name(&property_annotation(&content.name, ControlAnnotation::Delta, self.version()))?;
            } else {
                self.json.name(&content.name)?;
            }
            self.json.start_array();
            SetScope {
                delta,
                item_type: self.lookup(set.type_name.as_deref()).or(content.target),
                source: content.source,
                top: false,
            }
        };
        debug!(delta, "resource set started");
        self.scopes.push(Scope::Set(scope));
        Ok(())
    }

    /// Start a resource. `None` writes `null` for a single-valued nested
    /// resource.
    ///
    /// # Errors
    ///
    /// Returns error if the call is not valid in the current scope or a
    /// property of the resource is invalid.
    pub fn write_start_resource(&mut self, resource: Option<&Resource>) -> Result<(), Error> {
        self.check_stream()?;
        let Some(resource) = resource else {
            return self.write_null_resource();
        };
        let (expected, source, top) = match self.scopes.last() {
            None if !self.completed => (self.source_type(), self.navigation_source, true),
            Some(Scope::Set(set)) => (set.item_type, set.source, false),
            Some(Scope::NestedInfo(_)) => self.enter_nested_resource()?,
            _ => return Err(self.transition("resource")),
        };
        let ty = self.lookup(resource.type_name.as_deref()).or(expected);
        self.json.start_object();
        if top && !self.bare {
            self.write_context(&ContextUrlKind::Entity)?;
        }
        self.write_resource_control(resource, expected)?;
        for property in &resource.properties {
            self.write_property_value(ty, property)?;
        }
        debug!(type_name = ?resource.type_name, "resource started");
        self.scopes.push(Scope::Resource(ResourceScope {
            ty,
            source,
            deleted: false,
            actions: resource.actions.clone(),
            functions: resource.functions.clone(),
        }));
        Ok(())
    }

    fn enter_nested_resource(
        &mut self,
    ) -> Result<(Option<&'a StructuredType>, Option<&'a NavigationSource>, bool), Error> {
        let content = self
            .begin_nested_content(false)
            .ok_or_else(|| self.transition("resource"))?;
        self.write_nested_annotations(&content)?;
        self.json.name(&content.name)?;
        Ok((content.target, content.source, false))
    }

    fn write_null_resource(&mut self) -> Result<(), Error> {
        if !matches!(self.scopes.last(), Some(Scope::NestedInfo(_))) {
            return Err(self.transition("null resource"));
        }
        let content = self
            .begin_nested_content(false)
            .ok_or_else(|| self.transition("null resource"))?;
        self.write_nested_annotations(&content)?;
        self.json.name(&content.name)?;
        self.json.null();
        Ok(())
    }

    /// Start a deleted resource in a delta resource set. 4.0 writes the
    /// `$deletedEntity` form, 4.01 the `@removed` form.
    ///
    /// # Errors
    ///
    /// Returns error if the current scope is not a delta resource set, no
    /// navigation source is known (4.0), or the 4.0 form has no id.
    pub fn write_start_deleted_resource(&mut self, deleted: &DeletedResource) -> Result<(), Error> {
        self.check_stream()?;
        let (item_type, source) = match self.scopes.last() {
            Some(Scope::Set(set)) if set.delta => (set.item_type, set.source.or(self.navigation_source)),
            _ => return Err(self.transition("deleted resource")),
        };
        let version = self.version();
        self.json.start_object();
        match version {
            ODataVersion::V4 => {
                let source = source.ok_or(Error::MissingNavigationSource)?;
                let id = deleted.id.as_ref().ok_or(Error::MissingDeletedResourceId)?;
                if let Some(p) = deleted.properties.first() {
                    return Err(Error::DeletedResourceContentNotAllowed(p.name.clone()));
                }
                let context = ContextUrl::build(
                    self.settings.service_root.as_ref(),
                    &source.name,
                    &ContextUrlKind::DeletedEntity,
                )?;
                self.json.name(&annotation(ControlAnnotation::Context, version))?;
                self.json.string(&context)?;
                self.json.name("id")?;
                self.json.string(id.as_str())?;
                if let Some(reason) = deleted.reason {
                    self.json.name("reason")?;
                    self.json.string(&reason.to_string())?;
                }
            }
            ODataVersion::V401 => {
                self.json.name(&annotation(ControlAnnotation::Removed, version))?;
                self.json.start_object();
                if let Some(reason) = deleted.reason {
                    self.json.name("reason")?;
                    self.json.string(&reason.to_string())?;
                }
                self.json.end_object();
                if let Some(id) = &deleted.id {
                    self.json.name(&annotation(ControlAnnotation::Id, version))?;
                    self.json.string(id.as_str())?;
                }
            }
        }
        if let Some(type_name) = &deleted.type_name {
            if !item_type.is_some_and(|t| same_type(type_name, &t.name)) {
                self.write_type_annotation(None, type_name)?;
            }
        }
        self.write_custom_annotations(&deleted.annotations, None)?;
        let ty = self.lookup(deleted.type_name.as_deref()).or(item_type);
        for property in &deleted.properties {
            self.write_property_value(ty, property)?;
        }
        self.scopes.push(Scope::Resource(ResourceScope {
            ty,
            source,
            deleted: true,
            actions: Vec::new(),
            functions: Vec::new(),
        }));
        Ok(())
    }

    /// # Errors
    ///
    /// Returns error if the current scope is not a delta resource set or
    /// no navigation source is known.
    pub fn write_delta_link(&mut self, link: &DeltaLink) -> Result<(), Error> {
        self.write_link(&link.source, &link.relationship, &link.target, ContextUrlKind::Link)
    }

    /// # Errors
    ///
    /// Returns error if the current scope is not a delta resource set or
    /// no navigation source is known.
    pub fn write_delta_deleted_link(&mut self, link: &DeltaDeletedLink) -> Result<(), Error> {
        self.write_link(
            &link.source,
            &link.relationship,
            &link.target,
            ContextUrlKind::DeletedLink,
        )
    }

    /// Write a complete item of a delta resource set. Resources and
    /// deleted resources are closed after their properties.
    ///
    /// # Errors
    ///
    /// Returns error if the current scope is not a delta resource set or
    /// the item cannot be written there.
    pub fn write_delta_item(&mut self, item: &ResourceItem) -> Result<(), Error> {
        match item {
            ResourceItem::Resource(resource) => {
                self.write_start_resource(Some(resource))?;
                self.write_end()
            }
            ResourceItem::DeletedResource(deleted) => {
                self.write_start_deleted_resource(deleted)?;
                self.write_end()
            }
            ResourceItem::DeltaLink(link) => self.write_delta_link(link),
            ResourceItem::DeltaDeletedLink(link) => self.write_delta_deleted_link(link),
        }
    }

    fn write_link(&mut self, source: &str, relationship: &str, target: &str, kind: ContextUrlKind) -> Result<(), Error> {
        self.check_stream()?;
        let set_source = match self.scopes.last() {
            Some(Scope::Set(set)) if set.delta => set.source.or(self.navigation_source),
            _ => return Err(self.transition("delta link")),
        };
        let set_source = set_source.ok_or(Error::MissingNavigationSource)?;
        let context = ContextUrl::build(self.settings.service_root.as_ref(), &set_source.name, &kind)?;
        self.json.start_object();
        self.json.name(&annotation(ControlAnnotation::Context, self.version()))?;
        self.json.string(&context)?;
        self.json.name("source")?;
        self.json.string(source)?;
        self.json.name("relationship")?;
        self.json.string(relationship)?;
        self.json.name("target")?;
        self.json.string(target)?;
        self.json.end_object();
        Ok(())
    }

    /// Start a navigation or structural property with resource content,
    /// entity reference links or deferred links.
    ///
    /// # Errors
    ///
    /// Returns error if the current scope is not a resource, or is a 4.0
    /// deleted resource.
    pub fn write_start_nested_resource_info(&mut self, info: &NestedResourceInfo) -> Result<(), Error> {
        self.check_stream()?;
        let (ty, source) = match self.scopes.last() {
            Some(Scope::Resource(r)) if !r.deleted || self.version() >= ODataVersion::V401 => (r.ty, r.source),
            _ => return Err(self.transition("nested resource info")),
        };
        let declared = ty.and_then(|t| self.model.find_property(t, &info.name));
        let target = declared
            .map(|p| p.type_ref.element.qualified_name())
            .and_then(|name| self.model.find_structured_type(&name));
        let source = source.and_then(|s| self.model.navigation_target(s, &info.name));
        let mut info = info.clone();
        if info.is_collection.is_none() {
            info.is_collection = declared.map(|p| p.type_ref.collection);
        }
        self.scopes.push(Scope::NestedInfo(NestedScope {
            info,
            target,
            source,
            binds: Vec::new(),
            content: false,
        }));
        Ok(())
    }

    /// Write an entity reference link (`@odata.bind`) of the open nested
    /// resource info.
    ///
    /// # Errors
    ///
    /// Returns error if the current scope is not a nested resource info or
    /// its content was already written.
    pub fn write_entity_reference_link(&mut self, url: &str) -> Result<(), Error> {
        self.check_stream()?;
        match self.scopes.last_mut() {
            Some(Scope::NestedInfo(nested)) if !nested.content => {
                nested.binds.push(url.into());
                Ok(())
            }
            _ => Err(self.transition("entity reference link")),
        }
    }

    /// # Errors
    ///
    /// Returns error if the current scope is not a resource or the
    /// property does not match the model.
    pub fn write_property(&mut self, property: &Property) -> Result<(), Error> {
        self.check_stream()?;
        let ty = match self.scopes.last() {
            Some(Scope::Resource(r)) => r.ty,
            _ => return Err(self.transition("property")),
        };
        self.write_property_value(ty, property)
    }

    /// Write an item of an untyped resource set.
    ///
    /// # Errors
    ///
    /// Returns error if the current scope is not a resource set or the
    /// value is not primitive.
    pub fn write_primitive(&mut self, value: &ODataValue) -> Result<(), Error> {
        self.check_stream()?;
        if !matches!(self.scopes.last(), Some(Scope::Set(_))) {
            return Err(self.transition("primitive"));
        }
        match value {
            ODataValue::Null | ODataValue::Primitive(_) | ODataValue::Enum(_) | ODataValue::Untyped(_) => {
                self.write_value(value, None, "")
            }
            ODataValue::Collection(_) | ODataValue::Stream(_) => Err(self.transition("primitive")),
        }
    }

    /// Start a binary stream property; bytes are written base64 encoded.
    ///
    /// # Errors
    ///
    /// Returns error if the current scope is not a resource or another
    /// stream is open.
    pub fn start_binary_stream(&mut self, name: &str) -> Result<(), Error> {
        self.start_stream(name, true)
    }

    /// # Errors
    ///
    /// Returns error if the current scope is not a resource or another
    /// stream is open.
    pub fn start_text_stream(&mut self, name: &str) -> Result<(), Error> {
        self.start_stream(name, false)
    }

    fn start_stream(&mut self, name: &str, binary: bool) -> Result<(), Error> {
        self.check_stream()?;
        if !matches!(self.scopes.last(), Some(Scope::Resource(_))) {
            return Err(self.transition("stream"));
        }
        self.json.name(name)?;
        self.json.start_string();
        self.stream = Some(OpenStream {
            binary,
            pending: Vec::new(),
        });
        Ok(())
    }

    /// # Errors
    ///
    /// Returns error if no binary stream is open.
    pub fn write_stream_bytes(&mut self, bytes: &[u8]) -> Result<(), Error> {
        let Some(stream) = self.stream.as_mut().filter(|s| s.binary) else {
            return Err(self.transition("stream bytes"));
        };
        stream.pending.extend_from_slice(bytes);
        let whole = stream.pending.len() / 3 * 3;
        let encoded = STANDARD.encode(&stream.pending[..whole]);
        stream.pending.drain(..whole);
        self.json.push_str_content(&encoded)?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns error if no text stream is open.
    pub fn write_stream_text(&mut self, text: &str) -> Result<(), Error> {
        if !self.stream.as_ref().is_some_and(|s| !s.binary) {
            return Err(self.transition("stream text"));
        }
        self.json.push_str_content(text)?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns error if no stream is open.
    pub fn end_stream(&mut self) -> Result<(), Error> {
        let Some(stream) = self.stream.take() else {
            return Err(self.transition("end of stream"));
        };
        if !stream.pending.is_empty() {
            self.json.push_str_content(&STANDARD.encode(&stream.pending))?;
        }
        self.json.end_string();
        Ok(())
    }

    /// Close the innermost scope.
    ///
    /// # Errors
    ///
    /// Returns error if a stream is open, no scope is open, or in request
    /// mode a nested resource info is deferred.
    pub fn write_end(&mut self) -> Result<(), Error> {
        self.check_stream()?;
        let Some(scope) = self.scopes.pop() else {
            return Err(self.transition("end"));
        };
        match scope {
            Scope::Resource(resource) => {
                self.write_operations(&resource.actions, &resource.functions)?;
                self.json.end_object();
                debug!(deleted = resource.deleted, "resource ended");
            }
            Scope::Set(set) => {
                self.json.end_array();
                if set.top && !self.bare {
                    self.json.end_object();
                }
                debug!(delta = set.delta, "resource set ended");
            }
            Scope::NestedInfo(nested) => self.end_nested(nested)?,
        }
        if self.scopes.is_empty() {
            self.completed = true;
        }
        Ok(())
    }

    fn end_nested(&mut self, nested: NestedScope<'a>) -> Result<(), Error> {
        if nested.content {
            return Ok(());
        }
        let mut info = nested.info;
        let content = NestedContent {
            name: info.name.clone(),
            target: nested.target,
            source: nested.source,
            binds: nested.binds,
            is_collection: info.is_collection.unwrap_or(false),
            count: info.count,
            annotations: mem::take(&mut info.annotations),
        };
        if content.binds.is_empty() && self.settings.is_request() {
            return Err(Error::RequestModeViolation("deferred navigation link"));
        }
        self.write_nested_annotations(&content)?;
        if !content.binds.is_empty() {
            return Ok(());
        }
        let version = self.version();
        if self.settings.metadata_level == MetadataLevel::None {
            return Ok(());
        }
        if let Some(url) = &info.url {
            self.json.name(&property_annotation(&info.name, ControlAnnotation::NavigationLink, version))?;
            self.json.string(url)?;
        }
        if let Some(url) = &info.association_link_url {
            self.json.name(&property_annotation(&info.name, ControlAnnotation::AssociationLink, version))?;
            self.json.string(url)?;
        }
        Ok(())
    }

    /// Complete the payload and return the text not yet flushed.
    ///
    /// # Errors
    ///
    /// Returns error if a stream or scope is still open.
    pub fn finish(self) -> Result<String, Error> {
        self.check_stream()?;
        if !self.completed {
            return Err(Error::WriterNotCompleted);
        }
        Ok(self.json.into_inner())
    }

    /// Move the text written so far to `out`.
    ///
    /// # Errors
    ///
    /// Returns error if writing fails.
    pub fn flush_to<W: Write>(&mut self, out: &mut W) -> Result<(), Error> {
        out.write_all(self.json.take().as_bytes())?;
        out.flush()?;
        Ok(())
    }

    /// Move the text written so far to an async `out`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cancelled`] if `signal` is cancelled, or error if
    /// writing fails.
    #[cfg(feature = "async")]
    pub async fn flush_to_async<W: AsyncWrite + Unpin>(
        &mut self,
        out: &mut W,
        signal: &CancellationSignal,
    ) -> Result<(), Error> {
        let text = self.json.take();
        write_payload_async(out, &text, signal).await
    }

    fn version(&self) -> ODataVersion {
        self.settings.version
    }

    fn transition(&self, attempted: &'static str) -> Error {
        let scope = match self.scopes.last() {
            Some(scope) => scope.name(),
            None if self.completed => "completed payload",
            None => "top level",
        };
        Error::InvalidWriterTransition { scope, attempted }
    }

    fn check_stream(&self) -> Result<(), Error> {
        if self.stream.is_some() {
            return Err(Error::StreamNotClosed);
        }
        Ok(())
    }

    fn lookup(&self, type_name: Option<&str>) -> Option<&'a StructuredType> {
        let type_name = TypeName::from_payload(type_name?).ok()?;
        match self.model.find_type(type_name.element())? {
            SchemaType::Structured(t) => Some(t),
            _ => None,
        }
    }

    fn source_type(&self) -> Option<&'a StructuredType> {
        self.navigation_source
            .and_then(|s| self.model.navigation_source_type(s))
    }

    /// Mark the open nested resource info as expanded and return what its
    /// content needs.
    fn begin_nested_content(&mut self, collection: bool) -> Option<NestedContent<'a>> {
        let Some(Scope::NestedInfo(nested)) = self.scopes.last_mut() else {
            return None;
        };
        if nested.content || nested.info.is_collection.is_some_and(|c| c != collection) {
            return None;
        }
        nested.content = true;
        Some(NestedContent {
            name: nested.info.name.clone(),
            target: nested.target,
            source: nested.source,
            binds: mem::take(&mut nested.binds),
            is_collection: collection,
            count: nested.info.count,
            annotations: mem::take(&mut nested.info.annotations),
        })
    }

    /// Annotations of a nested resource info preceding its value.
    fn write_nested_annotations(&mut self, content: &NestedContent<'_>) -> Result<(), Error> {
        self.write_custom_annotations(&content.annotations, Some(&content.name))?;
        if let Some(count) = content.count.filter(|_| !self.settings.is_request()) {
            self.json.name(&property_annotation(&content.name, ControlAnnotation::Count, self.version()))?;
            self.write_count(count)?;
        }
        if content.binds.is_empty() {
            return Ok(());
        }
        let name = property_annotation(&content.name, ControlAnnotation::Bind, self.version());
        self.json.name(&name)?;
        if content.is_collection || content.binds.len() > 1 {
            self.json.start_array();
            for link in &content.binds {
                self.json.string(link)?;
            }
            self.json.end_array();
        } else {
            for link in &content.binds {
                self.json.string(link)?;
            }
        }
        Ok(())
    }

    fn write_context(&mut self, kind: &ContextUrlKind) -> Result<(), Error> {
        if self.settings.is_request() || self.settings.metadata_level == MetadataLevel::None {
            return Ok(());
        }
        let Some(source) = self.navigation_source else {
            return Ok(());
        };
        let context = ContextUrl::build(self.settings.service_root.as_ref(), &source.name, kind)?;
        self.json.name(&annotation(ControlAnnotation::Context, self.version()))?;
        self.json.string(&context)?;
        Ok(())
    }

    fn write_count(&mut self, count: i64) -> Result<(), Error> {
        if self.settings.ieee754_compatible {
            self.json.string(&count.to_string())?;
        } else {
            self.json.raw(&count.to_string());
        }
        Ok(())
    }

    fn write_set_annotations(&mut self, set: &ResourceSet, property: Option<&str>) -> Result<(), Error> {
        let version = self.version();
        let name = |c: ControlAnnotation| match property {
            Some(p) => property_annotation(p, c, version),
            None => annotation(c, version),
        };
        if let Some(count) = set.count {
            self.json.name(&name(ControlAnnotation::Count))?;
            self.write_count(count)?;
        }
        if let Some(link) = &set.next_link {
            self.json.name(&name(ControlAnnotation::NextLink))?;
            self.json.string(link)?;
        }
        if let Some(link) = &set.delta_link {
            self.json.name(&name(ControlAnnotation::DeltaLink))?;
            self.json.string(link)?;
        }
        self.write_custom_annotations(&set.annotations, property)
    }

    fn write_custom_annotations(
        &mut self,
        annotations: &[InstanceAnnotation],
        property: Option<&str>,
    ) -> Result<(), Error> {
        for a in annotations {
            if !self.settings.include_annotation.matches(&a.name) {
                continue;
            }
            let name = match property {
                Some(p) => format!("{p}@{}", a.name),
                None => format!("@{}", a.name),
            };
            self.json.name(&name)?;
            self.write_value(&a.value, None, &a.name)?;
        }
        Ok(())
    }

    fn write_operations(&mut self, actions: &[OperationLink], functions: &[OperationLink]) -> Result<(), Error> {
        if self.settings.metadata_level == MetadataLevel::None {
            return Ok(());
        }
        for (kind, links) in [(OperationKind::Action, actions), (OperationKind::Function, functions)] {
            let mut i = 0;
            while i < links.len() {
                let metadata = &links[i].metadata;
                let group = links[i..].iter().take_while(|l| l.metadata == *metadata).count();
                debug!(?kind, %metadata, "operation written");
                self.json.name(metadata)?;
                let group_links = &links[i..i + group];
                if group > 1 {
                    self.json.start_array();
                }
                for link in group_links {
                    self.json.start_object();
                    if let Some(title) = &link.title {
                        self.json.name("title")?;
                        self.json.string(title)?;
                    }
                    if let Some(target) = &link.target {
                        self.json.name("target")?;
                        self.json.string(target)?;
                    }
                    self.json.end_object();
                }
                if group > 1 {
                    self.json.end_array();
                }
                i += group;
            }
        }
        Ok(())
    }

    fn write_type_annotation(&mut self, property: Option<&str>, type_name: &str) -> Result<(), Error> {
        let version = self.version();
        let name = match property {
            Some(p) => property_annotation(p, ControlAnnotation::Type, version),
            None => annotation(ControlAnnotation::Type, version),
        };
        self.json.name(&name)?;
        self.json.string(&TypeName::from_payload(type_name)?.to_payload())?;
        Ok(())
    }

    /// Control information of a resource, in wire order.
    fn write_resource_control(
        &mut self,
        resource: &Resource,
        expected: Option<&'a StructuredType>,
    ) -> Result<(), Error> {
        let version = self.version();
        let level = self.settings.metadata_level;
        if level != MetadataLevel::None {
            if let Some(type_name) = &resource.type_name {
                let implied = expected.is_some_and(|t| same_type(type_name, &t.name));
                if level == MetadataLevel::Full || !implied {
                    self.write_type_annotation(None, type_name)?;
                }
            }
            if let Some(id) = &resource.id {
                self.json.name(&annotation(ControlAnnotation::Id, version))?;
                self.json.string(id.as_str())?;
            }
            if let Some(etag) = &resource.etag {
                self.json.name(&annotation(ControlAnnotation::ETag, version))?;
                self.json.string(etag.as_str())?;
            }
            for (control, link) in [
                (ControlAnnotation::EditLink, &resource.edit_link),
                (ControlAnnotation::ReadLink, &resource.read_link),
            ] {
                if let Some(link) = link {
                    self.json.name(&annotation(control, version))?;
                    self.json.string(link)?;
                }
            }
            if let Some(media) = &resource.media {
                self.write_media(media, None)?;
            }
        }
        self.write_custom_annotations(&resource.annotations, None)
    }

    fn write_media(&mut self, media: &StreamReference, property: Option<&str>) -> Result<(), Error> {
        let version = self.version();
        for (control, value) in [
            (ControlAnnotation::MediaEditLink, &media.edit_link),
            (ControlAnnotation::MediaReadLink, &media.read_link),
            (ControlAnnotation::MediaContentType, &media.content_type),
            (ControlAnnotation::MediaEtag, &media.etag),
        ] {
            if let Some(value) = value {
                let name = match property {
                    Some(p) => property_annotation(p, control, version),
                    None => annotation(control, version),
                };
                self.json.name(&name)?;
                self.json.string(value)?;
            }
        }
        Ok(())
    }

    fn write_property_value(&mut self, owner: Option<&'a StructuredType>, property: &Property) -> Result<(), Error> {
        let name = property.name.as_str();
        let declared = owner.and_then(|t| self.model.find_property(t, name));
        let validations = self.settings.validations;
        if let (None, Some(owner)) = (declared, owner) {
            if !self.model.is_open(owner) && validations.throw_on_undeclared_property_for_non_open_type {
                return Err(Error::UndeclaredProperty {
                    type_name: owner.name.to_string(),
                    property: name.into(),
                });
            }
        }
        let element_kind = declared.and_then(|p| p.type_ref.element.primitive());
        if let (Some(p), ODataValue::Null) = (declared, &property.value) {
            if !p.type_ref.nullable && !p.type_ref.collection {
                return Err(Error::NullValueForNonNullable(name.into()));
            }
        }
        self.write_custom_annotations(&property.annotations, Some(name))?;
        if let Some(type_name) = self.property_type_annotation(declared.map(|p| p.type_ref.type_name()), property) {
            self.write_type_annotation(Some(name), &type_name)?;
        }
        if let ODataValue::Stream(media) = &property.value {
            return self.write_media(media, Some(name));
        }
        self.json.name(name)?;
        self.write_value(&property.value, element_kind, name)
    }

    /// `@odata.type` of a property, if one must be written.
    fn property_type_annotation(&self, declared: Option<TypeName>, property: &Property) -> Option<String> {
        if self.settings.metadata_level == MetadataLevel::None {
            return None;
        }
        if let Some(type_name) = &property.type_name {
            let implied = declared.is_some_and(|d| TypeName::from_payload(type_name).is_ok_and(|t| t == d));
            return (!implied || self.settings.metadata_level == MetadataLevel::Full).then(|| type_name.clone());
        }
        if declared.is_some() {
            return None;
        }
        match &property.value {
            ODataValue::Primitive(v) if needs_type_annotation(v.kind()) && !reads_back_as(v) => {
                Some(v.kind().to_string())
            }
            ODataValue::Collection(c) => c.type_name.clone(),
            ODataValue::Enum(e) => e.type_name.clone(),
            _ => None,
        }
    }

    /// Write a value. Values of a declared primitive kind held as strings
    /// or raw JSON are converted to the canonical form of that kind.
    fn write_value(&mut self, value: &ODataValue, kind: Option<PrimitiveKind>, name: &str) -> Result<(), Error> {
        match value {
            ODataValue::Null | ODataValue::Stream(_) => self.json.null(),
            ODataValue::Primitive(v) => {
                let v = self.convert(v, kind, name)?;
                write_primitive(&mut self.json, &v, self.settings.ieee754_compatible)?;
            }
            ODataValue::Enum(e) => self.json.string(&e.value)?,
            ODataValue::Collection(c) => {
                self.json.start_array();
                for item in &c.items {
                    self.write_value(item, kind, name)?;
                }
                self.json.end_array();
            }
            ODataValue::Untyped(raw) => {
                validate(raw.raw())?;
                match (kind, scalar_of(raw.raw())?) {
                    (Some(kind), Some(scalar)) if !scalar.is_null() => {
                        let v = read_primitive(&scalar, kind, name)?;
                        write_primitive(&mut self.json, &v, self.settings.ieee754_compatible)?;
                    }
                    _ => self.json.raw(raw.raw()),
                }
            }
        }
        Ok(())
    }

    fn convert<'v>(
        &self,
        value: &'v PrimitiveValue,
        kind: Option<PrimitiveKind>,
        name: &str,
    ) -> Result<Cow<'v, PrimitiveValue>, Error> {
        let Some(kind) = kind else {
            return Ok(Cow::Borrowed(value));
        };
        let actual = value.kind();
        if actual == kind || actual.promotes_to(kind) {
            return Ok(Cow::Borrowed(value));
        }
        let conflict = || Error::TypeConflict {
            property: name.into(),
            expected: kind.to_string(),
            actual: actual.to_string(),
        };
        let strict = self.settings.validations.throw_if_type_conflicts_with_metadata;
        match value {
            PrimitiveValue::String(s) => {
                match read_primitive(&JsonScalar::String(Cow::Borrowed(s.as_str())), kind, name) {
                    Ok(v) => Ok(Cow::Owned(v)),
                    Err(_) if strict => Err(conflict()),
                    Err(_) => Ok(Cow::Borrowed(value)),
                }
            }
            _ if strict => Err(conflict()),
            _ => Ok(Cow::Borrowed(value)),
        }
    }
}

fn annotation(control: ControlAnnotation, version: ODataVersion) -> String {
    format!("@{}", control.name(version))
}

fn property_annotation(property: &str, control: ControlAnnotation, version: ODataVersion) -> String {
    format!("{property}@{}", control.name(version))
}

/// Scalar of a raw JSON value, `None` for objects and arrays.
fn scalar_of(raw: &str) -> Result<Option<JsonScalar<'_>>, Error> {
    let mut lexer = JsonReader::new(raw);
    lexer.read()?;
    if matches!(lexer.node(), JsonNode::Primitive(_)) {
        lexer.take_scalar().map(Some)
    } else {
        Ok(None)
    }
}

/// Payload type name `payload` names the type `name`.
fn same_type(payload: &str, name: &QualifiedName) -> bool {
    TypeName::from_payload(payload).is_ok_and(|t| t == TypeName::One(name.clone()))
}

/// The JSON form of the value is read back as the same kind without a
/// type annotation.
fn reads_back_as(value: &PrimitiveValue) -> bool {
    let mut json = JsonWriter::new();
    if write_primitive(&mut json, value, false).is_err() {
        return false;
    }
    let text = json.into_inner();
    match scalar_of(&text) {
        Ok(Some(scalar)) => infer_primitive(&scalar)
            .as_primitive()
            .is_some_and(|v| v.kind() == value.kind()),
        _ => false,
    }
}
