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

//! Payload items produced by readers and consumed by writers.

use crate::odata::ODataETag;
use crate::odata::ODataId;
use crate::value::ODataValue;
use crate::value::StreamReference;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use std::str::FromStr;
use url::Url;

/// Custom instance annotation, e.g. `@Core.Description`.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceAnnotation {
    /// Term name without `@`.
    pub name: String,
    pub value: ODataValue,
}

impl InstanceAnnotation {
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<ODataValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Property with a value.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub name: String,
    pub value: ODataValue,
    /// Type name from the payload (`Prop@odata.type`) or, for writing,
    /// explicit type of a dynamic property.
    pub type_name: Option<String>,
    pub annotations: Vec<InstanceAnnotation>,
}

impl Property {
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<ODataValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            type_name: None,
            annotations: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_type_name(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    #[must_use]
    pub fn with_annotation(mut self, annotation: InstanceAnnotation) -> Self {
        self.annotations.push(annotation);
        self
    }
}

/// Property that carried annotations but no value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PropertyInfo {
    pub name: String,
    pub type_name: Option<String>,
    pub annotations: Vec<InstanceAnnotation>,
}

/// Link to a bound action or function advertised by a resource or set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationLink {
    /// Metadata reference, e.g. `#TestModel.Discount`.
    pub metadata: String,
    pub title: Option<String>,
    pub target: Option<String>,
}

impl OperationLink {
    #[must_use]
    pub fn new(metadata: impl Into<String>) -> Self {
        Self {
            metadata: metadata.into(),
            title: None,
            target: None,
        }
    }

    #[must_use]
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// Entity or complex instance.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Resource {
    pub type_name: Option<String>,
    pub id: Option<ODataId>,
    pub etag: Option<ODataETag>,
    pub edit_link: Option<String>,
    pub read_link: Option<String>,
    /// Media resource of a media entity.
    pub media: Option<StreamReference>,
    pub properties: Vec<Property>,
    /// Properties that only carried annotations.
    pub property_infos: Vec<PropertyInfo>,
    pub annotations: Vec<InstanceAnnotation>,
    pub actions: Vec<OperationLink>,
    pub functions: Vec<OperationLink>,
}

impl Resource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_type_name(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<ODataId>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_etag(mut self, etag: impl Into<ODataETag>) -> Self {
        self.etag = Some(etag.into());
        self
    }

    #[must_use]
    pub fn with_property(mut self, property: Property) -> Self {
        self.properties.push(property);
        self
    }

    #[must_use]
    pub fn with_annotation(mut self, annotation: InstanceAnnotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }
}

/// Resource set or delta resource set.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResourceSet {
    pub type_name: Option<String>,
    pub count: Option<i64>,
    pub next_link: Option<String>,
    pub delta_link: Option<String>,
    pub annotations: Vec<InstanceAnnotation>,
    pub actions: Vec<OperationLink>,
    pub functions: Vec<OperationLink>,
}

impl ResourceSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn with_count(mut self, count: i64) -> Self {
        self.count = Some(count);
        self
    }

    #[must_use]
    pub fn with_next_link(mut self, link: impl Into<String>) -> Self {
        self.next_link = Some(link.into());
        self
    }

    #[must_use]
    pub fn with_delta_link(mut self, link: impl Into<String>) -> Self {
        self.delta_link = Some(link.into());
        self
    }
}

/// Navigation or structural property holding resources.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NestedResourceInfo {
    pub name: String,
    /// `None` until known; readers detect it from the payload shape.
    pub is_collection: Option<bool>,
    pub url: Option<String>,
    pub association_link_url: Option<String>,
    pub count: Option<i64>,
    pub type_name: Option<String>,
    pub annotations: Vec<InstanceAnnotation>,
}

impl NestedResourceInfo {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn collection(mut self, is_collection: bool) -> Self {
        self.is_collection = Some(is_collection);
        self
    }

    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

/// Reason of a deleted resource in a delta payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeltaDeletedEntryReason {
    Deleted,
    Changed,
}

impl Display for DeltaDeletedEntryReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Deleted => f.write_str("deleted"),
            Self::Changed => f.write_str("changed"),
        }
    }
}

impl FromStr for DeltaDeletedEntryReason {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deleted" => Ok(Self::Deleted),
            "changed" => Ok(Self::Changed),
            _ => Err(s.into()),
        }
    }
}

/// Resource removed from a delta set.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DeletedResource {
    pub id: Option<ODataId>,
    pub reason: Option<DeltaDeletedEntryReason>,
    pub type_name: Option<String>,
    /// Key or other properties (4.01).
    pub properties: Vec<Property>,
    pub annotations: Vec<InstanceAnnotation>,
}

impl DeletedResource {
    #[must_use]
    pub fn new(id: impl Into<ODataId>, reason: DeltaDeletedEntryReason) -> Self {
        Self {
            id: Some(id.into()),
            reason: Some(reason),
            ..Self::default()
        }
    }

    /// Id resolved against a base URL. Relative ids are common in delta
    /// payloads.
    ///
    /// # Errors
    ///
    /// Returns error if the id cannot be joined with `base`.
    pub fn id_url(&self, base: &Url) -> Option<Result<Url, url::ParseError>> {
        self.id.as_ref().map(|id| base.join(id.as_str()))
    }

    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }
}

/// Link added between two resources in a delta payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeltaLink {
    pub source: String,
    pub relationship: String,
    pub target: String,
}

impl DeltaLink {
    #[must_use]
    pub fn new(source: impl Into<String>, relationship: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            relationship: relationship.into(),
            target: target.into(),
        }
    }
}

/// Link removed between two resources in a delta payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeltaDeletedLink {
    pub source: String,
    pub relationship: String,
    pub target: String,
}

impl DeltaDeletedLink {
    #[must_use]
    pub fn new(source: impl Into<String>, relationship: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            relationship: relationship.into(),
            target: target.into(),
        }
    }
}

/// Item of a delta resource set.
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceItem {
    Resource(Resource),
    DeletedResource(DeletedResource),
    DeltaLink(DeltaLink),
    DeltaDeletedLink(DeltaDeletedLink),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deleted_resource_id_url() {
        let deleted = DeletedResource::new("Customers('BOTTM')", DeltaDeletedEntryReason::Changed);
        let base = Url::parse("http://host/service/").unwrap();
        let url = deleted.id_url(&base).unwrap().unwrap();
        assert_eq!(url.as_str(), "http://host/service/Customers('BOTTM')");
        assert_eq!(deleted.reason.unwrap().to_string(), "changed");
    }

    #[test]
    fn reasons() {
        assert_eq!("deleted".parse(), Ok(DeltaDeletedEntryReason::Deleted));
        assert!("gone".parse::<DeltaDeletedEntryReason>().is_err());
    }

    #[test]
    fn resource_lookup() {
        let r = Resource::new()
            .with_type_name("TestModel.Product")
            .with_property(Property::new("Id", 1))
            .with_property(Property::new("Name", "Bread"));
        assert_eq!(r.property("Name").map(|p| &p.value), Some(&ODataValue::from("Bread")));
        assert!(r.property("Price").is_none());
    }
}
